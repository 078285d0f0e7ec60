use serde::{Deserialize, Serialize};

/// Storage-assigned identifier. Lower ids were created earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TenantId(pub u64);

/// Subscription tier of a site owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Basic,
    Premium,
    Enterprise,
}

impl Plan {
    pub fn label(&self) -> &'static str {
        match self {
            Plan::Basic => "Basic",
            Plan::Premium => "Premium",
            Plan::Enterprise => "Enterprise",
        }
    }
}

/// Presentational settings handed to the view layer untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branding {
    pub primary_color: String,
    pub secondary_color: String,
    pub font_family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            primary_color: "#007bff".to_string(),
            secondary_color: "#6c757d".to_string(),
            font_family: "Arial, sans-serif".to_string(),
            logo: None,
        }
    }
}

/// A site owner. `custom_domain` is stored normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub slug: String,
    pub company_name: String,
    pub custom_domain: Option<String>,
    pub active: bool,
    pub plan: Plan,
    pub branding: Branding,
}

impl Tenant {
    pub fn view(&self) -> TenantView {
        TenantView {
            id: self.id.0,
            slug: self.slug.clone(),
            company_name: self.company_name.clone(),
            custom_domain: self.custom_domain.clone(),
            active: self.active,
            plan: self.plan.label(),
            branding: self.branding.clone(),
        }
    }
}

/// Registration payload accepted by the tenant directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTenant {
    pub company_name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub custom_domain: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default)]
    pub branding: Option<Branding>,
}

fn default_active() -> bool {
    true
}

/// Public representation returned by the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct TenantView {
    pub id: u64,
    pub slug: String,
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    pub active: bool,
    pub plan: &'static str,
    pub branding: Branding,
}

/// Lower-case ASCII slug; other characters collapse into single dashes.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
