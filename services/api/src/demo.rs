use crate::infra::{seed_demo_tenants, InMemoryTenantRepository};
use chrono::{DateTime, Utc};
use clap::Args;
use sitekit::config::{AppConfig, SessionConfig};
use sitekit::error::AppError;
use sitekit::sessions::{ActivityDecision, ActivityTracker, SessionData, UserId, LAST_ACTIVITY_KEY};
use sitekit::tenancy::{Resolution, Tenant, TenantDirectory, TenantResolver};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the configured idle timeout (seconds) for the session walkthrough.
    #[arg(long)]
    pub(crate) idle_seconds: Option<i64>,
    /// Additional hosts to resolve alongside the sample domains.
    #[arg(long = "host")]
    pub(crate) hosts: Vec<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ResolveArgs {
    /// Host header value to resolve (port is ignored).
    #[arg(long)]
    pub(crate) host: String,
    /// Register the sample tenants before resolving.
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        idle_seconds,
        hosts,
    } = args;

    let config = AppConfig::load()?;
    let session_config = match idle_seconds {
        Some(seconds) => SessionConfig::new(
            seconds,
            config.session.login_path.clone(),
            config.session.cookie_name.clone(),
        )?,
        None => config.session.clone(),
    };

    println!("Multi-tenant site pipeline demo");
    let repository = Arc::new(InMemoryTenantRepository::default());
    let directory = TenantDirectory::new(repository.clone());
    let tenants = match seed_demo_tenants(&directory) {
        Ok(tenants) => tenants,
        Err(err) => {
            println!("  Sample tenants unavailable: {}", err);
            return Ok(());
        }
    };

    println!("\nRegistered tenants");
    for tenant in &tenants {
        println!(
            "- #{} {} ({}) | domain {} | plan {} | {}",
            tenant.id.0,
            tenant.company_name,
            tenant.slug,
            tenant.custom_domain.as_deref().unwrap_or("none"),
            tenant.plan.label(),
            if tenant.active { "active" } else { "inactive" }
        );
    }

    let resolver = TenantResolver::new(repository, config.tenancy.clone());
    println!(
        "\nHost resolution (generic hosts: {})",
        config.tenancy.generic_hosts.join(", ")
    );
    let mut probe_hosts: Vec<String> = tenants
        .iter()
        .filter_map(|tenant| tenant.custom_domain.clone())
        .collect();
    probe_hosts.extend(config.tenancy.generic_hosts.iter().cloned());
    probe_hosts.push("unknown.example".to_string());
    probe_hosts.extend(hosts);
    for host in &probe_hosts {
        render_resolution(host, &resolver.resolution(host));
    }

    let tracker = ActivityTracker::new(&session_config);
    let timeout = tracker.idle_timeout();
    let now = Utc::now();
    println!(
        "\nIdle-session walkthrough (timeout {}s, login {})",
        timeout.num_seconds(),
        session_config.login_path
    );

    let scenarios: [(&str, Option<SessionData>); 5] = [
        ("active at half the timeout", Some(user_session(now - timeout / 2))),
        ("idle for twice the timeout", Some(user_session(now - timeout * 2))),
        ("first authenticated request", Some(SessionData::for_user(demo_user()))),
        ("unparsable timestamp", Some(malformed_session())),
        ("anonymous visitor", None),
    ];

    for (label, session) in scenarios {
        let mut session = session.unwrap_or_default();
        let outcome = match tracker.check(now, &mut session) {
            ActivityDecision::Continue if session.is_authenticated() => {
                "continue, last activity refreshed".to_string()
            }
            ActivityDecision::Continue => "continue, session untouched".to_string(),
            ActivityDecision::Terminate(target) => {
                format!("forced logout, redirect to {}", target.as_str())
            }
        };
        println!("- {}: {}", label, outcome);
    }

    Ok(())
}

pub(crate) fn run_resolve(args: ResolveArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let repository = Arc::new(InMemoryTenantRepository::default());

    if args.seed_demo {
        let directory = TenantDirectory::new(repository.clone());
        if let Err(err) = seed_demo_tenants(&directory) {
            println!("Sample tenants unavailable: {}", err);
        }
    }

    let resolver = TenantResolver::new(repository, config.tenancy);
    let resolution = resolver.resolution(&args.host);
    render_resolution(&args.host, &resolution);

    if let Some(tenant) = resolution.tenant() {
        match serde_json::to_string_pretty(&tenant.view()) {
            Ok(json) => println!("{}", json),
            Err(err) => println!("Tenant payload unavailable: {}", err),
        }
    }

    Ok(())
}

fn render_resolution(host: &str, resolution: &Resolution) {
    let tenant = resolution
        .tenant()
        .map(describe)
        .unwrap_or_else(|| "no tenant".to_string());
    println!("- {} -> {} ({})", host, tenant, resolution.label());
}

fn describe(tenant: &Tenant) -> String {
    format!("{} [{}]", tenant.company_name, tenant.slug)
}

fn demo_user() -> UserId {
    UserId("staff@batimart.example".to_string())
}

fn user_session(last_activity: DateTime<Utc>) -> SessionData {
    let mut session = SessionData::for_user(demo_user());
    session.set(LAST_ACTIVITY_KEY, last_activity.to_rfc3339());
    session
}

fn malformed_session() -> SessionData {
    let mut session = SessionData::for_user(demo_user());
    session.set(LAST_ACTIVITY_KEY, "not-a-timestamp".to_string());
    session
}
