use axum::extract::Request;
use axum::http::header;

/// Canonical form used for both custom domains and the generic-host allow-list:
/// trimmed, port removed, lower-cased, without a trailing dot.
pub fn normalize_host(raw: &str) -> Option<String> {
    let trimmed = raw.trim();

    let without_port = if let Some(rest) = trimmed.strip_prefix('[') {
        // Bracketed IPv6 literal, optionally followed by `:port`.
        let end = rest.find(']')?;
        &rest[..end]
    } else if trimmed.matches(':').count() == 1 {
        trimmed.split(':').next().unwrap_or_default()
    } else {
        trimmed
    };

    let host = without_port.trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Canonical form of a custom domain entered by an administrator.
///
/// Stricter than [`normalize_host`]: only dot-separated DNS labels are accepted, so URLs,
/// ports, paths, and IP literals are rejected instead of being cut down to a fragment.
pub fn normalize_domain(raw: &str) -> Option<String> {
    let domain = raw.trim().trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() || domain.len() > 253 {
        return None;
    }

    let valid_label = |label: &str| {
        (1..=63).contains(&label.len())
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    };
    if domain.split('.').all(valid_label) {
        Some(domain)
    } else {
        None
    }
}

/// Host the client addressed, from the `Host` header or the absolute request URI.
pub fn request_host(request: &Request) -> Option<String> {
    let from_header = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());

    from_header
        .or_else(|| request.uri().host())
        .and_then(normalize_host)
}
