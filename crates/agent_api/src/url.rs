/// Default base URL of the agent backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Join a resource path onto a base URL.
///
/// Rules:
/// 1) an empty base falls back to [`DEFAULT_BASE_URL`]
/// 2) trailing slashes on the base are dropped
/// 3) the resource always starts with exactly one `/`
pub fn join_endpoint(base: &str, resource: &str) -> String {
    let base = if base.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        base.trim()
    };

    let trimmed = base.trim_end_matches('/');
    let resource = resource.trim().trim_start_matches('/');
    if resource.is_empty() {
        return trimmed.to_string();
    }
    format!("{trimmed}/{resource}")
}

/// `true` when `base` names an `http` or `https` origin.
pub fn is_http_base(base: &str) -> bool {
    let base = base.trim();
    if base.is_empty() {
        return true;
    }
    ["http://", "https://"].iter().any(|scheme| {
        base.len() > scheme.len()
            && base
                .get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}
