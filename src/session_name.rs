//! Role session name derivation for sts:AssumeRoleWithWebIdentity

/// Maximum length of RoleSessionName accepted by STS
pub const MAX_LENGTH: usize = 64;

static DISALLOWED_RUN: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"[^A-Za-z0-9=,.@_]+").unwrap());

// Pattern of RoleSessionName as documented in the STS API reference
static VALID_SESSION_NAME: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"^[A-Za-z0-9_+=,.@-]{2,64}$").unwrap());

/// Derive a role session name from a role name and a pipeline id.
///
/// Every run of characters outside `[A-Za-z0-9=,.@_]` in the role name is replaced with a single
/// `-` and leading/trailing dashes are trimmed. A non-empty pipeline id is appended after a dash;
/// the role name part is shortened so the result never exceeds 64 characters. When the pipeline id
/// alone doesn't leave any room, the (truncated) pipeline id is returned as is.
pub fn derive_session_name(role_name: &str, pipeline_id: &str) -> String {
    let replaced = DISALLOWED_RUN.replace_all(role_name, "-");
    let sanitized = replaced.trim_matches('-');

    if pipeline_id.is_empty() {
        return truncate_chars(sanitized, MAX_LENGTH).to_owned();
    }

    match MAX_LENGTH.checked_sub(pipeline_id.chars().count() + 1) {
        Some(budget) if budget > 0 => {
            format!("{}-{}", truncate_chars(sanitized, budget), pipeline_id)
        }
        _ => truncate_chars(pipeline_id, MAX_LENGTH).to_owned(),
    }
}

/// Whether a user-given session name is acceptable to STS as is.
pub fn is_valid_session_name(name: &str) -> bool {
    VALID_SESSION_NAME.is_match(name)
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
