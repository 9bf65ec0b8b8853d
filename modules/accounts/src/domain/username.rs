use crate::domain::validation::MAX_USER_NAME_LEN;

/// Base user name for a provider account: the profile name, else the email
/// local part; trimmed, spaces become `.`, lower-cased.
pub fn base_user_name(name: Option<&str>, email: &str) -> String {
    let source = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email).trim());

    let base: String = source
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(".")
        .to_lowercase()
        .chars()
        .filter(|c| *c != '@')
        .take(MAX_USER_NAME_LEN)
        .collect();

    if base.is_empty() {
        "user".to_string()
    } else {
        base
    }
}

/// `base`, then `base2`, `base3`, ...; the base is shortened so the result
/// never exceeds `MAX_USER_NAME_LEN` characters.
pub fn candidate(base: &str, attempt: u32) -> String {
    let suffix = if attempt <= 1 {
        String::new()
    } else {
        attempt.to_string()
    };
    let keep = MAX_USER_NAME_LEN.saturating_sub(suffix.len());
    let mut name: String = base.chars().take(keep).collect();
    name.push_str(&suffix);
    name
}
