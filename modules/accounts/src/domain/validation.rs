use crate::domain::error::DomainError;

pub const MAX_USER_NAME_LEN: usize = 30;

/// Trim and lower-case an email; used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Syntactic check only: one `@`, a non-empty local part and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), DomainError> {
    let invalid = || DomainError::invalid_email(email);
    if email.is_empty() || email.len() > 254 || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_user_name(user_name: &str) -> Result<(), DomainError> {
    if user_name.is_empty() {
        return Err(DomainError::invalid_user_name("must not be empty"));
    }
    if user_name.chars().any(char::is_whitespace) {
        return Err(DomainError::invalid_user_name("must not contain spaces"));
    }
    if user_name.contains('@') {
        return Err(DomainError::invalid_user_name("must not contain '@'"));
    }
    if user_name.chars().count() > MAX_USER_NAME_LEN {
        return Err(DomainError::invalid_user_name(format!(
            "must be at most {MAX_USER_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str, min: usize) -> Result<(), DomainError> {
    if password.chars().count() < min {
        return Err(DomainError::WeakPassword { min });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        for ok in ["a@b.co", "first.last+tag@mail.example.com"] {
            assert!(validate_email(ok).is_ok(), "{ok}");
        }
        for bad in ["", "plain", "@b.co", "a@b", "a@.co", "a@b.", "a b@c.de", "a@b@c.de"] {
            assert!(validate_email(bad).is_err(), "{bad}");
        }
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }

    #[test]
    fn user_names() {
        assert!(validate_user_name("ana.silva").is_ok());
        assert!(validate_user_name("").is_err());
        assert!(validate_user_name("ana silva").is_err());
        assert!(validate_user_name("ana@home").is_err());
        assert!(validate_user_name(&"x".repeat(31)).is_err());
    }

    #[test]
    fn passwords() {
        assert!(validate_password("123456", 6).is_ok());
        assert!(matches!(
            validate_password("12345", 6),
            Err(DomainError::WeakPassword { min: 6 })
        ));
    }
}
