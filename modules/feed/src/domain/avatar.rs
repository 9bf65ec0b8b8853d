const DICEBEAR_THUMBS: &str = "https://api.dicebear.com/7.x/thumbs/svg";

/// Deterministic avatar for a user name.
pub fn avatar_url(user_name: &str) -> String {
    let seed: String = url::form_urlencoded::byte_serialize(user_name.as_bytes()).collect();
    format!("{DICEBEAR_THUMBS}?seed={seed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_avatar() {
        assert_eq!(avatar_url("ana"), avatar_url("ana"));
        assert_ne!(avatar_url("ana"), avatar_url("bob"));
    }

    #[test]
    fn seed_is_encoded() {
        assert_eq!(
            avatar_url("ana lima&co"),
            "https://api.dicebear.com/7.x/thumbs/svg?seed=ana+lima%26co"
        );
    }
}
