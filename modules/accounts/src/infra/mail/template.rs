use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::domain::mail::ResetMailTemplate;

const RESET_URL_PLACEHOLDER: &str = "{{RESET_URL}}";

/// Load the reset mail template.
///
/// `None` selects the built-in template. A configured path that cannot be
/// read, or that lacks the reset link placeholder, is a startup error.
/// Relative paths resolve against `home_dir`.
pub fn load_reset_template(path: Option<&str>, home_dir: &Path) -> anyhow::Result<ResetMailTemplate> {
    let Some(path) = path.filter(|p| !p.trim().is_empty()) else {
        return Ok(ResetMailTemplate::default());
    };
    let resolved = resolve(path, home_dir);
    let html = std::fs::read_to_string(&resolved)
        .with_context(|| format!("reading email template {}", resolved.display()))?;
    if !html.contains(RESET_URL_PLACEHOLDER) {
        anyhow::bail!(
            "email template {} has no {RESET_URL_PLACEHOLDER} placeholder",
            resolved.display()
        );
    }
    tracing::debug!(path = %resolved.display(), "Loaded reset mail template");
    Ok(ResetMailTemplate::new(html))
}

fn resolve(path: &str, home_dir: &Path) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        home_dir.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn none_uses_builtin() {
        let t = load_reset_template(None, Path::new("/nonexistent")).unwrap();
        let mail = t.render("a@b.io", "http://x/r?token=t", chrono::Duration::minutes(60));
        assert!(mail.html.contains("http://x/r?token=t"));
    }

    #[test]
    fn relative_path_resolves_against_home() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("templates")).unwrap();
        std::fs::write(
            dir.path().join("templates/reset.html"),
            "<p>{{APP_NAME}}: <a href=\"{{RESET_URL}}\">reset</a></p>",
        )
        .unwrap();

        let t = load_reset_template(Some("templates/reset.html"), dir.path()).unwrap();
        let mail = t.render("a@b.io", "http://x/r", chrono::Duration::minutes(30));
        assert_eq!(mail.html, "<p>Stargram: <a href=\"http://x/r\">reset</a></p>");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = load_reset_template(Some("nope.html"), dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("nope.html"));
    }

    #[test]
    fn template_without_link_is_rejected() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("t.html");
        std::fs::write(&file, "<p>no link</p>").unwrap();
        assert!(load_reset_template(Some(file.to_str().unwrap()), dir.path()).is_err());
    }
}
