//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Link target with script-capable schemes replaced by `#`
pub fn safe_href(href: &str) -> String {
    let href = href.trim();
    let scheme = href
        .split_once(':')
        .map(|(scheme, _)| scheme.to_ascii_lowercase());
    match scheme.as_deref() {
        Some("javascript") | Some("vbscript") | Some("data") => "#".to_string(),
        _ => href.to_string(),
    }
}

/// Content of the generator meta tag
pub fn meta_generator() -> String {
    format!("medium-blog {}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_safe_href() {
        assert_eq!(safe_href("https://example.com"), "https://example.com");
        assert_eq!(safe_href("/post/a"), "/post/a");
        assert_eq!(safe_href("mailto:a@b.c"), "mailto:a@b.c");
        assert_eq!(safe_href(" JavaScript:alert(1)"), "#");
        assert_eq!(safe_href("data:text/html,hi"), "#");
    }

    #[test]
    fn test_meta_generator() {
        assert!(meta_generator().starts_with("medium-blog "));
    }
}
