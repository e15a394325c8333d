//! Base URL resolution and path joining.

/// Normalize the configured base URL: trim whitespace, drop one trailing slash.
/// Unset or blank means same-origin relative requests (`""`).
pub fn resolve_base_url(raw: Option<&str>) -> String {
    let trimmed = raw.unwrap_or_default().trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}

/// Join base and path with exactly one slash between them.
/// An empty base yields the path with a single leading slash.
pub fn join_url(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return format!("/{}", path);
    }
    format!("{}/{}", base, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_base_url() {
        assert_eq!(resolve_base_url(None), "");
        assert_eq!(resolve_base_url(Some("   ")), "");
        assert_eq!(resolve_base_url(Some("http://x/")), "http://x");
        assert_eq!(resolve_base_url(Some(" http://x/api ")), "http://x/api");
    }

    #[test]
    fn test_join_url_single_slash_for_every_combination() {
        for base in ["http://x", "http://x/", "http://x//"] {
            for path in ["groups/1", "/groups/1", "//groups/1"] {
                assert_eq!(join_url(base, path), "http://x/groups/1", "{base} + {path}");
            }
        }
    }

    #[test]
    fn test_join_url_empty_base() {
        assert_eq!(join_url("", "groups"), "/groups");
        assert_eq!(join_url("", "//groups"), "/groups");
        assert_eq!(join_url("/", "/expenses/7/receipt"), "/expenses/7/receipt");
    }
}
