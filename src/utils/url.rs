//! Endpoint URL helpers.
//!
//! Base URLs come from user configuration and frequently carry a trailing
//! slash; joining them naively produces `//chat/completions`.

/// Strip trailing slashes from a base URL.
///
/// ```
/// use concept_mentor::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.siliconflow.cn/v1/"), "https://api.siliconflow.cn/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash.
///
/// ```
/// use concept_mentor::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.siliconflow.cn/v1/", "/chat/completions"),
///     "https://api.siliconflow.cn/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalize_base_url(base_url), endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_every_trailing_slash() {
        assert_eq!(
            normalize_base_url("https://api.siliconflow.cn/v1"),
            "https://api.siliconflow.cn/v1"
        );
        assert_eq!(
            normalize_base_url("https://api.siliconflow.cn/v1///"),
            "https://api.siliconflow.cn/v1"
        );
        assert_eq!(
            normalize_base_url("  http://127.0.0.1:8080/ "),
            "http://127.0.0.1:8080"
        );
        assert_eq!(normalize_base_url("///"), "");
    }

    #[test]
    fn construct_joins_with_single_slash() {
        for base in ["http://localhost/v1", "http://localhost/v1/"] {
            for endpoint in ["chat/completions", "/chat/completions", "///chat/completions"] {
                assert_eq!(
                    construct_api_url(base, endpoint),
                    "http://localhost/v1/chat/completions"
                );
            }
        }
    }
}
