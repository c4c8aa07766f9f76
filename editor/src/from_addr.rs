use url::Url;

use crate::{EditorConfig, Error, MemoryRepository};

/// Constructs a new [MemoryRepository] from an URI.
///
/// Only the `memory://` scheme is supported. Editor settings are passed as
/// query parameters, see [EditorConfig], e.g.
/// `memory://?resurrect=alter&trace=true`.
pub fn from_addr(uri: &str) -> Result<MemoryRepository, Error> {
    let url = Url::parse(uri)
        .map_err(|e| Error::InvalidArgument(format!("unable to parse url: {}", e)))?;

    match url.scheme() {
        "memory" => {
            // memory doesn't support host or path in the URL.
            if url.has_host() || !url.path().is_empty() {
                return Err(Error::InvalidArgument("invalid url".to_string()));
            }

            let config: EditorConfig = serde_qs::from_str(url.query().unwrap_or_default())
                .map_err(|e| {
                    Error::InvalidArgument(format!("failed to parse parameters: {}", e))
                })?;

            Ok(MemoryRepository::new(config))
        }
        scheme => Err(Error::InvalidArgument(format!(
            "unknown scheme: {}",
            scheme
        ))),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::from_addr;
    use crate::{EditorConfig, ResurrectPolicy};

    #[rstest]
    /// This uses an unsupported scheme.
    #[case::unsupported_scheme("http://foo.example/test", None)]
    /// This correctly sets the scheme, and doesn't set a path.
    #[case::memory_valid("memory://", Some(EditorConfig::default()))]
    /// This sets a memory url host to `foo`
    #[case::memory_invalid_host("memory://foo", None)]
    /// This sets a memory url path to "/", which is invalid.
    #[case::memory_invalid_root_path("memory:///", None)]
    /// This sets a memory url path to "/foo", which is invalid.
    #[case::memory_invalid_root_path_foo("memory:///foo", None)]
    /// Both editor settings as query parameters.
    #[case::memory_params(
        "memory://?resurrect=alter&trace=true",
        Some(EditorConfig { resurrect: ResurrectPolicy::Alter, trace: true })
    )]
    /// An unknown query parameter.
    #[case::memory_unknown_param("memory://?foo=bar", None)]
    /// An unknown resurrection policy.
    #[case::memory_invalid_policy("memory://?resurrect=maybe", None)]
    fn test_from_addr(#[case] uri_str: &str, #[case] exp_config: Option<EditorConfig>) {
        match exp_config {
            Some(exp_config) => {
                let repo = from_addr(uri_str).expect("should succeed");
                assert_eq!(&exp_config, repo.config());
            }
            None => assert!(from_addr(uri_str).is_err(), "should fail"),
        }
    }
}
