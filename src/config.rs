use std::time::Duration;
use url::Url;

/// Where the API lives when nothing else is specified.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Settings used when constructing an [`crate::ApiClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The API root, every endpoint path is appended to this.
    pub base_url: Url,
    pub user_agent: String,
    /// Give up on a request after this long. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn new(base_url: Url) -> Self {
        Config {
            base_url,
            ..Config::default()
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Config {
            timeout: Some(timeout),
            ..self
        }
    }

    /// Resolve an endpoint against the base URL, one path segment at a time.
    ///
    /// Each segment is percent-encoded, so an id containing `/` or `?` stays
    /// inside its own segment. The last segment of the base URL is always
    /// kept, `["auth", "login"]` against `http://host/api` gives
    /// `http://host/api/auth/login`.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, InvalidEndpoint> {
        if let Some(bad) = segments
            .iter()
            .copied()
            .find(|s| matches!(*s, "" | "." | ".."))
        {
            return Err(InvalidEndpoint::Segment(bad.to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                InvalidEndpoint::CannotBeABase(self.base_url.clone())
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }
}

/// An endpoint URL which couldn't be built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidEndpoint {
    /// Empty, `.` and `..` segments would change which endpoint is hit.
    #[error("\"{0}\" can't be used as part of an endpoint path")]
    Segment(String),
    #[error("{0} can't be used as a base URL")]
    CannotBeABase(Url),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: Url::parse(DEFAULT_BASE_URL)
                .expect("The default base URL is always valid"),
            user_agent: String::from(crate::DEFAULT_USER_AGENT),
            timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_the_api_prefix() {
        let config = Config::default();

        let got = config.endpoint(&["auth", "login"]).unwrap();

        assert_eq!(got.as_str(), "http://127.0.0.1:8000/api/auth/login");
    }

    #[test]
    fn trailing_slashes_on_the_base_are_ignored() {
        let config =
            Config::new(Url::parse("https://rides.example.com/api/").unwrap());

        let got = config.endpoint(&["rides", "driver", "my-rides"]).unwrap();

        assert_eq!(
            got.as_str(),
            "https://rides.example.com/api/rides/driver/my-rides"
        );
    }

    #[test]
    fn ids_cannot_escape_their_segment() {
        let config = Config::default();

        let traversal =
            config.endpoint(&["rides", "../admin/metrics"]).unwrap();
        let query = config.endpoint(&["rides", "abc?x=1"]).unwrap();

        assert_eq!(
            traversal.as_str(),
            "http://127.0.0.1:8000/api/rides/..%2Fadmin%2Fmetrics"
        );
        assert_eq!(query.as_str(), "http://127.0.0.1:8000/api/rides/abc%3Fx=1");
        assert_eq!(query.query(), None);
    }

    #[test]
    fn dot_segments_are_refused() {
        let config = Config::default();

        for segment in ["..", ".", ""].iter().copied() {
            let got = config.endpoint(&["rides", segment, "book"]);

            assert_eq!(
                got,
                Err(InvalidEndpoint::Segment(segment.to_string()))
            );
        }
    }
}
