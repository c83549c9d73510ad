use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// The header name and value are validated once at construction so a bad
/// key is reported at startup rather than on every poll.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .with_context(|| format!("invalid header name '{header_name}'"))?;
        let mut key = HeaderValue::from_str(key).context("API key is not a valid header value")?;
        key.set_sensitive(true);

        Ok(Self {
            inner,
            header_name,
            key,
        })
    }

    fn apply(&self, req: &mut reqwest::Request) {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.apply(&mut req);
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_sets_header() {
        let wrapper = ApiKey::new((), "x-api-key", "secret").unwrap();
        let mut req = reqwest::Request::new(
            reqwest::Method::GET,
            "https://example.com/feed".parse().unwrap(),
        );
        wrapper.apply(&mut req);

        let value = req.headers().get("x-api-key").unwrap();
        assert_eq!(value.to_str().unwrap(), "secret");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_new_rejects_control_characters_in_key() {
        assert!(ApiKey::new((), "x-api-key", "bad\nkey").is_err());
    }

    #[test]
    fn test_new_rejects_invalid_header_name() {
        assert!(ApiKey::new((), "not a header", "secret").is_err());
    }
}
