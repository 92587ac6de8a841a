//! Extract the expected revision from the `If-Match` request header.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::IF_MATCH, request::Parts},
};

/// Expected `_rev` for optimistic concurrency. `None` when the header is absent, empty, or `*`.
#[derive(Clone, Debug)]
pub struct IfMatch(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for IfMatch
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(IF_MATCH)
            .and_then(|v: &axum::http::HeaderValue| v.to_str().ok())
            .map(parse_revision)
            .filter(|s: &String| !s.is_empty() && s != "*");
        Ok(IfMatch(value))
    }
}

fn parse_revision(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw.strip_prefix("W/").unwrap_or(raw);
    raw.trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Option<String> {
        let mut builder = Request::builder().uri("/land/k");
        if let Some(h) = header {
            builder = builder.header(IF_MATCH, h);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        let IfMatch(rev) = IfMatch::from_request_parts(&mut parts, &()).await.unwrap();
        rev
    }

    #[tokio::test]
    async fn parses_header_forms() {
        assert_eq!(extract(None).await, None);
        assert_eq!(extract(Some("*")).await, None);
        assert_eq!(extract(Some("\"_abc\"")).await.as_deref(), Some("_abc"));
        assert_eq!(extract(Some("W/\"_abc\"")).await.as_deref(), Some("_abc"));
        assert_eq!(extract(Some(" _abc ")).await.as_deref(), Some("_abc"));
    }
}
