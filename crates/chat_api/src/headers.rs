use std::collections::BTreeMap;

use crate::config::ChatApiConfig;
use crate::error::ChatApiError;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_USER_AGENT: &str = "user-agent";

/// Build a deterministic header map for chat transport requests.
///
/// `streaming` selects the SSE accept header for chat-completion streams;
/// the image-generation endpoint answers plain JSON.
pub fn build_headers(
    config: &ChatApiConfig,
    streaming: bool,
) -> Result<BTreeMap<String, String>, ChatApiError> {
    if config.api_key.trim().is_empty() {
        return Err(ChatApiError::MissingApiKey);
    }

    let mut headers = BTreeMap::new();
    headers.insert(
        HEADER_AUTHORIZATION.to_owned(),
        format!("Bearer {}", config.api_key.trim()),
    );
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );
    headers.insert(
        HEADER_ACCEPT.to_owned(),
        if streaming {
            "text/event-stream".to_owned()
        } else {
            "application/json".to_owned()
        },
    );

    if let Some(user_agent) = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        headers.insert(HEADER_USER_AGENT.to_owned(), user_agent.to_owned());
    }

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::{build_headers, HEADER_ACCEPT, HEADER_AUTHORIZATION};
    use crate::config::ChatApiConfig;
    use crate::error::ChatApiError;

    #[test]
    fn missing_api_key_is_rejected() {
        let config = ChatApiConfig::default();
        assert!(matches!(
            build_headers(&config, true),
            Err(ChatApiError::MissingApiKey)
        ));
    }

    #[test]
    fn streaming_headers_request_event_stream() {
        let config = ChatApiConfig::new("sk-test");
        let headers = build_headers(&config, true).expect("headers should build");
        assert_eq!(
            headers.get(HEADER_AUTHORIZATION).map(String::as_str),
            Some("Bearer sk-test")
        );
        assert_eq!(
            headers.get(HEADER_ACCEPT).map(String::as_str),
            Some("text/event-stream")
        );
    }

    #[test]
    fn non_streaming_headers_request_json() {
        let config = ChatApiConfig::new("sk-test");
        let headers = build_headers(&config, false).expect("headers should build");
        assert_eq!(
            headers.get(HEADER_ACCEPT).map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn extra_headers_are_lowercased_and_merged() {
        let config = ChatApiConfig::new("sk-test").insert_header("X-Custom", " value ");
        let headers = build_headers(&config, true).expect("headers should build");
        assert_eq!(headers.get("x-custom").map(String::as_str), Some("value"));
    }
}
