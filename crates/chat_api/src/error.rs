use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum ChatApiError {
    MissingApiKey,
    Request(reqwest::Error),
    Status(StatusCode, String),
    Serde(JsonError),
    RetryExhausted {
        status: Option<StatusCode>,
        last_error: Option<String>,
    },
    /// The connection dropped mid-stream, after a successful response had
    /// already started arriving.
    StreamFailed {
        message: String,
    },
    /// Image attachments incompatible with the selected model; raised before
    /// any network call.
    AttachmentPolicy {
        model: String,
    },
    /// Image-generation response carried no usable asset URLs.
    EmptyImageResponse,
    Cancelled,
    Unknown(String),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(rename = "error")]
    pub value: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayloadFields {
    pub message: Option<String>,
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
}

impl ErrorPayloadFields {
    pub fn message_or_code(&self) -> Option<String> {
        let explicit = self
            .message
            .as_deref()
            .and_then(non_empty_string)
            .or_else(|| self.code.as_deref().and_then(non_empty_string))
            .or_else(|| self.type_.as_deref().and_then(non_empty_string))?;
        Some(explicit.to_owned())
    }
}

impl fmt::Display for ChatApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "api key is required"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::RetryExhausted { status, last_error } => {
                let status = status
                    .map(|status| status.as_u16().to_string())
                    .unwrap_or_else(|| "n/a".to_owned());
                write!(
                    f,
                    "retry exhausted after max attempts (status: {status}, last_error: {last_error:?})"
                )
            }
            Self::StreamFailed { message } => write!(f, "stream failed: {message}"),
            Self::AttachmentPolicy { model } => write!(
                f,
                "image attachments are not supported by model '{model}'; pick a vision-capable model"
            ),
            Self::EmptyImageResponse => write!(f, "image generation returned no assets"),
            Self::Cancelled => write!(f, "request was cancelled"),
            Self::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ChatApiError {}

impl From<reqwest::Error> for ChatApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for ChatApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

impl ChatApiError {
    /// Cancellation is a terminal non-error state and must stay silent in
    /// user-facing surfaces.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    let parsed = match serde_json::from_str::<ErrorPayload>(body) {
        Ok(payload) => payload,
        Err(_) => {
            return if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.to_string()
            };
        }
    };

    if let Some(error) = parsed.value {
        if let Some(message) = error.message_or_code() {
            return message;
        }
    }

    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_error_message, ChatApiError};
    use reqwest::StatusCode;

    #[test]
    fn error_body_message_wins_over_raw_body() {
        let body = r#"{"error":{"message":"model overloaded","code":"overloaded"}}"#;
        assert_eq!(
            parse_error_message(StatusCode::SERVICE_UNAVAILABLE, body),
            "model overloaded"
        );
    }

    #[test]
    fn code_is_used_when_message_is_absent() {
        let body = r#"{"error":{"code":"invalid_request"}}"#;
        assert_eq!(
            parse_error_message(StatusCode::BAD_REQUEST, body),
            "invalid_request"
        );
    }

    #[test]
    fn non_json_body_passes_through() {
        assert_eq!(
            parse_error_message(StatusCode::BAD_GATEWAY, "upstream connect error"),
            "upstream connect error"
        );
    }

    #[test]
    fn empty_body_falls_back_to_canonical_reason() {
        assert_eq!(
            parse_error_message(StatusCode::NOT_FOUND, ""),
            "Not Found"
        );
    }

    #[test]
    fn cancellation_is_classified_silent() {
        assert!(ChatApiError::Cancelled.is_cancellation());
        assert!(!ChatApiError::MissingApiKey.is_cancellation());
    }

    #[test]
    fn mid_stream_failures_keep_the_transport_message() {
        let error = ChatApiError::StreamFailed {
            message: "connection reset by peer".to_owned(),
        };
        assert_eq!(error.to_string(), "stream failed: connection reset by peer");
        assert!(!error.is_cancellation());
    }
}
