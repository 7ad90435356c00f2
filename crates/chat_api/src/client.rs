use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use crate::assemble::StreamAssembler;
use crate::config::ChatApiConfig;
use crate::error::{parse_error_message, ChatApiError};
use crate::headers::build_headers;
use crate::payload::{ChatRequest, ContentPart, ImagesRequest, ImagesResponse, MessageContent};
use crate::policy::supports_image_input;
use crate::retry::{is_retryable_http_error, retry_delay_ms, MAX_RETRIES};
use crate::sse::SseStreamParser;
use crate::url::{normalize_chat_url, normalize_images_url};

/// Per-send cancellation signal shared across request and stream loops.
///
/// Each send owns a fresh signal; flipping it cancels that stream and only
/// that stream.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct ChatApiClient {
    http: Client,
    config: ChatApiConfig,
}

/// Final state of a completed chat stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    /// Full assembled text, reasoning wrapper included.
    pub text: String,
    /// True when the stream was stopped early because only the reasoning
    /// phase was requested and its close marker became final.
    pub thinking_only: bool,
}

impl ChatApiClient {
    pub fn new(config: ChatApiConfig) -> Result<Self, ChatApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ChatApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ChatApiConfig {
        &self.config
    }

    pub fn chat_endpoint(&self) -> String {
        normalize_chat_url(&self.config.base_url)
    }

    pub fn images_endpoint(&self) -> String {
        normalize_images_url(&self.config.base_url)
    }

    fn header_map(&self, streaming: bool) -> Result<HeaderMap, ChatApiError> {
        let headers = build_headers(&self.config, streaming)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| ChatApiError::Unknown(format!("invalid header key: {key}")))?,
                HeaderValue::from_str(&value)
                    .map_err(|_| ChatApiError::Unknown(format!("invalid header value for {key}")))?,
            );
        }
        Ok(out)
    }

    pub fn build_chat_request(
        &self,
        request: &ChatRequest,
    ) -> Result<reqwest::RequestBuilder, ChatApiError> {
        validate_attachment_policy(request)?;
        let headers = self.header_map(true)?;
        Ok(self
            .http
            .post(self.chat_endpoint())
            .headers(headers)
            .json(request))
    }

    pub async fn send_with_retry(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, ChatApiError> {
        let mut last_status: Option<StatusCode> = None;
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if is_cancelled(cancellation) {
                return Err(ChatApiError::Cancelled);
            }

            let response = self.build_chat_request(request)?.send();
            let response = await_or_cancel(response, cancellation)
                .await?
                .map_err(ChatApiError::from);

            match response {
                Ok(response) => {
                    if response.status().is_success() {
                        return Ok(response);
                    }

                    let status = response.status();
                    last_status = Some(status);
                    let body = await_or_cancel(response.text(), cancellation)
                        .await?
                        .unwrap_or_else(|_| {
                            status
                                .canonical_reason()
                                .unwrap_or("request failed")
                                .to_string()
                        });
                    let message = parse_error_message(status, &body);
                    last_error = Some(message.clone());

                    if attempt < MAX_RETRIES && is_retryable_http_error(status.as_u16(), &body) {
                        debug!(%status, attempt, "retrying chat request");
                        await_or_cancel(tokio::time::sleep(retry_delay_ms(attempt)), cancellation)
                            .await?;
                        continue;
                    }

                    return Err(ChatApiError::Status(status, message));
                }
                Err(error) => {
                    let message = error.to_string();
                    last_error = Some(message.clone());
                    if attempt < MAX_RETRIES {
                        debug!(attempt, "retrying after transport error");
                        await_or_cancel(tokio::time::sleep(retry_delay_ms(attempt)), cancellation)
                            .await?;
                        continue;
                    }
                    return Err(ChatApiError::RetryExhausted {
                        status: last_status,
                        last_error,
                    });
                }
            }
        }

        Err(ChatApiError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }

    /// Stream a chat completion, invoking `on_update` with the full
    /// assembled text after every frame that changes it.
    ///
    /// With `thinking_only` set, the stream terminates as soon as the
    /// reasoning wrapper's close marker is final, without waiting for the
    /// `[DONE]` sentinel.
    pub async fn stream_chat<F>(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
        thinking_only: bool,
        mut on_update: F,
    ) -> Result<StreamOutcome, ChatApiError>
    where
        F: FnMut(&str),
    {
        let response = self.send_with_retry(request, cancellation).await?;
        let mut bytes = response.bytes_stream();
        let mut parser = SseStreamParser::default();
        let mut assembler = StreamAssembler::new();
        let mut stopped_for_thinking = false;

        'stream: loop {
            let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
                break;
            };
            if is_cancelled(cancellation) {
                return Err(ChatApiError::Cancelled);
            }
            let chunk = chunk.map_err(|error| ChatApiError::StreamFailed {
                message: error.to_string(),
            })?;
            for event in parser.feed(&chunk) {
                if matches!(event, crate::events::ChatStreamEvent::Done) {
                    break 'stream;
                }
                if assembler.apply(&event) {
                    on_update(assembler.text());
                }
                if thinking_only && assembler.close_marker_is_final(&event) {
                    stopped_for_thinking = true;
                    break 'stream;
                }
            }
        }

        if is_cancelled(cancellation) {
            return Err(ChatApiError::Cancelled);
        }

        Ok(StreamOutcome {
            text: assembler.into_text(),
            thinking_only: stopped_for_thinking,
        })
    }

    /// Generate images; non-streaming. Returns one URL per asset.
    pub async fn generate_images(
        &self,
        request: &ImagesRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Vec<String>, ChatApiError> {
        let headers = self.header_map(false)?;
        let send = self
            .http
            .post(self.images_endpoint())
            .headers(headers)
            .json(request)
            .send();
        let response = await_or_cancel(send, cancellation).await??;

        let status = response.status();
        if !status.is_success() {
            let body = await_or_cancel(response.text(), cancellation)
                .await?
                .unwrap_or_default();
            return Err(ChatApiError::Status(status, parse_error_message(status, &body)));
        }

        let body: ImagesResponse = await_or_cancel(response.json(), cancellation).await??;
        body.asset_urls()
    }
}

/// Reject image attachments up front for models that cannot read them.
fn validate_attachment_policy(request: &ChatRequest) -> Result<(), ChatApiError> {
    let has_images = request.messages.iter().any(|message| {
        matches!(
            &message.content,
            MessageContent::Parts(parts)
                if parts.iter().any(|part| matches!(part, ContentPart::ImageUrl { .. }))
        )
    });

    if has_images && !supports_image_input(&request.model) {
        return Err(ChatApiError::AttachmentPolicy {
            model: request.model.clone(),
        });
    }
    Ok(())
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, ChatApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(ChatApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(ChatApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}
