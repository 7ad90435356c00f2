use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chat_api::{
    CancellationSignal, ChatApiClient, ChatApiConfig, ChatApiError, ChatMessage, ChatRequest,
    ContentPart, ImageSize, ImagesRequest, StreamOutcome,
};
use parley_tui::transcript::{Message, MessageId, Role};
use tracing::{debug, warn};

use crate::banner::{ErrorBanner, ERROR_BANNER_TTL};

pub type SharedState = Arc<Mutex<SessionState>>;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub model: String,
    pub system_prompt: Option<String>,
    /// Stop streams once the reasoning wrapper is final.
    pub thinking_only: bool,
    /// Cap on how many prior messages ride along as context; `None` sends
    /// the full history.
    pub context_messages: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_owned(),
            system_prompt: None,
            thinking_only: false,
            context_messages: None,
        }
    }
}

/// Conversation state shared between the session driver and the UI.
#[derive(Debug, Default)]
pub struct SessionState {
    pub messages: Vec<Message>,
    pub banner: ErrorBanner,
    pub streaming: Option<MessageId>,
    next_id: MessageId,
}

impl SessionState {
    fn allocate_id(&mut self) -> MessageId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn message_text(&self, id: MessageId) -> Option<&str> {
        self.messages
            .iter()
            .find(|message| message.id == id)
            .map(|message| message.text.as_str())
    }
}

/// One conversation against one model endpoint.
pub struct ChatSession {
    client: ChatApiClient,
    config: SessionConfig,
    state: SharedState,
    active_cancel: Mutex<Option<CancellationSignal>>,
}

impl ChatSession {
    pub fn new(api: ChatApiConfig, config: SessionConfig) -> Result<Self, ChatApiError> {
        Ok(Self {
            client: ChatApiClient::new(api)?,
            config,
            state: Arc::new(Mutex::new(SessionState::default())),
            active_cancel: Mutex::new(None),
        })
    }

    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Flip the active send's cancellation signal, if any. The partial
    /// text streamed so far stays in the transcript.
    pub fn cancel_active(&self) {
        if let Some(cancel) = lock(&self.active_cancel).as_ref() {
            cancel.store(true, Ordering::Release);
        }
    }

    /// Send a user turn and stream the reply into the transcript.
    ///
    /// Each call owns a fresh cancellation signal; cancelling this send
    /// never touches a later one.
    pub async fn send(
        &self,
        text: impl Into<String>,
        attachments: Vec<ContentPart>,
    ) -> Result<StreamOutcome, ChatApiError> {
        let text = text.into();
        let (assistant_id, request) = {
            let mut state = lock_shared(&self.state);
            let user_id = state.allocate_id();
            state.messages.push(Message::user(user_id, text.clone()));

            let history = self.history(&state);
            let assistant_id = state.allocate_id();
            state.messages.push(Message::assistant(assistant_id, ""));
            state.streaming = Some(assistant_id);

            let mut messages = history;
            messages.push(user_turn(text, attachments));
            (
                assistant_id,
                ChatRequest::streaming(self.config.model.clone(), messages),
            )
        };

        let cancellation: CancellationSignal = Arc::new(AtomicBool::new(false));
        *lock(&self.active_cancel) = Some(cancellation.clone());

        let shared = self.state.clone();
        let result = self
            .client
            .stream_chat(
                &request,
                Some(&cancellation),
                self.config.thinking_only,
                |full_text| {
                    let mut state = lock_shared(&shared);
                    if let Some(message) = state
                        .messages
                        .iter_mut()
                        .find(|message| message.id == assistant_id)
                    {
                        message.text = full_text.to_owned();
                    }
                },
            )
            .await;

        {
            let mut state = lock_shared(&self.state);
            state.streaming = None;
        }
        *lock(&self.active_cancel) = None;

        match result {
            Ok(outcome) => {
                let mut state = lock_shared(&self.state);
                if let Some(message) = state
                    .messages
                    .iter_mut()
                    .find(|message| message.id == assistant_id)
                {
                    message.text = outcome.text.clone();
                }
                debug!(thinking_only = outcome.thinking_only, "stream completed");
                Ok(outcome)
            }
            Err(error) if error.is_cancellation() => {
                debug!("stream cancelled; keeping partial text");
                Err(error)
            }
            Err(error) => {
                warn!(%error, "stream failed");
                {
                    let mut state = lock_shared(&self.state);
                    let empty = state
                        .message_text(assistant_id)
                        .is_some_and(|text| text.is_empty());
                    if empty {
                        state.messages.retain(|message| message.id != assistant_id);
                    }
                }
                self.show_transient_error(error.to_string());
                Err(error)
            }
        }
    }

    /// Generate images and append them to the transcript as an assistant
    /// turn.
    pub async fn generate_images(
        &self,
        prompt: impl Into<String>,
        count: u8,
        size: ImageSize,
    ) -> Result<Vec<String>, ChatApiError> {
        let prompt = prompt.into();
        let request = ImagesRequest::new(self.config.model.clone(), prompt.clone(), count, size);
        match self.client.generate_images(&request, None).await {
            Ok(urls) => {
                let mut state = lock_shared(&self.state);
                let id = state.allocate_id();
                state
                    .messages
                    .push(Message::assistant(id, "").with_images(urls.clone()));
                Ok(urls)
            }
            Err(error) => {
                warn!(%error, "image generation failed");
                self.show_transient_error(error.to_string());
                Err(error)
            }
        }
    }

    /// Show a banner and schedule its expiry.
    fn show_transient_error(&self, message: String) {
        let generation = lock_shared(&self.state).banner.show(message);
        let shared = self.state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ERROR_BANNER_TTL).await;
            lock_shared(&shared).banner.clear_if_current(generation);
        });
    }

    /// Prior turns as wire messages, oldest first. Assistant reasoning
    /// wrappers are stripped; only the visible answer goes back to the
    /// model.
    fn history(&self, state: &SessionState) -> Vec<ChatMessage> {
        let mut messages = Vec::new();
        if let Some(system) = self
            .config
            .system_prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
        {
            messages.push(ChatMessage::system(system));
        }

        // Last message is the user turn just pushed; context comes from
        // everything before it.
        let prior = &state.messages[..state.messages.len().saturating_sub(1)];
        let start = self
            .config
            .context_messages
            .map(|limit| prior.len().saturating_sub(limit))
            .unwrap_or(0);

        for message in &prior[start..] {
            match message.role {
                Role::User => messages.push(ChatMessage::user(message.text.clone())),
                Role::Assistant => {
                    let (_, answer) = parley_tui::split_reasoning(&message.text);
                    if !answer.is_empty() {
                        messages.push(ChatMessage::assistant(answer));
                    }
                }
            }
        }
        messages
    }
}

fn user_turn(text: String, attachments: Vec<ContentPart>) -> ChatMessage {
    if attachments.is_empty() {
        return ChatMessage::user(text);
    }
    let mut parts = vec![ContentPart::text(text)];
    parts.extend(attachments);
    ChatMessage::user_with_parts(parts)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn lock_shared(shared: &SharedState) -> MutexGuard<'_, SessionState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
