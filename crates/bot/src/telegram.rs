use crate::command::Command;
use crate::handler::{BotHandler, Inbound};
use async_trait::async_trait;
use kabu_core::notify::entity::{InlineKeyboard, MessageRef, TextFormat};
use kabu_core::notify::error::NotifyError;
use kabu_core::notify::port::ChatTransport;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pause before polling again after a failed `getUpdates` call.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// # Summary
/// A chat transport that talks to the Telegram Bot API.
///
/// # Invariants
/// * `bot_token` must be valid.
/// * Each method performs a single request without retries.
pub struct TelegramTransport {
    /// The HTTP client used for requests.
    client: Client,
    /// The API root, e.g. `https://api.telegram.org`.
    api_url: String,
    /// The Bot API token.
    bot_token: String,
    /// Per-request timeout, extended by the long-poll timeout for `getUpdates`.
    timeout: Duration,
}

/// # Summary
/// Envelope shared by every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// An incoming update from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Vec<Value>,
    pub document: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub message: Option<Message>,
    pub data: Option<String>,
}

impl Message {
    fn reference(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat.id,
            message_id: self.message_id,
        }
    }

    fn is_image(&self) -> bool {
        !self.photo.is_empty() || self.document.is_some()
    }
}

impl Update {
    /// # Summary
    /// Converts a raw update into a platform-neutral event.
    ///
    /// # Returns
    /// * `None` for update kinds the bot does not handle, and for callbacks
    ///   whose originating message is no longer available.
    pub fn into_inbound(self) -> Option<Inbound> {
        if let Some(query) = self.callback_query {
            let message = query.message?;
            return Some(Inbound::Callback {
                id: query.id,
                chat_id: message.chat.id,
                message: Some(message.reference()),
                from_image: message.is_image(),
                data: query.data.unwrap_or_default(),
            });
        }

        let message = self.message?;
        let text = message.text?;
        let chat_id = message.chat.id;
        Some(match Command::parse(&text) {
            Some(command) => Inbound::Command { chat_id, command },
            None => Inbound::Text { chat_id, text },
        })
    }
}

fn parse_mode(format: TextFormat) -> Option<&'static str> {
    match format {
        TextFormat::Plain => None,
        TextFormat::Html => Some("HTML"),
    }
}

fn keyboard_json(keyboard: Option<&InlineKeyboard>) -> Result<Option<String>, NotifyError> {
    keyboard
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| NotifyError::Platform(format!("Failed to encode keyboard: {}", e)))
}

impl TelegramTransport {
    /// # Summary
    /// Creates a new `TelegramTransport`.
    ///
    /// # Logic
    /// Builds an HTTP client with the given per-request timeout.
    ///
    /// # Arguments
    /// * `api_url` - The Bot API root URL.
    /// * `bot_token` - The Telegram Bot API token.
    /// * `timeout` - Timeout applied to every request.
    ///
    /// # Returns
    /// * `Err(NotifyError::Config)` if the token is empty or the client cannot be built.
    pub fn new(api_url: &str, bot_token: &str, timeout: Duration) -> Result<Self, NotifyError> {
        if bot_token.trim().is_empty() {
            return Err(NotifyError::Config("Telegram bot token is empty".into()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token: bot_token.trim().to_string(),
            timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }

    /// # Summary
    /// Unwraps the Bot API envelope.
    ///
    /// # Logic
    /// Telegram reports failures as `ok: false` with a description, usually
    /// alongside a non-2xx status, so the body is parsed regardless of status.
    async fn decode<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<T, NotifyError> {
        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            NotifyError::Platform(format!("{} returned unreadable body ({}): {}", method, status, e))
        })?;

        match (envelope.ok, envelope.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(NotifyError::Platform(format!(
                "{} failed: {}",
                method,
                envelope
                    .description
                    .unwrap_or_else(|| format!("HTTP {}", status))
            ))),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, NotifyError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;
        Self::decode(method, response).await
    }

    /// # Summary
    /// Long-polls for new updates.
    ///
    /// # Arguments
    /// * `offset` - Identifier of the first update to return.
    /// * `poll_timeout` - How long Telegram may hold the request open.
    pub async fn get_updates(
        &self,
        offset: i64,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, NotifyError> {
        let body = json!({
            "offset": offset,
            "timeout": poll_timeout.as_secs(),
            "allowed_updates": ["message", "callback_query"],
        });
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .timeout(self.timeout + poll_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;
        Self::decode("getUpdates", response).await
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef, NotifyError> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(mode) = parse_mode(format) {
            body["parse_mode"] = json!(mode);
        }
        if let Some(markup) = keyboard {
            body["reply_markup"] = json!(markup);
        }
        let message: Message = self.call("sendMessage", &body).await?;
        Ok(message.reference())
    }

    /// # Summary
    /// Replaces the text and keyboard of an existing message.
    ///
    /// # Logic
    /// Telegram rejects edits that leave the message unchanged; that case is
    /// treated as success.
    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), NotifyError> {
        let mut body = json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
            "text": text,
        });
        if let Some(mode) = parse_mode(format) {
            body["parse_mode"] = json!(mode);
        }
        if let Some(markup) = keyboard {
            body["reply_markup"] = json!(markup);
        }
        match self.call::<Value>("editMessageText", &body).await {
            Ok(_) => Ok(()),
            Err(NotifyError::Platform(reason)) if reason.contains("message is not modified") => {
                debug!(message_id = message.message_id, "Edit skipped, message unchanged");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// # Summary
    /// Uploads an image as a multipart request.
    ///
    /// # Logic
    /// Telegram cannot display SVG as a photo, so SVG goes through
    /// `sendDocument` and raster formats through `sendPhoto`.
    async fn send_image(
        &self,
        chat_id: i64,
        image: Vec<u8>,
        content_type: &str,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef, NotifyError> {
        let (method, field, file_name) = if content_type == "image/svg+xml" {
            ("sendDocument", "document", "chart.svg")
        } else {
            ("sendPhoto", "photo", "chart.png")
        };

        let part = Part::bytes(image)
            .file_name(file_name)
            .mime_str(content_type)
            .map_err(|e| NotifyError::Platform(format!("Invalid content type: {}", e)))?;
        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part(field, part);
        if let Some(markup) = keyboard_json(keyboard)? {
            form = form.text("reply_markup", markup);
        }

        let response = self
            .client
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;
        let message: Message = Self::decode(method, response).await?;
        Ok(message.reference())
    }

    async fn delete_message(&self, message: MessageRef) -> Result<(), NotifyError> {
        let body = json!({ "chat_id": message.chat_id, "message_id": message.message_id });
        self.call::<bool>("deleteMessage", &body).await.map(|_| ())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), NotifyError> {
        let body = json!({ "callback_query_id": callback_id });
        self.call::<bool>("answerCallbackQuery", &body)
            .await
            .map(|_| ())
    }
}

/// # Summary
/// Long-polling loop that feeds Telegram updates into a `BotHandler`.
///
/// # Invariants
/// * Every update is handled on its own task so a slow ranking never blocks
///   other chats.
/// * The offset always advances past delivered updates, even if handling fails.
pub struct TelegramPoller {
    transport: Arc<TelegramTransport>,
    handler: Arc<BotHandler>,
    poll_timeout: Duration,
}

impl TelegramPoller {
    pub fn new(
        transport: Arc<TelegramTransport>,
        handler: Arc<BotHandler>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            handler,
            poll_timeout,
        }
    }

    /// # Summary
    /// Polls until the surrounding task is cancelled.
    ///
    /// # Logic
    /// 1. Calls `getUpdates` with the next offset.
    /// 2. Spawns a handler task per recognised update.
    /// 3. On failure, logs and waits before polling again.
    pub async fn run(&self) {
        info!(poll_timeout_secs = self.poll_timeout.as_secs(), "Telegram polling started");
        let mut offset = 0;
        loop {
            let updates = match self.transport.get_updates(offset, self.poll_timeout).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "getUpdates failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(event) = update.into_inbound() else {
                    continue;
                };
                let handler = self.handler.clone();
                tokio::spawn(async move {
                    if let Err(e) = handler.handle(event).await {
                        warn!(error = %e, "Failed to deliver reply");
                    }
                });
            }
        }
    }
}
