//! Telegram Bot API client.
//!
//! A thin JSON-over-HTTPS wrapper around the handful of Bot API methods the
//! bot needs: `getUpdates` long polling, `sendMessage`, `editMessageText`,
//! `answerCallbackQuery`, and `getChatMember` for the privilege check.
//!
//! The dispatcher and synchronizer talk to the [`ChatIo`] and [`Privileges`]
//! traits rather than the concrete client, so tests can stand in a fake
//! transport and inject edit failures.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// --- Incoming update types ---

/// One update from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

/// A chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

/// A chat.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// A Telegram user.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    /// Full display name, falling back to the username.
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None if !self.first_name.is_empty() => self.first_name.clone(),
            None => self
                .username
                .clone()
                .unwrap_or_else(|| "Unnamed".to_string()),
        }
    }
}

/// A button press on the inline keyboard.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    status: String,
}

// --- Keyboards ---

/// One inline button with a callback payload.
#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboardButton {
    fn new(text: &str, callback_data: &str) -> Self {
        Self {
            text: text.to_string(),
            callback_data: callback_data.to_string(),
        }
    }
}

/// Inline keyboard attached to the status message.
#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

/// Persistent reply keyboard listing the commands.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<String>>,
    pub resize_keyboard: bool,
}

/// Removes the reply keyboard (used while prompting for a title).
#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboardRemove {
    pub remove_keyboard: bool,
}

/// Any reply markup `sendMessage` accepts.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Inline(InlineKeyboardMarkup),
    Keyboard(ReplyKeyboardMarkup),
    Remove(ReplyKeyboardRemove),
}

impl ReplyMarkup {
    /// Markup that removes the reply keyboard.
    pub fn remove_keyboard() -> Self {
        ReplyMarkup::Remove(ReplyKeyboardRemove {
            remove_keyboard: true,
        })
    }
}

/// Inline action buttons under the status message.
pub fn action_keyboard(is_admin: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![InlineKeyboardButton::new("Sign up", "signup")],
        vec![InlineKeyboardButton::new("Maybe", "maybe")],
        vec![InlineKeyboardButton::new("Force majeure", "force_majeure")],
        vec![InlineKeyboardButton::new("Paid", "paid")],
    ];
    if is_admin {
        rows.push(vec![InlineKeyboardButton::new("📊 Stats", "stats")]);
    }
    InlineKeyboardMarkup {
        inline_keyboard: rows,
    }
}

/// Reply keyboard with the command menu.
pub fn menu_keyboard(is_admin: bool) -> ReplyKeyboardMarkup {
    let mut rows = vec![
        vec!["/start".to_string(), "/menu".to_string()],
        vec![
            "/settitle".to_string(),
            "/cleartitle".to_string(),
            "/clearall".to_string(),
        ],
    ];
    if is_admin {
        rows.push(vec!["/stats".to_string()]);
    }
    ReplyKeyboardMarkup {
        keyboard: rows,
        resize_keyboard: true,
    }
}

// --- Transport traits ---

/// Outbound chat operations the dispatcher and synchronizer need.
#[allow(async_fn_in_trait)]
pub trait ChatIo {
    /// Send a message; returns the new message id.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<i64>;

    /// Edit an existing message in place.
    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<()>;

    /// Acknowledge a callback query so the client stops its spinner.
    async fn ack_callback(&self, callback_id: &str) -> Result<()>;
}

/// Injected capability check for admin-only operations.
#[allow(async_fn_in_trait)]
pub trait Privileges {
    /// Whether the user may perform privileged operations in this chat.
    async fn is_privileged(&self, chat_id: i64, user_id: i64) -> bool;
}

// --- Client ---

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Serialize)]
struct GetUpdatesParams {
    offset: i64,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[derive(Serialize)]
struct SendMessageParams<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a ReplyMarkup>,
}

#[derive(Serialize)]
struct EditMessageParams<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct AnswerCallbackParams<'a> {
    callback_query_id: &'a str,
}

#[derive(Serialize)]
struct GetChatMemberParams {
    chat_id: i64,
    user_id: i64,
}

/// HTTP client for the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
}

impl TelegramClient {
    /// Create a client for the given API base URL and bot token.
    ///
    /// `request_timeout` bounds every API call; it must exceed the
    /// `getUpdates` long-poll hold time. A timed-out call surfaces as a
    /// recoverable [`Error::Transport`].
    pub fn new(api_url: &str, token: &str, request_timeout: std::time::Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            base: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    async fn call<P: Serialize, R: DeserializeOwned>(&self, method: &str, params: &P) -> Result<R> {
        let response = self
            .http
            .post(format!("{}/{}", self.base, method))
            .json(params)
            .send()
            .await?;

        let api: ApiResponse<R> = response.json().await?;
        if !api.ok {
            return Err(Error::Transport(
                api.description
                    .unwrap_or_else(|| format!("{method} rejected")),
            ));
        }
        api.result
            .ok_or_else(|| Error::Transport(format!("{method} returned no result")))
    }

    /// Long-poll for updates past the given offset.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &GetUpdatesParams {
                offset,
                timeout: timeout_secs,
                allowed_updates: &["message", "callback_query"],
            },
        )
        .await
    }
}

impl ChatIo for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<i64> {
        let message: Message = self
            .call(
                "sendMessage",
                &SendMessageParams {
                    chat_id,
                    text,
                    parse_mode: "HTML",
                    reply_markup: markup.as_ref(),
                },
            )
            .await?;
        Ok(message.message_id)
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        // the API returns the edited Message (or `true` in channels); the
        // payload is irrelevant here
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &EditMessageParams {
                    chat_id,
                    message_id,
                    text,
                    parse_mode: "HTML",
                    reply_markup: markup.as_ref(),
                },
            )
            .await?;
        Ok(())
    }

    async fn ack_callback(&self, callback_id: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackParams {
                    callback_query_id: callback_id,
                },
            )
            .await?;
        Ok(())
    }
}

impl Privileges for TelegramClient {
    async fn is_privileged(&self, chat_id: i64, user_id: i64) -> bool {
        let member: Result<ChatMember> = self
            .call("getChatMember", &GetChatMemberParams { chat_id, user_id })
            .await;
        match member {
            Ok(member) => matches!(member.status.as_str(), "administrator" | "creator"),
            Err(err) => {
                tracing::error!("privilege lookup failed for user {user_id}: {err}");
                false
            }
        }
    }
}
