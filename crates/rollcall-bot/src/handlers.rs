//! Update dispatch: commands and button presses.
//!
//! Every inbound interaction runs the same sequence: privilege check where
//! required, roster mutation, journal append, state save, render, status
//! message sync. The whole sequence executes under one lock on the shared
//! state so concurrent button presses serialize instead of racing for the
//! last slot.
//!
//! Callback queries are acknowledged before the lock is taken, so the
//! pressing client gets its ack even while another interaction is in flight.

use crate::app::SharedState;
use crate::error::Result;
use crate::telegram::{
    action_keyboard, menu_keyboard, CallbackQuery, ChatIo, Message, Privileges, ReplyMarkup,
    Update, User,
};
use rollcall_core::{
    render, render_journal, ActionEntry, MaybeOutcome, PaidOutcome, SignupOutcome, UserId,
    WithdrawOutcome, TIMESTAMP_FORMAT,
};
use std::sync::Arc;
use tokio::sync::Mutex;

const WELCOME: &str = "Welcome! Use the buttons to interact, or /menu to see every command.";
const MENU_PROMPT: &str = "Pick a command from the menu below:";
const ADMIN_ONLY: &str = "This command is available to group administrators only!";
const TITLE_PROMPT: &str = "Please send the new title:";
const TITLE_CANCELLED: &str = "Title change cancelled.";

fn stamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn entry(user: &User, action: impl Into<String>) -> ActionEntry {
    ActionEntry::new(stamp(), user.id, user.display_name(), action)
}

/// Routes updates to command and button handlers over the shared state.
pub struct Dispatcher<T, P> {
    io: T,
    privileges: P,
    state: Arc<Mutex<SharedState>>,
}

impl<T: ChatIo, P: Privileges> Dispatcher<T, P> {
    /// Create a dispatcher over the shared state.
    pub fn new(io: T, privileges: P, state: Arc<Mutex<SharedState>>) -> Self {
        Self {
            io,
            privileges,
            state,
        }
    }

    /// Handle one update from the transport.
    pub async fn handle_update(&self, update: Update) -> Result<()> {
        if let Some(callback) = update.callback_query {
            return self.handle_callback(callback).await;
        }
        if let Some(message) = update.message {
            return self.handle_message(message).await;
        }
        Ok(())
    }

    // --- Messages and commands ---

    async fn handle_message(&self, message: Message) -> Result<()> {
        let Some(user) = message.from else {
            return Ok(());
        };
        let Some(text) = message.text else {
            return Ok(());
        };
        let chat_id = message.chat.id;
        let text = text.trim();

        if !text.starts_with('/') {
            return self.capture_title(chat_id, &user, text).await;
        }

        let command = text.split_whitespace().next().unwrap_or(text);
        let command = command.split('@').next().unwrap_or(command);
        match command {
            "/start" => self.cmd_start(chat_id, &user).await,
            "/menu" => self.cmd_menu(chat_id, &user).await,
            "/stats" => self.cmd_stats(chat_id, &user).await,
            "/settitle" => self.cmd_settitle(chat_id, &user).await,
            "/cancel" => self.cmd_cancel(chat_id, &user).await,
            "/cleartitle" => self.cmd_cleartitle(chat_id, &user).await,
            "/clearall" => self.cmd_clearall(chat_id, &user).await,
            _ => Ok(()),
        }
    }

    async fn cmd_start(&self, chat_id: i64, user: &User) -> Result<()> {
        let is_admin = self.privileges.is_privileged(chat_id, user.id).await;
        self.io
            .send_message(
                chat_id,
                WELCOME,
                Some(ReplyMarkup::Keyboard(menu_keyboard(is_admin))),
            )
            .await?;

        let mut state = self.state.lock().await;
        let text = render(&state.roster);
        let message_id = self
            .io
            .send_message(
                chat_id,
                &text,
                Some(ReplyMarkup::Inline(action_keyboard(is_admin))),
            )
            .await?;
        state.status.track(message_id);
        state.store.save_state(&state.roster, state.status.tracked())?;
        Ok(())
    }

    async fn cmd_menu(&self, chat_id: i64, user: &User) -> Result<()> {
        let is_admin = self.privileges.is_privileged(chat_id, user.id).await;
        self.io
            .send_message(
                chat_id,
                MENU_PROMPT,
                Some(ReplyMarkup::Keyboard(menu_keyboard(is_admin))),
            )
            .await?;
        Ok(())
    }

    async fn cmd_stats(&self, chat_id: i64, user: &User) -> Result<()> {
        if !self.require_admin(chat_id, user).await? {
            return Ok(());
        }
        let state = self.state.lock().await;
        let text = render_journal(&state.store.load_journal());
        self.io.send_message(chat_id, &text, None).await?;
        Ok(())
    }

    async fn cmd_settitle(&self, chat_id: i64, user: &User) -> Result<()> {
        if !self.require_admin(chat_id, user).await? {
            return Ok(());
        }
        let mut state = self.state.lock().await;
        state.pending_titles.insert(user.id);
        drop(state);
        self.io
            .send_message(chat_id, TITLE_PROMPT, Some(ReplyMarkup::remove_keyboard()))
            .await?;
        Ok(())
    }

    async fn cmd_cancel(&self, chat_id: i64, user: &User) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.pending_titles.remove(&user.id) {
            return Ok(());
        }
        drop(state);
        let is_admin = self.privileges.is_privileged(chat_id, user.id).await;
        self.io
            .send_message(
                chat_id,
                TITLE_CANCELLED,
                Some(ReplyMarkup::Keyboard(menu_keyboard(is_admin))),
            )
            .await?;
        Ok(())
    }

    /// Second step of `/settitle`: the actor's next plain-text message.
    async fn capture_title(&self, chat_id: i64, user: &User, text: &str) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if !state.pending_titles.remove(&user.id) {
                return Ok(());
            }
        }

        let is_admin = self.privileges.is_privileged(chat_id, user.id).await;
        let mut state = self.state.lock().await;
        state.roster.set_title(text);
        state
            .store
            .append_journal(entry(user, format!("Set the title: {text}")));
        state.store.save_state(&state.roster, state.status.tracked())?;
        self.io
            .send_message(
                chat_id,
                &format!("Title set: {text}"),
                Some(ReplyMarkup::Keyboard(menu_keyboard(is_admin))),
            )
            .await?;
        self.refresh_status(&mut state, chat_id, is_admin).await
    }

    async fn cmd_cleartitle(&self, chat_id: i64, user: &User) -> Result<()> {
        if !self.require_admin(chat_id, user).await? {
            return Ok(());
        }
        let mut state = self.state.lock().await;
        state.roster.clear_title();
        state.store.append_journal(entry(user, "Cleared the title"));
        state.store.save_state(&state.roster, state.status.tracked())?;
        self.io
            .send_message(
                chat_id,
                "Title cleared.",
                Some(ReplyMarkup::Keyboard(menu_keyboard(true))),
            )
            .await?;
        self.refresh_status(&mut state, chat_id, true).await
    }

    async fn cmd_clearall(&self, chat_id: i64, user: &User) -> Result<()> {
        if !self.require_admin(chat_id, user).await? {
            return Ok(());
        }
        let mut state = self.state.lock().await;
        state.roster.clear_all();
        state
            .store
            .append_journal(entry(user, "Cleared all sign-up data"));
        state.store.save_state(&state.roster, state.status.tracked())?;
        self.io
            .send_message(
                chat_id,
                "Sign-up list, waitlist, and payments cleared.",
                Some(ReplyMarkup::Keyboard(menu_keyboard(true))),
            )
            .await?;
        self.refresh_status(&mut state, chat_id, true).await
    }

    // --- Button presses ---

    async fn handle_callback(&self, callback: CallbackQuery) -> Result<()> {
        let Some(data) = callback.data else {
            return Ok(());
        };
        let Some(message) = callback.message else {
            return Ok(());
        };
        let chat_id = message.chat.id;
        let user = callback.from;

        // ack first so the client stops waiting, whatever happens below
        if let Err(err) = self.io.ack_callback(&callback.id).await {
            tracing::warn!("callback ack failed: {err}");
        }

        let is_admin = self.privileges.is_privileged(chat_id, user.id).await;

        if data == "stats" {
            if !is_admin {
                self.io
                    .send_message(chat_id, ADMIN_ONLY, None)
                    .await?;
                return Ok(());
            }
            let state = self.state.lock().await;
            let text = render_journal(&state.store.load_journal());
            self.io.send_message(chat_id, &text, None).await?;
            return Ok(());
        }

        let mut state = self.state.lock().await;
        let name = user.display_name();
        let id = UserId(user.id);

        let (notification, action) = match data.as_str() {
            "signup" => match state.roster.signup(id, &name) {
                SignupOutcome::Promoted { position } => (
                    format!("{name}, you have been moved from the waitlist into the sign-up list! Position: {position}"),
                    "Promoted from the waitlist to participants".to_string(),
                ),
                SignupOutcome::AlreadyWaitlisted { .. } => (
                    format!("{name}, you are already on the waitlist!"),
                    "Repeated sign-up attempt while waitlisted".to_string(),
                ),
                SignupOutcome::AlreadySignedUp { .. } => (
                    "You are already signed up!".to_string(),
                    "Repeated sign-up attempt".to_string(),
                ),
                SignupOutcome::Joined { position } => (
                    format!("{name}, you are signed up! Position: {position}"),
                    "Signed up".to_string(),
                ),
                SignupOutcome::Waitlisted { position } => (
                    format!("{name}, you have been added to the waitlist! Position: {position}"),
                    "Added to the waitlist".to_string(),
                ),
            },
            "maybe" => match state.roster.maybe(id, &name) {
                MaybeOutcome::MovedToWaitlist { position } => (
                    format!("{name}, you have been moved from the sign-up list to the waitlist! Position: {position}"),
                    "Moved from participants to the waitlist (maybe)".to_string(),
                ),
                MaybeOutcome::AlreadyWaitlisted { .. } => (
                    "You are already on the waitlist!".to_string(),
                    "Repeated waitlist attempt (maybe)".to_string(),
                ),
                MaybeOutcome::Waitlisted { position } => (
                    format!("{name}, you have been added to the waitlist! Position: {position}"),
                    "Added to the waitlist (maybe)".to_string(),
                ),
            },
            "force_majeure" => match state.roster.withdraw(id) {
                WithdrawOutcome::Removed => (
                    format!("{name}, you have been removed from the list/waitlist."),
                    "Removed from the list/waitlist (force majeure)".to_string(),
                ),
                WithdrawOutcome::NotRegistered => (
                    "You were not signed up.".to_string(),
                    "Withdrawal attempt while not registered (force majeure)".to_string(),
                ),
            },
            "paid" => match state.roster.mark_paid(id) {
                PaidOutcome::Marked => (
                    format!("{name}, payment recorded! ✅"),
                    "Confirmed payment".to_string(),
                ),
                PaidOutcome::NotRegistered => (
                    "You are not signed up yet. Sign up first!".to_string(),
                    "Payment attempt while not registered".to_string(),
                ),
            },
            _ => return Ok(()),
        };

        state.store.append_journal(entry(&user, action));
        state.store.save_state(&state.roster, state.status.tracked())?;

        let text = format!("{notification}\n\n{}", render(&state.roster));
        let changed = state
            .status
            .publish(&self.io, chat_id, &text, action_keyboard(is_admin))
            .await?;
        if changed {
            state.store.save_state(&state.roster, state.status.tracked())?;
        }
        Ok(())
    }

    // --- Helpers ---

    /// Render current state into the status message, persisting the tracked
    /// id when the synchronizer had to fall back to a new message.
    async fn refresh_status(
        &self,
        state: &mut SharedState,
        chat_id: i64,
        is_admin: bool,
    ) -> Result<()> {
        let text = render(&state.roster);
        let changed = state
            .status
            .publish(&self.io, chat_id, &text, action_keyboard(is_admin))
            .await?;
        if changed {
            state.store.save_state(&state.roster, state.status.tracked())?;
        }
        Ok(())
    }

    /// Check privilege; on denial, tell the actor and record nothing.
    async fn require_admin(&self, chat_id: i64, user: &User) -> Result<bool> {
        if self.privileges.is_privileged(chat_id, user.id).await {
            return Ok(true);
        }
        self.io.send_message(chat_id, ADMIN_ONLY, None).await?;
        Ok(false)
    }
}
