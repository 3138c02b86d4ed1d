//! Rollcall bot - a Telegram sign-up list with a live status message.
//!
//! Users join a capacity-bounded sign-up list through inline buttons,
//! overflow into a waitlist, can withdraw or mark themselves paid, and
//! administrators manage the title and reset the roster. State is rendered
//! into one canonical chat message that is edited in place - the chat thread
//! shows a live dashboard instead of a stream of reposts.
//!
//! # Architecture
//!
//! - **rollcall-core**: the pure roster state machine and formatter
//! - **Storage**: JSON files for roster state and the append-only journal
//! - **Telegram**: Bot API client plus the `ChatIo`/`Privileges` seams
//! - **Sync**: edit-or-resend tracking of the canonical status message
//! - **Handlers**: command/button dispatch under one state lock
//! - **Health**: HTTP liveness endpoint

pub mod app;
pub mod error;
pub mod handlers;
pub mod health;
pub mod storage;
pub mod sync;
pub mod telegram;

pub use app::{App, AppConfig};
pub use error::{Error, Result};
