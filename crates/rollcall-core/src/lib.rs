//! Rollcall roster engine
//!
//! The state machine behind a chat-driven sign-up list: a capacity-bounded
//! participant list, a FIFO waitlist for the overflow, a payment set, and an
//! optional custom title, plus the append-only action journal and the
//! formatter that renders everything as a single status message.
//!
//! # Design
//!
//! Everything in this crate is synchronous and deterministic. Operations
//! mutate a [`Roster`] in place and return a typed outcome describing where
//! the actor ended up; negative results ("already signed up", "not
//! registered") are outcomes, never errors. All I/O (persistence, the chat
//! transport, timestamps) lives in the bot crate.
//!
//! # Invariants
//!
//! - A user id is in at most one of {participants, waitlist} at any time.
//! - The participant list never exceeds [`CAPACITY`] entries.
//! - Withdrawal always discards the id from the payment set.

mod journal;
mod render;
mod roster;

pub use journal::{ActionEntry, TIMESTAMP_FORMAT};
pub use render::{render, render_journal, DEFAULT_TITLE};
pub use roster::{
    MaybeOutcome, PaidOutcome, Participant, Roster, SignupOutcome, UserId, WithdrawOutcome,
    CAPACITY,
};
