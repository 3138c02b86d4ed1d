//! Roster state and transitions.
//!
//! The roster holds the sign-up list (capacity-bounded, join order), the
//! waitlist (FIFO, unbounded), the payment set, and the optional custom
//! title. Identity is the user id throughout; display names are carried
//! along but never used for lookups.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Maximum number of participants in the sign-up list.
pub const CAPACITY: usize = 12;

/// Opaque user identifier (a Telegram user id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry in the sign-up list or the waitlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// User identity.
    pub id: UserId,

    /// Display name at the time of the action. Informational only; a user
    /// keeps their position even if the name changes between actions.
    pub name: String,
}

impl Participant {
    /// Create a participant entry.
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Result of a sign-up attempt. Positions are 1-based within the list the
/// actor ended up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    /// Appended to the sign-up list.
    Joined { position: usize },
    /// Moved from the waitlist into the sign-up list (a free slot opened).
    Promoted { position: usize },
    /// Was on the waitlist and the list is still full; re-queued at the tail.
    AlreadyWaitlisted { position: usize },
    /// Already in the sign-up list; no state change.
    AlreadySignedUp { position: usize },
    /// The list is full; appended to the waitlist.
    Waitlisted { position: usize },
}

/// Result of marking oneself uncertain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaybeOutcome {
    /// Moved from the sign-up list to the waitlist tail.
    MovedToWaitlist { position: usize },
    /// Already on the waitlist; no state change.
    AlreadyWaitlisted { position: usize },
    /// Appended to the waitlist directly.
    Waitlisted { position: usize },
}

/// Result of a full withdrawal (force majeure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawOutcome {
    /// Removed from the sign-up list or the waitlist.
    Removed,
    /// Was in neither list. The payment set is still purged.
    NotRegistered,
}

/// Result of a payment confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaidOutcome {
    /// Recorded (idempotent; repeating it changes nothing).
    Marked,
    /// Not in either list; payment refused.
    NotRegistered,
}

/// Aggregate roster state for one chat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    participants: Vec<Participant>,
    waitlist: Vec<Participant>,
    paid: HashSet<UserId>,
    title: Option<String>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reassemble a roster from persisted parts.
    pub fn from_parts(
        participants: Vec<Participant>,
        waitlist: Vec<Participant>,
        paid: HashSet<UserId>,
        title: Option<String>,
    ) -> Self {
        Self {
            participants,
            waitlist,
            paid,
            title,
        }
    }

    /// The sign-up list in join order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// The waitlist in FIFO order.
    pub fn waitlist(&self) -> &[Participant] {
        &self.waitlist
    }

    /// Ids with a confirmed payment.
    pub fn paid(&self) -> &HashSet<UserId> {
        &self.paid
    }

    /// Whether the given user has confirmed payment.
    pub fn is_paid(&self, id: UserId) -> bool {
        self.paid.contains(&id)
    }

    /// The custom title, if one is set.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn participant_position(&self, id: UserId) -> Option<usize> {
        self.participants.iter().position(|p| p.id == id)
    }

    fn waitlist_position(&self, id: UserId) -> Option<usize> {
        self.waitlist.iter().position(|p| p.id == id)
    }

    // --- Transitions ---

    /// Sign up, promoting from the waitlist when a slot is free.
    ///
    /// A waitlisted actor is promoted into the sign-up list if capacity
    /// allows; with a full list they are re-queued at the waitlist tail. A
    /// new actor joins the sign-up list, or the waitlist when the list is
    /// full.
    pub fn signup(&mut self, id: UserId, name: &str) -> SignupOutcome {
        if let Some(idx) = self.waitlist_position(id) {
            self.waitlist.remove(idx);
            if self.participants.len() < CAPACITY {
                self.participants.push(Participant::new(id, name));
                return SignupOutcome::Promoted {
                    position: self.participants.len(),
                };
            }
            self.waitlist.push(Participant::new(id, name));
            return SignupOutcome::AlreadyWaitlisted {
                position: self.waitlist.len(),
            };
        }

        if let Some(idx) = self.participant_position(id) {
            return SignupOutcome::AlreadySignedUp { position: idx + 1 };
        }

        if self.participants.len() < CAPACITY {
            self.participants.push(Participant::new(id, name));
            SignupOutcome::Joined {
                position: self.participants.len(),
            }
        } else {
            self.waitlist.push(Participant::new(id, name));
            SignupOutcome::Waitlisted {
                position: self.waitlist.len(),
            }
        }
    }

    /// Mark the actor uncertain: move them to the waitlist tail.
    ///
    /// Moving a participant out does NOT promote the waitlist head; a
    /// waitlisted user only advances through their own [`Roster::signup`].
    pub fn maybe(&mut self, id: UserId, name: &str) -> MaybeOutcome {
        if let Some(idx) = self.participant_position(id) {
            self.participants.remove(idx);
            self.waitlist.push(Participant::new(id, name));
            return MaybeOutcome::MovedToWaitlist {
                position: self.waitlist.len(),
            };
        }

        if let Some(idx) = self.waitlist_position(id) {
            return MaybeOutcome::AlreadyWaitlisted { position: idx + 1 };
        }

        self.waitlist.push(Participant::new(id, name));
        MaybeOutcome::Waitlisted {
            position: self.waitlist.len(),
        }
    }

    /// Withdraw entirely: leave both lists and forget the payment.
    ///
    /// The payment set is purged unconditionally, even when the actor was
    /// not registered. Never promotes the waitlist head.
    pub fn withdraw(&mut self, id: UserId) -> WithdrawOutcome {
        let before = self.participants.len() + self.waitlist.len();
        self.participants.retain(|p| p.id != id);
        self.waitlist.retain(|p| p.id != id);
        self.paid.remove(&id);

        if self.participants.len() + self.waitlist.len() < before {
            WithdrawOutcome::Removed
        } else {
            WithdrawOutcome::NotRegistered
        }
    }

    /// Record a payment for a registered actor.
    pub fn mark_paid(&mut self, id: UserId) -> PaidOutcome {
        if self.participant_position(id).is_none() && self.waitlist_position(id).is_none() {
            return PaidOutcome::NotRegistered;
        }
        self.paid.insert(id);
        PaidOutcome::Marked
    }

    /// Replace the custom title. Privilege is enforced by the caller.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Drop the custom title, falling back to the default heading.
    pub fn clear_title(&mut self) {
        self.title = None;
    }

    /// Reset the lists, payments, and title. The action journal is kept.
    pub fn clear_all(&mut self) {
        self.participants.clear();
        self.waitlist.clear();
        self.paid.clear();
        self.title = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: i64) -> UserId {
        UserId(n)
    }

    fn full_roster() -> Roster {
        let mut roster = Roster::new();
        for n in 1..=CAPACITY as i64 {
            roster.signup(id(n), &format!("user{n}"));
        }
        roster
    }

    #[test]
    fn signup_assigns_join_order_positions() {
        let mut roster = Roster::new();
        assert_eq!(roster.signup(id(1), "a"), SignupOutcome::Joined { position: 1 });
        assert_eq!(roster.signup(id(2), "b"), SignupOutcome::Joined { position: 2 });
        assert_eq!(roster.participants().len(), 2);
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let mut roster = Roster::new();
        for n in 1..=40 {
            roster.signup(id(n), "x");
            assert!(roster.participants().len() <= CAPACITY);
        }
        assert_eq!(roster.participants().len(), CAPACITY);
    }

    #[test]
    fn thirteenth_signer_waitlisted_at_head() {
        let mut roster = full_roster();
        assert_eq!(
            roster.signup(id(13), "late"),
            SignupOutcome::Waitlisted { position: 1 }
        );
        assert_eq!(roster.waitlist()[0].id, id(13));
    }

    #[test]
    fn repeated_signup_is_a_no_op() {
        let mut roster = Roster::new();
        roster.signup(id(1), "a");
        assert_eq!(
            roster.signup(id(1), "a"),
            SignupOutcome::AlreadySignedUp { position: 1 }
        );
        assert_eq!(roster.participants().len(), 1);
        assert!(roster.waitlist().is_empty());
    }

    #[test]
    fn signup_promotes_from_waitlist_when_slot_frees() {
        let mut roster = full_roster();
        roster.signup(id(13), "late");
        roster.withdraw(id(1));

        assert_eq!(
            roster.signup(id(13), "late"),
            SignupOutcome::Promoted { position: CAPACITY }
        );
        assert!(roster.waitlist().is_empty());
    }

    #[test]
    fn signup_while_full_requeues_at_waitlist_tail() {
        let mut roster = full_roster();
        roster.signup(id(13), "first");
        roster.signup(id(14), "second");

        assert_eq!(
            roster.signup(id(13), "first"),
            SignupOutcome::AlreadyWaitlisted { position: 2 }
        );
        assert_eq!(roster.waitlist()[0].id, id(14));
        assert_eq!(roster.waitlist()[1].id, id(13));
    }

    #[test]
    fn id_never_in_both_lists() {
        let mut roster = full_roster();
        roster.signup(id(13), "x");
        roster.maybe(id(1), "user1");
        roster.signup(id(1), "user1");
        roster.withdraw(id(2));
        roster.signup(id(13), "x");

        for p in roster.participants() {
            assert!(roster.waitlist().iter().all(|w| w.id != p.id));
        }
    }

    #[test]
    fn maybe_moves_participant_to_waitlist_tail() {
        let mut roster = Roster::new();
        roster.signup(id(1), "a");
        roster.signup(id(2), "b");
        roster.maybe(id(3), "c");

        assert_eq!(
            roster.maybe(id(1), "a"),
            MaybeOutcome::MovedToWaitlist { position: 2 }
        );
        // c keeps its head slot, a lands behind it
        assert_eq!(roster.waitlist()[0].id, id(3));
        assert_eq!(roster.waitlist()[1].id, id(1));
        assert_eq!(roster.participants().len(), 1);
    }

    #[test]
    fn maybe_does_not_promote_anyone() {
        let mut roster = full_roster();
        roster.signup(id(13), "w");
        roster.maybe(id(1), "user1");

        // the freed slot stays free until id 13 signs up again
        assert_eq!(roster.participants().len(), CAPACITY - 1);
        assert_eq!(roster.waitlist().len(), 2);
    }

    #[test]
    fn maybe_on_waitlisted_is_a_no_op() {
        let mut roster = Roster::new();
        roster.maybe(id(1), "a");
        assert_eq!(
            roster.maybe(id(1), "a"),
            MaybeOutcome::AlreadyWaitlisted { position: 1 }
        );
        assert_eq!(roster.waitlist().len(), 1);
    }

    #[test]
    fn withdraw_removes_from_either_list() {
        let mut roster = Roster::new();
        roster.signup(id(1), "a");
        roster.maybe(id(2), "b");

        assert_eq!(roster.withdraw(id(1)), WithdrawOutcome::Removed);
        assert_eq!(roster.withdraw(id(2)), WithdrawOutcome::Removed);
        assert!(roster.participants().is_empty());
        assert!(roster.waitlist().is_empty());
    }

    #[test]
    fn withdraw_does_not_promote_waitlist_head() {
        let mut roster = full_roster();
        roster.signup(id(13), "w");
        roster.withdraw(id(1));

        assert_eq!(roster.participants().len(), CAPACITY - 1);
        assert_eq!(roster.waitlist().len(), 1);
        assert_eq!(roster.waitlist()[0].id, id(13));
    }

    #[test]
    fn withdraw_purges_payment_even_when_not_registered() {
        let mut roster = Roster::new();
        roster.signup(id(1), "a");
        roster.mark_paid(id(1));
        roster.withdraw(id(1));
        assert!(!roster.is_paid(id(1)));

        // unregistered id: correct signal, and still a harmless purge
        assert_eq!(roster.withdraw(id(99)), WithdrawOutcome::NotRegistered);
    }

    #[test]
    fn mark_paid_requires_registration() {
        let mut roster = Roster::new();
        assert_eq!(roster.mark_paid(id(1)), PaidOutcome::NotRegistered);
        assert!(!roster.is_paid(id(1)));
    }

    #[test]
    fn mark_paid_is_idempotent() {
        let mut roster = Roster::new();
        roster.signup(id(1), "a");
        assert_eq!(roster.mark_paid(id(1)), PaidOutcome::Marked);
        assert_eq!(roster.mark_paid(id(1)), PaidOutcome::Marked);
        assert_eq!(roster.paid().len(), 1);
    }

    #[test]
    fn waitlisted_user_can_mark_paid() {
        let mut roster = full_roster();
        roster.signup(id(13), "w");
        assert_eq!(roster.mark_paid(id(13)), PaidOutcome::Marked);
    }

    #[test]
    fn clear_all_resets_everything() {
        let mut roster = full_roster();
        roster.signup(id(13), "w");
        roster.mark_paid(id(1));
        roster.set_title("Friday session");

        roster.clear_all();
        assert!(roster.participants().is_empty());
        assert!(roster.waitlist().is_empty());
        assert!(roster.paid().is_empty());
        assert_eq!(roster.title(), None);
    }

    #[test]
    fn title_set_and_clear() {
        let mut roster = Roster::new();
        assert_eq!(roster.title(), None);
        roster.set_title("Evening game");
        assert_eq!(roster.title(), Some("Evening game"));
        roster.clear_title();
        assert_eq!(roster.title(), None);
    }
}
