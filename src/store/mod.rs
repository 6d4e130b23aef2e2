//! Client-side entity stores.
//!
//! Each store owns its state behind a `parking_lot::RwLock` and mutates it
//! only through its reducer. Async operations call the gateway and dispatch
//! events describing the outcome; callers read snapshots.

pub mod projects;
pub mod reference;
pub mod tickets;

use std::sync::atomic::{AtomicU64, Ordering};

pub use projects::{ProjectEvent, ProjectState, ProjectStore, reduce_project_state};
pub use reference::{CategoryStore, ReferenceState, UserStore};
pub use tickets::{PendingStatus, TicketEvent, TicketState, TicketStore, reduce_ticket_state};

/// Loading/error/success flags shared by every store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl StoreStatus {
    pub(crate) fn start(&mut self) {
        self.loading = true;
        self.error = None;
        self.success = None;
    }

    pub(crate) fn succeed(&mut self, message: Option<&str>) {
        self.loading = false;
        self.error = None;
        self.success = message.map(str::to_string);
    }

    /// A background refresh: keeps the last success message so a refetch
    /// after a mutation does not hide it.
    pub(crate) fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub(crate) fn finish_fetch(&mut self) {
        self.loading = false;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
        self.success = None;
    }
}

/// Monotonic counter identifying fetch requests.
///
/// A response is applied only if its generation is the latest one issued,
/// so a slow earlier fetch cannot overwrite a newer result.
#[derive(Debug, Default)]
pub struct Generation(AtomicU64);

impl Generation {
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Confirms everything (`--yes`).
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}
