pub mod binder;
pub mod clock;
pub mod config;
pub mod daemon;
pub mod ipc;
pub mod policy;
pub mod presenter;
pub mod state;
pub mod store;
pub mod ticker;

#[cfg(test)]
mod test_support;

pub use binder::{AuthEvent, SessionLifecycleBinder};
pub use daemon::Daemon;
pub use policy::{AgeBracket, BreakPolicy};
pub use presenter::{AlertPresenter, AlertView};
pub use state::{SessionCommand, SessionState};
pub use store::{SessionStore, SharedStore};
