//! Async seams between the indexing core and its collaborators

pub mod cursor_store;
pub mod notifier;
pub mod signature_source;

pub use cursor_store::CursorStore;
pub use notifier::NotificationDispatcher;
pub use signature_source::{SignatureQuery, SignatureSource};
