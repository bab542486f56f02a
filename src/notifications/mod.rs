pub mod console;
pub mod telegram;
pub mod template;
pub mod worker;

pub use console::ConsoleNotifier;
pub use telegram::TelegramNotifier;
pub use worker::{build_swap_context, NotificationWorker};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API returned {status}: {body}")]
    Status { status: u16, body: String },
}
