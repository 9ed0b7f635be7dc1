//! Logging and operator notifications.

mod logging;
mod notifications;

pub use logging::setup_logging;
pub use notifications::{LogNotifier, NotifierError, TelegramConfig, TelegramNotifier};
