//! Request-independent services used by the handlers.

pub mod media_coordinator;
pub mod notifier;

pub use media_coordinator::{MediaCoordinator, PhotoUpload};
pub use notifier::{notifier_from_config, LogNotifier, NotificationSink, Notifier, TelegramNotifier};
