/// Command and message handlers
pub mod handlers;
/// Photo download from Telegram file storage
pub mod photo;
/// Resilient messaging with automatic retry for Telegram API operations
pub mod resilient;
/// Unauthorized access log throttling
pub mod unauthorized_cache;

pub use unauthorized_cache::UnauthorizedCache;
