pub mod adapter;
pub mod api;
pub mod commands;
pub mod error;
pub mod update;

pub use adapter::TelegramAdapter;
pub use api::TelegramApi;
pub use error::TelegramError;
