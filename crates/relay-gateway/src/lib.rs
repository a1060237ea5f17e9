pub mod app;
pub mod dispatch;
pub mod exchange;
pub mod http;
