pub mod channel;
pub mod chunk;
pub mod credentials;
pub mod delivery;
pub mod error;
pub mod format;
pub mod registry;
pub mod retry;
pub mod verify;
pub mod webhook;
pub mod whatsapp;

pub use channel::ChannelAdapter;
pub use chunk::{chunk, chunk_for};
pub use credentials::CredentialStore;
pub use error::ChannelError;
pub use format::MarkupDialect;
pub use registry::AdapterRegistry;
pub use retry::RetryPolicy;
pub use verify::SignatureVerifier;
pub use webhook::{WebhookAdapter, WebhookEnvelope};
pub use whatsapp::WhatsAppAdapter;
