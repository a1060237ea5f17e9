pub mod error;
pub mod health;
pub mod incoming;
pub mod telegram;
pub mod whatsapp;
