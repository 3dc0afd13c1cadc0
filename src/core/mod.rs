pub mod chat_client;
pub mod config;
pub mod credentials;
pub mod records;
pub mod settings;
pub mod tutor;
