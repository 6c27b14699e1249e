pub mod app_config;
pub mod credentials;
pub mod error;
