pub mod error;
pub mod retry_client;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;
