pub mod dto;
pub mod key_client;
pub mod response;

pub use key_client::HttpKeyService;
