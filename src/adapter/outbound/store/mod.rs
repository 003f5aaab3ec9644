//! External store adapter: action envelope types and the HTTP gateway.

pub mod dto;
pub mod http;

pub use dto::parse_blacklist;
pub use http::HttpStoreGateway;
