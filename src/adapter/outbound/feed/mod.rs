//! Exchange feed adapter: wire types, frame decoder and WebSocket transport.

pub mod decoder;
pub mod dto;
pub mod websocket;

pub use decoder::{decode, decode_text, DecodedFrame};
pub use websocket::WebSocketTransport;
