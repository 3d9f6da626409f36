pub mod character;
pub mod codec;
pub mod protocol;

/// Version string exchanged during the handshake. The server refuses clients
/// whose version doesn't match its own.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");
