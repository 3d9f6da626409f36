use crate::character::{PlayerId, SpeedConfig};
use serde::{Deserialize, Serialize};

/// Messages a client sends to the authoritative server.
///
/// The transport is an ordered reliable stream, so the sprint requests are
/// the "reliable remote invocation" of the design: the server is the only
/// writer of the sprint flag and handles these in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Opening handshake. Must be the first message on a connection.
    Hello { version: String },
    /// Ask the server to put our character in the sprinting state.
    StartSprint,
    /// Ask the server to return our character to walking.
    StopSprint,
}

/// Messages the server sends to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Handshake reply: the client's assigned id and the authoritative speed
    /// scalars for this session.
    Welcome {
        version: String,
        player: PlayerId,
        speeds: SpeedConfig,
    },
    /// The handshake was rejected; the connection will be closed.
    Refused { reason: String },
    /// Another player joined the session.
    PlayerJoined { player: PlayerId },
    /// A player left the session.
    PlayerLeft { player: PlayerId },
    /// A character's authoritative sprint flag changed. Observers apply the
    /// matching speed locally when this arrives.
    SprintChanged { player: PlayerId, sprinting: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_survive_the_wire_format() {
        let msg = ServerMessage::SprintChanged {
            player: PlayerId(3),
            sprinting: true,
        };
        let bytes = postcard::to_stdvec(&msg).unwrap();
        assert_eq!(postcard::from_bytes::<ServerMessage>(&bytes).unwrap(), msg);
    }
}
