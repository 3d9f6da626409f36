use crate::replication::FromServer;
use crate::SessionState;
use bevy::prelude::*;
use bevy::tasks::futures_lite::{future, StreamExt};
use bevy::tasks::{IoTaskPool, Task};
use futures_util::lock::{Mutex, MutexGuard};
use futures_util::SinkExt;
use holdout_common::codec::Codec;
use holdout_common::protocol::{ClientMessage, ServerMessage};
use holdout_common::PROTOCOL_VERSION;

#[cfg(not(target_family = "wasm"))]
mod native;
#[cfg(not(target_family = "wasm"))]
pub use native::*;

pub type Wire = Codec<ServerMessage, ClientMessage, WebSocket>;

/// A sprint request (or any other message) bound for the server. Systems
/// write these; [`flush_outbox`] owns the actual socket traffic.
#[derive(Debug, Clone, PartialEq, Eq, Event)]
pub struct SendToServer(pub ClientMessage);

#[derive(Debug, Resource)]
pub struct ClientConnection {
    inner: Mutex<Wire>,
}
impl ClientConnection {
    pub async fn connect(uri: &str) -> Result<Self, ConnectError> {
        let ws = Codec::new(WebSocket::connect(uri).await?);
        Ok(Self {
            inner: Mutex::new(ws),
        })
    }
    pub async fn lock(&self) -> MutexGuard<'_, Wire> {
        self.inner.lock().await
    }
    pub async fn read(&self) -> Option<ServerMessage> {
        self.inner.lock().await.next().await
    }
    pub async fn write(&self, msg: ClientMessage) {
        if let Err(err) = self.inner.lock().await.send(msg).await {
            error!(%err, "Error sending message");
        }
    }
    /// Try to read a message synchronously. Returns `None` if none are available, or `Some(None)` if the connection is closed
    pub fn try_read(&self) -> Option<Option<ServerMessage>> {
        let mut guard = self.inner.try_lock()?;
        future::block_on(future::poll_once(guard.next()))
    }
}

/// In-flight connection attempt.
#[derive(Resource)]
pub struct PendingConnection(Task<Result<ClientConnection, ConnectError>>);

pub fn start_connecting(mut commands: Commands, cfg: Res<crate::ClientPlugin>) {
    let Some(uri) = cfg.server.clone() else {
        error!("Entered the connecting state with no server address configured");
        return;
    };
    let task = IoTaskPool::get().spawn(async move { ClientConnection::connect(&uri).await });
    commands.insert_resource(PendingConnection(task));
}

/// Once the socket is up, open with a handshake; the session switches to
/// `Playing` when the welcome comes back.
pub fn finish_connecting(
    mut commands: Commands,
    pending: Option<ResMut<PendingConnection>>,
    mut next_state: ResMut<NextState<SessionState>>,
) {
    let Some(mut pending) = pending else { return };
    let Some(res) = future::block_on(future::poll_once(&mut pending.0)) else {
        return;
    };
    commands.remove_resource::<PendingConnection>();
    match res {
        Ok(conn) => {
            future::block_on(conn.write(ClientMessage::Hello {
                version: PROTOCOL_VERSION.to_string(),
            }));
            commands.insert_resource(conn);
        }
        Err(err) => {
            error!(%err, "Failed to connect to the server");
            next_state.set(SessionState::Offline);
        }
    }
}

/// Drain whatever the server sent this frame into [`FromServer`] events.
pub fn poll_connection(
    mut commands: Commands,
    conn: Option<Res<ClientConnection>>,
    mut messages: EventWriter<FromServer>,
    mut next_state: ResMut<NextState<SessionState>>,
) {
    let Some(conn) = conn else { return };
    while let Some(msg) = conn.try_read() {
        match msg {
            Some(msg) => {
                messages.write(FromServer(msg));
            }
            None => {
                info!("Server closed the connection");
                commands.remove_resource::<ClientConnection>();
                next_state.set(SessionState::Offline);
                return;
            }
        }
    }
}

pub fn flush_outbox(conn: Option<Res<ClientConnection>>, mut outbox: EventReader<SendToServer>) {
    let Some(conn) = conn else {
        outbox.clear();
        return;
    };
    for SendToServer(msg) in outbox.read() {
        future::block_on(conn.write(msg.clone()));
    }
}
