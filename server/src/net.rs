use async_net::{TcpListener, TcpStream};
use async_tungstenite::tungstenite::{self, Bytes, Message};
use async_tungstenite::WebSocketStream;
use bevy::prelude::*;
use bevy::tasks::futures_lite::{future, Stream, StreamExt};
use bevy::tasks::{IoTaskPool, Task};
use crossbeam_channel::{Receiver, Sender};
use futures_sink::Sink;
use futures_util::SinkExt;
use holdout_common::codec::Codec;
use holdout_common::protocol::{ClientMessage, ServerMessage};
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Server side of one client's reliable ordered channel.
#[derive(Debug)]
pub struct ServerSocket {
    inner: WebSocketStream<TcpStream>,
}
impl Stream for ServerSocket {
    type Item = Bytes;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Ready(Some(Ok(Message::Binary(v)))) => Poll::Ready(Some(v)),
            Poll::Ready(Some(Ok(Message::Text(v)))) => Poll::Ready(Some(v.into())),
            Poll::Ready(Some(Ok(Message::Frame(_)))) => {
                unreachable!("This will never be read when reading a message")
            }
            Poll::Ready(Some(Ok(Message::Ping(v)))) => {
                trace!(?v, "Received ping");
                Poll::Pending
            }
            Poll::Ready(Some(Ok(Message::Pong(v)))) => {
                trace!(?v, "Received pong");
                Poll::Pending
            }
            Poll::Ready(Some(Ok(Message::Close(_)))) => Poll::Ready(None),
            Poll::Ready(Some(Err(err))) => {
                error!(%err, "Error reading from websocket");
                Poll::Pending
            }
        }
    }
}
impl Sink<Vec<u8>> for ServerSocket {
    type Error = tungstenite::Error;

    fn start_send(mut self: Pin<&mut Self>, item: Vec<u8>) -> Result<(), Self::Error> {
        Pin::new(&mut self.inner).start_send(Message::Binary(Bytes::from_owner(item)))
    }
    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner).poll_ready(cx)
    }
    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner).poll_close(cx)
    }
    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }
}

pub type ClientStream = Codec<ClientMessage, ServerMessage, ServerSocket>;

/// One remote connection, pending or admitted.
#[derive(Debug, Component)]
pub struct Connection {
    socket: ClientStream,
    pub addr: SocketAddr,
}
impl Connection {
    /// Try to read a message synchronously. Returns `None` if none are available, or `Some(None)` if the connection is closed
    pub fn try_read(&mut self) -> Option<Option<ClientMessage>> {
        future::block_on(future::poll_once(self.socket.next()))
    }
    pub fn send(&mut self, msg: ServerMessage) {
        if let Err(err) = future::block_on(self.socket.send(msg)) {
            error!(addr = %self.addr, %err, "Error sending message");
        }
    }
}

/// Accepts remote connections on a background task and hands them to the ECS
/// over a channel.
#[derive(Resource)]
pub struct Listener {
    incoming: Receiver<(ServerSocket, SocketAddr)>,
    _task: Task<()>,
}
impl Listener {
    pub fn spawn(addr: &str) -> io::Result<Self> {
        let listener = future::block_on(TcpListener::bind(addr))?;
        info!(addr = %listener.local_addr()?, "Listening for connections");
        let (send, incoming) = crossbeam_channel::bounded(16);
        let task = IoTaskPool::get().spawn(accept_loop(listener, send));
        Ok(Self {
            incoming,
            _task: task,
        })
    }
    pub fn try_accept(&self) -> Option<(ServerSocket, SocketAddr)> {
        self.incoming.try_recv().ok()
    }
}

async fn accept_loop(listener: TcpListener, send: Sender<(ServerSocket, SocketAddr)>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => match async_tungstenite::accept_async(stream).await {
                Ok(ws) => {
                    if send.send((ServerSocket { inner: ws }, addr)).is_err() {
                        // server shut down, stop accepting
                        return;
                    }
                }
                Err(err) => {
                    error!(%addr, %err, "Websocket handshake failed");
                }
            },
            Err(err) => {
                error!(%err, "Error accepting connection");
            }
        }
    }
}

/// Turn newly accepted sockets into pending connection entities.
pub fn accept_connections(mut commands: Commands, listener: Res<Listener>) {
    while let Some((socket, addr)) = listener.try_accept() {
        info!(%addr, "Accepted connection, awaiting hello");
        commands.spawn((
            Connection {
                socket: Codec::new(socket),
                addr,
            },
            crate::player::Pending,
        ));
    }
}
