//! Per-connection handler: handshake, then requests and room events.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Handshake, check the version, assign a SessionId
//!   2. Send HandshakeAck
//!   3. Loop: client frames go to the room manager, room events go out to
//!      the client, until close, Disconnect or idle timeout

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;

use skirmish_protocol::{
    Codec, Envelope, Payload, ProtocolError, RoomListEntry, SessionId, SystemMessage,
};
use skirmish_room::{ClientSender, RoomError, RoomLogic, RoomOutbound, joinable_rooms};
use tokio::sync::mpsc;

use crate::SkirmishError;
use crate::server::{PROTOCOL_VERSION, ServerState};
use crate::transport::WebSocketConnection;

/// Takes the session out of its room when the handler exits, however it
/// exits. `Drop` is synchronous, so the leave runs as a spawned task.
struct SessionGuard<G: RoomLogic, C: Codec> {
    session: SessionId,
    state: Arc<ServerState<G, C>>,
}

impl<G: RoomLogic, C: Codec> Drop for SessionGuard<G, C> {
    fn drop(&mut self) {
        let session = self.session;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut rooms = state.rooms.lock().await;
            match rooms.leave_room(session).await {
                Ok(()) => tracing::debug!(%session, "left room on disconnect"),
                Err(RoomError::NotInAnyRoom(_)) => {}
                Err(e) => tracing::debug!(%session, error = %e, "leave on disconnect failed"),
            }
        });
    }
}

/// Outgoing frame numbering and clock for one connection.
struct Outgoing<'a, C: Codec> {
    conn: &'a WebSocketConnection,
    codec: &'a C,
    seq: u64,
    start: Instant,
}

impl<C: Codec> Outgoing<'_, C> {
    fn now(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    async fn send(&mut self, payload: Payload) -> Result<(), SkirmishError> {
        let envelope = Envelope {
            seq: self.seq,
            timestamp: self.now(),
            payload,
        };
        self.seq += 1;
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    async fn system(&mut self, msg: SystemMessage) -> Result<(), SkirmishError> {
        self.send(Payload::System(msg)).await
    }

    async fn error(&mut self, code: u16, message: impl Into<String>) -> Result<(), SkirmishError> {
        self.system(SystemMessage::Error {
            code,
            message: message.into(),
        })
        .await
    }
}

/// HTTP-style status for a rejected room request.
fn error_code(err: &RoomError) -> u16 {
    match err {
        RoomError::NotFound(_) => 404,
        RoomError::RoomFull(_)
        | RoomError::AlreadyInRoom(..)
        | RoomError::InAnotherRoom(..)
        | RoomError::Disposing(_) => 409,
        RoomError::Unavailable(_) | RoomError::CreateFailed(_) => 503,
        RoomError::NotInRoom(..) | RoomError::NotInAnyRoom(_) => 400,
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<G, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<G, C>>,
) -> Result<(), SkirmishError>
where
    G: RoomLogic,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let mut out = Outgoing {
        conn: &conn,
        codec: &state.codec,
        seq: 0,
        start: Instant::now(),
    };

    let session = perform_handshake(&conn, &state, &mut out).await?;
    tracing::info!(%conn_id, %session, "session connected");

    let _guard = SessionGuard {
        session,
        state: Arc::clone(&state),
    };

    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<RoomOutbound<G>>();
    let idle_timeout = state.settings.idle_timeout();
    let mut last_seen = tokio::time::Instant::now();

    loop {
        tokio::select! {
            frame = conn.recv() => {
                let data = match frame {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%session, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%session, error = %e, "recv error");
                        break;
                    }
                };
                last_seen = tokio::time::Instant::now();

                let envelope: Envelope = match state.codec.decode(&data) {
                    Ok(env) => env,
                    Err(e) => {
                        tracing::debug!(%session, error = %e, "failed to decode envelope");
                        continue;
                    }
                };

                match envelope.payload {
                    Payload::System(msg) => {
                        let close = handle_system_message(&state, session, msg, &events_tx, &mut out).await?;
                        if close {
                            break;
                        }
                    }
                    Payload::Game(data) => {
                        handle_game_message(&state, session, &data, &mut out).await?;
                    }
                }
            }
            Some(event) = events_rx.recv() => {
                forward_event::<G, C>(event, &mut out).await?;
            }
            _ = tokio::time::sleep_until(last_seen + idle_timeout) => {
                tracing::info!(%session, "connection timed out");
                break;
            }
        }
    }

    if let Err(e) = conn.close().await {
        tracing::debug!(%session, error = %e, "close failed");
    }
    // _guard drops here and the session leaves its room.
    Ok(())
}

/// Receives the Handshake, checks the version and sends the HandshakeAck.
async fn perform_handshake<G, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<G, C>>,
    out: &mut Outgoing<'_, C>,
) -> Result<SessionId, SkirmishError>
where
    G: RoomLogic,
    C: Codec,
{
    let data = match tokio::time::timeout(state.settings.handshake_timeout(), conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage(
                "connection closed before handshake".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let envelope: Envelope = state.codec.decode(&data)?;

    let version = match envelope.payload {
        Payload::System(SystemMessage::Handshake { version }) => version,
        _ => {
            out.error(400, "expected Handshake").await?;
            return Err(
                ProtocolError::InvalidMessage("first message must be Handshake".into()).into(),
            );
        }
    };

    if version != PROTOCOL_VERSION {
        out.error(
            400,
            format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
        )
        .await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    let session = SessionId(state.next_session.fetch_add(1, Ordering::Relaxed));
    let server_time = out.now();
    out.system(SystemMessage::HandshakeAck {
        session_id: session,
        server_time,
    })
    .await?;

    Ok(session)
}

/// Handles a system message. Returns `true` if the connection should close.
async fn handle_system_message<G, C>(
    state: &Arc<ServerState<G, C>>,
    session: SessionId,
    msg: SystemMessage,
    events: &ClientSender<G>,
    out: &mut Outgoing<'_, C>,
) -> Result<bool, SkirmishError>
where
    G: RoomLogic,
    C: Codec,
{
    match msg {
        SystemMessage::Heartbeat { client_time } => {
            let server_time = out.now();
            out.system(SystemMessage::HeartbeatAck {
                client_time,
                server_time,
            })
            .await?;
        }

        SystemMessage::JoinRoom { room_id, options } => {
            let options: G::JoinOptions = match state.codec.decode_payload(&options) {
                Ok(options) => options,
                Err(e) => {
                    out.error(400, e.to_string()).await?;
                    return Ok(false);
                }
            };

            let result = {
                let mut rooms = state.rooms.lock().await;
                rooms
                    .join_room(session, room_id, options, events.clone())
                    .await
            };

            match result {
                Ok(()) => {
                    out.system(SystemMessage::RoomJoined {
                        room_id,
                        session_id: session,
                    })
                    .await?;
                }
                Err(e) => out.error(error_code(&e), e.to_string()).await?,
            }
        }

        SystemMessage::JoinOrCreate { options } => {
            let options: G::JoinOptions = match state.codec.decode_payload(&options) {
                Ok(options) => options,
                Err(e) => {
                    out.error(400, e.to_string()).await?;
                    return Ok(false);
                }
            };

            let result = {
                let mut rooms = state.rooms.lock().await;
                rooms.join_or_create(session, options, events.clone()).await
            };

            match result {
                Ok(room_id) => {
                    out.system(SystemMessage::RoomJoined {
                        room_id,
                        session_id: session,
                    })
                    .await?;
                }
                Err(e) => out.error(error_code(&e), e.to_string()).await?,
            }
        }

        SystemMessage::ListRooms => {
            let handles = state.rooms.lock().await.room_handles();
            let rooms = joinable_rooms(handles)
                .await
                .into_iter()
                .map(|info| RoomListEntry {
                    room_id: info.room_id,
                    clients: info.clients,
                    max_clients: info.max_clients,
                })
                .collect();
            out.system(SystemMessage::RoomList { rooms }).await?;
        }

        SystemMessage::LeaveRoom => {
            let mut rooms = state.rooms.lock().await;
            if let Err(e) = rooms.leave_room(session).await {
                tracing::debug!(%session, error = %e, "leave room failed");
            }
        }

        SystemMessage::Disconnect { reason } => {
            tracing::info!(%session, %reason, "client disconnected");
            return Ok(true);
        }

        _ => {
            tracing::debug!(%session, "ignoring unexpected system message");
        }
    }

    Ok(false)
}

/// Decodes a game action and routes it to the session's room.
async fn handle_game_message<G, C>(
    state: &Arc<ServerState<G, C>>,
    session: SessionId,
    data: &[u8],
    out: &mut Outgoing<'_, C>,
) -> Result<(), SkirmishError>
where
    G: RoomLogic,
    C: Codec,
{
    let msg: G::ClientMessage = match state.codec.decode_payload(data) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(%session, error = %e, "rejected game message");
            out.error(400, e.to_string()).await?;
            return Ok(());
        }
    };

    let result = state.rooms.lock().await.route_message(session, msg).await;
    if let Err(e) = result {
        out.error(error_code(&e), e.to_string()).await?;
    }
    Ok(())
}

/// Encodes a room event for the wire.
async fn forward_event<G, C>(
    event: RoomOutbound<G>,
    out: &mut Outgoing<'_, C>,
) -> Result<(), SkirmishError>
where
    G: RoomLogic,
    C: Codec,
{
    let payload = match event {
        RoomOutbound::State(snapshot) => Payload::System(SystemMessage::RoomState {
            data: out.codec.encode(&snapshot)?,
        }),
        RoomOutbound::Message(msg) => Payload::Game(out.codec.encode(&msg)?),
    };
    out.send(payload).await
}
