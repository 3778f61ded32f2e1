//! Room actor: an isolated Tokio task that owns one game instance.
//!
//! The outside world talks to it only through [`RoomHandle`]. Inside, one
//! `select!` loop drains commands in arrival order and publishes the state
//! snapshot on the patch interval.

use skirmish_protocol::{Recipient, RoomId, SessionId};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use crate::{Outbox, RoomConfig, RoomError, RoomLogic, RoomStatus};

/// An outbound message from the room actor to one client's connection.
#[derive(Debug)]
pub enum RoomOutbound<G: RoomLogic> {
    /// Full state snapshot (on join and on every changed patch).
    State(G::Snapshot),
    /// An event produced by the game logic.
    Message(G::ServerMessage),
}

impl<G: RoomLogic> Clone for RoomOutbound<G> {
    fn clone(&self) -> Self {
        match self {
            Self::State(s) => Self::State(s.clone()),
            Self::Message(m) => Self::Message(m.clone()),
        }
    }
}

/// Channel sender delivering outbound messages to one client.
pub type ClientSender<G> = mpsc::UnboundedSender<RoomOutbound<G>>;

/// Commands accepted by a room actor.
pub(crate) enum RoomCommand<G: RoomLogic> {
    Join {
        session: SessionId,
        options: G::JoinOptions,
        sender: ClientSender<G>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        session: SessionId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Message {
        sender: SessionId,
        msg: G::ClientMessage,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    Snapshot {
        reply: oneshot::Sender<G::Snapshot>,
    },
    Shutdown,
}

/// Room metadata (not the game state).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub status: RoomStatus,
    /// Connected clients.
    pub clients: usize,
    pub max_clients: usize,
    pub auto_dispose: bool,
}

/// Handle to a running room actor. Cheap to clone.
pub struct RoomHandle<G: RoomLogic> {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand<G>>,
}

impl<G: RoomLogic> Clone for RoomHandle<G> {
    fn clone(&self) -> Self {
        Self {
            room_id: self.room_id,
            sender: self.sender.clone(),
        }
    }
}

impl<G: RoomLogic> RoomHandle<G> {
    /// Returns the room's id.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Asks the room to admit `session`.
    pub async fn join(
        &self,
        session: SessionId,
        options: G::JoinOptions,
        sender: ClientSender<G>,
    ) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            session,
            options,
            sender,
            reply,
        })
        .await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Removes `session` from the room.
    pub async fn leave(&self, session: SessionId) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Leave { session, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Delivers an action (fire-and-forget).
    pub async fn send_message(
        &self,
        sender: SessionId,
        msg: G::ClientMessage,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Message { sender, msg }).await
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Requests a snapshot of the game state, taken after every command
    /// queued before this one.
    pub async fn snapshot(&self) -> Result<G::Snapshot, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand<G>) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// One live connection of the room.
struct Client<G: RoomLogic> {
    session: SessionId,
    sender: ClientSender<G>,
}

/// The actor state. Lives inside the room's Tokio task.
struct RoomActor<G: RoomLogic> {
    room_id: RoomId,
    status: RoomStatus,
    config: RoomConfig,
    /// Live connections in join order.
    clients: Vec<Client<G>>,
    state: G::State,
    /// Set by every command that may have changed `state`.
    dirty: bool,
    receiver: mpsc::Receiver<RoomCommand<G>>,
}

impl<G: RoomLogic> RoomActor<G> {
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room created");

        let mut patch = tokio::time::interval(self.config.patch_interval);
        patch.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                _ = patch.tick() => self.publish_patch(),
            }
        }

        self.status = RoomStatus::Disposing;
        tracing::info!(room_id = %self.room_id, "room disposed");
    }

    /// Returns `false` once the actor should stop.
    fn handle_command(&mut self, cmd: RoomCommand<G>) -> bool {
        match cmd {
            RoomCommand::Join {
                session,
                options,
                sender,
                reply,
            } => {
                let result = self.handle_join(session, options, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { session, reply } => {
                let result = self.handle_leave(session);
                let _ = reply.send(result);
            }
            RoomCommand::Message { sender, msg } => {
                self.handle_message(sender, msg);
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(G::snapshot(&self.state));
            }
            RoomCommand::Shutdown => {
                tracing::info!(room_id = %self.room_id, "room shutting down");
                return false;
            }
        }
        true
    }

    fn handle_join(
        &mut self,
        session: SessionId,
        options: G::JoinOptions,
        sender: ClientSender<G>,
    ) -> Result<(), RoomError> {
        if self.is_member(session) {
            return Err(RoomError::AlreadyInRoom(session, self.room_id));
        }
        if self.clients.len() >= self.config.max_clients {
            return Err(RoomError::RoomFull(self.room_id));
        }
        if self.status == RoomStatus::Disposing {
            return Err(RoomError::Disposing(self.room_id));
        }

        self.clients.push(Client { session, sender });
        self.refresh_status();
        tracing::info!(
            room_id = %self.room_id,
            %session,
            clients = self.clients.len(),
            "client joined"
        );

        let msgs = G::on_join(&mut self.state, session, options);
        self.dispatch(msgs);
        self.dirty = true;

        // The joiner gets the full state right away instead of waiting
        // for the next patch.
        let snapshot = RoomOutbound::State(G::snapshot(&self.state));
        self.send_to(session, snapshot);

        Ok(())
    }

    fn handle_leave(&mut self, session: SessionId) -> Result<(), RoomError> {
        let Some(index) = self.clients.iter().position(|c| c.session == session)
        else {
            return Err(RoomError::NotInRoom(session, self.room_id));
        };
        self.clients.remove(index);
        self.refresh_status();

        tracing::info!(
            room_id = %self.room_id,
            %session,
            clients = self.clients.len(),
            "client left"
        );

        let msgs = G::on_leave(&mut self.state, session);
        self.dispatch(msgs);
        self.dirty = true;
        Ok(())
    }

    fn handle_message(&mut self, sender: SessionId, msg: G::ClientMessage) {
        if !self.is_member(sender) {
            tracing::warn!(
                room_id = %self.room_id,
                %sender,
                "message from non-member, ignoring"
            );
            return;
        }

        if let Err(reason) = G::validate_message(&self.state, sender, &msg) {
            tracing::debug!(
                room_id = %self.room_id,
                %sender,
                %reason,
                "message rejected"
            );
            return;
        }

        let msgs = G::on_message(&mut self.state, sender, msg);
        self.dispatch(msgs);
        self.dirty = true;
    }

    /// Broadcasts the snapshot if anything changed since the last one.
    fn publish_patch(&mut self) {
        if !self.dirty || self.clients.is_empty() {
            return;
        }
        self.dirty = false;
        let outbound = RoomOutbound::State(G::snapshot(&self.state));
        for client in &self.clients {
            let _ = client.sender.send(outbound.clone());
        }
    }

    fn dispatch(&self, msgs: Outbox<G::ServerMessage>) {
        for (recipient, msg) in msgs {
            let outbound = RoomOutbound::Message(msg);
            match recipient {
                Recipient::All => {
                    for client in &self.clients {
                        let _ = client.sender.send(outbound.clone());
                    }
                }
                Recipient::Session(session) => {
                    self.send_to(session, outbound);
                }
                Recipient::AllExcept(excluded) => {
                    for client in self.clients.iter().filter(|c| c.session != excluded) {
                        let _ = client.sender.send(outbound.clone());
                    }
                }
            }
        }
    }

    /// Scans the live connections for `session`. Joins reject duplicate
    /// sessions, so at most one connection matches. Silently drops if the
    /// session is gone or its receiver was dropped.
    fn send_to(&self, session: SessionId, msg: RoomOutbound<G>) {
        if let Some(client) = self.clients.iter().find(|c| c.session == session) {
            let _ = client.sender.send(msg);
        }
    }

    fn is_member(&self, session: SessionId) -> bool {
        self.clients.iter().any(|c| c.session == session)
    }

    fn refresh_status(&mut self) {
        self.status = self
            .status
            .for_occupancy(self.clients.len(), self.config.max_clients);
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            status: self.status,
            clients: self.clients.len(),
            max_clients: self.config.max_clients,
            auto_dispose: self.config.auto_dispose,
        }
    }
}

/// Builds the game state and spawns the room actor task.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub(crate) fn spawn_room<G: RoomLogic>(
    room_id: RoomId,
    options: &G::Options,
    channel_size: usize,
) -> Result<RoomHandle<G>, RoomError> {
    let state =
        G::create(options).map_err(|e| RoomError::CreateFailed(e.to_string()))?;
    let config = G::room_config(options).validated();
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor::<G> {
        room_id,
        status: RoomStatus::Open.for_occupancy(0, config.max_clients),
        config,
        clients: Vec::new(),
        state,
        dirty: false,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    Ok(RoomHandle {
        room_id,
        sender: tx,
    })
}
