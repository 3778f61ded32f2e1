//! Room manager: creates, tracks, and routes sessions to rooms.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use skirmish_protocol::{RoomId, SessionId};

use crate::room::spawn_room;
use crate::{ClientSender, RoomError, RoomHandle, RoomInfo, RoomLogic};

/// Counter for generating unique room ids.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Manages all active rooms and which session is in which room.
///
/// A session is a member of at most one room at a time.
pub struct RoomManager<G: RoomLogic> {
    rooms: HashMap<RoomId, RoomHandle<G>>,
    session_rooms: HashMap<SessionId, RoomId>,
    /// Options used for rooms created by matchmaking.
    options: G::Options,
}

impl<G: RoomLogic> RoomManager<G> {
    /// Creates an empty manager whose matchmade rooms use `options`.
    pub fn new(options: G::Options) -> Self {
        Self {
            rooms: HashMap::new(),
            session_rooms: HashMap::new(),
            options,
        }
    }

    /// Creates a room with the manager's default options.
    pub fn create_room(&mut self) -> Result<RoomId, RoomError> {
        let options = self.options.clone();
        self.create_room_with(&options)
    }

    /// Creates a room with explicit options.
    ///
    /// # Errors
    /// [`RoomError::CreateFailed`] if the game rejects the options.
    pub fn create_room_with(&mut self, options: &G::Options) -> Result<RoomId, RoomError> {
        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_room::<G>(room_id, options, DEFAULT_CHANNEL_SIZE)?;
        self.rooms.insert(room_id, handle);
        Ok(room_id)
    }

    /// Adds a session to a specific room.
    pub async fn join_room(
        &mut self,
        session: SessionId,
        room_id: RoomId,
        options: G::JoinOptions,
        sender: ClientSender<G>,
    ) -> Result<(), RoomError> {
        self.ensure_roomless(session, room_id)?;

        let handle = self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))?;
        handle.join(session, options, sender).await?;
        self.session_rooms.insert(session, room_id);
        Ok(())
    }

    /// Joins the first room with a free slot, or creates one.
    ///
    /// A room can fill up between the info query and the join; the join is
    /// then rejected by the actor and the search continues.
    pub async fn join_or_create(
        &mut self,
        session: SessionId,
        options: G::JoinOptions,
        sender: ClientSender<G>,
    ) -> Result<RoomId, RoomError> {
        if let Some(current) = self.session_rooms.get(&session) {
            return Err(RoomError::InAnotherRoom(session, *current));
        }

        for handle in self.rooms.values() {
            let Ok(info) = handle.get_info().await else {
                continue;
            };
            if !info.status.is_joinable() {
                continue;
            }
            if handle
                .join(session, options.clone(), sender.clone())
                .await
                .is_ok()
            {
                self.session_rooms.insert(session, info.room_id);
                return Ok(info.room_id);
            }
        }

        let room_id = self.create_room()?;
        let handle = self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))?;
        handle.join(session, options, sender).await?;
        self.session_rooms.insert(session, room_id);
        Ok(room_id)
    }

    /// Removes a session from its room. Disposes the room if it is now
    /// empty and configured to auto-dispose.
    pub async fn leave_room(&mut self, session: SessionId) -> Result<(), RoomError> {
        let room_id = self
            .session_rooms
            .remove(&session)
            .ok_or(RoomError::NotInAnyRoom(session))?;

        let Some(handle) = self.rooms.get(&room_id) else {
            return Ok(());
        };
        handle.leave(session).await?;
        let info = handle.get_info().await;

        if let Ok(info) = info {
            if info.auto_dispose && info.clients == 0 {
                self.destroy_room(room_id).await?;
            }
        }
        Ok(())
    }

    /// Routes an action from a session to its current room.
    pub async fn route_message(
        &self,
        session: SessionId,
        msg: G::ClientMessage,
    ) -> Result<(), RoomError> {
        let room_id = self
            .session_rooms
            .get(&session)
            .ok_or(RoomError::NotInAnyRoom(session))?;
        let handle = self.rooms.get(room_id).ok_or(RoomError::NotFound(*room_id))?;
        handle.send_message(session, msg).await
    }

    /// Returns info about a specific room.
    pub async fn get_room_info(&self, room_id: RoomId) -> Result<RoomInfo, RoomError> {
        let handle = self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))?;
        handle.get_info().await
    }

    /// Returns the current snapshot of a room's game state.
    pub async fn snapshot(&self, room_id: RoomId) -> Result<G::Snapshot, RoomError> {
        let handle = self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))?;
        handle.snapshot().await
    }

    /// Shuts a room down and forgets its members.
    pub async fn destroy_room(&mut self, room_id: RoomId) -> Result<(), RoomError> {
        let handle = self.rooms.remove(&room_id).ok_or(RoomError::NotFound(room_id))?;
        let _ = handle.shutdown().await;
        self.session_rooms.retain(|_, rid| *rid != room_id);
        tracing::info!(%room_id, "room destroyed");
        Ok(())
    }

    /// The room a session is in, if any.
    pub fn session_room(&self, session: &SessionId) -> Option<RoomId> {
        self.session_rooms.get(session).copied()
    }

    /// Lists rooms that currently accept joins.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        joinable_rooms(self.room_handles()).await
    }

    /// Clones of every live room handle. Lets a caller query rooms after
    /// releasing whatever lock guards the manager.
    pub fn room_handles(&self) -> Vec<RoomHandle<G>> {
        self.rooms.values().cloned().collect()
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn ensure_roomless(&self, session: SessionId, target: RoomId) -> Result<(), RoomError> {
        match self.session_rooms.get(&session) {
            Some(current) if *current == target => {
                Err(RoomError::AlreadyInRoom(session, target))
            }
            Some(current) => Err(RoomError::InAnotherRoom(session, *current)),
            None => Ok(()),
        }
    }
}

/// Queries each room and keeps the ones that accept joins. Rooms that fail
/// to answer (shutting down) are skipped.
pub async fn joinable_rooms<G: RoomLogic>(handles: Vec<RoomHandle<G>>) -> Vec<RoomInfo> {
    let mut infos = Vec::with_capacity(handles.len());
    for handle in handles {
        if let Ok(info) = handle.get_info().await {
            if info.status.is_joinable() {
                infos.push(info);
            }
        }
    }
    infos
}

impl<G: RoomLogic> Default for RoomManager<G> {
    fn default() -> Self {
        Self::new(G::Options::default())
    }
}
