//! `SkirmishServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use skirmish_protocol::{Codec, JsonCodec};
use skirmish_room::{RoomLogic, RoomManager};
use tokio::sync::Mutex;

use crate::SkirmishError;
use crate::handler::handle_connection;
use crate::settings::ServerSettings;
use crate::transport::WebSocketTransport;

/// Protocol version clients must send in their handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// State shared by every connection task.
pub(crate) struct ServerState<G: RoomLogic, C: Codec> {
    pub(crate) rooms: Mutex<RoomManager<G>>,
    pub(crate) codec: C,
    pub(crate) settings: ServerSettings,
    /// Source of session ids. Never reset, so ids are unique per process.
    pub(crate) next_session: AtomicU64,
}

/// Builder for a [`SkirmishServer`].
///
/// ```rust,ignore
/// let server = SkirmishServerBuilder::new()
///     .bind("0.0.0.0:2567")
///     .build::<Arena>(ArenaOptions::default())
///     .await?;
/// server.run().await
/// ```
pub struct SkirmishServerBuilder {
    settings: ServerSettings,
}

impl SkirmishServerBuilder {
    pub fn new() -> Self {
        Self {
            settings: ServerSettings::default(),
        }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.settings.bind = addr.to_string();
        self
    }

    /// Replaces every connection setting, bind address included.
    pub fn settings(mut self, settings: ServerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Binds the listener. Matchmade rooms are created with `options`.
    pub async fn build<G: RoomLogic>(
        self,
        options: G::Options,
    ) -> Result<SkirmishServer<G, JsonCodec>, SkirmishError> {
        let transport = WebSocketTransport::bind(&self.settings.bind).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::new(options)),
            codec: JsonCodec,
            settings: self.settings,
            next_session: AtomicU64::new(1),
        });

        Ok(SkirmishServer { transport, state })
    }
}

impl Default for SkirmishServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server. Call [`run()`](Self::run) to start accepting.
pub struct SkirmishServer<G: RoomLogic, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<G, C>>,
}

impl<G, C> SkirmishServer<G, C>
where
    G: RoomLogic,
    C: Codec,
{
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Accepts connections until the process ends, one task per
    /// connection.
    pub async fn run(mut self) -> Result<(), SkirmishError> {
        tracing::info!("skirmish server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection::<G, C>(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
