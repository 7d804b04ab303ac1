//! `DuetServer` builder and server loop.
//!
//! This is the entry point for running a Duet coordination server. It
//! ties together all the layers: transport → protocol → room → game →
//! signaling.

use std::sync::Arc;
use std::time::Duration;

use duet_game::{GameEngine, GameRegistry};
use duet_protocol::JsonCodec;
use duet_room::{GuardConfig, RoomConfig, RoomRegistry};
use duet_signal::SignalCoordinator;
use duet_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::DuetError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// An explicit context object rather than module-level globals, so tests
/// build isolated instances. Wrapped in `Arc` for cheap cloning across
/// tasks; interior mutability via `Mutex` where needed. Lock order is
/// always rooms → engine → signals.
pub(crate) struct ServerState {
    pub(crate) rooms: Mutex<RoomRegistry>,
    pub(crate) engine: Mutex<GameEngine>,
    pub(crate) signals: Mutex<SignalCoordinator>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Duet server.
///
/// # Example
///
/// ```rust,ignore
/// use duet::prelude::*;
///
/// let server = DuetServer::builder()
///     .bind("0.0.0.0:8080")
///     .games(GameRegistry::with_builtin())
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct DuetServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    guard_config: GuardConfig,
    games: GameRegistry,
    sweep_interval: Duration,
    rematch_timeout: Duration,
}

impl DuetServerBuilder {
    /// Creates a new builder with default settings and the bundled games.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            guard_config: GuardConfig::default(),
            games: GameRegistry::with_builtin(),
            sweep_interval: Duration::from_secs(10),
            rematch_timeout: Duration::from_secs(120),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the room configuration (grace period, code length, ...).
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets the password guard configuration (attempts, window, lockout).
    pub fn guard_config(mut self, config: GuardConfig) -> Self {
        self.guard_config = config;
        self
    }

    /// Replaces the game registry.
    pub fn games(mut self, games: GameRegistry) -> Self {
        self.games = games;
        self
    }

    /// Sets how often the maintenance sweep runs.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Sets how long a one-sided ready handshake may stall before the
    /// session returns to the selection state.
    pub fn rematch_timeout(mut self, timeout: Duration) -> Self {
        self.rematch_timeout = timeout;
        self
    }

    /// Builds and starts the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport` as defaults.
    pub async fn build(self) -> Result<DuetServer, DuetError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let games = Arc::new(self.games);
        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomRegistry::new(self.room_config, self.guard_config)),
            engine: Mutex::new(GameEngine::new(games)),
            signals: Mutex::new(SignalCoordinator::new()),
            codec: JsonCodec,
        });

        Ok(DuetServer {
            transport,
            state,
            sweep_interval: self.sweep_interval,
            rematch_timeout: self.rematch_timeout,
        })
    }
}

impl Default for DuetServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Duet coordination server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DuetServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
    sweep_interval: Duration,
    rematch_timeout: Duration,
}

impl DuetServer {
    /// Creates a new builder.
    pub fn builder() -> DuetServerBuilder {
        DuetServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Spawns the maintenance sweep, then accepts incoming connections
    /// and spawns a handler task for each. Runs until the process is
    /// terminated.
    pub async fn run(mut self) -> Result<(), DuetError> {
        tracing::info!("Duet server running");

        tokio::spawn(maintenance_sweep(
            Arc::clone(&self.state),
            self.sweep_interval,
            self.rematch_timeout,
        ));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
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

/// Periodic cleanup: expired empty rooms (plus their game sessions and
/// negotiation state), stale guard records, stalled ready handshakes.
async fn maintenance_sweep(state: Arc<ServerState>, interval: Duration, rematch_timeout: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;

        let mut rooms = state.rooms.lock().await;
        let mut engine = state.engine.lock().await;
        let mut signals = state.signals.lock().await;

        for room_id in rooms.sweep_expired() {
            engine.drop_room(&room_id);
            signals.drop_room(&room_id);
        }
        rooms.sweep_guard();

        // A stalled handshake returns the pair to the selection state;
        // the room is told its readiness flags are gone.
        for (room_id, game) in engine.sweep_stalled(rematch_timeout) {
            rooms.broadcast(
                &room_id,
                duet_protocol::ServerEvent::ReadyState {
                    game,
                    host_ready: false,
                    peer_ready: false,
                },
            );
        }
    }
}
