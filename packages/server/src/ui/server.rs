//! Server execution logic.

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, put},
};
use rakugaki_shared::time::SystemClock;
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::{RoomRepository as _, StoreError},
    infrastructure::{
        message_pusher::WebSocketMessagePusher, password::BcryptPasswordHasher,
        repository::InMemoryRoomRepository, store::SqliteStore,
    },
};

use super::{
    handler::{
        create_room, get_room_detail, get_rooms, get_stats, get_user, health_check,
        update_nickname, websocket_handler,
    },
    reaper::{ReaperSchedule, spawn_reapers},
    signal::shutdown_signal,
    state::{AppDependencies, AppState},
};

/// Collaborative whiteboard server
///
/// # Example
///
/// ```ignore
/// let config = ServerConfig::parse();
/// let server = Server::from_config(&config).await?;
/// server.run(config.host, config.port).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    schedule: ReaperSchedule,
}

impl Server {
    pub fn new(state: Arc<AppState>, schedule: ReaperSchedule) -> Self {
        Self { state, schedule }
    }

    /// Build every dependency from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or its schema created.
    pub async fn from_config(config: &ServerConfig) -> Result<Self, StoreError> {
        // 1. Repository / MessagePusher (in-memory)
        let clock = Arc::new(SystemClock);
        let repository = Arc::new(InMemoryRoomRepository::new(
            config.stroke_ceiling(),
            clock.clone(),
        ));
        let message_pusher = Arc::new(WebSocketMessagePusher::new());

        // 2. Durable store
        let hasher = Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost));
        let store = Arc::new(
            SqliteStore::connect(
                &config.database_url,
                hasher.clone(),
                clock.clone(),
                config.session_ttl(),
            )
            .await?,
        );

        // 3. UseCases
        let state = AppState::new(AppDependencies {
            repository,
            message_pusher: message_pusher.clone(),
            groups: message_pusher,
            room_store: store.clone(),
            user_store: store,
            hasher,
            clock,
            drawing_policy: config.drawing_policy(),
            reaper_policy: config.reaper_policy(),
        });

        Ok(Self::new(Arc::new(state), config.reaper_schedule()))
    }

    /// Shared state, e.g. for inspection in tests
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    fn app(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/stats", get(get_stats))
            .route("/api/rooms", get(get_rooms).post(create_room))
            .route("/api/rooms/{name}", get(get_room_detail))
            .route("/api/user", get(get_user))
            .route("/api/user/nickname", put(update_nickname))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server until Ctrl+C / SIGTERM
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 4000)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Whiteboard server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// The reaper jobs run for the lifetime of the server.
    pub async fn serve<F>(
        self,
        listener: tokio::net::TcpListener,
        shutdown: F,
    ) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.app();
        let reapers = spawn_reapers(self.state.reap_rooms_usecase.clone(), self.schedule);

        let result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await;

        for reaper in reapers {
            reaper.abort();
        }
        tracing::info!(
            "Server shutdown complete ({} rooms in memory)",
            self.state.repository.room_count().await
        );
        result
    }
}
