use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::Request,
    middleware,
    routing::{delete, get},
    Router,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    auth::auth_middleware,
    configuration::{DatabaseSettings, Settings, StorageBackend},
    feed::{spawn_change_listener, ChangeHub},
    routes::{create_bookmark, current_session, dashboard, delete_bookmark, list_bookmarks},
    store::{BookmarkStore, MemoryBookmarkStore, PgBookmarkStore},
    websocket::feed_handler,
};

pub struct Application {
    listener: TcpListener,
    router: Router,
    port: u16,
    hub: ChangeHub,
}

pub struct ApplicationState {
    pub store: Arc<dyn BookmarkStore>,
    pub hub: ChangeHub,
}

impl ApplicationState {
    /// Wires the configured store to a fresh change hub.
    pub fn from_settings(settings: &Settings) -> Self {
        let hub = ChangeHub::new(settings.feed.capacity);
        let store: Arc<dyn BookmarkStore> = match settings.application.storage {
            StorageBackend::Postgres => {
                let pool = get_connection_pool(&settings.database);
                spawn_change_listener(pool.clone(), hub.clone());
                Arc::new(PgBookmarkStore::new(pool))
            }
            StorageBackend::Memory => Arc::new(MemoryBookmarkStore::new(hub.clone())),
        };

        Self { store, hub }
    }
}

impl Application {
    pub async fn build(settings: Settings) -> Result<Self, std::io::Error> {
        let address = format!(
            "{}:{}",
            settings.application.host, settings.application.port
        );

        let listener = TcpListener::bind(address).await?;
        let port = listener.local_addr()?.port();

        let application_state = Arc::new(ApplicationState::from_settings(&settings));
        let hub = application_state.hub.clone();
        tracing::info!(storage = ?settings.application.storage, "bookmark store ready");

        let router = router(application_state, &settings);

        Ok(Self {
            listener,
            router,
            port,
            hub,
        })
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        tracing::info!("listening on {}", self.listener.local_addr()?);
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    pub fn hub(&self) -> ChangeHub {
        self.hub.clone()
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

pub fn router(state: Arc<ApplicationState>, settings: &Settings) -> Router {
    Router::new()
        .route("/api/bookmarks", get(list_bookmarks).post(create_bookmark))
        .route("/api/bookmarks/:bookmark_id", delete(delete_bookmark))
        .route("/api/dashboard", get(dashboard))
        .route("/api/session", get(current_session))
        .route("/api/feed", get(feed_handler))
        .route_layer(middleware::from_fn_with_state(
            settings.application.signing_key.clone(),
            auth_middleware,
        ))
        .route("/", get(|| async { "Hello from bookmark server" }))
        // Only the path is recorded, headers and the query string can carry session tokens.
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .with_state(state)
}

pub fn get_connection_pool(settings: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .idle_timeout(settings.idle_timeout())
        .acquire_timeout(settings.connect_timeout())
        .connect_lazy_with(settings.with_db())
}
