pub mod handler;

use crate::context::RequestContext;
use crate::error::Result;
use crate::health::HealthChecker;
use crate::service::UserService;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared by every request handler
pub struct AppState {
    pub service: UserService,
    pub health: HealthChecker,
    request_timeout: Option<Duration>,
    shutdown: CancellationToken,
}

impl AppState {
    /// Fresh context per request; cancelled when the server shuts down.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::child_of(&self.shutdown, self.request_timeout)
    }
}

/// HTTP front end for the user service
pub struct Server {
    addr: String,
    state: Arc<AppState>,
    shutdown: CancellationToken,
}

impl Server {
    pub fn new(
        addr: String,
        service: UserService,
        health: HealthChecker,
        request_timeout: Option<Duration>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        Self {
            addr,
            state: Arc::new(AppState {
                service,
                health,
                request_timeout,
                shutdown: shutdown.clone(),
            }),
            shutdown,
        }
    }

    /// Token that stops the server and cancels in-flight requests.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handler::health))
            .route(
                "/users",
                get(handler::list_users).post(handler::create_user),
            )
            .route(
                "/users/:id",
                get(handler::load_user)
                    .put(handler::update_user)
                    .delete(handler::delete_user),
            )
            .with_state(Arc::clone(&self.state))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until the shutdown token fires.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.addr).await?;
        info!("userstore listening on {}", self.addr);

        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("userstore stopped");
        Ok(())
    }
}
