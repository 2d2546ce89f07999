//! HTTP server for the bandwidth-test endpoints.
//!
//! Builds the router from a static route table, binds the listener, and
//! serves connections until shutdown is requested.

use crate::config::{BuildMode, Config};
use crate::endpoints::{download, ping, upload};
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{on, MethodFilter, MethodRouter};
use axum::Router;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// One entry of the static route table.
pub struct Route {
    pub method: MethodFilter,
    pub path: &'static str,
    pub handler: fn(MethodFilter) -> MethodRouter,
}

/// Every route the server exposes, in registration order.
pub const ROUTES: &[Route] = &[
    Route {
        method: MethodFilter::GET,
        path: "/api/download/Mb/{size}",
        handler: |method| on(method, download::handle),
    },
    Route {
        method: MethodFilter::POST,
        path: "/api/upload/Mb/{size}",
        handler: |method| on(method, upload::handle),
    },
    Route {
        method: MethodFilter::GET,
        path: "/api/ping",
        handler: |method| on(method, ping::handle),
    },
];

/// Build the router from `ROUTES`.
pub fn build_router(build_mode: BuildMode) -> Router {
    let router = ROUTES.iter().fold(Router::new(), |router, route| {
        router.route(route.path, (route.handler)(route.method))
    });

    router
        // Uploads can be far larger than the framework's default body cap.
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::from_fn_with_state(build_mode, log_request))
}

/// Access log for every request.
async fn log_request(
    State(build_mode): State<BuildMode>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed_us = start.elapsed().as_micros() as u64;
    match build_mode {
        BuildMode::Release => debug!(%method, path = %path, status, elapsed_us, "Request"),
        BuildMode::Default => info!(%method, path = %path, status, elapsed_us, "Request"),
    }

    response
}

/// Server instance
pub struct Server {
    config: Config,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        Server { config }
    }

    /// Bind the listener and serve until Ctrl-C.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = resolve(&self.config.listen_addr())?;
        let listener = create_listener(addr, self.config.backlog)?;
        info!(address = %addr, "Server listening");

        let app = build_router(self.config.build_mode);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

fn resolve(listen: &str) -> io::Result<SocketAddr> {
    listen.to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no address resolved for '{listen}'"),
        )
    })
}

/// Create a TCP listener with SO_REUSEADDR and the configured backlog.
fn create_listener(addr: SocketAddr, backlog: i32) -> io::Result<TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;

    TcpListener::from_std(socket.into())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
