use std::net::SocketAddr;

use log::info;
use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use super::{routes, AppState};

pub struct WebServer {
    state: AppState,
}

impl WebServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Serves until `shutdown` flips to `true`.
    pub async fn start(self, config: &ServerConfig, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| Error::ConfigError(format!("Invalid server address: {}", e)))?;

        let (bound, server) = warp::serve(routes(self.state))
            .try_bind_with_graceful_shutdown(addr, async move {
                while shutdown.changed().await.is_ok() {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            })
            .map_err(|e| Error::NetworkError(format!("Failed to bind {}: {}", addr, e)))?;

        info!("Starting web server on {}", bound);
        server.await;
        info!("Web server stopped");
        Ok(())
    }
}
