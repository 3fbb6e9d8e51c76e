use anyhow::Context;
use axum::{Router, serve::Serve};
use tokio::net::TcpListener;

use crate::{configuration::Config, routes::init_router, state::AppState};

pub struct Application {
    port: u16,
    host: String,
    server: Serve<TcpListener, Router, Router>,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self, anyhow::Error> {
        let address = format!("{}:{}", config.application.host, config.application.port);
        let state = AppState::init(config).await?;

        Self::serve(address, state).await
    }

    /// Serves an already prepared state, e.g. one holding a test database pool.
    pub async fn with_state(state: AppState) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            state.config.application.host, state.config.application.port
        );

        Self::serve(address, state).await
    }

    async fn serve(address: String, state: AppState) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Unable to bind {}", address))?;

        let local_address = listener.local_addr()?;
        let port = local_address.port();
        let host = local_address.ip().to_string();

        let server = axum::serve(listener, init_router(state));

        Ok(Application { port, host, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host(&self) -> String {
        self.host.clone()
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}
