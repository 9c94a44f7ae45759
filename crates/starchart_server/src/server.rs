//! Background HTTP server hosting the schedule routes.

use crate::routes::{router, AppState};
use log::{error, info};
use starchart_core::ScheduleStoreClient;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub enum ServerError {
    Bind { addr: String, source: io::Error },
    LocalAddr(io::Error),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bind { addr, source } => write!(f, "failed to bind {addr}: {source}"),
            Self::LocalAddr(err) => write!(f, "failed to read local address: {err}"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Bind { source, .. } => Some(source),
            Self::LocalAddr(err) => Some(err),
        }
    }
}

/// Schedule API server running on a spawned tokio task.
///
/// The task is aborted when the server is dropped.
pub struct ScheduleServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ScheduleServer {
    /// Binds `bind_addr` (port `0` picks a free port) and starts serving.
    ///
    /// `store` may be `None`; schedule routes then answer 500 and
    /// `/health` reports the store as unavailable.
    pub async fn start(
        store: Option<Arc<ScheduleStoreClient>>,
        bind_addr: &str,
    ) -> Result<Self, ServerError> {
        let app = router(AppState { store });

        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: bind_addr.to_owned(),
                source,
            })?;
        let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;
        info!("event=server_start module=server status=ok addr=http://{addr}");

        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                error!("event=server_run module=server status=error error={err}");
            }
        });

        Ok(Self { addr, handle })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Aborts the serving task.
    pub fn shutdown(&self) {
        self.handle.abort();
        info!("event=server_stop module=server status=ok addr={}", self.addr);
    }
}

impl Drop for ScheduleServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
