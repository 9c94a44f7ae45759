use log::{error, info, warn};
use starchart_core::{init_logging, ScheduleStoreClient, StoreConfig};
use starchart_server::{ScheduleServer, ServerConfig};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServerConfig::from_env();
    match init_logging(&config.log_level, &config.log_dir) {
        Ok(settings) => println!("Logging to {}", settings.log_dir.display()),
        Err(err) => eprintln!("logging disabled: {err}"),
    }

    let store = open_store();
    let server = match ScheduleServer::start(store, &config.bind_addr).await {
        Ok(server) => server,
        Err(err) => {
            error!("event=server_start module=server status=error error={err}");
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    println!("Server running on http://{}", server.addr());

    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=server_signal module=server status=error error={err}");
    }
    server.shutdown();
    ExitCode::SUCCESS
}

/// Missing credentials or an unusable database leave the API running with
/// every schedule route answering 500.
fn open_store() -> Option<Arc<ScheduleStoreClient>> {
    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("event=store_config module=server status=error error={err}");
            return None;
        }
    };
    match ScheduleStoreClient::connect(&config) {
        Ok(client) => {
            info!("event=store_ready module=server status=ok path={}", client.path());
            Some(Arc::new(client))
        }
        Err(_) => None,
    }
}
