use std::process::ExitCode;

use configs::AppConfig;
use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn init_logging(json: bool) {
    if json {
        common::utils::logging::init_logging_json();
    } else {
        common::utils::logging::init_logging_default();
    }
    info!(service = "tasks-backend", event = "logger_init", "tracing subscriber initialized");
}

fn main() -> ExitCode {
    // .env first so RUST_LOG, JWT_SECRET and CONFIG_PATH take effect
    dotenv().ok();

    let cfg = match AppConfig::load_or_default() {
        Ok(cfg) => cfg,
        Err(e) => {
            init_logging(false);
            error!(service = "tasks-backend", event = "config_invalid", error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    init_logging(cfg.logging.json);

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "tasks-backend",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    if cfg.server.jwt_secret == configs::DEV_JWT_SECRET {
        tracing::warn!(service = "tasks-backend", "using the development JWT secret; set JWT_SECRET");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "tasks-backend", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(service = "tasks-backend", event = "start", %service_id, pid, version, "task backend starting");

    rt.block_on(async move {
        let shutdown = async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!(service = "tasks-backend", event = "shutdown_signal", %service_id, pid, "received Ctrl+C, shutting down");
            }
        };
        match server::run(&cfg.server, shutdown).await {
            Ok(()) => {
                info!(service = "tasks-backend", event = "stop", %service_id, pid, "task backend stopped normally");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(service = "tasks-backend", event = "run_failed", error = %e, "server::run returned error");
                ExitCode::FAILURE
            }
        }
    })
}
