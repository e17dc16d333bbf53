use bg_remover::http::{AppState, REMOVE_BG_PATH, UploadStore, create_router};
use bg_remover::{AppConfig, BackgroundRemover, BridgeResult};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::cli::ServeCommand;

/// Run the HTTP server until Ctrl+C or SIGTERM.
pub async fn run(mut config: AppConfig, cmd: ServeCommand) -> BridgeResult<()> {
    cmd.apply(&mut config);
    config.validate()?;

    let uploads = UploadStore::init(&config.uploads).await?;
    let remover = BackgroundRemover::new(config.tool.clone());
    let app = create_router(AppState::new(remover, uploads));

    let address = config.server_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Server listening on http://{address}");
    info!(
        route = REMOVE_BG_PATH,
        program = %config.tool.program.display(),
        "Accepting background removal uploads"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown completed");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, starting graceful shutdown...");
        },
        () = terminate => {
            info!("Received terminate signal, starting graceful shutdown...");
        },
    }
}
