use std::fs;
use std::sync::Arc;
use tokenkeeper::api;
use tokenkeeper::logger::*;
use tokenkeeper::server::*;
use tokenkeeper::settings::*;
use tokio::signal;
use warp::Filter;

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "could not register SIGINT handler");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let address: std::net::SocketAddr = project_settings.http.address.parse()?;
    if project_settings.http.tls {
        if !fs::metadata(&project_settings.http.cert_path)?.is_file() {
            return Err(anyhow::anyhow!(
                "TLS cert is not a regular file: {:?}",
                project_settings.http.cert_path
            ));
        }
        if !fs::metadata(&project_settings.http.key_path)?.is_file() {
            return Err(anyhow::anyhow!(
                "TLS key is not a regular file: {:?}",
                project_settings.http.key_path
            ));
        }
    }

    let server = Arc::new(Server::try_new(&project_settings).await?);

    let api_v1 = warp::path("api")
        .and(warp::path("v1"))
        .and(api::v1::routes(server.clone()))
        .recover(api::v1::recover_error)
        .with(warp::trace::request());

    if project_settings.http.tls {
        warp::serve(api_v1)
            .tls()
            .cert_path(project_settings.http.cert_path.clone())
            .key_path(project_settings.http.key_path.clone())
            .bind_with_graceful_shutdown(address, shutdown_signal())
            .1
            .await;
    } else {
        warn!(%address, "serving plain HTTP, refresh cookies are marked Secure");
        warp::serve(api_v1)
            .bind_with_graceful_shutdown(address, shutdown_signal())
            .1
            .await;
    }

    let shutdown_timeout = std::time::Duration::from_secs(100);
    match tokio::time::timeout(shutdown_timeout, server.shutdown()).await {
        Ok(_) => info!("server shutdown successfully"),
        Err(_) => error!("server shutdown timed out"),
    }

    Ok(())
}
