use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use tokio::net::TcpListener;
use tokio::signal;
use winter_supplement::application::pipeline::Pipeline;
use winter_supplement::config::{BatchArgs, CliArgs, Command, Config, ServeArgs};
use winter_supplement::interfaces::{batch, http};
use winter_supplement::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let args = CliArgs::parse();
    let config = Config::try_from(&args).into_diagnostic()?;

    let pipeline = Pipeline::start(&config).await.into_diagnostic()?;
    let outcome = match &args.command {
        Command::Serve(serve) => run_serve(&pipeline, serve).await,
        Command::Batch(batch) => run_batch(&pipeline, batch).await,
    };

    // Tear down the dispatcher even when the run itself failed.
    pipeline.shutdown().await.into_diagnostic()?;
    outcome
}

async fn run_serve(pipeline: &Pipeline, args: &ServeArgs) -> Result<()> {
    let listener = TcpListener::bind(args.http_addr).await.into_diagnostic()?;
    tracing::info!(addr = %args.http_addr, "listening for submissions");
    http::serve(listener, pipeline.service().clone(), shutdown_signal())
        .await
        .into_diagnostic()
}

async fn run_batch(pipeline: &Pipeline, args: &BatchArgs) -> Result<()> {
    let file = File::open(&args.input).into_diagnostic()?;
    batch::run(
        pipeline.service(),
        file,
        io::stdout(),
        args.poll_interval(),
        args.timeout(),
    )
    .await
    .into_diagnostic()?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
