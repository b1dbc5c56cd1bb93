//! serflash - flash a firmware image to a serially attached device
//!
//! Fetches the image over HTTP, drives one flashing session against the
//! chosen serial port, and renders the session's events as log lines and
//! a progress bar.

mod output;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flash_engine::{ScriptConfig, ScriptedEngineFactory, WriteOptions};
use flash_fetch::HttpFirmwareSource;
use flash_session::{FlashSession, SessionConfig};
use flash_transport::{create_provider, MockConfig, SerialConfig, TransportConfig};

use crate::output::OutputContext;

#[derive(Parser)]
#[command(name = "serflash")]
#[command(author, version, about = "Serial firmware flasher")]
struct Cli {
    /// URL of the firmware image to flash
    #[arg(env = "SERFLASH_IMAGE")]
    image: String,

    /// Serial device path, or "mock" for the simulated device
    #[arg(short, long, env = "SERFLASH_PORT", default_value = "mock")]
    port: String,

    /// Baud rate for the serial connection
    #[arg(long, default_value_t = 115_200)]
    baud: u32,

    /// Skip hash verification after the write
    #[arg(long)]
    no_verify: bool,

    /// Emit events as JSON lines instead of formatted output
    #[arg(long)]
    json: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let transport = if cli.port == "mock" {
        TransportConfig::Mock(MockConfig::default())
    } else {
        TransportConfig::Serial(SerialConfig {
            path: cli.port.clone(),
        })
    };
    let provider = create_provider(&transport).context("Failed to create serial provider")?;

    let engines = Arc::new(ScriptedEngineFactory::new(ScriptConfig::default()));
    let source = Arc::new(
        HttpFirmwareSource::new(&cli.image)
            .with_context(|| format!("Invalid image URL: {}", cli.image))?,
    );

    let config = SessionConfig {
        baud_rate: cli.baud,
        write_options: WriteOptions {
            verify: !cli.no_verify,
            ..Default::default()
        },
        ..Default::default()
    };
    let session = Arc::new(FlashSession::new(provider, engines, source, config));

    // Render session events until the channel closes
    let mut rx = session.subscribe();
    let mut ctx = OutputContext::new(cli.json, cli.no_color, cli.quiet);
    let renderer = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => ctx.render(&event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        ctx
    });

    let result = tokio::select! {
        res = run_flow(&session) => res,
        _ = tokio::signal::ctrl_c() => {
            let _ = session.disconnect().await;
            Err(anyhow::anyhow!("Interrupted"))
        }
    };

    // Dropping the session closes the event channel and ends the renderer
    let phase = session.phase();
    drop(session);
    let mut ctx = renderer.await.context("Renderer task failed")?;
    ctx.finish(phase);

    match result {
        Ok(()) => {
            ctx.success("Firmware update completed successfully");
            Ok(())
        }
        Err(err) => {
            ctx.error(&format!("{:#}", err));
            std::process::exit(1);
        }
    }
}

async fn run_flow(session: &FlashSession) -> Result<()> {
    session
        .connect()
        .await
        .context("Failed to open serial connection")?;
    session.flash().await.context("Flash attempt failed")?;
    Ok(())
}
