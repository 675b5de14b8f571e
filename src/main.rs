//! gemini-relay - Streaming text-generation relay for Vertex AI Gemini
//!
//! A single-endpoint HTTP service that forwards text-generation requests to
//! Gemini via a streaming call and returns the reassembled text with
//! character-count metadata.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gemini_relay::config::Settings;
use gemini_relay::server;

#[derive(Parser)]
#[command(name = "gemini-relay")]
#[command(about = "Streaming text-generation relay for Vertex AI Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the prediction server
    Serve {
        /// Override listen port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate environment configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured single-line JSON records on stdout, flushed per event.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let mut settings = Settings::from_env()?;
            if let Some(port) = port {
                settings.port = port;
            }

            tracing::info!(
                project = %settings.project_id,
                region = %settings.region,
                model = %settings.model_id,
                "Loaded configuration"
            );

            server::run_server(settings).await
        }

        Commands::Check => {
            let settings = Settings::from_env()?;
            tracing::info!(
                project = %settings.project_id,
                region = %settings.region,
                model = %settings.model_id,
                port = settings.port,
                "Configuration OK"
            );
            Ok(())
        }
    }
}
