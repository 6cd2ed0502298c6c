use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use weather_core::{Config, LogFormat, LoggingConfig, OpenWeatherProvider, WeatherProvider};

use crate::routes::{AppState, create_router};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather API service")]
pub struct Cli {
    /// Path to the config file; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service.
    Serve {
        /// Bind address, overrides `server.host`.
        #[arg(long)]
        host: Option<String>,

        /// Bind port, overrides `server.port`.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Store the OpenWeather API key in the config file.
    Configure {
        /// Key to store; prompted for when absent.
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Print current weather for a city as JSON.
    Show {
        /// City name, e.g. "Moscow".
        city: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        match self.command {
            Command::Serve { host, port } => {
                let mut config = Config::load_from(&config_path)?;
                init_tracing(&config.logging);

                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }

                serve(config).await
            }
            Command::Configure { api_key } => {
                // Read the file as stored so environment overrides are not persisted.
                let mut config = Config::read_from(&config_path)?;

                let api_key = match api_key {
                    Some(key) => key,
                    None => inquire::Password::new("OpenWeather API key:")
                        .without_confirmation()
                        .prompt()
                        .context("Failed to read API key")?,
                };
                let api_key = api_key.trim().to_string();
                if api_key.is_empty() {
                    anyhow::bail!("API key must not be empty");
                }

                config.set_api_key(api_key);
                config.save_to(&config_path)?;
                println!("Saved API key to {}", config_path.display());

                Ok(())
            }
            Command::Show { city } => {
                let config = Config::load_from(&config_path)?;
                init_tracing(&config.logging);

                let provider = OpenWeatherProvider::new(config.provider_settings()?)?;
                let record = provider
                    .lookup(&city)
                    .await
                    .with_context(|| format!("Failed to get weather for '{city}'"))?;

                println!("{}", serde_json::to_string_pretty(&record)?);
                Ok(())
            }
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let provider = OpenWeatherProvider::new(config.provider_settings()?)?;
    let router = create_router(AppState::new(Arc::new(provider)));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    tracing::info!(%addr, base_url = %config.provider.base_url, "Listening for HTTP traffic");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(err) => {
            tracing::error!(error = %err, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // stderr keeps `show` output on stdout machine-readable.
    match logging.format {
        LogFormat::Json => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Text => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
