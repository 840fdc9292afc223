use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use weather_core::{Config, ToolRegistry, WeatherService, provider_from_config, tools::tool_catalog};

use crate::{display, server};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "OpenWeatherMap tools for LLM agents")]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key in the config file.
    Configure,

    /// Show weather for a location.
    Show {
        /// City name with optional country code, e.g. "London,uk".
        location: String,

        /// Print the raw tool result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Serve `get_weather` and `list_available_tools` over stdio JSON-RPC.
    Serve,

    /// Print the tool discovery metadata.
    Tools,

    /// Verify the API key against both the geocoding and One Call endpoints.
    Check,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { location, json } => show(&location, json).await,
            Command::Serve => {
                let service = load_service()?;
                let registry = ToolRegistry::new(Arc::new(service));
                server::run_stdio(&registry).await
            }
            Command::Tools => {
                println!("{}", serde_json::to_string_pretty(&tool_catalog())?);
                Ok(())
            }
            Command::Check => check().await,
        }
    }
}

fn load_service() -> anyhow::Result<WeatherService> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    Ok(WeatherService::new(provider))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .with_help_message("One Call API 3.0 requires the 'One Call by Call' subscription")
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key);
    let path = config.save()?;
    println!("Saved API key to {}", path.display());
    Ok(())
}

async fn show(location: &str, json: bool) -> anyhow::Result<()> {
    let service = load_service()?;

    let outcome = tokio::select! {
        outcome = service.get_weather(location) => outcome,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, request abandoned");
            return Ok(());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", display::render(&outcome));
    }

    if outcome.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

async fn check() -> anyhow::Result<()> {
    let service = load_service()?;
    let provider = service.provider();

    if !provider.is_configured() {
        bail!(
            "No API key found.\n\
             Hint: set OPENWEATHERMAP_API_KEY or run `weather configure`."
        );
    }

    println!("Testing Geocoding API...");
    let geo = provider
        .geocode("London")
        .await
        .context("Geocoding API check failed")?;
    println!("  ok: found {}", geo.label());

    println!("Testing One Call API 3.0...");
    provider
        .one_call(geo.latitude, geo.longitude)
        .await
        .context("One Call API check failed")?;
    println!("  ok: One Call API 3.0 is reachable with this key");

    println!("\nYour API key works with both endpoints.");
    Ok(())
}
