use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use geoverify::config::Config;
use geoverify::{BrowserGeolocation, LocationVerifier};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "geoverify-cli")]
#[command(about = "Run one-off location verifications", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Coordinate {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lng: f64,
    /// Accuracy radius in meters
    #[arg(long, default_value_t = 50.0)]
    accuracy: f64,
}

impl Coordinate {
    fn into_location(self) -> BrowserGeolocation {
        BrowserGeolocation {
            latitude: self.lat,
            longitude: self.lng,
            accuracy: self.accuracy,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the country for an IP address (omit to locate this machine)
    Lookup { ip: Option<String> },
    /// Verify an IP address against a registered country
    VerifyIp {
        /// Registered country code (e.g. KE)
        country: String,
        ip: Option<String>,
    },
    /// Verify a device coordinate against a registered country
    VerifyBrowser {
        country: String,
        #[command(flatten)]
        coordinate: Coordinate,
    },
    /// Verify both signals and combine them
    VerifyHybrid {
        country: String,
        #[arg(long)]
        ip: Option<String>,
        #[arg(long, allow_hyphen_values = true, requires = "lng")]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lng: Option<f64>,
        #[arg(long, default_value_t = 50.0)]
        accuracy: f64,
    },
    /// Check whether a country is on the supported list
    Supported { country: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode result")?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let verifier = LocationVerifier::from_config(&config, CancellationToken::new())?;

    match cli.command {
        Commands::Lookup { ip } => {
            print_json(&verifier.get_country_from_ip(ip.as_deref()).await)?;
        }
        Commands::VerifyIp { country, ip } => {
            print_json(&verifier.verify_ip_location(ip.as_deref(), &country).await)?;
        }
        Commands::VerifyBrowser {
            country,
            coordinate,
        } => {
            let location = coordinate.into_location();
            print_json(&verifier.verify_browser_location(&location, &country))?;
        }
        Commands::VerifyHybrid {
            country,
            ip,
            lat,
            lng,
            accuracy,
        } => {
            let location = match (lat, lng) {
                (Some(lat), Some(lng)) => Some(
                    Coordinate {
                        lat,
                        lng,
                        accuracy,
                    }
                    .into_location(),
                ),
                _ => None,
            };
            let result = verifier
                .verify_hybrid_location(ip.as_deref(), location.as_ref(), &country)
                .await;
            print_json(&result)?;
        }
        Commands::Supported { country } => {
            if verifier.is_detected_country_supported(&country) {
                println!("✓ {} is supported", country.to_uppercase());
            } else {
                println!("⚠ {} is not supported", country.to_uppercase());
            }
        }
    }

    Ok(())
}
