//! FourMore - check in at places and keep OpenStreetMap current
//!
//! Command-line client for the FourMore backend.

use clap::{Parser, Subcommand};
use fourmore_api_client::{ApiError, OsmType, PoiKey};
use fourmore_cli::OutputFormat;
use fourmore_core::error::exit_codes;
use owo_colors::OwoColorize;
use std::process::ExitCode;

mod commands;

use commands::{account, checkins, osm, places, Context};

/// Check in at places and keep OpenStreetMap current
#[derive(Parser)]
#[command(name = "fourmore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a fourmore.toml configuration file
    #[arg(long, global = true, env = "FOURMORE_CONFIG")]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// A place on OpenStreetMap
#[derive(clap::Args, Debug, Clone, Copy)]
struct PlaceArgs {
    /// Element type: node, way or relation
    osm_type: OsmType,
    /// Element id
    osm_id: i64,
}

impl PlaceArgs {
    fn key(self) -> PoiKey {
        PoiKey::new(self.osm_type, self.osm_id)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the OpenStreetMap sign-in URL
    LoginUrl,

    /// Finish sign-in with the code from the OpenStreetMap redirect
    Login {
        /// Authorization code
        code: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List categories, or those matching a query
    Categories {
        /// Text to match against category names
        query: Option<String>,
    },

    /// Search places by name
    Suggest {
        /// Search text
        query: String,

        /// Bias results towards this latitude
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Bias results towards this longitude
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Find a category nearby, widening the area until something turns up
    Category {
        /// Category class, e.g. cafe
        class: String,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Zoom to start from instead of street level
        #[arg(long)]
        zoom: Option<f64>,
    },

    /// Places within a radius
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Radius in meters
        #[arg(short, long, default_value = "1000")]
        radius: f64,

        /// Only this category class
        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long, default_value = "20")]
        limit: u32,

        #[arg(long, default_value = "0")]
        offset: u32,
    },

    /// Places inside a bounding box
    Bbox {
        #[arg(long, allow_hyphen_values = true)]
        north: f64,

        #[arg(long, allow_hyphen_values = true)]
        south: f64,

        #[arg(long, allow_hyphen_values = true)]
        east: f64,

        #[arg(long, allow_hyphen_values = true)]
        west: f64,

        /// Only this category class
        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one place
    Place {
        #[command(flatten)]
        place: PlaceArgs,
    },

    /// Check in at a place
    Checkin {
        #[command(flatten)]
        place: PlaceArgs,

        /// Optional comment
        #[arg(short, long)]
        comment: Option<String>,

        /// Where you are, sent with the check-in
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Your check-in history
    History {
        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "20")]
        per_page: u32,
    },

    /// Your check-in statistics
    Stats,

    /// Confirm a place's information is still accurate
    Confirm {
        #[command(flatten)]
        place: PlaceArgs,
    },

    /// Leave an OpenStreetMap note on a place
    Note {
        #[command(flatten)]
        place: PlaceArgs,

        /// Note text
        text: String,
    },

    /// Questions you can answer about a place
    Quests {
        #[command(flatten)]
        place: PlaceArgs,
    },

    /// Answer a quest
    Answer {
        #[command(flatten)]
        place: PlaceArgs,

        /// Quest id
        quest: String,

        /// Your answer
        answer: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let ctx = match Context::load(cli.config.as_deref(), cli.verbose, cli.format) {
        Ok(ctx) => ctx,
        Err(e) => return report(&e),
    };

    let result = match cli.command {
        Commands::LoginUrl => account::login_url(&ctx).await,
        Commands::Login { code } => account::login(&ctx, &code).await,
        Commands::Logout => account::logout(&ctx),
        Commands::Whoami => account::whoami(&ctx).await,

        Commands::Categories { query } => places::categories(&ctx, query.as_deref()).await,
        Commands::Suggest { query, lat, lon } => places::suggest(&ctx, &query, lat.zip(lon)).await,
        Commands::Category { class, lat, lon, zoom } => {
            places::category(&ctx, &class, (lat, lon), zoom).await
        }
        Commands::Nearby { lat, lon, radius, category, limit, offset } => {
            places::nearby(&ctx, (lat, lon), radius, category, limit, offset).await
        }
        Commands::Bbox { north, south, east, west, category, limit } => {
            places::bbox(&ctx, (north, south, east, west), category.as_deref(), limit).await
        }
        Commands::Place { place } => places::details(&ctx, place.key()).await,

        Commands::Checkin { place, comment, lat, lon } => {
            checkins::checkin(&ctx, place.key(), comment, lat.zip(lon)).await
        }
        Commands::History { page, per_page } => checkins::history(&ctx, page, per_page).await,
        Commands::Stats => checkins::stats(&ctx).await,

        Commands::Confirm { place } => osm::confirm(&ctx, place.key()).await,
        Commands::Note { place, text } => osm::note(&ctx, place.key(), &text).await,
        Commands::Quests { place } => osm::quests(&ctx, place.key()).await,
        Commands::Answer { place, quest, answer } => {
            osm::answer(&ctx, place.key(), quest, answer).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

fn report(err: &anyhow::Error) -> ExitCode {
    eprintln!("{} {:#}", "Error:".red().bold(), err);
    ExitCode::from(exit_code(err))
}

fn exit_code(err: &anyhow::Error) -> u8 {
    let code = if let Some(api) = err.downcast_ref::<ApiError>() {
        match api {
            ApiError::Unauthorized | ApiError::Waitlisted { .. } => exit_codes::AUTH_ERROR,
            ApiError::Validation(_) => exit_codes::VALIDATION_ERROR,
            ApiError::Config(_) | ApiError::MissingEnvVar(_) | ApiError::InvalidUrl(_) => exit_codes::CONFIG_ERROR,
            _ => exit_codes::NETWORK_ERROR,
        }
    } else if let Some(core) = err.downcast_ref::<fourmore_core::Error>() {
        if core.is_config() {
            exit_codes::CONFIG_ERROR
        } else {
            exit_codes::FAILURE
        }
    } else {
        exit_codes::FAILURE
    };
    u8::try_from(code).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_place_args_parse_short_types() {
        let cli = Cli::try_parse_from(["fourmore", "place", "N", "123"]).unwrap();
        match cli.command {
            Commands::Place { place } => assert_eq!(place.key(), PoiKey::new(OsmType::Node, 123)),
            _ => panic!("expected place"),
        }
    }

    #[test]
    fn test_negative_coordinates_accepted() {
        let cli = Cli::try_parse_from(["fourmore", "category", "cafe", "--lat", "40.7", "--lon", "-74.0"]).unwrap();
        assert!(matches!(cli.command, Commands::Category { lon, .. } if lon == -74.0));
    }

    #[test]
    fn test_exit_codes_follow_error_kind() {
        assert_eq!(exit_code(&anyhow::Error::new(ApiError::Unauthorized)), 5);
        assert_eq!(exit_code(&anyhow::Error::new(ApiError::validation("bad"))), 2);
        assert_eq!(exit_code(&anyhow::Error::new(fourmore_core::Error::config("bad"))), 3);
        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }
}
