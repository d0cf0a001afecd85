#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal front end for the alertx live map.
//!
//! Finds emergency and civic places (hospitals, police, shelters, transit)
//! around a location and exports them as JSON. Anything not given as a
//! flag is prompted for interactively.
//!
//! Uses `indicatif-log-bridge` (via [`alertx_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and the scanning spinner never fight for the terminal.

mod live_map;

use std::path::PathBuf;
use std::process::ExitCode;

use alertx_category_models::{CategoryGroup, CategoryKey};
use clap::Parser;

/// Find places near a location and export them.
#[derive(Parser)]
#[command(name = "alertx")]
#[command(about = "Find emergency and civic places near a location")]
struct Cli {
    /// Place to search around. The first geocoder match is used.
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    place: Option<String>,

    /// Latitude to search around, instead of a place name.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude to search around, instead of a place name.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Comma-separated category keys (e.g. `police,fire_station`).
    #[arg(long, value_delimiter = ',')]
    categories: Vec<CategoryKey>,

    /// Search radius in kilometers (5, 10, 25, 50 or 100).
    #[arg(long)]
    radius_km: Option<u32>,

    /// Maximum places per category (1-50).
    #[arg(long)]
    max_per_category: Option<u32>,

    /// Write the results as JSON into this directory.
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Print the category keys and exit.
    #[arg(long)]
    list_categories: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.list_categories {
        print_categories();
        return Ok(ExitCode::SUCCESS);
    }

    let multi = alertx_cli_utils::init_logger();

    println!("Alert X Live Map");
    println!();

    live_map::run(&multi, cli.into()).await
}

fn print_categories() {
    for group in CategoryGroup::all() {
        println!("{}", group.title());
        for key in group.categories() {
            println!("  {:<24} {} {}", key.as_ref(), key.emoji(), key.display_name());
        }
    }
}

impl From<Cli> for live_map::Options {
    fn from(cli: Cli) -> Self {
        Self {
            place: cli.place,
            coordinate: cli.lat.zip(cli.lon),
            categories: cli.categories,
            radius_km: cli.radius_km,
            max_per_category: cli.max_per_category,
            export_dir: cli.export_dir,
        }
    }
}
