#![allow(clippy::missing_errors_doc)]

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::app::poller::Screen;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "airsense",
    version,
    about = "Air quality and odor forecast for saved locations"
)]
pub struct Cli {
    /// Measurement service endpoint
    #[arg(long, env = "AIRSENSE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Basic auth login (requires --password)
    #[arg(long, env = "AIRSENSE_BASEAUTH_LOGIN", global = true)]
    pub login: Option<String>,

    /// Basic auth password (requires --login)
    #[arg(
        long,
        env = "AIRSENSE_BASEAUTH_PASSWORD",
        hide_env_values = true,
        global = true
    )]
    pub password: Option<String>,

    /// Directory holding saved locations (default: ~/.config/airsense)
    #[arg(long, env = "AIRSENSE_CONFIG_DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Forecast horizon in days (0..5)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..=5), global = true)]
    pub horizon: u8,

    /// Measurement types to query, comma separated (default: all)
    #[arg(long, value_delimiter = ',', global = true)]
    pub types: Vec<String>,

    /// Display color for the parameter set
    #[arg(long, global = true)]
    pub color: Option<String>,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List saved locations
    Locations,
    /// Save a new location
    Add(AddArgs),
    /// Fetch once and print the forecast
    Forecast(ScreenArgs),
    /// Keep refreshing until interrupted
    Watch(ScreenArgs),
}

#[derive(Debug, Clone, Args)]
pub struct AddArgs {
    pub name: String,

    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Debug, Clone, Args)]
pub struct ScreenArgs {
    /// Saved location id
    #[arg(long, conflicts_with = "area")]
    pub location: Option<String>,

    /// Metro area for today onward instead of the whole region history
    #[arg(long)]
    pub area: bool,
}

impl ScreenArgs {
    #[must_use]
    pub fn screen(&self) -> Screen {
        match (&self.location, self.area) {
            (Some(id), _) => Screen::LocationDetail(id.clone()),
            (None, true) => Screen::Map,
            (None, false) => Screen::Home,
        }
    }
}

impl Cli {
    pub fn validate(&self) -> anyhow::Result<()> {
        match (&self.login, &self.password) {
            (Some(_), None) | (None, Some(_)) => {
                anyhow::bail!("--login and --password must be provided together")
            }
            _ => {}
        }
        if self.fetches() && self.api_url.is_none() {
            anyhow::bail!("--api-url (or AIRSENSE_API_URL) is required to fetch measurements");
        }
        Ok(())
    }

    #[must_use]
    pub fn fetches(&self) -> bool {
        matches!(self.command, Command::Forecast(_) | Command::Watch(_))
    }
}
