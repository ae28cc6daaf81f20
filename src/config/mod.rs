pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::toml_config::{SearchConfig, TomlConfig};
#[cfg(feature = "cli")]
use crate::domain::model::SearchQuery;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "closings-finder")]
#[command(about = "Find registry closings near an address or on the same street")]
pub struct CliConfig {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the dataset file from the configuration
    #[arg(long)]
    pub dataset: Option<String>,

    /// Override the export directory from the configuration
    #[arg(long)]
    pub output_path: Option<String>,

    /// Override the geocoding service root URL
    #[arg(long)]
    pub geocoder_endpoint: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Geocode an address and list the highest closings around it and on its street
    Search(SearchArgs),
    /// List the street names available in the dataset
    Streets {
        /// Only streets starting with this text
        prefix: Option<String>,
    },
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Street name, as listed by `streets`
    pub street: String,

    /// House number
    #[arg(short, long, default_value = "30")]
    pub number: String,

    /// Search radius in meters
    #[arg(short, long)]
    pub radius: Option<u32>,

    /// Minimum size in m2
    #[arg(long)]
    pub min_size: Option<u32>,

    /// Maximum size in m2
    #[arg(long)]
    pub max_size: Option<u32>,

    /// Number of results per table
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Skip writing the export bundle
    #[arg(long)]
    pub no_export: bool,
}

#[cfg(feature = "cli")]
impl SearchArgs {
    /// Fills unset controls with the configured defaults.
    pub fn to_query(&self, search: &SearchConfig) -> SearchQuery {
        SearchQuery {
            street: self.street.clone(),
            number: self.number.clone(),
            radius_m: self.radius.unwrap_or(search.radius_default),
            min_size: self.min_size.unwrap_or(search.size_default.0),
            max_size: self.max_size.unwrap_or(search.size_default.1),
            limit: self.limit.unwrap_or(search.result_limit_default),
        }
    }
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Configuration file (or defaults) with command line overrides applied.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(dataset) = &self.dataset {
            config.dataset.path = dataset.clone();
        }
        if let Some(output_path) = &self.output_path {
            config.export.output_path = output_path.clone();
        }
        if let Some(endpoint) = &self.geocoder_endpoint {
            config.geocoder.endpoint = endpoint.clone();
        }
        if let Command::Search(args) = &self.command {
            if args.no_export {
                config.export.enabled = false;
            }
        }

        Ok(config)
    }
}
