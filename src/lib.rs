pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::toml_config::TomlConfig;
pub use crate::core::{dataset::Dataset, geocoder::NominatimGeocoder, search::SearchEngine};
pub use crate::utils::error::{LookupError, Result};
