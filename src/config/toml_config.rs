use crate::core::dataset::{DatasetOptions, DecimalSeparator};
use crate::domain::model::SearchQuery;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LookupError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub dataset: DatasetConfig,
    pub geocoder: GeocoderConfig,
    pub search: SearchConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: String,
    pub delimiter: String,
    pub skip_rows: usize,
    /// `.` or `,`; the other mark is read as a thousands separator.
    pub decimal_separator: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: "madrid_properties.csv".to_string(),
            delimiter: ",".to_string(),
            skip_rows: 0,
            decimal_separator: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Appended to every address before geocoding.
    pub city: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "closings-finder/0.1".to_string(),
            timeout_seconds: 10,
            city: "Madrid".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub radius_min: u32,
    pub radius_max: u32,
    pub radius_step: u32,
    pub radius_default: u32,
    pub size_min: u32,
    pub size_max: u32,
    pub size_step: u32,
    pub size_default: (u32, u32),
    pub result_limits: Vec<usize>,
    pub result_limit_default: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            radius_min: 100,
            radius_max: 500,
            radius_step: 100,
            radius_default: 300,
            size_min: 50,
            size_max: 400,
            size_step: 10,
            size_default: (50, 200),
            result_limits: vec![10, 20, 30, 40, 50],
            result_limit_default: 20,
        }
    }
}

impl SearchConfig {
    /// Rejects queries the search controls could not have produced.
    pub fn check_query(&self, query: &SearchQuery) -> Result<()> {
        validation::validate_non_empty_string("street", &query.street)?;
        validation::validate_non_empty_string("number", &query.number)?;

        validation::validate_range("radius", query.radius_m, self.radius_min, self.radius_max)?;
        validation::validate_step("radius", query.radius_m, self.radius_min, self.radius_step)?;

        validation::validate_range("min_size", query.min_size, self.size_min, self.size_max)?;
        validation::validate_range("max_size", query.max_size, self.size_min, self.size_max)?;
        validation::validate_step("min_size", query.min_size, self.size_min, self.size_step)?;
        validation::validate_step("max_size", query.max_size, self.size_min, self.size_step)?;
        if query.min_size > query.max_size {
            return Err(LookupError::ValidationError {
                message: format!(
                    "min_size {} is larger than max_size {}",
                    query.min_size, query.max_size
                ),
            });
        }

        validation::validate_choice("limit", query.limit, &self.result_limits)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub enabled: bool,
    pub output_path: String,
    pub listing_site: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_path: "./output".to_string(),
            listing_site: "idealista.com".to_string(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LookupError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LookupError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEOCODER_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LookupError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn dataset_options(&self) -> Result<DatasetOptions> {
        let mut chars = self.dataset.delimiter.chars();
        let delimiter = match (chars.next(), chars.next()) {
            (Some('\\'), Some('t')) if self.dataset.delimiter == "\\t" => b'\t',
            (Some(c), None) if c.is_ascii() => c as u8,
            _ => {
                return Err(LookupError::InvalidConfigValueError {
                    field: "dataset.delimiter".to_string(),
                    value: self.dataset.delimiter.clone(),
                    reason: "Delimiter must be a single ASCII character".to_string(),
                })
            }
        };

        let decimal_separator = match self.dataset.decimal_separator.as_str() {
            "." => DecimalSeparator::Dot,
            "," => DecimalSeparator::Comma,
            other => {
                return Err(LookupError::InvalidConfigValueError {
                    field: "dataset.decimal_separator".to_string(),
                    value: other.to_string(),
                    reason: "Decimal separator must be '.' or ','".to_string(),
                })
            }
        };

        Ok(DatasetOptions {
            delimiter,
            skip_rows: self.dataset.skip_rows,
            decimal_separator,
        })
    }

    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder.timeout_seconds)
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("dataset.path", &self.dataset.path)?;
        self.dataset_options()?;

        validation::validate_url("geocoder.endpoint", &self.geocoder.endpoint)?;
        validation::validate_non_empty_string("geocoder.user_agent", &self.geocoder.user_agent)?;
        validation::validate_non_empty_string("geocoder.city", &self.geocoder.city)?;
        validation::validate_positive_number(
            "geocoder.timeout_seconds",
            self.geocoder.timeout_seconds,
            1,
        )?;

        let search = &self.search;
        if search.radius_min > search.radius_max || search.size_min > search.size_max {
            return Err(LookupError::ConfigError {
                message: "search bounds must have min <= max".to_string(),
            });
        }
        if search.result_limits.is_empty() {
            return Err(LookupError::MissingConfigError {
                field: "search.result_limits".to_string(),
            });
        }
        validation::validate_choice(
            "search.result_limit_default",
            search.result_limit_default,
            &search.result_limits,
        )?;
        let defaults = SearchQuery {
            street: "default".to_string(),
            number: "1".to_string(),
            radius_m: search.radius_default,
            min_size: search.size_default.0,
            max_size: search.size_default.1,
            limit: search.result_limit_default,
        };
        search.check_query(&defaults).map_err(|e| LookupError::ConfigError {
            message: format!("search defaults do not fit the controls: {}", e),
        })?;

        validation::validate_path("export.output_path", &self.export.output_path)?;
        validation::validate_non_empty_string("export.listing_site", &self.export.listing_site)?;

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn dataset_path(&self) -> &str {
        &self.dataset.path
    }

    fn geocoder_endpoint(&self) -> &str {
        &self.geocoder.endpoint
    }

    fn user_agent(&self) -> &str {
        &self.geocoder.user_agent
    }

    fn city(&self) -> &str {
        &self.geocoder.city
    }

    fn output_path(&self) -> &str {
        &self.export.output_path
    }

    fn listing_site(&self) -> &str {
        &self.export.listing_site
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
