use crate::config::toml_config::SearchConfig;
use crate::core::dataset::Dataset;
use crate::core::export::export_bundle;
use crate::core::filter::{on_street, within_radius};
use crate::core::links::street_view_link;
use crate::domain::model::{GeocodeOutcome, SearchQuery, SearchReport};
use crate::domain::ports::{ConfigProvider, Geocoder, Storage};
use crate::utils::error::{LookupError, Result};
use std::sync::Arc;

/// Runs one search at a time over a dataset loaded once at startup.
pub struct SearchEngine<G: Geocoder, S: Storage, C: ConfigProvider> {
    dataset: Arc<Dataset>,
    geocoder: G,
    storage: S,
    config: C,
    limits: SearchConfig,
    last_report: Option<SearchReport>,
}

impl<G: Geocoder, S: Storage, C: ConfigProvider> SearchEngine<G, S, C> {
    pub fn new(dataset: Arc<Dataset>, geocoder: G, storage: S, config: C, limits: SearchConfig) -> Self {
        Self {
            dataset,
            geocoder,
            storage,
            config,
            limits,
            last_report: None,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Report of the most recent successful search.
    pub fn last_report(&self) -> Option<&SearchReport> {
        self.last_report.as_ref()
    }

    /// Geocodes the query address and computes both result tables.
    ///
    /// An unresolvable address aborts the search with
    /// [`LookupError::AddressNotResolved`] and leaves the previous report in place.
    pub async fn search(&mut self, query: SearchQuery) -> Result<&SearchReport> {
        self.limits.check_query(&query)?;

        let address = query.address(self.config.city());
        tracing::info!("🔎 Searching closings around '{}'", address);

        let reference = match self.geocoder.geocode(&address).await {
            GeocodeOutcome::Found(point) => point,
            GeocodeOutcome::NotFound => {
                return Err(LookupError::AddressNotResolved { address });
            }
        };

        let records = self.dataset.records();
        let sizes = query.size_range();

        let radius_results = within_radius(records, reference, query.radius_m, sizes, query.limit);
        let street_results = on_street(records, reference, &query.street, sizes, query.limit);

        tracing::info!(
            "📍 {} closings within {} m, {} on '{}'",
            radius_results.rows.len(),
            query.radius_m,
            street_results.rows.len(),
            query.street
        );

        let report = SearchReport {
            street_view_link: street_view_link(reference),
            address,
            reference,
            radius_results,
            street_results,
            query,
        };

        Ok(&*self.last_report.insert(report))
    }

    /// Writes the export bundle for `report` and returns its path.
    pub async fn export(&self, report: &SearchReport) -> Result<String> {
        let bundle = export_bundle(report, self.config.listing_site())?;
        let file_name = format!(
            "closings_{}.zip",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        );

        tracing::debug!("Writing export bundle ({} bytes) to storage", bundle.len());
        self.storage.write_file(&file_name, &bundle).await?;

        Ok(format!("{}/{}", self.config.output_path(), file_name))
    }
}
