use crate::domain::model::GeocodeOutcome;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn dataset_path(&self) -> &str;
    fn geocoder_endpoint(&self) -> &str;
    fn user_agent(&self) -> &str;
    fn city(&self) -> &str;
    fn output_path(&self) -> &str;
    fn listing_site(&self) -> &str;
}

/// Resolves free-text addresses. Failures of any kind are `NotFound`.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> GeocodeOutcome;
}
