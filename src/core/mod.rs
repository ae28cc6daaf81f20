pub mod dataset;
pub mod export;
pub mod filter;
pub mod geocoder;
pub mod links;
pub mod search;

pub use crate::domain::model::{GeoPoint, PropertyRecord, ResultRow, SearchQuery, SearchReport};
pub use crate::domain::ports::{ConfigProvider, Geocoder, Storage};
pub use crate::utils::error::Result;
