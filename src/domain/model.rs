use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// One registry closing. Rows without coordinates never become records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub date: NaiveDate,
    pub street: String,
    pub number: String,
    pub price: f64,
    pub size_m2: f64,
    pub construction_year: Option<i32>,
    pub location: GeoPoint,
}

/// Inclusive size bounds in m2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: f64,
    pub max: f64,
}

impl SizeRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, size: f64) -> bool {
        size >= self.min && size <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub street: String,
    pub number: String,
    pub radius_m: u32,
    pub min_size: u32,
    pub max_size: u32,
    pub limit: usize,
}

impl SearchQuery {
    pub fn size_range(&self) -> SizeRange {
        SizeRange::new(f64::from(self.min_size), f64::from(self.max_size))
    }

    /// Free-text address handed to the geocoder.
    pub fn address(&self, city: &str) -> String {
        format!("{} {}, {}", self.street.trim(), self.number.trim(), city)
    }
}

/// A record annotated for display: whole meters, whole currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub date: NaiveDate,
    pub street: String,
    pub number: String,
    pub price: i64,
    pub size_m2: i64,
    pub construction_year: Option<i32>,
    pub distance_m: u32,
    pub price_per_m2: i64,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeocodeOutcome {
    Found(GeoPoint),
    NotFound,
}

impl GeocodeOutcome {
    pub fn point(self) -> Option<GeoPoint> {
        match self {
            GeocodeOutcome::Found(point) => Some(point),
            GeocodeOutcome::NotFound => None,
        }
    }
}

/// Rows kept by one filter plus the number of zero-size records it had to skip.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOutcome {
    pub rows: Vec<ResultRow>,
    pub zero_size_excluded: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub query: SearchQuery,
    pub address: String,
    pub reference: GeoPoint,
    pub street_view_link: String,
    pub radius_results: FilterOutcome,
    pub street_results: FilterOutcome,
}
