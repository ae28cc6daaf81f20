use crate::domain::model::{GeoPoint, PropertyRecord};
use crate::domain::ports::Storage;
use crate::utils::error::{LookupError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;

const LATITUDE_HEADERS: &[&str] = &["Latitude", "latitude", "lat"];
const LONGITUDE_HEADERS: &[&str] = &["Longitud", "Longitude", "longitude", "lon"];

#[derive(Debug, Clone)]
pub struct DatasetOptions {
    pub delimiter: u8,
    /// Title lines above the header row.
    pub skip_rows: usize,
    pub decimal_separator: DecimalSeparator,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            skip_rows: 0,
            decimal_separator: DecimalSeparator::Dot,
        }
    }
}

/// Decimal mark used by the numeric columns. The other mark may only appear
/// as a thousands separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecimalSeparator {
    /// `1,234.5`
    #[default]
    Dot,
    /// `1.234,5`
    Comma,
}

impl DecimalSeparator {
    fn grouping(self) -> char {
        match self {
            DecimalSeparator::Dot => ',',
            DecimalSeparator::Comma => '.',
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            DecimalSeparator::Dot => r"^-?(\d+|\d{1,3}(,\d{3})+)(\.\d+)?$",
            DecimalSeparator::Comma => r"^-?(\d+|\d{1,3}(\.\d{3})+)(,\d+)?$",
        }
    }
}

/// Strict number reader for one [`DecimalSeparator`]. Values that do not fit
/// the format are rejected rather than reinterpreted.
#[derive(Debug, Clone)]
pub struct NumberFormat {
    separator: DecimalSeparator,
    pattern: Regex,
}

impl NumberFormat {
    pub fn new(separator: DecimalSeparator) -> Result<Self> {
        let pattern = Regex::new(separator.pattern()).map_err(|e| LookupError::DatasetError {
            message: format!("number pattern: {}", e),
        })?;
        Ok(Self { separator, pattern })
    }

    pub fn parse(&self, value: &str) -> Option<f64> {
        let value = value.trim();
        if !self.pattern.is_match(value) {
            return None;
        }

        let grouping = self.separator.grouping();
        let normalized: String = value
            .chars()
            .filter(|c| *c != grouping)
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        normalized.parse::<f64>().ok().filter(|n| n.is_finite())
    }
}

enum Cell {
    Absent,
    Value(f64),
    Unreadable,
}

fn numeric_cell(value: Option<String>, format: &NumberFormat) -> Cell {
    match non_empty(value) {
        None => Cell::Absent,
        Some(v) => match format.parse(&v) {
            Some(n) => Cell::Value(n),
            None => Cell::Unreadable,
        },
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows_read: usize,
    pub missing_coordinates: usize,
    pub malformed: usize,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default, rename = "Date", alias = "date")]
    date: Option<String>,
    #[serde(default, rename = "Street", alias = "street")]
    street: Option<String>,
    #[serde(default, rename = "Nr", alias = "nr", alias = "Number", alias = "number")]
    number: Option<String>,
    #[serde(default, rename = "Price", alias = "price")]
    price: Option<String>,
    #[serde(default, rename = "m2", alias = "M2", alias = "size")]
    size: Option<String>,
    #[serde(default, rename = "Const. Year", alias = "const_year", alias = "year")]
    construction_year: Option<String>,
    #[serde(default, rename = "Latitude", alias = "latitude", alias = "lat")]
    latitude: Option<String>,
    #[serde(
        default,
        rename = "Longitud",
        alias = "Longitude",
        alias = "longitude",
        alias = "lon"
    )]
    longitude: Option<String>,
}

enum RowVerdict {
    Keep(PropertyRecord),
    MissingCoordinates,
    Malformed(&'static str),
}

/// The in-memory closings table. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<PropertyRecord>,
    stats: LoadStats,
}

impl Dataset {
    pub fn from_records(records: Vec<PropertyRecord>) -> Self {
        let stats = LoadStats {
            rows_read: records.len(),
            ..LoadStats::default()
        };
        Self { records, stats }
    }

    pub async fn load<S: Storage>(storage: &S, path: &str, options: &DatasetOptions) -> Result<Self> {
        tracing::debug!("Reading dataset from {}", path);
        let bytes = storage.read_file(path).await?;
        let dataset = Self::from_bytes(&bytes, options)?;

        if dataset.is_empty() {
            return Err(LookupError::DatasetError {
                message: format!("{} contains no rows with coordinates", path),
            });
        }

        tracing::info!(
            "📚 Loaded {} closings from {} ({} without coordinates, {} malformed)",
            dataset.len(),
            path,
            dataset.stats.missing_coordinates,
            dataset.stats.malformed
        );
        Ok(dataset)
    }

    pub fn from_bytes(bytes: &[u8], options: &DatasetOptions) -> Result<Self> {
        let body = skip_lines(bytes, options.skip_rows);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(body);

        let headers = reader.headers()?.clone();
        let has_any = |names: &[&str]| headers.iter().any(|h| names.contains(&h));
        if !has_any(LATITUDE_HEADERS) || !has_any(LONGITUDE_HEADERS) {
            return Err(LookupError::DatasetError {
                message: format!(
                    "header row must contain latitude and longitude columns, found: {}",
                    headers.iter().collect::<Vec<_>>().join(", ")
                ),
            });
        }

        let format = NumberFormat::new(options.decimal_separator)?;
        let mut records = Vec::new();
        let mut stats = LoadStats::default();

        for row in reader.deserialize::<RawRow>() {
            stats.rows_read += 1;
            let raw = match row {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::debug!("Skipping unreadable row {}: {}", stats.rows_read, e);
                    stats.malformed += 1;
                    continue;
                }
            };

            match classify(raw, &format) {
                RowVerdict::Keep(record) => records.push(record),
                RowVerdict::MissingCoordinates => stats.missing_coordinates += 1,
                RowVerdict::Malformed(reason) => {
                    tracing::debug!("Skipping row {}: {}", stats.rows_read, reason);
                    stats.malformed += 1;
                }
            }
        }

        Ok(Self { records, stats })
    }

    pub fn records(&self) -> &[PropertyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }

    /// Distinct street names, sorted, for the street selector.
    pub fn streets(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.street.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct streets starting with `prefix`, ignoring case.
    pub fn streets_matching(&self, prefix: &str) -> Vec<&str> {
        let prefix = prefix.to_lowercase();
        self.streets()
            .into_iter()
            .filter(|s| s.to_lowercase().starts_with(&prefix))
            .collect()
    }
}

fn skip_lines(bytes: &[u8], count: usize) -> &[u8] {
    let mut rest = bytes;
    for _ in 0..count {
        match rest.iter().position(|b| *b == b'\n') {
            Some(idx) => rest = &rest[idx + 1..],
            None => return &[],
        }
    }
    rest
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn classify(raw: RawRow, format: &NumberFormat) -> RowVerdict {
    let lat = numeric_cell(raw.latitude, format);
    let lon = numeric_cell(raw.longitude, format);
    let (lat, lon) = match (lat, lon) {
        (Cell::Value(lat), Cell::Value(lon)) => (lat, lon),
        (Cell::Unreadable, _) | (_, Cell::Unreadable) => {
            return RowVerdict::Malformed("unreadable coordinates")
        }
        _ => return RowVerdict::MissingCoordinates,
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return RowVerdict::Malformed("coordinates out of range");
    }

    let Some(street) = non_empty(raw.street) else {
        return RowVerdict::Malformed("missing street");
    };
    let Some(date) = non_empty(raw.date).and_then(|v| parse_date(&v)) else {
        return RowVerdict::Malformed("missing or unreadable date");
    };
    let Cell::Value(price) = numeric_cell(raw.price, format) else {
        return RowVerdict::Malformed("missing or unreadable price");
    };
    let Cell::Value(size_m2) = numeric_cell(raw.size, format) else {
        return RowVerdict::Malformed("missing or unreadable size");
    };
    let construction_year = match numeric_cell(raw.construction_year, format) {
        Cell::Absent => None,
        Cell::Value(year) => Some(year.round() as i32),
        Cell::Unreadable => return RowVerdict::Malformed("unreadable construction year"),
    };

    RowVerdict::Keep(PropertyRecord {
        date,
        street,
        number: non_empty(raw.number)
            .map(|n| normalize_house_number(&n))
            .unwrap_or_default(),
        price,
        size_m2,
        construction_year,
        location: GeoPoint::new(lat, lon),
    })
}

/// Spreadsheet exports turn `10` into `10.0`; undo that.
fn normalize_house_number(value: &str) -> String {
    match value.parse::<f64>() {
        Ok(n) if n.fract() == 0.0 && n >= 0.0 => format!("{}", n as i64),
        _ => value.to_string(),
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Date,Street,Nr,Price,m2,Const. Year,Latitude,Longitud
2023-05-04,Alcala,10,500000,100,1965,40.4200,-3.7000
04/06/2023,Gran Via,22.0,750000.5,120.4,1920,40.4203,-3.7058
2023-07-01,Serrano,5,900000,150,1950,,
2023-07-02,Serrano,7,not-a-price,150,1950,40.43,-3.68
";

    #[test]
    fn test_loads_rows_and_drops_missing_coordinates() {
        let dataset = Dataset::from_bytes(SAMPLE.as_bytes(), &DatasetOptions::default()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.stats().rows_read, 4);
        assert_eq!(dataset.stats().missing_coordinates, 1);
        assert_eq!(dataset.stats().malformed, 1);

        let gran_via = &dataset.records()[1];
        assert_eq!(gran_via.street, "Gran Via");
        assert_eq!(gran_via.number, "22");
        assert_eq!(gran_via.date, NaiveDate::from_ymd_opt(2023, 6, 4).unwrap());
        assert_eq!(gran_via.construction_year, Some(1920));
    }

    #[test]
    fn test_skip_rows_and_semicolon_delimiter() {
        let content = "Registry closings export\n\
Date;Street;Nr;Price;m2;Const. Year;Latitude;Longitud\n\
2023-05-04 00:00:00;Alcala;10;1.250.000;100,5;1965;40,42;-3,70\n";
        let options = DatasetOptions {
            delimiter: b';',
            skip_rows: 1,
            decimal_separator: DecimalSeparator::Comma,
        };

        let dataset = Dataset::from_bytes(content.as_bytes(), &options).unwrap();

        assert_eq!(dataset.len(), 1);
        let record = &dataset.records()[0];
        assert_eq!(record.price, 1250000.0);
        assert_eq!(record.size_m2, 100.5);
        assert_eq!(record.location, GeoPoint::new(40.42, -3.70));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2023, 5, 4).unwrap());
    }

    #[test]
    fn test_missing_coordinate_columns_is_an_error() {
        let content = "Date,Street,Nr,Price,m2\n2023-05-04,Alcala,10,500000,100\n";
        let result = Dataset::from_bytes(content.as_bytes(), &DatasetOptions::default());
        assert!(matches!(result, Err(LookupError::DatasetError { .. })));
    }

    #[test]
    fn test_streets_are_distinct_and_sorted() {
        let dataset = Dataset::from_bytes(SAMPLE.as_bytes(), &DatasetOptions::default()).unwrap();
        assert_eq!(dataset.streets(), vec!["Alcala", "Gran Via"]);
        assert_eq!(dataset.streets_matching("gr"), vec!["Gran Via"]);
    }

    #[test]
    fn test_dot_decimal_numbers() {
        let format = NumberFormat::new(DecimalSeparator::Dot).unwrap();

        assert_eq!(format.parse("500,000"), Some(500000.0));
        assert_eq!(format.parse("1,234"), Some(1234.0));
        assert_eq!(format.parse("500.000"), Some(500.0));
        assert_eq!(format.parse("1,234.5"), Some(1234.5));
        assert_eq!(format.parse("-3.7000"), Some(-3.7));
        assert_eq!(format.parse("1.234,5"), None);
        assert_eq!(format.parse("1234,5"), None);
        assert_eq!(format.parse("1,23"), None);
        assert_eq!(format.parse("abc"), None);
    }

    #[test]
    fn test_comma_decimal_numbers() {
        let format = NumberFormat::new(DecimalSeparator::Comma).unwrap();

        assert_eq!(format.parse("500.000"), Some(500000.0));
        assert_eq!(format.parse("1.234,5"), Some(1234.5));
        assert_eq!(format.parse("500,000"), Some(500.0));
        assert_eq!(format.parse("-3,70"), Some(-3.7));
        assert_eq!(format.parse("1,234.5"), None);
        assert_eq!(format.parse("40.4200"), None);
        assert_eq!(format.parse("1.23"), None);
    }

    #[test]
    fn test_grouped_prices_load_at_full_value() {
        let content = "\
Date,Street,Nr,Price,m2,Const. Year,Latitude,Longitud
2023-05-04,Alcala,10,\"500,000\",100,1965,40.4200,-3.7000
2023-05-05,Alcala,12,\"1,234.5\",100,1965,40.4201,-3.7001
";

        let dataset = Dataset::from_bytes(content.as_bytes(), &DatasetOptions::default()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0].price, 500000.0);
        assert_eq!(dataset.records()[1].price, 1234.5);
    }

    #[test]
    fn test_numbers_outside_the_format_are_malformed() {
        let content = "\
Date,Street,Nr,Price,m2,Const. Year,Latitude,Longitud
2023-05-04,Alcala,10,\"1.234,5\",100,1965,40.4200,-3.7000
2023-05-05,Alcala,12,\"50,00\",100,1965,40.4201,-3.7001
2023-05-06,Alcala,14,300000,100,19x5,40.4202,-3.7002
2023-05-07,Alcala,16,300000,100,1965,40.42.01,-3.7001
2023-05-08,Alcala,18,300000,100,1965,40.4203,-3.7003
";

        let dataset = Dataset::from_bytes(content.as_bytes(), &DatasetOptions::default()).unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].number, "18");
        assert_eq!(dataset.stats().malformed, 4);
        assert_eq!(dataset.stats().missing_coordinates, 0);
    }
}
