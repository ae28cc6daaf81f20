use crate::domain::model::{FilterOutcome, GeoPoint, PropertyRecord, ResultRow, SizeRange};
use geo::{Distance, Geodesic, Point};

/// Ellipsoidal (WGS84) distance in meters.
pub fn geodesic_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let from = Point::new(a.lon, a.lat);
    let to = Point::new(b.lon, b.lat);
    Geodesic.distance(from, to)
}

pub fn rounded_distance(a: GeoPoint, b: GeoPoint) -> u32 {
    geodesic_distance(a, b).round() as u32
}

/// `None` when size is not positive.
pub fn price_per_m2(price: f64, size_m2: f64) -> Option<i64> {
    if size_m2 <= 0.0 {
        return None;
    }
    Some((price / size_m2).round() as i64)
}

/// Records within `radius_m` of `reference`, most expensive first.
pub fn within_radius(
    records: &[PropertyRecord],
    reference: GeoPoint,
    radius_m: u32,
    sizes: SizeRange,
    limit: usize,
) -> FilterOutcome {
    let candidates = records.iter().filter_map(|record| {
        let distance_m = rounded_distance(reference, record.location);
        (distance_m <= radius_m && sizes.contains(record.size_m2)).then_some((record, distance_m))
    });
    rank(candidates, limit)
}

/// Records whose street contains `street` (any case), most expensive first.
/// `reference` only annotates the distance column.
pub fn on_street(
    records: &[PropertyRecord],
    reference: GeoPoint,
    street: &str,
    sizes: SizeRange,
    limit: usize,
) -> FilterOutcome {
    let needle = street.trim().to_lowercase();
    let candidates = records
        .iter()
        .filter(|record| record.street.to_lowercase().contains(&needle))
        .filter(|record| sizes.contains(record.size_m2))
        .map(|record| (record, rounded_distance(reference, record.location)));
    rank(candidates, limit)
}

fn rank<'a>(
    candidates: impl Iterator<Item = (&'a PropertyRecord, u32)>,
    limit: usize,
) -> FilterOutcome {
    let mut zero_size_excluded = 0;
    let mut kept: Vec<(&PropertyRecord, u32, i64)> = Vec::new();

    for (record, distance_m) in candidates {
        match price_per_m2(record.price, record.size_m2) {
            Some(ppm) => kept.push((record, distance_m, ppm)),
            None => zero_size_excluded += 1,
        }
    }

    if zero_size_excluded > 0 {
        tracing::warn!(
            "⚠️ Excluded {} matching closings with zero size",
            zero_size_excluded
        );
    }

    // sort_by is stable: equal prices keep dataset order.
    kept.sort_by(|a, b| b.0.price.total_cmp(&a.0.price));
    kept.truncate(limit);

    let rows = kept
        .into_iter()
        .map(|(record, distance_m, price_per_m2)| ResultRow {
            date: record.date,
            street: record.street.clone(),
            number: record.number.clone(),
            price: record.price.round() as i64,
            size_m2: record.size_m2.round() as i64,
            construction_year: record.construction_year,
            distance_m,
            price_per_m2,
            location: record.location,
        })
        .collect();

    FilterOutcome {
        rows,
        zero_size_excluded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(street: &str, number: &str, price: f64, size: f64, lat: f64, lon: f64) -> PropertyRecord {
        PropertyRecord {
            date: NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
            street: street.to_string(),
            number: number.to_string(),
            price,
            size_m2: size,
            construction_year: Some(1970),
            location: GeoPoint::new(lat, lon),
        }
    }

    fn madrid_sample() -> Vec<PropertyRecord> {
        vec![
            record("Alcala", "10", 500000.0, 100.0, 40.4200, -3.7000),
            record("Calle de Alcala", "12", 650000.0, 140.0, 40.4205, -3.7002),
            record("Gran Via", "1", 300000.0, 100.0, 40.4201, -3.7001),
            record("Gran Via", "3", 650000.0, 90.0, 40.4202, -3.7003),
            record("Serrano", "40", 2000000.0, 300.0, 40.4300, -3.6870),
            record("Alcala", "200", 400000.0, 0.0, 40.4200, -3.7000),
        ]
    }

    #[test]
    fn test_distance_is_non_negative_and_symmetric() {
        let a = GeoPoint::new(40.4200, -3.7000);
        let b = GeoPoint::new(40.4300, -3.6870);
        let ab = geodesic_distance(a, b);
        let ba = geodesic_distance(b, a);

        assert!(ab > 0.0);
        assert!((ab - ba).abs() < 1e-6);
        assert!(geodesic_distance(a, a).abs() < 1e-9);
    }

    #[test]
    fn test_distance_matches_known_value() {
        // One hundredth of a degree of latitude near Madrid is ~1110 m.
        let a = GeoPoint::new(40.41, -3.70);
        let b = GeoPoint::new(40.42, -3.70);
        let d = geodesic_distance(a, b);
        assert!((1105.0..1115.0).contains(&d), "got {}", d);
    }

    #[test]
    fn test_price_per_m2() {
        assert_eq!(price_per_m2(300000.0, 100.0), Some(3000));
        assert_eq!(price_per_m2(100000.0, 30.0), Some(3333));
        assert_eq!(price_per_m2(100000.0, 0.0), None);
    }

    #[test]
    fn test_within_radius_respects_radius_size_and_order() {
        let records = madrid_sample();
        let reference = GeoPoint::new(40.4200, -3.7000);

        let outcome = within_radius(&records, reference, 100, SizeRange::new(50.0, 150.0), 10);

        assert!(!outcome.rows.is_empty());
        for row in &outcome.rows {
            assert!(row.distance_m <= 100);
            assert!((50..=150).contains(&row.size_m2));
        }
        for pair in outcome.rows.windows(2) {
            assert!(pair[0].price >= pair[1].price);
        }
        assert!(outcome.rows.iter().all(|r| r.street != "Serrano"));
        assert_eq!(outcome.zero_size_excluded, 0);
    }

    #[test]
    fn test_size_bounds_are_inclusive() {
        let records = vec![
            record("Alcala", "1", 400000.0, 50.0, 40.4200, -3.7000),
            record("Alcala", "2", 300000.0, 150.0, 40.4200, -3.7000),
            record("Alcala", "3", 200000.0, 49.0, 40.4200, -3.7000),
            record("Alcala", "4", 100000.0, 151.0, 40.4200, -3.7000),
        ];
        let reference = GeoPoint::new(40.4200, -3.7000);
        let sizes = SizeRange::new(50.0, 150.0);

        let near = within_radius(&records, reference, 100, sizes, 10);
        let named = on_street(&records, reference, "alcala", sizes, 10);

        for outcome in [near, named] {
            let numbers: Vec<&str> = outcome.rows.iter().map(|r| r.number.as_str()).collect();
            assert_eq!(numbers, vec!["1", "2"]);
        }
    }

    #[test]
    fn test_radius_equal_to_distance_is_kept() {
        let records = vec![record("Gran Via", "3", 650000.0, 90.0, 40.4202, -3.7003)];
        let reference = GeoPoint::new(40.4200, -3.7000);
        let distance_m = rounded_distance(reference, records[0].location);
        let sizes = SizeRange::new(50.0, 150.0);
        assert!(distance_m > 0);

        let at_edge = within_radius(&records, reference, distance_m, sizes, 10);
        assert_eq!(at_edge.rows.len(), 1);
        assert_eq!(at_edge.rows[0].distance_m, distance_m);

        let inside_edge = within_radius(&records, reference, distance_m - 1, sizes, 10);
        assert!(inside_edge.rows.is_empty());
    }

    #[test]
    fn test_equal_prices_keep_dataset_order() {
        let records = madrid_sample();
        let reference = GeoPoint::new(40.4200, -3.7000);

        let outcome = within_radius(&records, reference, 100, SizeRange::new(50.0, 150.0), 10);
        let numbers: Vec<&str> = outcome.rows.iter().map(|r| r.number.as_str()).collect();

        assert_eq!(numbers, vec!["12", "3", "10", "1"]);
    }

    #[test]
    fn test_limit_truncates() {
        let records = madrid_sample();
        let reference = GeoPoint::new(40.4200, -3.7000);

        let outcome = within_radius(&records, reference, 5000, SizeRange::new(0.0, 1000.0), 2);

        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].street, "Serrano");
    }

    #[test]
    fn test_zero_size_records_are_excluded_and_counted() {
        let records = madrid_sample();
        let reference = GeoPoint::new(40.4200, -3.7000);

        let outcome = within_radius(&records, reference, 5000, SizeRange::new(0.0, 1000.0), 50);

        assert_eq!(outcome.zero_size_excluded, 1);
        assert!(outcome.rows.iter().all(|r| r.size_m2 > 0));
        assert_eq!(outcome.rows.len(), 5);
    }

    #[test]
    fn test_single_record_end_to_end() {
        let records = vec![record("Alcala", "10", 500000.0, 100.0, 40.4200, -3.7000)];
        let reference = GeoPoint::new(40.4200, -3.7000);

        let outcome = within_radius(&records, reference, 50, SizeRange::new(50.0, 150.0), 10);

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].distance_m, 0);
        assert_eq!(outcome.rows[0].price_per_m2, 5000);
        assert_eq!(outcome.rows[0].price, 500000);
    }

    #[test]
    fn test_on_street_is_case_insensitive_substring() {
        let records = madrid_sample();
        let reference = GeoPoint::new(40.4300, -3.6870);

        let outcome = on_street(&records, reference, "gran via", SizeRange::new(50.0, 150.0), 10);

        assert_eq!(outcome.rows.len(), 2);
        assert!(outcome.rows.iter().all(|r| r.street == "Gran Via"));
        assert_eq!(outcome.rows[0].price, 650000);
        // Far from the reference but still matched by name.
        assert!(outcome.rows[0].distance_m > 1000);
    }

    #[test]
    fn test_on_street_substring_matches_longer_names() {
        let records = madrid_sample();
        let reference = GeoPoint::new(40.4200, -3.7000);

        let outcome = on_street(&records, reference, "ALCALA", SizeRange::new(50.0, 400.0), 10);

        let numbers: Vec<&str> = outcome.rows.iter().map(|r| r.number.as_str()).collect();
        assert_eq!(numbers, vec!["12", "10"]);
    }

    #[test]
    fn test_on_street_without_match_is_empty() {
        let records = madrid_sample();
        let reference = GeoPoint::new(40.4200, -3.7000);

        let outcome = on_street(&records, reference, "Castellana", SizeRange::new(0.0, 1000.0), 10);

        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.zero_size_excluded, 0);
    }
}
