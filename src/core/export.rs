use crate::core::links::{listing_search_link, street_view_link};
use crate::domain::model::{GeoPoint, ResultRow, SearchReport};
use crate::utils::error::{LookupError, Result};
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// Column headers shared by the terminal table and the spreadsheet export.
pub const COLUMNS: [&str; 10] = [
    "Date (yyyy-mm-dd)",
    "Street",
    "Nr",
    "Price",
    "m2",
    "Const. Year",
    "distance",
    "Price/m2",
    "Street View",
    "Listing",
];

pub const RADIUS_FILE: &str = "radius_results.csv";
pub const STREET_FILE: &str = "street_results.csv";
pub const SUMMARY_FILE: &str = "search.json";

pub fn table_cells(row: &ResultRow, listing_site: &str) -> [String; 10] {
    [
        row.date.format("%Y-%m-%d").to_string(),
        row.street.clone(),
        row.number.clone(),
        row.price.to_string(),
        row.size_m2.to_string(),
        row.construction_year
            .map(|y| y.to_string())
            .unwrap_or_default(),
        row.distance_m.to_string(),
        row.price_per_m2.to_string(),
        street_view_link(row.location),
        listing_search_link(listing_site, &row.street, &row.number),
    ]
}

/// One result set as CSV bytes, header row included even when empty.
pub fn to_csv(rows: &[ResultRow], listing_site: &str) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for row in rows {
        writer.write_record(table_cells(row, listing_site))?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| LookupError::IoError(e.into_error()))
}

#[derive(Serialize)]
struct Summary<'a> {
    address: &'a str,
    reference: GeoPoint,
    street_view_link: &'a str,
    radius_m: u32,
    min_size: u32,
    max_size: u32,
    limit: usize,
    radius_matches: usize,
    street_matches: usize,
    zero_size_excluded: usize,
}

/// ZIP archive holding both result sets and a JSON summary of the search.
pub fn export_bundle(report: &SearchReport, listing_site: &str) -> Result<Vec<u8>> {
    let summary = Summary {
        address: &report.address,
        reference: report.reference,
        street_view_link: &report.street_view_link,
        radius_m: report.query.radius_m,
        min_size: report.query.min_size,
        max_size: report.query.max_size,
        limit: report.query.limit,
        radius_matches: report.radius_results.rows.len(),
        street_matches: report.street_results.rows.len(),
        zero_size_excluded: report.radius_results.zero_size_excluded
            + report.street_results.zero_size_excluded,
    };

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>(RADIUS_FILE, FileOptions::default())?;
    zip.write_all(&to_csv(&report.radius_results.rows, listing_site)?)?;

    zip.start_file::<_, ()>(STREET_FILE, FileOptions::default())?;
    zip.write_all(&to_csv(&report.street_results.rows, listing_site)?)?;

    zip.start_file::<_, ()>(SUMMARY_FILE, FileOptions::default())?;
    zip.write_all(serde_json::to_string_pretty(&summary)?.as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Plain-text table for the terminal.
pub fn render_table(rows: &[ResultRow], listing_site: &str) -> String {
    // Links are long; the terminal table stops before them.
    const SHOWN: usize = 8;

    let cells: Vec<[String; 10]> = rows.iter().map(|r| table_cells(r, listing_site)).collect();
    let mut widths: Vec<usize> = COLUMNS[..SHOWN].iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row[..SHOWN].iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(COLUMNS[..SHOWN].to_vec())];
    out.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    for row in &cells {
        out.push(line(row[..SHOWN].iter().map(|s| s.as_str()).collect()));
    }
    if cells.is_empty() {
        out.push("(no matching closings)".to_string());
    }
    out.join("\n")
}
