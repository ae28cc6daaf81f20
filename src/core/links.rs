use crate::domain::model::GeoPoint;
use url::form_urlencoded;

const MAPS_BASE: &str = "https://www.google.com/maps";
const SEARCH_BASE: &str = "https://www.google.com/search";

/// Street-level imagery at a coordinate.
pub fn street_view_link(point: GeoPoint) -> String {
    format!("{}?q=&layer=c&cbll={},{}", MAPS_BASE, point.lat, point.lon)
}

/// Map search for a free-text address.
pub fn address_map_link(address: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("q", address.trim())
        .append_pair("layer", "c")
        .finish();
    format!("{}?{}", MAPS_BASE, query)
}

/// Web search for a street and number restricted to a listing site.
pub fn listing_search_link(listing_site: &str, street: &str, number: &str) -> String {
    let query = format!("site:{} {} {}", listing_site, street.trim(), number.trim());
    let encoded = form_urlencoded::Serializer::new(String::new())
        .append_pair("q", query.trim())
        .finish();
    format!("{}?{}", SEARCH_BASE, encoded)
}
