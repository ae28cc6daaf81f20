// Domain layer: record types and the ports the search engine talks through.

pub mod model;
pub mod ports;
