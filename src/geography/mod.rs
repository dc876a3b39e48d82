//! Static geographic reference data
//!
//! Country bounding boxes, land-border adjacency and the address prefix
//! lists used by the heuristics. All of it is plain data bundled in
//! [`GeoTables`], compiled-in by default and overridable from a file.

pub mod boundaries;
pub mod neighbors;
pub mod tables;

pub use boundaries::CountryBoundary;
pub use neighbors::NeighborTable;
pub use tables::{FakeCoordinate, GeoTables};
