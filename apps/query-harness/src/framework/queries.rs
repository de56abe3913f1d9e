//! The query catalog: files on disk, their metadata documents and the cost
//! header recorded at the top of each query.

pub mod cost;
pub mod discovery;
pub mod header;
pub mod metadata;

pub use discovery::{DiscoveryError, QueryRecord};
pub use header::HeaderStats;
