pub mod actor;
pub mod capture;
pub mod classifier;
pub mod config;
pub mod correlator;
pub mod error;
pub mod export;
pub mod formatter;
pub mod ingest;
pub mod network;
pub mod session;
pub mod timeline;

pub use trailcap_common::Timestamp;
pub use trailcap_common::protocol;
pub use trailcap_common::timeline as entries;
