//! Candle data: ingestion, storage, validation and time synchronization

pub mod error;
pub mod ingest;
pub mod schema;
pub mod store;
pub mod synthetic;
pub mod timeline;

pub use error::DataError;
pub use ingest::{load_file, load_files};
pub use schema::CandleSchema;
pub use store::CandleStore;
pub use synthetic::{generate_pair, generate_triangle, SyntheticConfig};
pub use timeline::{synchronize, Timeline};
