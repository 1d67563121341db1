//! Product records and the data sources they are read from.

mod json_file;
mod source;
mod types;

pub use json_file::JsonFileProductSource;
pub use source::{ProductSource, ProductSourceError};
pub use types::ProductRecord;
