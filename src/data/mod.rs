//! Spreadsheet layout and tabular IO.

pub mod schema;
pub mod tabular;

pub use schema::RecordSchema;
pub use tabular::TableFormat;
