//! Result sinks: the CSV file that every run writes and the optional
//! Google Sheet.

mod csv_file;
mod google;
mod sheet;

pub use csv_file::{file_name, CsvSink, WrittenFile};
pub use google::{GoogleSheetsClient, ServiceAccountKey};
pub use sheet::{SheetClient, SheetMode, SheetOutcome, SheetSink};
