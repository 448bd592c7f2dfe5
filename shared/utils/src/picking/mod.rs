//! Picking List Processing Module
//!
//! Converts warehouse picking list spreadsheets into structured orders.
//! Supports Excel (XLSX/XLS) and CSV exports.

pub mod clock;
pub mod columns;
pub mod extractor;
pub mod loader;
pub mod table;

pub use clock::{Clock, FixedClock, SystemClock};
pub use columns::{ColumnMap, ColumnSlot, LogicalField};
pub use extractor::{PickingListExtractor, RowError, PARSER_VERSION};
pub use loader::{TableFormat, TableLoader};
pub use table::{CellValue, FieldValue, Row, TableInput};
