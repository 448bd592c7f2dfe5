//! # Picking Domain Models
//!
//! Serializable data model for warehouse picking lists.
//!
//! ## Key Models
//!
//! - **HeaderInfo**: batch-level fields (supply id, document date, row count)
//! - **OrderRecord**: one normalized task row
//! - **EnrichedOrderRecord**: an order with the document metadata merged in
//! - **PickingListParseResult**: the orders plus parsing statistics
//!
//! Everything here is transient. Records are built per parse call and handed
//! to whatever layer persists or forwards them.

pub mod picking;


pub use picking::*;
