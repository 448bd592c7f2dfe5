//! Picking list domain models.
//!
//! A picking list is a warehouse document listing the items that have to be
//! collected for one supply. Parsing it yields one [`OrderRecord`] per task
//! row, each stamped with the batch-level [`ParsingMetadata`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout used for `parsed_at` (local time, microsecond precision).
pub const PARSED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Batch-level fields found in the picking list header columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply_id: Option<String>,
    /// Document date as `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Date cell exactly as it appeared in the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_original: Option<String>,
    /// Number of data rows in the table, regardless of how many parsed.
    pub total_quantity: usize,
}

/// One task row of a picking list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub brand: String,
    pub product_name: String,
    pub size: String,
    pub color: String,
    pub seller_article: String,
    pub sticker_code: String,
    pub sticker_number: String,
}

impl OrderRecord {
    /// Brand guess from the product name: the first two words when the name
    /// has more than two, otherwise empty.
    pub fn brand_from_product_name(product_name: &str) -> String {
        let words: Vec<&str> = product_name.split_whitespace().collect();
        if words.len() > 2 {
            words[..2].join(" ")
        } else {
            String::new()
        }
    }
}

/// Metadata shared by every order parsed from one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsingMetadata {
    pub source_file: String,
    pub parsed_at: String,
    pub parser_version: String,
    #[serde(flatten)]
    pub header: HeaderInfo,
}

impl ParsingMetadata {
    pub fn new(
        source_file: impl Into<String>,
        parsed_at: NaiveDateTime,
        parser_version: impl Into<String>,
        header: HeaderInfo,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            parsed_at: parsed_at.format(PARSED_AT_FORMAT).to_string(),
            parser_version: parser_version.into(),
            header,
        }
    }
}

/// Order record with the document metadata merged in.
///
/// Serializes flat: order fields and metadata fields share one JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedOrderRecord {
    #[serde(flatten)]
    pub order: OrderRecord,
    #[serde(flatten)]
    pub metadata: ParsingMetadata,
}

impl EnrichedOrderRecord {
    pub fn new(order: OrderRecord, metadata: ParsingMetadata) -> Self {
        Self { order, metadata }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsingStatistics {
    pub total_orders_found: usize,
    pub expected_quantity: usize,
    pub parsing_success: bool,
}

impl ParsingStatistics {
    pub fn new(total_orders_found: usize, expected_quantity: usize) -> Self {
        Self {
            total_orders_found,
            expected_quantity,
            parsing_success: total_orders_found > 0,
        }
    }

    /// Whether every row of the table produced an order.
    pub fn quantity_match(&self) -> bool {
        self.total_orders_found == self.expected_quantity
    }
}

/// Result envelope returned for one parsed picking list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickingListParseResult {
    pub orders: Vec<EnrichedOrderRecord>,
    pub statistics: ParsingStatistics,
}

impl PickingListParseResult {
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_metadata() -> ParsingMetadata {
        let parsed_at = NaiveDate::from_ymd_opt(2025, 8, 29)
            .unwrap()
            .and_hms_micro_opt(20, 56, 59, 996074)
            .unwrap();
        ParsingMetadata::new(
            "picking_list.xlsx",
            parsed_at,
            "1.0.0",
            HeaderInfo {
                supply_id: Some("WB-GI-176731503".to_string()),
                date: Some("2025-08-26".to_string()),
                date_original: Some("26.08.2025".to_string()),
                total_quantity: 82,
            },
        )
    }

    #[test]
    fn test_brand_heuristic() {
        assert_eq!(OrderRecord::brand_from_product_name("Nike Air Max 90"), "Nike Air");
        assert_eq!(OrderRecord::brand_from_product_name("Shirt"), "");
        assert_eq!(OrderRecord::brand_from_product_name("Two words"), "");
        assert_eq!(OrderRecord::brand_from_product_name("  Puma   Suede  Classic "), "Puma Suede");
    }

    #[test]
    fn test_parsed_at_format() {
        let metadata = sample_metadata();
        assert_eq!(metadata.parsed_at, "2025-08-29T20:56:59.996074");
    }

    #[test]
    fn test_enriched_record_serializes_flat() {
        let order = OrderRecord {
            order_id: "3767432495".to_string(),
            product_name: "Массажный коврик игольчатый".to_string(),
            sticker_code: "4082875".to_string(),
            sticker_number: "0025".to_string(),
            ..Default::default()
        };
        let record = EnrichedOrderRecord::new(order, sample_metadata());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["order_id"], "3767432495");
        assert_eq!(json["source_file"], "picking_list.xlsx");
        assert_eq!(json["supply_id"], "WB-GI-176731503");
        assert_eq!(json["date"], "2025-08-26");
        assert_eq!(json["total_quantity"], 82);
        assert!(json.get("order").is_none());
        assert!(json.get("header").is_none());
    }

    #[test]
    fn test_absent_header_fields_are_omitted() {
        let mut metadata = sample_metadata();
        metadata.header = HeaderInfo {
            total_quantity: 3,
            ..Default::default()
        };
        let json = serde_json::to_value(&metadata).unwrap();

        assert!(json.get("supply_id").is_none());
        assert!(json.get("date").is_none());
        assert!(json.get("date_original").is_none());
        assert_eq!(json["total_quantity"], 3);
    }

    #[test]
    fn test_statistics() {
        let empty = ParsingStatistics::new(0, 0);
        assert!(!empty.parsing_success);
        assert!(empty.quantity_match());

        let partial = ParsingStatistics::new(2, 3);
        assert!(partial.parsing_success);
        assert!(!partial.quantity_match());
    }
}
