//! Picking list extractor
//!
//! Turns a decoded picking list table into enriched order records. Only an
//! unreadable document is fatal; a bad row is logged and skipped, and an
//! unparseable header field is logged and left out.

use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use picking_models::{
    EnrichedOrderRecord, HeaderInfo, OrderRecord, ParsingMetadata, ParsingStatistics,
    PickingListParseResult,
};

use super::clock::{Clock, SystemClock};
use super::columns::{ColumnMap, LogicalField};
use super::loader::{TableFormat, TableLoader};
use super::table::{FieldValue, Row, TableInput};
use crate::config::ParserConfig;
use crate::error::ParseError;

pub const PARSER_VERSION: &str = "1.0.0";

/// Why a row produced no order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("row {row}: table has no task number column")]
    OrderIdColumnAbsent { row: usize },

    #[error("row {row}: task number is empty")]
    EmptyOrderId { row: usize },
}

/// Picking list extractor
#[derive(Clone)]
pub struct PickingListExtractor {
    loader: TableLoader,
    clock: Arc<dyn Clock>,
    parser_version: String,
}

impl Default for PickingListExtractor {
    fn default() -> Self {
        Self {
            loader: TableLoader::new(),
            clock: Arc::new(SystemClock),
            parser_version: PARSER_VERSION.to_string(),
        }
    }
}

impl PickingListExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ParserConfig) -> Self {
        Self {
            loader: TableLoader::from_config(config),
            parser_version: config.parser_version.clone(),
            ..Self::default()
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_parser_version(mut self, parser_version: impl Into<String>) -> Self {
        self.parser_version = parser_version.into();
        self
    }

    pub fn with_loader(mut self, loader: TableLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Load a document from memory and parse it, labelling orders with `filename`.
    pub fn parse_bytes(
        &self,
        filename: &str,
        data: &[u8],
        format: Option<TableFormat>,
    ) -> Result<PickingListParseResult, ParseError> {
        info!(source_file = filename, "Starting picking list parse from bytes");
        let table = self.loader.load_bytes(filename, data, format).map_err(|e| {
            error!(source_file = filename, error = %e, "Failed to load picking list");
            e
        })?;
        Ok(self.parse(&table, filename))
    }

    /// Load a document from disk and parse it, labelling orders with the file name.
    pub fn parse_path(&self, path: &Path) -> Result<PickingListParseResult, ParseError> {
        info!(path = %path.display(), "Starting picking list parse from file");
        let table = self.loader.load_path(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to load picking list");
            e
        })?;
        let source_file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(self.parse(&table, &source_file))
    }

    /// Parse an already decoded table. Never fails: bad input yields fewer orders.
    pub fn parse(&self, table: &TableInput, source_label: &str) -> PickingListParseResult {
        let columns = ColumnMap::resolve(table.headers());
        let missing = columns.missing();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|field| field.column_name()).collect();
            debug!(source_file = source_label, missing = ?names, "Picking list columns not found");
        }

        let header = self.extract_header(table, &columns);
        let orders = self.extract_orders(table, &columns);
        let result = self.to_result(orders, header, source_label);

        info!(
            source_file = source_label,
            orders_found = result.statistics.total_orders_found,
            expected_quantity = result.statistics.expected_quantity,
            "Picking list parsed"
        );
        result
    }

    /// Batch-level fields: supply id, document date and row count.
    pub fn extract_header(&self, table: &TableInput, columns: &ColumnMap) -> HeaderInfo {
        let supply_id = table
            .column_values(columns.slot(LogicalField::SupplyId))
            .next()
            .map(ToString::to_string);

        let mut header = HeaderInfo {
            supply_id,
            total_quantity: table.len(),
            ..Default::default()
        };

        if let Some(raw) = table
            .column_values(columns.slot(LogicalField::CreationDate))
            .next()
        {
            let original = raw.to_string();
            match normalize_date(&original) {
                Ok(date) => {
                    header.date = Some(date);
                    header.date_original = Some(original);
                }
                Err(e) => {
                    warn!(value = %original, error = %e, "Could not parse picking list date");
                }
            }
        }

        header
    }

    /// Every row with a task number, in table order.
    pub fn extract_orders(&self, table: &TableInput, columns: &ColumnMap) -> Vec<OrderRecord> {
        table
            .rows()
            .filter_map(|row| match self.extract_row(&row, columns) {
                Ok(order) => Some(order),
                Err(e) => {
                    warn!(row = row.line_number(), error = %e, "Skipping picking list row");
                    None
                }
            })
            .collect()
    }

    pub fn extract_row(&self, row: &Row<'_>, columns: &ColumnMap) -> Result<OrderRecord, RowError> {
        let line = row.line_number();
        let order_id = match row.field(columns.slot(LogicalField::TaskNumber)) {
            FieldValue::Absent => return Err(RowError::OrderIdColumnAbsent { row: line }),
            FieldValue::Empty => return Err(RowError::EmptyOrderId { row: line }),
            FieldValue::Value(value) => value.to_string(),
        };
        if order_id.trim().is_empty() {
            return Err(RowError::EmptyOrderId { row: line });
        }

        let text = |field: LogicalField| row.field(columns.slot(field)).to_text();
        let product_name = text(LogicalField::Name);
        let (sticker_code, sticker_number) = split_sticker(text(LogicalField::Sticker));

        Ok(OrderRecord {
            order_id,
            brand: OrderRecord::brand_from_product_name(&product_name),
            product_name,
            size: text(LogicalField::Size),
            color: text(LogicalField::Color),
            seller_article: text(LogicalField::SellerArticle),
            sticker_code,
            sticker_number,
        })
    }

    /// Stamp every order with the shared metadata and compute statistics.
    pub fn to_result(
        &self,
        orders: Vec<OrderRecord>,
        header: HeaderInfo,
        source_label: &str,
    ) -> PickingListParseResult {
        let statistics = ParsingStatistics::new(orders.len(), header.total_quantity);
        let metadata = ParsingMetadata::new(
            source_label,
            self.clock.now(),
            self.parser_version.clone(),
            header,
        );

        let orders = orders
            .into_iter()
            .map(|order| EnrichedOrderRecord::new(order, metadata.clone()))
            .collect();

        PickingListParseResult { orders, statistics }
    }
}

/// `dd.mm.YYYY[ anything]` to `YYYY-MM-DD`.
fn normalize_date(raw: &str) -> Result<String, chrono::ParseError> {
    let date_part = raw.split_whitespace().next().unwrap_or_default();
    let date = NaiveDate::parse_from_str(date_part, "%d.%m.%Y")?;
    Ok(date.format("%Y-%m-%d").to_string())
}

const STICKER_CODE_DIGITS: usize = 7;
const STICKER_NUMBER_DIGITS: usize = 4;

/// Stickers print as a 7-digit code and a 4-digit number (e.g. `4082875 0025`);
/// anything else is all code.
fn split_sticker(raw: String) -> (String, String) {
    let mut parts = raw.split_whitespace();
    if let (Some(code), Some(number), None) = (parts.next(), parts.next(), parts.next()) {
        if is_digits(code, STICKER_CODE_DIGITS) && is_digits(number, STICKER_NUMBER_DIGITS) {
            return (code.to_string(), number.to_string());
        }
    }
    (raw, String::new())
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picking::clock::FixedClock;
    use crate::picking::table::CellValue;
    use proptest::prelude::*;

    fn fixed_clock() -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_micro_opt(12, 30, 0, 123456)
                .unwrap(),
        )
    }

    fn extractor() -> PickingListExtractor {
        PickingListExtractor::new().with_clock(fixed_clock())
    }

    fn row(cells: &[(&str, &str)]) -> Vec<(String, CellValue)> {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::from(*v)))
            .collect()
    }

    fn sample_table() -> TableInput {
        TableInput::from_records(vec![
            row(&[
                ("№ задания", "3767432495"),
                ("Наименование", "Nike Air Max 90"),
                ("Размер", "42"),
                ("Цвет", "белый"),
                ("Артикул продавца", "wild105d"),
                ("Стикер", "4082875 0025"),
                ("QR-код поставки", "WB-GI-176731503"),
                ("Дата создания", "05.03.2024 10:00"),
            ]),
            row(&[
                ("№ задания", ""),
                ("Наименование", "Shirt"),
                ("QR-код поставки", "WB-GI-176731503"),
            ]),
            row(&[
                ("№ задания", "3767432497"),
                ("Наименование", "Shirt"),
                ("Стикер", "4082877"),
            ]),
        ])
    }

    #[test]
    fn test_three_rows_one_missing_task_number() {
        let result = extractor().parse(&sample_table(), "list.xlsx");

        assert_eq!(result.statistics.total_orders_found, 2);
        assert_eq!(result.statistics.expected_quantity, 3);
        assert!(result.statistics.parsing_success);
        assert!(!result.statistics.quantity_match());
        assert_eq!(result.orders[0].metadata.header.total_quantity, 3);
        assert_eq!(result.orders[0].order.order_id, "3767432495");
        assert_eq!(result.orders[1].order.order_id, "3767432497");
    }

    #[test]
    fn test_empty_table() {
        let table = TableInput::new(vec!["№ задания".to_string()]);
        let result = extractor().parse(&table, "empty.xlsx");

        assert!(result.orders.is_empty());
        assert_eq!(result.statistics.total_orders_found, 0);
        assert_eq!(result.statistics.expected_quantity, 0);
        assert!(!result.statistics.parsing_success);
    }

    #[test]
    fn test_date_normalization() {
        let table = sample_table();
        let columns = ColumnMap::resolve(table.headers());
        let header = extractor().extract_header(&table, &columns);

        assert_eq!(header.date.as_deref(), Some("2024-03-05"));
        assert_eq!(header.date_original.as_deref(), Some("05.03.2024 10:00"));
        assert_eq!(header.supply_id.as_deref(), Some("WB-GI-176731503"));
        assert_eq!(header.total_quantity, 3);
    }

    #[test]
    fn test_bad_date_is_omitted() {
        for raw in ["2024-03-05", "32.01.2024", "yesterday"] {
            let table = TableInput::from_records(vec![row(&[
                ("№ задания", "1"),
                ("Дата создания", raw),
            ])]);
            let result = extractor().parse(&table, "list.xlsx");

            assert_eq!(result.statistics.total_orders_found, 1);
            let metadata = &result.orders[0].metadata;
            assert!(metadata.header.date.is_none(), "{raw} should not parse");
            assert!(metadata.header.date_original.is_none());
        }
    }

    #[test]
    fn test_date_uses_first_non_empty_value() {
        let table = TableInput::from_records(vec![
            row(&[("№ задания", "1"), ("Дата создания", "")]),
            row(&[("№ задания", "2"), ("Дата создания", "26.08.2025")]),
        ]);
        let columns = ColumnMap::resolve(table.headers());
        let header = extractor().extract_header(&table, &columns);

        assert_eq!(header.date.as_deref(), Some("2025-08-26"));
        assert_eq!(header.date_original.as_deref(), Some("26.08.2025"));
    }

    #[test]
    fn test_brand_heuristic() {
        let result = extractor().parse(&sample_table(), "list.xlsx");

        assert_eq!(result.orders[0].order.brand, "Nike Air");
        assert_eq!(result.orders[1].order.brand, "");
    }

    #[test]
    fn test_sticker_split() {
        let result = extractor().parse(&sample_table(), "list.xlsx");

        assert_eq!(result.orders[0].order.sticker_code, "4082875");
        assert_eq!(result.orders[0].order.sticker_number, "0025");
        assert_eq!(result.orders[1].order.sticker_code, "4082877");
        assert_eq!(result.orders[1].order.sticker_number, "");

        assert_eq!(split_sticker("A1 0025".to_string()), ("A1 0025".to_string(), String::new()));
        assert_eq!(split_sticker("1 2 3".to_string()), ("1 2 3".to_string(), String::new()));
        assert_eq!(split_sticker("12 34".to_string()), ("12 34".to_string(), String::new()));
        assert_eq!(
            split_sticker("40828751 0025".to_string()),
            ("40828751 0025".to_string(), String::new())
        );
    }

    #[test]
    fn test_missing_columns_default_to_empty() {
        let result = extractor().parse(&sample_table(), "list.xlsx");
        let order = &result.orders[1].order;

        assert_eq!(order.size, "");
        assert_eq!(order.color, "");
        assert_eq!(order.seller_article, "");
    }

    #[test]
    fn test_null_markers_become_empty() {
        let table = TableInput::from_rows(
            ["№ задания", "Цвет", "Размер"],
            vec![vec![
                Some(CellValue::Float(3767432495.0)),
                Some("nan".into()),
                Some(CellValue::Float(f64::NAN)),
            ]],
        );
        let result = extractor().parse(&table, "list.xlsx");
        let order = &result.orders[0].order;

        assert_eq!(order.order_id, "3767432495");
        assert_eq!(order.color, "");
        assert_eq!(order.size, "");
    }

    #[test]
    fn test_row_errors() {
        let without_column = TableInput::from_records(vec![row(&[("Наименование", "Shirt")])]);
        let columns = ColumnMap::resolve(without_column.headers());
        let first = without_column.rows().next().unwrap();
        assert_eq!(
            extractor().extract_row(&first, &columns),
            Err(RowError::OrderIdColumnAbsent { row: 2 })
        );

        let blank = TableInput::from_records(vec![row(&[("№ задания", "   ")])]);
        let columns = ColumnMap::resolve(blank.headers());
        let first = blank.rows().next().unwrap();
        assert_eq!(
            extractor().extract_row(&first, &columns),
            Err(RowError::EmptyOrderId { row: 2 })
        );
    }

    #[test]
    fn test_metadata_is_stamped_on_every_order() {
        let result = extractor()
            .with_parser_version("2.1.0")
            .parse(&sample_table(), "list.xlsx");

        for record in &result.orders {
            assert_eq!(record.metadata.source_file, "list.xlsx");
            assert_eq!(record.metadata.parser_version, "2.1.0");
            assert_eq!(record.metadata.parsed_at, "2024-03-05T12:30:00.123456");
            assert_eq!(record.metadata.header.supply_id.as_deref(), Some("WB-GI-176731503"));
        }
    }

    #[test]
    fn test_parse_is_idempotent_with_fixed_clock() {
        let extractor = extractor();
        let table = sample_table();

        let first = extractor.parse(&table, "list.xlsx");
        let second = extractor.parse(&table, "list.xlsx");

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_parse_bytes_csv() {
        let csv = "№ задания,Наименование,Стикер,Дата создания\n\
            3767432495,Массажный коврик игольчатый,4082875 0025,26.08.2025 10:15\n\
            ,Шапка,,\n";
        let result = extractor().parse_bytes("list.csv", csv.as_bytes(), None).unwrap();

        assert_eq!(result.statistics.total_orders_found, 1);
        assert_eq!(result.statistics.expected_quantity, 2);
        let record = &result.orders[0];
        assert_eq!(record.order.brand, "Массажный коврик");
        assert_eq!(record.metadata.source_file, "list.csv");
        assert_eq!(record.metadata.header.date.as_deref(), Some("2025-08-26"));
    }

    #[test]
    fn test_parse_bytes_rejects_corrupt_workbook() {
        let result = extractor().parse_bytes("list.xlsx", b"not a workbook", None);
        assert!(matches!(result, Err(ParseError::Load { .. })));
    }

    #[test]
    fn test_parse_path_workbook() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/picking_list.xlsx");
        let result = extractor().parse_path(&path).unwrap();

        assert_eq!(result.statistics.total_orders_found, 2);
        assert_eq!(result.statistics.expected_quantity, 3);
        assert!(result.statistics.parsing_success);
        assert!(!result.statistics.quantity_match());

        let record = &result.orders[0];
        assert_eq!(record.order.order_id, "3767432495");
        assert_eq!(record.order.brand, "Массажный коврик");
        assert_eq!(record.order.size, "0");
        assert_eq!(record.order.sticker_code, "4082875");
        assert_eq!(record.order.sticker_number, "0025");
        assert_eq!(record.metadata.source_file, "picking_list.xlsx");
        assert_eq!(record.metadata.header.supply_id.as_deref(), Some("WB-GI-176731503"));
        assert_eq!(record.metadata.header.date.as_deref(), Some("2024-03-05"));
        assert_eq!(
            record.metadata.header.date_original.as_deref(),
            Some("05.03.2024 10:00:00")
        );
        assert_eq!(result.orders[1].order.order_id, "3767432496");
        assert_eq!(result.orders[1].order.size, "");
    }

    #[test]
    fn test_parse_path_with_loader_sheet() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/picking_list.xlsx");
        let result = extractor()
            .with_loader(TableLoader::new().with_sheet_name("Notes"))
            .parse_path(&path)
            .unwrap();

        // Readable sheet without a task number column: no orders, not an error.
        assert!(result.is_empty());
        assert_eq!(result.statistics.expected_quantity, 1);
        assert!(!result.statistics.parsing_success);
    }

    #[test]
    fn test_from_config() {
        let config = ParserConfig {
            parser_version: "3.0.0".to_string(),
            ..Default::default()
        };
        let result = PickingListExtractor::from_config(&config)
            .with_clock(fixed_clock())
            .parse(&sample_table(), "list.xlsx");

        assert_eq!(result.orders[0].metadata.parser_version, "3.0.0");
    }

    prop_compose! {
        fn arb_row()(
            order_id in prop_oneof![
                Just(String::new()),
                Just("   ".to_string()),
                Just("nan".to_string()),
                "[0-9]{6,10}",
            ],
            name in "[A-Za-z]{1,8}( [A-Za-z]{1,8}){0,4}",
        ) -> (String, String) {
            (order_id, name)
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_statistics_match_orders(rows in prop::collection::vec(arb_row(), 0..20)) {
            let expected_found = rows
                .iter()
                .filter(|(id, _)| !id.trim().is_empty() && id != "nan")
                .count();
            let table = TableInput::from_records(rows.iter().map(|(id, name)| {
                row(&[("№ задания", id.as_str()), ("Наименование", name.as_str())])
            }));

            let result = extractor().parse(&table, "list.xlsx");

            prop_assert_eq!(result.orders.len(), result.statistics.total_orders_found);
            prop_assert_eq!(result.statistics.parsing_success, result.statistics.total_orders_found > 0);
            prop_assert_eq!(result.statistics.total_orders_found, expected_found);
            prop_assert_eq!(result.statistics.expected_quantity, rows.len());
            prop_assert!(result.orders.iter().all(|o| !o.order.order_id.is_empty()));
        }

        #[test]
        fn prop_enrichment_is_uniform(rows in prop::collection::vec(arb_row(), 1..20)) {
            let table = TableInput::from_records(rows.iter().map(|(id, name)| {
                row(&[
                    ("№ задания", id.as_str()),
                    ("Наименование", name.as_str()),
                    ("QR-код поставки", "WB-GI-1"),
                ])
            }));

            let result = extractor().parse(&table, "batch.xlsx");

            if let Some(first) = result.orders.first() {
                for record in &result.orders {
                    prop_assert_eq!(&record.metadata, &first.metadata);
                }
            }
        }
    }
}
