//! Mapping from logical picking list fields to spreadsheet columns.

use tracing::warn;

/// Fields the extractor reads from a picking list table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    SupplyId,
    CreationDate,
    TaskNumber,
    Name,
    Size,
    Color,
    SellerArticle,
    Sticker,
}

impl LogicalField {
    pub const ALL: [LogicalField; 8] = [
        LogicalField::SupplyId,
        LogicalField::CreationDate,
        LogicalField::TaskNumber,
        LogicalField::Name,
        LogicalField::Size,
        LogicalField::Color,
        LogicalField::SellerArticle,
        LogicalField::Sticker,
    ];

    /// Column header used for this field in marketplace picking list exports.
    pub fn column_name(self) -> &'static str {
        match self {
            LogicalField::SupplyId => "QR-код поставки",
            LogicalField::CreationDate => "Дата создания",
            LogicalField::TaskNumber => "№ задания",
            LogicalField::Name => "Наименование",
            LogicalField::Size => "Размер",
            LogicalField::Color => "Цвет",
            LogicalField::SellerArticle => "Артикул продавца",
            LogicalField::Sticker => "Стикер",
        }
    }

    fn position(self) -> usize {
        self as usize
    }
}

/// Where a logical field lives in a particular table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSlot {
    Present(usize),
    Absent,
}

impl ColumnSlot {
    pub fn is_present(self) -> bool {
        matches!(self, ColumnSlot::Present(_))
    }
}

/// Column positions for every [`LogicalField`], resolved once per table.
///
/// Header names are compared trimmed and case-insensitively. When a name
/// occurs more than once, the leftmost column wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    slots: [ColumnSlot; 8],
    duplicates: Vec<LogicalField>,
}

impl ColumnMap {
    pub fn resolve(headers: &[String]) -> Self {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        let mut slots = [ColumnSlot::Absent; 8];
        let mut duplicates = Vec::new();

        for field in LogicalField::ALL {
            let wanted = normalize_header(field.column_name());
            let mut matches = normalized
                .iter()
                .enumerate()
                .filter(|(_, header)| **header == wanted)
                .map(|(position, _)| position);

            if let Some(first) = matches.next() {
                slots[field.position()] = ColumnSlot::Present(first);
                let extra = matches.count();
                if extra > 0 {
                    warn!(
                        column = field.column_name(),
                        occurrences = extra + 1,
                        "Duplicate picking list column, using the first one"
                    );
                    duplicates.push(field);
                }
            }
        }

        Self { slots, duplicates }
    }

    pub fn slot(&self, field: LogicalField) -> ColumnSlot {
        self.slots[field.position()]
    }

    pub fn missing(&self) -> Vec<LogicalField> {
        LogicalField::ALL
            .into_iter()
            .filter(|field| !self.slot(*field).is_present())
            .collect()
    }

    pub fn duplicates(&self) -> &[LogicalField] {
        &self.duplicates
    }
}

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}
