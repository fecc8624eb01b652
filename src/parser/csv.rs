//! CSV ingestion for spending history
//!
//! Expected columns: Date, Description, Amount, Category. Headers are
//! matched case-insensitively and extra columns are ignored. One malformed
//! row never fails the file - it is preserved verbatim as leftover text.

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use super::{amount::coerce_amount, parse_txn_date};
use crate::models::{RecordGroup, TransactionRecord, TxnDate};

/// Header indices resolved from the CSV's first row.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnMap {
    date: Option<usize>,
    description: Option<usize>,
    amount: Option<usize>,
    category: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut map = Self::default();
        for (idx, name) in headers.iter().enumerate() {
            match name.trim().to_lowercase().as_str() {
                "date" => map.date = map.date.or(Some(idx)),
                "description" => map.description = map.description.or(Some(idx)),
                "amount" => map.amount = map.amount.or(Some(idx)),
                "category" => map.category = map.category.or(Some(idx)),
                _ => {}
            }
        }
        map
    }
}

/// Parse uploaded CSV content into transaction records.
///
/// Rows are processed line by line so that a row which fails structured
/// parsing can be preserved exactly as the user supplied it. A file whose
/// header has no amount column routes every data row to leftovers.
pub fn parse_history_csv(data: &str) -> RecordGroup<TransactionRecord> {
    let mut group = RecordGroup::default();

    let mut lines = data.lines().map(str::trim).filter(|l| !l.is_empty());

    let Some(header_line) = lines.next() else {
        return group;
    };

    let columns = match parse_row(header_line) {
        Some(headers) => ColumnMap::from_headers(&headers),
        None => ColumnMap::default(),
    };

    // no amount column means the first line was not a usable header;
    // keep it so no input is lost
    if columns.amount.is_none() {
        group.unparsed.push(header_line.to_string());
    }

    for line in lines {
        match parse_row(line).and_then(|row| row_to_record(&row, &columns)) {
            Some(record) => group.records.push(record),
            None => group.unparsed.push(line.to_string()),
        }
    }

    debug!(
        records = group.records.len(),
        leftovers = group.unparsed.len(),
        "CSV history parsed"
    );

    group
}

/// Split a single CSV line into fields, quote-aware.
fn parse_row(line: &str) -> Option<StringRecord> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());

    reader.records().next().and_then(|r| r.ok())
}

fn row_to_record(row: &StringRecord, columns: &ColumnMap) -> Option<TransactionRecord> {
    let amount_idx = columns.amount?;
    let amount = coerce_amount(row.get(amount_idx)?)?;

    let date = columns
        .date
        .and_then(|i| row.get(i))
        .map(parse_txn_date)
        .unwrap_or_else(|| TxnDate::Text(String::new()));

    let description = columns
        .description
        .and_then(|i| row.get(i))
        .unwrap_or("")
        .to_string();

    let category = columns
        .category
        .and_then(|i| row.get(i))
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Some(TransactionRecord {
        date,
        description,
        amount,
        category,
    })
}
