//! Expense record ingestion
//!
//! Converts loosely-typed transport rows (JSON bodies, CSV files) into
//! validated [`ExpenseRecord`]s. A bad row fails the whole batch with its
//! zero-based index rather than being dropped.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::ExpenseRecord;

/// Amount as it arrives over the wire: a number or a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

/// Unvalidated record as sent by a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub date: Option<String>,
    pub category: Option<String>,
    pub amount: Option<RawAmount>,
}

impl RawRecord {
    pub fn new(date: &str, category: &str, amount: f64) -> Self {
        Self {
            date: Some(date.to_string()),
            category: Some(category.to_string()),
            amount: Some(RawAmount::Number(amount)),
        }
    }
}

impl From<&ExpenseRecord> for RawRecord {
    fn from(record: &ExpenseRecord) -> Self {
        Self {
            date: Some(record.date.format("%Y-%m-%d").to_string()),
            category: Some(record.category.clone()),
            amount: Some(RawAmount::Number(record.amount)),
        }
    }
}

/// JSON record files may wrap the array as `{"records": [...]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Bare(Vec<RawRecord>),
    Wrapped { records: Vec<RawRecord> },
}

/// Validate a batch of raw records
pub fn parse_records(raw: &[RawRecord]) -> Result<Vec<ExpenseRecord>> {
    raw.iter()
        .enumerate()
        .map(|(row, record)| parse_record(row, record))
        .collect()
}

fn parse_record(row: usize, raw: &RawRecord) -> Result<ExpenseRecord> {
    let date_str = raw
        .date
        .as_deref()
        .ok_or_else(|| Error::malformed(row, "Missing date"))?;
    let date = parse_date(date_str).map_err(|reason| Error::malformed(row, reason))?;

    let category = raw
        .category
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::malformed(row, "Missing category"))?
        .to_string();

    let amount = match raw.amount.as_ref() {
        Some(RawAmount::Number(n)) => *n,
        Some(RawAmount::Text(s)) => parse_amount(s).map_err(|reason| Error::malformed(row, reason))?,
        None => return Err(Error::malformed(row, "Missing amount")),
    };
    if !amount.is_finite() {
        return Err(Error::malformed(row, format!("Amount is not finite: {}", amount)));
    }
    if amount < 0.0 {
        return Err(Error::malformed(row, format!("Amount is negative: {}", amount)));
    }

    Ok(ExpenseRecord {
        date,
        category,
        amount,
    })
}

/// Parse a date string in any of the accepted formats
pub fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
        "%m-%d-%Y", // 01-15-2024
        "%Y/%m/%d", // 2024/01/15
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    // Timestamps: keep the calendar date as written
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    Err(format!("Unable to parse date: {}", s))
}

/// Parse an amount string, handling currency symbols and thousands separators
pub fn parse_amount(s: &str) -> std::result::Result<f64, String> {
    let cleaned: String = s.trim().replace(['$', ',', ' '], "");

    cleaned
        .parse::<f64>()
        .map_err(|_| format!("Unable to parse amount: {}", s))
}

/// Read a headered CSV with `date`, `category` and `amount` columns
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ExpenseRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::MalformedInput {
                row: None,
                reason: format!("CSV is missing the '{}' column", name),
            })
    };
    let date_col = column("date")?;
    let category_col = column("category")?;
    let amount_col = column("amount")?;

    let mut raw = Vec::new();
    for result in rdr.records() {
        let record = result?;
        raw.push(RawRecord {
            date: record.get(date_col).map(str::to_string),
            category: record.get(category_col).map(str::to_string),
            amount: record
                .get(amount_col)
                .map(|s| RawAmount::Text(s.to_string())),
        });
    }

    let records = parse_records(&raw)?;
    debug!("Parsed {} CSV expense records", records.len());
    Ok(records)
}

/// Read a JSON array of records, or an object with a `records` array
pub fn read_json<R: Read>(reader: R) -> Result<Vec<ExpenseRecord>> {
    let raw = match serde_json::from_reader::<_, RecordFile>(reader)? {
        RecordFile::Bare(raw) => raw,
        RecordFile::Wrapped { records } => records,
    };
    let records = parse_records(&raw)?;
    debug!("Parsed {} JSON expense records", records.len());
    Ok(records)
}

/// Load a record file, choosing the format by extension (`.csv` or `.json`)
pub fn load_records(path: &Path) -> Result<Vec<ExpenseRecord>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    let reader = BufReader::new(File::open(path)?);
    match extension.as_deref() {
        Some("csv") => read_csv(reader),
        Some("json") => read_json(reader),
        _ => Err(Error::InvalidParameter(format!(
            "Unsupported record file (expected .csv or .json): {}",
            path.display()
        ))),
    }
}
