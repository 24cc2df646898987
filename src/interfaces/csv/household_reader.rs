use crate::error::{Result, SupplementError};
use csv::StringRecord;
use serde_json::{Map, Value};
use std::io::Read;

/// Reads households from a CSV source as raw submissions.
///
/// Each row becomes the JSON object a caller would have posted, so CSV input
/// goes through exactly the same validation as any other submission. Numeric
/// and boolean columns are typed when they parse and left as strings when
/// they don't; empty cells are treated as missing.
pub struct HouseholdReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> HouseholdReader<R> {
    /// Creates a new `HouseholdReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads one household per row.
    pub fn households(mut self) -> Result<impl Iterator<Item = Result<Value>>> {
        let headers = self.reader.headers()?.clone();
        Ok(self.reader.into_records().map(move |record| {
            record
                .map(|record| to_submission(&headers, &record))
                .map_err(SupplementError::from)
        }))
    }
}

fn to_submission(headers: &StringRecord, record: &StringRecord) -> Value {
    let fields: Map<String, Value> = headers
        .iter()
        .zip(record.iter())
        .filter(|(_, cell)| !cell.is_empty())
        .map(|(name, cell)| (name.to_string(), typed_cell(name, cell)))
        .collect();
    Value::Object(fields)
}

fn typed_cell(name: &str, cell: &str) -> Value {
    match name {
        "numberOfChildren" => cell
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(cell)),
        "familyUnitInPayForDecember" | "decemberPayInPayUnit" => match cell {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            other => Value::from(other),
        },
        _ => Value::from(cell),
    }
}
