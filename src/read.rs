use crate::data::{Error, Transaction};
use chrono::NaiveDate;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Trait for doing something with a `Transaction` read from a statement.
/// Used by `Statement` to collect the rows it indexes, and by the tests to
/// check what the parser hands over.
pub(crate) trait TransactionUser {
    fn use_tx(&mut self, tx: Transaction) -> Result<(), Error>;
}

/// Layout of a statement export. The defaults match the bank export this tool
/// was written for: seven header lines, a trailing summary line, tab separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StatementFormat {
    pub header_lines: usize,
    pub footer_lines: usize,
    pub delimiter: u8,
}

impl Default for StatementFormat {
    fn default() -> Self {
        Self {
            header_lines: 7,
            footer_lines: 1,
            delimiter: b'\t',
        }
    }
}

/// A row as it comes out of the CSV reader, before any column is parsed.
/// Missing trailing columns deserialize as empty strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRow {
    transaction_date: String,
    value_date: String,
    description: String,
    debit: String,
    credit: String,
    account_balance: String,
    available_balance: String,
    category: String,
}

impl RawRow {
    fn into_transaction(self, line: u64) -> Result<Transaction, Error> {
        let date = |column, text: String| {
            parse_date(&text).map_err(|_| Error::InvalidDate { line, column, text })
        };
        let amount = |column, text: String| {
            parse_amount(&text).map_err(|_| Error::InvalidAmount { line, column, text })
        };
        let value_date = if self.value_date.is_empty() {
            None
        } else {
            Some(date("value_date", self.value_date)?)
        };
        Ok(Transaction {
            transaction_date: date("transaction_date", self.transaction_date)?,
            value_date,
            description: self.description,
            debit: amount("debit", self.debit)?,
            credit: amount("credit", self.credit)?,
            account_balance: amount("account_balance", self.account_balance)?,
            available_balance: amount("available_balance", self.available_balance)?,
            category: self.category,
        })
    }
}

/// Parses `DD-MM-YYYY`.
pub(crate) fn parse_date(text: &str) -> chrono::ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
}

/// Parses an amount written with `.` as thousands separator and `,` as decimal
/// separator, e.g. `1.234,56`. Empty text is zero.
pub(crate) fn parse_amount(text: &str) -> Result<Decimal, rust_decimal::Error> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(&text.replace('.', "").replace(',', "."))
}

/// Statements are exported in ISO-8859-1, where every byte is the code point
/// of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Reads a whole statement export and hands every data row to `user`.
/// Returns the number of rows read. The first malformed row aborts the read.
pub(crate) fn read_statement<R: std::io::Read, U: TransactionUser>(
    mut reader: R,
    format: &StatementFormat,
    user: &mut U,
) -> Result<usize, Error> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let text = decode_latin1(&bytes);
    let lines: Vec<&str> = text.lines().collect();

    let skipped = format.header_lines + format.footer_lines;
    if lines.len() < skipped {
        warn!(
            "Statement has {} lines, fewer than its {} header and footer lines; no rows read",
            lines.len(),
            skipped
        );
        return Ok(0);
    }
    debug!(
        "Skipping {} header and {} footer lines",
        format.header_lines, format.footer_lines
    );
    let body = lines[format.header_lines..lines.len() - format.footer_lines].join("\n");

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let mut count = 0;
    for result in rdr.records() {
        let record = result?;
        let line = format.header_lines as u64 + record.position().map_or(0, |p| p.line());
        let row: RawRow = record.deserialize(None)?;
        user.use_tx(row.into_transaction(line)?)?;
        count += 1;
    }
    info!("Read {count} transactions");
    Ok(count)
}
