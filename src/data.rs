use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Number of decimal places every aggregate amount is rounded to.
pub const AMOUNT_DIGITS: u32 = 2;

/// One row of a bank statement export. The columns come in this exact order in
/// the file; a short row leaves its trailing columns empty (amounts at zero,
/// text blank, no value date).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Transaction {
    pub transaction_date: NaiveDate,
    pub value_date: Option<NaiveDate>,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub account_balance: Decimal,
    pub available_balance: Decimal,
    pub category: String,
}

/// Sum and mean of one side (debit or credit) of a group of transactions.
/// Both are zero for an empty group.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Totals {
    pub sum: Decimal,
    pub avg: Decimal,
}

/// Descriptions seen in a day-of-month or month group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Descriptions(pub BTreeSet<String>);

/// Where and how often a given entity shows up in the statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Occurrences {
    pub days_of_month: BTreeSet<u32>,
    pub months: BTreeSet<u32>,
    pub count: usize,
}

/// The computed bundle for one group. `related` is `None` when no transaction
/// fell into the group, which only happens for the fixed day/month domains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Aggregate<R> {
    pub debit: Totals,
    pub credit: Totals,
    pub related: Option<R>,
}

pub(crate) type Index<K, R> = BTreeMap<K, Aggregate<R>>;

/// The three indices built from one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CombinedIndex {
    pub dom: Index<u32, Descriptions>,
    pub month: Index<u32, Descriptions>,
    pub entity: Index<String, Occurrences>,
}

/// A single attribute of an `Aggregate`, borrowed for sorting and printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Value<'a> {
    Amount(Decimal),
    Count(usize),
    Names(Option<&'a BTreeSet<String>>),
    Numbers(Option<&'a BTreeSet<u32>>),
}

/// The group-specific part of an `Aggregate`: how it is gathered from the
/// group's transactions and which named fields it exposes.
pub(crate) trait Relation: Sized {
    const FIELDS: &'static [&'static str];

    /// Only ever called with a non-empty group.
    fn gather(rows: &[&Transaction]) -> Self;

    fn value<'a>(related: Option<&'a Self>, field: &str) -> Option<Value<'a>>;
}

impl Relation for Descriptions {
    const FIELDS: &'static [&'static str] = &["entities"];

    fn gather(rows: &[&Transaction]) -> Self {
        Descriptions(rows.iter().map(|tx| tx.description.clone()).collect())
    }

    fn value<'a>(related: Option<&'a Self>, field: &str) -> Option<Value<'a>> {
        match field {
            "entities" => Some(Value::Names(related.map(|d| &d.0))),
            _ => None,
        }
    }
}

impl Relation for Occurrences {
    const FIELDS: &'static [&'static str] = &["days_of_month", "months", "count"];

    fn gather(rows: &[&Transaction]) -> Self {
        use chrono::Datelike;

        Occurrences {
            days_of_month: rows.iter().map(|tx| tx.transaction_date.day()).collect(),
            months: rows.iter().map(|tx| tx.transaction_date.month()).collect(),
            count: rows.len(),
        }
    }

    fn value<'a>(related: Option<&'a Self>, field: &str) -> Option<Value<'a>> {
        match field {
            "days_of_month" => Some(Value::Numbers(related.map(|o| &o.days_of_month))),
            "months" => Some(Value::Numbers(related.map(|o| &o.months))),
            "count" => Some(Value::Count(related.map_or(0, |o| o.count))),
            _ => None,
        }
    }
}

const AMOUNT_FIELDS: &[&str] = &["debit.sum", "debit.avg", "credit.sum", "credit.avg"];

impl<R: Relation> Aggregate<R> {
    /// Every field name of this kind of aggregate, in print order.
    pub fn fields() -> impl Iterator<Item = &'static str> {
        AMOUNT_FIELDS.iter().chain(R::FIELDS).copied()
    }

    pub fn value(&self, field: &str) -> Option<Value<'_>> {
        match field {
            "debit.sum" => Some(Value::Amount(self.debit.sum)),
            "debit.avg" => Some(Value::Amount(self.debit.avg)),
            "credit.sum" => Some(Value::Amount(self.credit.sum)),
            "credit.avg" => Some(Value::Amount(self.credit.avg)),
            other => R::value(self.related.as_ref(), other),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Line {line}: invalid date {text:?} in column {column}")]
    InvalidDate {
        line: u64,
        column: &'static str,
        text: String,
    },
    #[error("Line {line}: invalid amount {text:?} in column {column}")]
    InvalidAmount {
        line: u64,
        column: &'static str,
        text: String,
    },
    #[error("Invalid index {0:?} (expected dom, month or entity)")]
    InvalidIndex(String),
    #[error("Invalid sort key {0:?}")]
    InvalidSortKey(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
