use crate::{
    data::{
        Aggregate, CombinedIndex, Descriptions, Error, Index, Occurrences, Relation, Totals,
        Transaction, AMOUNT_DIGITS,
    },
    read::TransactionUser,
};
use chrono::Datelike;
use log::debug;
use rust_decimal::Decimal;
use std::{collections::BTreeMap, ops::RangeInclusive, str::FromStr};

pub const DAYS_OF_MONTH: RangeInclusive<u32> = 1..=31;
pub const MONTHS: RangeInclusive<u32> = 1..=12;

/// All the transactions of one statement, in file order. Built once by the
/// reader and only read afterwards.
#[derive(Debug, Default)]
pub(crate) struct Statement {
    pub transactions: Vec<Transaction>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the day-of-month, month and entity indices.
    pub fn index(&self) -> CombinedIndex {
        let dom: Index<u32, Descriptions> =
            aggregate(&self.transactions, DAYS_OF_MONTH, |tx| tx.transaction_date.day());
        let month: Index<u32, Descriptions> =
            aggregate(&self.transactions, MONTHS, |tx| tx.transaction_date.month());
        let entity: Index<String, Occurrences> =
            aggregate(&self.transactions, std::iter::empty(), |tx| tx.description.clone());
        debug!(
            "Indexed {} transactions into {} days, {} months and {} entities",
            self.transactions.len(),
            dom.len(),
            month.len(),
            entity.len()
        );
        CombinedIndex { dom, month, entity }
    }
}

impl TransactionUser for Statement {
    fn use_tx(&mut self, tx: Transaction) -> Result<(), Error> {
        self.transactions.push(tx);
        Ok(())
    }
}

/// Groups `transactions` by `key` in a single pass. Every key of `domain` gets
/// a group even when nothing falls into it; other keys only appear once seen.
pub(crate) fn aggregate<K, R>(
    transactions: &[Transaction],
    domain: impl IntoIterator<Item = K>,
    key: impl Fn(&Transaction) -> K,
) -> Index<K, R>
where
    K: Ord,
    R: Relation,
{
    let mut groups: BTreeMap<K, Vec<&Transaction>> =
        domain.into_iter().map(|k| (k, Vec::new())).collect();
    for tx in transactions {
        groups.entry(key(tx)).or_default().push(tx);
    }
    groups
        .into_iter()
        .map(|(k, rows)| (k, Aggregate::from_rows(&rows)))
        .collect()
}

impl Totals {
    /// The mean is taken over the exact amounts; sum and mean are rounded
    /// separately.
    fn over(amounts: impl ExactSizeIterator<Item = Decimal>) -> Self {
        let count = amounts.len();
        if count == 0 {
            return Self::default();
        }
        let sum: Decimal = amounts.sum();
        Self {
            sum: sum.round_dp(AMOUNT_DIGITS),
            avg: (sum / Decimal::from(count)).round_dp(AMOUNT_DIGITS),
        }
    }
}

impl<R: Relation> Aggregate<R> {
    fn from_rows(rows: &[&Transaction]) -> Self {
        Self {
            debit: Totals::over(rows.iter().map(|tx| tx.debit)),
            credit: Totals::over(rows.iter().map(|tx| tx.credit)),
            related: (!rows.is_empty()).then(|| R::gather(rows)),
        }
    }
}

/// Name of one of the three indices of a `CombinedIndex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndexName {
    Dom,
    Month,
    Entity,
}

impl FromStr for IndexName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dom" => Ok(IndexName::Dom),
            "month" => Ok(IndexName::Month),
            "entity" => Ok(IndexName::Entity),
            other => Err(Error::InvalidIndex(other.to_string())),
        }
    }
}
