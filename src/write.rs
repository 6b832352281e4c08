use crate::{
    compute::IndexName,
    data::{Aggregate, CombinedIndex, Error, Index, Relation, Value},
};
use rust_decimal::Decimal;
use std::{cmp::Ordering, fmt};

impl Value<'_> {
    /// What a sort compares: the number itself, or the size of a set.
    fn magnitude(&self) -> Decimal {
        match *self {
            Value::Amount(amount) => amount,
            Value::Count(count) => Decimal::from(count),
            Value::Names(names) => Decimal::from(names.map_or(0, |n| n.len())),
            Value::Numbers(numbers) => Decimal::from(numbers.map_or(0, |n| n.len())),
        }
    }

    /// Zero amounts and absent sets are left out of sorted listings.
    fn is_empty(&self) -> bool {
        match *self {
            Value::Amount(amount) => amount.is_zero(),
            Value::Count(count) => count == 0,
            Value::Names(names) => names.is_none(),
            Value::Numbers(numbers) => numbers.is_none(),
        }
    }
}

fn write_set<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> fmt::Result {
    f.write_str("{")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("}")
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Value::Amount(amount) => write!(f, "{amount:.2}"),
            Value::Count(count) => write!(f, "{count}"),
            Value::Names(Some(names)) => write_set(f, names.iter()),
            Value::Numbers(Some(numbers)) => write_set(f, numbers.iter()),
            Value::Names(None) | Value::Numbers(None) => f.write_str("null"),
        }
    }
}

/// Prints the index called `name`. Without a sort field every field of every
/// entry is listed in key order; with one, only that field is listed, sorted,
/// with the zero and null entries left out.
pub(crate) fn write_index<W: std::io::Write>(
    writer: W,
    index: &CombinedIndex,
    name: IndexName,
    sort: Option<&str>,
    descending: bool,
) -> Result<(), Error> {
    match name {
        IndexName::Dom => write_entries(writer, &index.dom, sort, descending),
        IndexName::Month => write_entries(writer, &index.month, sort, descending),
        IndexName::Entity => write_entries(writer, &index.entity, sort, descending),
    }
}

fn write_entries<W, K, R>(
    mut writer: W,
    index: &Index<K, R>,
    sort: Option<&str>,
    descending: bool,
) -> Result<(), Error>
where
    W: std::io::Write,
    K: fmt::Display,
    R: Relation,
{
    let Some(field) = sort else {
        for (key, entry) in index {
            for field in Aggregate::<R>::fields() {
                if let Some(value) = entry.value(field) {
                    writeln!(writer, "[{key}] {field}\t{value}")?;
                }
            }
        }
        writer.flush()?;
        return Ok(());
    };

    if !Aggregate::<R>::fields().any(|f| f == field) {
        return Err(Error::InvalidSortKey(field.to_string()));
    }
    let mut rows: Vec<(&K, Value)> = index
        .iter()
        .filter_map(|(key, entry)| entry.value(field).map(|value| (key, value)))
        .filter(|(_, value)| !value.is_empty())
        .collect();
    rows.sort_by(|(_, a), (_, b)| {
        let order: Ordering = a.magnitude().cmp(&b.magnitude());
        if descending {
            order.reverse()
        } else {
            order
        }
    });
    for (key, value) in rows {
        writeln!(writer, "[{key}] {value}")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        compute::{IndexName, Statement},
        data::{CombinedIndex, Error, Transaction},
        read::TransactionUser,
        write::write_index,
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn tx(date: &str, description: &str, debit: Decimal, credit: Decimal) -> Transaction {
        let date = NaiveDate::parse_from_str(date, "%d-%m-%Y").unwrap();
        Transaction {
            transaction_date: date,
            value_date: Some(date),
            description: description.to_string(),
            debit,
            credit,
            account_balance: dec!(0),
            available_balance: dec!(0),
            category: String::new(),
        }
    }

    fn index() -> CombinedIndex {
        let mut statement = Statement::new();
        for t in [
            tx("05-03-2024", "X", dec!(100.0), dec!(0)),
            tx("05-03-2024", "Y", dec!(50.0), dec!(0)),
            tx("06-03-2024", "Z", dec!(0), dec!(0)),
            tx("20-04-2024", "X", dec!(300.0), dec!(0)),
            tx("21-04-2024", "PAYROLL", dec!(0), dec!(1500)),
        ] {
            statement.use_tx(t).unwrap();
        }
        statement.index()
    }

    fn output(name: IndexName, sort: Option<&str>, descending: bool) -> Result<String, Error> {
        let mut out = Vec::new();
        write_index(&mut out, &index(), name, sort, descending)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn unsorted_day_of_month() {
        let out = output(IndexName::Dom, None, true).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        // 31 days, five fields each
        assert_eq!(lines.len(), 31 * 5);
        assert_eq!(
            lines[..5],
            [
                "[1] debit.sum\t0.00",
                "[1] debit.avg\t0.00",
                "[1] credit.sum\t0.00",
                "[1] credit.avg\t0.00",
                "[1] entities\tnull",
            ]
        );
        assert_eq!(
            lines[20..25],
            [
                "[5] debit.sum\t150.00",
                "[5] debit.avg\t75.00",
                "[5] credit.sum\t0.00",
                "[5] credit.avg\t0.00",
                "[5] entities\t{X, Y}",
            ]
        );
    }

    #[test]
    fn unsorted_entity() {
        let out = output(IndexName::Entity, None, true).unwrap();
        let x: Vec<&str> = out.lines().filter(|l| l.starts_with("[X]")).collect();
        assert_eq!(
            x,
            [
                "[X] debit.sum\t400.00",
                "[X] debit.avg\t200.00",
                "[X] credit.sum\t0.00",
                "[X] credit.avg\t0.00",
                "[X] days_of_month\t{5, 20}",
                "[X] months\t{3, 4}",
                "[X] count\t2",
            ]
        );
    }

    #[test]
    fn sorted_descending_drops_zeros() {
        let out = output(IndexName::Dom, Some("debit.sum"), true).unwrap();
        assert_eq!(out, "[20] 300.00\n[5] 150.00\n");
    }

    #[test]
    fn sorted_ascending() {
        let out = output(IndexName::Month, Some("debit.sum"), false).unwrap();
        assert_eq!(out, "[3] 150.00\n[4] 300.00\n");
    }

    #[test]
    fn sorted_by_count() {
        let out = output(IndexName::Entity, Some("count"), true).unwrap();
        assert_eq!(out, "[X] 2\n[PAYROLL] 1\n[Y] 1\n[Z] 1\n");
    }

    #[test]
    fn sorted_by_set_size() {
        let out = output(IndexName::Dom, Some("entities"), true).unwrap();
        assert_eq!(out, "[5] {X, Y}\n[6] {Z}\n[20] {X}\n[21] {PAYROLL}\n");
    }

    #[test]
    fn invalid_sort_key() {
        assert!(matches!(
            output(IndexName::Dom, Some("nonexistent.field"), true),
            Err(Error::InvalidSortKey(key)) if key == "nonexistent.field"
        ));
        // entity fields only exist on the entity index
        assert!(matches!(
            output(IndexName::Month, Some("count"), true),
            Err(Error::InvalidSortKey(_))
        ));
    }
}
