// 📤 CSV export - one row per split line of a group's expense log

use crate::entities::Group;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    expense_id: i64,
    date: String,
    paid_by: &'a str,
    total: f64,
    debtor: &'a str,
    amount: f64,
    settled: bool,
}

/// Write every split line of `group` as CSV. Returns the number of rows.
///
/// Expenses with no debtors (payer covered everything) produce no rows.
pub fn write_group_csv<W: Write>(group: &Group, writer: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut rows = 0;

    for expense in group.expenses() {
        for (debtor, amount) in expense.splits() {
            wtr.serialize(ExportRow {
                expense_id: expense.id().value(),
                date: expense.date().to_rfc3339(),
                paid_by: expense.paid_by(),
                total: expense.total(),
                debtor,
                amount: *amount,
                settled: expense.is_settled(debtor),
            })
            .with_context(|| format!("Failed to write row for expense {}", expense.id()))?;
            rows += 1;
        }
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(rows)
}
