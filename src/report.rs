//! Plain-text report export: a read-only rendering of the ledger. This is
//! where monetary values get their 2-decimal presentation rounding.

use crate::domain::{format_money, CalculationLedger};

/// Renders the committed calculations and their grand totals as a
/// fixed-width statement.
pub fn render_report(ledger: &CalculationLedger) -> String {
    let mut out = String::new();
    out.push_str("TRANSPORT COST REPORT\n");
    out.push_str(&format!(
        "{:<4} {:<21} {:>12} {:>12} {:>10} {:>10} {:>12}\n",
        "ID", "DATE", "COLLECTION", "DELIVERY", "FERRY", "MARGIN", "TOTAL"
    ));

    if ledger.is_empty() {
        out.push_str("(no calculations)\n");
        return out;
    }

    for entry in ledger.calculations() {
        out.push_str(&format!(
            "{:<4} {:<21} {:>12} {:>12} {:>10} {:>10} {:>12}\n",
            entry.id,
            entry.timestamp.get(..19).unwrap_or(&entry.timestamp),
            format_money(entry.collection_cost),
            format_money(entry.delivery_cost),
            format_money(entry.ferry_cost),
            format_money(entry.margin_amount),
            format_money(entry.total),
        ));
    }

    let totals = ledger.grand_total();
    out.push_str(&format!(
        "{:<4} {:<21} {:>12} {:>12} {:>10} {:>10} {:>12}\n",
        "",
        "GRAND TOTAL",
        format_money(totals.collection),
        format_money(totals.delivery),
        format_money(totals.ferry),
        format_money(totals.margin),
        format_money(totals.grand),
    ));
    out
}
