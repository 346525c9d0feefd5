//! Fee schedule expansion and bill-number formatting.

use serde_json::{json, Value};

/// Fixed expansion order for a student's stored fee structure.
const COMPONENTS: [(&str, &str, &str); 5] = [
    ("tuitionFee", "Tuition", "Monthly tuition fee"),
    ("transportFee", "Transport", "Transport service charge"),
    ("libraryFee", "Library", "Library access fee"),
    ("examFee", "Examination", "Examination fee"),
    ("miscFee", "Miscellaneous", "Miscellaneous charges"),
];

/// One item per strictly-positive component, in COMPONENTS order.
/// A missing or zero component contributes no item.
pub fn items_from_structure(fee_structure: &Value) -> Vec<Value> {
    let mut items = Vec::new();
    for (field, fee_type, description) in COMPONENTS {
        let amount = fee_structure
            .get(field)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        if amount > 0.0 {
            items.push(json!({
                "feeType": fee_type,
                "amount": amount,
                "description": description,
            }));
        }
    }
    items
}

pub fn total_of(items: &[Value]) -> f64 {
    items
        .iter()
        .map(|item| item.get("amount").and_then(|v| v.as_f64()).unwrap_or(0.0))
        .sum()
}

/// `BILL-{year}-{month:02}-{sequence:03}`; sequence is per calendar month.
pub fn format_bill_number(year: i32, month: u32, seq: i64) -> String {
    format!("BILL-{}-{:02}-{:03}", year, month, seq)
}
