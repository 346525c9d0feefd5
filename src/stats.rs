//! Dashboard fold: summary counters and threshold alerts over fetched
//! collections. Pure computation; all reads happen in the handler.

use serde_json::{json, Value};

const ATTENDANCE_ALERT_THRESHOLD: f64 = 90.0;

fn field_str<'a>(doc: &'a Value, key: &str) -> &'a str {
    doc.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn field_f64(doc: &Value, key: &str) -> f64 {
    doc.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0)
}

/// Fold students, teachers, fees, and today's attendance into the dashboard
/// payload. `year`/`month` are "now" for the this-month admission count;
/// the attendance slice must already be filtered to today's exact date.
pub fn fold_dashboard(
    students: &[Value],
    teachers: &[Value],
    fees: &[Value],
    todays_attendance: &[Value],
    year: i32,
    month: u32,
) -> Value {
    let month_prefix = format!("{:04}-{:02}", year, month);

    let active_students = students
        .iter()
        .filter(|s| field_str(s, "status") == "Active")
        .count();
    let new_this_month = students
        .iter()
        .filter(|s| field_str(s, "admissionDate").starts_with(&month_prefix))
        .count();

    let active_teachers = teachers
        .iter()
        .filter(|t| field_str(t, "status") == "Active")
        .count();

    let mut paid_amount = 0.0;
    let mut pending_amount = 0.0;
    let mut overdue_amount = 0.0;
    let mut partial_amount = 0.0;
    let mut total_billed = 0.0;
    let mut paid_count = 0usize;
    let mut pending_count = 0usize;
    let mut overdue_count = 0usize;
    let mut partial_count = 0usize;
    for fee in fees {
        let amount = field_f64(fee, "totalAmount");
        total_billed += amount;
        match field_str(fee, "status") {
            "Paid" => {
                paid_amount += amount;
                paid_count += 1;
            }
            "Pending" => {
                pending_amount += amount;
                pending_count += 1;
            }
            "Overdue" => {
                overdue_amount += amount;
                overdue_count += 1;
            }
            "Partial" => {
                partial_amount += amount;
                partial_count += 1;
            }
            _ => {}
        }
    }
    let collection_rate = if total_billed > 0.0 {
        paid_amount / total_billed * 100.0
    } else {
        0.0
    };

    let mut present = 0usize;
    let mut late = 0usize;
    let mut absent = 0usize;
    for rec in todays_attendance {
        match field_str(rec, "status") {
            "Present" => present += 1,
            "Late" => late += 1,
            "Absent" => absent += 1,
            _ => {}
        }
    }
    let marked_today = todays_attendance.len();
    let attendance_rate = if marked_today > 0 {
        (present + late) as f64 / marked_today as f64 * 100.0
    } else {
        0.0
    };

    let mut alerts = Vec::new();
    if overdue_count > 0 {
        alerts.push(json!({
            "type": "fee_defaulters",
            "severity": "high",
            "message": format!("{} fee record(s) overdue", overdue_count),
        }));
    }
    if attendance_rate < ATTENDANCE_ALERT_THRESHOLD {
        alerts.push(json!({
            "type": "low_attendance",
            "severity": "medium",
            "message": format!("today's attendance rate is {:.1}%", attendance_rate),
        }));
    }

    json!({
        "students": {
            "total": students.len(),
            "active": active_students,
            "newThisMonth": new_this_month,
        },
        "teachers": {
            "total": teachers.len(),
            "active": active_teachers,
        },
        "fees": {
            "totalBilled": total_billed,
            "paidAmount": paid_amount,
            "pendingAmount": pending_amount,
            "overdueAmount": overdue_amount,
            "partialAmount": partial_amount,
            "paidCount": paid_count,
            "pendingCount": pending_count,
            "overdueCount": overdue_count,
            "partialCount": partial_count,
            "collectionRate": collection_rate,
        },
        "attendance": {
            "today": {
                "marked": marked_today,
                "present": present,
                "late": late,
                "absent": absent,
                "rate": attendance_rate,
            }
        },
        "alerts": alerts,
    })
}
