//! Row-level filters shared by the entity cleaners: missing-field and
//! duplicate removal, allow-list filtering, date coercion, and numeric
//! checks. Each filter updates the report with the rows it rejects.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde_json::Value;

use crate::batch::{cell_as_f64, Batch};
use crate::cleaning::{CleanReport, RejectReason};
use crate::error::Result;

/// Date layouts seen across the source feeds. ISO first; the long-month
/// permutations cover the legacy entries ("1968 October 16", "July 1961 14").
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y %B %d",
    "%B %Y %d",
    "%d %B %Y",
    "%m/%d/%Y",
];

/// Drop rows containing any `Null` cell.
pub fn drop_missing(batch: &mut Batch, report: &mut CleanReport) {
    let len = batch.len();
    let mut mask = vec![true; len];
    for name in batch.column_names().map(str::to_string).collect::<Vec<_>>() {
        // Column lookup cannot fail for names we just enumerated
        if let Some(column) = batch.column(&name) {
            for (i, value) in column.values.iter().enumerate() {
                if value.is_null() {
                    mask[i] = false;
                }
            }
        }
    }
    apply_mask(batch, report, &mask, RejectReason::FieldMissing);
}

/// Drop rows that are exact duplicates of an earlier row.
pub fn drop_duplicates(batch: &mut Batch, report: &mut CleanReport) {
    let mut seen = HashSet::new();
    let mask: Vec<bool> = (0..batch.len())
        .map(|i| seen.insert(batch.row_fingerprint(i)))
        .collect();
    apply_mask(batch, report, &mask, RejectReason::Duplicate);
}

/// Keep only rows whose `column` value is an exact member of `allowed`.
///
/// The legacy job tested categorical values by substring containment against
/// a pipe-joined list, which accepted partial tokens; this is the tightened
/// exact-membership version.
pub fn retain_allowed(
    batch: &mut Batch,
    report: &mut CleanReport,
    column: &str,
    allowed: &[&str],
) -> Result<()> {
    let allowed: HashSet<&str> = allowed.iter().copied().collect();
    let mask: Vec<bool> = batch
        .expect_column(column)?
        .values
        .iter()
        .map(|v| v.as_str().is_some_and(|s| allowed.contains(s)))
        .collect();
    apply_mask(batch, report, &mask, RejectReason::CategoryRejected);
    Ok(())
}

/// Coerce a date column to ISO `%Y-%m-%d` strings, dropping rows whose value
/// does not parse under any known layout.
pub fn coerce_dates(batch: &mut Batch, report: &mut CleanReport, column: &str) -> Result<()> {
    let coerced: Vec<Value> = batch
        .expect_column(column)?
        .values
        .iter()
        .map(|v| match v.as_str().and_then(parse_date) {
            Some(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            None => Value::Null,
        })
        .collect();
    let mask: Vec<bool> = coerced.iter().map(|v| !v.is_null()).collect();
    batch.set_column(column, coerced)?;
    apply_mask(batch, report, &mask, RejectReason::UnparseableValue);
    Ok(())
}

/// Keep only rows whose `column` value parses as a number.
pub fn retain_numeric(batch: &mut Batch, report: &mut CleanReport, column: &str) -> Result<()> {
    let mask: Vec<bool> = batch
        .expect_column(column)?
        .values
        .iter()
        .map(|v| cell_as_f64(v).is_some())
        .collect();
    apply_mask(batch, report, &mask, RejectReason::UnparseableValue);
    Ok(())
}

/// Try every known date layout in order.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Retain rows per the mask and charge the dropped count to `reason`.
pub fn apply_mask(batch: &mut Batch, report: &mut CleanReport, mask: &[bool], reason: RejectReason) {
    let dropped = mask.iter().filter(|keep| !**keep).count();
    if dropped > 0 {
        batch.retain_rows(mask);
        report.reject(reason, dropped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::EntityKind;
    use serde_json::json;

    fn report() -> CleanReport {
        CleanReport::new(EntityKind::User, 0)
    }

    #[test]
    fn drop_missing_counts_rows_not_cells() {
        let mut batch = Batch::from_columns(vec![
            ("a", vec![json!(1), Value::Null, Value::Null]),
            ("b", vec![json!("x"), Value::Null, json!("z")]),
        ])
        .unwrap();
        let mut report = CleanReport::new(EntityKind::User, 3);
        drop_missing(&mut batch, &mut report);
        assert_eq!(batch.len(), 1);
        assert_eq!(report.count(RejectReason::FieldMissing), 2);
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let mut batch = Batch::from_columns(vec![(
            "a",
            vec![json!("x"), json!("y"), json!("x"), json!("x")],
        )])
        .unwrap();
        let mut report = CleanReport::new(EntityKind::Card, 4);
        drop_duplicates(&mut batch, &mut report);
        assert_eq!(batch.len(), 2);
        assert_eq!(report.count(RejectReason::Duplicate), 2);
    }

    #[test]
    fn allow_list_is_exact_membership() {
        let mut batch = Batch::from_columns(vec![(
            "country",
            vec![
                json!("Germany"),
                json!("Narnia"),
                // substring of an allowed token; the legacy containment
                // check would have let this through
                json!("United"),
                json!("United Kingdom"),
            ],
        )])
        .unwrap();
        let mut report = CleanReport::new(EntityKind::User, 4);
        retain_allowed(
            &mut batch,
            &mut report,
            "country",
            &["United Kingdom", "Germany", "United States"],
        )
        .unwrap();
        assert_eq!(
            batch.column("country").unwrap().values,
            vec![json!("Germany"), json!("United Kingdom")]
        );
        assert_eq!(report.count(RejectReason::CategoryRejected), 2);
    }

    #[test]
    fn dates_are_coerced_to_iso() {
        let mut batch = Batch::from_columns(vec![(
            "join_date",
            vec![
                json!("2021-03-04"),
                json!("1968 October 16"),
                json!("July 1961 14"),
                json!("not a date"),
            ],
        )])
        .unwrap();
        let mut r = CleanReport::new(EntityKind::User, 4);
        coerce_dates(&mut batch, &mut r, "join_date").unwrap();
        assert_eq!(
            batch.column("join_date").unwrap().values,
            vec![
                json!("2021-03-04"),
                json!("1968-10-16"),
                json!("1961-07-14")
            ]
        );
        assert_eq!(r.count(RejectReason::UnparseableValue), 1);
    }

    #[test]
    fn date_coercion_is_idempotent() {
        let iso = json!("1999-12-31");
        let mut batch = Batch::from_columns(vec![("d", vec![iso.clone()])]).unwrap();
        let mut r = report();
        coerce_dates(&mut batch, &mut r, "d").unwrap();
        assert_eq!(batch.column("d").unwrap().values, vec![iso]);
    }

    #[test]
    fn numeric_filter_accepts_numbers_and_numeric_strings() {
        let mut batch = Batch::from_columns(vec![(
            "staff_numbers",
            vec![json!("30"), json!(12), json!("3n9"), json!("")],
        )])
        .unwrap();
        let mut r = CleanReport::new(EntityKind::Store, 4);
        retain_numeric(&mut batch, &mut r, "staff_numbers").unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(r.count(RejectReason::UnparseableValue), 2);
    }
}
