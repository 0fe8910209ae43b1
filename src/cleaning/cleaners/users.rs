use serde_json::Value;

use crate::batch::Batch;
use crate::cleaning::{
    filters, phone, CleanOutcome, CleanReport, EntityCleaner, EntityKind, RejectReason,
};
use crate::error::Result;

const ALLOWED_COUNTRIES: [&str; 3] = ["United Kingdom", "Germany", "United States"];
const ALLOWED_COUNTRY_CODES: [&str; 3] = ["GB", "DE", "US"];

/// Cleaner for the legacy users table: country allow-listing, country-code
/// repair, phone standardization, and date coercion.
pub struct UserCleaner;

impl EntityCleaner for UserCleaner {
    fn kind(&self) -> EntityKind {
        EntityKind::User
    }

    fn clean(&self, mut batch: Batch) -> Result<CleanOutcome> {
        let mut report = CleanReport::new(EntityKind::User, batch.len());

        filters::drop_missing(&mut batch, &mut report);
        filters::drop_duplicates(&mut batch, &mut report);
        filters::retain_allowed(&mut batch, &mut report, "country", &ALLOWED_COUNTRIES)?;

        // Known typo in the source feed
        batch.map_column("country_code", |v| match v.as_str() {
            Some("GGB") => Value::String("GB".to_string()),
            _ => v.clone(),
        })?;
        filters::retain_allowed(
            &mut batch,
            &mut report,
            "country_code",
            &ALLOWED_COUNTRY_CODES,
        )?;

        // Country codes are validated above, so a failed prefix lookup can
        // only hit rows the filter somehow let through; those are rejected
        // per-row rather than crashing the batch
        standardize_numbers(&mut batch, &mut report)?;

        filters::coerce_dates(&mut batch, &mut report, "date_of_birth")?;
        filters::coerce_dates(&mut batch, &mut report, "join_date")?;

        Ok(CleanOutcome { batch, report })
    }
}

/// Rewrite the `phone_number` column against the validated `country_code`.
fn standardize_numbers(batch: &mut Batch, report: &mut CleanReport) -> Result<()> {
    let numbers = batch.expect_column("phone_number")?.values.clone();
    let codes = batch.expect_column("country_code")?.values.clone();

    let mut normalized = Vec::with_capacity(numbers.len());
    let mut mask = Vec::with_capacity(numbers.len());
    for (number, code) in numbers.iter().zip(&codes) {
        let result = match (number.as_str(), code.as_str()) {
            (Some(n), Some(c)) => phone::normalize_phone(n, c),
            _ => None,
        };
        match result {
            Some(p) => {
                normalized.push(Value::String(p));
                mask.push(true);
            }
            None => {
                normalized.push(Value::Null);
                mask.push(false);
            }
        }
    }
    batch.set_column("phone_number", normalized)?;
    filters::apply_mask(batch, report, &mask, RejectReason::CategoryRejected);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_batch() -> Batch {
        Batch::from_columns(vec![
            (
                "country",
                vec![
                    json!("United Kingdom"),
                    json!("Narnia"),
                    json!("Germany"),
                    json!("United States"),
                ],
            ),
            (
                "country_code",
                vec![json!("GB"), json!("XX"), json!("GGB"), json!("US")],
            ),
            (
                "phone_number",
                vec![
                    json!("07911 123456"),
                    json!("12345"),
                    json!("+49 30 901820"),
                    json!("(555) 123-4567"),
                ],
            ),
            (
                "date_of_birth",
                vec![
                    json!("1968 October 16"),
                    json!("1970-01-01"),
                    json!("1990-05-12"),
                    json!("1985-03-30"),
                ],
            ),
            (
                "join_date",
                vec![
                    json!("2020-01-15"),
                    json!("2020-01-15"),
                    json!("July 2019 14"),
                    json!("2021-11-02"),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn unknown_country_is_dropped() {
        let outcome = UserCleaner.clean(user_batch()).unwrap();
        assert_eq!(outcome.batch.len(), 3);
        assert_eq!(outcome.report.count(RejectReason::CategoryRejected), 1);
        assert!(!outcome
            .batch
            .column("country")
            .unwrap()
            .values
            .contains(&json!("Narnia")));
    }

    #[test]
    fn ggb_typo_is_repaired_then_allowed() {
        let outcome = UserCleaner.clean(user_batch()).unwrap();
        let codes = &outcome.batch.column("country_code").unwrap().values;
        assert!(codes.contains(&json!("GB")));
        assert!(!codes.contains(&json!("GGB")));
    }

    #[test]
    fn phones_carry_their_dialing_prefix() {
        let outcome = UserCleaner.clean(user_batch()).unwrap();
        assert_eq!(
            outcome.batch.column("phone_number").unwrap().values,
            vec![
                json!("+447911123456"),
                json!("+4930901820"),
                json!("+15551234567")
            ]
        );
    }

    #[test]
    fn dates_are_iso_after_cleaning() {
        let outcome = UserCleaner.clean(user_batch()).unwrap();
        assert_eq!(
            outcome.batch.column("date_of_birth").unwrap().values[0],
            json!("1968-10-16")
        );
        assert_eq!(
            outcome.batch.column("join_date").unwrap().values[1],
            json!("2019-07-14")
        );
    }

    #[test]
    fn cleaning_is_idempotent() {
        let once = UserCleaner.clean(user_batch()).unwrap();
        let twice = UserCleaner.clean(once.batch.clone()).unwrap();
        assert_eq!(once.batch, twice.batch);
        assert_eq!(twice.report.rejected_rows(), 0);
    }

    #[test]
    fn report_accounting_matches_row_delta() {
        let outcome = UserCleaner.clean(user_batch()).unwrap();
        assert_eq!(
            outcome.report.input_rows - outcome.report.output_rows,
            outcome.report.rejected_rows()
        );
        assert_eq!(outcome.report.output_rows, outcome.batch.len());
    }
}
