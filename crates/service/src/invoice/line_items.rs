//! Line amount and invoice total arithmetic.

use serde::Deserialize;

/// Round to two decimals, halves going up (towards positive infinity).
///
/// ```
/// use service::invoice::line_items::round2;
/// assert_eq!(round2(1.006), 1.01);
/// assert_eq!(round2(-1.234), -1.23);
/// assert_eq!(round2(-0.125), -0.12);
/// ```
pub fn round2(v: f64) -> f64 {
    let r = (v * 100.0 + 0.5).floor() / 100.0;
    // keep -0.0 out of responses
    if r == 0.0 { 0.0 } else { r }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LineItemInput {
    pub product_id: Option<String>,
    pub label: Option<String>,
    pub quantity: Option<i32>,
    pub price: Option<f64>,
    pub discount_pct: Option<f64>,
    pub tax_pct: Option<f64>,
}

/// A line after clamping inputs and computing its amounts.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: Option<String>,
    pub label: String,
    pub quantity: i32,
    pub price: f64,
    pub discount_pct: f64,
    pub tax_pct: f64,
    pub amount_ex_tax: f64,
    pub amount_inc_tax: f64,
}

impl PricedLine {
    pub fn from_input(input: &LineItemInput) -> Self {
        let quantity = input.quantity.unwrap_or(1).max(1);
        let price = input.price.unwrap_or(0.0);
        let discount_pct = input.discount_pct.unwrap_or(0.0).max(0.0);
        let tax_pct = input.tax_pct.unwrap_or(0.0).max(0.0);
        let base = f64::from(quantity) * price;
        let ex = base - base * discount_pct / 100.0;
        let tax = ex * tax_pct / 100.0;
        Self {
            product_id: input.product_id.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
            label: input.label.as_deref().map(str::trim).unwrap_or_default().to_string(),
            quantity,
            price,
            discount_pct,
            tax_pct,
            amount_ex_tax: round2(ex),
            amount_inc_tax: round2(ex + tax),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub subtotal_ex_tax: f64,
    pub tax_total: f64,
    pub grand_total: f64,
}

/// Totals over stored line amounts `(ex_tax, inc_tax)`.
pub fn totals(lines: impl IntoIterator<Item = (f64, f64)>) -> Totals {
    let (ex, tax) = lines.into_iter().fold((0.0, 0.0), |(ex, tax), (e, i)| (ex + e, tax + (i - e)));
    Totals { subtotal_ex_tax: round2(ex), tax_total: round2(tax), grand_total: round2(ex + tax) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(q: Option<i32>, p: f64, d: Option<f64>, t: Option<f64>) -> PricedLine {
        PricedLine::from_input(&LineItemInput { label: Some(" Cloud usage ".into()), quantity: q, price: Some(p), discount_pct: d, tax_pct: t, ..Default::default() })
    }

    #[test]
    fn line_amounts() {
        let l = line(Some(2), 100.0, Some(10.0), Some(6.0));
        assert_eq!(l.label, "Cloud usage");
        assert_eq!(l.amount_ex_tax, 180.0);
        assert_eq!(l.amount_inc_tax, 190.8);
    }

    #[test]
    fn inputs_are_clamped() {
        let l = line(Some(0), 10.0, Some(-5.0), Some(-1.0));
        assert_eq!(l.quantity, 1);
        assert_eq!(l.discount_pct, 0.0);
        assert_eq!(l.tax_pct, 0.0);
        assert_eq!(l.amount_inc_tax, 10.0);
        let d = PricedLine::from_input(&LineItemInput::default());
        assert_eq!((d.quantity, d.price, d.amount_ex_tax), (1, 0.0, 0.0));
    }

    #[test]
    fn halves_round_up() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.12);
        assert_eq!(round2(-2.5), -2.5);
        assert!(round2(-0.004).is_sign_positive());
    }

    #[test]
    fn invoice_totals() {
        let t = totals([(180.0, 190.8), (33.33, 33.33)]);
        assert_eq!(t.subtotal_ex_tax, 213.33);
        assert_eq!(t.tax_total, 10.8);
        assert_eq!(t.grand_total, 224.13);
        assert_eq!(totals([]), Totals::default());
    }
}
