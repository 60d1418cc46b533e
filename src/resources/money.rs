//! Line-item money math shared by invoices and quotes.
//!
//! Amounts are stored as REAL and rounded to cents at projection time; the
//! same rounding runs in SQL aggregates (ROUND(x, 2)) so list totals and
//! detail totals agree.

/// Round to two decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Computed totals for one document line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineTotals {
    pub total_ht: f64,
    pub total_vat: f64,
    pub total_ttc: f64,
}

impl LineTotals {
    /// `total_ht` is quantity x unit price, `total_vat` applies the rate as
    /// a percentage, `total_ttc` is their sum; each rounded to cents.
    pub fn compute(quantity: f64, unit_price: f64, vat_rate: f64) -> Self {
        let total_ht = round2(quantity * unit_price);
        let total_vat = round2(quantity * unit_price * vat_rate / 100.0);
        let total_ttc = round2(total_ht + total_vat);
        Self {
            total_ht,
            total_vat,
            total_ttc,
        }
    }
}
