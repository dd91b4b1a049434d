use serde::{Deserialize, Serialize};

///
/// FinancialReport
/// Sales totals over paid orders in a date window.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct FinancialReport {
    /// `YYYY-MM-DD`, inclusive.
    pub start_date: String,
    /// `YYYY-MM-DD`, inclusive.
    pub end_date: String,
    pub total_sales: usize,
    pub total_sales_income: f64,
}
