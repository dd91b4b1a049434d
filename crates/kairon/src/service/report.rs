use crate::{
    db::{
        Db,
        query::{QueryOptions, SortDirection},
    },
    domain::{FinancialReport, Order, OrderStatus},
    error::Error,
    repo::Repository,
    value::Value,
};
use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

/// Orders fetched per page while totalling a report.
pub const REPORT_PAGE_SIZE: usize = 500;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` report boundary.
pub fn parse_report_date(raw: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|err| Error::invalid_input(format!("invalid date '{raw}': {err}")))
}

///
/// ReportService
///

#[derive(Clone)]
pub struct ReportService {
    orders: Repository<Order>,
}

impl ReportService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            orders: Repository::new(db),
        }
    }

    /// Count and sum paid orders created from the start of `start` up to,
    /// but not including, the start of the day after `end` (UTC).
    pub async fn financial_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FinancialReport, Error> {
        if end < start {
            return Err(Error::invalid_input(format!(
                "report ends ({end}) before it starts ({start})"
            )));
        }
        let after = end
            .succ_opt()
            .ok_or_else(|| Error::invalid_input(format!("report end {end} is out of range")))?;
        let window = vec![Value::Int(day_start(start)), Value::Int(day_start(after))];

        let mut total_sales = 0;
        let mut total_sales_income = 0.0;
        let mut offset = 0;
        loop {
            let opts = QueryOptions::new()
                .filter(format!("{}:{}", Order::STATUS, OrderStatus::Paid))
                .range(Order::CREATED, window.clone())
                .order_by(Order::CREATED, Some(SortDirection::Asc))
                .offset(offset)
                .limit(REPORT_PAGE_SIZE);
            let page = self.orders.list(&opts).await?;

            total_sales += page.len();
            total_sales_income += page.iter().map(|order| order.amount).sum::<f64>();

            if page.len() < REPORT_PAGE_SIZE {
                break;
            }
            offset += REPORT_PAGE_SIZE;
        }
        debug!(%start, %end, total_sales, "financial report");

        Ok(FinancialReport {
            start_date: start.format(DATE_FORMAT).to_string(),
            end_date: end.format(DATE_FORMAT).to_string(),
            total_sales,
            total_sales_income,
        })
    }
}

fn day_start(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}
