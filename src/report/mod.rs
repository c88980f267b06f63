//! Reports over the ledger: the monthly planned versus actual report, the
//! dashboard, per-category totals and the transaction summary.

mod dashboard;
mod endpoint;
mod monthly;
mod period;
mod summary_endpoint;

pub use endpoint::monthly_report_endpoint;
pub use monthly::{MonthlyReport, monthly_report};
pub use summary_endpoint::{
    category_report_endpoint, dashboard_endpoint, transaction_stats_endpoint,
};
