//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/recurring/{recurring_id}', use [format_endpoint].

/// The route for checking that the server is up.
pub const HEALTH: &str = "/health";

/// The route to list and create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route for the newest transactions.
pub const RECENT_TRANSACTIONS: &str = "/api/transactions/recent";
/// The route for income and expense totals up to today.
pub const TRANSACTION_STATS: &str = "/api/transactions/stats";
/// The route to get, update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to mark a transaction as paid.
pub const PAY_TRANSACTION: &str = "/api/transactions/{transaction_id}/pay";
/// The route to mark a transaction as cancelled.
pub const CANCEL_TRANSACTION: &str = "/api/transactions/{transaction_id}/cancel";

/// The route to list and create recurring rules.
pub const RECURRING_API: &str = "/api/recurring";
/// The route to get, update or delete a single recurring rule.
pub const RECURRING: &str = "/api/recurring/{recurring_id}";
/// The route to activate or deactivate a recurring rule.
pub const TOGGLE_RECURRING: &str = "/api/recurring/{recurring_id}/toggle";

/// The route to list and create financing agreements.
pub const FINANCING_API: &str = "/api/financing";
/// The route for totals across all financing agreements.
pub const FINANCING_STATS: &str = "/api/financing/stats";
/// The route to get, update or delete a single financing agreement.
pub const FINANCING: &str = "/api/financing/{financing_id}";
/// The route for the installment schedule of a financing agreement.
pub const FINANCING_PAYMENTS: &str = "/api/financing/{financing_id}/payments";
/// The route to pay an installment of a financing agreement.
pub const PAY_FINANCING: &str = "/api/financing/{financing_id}/pay";
/// The route to estimate the effect of an early payment.
pub const SIMULATE_EARLY_PAYMENT: &str = "/api/financing/{financing_id}/simulate-early-payment";
/// The route to make an early payment.
pub const EARLY_PAYMENT: &str = "/api/financing/{financing_id}/early-payment";

/// The route for the monthly planned versus actual report.
pub const MONTHLY_REPORT: &str = "/api/reports/monthly";
/// The route for the dashboard totals, chart and recent transactions.
pub const DASHBOARD_REPORT: &str = "/api/reports/dashboard";
/// The route for totals per category and type.
pub const CATEGORY_REPORT: &str = "/api/reports/categories";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/recurring/{recurring_id}', '{recurring_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
