//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The ID of a ledger entry.
pub type TransactionId = DatabaseId;
/// The ID of a recurring rule.
pub type RecurringId = DatabaseId;
/// The ID of a financing agreement.
pub type FinancingId = DatabaseId;
