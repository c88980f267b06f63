//! Turns recurring rules and financing agreements into planned ledger entries.
//!
//! [ensure_month] fills in one month for every active obligation and is called
//! before any month-scoped read. [seed_forward] fills in a range of months for
//! a single rule after it is created or edited. Both use the same occurrence
//! logic and the same atomic insert-if-absent, so they never disagree and never
//! create duplicates.

mod ensure_month;
mod occurrence;
mod seed_forward;

pub use ensure_month::ensure_month;
pub use seed_forward::{DEFAULT_MONTHS_AHEAD, seed_forward};
