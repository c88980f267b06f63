//! The daily auto-pay sweep: planned transactions become paid once their date
//! has arrived.

mod scheduler;
mod sweep;

pub use scheduler::{AutoPayConfig, AutoPayScheduler};
pub use sweep::sweep_due_transactions;
