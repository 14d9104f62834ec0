// Application layer: validation, taxonomy management and dashboard assembly
// on top of a `LedgerStore`. The aggregation itself lives in `domain::ledger`.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
