mod ledger;
mod money;
mod period;
mod taxonomy;
mod transaction;

pub use ledger::*;
pub use money::*;
pub use period::*;
pub use taxonomy::*;
pub use transaction::*;
