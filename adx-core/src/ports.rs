mod clock;
mod ledger;
mod registry;

pub use clock::Clock;
pub use ledger::TokenLedger;
pub use registry::Registry;
