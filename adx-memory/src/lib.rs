#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod clock;
mod ledger;
mod registry;

pub use clock::{ManualClock, SystemClock};
pub use ledger::{LedgerCustody, LedgerError, MemoryLedger};
pub use registry::{Account, ItemRecord, MemoryRegistry, RegistryError};
