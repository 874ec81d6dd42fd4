use crate::models::{Address, Amount};

/// The external fungible-token ledger, as seen by the exchange.
///
/// The exchange owns a single custody account on the ledger. Wallet owners
/// pre-authorize the exchange to pull funds from them; the exchange pushes
/// funds out of custody on payouts. Each call is atomic: if it fails, no
/// balance or allowance has changed.
pub trait TokenLedger {
    /// Error type for rejected transfers
    type Error: std::error::Error + Send + Sync + 'static;

    /// The address of the exchange's custody account
    fn custody(&self) -> Address;

    /// The current balance of `address`
    fn balance_of(&self, address: &Address) -> Amount;

    /// Move `amount` from `owner` into custody, consuming the allowance
    /// `owner` granted to the exchange.
    fn pull_from(&self, owner: &Address, amount: Amount) -> Result<(), Self::Error>;

    /// Move `amount` out of custody to `recipient`.
    fn push_to(&self, recipient: &Address, amount: Amount) -> Result<(), Self::Error>;
}
