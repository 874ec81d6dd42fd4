use crate::models::{Address, ContentId, Item};

/// Read-only view of the identity and item registry.
///
/// The exchange consults the registry to decide who may act on an item and
/// where payouts go. It never mutates the registry and never holds on to a
/// live reference: whatever it needs to keep (content snapshots) it copies.
pub trait Registry {
    /// The account owning `item`, or `None` if no such item is registered.
    fn owner_of(&self, item: Item) -> Option<Address>;

    /// The payout wallet of a registered account, or `None` if the account is unknown.
    fn wallet_of(&self, account: &Address) -> Option<Address>;

    /// The current content identifier of `item`, or `None` if no such item is registered.
    fn snapshot_of(&self, item: Item) -> Option<ContentId>;
}
