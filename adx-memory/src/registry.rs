use adx_core::{
    models::{Address, ContentId, Item, ItemKind},
    ports::Registry,
};
use rustc_hash::FxHashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{Level, event};

/// A registered account.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// The account's own address
    pub address: Address,
    /// A display name
    pub name: String,
    /// Where payouts and refunds for this account go
    pub wallet: Address,
    /// Content id of the account's public profile
    pub ipfs: ContentId,
    /// Free-form metadata
    pub meta: String,
}

/// A registered ad unit or ad slot.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    /// Which id space the item lives in
    pub kind: ItemKind,
    /// The item's id within that space
    pub id: u64,
    /// The owning account
    pub owner: Address,
    /// Content id of the item's current description
    pub ipfs: ContentId,
    /// A display name
    pub name: String,
    /// Free-form metadata
    pub meta: String,
}

impl ItemRecord {
    /// The typed reference to this item
    pub fn item(&self) -> Item {
        Item::new(self.kind, self.id)
    }
}

/// Reasons a registry write is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Items can only be registered by accounts
    #[error("{0} has no account")]
    NoAccount(Address),

    /// The item to update does not exist
    #[error("unknown {0}")]
    UnknownItem(Item),

    /// Only the owner can update an item
    #[error("{caller} does not own {item}")]
    NotOwner {
        /// The account attempting the update
        caller: Address,
        /// The item
        item: Item,
    },
}

#[derive(Debug, Default)]
struct RegistryState {
    accounts: FxHashMap<Address, Account>,
    adunits: Vec<ItemRecord>,
    adslots: Vec<ItemRecord>,
}

impl RegistryState {
    fn items(&self, kind: ItemKind) -> &Vec<ItemRecord> {
        match kind {
            ItemKind::AdUnit => &self.adunits,
            ItemKind::AdSlot => &self.adslots,
        }
    }

    fn items_mut(&mut self, kind: ItemKind) -> &mut Vec<ItemRecord> {
        match kind {
            ItemKind::AdUnit => &mut self.adunits,
            ItemKind::AdSlot => &mut self.adslots,
        }
    }

    fn item(&self, item: Item) -> Option<&ItemRecord> {
        let position = usize::try_from(item.id().checked_sub(1)?).ok()?;
        self.items(item.kind()).get(position)
    }
}

/// An in-memory registry of accounts and items.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry(Arc<RwLock<RegistryState>>);

impl MemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&RegistryState) -> T) -> T {
        f(&self.0.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<T>(&self, f: impl FnOnce(&mut RegistryState) -> T) -> T {
        f(&mut self.0.write().unwrap_or_else(PoisonError::into_inner))
    }

    /// Register `address` as an account, or update it if it already is one.
    pub fn register(
        &self,
        address: Address,
        name: impl Into<String>,
        wallet: Address,
        ipfs: ContentId,
        meta: impl Into<String>,
    ) -> Account {
        let account = Account {
            address,
            name: name.into(),
            wallet,
            ipfs,
            meta: meta.into(),
        };
        self.write(|state| state.accounts.insert(address, account.clone()));
        event!(Level::DEBUG, %address, %wallet, "account registered");
        account
    }

    /// Create (`id == 0`) or update (`id != 0`) an item owned by `caller`.
    ///
    /// New items receive the next id in their kind's id space. Updating an
    /// item replaces its content id, name and metadata; bids that already
    /// captured the old content id keep it.
    pub fn register_item(
        &self,
        caller: Address,
        kind: ItemKind,
        id: u64,
        ipfs: ContentId,
        name: impl Into<String>,
        meta: impl Into<String>,
    ) -> Result<ItemRecord, RegistryError> {
        let name = name.into();
        let meta = meta.into();
        let record = self.write(|state| {
            if !state.accounts.contains_key(&caller) {
                return Err(RegistryError::NoAccount(caller));
            }
            let items = state.items_mut(kind);
            if id == 0 {
                let record = ItemRecord {
                    kind,
                    id: items.len() as u64 + 1,
                    owner: caller,
                    ipfs,
                    name,
                    meta,
                };
                items.push(record.clone());
                return Ok(record);
            }

            let item = Item::new(kind, id);
            let record = usize::try_from(id - 1)
                .ok()
                .and_then(|position| items.get_mut(position))
                .ok_or(RegistryError::UnknownItem(item))?;
            if record.owner != caller {
                return Err(RegistryError::NotOwner { caller, item });
            }
            record.ipfs = ipfs;
            record.name = name;
            record.meta = meta;
            Ok(record.clone())
        })?;
        event!(
            Level::DEBUG,
            item = %record.item(),
            owner = %record.owner,
            ipfs = %record.ipfs,
            "item registered"
        );
        Ok(record)
    }

    /// The account registered at `address`
    pub fn account(&self, address: &Address) -> Option<Account> {
        self.read(|state| state.accounts.get(address).cloned())
    }

    /// The current record of `item`
    pub fn item(&self, item: Item) -> Option<ItemRecord> {
        self.read(|state| state.item(item).cloned())
    }
}

impl Registry for MemoryRegistry {
    fn owner_of(&self, item: Item) -> Option<Address> {
        self.read(|state| state.item(item).map(|record| record.owner))
    }

    fn wallet_of(&self, account: &Address) -> Option<Address> {
        self.read(|state| state.accounts.get(account).map(|account| account.wallet))
    }

    fn snapshot_of(&self, item: Item) -> Option<ContentId> {
        self.read(|state| state.item(item).map(|record| record.ipfs))
    }
}
