use super::{AdslotId, AdunitId};

/// The kinds of items the registry tracks.
///
/// Each kind has its own id space, so ad unit 1 and ad slot 1 are unrelated.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    /// Advertiser-owned demand
    AdUnit,
    /// Publisher-owned supply
    AdSlot,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AdUnit => f.write_str("adunit"),
            Self::AdSlot => f.write_str("adslot"),
        }
    }
}

/// A typed reference to a registry item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Item {
    /// An ad unit
    AdUnit(AdunitId),
    /// An ad slot
    AdSlot(AdslotId),
}

impl Item {
    /// The kind of item referenced
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::AdUnit(_) => ItemKind::AdUnit,
            Self::AdSlot(_) => ItemKind::AdSlot,
        }
    }

    /// The raw id within the kind's id space
    pub fn id(&self) -> u64 {
        match self {
            Self::AdUnit(id) => id.0,
            Self::AdSlot(id) => id.0,
        }
    }

    /// Construct a reference from a kind and a raw id
    pub fn new(kind: ItemKind, id: u64) -> Self {
        match kind {
            ItemKind::AdUnit => Self::AdUnit(AdunitId(id)),
            ItemKind::AdSlot => Self::AdSlot(AdslotId(id)),
        }
    }
}

impl From<AdunitId> for Item {
    fn from(value: AdunitId) -> Self {
        Self::AdUnit(value)
    }
}

impl From<AdslotId> for Item {
    fn from(value: AdslotId) -> Self {
        Self::AdSlot(value)
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}
