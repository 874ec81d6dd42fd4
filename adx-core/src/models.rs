mod bid;
mod bytes;
mod event;
mod item;

pub use bid::{Acceptance, Bid, BidOffer, BidState, InvalidBidState};
pub use bytes::{Address, ContentId, Report};
pub use event::{BidAccepted, BidCanceled, BidCompleted, BidEvent, BidExpired, BidOpened, BidRewardClaimed};
pub use item::{Item, ItemKind};

/// Token amounts, in the smallest unit of the ledger.
pub type Amount = u128;

macro_rules! new_id {
    ($struct:ident, $doc:literal) => {
        #[doc = $doc]
        #[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize),
            serde(transparent)
        )]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $struct(pub u64);

        impl From<u64> for $struct {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$struct> for u64 {
            fn from(value: $struct) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $struct {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $struct {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

new_id!(
    BidId,
    "Identifies a bid. Ids are assigned densely starting at 1 and never reused."
);
new_id!(AdunitId, "Identifies an ad unit in the registry.");
new_id!(AdslotId, "Identifies an ad slot in the registry.");

/// JSON schema for RFC3339 timestamps, which schemars cannot derive for
/// `time::OffsetDateTime`.
#[cfg(feature = "schemars")]
pub(crate) fn datetime_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "string",
        "format": "date-time",
    })
}
