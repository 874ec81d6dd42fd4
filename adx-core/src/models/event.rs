use super::{AdslotId, AdunitId, Address, Amount, BidId, ContentId, Report};
use time::OffsetDateTime;

/// A bid was created and its reward escrowed.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidOpened {
    /// The new bid
    pub bid_id: BidId,
    /// Owner of the ad unit, who paid the escrow
    pub advertiser: Address,
    /// The ad unit advertised
    pub adunit_id: AdunitId,
    /// The ad unit's content id captured for the bid
    pub adunit_snapshot: ContentId,
    /// Delivery goal
    pub target: u64,
    /// Escrowed reward
    pub reward_amount: Amount,
    /// Timeout in seconds after acceptance, 0 for none
    pub timeout_seconds: u64,
    /// Advertiser endpoint
    pub advertiser_peer: String,
}

/// A bid was canceled by its advertiser or given up by its publisher.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidCanceled {
    /// The canceled bid
    pub bid_id: BidId,
}

/// A publisher bound an ad slot to a bid.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidAccepted {
    /// The accepted bid
    pub bid_id: BidId,
    /// Owner of the ad slot
    pub publisher: Address,
    /// The ad slot
    pub adslot_id: AdslotId,
    /// The ad slot's content id captured for the bid
    pub adslot_snapshot: ContentId,
    /// When the bid was accepted
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    #[cfg_attr(feature = "schemars", schemars(schema_with = "super::datetime_schema"))]
    pub accepted_time: OffsetDateTime,
    /// Publisher endpoint
    pub publisher_peer: String,
}

/// Both parties attested delivery.
///
/// The two reports are recorded as given; they are not required to agree.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidCompleted {
    /// The completed bid
    pub bid_id: BidId,
    /// The publisher's attestation
    pub pub_report: Report,
    /// The advertiser's attestation
    pub adv_report: Report,
}

/// The publisher was paid the reward.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidRewardClaimed {
    /// The claimed bid
    pub bid_id: BidId,
}

/// The bid timed out and the advertiser was refunded.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidExpired {
    /// The expired bid
    pub bid_id: BidId,
}

/// A notification emitted by a successful exchange operation.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "event", rename_all = "snake_case")
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BidEvent {
    /// See [`BidOpened`]
    Opened(BidOpened),
    /// See [`BidCanceled`]
    Canceled(BidCanceled),
    /// See [`BidAccepted`]
    Accepted(BidAccepted),
    /// See [`BidCompleted`]
    Completed(BidCompleted),
    /// See [`BidRewardClaimed`]
    RewardClaimed(BidRewardClaimed),
    /// See [`BidExpired`]
    Expired(BidExpired),
}

impl BidEvent {
    /// The bid the notification is about
    pub fn bid_id(&self) -> BidId {
        match self {
            Self::Opened(event) => event.bid_id,
            Self::Canceled(event) => event.bid_id,
            Self::Accepted(event) => event.bid_id,
            Self::Completed(event) => event.bid_id,
            Self::RewardClaimed(event) => event.bid_id,
            Self::Expired(event) => event.bid_id,
        }
    }

    /// A short, stable name for the notification
    pub fn name(&self) -> &'static str {
        match self {
            Self::Opened(_) => "bid_opened",
            Self::Canceled(_) => "bid_canceled",
            Self::Accepted(_) => "bid_accepted",
            Self::Completed(_) => "bid_completed",
            Self::RewardClaimed(_) => "bid_reward_claimed",
            Self::Expired(_) => "bid_expired",
        }
    }
}

macro_rules! into_event {
    ($struct:ident, $variant:ident) => {
        impl From<$struct> for BidEvent {
            fn from(value: $struct) -> Self {
                Self::$variant(value)
            }
        }
    };
}

into_event!(BidOpened, Opened);
into_event!(BidCanceled, Canceled);
into_event!(BidAccepted, Accepted);
into_event!(BidCompleted, Completed);
into_event!(BidRewardClaimed, RewardClaimed);
into_event!(BidExpired, Expired);
