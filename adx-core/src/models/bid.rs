use super::{AdslotId, AdunitId, Address, Amount, BidId, ContentId, Report};
use thiserror::Error;
use time::OffsetDateTime;

/// The lifecycle state of a bid.
///
/// The discriminants match the ordinal encoding used by earlier clients of the
/// exchange (`Open = 0` through `Claimed = 5`).
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BidState {
    /// Escrow is held, waiting for a publisher
    Open = 0,
    /// A publisher has bound an ad slot; the timeout clock is running
    Accepted = 1,
    /// Withdrawn by the advertiser before acceptance, or given up by the publisher
    Canceled = 2,
    /// Refunded after the timeout elapsed
    Expired = 3,
    /// Both parties attested delivery; the reward awaits the publisher
    Completed = 4,
    /// The reward was paid out to the publisher
    Claimed = 5,
}

impl BidState {
    /// Every state, in ordinal order
    pub const ALL: [BidState; 6] = [
        Self::Open,
        Self::Accepted,
        Self::Canceled,
        Self::Expired,
        Self::Completed,
        Self::Claimed,
    ];

    /// Whether the lifecycle graph has an edge from `self` to `next`.
    pub fn can_transition_to(self, next: BidState) -> bool {
        use BidState::*;
        matches!(
            (self, next),
            (Open, Accepted)
                | (Open, Canceled)
                | (Accepted, Canceled)
                | (Accepted, Expired)
                | (Accepted, Completed)
                | (Completed, Claimed)
        )
    }

    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Canceled | Self::Expired | Self::Claimed)
    }

    /// Whether the exchange still holds the bid's reward in escrow
    pub fn holds_escrow(self) -> bool {
        matches!(self, Self::Open | Self::Accepted | Self::Completed)
    }

    /// The lowercase name of the state
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Accepted => "accepted",
            Self::Canceled => "canceled",
            Self::Expired => "expired",
            Self::Completed => "completed",
            Self::Claimed => "claimed",
        }
    }
}

impl std::fmt::Display for BidState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that does not name a bid state.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid bid state: {0}")]
pub struct InvalidBidState(pub String);

impl std::str::FromStr for BidState {
    type Err = InvalidBidState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| InvalidBidState(s.to_owned()))
    }
}

impl TryFrom<u8> for BidState {
    type Error = InvalidBidState;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| InvalidBidState(value.to_string()))
    }
}

impl From<BidState> for u8 {
    fn from(value: BidState) -> Self {
        value as u8
    }
}

/// The terms an advertiser offers when opening a bid.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidOffer {
    /// The ad unit to advertise; the caller must own it
    pub adunit_id: AdunitId,
    /// Delivery goal, opaque to the exchange
    pub target: u64,
    /// Reward to escrow, pulled from the advertiser's wallet
    pub reward_amount: Amount,
    /// Seconds after acceptance before anyone may refund the bid; 0 disables the timeout
    #[cfg_attr(feature = "serde", serde(default))]
    pub timeout_seconds: u64,
    /// Opaque contact or delivery endpoint of the advertiser
    #[cfg_attr(feature = "serde", serde(default))]
    pub advertiser_peer: String,
}

/// The publisher side of a bid, recorded when the bid is accepted.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acceptance {
    /// The account that accepted the bid (owner of the ad slot)
    pub publisher: Address,
    /// The ad slot the bid is bound to
    pub adslot_id: AdslotId,
    /// The ad slot's content id at the moment of acceptance
    pub adslot_snapshot: ContentId,
    /// Opaque contact or delivery endpoint of the publisher
    pub publisher_peer: String,
    /// When the bid was accepted; the timeout is measured from here
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    #[cfg_attr(feature = "schemars", schemars(schema_with = "super::datetime_schema"))]
    pub accepted_time: OffsetDateTime,
}

/// A bid: an advertiser's escrowed offer to pay `reward_amount` for delivery
/// of an ad unit, and everything that happened to it since.
///
/// Snapshots are copies taken at creation and acceptance. Later changes to the
/// underlying registry items do not reach an existing bid.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bid {
    /// The id of the bid
    pub id: BidId,
    /// Current lifecycle state
    pub state: BidState,
    /// The owner of the ad unit at creation time; escrow is refunded to this account's wallet
    pub advertiser: Address,
    /// The ad unit being advertised
    pub adunit_id: AdunitId,
    /// The ad unit's content id at creation time
    pub adunit_snapshot: ContentId,
    /// Opaque contact or delivery endpoint of the advertiser
    pub advertiser_peer: String,
    /// Advertiser-chosen delivery goal, opaque to the exchange
    pub target: u64,
    /// The escrowed reward
    pub reward_amount: Amount,
    /// Seconds after acceptance before anyone may refund the bid; 0 disables the timeout
    pub timeout_seconds: u64,
    /// The publisher side, once accepted
    pub acceptance: Option<Acceptance>,
    /// The advertiser's attestation, once supplied
    pub adv_report: Option<Report>,
    /// The publisher's attestation, once supplied
    pub pub_report: Option<Report>,
}

impl Bid {
    /// The publisher that accepted the bid, if any
    pub fn publisher(&self) -> Option<&Address> {
        self.acceptance.as_ref().map(|acceptance| &acceptance.publisher)
    }

    /// The ad slot the bid is bound to, if any
    pub fn adslot_id(&self) -> Option<AdslotId> {
        self.acceptance.as_ref().map(|acceptance| acceptance.adslot_id)
    }

    /// When the bid was accepted, if it was
    pub fn accepted_time(&self) -> Option<OffsetDateTime> {
        self.acceptance.as_ref().map(|acceptance| acceptance.accepted_time)
    }

    /// The instant from which the bid may be refunded.
    ///
    /// `None` if the bid was never accepted, has no timeout, or the deadline
    /// is not representable (in which case it never expires).
    pub fn deadline(&self) -> Option<OffsetDateTime> {
        if self.timeout_seconds == 0 {
            return None;
        }
        let timeout = time::Duration::seconds(i64::try_from(self.timeout_seconds).ok()?);
        self.accepted_time()?.checked_add(timeout)
    }

    /// The escrow the exchange holds on behalf of this bid
    pub fn escrow_held(&self) -> Amount {
        if self.state.holds_escrow() {
            self.reward_amount
        } else {
            0
        }
    }
}
