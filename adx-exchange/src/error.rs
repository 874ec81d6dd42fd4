//! Why an exchange operation was rejected.
//!
//! Every rejection is an [`ExchangeError`]; [`ExchangeError::kind`] folds it
//! into one of the five [`ErrorKind`] categories callers usually branch on.

use adx_core::models::{Address, BidId, BidState, Item};
use thiserror::Error;
use time::OffsetDateTime;

/// The role a caller must hold to perform an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Owner of the ad unit or ad slot involved
    ItemOwner,
    /// The advertiser of the bid
    Advertiser,
    /// The publisher of the bid
    Publisher,
    /// Either party of the bid
    Party,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ItemOwner => "item owner",
            Self::Advertiser => "advertiser",
            Self::Publisher => "publisher",
            Self::Party => "advertiser or publisher",
        })
    }
}

/// Something an operation referenced that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// No bid with this id
    Bid(BidId),
    /// No ad unit or ad slot with this id
    Item(Item),
    /// The account is not registered (no payout wallet)
    Account(Address),
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bid(bid_id) => write!(f, "bid {bid_id}"),
            Self::Item(item) => write!(f, "{item}"),
            Self::Account(address) => write!(f, "account {address}"),
        }
    }
}

/// The broad category of an [`ExchangeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller is not the party the operation requires
    Authorization,
    /// A referenced bid, item or account does not exist
    NotFound,
    /// The bid is not in a state that permits the operation
    State,
    /// The bid cannot be refunded yet (or ever)
    TimeoutNotElapsed,
    /// The ledger rejected a pull or push
    Escrow,
}

/// Reasons an exchange operation is rejected.
///
/// A rejected operation has no effect: no bid, index or balance changed.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Caller is not the party the operation requires
    #[error("{caller} is not the {required} for {subject}")]
    Unauthorized {
        /// Who attempted the operation
        caller: Address,
        /// The role the operation requires
        required: Role,
        /// The bid or item the role is about
        subject: String,
    },

    /// A referenced bid, item or account does not exist
    #[error("unknown {0}")]
    NotFound(Missing),

    /// The bid is in the wrong state for the operation
    #[error("cannot {operation} bid {bid_id} while it is {state}")]
    InvalidState {
        /// The bid
        bid_id: BidId,
        /// Its current state
        state: BidState,
        /// What was attempted
        operation: &'static str,
    },

    /// The caller already supplied their attestation for this bid
    #[error("the {role} already verified bid {bid_id}")]
    AlreadyVerified {
        /// The bid
        bid_id: BidId,
        /// The side whose report is already present
        role: Role,
    },

    /// The bid has no reachable refund deadline yet
    #[error("bid {bid_id} cannot be refunded {}", refund_window(.deadline))]
    TimeoutNotElapsed {
        /// The bid
        bid_id: BidId,
        /// When the refund becomes possible, if a timeout is running
        deadline: Option<OffsetDateTime>,
    },

    /// The ledger refused to move the escrow
    #[error("escrow transfer for {subject} failed: {source}")]
    Escrow {
        /// The bid (or offer) the transfer was for
        subject: String,
        /// The ledger's reason
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

fn refund_window(deadline: &Option<OffsetDateTime>) -> String {
    match deadline {
        Some(deadline) => format!("before {deadline}"),
        None => "without a running timeout".to_owned(),
    }
}

impl ExchangeError {
    /// The category of the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidState { .. } | Self::AlreadyVerified { .. } => ErrorKind::State,
            Self::TimeoutNotElapsed { .. } => ErrorKind::TimeoutNotElapsed,
            Self::Escrow { .. } => ErrorKind::Escrow,
        }
    }
}

/// Result alias for exchange operations
pub type ExchangeResult<T> = Result<T, ExchangeError>;
