use crate::{
    book::BidBook,
    error::{ExchangeError, ExchangeResult, Missing, Role},
    escrow,
    notify::{DEFAULT_EVENT_CAPACITY, Notifier},
};
use adx_core::{
    models::{
        Acceptance, AdslotId, Address, Bid, BidAccepted, BidCanceled, BidCompleted, BidEvent,
        BidExpired, BidId, BidOffer, BidOpened, BidRewardClaimed, BidState, Item, Report,
    },
    ports::{Clock, Registry, TokenLedger},
};
use tokio::sync::broadcast;
use tracing::{Level, event};

/// The bid exchange.
///
/// The exchange owns every [`Bid`] and the per-item indices over them. It
/// consults the [`Registry`] to decide who may act, the [`Clock`] to evaluate
/// timeouts, and instructs the [`TokenLedger`] to move escrow in and out of
/// its custody account.
///
/// Mutating operations take `&mut self`, so they are applied one at a time in
/// the order they are issued.
pub struct Exchange<R, L, C> {
    pub(crate) registry: R,
    pub(crate) ledger: L,
    pub(crate) clock: C,
    pub(crate) book: BidBook,
    pub(crate) notifier: Notifier,
}

impl<R: Registry, L: TokenLedger, C: Clock> Exchange<R, L, C> {
    /// Create an empty exchange over the given collaborators.
    pub fn new(registry: R, ledger: L, clock: C) -> Self {
        Self::with_event_capacity(registry, ledger, clock, DEFAULT_EVENT_CAPACITY)
    }

    /// Create an empty exchange whose notification channel buffers `capacity` events.
    pub fn with_event_capacity(registry: R, ledger: L, clock: C, capacity: usize) -> Self {
        Self {
            registry,
            ledger,
            clock,
            book: BidBook::default(),
            notifier: Notifier::new(capacity),
        }
    }

    /// Receive every notification published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<BidEvent> {
        self.notifier.subscribe()
    }

    /// The registry the exchange consults
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// The ledger holding the exchange's custody account
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The clock used for timeouts
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Open a bid on an ad unit the caller owns, escrowing the reward.
    ///
    /// The reward is pulled from the payout wallet of the ad unit's owner. If
    /// the pull fails, no bid is created.
    pub fn place_bid(&mut self, caller: &Address, offer: BidOffer) -> ExchangeResult<BidOpened> {
        let result = self.try_place_bid(caller, offer);
        rejected("place", None, result)
    }

    fn try_place_bid(&mut self, caller: &Address, offer: BidOffer) -> ExchangeResult<BidOpened> {
        let item = Item::AdUnit(offer.adunit_id);
        let advertiser = self
            .registry
            .owner_of(item)
            .ok_or(ExchangeError::NotFound(Missing::Item(item)))?;
        if advertiser != *caller {
            return Err(ExchangeError::Unauthorized {
                caller: *caller,
                required: Role::ItemOwner,
                subject: item.to_string(),
            });
        }
        let wallet = escrow::wallet(&self.registry, &advertiser)?;
        let adunit_snapshot = self
            .registry
            .snapshot_of(item)
            .ok_or(ExchangeError::NotFound(Missing::Item(item)))?;

        let bid_id = self.book.next_id();
        escrow::collect(&self.ledger, &wallet, offer.reward_amount, bid_id)?;

        let bid = self.book.insert(Bid {
            id: bid_id,
            state: BidState::Open,
            advertiser,
            adunit_id: offer.adunit_id,
            adunit_snapshot,
            advertiser_peer: offer.advertiser_peer,
            target: offer.target,
            reward_amount: offer.reward_amount,
            timeout_seconds: offer.timeout_seconds,
            acceptance: None,
            adv_report: None,
            pub_report: None,
        });

        event!(
            Level::INFO,
            %bid_id,
            %advertiser,
            adunit_id = %bid.adunit_id,
            reward_amount = bid.reward_amount,
            "bid opened"
        );

        let opened = BidOpened {
            bid_id,
            advertiser,
            adunit_id: bid.adunit_id,
            adunit_snapshot: bid.adunit_snapshot,
            target: bid.target,
            reward_amount: bid.reward_amount,
            timeout_seconds: bid.timeout_seconds,
            advertiser_peer: bid.advertiser_peer.clone(),
        };
        self.notifier.publish(opened.clone());
        Ok(opened)
    }

    /// Withdraw an open bid and refund the advertiser.
    pub fn cancel_bid(&mut self, caller: &Address, bid_id: BidId) -> ExchangeResult<BidCanceled> {
        let result = self.try_cancel_bid(caller, bid_id);
        rejected("cancel", Some(bid_id), result)
    }

    fn try_cancel_bid(&mut self, caller: &Address, bid_id: BidId) -> ExchangeResult<BidCanceled> {
        let bid = self.bid(bid_id)?;
        require_advertiser(bid, caller)?;
        require_state(bid, BidState::Open, "cancel")?;

        self.refund_advertiser(bid_id)?;
        self.transition(bid_id, BidState::Canceled);

        let canceled = BidCanceled { bid_id };
        self.notifier.publish(canceled.clone());
        Ok(canceled)
    }

    /// Bind an ad slot the caller owns to an open bid, starting its timeout clock.
    pub fn accept_bid(
        &mut self,
        caller: &Address,
        bid_id: BidId,
        adslot_id: AdslotId,
        publisher_peer: String,
    ) -> ExchangeResult<BidAccepted> {
        let result = self.try_accept_bid(caller, bid_id, adslot_id, publisher_peer);
        rejected("accept", Some(bid_id), result)
    }

    fn try_accept_bid(
        &mut self,
        caller: &Address,
        bid_id: BidId,
        adslot_id: AdslotId,
        publisher_peer: String,
    ) -> ExchangeResult<BidAccepted> {
        let bid = self.bid(bid_id)?;
        let item = Item::AdSlot(adslot_id);
        let publisher = self
            .registry
            .owner_of(item)
            .ok_or(ExchangeError::NotFound(Missing::Item(item)))?;
        if publisher != *caller {
            return Err(ExchangeError::Unauthorized {
                caller: *caller,
                required: Role::ItemOwner,
                subject: item.to_string(),
            });
        }
        require_state(bid, BidState::Open, "accept")?;
        let adslot_snapshot = self
            .registry
            .snapshot_of(item)
            .ok_or(ExchangeError::NotFound(Missing::Item(item)))?;
        let accepted_time = self.clock.now();

        let acceptance = Acceptance {
            publisher,
            adslot_id,
            adslot_snapshot,
            publisher_peer,
            accepted_time,
        };
        let accepted = BidAccepted {
            bid_id,
            publisher,
            adslot_id,
            adslot_snapshot,
            accepted_time,
            publisher_peer: acceptance.publisher_peer.clone(),
        };

        if let Some(bid) = self.book.get_mut(bid_id) {
            bid.acceptance = Some(acceptance);
        }
        self.book.bind_adslot(adslot_id, bid_id);
        self.transition(bid_id, BidState::Accepted);

        self.notifier.publish(accepted.clone());
        Ok(accepted)
    }

    /// Attach the caller's attestation to an accepted bid.
    ///
    /// The advertiser and the publisher each verify once, in either order. The
    /// call that supplies the second report completes the bid and returns the
    /// completion notice; the reports are not compared.
    pub fn verify_bid(
        &mut self,
        caller: &Address,
        bid_id: BidId,
        report: Report,
    ) -> ExchangeResult<Option<BidCompleted>> {
        let result = self.try_verify_bid(caller, bid_id, report);
        rejected("verify", Some(bid_id), result)
    }

    fn try_verify_bid(
        &mut self,
        caller: &Address,
        bid_id: BidId,
        report: Report,
    ) -> ExchangeResult<Option<BidCompleted>> {
        let bid = self.bid(bid_id)?;
        let is_advertiser = bid.advertiser == *caller;
        let is_publisher = bid.publisher() == Some(caller);
        if !is_advertiser && !is_publisher {
            return Err(ExchangeError::Unauthorized {
                caller: *caller,
                required: Role::Party,
                subject: format!("bid {bid_id}"),
            });
        }
        require_state(bid, BidState::Accepted, "verify")?;

        // An account on both sides of its own bid fills the advertiser slot first.
        let role = if is_advertiser && bid.adv_report.is_none() {
            Role::Advertiser
        } else if is_publisher && bid.pub_report.is_none() {
            Role::Publisher
        } else {
            let role = if is_publisher {
                Role::Publisher
            } else {
                Role::Advertiser
            };
            return Err(ExchangeError::AlreadyVerified { bid_id, role });
        };

        let Some(bid) = self.book.get_mut(bid_id) else {
            return Err(ExchangeError::NotFound(Missing::Bid(bid_id)));
        };
        match role {
            Role::Advertiser => bid.adv_report = Some(report),
            _ => bid.pub_report = Some(report),
        }
        event!(Level::INFO, %bid_id, %role, %report, "bid verified");

        let (Some(adv_report), Some(pub_report)) = (bid.adv_report, bid.pub_report) else {
            return Ok(None);
        };
        self.transition(bid_id, BidState::Completed);

        let completed = BidCompleted {
            bid_id,
            pub_report,
            adv_report,
        };
        self.notifier.publish(completed.clone());
        Ok(Some(completed))
    }

    /// Pay the escrowed reward of a completed bid to the publisher's wallet.
    pub fn claim_bid_reward(
        &mut self,
        caller: &Address,
        bid_id: BidId,
    ) -> ExchangeResult<BidRewardClaimed> {
        let result = self.try_claim_bid_reward(caller, bid_id);
        rejected("claim", Some(bid_id), result)
    }

    fn try_claim_bid_reward(
        &mut self,
        caller: &Address,
        bid_id: BidId,
    ) -> ExchangeResult<BidRewardClaimed> {
        let bid = self.bid(bid_id)?;
        require_publisher(bid, caller)?;
        require_state(bid, BidState::Completed, "claim")?;

        let wallet = escrow::wallet(&self.registry, caller)?;
        escrow::release(&self.ledger, &wallet, bid.reward_amount, bid_id)?;
        self.transition(bid_id, BidState::Claimed);

        let claimed = BidRewardClaimed { bid_id };
        self.notifier.publish(claimed.clone());
        Ok(claimed)
    }

    /// Refund an accepted bid whose timeout has elapsed. Anyone may call this.
    ///
    /// Open bids and bids without a timeout never become refundable this way.
    pub fn refund_bid(&mut self, caller: &Address, bid_id: BidId) -> ExchangeResult<BidExpired> {
        let result = self.try_refund_bid(caller, bid_id);
        rejected("refund", Some(bid_id), result)
    }

    fn try_refund_bid(&mut self, caller: &Address, bid_id: BidId) -> ExchangeResult<BidExpired> {
        let bid = self.bid(bid_id)?;
        match bid.state {
            BidState::Open | BidState::Accepted => {}
            state => {
                return Err(ExchangeError::InvalidState {
                    bid_id,
                    state,
                    operation: "refund",
                });
            }
        }
        let deadline = bid.deadline();
        match deadline {
            Some(deadline) if self.clock.now() >= deadline => {}
            _ => return Err(ExchangeError::TimeoutNotElapsed { bid_id, deadline }),
        }

        self.refund_advertiser(bid_id)?;
        self.transition(bid_id, BidState::Expired);
        event!(Level::DEBUG, %bid_id, %caller, "refund triggered");

        let expired = BidExpired { bid_id };
        self.notifier.publish(expired.clone());
        Ok(expired)
    }

    /// Release an accepted bid as its publisher, refunding the advertiser.
    pub fn giveup_bid(&mut self, caller: &Address, bid_id: BidId) -> ExchangeResult<BidCanceled> {
        let result = self.try_giveup_bid(caller, bid_id);
        rejected("give up", Some(bid_id), result)
    }

    fn try_giveup_bid(&mut self, caller: &Address, bid_id: BidId) -> ExchangeResult<BidCanceled> {
        let bid = self.bid(bid_id)?;
        require_publisher(bid, caller)?;
        require_state(bid, BidState::Accepted, "give up")?;

        self.refund_advertiser(bid_id)?;
        self.transition(bid_id, BidState::Canceled);

        let canceled = BidCanceled { bid_id };
        self.notifier.publish(canceled.clone());
        Ok(canceled)
    }

    /// Look up a bid or fail with `NotFound`.
    pub(crate) fn bid(&self, bid_id: BidId) -> ExchangeResult<&Bid> {
        self.book
            .get(bid_id)
            .ok_or(ExchangeError::NotFound(Missing::Bid(bid_id)))
    }

    /// Push the full escrow of `bid_id` back to its advertiser's wallet.
    fn refund_advertiser(&self, bid_id: BidId) -> ExchangeResult<()> {
        let bid = self.bid(bid_id)?;
        let wallet = escrow::wallet(&self.registry, &bid.advertiser)?;
        escrow::release(&self.ledger, &wallet, bid.reward_amount, bid_id)
    }

    /// Move a bid along an edge of the lifecycle graph.
    ///
    /// Guards have already been evaluated; this only commits.
    fn transition(&mut self, bid_id: BidId, next: BidState) {
        if let Some(bid) = self.book.get_mut(bid_id) {
            let previous = bid.state;
            debug_assert!(
                previous.can_transition_to(next),
                "illegal transition {previous} -> {next}"
            );
            bid.state = next;
            event!(Level::INFO, %bid_id, from = %previous, to = %next, "bid transition");
        }
    }
}

fn require_state(bid: &Bid, expected: BidState, operation: &'static str) -> ExchangeResult<()> {
    if bid.state == expected {
        Ok(())
    } else {
        Err(ExchangeError::InvalidState {
            bid_id: bid.id,
            state: bid.state,
            operation,
        })
    }
}

fn require_advertiser(bid: &Bid, caller: &Address) -> ExchangeResult<()> {
    if bid.advertiser == *caller {
        Ok(())
    } else {
        Err(ExchangeError::Unauthorized {
            caller: *caller,
            required: Role::Advertiser,
            subject: format!("bid {}", bid.id),
        })
    }
}

fn require_publisher(bid: &Bid, caller: &Address) -> ExchangeResult<()> {
    if bid.publisher() == Some(caller) {
        Ok(())
    } else {
        Err(ExchangeError::Unauthorized {
            caller: *caller,
            required: Role::Publisher,
            subject: format!("bid {}", bid.id),
        })
    }
}

/// Log a rejected operation and pass the result through.
fn rejected<T>(
    operation: &'static str,
    bid_id: Option<BidId>,
    result: ExchangeResult<T>,
) -> ExchangeResult<T> {
    if let Err(err) = &result {
        event!(
            Level::WARN,
            operation,
            bid_id = bid_id.map(|id| id.0),
            kind = ?err.kind(),
            err = err.to_string(),
            "operation rejected"
        );
    }
    result
}
