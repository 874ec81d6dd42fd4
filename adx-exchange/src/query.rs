use crate::{Exchange, error::ExchangeResult};
use adx_core::{
    models::{AdslotId, AdunitId, Amount, Bid, BidId, BidState, Report},
    ports::{Clock, Registry, TokenLedger},
};

/// Read-only views over the exchange. None of these touch the ledger or the
/// registry.
impl<R: Registry, L: TokenLedger, C: Clock> Exchange<R, L, C> {
    /// The full record of a bid
    pub fn get_bid(&self, bid_id: BidId) -> ExchangeResult<&Bid> {
        self.bid(bid_id)
    }

    /// The advertiser's and the publisher's attestation, in that order
    pub fn get_bid_reports(
        &self,
        bid_id: BidId,
    ) -> ExchangeResult<(Option<Report>, Option<Report>)> {
        let bid = self.bid(bid_id)?;
        Ok((bid.adv_report, bid.pub_report))
    }

    /// Every bid ever placed on `adunit_id`, in creation order
    pub fn get_all_bids_by_adunit(&self, adunit_id: AdunitId) -> &[BidId] {
        self.book.by_adunit(adunit_id)
    }

    /// Every bid ever accepted into `adslot_id`, in acceptance order
    pub fn get_all_bids_by_adslot(&self, adslot_id: AdslotId) -> &[BidId] {
        self.book.by_adslot(adslot_id)
    }

    /// The bids on `adunit_id` currently in `state`, in creation order
    pub fn get_bids_by_adunit(&self, adunit_id: AdunitId, state: BidState) -> Vec<BidId> {
        self.book.filter(self.book.by_adunit(adunit_id), state)
    }

    /// The bids in `adslot_id` currently in `state`, in acceptance order
    pub fn get_bids_by_adslot(&self, adslot_id: AdslotId, state: BidState) -> Vec<BidId> {
        self.book.filter(self.book.by_adslot(adslot_id), state)
    }

    /// How much of the custody balance belongs to `bid_id`
    pub fn escrow_held(&self, bid_id: BidId) -> ExchangeResult<Amount> {
        Ok(self.bid(bid_id)?.escrow_held())
    }

    /// The sum of all escrow the exchange should be holding.
    ///
    /// Matches the custody balance on the ledger as long as nobody else
    /// transfers into the custody account.
    pub fn total_escrow(&self) -> Amount {
        self.book.iter().map(Bid::escrow_held).sum()
    }

    /// Number of bids ever placed
    pub fn bid_count(&self) -> usize {
        self.book.len()
    }

    /// The accepted bids whose timeout has elapsed at the current time
    pub fn refundable_bids(&self) -> Vec<BidId> {
        let now = self.clock.now();
        self.book
            .iter()
            .filter(|bid| bid.state == BidState::Accepted)
            .filter(|bid| bid.deadline().is_some_and(|deadline| now >= deadline))
            .map(|bid| bid.id)
            .collect()
    }
}
