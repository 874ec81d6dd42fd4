use adx_core::{
    models::Address,
    ports::{Clock, Registry, TokenLedger},
};
use adx_exchange::SharedExchange;
use tracing::{Level, event};

/// Refund every accepted bid whose timeout has elapsed, acting as `keeper`.
///
/// Returns how many bids were refunded. A bid that cannot be refunded (for
/// example because a ledger call fails) is logged and skipped, and will be
/// retried on the next sweep.
pub fn sweep<R: Registry, L: TokenLedger, C: Clock>(
    exchange: &SharedExchange<R, L, C>,
    keeper: &Address,
) -> usize {
    let mut exchange = exchange.lock();
    let mut refunded = 0;
    for bid_id in exchange.refundable_bids() {
        match exchange.refund_bid(keeper, bid_id) {
            Ok(_) => refunded += 1,
            Err(err) => {
                event!(Level::ERROR, %bid_id, err = err.to_string(), "sweep could not refund bid")
            }
        }
    }
    if refunded > 0 {
        event!(Level::INFO, refunded, "swept timed-out bids");
    }
    refunded
}

#[cfg(test)]
mod tests {
    use super::*;
    use adx_core::models::{AdslotId, AdunitId, BidOffer, BidState, ContentId, ItemKind};
    use adx_exchange::Exchange;
    use adx_memory::{LedgerCustody, ManualClock, MemoryLedger, MemoryRegistry};
    use time::{Duration, macros::datetime};

    const CUSTODY: Address = Address([0xee; 20]);
    const ADVERTISER: Address = Address([0x02; 20]);
    const PUBLISHER: Address = Address([0x03; 20]);

    #[test]
    fn test_sweep_refunds_only_elapsed_bids() {
        let registry = MemoryRegistry::new();
        registry.register(ADVERTISER, "adv", ADVERTISER, ContentId([0; 32]), "");
        registry.register(PUBLISHER, "pub", PUBLISHER, ContentId([0; 32]), "");
        registry
            .register_item(ADVERTISER, ItemKind::AdUnit, 0, ContentId([1; 32]), "", "")
            .unwrap();
        registry
            .register_item(PUBLISHER, ItemKind::AdSlot, 0, ContentId([2; 32]), "", "")
            .unwrap();
        let ledger = MemoryLedger::new();
        ledger.mint(&ADVERTISER, 300).unwrap();
        ledger.approve(&ADVERTISER, &CUSTODY, 300);
        let clock = ManualClock::new(datetime!(2017-10-01 12:00 UTC));
        let exchange: SharedExchange<_, _, _> = Exchange::new(
            registry,
            LedgerCustody::new(ledger.clone(), CUSTODY),
            clock.clone(),
        )
        .into();

        let mut ids = Vec::new();
        for timeout_seconds in [60, 600, 0] {
            let mut exchange = exchange.lock();
            let bid_id = exchange
                .place_bid(
                    &ADVERTISER,
                    BidOffer {
                        adunit_id: AdunitId(1),
                        target: 1,
                        reward_amount: 100,
                        timeout_seconds,
                        advertiser_peer: String::new(),
                    },
                )
                .unwrap()
                .bid_id;
            exchange
                .accept_bid(&PUBLISHER, bid_id, AdslotId(1), String::new())
                .unwrap();
            ids.push(bid_id);
        }

        assert_eq!(sweep(&exchange, &CUSTODY), 0);

        clock.advance(Duration::minutes(5));
        assert_eq!(sweep(&exchange, &CUSTODY), 1);
        assert_eq!(ledger.balance_of(&ADVERTISER), 100);

        let exchange = exchange.lock();
        assert_eq!(exchange.get_bid(ids[0]).unwrap().state, BidState::Expired);
        assert_eq!(exchange.get_bid(ids[1]).unwrap().state, BidState::Accepted);
        assert_eq!(exchange.get_bid(ids[2]).unwrap().state, BidState::Accepted);
    }
}
