use adx_core::{
    models::{AdslotId, AdunitId, Address, BidId, BidState, ContentId, Item},
    ports::Registry,
};
use adx_exchange::{
    Exchange,
    error::{ErrorKind, ExchangeError, Missing},
};
use adx_memory::LedgerCustody;
use rstest::*;
use time::Duration;

mod common;
use common::*;

/// A rejected operation leaves balances and the bid untouched.
fn assert_unchanged(world: &World, bid_id: BidId, state: BidState, custody: u128) {
    assert_eq!(world.exchange.get_bid(bid_id).unwrap().state, state);
    assert_eq!(world.balance(&CUSTODY), custody);
    assert_eq!(world.exchange.total_escrow(), custody);
}

#[rstest]
fn test_cannot_bid_without_account(mut world: World) {
    let err = world
        .exchange
        .place_bid(&STRANGER, offer(REWARD, 0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(world.exchange.bid_count(), 0);
}

#[rstest]
fn test_cannot_bid_without_adunit(mut world: World) {
    let mut missing = offer(REWARD, 0);
    missing.adunit_id = AdunitId(7);
    let err = world.exchange.place_bid(&ADVERTISER, missing).unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::NotFound(Missing::Item(item)) if item.id() == 7
    ));
    assert_eq!(world.exchange.bid_count(), 0);
}

#[rstest]
fn test_cannot_bid_on_others_adunit(mut world: World) {
    let err = world
        .exchange
        .place_bid(&PUBLISHER, offer(REWARD, 0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(world.balance(&CUSTODY), 0);
}

#[rstest]
fn test_cannot_bid_without_allowance(mut world: World) {
    world.ledger.approve(&ADV_WALLET, &CUSTODY, REWARD - 1);
    let err = world
        .exchange
        .place_bid(&ADVERTISER, offer(REWARD, 0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Escrow);
    assert_eq!(world.exchange.bid_count(), 0);
    assert!(
        world
            .exchange
            .get_all_bids_by_adunit(AdunitId(1))
            .is_empty()
    );
    assert_eq!(world.balance(&ADV_WALLET), FUNDS);

    // the failed attempt does not consume an id
    world.ledger.approve(&ADV_WALLET, &CUSTODY, REWARD);
    assert_eq!(world.place(0), BidId(1));
}

#[rstest]
fn test_cannot_bid_beyond_balance(mut world: World) {
    world.ledger.approve(&ADV_WALLET, &CUSTODY, FUNDS + 1);
    let err = world
        .exchange
        .place_bid(&ADVERTISER, offer(FUNDS + 1, 0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Escrow);
    assert_eq!(world.balance(&ADV_WALLET), FUNDS);
}

/// A registry whose item owner never set up a payout wallet.
struct Walletless;

impl Registry for Walletless {
    fn owner_of(&self, _item: Item) -> Option<Address> {
        Some(ADVERTISER)
    }

    fn wallet_of(&self, _account: &Address) -> Option<Address> {
        None
    }

    fn snapshot_of(&self, _item: Item) -> Option<ContentId> {
        Some(ADUNIT_IPFS)
    }
}

#[rstest]
fn test_owner_without_wallet_is_not_found(world: World) {
    let mut exchange = Exchange::new(
        Walletless,
        LedgerCustody::new(world.ledger.clone(), CUSTODY),
        world.clock.clone(),
    );
    let err = exchange.place_bid(&ADVERTISER, offer(REWARD, 0)).unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::NotFound(Missing::Account(ADVERTISER))
    ));
    assert_eq!(exchange.bid_count(), 0);
    assert_eq!(world.balance(&CUSTODY), 0);
}

#[rstest]
fn test_cannot_cancel_others_bid(mut world: World) {
    let bid_id = world.place(0);
    let err = world.exchange.cancel_bid(&PUBLISHER, bid_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_unchanged(&world, bid_id, BidState::Open, REWARD);
}

#[rstest]
#[case::zero(0)]
#[case::past_the_end(2)]
fn test_cannot_cancel_nonexistent(mut world: World, #[case] raw: u64) {
    world.place(0);
    let err = world.exchange.cancel_bid(&ADVERTISER, BidId(raw)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[rstest]
fn test_cannot_cancel_accepted(mut world: World) {
    let bid_id = world.place_and_accept(0);
    let err = world.exchange.cancel_bid(&ADVERTISER, bid_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert_unchanged(&world, bid_id, BidState::Accepted, REWARD);
}

#[rstest]
fn test_cannot_accept_into_others_slot(mut world: World) {
    let bid_id = world.place(0);
    let err = world
        .exchange
        .accept_bid(&STRANGER, bid_id, AdslotId(1), String::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    let err = world
        .exchange
        .accept_bid(&PUBLISHER, bid_id, AdslotId(9), String::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_unchanged(&world, bid_id, BidState::Open, REWARD);
    assert!(world.exchange.get_all_bids_by_adslot(AdslotId(1)).is_empty());
}

#[rstest]
fn test_cannot_accept_twice(mut world: World) {
    let bid_id = world.place_and_accept(0);
    let err = world
        .exchange
        .accept_bid(&PUBLISHER, bid_id, AdslotId(1), String::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert_eq!(world.exchange.get_all_bids_by_adslot(AdslotId(1)), &[bid_id]);
}

#[rstest]
fn test_cannot_accept_canceled(mut world: World) {
    let bid_id = world.place(0);
    world.exchange.cancel_bid(&ADVERTISER, bid_id).unwrap();
    let err = world
        .exchange
        .accept_bid(&PUBLISHER, bid_id, AdslotId(1), String::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert!(world.exchange.get_all_bids_by_adslot(AdslotId(1)).is_empty());
}

#[rstest]
fn test_verify_guards(mut world: World) {
    let open = world.place(0);
    let err = world
        .exchange
        .verify_bid(&ADVERTISER, open, ADV_REPORT)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);

    let bid_id = world.place_and_accept(0);
    let err = world
        .exchange
        .verify_bid(&STRANGER, bid_id, ADV_REPORT)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    world
        .exchange
        .verify_bid(&PUBLISHER, bid_id, PUB_REPORT)
        .unwrap();
    let err = world
        .exchange
        .verify_bid(&PUBLISHER, bid_id, ADV_REPORT)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::AlreadyVerified { .. }));
    assert_eq!(err.kind(), ErrorKind::State);
    assert_eq!(
        world.exchange.get_bid_reports(bid_id).unwrap(),
        (None, Some(PUB_REPORT))
    );
}

#[rstest]
fn test_only_publisher_claims(mut world: World) {
    let bid_id = world.place_and_accept(0);

    let err = world
        .exchange
        .claim_bid_reward(&PUBLISHER, bid_id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);

    world
        .exchange
        .verify_bid(&ADVERTISER, bid_id, ADV_REPORT)
        .unwrap();
    world
        .exchange
        .verify_bid(&PUBLISHER, bid_id, PUB_REPORT)
        .unwrap();

    let err = world
        .exchange
        .claim_bid_reward(&ADVERTISER, bid_id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_unchanged(&world, bid_id, BidState::Completed, REWARD);
}

#[rstest]
fn test_claim_without_publisher_wallet(mut world: World) {
    let bid_id = world.place_and_accept(0);
    world
        .exchange
        .verify_bid(&ADVERTISER, bid_id, ADV_REPORT)
        .unwrap();
    world
        .exchange
        .verify_bid(&PUBLISHER, bid_id, PUB_REPORT)
        .unwrap();

    // the payout wallet is resolved when paying, so a changed wallet is honored
    world
        .registry
        .register(PUBLISHER, "stremio", Address([0x99; 20]), ContentId([0; 32]), "{}");
    world
        .exchange
        .claim_bid_reward(&PUBLISHER, bid_id)
        .unwrap();
    assert_eq!(world.balance(&Address([0x99; 20])), REWARD);
    assert_eq!(world.balance(&PUB_WALLET), 0);
}

#[rstest]
fn test_refund_never_for_open_or_untimed(mut world: World) {
    let open = world.place(300);
    world.clock.advance(Duration::days(365));
    let err = world.exchange.refund_bid(&STRANGER, open).unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::TimeoutNotElapsed { deadline: None, .. }
    ));

    let untimed = world.place_and_accept(0);
    world.clock.advance(Duration::days(365));
    let err = world.exchange.refund_bid(&STRANGER, untimed).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TimeoutNotElapsed);

    assert_unchanged(&world, untimed, BidState::Accepted, 2 * REWARD);
    assert!(world.exchange.refundable_bids().is_empty());
}

#[rstest]
fn test_refund_terminal_is_state_error(mut world: World) {
    let bid_id = world.place(0);
    world.exchange.cancel_bid(&ADVERTISER, bid_id).unwrap();
    let err = world.exchange.refund_bid(&STRANGER, bid_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
}

#[rstest]
fn test_giveup_guards(mut world: World) {
    let open = world.place(0);
    let err = world.exchange.giveup_bid(&PUBLISHER, open).unwrap_err();
    // nobody is the publisher of an open bid
    assert_eq!(err.kind(), ErrorKind::Authorization);

    let bid_id = world.place_and_accept(0);
    let err = world.exchange.giveup_bid(&ADVERTISER, bid_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    world
        .exchange
        .verify_bid(&ADVERTISER, bid_id, ADV_REPORT)
        .unwrap();
    world
        .exchange
        .verify_bid(&PUBLISHER, bid_id, PUB_REPORT)
        .unwrap();
    let err = world.exchange.giveup_bid(&PUBLISHER, bid_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert_unchanged(&world, bid_id, BidState::Completed, 2 * REWARD);
}

#[rstest]
fn test_failed_payout_changes_nothing(mut world: World) {
    let open = world.place(0);
    let given_up = world.place_and_accept(0);
    let timed_out = world.place_and_accept(300);
    let completed = world.place_and_accept(0);
    world
        .exchange
        .verify_bid(&ADVERTISER, completed, ADV_REPORT)
        .unwrap();
    world
        .exchange
        .verify_bid(&PUBLISHER, completed, PUB_REPORT)
        .unwrap();
    world.clock.advance(Duration::seconds(300));

    // custody can no longer cover any payout
    world
        .ledger
        .transfer(&CUSTODY, &STRANGER, 4 * REWARD)
        .unwrap();

    let attempts = [
        (open, world.exchange.cancel_bid(&ADVERTISER, open).map(|_| ())),
        (
            given_up,
            world.exchange.giveup_bid(&PUBLISHER, given_up).map(|_| ()),
        ),
        (
            timed_out,
            world.exchange.refund_bid(&STRANGER, timed_out).map(|_| ()),
        ),
        (
            completed,
            world
                .exchange
                .claim_bid_reward(&PUBLISHER, completed)
                .map(|_| ()),
        ),
    ];
    for (bid_id, result) in attempts {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Escrow, "bid {bid_id}");
    }

    let states = [open, given_up, timed_out, completed]
        .map(|bid_id| world.exchange.get_bid(bid_id).unwrap().state);
    assert_eq!(
        states,
        [
            BidState::Open,
            BidState::Accepted,
            BidState::Accepted,
            BidState::Completed
        ]
    );
    assert_eq!(world.exchange.get_all_bids_by_adunit(AdunitId(1)).len(), 4);
    assert_eq!(world.exchange.get_all_bids_by_adslot(AdslotId(1)).len(), 3);
    assert_eq!(world.exchange.total_escrow(), 4 * REWARD);
    assert_eq!(world.balance(&ADV_WALLET), FUNDS - 4 * REWARD);
    assert_eq!(world.balance(&PUB_WALLET), 0);

    // once custody is refilled the claim goes through, exactly once
    world
        .ledger
        .transfer(&STRANGER, &CUSTODY, 4 * REWARD)
        .unwrap();
    world
        .exchange
        .claim_bid_reward(&PUBLISHER, completed)
        .unwrap();
    let err = world
        .exchange
        .claim_bid_reward(&PUBLISHER, completed)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert_eq!(world.balance(&PUB_WALLET), REWARD);
    assert_eq!(world.balance(&CUSTODY), 3 * REWARD);
}
