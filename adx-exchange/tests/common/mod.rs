#![allow(dead_code)]

use adx_core::models::{
    AdslotId, AdunitId, Address, BidId, BidOffer, ContentId, ItemKind, Report,
};
use adx_exchange::Exchange;
use adx_memory::{LedgerCustody, ManualClock, MemoryLedger, MemoryRegistry};
use rstest::fixture;
use time::macros::datetime;

pub const CUSTODY: Address = Address([0xee; 20]);
pub const ADVERTISER: Address = Address([0x02; 20]);
pub const PUBLISHER: Address = Address([0x03; 20]);
pub const STRANGER: Address = Address([0x04; 20]);
pub const ADV_WALLET: Address = Address([0x08; 20]);
pub const PUB_WALLET: Address = Address([0x07; 20]);

pub const ADUNIT_IPFS: ContentId = ContentId([0x48; 32]);
pub const ADSLOT_IPFS: ContentId = ContentId([0x49; 32]);

pub const ADV_REPORT: Report = Report([0x33; 32]);
pub const PUB_REPORT: Report = Report([0x34; 32]);

pub const FUNDS: u128 = 10_000_000;
pub const REWARD: u128 = 500_000;

pub type TestExchange = Exchange<MemoryRegistry, LedgerCustody, ManualClock>;

/// An exchange with one advertiser owning ad unit 1 and one publisher owning
/// ad slot 1. The advertiser's wallet is funded and has authorized the
/// custody account to pull all of it.
pub struct World {
    pub registry: MemoryRegistry,
    pub ledger: MemoryLedger,
    pub clock: ManualClock,
    pub exchange: TestExchange,
}

impl World {
    pub fn balance(&self, address: &Address) -> u128 {
        self.ledger.balance_of(address)
    }

    /// Place the standard bid on ad unit 1.
    pub fn place(&mut self, timeout_seconds: u64) -> BidId {
        self.exchange
            .place_bid(&ADVERTISER, offer(REWARD, timeout_seconds))
            .unwrap()
            .bid_id
    }

    /// Place the standard bid and accept it into ad slot 1.
    pub fn place_and_accept(&mut self, timeout_seconds: u64) -> BidId {
        let bid_id = self.place(timeout_seconds);
        self.exchange
            .accept_bid(&PUBLISHER, bid_id, AdslotId(1), "https://publisher.com/peer".into())
            .unwrap();
        bid_id
    }
}

pub fn offer(reward_amount: u128, timeout_seconds: u64) -> BidOffer {
    BidOffer {
        adunit_id: AdunitId(1),
        target: 1000,
        reward_amount,
        timeout_seconds,
        advertiser_peer: "https://advertiser.com/peer".into(),
    }
}

#[fixture]
pub fn world() -> World {
    let registry = MemoryRegistry::new();
    registry.register(ADVERTISER, "vyperCola", ADV_WALLET, ContentId([0x57; 32]), "{}");
    registry.register(PUBLISHER, "stremio", PUB_WALLET, ContentId([0x57; 32]), "{}");
    registry
        .register_item(ADVERTISER, ItemKind::AdUnit, 0, ADUNIT_IPFS, "foobar ad unit", "{}")
        .unwrap();
    registry
        .register_item(PUBLISHER, ItemKind::AdSlot, 0, ADSLOT_IPFS, "foobar ad slot", "{}")
        .unwrap();

    let ledger = MemoryLedger::new();
    ledger.mint(&ADV_WALLET, FUNDS).unwrap();
    ledger.approve(&ADV_WALLET, &CUSTODY, FUNDS);

    let clock = ManualClock::new(datetime!(2017-10-01 12:00 UTC));
    let exchange = Exchange::new(
        registry.clone(),
        LedgerCustody::new(ledger.clone(), CUSTODY),
        clock.clone(),
    );

    World {
        registry,
        ledger,
        clock,
        exchange,
    }
}
