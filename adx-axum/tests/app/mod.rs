#![allow(dead_code)]

use adx_core::models::{Address, ContentId, ItemKind};
use adx_exchange::{Application, Exchange, SharedExchange};
use adx_memory::{LedgerCustody, ManualClock, MemoryLedger, MemoryRegistry};
use headers::{Authorization, authorization::Bearer};
use time::macros::datetime;

pub const CUSTODY: Address = Address([0xee; 20]);
pub const ADVERTISER: Address = Address([0x02; 20]);
pub const PUBLISHER: Address = Address([0x03; 20]);
pub const STRANGER: Address = Address([0x04; 20]);
pub const ADV_WALLET: Address = Address([0x08; 20]);
pub const PUB_WALLET: Address = Address([0x07; 20]);
pub const FUNDS: u128 = 10_000_000;

type TestExchange = SharedExchange<MemoryRegistry, LedgerCustody, ManualClock>;

// The bearer token is simply the caller's address, so tests can act as
// anyone without minting credentials.
#[derive(Clone)]
pub struct TestApp {
    pub registry: MemoryRegistry,
    pub ledger: MemoryLedger,
    pub clock: ManualClock,
    pub exchange: TestExchange,
}

impl TestApp {
    /// One advertiser owning ad unit 1 with a funded, approved wallet, and one
    /// publisher owning ad slot 1.
    pub fn new() -> Self {
        let registry = MemoryRegistry::new();
        registry.register(ADVERTISER, "vyperCola", ADV_WALLET, ContentId([0x57; 32]), "{}");
        registry.register(PUBLISHER, "stremio", PUB_WALLET, ContentId([0x57; 32]), "{}");
        registry
            .register_item(ADVERTISER, ItemKind::AdUnit, 0, ContentId([0x48; 32]), "unit", "{}")
            .unwrap();
        registry
            .register_item(PUBLISHER, ItemKind::AdSlot, 0, ContentId([0x49; 32]), "slot", "{}")
            .unwrap();

        let ledger = MemoryLedger::new();
        ledger.mint(&ADV_WALLET, FUNDS).unwrap();
        ledger.approve(&ADV_WALLET, &CUSTODY, FUNDS);

        let clock = ManualClock::new(datetime!(2017-10-01 12:00 UTC));
        let exchange = Exchange::new(
            registry.clone(),
            LedgerCustody::new(ledger.clone(), CUSTODY),
            clock.clone(),
        )
        .into();

        Self {
            registry,
            ledger,
            clock,
            exchange,
        }
    }
}

pub fn token(address: &Address) -> String {
    address.to_string()
}

impl Application for TestApp {
    type Context = Authorization<Bearer>;
    type Registry = MemoryRegistry;
    type Ledger = LedgerCustody;
    type Clock = ManualClock;

    fn exchange(&self) -> &TestExchange {
        &self.exchange
    }

    async fn caller(&self, context: &Self::Context) -> Option<Address> {
        context.token().parse().ok()
    }
}
