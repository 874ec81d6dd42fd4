//! Application implementation with JWT-based authorization.
//!
//! The demo wires the exchange to the in-memory registry and token ledger.
//! Callers are identified by the `sub:` claim of an HS256-signed token, which
//! must hold the caller's address in hex.

use crate::config::ExchangeConfig;
use adx_core::models::Address;
use adx_exchange::{Application, Exchange, SharedExchange};
use adx_memory::{LedgerCustody, MemoryLedger, MemoryRegistry, SystemClock};
use headers::{Authorization, authorization::Bearer};
use jwt_simple::{
    claims::JWTClaims,
    prelude::{HS256Key, MACLike},
};
use serde::{Deserialize, Serialize};

/// The exchange as the demo runs it.
pub type DemoExchange = SharedExchange<MemoryRegistry, LedgerCustody, SystemClock>;

/// Main application implementation combining all system components.
///
/// Clones share the registry, the ledger and the exchange.
#[derive(Clone)]
pub struct DemoApp {
    /// HMAC key for JWT token verification
    pub key: HS256Key,
    /// Accounts and items
    pub registry: MemoryRegistry,
    /// Token balances and allowances
    pub ledger: MemoryLedger,
    /// The ledger account holding escrow
    pub custody: Address,
    /// The exchange itself
    pub exchange: DemoExchange,
}

impl DemoApp {
    /// Create an application with an empty registry and ledger.
    pub fn new(key: HS256Key, config: &ExchangeConfig) -> Self {
        let registry = MemoryRegistry::new();
        let ledger = MemoryLedger::new();
        let exchange = Exchange::with_event_capacity(
            registry.clone(),
            LedgerCustody::new(ledger.clone(), config.custody),
            SystemClock,
            config.event_capacity,
        )
        .into();

        Self {
            key,
            registry,
            ledger,
            custody: config.custody,
            exchange,
        }
    }

    /// Extract and verify JWT claims from the authorization header.
    fn claims(&self, context: &Authorization<Bearer>) -> Option<JWTClaims<CustomJWTClaims>> {
        let token = context.0.token();
        self.key.verify_token::<CustomJWTClaims>(token, None).ok()
    }

    /// The address in the token's `sub:` claim.
    pub fn subject(&self, context: &Authorization<Bearer>) -> Option<Address> {
        self.claims(context)?.subject?.parse().ok()
    }

    /// Whether the token carries an `admin: true` custom claim.
    pub fn is_admin(&self, context: &Authorization<Bearer>) -> bool {
        self.claims(context)
            .map(|claims| claims.custom.admin)
            .unwrap_or(false)
    }
}

impl Application for DemoApp {
    type Context = Authorization<Bearer>;
    type Registry = MemoryRegistry;
    type Ledger = LedgerCustody;
    type Clock = SystemClock;

    fn exchange(&self) -> &DemoExchange {
        &self.exchange
    }

    async fn caller(&self, context: &Self::Context) -> Option<Address> {
        self.subject(context)
    }
}

/// Custom claims structure for JWT tokens.
///
/// Contains application-specific claims beyond standard JWT claims.
#[derive(Serialize, Deserialize)]
pub struct CustomJWTClaims {
    /// Indicates whether the token holder may mint tokens.
    #[serde(default)]
    pub admin: bool,
}
