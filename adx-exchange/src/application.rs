use crate::SharedExchange;
use adx_core::{
    models::Address,
    ports::{Clock, Registry, TokenLedger},
};
use std::future::Future;

/// Everything a front end needs to serve the exchange.
///
/// An application ties the exchange to its collaborators and decides who is
/// calling. How a request is authenticated is entirely up to the
/// implementation: `Context` is whatever the transport hands over (a bearer
/// token, a session, a signed envelope) and [`Application::caller`] turns it
/// into the account the exchange should act for.
pub trait Application {
    /// Whatever accompanies a request and identifies its sender
    type Context;

    /// Who owns which items, and where they are paid
    type Registry: Registry;

    /// Where escrow lives
    type Ledger: TokenLedger;

    /// The source of the current time
    type Clock: Clock;

    /// The exchange this application serves
    fn exchange(&self) -> &SharedExchange<Self::Registry, Self::Ledger, Self::Clock>;

    /// Resolve the account acting in this request, or `None` if the context
    /// does not identify one.
    fn caller(&self, context: &Self::Context) -> impl Future<Output = Option<Address>> + Send;
}
