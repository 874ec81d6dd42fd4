//! Escrow movements between wallets and the exchange's custody account.
//!
//! These are the only places the exchange issues an irreversible external
//! call. Callers evaluate every guard first and commit local state only after
//! the call returns `Ok`.

use crate::error::{ExchangeError, ExchangeResult, Missing};
use adx_core::{
    models::{Address, Amount},
    ports::{Registry, TokenLedger},
};
use tracing::{Level, event};

/// Resolve the payout wallet of `account`.
pub(crate) fn wallet<R: Registry>(registry: &R, account: &Address) -> ExchangeResult<Address> {
    registry
        .wallet_of(account)
        .ok_or(ExchangeError::NotFound(Missing::Account(*account)))
}

/// Move `amount` from `wallet` into custody.
pub(crate) fn collect<L: TokenLedger>(
    ledger: &L,
    wallet: &Address,
    amount: Amount,
    subject: impl std::fmt::Display,
) -> ExchangeResult<()> {
    ledger.pull_from(wallet, amount).map_err(|err| {
        event!(Level::WARN, %wallet, amount, err = err.to_string(), "escrow pull rejected");
        ExchangeError::Escrow {
            subject: subject.to_string(),
            source: Box::new(err),
        }
    })?;
    event!(Level::DEBUG, %wallet, amount, "escrow collected");
    Ok(())
}

/// Move `amount` out of custody to `wallet`.
pub(crate) fn release<L: TokenLedger>(
    ledger: &L,
    wallet: &Address,
    amount: Amount,
    subject: impl std::fmt::Display,
) -> ExchangeResult<()> {
    ledger.push_to(wallet, amount).map_err(|err| {
        event!(Level::WARN, %wallet, amount, err = err.to_string(), "escrow push rejected");
        ExchangeError::Escrow {
            subject: subject.to_string(),
            source: Box::new(err),
        }
    })?;
    event!(Level::DEBUG, %wallet, amount, "escrow released");
    Ok(())
}
