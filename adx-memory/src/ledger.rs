use adx_core::{
    models::{Address, Amount},
    ports::TokenLedger,
};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{Level, event};

/// Reasons a ledger call is refused. A refused call changes nothing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The sender does not hold enough tokens
    #[error("{owner} holds {balance}, cannot move {amount}")]
    InsufficientBalance {
        /// The account debited
        owner: Address,
        /// Its balance
        balance: Amount,
        /// The amount requested
        amount: Amount,
    },

    /// The spender was not authorized to move this much
    #[error("{spender} may move {allowance} on behalf of {owner}, not {amount}")]
    InsufficientAllowance {
        /// The account debited
        owner: Address,
        /// The account spending on its behalf
        spender: Address,
        /// The remaining allowance
        allowance: Amount,
        /// The amount requested
        amount: Amount,
    },

    /// The recipient's balance would not fit
    #[error("balance of {0} would overflow")]
    Overflow(Address),
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: FxHashMap<Address, Amount>,
    allowances: FxHashMap<(Address, Address), Amount>,
}

impl LedgerState {
    fn balance(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    /// Check a transfer without applying it.
    fn check(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        let balance = self.balance(from);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                owner: *from,
                balance,
                amount,
            });
        }
        if from != to && self.balance(to).checked_add(amount).is_none() {
            return Err(LedgerError::Overflow(*to));
        }
        Ok(())
    }

    /// Apply a transfer that has passed [`LedgerState::check`].
    fn apply(&mut self, from: &Address, to: &Address, amount: Amount) {
        if from == to {
            return;
        }
        *self.balances.entry(*from).or_default() -= amount;
        *self.balances.entry(*to).or_default() += amount;
    }
}

/// A minimal in-memory fungible token.
///
/// Clones share state. Each call takes the lock once, so every call is atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger(Arc<Mutex<LedgerState>>);

impl MemoryLedger {
    /// Create a ledger where every balance is zero
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut LedgerState) -> T) -> T {
        f(&mut self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// The balance of `address`
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.with(|state| state.balance(address))
    }

    /// How much `spender` may still move on behalf of `owner`
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.with(|state| state.allowance(owner, spender))
    }

    /// Create `amount` new tokens in `to`'s balance.
    pub fn mint(&self, to: &Address, amount: Amount) -> Result<Amount, LedgerError> {
        let balance = self.with(|state| -> Result<Amount, LedgerError> {
            let balance = state.balances.entry(*to).or_default();
            *balance = balance
                .checked_add(amount)
                .ok_or(LedgerError::Overflow(*to))?;
            Ok(*balance)
        })?;
        event!(Level::DEBUG, %to, amount, balance, "minted");
        Ok(balance)
    }

    /// Move `amount` from `from` to `to`.
    pub fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.with(|state| -> Result<(), LedgerError> {
            state.check(from, to, amount)?;
            state.apply(from, to, amount);
            Ok(())
        })?;
        event!(Level::TRACE, %from, %to, amount, "transfer");
        Ok(())
    }

    /// Allow `spender` to move up to `amount` on behalf of `owner`,
    /// replacing any previous allowance.
    pub fn approve(&self, owner: &Address, spender: &Address, amount: Amount) {
        self.with(|state| state.allowances.insert((*owner, *spender), amount));
        event!(Level::TRACE, %owner, %spender, amount, "approval");
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// `spender`'s allowance.
    pub fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.with(|state| {
            let allowance = state.allowance(from, spender);
            if allowance < amount {
                return Err(LedgerError::InsufficientAllowance {
                    owner: *from,
                    spender: *spender,
                    allowance,
                    amount,
                });
            }
            state.check(from, to, amount)?;
            state.apply(from, to, amount);
            state
                .allowances
                .insert((*from, *spender), allowance - amount);
            Ok(())
        })?;
        event!(Level::TRACE, %spender, %from, %to, amount, "delegated transfer");
        Ok(())
    }
}

/// A [`MemoryLedger`] as seen from a fixed custody account.
#[derive(Debug, Clone)]
pub struct LedgerCustody {
    ledger: MemoryLedger,
    custody: Address,
}

impl LedgerCustody {
    /// Act on `ledger` as `custody`
    pub fn new(ledger: MemoryLedger, custody: Address) -> Self {
        Self { ledger, custody }
    }

    /// The underlying ledger
    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }
}

impl TokenLedger for LedgerCustody {
    type Error = LedgerError;

    fn custody(&self) -> Address {
        self.custody
    }

    fn balance_of(&self, address: &Address) -> Amount {
        self.ledger.balance_of(address)
    }

    fn pull_from(&self, owner: &Address, amount: Amount) -> Result<(), Self::Error> {
        self.ledger
            .transfer_from(&self.custody, owner, &self.custody, amount)
    }

    fn push_to(&self, recipient: &Address, amount: Amount) -> Result<(), Self::Error> {
        self.ledger.transfer(&self.custody, recipient, amount)
    }
}
