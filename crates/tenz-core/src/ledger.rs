//! Balances and total supply.
//!
//! The [`Ledger`] maintains `sum(balances) == total_supply` across every
//! mutation and refuses to let `total_supply` exceed its cap. It knows
//! nothing about transfer gating or emission timing; callers check those
//! before reaching it.
//!
//! Every mutation validates fully before touching state, so a failed call
//! leaves the ledger exactly as it was.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::amount::Amount;
use crate::error::TokenError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// Holder → balance. Zero balances are pruned.
    balances: BTreeMap<Address, Amount>,
    total_supply: Amount,
    /// Hard ceiling on `total_supply`.
    max_supply: Amount,
}

impl Ledger {
    /// A ledger with `initial` supply credited to `holder`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::InvalidRecipient`] if `holder` is the zero address
    /// - [`TokenError::SupplyCapExceeded`] if `initial > max_supply`
    pub fn new(holder: Address, initial: Amount, max_supply: Amount) -> Result<Self, TokenError> {
        if holder.is_zero() {
            return Err(TokenError::InvalidRecipient);
        }
        if initial > max_supply {
            return Err(TokenError::SupplyCapExceeded {
                supply: initial,
                cap: max_supply,
            });
        }
        let mut balances = BTreeMap::new();
        if !initial.is_zero() {
            balances.insert(holder, initial);
        }
        Ok(Self {
            balances,
            total_supply: initial,
            max_supply,
        })
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn max_supply(&self) -> Amount {
        self.max_supply
    }

    /// Number of holders with a non-zero balance.
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Holders and their balances in address order.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter()
    }

    /// Move `amount` from `from` to `to`. Total supply is unchanged.
    ///
    /// # Errors
    ///
    /// - [`TokenError::InvalidRecipient`] if `to` is the zero address
    /// - [`TokenError::InsufficientBalance`] if `amount > balance_of(from)`
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::InvalidRecipient);
        }
        let from_balance = self.balance_of(from);
        if amount > from_balance {
            return Err(TokenError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let new_from = from_balance.checked_sub(amount)?;
        let new_to = self.balance_of(to).checked_add(amount)?;
        self.set_balance(*from, new_from);
        self.set_balance(*to, new_to);
        Ok(())
    }

    /// Destroy `amount` of `holder`'s tokens, shrinking total supply with them.
    ///
    /// # Errors
    ///
    /// - [`TokenError::InsufficientBalance`] if `amount > balance_of(holder)`
    pub fn burn(&mut self, holder: &Address, amount: Amount) -> Result<(), TokenError> {
        let balance = self.balance_of(holder);
        if amount > balance {
            return Err(TokenError::InsufficientBalance {
                have: balance,
                need: amount,
            });
        }
        let new_supply = self.total_supply.checked_sub(amount)?;
        let new_balance = balance.checked_sub(amount)?;
        self.set_balance(*holder, new_balance);
        self.total_supply = new_supply;
        Ok(())
    }

    /// Create `amount` new tokens for `to`.
    ///
    /// The emission schedule decides how much may be minted; this only
    /// enforces the absolute cap as a last line.
    ///
    /// # Errors
    ///
    /// - [`TokenError::InvalidRecipient`] if `to` is the zero address
    /// - [`TokenError::SupplyCapExceeded`] if the new supply would pass `max_supply`
    pub fn credit_mint(&mut self, to: &Address, amount: Amount) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::InvalidRecipient);
        }
        let new_supply = self.total_supply.checked_add(amount)?;
        if new_supply > self.max_supply {
            return Err(TokenError::SupplyCapExceeded {
                supply: new_supply,
                cap: self.max_supply,
            });
        }
        let new_balance = self.balance_of(to).checked_add(amount)?;
        self.set_balance(*to, new_balance);
        self.total_supply = new_supply;
        Ok(())
    }

    fn set_balance(&mut self, holder: Address, amount: Amount) {
        if amount.is_zero() {
            self.balances.remove(&holder);
        } else {
            self.balances.insert(holder, amount);
        }
    }

    /// Recompute `sum(balances)` with checked arithmetic.
    pub fn sum_of_balances(&self) -> Result<Amount, TokenError> {
        self.balances
            .values()
            .try_fold(Amount::ZERO, |acc, b| acc.checked_add(*b))
    }
}
