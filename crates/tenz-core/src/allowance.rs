//! Delegated transfer allowances: `owner → spender → amount`.
//!
//! Pure bookkeeping. Gate checks and the balance side of a delegated
//! transfer live in [`Token`](crate::token::Token).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::amount::Amount;
use crate::error::TokenError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowances {
    /// Zero allowances are pruned, as are owners with no spenders left.
    entries: BTreeMap<Address, BTreeMap<Address, Amount>>,
}

impl Allowances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.entries
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or_default()
    }

    /// Overwrite the allowance.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: Amount) {
        if amount.is_zero() {
            if let Some(spenders) = self.entries.get_mut(&owner) {
                spenders.remove(&spender);
                if spenders.is_empty() {
                    self.entries.remove(&owner);
                }
            }
        } else {
            self.entries.entry(owner).or_default().insert(spender, amount);
        }
    }

    /// Add to the allowance; returns the new value.
    pub fn increase(&mut self, owner: Address, spender: Address, added: Amount) -> Result<Amount, TokenError> {
        let new = self.allowance(&owner, &spender).checked_add(added)?;
        self.approve(owner, spender, new);
        Ok(new)
    }

    /// Subtract from the allowance, clamping at zero; returns the new value.
    pub fn decrease(&mut self, owner: Address, spender: Address, subtracted: Amount) -> Amount {
        let new = self.allowance(&owner, &spender).saturating_sub(subtracted);
        self.approve(owner, spender, new);
        new
    }

    /// Check that `amount` fits within the current allowance.
    pub fn ensure_covers(&self, owner: &Address, spender: &Address, amount: Amount) -> Result<(), TokenError> {
        let allowed = self.allowance(owner, spender);
        if amount > allowed {
            return Err(TokenError::ExceedsAllowance {
                allowed,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Use up `amount` of the allowance.
    ///
    /// # Errors
    ///
    /// - [`TokenError::ExceedsAllowance`] if `amount` exceeds the allowance
    pub fn consume(&mut self, owner: Address, spender: Address, amount: Amount) -> Result<(), TokenError> {
        self.ensure_covers(&owner, &spender, amount)?;
        let remaining = self.allowance(&owner, &spender).checked_sub(amount)?;
        self.approve(owner, spender, remaining);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::from_label("owner")
    }

    fn spender() -> Address {
        Address::from_label("spender")
    }

    #[test]
    fn approve_overwrites() {
        let mut a = Allowances::new();
        a.approve(owner(), spender(), Amount::new(100));
        a.approve(owner(), spender(), Amount::new(30));
        assert_eq!(a.allowance(&owner(), &spender()), Amount::new(30));
    }

    #[test]
    fn increase_then_decrease_clamps() {
        let mut a = Allowances::new();
        a.approve(owner(), spender(), Amount::new(100));
        assert_eq!(a.increase(owner(), spender(), Amount::new(50)), Ok(Amount::new(150)));
        assert_eq!(a.decrease(owner(), spender(), Amount::new(200)), Amount::ZERO);
        assert_eq!(a.allowance(&owner(), &spender()), Amount::ZERO);
        assert_eq!(a, Allowances::new());
    }

    #[test]
    fn increase_overflow_fails() {
        let mut a = Allowances::new();
        a.approve(owner(), spender(), Amount::MAX);
        assert_eq!(
            a.increase(owner(), spender(), Amount::new(1)),
            Err(TokenError::ArithmeticOverflow)
        );
        assert_eq!(a.allowance(&owner(), &spender()), Amount::MAX);
    }

    #[test]
    fn consume_decrements() {
        let mut a = Allowances::new();
        a.approve(owner(), spender(), Amount::new(10));
        a.consume(owner(), spender(), Amount::new(4)).unwrap();
        assert_eq!(a.allowance(&owner(), &spender()), Amount::new(6));
    }

    #[test]
    fn consume_beyond_allowance_fails() {
        let mut a = Allowances::new();
        a.approve(owner(), spender(), Amount::new(10));
        assert_eq!(
            a.consume(owner(), spender(), Amount::new(11)),
            Err(TokenError::ExceedsAllowance {
                allowed: Amount::new(10),
                requested: Amount::new(11),
            })
        );
        assert_eq!(a.allowance(&owner(), &spender()), Amount::new(10));
    }

    #[test]
    fn allowances_are_directional() {
        let mut a = Allowances::new();
        a.approve(owner(), spender(), Amount::new(10));
        assert_eq!(a.allowance(&spender(), &owner()), Amount::ZERO);
    }
}
