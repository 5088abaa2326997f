//! Multi-owner access control.
//!
//! Any owner may add or remove others, but never itself, so the set can
//! never be emptied.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::TokenError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSet {
    owners: BTreeSet<Address>,
}

impl OwnerSet {
    /// A set whose only member is `first`.
    pub fn new(first: Address) -> Result<Self, TokenError> {
        Ok(Self {
            owners: BTreeSet::from([first.non_zero()?]),
        })
    }

    pub fn is_owner(&self, addr: &Address) -> bool {
        self.owners.contains(addr)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.owners.iter()
    }

    /// Guard for privileged operations.
    pub fn ensure_owner(&self, caller: &Address) -> Result<(), TokenError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(TokenError::NotOwner(*caller))
        }
    }

    /// Add `addr`. Returns whether it was newly added.
    pub fn add(&mut self, caller: &Address, addr: Address) -> Result<bool, TokenError> {
        self.ensure_owner(caller)?;
        Ok(self.owners.insert(addr.non_zero()?))
    }

    /// Remove `addr`. Returns whether it was an owner.
    ///
    /// # Errors
    ///
    /// - [`TokenError::NotOwner`] if `caller` is not an owner
    /// - [`TokenError::CannotRemoveSelf`] if `addr == caller`
    pub fn remove(&mut self, caller: &Address, addr: &Address) -> Result<bool, TokenError> {
        self.ensure_owner(caller)?;
        if addr == caller {
            return Err(TokenError::CannotRemoveSelf);
        }
        Ok(self.owners.remove(addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first() -> Address {
        Address::from_label("first")
    }

    fn second() -> Address {
        Address::from_label("second")
    }

    #[test]
    fn deployer_is_first_owner() {
        let set = OwnerSet::new(first()).unwrap();
        assert!(set.is_owner(&first()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn add_and_remove() {
        let mut set = OwnerSet::new(first()).unwrap();
        assert_eq!(set.add(&first(), second()), Ok(true));
        assert_eq!(set.add(&first(), second()), Ok(false));
        assert_eq!(set.remove(&first(), &second()), Ok(true));
        assert!(!set.is_owner(&second()));
        assert_eq!(set.remove(&first(), &second()), Ok(false));
    }

    #[test]
    fn sole_owner_cannot_remove_self() {
        let mut set = OwnerSet::new(first()).unwrap();
        assert_eq!(
            set.remove(&first(), &first()),
            Err(TokenError::CannotRemoveSelf)
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn non_owner_cannot_manage() {
        let mut set = OwnerSet::new(first()).unwrap();
        assert_eq!(
            set.add(&second(), second()),
            Err(TokenError::NotOwner(second()))
        );
        assert_eq!(
            set.remove(&second(), &first()),
            Err(TokenError::NotOwner(second()))
        );
    }

    #[test]
    fn zero_address_cannot_be_owner() {
        let mut set = OwnerSet::new(first()).unwrap();
        assert_eq!(set.add(&first(), Address::ZERO), Err(TokenError::ZeroAddress));
        assert_eq!(OwnerSet::new(Address::ZERO), Err(TokenError::ZeroAddress));
    }
}
