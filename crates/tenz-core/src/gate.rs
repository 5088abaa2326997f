//! Two-phase transfer gate.
//!
//! While [`Phase::Locked`], only holders of a transfer grant may originate
//! transfers; the owners use this for controlled pre-launch distribution.
//! [`TransferGate::enable_transfers`] moves the gate to [`Phase::Open`]
//! exactly once. From then on anyone may originate a transfer and the grant
//! set is frozen.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::TokenError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Only granted addresses may originate transfers.
    #[default]
    Locked,
    /// Terminal: transfers are public.
    Open,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferGate {
    phase: Phase,
    grants: BTreeSet<Address>,
}

impl TransferGate {
    /// A locked gate with `initial` pre-granted.
    ///
    /// # Errors
    ///
    /// - [`TokenError::ZeroAddress`] if `initial` is the zero address
    pub fn new(initial: Address) -> Result<Self, TokenError> {
        let initial = initial.non_zero()?;
        Ok(Self {
            phase: Phase::Locked,
            grants: BTreeSet::from([initial]),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase == Phase::Open
    }

    pub fn has_grant(&self, addr: &Address) -> bool {
        self.grants.contains(addr)
    }

    pub fn grants(&self) -> impl Iterator<Item = &Address> {
        self.grants.iter()
    }

    /// Irreversibly open the gate.
    ///
    /// # Errors
    ///
    /// - [`TokenError::AlreadyOpen`] if the gate is already open
    pub fn enable_transfers(&mut self) -> Result<(), TokenError> {
        if self.is_open() {
            return Err(TokenError::AlreadyOpen);
        }
        self.phase = Phase::Open;
        Ok(())
    }

    /// Allow `addr` to originate transfers while locked.
    ///
    /// # Errors
    ///
    /// - [`TokenError::GateAlreadyOpen`] once the gate is open
    /// - [`TokenError::ZeroAddress`] for the zero address
    /// - [`TokenError::AlreadyGranted`] if `addr` already holds a grant
    pub fn grant(&mut self, addr: Address) -> Result<(), TokenError> {
        self.ensure_locked()?;
        let addr = addr.non_zero()?;
        if self.grants.contains(&addr) {
            return Err(TokenError::AlreadyGranted(addr));
        }
        self.grants.insert(addr);
        Ok(())
    }

    /// Withdraw a grant.
    ///
    /// # Errors
    ///
    /// - [`TokenError::GateAlreadyOpen`] once the gate is open
    /// - [`TokenError::AlreadyCancelled`] if `addr` holds no grant
    pub fn cancel(&mut self, addr: Address) -> Result<(), TokenError> {
        self.ensure_locked()?;
        if !self.grants.remove(&addr) {
            return Err(TokenError::AlreadyCancelled(addr));
        }
        Ok(())
    }

    /// Whether `from` may originate a transfer right now.
    pub fn can_originate(&self, from: &Address) -> bool {
        match self.phase {
            Phase::Open => true,
            Phase::Locked => self.grants.contains(from),
        }
    }

    /// [`can_originate`](Self::can_originate) as a precondition.
    pub fn ensure_can_originate(&self, from: &Address) -> Result<(), TokenError> {
        if self.can_originate(from) {
            Ok(())
        } else {
            Err(TokenError::TransfersNotEnabled(*from))
        }
    }

    /// Require the gate to be open.
    pub fn ensure_open(&self, caller: &Address) -> Result<(), TokenError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(TokenError::TransfersNotEnabled(*caller))
        }
    }

    fn ensure_locked(&self) -> Result<(), TokenError> {
        if self.is_open() {
            Err(TokenError::GateAlreadyOpen)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::from_label("owner")
    }

    fn user() -> Address {
        Address::from_label("user")
    }

    #[test]
    fn starts_locked_with_initial_grant() {
        let gate = TransferGate::new(owner()).unwrap();
        assert_eq!(gate.phase(), Phase::Locked);
        assert!(gate.has_grant(&owner()));
        assert!(gate.can_originate(&owner()));
        assert!(!gate.can_originate(&user()));
    }

    #[test]
    fn enable_is_one_shot() {
        let mut gate = TransferGate::new(owner()).unwrap();
        gate.enable_transfers().unwrap();
        assert!(gate.is_open());
        assert_eq!(gate.enable_transfers(), Err(TokenError::AlreadyOpen));
        assert!(gate.is_open());
    }

    #[test]
    fn open_gate_lets_anyone_originate() {
        let mut gate = TransferGate::new(owner()).unwrap();
        gate.enable_transfers().unwrap();
        assert!(gate.can_originate(&user()));
        assert!(gate.ensure_can_originate(&user()).is_ok());
    }

    #[test]
    fn grant_then_cancel() {
        let mut gate = TransferGate::new(owner()).unwrap();
        gate.grant(user()).unwrap();
        assert!(gate.can_originate(&user()));
        assert_eq!(gate.grant(user()), Err(TokenError::AlreadyGranted(user())));

        gate.cancel(user()).unwrap();
        assert!(!gate.can_originate(&user()));
        assert_eq!(gate.cancel(user()), Err(TokenError::AlreadyCancelled(user())));
    }

    #[test]
    fn zero_address_never_granted() {
        let mut gate = TransferGate::new(owner()).unwrap();
        assert_eq!(gate.grant(Address::ZERO), Err(TokenError::ZeroAddress));
        assert!(!gate.has_grant(&Address::ZERO));
        assert_eq!(
            gate.cancel(Address::ZERO),
            Err(TokenError::AlreadyCancelled(Address::ZERO))
        );
    }

    #[test]
    fn grants_frozen_once_open() {
        let mut gate = TransferGate::new(owner()).unwrap();
        gate.enable_transfers().unwrap();
        assert_eq!(gate.grant(user()), Err(TokenError::GateAlreadyOpen));
        assert_eq!(gate.cancel(owner()), Err(TokenError::GateAlreadyOpen));
        // Phase check comes before argument checks.
        assert_eq!(gate.grant(Address::ZERO), Err(TokenError::GateAlreadyOpen));
        assert!(gate.has_grant(&owner()));
        assert!(!gate.has_grant(&user()));
    }

    #[test]
    fn ensure_open_reports_caller() {
        let gate = TransferGate::new(owner()).unwrap();
        assert_eq!(
            gate.ensure_open(&user()),
            Err(TokenError::TransfersNotEnabled(user()))
        );
    }
}
