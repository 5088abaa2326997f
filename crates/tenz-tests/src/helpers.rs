//! Shared helpers for lifecycle and property tests.

use std::sync::Arc;

use parking_lot::Mutex;

use tenz_core::constants::UNIT;
use tenz_core::traits::ApprovalReceiver;
use tenz_core::{Address, Amount, Host, TokenParams};

/// Genesis time used by every test host.
pub const T0: u64 = 1_700_000_000;

/// Deterministic account address from a readable name.
pub fn addr(label: &str) -> Address {
    Address::from_label(label)
}

pub fn owner() -> Address {
    addr("owner")
}

pub fn user1() -> Address {
    addr("user1")
}

pub fn user2() -> Address {
    addr("user2")
}

/// `n` whole tokens in base units.
pub fn tokens(n: u128) -> Amount {
    Amount::new(n * UNIT)
}

/// A host at [`T0`] with one default token deployed by [`owner`].
pub fn deployed() -> (Host, Address) {
    let mut host = Host::new(T0);
    let token = host
        .deploy(owner(), &TokenParams::default())
        .expect("default deployment");
    (host, token)
}

/// Like [`deployed`], with transfers enabled.
pub fn deployed_open() -> (Host, Address) {
    let (mut host, token) = deployed();
    host.call(token, owner(), |t, ctx| t.enable_transfers(ctx))
        .expect("enable transfers");
    (host, token)
}

/// One `receive_approval` notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub from: Address,
    pub amount: Amount,
    pub token: Address,
    pub data: Vec<u8>,
}

/// Approval receiver that records what it was told. Clones share the log,
/// so a test keeps one handle after boxing the other into the host.
#[derive(Clone, Default)]
pub struct RecordingReceiver {
    log: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<Notification> {
        self.log.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.log.lock().len()
    }
}

impl ApprovalReceiver for RecordingReceiver {
    fn receive_approval(
        &mut self,
        from: Address,
        amount: Amount,
        token: Address,
        data: &[u8],
    ) -> Result<(), String> {
        self.log.lock().push(Notification {
            from,
            amount,
            token,
            data: data.to_vec(),
        });
        Ok(())
    }
}

/// Approval receiver that rejects every notification.
pub struct RejectingReceiver;

impl ApprovalReceiver for RejectingReceiver {
    fn receive_approval(&mut self, _: Address, _: Amount, _: Address, _: &[u8]) -> Result<(), String> {
        Err("receiver rejected approval".to_string())
    }
}
