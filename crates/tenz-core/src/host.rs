//! Execution environment for token instances.
//!
//! [`Host`] supplies what a deployed token takes for granted: who is
//! calling, what time it is, and that a failed operation leaves no trace.
//! It also keeps native-value balances and the registry of approval
//! receivers so the cross-ledger recovery paths can be exercised end to end.
//!
//! Not thread-safe. Operations are strictly serialized by `&mut self`.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use crate::address::Address;
use crate::amount::Amount;
use crate::config::TokenParams;
use crate::error::{HostError, TenzError, TokenError};
use crate::token::{CallContext, Token};
use crate::traits::ApprovalReceiver;

pub struct Host {
    /// Unix seconds. Never decreases.
    now: u64,
    tokens: BTreeMap<Address, Token>,
    native: BTreeMap<Address, Amount>,
    receivers: HashMap<Address, Box<dyn ApprovalReceiver>>,
    /// Deployments per deployer, for address derivation.
    nonces: BTreeMap<Address, u64>,
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("now", &self.now)
            .field("tokens", &self.tokens.keys().collect::<Vec<_>>())
            .field("native", &self.native)
            .field("receivers", &self.receivers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Host {
    pub fn new(now: u64) -> Self {
        Self {
            now,
            tokens: BTreeMap::new(),
            native: BTreeMap::new(),
            receivers: HashMap::new(),
            nonces: BTreeMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Move the clock forward by `secs`; returns the new time.
    pub fn advance_time(&mut self, secs: u64) -> Result<u64, HostError> {
        self.now = self
            .now
            .checked_add(secs)
            .ok_or(TokenError::ArithmeticOverflow)?;
        Ok(self.now)
    }

    /// Jump the clock to `at`.
    ///
    /// # Errors
    ///
    /// - [`HostError::TimeWentBackwards`] if `at` is earlier than the current time
    pub fn set_time(&mut self, at: u64) -> Result<(), HostError> {
        if at < self.now {
            return Err(HostError::TimeWentBackwards {
                now: self.now,
                requested: at,
            });
        }
        self.now = at;
        Ok(())
    }

    fn ctx(&self, caller: Address) -> CallContext {
        CallContext::new(caller, self.now)
    }

    // ------------------------------------------------------------------
    // Token registry
    // ------------------------------------------------------------------

    /// Deploy a token owned by `deployer`; returns its address.
    pub fn deploy(&mut self, deployer: Address, params: &TokenParams) -> Result<Address, TenzError> {
        let nonce = self.nonces.get(&deployer).copied().unwrap_or(0);
        let address = Address::contract(&deployer, nonce);
        let token = Token::deploy(params, deployer, address)?;
        self.nonces.insert(deployer, nonce + 1);
        self.tokens.insert(address, token);
        Ok(address)
    }

    /// Place an already deployed token (e.g. loaded from disk) under this host.
    pub fn adopt(&mut self, token: Token) -> Address {
        let address = token.address();
        self.tokens.insert(address, token);
        address
    }

    /// Remove a token from the host, handing back its final state.
    pub fn release(&mut self, token: &Address) -> Result<Token, HostError> {
        self.tokens
            .remove(token)
            .ok_or(HostError::UnknownToken(*token))
    }

    pub fn token(&self, token: &Address) -> Result<&Token, HostError> {
        self.tokens.get(token).ok_or(HostError::UnknownToken(*token))
    }

    fn token_mut(&mut self, token: &Address) -> Result<&mut Token, HostError> {
        self.tokens
            .get_mut(token)
            .ok_or(HostError::UnknownToken(*token))
    }

    /// Run one operation on `token` as `caller`, all or nothing.
    ///
    /// The token is snapshotted first and restored if `op` fails, so no
    /// partial mutation survives an error regardless of how `op` orders
    /// its writes.
    pub fn call<R>(
        &mut self,
        token: Address,
        caller: Address,
        op: impl FnOnce(&mut Token, &CallContext) -> Result<R, TokenError>,
    ) -> Result<R, HostError> {
        let ctx = self.ctx(caller);
        let target = self.token_mut(&token)?;
        atomically(target, |t| op(t, &ctx)).map_err(|err| {
            debug!(%token, %caller, %err, "operation reverted");
            err.into()
        })
    }

    // ------------------------------------------------------------------
    // Approval callbacks
    // ------------------------------------------------------------------

    /// Make `addr` a contract that accepts approval notifications.
    pub fn register_receiver(&mut self, addr: Address, receiver: Box<dyn ApprovalReceiver>) {
        self.receivers.insert(addr, receiver);
    }

    /// `approve_and_call` on `token`, dispatching to the receiver registered
    /// for `spender`.
    pub fn approve_and_call(
        &mut self,
        token: Address,
        caller: Address,
        spender: Address,
        amount: Amount,
        data: &[u8],
    ) -> Result<(), HostError> {
        let ctx = self.ctx(caller);
        let target = self
            .tokens
            .get_mut(&token)
            .ok_or(HostError::UnknownToken(token))?;
        let receiver = self
            .receivers
            .get_mut(&spender)
            .map(|r| r.as_mut() as &mut dyn ApprovalReceiver);

        atomically(target, |t| t.approve_and_call(&ctx, spender, amount, data, receiver))
            .map_err(HostError::from)
    }

    // ------------------------------------------------------------------
    // Native value
    // ------------------------------------------------------------------

    pub fn native_balance(&self, addr: &Address) -> Amount {
        self.native.get(addr).copied().unwrap_or_default()
    }

    /// Create native value out of thin air, e.g. to fund test accounts.
    pub fn fund_native(&mut self, addr: Address, amount: Amount) -> Result<(), HostError> {
        let new = self.native_balance(&addr).checked_add(amount)?;
        set_native(&mut self.native, addr, new);
        Ok(())
    }

    /// A plain value transfer. Tokens refuse incoming value.
    pub fn send_native(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), HostError> {
        if self.tokens.contains_key(&to) {
            return Err(HostError::NativeTransferRejected(to));
        }
        self.move_native(from, to, amount)
    }

    /// Value arriving by a path the recipient cannot refuse.
    pub fn force_native(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), HostError> {
        self.move_native(from, to, amount)
    }

    fn move_native(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), HostError> {
        let have = self.native_balance(&from);
        if amount > have {
            return Err(HostError::InsufficientNative { have, need: amount });
        }
        if from == to {
            return Ok(());
        }
        let credited = self.native_balance(&to).checked_add(amount)?;
        let debited = have.checked_sub(amount)?;
        set_native(&mut self.native, from, debited);
        set_native(&mut self.native, to, credited);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Asset recovery (privileged)
    // ------------------------------------------------------------------

    /// Sweep everything `token` holds on the `other` ledger to `caller`.
    ///
    /// The transfer on `other` originates from `token`'s address, so it is
    /// subject to `other`'s own transfer gate. Returns the amount recovered.
    ///
    /// # Errors
    ///
    /// - [`TokenError::NotOwner`] if `caller` is not an owner of `token`
    /// - [`TokenError::ZeroBalance`] if `token` holds nothing on `other`
    /// - any error of `other`'s `transfer`; `other` is left untouched
    pub fn withdraw_erc20_tokens(
        &mut self,
        token: Address,
        caller: Address,
        other: Address,
    ) -> Result<Amount, HostError> {
        let ctx = self.ctx(caller);
        self.token(&token)?.ensure_owner(&ctx)?;

        let as_token = self.ctx(token);
        let amount = self.call(other, token, |ledger, _| {
            let held = ledger.balance_of(&as_token.caller);
            if held.is_zero() {
                return Err(TokenError::ZeroBalance);
            }
            ledger.transfer(&as_token, caller, held)?;
            Ok(held)
        })?;
        info!(%token, %other, to = %caller, %amount, "recovered foreign tokens");
        Ok(amount)
    }

    /// Sweep native value held by `token` to `caller`. Returns the amount.
    ///
    /// # Errors
    ///
    /// - [`TokenError::NotOwner`] if `caller` is not an owner of `token`
    /// - [`TokenError::ZeroBalance`] if `token` holds no native value
    pub fn withdraw_ether(&mut self, token: Address, caller: Address) -> Result<Amount, HostError> {
        let ctx = self.ctx(caller);
        self.token(&token)?.ensure_owner(&ctx)?;

        let held = self.native_balance(&token);
        if held.is_zero() {
            return Err(TokenError::ZeroBalance.into());
        }
        self.move_native(token, caller, held)?;
        info!(%token, to = %caller, amount = %held, "recovered native value");
        Ok(held)
    }
}

fn set_native(native: &mut BTreeMap<Address, Amount>, addr: Address, amount: Amount) {
    if amount.is_zero() {
        native.remove(&addr);
    } else {
        native.insert(addr, amount);
    }
}

/// Run `op` against `token`, restoring its prior state if it fails.
///
/// The event journal is set aside first so the snapshot never copies it.
fn atomically<R>(
    token: &mut Token,
    op: impl FnOnce(&mut Token) -> Result<R, TokenError>,
) -> Result<R, TokenError> {
    let journal = token.take_events();
    let snapshot = token.clone();
    let result = op(&mut *token);
    if result.is_err() {
        *token = snapshot;
    }
    token.restore_journal(journal);
    result
}
