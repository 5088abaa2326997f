//! The token aggregate: every piece of contract state and the operations on it.
//!
//! Each operation takes the [`CallContext`] supplied by the host (caller and
//! current time) and starts with explicit precondition checks: owner
//! privilege, gate phase, origination rights. All checks run before the
//! first mutation. Operations spanning more than one component order their
//! writes so that nothing can fail after the first one; the [`Host`] adds a
//! snapshot on top for callers that need a hard all-or-nothing guarantee.
//!
//! [`Host`]: crate::host::Host

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::address::Address;
use crate::allowance::Allowances;
use crate::amount::Amount;
use crate::config::TokenParams;
use crate::error::{TenzError, TokenError};
use crate::gate::TransferGate;
use crate::ledger::Ledger;
use crate::owners::OwnerSet;
use crate::schedule::EmissionSchedule;
use crate::traits::ApprovalReceiver;

/// Host-supplied facts about the current operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Who invoked the operation.
    pub caller: Address,
    /// Unix seconds, sampled once for the whole operation.
    pub now: u64,
}

impl CallContext {
    pub fn new(caller: Address, now: u64) -> Self {
        Self { caller, now }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Record of a successful state change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TokenEvent {
    Transfer { from: Address, to: Address, amount: Amount },
    Approval { owner: Address, spender: Address, amount: Amount },
    Burn { holder: Address, amount: Amount },
    Mint { to: Address, amount: Amount },
    TransfersEnabled,
    TransferRightGranted { addr: Address },
    TransferRightCancelled { addr: Address },
    MintingStarted { at: u64 },
    OwnerAdded { addr: Address },
    OwnerRemoved { addr: Address },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Ledger identity, as seen by other contracts.
    address: Address,
    metadata: TokenMetadata,
    ledger: Ledger,
    gate: TransferGate,
    schedule: EmissionSchedule,
    allowances: Allowances,
    owners: OwnerSet,
    /// Emitted events, oldest first, until drained by `take_events`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    events: Vec<TokenEvent>,
}

impl Token {
    /// Deploy a fresh token at `address`.
    ///
    /// The deployer receives the whole initial supply, holds the only
    /// transfer grant and is the only owner. Transfers start locked and the
    /// emission schedule unstarted.
    pub fn deploy(params: &TokenParams, deployer: Address, address: Address) -> Result<Self, TenzError> {
        params.validate()?;
        let deployer = deployer.non_zero()?;
        let curve = params.curve()?;
        let token = Self {
            address,
            metadata: TokenMetadata {
                name: params.name.clone(),
                symbol: params.symbol.clone(),
                decimals: params.decimals,
            },
            ledger: Ledger::new(deployer, curve.init_supply, curve.max_supply)?,
            gate: TransferGate::new(deployer)?,
            schedule: EmissionSchedule::new(curve),
            allowances: Allowances::new(),
            owners: OwnerSet::new(deployer)?,
            events: Vec::new(),
        };
        info!(
            %address,
            %deployer,
            symbol = %token.metadata.symbol,
            supply = %token.ledger.total_supply(),
            "token deployed"
        );
        Ok(token)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn gate(&self) -> &TransferGate {
        &self.gate
    }

    pub fn schedule(&self) -> &EmissionSchedule {
        &self.schedule
    }

    pub fn total_supply(&self) -> Amount {
        self.ledger.total_supply()
    }

    pub fn max_supply(&self) -> Amount {
        self.ledger.max_supply()
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.ledger.balance_of(holder)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.allowance(owner, spender)
    }

    /// Whether the gate is open to everyone.
    pub fn transferable(&self) -> bool {
        self.gate.is_open()
    }

    pub fn has_transfer_grant(&self, addr: &Address) -> bool {
        self.gate.has_grant(addr)
    }

    pub fn is_owner(&self, addr: &Address) -> bool {
        self.owners.is_owner(addr)
    }

    pub fn owners(&self) -> impl Iterator<Item = &Address> {
        self.owners.iter()
    }

    pub fn first_period_start(&self) -> Option<u64> {
        self.schedule.first_period_start()
    }

    pub fn current_period(&self, now: u64) -> u64 {
        self.schedule.current_period(now)
    }

    pub fn max_allowed_supply(&self, period: u64) -> Result<Amount, TokenError> {
        self.schedule.max_allowed_supply(period)
    }

    /// What a mint at `now` could create at most.
    pub fn mintable_now(&self, now: u64) -> Result<Amount, TokenError> {
        self.schedule.available(self.ledger.total_supply(), now)
    }

    pub fn events(&self) -> &[TokenEvent] {
        &self.events
    }

    /// Drain the event journal.
    ///
    /// Events accumulate until drained; long-lived embeddings should call
    /// this after each operation they care about.
    pub fn take_events(&mut self) -> Vec<TokenEvent> {
        std::mem::take(&mut self.events)
    }

    /// Put previously drained events back in front of any newer ones.
    pub(crate) fn restore_journal(&mut self, mut earlier: Vec<TokenEvent>) {
        earlier.append(&mut self.events);
        self.events = earlier;
    }

    // ------------------------------------------------------------------
    // Transfers
    // ------------------------------------------------------------------

    /// Move `amount` from the caller to `to`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::TransfersNotEnabled`] if the caller may not originate
    /// - [`TokenError::InvalidRecipient`] if `to` is the zero address
    /// - [`TokenError::InsufficientBalance`] if the caller holds less than `amount`
    pub fn transfer(&mut self, ctx: &CallContext, to: Address, amount: Amount) -> Result<(), TokenError> {
        self.gate.ensure_can_originate(&ctx.caller)?;
        self.ledger.transfer(&ctx.caller, &to, amount)?;
        debug!(from = %ctx.caller, %to, %amount, "transfer");
        self.events.push(TokenEvent::Transfer {
            from: ctx.caller,
            to,
            amount,
        });
        Ok(())
    }

    /// Move `amount` from `owner` to `to`, spending the caller's allowance.
    ///
    /// # Errors
    ///
    /// - [`TokenError::TransfersNotEnabled`] while the gate is locked
    /// - [`TokenError::ExceedsAllowance`] if the allowance is too small
    /// - [`TokenError::InsufficientBalance`] if `owner` holds less than `amount`
    /// - [`TokenError::InvalidRecipient`] if `to` is the zero address
    pub fn transfer_from(
        &mut self,
        ctx: &CallContext,
        owner: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.gate.ensure_open(&ctx.caller)?;
        self.gate.ensure_can_originate(&owner)?;
        self.allowances.ensure_covers(&owner, &ctx.caller, amount)?;
        let have = self.ledger.balance_of(&owner);
        if amount > have {
            return Err(TokenError::InsufficientBalance { have, need: amount });
        }
        self.ledger.transfer(&owner, &to, amount)?;
        self.allowances.consume(owner, ctx.caller, amount)?;
        debug!(%owner, spender = %ctx.caller, %to, %amount, "delegated transfer");
        self.events.push(TokenEvent::Transfer {
            from: owner,
            to,
            amount,
        });
        Ok(())
    }

    /// Destroy `amount` of the caller's tokens.
    ///
    /// Subject to the same origination gate as a transfer.
    pub fn burn(&mut self, ctx: &CallContext, amount: Amount) -> Result<(), TokenError> {
        self.gate.ensure_can_originate(&ctx.caller)?;
        self.ledger.burn(&ctx.caller, amount)?;
        debug!(holder = %ctx.caller, %amount, supply = %self.ledger.total_supply(), "burn");
        self.events.push(TokenEvent::Burn {
            holder: ctx.caller,
            amount,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Allowances
    // ------------------------------------------------------------------

    /// Set the caller's allowance for `spender` to exactly `amount`.
    pub fn approve(&mut self, ctx: &CallContext, spender: Address, amount: Amount) -> Result<(), TokenError> {
        self.gate.ensure_open(&ctx.caller)?;
        self.allowances.approve(ctx.caller, spender, amount);
        self.record_approval(ctx.caller, spender, amount);
        Ok(())
    }

    /// Raise the caller's allowance for `spender` by `added`.
    pub fn increase_approval(&mut self, ctx: &CallContext, spender: Address, added: Amount) -> Result<Amount, TokenError> {
        self.gate.ensure_open(&ctx.caller)?;
        let new = self.allowances.increase(ctx.caller, spender, added)?;
        self.record_approval(ctx.caller, spender, new);
        Ok(new)
    }

    /// Lower the caller's allowance for `spender` by `subtracted`, stopping at zero.
    pub fn decrease_approval(
        &mut self,
        ctx: &CallContext,
        spender: Address,
        subtracted: Amount,
    ) -> Result<Amount, TokenError> {
        self.gate.ensure_open(&ctx.caller)?;
        let new = self.allowances.decrease(ctx.caller, spender, subtracted);
        self.record_approval(ctx.caller, spender, new);
        Ok(new)
    }

    /// Approve `spender` and notify it through `receiver`.
    ///
    /// `receiver` is the spender's callback, if it exposes one. The approval
    /// is undone when the callback is missing or fails.
    ///
    /// # Errors
    ///
    /// - [`TokenError::TransfersNotEnabled`] while the gate is locked
    /// - [`TokenError::CallbackUnsupported`] if `receiver` is `None`
    /// - [`TokenError::CallbackFailed`] if the receiver rejects the notification
    pub fn approve_and_call(
        &mut self,
        ctx: &CallContext,
        spender: Address,
        amount: Amount,
        data: &[u8],
        receiver: Option<&mut dyn ApprovalReceiver>,
    ) -> Result<(), TokenError> {
        self.gate.ensure_open(&ctx.caller)?;
        let Some(receiver) = receiver else {
            return Err(TokenError::CallbackUnsupported(spender));
        };

        let previous = self.allowances.allowance(&ctx.caller, &spender);
        let journal_len = self.events.len();
        self.approve(ctx, spender, amount)?;

        if let Err(reason) = receiver.receive_approval(ctx.caller, amount, self.address, data) {
            self.allowances.approve(ctx.caller, spender, previous);
            self.events.truncate(journal_len);
            warn!(%spender, %reason, "approval callback failed, approval reverted");
            return Err(TokenError::CallbackFailed(reason));
        }
        Ok(())
    }

    fn record_approval(&mut self, owner: Address, spender: Address, amount: Amount) {
        debug!(%owner, %spender, %amount, "approval");
        self.events.push(TokenEvent::Approval {
            owner,
            spender,
            amount,
        });
    }

    // ------------------------------------------------------------------
    // Transfer gate (privileged)
    // ------------------------------------------------------------------

    /// Open transfers to everyone. Irreversible.
    pub fn enable_transfers(&mut self, ctx: &CallContext) -> Result<(), TokenError> {
        self.ensure_owner(ctx)?;
        self.gate.enable_transfers()?;
        info!(by = %ctx.caller, "transfers enabled");
        self.events.push(TokenEvent::TransfersEnabled);
        Ok(())
    }

    pub fn grant_transfer_right(&mut self, ctx: &CallContext, addr: Address) -> Result<(), TokenError> {
        self.ensure_owner(ctx)?;
        self.gate.grant(addr)?;
        info!(%addr, by = %ctx.caller, "transfer right granted");
        self.events.push(TokenEvent::TransferRightGranted { addr });
        Ok(())
    }

    pub fn cancel_transfer_right(&mut self, ctx: &CallContext, addr: Address) -> Result<(), TokenError> {
        self.ensure_owner(ctx)?;
        self.gate.cancel(addr)?;
        info!(%addr, by = %ctx.caller, "transfer right cancelled");
        self.events.push(TokenEvent::TransferRightCancelled { addr });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Emission (privileged)
    // ------------------------------------------------------------------

    /// Begin period 0 of the emission schedule at `ctx.now`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::NotOwner`] if the caller is not an owner
    /// - [`TokenError::GateNotOpen`] before transfers are enabled
    /// - [`TokenError::AlreadyStarted`] on a second call
    pub fn start_minting_period(&mut self, ctx: &CallContext) -> Result<(), TokenError> {
        self.ensure_owner(ctx)?;
        if !self.gate.is_open() {
            return Err(TokenError::GateNotOpen);
        }
        self.schedule.start(ctx.now)?;
        info!(at = ctx.now, by = %ctx.caller, "minting period started");
        self.events.push(TokenEvent::MintingStarted { at: ctx.now });
        Ok(())
    }

    /// Mint up to `requested` for `to`; returns what was actually minted.
    ///
    /// Never mints more than the schedule allows at `ctx.now`: requests
    /// beyond the available amount are silently capped, and before the
    /// schedule starts nothing is minted at all. Neither case is an error.
    ///
    /// # Errors
    ///
    /// - [`TokenError::NotOwner`] if the caller is not an owner
    /// - [`TokenError::InvalidRecipient`] if a non-zero amount would go to the zero address
    pub fn mint(&mut self, ctx: &CallContext, to: Address, requested: Amount) -> Result<Amount, TokenError> {
        self.ensure_owner(ctx)?;
        let available = self.mintable_now(ctx.now)?;
        let minted = requested.min(available);
        if minted.is_zero() {
            debug!(%to, %requested, period = self.current_period(ctx.now), "nothing mintable");
            return Ok(Amount::ZERO);
        }
        self.ledger.credit_mint(&to, minted)?;
        info!(
            %to,
            %minted,
            %requested,
            period = self.current_period(ctx.now),
            supply = %self.ledger.total_supply(),
            "minted tokens"
        );
        self.events.push(TokenEvent::Mint { to, amount: minted });
        Ok(minted)
    }

    // ------------------------------------------------------------------
    // Owners (privileged)
    // ------------------------------------------------------------------

    pub fn add_owner(&mut self, ctx: &CallContext, addr: Address) -> Result<(), TokenError> {
        self.ensure_owner(ctx)?;
        if self.owners.add(&ctx.caller, addr)? {
            info!(%addr, by = %ctx.caller, "owner added");
            self.events.push(TokenEvent::OwnerAdded { addr });
        }
        Ok(())
    }

    pub fn remove_owner(&mut self, ctx: &CallContext, addr: Address) -> Result<(), TokenError> {
        self.ensure_owner(ctx)?;
        if self.owners.remove(&ctx.caller, &addr)? {
            info!(%addr, by = %ctx.caller, "owner removed");
            self.events.push(TokenEvent::OwnerRemoved { addr });
        }
        Ok(())
    }

    /// Guard for privileged operations.
    pub fn ensure_owner(&self, ctx: &CallContext) -> Result<(), TokenError> {
        self.owners.ensure_owner(&ctx.caller).inspect_err(|_| {
            warn!(caller = %ctx.caller, token = %self.address, "privileged call rejected");
        })
    }
}
