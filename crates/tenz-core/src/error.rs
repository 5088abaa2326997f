//! Error types for the TENZ token.
//!
//! Every failure aborts the triggering operation as a whole; callers never
//! observe partially applied state.
use thiserror::Error;

use crate::address::Address;
use crate::amount::Amount;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid recipient: zero address")] InvalidRecipient,
    #[error("insufficient balance: have {have}, need {need}")] InsufficientBalance { have: Amount, need: Amount },
    #[error("exceeds allowance: allowed {allowed}, requested {requested}")] ExceedsAllowance { allowed: Amount, requested: Amount },
    #[error("transfers not enabled for {0}")] TransfersNotEnabled(Address),
    #[error("transfer gate already open")] GateAlreadyOpen,
    #[error("transfers already enabled")] AlreadyOpen,
    #[error("transfer right already granted to {0}")] AlreadyGranted(Address),
    #[error("transfer right already cancelled for {0}")] AlreadyCancelled(Address),
    #[error("zero address not allowed")] ZeroAddress,
    #[error("caller {0} is not an owner")] NotOwner(Address),
    #[error("owner cannot remove itself")] CannotRemoveSelf,
    #[error("minting period already started")] AlreadyStarted,
    #[error("transfers must be enabled first")] GateNotOpen,
    #[error("nothing to withdraw: zero balance")] ZeroBalance,
    #[error("{0} does not accept approval callbacks")] CallbackUnsupported(Address),
    #[error("approval callback failed: {0}")] CallbackFailed(String),
    #[error("supply cap exceeded: supply {supply}, cap {cap}")] SupplyCapExceeded { supply: Amount, cap: Amount },
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid hex: {0}")] InvalidHex(String),
    #[error("invalid length: {0} bytes")] InvalidLength(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    #[error("empty amount")] Empty,
    #[error("invalid character: {0}")] InvalidCharacter(char),
    #[error("too many decimal places: {got} > {max}")] TooPrecise { got: usize, max: u8 },
    #[error("amount out of range")] OutOfRange,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("unknown token: {0}")] UnknownToken(Address),
    #[error("token {0} does not accept native value")] NativeTransferRejected(Address),
    #[error("insufficient native balance: have {have}, need {need}")] InsufficientNative { have: Amount, need: Amount },
    #[error("time cannot move backwards: now {now}, requested {requested}")] TimeWentBackwards { now: u64, requested: u64 },
    #[error(transparent)] Token(#[from] TokenError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid parameter {field}: {reason}")] InvalidParameter { field: &'static str, reason: String },
    #[error("load: {0}")] Load(String),
}

#[derive(Error, Debug)]
pub enum TenzError {
    #[error(transparent)] Token(#[from] TokenError),
    #[error(transparent)] Host(#[from] HostError),
    #[error(transparent)] Config(#[from] ConfigError),
}
