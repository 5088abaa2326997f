//! Trait interfaces toward external collaborators.
//!
//! - [`ApprovalReceiver`] — notification target of `approve_and_call`

use crate::address::Address;
use crate::amount::Amount;

/// A contract that wants to be told when it has been granted an allowance.
///
/// Implementors typically pull the approved tokens with `transfer_from`
/// right away; here they only see the notification.
pub trait ApprovalReceiver: Send {
    /// Called after `from` approved `amount` for this receiver on `token`.
    ///
    /// Returning `Err` aborts the whole `approve_and_call`, including the
    /// approval itself.
    fn receive_approval(
        &mut self,
        from: Address,
        amount: Amount,
        token: Address,
        data: &[u8],
    ) -> Result<(), String>;
}
