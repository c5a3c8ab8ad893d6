use std::future::Future;

use alloy::primitives::{Address, U256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: U256, need: U256 },

    #[error("insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: U256, need: U256 },
}

/// Port for the underlying asset on the base layer.
///
/// The portal escrows under its own address via `transfer_from` on deposit
/// and releases via `transfer` on withdrawal. Callers are explicit because
/// the harness runs outside any contract environment; there is no implicit
/// transaction sender.
pub trait TokenLedger: Send + Sync {
    /// Mint fresh tokens to an account (test setup only on real assets).
    fn mint(
        &self,
        to: Address,
        amount: U256,
    ) -> impl Future<Output = Result<(), TokenError>> + Send;

    /// Move tokens out of the caller's own balance.
    fn transfer(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> impl Future<Output = Result<(), TokenError>> + Send;

    /// Move tokens from `from` to `to` on behalf of `spender`, consuming
    /// allowance.
    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> impl Future<Output = Result<(), TokenError>> + Send;

    /// Grant `spender` the right to move up to `amount` of `owner`'s tokens.
    fn approve(
        &self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> impl Future<Output = Result<(), TokenError>> + Send;

    fn balance_of(
        &self,
        account: Address,
    ) -> impl Future<Output = Result<U256, TokenError>> + Send;
}
