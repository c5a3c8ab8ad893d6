use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use tokio::sync::Mutex;

use crate::ports::token::{TokenError, TokenLedger};

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<Address, U256>,
    /// (owner, spender) → remaining allowance
    allowances: HashMap<(Address, Address), U256>,
}

/// In-memory ERC-20-style ledger for the harness.
///
/// Mirrors the transfer semantics the portal relies on: `transfer_from`
/// consumes allowance, and both transfer paths fail without moving anything
/// when funds or allowance are short.
#[derive(Debug, Default)]
pub struct InMemoryTokenLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

fn debit(balances: &mut HashMap<Address, U256>, from: Address, amount: U256) -> Result<(), TokenError> {
    let have = balances.get(&from).copied().unwrap_or(U256::ZERO);
    let remaining = have
        .checked_sub(amount)
        .ok_or(TokenError::InsufficientBalance { have, need: amount })?;
    balances.insert(from, remaining);
    Ok(())
}

fn credit(balances: &mut HashMap<Address, U256>, to: Address, amount: U256) {
    *balances.entry(to).or_insert(U256::ZERO) += amount;
}

impl TokenLedger for InMemoryTokenLedger {
    async fn mint(&self, to: Address, amount: U256) -> Result<(), TokenError> {
        let mut state = self.state.lock().await;
        credit(&mut state.balances, to, amount);
        Ok(())
    }

    async fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        let mut state = self.state.lock().await;
        debit(&mut state.balances, from, amount)?;
        credit(&mut state.balances, to, amount);
        Ok(())
    }

    async fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let mut state = self.state.lock().await;

        // Validate both preconditions before mutating anything, so a failed
        // transfer consumes no allowance.
        let balance = state.balances.get(&from).copied().unwrap_or(U256::ZERO);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: balance,
                need: amount,
            });
        }
        if spender != from {
            let have = state
                .allowances
                .get(&(from, spender))
                .copied()
                .unwrap_or(U256::ZERO);
            let remaining = have
                .checked_sub(amount)
                .ok_or(TokenError::InsufficientAllowance { have, need: amount })?;
            state.allowances.insert((from, spender), remaining);
        }
        debit(&mut state.balances, from, amount)?;
        credit(&mut state.balances, to, amount);
        Ok(())
    }

    async fn approve(
        &self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let mut state = self.state.lock().await;
        state.allowances.insert((owner, spender), amount);
        Ok(())
    }

    async fn balance_of(&self, account: Address) -> Result<U256, TokenError> {
        let state = self.state.lock().await;
        Ok(state.balances.get(&account).copied().unwrap_or(U256::ZERO))
    }
}
