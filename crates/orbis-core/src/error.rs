//! Error types for the Orbis economy.
use thiserror::Error;

use crate::types::AccountId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("account not found: {0}")] NotFound(AccountId),
    #[error("concurrent modification of account {0}")] ConcurrentModification(AccountId),
    #[error("timed out after {millis}ms waiting for account lock")] Timeout { millis: u64 },
    #[error("store unavailable: {0}")] Unavailable(String),
    #[error("corrupted record: {0}")] Corrupted(String),
    #[error("invalid request: {0}")] InvalidRequest(String),
}

impl StoreError {
    /// Whether the caller may retry the whole read-modify-write.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_) | Self::Timeout { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomyError {
    #[error("invalid amount: {0}")] InvalidAmount(i64),
    #[error("invalid target: {0}")] InvalidTarget(String),
    #[error("insufficient funds: have {have}, need {need}")] InsufficientFunds { have: u64, need: u64 },
    #[error("cooldown active: {remaining_secs}s remaining")] CooldownActive { remaining_secs: u64 },
    #[error("balance overflow")] BalanceOverflow,
    #[error(transparent)] Store(#[from] StoreError),
}

impl EconomyError {
    /// Validation failures are terminal for the request and reported as-is.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::InvalidTarget(_)
                | Self::InsufficientFunds { .. }
                | Self::CooldownActive { .. }
        )
    }

    /// Whether this wraps a store conflict that a fresh read may resolve.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(StoreError::ConcurrentModification(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_store_errors() {
        assert!(StoreError::ConcurrentModification(AccountId::from("a")).is_retryable());
        assert!(StoreError::Timeout { millis: 10 }.is_retryable());
        assert!(!StoreError::Unavailable("down".into()).is_retryable());
        assert!(!StoreError::NotFound(AccountId::from("a")).is_retryable());
    }

    #[test]
    fn validation_kinds() {
        assert!(EconomyError::InvalidAmount(0).is_validation());
        assert!(EconomyError::InvalidTarget("self".into()).is_validation());
        assert!(EconomyError::InsufficientFunds { have: 1, need: 2 }.is_validation());
        assert!(EconomyError::CooldownActive { remaining_secs: 5 }.is_validation());
        assert!(!EconomyError::BalanceOverflow.is_validation());
        assert!(!EconomyError::from(StoreError::Timeout { millis: 1 }).is_validation());
    }

    #[test]
    fn conflict_detection() {
        let err: EconomyError = StoreError::ConcurrentModification(AccountId::from("x")).into();
        assert!(err.is_conflict());
        assert!(!EconomyError::BalanceOverflow.is_conflict());
    }

    #[test]
    fn display_messages() {
        let err = EconomyError::InsufficientFunds { have: 3, need: 10 };
        assert_eq!(err.to_string(), "insufficient funds: have 3, need 10");
        let err: EconomyError = StoreError::Unavailable("disk".into()).into();
        assert_eq!(err.to_string(), "store unavailable: disk");
    }
}
