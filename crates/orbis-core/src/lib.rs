//! # orbis-core
//! Foundation types and traits for the Orbis economy.

pub mod constants;
pub mod error;
pub mod level;
pub mod locks;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{EconomyError, StoreError};
pub use level::LevelCurve;
pub use memory::MemoryAccountStore;
pub use traits::{AccountStore, FortuneSource, NeutralFortune};
pub use types::{Account, AccountId, AccountUpdate, ActivitySnapshot, Participant};
