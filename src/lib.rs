pub mod boost;
pub mod bribe;
pub mod contract;
pub mod emission;
mod error;
pub mod gauge;
pub mod msg;
pub mod rewards;
pub mod router;
pub mod state;
pub mod utils;
pub mod voting_escrow;

#[cfg(test)]
mod testing;

pub use crate::error::ContractError;
