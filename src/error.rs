use cosmwasm_std::{OverflowError, StdError};
use thiserror::Error;

/// This enum describes ve-governance contract errors
#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    // Validation
    #[error("Amount must be greater than zero")]
    InvalidAmount {},

    #[error("Lock end must be in the future and at most 4 years away")]
    InvalidDuration {},

    #[error("Invalid allocation: {reason}")]
    InvalidAllocation { reason: String },

    #[error("Basis points must sum to 10000")]
    InvalidBps {},

    #[error("A lock can't be shortened")]
    ShorteningNotAllowed {},

    #[error("Emission schedule must be non-increasing with phase A ending before phase B")]
    InvalidEmissionSchedule {},

    #[error("Boost tiers must have descending thresholds and multipliers of at least 1x")]
    InvalidBoostTiers {},

    #[error("Merkle root must be a hex encoded 32 byte hash")]
    InvalidMerkleRoot {},

    #[error("Position has no voting power")]
    ZeroVotingPower {},

    // Authorization
    #[error("Sender does not own the position")]
    NotOwner {},

    #[error("Sender is missing the {role} role")]
    MissingRole { role: String },

    #[error("Unauthorized")]
    Unauthorized {},

    // State
    #[error("The lock time has not yet expired")]
    LockNotExpired {},

    #[error("The lock expired. Withdraw and create new lock")]
    LockExpired {},

    #[error("Stake is still locked")]
    LockActive {},

    #[error("No stake found for this address")]
    NoStake {},

    #[error("Already claimed")]
    AlreadyClaimed {},

    #[error("Emissions for epoch {epoch} were already distributed")]
    AlreadyDistributed { epoch: u64 },

    #[error("Position did not vote for this gauge in the bribe epoch")]
    NoVoteForGauge {},

    #[error("Gauge {gauge} is not registered")]
    UnknownGauge { gauge: String },

    #[error("Gauge {gauge} is already registered")]
    GaugeAlreadyExists { gauge: String },

    #[error("Token {token} is not whitelisted for bribes")]
    TokenNotWhitelisted { token: String },

    #[error("The first epoch has not started yet")]
    EpochNotStarted {},

    #[error("Epoch {epoch} has not finished yet")]
    EpochNotFinished { epoch: u64 },

    #[error("Epoch {epoch} has already finished")]
    EpochFinished { epoch: u64 },

    #[error("Epoch {epoch} is in the future")]
    FutureEpoch { epoch: u64 },

    #[error("Bribe was already swept")]
    BribeSwept {},

    #[error("Bribe can't be swept before epoch {available_at}")]
    SweepNotAvailable { available_at: u64 },

    #[error("Reward root for epoch {epoch} was already published")]
    RootAlreadyPublished { epoch: u64 },

    #[error("No reward root published for epoch {epoch}")]
    RootNotPublished { epoch: u64 },

    #[error("Invalid merkle proof")]
    InvalidProof {},

    #[error("Can't revoke the last emission policy holder")]
    LastPolicyHolder {},

    // Integrity
    #[error("Emission sinks are not configured")]
    SinksNotConfigured {},

    #[error("Division by zero")]
    DivideByZero {},

    #[error("Reward reserve can't cover the payout")]
    InsufficientRewardReserve {},

    #[error("Contract can't be migrated!")]
    MigrationError {},
}
