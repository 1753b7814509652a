use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Decimal, Uint128};
use cw20::Cw20ReceiveMsg;

use crate::state::{
    Bribe, BoostTier, ChannelConfig, DistributionRecord, EmissionSchedule, LockPosition, LpSplit,
    PositionId, StakePosition, VoteRecord,
};

#[cw_serde]
pub struct InstantiateMsg {
    pub owner: String,
    /// CW20 token that is locked, staked and minted as emissions
    pub protocol_token: String,
    pub treasury: String,
    pub reward_publisher: String,
    /// First holder of the emission policy role
    pub emission_policy: String,
    /// Start of epoch 0, defaults to the current block time
    pub epoch_start: Option<u64>,
    pub emission: EmissionScheduleMsg,
    pub lp_split: Option<LpSplit>,
    pub boost_tiers: Option<Vec<BoostTier>>,
}

/// Emission curve parameters. Phase ends are seconds after the epoch start.
#[cw_serde]
pub struct EmissionScheduleMsg {
    pub phase_a_rate: Uint128,
    pub phase_b_rate: Uint128,
    pub phase_a_end: u64,
    pub phase_b_end: u64,
}

#[cw_serde]
pub struct GaugeAllocation {
    pub gauge: String,
    pub bps: u64,
}

#[cw_serde]
pub struct SinksMsg {
    pub debt_sink: String,
    pub lp_gauge_sink: String,
    pub stability_pool_sink: String,
    pub eco_sink: String,
    pub debt_bps: u64,
    pub lp_gauge_bps: u64,
    pub stability_pool_bps: u64,
    pub eco_bps: u64,
}

/// This structure describes the execute functions in the contract.
#[cw_serde]
pub enum ExecuteMsg {
    /// Receives a message of type [`Cw20ReceiveMsg`] and processes it depending on the received
    /// template.
    Receive(Cw20ReceiveMsg),
    /// Extend the lock end of a position
    ExtendLock {
        position_id: PositionId,
        new_lock_end: u64,
    },
    /// Withdraw the locked tokens of an expired position
    Withdraw { position_id: PositionId },
    /// Register a new gauge
    AddGauge { gauge: String },
    /// Cast or replace the current epoch vote of a position
    Vote {
        position_id: PositionId,
        allocations: Vec<GaugeAllocation>,
    },
    /// Change how the liquidity slice is divided between LP pairs and the stability pool
    SetLpSplitParams {
        lp_pairs_bps: u64,
        stability_pool_bps: u64,
    },
    /// Configure the emission channels
    SetSinks(SinksMsg),
    GrantEmissionPolicy { address: String },
    RevokeEmissionPolicy { address: String },
    /// Mint the emissions of an epoch to the configured sinks
    Distribute { epoch: u64 },
    WhitelistToken { token: String },
    DelistToken { token: String },
    ClaimBribe {
        bribe_id: u64,
        position_id: PositionId,
    },
    /// Return the unclaimed part of a bribe to the treasury, or to its creator if nobody voted
    SweepBribe { bribe_id: u64 },
    /// Withdraw the whole boost stake once it is unlocked
    Unstake {},
    PublishRewardRoot { epoch: u64, merkle_root: String },
    ClaimReward {
        epoch: u64,
        amount: Uint128,
        proof: Vec<String>,
    },
    UpdateConfig {
        owner: Option<String>,
        treasury: Option<String>,
        reward_publisher: Option<String>,
    },
}

/// This structure describes a CW20 hook message.
#[cw_serde]
pub enum ReceiveMsg {
    /// Create a lock position that expires at `lock_end`
    CreateLock { lock_end: u64 },
    /// Add tokens to an existing lock position
    IncreaseAmount { position_id: PositionId },
    /// Stake tokens for a boost multiplier
    Stake {},
    /// Top up the reserve that reward claims are paid from
    FundRewards {},
    /// Post a bribe for voters of `gauge` in `epoch`
    CreateBribe { epoch: u64, gauge: String },
}

/// This structure describes the query messages available in the contract.
#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    Config {},
    #[returns(EpochResponse)]
    CurrentEpoch {},
    /// Return information about a lock position
    #[returns(LockPosition)]
    Position { position_id: PositionId },
    #[returns(PositionsResponse)]
    PositionsByOwner {
        owner: String,
        start_after: Option<PositionId>,
        limit: Option<u32>,
    },
    /// Return the voting power of a position at `time` (defaults to now)
    #[returns(VotingPowerResponse)]
    VotingPower {
        position_id: PositionId,
        time: Option<u64>,
    },
    /// Return the voting power a new lock would get right now
    #[returns(VotingPowerResponse)]
    SimulateLock { amount: Uint128, lock_end: u64 },
    #[returns(Uint128)]
    TotalLocked {},
    #[returns(GaugesResponse)]
    Gauges {},
    #[returns(Uint128)]
    GaugeWeight { gauge: String, epoch: u64 },
    #[returns(Uint128)]
    TotalWeight { epoch: u64 },
    /// Return the vote of a position in `epoch` (defaults to the current epoch)
    #[returns(Option<VoteRecord>)]
    UserVote {
        position_id: PositionId,
        epoch: Option<u64>,
    },
    #[returns(Uint128)]
    EmissionPerDay { time: Option<u64> },
    #[returns(EmissionSchedule)]
    EmissionSchedule {},
    #[returns(LpSplit)]
    LpSplit {},
    #[returns(Option<ChannelConfig>)]
    Channels {},
    #[returns(Option<DistributionRecord>)]
    Distribution { epoch: u64 },
    /// Split of a distributed epoch's LP gauge emissions by gauge weight
    #[returns(GaugeEmissionsResponse)]
    GaugeEmissions { epoch: u64 },
    #[returns(Vec<String>)]
    EmissionPolicyHolders {},
    #[returns(Bribe)]
    Bribe { bribe_id: u64 },
    /// Bribes posted for a gauge in an epoch, ordered by id
    #[returns(Vec<Bribe>)]
    BribesForGauge {
        epoch: u64,
        gauge: String,
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(BribeClaimResponse)]
    BribeClaim {
        bribe_id: u64,
        position_id: PositionId,
    },
    #[returns(Vec<String>)]
    WhitelistedTokens {},
    #[returns(Option<StakePosition>)]
    Stake { owner: String },
    #[returns(MultiplierResponse)]
    Multiplier { owner: String },
    #[returns(Option<String>)]
    RewardRoot { epoch: u64 },
    #[returns(Option<Uint128>)]
    RewardClaimed { epoch: u64, address: String },
    #[returns(Uint128)]
    RewardReserve {},
}

/// This structure stores the parameters returned when querying for a contract's configuration.
#[cw_serde]
pub struct ConfigResponse {
    pub owner: String,
    pub protocol_token: String,
    pub treasury: String,
    pub reward_publisher: String,
    pub epoch_start: u64,
}

#[cw_serde]
pub struct EpochResponse {
    pub epoch: u64,
    pub start: u64,
    pub end: u64,
}

#[cw_serde]
pub struct PositionsResponse {
    pub positions: Vec<LockPosition>,
}

/// This structure is used to return a position's voting power.
#[cw_serde]
pub struct VotingPowerResponse {
    pub voting_power: Uint128,
}

#[cw_serde]
pub struct GaugesResponse {
    pub gauges: Vec<String>,
}

#[cw_serde]
pub struct GaugeEmission {
    pub gauge: String,
    pub weight: Uint128,
    pub amount: Uint128,
}

#[cw_serde]
pub struct GaugeEmissionsResponse {
    pub epoch: u64,
    pub lp_gauge_total: Uint128,
    pub gauges: Vec<GaugeEmission>,
}

#[cw_serde]
pub struct BribeClaimResponse {
    pub claimed: bool,
    pub amount: Uint128,
}

#[cw_serde]
pub struct MultiplierResponse {
    pub multiplier_bps: u64,
    pub multiplier: Decimal,
}

/// This structure describes a Migration message.
#[cw_serde]
pub struct MigrateMsg {}
