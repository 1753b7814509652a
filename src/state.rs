use std::fmt;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Empty, Uint128};
use cw_storage_plus::{Item, Map};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// This structure stores the main parameters for the contract.
#[cw_serde]
pub struct Config {
    /// Address that's allowed to register gauges, whitelist bribe tokens and change config
    pub owner: Addr,
    /// Protocol token: locked, staked, paid as rewards and minted as emissions
    pub protocol_token: Addr,
    /// Receives bribe fees and swept bribe remainders
    pub treasury: Addr,
    /// Address allowed to publish reward merkle roots
    pub reward_publisher: Addr,
    /// Timestamp of the first second of epoch 0
    pub epoch_start: u64,
}

/// Identifier of a lock position.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(transparent)]
pub struct PositionId(pub u64);

impl PositionId {
    pub fn u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// This structure stores data about a lock position.
#[cw_serde]
pub struct LockPosition {
    pub id: PositionId,
    pub owner: Addr,
    /// The total amount of protocol tokens deposited in the position
    pub locked_amount: Uint128,
    /// The timestamp when the lock position expires
    pub lock_end: u64,
    pub created_at: u64,
}

/// A single gauge allocation inside a vote record.
#[cw_serde]
pub struct GaugeVote {
    pub gauge: Addr,
    pub bps: u64,
    /// Voting power assigned to the gauge
    pub weight: Uint128,
}

/// The active vote of a position for one epoch.
#[cw_serde]
pub struct VoteRecord {
    pub position_id: PositionId,
    pub voter: Addr,
    pub epoch: u64,
    /// Position voting power at the time of the vote
    pub voting_power: Uint128,
    pub votes: Vec<GaugeVote>,
}

impl VoteRecord {
    /// Weight this record assigns to `gauge`, zero if the gauge is not part of the vote.
    pub fn weight_for(&self, gauge: &Addr) -> Uint128 {
        self.votes
            .iter()
            .find(|vote| &vote.gauge == gauge)
            .map(|vote| vote.weight)
            .unwrap_or_default()
    }
}

#[cw_serde]
pub struct GaugeInfo {
    /// Epoch in which the gauge was registered
    pub added_at_epoch: u64,
}

/// Emission curve parameters. Offsets are measured from `start`.
#[cw_serde]
pub struct EmissionSchedule {
    pub start: u64,
    /// Daily emission during phase A
    pub phase_a_rate: Uint128,
    /// Daily emission from the end of phase B onwards
    pub phase_b_rate: Uint128,
    /// Seconds after `start` at which the linear decay begins
    pub phase_a_end: u64,
    /// Seconds after `start` at which the decay reaches `phase_b_rate`
    pub phase_b_end: u64,
}

/// Division of the liquidity slice between LP pairs and the stability pool.
#[cw_serde]
pub struct LpSplit {
    pub lp_pairs_bps: u64,
    pub stability_pool_bps: u64,
}

impl Default for LpSplit {
    fn default() -> Self {
        LpSplit {
            lp_pairs_bps: 5_000,
            stability_pool_bps: 5_000,
        }
    }
}

#[cw_serde]
pub struct ChannelConfig {
    pub debt_sink: Addr,
    pub lp_gauge_sink: Addr,
    pub stability_pool_sink: Addr,
    pub eco_sink: Addr,
    pub debt_bps: u64,
    pub lp_gauge_bps: u64,
    pub stability_pool_bps: u64,
    pub eco_bps: u64,
}

#[cw_serde]
pub struct DistributionRecord {
    pub epoch: u64,
    /// Daily rate the epoch was minted at
    pub rate: Uint128,
    pub total: Uint128,
    pub debt: Uint128,
    pub lp_gauge: Uint128,
    pub stability_pool: Uint128,
    pub eco: Uint128,
    pub distributed_at: u64,
}

#[cw_serde]
pub struct Bribe {
    pub id: u64,
    pub creator: Addr,
    pub epoch: u64,
    pub gauge: Addr,
    pub token: Addr,
    pub gross_amount: Uint128,
    pub net_amount: Uint128,
    pub fee_amount: Uint128,
}

#[cw_serde]
pub struct StakePosition {
    pub owner: Addr,
    pub staked_amount: Uint128,
    pub unlock_at: u64,
}

#[cw_serde]
pub struct BoostTier {
    /// Minimum stake for the tier, in base units
    pub min_stake: Uint128,
    /// 10000 is 1x
    pub multiplier_bps: u64,
}

/// Stores the contract config at the given key
pub const CONFIG: Item<Config> = Item::new("config");

// voting escrow
pub const POSITION_COUNT: Item<u64> = Item::new("position_count");
pub const POSITIONS: Map<u64, LockPosition> = Map::new("positions");
/// Ownership index: (owner, position id)
pub const OWNED_POSITIONS: Map<(&Addr, u64), Empty> = Map::new("owned_positions");
pub const TOTAL_LOCKED: Item<Uint128> = Item::new("total_locked");

// gauge controller
pub const GAUGES: Map<&Addr, GaugeInfo> = Map::new("gauges");
/// Active vote per (epoch, position id)
pub const VOTES: Map<(u64, u64), VoteRecord> = Map::new("votes");
/// Aggregate weight per (epoch, gauge)
pub const GAUGE_WEIGHTS: Map<(u64, &Addr), Uint128> = Map::new("gauge_weights");
/// Sum of all gauge weights per epoch
pub const EPOCH_TOTAL_WEIGHT: Map<u64, Uint128> = Map::new("epoch_total_weight");

// emission manager and router
pub const EMISSION_SCHEDULE: Item<EmissionSchedule> = Item::new("emission_schedule");
pub const LP_SPLIT: Item<LpSplit> = Item::new("lp_split");
pub const CHANNELS: Item<ChannelConfig> = Item::new("channels");
/// Processed epochs
pub const DISTRIBUTIONS: Map<u64, DistributionRecord> = Map::new("distributions");
pub const EMISSION_POLICY: Map<&Addr, Empty> = Map::new("emission_policy");

// bribe marketplace
pub const BRIBE_COUNT: Item<u64> = Item::new("bribe_count");
pub const BRIBES: Map<u64, Bribe> = Map::new("bribes");
/// Bribe ids by (epoch, gauge)
pub const BRIBES_BY_GAUGE: Map<(u64, &Addr, u64), Empty> = Map::new("bribes_by_gauge");
/// Amount paid per (bribe id, position id)
pub const BRIBE_CLAIMS: Map<(u64, u64), Uint128> = Map::new("bribe_claims");
pub const BRIBE_CLAIMED_TOTAL: Map<u64, Uint128> = Map::new("bribe_claimed_total");
/// Amount swept per bribe id
pub const BRIBE_SWEPT: Map<u64, Uint128> = Map::new("bribe_swept");
pub const WHITELISTED_TOKENS: Map<&Addr, Empty> = Map::new("whitelisted_tokens");

// boost staking
pub const STAKES: Map<&Addr, StakePosition> = Map::new("stakes");
pub const TOTAL_STAKED: Item<Uint128> = Item::new("total_staked");
/// Sorted by descending `min_stake`
pub const BOOST_TIERS: Item<Vec<BoostTier>> = Item::new("boost_tiers");

// reward distributor
pub const REWARD_ROOTS: Map<u64, String> = Map::new("reward_roots");
/// Amount paid per (epoch, claimer)
pub const REWARD_CLAIMS: Map<(u64, &Addr), Uint128> = Map::new("reward_claims");
pub const REWARD_RESERVE: Item<Uint128> = Item::new("reward_reserve");
