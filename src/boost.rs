use cosmwasm_std::{
    Addr, Decimal, Deps, DepsMut, Env, MessageInfo, Response, StdResult, Storage, Uint128,
};

use crate::error::ContractError;
use crate::msg::MultiplierResponse;
use crate::state::{BoostTier, StakePosition, BOOST_TIERS, CONFIG, STAKES, TOTAL_STAKED};
use crate::utils::{cw20_transfer_msg, BPS_DENOMINATOR, WEEK};

/// Base units in one protocol token.
pub const TOKEN_UNIT: u128 = 1_000_000;

/// Minimum time a stake stays locked after the latest deposit.
pub const STAKE_LOCK: u64 = WEEK;

pub fn default_boost_tiers() -> Vec<BoostTier> {
    vec![
        BoostTier {
            min_stake: Uint128::new(50_000 * TOKEN_UNIT),
            multiplier_bps: 15_000,
        },
        BoostTier {
            min_stake: Uint128::new(10_000 * TOKEN_UNIT),
            multiplier_bps: 12_500,
        },
    ]
}

/// Tiers must be sorted by strictly descending minimum stake and never boost below 1x.
pub fn validate_tiers(tiers: &[BoostTier]) -> Result<(), ContractError> {
    if tiers
        .iter()
        .any(|tier| tier.multiplier_bps < BPS_DENOMINATOR || tier.min_stake.is_zero())
    {
        return Err(ContractError::InvalidBoostTiers {});
    }
    if tiers
        .windows(2)
        .any(|pair| pair[0].min_stake <= pair[1].min_stake)
    {
        return Err(ContractError::InvalidBoostTiers {});
    }
    Ok(())
}

/// Multiplier in bps of the highest tier `staked` reaches, 1x below every tier.
pub fn tier_multiplier(tiers: &[BoostTier], staked: Uint128) -> u64 {
    tiers
        .iter()
        .find(|tier| staked >= tier.min_stake)
        .map(|tier| tier.multiplier_bps)
        .unwrap_or(BPS_DENOMINATOR)
}

pub(crate) fn multiplier_bps(storage: &dyn Storage, owner: &Addr) -> StdResult<u64> {
    let staked = STAKES
        .may_load(storage, owner)?
        .map(|stake| stake.staked_amount)
        .unwrap_or_default();
    let tiers = BOOST_TIERS.load(storage)?;
    Ok(tier_multiplier(&tiers, staked))
}

/// Adds to the stake of `owner` and restarts its lock.
/// The tokens were already transferred to the contract through the CW20 hook.
pub(crate) fn stake(
    deps: DepsMut,
    env: Env,
    owner: Addr,
    amount: Uint128,
) -> Result<Response, ContractError> {
    if amount.is_zero() {
        return Err(ContractError::InvalidAmount {});
    }
    let unlock_at = env.block.time.seconds() + STAKE_LOCK;

    TOTAL_STAKED.update(deps.storage, |total| -> StdResult<_> {
        Ok(total.checked_add(amount)?)
    })?;
    let position = STAKES.update(deps.storage, &owner, |stake| -> StdResult<_> {
        Ok(match stake {
            Some(stake) => StakePosition {
                staked_amount: stake.staked_amount.checked_add(amount)?,
                unlock_at,
                ..stake
            },
            None => StakePosition {
                owner: owner.clone(),
                staked_amount: amount,
                unlock_at,
            },
        })
    })?;

    Ok(Response::new()
        .add_attribute("action", "stake")
        .add_attribute("owner", owner)
        .add_attribute("amount", amount)
        .add_attribute("staked_amount", position.staked_amount)
        .add_attribute("unlock_at", unlock_at.to_string()))
}

/// Withdraws the whole stake of the sender once it is unlocked.
pub(crate) fn unstake(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let position = STAKES
        .may_load(deps.storage, &info.sender)?
        .ok_or(ContractError::NoStake {})?;
    if env.block.time.seconds() < position.unlock_at {
        return Err(ContractError::LockActive {});
    }

    STAKES.remove(deps.storage, &info.sender);
    TOTAL_STAKED.update(deps.storage, |total| -> StdResult<_> {
        Ok(total.checked_sub(position.staked_amount)?)
    })?;

    let config = CONFIG.load(deps.storage)?;
    Ok(Response::new()
        .add_message(cw20_transfer_msg(
            &config.protocol_token,
            &info.sender,
            position.staked_amount,
        )?)
        .add_attribute("action", "unstake")
        .add_attribute("owner", info.sender)
        .add_attribute("amount", position.staked_amount))
}

pub(crate) fn query_stake(deps: Deps, owner: String) -> StdResult<Option<StakePosition>> {
    let owner = deps.api.addr_validate(&owner)?;
    STAKES.may_load(deps.storage, &owner)
}

pub(crate) fn query_multiplier(deps: Deps, owner: String) -> StdResult<MultiplierResponse> {
    let owner = deps.api.addr_validate(&owner)?;
    let multiplier_bps = multiplier_bps(deps.storage, &owner)?;
    Ok(MultiplierResponse {
        multiplier_bps,
        multiplier: Decimal::from_ratio(multiplier_bps, BPS_DENOMINATOR),
    })
}
