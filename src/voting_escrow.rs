use cosmwasm_std::{
    Addr, Deps, DepsMut, Empty, Env, MessageInfo, Order, Response, StdResult, Storage, Uint128,
};
use cw_storage_plus::Bound;

use crate::error::ContractError;
use crate::msg::{PositionsResponse, VotingPowerResponse};
use crate::state::{
    LockPosition, PositionId, CONFIG, OWNED_POSITIONS, POSITIONS, POSITION_COUNT, TOTAL_LOCKED,
};
use crate::utils::{cw20_transfer_msg, DEFAULT_LIMIT, MAX_LIMIT, MAX_LOCK};

/// Voting power of `amount` locked until `lock_end`, observed at `time`:
/// amount * (lock_end - time) / MAX_LOCK, zero once `time` reaches `lock_end`.
/// The remaining duration is capped at [`MAX_LOCK`] so power never exceeds the locked amount.
pub fn calc_voting_power(amount: Uint128, lock_end: u64, time: u64) -> Uint128 {
    if time >= lock_end {
        return Uint128::zero();
    }
    let remaining = (lock_end - time).min(MAX_LOCK);
    amount.multiply_ratio(remaining, MAX_LOCK)
}

/// Voting power of a position at `time`.
pub fn voting_power_of(position: &LockPosition, time: u64) -> Uint128 {
    calc_voting_power(position.locked_amount, position.lock_end, time)
}

/// Checks that a lock end lies in (now, now + MAX_LOCK].
fn lock_end_check(now: u64, lock_end: u64) -> Result<(), ContractError> {
    if lock_end <= now || lock_end > now + MAX_LOCK {
        return Err(ContractError::InvalidDuration {});
    }
    Ok(())
}

/// Loads a position and checks that `sender` owns it.
pub(crate) fn load_owned_position(
    storage: &dyn Storage,
    position_id: PositionId,
    sender: &Addr,
) -> Result<LockPosition, ContractError> {
    let position = POSITIONS.load(storage, position_id.u64())?;
    if position.owner != *sender || !OWNED_POSITIONS.has(storage, (sender, position_id.u64())) {
        return Err(ContractError::NotOwner {});
    }
    Ok(position)
}

/// Creates a new lock position for `owner`.
/// The tokens were already transferred to the contract through the CW20 hook.
pub(crate) fn create_lock(
    deps: DepsMut,
    env: Env,
    owner: Addr,
    amount: Uint128,
    lock_end: u64,
) -> Result<Response, ContractError> {
    if amount.is_zero() {
        return Err(ContractError::InvalidAmount {});
    }
    let now = env.block.time.seconds();
    lock_end_check(now, lock_end)?;

    let id = POSITION_COUNT.may_load(deps.storage)?.unwrap_or_default() + 1;
    POSITION_COUNT.save(deps.storage, &id)?;

    let position = LockPosition {
        id: PositionId(id),
        owner: owner.clone(),
        locked_amount: amount,
        lock_end,
        created_at: now,
    };
    POSITIONS.save(deps.storage, id, &position)?;
    OWNED_POSITIONS.save(deps.storage, (&owner, id), &Empty {})?;
    TOTAL_LOCKED.update(deps.storage, |total| -> StdResult<_> {
        Ok(total.checked_add(amount)?)
    })?;

    Ok(Response::new()
        .add_attribute("action", "create_lock")
        .add_attribute("position_id", id.to_string())
        .add_attribute("owner", owner)
        .add_attribute("amount", amount)
        .add_attribute("lock_end", lock_end.to_string())
        .add_attribute("voting_power", voting_power_of(&position, now)))
}

/// Deposits more tokens into an unexpired position owned by `sender`.
pub(crate) fn increase_amount(
    deps: DepsMut,
    env: Env,
    sender: Addr,
    position_id: PositionId,
    amount: Uint128,
) -> Result<Response, ContractError> {
    if amount.is_zero() {
        return Err(ContractError::InvalidAmount {});
    }
    let mut position = load_owned_position(deps.storage, position_id, &sender)?;
    let now = env.block.time.seconds();
    if position.lock_end <= now {
        return Err(ContractError::LockExpired {});
    }

    position.locked_amount = position.locked_amount.checked_add(amount)?;
    POSITIONS.save(deps.storage, position_id.u64(), &position)?;
    TOTAL_LOCKED.update(deps.storage, |total| -> StdResult<_> {
        Ok(total.checked_add(amount)?)
    })?;

    Ok(Response::new()
        .add_attribute("action", "increase_amount")
        .add_attribute("position_id", position_id.to_string())
        .add_attribute("amount", amount)
        .add_attribute("locked_amount", position.locked_amount))
}

/// Moves the lock end of a position further into the future.
pub(crate) fn extend_lock(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    position_id: PositionId,
    new_lock_end: u64,
) -> Result<Response, ContractError> {
    let mut position = load_owned_position(deps.storage, position_id, &info.sender)?;
    let now = env.block.time.seconds();
    if position.lock_end <= now {
        return Err(ContractError::LockExpired {});
    }
    if new_lock_end < position.lock_end {
        return Err(ContractError::ShorteningNotAllowed {});
    }
    lock_end_check(now, new_lock_end)?;

    position.lock_end = new_lock_end;
    POSITIONS.save(deps.storage, position_id.u64(), &position)?;

    Ok(Response::new()
        .add_attribute("action", "extend_lock")
        .add_attribute("position_id", position_id.to_string())
        .add_attribute("lock_end", new_lock_end.to_string())
        .add_attribute("voting_power", voting_power_of(&position, now)))
}

/// Withdraws the whole amount of an expired position and destroys it.
pub(crate) fn withdraw(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    position_id: PositionId,
) -> Result<Response, ContractError> {
    let position = load_owned_position(deps.storage, position_id, &info.sender)?;
    if env.block.time.seconds() < position.lock_end {
        return Err(ContractError::LockNotExpired {});
    }

    let config = CONFIG.load(deps.storage)?;
    POSITIONS.remove(deps.storage, position_id.u64());
    OWNED_POSITIONS.remove(deps.storage, (&info.sender, position_id.u64()));
    TOTAL_LOCKED.update(deps.storage, |total| -> StdResult<_> {
        Ok(total.checked_sub(position.locked_amount)?)
    })?;

    let transfer_msg = cw20_transfer_msg(
        &config.protocol_token,
        &info.sender,
        position.locked_amount,
    )?;

    Ok(Response::new()
        .add_message(transfer_msg)
        .add_attribute("action", "withdraw")
        .add_attribute("position_id", position_id.to_string())
        .add_attribute("amount", position.locked_amount))
}

pub(crate) fn query_position(deps: Deps, position_id: PositionId) -> StdResult<LockPosition> {
    POSITIONS.load(deps.storage, position_id.u64())
}

pub(crate) fn query_positions_by_owner(
    deps: Deps,
    owner: String,
    start_after: Option<PositionId>,
    limit: Option<u32>,
) -> StdResult<PositionsResponse> {
    let owner = deps.api.addr_validate(&owner)?;
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(|id| Bound::exclusive(id.u64()));

    let positions = OWNED_POSITIONS
        .prefix(&owner)
        .keys(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|id| POSITIONS.load(deps.storage, id?))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(PositionsResponse { positions })
}

pub(crate) fn query_voting_power(
    deps: Deps,
    env: Env,
    position_id: PositionId,
    time: Option<u64>,
) -> StdResult<VotingPowerResponse> {
    let time = time.unwrap_or_else(|| env.block.time.seconds());
    let voting_power = POSITIONS
        .may_load(deps.storage, position_id.u64())?
        .map(|position| voting_power_of(&position, time))
        .unwrap_or_default();
    Ok(VotingPowerResponse { voting_power })
}

pub(crate) fn query_simulate_lock(
    env: Env,
    amount: Uint128,
    lock_end: u64,
) -> StdResult<VotingPowerResponse> {
    let now = env.block.time.seconds();
    let voting_power = if lock_end > now + MAX_LOCK {
        Uint128::zero()
    } else {
        calc_voting_power(amount, lock_end, now)
    };
    Ok(VotingPowerResponse { voting_power })
}

pub(crate) fn query_total_locked(deps: Deps) -> StdResult<Uint128> {
    Ok(TOTAL_LOCKED.may_load(deps.storage)?.unwrap_or_default())
}
