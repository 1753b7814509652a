use cosmwasm_std::{
    Addr, CosmosMsg, Deps, DepsMut, Empty, Env, MessageInfo, Order, Response, StdResult, Uint128,
};

use cw_storage_plus::Bound;

use crate::error::ContractError;
use crate::gauge::{gauge_weight, user_vote};
use crate::msg::BribeClaimResponse;
use crate::state::{
    Bribe, PositionId, BRIBES, BRIBES_BY_GAUGE, BRIBE_CLAIMED_TOTAL, BRIBE_CLAIMS, BRIBE_COUNT,
    BRIBE_SWEPT, CONFIG, GAUGES, WHITELISTED_TOKENS,
};
use crate::utils::{
    bps_share, cw20_transfer_msg, ensure_owner, get_epoch, DEFAULT_LIMIT, MAX_LIMIT,
};
use crate::voting_escrow::load_owned_position;

/// Marketplace fee taken from every bribe, in bps.
pub const BRIBE_FEE_BPS: u64 = 200;

/// Epochs after the bribe epoch during which voters can claim before the remainder may be swept.
pub const BRIBE_CLAIM_EPOCHS: u64 = 4;

/// Posts a bribe for voters of `gauge` in `epoch`.
/// The tokens were already transferred to the contract through the CW20 hook of `token`.
pub(crate) fn create_bribe(
    deps: DepsMut,
    env: Env,
    creator: Addr,
    token: Addr,
    amount: Uint128,
    epoch: u64,
    gauge: String,
) -> Result<Response, ContractError> {
    if amount.is_zero() {
        return Err(ContractError::InvalidAmount {});
    }
    if !WHITELISTED_TOKENS.has(deps.storage, &token) {
        return Err(ContractError::TokenNotWhitelisted {
            token: token.to_string(),
        });
    }
    let gauge = deps.api.addr_validate(&gauge)?;
    if !GAUGES.has(deps.storage, &gauge) {
        return Err(ContractError::UnknownGauge {
            gauge: gauge.to_string(),
        });
    }
    let config = CONFIG.load(deps.storage)?;
    let current = get_epoch(config.epoch_start, env.block.time.seconds())?;
    if epoch < current {
        return Err(ContractError::EpochFinished { epoch });
    }

    let fee_amount = bps_share(amount, BRIBE_FEE_BPS);
    let net_amount = amount - fee_amount;

    let id = BRIBE_COUNT.update(deps.storage, |count| -> StdResult<_> { Ok(count + 1) })?;
    let bribe = Bribe {
        id,
        creator,
        epoch,
        gauge: gauge.clone(),
        token: token.clone(),
        gross_amount: amount,
        net_amount,
        fee_amount,
    };
    BRIBES.save(deps.storage, id, &bribe)?;
    BRIBES_BY_GAUGE.save(deps.storage, (epoch, &gauge, id), &Empty {})?;

    let mut response = Response::new();
    if !fee_amount.is_zero() {
        response = response.add_message(cw20_transfer_msg(&token, &config.treasury, fee_amount)?);
    }

    Ok(response
        .add_attribute("action", "create_bribe")
        .add_attribute("bribe_id", id.to_string())
        .add_attribute("creator", bribe.creator)
        .add_attribute("epoch", epoch.to_string())
        .add_attribute("gauge", gauge)
        .add_attribute("token", token)
        .add_attribute("net_amount", net_amount)
        .add_attribute("fee_amount", fee_amount))
}

/// Pays a voter its share of a bribe once the bribe epoch is over.
pub(crate) fn claim_bribe(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    bribe_id: u64,
    position_id: PositionId,
) -> Result<Response, ContractError> {
    load_owned_position(deps.storage, position_id, &info.sender)?;
    let bribe = BRIBES.load(deps.storage, bribe_id)?;

    let config = CONFIG.load(deps.storage)?;
    let current = get_epoch(config.epoch_start, env.block.time.seconds())?;
    if current <= bribe.epoch {
        return Err(ContractError::EpochNotFinished { epoch: bribe.epoch });
    }
    if BRIBE_SWEPT.has(deps.storage, bribe_id) {
        return Err(ContractError::BribeSwept {});
    }
    if BRIBE_CLAIMS.has(deps.storage, (bribe_id, position_id.u64())) {
        return Err(ContractError::AlreadyClaimed {});
    }

    let user_weight = user_vote(deps.storage, position_id, bribe.epoch)?
        .map(|record| record.weight_for(&bribe.gauge))
        .unwrap_or_default();
    if user_weight.is_zero() {
        return Err(ContractError::NoVoteForGauge {});
    }
    let total_weight = gauge_weight(deps.storage, &bribe.gauge, bribe.epoch)?;
    if total_weight.is_zero() {
        return Err(ContractError::DivideByZero {});
    }
    let share = bribe.net_amount.multiply_ratio(user_weight, total_weight);

    BRIBE_CLAIMS.save(deps.storage, (bribe_id, position_id.u64()), &share)?;
    BRIBE_CLAIMED_TOTAL.update(deps.storage, bribe_id, |claimed| -> StdResult<_> {
        Ok(claimed.unwrap_or_default().checked_add(share)?)
    })?;

    let mut response = Response::new();
    if !share.is_zero() {
        response = response.add_message(cw20_transfer_msg(&bribe.token, &info.sender, share)?);
    }

    Ok(response
        .add_attribute("action", "claim_bribe")
        .add_attribute("bribe_id", bribe_id.to_string())
        .add_attribute("position_id", position_id.to_string())
        .add_attribute("amount", share))
}

/// Returns what voters did not take from a bribe.
/// With no votes for the gauge the creator is refunded right after the epoch; otherwise the
/// remainder goes to the treasury once the claim window is over.
pub(crate) fn sweep_bribe(
    deps: DepsMut,
    env: Env,
    bribe_id: u64,
) -> Result<Response, ContractError> {
    let bribe = BRIBES.load(deps.storage, bribe_id)?;
    if BRIBE_SWEPT.has(deps.storage, bribe_id) {
        return Err(ContractError::BribeSwept {});
    }

    let config = CONFIG.load(deps.storage)?;
    let current = get_epoch(config.epoch_start, env.block.time.seconds())?;
    if current <= bribe.epoch {
        return Err(ContractError::EpochNotFinished { epoch: bribe.epoch });
    }

    let recipient = if gauge_weight(deps.storage, &bribe.gauge, bribe.epoch)?.is_zero() {
        bribe.creator.clone()
    } else {
        let available_at = bribe.epoch + 1 + BRIBE_CLAIM_EPOCHS;
        if current < available_at {
            return Err(ContractError::SweepNotAvailable { available_at });
        }
        config.treasury
    };

    let claimed = BRIBE_CLAIMED_TOTAL
        .may_load(deps.storage, bribe_id)?
        .unwrap_or_default();
    let remainder = bribe.net_amount.checked_sub(claimed)?;
    BRIBE_SWEPT.save(deps.storage, bribe_id, &remainder)?;

    let mut response = Response::new();
    if !remainder.is_zero() {
        response = response.add_message(cw20_transfer_msg(&bribe.token, &recipient, remainder)?);
    }

    Ok(response
        .add_attribute("action", "sweep_bribe")
        .add_attribute("bribe_id", bribe_id.to_string())
        .add_attribute("recipient", recipient)
        .add_attribute("amount", remainder))
}

pub(crate) fn whitelist_token(
    deps: DepsMut,
    info: MessageInfo,
    token: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info.sender)?;

    let token = deps.api.addr_validate(&token)?;
    WHITELISTED_TOKENS.save(deps.storage, &token, &Empty {})?;

    Ok(Response::new()
        .add_attribute("action", "whitelist_token")
        .add_attribute("token", token))
}

/// Delisting only blocks new bribes; existing ones stay claimable.
pub(crate) fn delist_token(
    deps: DepsMut,
    info: MessageInfo,
    token: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info.sender)?;

    let token = deps.api.addr_validate(&token)?;
    if !WHITELISTED_TOKENS.has(deps.storage, &token) {
        return Err(ContractError::TokenNotWhitelisted {
            token: token.to_string(),
        });
    }
    WHITELISTED_TOKENS.remove(deps.storage, &token);

    Ok(Response::new()
        .add_attribute("action", "delist_token")
        .add_attribute("token", token))
}

pub(crate) fn query_bribe(deps: Deps, bribe_id: u64) -> StdResult<Bribe> {
    BRIBES.load(deps.storage, bribe_id)
}

pub(crate) fn query_bribes_for_gauge(
    deps: Deps,
    epoch: u64,
    gauge: String,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Vec<Bribe>> {
    let gauge = deps.api.addr_validate(&gauge)?;
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    BRIBES_BY_GAUGE
        .prefix((epoch, &gauge))
        .keys(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|id| BRIBES.load(deps.storage, id?))
        .collect()
}

pub(crate) fn query_bribe_claim(
    deps: Deps,
    bribe_id: u64,
    position_id: PositionId,
) -> StdResult<BribeClaimResponse> {
    let claim = BRIBE_CLAIMS.may_load(deps.storage, (bribe_id, position_id.u64()))?;
    Ok(BribeClaimResponse {
        claimed: claim.is_some(),
        amount: claim.unwrap_or_default(),
    })
}

pub(crate) fn query_whitelisted_tokens(deps: Deps) -> StdResult<Vec<String>> {
    WHITELISTED_TOKENS
        .keys(deps.storage, None, None, Order::Ascending)
        .map(|token| token.map(String::from))
        .collect()
}
