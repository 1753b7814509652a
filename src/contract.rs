#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    from_binary, to_binary, Binary, Deps, DepsMut, Empty, Env, MessageInfo, Response, StdError,
    StdResult, Uint128,
};
use cw2::set_contract_version;
use cw20::Cw20ReceiveMsg;

use crate::error::ContractError;
use crate::msg::{
    ConfigResponse, ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg, ReceiveMsg,
};
use crate::state::{
    Config, BOOST_TIERS, BRIBE_COUNT, CHANNELS, CONFIG, DISTRIBUTIONS, EMISSION_POLICY,
    EMISSION_SCHEDULE, LP_SPLIT, POSITION_COUNT, REWARD_RESERVE, TOTAL_LOCKED, TOTAL_STAKED,
};
use crate::utils::{check_bps_sum, ensure_owner, parse_version};
use crate::{boost, bribe, emission, gauge, rewards, router, voting_escrow};

// Version info, for migration info
const CONTRACT_NAME: &str = "ve-governance";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let epoch_start = msg.epoch_start.unwrap_or_else(|| env.block.time.seconds());
    let config = Config {
        owner: deps.api.addr_validate(&msg.owner)?,
        protocol_token: deps.api.addr_validate(&msg.protocol_token)?,
        treasury: deps.api.addr_validate(&msg.treasury)?,
        reward_publisher: deps.api.addr_validate(&msg.reward_publisher)?,
        epoch_start,
    };
    CONFIG.save(deps.storage, &config)?;

    EMISSION_SCHEDULE.save(
        deps.storage,
        &emission::build_schedule(epoch_start, msg.emission)?,
    )?;
    let lp_split = msg.lp_split.unwrap_or_default();
    check_bps_sum(&[lp_split.lp_pairs_bps, lp_split.stability_pool_bps])?;
    LP_SPLIT.save(deps.storage, &lp_split)?;

    let tiers = msg.boost_tiers.unwrap_or_else(boost::default_boost_tiers);
    boost::validate_tiers(&tiers)?;
    BOOST_TIERS.save(deps.storage, &tiers)?;

    let policy = deps.api.addr_validate(&msg.emission_policy)?;
    EMISSION_POLICY.save(deps.storage, &policy, &Empty {})?;

    POSITION_COUNT.save(deps.storage, &0)?;
    BRIBE_COUNT.save(deps.storage, &0)?;
    TOTAL_LOCKED.save(deps.storage, &Uint128::zero())?;
    TOTAL_STAKED.save(deps.storage, &Uint128::zero())?;
    REWARD_RESERVE.save(deps.storage, &Uint128::zero())?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("owner", config.owner)
        .add_attribute("protocol_token", config.protocol_token)
        .add_attribute("epoch_start", epoch_start.to_string()))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::Receive(msg) => receive_cw20(deps, env, info, msg),
        ExecuteMsg::ExtendLock {
            position_id,
            new_lock_end,
        } => voting_escrow::extend_lock(deps, env, info, position_id, new_lock_end),
        ExecuteMsg::Withdraw { position_id } => {
            voting_escrow::withdraw(deps, env, info, position_id)
        }
        ExecuteMsg::AddGauge { gauge } => gauge::add_gauge(deps, env, info, gauge),
        ExecuteMsg::Vote {
            position_id,
            allocations,
        } => gauge::vote(deps, env, info, position_id, allocations),
        ExecuteMsg::SetLpSplitParams {
            lp_pairs_bps,
            stability_pool_bps,
        } => emission::set_lp_split_params(deps, info, lp_pairs_bps, stability_pool_bps),
        ExecuteMsg::SetSinks(msg) => router::set_sinks(deps, info, msg),
        ExecuteMsg::GrantEmissionPolicy { address } => {
            router::grant_emission_policy(deps, info, address)
        }
        ExecuteMsg::RevokeEmissionPolicy { address } => {
            router::revoke_emission_policy(deps, info, address)
        }
        ExecuteMsg::Distribute { epoch } => router::distribute(deps, env, epoch),
        ExecuteMsg::WhitelistToken { token } => bribe::whitelist_token(deps, info, token),
        ExecuteMsg::DelistToken { token } => bribe::delist_token(deps, info, token),
        ExecuteMsg::ClaimBribe {
            bribe_id,
            position_id,
        } => bribe::claim_bribe(deps, env, info, bribe_id, position_id),
        ExecuteMsg::SweepBribe { bribe_id } => bribe::sweep_bribe(deps, env, bribe_id),
        ExecuteMsg::Unstake {} => boost::unstake(deps, env, info),
        ExecuteMsg::PublishRewardRoot { epoch, merkle_root } => {
            rewards::publish_reward_root(deps, info, epoch, merkle_root)
        }
        ExecuteMsg::ClaimReward {
            epoch,
            amount,
            proof,
        } => rewards::claim_reward(deps, info, epoch, amount, proof),
        ExecuteMsg::UpdateConfig {
            owner,
            treasury,
            reward_publisher,
        } => update_config(deps, info, owner, treasury, reward_publisher),
    }
}

/// Receives a message of type [`Cw20ReceiveMsg`] and processes it depending on the received
/// template. Everything but bribes must be paid in the protocol token.
fn receive_cw20(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    cw20_msg: Cw20ReceiveMsg,
) -> Result<Response, ContractError> {
    let sender = deps.api.addr_validate(&cw20_msg.sender)?;
    let amount = cw20_msg.amount;
    let msg: ReceiveMsg = from_binary(&cw20_msg.msg)?;

    if let ReceiveMsg::CreateBribe { epoch, gauge } = msg {
        return bribe::create_bribe(deps, env, sender, info.sender, amount, epoch, gauge);
    }

    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.protocol_token {
        return Err(ContractError::Unauthorized {});
    }

    match msg {
        ReceiveMsg::CreateLock { lock_end } => {
            voting_escrow::create_lock(deps, env, sender, amount, lock_end)
        }
        ReceiveMsg::IncreaseAmount { position_id } => {
            voting_escrow::increase_amount(deps, env, sender, position_id, amount)
        }
        ReceiveMsg::Stake {} => boost::stake(deps, env, sender, amount),
        ReceiveMsg::FundRewards {} => rewards::fund_rewards(deps, sender, amount),
        ReceiveMsg::CreateBribe { .. } => Err(ContractError::Unauthorized {}),
    }
}

fn update_config(
    deps: DepsMut,
    info: MessageInfo,
    owner: Option<String>,
    treasury: Option<String>,
    reward_publisher: Option<String>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info.sender)?;

    let mut res = Response::new().add_attribute("action", "update_config");
    if let Some(owner) = owner {
        config.owner = deps.api.addr_validate(&owner)?;
        res = res.add_attribute("owner", owner);
    }
    if let Some(treasury) = treasury {
        config.treasury = deps.api.addr_validate(&treasury)?;
        res = res.add_attribute("treasury", treasury);
    }
    if let Some(reward_publisher) = reward_publisher {
        config.reward_publisher = deps.api.addr_validate(&reward_publisher)?;
        res = res.add_attribute("reward_publisher", reward_publisher);
    }
    CONFIG.save(deps.storage, &config)?;

    Ok(res)
}

fn to_std(err: ContractError) -> StdError {
    match err {
        ContractError::Std(err) => err,
        err => StdError::generic_err(err.to_string()),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_binary(&query_config(deps)?),
        QueryMsg::CurrentEpoch {} => {
            to_binary(&gauge::query_current_epoch(deps, env).map_err(to_std)?)
        }
        QueryMsg::Position { position_id } => {
            to_binary(&voting_escrow::query_position(deps, position_id)?)
        }
        QueryMsg::PositionsByOwner {
            owner,
            start_after,
            limit,
        } => to_binary(&voting_escrow::query_positions_by_owner(
            deps,
            owner,
            start_after,
            limit,
        )?),
        QueryMsg::VotingPower { position_id, time } => to_binary(
            &voting_escrow::query_voting_power(deps, env, position_id, time)?,
        ),
        QueryMsg::SimulateLock { amount, lock_end } => {
            to_binary(&voting_escrow::query_simulate_lock(env, amount, lock_end)?)
        }
        QueryMsg::TotalLocked {} => to_binary(&voting_escrow::query_total_locked(deps)?),
        QueryMsg::Gauges {} => to_binary(&gauge::query_gauges(deps)?),
        QueryMsg::GaugeWeight { gauge, epoch } => {
            to_binary(&gauge::query_gauge_weight(deps, gauge, epoch)?)
        }
        QueryMsg::TotalWeight { epoch } => to_binary(&gauge::total_weight(deps.storage, epoch)?),
        QueryMsg::UserVote { position_id, epoch } => to_binary(
            &gauge::query_user_vote(deps, env, position_id, epoch).map_err(to_std)?,
        ),
        QueryMsg::EmissionPerDay { time } => {
            to_binary(&emission::query_emission_per_day(deps, env, time)?)
        }
        QueryMsg::EmissionSchedule {} => to_binary(&EMISSION_SCHEDULE.load(deps.storage)?),
        QueryMsg::LpSplit {} => to_binary(&LP_SPLIT.load(deps.storage)?),
        QueryMsg::Channels {} => to_binary(&CHANNELS.may_load(deps.storage)?),
        QueryMsg::Distribution { epoch } => {
            to_binary(&DISTRIBUTIONS.may_load(deps.storage, epoch)?)
        }
        QueryMsg::GaugeEmissions { epoch } => {
            to_binary(&router::query_gauge_emissions(deps, epoch).map_err(to_std)?)
        }
        QueryMsg::EmissionPolicyHolders {} => to_binary(&router::query_policy_holders(deps)?),
        QueryMsg::Bribe { bribe_id } => to_binary(&bribe::query_bribe(deps, bribe_id)?),
        QueryMsg::BribesForGauge {
            epoch,
            gauge,
            start_after,
            limit,
        } => to_binary(&bribe::query_bribes_for_gauge(
            deps,
            epoch,
            gauge,
            start_after,
            limit,
        )?),
        QueryMsg::BribeClaim {
            bribe_id,
            position_id,
        } => to_binary(&bribe::query_bribe_claim(deps, bribe_id, position_id)?),
        QueryMsg::WhitelistedTokens {} => to_binary(&bribe::query_whitelisted_tokens(deps)?),
        QueryMsg::Stake { owner } => to_binary(&boost::query_stake(deps, owner)?),
        QueryMsg::Multiplier { owner } => to_binary(&boost::query_multiplier(deps, owner)?),
        QueryMsg::RewardRoot { epoch } => to_binary(&rewards::query_reward_root(deps, epoch)?),
        QueryMsg::RewardClaimed { epoch, address } => {
            to_binary(&rewards::query_reward_claimed(deps, epoch, address)?)
        }
        QueryMsg::RewardReserve {} => to_binary(&rewards::query_reward_reserve(deps)?),
    }
}

fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        owner: config.owner.to_string(),
        protocol_token: config.protocol_token.to_string(),
        treasury: config.treasury.to_string(),
        reward_publisher: config.reward_publisher.to_string(),
        epoch_start: config.epoch_start,
    })
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let ver = cw2::get_contract_version(deps.storage)?;
    // ensure we are migrating from an allowed contract
    if ver.contract != CONTRACT_NAME {
        return Err(ContractError::MigrationError {});
    }
    if parse_version(&ver.version)? >= parse_version(CONTRACT_VERSION)? {
        return Err(ContractError::MigrationError {});
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", ver.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
