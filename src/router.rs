use cosmwasm_std::{
    Addr, CosmosMsg, Deps, DepsMut, Empty, Env, MessageInfo, Order, Response, StdResult, Uint128,
};

use crate::emission::emission_per_day;
use crate::error::ContractError;
use crate::gauge::total_weight;
use crate::msg::{GaugeEmission, GaugeEmissionsResponse, SinksMsg};
use crate::state::{
    ChannelConfig, DistributionRecord, CHANNELS, CONFIG, DISTRIBUTIONS, EMISSION_POLICY,
    EMISSION_SCHEDULE, GAUGE_WEIGHTS,
};
use crate::utils::{
    bps_share, check_bps_sum, cw20_mint_msg, ensure_emission_policy, epoch_start_time, get_epoch,
    EPOCH_DURATION_DAYS,
};

fn validate_sink(deps: Deps, sink: &str) -> Result<Addr, ContractError> {
    if sink.trim().is_empty() {
        return Err(ContractError::SinksNotConfigured {});
    }
    Ok(deps.api.addr_validate(sink)?)
}

/// Configures the four emission channels. Emission policy role only.
pub(crate) fn set_sinks(
    deps: DepsMut,
    info: MessageInfo,
    msg: SinksMsg,
) -> Result<Response, ContractError> {
    ensure_emission_policy(deps.as_ref(), &info.sender)?;
    check_bps_sum(&[
        msg.debt_bps,
        msg.lp_gauge_bps,
        msg.stability_pool_bps,
        msg.eco_bps,
    ])?;

    let channels = ChannelConfig {
        debt_sink: validate_sink(deps.as_ref(), &msg.debt_sink)?,
        lp_gauge_sink: validate_sink(deps.as_ref(), &msg.lp_gauge_sink)?,
        stability_pool_sink: validate_sink(deps.as_ref(), &msg.stability_pool_sink)?,
        eco_sink: validate_sink(deps.as_ref(), &msg.eco_sink)?,
        debt_bps: msg.debt_bps,
        lp_gauge_bps: msg.lp_gauge_bps,
        stability_pool_bps: msg.stability_pool_bps,
        eco_bps: msg.eco_bps,
    };
    CHANNELS.save(deps.storage, &channels)?;

    Ok(Response::new()
        .add_attribute("action", "set_sinks")
        .add_attribute("debt_sink", channels.debt_sink)
        .add_attribute("lp_gauge_sink", channels.lp_gauge_sink)
        .add_attribute("stability_pool_sink", channels.stability_pool_sink)
        .add_attribute("eco_sink", channels.eco_sink))
}

pub(crate) fn grant_emission_policy(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    ensure_emission_policy(deps.as_ref(), &info.sender)?;
    let address = deps.api.addr_validate(&address)?;
    EMISSION_POLICY.save(deps.storage, &address, &Empty {})?;

    Ok(Response::new()
        .add_attribute("action", "grant_emission_policy")
        .add_attribute("address", address))
}

pub(crate) fn revoke_emission_policy(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    ensure_emission_policy(deps.as_ref(), &info.sender)?;
    let address = deps.api.addr_validate(&address)?;
    if EMISSION_POLICY.has(deps.storage, &address) {
        let holders = EMISSION_POLICY
            .keys(deps.storage, None, None, Order::Ascending)
            .take(2)
            .count();
        if holders < 2 {
            return Err(ContractError::LastPolicyHolder {});
        }
        EMISSION_POLICY.remove(deps.storage, &address);
    }

    Ok(Response::new()
        .add_attribute("action", "revoke_emission_policy")
        .add_attribute("address", address))
}

/// Channel amounts for one epoch of emissions.
/// Every channel gets its own bps share of `total` and the eco sink also takes whatever rounding
/// leaves over, so the shares always add up to `total`.
pub(crate) fn split_emission(
    total: Uint128,
    channels: &ChannelConfig,
) -> (Uint128, Uint128, Uint128, Uint128) {
    let debt = bps_share(total, channels.debt_bps);
    let lp_gauge = bps_share(total, channels.lp_gauge_bps);
    let stability_pool = bps_share(total, channels.stability_pool_bps);
    let eco = total - debt - lp_gauge - stability_pool;
    (debt, lp_gauge, stability_pool, eco)
}

/// Mints the emissions of `epoch` to the configured sinks. Anyone may call it, once per epoch.
/// The epoch is priced at the emission rate of its first second, so a late call mints the same
/// amount as a punctual one.
pub(crate) fn distribute(deps: DepsMut, env: Env, epoch: u64) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let now = env.block.time.seconds();
    let current = get_epoch(config.epoch_start, now)?;
    if epoch > current {
        return Err(ContractError::FutureEpoch { epoch });
    }
    if DISTRIBUTIONS.has(deps.storage, epoch) {
        return Err(ContractError::AlreadyDistributed { epoch });
    }
    let channels = CHANNELS
        .may_load(deps.storage)?
        .ok_or(ContractError::SinksNotConfigured {})?;
    let schedule = EMISSION_SCHEDULE.load(deps.storage)?;

    let rate = emission_per_day(&schedule, epoch_start_time(config.epoch_start, epoch));
    let total = rate.checked_mul(Uint128::from(EPOCH_DURATION_DAYS))?;
    let (debt, lp_gauge, stability_pool, eco) = split_emission(total, &channels);

    let record = DistributionRecord {
        epoch,
        rate,
        total,
        debt,
        lp_gauge,
        stability_pool,
        eco,
        distributed_at: now,
    };
    DISTRIBUTIONS.save(deps.storage, epoch, &record)?;

    let messages = [
        (&channels.debt_sink, debt),
        (&channels.lp_gauge_sink, lp_gauge),
        (&channels.stability_pool_sink, stability_pool),
        (&channels.eco_sink, eco),
    ]
    .into_iter()
    .filter(|(_, amount)| !amount.is_zero())
    .map(|(sink, amount)| cw20_mint_msg(&config.protocol_token, sink, amount))
    .collect::<StdResult<Vec<CosmosMsg>>>()?;

    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("action", "distribute")
        .add_attribute("epoch", epoch.to_string())
        .add_attribute("total", total)
        .add_attribute("debt", debt)
        .add_attribute("lp_gauge", lp_gauge)
        .add_attribute("stability_pool", stability_pool)
        .add_attribute("eco", eco))
}

/// Divides the LP gauge amount of a distributed epoch between gauges by their vote weight.
pub(crate) fn query_gauge_emissions(
    deps: Deps,
    epoch: u64,
) -> Result<GaugeEmissionsResponse, ContractError> {
    let lp_gauge_total = DISTRIBUTIONS
        .may_load(deps.storage, epoch)?
        .map(|record| record.lp_gauge)
        .unwrap_or_default();
    let total = total_weight(deps.storage, epoch)?;

    let gauges = GAUGE_WEIGHTS
        .prefix(epoch)
        .range(deps.storage, None, None, Order::Ascending)
        .filter(|item| !matches!(item, Ok((_, weight)) if weight.is_zero()))
        .map(|item| {
            let (gauge, weight) = item?;
            let amount = if total.is_zero() {
                Uint128::zero()
            } else {
                lp_gauge_total.multiply_ratio(weight, total)
            };
            Ok(GaugeEmission {
                gauge: gauge.to_string(),
                weight,
                amount,
            })
        })
        .collect::<StdResult<Vec<_>>>()?;

    Ok(GaugeEmissionsResponse {
        epoch,
        lp_gauge_total,
        gauges,
    })
}

pub(crate) fn query_policy_holders(deps: Deps) -> StdResult<Vec<String>> {
    EMISSION_POLICY
        .keys(deps.storage, None, None, Order::Ascending)
        .map(|holder| holder.map(String::from))
        .collect()
}
