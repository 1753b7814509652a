use cosmwasm_std::{Deps, DepsMut, Env, MessageInfo, Response, StdResult, Uint128};

use crate::error::ContractError;
use crate::msg::EmissionScheduleMsg;
use crate::state::{EmissionSchedule, LpSplit, EMISSION_SCHEDULE, LP_SPLIT};
use crate::utils::{check_bps_sum, ensure_emission_policy};

/// Builds the emission schedule starting at `start`.
/// The curve must never increase, so phase B can only decay towards a lower or equal rate.
pub fn build_schedule(
    start: u64,
    msg: EmissionScheduleMsg,
) -> Result<EmissionSchedule, ContractError> {
    if msg.phase_b_rate > msg.phase_a_rate || msg.phase_a_end > msg.phase_b_end {
        return Err(ContractError::InvalidEmissionSchedule {});
    }
    Ok(EmissionSchedule {
        start,
        phase_a_rate: msg.phase_a_rate,
        phase_b_rate: msg.phase_b_rate,
        phase_a_end: msg.phase_a_end,
        phase_b_end: msg.phase_b_end,
    })
}

/// Daily emission at timestamp `time`.
///
/// * Phase A (`t < phase_a_end`): constant `phase_a_rate`.
/// * Phase B (`phase_a_end <= t < phase_b_end`): linear decay from `phase_a_rate` to
///   `phase_b_rate`.
/// * Phase C (`t >= phase_b_end`): constant `phase_b_rate`, forever.
///
/// `t` is the time elapsed since the schedule start; earlier timestamps count as phase A.
pub fn emission_per_day(schedule: &EmissionSchedule, time: u64) -> Uint128 {
    let elapsed = time.saturating_sub(schedule.start);
    if elapsed < schedule.phase_a_end {
        schedule.phase_a_rate
    } else if elapsed < schedule.phase_b_end {
        let decay = schedule.phase_a_rate - schedule.phase_b_rate;
        let progressed = decay.multiply_ratio(
            elapsed - schedule.phase_a_end,
            schedule.phase_b_end - schedule.phase_a_end,
        );
        schedule.phase_a_rate - progressed
    } else {
        schedule.phase_b_rate
    }
}

/// Changes the LP pairs / stability pool division. Emission policy role only.
pub(crate) fn set_lp_split_params(
    deps: DepsMut,
    info: MessageInfo,
    lp_pairs_bps: u64,
    stability_pool_bps: u64,
) -> Result<Response, ContractError> {
    ensure_emission_policy(deps.as_ref(), &info.sender)?;
    check_bps_sum(&[lp_pairs_bps, stability_pool_bps])?;

    LP_SPLIT.save(
        deps.storage,
        &LpSplit {
            lp_pairs_bps,
            stability_pool_bps,
        },
    )?;

    Ok(Response::new()
        .add_attribute("action", "set_lp_split_params")
        .add_attribute("lp_pairs_bps", lp_pairs_bps.to_string())
        .add_attribute("stability_pool_bps", stability_pool_bps.to_string()))
}

pub(crate) fn query_emission_per_day(
    deps: Deps,
    env: Env,
    time: Option<u64>,
) -> StdResult<Uint128> {
    let schedule = EMISSION_SCHEDULE.load(deps.storage)?;
    Ok(emission_per_day(
        &schedule,
        time.unwrap_or_else(|| env.block.time.seconds()),
    ))
}
