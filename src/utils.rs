use cosmwasm_std::{to_binary, Addr, CosmosMsg, Deps, StdResult, Uint128, WasmMsg};
use cw20::Cw20ExecuteMsg;

use crate::error::ContractError;
use crate::state::{Config, CONFIG, EMISSION_POLICY};

/// Seconds in one day.
pub const DAY: u64 = 86400;

/// Seconds in one week.
pub const WEEK: u64 = 7 * DAY;

/// Length of a gauge voting and emission epoch.
pub const EPOCH_DURATION: u64 = WEEK;

/// Epoch length expressed in days, used to turn a daily emission into an epoch emission.
pub const EPOCH_DURATION_DAYS: u64 = EPOCH_DURATION / DAY;

/// Seconds in 4 years which is the maximum lock period.
pub const MAX_LOCK: u64 = 4 * 365 * DAY; // 208 weeks + 4 days

pub const BPS_DENOMINATOR: u64 = 10_000;

/// Default page size for list queries
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 30;

/// Calculates the epoch number for `time`.
pub fn get_epoch(epoch_start: u64, time: u64) -> Result<u64, ContractError> {
    if time < epoch_start {
        Err(ContractError::EpochNotStarted {})
    } else {
        Ok((time - epoch_start) / EPOCH_DURATION)
    }
}

/// Timestamp of the first second of `epoch`.
pub fn epoch_start_time(epoch_start: u64, epoch: u64) -> u64 {
    epoch_start + epoch * EPOCH_DURATION
}

/// Returns `amount * bps / 10000` rounded down.
pub fn bps_share(amount: Uint128, bps: u64) -> Uint128 {
    amount.multiply_ratio(bps, BPS_DENOMINATOR)
}

/// Checks that the parts add up to exactly 100%.
pub fn check_bps_sum(parts: &[u64]) -> Result<(), ContractError> {
    let sum = parts
        .iter()
        .try_fold(0u64, |acc, part| acc.checked_add(*part))
        .ok_or(ContractError::InvalidBps {})?;
    if sum != BPS_DENOMINATOR {
        return Err(ContractError::InvalidBps {});
    }
    Ok(())
}

pub(crate) fn ensure_owner(config: &Config, sender: &Addr) -> Result<(), ContractError> {
    if *sender != config.owner {
        return Err(ContractError::Unauthorized {});
    }
    Ok(())
}

pub(crate) fn ensure_emission_policy(deps: Deps, sender: &Addr) -> Result<(), ContractError> {
    if !EMISSION_POLICY.has(deps.storage, sender) {
        return Err(ContractError::MissingRole {
            role: "emission_policy".to_string(),
        });
    }
    Ok(())
}

/// Returns the current epoch according to the stored config.
pub(crate) fn current_epoch(deps: Deps, now: u64) -> Result<u64, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    get_epoch(config.epoch_start, now)
}

/// Builds a CW20 transfer of `amount` of `token` to `recipient`.
pub(crate) fn cw20_transfer_msg(
    token: &Addr,
    recipient: &Addr,
    amount: Uint128,
) -> StdResult<CosmosMsg> {
    Ok(CosmosMsg::Wasm(WasmMsg::Execute {
        contract_addr: token.to_string(),
        msg: to_binary(&Cw20ExecuteMsg::Transfer {
            recipient: recipient.to_string(),
            amount,
        })?,
        funds: vec![],
    }))
}

/// Builds a CW20 mint of `amount` of `token` to `recipient`.
pub(crate) fn cw20_mint_msg(
    token: &Addr,
    recipient: &Addr,
    amount: Uint128,
) -> StdResult<CosmosMsg> {
    Ok(CosmosMsg::Wasm(WasmMsg::Execute {
        contract_addr: token.to_string(),
        msg: to_binary(&Cw20ExecuteMsg::Mint {
            recipient: recipient.to_string(),
            amount,
        })?,
        funds: vec![],
    }))
}

/// Splits a `major.minor.patch` version into numbers so that "10.0.0" sorts after "9.0.0".
/// Any pre-release or build suffix is ignored.
pub fn parse_version(version: &str) -> Result<Vec<u64>, ContractError> {
    version
        .split(|c: char| c == '-' || c == '+')
        .next()
        .unwrap_or_default()
        .split('.')
        .map(|part| part.parse::<u64>().map_err(|_| ContractError::MigrationError {}))
        .collect()
}
