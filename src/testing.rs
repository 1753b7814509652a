//! Shared helpers for the unit tests of every module.

use cosmwasm_std::testing::mock_info;
use cosmwasm_std::{to_binary, DepsMut, Env, Uint128};
use cw20::Cw20ReceiveMsg;

use crate::contract::{execute, instantiate};
use crate::msg::{EmissionScheduleMsg, ExecuteMsg, GaugeAllocation, InstantiateMsg, ReceiveMsg};
use crate::state::{PositionId, POSITION_COUNT};
use crate::utils::DAY;

pub const OWNER: &str = "owner";
pub const TOKEN: &str = "token";
pub const TREASURY: &str = "treasury";
pub const PUBLISHER: &str = "publisher";
pub const POLICY: &str = "policy";

pub const PHASE_A_RATE: u128 = 1_000_000;
pub const PHASE_B_RATE: u128 = 250_000;
pub const PHASE_A_END: u64 = 365 * DAY;
pub const PHASE_B_END: u64 = 2 * 365 * DAY;

pub fn now(env: &Env) -> u64 {
    env.block.time.seconds()
}

pub fn default_instantiate_msg(epoch_start: Option<u64>) -> InstantiateMsg {
    InstantiateMsg {
        owner: OWNER.to_string(),
        protocol_token: TOKEN.to_string(),
        treasury: TREASURY.to_string(),
        reward_publisher: PUBLISHER.to_string(),
        emission_policy: POLICY.to_string(),
        epoch_start,
        emission: EmissionScheduleMsg {
            phase_a_rate: Uint128::new(PHASE_A_RATE),
            phase_b_rate: Uint128::new(PHASE_B_RATE),
            phase_a_end: PHASE_A_END,
            phase_b_end: PHASE_B_END,
        },
        lp_split: None,
        boost_tiers: None,
    }
}

/// Instantiates the contract at the mock block time, which also becomes the start of epoch 0.
pub fn setup(deps: DepsMut) {
    let env = cosmwasm_std::testing::mock_env();
    instantiate(
        deps,
        env,
        mock_info(OWNER, &[]),
        default_instantiate_msg(None),
    )
    .unwrap();
}

/// Delivers a CW20 hook from `token` on behalf of `sender`.
pub fn receive(
    deps: DepsMut,
    env: Env,
    token: &str,
    sender: &str,
    amount: u128,
    msg: ReceiveMsg,
) -> Result<cosmwasm_std::Response, crate::ContractError> {
    execute(
        deps,
        env,
        mock_info(token, &[]),
        ExecuteMsg::Receive(Cw20ReceiveMsg {
            sender: sender.to_string(),
            amount: Uint128::new(amount),
            msg: to_binary(&msg).unwrap(),
        }),
    )
}

/// Locks protocol tokens and returns the new position id.
pub fn lock(mut deps: DepsMut, env: Env, owner: &str, amount: u128, lock_end: u64) -> PositionId {
    receive(
        deps.branch(),
        env,
        TOKEN,
        owner,
        amount,
        ReceiveMsg::CreateLock { lock_end },
    )
    .unwrap();
    PositionId(POSITION_COUNT.load(deps.storage).unwrap())
}

pub fn add_gauge(deps: DepsMut, env: Env, gauge: &str) {
    execute(
        deps,
        env,
        mock_info(OWNER, &[]),
        ExecuteMsg::AddGauge {
            gauge: gauge.to_string(),
        },
    )
    .unwrap();
}

pub fn allocation(gauge: &str, bps: u64) -> GaugeAllocation {
    GaugeAllocation {
        gauge: gauge.to_string(),
        bps,
    }
}

pub fn vote(
    deps: DepsMut,
    env: Env,
    voter: &str,
    position_id: PositionId,
    allocations: Vec<GaugeAllocation>,
) -> Result<cosmwasm_std::Response, crate::ContractError> {
    execute(
        deps,
        env,
        mock_info(voter, &[]),
        ExecuteMsg::Vote {
            position_id,
            allocations,
        },
    )
}
