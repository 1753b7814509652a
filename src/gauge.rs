use std::collections::HashSet;

use cosmwasm_std::{
    Addr, Deps, DepsMut, Env, MessageInfo, Order, Response, StdResult, Storage, Uint128,
};

use crate::error::ContractError;
use crate::msg::{EpochResponse, GaugeAllocation, GaugesResponse};
use crate::state::{
    GaugeInfo, GaugeVote, PositionId, VoteRecord, CONFIG, EPOCH_TOTAL_WEIGHT, GAUGES,
    GAUGE_WEIGHTS, VOTES,
};
use crate::utils::{
    bps_share, current_epoch, ensure_owner, epoch_start_time, get_epoch, BPS_DENOMINATOR,
    EPOCH_DURATION,
};
use crate::voting_escrow::{load_owned_position, voting_power_of};

/// Registers a gauge that positions can vote for. Owner only.
pub(crate) fn add_gauge(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    gauge: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info.sender)?;

    let gauge = deps.api.addr_validate(&gauge)?;
    if GAUGES.has(deps.storage, &gauge) {
        return Err(ContractError::GaugeAlreadyExists {
            gauge: gauge.to_string(),
        });
    }
    // Gauges can be registered before the first epoch opens
    let added_at_epoch = get_epoch(config.epoch_start, env.block.time.seconds()).unwrap_or(0);
    GAUGES.save(deps.storage, &gauge, &GaugeInfo { added_at_epoch })?;

    Ok(Response::new()
        .add_attribute("action", "add_gauge")
        .add_attribute("gauge", gauge))
}

/// Checks the allocation list and resolves gauge addresses.
/// Every gauge must be registered, appear once and get a non-zero share; shares add up to 100%.
fn validate_allocations(
    deps: Deps,
    allocations: &[GaugeAllocation],
) -> Result<Vec<(Addr, u64)>, ContractError> {
    if allocations.is_empty() {
        return Err(ContractError::InvalidAllocation {
            reason: "no gauges".to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut total = 0u64;
    let mut resolved = Vec::with_capacity(allocations.len());
    for allocation in allocations {
        if allocation.bps == 0 {
            return Err(ContractError::InvalidAllocation {
                reason: format!("zero share for {}", allocation.gauge),
            });
        }
        let gauge = deps.api.addr_validate(&allocation.gauge)?;
        if !seen.insert(gauge.clone()) {
            return Err(ContractError::InvalidAllocation {
                reason: format!("duplicate gauge {}", gauge),
            });
        }
        if !GAUGES.has(deps.storage, &gauge) {
            return Err(ContractError::UnknownGauge {
                gauge: gauge.to_string(),
            });
        }
        total = total.saturating_add(allocation.bps);
        resolved.push((gauge, allocation.bps));
    }

    if total != BPS_DENOMINATOR {
        return Err(ContractError::InvalidAllocation {
            reason: format!("shares sum to {} bps", total),
        });
    }
    Ok(resolved)
}

fn add_gauge_weight(
    storage: &mut dyn Storage,
    epoch: u64,
    gauge: &Addr,
    weight: Uint128,
) -> StdResult<()> {
    GAUGE_WEIGHTS.update(storage, (epoch, gauge), |current| -> StdResult<_> {
        Ok(current.unwrap_or_default().checked_add(weight)?)
    })?;
    EPOCH_TOTAL_WEIGHT.update(storage, epoch, |current| -> StdResult<_> {
        Ok(current.unwrap_or_default().checked_add(weight)?)
    })?;
    Ok(())
}

fn sub_gauge_weight(
    storage: &mut dyn Storage,
    epoch: u64,
    gauge: &Addr,
    weight: Uint128,
) -> StdResult<()> {
    GAUGE_WEIGHTS.update(storage, (epoch, gauge), |current| -> StdResult<_> {
        Ok(current.unwrap_or_default().checked_sub(weight)?)
    })?;
    EPOCH_TOTAL_WEIGHT.update(storage, epoch, |current| -> StdResult<_> {
        Ok(current.unwrap_or_default().checked_sub(weight)?)
    })?;
    Ok(())
}

/// Casts the current epoch vote of a position, replacing any earlier vote of the same epoch.
/// The earlier record is removed from the aggregates before the new weights are added, so
/// gauge weights always equal the sum of the active records.
pub(crate) fn vote(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    position_id: PositionId,
    allocations: Vec<GaugeAllocation>,
) -> Result<Response, ContractError> {
    let position = load_owned_position(deps.storage, position_id, &info.sender)?;
    let now = env.block.time.seconds();
    let epoch = current_epoch(deps.as_ref(), now)?;
    let resolved = validate_allocations(deps.as_ref(), &allocations)?;

    let voting_power = voting_power_of(&position, now);
    if voting_power.is_zero() {
        return Err(ContractError::ZeroVotingPower {});
    }

    let key = (epoch, position_id.u64());
    let revote = if let Some(previous) = VOTES.may_load(deps.storage, key)? {
        for vote in &previous.votes {
            sub_gauge_weight(deps.storage, epoch, &vote.gauge, vote.weight)?;
        }
        true
    } else {
        false
    };

    let votes = resolved
        .into_iter()
        .map(|(gauge, bps)| GaugeVote {
            weight: bps_share(voting_power, bps),
            gauge,
            bps,
        })
        .collect::<Vec<_>>();
    for vote in &votes {
        add_gauge_weight(deps.storage, epoch, &vote.gauge, vote.weight)?;
    }

    let record = VoteRecord {
        position_id,
        voter: info.sender.clone(),
        epoch,
        voting_power,
        votes,
    };
    VOTES.save(deps.storage, key, &record)?;

    Ok(Response::new()
        .add_attribute("action", "vote")
        .add_attribute("position_id", position_id.to_string())
        .add_attribute("epoch", epoch.to_string())
        .add_attribute("voting_power", voting_power)
        .add_attribute("revote", revote.to_string()))
}

pub(crate) fn gauge_weight(storage: &dyn Storage, gauge: &Addr, epoch: u64) -> StdResult<Uint128> {
    Ok(GAUGE_WEIGHTS
        .may_load(storage, (epoch, gauge))?
        .unwrap_or_default())
}

pub(crate) fn total_weight(storage: &dyn Storage, epoch: u64) -> StdResult<Uint128> {
    Ok(EPOCH_TOTAL_WEIGHT.may_load(storage, epoch)?.unwrap_or_default())
}

pub(crate) fn user_vote(
    storage: &dyn Storage,
    position_id: PositionId,
    epoch: u64,
) -> StdResult<Option<VoteRecord>> {
    VOTES.may_load(storage, (epoch, position_id.u64()))
}

pub(crate) fn query_gauges(deps: Deps) -> StdResult<GaugesResponse> {
    let gauges = GAUGES
        .keys(deps.storage, None, None, Order::Ascending)
        .map(|gauge| gauge.map(String::from))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(GaugesResponse { gauges })
}

pub(crate) fn query_gauge_weight(deps: Deps, gauge: String, epoch: u64) -> StdResult<Uint128> {
    let gauge = deps.api.addr_validate(&gauge)?;
    gauge_weight(deps.storage, &gauge, epoch)
}

pub(crate) fn query_user_vote(
    deps: Deps,
    env: Env,
    position_id: PositionId,
    epoch: Option<u64>,
) -> Result<Option<VoteRecord>, ContractError> {
    let epoch = match epoch {
        Some(epoch) => epoch,
        None => current_epoch(deps, env.block.time.seconds())?,
    };
    Ok(user_vote(deps.storage, position_id, epoch)?)
}

pub(crate) fn query_current_epoch(deps: Deps, env: Env) -> Result<EpochResponse, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let epoch = get_epoch(config.epoch_start, env.block.time.seconds())?;
    let start = epoch_start_time(config.epoch_start, epoch);
    Ok(EpochResponse {
        epoch,
        start,
        end: start + EPOCH_DURATION,
    })
}

#[cfg(test)]
mod tests {
    use cosmwasm_std::testing::{mock_dependencies, mock_env, mock_info};
    use proptest::prelude::*;

    use super::*;
    use crate::contract::execute;
    use crate::msg::ExecuteMsg;
    use crate::testing::{add_gauge as register, allocation, lock, now, setup, vote as cast};
    use crate::utils::{MAX_LOCK, WEEK};

    fn weight(deps: Deps, gauge: &str, epoch: u64) -> Uint128 {
        gauge_weight(deps.storage, &Addr::unchecked(gauge), epoch).unwrap()
    }

    #[test]
    fn only_owner_adds_gauges() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());
        let env = mock_env();

        let err = execute(
            deps.as_mut(),
            env.clone(),
            mock_info("user", &[]),
            ExecuteMsg::AddGauge {
                gauge: "gauge1".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(err, ContractError::Unauthorized {});

        register(deps.as_mut(), env.clone(), "gauge1");
        let err = execute(
            deps.as_mut(),
            env.clone(),
            mock_info("owner", &[]),
            ExecuteMsg::AddGauge {
                gauge: "gauge1".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            ContractError::GaugeAlreadyExists {
                gauge: "gauge1".to_string()
            }
        );
        assert_eq!(
            query_gauges(deps.as_ref()).unwrap().gauges,
            vec!["gauge1".to_string()]
        );
    }

    #[test]
    fn vote_splits_power_by_bps() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());
        let env = mock_env();
        register(deps.as_mut(), env.clone(), "gauge1");
        register(deps.as_mut(), env.clone(), "gauge2");
        let id = lock(deps.as_mut(), env.clone(), "user", 1000, now(&env) + MAX_LOCK);

        cast(
            deps.as_mut(),
            env.clone(),
            "user",
            id,
            vec![allocation("gauge1", 7_500), allocation("gauge2", 2_500)],
        )
        .unwrap();

        assert_eq!(weight(deps.as_ref(), "gauge1", 0), Uint128::new(750));
        assert_eq!(weight(deps.as_ref(), "gauge2", 0), Uint128::new(250));
        assert_eq!(total_weight(&deps.storage, 0).unwrap(), Uint128::new(1000));

        let record = query_user_vote(deps.as_ref(), env, id, None)
            .unwrap()
            .unwrap();
        assert_eq!(record.voting_power, Uint128::new(1000));
        assert_eq!(record.weight_for(&Addr::unchecked("gauge1")), Uint128::new(750));
    }

    #[test]
    fn only_position_owner_votes() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());
        let env = mock_env();
        register(deps.as_mut(), env.clone(), "gauge1");
        let id = lock(deps.as_mut(), env.clone(), "user", 1000, now(&env) + MAX_LOCK);

        let err = cast(deps.as_mut(), env.clone(), "other", id, vec![allocation("gauge1", 10_000)])
            .unwrap_err();
        assert_eq!(err, ContractError::NotOwner {});
        assert_eq!(weight(deps.as_ref(), "gauge1", 0), Uint128::zero());
        assert_eq!(query_user_vote(deps.as_ref(), env, id, None).unwrap(), None);
    }

    #[test]
    fn revote_replaces_previous_record() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());
        let env = mock_env();
        register(deps.as_mut(), env.clone(), "gauge1");
        register(deps.as_mut(), env.clone(), "gauge2");
        let id = lock(deps.as_mut(), env.clone(), "user", 1000, now(&env) + MAX_LOCK);

        cast(deps.as_mut(), env.clone(), "user", id, vec![allocation("gauge1", 10_000)]).unwrap();
        cast(deps.as_mut(), env.clone(), "user", id, vec![allocation("gauge2", 10_000)]).unwrap();

        assert_eq!(weight(deps.as_ref(), "gauge1", 0), Uint128::zero());
        assert_eq!(weight(deps.as_ref(), "gauge2", 0), Uint128::new(1000));
        assert_eq!(total_weight(&deps.storage, 0).unwrap(), Uint128::new(1000));
    }

    #[test]
    fn vote_does_not_carry_over_epochs() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());
        let mut env = mock_env();
        register(deps.as_mut(), env.clone(), "gauge1");
        let id = lock(deps.as_mut(), env.clone(), "user", 1000, now(&env) + MAX_LOCK);
        cast(deps.as_mut(), env.clone(), "user", id, vec![allocation("gauge1", 10_000)]).unwrap();

        env.block.time = env.block.time.plus_seconds(WEEK);
        assert_eq!(query_current_epoch(deps.as_ref(), env.clone()).unwrap().epoch, 1);
        assert_eq!(weight(deps.as_ref(), "gauge1", 1), Uint128::zero());
        assert!(query_user_vote(deps.as_ref(), env.clone(), id, None)
            .unwrap()
            .is_none());
        assert!(query_user_vote(deps.as_ref(), env, id, Some(0))
            .unwrap()
            .is_some());
    }

    #[test]
    fn invalid_votes() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());
        let env = mock_env();
        register(deps.as_mut(), env.clone(), "gauge1");
        register(deps.as_mut(), env.clone(), "gauge2");
        let id = lock(deps.as_mut(), env.clone(), "user", 1000, now(&env) + MAX_LOCK);

        let err = cast(
            deps.as_mut(),
            env.clone(),
            "user",
            id,
            vec![allocation("gauge1", 5_000), allocation("gauge2", 4_000)],
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::InvalidAllocation { .. }));

        let err = cast(
            deps.as_mut(),
            env.clone(),
            "user",
            id,
            vec![allocation("gauge1", 5_000), allocation("gauge1", 5_000)],
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::InvalidAllocation { .. }));

        let err = cast(
            deps.as_mut(),
            env.clone(),
            "user",
            id,
            vec![allocation("gauge3", 10_000)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ContractError::UnknownGauge {
                gauge: "gauge3".to_string()
            }
        );

        let err = cast(
            deps.as_mut(),
            env.clone(),
            "other",
            id,
            vec![allocation("gauge1", 10_000)],
        )
        .unwrap_err();
        assert_eq!(err, ContractError::NotOwner {});

        // Nothing was recorded by the failed attempts
        assert_eq!(total_weight(&deps.storage, 0).unwrap(), Uint128::zero());
    }

    #[test]
    fn expired_position_cannot_vote() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());
        let mut env = mock_env();
        register(deps.as_mut(), env.clone(), "gauge1");
        let id = lock(deps.as_mut(), env.clone(), "user", 1000, now(&env) + WEEK);

        env.block.time = env.block.time.plus_seconds(WEEK);
        let err = cast(deps.as_mut(), env, "user", id, vec![allocation("gauge1", 10_000)])
            .unwrap_err();
        assert_eq!(err, ContractError::ZeroVotingPower {});
    }

    proptest! {
        #[test]
        fn gauge_weight_matches_records(
            votes in prop::collection::vec((0usize..3, 0u64..=10_000), 1..20)
        ) {
            let mut deps = mock_dependencies();
            setup(deps.as_mut());
            let env = mock_env();
            register(deps.as_mut(), env.clone(), "gauge1");
            register(deps.as_mut(), env.clone(), "gauge2");
            let owners = ["alice", "bob", "carol"];
            let ids: Vec<_> = owners
                .iter()
                .enumerate()
                .map(|(i, owner)| {
                    lock(
                        deps.as_mut(),
                        env.clone(),
                        owner,
                        1_000_000 + i as u128 * 333_333,
                        now(&env) + MAX_LOCK - i as u64 * WEEK,
                    )
                })
                .collect();

            for (voter, bps) in votes {
                let mut allocations = Vec::new();
                if bps > 0 {
                    allocations.push(allocation("gauge1", bps));
                }
                if bps < 10_000 {
                    allocations.push(allocation("gauge2", 10_000 - bps));
                }
                cast(deps.as_mut(), env.clone(), owners[voter], ids[voter], allocations).unwrap();
            }

            for gauge in ["gauge1", "gauge2"] {
                let gauge_addr = Addr::unchecked(gauge);
                let mut sum = Uint128::zero();
                for id in &ids {
                    if let Some(record) = user_vote(&deps.storage, *id, 0).unwrap() {
                        sum += record.weight_for(&gauge_addr);
                    }
                }
                prop_assert_eq!(sum, weight(deps.as_ref(), gauge, 0));
            }

            for id in &ids {
                if let Some(record) = user_vote(&deps.storage, *id, 0).unwrap() {
                    let allocated: Uint128 = record.votes.iter().map(|v| v.weight).sum();
                    prop_assert!(allocated <= record.voting_power);
                }
            }
        }
    }
}
