use cosmwasm_std::{Addr, Deps, DepsMut, MessageInfo, Response, StdResult, Uint128};
use sha2::{Digest, Sha256};

use crate::boost::multiplier_bps;
use crate::error::ContractError;
use crate::state::{CONFIG, REWARD_CLAIMS, REWARD_RESERVE, REWARD_ROOTS};
use crate::utils::{cw20_transfer_msg, BPS_DENOMINATOR};

fn decode_hash(value: &str) -> Option<[u8; 32]> {
    hex::decode(value).ok()?.try_into().ok()
}

const LEAF_TAG: u8 = 0x00;
const NODE_TAG: u8 = 0x01;

/// Leaf of the reward tree: sha256 of `0x00 || "<address>:<amount>"`.
pub fn leaf_hash(address: &Addr, amount: Uint128) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_TAG]);
    hasher.update(format!("{}:{}", address, amount).as_bytes());
    hasher.finalize().into()
}

/// Hashes a pair of nodes in sorted order so proofs don't need position flags.
/// Inner nodes are tagged with `0x01` so a leaf can never pose as one.
pub fn hash_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update([NODE_TAG]);
    hasher.update(first);
    hasher.update(second);
    hasher.finalize().into()
}

/// Folds `proof` into `leaf` and compares the result with `root`.
pub fn verify_proof(
    root: &[u8; 32],
    leaf: [u8; 32],
    proof: &[String],
) -> Result<(), ContractError> {
    let computed = proof.iter().try_fold(leaf, |node, sibling| {
        decode_hash(sibling)
            .map(|sibling| hash_pair(&node, &sibling))
            .ok_or(ContractError::InvalidProof {})
    })?;
    if computed != *root {
        return Err(ContractError::InvalidProof {});
    }
    Ok(())
}

pub(crate) fn publish_reward_root(
    deps: DepsMut,
    info: MessageInfo,
    epoch: u64,
    merkle_root: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.reward_publisher {
        return Err(ContractError::MissingRole {
            role: "reward_publisher".to_string(),
        });
    }
    if merkle_root.len() != 64 || decode_hash(&merkle_root).is_none() {
        return Err(ContractError::InvalidMerkleRoot {});
    }
    if REWARD_ROOTS.has(deps.storage, epoch) {
        return Err(ContractError::RootAlreadyPublished { epoch });
    }
    let merkle_root = merkle_root.to_lowercase();
    REWARD_ROOTS.save(deps.storage, epoch, &merkle_root)?;

    Ok(Response::new()
        .add_attribute("action", "publish_reward_root")
        .add_attribute("epoch", epoch.to_string())
        .add_attribute("merkle_root", merkle_root))
}

/// Tops up the reward reserve.
/// The tokens were already transferred to the contract through the CW20 hook.
pub(crate) fn fund_rewards(
    deps: DepsMut,
    sender: Addr,
    amount: Uint128,
) -> Result<Response, ContractError> {
    if amount.is_zero() {
        return Err(ContractError::InvalidAmount {});
    }
    let reserve = REWARD_RESERVE.update(deps.storage, |reserve| -> StdResult<_> {
        Ok(reserve.checked_add(amount)?)
    })?;

    Ok(Response::new()
        .add_attribute("action", "fund_rewards")
        .add_attribute("sender", sender)
        .add_attribute("amount", amount)
        .add_attribute("reserve", reserve))
}

/// Pays the boosted reward of the sender for `epoch` once its base amount is proven.
pub(crate) fn claim_reward(
    deps: DepsMut,
    info: MessageInfo,
    epoch: u64,
    amount: Uint128,
    proof: Vec<String>,
) -> Result<Response, ContractError> {
    let root = REWARD_ROOTS
        .may_load(deps.storage, epoch)?
        .and_then(|root| decode_hash(&root))
        .ok_or(ContractError::RootNotPublished { epoch })?;
    if REWARD_CLAIMS.has(deps.storage, (epoch, &info.sender)) {
        return Err(ContractError::AlreadyClaimed {});
    }
    verify_proof(&root, leaf_hash(&info.sender, amount), &proof)?;

    let multiplier = multiplier_bps(deps.storage, &info.sender)?;
    let payout = amount.multiply_ratio(multiplier, BPS_DENOMINATOR);
    let reserve = REWARD_RESERVE.load(deps.storage)?;
    if payout > reserve {
        return Err(ContractError::InsufficientRewardReserve {});
    }
    REWARD_RESERVE.save(deps.storage, &(reserve - payout))?;
    REWARD_CLAIMS.save(deps.storage, (epoch, &info.sender), &payout)?;

    let config = CONFIG.load(deps.storage)?;
    let mut response = Response::new();
    if !payout.is_zero() {
        response =
            response.add_message(cw20_transfer_msg(&config.protocol_token, &info.sender, payout)?);
    }

    Ok(response
        .add_attribute("action", "claim_reward")
        .add_attribute("epoch", epoch.to_string())
        .add_attribute("claimer", info.sender)
        .add_attribute("base_amount", amount)
        .add_attribute("multiplier_bps", multiplier.to_string())
        .add_attribute("amount", payout))
}

pub(crate) fn query_reward_root(deps: Deps, epoch: u64) -> StdResult<Option<String>> {
    REWARD_ROOTS.may_load(deps.storage, epoch)
}

pub(crate) fn query_reward_claimed(
    deps: Deps,
    epoch: u64,
    address: String,
) -> StdResult<Option<Uint128>> {
    let address = deps.api.addr_validate(&address)?;
    REWARD_CLAIMS.may_load(deps.storage, (epoch, &address))
}

pub(crate) fn query_reward_reserve(deps: Deps) -> StdResult<Uint128> {
    Ok(REWARD_RESERVE.may_load(deps.storage)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use cosmwasm_std::testing::{mock_dependencies, mock_env, mock_info};
    use cosmwasm_std::Env;

    use super::*;
    use crate::boost::TOKEN_UNIT;
    use crate::contract::execute;
    use crate::msg::{ExecuteMsg, ReceiveMsg};
    use crate::testing::{receive, setup, PUBLISHER, TOKEN};

    struct Tree {
        root: [u8; 32],
        alice: [u8; 32],
        bob: [u8; 32],
        carol: [u8; 32],
    }

    const ALICE_BASE: u128 = 1_000;
    const BOB_BASE: u128 = 2_000;
    const CAROL_BASE: u128 = 3_000;

    /// Three leaves: ((alice, bob), carol)
    fn tree() -> Tree {
        let alice = leaf_hash(&Addr::unchecked("alice"), Uint128::new(ALICE_BASE));
        let bob = leaf_hash(&Addr::unchecked("bob"), Uint128::new(BOB_BASE));
        let carol = leaf_hash(&Addr::unchecked("carol"), Uint128::new(CAROL_BASE));
        let root = hash_pair(&hash_pair(&alice, &bob), &carol);
        Tree {
            root,
            alice,
            bob,
            carol,
        }
    }

    fn publish(
        deps: DepsMut,
        sender: &str,
        epoch: u64,
        root: String,
    ) -> Result<Response, ContractError> {
        execute(
            deps,
            mock_env(),
            mock_info(sender, &[]),
            ExecuteMsg::PublishRewardRoot {
                epoch,
                merkle_root: root,
            },
        )
    }

    fn claim(
        deps: DepsMut,
        env: Env,
        sender: &str,
        amount: u128,
        proof: Vec<[u8; 32]>,
    ) -> Result<Response, ContractError> {
        execute(
            deps,
            env,
            mock_info(sender, &[]),
            ExecuteMsg::ClaimReward {
                epoch: 0,
                amount: Uint128::new(amount),
                proof: proof.iter().map(hex::encode).collect(),
            },
        )
    }

    #[test]
    fn proof_verification() {
        let t = tree();
        let alice_leaf = leaf_hash(&Addr::unchecked("alice"), Uint128::new(ALICE_BASE));
        let bob_carol_proof = vec![hex::encode(t.bob), hex::encode(t.carol)];
        verify_proof(&t.root, alice_leaf, &bob_carol_proof).unwrap();

        let carol_proof = vec![hex::encode(hash_pair(&t.alice, &t.bob))];
        verify_proof(&t.root, t.carol, &carol_proof).unwrap();

        assert_eq!(
            verify_proof(&t.root, t.carol, &bob_carol_proof).unwrap_err(),
            ContractError::InvalidProof {}
        );
        assert_eq!(
            verify_proof(&t.root, t.carol, &["zz".to_string()]).unwrap_err(),
            ContractError::InvalidProof {}
        );
    }

    #[test]
    fn leaf_encoding_is_unambiguous() {
        // "alice1" + 0 and "alice" + 10 concatenate to the same text without a separator
        assert_ne!(
            leaf_hash(&Addr::unchecked("alice1"), Uint128::new(0)),
            leaf_hash(&Addr::unchecked("alice"), Uint128::new(10))
        );

        let mut expected = Sha256::new();
        expected.update([0x00]);
        expected.update(b"alice:1000");
        let expected: [u8; 32] = expected.finalize().into();
        assert_eq!(leaf_hash(&Addr::unchecked("alice"), Uint128::new(ALICE_BASE)), expected);

        // A pair of leaves hashed as a node never equals a plain hash of their bytes
        let t = tree();
        let (first, second) = if t.alice <= t.bob { (t.alice, t.bob) } else { (t.bob, t.alice) };
        let mut untagged = Sha256::new();
        untagged.update(first);
        untagged.update(second);
        let untagged: [u8; 32] = untagged.finalize().into();
        assert_ne!(hash_pair(&t.alice, &t.bob), untagged);
    }

    #[test]
    fn publish_root_rules() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());
        let root = hex::encode(tree().root);

        let err = publish(deps.as_mut(), "alice", 0, root.clone()).unwrap_err();
        assert_eq!(
            err,
            ContractError::MissingRole {
                role: "reward_publisher".to_string()
            }
        );
        let err = publish(deps.as_mut(), PUBLISHER, 0, "abcd".to_string()).unwrap_err();
        assert_eq!(err, ContractError::InvalidMerkleRoot {});
        let err = publish(deps.as_mut(), PUBLISHER, 0, "g".repeat(64)).unwrap_err();
        assert_eq!(err, ContractError::InvalidMerkleRoot {});

        publish(deps.as_mut(), PUBLISHER, 0, root.clone()).unwrap();
        let err = publish(deps.as_mut(), PUBLISHER, 0, root.clone()).unwrap_err();
        assert_eq!(err, ContractError::RootAlreadyPublished { epoch: 0 });
        assert_eq!(query_reward_root(deps.as_ref(), 0).unwrap(), Some(root));
    }

    #[test]
    fn boosted_claims_from_reserve() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());
        let env = mock_env();
        let t = tree();

        let err = claim(deps.as_mut(), env.clone(), "alice", ALICE_BASE, vec![t.bob, t.carol])
            .unwrap_err();
        assert_eq!(err, ContractError::RootNotPublished { epoch: 0 });

        publish(deps.as_mut(), PUBLISHER, 0, hex::encode(t.root)).unwrap();
        receive(deps.as_mut(), env.clone(), TOKEN, "funder", 5_000, ReceiveMsg::FundRewards {})
            .unwrap();
        // Alice is in the 1.25x tier
        receive(
            deps.as_mut(),
            env.clone(),
            TOKEN,
            "alice",
            10_000 * TOKEN_UNIT,
            ReceiveMsg::Stake {},
        )
        .unwrap();

        // Claiming a different amount than the leaf fails
        let err = claim(deps.as_mut(), env.clone(), "alice", ALICE_BASE + 1, vec![t.bob, t.carol])
            .unwrap_err();
        assert_eq!(err, ContractError::InvalidProof {});

        let res = claim(deps.as_mut(), env.clone(), "alice", ALICE_BASE, vec![t.bob, t.carol])
            .unwrap();
        assert_eq!(res.messages.len(), 1);
        assert_eq!(
            query_reward_claimed(deps.as_ref(), 0, "alice".to_string()).unwrap(),
            Some(Uint128::new(1_250))
        );
        assert_eq!(query_reward_reserve(deps.as_ref()).unwrap(), Uint128::new(3_750));

        let err = claim(deps.as_mut(), env.clone(), "alice", ALICE_BASE, vec![t.bob, t.carol])
            .unwrap_err();
        assert_eq!(err, ContractError::AlreadyClaimed {});

        // Bob's 2,000 still fits the reserve, Carol's 3,000 does not
        claim(deps.as_mut(), env.clone(), "bob", BOB_BASE, vec![t.alice, t.carol]).unwrap();
        let err = claim(
            deps.as_mut(),
            env,
            "carol",
            CAROL_BASE,
            vec![hash_pair(&t.alice, &t.bob)],
        )
        .unwrap_err();
        assert_eq!(err, ContractError::InsufficientRewardReserve {});
        assert_eq!(query_reward_claimed(deps.as_ref(), 0, "carol".to_string()).unwrap(), None);
    }
}
