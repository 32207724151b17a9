// Copyright (c) 2024 RBB S.r.l
// opensource@mintlayer.org
// SPDX-License-Identifier: MIT
// Licensed under the MIT License;
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://github.com/mintlayer/mintlayer-core/blob/master/LICENSE
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! C7: vault and node-account lifecycle around a churn. The TSS ceremony
//! that actually produces a new Asgard keygen is an external collaborator
//! (`spec.md` §1) — this module owns everything churn touches on our side
//! of that boundary: deciding the incoming Active node set, retiring the
//! Asgard vault a successful keygen superseded, and draining a retiring
//! vault's remaining balance into its replacement.
//!
//! Yggdrasil per-node funding is computed and enqueued by the end-block
//! reconciler (C8, `spec.md` §4.8 step 4); this module only exposes the
//! eligibility gate (`yggdrasil_funding_eligible`) and the rotating
//! node-selection (`select_yggdrasil_funding_node`) that step consumes,
//! since both are properties of the node set this module owns.

use primitives::{Amount, BlockHeight, Coin, NodeAddress, PubKey};

use crate::{
    config::ConfigKey,
    error::Result,
    store::Store,
    types::{NodeAccount, NodeStatus, TxId, VaultStatus, VaultType},
};

/// `height` falls on the churn cadence when it is a non-zero multiple of
/// the admin-configured `RotatePerBlockHeight` (default 17280 blocks,
/// `spec.md` §4.7).
pub fn is_churn_height(store: &Store, height: BlockHeight) -> bool {
    let period = store.admin_config().get_u64(ConfigKey::RotatePerBlockHeight).max(1);
    height.value() != 0 && height.value() % period == 0
}

pub struct ChurnReport {
    pub promoted: Vec<NodeAddress>,
    pub demoted: Vec<NodeAddress>,
    pub retired_vaults: Vec<PubKey>,
}

/// Run the node-set rotation and vault retirement a churn height performs.
/// TSS keygen itself runs out of band (`TssPool` messages arrive and are
/// handled independently, usually in the blocks following a churn height);
/// this only manages the node accounts and any Asgard vault a *previous*
/// keygen already produced but a prior churn hadn't yet retired.
pub fn run_churn(store: &mut Store, height: BlockHeight) -> Result<ChurnReport> {
    let demoted = release_departing_nodes(store, height)?;
    let promoted = promote_incoming_nodes(store, height)?;
    let retired_vaults = retire_superseded_asgards(store, height)?;
    drain_retiring_vaults(store, height)?;
    destroy_drained_vaults(store)?;
    Ok(ChurnReport { promoted, demoted, retired_vaults })
}

/// Active nodes that called `Leave` drop to Standby at this churn
/// (`spec.md` §4.4: "Leave transitions Active→Standby at next churn").
fn release_departing_nodes(store: &mut Store, height: BlockHeight) -> Result<Vec<NodeAddress>> {
    let mut released = Vec::new();
    for mut node in store.iter_nodes()? {
        if node.is_active() && node.leave_requested {
            node.status = NodeStatus::Standby;
            node.status_since = height;
            node.leave_requested = false;
            released.push(node.node_addr.clone());
            store.set_node(&node)?;
        }
    }
    Ok(released)
}

/// Whitelisted nodes with enough bond become Ready candidates, then Ready
/// nodes are promoted to Active (highest bond first, node address breaking
/// ties) until the Active set reaches `DesireValidatorSet`.
fn promote_incoming_nodes(store: &mut Store, height: BlockHeight) -> Result<Vec<NodeAddress>> {
    let min_bond = store.admin_config().get_amount(ConfigKey::MinValidatorBond);
    let desired = store.admin_config().get_u64(ConfigKey::DesireValidatorSet) as usize;

    let mut nodes = store.iter_nodes()?;
    for node in nodes.iter_mut() {
        if node.status == NodeStatus::WhiteListed && node.bond.atoms() >= min_bond.atoms() {
            node.status = NodeStatus::Ready;
            node.status_since = height;
        }
    }

    let active_count = nodes.iter().filter(|n| n.is_active()).count();
    let mut promoted = Vec::new();
    if active_count < desired {
        let mut candidates: Vec<&mut NodeAccount> = nodes.iter_mut().filter(|n| n.status == NodeStatus::Ready).collect();
        candidates.sort_by(|a, b| b.bond.atoms().cmp(&a.bond.atoms()).then_with(|| a.node_addr.0.cmp(&b.node_addr.0)));
        for node in candidates.into_iter().take(desired - active_count) {
            node.status = NodeStatus::Active;
            node.status_since = height;
            promoted.push(node.node_addr.clone());
        }
    }

    for node in &nodes {
        store.set_node(node)?;
    }
    Ok(promoted)
}

/// When more than one Active Asgard vault exists — the window right after
/// a successful keygen has produced a replacement — keep the newest (by
/// `block_height`) Active and mark every other Retiring.
fn retire_superseded_asgards(store: &mut Store, height: BlockHeight) -> Result<Vec<PubKey>> {
    let mut asgards: Vec<_> = store.iter_vaults()?.into_iter().filter(|v| v.vault_type == VaultType::Asgard && v.status == VaultStatus::Active).collect();
    if asgards.len() <= 1 {
        return Ok(Vec::new());
    }
    asgards.sort_by(|a, b| b.block_height.value().cmp(&a.block_height.value()));
    let mut retired = Vec::new();
    for mut vault in asgards.into_iter().skip(1) {
        vault.status = VaultStatus::Retiring;
        vault.block_height = height;
        retired.push(vault.pub_key.clone());
        store.set_vault(&vault)?;
    }
    Ok(retired)
}

/// Queue a `MIGRATE`-memo'd outbound for every non-zero coin a Retiring
/// Asgard vault still holds, bound for the currently Active Asgard. Shares
/// the blank tx-id sentinel ragnarok items use, since neither has a real
/// inbound transaction to reference (`spec.md` §9 design note (c)).
fn drain_retiring_vaults(store: &mut Store, height: BlockHeight) -> Result<()> {
    let Some(active_asgard) = store.iter_vaults()?.into_iter().find(|v| v.vault_type == VaultType::Asgard && v.status == VaultStatus::Active) else {
        return Ok(());
    };
    let active_addr = primitives::Address(active_asgard.pub_key.thor_address().0.clone());

    let retiring: Vec<_> = store.iter_vaults()?.into_iter().filter(|v| v.vault_type == VaultType::Asgard && v.status == VaultStatus::Retiring).collect();
    for vault in retiring {
        for coin in vault.coins.iter().filter(|c| !c.amount.is_zero()).cloned().collect::<Vec<Coin>>() {
            crate::outbound_store::add_tx_out_item(
                store,
                height,
                crate::types::TxOutItem {
                    chain: coin.asset.chain.clone(),
                    to_address: active_addr.clone(),
                    vault_pub_key: Some(vault.pub_key.clone()),
                    coin,
                    memo: format!("MIGRATE:{}", TxId::blank()),
                    in_hash: TxId::blank(),
                    out_hash: None,
                    sequence: 0,
                    queued_height: BlockHeight::ZERO,
                    event_id: None,
                },
            )?;
        }
    }
    Ok(())
}

/// A Retiring vault that has paid out everything it held is destroyed —
/// modeled as `InactiveVault`, since the store keeps every vault record
/// for audit rather than deleting rows (`spec.md` §3's append-only event
/// history applies to vault history too).
fn destroy_drained_vaults(store: &mut Store) -> Result<()> {
    for mut vault in store.iter_vaults()? {
        if vault.status == VaultStatus::Retiring && vault.is_drained() {
            vault.status = VaultStatus::InactiveVault;
            store.set_vault(&vault)?;
        }
    }
    Ok(())
}

/// Whether the Active set is large enough to fund Yggdrasil vaults at all
/// — gated on both `MinimumNodesForBft` and `MinimumNodesForYggdrasil`
/// (`original_source/x/thorchain/yggdrasil.go`).
pub fn yggdrasil_funding_eligible(store: &Store) -> Result<bool> {
    let active = store.active_node_count()?;
    let min_bft = store.admin_config().get_u64(ConfigKey::MinimumNodesForBft);
    let min_ygg = store.admin_config().get_u64(ConfigKey::MinimumNodesForYggdrasil);
    Ok(u64::from(active) >= min_bft && u64::from(active) >= min_ygg)
}

/// The Active node selected for this block's Yggdrasil funding pass:
/// `block_height mod N` over Active nodes in deterministic (address)
/// order, so every replica picks the same node without needing a random
/// seed (`spec.md` §4.8 step 4).
pub fn select_yggdrasil_funding_node(store: &Store, height: BlockHeight) -> Result<Option<NodeAddress>> {
    let mut active: Vec<_> = store.iter_nodes()?.into_iter().filter(NodeAccount::is_active).map(|n| n.node_addr).collect();
    if active.is_empty() {
        return Ok(None);
    }
    active.sort_by(|a, b| a.0.cmp(&b.0));
    let index = (height.value() as usize) % active.len();
    Ok(Some(active.swap_remove(index)))
}

/// A node's bond as a fraction of total Active bond, used to size its
/// Yggdrasil funding target (`spec.md` §4.8 step 4: `bond_ratio ·
/// total_pool_value / 2`).
pub fn bond_ratio(store: &Store, node_addr: &NodeAddress) -> Result<Option<(Amount, Amount)>> {
    let nodes = store.iter_nodes()?;
    let total_active_bond = nodes.iter().filter(|n| n.is_active()).try_fold(Amount::ZERO, |acc, n| acc.checked_add(n.bond));
    let Some(total_active_bond) = total_active_bond else { return Ok(None) };
    let Some(node) = nodes.into_iter().find(|n| &n.node_addr == node_addr) else { return Ok(None) };
    Ok(Some((node.bond, total_active_bond)))
}

#[cfg(test)]
mod tests {
    use primitives::Address;

    use super::*;
    use crate::store::MemoryChain;

    fn node(addr: &str, status: NodeStatus, bond: u128) -> NodeAccount {
        let mut n = NodeAccount::new(NodeAddress::from(addr), Address::from(addr), Amount::from_atoms(bond), BlockHeight::ZERO);
        n.status = status;
        n
    }

    #[test]
    fn churn_promotes_highest_bonded_ready_nodes_up_to_desired_set() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        store.set_admin_override(ConfigKey::DesireValidatorSet, &Address::from("admin"), 1).unwrap();
        store.set_node(&node("low", NodeStatus::Ready, 10 * primitives::amount::ONE)).unwrap();
        store.set_node(&node("high", NodeStatus::Ready, 100 * primitives::amount::ONE)).unwrap();

        let report = run_churn(&mut store, BlockHeight::new(17_280)).unwrap();
        assert_eq!(report.promoted, vec![NodeAddress::from("high")]);
        assert_eq!(store.get_node(&NodeAddress::from("high")).unwrap().unwrap().status, NodeStatus::Active);
        assert_eq!(store.get_node(&NodeAddress::from("low")).unwrap().unwrap().status, NodeStatus::Ready);
    }

    #[test]
    fn leave_requested_active_node_drops_to_standby_at_churn() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        let mut n = node("node1", NodeStatus::Active, 100 * primitives::amount::ONE);
        n.leave_requested = true;
        store.set_node(&n).unwrap();

        let report = run_churn(&mut store, BlockHeight::new(17_280)).unwrap();
        assert_eq!(report.demoted, vec![NodeAddress::from("node1")]);
        let after = store.get_node(&NodeAddress::from("node1")).unwrap().unwrap();
        assert_eq!(after.status, NodeStatus::Standby);
        assert!(!after.leave_requested);
    }

    #[test]
    fn superseded_asgard_is_retired_and_drained_into_the_newer_one() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        let old_key = PubKey::new(b"old-asgard".to_vec());
        let mut old = crate::types::Vault::new(old_key.clone(), VaultType::Asgard, BlockHeight::ZERO);
        old.credit(Coin::rune(Amount::from_atoms(5 * primitives::amount::ONE))).unwrap();
        store.set_vault(&old).unwrap();

        let new_key = PubKey::new(b"new-asgard".to_vec());
        store.set_vault(&crate::types::Vault::new(new_key.clone(), VaultType::Asgard, BlockHeight::new(100))).unwrap();

        let report = run_churn(&mut store, BlockHeight::new(17_280)).unwrap();
        assert_eq!(report.retired_vaults, vec![old_key.clone()]);
        assert_eq!(store.get_vault(&old_key).unwrap().unwrap().status, VaultStatus::Retiring);

        let txout = store.get_txout(BlockHeight::new(17_280)).unwrap().unwrap();
        assert_eq!(txout.tx_array.len(), 1);
        assert!(txout.tx_array[0].memo.starts_with("MIGRATE:"));
    }

    #[test]
    fn yggdrasil_funding_requires_minimum_active_set() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        store.set_admin_override(ConfigKey::MinimumNodesForYggdrasil, &Address::from("admin"), 4).unwrap();
        store.set_node(&node("a", NodeStatus::Active, 100)).unwrap();
        assert!(!yggdrasil_funding_eligible(&store).unwrap());
    }

    #[test]
    fn yggdrasil_funding_node_selection_is_deterministic_by_height() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        store.set_node(&node("a", NodeStatus::Active, 100)).unwrap();
        store.set_node(&node("b", NodeStatus::Active, 100)).unwrap();

        let at_zero = select_yggdrasil_funding_node(&store, BlockHeight::ZERO).unwrap();
        let at_one = select_yggdrasil_funding_node(&store, BlockHeight::new(1)).unwrap();
        assert_ne!(at_zero, at_one);
    }
}
