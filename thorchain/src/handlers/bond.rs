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

//! `Apply` whitelists a brand-new node account, `Bond` tops up an existing
//! one's bond, and `Leave` marks a node for removal at the next churn.
//! None of the three requires prior authentication beyond a valid
//! signature (`SPEC_FULL.md` §4.4's signer-gate table) — anyone may stand
//! up a node or add to its bond.

use primitives::{Address, Amount, Asset, BlockHeight, NodeAddress, PubKey};
use serde::Serialize;

use super::{check_gate, record_event, SignerGate};
use crate::{
    config::ConfigKey,
    error::{Error, Result},
    store::Store,
    types::{EventStatus, EventType, NodeAccount, TxId},
};

/// Fixed gas asset new nodes are bootstrapped with so they can pay the
/// signing fee on their first observed chain
/// (`original_source/x/swapservice/handler.go`'s `handleMsgApply`, which
/// mints `WhiteListGasAsset` units of a hard-coded gas token for every
/// newly-whitelisted node).
fn gas_asset() -> Asset {
    Asset::new("BNB", "BNB", "BNB")
}

#[derive(Serialize)]
struct ApplyPayload {
    node_addr: NodeAddress,
    bond_address: Address,
    bond: Amount,
}

/// Whitelist `node_addr` with `bond`, rejecting a bond below
/// `MinValidatorBond` or an address that has already applied.
pub fn handle_apply(
    store: &mut Store,
    height: BlockHeight,
    signer: NodeAddress,
    tx_id: TxId,
    node_addr: NodeAddress,
    bond_address: Address,
    bond: Amount,
    pub_key: PubKey,
) -> Result<()> {
    check_gate(store, &signer, SignerGate::Open)?;

    if store.get_node(&node_addr)?.is_some() {
        return Err(Error::InvalidMessage(format!("node {node_addr} has already applied")));
    }

    let min_bond = store.admin_config().get_amount(ConfigKey::MinValidatorBond);
    if bond.atoms() < min_bond.atoms() {
        return Err(Error::InsufficientFunds);
    }

    let mut node = NodeAccount::new(node_addr.clone(), bond_address.clone(), bond, height);
    node.pub_key_set = Some(pub_key);
    store.set_node(&node)?;

    let gas_amount = store.admin_config().get_amount(ConfigKey::WhiteListGasAsset);
    crate::outbound_store::add_tx_out_item(
        store,
        height,
        crate::types::TxOutItem {
            chain: gas_asset().chain,
            to_address: bond_address.clone(),
            vault_pub_key: None,
            coin: primitives::Coin::new(gas_asset(), gas_amount),
            memo: String::new(),
            in_hash: tx_id,
            out_hash: None,
            sequence: 0,
            queued_height: BlockHeight::ZERO,
            event_id: None,
        },
    )?;

    record_event(store, height, EventType::Bond, tx_id, EventStatus::Success, &ApplyPayload { node_addr, bond_address, bond })?;
    Ok(())
}

#[derive(Serialize)]
struct BondPayload {
    node_addr: NodeAddress,
    amount: Amount,
}

/// Credit `amount` to an existing node's bond.
pub fn handle_bond(store: &mut Store, height: BlockHeight, signer: NodeAddress, tx_id: TxId, node_addr: NodeAddress, amount: Amount) -> Result<()> {
    check_gate(store, &signer, SignerGate::Open)?;

    let mut node = store.get_node(&node_addr)?.ok_or_else(|| Error::InvalidMessage(format!("node {node_addr} is not known")))?;
    node.bond = node.bond.checked_add(amount).ok_or_else(|| Error::Internal("bond addition overflowed".to_owned()))?;
    store.set_node(&node)?;

    record_event(store, height, EventType::Bond, tx_id, EventStatus::Success, &BondPayload { node_addr, amount })?;
    Ok(())
}

#[derive(Serialize)]
struct LeavePayload {
    node_addr: NodeAddress,
}

/// Flag a node for removal from the Active set at the next churn; the
/// actual status transition happens in the vault & node manager (C7).
pub fn handle_leave(store: &mut Store, height: BlockHeight, signer: NodeAddress, tx_id: TxId, node_addr: NodeAddress) -> Result<()> {
    check_gate(store, &signer, SignerGate::Open)?;

    let mut node = store.get_node(&node_addr)?.ok_or_else(|| Error::InvalidMessage(format!("node {node_addr} is not known")))?;
    node.leave_requested = true;
    store.set_node(&node)?;

    record_event(store, height, EventType::Bond, tx_id, EventStatus::Success, &LeavePayload { node_addr })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use primitives::Id;

    use super::*;
    use crate::store::MemoryChain;

    #[test]
    fn apply_below_min_bond_is_rejected() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        let err = handle_apply(
            &mut store,
            BlockHeight::new(1),
            NodeAddress::from("anyone"),
            Id::blank(),
            NodeAddress::from("node1"),
            Address::from("bonder1"),
            Amount::from_atoms(1),
            PubKey::new(b"key1".to_vec()),
        )
        .unwrap_err();
        assert_eq!(err, Error::InsufficientFunds);
        assert!(store.get_node(&NodeAddress::from("node1")).unwrap().is_none());
    }

    #[test]
    fn apply_with_sufficient_bond_whitelists_the_node_and_queues_gas() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        store.set_vault(&crate::types::Vault::new(PubKey::new(b"asgard".to_vec()), crate::types::VaultType::Asgard, BlockHeight::ZERO)).unwrap();
        handle_apply(
            &mut store,
            BlockHeight::new(1),
            NodeAddress::from("anyone"),
            Id::blank(),
            NodeAddress::from("node1"),
            Address::from("bonder1"),
            Amount::from_atoms(100 * primitives::amount::ONE),
            PubKey::new(b"key1".to_vec()),
        )
        .unwrap();

        let node = store.get_node(&NodeAddress::from("node1")).unwrap().unwrap();
        assert_eq!(node.status, crate::types::NodeStatus::WhiteListed);
        assert_eq!(node.bond, Amount::from_atoms(100 * primitives::amount::ONE));

        let txout = store.get_txout(BlockHeight::new(1)).unwrap().unwrap();
        assert_eq!(txout.tx_array[0].to_address, Address::from("bonder1"));
    }

    #[test]
    fn leave_flags_the_node_without_changing_status_immediately() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        let node = NodeAccount::new(NodeAddress::from("node1"), Address::from("bonder1"), Amount::from_atoms(1), BlockHeight::ZERO);
        store.set_node(&node).unwrap();

        handle_leave(&mut store, BlockHeight::new(1), NodeAddress::from("node1"), Id::blank(), NodeAddress::from("node1")).unwrap();

        let node = store.get_node(&NodeAddress::from("node1")).unwrap().unwrap();
        assert!(node.leave_requested);
        assert_eq!(node.status, crate::types::NodeStatus::WhiteListed);
    }
}
