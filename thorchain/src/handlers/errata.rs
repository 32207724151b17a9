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

//! `Errata`: a super-majority of Active nodes asserting that an inbound
//! transaction never actually happened (the source chain reorganized it
//! out from under the network) and its pool mutation must be undone.
//!
//! Scoped to `Stake` events (`DESIGN.md` open question (c)): a deposit is
//! the one inbound mutation that is both unconditionally reversible — debit
//! exactly the units and balances `Stake` credited — and the dominant
//! real-world case a reorg actually produces. Any other event type is
//! rejected rather than guessed at.

use primitives::{Amount, Asset, BlockHeight, NodeAddress};
use serde::{Deserialize, Serialize};

use super::{check_gate, record_event, SignerGate};
use crate::{
    error::{Error, Result},
    store::Store,
    types::{EventStatus, EventType, TxId},
};

#[derive(Deserialize)]
struct StakePayload {
    staker: primitives::Address,
    pool_asset: Asset,
    units_issued: Amount,
}

#[derive(Serialize)]
struct ErrataPayload {
    tx_id: TxId,
    pool_asset: Asset,
    units_reversed: Amount,
}

/// Accumulate `signer`'s vote for reversing `tx_id`; once Active-node votes
/// clear `⌈2N/3⌉`, reverse its `Stake` exactly once.
pub fn handle(store: &mut Store, height: BlockHeight, signer: NodeAddress, tx_id: TxId) -> Result<()> {
    check_gate(store, &signer, SignerGate::Active)?;

    if store.get_event_by_tx(&tx_id)?.is_none() {
        return Err(Error::InvalidMessage(format!("no recorded event for {tx_id}")));
    }

    let mut votes = store.get_errata_votes(&tx_id)?;
    if votes.contains(&signer) {
        return Ok(());
    }
    votes.insert(signer);
    store.set_errata_votes(&tx_id, &votes)?;

    let n = store.active_node_count()? as usize;
    let threshold = (2 * n).div_ceil(3).max(1);
    if votes.len() < threshold {
        return Ok(());
    }
    if store.errata_applied(&tx_id)? {
        return Ok(());
    }

    let event_id = store.get_event_by_tx(&tx_id)?.ok_or_else(|| Error::InvalidMessage(format!("no recorded event for {tx_id}")))?;
    let mut event = store.get_event(event_id)?.ok_or_else(|| Error::Internal("event index pointed at a missing event".to_owned()))?;
    if event.event_type != EventType::Stake {
        return Err(Error::InvalidMessage("errata only reverses Stake events".to_owned()));
    }

    let payload: StakePayload =
        serde_json::from_value(event.payload()).map_err(|e| Error::Internal(format!("undecodable stake event payload: {e}")))?;

    let mut pool = store.get_pool(&payload.pool_asset)?.ok_or_else(|| Error::PoolNotFound(payload.pool_asset.clone()))?;
    let mut ledger = store.get_pool_staker(&payload.pool_asset)?;
    let staker_units = accounting::staker::units_of(&ledger, &payload.staker);
    let to_reverse = payload.units_issued.atoms().min(staker_units.atoms());
    let result = pool.unstake(Amount::from_atoms(to_reverse), 10_000)?;
    accounting::staker::debit_units(&mut ledger, &payload.staker, result.units_redeemed)?;
    store.mirror_staker_units(&payload.staker, &payload.pool_asset, accounting::staker::units_of(&ledger, &payload.staker))?;
    store.set_pool_staker(&payload.pool_asset, &ledger)?;
    store.set_pool(&pool)?;

    let mut vault_data = store.get_vault_data()?;
    vault_data.credit_reserve(result.rune_out).ok_or_else(|| Error::Internal("reserve overflow absorbing reversed stake".to_owned()))?;
    store.set_vault_data(&vault_data)?;

    event.status = EventStatus::Refund;
    store.set_event(&event)?;
    store.mark_errata_applied(&tx_id)?;

    record_event(
        store,
        height,
        EventType::Errata,
        TxId::blank(),
        EventStatus::Success,
        &ErrataPayload { tx_id, pool_asset: payload.pool_asset, units_reversed: result.units_redeemed },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use accounting::staker;
    use primitives::{Address, Id, PubKey};

    use super::*;
    use crate::{
        store::MemoryChain,
        types::{NodeAccount, NodeStatus, Vault, VaultType},
    };

    fn active_signer(store: &mut Store, addr: &str) -> NodeAddress {
        let node_addr = NodeAddress::from(addr);
        let mut node = NodeAccount::new(node_addr.clone(), Address::from(addr), Amount::ZERO, BlockHeight::ZERO);
        node.status = NodeStatus::Active;
        store.set_node(&node).unwrap();
        node_addr
    }

    #[test]
    fn errata_reverses_a_stake_once_supermajority_votes() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        store.set_vault(&Vault::new(PubKey::new(b"asgard".to_vec()), VaultType::Asgard, BlockHeight::ZERO)).unwrap();
        let n1 = active_signer(&mut store, "node1");
        let n2 = active_signer(&mut store, "node2");
        let n3 = active_signer(&mut store, "node3");

        let asset = Asset::new("BNB", "BNB", "BNB");
        let tx_id: TxId = Id::from_bytes(b"deposit-1");
        crate::handlers::stake::handle(
            &mut store,
            BlockHeight::new(1),
            n1.clone(),
            tx_id,
            Address::from("staker1"),
            asset.clone(),
            Amount::from_atoms(100 * primitives::amount::ONE),
            Amount::from_atoms(10 * primitives::amount::ONE),
        )
        .unwrap();

        handle(&mut store, BlockHeight::new(2), n1, tx_id).unwrap();
        handle(&mut store, BlockHeight::new(2), n2, tx_id).unwrap();
        handle(&mut store, BlockHeight::new(2), n3, tx_id).unwrap();

        let pool = store.get_pool(&asset).unwrap().unwrap();
        assert!(pool.is_empty());
        let ledger = store.get_pool_staker(&asset).unwrap();
        assert!(staker::units_of(&ledger, &Address::from("staker1")).is_zero());
    }

    #[test]
    fn errata_on_non_stake_event_is_rejected() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        let n1 = active_signer(&mut store, "node1");
        store.set_vault(&Vault::new(PubKey::new(b"asgard".to_vec()), VaultType::Asgard, BlockHeight::ZERO)).unwrap();
        let node_addr = NodeAddress::from("applicant");
        let tx_id: TxId = Id::from_bytes(b"apply-1");
        crate::handlers::bond::handle_apply(
            &mut store,
            BlockHeight::new(1),
            n1.clone(),
            tx_id,
            node_addr,
            Address::from("bonder"),
            Amount::from_atoms(100 * primitives::amount::ONE),
            PubKey::new(b"key".to_vec()),
        )
        .unwrap();

        let err = handle(&mut store, BlockHeight::new(2), n1, tx_id).unwrap_err();
        assert_eq!(err, Error::InvalidMessage("errata only reverses Stake events".to_owned()));
    }
}
