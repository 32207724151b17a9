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

//! `Ragnarok`: a protocol-initiated, not user-initiated, mass unwind. Every
//! staker in the targeted pool (or in every pool, when no asset is named)
//! is redeemed at 100% and the pool is suspended so nothing can re-enter it
//! mid-unwind. The resulting payouts are queued with the blank tx-id
//! sentinel, same as every other ragnarok item, so `handlers::outbound`
//! settles them through its ordinary `(vault, coin, to_address)` matching
//! path once an observer reports them landed (`spec.md` §8 scenario S6).

use accounting::staker;
use primitives::{Amount, Asset, BlockHeight, Coin, NodeAddress};
use serde::Serialize;

use super::{check_gate, record_event, SignerGate};
use crate::{
    error::Result,
    store::Store,
    types::{EventStatus, EventType, TxId},
};

#[derive(Serialize)]
struct RagnarokPayload {
    pool_asset: Asset,
    stakers_unwound: usize,
    rune_out: Amount,
    asset_out: Amount,
}

/// Unwind one pool, or every pool when `pool_asset` is `None`
/// (`spec.md` §4.4: "`pool_asset = None` targets the whole network").
pub fn handle(store: &mut Store, height: BlockHeight, signer: NodeAddress, pool_asset: Option<Asset>) -> Result<()> {
    check_gate(store, &signer, SignerGate::ActiveObserver)?;

    let targets = match pool_asset {
        Some(asset) => store.get_pool(&asset)?.into_iter().collect::<Vec<_>>(),
        None => store.iter_pools()?,
    };

    for mut pool in targets {
        if pool.is_empty() {
            continue;
        }
        let asset = pool.asset.clone();
        let mut ledger = store.get_pool_staker(&asset)?;
        let stakers: Vec<_> = ledger.iter().map(|row| (row.staker_id.clone(), row.units)).collect();

        let mut total_rune = Amount::ZERO;
        let mut total_asset = Amount::ZERO;
        for (staker_addr, units) in &stakers {
            if units.is_zero() {
                continue;
            }
            let result = pool.unstake(*units, 10_000)?;
            staker::debit_units(&mut ledger, staker_addr, result.units_redeemed)?;
            store.mirror_staker_units(staker_addr, &asset, staker::units_of(&ledger, staker_addr))?;

            crate::outbound_store::add_tx_out_item(
                store,
                height,
                crate::types::TxOutItem {
                    chain: primitives::Chain::native(),
                    to_address: staker_addr.clone(),
                    vault_pub_key: None,
                    coin: Coin::rune(result.rune_out),
                    memo: String::new(),
                    in_hash: TxId::blank(),
                    out_hash: None,
                    sequence: 0,
                    queued_height: BlockHeight::ZERO,
                    event_id: None,
                },
            )?;
            crate::outbound_store::add_tx_out_item(
                store,
                height,
                crate::types::TxOutItem {
                    chain: asset.chain.clone(),
                    to_address: staker_addr.clone(),
                    vault_pub_key: None,
                    coin: Coin::new(asset.clone(), result.asset_out),
                    memo: String::new(),
                    in_hash: TxId::blank(),
                    out_hash: None,
                    sequence: 0,
                    queued_height: BlockHeight::ZERO,
                    event_id: None,
                },
            )?;

            total_rune = total_rune.checked_add(result.rune_out).unwrap_or(total_rune);
            total_asset = total_asset.checked_add(result.asset_out).unwrap_or(total_asset);
        }

        store.set_pool_staker(&asset, &ledger)?;
        pool.status = accounting::PoolStatus::Suspended;
        store.set_pool(&pool)?;

        record_event(
            store,
            height,
            EventType::Ragnarok,
            TxId::blank(),
            EventStatus::Success,
            &RagnarokPayload { pool_asset: asset, stakers_unwound: stakers.len(), rune_out: total_rune, asset_out: total_asset },
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use primitives::{Address, PubKey};

    use super::*;
    use crate::{
        store::MemoryChain,
        types::{NodeAccount, NodeStatus, Vault, VaultType},
    };

    fn active_observer(store: &mut Store, addr: &str) -> NodeAddress {
        let node_addr = NodeAddress::from(addr);
        let mut node = NodeAccount::new(node_addr.clone(), Address::from(addr), Amount::ZERO, BlockHeight::ZERO);
        node.status = NodeStatus::Active;
        node.observer_active = true;
        store.set_node(&node).unwrap();
        node_addr
    }

    fn asgard_vault(store: &mut Store) {
        let vault = Vault::new(PubKey::new(b"asgard".to_vec()), VaultType::Asgard, BlockHeight::ZERO);
        store.set_vault(&vault).unwrap();
    }

    #[test]
    fn ragnarok_unwinds_every_staker_and_suspends_the_pool_s6() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        let signer = active_observer(&mut store, "node1");
        asgard_vault(&mut store);

        let asset = Asset::new("BNB", "BNB", "BNB");
        let mut pool = accounting::Pool::bootstrap(asset.clone());
        pool.status = accounting::PoolStatus::Enabled;
        let stake = pool.stake(Amount::from_atoms(100 * primitives::amount::ONE), Amount::from_atoms(10 * primitives::amount::ONE)).unwrap();
        store.set_pool(&pool).unwrap();
        let mut ledger = Vec::new();
        staker::credit_units(&mut ledger, &Address::from("staker1"), stake.units_issued).unwrap();
        store.set_pool_staker(&asset, &ledger).unwrap();

        handle(&mut store, BlockHeight::new(1), signer, Some(asset.clone())).unwrap();

        let pool_after = store.get_pool(&asset).unwrap().unwrap();
        assert_eq!(pool_after.status, accounting::PoolStatus::Suspended);
        assert!(pool_after.is_empty());

        let ledger_after = store.get_pool_staker(&asset).unwrap();
        assert!(staker::units_of(&ledger_after, &Address::from("staker1")).is_zero());

        let txout = store.get_txout(BlockHeight::new(1)).unwrap().unwrap();
        assert_eq!(txout.tx_array.len(), 2);
        assert!(txout.tx_array.iter().all(|item| item.in_hash.is_blank()));
    }
}
