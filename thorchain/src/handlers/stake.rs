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

use accounting::{staker, Pool, PoolStatus};
use primitives::{Address, Amount, Asset, BlockHeight, NodeAddress};
use serde::Serialize;

use super::{check_gate, check_pool_status, record_event, refund_coin, PoolOp, SignerGate};
use crate::{
    error::Result,
    store::Store,
    types::{EventStatus, EventType, TxId},
};

#[derive(Serialize)]
struct StakePayload {
    staker: Address,
    pool_asset: Asset,
    rune: Amount,
    asset: Amount,
    units_issued: Amount,
}

/// A Bootstrap pool that receives its first non-zero stake is promoted to
/// Enabled immediately, rather than waiting for the next pool-enable
/// cadence — a pool with liquidity in it has no reason to keep rejecting
/// swaps until the next cadence tick.
pub fn handle(
    store: &mut Store,
    height: BlockHeight,
    signer: NodeAddress,
    tx_id: TxId,
    staker_addr: Address,
    pool_asset: Asset,
    rune: Amount,
    asset: Amount,
) -> Result<()> {
    check_gate(store, &signer, SignerGate::Active)?;

    let mut pool = store.get_pool(&pool_asset)?.unwrap_or_else(|| Pool::bootstrap(pool_asset.clone()));
    if let Err(err) = check_pool_status(&pool, PoolOp::Stake) {
        refund_coin(store, height, tx_id, &staker_addr, primitives::Coin::rune(rune))?;
        refund_coin(store, height, tx_id, &staker_addr, primitives::Coin::new(pool_asset, asset))?;
        return Err(err);
    }

    let was_empty = pool.is_empty();
    let result = pool.stake(rune, asset)?;
    if was_empty && pool.status == PoolStatus::Bootstrap {
        pool.status = PoolStatus::Enabled;
    }

    let mut ledger = store.get_pool_staker(&pool_asset)?;
    staker::credit_units(&mut ledger, &staker_addr, result.units_issued)?;
    store.mirror_staker_units(&staker_addr, &pool_asset, staker::units_of(&ledger, &staker_addr))?;
    store.set_pool_staker(&pool_asset, &ledger)?;
    store.set_pool(&pool)?;

    record_event(
        store,
        height,
        EventType::Stake,
        tx_id,
        EventStatus::Success,
        &StakePayload { staker: staker_addr, pool_asset, rune, asset, units_issued: result.units_issued },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use primitives::{Id, PubKey};

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

    fn asgard_vault(store: &mut Store) {
        let vault = Vault::new(PubKey::new(b"asgard".to_vec()), VaultType::Asgard, BlockHeight::ZERO);
        store.set_vault(&vault).unwrap();
    }

    #[test]
    fn first_stake_on_bootstrap_pool_enables_it_s1() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        let signer = active_signer(&mut store, "node1");
        let asset = Asset::new("BNB", "BNB", "BNB");

        handle(
            &mut store,
            BlockHeight::new(1),
            signer,
            Id::blank(),
            Address::from("staker1"),
            asset.clone(),
            Amount::from_atoms(100 * primitives::amount::ONE),
            Amount::from_atoms(10 * primitives::amount::ONE),
        )
        .unwrap();

        let pool = store.get_pool(&asset).unwrap().unwrap();
        assert_eq!(pool.status, PoolStatus::Enabled);
        assert_eq!(pool.pool_units, Amount::from_atoms(100 * primitives::amount::ONE));
    }

    #[test]
    fn stake_on_suspended_pool_refunds_both_coins() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        let signer = active_signer(&mut store, "node1");
        asgard_vault(&mut store);
        let asset = Asset::new("BNB", "BNB", "BNB");
        let mut pool = Pool::bootstrap(asset.clone());
        pool.status = PoolStatus::Suspended;
        store.set_pool(&pool).unwrap();

        let err = handle(
            &mut store,
            BlockHeight::new(1),
            signer,
            Id::blank(),
            Address::from("staker1"),
            asset.clone(),
            Amount::from_atoms(100),
            Amount::from_atoms(10),
        )
        .unwrap_err();
        assert_eq!(err, crate::error::Error::PoolSuspended(asset.clone()));

        let txout = store.get_txout(BlockHeight::new(1)).unwrap().unwrap();
        assert_eq!(txout.tx_array.len(), 2);
    }
}
