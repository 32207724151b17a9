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

use accounting::staker;
use primitives::{Address, Amount, Asset, BlockHeight, Coin, NodeAddress};
use serde::Serialize;

use super::{check_gate, check_pool_status, record_event, refund_coin, PoolOp, SignerGate};
use crate::{
    error::{Error, Result},
    store::Store,
    types::{EventStatus, EventType, TxId},
};

#[derive(Serialize)]
struct UnstakePayload {
    staker: Address,
    pool_asset: Asset,
    basis_points: u16,
    rune_out: Amount,
    asset_out: Amount,
}

/// `Withdraw` memos of basis_points==10000 empty a staker's row entirely;
/// anything else redeems a fraction and leaves the remainder in place.
/// There is no natural coin to refund when the pool rejects the request —
/// no inbound value accompanies an unstake memo — so a rejected pool
/// status simply returns the plain error.
pub fn handle(
    store: &mut Store,
    height: BlockHeight,
    signer: NodeAddress,
    tx_id: TxId,
    staker_addr: Address,
    pool_asset: Asset,
    basis_points: u16,
) -> Result<()> {
    check_gate(store, &signer, SignerGate::Active)?;

    let mut pool = store.get_pool(&pool_asset)?.ok_or_else(|| Error::PoolNotFound(pool_asset.clone()))?;
    check_pool_status(&pool, PoolOp::Unstake)?;

    let mut ledger = store.get_pool_staker(&pool_asset)?;
    let staker_units = staker::units_of(&ledger, &staker_addr);
    if staker_units.is_zero() {
        return Err(Error::InsufficientFunds);
    }

    let result = pool.unstake(staker_units, basis_points)?;
    staker::debit_units(&mut ledger, &staker_addr, result.units_redeemed)?;
    store.set_pool_staker(&pool_asset, &ledger)?;
    store.mirror_staker_units(&staker_addr, &pool_asset, staker::units_of(&ledger, &staker_addr))?;
    store.set_pool(&pool)?;

    refund_coin(store, height, tx_id, &staker_addr, Coin::rune(result.rune_out))?;
    refund_coin(store, height, tx_id, &staker_addr, Coin::new(pool_asset.clone(), result.asset_out))?;

    record_event(
        store,
        height,
        EventType::Unstake,
        tx_id,
        EventStatus::Success,
        &UnstakePayload { staker: staker_addr, pool_asset, basis_points, rune_out: result.rune_out, asset_out: result.asset_out },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use accounting::Pool;
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
    fn full_unstake_empties_the_staker_row() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        let signer = active_signer(&mut store, "node1");
        asgard_vault(&mut store);
        let asset = Asset::new("BNB", "BNB", "BNB");
        let mut pool = Pool::bootstrap(asset.clone());
        pool.status = accounting::PoolStatus::Enabled;
        let staker_addr = Address::from("staker1");
        let stake_result = pool.stake(Amount::from_atoms(100 * primitives::amount::ONE), Amount::from_atoms(10 * primitives::amount::ONE)).unwrap();
        store.set_pool(&pool).unwrap();
        let mut ledger = Vec::new();
        staker::credit_units(&mut ledger, &staker_addr, stake_result.units_issued).unwrap();
        store.set_pool_staker(&asset, &ledger).unwrap();

        handle(&mut store, BlockHeight::new(1), signer, Id::blank(), staker_addr.clone(), asset.clone(), 10_000).unwrap();

        let ledger = store.get_pool_staker(&asset).unwrap();
        assert!(staker::units_of(&ledger, &staker_addr).is_zero());
        let pool = store.get_pool(&asset).unwrap().unwrap();
        assert!(pool.is_empty());
    }

    #[test]
    fn unstake_with_no_position_is_insufficient_funds() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        let signer = active_signer(&mut store, "node1");
        let asset = Asset::new("BNB", "BNB", "BNB");
        let mut pool = Pool::bootstrap(asset.clone());
        pool.status = accounting::PoolStatus::Enabled;
        store.set_pool(&pool).unwrap();

        let err = handle(&mut store, BlockHeight::new(1), signer, Id::blank(), Address::from("nobody"), asset, 10_000).unwrap_err();
        assert_eq!(err, Error::InsufficientFunds);
    }
}
