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

use primitives::{Amount, Asset, BlockHeight, NodeAddress};
use serde::Serialize;

use super::{check_gate, check_pool_status, record_event, PoolOp, SignerGate};
use crate::{
    error::{Error, Result},
    store::Store,
    types::{EventStatus, EventType, TxId},
};

#[derive(Serialize)]
struct AddPayload {
    pool_asset: Asset,
    rune: Amount,
    asset: Amount,
}

/// `ADD` credits reserves without issuing units, diluting every existing
/// staker's claim pro rata. Gas reimbursements use the same mechanism
/// (`GAS` memo) and are recorded under a distinct event type only so an
/// indexer can tell the two apart; the ledger effect is identical.
pub fn handle(
    store: &mut Store,
    height: BlockHeight,
    signer: NodeAddress,
    tx_id: TxId,
    pool_asset: Asset,
    rune: Amount,
    asset: Amount,
    event_type: EventType,
) -> Result<()> {
    check_gate(store, &signer, SignerGate::Active)?;

    let mut pool = store.get_pool(&pool_asset)?.ok_or_else(|| Error::PoolNotFound(pool_asset.clone()))?;
    check_pool_status(&pool, PoolOp::Add)?;

    pool.add(rune, asset)?;
    store.set_pool(&pool)?;

    record_event(store, height, event_type, tx_id, EventStatus::Success, &AddPayload { pool_asset, rune, asset })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use accounting::Pool;
    use primitives::{Id, PubKey};

    use super::*;
    use crate::{
        store::MemoryChain,
        types::{NodeAccount, NodeStatus},
    };

    fn active_signer(store: &mut Store, addr: &str) -> NodeAddress {
        let node_addr = NodeAddress::from(addr);
        let mut node = NodeAccount::new(node_addr.clone(), primitives::Address::from(addr), Amount::ZERO, BlockHeight::ZERO);
        node.status = NodeStatus::Active;
        store.set_node(&node).unwrap();
        node_addr
    }

    #[test]
    fn add_dilutes_reserves_without_issuing_units() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        let signer = active_signer(&mut store, "node1");
        let asset = Asset::new("BNB", "BNB", "BNB");
        let mut pool = Pool::bootstrap(asset.clone());
        pool.status = accounting::PoolStatus::Enabled;
        pool.stake(Amount::from_atoms(100), Amount::from_atoms(10)).unwrap();
        store.set_pool(&pool).unwrap();
        let units_before = pool.pool_units;

        handle(&mut store, BlockHeight::new(1), signer, Id::blank(), asset.clone(), Amount::from_atoms(10), Amount::from_atoms(1), EventType::Add).unwrap();

        let pool = store.get_pool(&asset).unwrap().unwrap();
        assert_eq!(pool.pool_units, units_before);
        assert_eq!(pool.balance_rune, Amount::from_atoms(110));
        let _ = PubKey::new(Vec::new());
    }
}
