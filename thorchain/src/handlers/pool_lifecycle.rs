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

//! `CreatePool`, `EndPool` and `SetAdminConfig`: the three governance-style
//! intents that shape the pool set and the network's tunable constants
//! rather than moving value through a swap or stake.

use accounting::{staker, Pool, PoolStatus};
use primitives::{Amount, Asset, BlockHeight, Coin, NodeAddress};
use serde::Serialize;

use super::{check_gate, record_event, SignerGate};
use crate::{
    config::ConfigKey,
    error::{Error, Result},
    store::Store,
    types::{EventStatus, EventType, TxId},
};

#[derive(Serialize)]
struct CreatePoolPayload {
    pool_asset: Asset,
}

/// Register `pool_asset` as a Bootstrap pool. Idempotent: an already-known
/// pool is left exactly as it is rather than reset.
pub fn handle_create_pool(store: &mut Store, height: BlockHeight, signer: NodeAddress, pool_asset: Asset) -> Result<()> {
    check_gate(store, &signer, SignerGate::Active)?;

    if store.get_pool(&pool_asset)?.is_none() {
        store.set_pool(&Pool::bootstrap(pool_asset.clone()))?;
    }

    record_event(store, height, EventType::PoolLifecycle, TxId::blank(), EventStatus::Success, &CreatePoolPayload { pool_asset })?;
    Ok(())
}

#[derive(Serialize)]
struct EndPoolPayload {
    pool_asset: Asset,
    stakers_unwound: usize,
}

/// Redeem every staker's position in `pool_asset` at 100% and suspend it —
/// an admin-directed, single-pool counterpart to a full-network
/// `Ragnarok`, and so shares its unwind loop but records a `PoolLifecycle`
/// event rather than a `Ragnarok` one.
pub fn handle_end_pool(store: &mut Store, height: BlockHeight, signer: NodeAddress, pool_asset: Asset) -> Result<()> {
    check_gate(store, &signer, SignerGate::Active)?;

    let mut pool = store.get_pool(&pool_asset)?.ok_or_else(|| Error::PoolNotFound(pool_asset.clone()))?;
    let mut ledger = store.get_pool_staker(&pool_asset)?;
    let stakers: Vec<_> = ledger.iter().map(|row| (row.staker_id.clone(), row.units)).collect();

    for (staker_addr, units) in &stakers {
        if units.is_zero() {
            continue;
        }
        let result = pool.unstake(*units, 10_000)?;
        staker::debit_units(&mut ledger, staker_addr, result.units_redeemed)?;
        store.mirror_staker_units(staker_addr, &pool_asset, staker::units_of(&ledger, staker_addr))?;

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
                chain: pool_asset.chain.clone(),
                to_address: staker_addr.clone(),
                vault_pub_key: None,
                coin: Coin::new(pool_asset.clone(), result.asset_out),
                memo: String::new(),
                in_hash: TxId::blank(),
                out_hash: None,
                sequence: 0,
                queued_height: BlockHeight::ZERO,
                event_id: None,
            },
        )?;
    }

    store.set_pool_staker(&pool_asset, &ledger)?;
    pool.status = PoolStatus::Suspended;
    store.set_pool(&pool)?;

    record_event(
        store,
        height,
        EventType::PoolLifecycle,
        TxId::blank(),
        EventStatus::Success,
        &EndPoolPayload { pool_asset, stakers_unwound: stakers.len() },
    )?;
    Ok(())
}

#[derive(Serialize)]
struct AdminConfigPayload {
    key: ConfigKey,
    value: u64,
}

/// Write an override for `key`, attributed to the signer's bond address —
/// the identity `Store::get_admin_override`'s lexicographic tie-break
/// operates over.
pub fn handle_set_admin_config(store: &mut Store, height: BlockHeight, signer: NodeAddress, key: ConfigKey, value: u64) -> Result<()> {
    check_gate(store, &signer, SignerGate::Active)?;
    let node = store.get_node(&signer)?.ok_or(Error::Unauthorized)?;

    store.set_admin_override(key, &node.bond_address, value)?;

    record_event(store, height, EventType::PoolLifecycle, TxId::blank(), EventStatus::Success, &AdminConfigPayload { key, value })?;
    Ok(())
}
