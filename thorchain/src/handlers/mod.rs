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

//! C4: one module per intent (or small family of closely related
//! intents). Every handler shares the preamble in this file: a signer
//! gate check and a pool-status policy check, so the rules in `spec.md`
//! §4.4's shared preamble live in exactly one place.

pub mod add;
pub mod bond;
pub mod errata;
pub mod outbound;
pub mod pool_lifecycle;
pub mod ragnarok;
pub mod stake;
pub mod supplements;
pub mod swap;
pub mod tss;
pub mod unstake;

use accounting::Pool;
use primitives::{Address, Amount, BlockHeight, Coin, NodeAddress};
use serde::Serialize;

use crate::{
    error::{Error, Result},
    store::Store,
    types::{Event, EventId, EventStatus, EventType, TxId, TxOutItem},
};

/// Which node-account flags a signer must carry for a given message.
pub(crate) enum SignerGate {
    /// Signer must be an Active node account.
    Active,
    /// Signer must be an Active node account with `observer_active` set —
    /// the gate for messages that originate from chain observation.
    ActiveObserver,
    /// No prior authentication beyond a valid signature (bonding intents).
    Open,
}

pub(crate) fn check_gate(store: &Store, signer: &NodeAddress, gate: SignerGate) -> Result<()> {
    match gate {
        SignerGate::Open => Ok(()),
        SignerGate::Active => {
            let node = store.get_node(signer)?.ok_or(Error::Unauthorized)?;
            if node.is_active() {
                Ok(())
            } else {
                Err(Error::Unauthorized)
            }
        }
        SignerGate::ActiveObserver => {
            let node = store.get_node(signer)?.ok_or(Error::Unauthorized)?;
            if node.is_active() && node.observer_active {
                Ok(())
            } else {
                Err(Error::Unauthorized)
            }
        }
    }
}

pub(crate) enum PoolOp {
    Stake,
    Unstake,
    Swap,
    Add,
}

/// Enforce "Suspended rejects all; Bootstrap rejects swap/unstake; Enabled
/// admits all."
pub(crate) fn check_pool_status(pool: &Pool, op: PoolOp) -> Result<()> {
    let admits = match op {
        PoolOp::Stake => pool.status.admits_stake(),
        PoolOp::Unstake => pool.status.admits_unstake(),
        PoolOp::Swap => pool.status.admits_swap(),
        PoolOp::Add => pool.status.admits_stake(),
    };
    if admits {
        Ok(())
    } else {
        Err(Error::PoolSuspended(pool.asset.clone()))
    }
}

pub(crate) fn record_event(
    store: &mut Store,
    height: BlockHeight,
    event_type: EventType,
    in_tx: TxId,
    status: EventStatus,
    payload: &impl Serialize,
) -> Result<EventId> {
    let id = store.next_event_id()?;
    let mut event = Event::new(id, event_type, height, in_tx);
    event.status = status;
    event.set_payload(payload);
    store.set_event(&event)?;
    if !in_tx.is_blank() {
        store.set_event_index(&in_tx, id)?;
    }
    Ok(id)
}

/// Enqueue a refund of a single inbound coin back to its sender, minus the
/// standard outbound fee (deducted by `outbound_store::add_tx_out_item`,
/// the same path every other outbound takes).
pub(crate) fn refund_coin(store: &mut Store, height: BlockHeight, tx_id: TxId, to_address: &Address, coin: Coin) -> Result<()> {
    if coin.amount.is_zero() {
        return Ok(());
    }
    let item = TxOutItem {
        chain: coin.asset.chain.clone(),
        to_address: to_address.clone(),
        vault_pub_key: None,
        coin,
        memo: format!("REFUND:{tx_id}"),
        in_hash: tx_id,
        out_hash: None,
        sequence: 0,
        queued_height: BlockHeight::ZERO,
        event_id: None,
    };
    crate::outbound_store::add_tx_out_item(store, height, item)
}

/// The RUNE-equivalent value of `coin`, priced off the pool's own spot.
/// RUNE values itself; any other asset with no pool is priceless — treated
/// as zero so a missing pool never blocks slashing accounting.
pub(crate) fn rune_value(store: &Store, coin: &Coin) -> Result<Amount> {
    if coin.asset.is_rune() {
        return Ok(coin.amount);
    }
    let pool = match store.get_pool(&coin.asset)? {
        Some(pool) => pool,
        None => return Ok(Amount::ZERO),
    };
    if pool.balance_asset.is_zero() {
        return Ok(Amount::ZERO);
    }
    Ok(coin.amount.checked_mul_div(pool.balance_rune.atoms(), pool.balance_asset.atoms()).unwrap_or(Amount::ZERO))
}

/// Slash `node_addr`'s bond by `rune_value`, crediting `credit_fraction`
/// (numerator over `10_000`) of it to the reserve and burning the rest —
/// shared by `Outbound`/`Migrate`/`Ragnarok` mismatch handling
/// (`spec.md` §4.4's over-spend/under-spend slashing rule).
pub(crate) fn slash_bond_for_mismatch(store: &mut Store, node_addr: &NodeAddress, rune_value: Amount, credit_bps: u64) -> Result<()> {
    let mut node = match store.get_node(node_addr)? {
        Some(node) => node,
        None => return Ok(()),
    };
    let removed = node.slash_bond(rune_value);
    store.set_node(&node)?;

    let credited = removed.checked_mul_div(credit_bps as u128, 10_000).unwrap_or(Amount::ZERO);
    if !credited.is_zero() {
        let mut vault_data = store.get_vault_data()?;
        vault_data.credit_reserve(credited).ok_or_else(|| Error::Internal("reserve overflow crediting slash".to_owned()))?;
        store.set_vault_data(&vault_data)?;
    }
    Ok(())
}
