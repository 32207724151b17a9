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

//! C6: the per-block outbound batch. `add_tx_out_item` is the single
//! entry point every handler calls to emit an outbound transfer; it owns
//! vault selection, fee deduction and sequence assignment so that logic
//! lives in exactly one place.

use primitives::{Amount, BlockHeight};
use serde::Serialize;

use crate::{
    config::ConfigKey,
    error::{Error, Result},
    store::Store,
    types::{EventStatus, EventType, TxOut, TxOutItem, VaultStatus, VaultType},
};

#[derive(Serialize)]
struct OutboundQueuedPayload<'a> {
    to_address: &'a primitives::Address,
    coin: &'a primitives::Coin,
}

/// Apply the five `AddTxOutItem` steps, append the item to the block's
/// batch and (if the in-hash is not blank) to the originating voter's
/// `actions`, and open the `Pending` `Outbound`/`Refund` event a later
/// observer report will complete.
pub fn add_tx_out_item(store: &mut Store, height: BlockHeight, mut item: TxOutItem) -> Result<()> {
    if item.memo.is_empty() {
        item.memo = format!("OUT:{}", item.in_hash);
    }

    if item.vault_pub_key.is_none() {
        item.vault_pub_key = select_vault_impl(store, &item, None)?;
    }
    let vault_pub_key = item.vault_pub_key.clone().ok_or(Error::VaultNotFound)?;

    let from_addr = vault_pub_key.thor_address();
    if from_addr.0 == item.to_address.0 {
        return Err(Error::InvalidMessage("outbound to_address equals the source vault's own address".to_owned()));
    }

    deduct_fee(store, &mut item)?;

    if item.coin.amount.is_zero() {
        logging::log::debug!("outbound item for {} dropped: fee consumed the entire payout", item.in_hash);
        return Ok(());
    }

    item.sequence = store.next_sequence(&vault_pub_key, &item.chain)?;
    item.queued_height = height;

    let event_type = if item.memo.starts_with("REFUND:") { EventType::Refund } else { EventType::Outbound };
    let event_id = store.next_event_id()?;
    let mut event = crate::types::Event::new(event_id, event_type, height, item.in_hash);
    event.status = EventStatus::Pending;
    event.set_payload(&OutboundQueuedPayload { to_address: &item.to_address, coin: &item.coin });
    store.set_event(&event)?;
    item.event_id = Some(event_id);

    let mut txout = store.get_txout(height)?.unwrap_or(TxOut { height, tx_array: Vec::new() });
    let index = txout.tx_array.len() as u32;
    txout.tx_array.push(item.clone());
    store.set_txout(&txout)?;
    store.add_pending_ref(&item.in_hash, height, index)?;
    store.mark_pending_txout(height, index)?;

    if !item.in_hash.is_blank() {
        if let Some(mut voter) = store.get_voter(&item.in_hash)? {
            voter.actions.push(item);
            store.set_voter(&voter)?;
        }
    }

    Ok(())
}

/// Yggdrasil-then-Asgard vault selection: prefer the Yggdrasil vault with
/// the largest balance of the requested asset if it can cover the full
/// amount, otherwise fall back to the Active Asgard vault. Only
/// Yggdrasils whose membership co-signed the originating observation are
/// considered — a Yggdrasil node that never witnessed the inbound tx has
/// no business being picked to pay it out
/// (`original_source/x/thorchain/txout_store.go`'s `CollectYggdrasilPools`).
fn select_vault_impl(store: &Store, item: &TxOutItem, exclude: Option<&primitives::PubKey>) -> Result<Option<primitives::PubKey>> {
    let co_signers = item
        .in_hash
        .is_blank()
        .then_some(None)
        .unwrap_or_else(|| store.get_voter(&item.in_hash).ok().flatten().and_then(|v| v.winning_payload().map(|tx| tx.signers.clone())));

    let mut yggs: Vec<_> = store
        .iter_vaults()?
        .into_iter()
        .filter(|v| v.vault_type == VaultType::Yggdrasil && v.status == VaultStatus::Active)
        .filter(|v| exclude.map_or(true, |ex| &v.pub_key != ex))
        .filter(|v| match &co_signers {
            Some(signers) => v.membership.iter().any(|pk| signers.contains(&pk.thor_address())),
            None => true,
        })
        .collect();
    yggs.sort_by(|a, b| b.balance_of(&item.coin.asset).atoms().cmp(&a.balance_of(&item.coin.asset).atoms()));

    if let Some(top) = yggs.first() {
        if top.balance_of(&item.coin.asset).atoms() >= item.coin.amount.atoms() {
            return Ok(Some(top.pub_key.clone()));
        }
    }

    let asgard = store
        .iter_vaults()?
        .into_iter()
        .filter(|v| v.vault_type == VaultType::Asgard && v.status == VaultStatus::Active)
        .find(|v| exclude.map_or(true, |ex| &v.pub_key != ex))
        .map(|v| v.pub_key);
    Ok(asgard)
}

/// Re-run vault selection for an item whose current vault is being
/// replaced (end-block signer-slashing reassignment, C8 step 2) — the
/// same policy as the original selection, minus the vault being retired
/// from consideration.
pub(crate) fn select_vault_excluding(store: &Store, item: &TxOutItem, exclude: &primitives::PubKey) -> Result<Option<primitives::PubKey>> {
    select_vault_impl(store, item, Some(exclude))
}

/// Deduct the admin-configured transaction fee, in RUNE terms, from the
/// outbound coin. A non-RUNE coin is debited its pool-spot equivalent,
/// with the pool's own reserves adjusted to keep it internally
/// consistent, and the RUNE-denominated fee credited to the reserve.
fn deduct_fee(store: &mut Store, item: &mut crate::types::TxOutItem) -> Result<()> {
    let fee = store.admin_config().get_amount(ConfigKey::TransactionFee);
    if fee.is_zero() {
        return Ok(());
    }

    let mut vault_data = store.get_vault_data()?;

    if item.coin.asset.is_rune() {
        let remaining = item.coin.amount.saturating_sub(fee);
        let deducted = item.coin.amount.checked_sub(remaining).unwrap_or(Amount::ZERO);
        item.coin.amount = remaining;
        vault_data.credit_reserve(deducted).ok_or_else(|| Error::Internal("reserve overflow crediting outbound fee".to_owned()))?;
        store.set_vault_data(&vault_data)?;
        return Ok(());
    }

    let mut pool = match store.get_pool(&item.coin.asset)? {
        Some(pool) => pool,
        None => return Ok(()), // no pool to price the fee against; nothing to deduct
    };
    if pool.balance_rune.is_zero() {
        return Ok(());
    }

    let asset_fee = fee
        .checked_mul_div(pool.balance_asset.atoms(), pool.balance_rune.atoms())
        .unwrap_or(Amount::ZERO)
        .atoms()
        .min(item.coin.amount.atoms());
    let asset_fee = Amount::from_atoms(asset_fee);

    item.coin.amount = item.coin.amount.checked_sub(asset_fee).unwrap_or(Amount::ZERO);
    pool.balance_rune = pool.balance_rune.checked_add(fee).ok_or_else(|| Error::Internal("pool rune balance overflow".to_owned()))?;
    pool.balance_asset = pool.balance_asset.checked_sub(asset_fee).unwrap_or(Amount::ZERO);
    store.set_pool(&pool)?;

    vault_data.credit_reserve(fee).ok_or_else(|| Error::Internal("reserve overflow crediting outbound fee".to_owned()))?;
    store.set_vault_data(&vault_data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use accounting::PoolStatus;
    use primitives::{Address, Asset, Coin, Id};

    use super::*;
    use crate::{store::MemoryChain, types::Vault};

    fn asgard(store: &mut Store, pub_key: &str) {
        let vault = Vault::new(primitives::PubKey::new(pub_key.as_bytes().to_vec()), VaultType::Asgard, BlockHeight::ZERO);
        store.set_vault(&vault).unwrap();
    }

    #[test]
    fn item_with_no_yggdrasil_falls_back_to_asgard() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        asgard(&mut store, "asgard-key");

        let item = TxOutItem {
            chain: primitives::Chain::from("THOR"),
            to_address: Address::from("dest"),
            vault_pub_key: None,
            coin: Coin::rune(Amount::from_atoms(100)),
            memo: String::new(),
            in_hash: Id::blank(),
            out_hash: None,
            sequence: 0,
            queued_height: BlockHeight::ZERO,
            event_id: None,
        };
        add_tx_out_item(&mut store, BlockHeight::new(1), item).unwrap();

        let txout = store.get_txout(BlockHeight::new(1)).unwrap().unwrap();
        assert_eq!(txout.tx_array.len(), 1);
        assert_eq!(txout.tx_array[0].memo, format!("OUT:{}", Id::<crate::types::Tx>::blank()));
    }

    #[test]
    fn zero_amount_after_fee_is_dropped_silently() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        asgard(&mut store, "asgard-key");
        store.set_admin_override(ConfigKey::TransactionFee, &Address::from("admin"), 1_000).unwrap();

        let item = TxOutItem {
            chain: primitives::Chain::from("THOR"),
            to_address: Address::from("dest"),
            vault_pub_key: None,
            coin: Coin::rune(Amount::from_atoms(100)),
            memo: String::new(),
            in_hash: Id::blank(),
            out_hash: None,
            sequence: 0,
            queued_height: BlockHeight::ZERO,
            event_id: None,
        };
        add_tx_out_item(&mut store, BlockHeight::new(1), item).unwrap();
        assert!(store.get_txout(BlockHeight::new(1)).unwrap().is_none());
    }

    #[test]
    fn non_rune_fee_is_converted_via_pool_spot_and_keeps_pool_consistent() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        asgard(&mut store, "asgard-key");
        let asset = Asset::new("BNB", "BNB", "BNB");
        let pool = accounting::Pool {
            asset: asset.clone(),
            balance_rune: Amount::from_atoms(100 * primitives::amount::ONE),
            balance_asset: Amount::from_atoms(10 * primitives::amount::ONE),
            pool_units: Amount::from_atoms(100 * primitives::amount::ONE),
            status: PoolStatus::Enabled,
        };
        store.set_pool(&pool).unwrap();
        store.set_admin_override(ConfigKey::TransactionFee, &Address::from("admin"), primitives::amount::ONE as u64).unwrap();

        let item = TxOutItem {
            chain: primitives::Chain::from("BNB"),
            to_address: Address::from("dest"),
            vault_pub_key: None,
            coin: Coin::new(asset.clone(), Amount::from_atoms(5 * primitives::amount::ONE)),
            memo: String::new(),
            in_hash: Id::blank(),
            out_hash: None,
            sequence: 0,
            queued_height: BlockHeight::ZERO,
            event_id: None,
        };
        add_tx_out_item(&mut store, BlockHeight::new(1), item).unwrap();

        let updated_pool = store.get_pool(&asset).unwrap().unwrap();
        assert_eq!(updated_pool.balance_rune.atoms(), 101 * primitives::amount::ONE);
        let txout = store.get_txout(BlockHeight::new(1)).unwrap().unwrap();
        assert_eq!(txout.tx_array[0].coin.amount.atoms(), (5 * primitives::amount::ONE) - (primitives::amount::ONE / 10));
    }
}
