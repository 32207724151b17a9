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

//! The typed façade over [`storage`]. Every key is `v1/<prefix>/<sub-key>`
//! — the `v1` segment is a schema version, bumped workspace-wide the day a
//! migration is needed.

use accounting::{Pool, StakerPosition};
use parity_scale_codec::{Decode, Encode};
use primitives::{Address, Amount, Asset, BlockHeight, NodeAddress, PubKey};
use serde::{Deserialize, Serialize};
use storage::{StorageRead, StorageWrite};

use crate::{
    config::ConfigKey,
    error::{Error, Result},
    types::{Event, EventId, NodeAccount, ObservedTxVoter, Tx, TxOut, Vault, VaultData},
};

const SCHEMA_VERSION: &str = "v1";

fn key(prefix: &str, sub: &str) -> Vec<u8> {
    format!("{SCHEMA_VERSION}/{prefix}/{sub}").into_bytes()
}

fn prefix_key(prefix: &str) -> Vec<u8> {
    format!("{SCHEMA_VERSION}/{prefix}/").into_bytes()
}

/// One contributor's funding of the network reserve, kept for audit
/// (`original_source/x/thorchain/keeper_reserve_contributors.go`).
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ReserveContributor {
    pub address: Address,
    pub amount: Amount,
}

/// Borrows a mutable [`storage::StorageWrite`] backend for the duration of
/// one block. `R` is generic over the concrete backend/transaction type so
/// the same façade works over a bare [`storage::InMemoryBackend`] in tests
/// and over a [`storage::BlockTransaction`] in block processing.
pub struct Store<'a> {
    backend: &'a mut dyn StorageWrite,
}

impl<'a> Store<'a> {
    pub fn new(backend: &'a mut dyn StorageWrite) -> Self {
        Store { backend }
    }

    fn get_decoded<T: Decode>(&self, prefix: &str, sub: &str) -> Result<Option<T>> {
        match self.backend.get(&key(prefix, sub)).map_err(Error::from)? {
            Some(bytes) => {
                let value = T::decode(&mut &bytes[..])
                    .map_err(|e| Error::StoreCorruption(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set_encoded<T: Encode>(&mut self, prefix: &str, sub: &str, value: &T) -> Result<()> {
        self.backend.set(&key(prefix, sub), value.encode()).map_err(Error::from)
    }

    fn iter_decoded<T: Decode>(&self, prefix: &str) -> Result<Vec<T>> {
        self.backend
            .iter_prefix(&prefix_key(prefix))
            .map_err(Error::from)?
            .into_iter()
            .map(|(_, v)| T::decode(&mut &v[..]).map_err(|e| Error::StoreCorruption(e.to_string())))
            .collect()
    }

    // ---- pool/ ----

    pub fn get_pool(&self, asset: &Asset) -> Result<Option<Pool>> {
        self.get_decoded("pool", &asset.to_string())
    }

    pub fn set_pool(&mut self, pool: &Pool) -> Result<()> {
        self.set_encoded("pool", &pool.asset.to_string(), pool)
    }

    pub fn iter_pools(&self) -> Result<Vec<Pool>> {
        self.iter_decoded("pool")
    }

    // ---- poolstaker/{asset} (PoolStaker[asset]) ----

    pub fn get_pool_staker(&self, asset: &Asset) -> Result<Vec<StakerPosition>> {
        Ok(self.get_decoded("poolstaker", &asset.to_string())?.unwrap_or_default())
    }

    pub fn set_pool_staker(&mut self, asset: &Asset, ledger: &Vec<StakerPosition>) -> Result<()> {
        self.set_encoded("poolstaker", &asset.to_string(), ledger)
    }

    // ---- staker/{addr} (StakerPool[addr] = map<asset, units>) ----

    pub fn get_staker_pool(&self, addr: &Address) -> Result<Vec<(Asset, Amount)>> {
        Ok(self.get_decoded("staker", &addr.0)?.unwrap_or_default())
    }

    pub fn set_staker_pool(&mut self, addr: &Address, positions: &Vec<(Asset, Amount)>) -> Result<()> {
        self.set_encoded("staker", &addr.0, positions)
    }

    /// Mirror a staker's units into `StakerPool[addr]`, the reverse index
    /// of `PoolStaker[asset]` keyed by staker instead of by pool.
    pub fn mirror_staker_units(&mut self, addr: &Address, asset: &Asset, units: Amount) -> Result<()> {
        let mut positions = self.get_staker_pool(addr)?;
        match positions.iter_mut().find(|(a, _)| a == asset) {
            Some((_, u)) => *u = units,
            None => positions.push((asset.clone(), units)),
        }
        positions.retain(|(_, u)| !u.is_zero());
        self.set_staker_pool(addr, &positions)
    }

    // ---- node/{addr} ----

    pub fn get_node(&self, addr: &NodeAddress) -> Result<Option<NodeAccount>> {
        self.get_decoded("node", &addr.0)
    }

    pub fn set_node(&mut self, node: &NodeAccount) -> Result<()> {
        self.set_encoded("node", &node.node_addr.0, node)
    }

    pub fn iter_nodes(&self) -> Result<Vec<NodeAccount>> {
        self.iter_decoded("node")
    }

    pub fn active_node_count(&self) -> Result<u32> {
        Ok(self.iter_nodes()?.into_iter().filter(|n| n.is_active()).count() as u32)
    }

    // ---- vault/{pub_key} ----

    pub fn get_vault(&self, pub_key: &PubKey) -> Result<Option<Vault>> {
        self.get_decoded("vault", &pub_key.to_string())
    }

    pub fn set_vault(&mut self, vault: &Vault) -> Result<()> {
        self.set_encoded("vault", &vault.pub_key.to_string(), vault)
    }

    pub fn iter_vaults(&self) -> Result<Vec<Vault>> {
        self.iter_decoded("vault")
    }

    // ---- voter/{tx_id} ----

    pub fn get_voter(&self, tx_id: &crate::types::TxId) -> Result<Option<ObservedTxVoter>> {
        self.get_decoded("voter", &tx_id.to_string())
    }

    pub fn set_voter(&mut self, voter: &ObservedTxVoter) -> Result<()> {
        self.set_encoded("voter", &voter.tx_id.to_string(), voter)
    }

    /// Every voter ever created, in lexicographic `tx_id` order. Used by
    /// the end-block expiry sweep; voters are never deleted, so this grows
    /// without bound — acceptable for the append-only audit trail
    /// `spec.md` §4.2 describes.
    pub fn iter_voters(&self) -> Result<Vec<ObservedTxVoter>> {
        self.iter_decoded("voter")
    }

    // ---- txout/{height} ----

    pub fn get_txout(&self, height: BlockHeight) -> Result<Option<TxOut>> {
        self.get_decoded("txout", &height.value().to_string())
    }

    pub fn set_txout(&mut self, txout: &TxOut) -> Result<()> {
        self.set_encoded("txout", &txout.height.value().to_string(), txout)
    }

    /// The next `sequence` number for `(vault_pub_key, chain)`.
    pub fn next_sequence(&mut self, vault_pub_key: &PubKey, chain: &primitives::Chain) -> Result<u64> {
        let sub = format!("{vault_pub_key}/{chain}");
        let current: u64 = self.get_decoded("txseq", &sub)?.unwrap_or(0);
        self.set_encoded("txseq", &sub, &(current + 1))?;
        Ok(current)
    }

    /// A reference to one queued `TxOutItem`: the key under which it lives
    /// in `TxOut[height]` plus its position in `tx_array`.
    pub fn pending_refs(&self, in_hash: &crate::types::TxId) -> Result<Vec<(BlockHeight, u32)>> {
        Ok(self.get_decoded("pending", &in_hash.to_string())?.unwrap_or_default())
    }

    /// Record that a freshly queued item at `(height, index)` settles
    /// `in_hash` — including the blank sentinel shared by every
    /// ragnarok-initiated item, which is why this is a list rather than a
    /// single slot.
    pub fn add_pending_ref(&mut self, in_hash: &crate::types::TxId, height: BlockHeight, index: u32) -> Result<()> {
        let mut refs = self.pending_refs(in_hash)?;
        refs.push((height, index));
        self.set_encoded("pending", &in_hash.to_string(), &refs)
    }

    /// Drop the `(height, index)` reference once the item it names has
    /// been settled (or slashed for a mismatch).
    pub fn remove_pending_ref(&mut self, in_hash: &crate::types::TxId, height: BlockHeight, index: u32) -> Result<()> {
        let mut refs = self.pending_refs(in_hash)?;
        refs.retain(|&(h, i)| !(h == height && i == index));
        self.set_encoded("pending", &in_hash.to_string(), &refs)
    }

    /// All still-pending outbound items, as `(queued_height, index)`
    /// pairs, regardless of which `in_hash` queued them. Backs the
    /// end-block signer-slashing sweep (C8 step 2), which must walk every
    /// outstanding item rather than one `in_hash` at a time.
    pub fn mark_pending_txout(&mut self, height: BlockHeight, index: u32) -> Result<()> {
        self.set_encoded("pendingtxout", &format!("{:020}/{:010}", height.value(), index), &true)
    }

    pub fn unmark_pending_txout(&mut self, height: BlockHeight, index: u32) -> Result<()> {
        self.backend.delete(&key("pendingtxout", &format!("{:020}/{:010}", height.value(), index))).map_err(Error::from)
    }

    pub fn iter_pending_txout_refs(&self) -> Result<Vec<(BlockHeight, u32)>> {
        let marker_prefix = format!("{SCHEMA_VERSION}/pendingtxout/");
        let entries = self.backend.iter_prefix(&prefix_key("pendingtxout")).map_err(Error::from)?;
        let mut out = Vec::new();
        for (k, _) in entries {
            let raw = String::from_utf8_lossy(&k);
            let Some(rest) = raw.strip_prefix(&marker_prefix) else { continue };
            let Some((h, i)) = rest.split_once('/') else { continue };
            if let (Ok(h), Ok(i)) = (h.parse::<u64>(), i.parse::<u32>()) {
                out.push((BlockHeight::new(h), i));
            }
        }
        Ok(out)
    }

    /// The height from which a stale outbound item's `SigningTransactionPeriod`
    /// clock is measured — `queued_height` until the end-block
    /// signer-slashing pass (C8 step 2) first reassigns it, then that
    /// reassignment's own height, so a reassigned item gets a fresh grace
    /// period rather than being re-slashed every subsequent block.
    pub fn get_reassign_checkpoint(&self, queued_height: BlockHeight, index: u32) -> Result<Option<BlockHeight>> {
        self.get_decoded("reassign", &format!("{}/{}", queued_height.value(), index))
    }

    pub fn set_reassign_checkpoint(&mut self, queued_height: BlockHeight, index: u32, at: BlockHeight) -> Result<()> {
        self.set_encoded("reassign", &format!("{}/{}", queued_height.value(), index), &at)
    }

    // ---- keysignfail/{hash} ----

    /// Whether a `TssKeysignFail` report keyed by `hash` (a digest of its
    /// sorted members, height, memo and coins) has already been processed
    /// — a repeated report of the same failed ceremony must not slash the
    /// same members twice.
    pub fn keysign_fail_seen(&self, hash: &[u8; 32]) -> Result<bool> {
        Ok(self.get_decoded::<bool>("keysignfail", &hex::encode(hash))?.unwrap_or(false))
    }

    pub fn mark_keysign_fail_seen(&mut self, hash: &[u8; 32]) -> Result<()> {
        self.set_encoded("keysignfail", &hex::encode(hash), &true)
    }

    // ---- errata/{tx_id} ----

    pub fn get_errata_votes(&self, tx_id: &crate::types::TxId) -> Result<std::collections::BTreeSet<NodeAddress>> {
        Ok(self.get_decoded("errata", &tx_id.to_string())?.unwrap_or_default())
    }

    pub fn set_errata_votes(&mut self, tx_id: &crate::types::TxId, votes: &std::collections::BTreeSet<NodeAddress>) -> Result<()> {
        self.set_encoded("errata", &tx_id.to_string(), votes)
    }

    /// Whether `tx_id`'s errata has already been applied — once consensus
    /// fires it must not re-fire on a later, redundant vote.
    pub fn errata_applied(&self, tx_id: &crate::types::TxId) -> Result<bool> {
        Ok(self.get_decoded::<bool>("errata_done", &tx_id.to_string())?.unwrap_or(false))
    }

    pub fn mark_errata_applied(&mut self, tx_id: &crate::types::TxId) -> Result<()> {
        self.set_encoded("errata_done", &tx_id.to_string(), &true)
    }

    // ---- tssvoter/{ceremony_id} ----

    pub fn get_tss_voter(&self, ceremony_id: &crate::types::CeremonyId) -> Result<Option<crate::types::TssVoter>> {
        self.get_decoded("tssvoter", &ceremony_id.to_string())
    }

    pub fn set_tss_voter(&mut self, voter: &crate::types::TssVoter) -> Result<()> {
        self.set_encoded("tssvoter", &voter.ceremony_id.to_string(), voter)
    }

    // ---- event/{id} ----

    pub fn get_event(&self, id: EventId) -> Result<Option<Event>> {
        self.get_decoded("event", &id.to_string())
    }

    pub fn set_event(&mut self, event: &Event) -> Result<()> {
        self.set_encoded("event", &event.id.to_string(), event)
    }

    pub fn next_event_id(&mut self) -> Result<EventId> {
        let current: EventId = self.get_decoded("event", "_next_id")?.unwrap_or(0);
        self.set_encoded("event", "_next_id", &(current + 1))?;
        Ok(current)
    }

    // ---- eventidx/{tx_id} ----

    /// The primary event a handler recorded for `tx_id` via
    /// `handlers::record_event`, if any — lets `Errata` find what an
    /// inbound transaction did without scanning every event.
    pub fn get_event_by_tx(&self, tx_id: &crate::types::TxId) -> Result<Option<EventId>> {
        self.get_decoded("eventidx", &tx_id.to_string())
    }

    pub fn set_event_index(&mut self, tx_id: &crate::types::TxId, id: EventId) -> Result<()> {
        self.set_encoded("eventidx", &tx_id.to_string(), &id)
    }

    // ---- reserves/ ----

    pub fn get_reserve_contributors(&self) -> Result<Vec<ReserveContributor>> {
        Ok(self.get_decoded("reserves", "")?.unwrap_or_default())
    }

    pub fn add_reserve_contribution(&mut self, address: Address, amount: Amount) -> Result<()> {
        let mut contribs = self.get_reserve_contributors()?;
        contribs.push(ReserveContributor { address, amount });
        self.set_encoded("reserves", "", &contribs)?;

        let mut vault_data = self.get_vault_data()?;
        vault_data.credit_reserve(amount).ok_or(Error::Internal("reserve overflow".into()))?;
        self.set_vault_data(&vault_data)
    }

    // ---- vaultdata/ ----

    pub fn get_vault_data(&self) -> Result<VaultData> {
        Ok(self.get_decoded("vaultdata", "")?.unwrap_or_default())
    }

    pub fn set_vault_data(&mut self, data: &VaultData) -> Result<()> {
        self.set_encoded("vaultdata", "", data)
    }

    // ---- fees/{height} ----

    /// Running total of swap liquidity fees collected so far this block,
    /// RUNE-denominated. Reset implicitly: each height has its own key, so a
    /// fresh block starts at zero without any explicit clear step.
    pub fn get_block_fees(&self, height: BlockHeight) -> Result<Amount> {
        Ok(self.get_decoded("fees", &height.value().to_string())?.unwrap_or(Amount::ZERO))
    }

    pub fn add_block_fees(&mut self, height: BlockHeight, amount: Amount) -> Result<()> {
        let total = self.get_block_fees(height)?.checked_add(amount).ok_or_else(|| Error::Internal("block fee accumulator overflowed".to_owned()))?;
        self.set_encoded("fees", &height.value().to_string(), &total)
    }

    /// Fold `coins` into `vault_data.gas`, the running list of gas spent by
    /// settled outbounds since the last end-block gas-subsidy pass (C8 step
    /// 5a) drained it.
    pub fn add_spent_gas(&mut self, coins: Vec<primitives::Coin>) -> Result<()> {
        let mut data = self.get_vault_data()?;
        for coin in coins {
            match data.gas.iter_mut().find(|c| c.asset == coin.asset) {
                Some(existing) => existing.amount = existing.amount.checked_add(coin.amount).ok_or_else(|| Error::Internal("vault gas accumulator overflowed".to_owned()))?,
                None => data.gas.push(coin),
            }
        }
        self.set_vault_data(&data)
    }

    // ---- lastchain/{chain} ----

    pub fn get_last_chain_height(&self, chain: &primitives::Chain) -> Result<BlockHeight> {
        Ok(self.get_decoded("lastchain", &chain.0)?.unwrap_or(BlockHeight::ZERO))
    }

    pub fn set_last_chain_height(&mut self, chain: &primitives::Chain, height: BlockHeight) -> Result<()> {
        self.set_encoded("lastchain", &chain.0, &height)
    }

    // ---- lastsigned/ ----

    pub fn get_last_signed_height(&self) -> Result<BlockHeight> {
        Ok(self.get_decoded("lastsigned", "")?.unwrap_or(BlockHeight::ZERO))
    }

    pub fn set_last_signed_height(&mut self, height: BlockHeight) -> Result<()> {
        self.set_encoded("lastsigned", "", &height)
    }

    // ---- admin/{key}/{addr} ----

    /// The override an admin address has written for `key`, if any. When
    /// more than one admin address has written an override, the
    /// lexicographically greatest address wins — an arbitrary but
    /// deterministic tie-break (`DESIGN.md` open question).
    pub fn get_admin_override(&self, key_enum: ConfigKey) -> Option<u64> {
        let prefix = format!("{SCHEMA_VERSION}/admin/{}/", key_enum.store_segment());
        let mut entries = self.backend.iter_prefix(prefix.as_bytes()).ok()?;
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.last().and_then(|(_, v)| u64::decode(&mut &v[..]).ok())
    }

    pub fn set_admin_override(&mut self, key_enum: ConfigKey, addr: &Address, value: u64) -> Result<()> {
        let sub = format!("{}/{}", key_enum.store_segment(), addr.0);
        self.set_encoded("admin", &sub, &value)
    }

    pub fn admin_config(&self) -> crate::config::AdminConfig<'_, 'a> {
        crate::config::AdminConfig::new(self)
    }
}

/// An in-process backend + store pair for tests and small embeddings that
/// don't need a real per-block transaction boundary.
pub struct MemoryChain {
    pub backend: storage::InMemoryBackend,
}

impl MemoryChain {
    pub fn new() -> Self {
        MemoryChain { backend: storage::InMemoryBackend::new() }
    }

    pub fn store(&mut self) -> Store<'_> {
        Store::new(&mut self.backend)
    }
}

impl Default for MemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accounting::PoolStatus;

    #[test]
    fn pool_round_trips_through_store() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        let pool = Pool {
            asset: Asset::new("BNB", "BNB", "BNB"),
            balance_rune: Amount::from_atoms(100),
            balance_asset: Amount::from_atoms(10),
            pool_units: Amount::from_atoms(100),
            status: PoolStatus::Enabled,
        };
        store.set_pool(&pool).unwrap();
        let loaded = store.get_pool(&pool.asset).unwrap().unwrap();
        assert_eq!(loaded, pool);
    }

    #[test]
    fn iter_pools_is_lexicographic_by_asset_key() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        for ticker in ["ZZZ", "AAA", "MMM"] {
            let pool = Pool {
                asset: Asset::new("BNB", ticker, ticker),
                balance_rune: Amount::from_atoms(1),
                balance_asset: Amount::from_atoms(1),
                pool_units: Amount::from_atoms(1),
                status: PoolStatus::Enabled,
            };
            store.set_pool(&pool).unwrap();
        }
        let pools = store.iter_pools().unwrap();
        let tickers: Vec<_> = pools.iter().map(|p| p.asset.ticker.clone()).collect();
        assert_eq!(tickers, vec!["AAA", "MMM", "ZZZ"]);
    }

    #[test]
    fn admin_override_falls_back_to_default() {
        let mut chain = MemoryChain::new();
        let store = chain.store();
        assert_eq!(store.admin_config().gsl_bps(), 3_000);
    }

    #[test]
    fn admin_override_wins_over_default() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        store.set_admin_override(ConfigKey::Gsl, &Address::from("admin1"), 2_000).unwrap();
        assert_eq!(store.admin_config().gsl_bps(), 2_000);
    }
}
