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

//! The smaller intents that round out C4: `Reserve` (a direct network
//! funding contribution) and `YggdrasilFund`/`YggdrasilReturn` (observer
//! confirmation that value moved between an Asgard and a per-node
//! Yggdrasil vault during churn). `Gas` is the `ADD` mechanism under a
//! distinct event type and is just a thin call into `handlers::add`.

use primitives::{Address, Amount, Asset, BlockHeight, Coin, NodeAddress, PubKey};
use serde::Serialize;

use super::{check_gate, record_event, SignerGate};
use crate::{
    error::{Error, Result},
    store::Store,
    types::{EventStatus, EventType, TxId, VaultStatus, VaultType},
};

/// `GAS` reimbursements dilute a pool's reserves exactly like `ADD`; only
/// the event type on the ledger differs, for indexers to tell them apart.
#[allow(clippy::too_many_arguments)]
pub fn handle_gas(store: &mut Store, height: BlockHeight, signer: NodeAddress, tx_id: TxId, pool_asset: Asset, rune: Amount, asset: Amount) -> Result<()> {
    super::add::handle(store, height, signer, tx_id, pool_asset, rune, asset, EventType::Gas)
}

#[derive(Serialize)]
struct ReservePayload {
    contributor: Address,
    amount: Amount,
}

/// A direct, un-pooled contribution to the network reserve.
pub fn handle_reserve(store: &mut Store, height: BlockHeight, signer: NodeAddress, contributor: Address, amount: Amount) -> Result<()> {
    check_gate(store, &signer, SignerGate::Active)?;
    store.add_reserve_contribution(contributor.clone(), amount)?;
    record_event(store, height, EventType::PoolLifecycle, TxId::blank(), EventStatus::Success, &ReservePayload { contributor, amount })?;
    Ok(())
}

#[derive(Serialize)]
struct YggdrasilPayload {
    kind: &'static str,
    pub_key: PubKey,
    coin: Coin,
}

/// An observer confirms `coin` arrived at the Yggdrasil vault `pub_key` —
/// the network funding one of its per-node signing vaults ahead of
/// dispatching outbound traffic through it.
pub fn handle_yggdrasil_fund(store: &mut Store, height: BlockHeight, signer: NodeAddress, pub_key: PubKey, coin: Coin) -> Result<()> {
    check_gate(store, &signer, SignerGate::ActiveObserver)?;

    let mut vault = store.get_vault(&pub_key)?.ok_or(Error::VaultNotFound)?;
    if vault.vault_type != VaultType::Yggdrasil {
        return Err(Error::InvalidMessage("YggdrasilFund target is not a Yggdrasil vault".to_owned()));
    }
    vault.credit(coin.clone()).ok_or_else(|| Error::Internal("vault balance overflow crediting yggdrasil fund".to_owned()))?;
    store.set_vault(&vault)?;

    record_event(store, height, EventType::PoolLifecycle, TxId::blank(), EventStatus::Success, &YggdrasilPayload { kind: "yggdrasil_fund", pub_key, coin })?;
    Ok(())
}

/// An observer confirms `coin` left the Yggdrasil vault `pub_key` — it is
/// credited to the Active Asgard vault so the network's total holdings
/// stay conserved rather than simply vanishing from the ledger.
pub fn handle_yggdrasil_return(store: &mut Store, height: BlockHeight, signer: NodeAddress, pub_key: PubKey, coin: Coin) -> Result<()> {
    check_gate(store, &signer, SignerGate::ActiveObserver)?;

    let mut vault = store.get_vault(&pub_key)?.ok_or(Error::VaultNotFound)?;
    if vault.vault_type != VaultType::Yggdrasil {
        return Err(Error::InvalidMessage("YggdrasilReturn source is not a Yggdrasil vault".to_owned()));
    }
    vault.debit(&coin).ok_or(Error::InsufficientFunds)?;
    store.set_vault(&vault)?;

    if let Some(mut asgard) = store.iter_vaults()?.into_iter().find(|v| v.vault_type == VaultType::Asgard && v.status == VaultStatus::Active) {
        asgard.credit(coin.clone()).ok_or_else(|| Error::Internal("vault balance overflow crediting returned yggdrasil funds".to_owned()))?;
        store.set_vault(&asgard)?;
    }

    record_event(store, height, EventType::PoolLifecycle, TxId::blank(), EventStatus::Success, &YggdrasilPayload { kind: "yggdrasil_return", pub_key, coin })?;
    Ok(())
}
