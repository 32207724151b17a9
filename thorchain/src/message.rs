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

//! The dispatch surface for C4: every variant a handler exists for. A
//! `Message` is built either directly by a caller (`SetAdminConfig`,
//! `Apply`, `Bond`, `Leave`, `TssPool`, `TssKeysignFail`, `Errata`,
//! `Ragnarok`, `EndPool`) or by the observation path once an inbound
//! transfer's memo has been classified (`Stake`..`Reserve`).

use primitives::{Address, Amount, Asset, Coin, NodeAddress, PubKey};

use crate::{
    config::ConfigKey,
    types::{CeremonyId, ObservedTx, TxId, VaultType},
};

#[derive(Clone, Debug)]
pub enum Message {
    Stake { signer: NodeAddress, tx_id: TxId, staker: Address, pool_asset: Asset, rune: Amount, asset: Amount },
    Unstake { signer: NodeAddress, tx_id: TxId, staker: Address, pool_asset: Asset, basis_points: u16 },
    Swap {
        signer: NodeAddress,
        tx_id: TxId,
        from: Address,
        input: Coin,
        target_asset: Asset,
        dest_address: Address,
        target_price: Option<Amount>,
    },
    Add { signer: NodeAddress, tx_id: TxId, pool_asset: Asset, rune: Amount, asset: Amount },
    Gas { signer: NodeAddress, tx_id: TxId, pool_asset: Asset, rune: Amount, asset: Amount },
    /// An observer reports that a previously queued `TxOutItem` has
    /// appeared on the destination chain. `in_hash = None` means the
    /// memo carried no reference and the item must be located by
    /// `(vault, coin, to_address)` alone — the ragnarok/blank-sentinel
    /// matching path.
    Outbound { signer: NodeAddress, reported_tx: ObservedTx, in_hash: Option<TxId> },
    Migrate { signer: NodeAddress, reported_tx: ObservedTx, in_hash: TxId },
    Reserve { signer: NodeAddress, contributor: Address, amount: Amount },
    YggdrasilFund { signer: NodeAddress, pub_key: PubKey, coin: Coin },
    YggdrasilReturn { signer: NodeAddress, pub_key: PubKey, coin: Coin },
    CreatePool { signer: NodeAddress, pool_asset: Asset },
    EndPool { signer: NodeAddress, pool_asset: Asset },
    Ragnarok { signer: NodeAddress, pool_asset: Option<Asset> },
    Errata { signer: NodeAddress, tx_id: TxId },
    SetAdminConfig { signer: NodeAddress, key: ConfigKey, value: u64 },
    Apply { signer: NodeAddress, node_addr: NodeAddress, bond_address: Address, bond: Amount, pub_key: PubKey },
    Bond { signer: NodeAddress, node_addr: NodeAddress, amount: Amount },
    Leave { signer: NodeAddress, node_addr: NodeAddress },
    TssPool {
        signer: NodeAddress,
        ceremony_id: CeremonyId,
        vault_type: VaultType,
        pool_pub_key: Option<PubKey>,
        member_pub_keys: Vec<PubKey>,
        blame: Vec<NodeAddress>,
    },
    TssKeysignFail { signer: NodeAddress, members: Vec<NodeAddress>, memo: String, coins: Vec<Coin> },
}

impl Message {
    pub fn signer(&self) -> &NodeAddress {
        match self {
            Message::Stake { signer, .. }
            | Message::Unstake { signer, .. }
            | Message::Swap { signer, .. }
            | Message::Add { signer, .. }
            | Message::Gas { signer, .. }
            | Message::Outbound { signer, .. }
            | Message::Migrate { signer, .. }
            | Message::Reserve { signer, .. }
            | Message::YggdrasilFund { signer, .. }
            | Message::YggdrasilReturn { signer, .. }
            | Message::CreatePool { signer, .. }
            | Message::EndPool { signer, .. }
            | Message::Ragnarok { signer, .. }
            | Message::Errata { signer, .. }
            | Message::SetAdminConfig { signer, .. }
            | Message::Apply { signer, .. }
            | Message::Bond { signer, .. }
            | Message::Leave { signer, .. }
            | Message::TssPool { signer, .. }
            | Message::TssKeysignFail { signer, .. } => signer,
        }
    }
}
