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

use std::collections::BTreeSet;

use parity_scale_codec::{Decode, Encode};
use primitives::{Address, BlockHeight, Chain, Coin, Id, NodeAddress, PubKey};
use serde::{Deserialize, Serialize};

/// Marker type so `Id<Tx>` reads as a transaction id at every call site.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Tx;

pub type TxId = Id<Tx>;

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct TxData {
    pub id: TxId,
    pub chain: Chain,
    pub from: Address,
    pub to: Address,
    pub coins: Vec<Coin>,
    pub gas: Vec<Coin>,
    pub memo: String,
}

/// A `Tx` plus the observation metadata attached once a node witnesses it
/// on the external chain.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ObservedTx {
    pub tx: TxData,
    pub block_height: BlockHeight,
    pub observed_pub_key: PubKey,
    pub signers: BTreeSet<NodeAddress>,
}

impl ObservedTx {
    /// A hash of the observed payload's content (excluding `signers`,
    /// which accumulates over time) — used to break ties between
    /// competing witnesses of the same `tx.id`.
    pub fn payload_hash(&self) -> [u8; 32] {
        let encoded = (&self.tx, self.block_height, &self.observed_pub_key).encode();
        primitives::Id::<Tx>::from_bytes(&encoded).as_bytes().to_owned()
    }
}
