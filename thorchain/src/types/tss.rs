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
use primitives::{BlockHeight, Id, NodeAddress, PubKey};
use serde::{Deserialize, Serialize};

use super::vault::VaultType;

/// Marker type so `Id<Tss>` reads as a keygen-ceremony id at every call
/// site, the same way [`super::tx::TxId`] does for transactions.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Tss;

pub type CeremonyId = Id<Tss>;

/// One distinct outcome reported for a ceremony: either a successful keygen
/// (`pool_pub_key = Some`) or a failure with a blame list (`None`).
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct TssVote {
    pub pool_pub_key: Option<PubKey>,
    pub member_pub_keys: Vec<PubKey>,
    pub blame: Vec<NodeAddress>,
    pub signers: BTreeSet<NodeAddress>,
}

/// Voter record for a single keygen ceremony, structurally the same shape
/// as [`super::voter::ObservedTxVoter`]: competing reports accumulate
/// signers until one reaches super-majority.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct TssVoter {
    pub ceremony_id: CeremonyId,
    pub height: BlockHeight,
    pub active_node_count_at_creation: u32,
    pub vault_type: VaultType,
    pub votes: Vec<TssVote>,
    pub done: bool,
}

impl TssVoter {
    pub fn new(ceremony_id: CeremonyId, height: BlockHeight, active_node_count_at_creation: u32, vault_type: VaultType) -> Self {
        TssVoter {
            ceremony_id,
            height,
            active_node_count_at_creation,
            vault_type,
            votes: Vec::new(),
            done: false,
        }
    }

    pub fn threshold(&self) -> usize {
        let n = self.active_node_count_at_creation as usize;
        (2 * n).div_ceil(3)
    }

    pub fn winning_vote(&self) -> Option<&TssVote> {
        let threshold = self.threshold();
        self.votes
            .iter()
            .filter(|v| v.signers.len() >= threshold)
            .max_by_key(|v| (v.signers.len(), v.pool_pub_key.clone()))
    }
}
