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

use parity_scale_codec::{Decode, Encode};
use primitives::BlockHeight;
use serde::{Deserialize, Serialize};

use super::{tx::{ObservedTx, TxId}, txout::TxOutItem};

/// The voter record for a single `tx_id`: every competing payload any
/// Active node has witnessed, plus the dispatched `TxOutItem`s and
/// produced out-chain txs once consensus has fired.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ObservedTxVoter {
    pub tx_id: TxId,
    pub height: BlockHeight,
    pub active_node_count_at_creation: u32,
    pub txs: Vec<ObservedTx>,
    pub actions: Vec<TxOutItem>,
    pub out_hashes: Vec<String>,
    pub done: bool,
    pub abandoned: bool,
    /// The height at which a payload first reached super-majority, set
    /// once by `observation::record_observation` alongside `done`. Lets
    /// the end-block observer-slashing pass (C8 step 1) find exactly the
    /// voters that settled in the block currently being reconciled,
    /// without rescanning every voter ever created.
    pub decided_height: Option<BlockHeight>,
}

impl ObservedTxVoter {
    pub fn new(tx_id: TxId, height: BlockHeight, active_node_count_at_creation: u32) -> Self {
        ObservedTxVoter {
            tx_id,
            height,
            active_node_count_at_creation,
            txs: Vec::new(),
            actions: Vec::new(),
            out_hashes: Vec::new(),
            done: false,
            abandoned: false,
            decided_height: None,
        }
    }

    /// `⌈2N/3⌉` where `N` is the active-node count observed at creation.
    pub fn threshold(&self) -> usize {
        let n = self.active_node_count_at_creation as usize;
        (2 * n).div_ceil(3)
    }

    /// The payload (if any) whose Active-signer set has reached
    /// consensus. Ties between equally-witnessed payloads break by
    /// lexicographic payload hash.
    pub fn winning_payload(&self) -> Option<&ObservedTx> {
        let threshold = self.threshold();
        self.txs
            .iter()
            .filter(|tx| tx.signers.len() >= threshold)
            .max_by_key(|tx| (tx.signers.len(), tx.payload_hash()))
    }
}
