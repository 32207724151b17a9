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
use primitives::{Address, BlockHeight, Chain, Coin, PubKey};
use serde::{Deserialize, Serialize};

use super::{event::EventId, tx::TxId};

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct TxOutItem {
    pub chain: Chain,
    pub to_address: Address,
    pub vault_pub_key: Option<PubKey>,
    pub coin: Coin,
    pub memo: String,
    pub in_hash: TxId,
    pub out_hash: Option<String>,
    /// Sequence number within `(vault_pub_key, chain)`, assigned at
    /// `AddTxOutItem` time so a signer daemon can recover dispatch order.
    pub sequence: u64,
    /// The block at which this item was queued, i.e. the key under which
    /// it also lives in `TxOut[queued_height]` — lets a settlement handler
    /// find its way back to that copy without a reverse index.
    pub queued_height: BlockHeight,
    /// The `Pending` `Outbound`/`Refund` event this item completes once an
    /// observer reports its `out_hash`, set by `add_tx_out_item`.
    pub event_id: Option<EventId>,
}

impl TxOutItem {
    pub fn is_pending(&self) -> bool {
        self.out_hash.is_none()
    }
}

/// One per block; committed to the store only if non-empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct TxOut {
    pub height: BlockHeight,
    pub tx_array: Vec<TxOutItem>,
}
