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

use super::tx::TxId;

pub type EventId = u64;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum EventStatus {
    Pending,
    Success,
    Refund,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum EventType {
    Stake,
    Unstake,
    Swap,
    Add,
    Outbound,
    Refund,
    Gas,
    Slash,
    Bond,
    PoolLifecycle,
    Errata,
    TssKeygen,
    TssKeysignFail,
    Ragnarok,
}

/// `{id, type, height, in_tx, out_txs, event, status}`. `event` is stored
/// as canonically-encoded JSON bytes — the one place the wire format is
/// human-readable, for indexer consumption, while the rest of the struct
/// stays in the same binary codec as everything else.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub height: BlockHeight,
    /// Staking events use the blank-tx-id sentinel for the in-hash;
    /// preserved here for indexer compatibility, not "fixed" to a real id.
    pub in_tx: TxId,
    pub out_txs: Vec<String>,
    pub event_json: Vec<u8>,
    pub status: EventStatus,
}

impl Event {
    pub fn new(id: EventId, event_type: EventType, height: BlockHeight, in_tx: TxId) -> Self {
        Event {
            id,
            event_type,
            height,
            in_tx,
            out_txs: Vec::new(),
            event_json: b"null".to_vec(),
            status: EventStatus::Pending,
        }
    }

    pub fn set_payload(&mut self, value: &impl Serialize) {
        self.event_json = serde_json::to_vec(value).unwrap_or_else(|_| b"null".to_vec());
    }

    pub fn payload(&self) -> serde_json::Value {
        serde_json::from_slice(&self.event_json).unwrap_or(serde_json::Value::Null)
    }
}
