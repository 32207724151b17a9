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

pub mod event;
pub mod node;
pub mod tss;
pub mod tx;
pub mod txout;
pub mod vault;
pub mod vault_data;
pub mod voter;

pub use event::{Event, EventId, EventStatus, EventType};
pub use node::{NodeAccount, NodeStatus};
pub use tss::{CeremonyId, Tss, TssVote, TssVoter};
pub use tx::{ObservedTx, Tx, TxData, TxId};
pub use txout::{TxOut, TxOutItem};
pub use vault::{Vault, VaultStatus, VaultType};
pub use vault_data::VaultData;
pub use voter::ObservedTxVoter;
