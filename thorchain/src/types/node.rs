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
use primitives::{Address, Amount, BlockHeight, NodeAddress, PubKey};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum NodeStatus {
    Unknown,
    WhiteListed,
    Standby,
    Ready,
    Active,
    Disabled,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct NodeAccount {
    pub node_addr: NodeAddress,
    pub status: NodeStatus,
    pub pub_key_set: Option<PubKey>,
    pub bond: Amount,
    pub bond_address: Address,
    pub status_since: BlockHeight,
    pub slash_points: u64,
    pub signer_active: bool,
    pub observer_active: bool,
    pub version: u32,
    /// Set by `Leave`; the node manager reads this at the next churn to
    /// drop the node from the incoming Active set rather than acting on it
    /// mid-block (`spec.md` §4.4: "Leave transitions Active→Standby at
    /// next churn").
    pub leave_requested: bool,
}

impl NodeAccount {
    pub fn new(node_addr: NodeAddress, bond_address: Address, bond: Amount, height: BlockHeight) -> Self {
        NodeAccount {
            node_addr,
            status: NodeStatus::WhiteListed,
            pub_key_set: None,
            bond,
            bond_address,
            status_since: height,
            slash_points: 0,
            signer_active: false,
            observer_active: false,
            version: 1,
            leave_requested: false,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, NodeStatus::Active)
    }

    /// Slash `amount` from bond, returning the amount actually removed.
    /// Bond is clamped at zero rather than going negative.
    pub fn slash_bond(&mut self, amount: Amount) -> Amount {
        let removed = self.bond.atoms().min(amount.atoms());
        self.bond = self.bond.saturating_sub(Amount::from_atoms(removed));
        Amount::from_atoms(removed)
    }

    pub fn add_slash_points(&mut self, points: u64) {
        self.slash_points = self.slash_points.saturating_add(points);
    }
}
