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
use primitives::{Amount, Coin};
use serde::{Deserialize, Serialize};

/// `{total_reserve, bond_reward_rune, total_bond_units, gas}` — the
/// network-wide ledger the end-block reconciler (C8) updates every block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct VaultData {
    pub total_reserve: Amount,
    pub bond_reward_rune: Amount,
    pub total_bond_units: u64,
    pub gas: Vec<Coin>,
}

impl VaultData {
    pub fn credit_reserve(&mut self, amount: Amount) -> Option<()> {
        self.total_reserve = self.total_reserve.checked_add(amount)?;
        Some(())
    }

    pub fn debit_reserve(&mut self, amount: Amount) -> Option<()> {
        self.total_reserve = self.total_reserve.checked_sub(amount)?;
        Some(())
    }
}
