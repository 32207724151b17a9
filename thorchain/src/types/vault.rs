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
use primitives::{BlockHeight, Coin, PubKey};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum VaultType {
    Asgard,
    Yggdrasil,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum VaultStatus {
    Active,
    Retiring,
    InactiveVault,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Vault {
    pub pub_key: PubKey,
    pub vault_type: VaultType,
    pub status: VaultStatus,
    pub coins: Vec<Coin>,
    pub membership: Vec<PubKey>,
    pub block_height: BlockHeight,
}

impl Vault {
    pub fn new(pub_key: PubKey, vault_type: VaultType, block_height: BlockHeight) -> Self {
        Vault {
            pub_key,
            vault_type,
            status: VaultStatus::Active,
            coins: Vec::new(),
            membership: Vec::new(),
            block_height,
        }
    }

    pub fn balance_of(&self, asset: &primitives::Asset) -> primitives::Amount {
        self.coins
            .iter()
            .find(|c| &c.asset == asset)
            .map(|c| c.amount)
            .unwrap_or(primitives::Amount::ZERO)
    }

    pub fn credit(&mut self, coin: Coin) -> Option<()> {
        match self.coins.iter_mut().find(|c| c.asset == coin.asset) {
            Some(existing) => {
                existing.amount = existing.amount.checked_add(coin.amount)?;
            }
            None => self.coins.push(coin),
        }
        Some(())
    }

    pub fn debit(&mut self, coin: &Coin) -> Option<()> {
        let existing = self.coins.iter_mut().find(|c| c.asset == coin.asset)?;
        existing.amount = existing.amount.checked_sub(coin.amount)?;
        Some(())
    }

    pub fn is_drained(&self) -> bool {
        self.coins.iter().all(|c| c.amount.is_zero())
    }
}
