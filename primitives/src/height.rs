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

use std::fmt;

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize,
)]
pub struct BlockHeight(u64);

impl BlockHeight {
    pub const ZERO: BlockHeight = BlockHeight(0);

    pub const fn new(height: u64) -> Self {
        BlockHeight(height)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> BlockHeight {
        BlockHeight(self.0 + 1)
    }

    pub fn checked_sub(&self, rhs: u64) -> Option<BlockHeight> {
        self.0.checked_sub(rhs).map(BlockHeight)
    }

    /// True when `self` is strictly more than `distance` blocks behind `now`.
    pub fn older_than(&self, now: BlockHeight, distance: u64) -> bool {
        now.0.saturating_sub(self.0) > distance
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BlockHeight {
    fn from(value: u64) -> Self {
        BlockHeight(value)
    }
}
