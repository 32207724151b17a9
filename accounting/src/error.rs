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

#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("pool balance addition overflowed")]
    PoolBalanceAdditionError,
    #[error("pool balance subtraction underflowed")]
    PoolBalanceSubtractionError,
    #[error("pool units addition overflowed")]
    PoolUnitsAdditionError,
    #[error("pool units subtraction underflowed")]
    PoolUnitsSubtractionError,
    #[error("swap against a zero-liquidity pool")]
    ZeroLiquidity,
    #[error("basis points must be in 1..=10000")]
    InvalidBasisPoints,
    #[error("staker has no units in this pool")]
    StakerNotFound,
    #[error("pool balance invariant violated: rune={0}, asset={1}, units={2} must be all-zero or all-nonzero")]
    BalanceInvariantViolated(u128, u128, u128),
}

pub type Result<T> = std::result::Result<T, Error>;
