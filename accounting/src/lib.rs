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

//! Constant-product pool math and the liquidity-unit ledger: pure,
//! deterministic, and oblivious to storage — the `thorchain` crate owns
//! persistence and calls into this crate for every mutation.

pub mod error;
pub mod math;
pub mod pool;
pub mod staker;

pub use error::Error;
pub use pool::{Pool, PoolStatus, StakeResult, SwapResult, UnstakeResult};
pub use staker::StakerPosition;
