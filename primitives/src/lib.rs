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

pub mod address;
pub mod amount;
pub mod asset;
pub mod error;
pub mod height;
pub mod id;

pub use address::{Address, NodeAddress, PubKey};
pub use amount::Amount;
pub use asset::{Asset, Chain, Coin};
pub use error::ArithmeticError;
pub use height::BlockHeight;
pub use id::Id;
