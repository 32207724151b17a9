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

use primitives::Asset;

#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("signer is not authorized for this message")]
    Unauthorized,
    #[error("message failed shape validation: {0}")]
    InvalidMessage(String),
    #[error("unsupported message version")]
    BadVersion,
    #[error("memo could not be parsed: {0}")]
    InvalidMemo(String),
    #[error("pool not found: {0}")]
    PoolNotFound(Asset),
    #[error("pool is suspended: {0}")]
    PoolSuspended(Asset),
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("swap slip exceeds the configured limit")]
    SlipTooHigh,
    #[error("store corruption: {0}")]
    StoreCorruption(String),
    #[error("observation has not reached consensus")]
    ConsensusNotReached,
    #[error("vault not found")]
    VaultNotFound,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<storage::Error> for Error {
    fn from(err: storage::Error) -> Self {
        match err {
            storage::Error::NotFound => Error::StoreCorruption("key not found".to_owned()),
            storage::Error::Corruption(msg) => Error::StoreCorruption(msg),
        }
    }
}

impl From<accounting::Error> for Error {
    fn from(err: accounting::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
