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

//! Backend-agnostic, synchronous key/value storage. `storage::in_memory`
//! is the only backend shipped here; a persistent backend (LMDB/sqlite,
//! as the teacher workspace offers) is a drop-in implementor of
//! [`StorageRead`]/[`StorageWrite`] and is out of this crate's scope.

pub mod backend;
pub mod error;
pub mod in_memory;

pub use backend::{StorageRead, StorageWrite};
pub use error::{Error, Result};
pub use in_memory::{BlockTransaction, InMemoryBackend};
