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

use std::{
    fmt, hash::Hash, marker::PhantomData,
};

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A phantom-tagged 32-byte hash identifier, so `Id<Tx>` and `Id<Vault>`
/// cannot be mixed up at compile time even though both are `[u8; 32]` on
/// the wire.
#[derive(Encode, Decode, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T> {
    hash: [u8; 32],
    #[codec(skip)]
    #[serde(skip)]
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub const fn new(hash: [u8; 32]) -> Self {
        Id { hash, _marker: PhantomData }
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&digest);
        Id::new(hash)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        if bytes.len() != 32 {
            return None;
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        Some(Id::new(hash))
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    /// The all-zero sentinel id used where the source protocol uses a
    /// "blank tx id" marker (ragnarok-settlement matching, staking events).
    pub const fn blank() -> Self {
        Id::new([0u8; 32])
    }

    pub fn is_blank(&self) -> bool {
        self.hash == [0u8; 32]
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Id<T> {}
impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}
impl<T> Eq for Id<T> {}
impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.hash.cmp(&other.hash)
    }
}
impl<T> Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}
impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", hex::encode(self.hash))
    }
}
impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tx;

    #[test]
    fn blank_is_all_zero_and_recognized() {
        let id: Id<Tx> = Id::blank();
        assert!(id.is_blank());
        assert_eq!(id.as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn from_bytes_is_deterministic() {
        let a: Id<Tx> = Id::from_bytes(b"hello");
        let b: Id<Tx> = Id::from_bytes(b"hello");
        assert_eq!(a, b);
    }
}
