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
use sha2::{Digest, Sha256};

/// An opaque chain-tagged destination string (we never interpret external
/// chain address formats here — that is the observer daemons' job).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct Address(pub String);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Address(value.to_owned())
    }
}

/// An opaque public-key byte string, as carried by `NodeAccount::pub_key_set`
/// and `Vault::pub_key`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct PubKey(pub Vec<u8>);

impl PubKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        PubKey(bytes.into())
    }

    /// The deterministic "thor-address" of this key: the first 20 bytes of
    /// its SHA-256 digest, hex-encoded.
    pub fn thor_address(&self) -> NodeAddress {
        let digest = Sha256::digest(&self.0);
        NodeAddress(hex::encode(&digest[..20]))
    }
}

impl fmt::Display for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// The thor-address derived from a node's public key — the identity a
/// signer field and a node-account record are both keyed by.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct NodeAddress(pub String);

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeAddress {
    fn from(value: &str) -> Self {
        NodeAddress(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thor_address_is_deterministic() {
        let key = PubKey::new(vec![1, 2, 3]);
        assert_eq!(key.thor_address(), key.thor_address());
    }

    #[test]
    fn distinct_keys_give_distinct_addresses() {
        let a = PubKey::new(vec![1]);
        let b = PubKey::new(vec![2]);
        assert_ne!(a.thor_address(), b.thor_address());
    }
}
