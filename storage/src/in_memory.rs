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

use std::collections::BTreeMap;

use logging::log;

use crate::{
    backend::{StorageRead, StorageWrite},
    error::Result,
};

/// An in-memory backend over a `BTreeMap`, which gives lexicographic key
/// ordering by construction — `iter_prefix` needs no explicit sort.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBackend {
    map: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageRead for InMemoryBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.map.get(key).cloned())
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .map
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

impl StorageWrite for InMemoryBackend {
    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.map.insert(key.to_vec(), value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.map.remove(key);
        Ok(())
    }
}

enum Op {
    Set(Vec<u8>),
    Delete,
}

/// A per-block write overlay: reads fall through to the committed backend,
/// writes accumulate here and are applied in one shot on `commit`. Dropping
/// the transaction without committing discards every write (the runtime
/// replay case noted in the concurrency model).
pub struct BlockTransaction<'a> {
    backend: &'a mut InMemoryBackend,
    overlay: BTreeMap<Vec<u8>, Op>,
}

impl<'a> BlockTransaction<'a> {
    pub fn new(backend: &'a mut InMemoryBackend) -> Self {
        BlockTransaction { backend, overlay: BTreeMap::new() }
    }

    pub fn commit(self) {
        let n = self.overlay.len();
        for (key, op) in self.overlay {
            match op {
                Op::Set(value) => {
                    self.backend.map.insert(key, value);
                }
                Op::Delete => {
                    self.backend.map.remove(&key);
                }
            }
        }
        log::debug!("committed block transaction with {n} writes");
    }

    pub fn discard(self) {
        log::warn!("discarding block transaction with {} pending writes", self.overlay.len());
    }
}

impl<'a> StorageRead for BlockTransaction<'a> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.overlay.get(key) {
            Some(Op::Set(value)) => Ok(Some(value.clone())),
            Some(Op::Delete) => Ok(None),
            None => self.backend.get(key),
        }
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.backend.iter_prefix(prefix)?.into_iter().collect();
        for (key, op) in self.overlay.range(prefix.to_vec()..) {
            if !key.starts_with(prefix) {
                break;
            }
            match op {
                Op::Set(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                Op::Delete => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}

impl<'a> StorageWrite for BlockTransaction<'a> {
    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.overlay.insert(key.to_vec(), Op::Set(value));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.overlay.insert(key.to_vec(), Op::Delete);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_hides_uncommitted_writes_from_backend() {
        let mut backend = InMemoryBackend::new();
        backend.set(b"a", vec![1]).unwrap();
        {
            let mut tx = BlockTransaction::new(&mut backend);
            tx.set(b"b", vec![2]).unwrap();
            assert_eq!(tx.get(b"b").unwrap(), Some(vec![2]));
            tx.discard();
        }
        assert_eq!(backend.get(b"b").unwrap(), None);
    }

    #[test]
    fn commit_applies_overlay_atomically() {
        let mut backend = InMemoryBackend::new();
        {
            let mut tx = BlockTransaction::new(&mut backend);
            tx.set(b"a", vec![1]).unwrap();
            tx.set(b"b", vec![2]).unwrap();
            tx.commit();
        }
        assert_eq!(backend.get(b"a").unwrap(), Some(vec![1]));
        assert_eq!(backend.get(b"b").unwrap(), Some(vec![2]));
    }

    #[test]
    fn iter_prefix_is_lexicographic_and_merges_overlay() {
        let mut backend = InMemoryBackend::new();
        backend.set(b"pool/a", vec![1]).unwrap();
        backend.set(b"pool/c", vec![3]).unwrap();
        backend.set(b"staker/x", vec![9]).unwrap();
        let mut tx = BlockTransaction::new(&mut backend);
        tx.set(b"pool/b", vec![2]).unwrap();
        tx.delete(b"pool/a").unwrap();
        let items = tx.iter_prefix(b"pool/").unwrap();
        assert_eq!(
            items,
            vec![(b"pool/b".to_vec(), vec![2]), (b"pool/c".to_vec(), vec![3])]
        );
    }
}
