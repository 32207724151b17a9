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

//! Thin wrapper around `tracing` so the rest of the workspace depends on
//! one crate for all its logging, not on `tracing` directly.

use once_cell::sync::OnceCell;

/// Re-exported so call sites write `logging::log::warn!(...)`.
pub mod log {
    pub use tracing::{debug, error, info, trace, warn};
}

static INIT: OnceCell<()> = OnceCell::new();

/// Install a process-wide `tracing` subscriber reading `RUST_LOG`, falling
/// back to `info`. Safe to call more than once; only the first call wins.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
    });
}
