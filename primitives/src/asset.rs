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

use crate::amount::Amount;

/// The external chain (or the network's own chain) an [`Asset`] lives on.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct Chain(pub String);

impl Chain {
    /// The network's own chain: the tag carried by the native `RUNE` asset.
    pub const THOR: &'static str = "THOR";

    pub fn native() -> Chain {
        Chain(Self::THOR.to_owned())
    }

    pub fn is_native(&self) -> bool {
        self.0 == Self::THOR
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Chain {
    fn from(value: &str) -> Self {
        Chain(value.to_owned())
    }
}

/// `{chain, symbol, ticker}` — the distinguished `RUNE` asset is the native
/// unit of account; every other asset is an external-chain token observed
/// flowing into the network.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct Asset {
    pub chain: Chain,
    pub symbol: String,
    pub ticker: String,
}

impl Asset {
    pub fn new(chain: impl Into<Chain>, symbol: impl Into<String>, ticker: impl Into<String>) -> Self {
        Asset { chain: chain.into(), symbol: symbol.into(), ticker: ticker.into() }
    }

    pub fn rune() -> Asset {
        Asset::new(Chain::native(), "RUNE", "RUNE")
    }

    pub fn is_rune(&self) -> bool {
        self.chain.is_native() && self.symbol == "RUNE"
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ticker == self.symbol {
            write!(f, "{}.{}", self.chain, self.symbol)
        } else {
            write!(f, "{}.{}-{}", self.chain, self.symbol, self.ticker)
        }
    }
}

/// `{asset, amount}`.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Coin {
    pub asset: Asset,
    pub amount: Amount,
}

impl Coin {
    pub fn new(asset: Asset, amount: Amount) -> Self {
        Coin { asset, amount }
    }

    pub fn rune(amount: Amount) -> Self {
        Coin::new(Asset::rune(), amount)
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rune_display_omits_ticker() {
        assert_eq!(Asset::rune().to_string(), "THOR.RUNE");
    }

    #[test]
    fn external_asset_keeps_ticker() {
        let bnb = Asset::new("BNB", "BNB", "BNB");
        assert_eq!(bnb.to_string(), "BNB.BNB");
    }
}
