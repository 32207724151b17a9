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

/// One atomic unit is `10^-8` of the asset it denominates; `ONE` is one
/// whole unit expressed in atoms.
pub const ONE: u128 = 100_000_000;

/// A non-negative fixed-point amount, denominated in atoms (`10^-8`).
///
/// All arithmetic is checked: overflow or underflow returns `None` rather
/// than wrapping or panicking. Division always truncates toward zero and
/// multiplies numerators out before dividing, so replicas never diverge
/// because of float rounding.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_atoms(atoms: u128) -> Self {
        Amount(atoms)
    }

    pub const fn atoms(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    pub fn checked_mul(self, rhs: u128) -> Option<Amount> {
        self.0.checked_mul(rhs).map(Amount)
    }

    pub fn checked_div(self, rhs: u128) -> Option<Amount> {
        if rhs == 0 {
            return None;
        }
        Some(Amount(self.0 / rhs))
    }

    /// `self * num / den`, with the multiplication done in `u128` before
    /// the division so no precision is lost to an intermediate truncation.
    pub fn checked_mul_div(self, num: u128, den: u128) -> Option<Amount> {
        if den == 0 {
            return None;
        }
        self.0.checked_mul(num).map(|p| Amount(p / den))
    }

    pub fn saturating_sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / ONE;
        let frac = self.0 % ONE;
        write!(f, "{whole}.{frac:08}")
    }
}

impl Serialize for Amount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<u128>().map(Amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_mul_div_truncates_toward_zero() {
        let x = Amount::from_atoms(10);
        assert_eq!(x.checked_mul_div(3, 4), Some(Amount::from_atoms(7)));
    }

    #[test]
    fn checked_sub_underflow_is_none() {
        assert_eq!(Amount::from_atoms(1).checked_sub(Amount::from_atoms(2)), None);
    }

    #[test]
    fn display_formats_whole_and_fractional_parts() {
        assert_eq!(Amount::from_atoms(ONE + 5).to_string(), "1.00000005");
    }
}
