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

use parity_scale_codec::{Decode, Encode};
use primitives::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One staker's row in a pool's `PoolStaker[asset]` list.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct StakerPosition {
    pub staker_id: Address,
    pub units: Amount,
    pub pending_rune: Amount,
    pub pending_asset: Amount,
}

impl StakerPosition {
    pub fn new(staker_id: Address) -> Self {
        StakerPosition {
            staker_id,
            units: Amount::ZERO,
            pending_rune: Amount::ZERO,
            pending_asset: Amount::ZERO,
        }
    }
}

/// Find-or-insert the staker's row, crediting `units` to it.
pub fn credit_units(
    ledger: &mut Vec<StakerPosition>,
    staker_id: &Address,
    units: Amount,
) -> Result<()> {
    match ledger.iter_mut().find(|s| &s.staker_id == staker_id) {
        Some(row) => {
            row.units = row.units.checked_add(units).ok_or(Error::PoolUnitsAdditionError)?;
        }
        None => {
            let mut row = StakerPosition::new(staker_id.clone());
            row.units = units;
            ledger.push(row);
        }
    }
    Ok(())
}

/// Debit `units` from the staker's row, removing the row entirely once it
/// reaches zero.
pub fn debit_units(
    ledger: &mut Vec<StakerPosition>,
    staker_id: &Address,
    units: Amount,
) -> Result<()> {
    let idx = ledger
        .iter()
        .position(|s| &s.staker_id == staker_id)
        .ok_or(Error::StakerNotFound)?;
    let row = &mut ledger[idx];
    row.units = row.units.checked_sub(units).ok_or(Error::PoolUnitsSubtractionError)?;
    if row.units.is_zero() {
        ledger.remove(idx);
    }
    Ok(())
}

pub fn units_of(ledger: &[StakerPosition], staker_id: &Address) -> Amount {
    ledger
        .iter()
        .find(|s| &s.staker_id == staker_id)
        .map(|s| s.units)
        .unwrap_or(Amount::ZERO)
}

/// Sum of every row's units — must equal `Pool::pool_units` after every
/// block.
pub fn total_units(ledger: &[StakerPosition]) -> Option<Amount> {
    ledger.iter().try_fold(Amount::ZERO, |acc, row| acc.checked_add(row.units))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_then_debit_all_removes_row() {
        let mut ledger = Vec::new();
        let addr = Address::from("staker1");
        credit_units(&mut ledger, &addr, Amount::from_atoms(100)).unwrap();
        assert_eq!(units_of(&ledger, &addr), Amount::from_atoms(100));
        debit_units(&mut ledger, &addr, Amount::from_atoms(100)).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn total_units_sums_all_rows() {
        let mut ledger = Vec::new();
        credit_units(&mut ledger, &Address::from("a"), Amount::from_atoms(10)).unwrap();
        credit_units(&mut ledger, &Address::from("b"), Amount::from_atoms(20)).unwrap();
        assert_eq!(total_units(&ledger), Some(Amount::from_atoms(30)));
    }
}
