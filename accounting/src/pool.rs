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
use primitives::{Amount, Asset};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    math,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum PoolStatus {
    Bootstrap,
    Enabled,
    Suspended,
}

impl PoolStatus {
    pub fn admits_swap(&self) -> bool {
        matches!(self, PoolStatus::Enabled)
    }

    pub fn admits_unstake(&self) -> bool {
        matches!(self, PoolStatus::Enabled)
    }

    pub fn admits_stake(&self) -> bool {
        !matches!(self, PoolStatus::Suspended)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Pool {
    pub asset: Asset,
    pub balance_rune: Amount,
    pub balance_asset: Amount,
    pub pool_units: Amount,
    pub status: PoolStatus,
}

/// The outcome of crediting a stake: units issued and the pool's new state
/// has already been applied to `self` by the time this is returned.
pub struct StakeResult {
    pub units_issued: Amount,
}

pub struct UnstakeResult {
    pub units_redeemed: Amount,
    pub rune_out: Amount,
    pub asset_out: Amount,
}

pub struct SwapResult {
    pub output: Amount,
    pub liquidity_fee: Amount,
    pub slip_bps: u32,
}

impl Pool {
    pub fn bootstrap(asset: Asset) -> Self {
        Pool {
            asset,
            balance_rune: Amount::ZERO,
            balance_asset: Amount::ZERO,
            pool_units: Amount::ZERO,
            status: PoolStatus::Bootstrap,
        }
    }

    /// `balance_rune == 0 <=> balance_asset == 0 <=> pool_units == 0`.
    pub fn check_invariant(&self) -> Result<()> {
        let r = self.balance_rune.atoms();
        let a = self.balance_asset.atoms();
        let u = self.pool_units.atoms();
        let all_zero = r == 0 && a == 0 && u == 0;
        let all_nonzero = r != 0 && a != 0 && u != 0;
        if all_zero || all_nonzero {
            Ok(())
        } else {
            Err(Error::BalanceInvariantViolated(r, a, u))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pool_units.is_zero()
    }

    /// Credit a stake of `r` rune / `a` asset, issuing liquidity units.
    pub fn stake(&mut self, r: Amount, a: Amount) -> Result<StakeResult> {
        let units = math::stake_units(
            self.pool_units.atoms(),
            self.balance_rune.atoms(),
            self.balance_asset.atoms(),
            r.atoms(),
            a.atoms(),
        )
        .ok_or(Error::PoolUnitsAdditionError)?;
        let units = Amount::from_atoms(units);

        self.balance_rune =
            self.balance_rune.checked_add(r).ok_or(Error::PoolBalanceAdditionError)?;
        self.balance_asset =
            self.balance_asset.checked_add(a).ok_or(Error::PoolBalanceAdditionError)?;
        self.pool_units =
            self.pool_units.checked_add(units).ok_or(Error::PoolUnitsAdditionError)?;

        Ok(StakeResult { units_issued: units })
    }

    /// Directly credit reserves without issuing units (memo tag `ADD`),
    /// diluting every existing staker's claim.
    pub fn add(&mut self, r: Amount, a: Amount) -> Result<()> {
        self.balance_rune =
            self.balance_rune.checked_add(r).ok_or(Error::PoolBalanceAdditionError)?;
        self.balance_asset =
            self.balance_asset.checked_add(a).ok_or(Error::PoolBalanceAdditionError)?;
        Ok(())
    }

    /// Redeem `basis_points` (1..=10000) of `staker_units` from the pool.
    pub fn unstake(&mut self, staker_units: Amount, basis_points: u16) -> Result<UnstakeResult> {
        let redeemed = math::redeem_units(staker_units.atoms(), basis_points)
            .ok_or(Error::InvalidBasisPoints)?;
        let redeemed = Amount::from_atoms(redeemed);

        let (r_out, a_out) = math::unstake_payout(
            redeemed.atoms(),
            self.pool_units.atoms(),
            self.balance_rune.atoms(),
            self.balance_asset.atoms(),
        )
        .ok_or(Error::PoolUnitsSubtractionError)?;

        self.balance_rune = self
            .balance_rune
            .checked_sub(Amount::from_atoms(r_out))
            .ok_or(Error::PoolBalanceSubtractionError)?;
        self.balance_asset = self
            .balance_asset
            .checked_sub(Amount::from_atoms(a_out))
            .ok_or(Error::PoolBalanceSubtractionError)?;
        self.pool_units =
            self.pool_units.checked_sub(redeemed).ok_or(Error::PoolUnitsSubtractionError)?;

        Ok(UnstakeResult {
            units_redeemed: redeemed,
            rune_out: Amount::from_atoms(r_out),
            asset_out: Amount::from_atoms(a_out),
        })
    }

    /// A single-leg swap. `rune_in == true` swaps rune for asset; `false`
    /// swaps asset for rune. The pool's reserves are updated in place: the
    /// full input is added to the input side, only the net output leaves
    /// the output side (the liquidity fee remains as pool reserve dust).
    pub fn swap(&mut self, amount_in: Amount, rune_in: bool) -> Result<SwapResult> {
        let (pool_in, pool_out) = if rune_in {
            (self.balance_rune, self.balance_asset)
        } else {
            (self.balance_asset, self.balance_rune)
        };
        if pool_in.is_zero() || pool_out.is_zero() {
            return Err(Error::ZeroLiquidity);
        }

        let swapped = math::swap_output(amount_in.atoms(), pool_in.atoms(), pool_out.atoms())
            .ok_or(Error::ZeroLiquidity)?;
        let slip_bps = math::slip_bps(amount_in.atoms(), pool_in.atoms()).unwrap_or(10_000);

        let new_pool_in =
            pool_in.checked_add(amount_in).ok_or(Error::PoolBalanceAdditionError)?;
        let new_pool_out = pool_out
            .checked_sub(Amount::from_atoms(swapped.output))
            .ok_or(Error::PoolBalanceSubtractionError)?;

        if rune_in {
            self.balance_rune = new_pool_in;
            self.balance_asset = new_pool_out;
        } else {
            self.balance_asset = new_pool_in;
            self.balance_rune = new_pool_out;
        }

        Ok(SwapResult {
            output: Amount::from_atoms(swapped.output),
            liquidity_fee: Amount::from_atoms(swapped.liquidity_fee),
            slip_bps,
        })
    }

    /// The pool-implied spot price of one atom of asset, in rune atoms.
    pub fn spot_price_rune_per_asset(&self) -> Option<Amount> {
        if self.balance_asset.is_zero() {
            return None;
        }
        self.balance_rune.checked_mul_div(1, self.balance_asset.atoms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rune_asset_pool() -> Pool {
        let mut p = Pool::bootstrap(Asset::new("BNB", "BNB", "BNB"));
        p.status = PoolStatus::Enabled;
        p
    }

    #[test]
    fn first_stake_bootstraps_pool_s1() {
        let mut p = rune_asset_pool();
        let r = p.stake(Amount::from_atoms(100 * 100_000_000), Amount::from_atoms(10 * 100_000_000)).unwrap();
        assert_eq!(r.units_issued, Amount::from_atoms(100 * 100_000_000));
        assert_eq!(p.balance_rune, Amount::from_atoms(100 * 100_000_000));
        assert_eq!(p.balance_asset, Amount::from_atoms(10 * 100_000_000));
        assert_eq!(p.pool_units, Amount::from_atoms(100 * 100_000_000));
        p.check_invariant().unwrap();
    }

    #[test]
    fn stake_then_full_unstake_round_trips() {
        let mut p = rune_asset_pool();
        let r = p.stake(Amount::from_atoms(100), Amount::from_atoms(10)).unwrap();
        let u = p.unstake(r.units_issued, 10_000).unwrap();
        assert_eq!(u.rune_out, Amount::from_atoms(100));
        assert_eq!(u.asset_out, Amount::from_atoms(10));
        assert!(p.is_empty());
        p.check_invariant().unwrap();
    }

    #[test]
    fn swap_updates_reserves_and_leaves_fee_in_pool() {
        let mut p = rune_asset_pool();
        p.balance_rune = Amount::from_atoms(100 * 100_000_000);
        p.balance_asset = Amount::from_atoms(100 * 100_000_000);
        p.pool_units = Amount::from_atoms(100 * 100_000_000);
        let r = p.swap(Amount::from_atoms(10 * 100_000_000), true).unwrap();
        assert_eq!(r.output, Amount::from_atoms(826_446_280));
        assert_eq!(p.balance_rune, Amount::from_atoms(110 * 100_000_000));
        assert_eq!(p.balance_asset, Amount::from_atoms(100 * 100_000_000 - 826_446_280));
    }
}
