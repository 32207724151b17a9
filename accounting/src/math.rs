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

//! Pure, deterministic constant-product pool math. Every function here
//! operates on raw atom counts (`u128`), multiplies numerators out before
//! dividing, and returns `None` on overflow rather than panicking or
//! wrapping — the same result must come back bit-for-bit on every replica.

/// Liquidity units issued for a stake of `r` rune / `a` asset against a
/// pool whose prior state is `(prior_units, prior_rune, prior_asset)`.
///
/// `u = P * (r*A + R*a) / (2*R*A + r*A + R*a)` once the pool has been
/// bootstrapped (`P > 0`); a still-empty pool issues `u = r` so the first
/// staker sets the initial price.
pub fn stake_units(
    prior_units: u128,
    prior_rune: u128,
    prior_asset: u128,
    r: u128,
    a: u128,
) -> Option<u128> {
    if prior_units == 0 {
        return Some(r);
    }
    let r_a = r.checked_mul(prior_asset)?;
    let big_r_a = prior_rune.checked_mul(a)?;
    let numerator_sum = r_a.checked_add(big_r_a)?;
    let numerator = prior_units.checked_mul(numerator_sum)?;

    let two_r_a = prior_rune.checked_mul(prior_asset)?.checked_mul(2)?;
    let denominator = two_r_a.checked_add(r_a)?.checked_add(big_r_a)?;
    if denominator == 0 {
        return None;
    }
    Some(numerator / denominator)
}

/// The units redeemed for `basis_points` (1..=10000) of a staker's total
/// `units`.
pub fn redeem_units(units: u128, basis_points: u16) -> Option<u128> {
    if !(1..=10000).contains(&basis_points) {
        return None;
    }
    units.checked_mul(basis_points as u128).map(|p| p / 10_000)
}

/// The rune/asset payout for redeeming `units_to_redeem` of a pool whose
/// prior state is `(prior_units, prior_rune, prior_asset)`.
///
/// `r_out = u/P * R`, `a_out = u/P * A`, computed as `u*R/P` and `u*A/P` so
/// the division happens last.
pub fn unstake_payout(
    units_to_redeem: u128,
    prior_units: u128,
    prior_rune: u128,
    prior_asset: u128,
) -> Option<(u128, u128)> {
    if prior_units == 0 {
        return None;
    }
    let r_out = units_to_redeem.checked_mul(prior_rune)? / prior_units;
    let a_out = units_to_redeem.checked_mul(prior_asset)? / prior_units;
    Some((r_out, a_out))
}

/// Output of the `x -> y` constant-product swap. `x` is the untaxed
/// input amount; `pool_in`/`pool_out` are the pool's reserves of the input
/// and output assets before the swap.
///
/// `y = x*X*Y / (x+X)^2`; the liquidity fee `f = x^2*Y / (x+X)^2` is never
/// paid out — it simply isn't subtracted from `pool_out`, so it stays in
/// the pool and dilutes every remaining staker's claim evenly.
pub struct SwapOutput {
    pub output: u128,
    pub liquidity_fee: u128,
}

pub fn swap_output(x: u128, pool_in: u128, pool_out: u128) -> Option<SwapOutput> {
    if pool_in == 0 || pool_out == 0 {
        return None;
    }
    let denom = x.checked_add(pool_in)?.checked_pow(2)?;
    if denom == 0 {
        return None;
    }
    let x_pool_in = x.checked_mul(pool_in)?;
    let output = x_pool_in.checked_mul(pool_out)?.checked_div(denom)?;
    let liquidity_fee = x.checked_mul(x)?.checked_mul(pool_out)?.checked_div(denom)?;
    Some(SwapOutput { output, liquidity_fee })
}

/// Fractional price impact of swapping `x` into a pool whose input-side
/// reserve is `pool_in`, expressed in basis points (`x / (x+X)`, truncated)
/// so replicas never have to compare floating-point slip values.
pub fn slip_bps(x: u128, pool_in: u128) -> Option<u32> {
    let denom = x.checked_add(pool_in)?;
    if denom == 0 {
        return Some(0);
    }
    let bps = x.checked_mul(10_000)?.checked_div(denom)?;
    u32::try_from(bps).ok()
}
