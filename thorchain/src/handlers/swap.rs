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

use accounting::Pool;
use primitives::{Address, Amount, Asset, BlockHeight, Coin, NodeAddress};
use serde::Serialize;

use super::{check_gate, check_pool_status, record_event, refund_coin, PoolOp, SignerGate};
use crate::{
    error::{Error, Result},
    store::Store,
    types::{EventStatus, EventType, TxId},
};

#[derive(Serialize)]
struct SwapPayload {
    from: Address,
    input: Coin,
    output: Coin,
    dest_address: Address,
    slip_bps: u32,
    liquidity_fee: Amount,
}

/// Asset-to-asset swaps are two legs of the same primitive: asset -> RUNE
/// against the input's own pool, then RUNE -> asset against the target's
/// pool. Either leg alone covers RUNE <-> asset. `target_price`, when
/// given, is a minimum acceptable output; falling short is slip, not a
/// pool or memo problem, and refunds the original input.
///
/// Every leg is computed against an in-memory clone of its pool first;
/// nothing is written back to the store until the slip/target-price gates
/// both pass, so a refunded swap leaves every pool byte-identical to its
/// pre-swap state (`spec.md` §8 invariant 2, scenario S3).
pub fn handle(
    store: &mut Store,
    height: BlockHeight,
    signer: NodeAddress,
    tx_id: TxId,
    from: Address,
    input: Coin,
    target_asset: Asset,
    dest_address: Address,
    target_price: Option<Amount>,
) -> Result<()> {
    check_gate(store, &signer, SignerGate::ActiveObserver)?;

    if input.asset == target_asset {
        return Err(Error::InvalidMessage("swap input and target assets are identical".to_owned()));
    }

    let swap_result = (|| -> Result<(Vec<Pool>, Amount, u32, Amount, Amount)> {
        if input.asset.is_rune() {
            let (pool, output, slip, fee) = swap_leg(store, &target_asset, input.amount, true)?;
            let fee_rune = fee_to_rune(&pool, fee, false);
            Ok((vec![pool], output, slip, fee, fee_rune))
        } else if target_asset.is_rune() {
            let (pool, output, slip, fee) = swap_leg(store, &input.asset, input.amount, false)?;
            Ok((vec![pool], output, slip, fee, fee))
        } else {
            let (pool_in, rune_amount, slip_in, fee_in) = swap_leg(store, &input.asset, input.amount, false)?;
            let (pool_out, out_amount, slip_out, fee_out) = swap_leg(store, &target_asset, rune_amount, true)?;
            let fee_out_rune = fee_to_rune(&pool_out, fee_out, false);
            let fee_rune = fee_in.checked_add(fee_out_rune).unwrap_or(fee_in);
            Ok((vec![pool_in, pool_out], out_amount, slip_in.max(slip_out), fee_in.checked_add(fee_out).unwrap_or(fee_in), fee_rune))
        }
    })();

    let (touched_pools, output_amount, slip_bps, liquidity_fee, fee_rune) = match swap_result {
        Ok(r) => r,
        Err(err) => {
            refund_coin(store, height, tx_id, &from, input)?;
            return Err(err);
        }
    };

    let gsl_bps = store.admin_config().gsl_bps();
    if slip_bps > gsl_bps {
        refund_coin(store, height, tx_id, &from, input)?;
        return Err(Error::SlipTooHigh);
    }

    if let Some(min_out) = target_price {
        if output_amount.atoms() < min_out.atoms() {
            refund_coin(store, height, tx_id, &from, input)?;
            return Err(Error::SlipTooHigh);
        }
    }

    for pool in &touched_pools {
        store.set_pool(pool)?;
    }
    if !fee_rune.is_zero() {
        store.add_block_fees(height, fee_rune)?;
    }

    let output = Coin::new(target_asset, output_amount);
    refund_coin(store, height, tx_id, &dest_address, output.clone())?;

    record_event(
        store,
        height,
        EventType::Swap,
        tx_id,
        EventStatus::Success,
        &SwapPayload { from, input, output, dest_address, slip_bps, liquidity_fee },
    )?;
    Ok(())
}

/// Compute a single leg against a clone of `pool_asset`'s pool. Returns the
/// post-swap pool alongside the outcome, deferring the store write to the
/// caller until every gate has passed.
fn swap_leg(store: &Store, pool_asset: &Asset, amount_in: Amount, rune_in: bool) -> Result<(Pool, Amount, u32, Amount)> {
    let mut pool = store.get_pool(pool_asset)?.ok_or_else(|| Error::PoolNotFound(pool_asset.clone()))?;
    check_pool_status(&pool, PoolOp::Swap)?;
    let result = pool.swap(amount_in, rune_in)?;
    Ok((pool, result.output, result.slip_bps, result.liquidity_fee))
}

/// `fee` is denominated in `pool`'s asset unless `fee_already_rune`; price
/// it off the (post-swap) pool spot so block-fee accounting never mixes
/// RUNE and asset units the way a double-leg swap's own event payload does.
fn fee_to_rune(pool: &Pool, fee: Amount, fee_already_rune: bool) -> Amount {
    if fee_already_rune || pool.balance_asset.is_zero() {
        return fee;
    }
    fee.checked_mul_div(pool.balance_rune.atoms(), pool.balance_asset.atoms()).unwrap_or(Amount::ZERO)
}

#[cfg(test)]
mod tests {
    use primitives::{Id, PubKey};

    use super::*;
    use crate::{
        store::MemoryChain,
        types::{NodeAccount, NodeStatus, Vault, VaultType},
    };

    fn active_observer(store: &mut Store, addr: &str) -> NodeAddress {
        let node_addr = NodeAddress::from(addr);
        let mut node = NodeAccount::new(node_addr.clone(), Address::from(addr), Amount::ZERO, BlockHeight::ZERO);
        node.status = NodeStatus::Active;
        node.observer_active = true;
        store.set_node(&node).unwrap();
        node_addr
    }

    fn asgard_vault(store: &mut Store) {
        let vault = Vault::new(PubKey::new(b"asgard".to_vec()), VaultType::Asgard, BlockHeight::ZERO);
        store.set_vault(&vault).unwrap();
    }

    fn enabled_pool(store: &mut Store, asset: &Asset, rune: u128, asset_bal: u128) {
        let mut pool = Pool::bootstrap(asset.clone());
        pool.status = accounting::PoolStatus::Enabled;
        pool.balance_rune = Amount::from_atoms(rune);
        pool.balance_asset = Amount::from_atoms(asset_bal);
        pool.pool_units = Amount::from_atoms(rune);
        store.set_pool(&pool).unwrap();
    }

    #[test]
    fn rune_to_asset_swap_credits_destination() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        let signer = active_observer(&mut store, "node1");
        asgard_vault(&mut store);
        let asset = Asset::new("BNB", "BNB", "BNB");
        enabled_pool(&mut store, &asset, 100 * primitives::amount::ONE, 100 * primitives::amount::ONE);

        handle(
            &mut store,
            BlockHeight::new(1),
            signer,
            Id::blank(),
            Address::from("swapper"),
            Coin::rune(Amount::from_atoms(10 * primitives::amount::ONE)),
            asset.clone(),
            Address::from("dest"),
            None,
        )
        .unwrap();

        let txout = store.get_txout(BlockHeight::new(1)).unwrap().unwrap();
        assert_eq!(txout.tx_array.len(), 1);
        assert_eq!(txout.tx_array[0].coin.asset, asset);
    }

    #[test]
    fn slip_too_high_refunds_the_original_input() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        let signer = active_observer(&mut store, "node1");
        asgard_vault(&mut store);
        let asset = Asset::new("BNB", "BNB", "BNB");
        enabled_pool(&mut store, &asset, 100 * primitives::amount::ONE, 100 * primitives::amount::ONE);

        let err = handle(
            &mut store,
            BlockHeight::new(1),
            signer,
            Id::blank(),
            Address::from("swapper"),
            Coin::rune(Amount::from_atoms(10 * primitives::amount::ONE)),
            asset,
            Address::from("dest"),
            Some(Amount::from_atoms(999 * primitives::amount::ONE)),
        )
        .unwrap_err();

        assert_eq!(err, Error::SlipTooHigh);
        let txout = store.get_txout(BlockHeight::new(1)).unwrap().unwrap();
        assert_eq!(txout.tx_array[0].coin.asset, Asset::rune());
    }

    #[test]
    fn swap_exceeding_gsl_is_refunded_s3() {
        let mut chain = MemoryChain::new();
        let mut store = chain.store();
        let signer = active_observer(&mut store, "node1");
        asgard_vault(&mut store);
        let asset = Asset::new("BNB", "BNB", "BNB");
        enabled_pool(&mut store, &asset, 100 * primitives::amount::ONE, 100 * primitives::amount::ONE);

        let pool_before = store.get_pool(&asset).unwrap().unwrap();
        let err = handle(
            &mut store,
            BlockHeight::new(1),
            signer,
            Id::blank(),
            Address::from("swapper"),
            Coin::rune(Amount::from_atoms(60 * primitives::amount::ONE)),
            asset.clone(),
            Address::from("dest"),
            None,
        )
        .unwrap_err();

        assert_eq!(err, Error::SlipTooHigh);
        let pool_after = store.get_pool(&asset).unwrap().unwrap();
        assert_eq!(pool_before, pool_after);
        let txout = store.get_txout(BlockHeight::new(1)).unwrap().unwrap();
        assert_eq!(txout.tx_array[0].coin.asset, Asset::rune());
    }
}
