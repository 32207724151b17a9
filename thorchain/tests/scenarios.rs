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

//! End-to-end coverage of the crate's public surface: [`thorchain::Message`]
//! dispatched through [`thorchain::apply_message`], not the individual
//! handler functions each module's own `#[cfg(test)]` block exercises
//! directly. Every scenario here drives the same entry point an enclosing
//! runtime would use.

use primitives::{Address, Amount, Asset, BlockHeight, Id, NodeAddress, PubKey};
use thorchain::{
    message::Message,
    store::MemoryChain,
    types::{NodeAccount, NodeStatus, Vault, VaultType},
};

fn active_node(chain: &mut MemoryChain, addr: &str, observer: bool) -> NodeAddress {
    let node_addr = NodeAddress::from(addr);
    let mut node = NodeAccount::new(node_addr.clone(), Address::from(format!("{addr}-bond").as_str()), Amount::from_atoms(1), BlockHeight::ZERO);
    node.status = NodeStatus::Active;
    node.observer_active = observer;
    chain.store().set_node(&node).unwrap();
    node_addr
}

fn asgard_vault(chain: &mut MemoryChain) {
    let vault = Vault::new(PubKey::new(b"asgard".to_vec()), VaultType::Asgard, BlockHeight::ZERO);
    chain.store().set_vault(&vault).unwrap();
}

/// S1, driven through `apply_message` rather than `handlers::stake::handle`
/// directly: a first stake against an unknown pool asset bootstraps it,
/// enables it immediately, and issues units equal to the rune deposit.
#[test]
fn apply_message_stake_bootstraps_and_enables_pool() {
    let mut chain = MemoryChain::new();
    let signer = active_node(&mut chain, "node1", false);
    let asset = Asset::new("BNB", "BNB", "BNB");

    let msg = Message::Stake {
        signer,
        tx_id: Id::blank(),
        staker: Address::from("staker1"),
        pool_asset: asset.clone(),
        rune: Amount::from_atoms(100 * primitives::amount::ONE),
        asset: Amount::from_atoms(10 * primitives::amount::ONE),
    };
    thorchain::apply_message(&mut chain.store(), BlockHeight::new(1), msg).unwrap();

    let pool = chain.store().get_pool(&asset).unwrap().unwrap();
    assert_eq!(pool.status, accounting::PoolStatus::Enabled);
    assert_eq!(pool.pool_units, Amount::from_atoms(100 * primitives::amount::ONE));
    assert_eq!(pool.balance_rune, Amount::from_atoms(100 * primitives::amount::ONE));
    assert_eq!(pool.balance_asset, Amount::from_atoms(10 * primitives::amount::ONE));
}

/// Invariant 4 (round-trip): stake(r, a) then unstake(10000) with no
/// activity in between returns no more than the original deposit and
/// leaves the pool with zero units again.
#[test]
fn apply_message_stake_then_full_unstake_round_trips() {
    let mut chain = MemoryChain::new();
    let signer = active_node(&mut chain, "node1", false);
    asgard_vault(&mut chain);
    let asset = Asset::new("BNB", "BNB", "BNB");
    let staker = Address::from("staker1");
    let rune = Amount::from_atoms(100 * primitives::amount::ONE);
    let asset_amt = Amount::from_atoms(10 * primitives::amount::ONE);

    thorchain::apply_message(
        &mut chain.store(),
        BlockHeight::new(1),
        Message::Stake { signer: signer.clone(), tx_id: Id::blank(), staker: staker.clone(), pool_asset: asset.clone(), rune, asset: asset_amt },
    )
    .unwrap();

    thorchain::apply_message(
        &mut chain.store(),
        BlockHeight::new(2),
        Message::Unstake { signer, tx_id: Id::blank(), staker, pool_asset: asset.clone(), basis_points: 10_000 },
    )
    .unwrap();

    let pool = chain.store().get_pool(&asset).unwrap().unwrap();
    assert!(pool.is_empty(), "redeeming every unit must leave the pool exactly empty");

    let txout = chain.store().get_txout(BlockHeight::new(2)).unwrap().unwrap();
    let rune_out: u128 = txout.tx_array.iter().filter(|i| i.coin.asset.is_rune()).map(|i| i.coin.amount.atoms()).sum();
    let asset_out: u128 = txout.tx_array.iter().filter(|i| i.coin.asset == asset).map(|i| i.coin.amount.atoms()).sum();
    assert!(rune_out <= rune.atoms(), "payout (after fee) must never exceed the original deposit");
    assert!(asset_out <= asset_amt.atoms(), "payout (after fee) must never exceed the original deposit");
}

/// A message whose signer is not an Active node account is rejected before
/// any handler runs, for every gate family — here the `Open` gate on
/// `Apply` still requires a syntactically valid message, and the `Active`
/// gate on `CreatePool` rejects an unknown signer outright.
#[test]
fn apply_message_rejects_unauthorized_signer() {
    let mut chain = MemoryChain::new();
    let signer = NodeAddress::from("unknown");
    let asset = Asset::new("BNB", "BNB", "BNB");

    let err = thorchain::apply_message(&mut chain.store(), BlockHeight::new(1), Message::CreatePool { signer, pool_asset: asset }).unwrap_err();
    assert_eq!(err, thorchain::Error::Unauthorized);
}

/// End-of-block reconciliation runs cleanly over an empty block with no
/// nodes, pools, or vaults at all — every step is a no-op rather than a
/// panic or a spurious error.
#[test]
fn end_block_on_empty_state_is_a_clean_no_op() {
    let mut chain = MemoryChain::new();
    let report = thorchain::end_block(&mut chain.store(), BlockHeight::new(1)).unwrap();
    assert_eq!(report.observers_slashed, 0);
    assert_eq!(report.pools_enabled, 0);
    assert!(report.step_errors.is_empty());
}
