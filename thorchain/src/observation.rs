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

//! C2: tallies `ObservedTx` witnesses per `tx_id` until an Active-signer
//! super-majority backs one payload, then raises the "consensus edge"
//! exactly once — classifying the winning payload's memo (C3) and
//! dispatching the matching intent handler (C4).
//!
//! Two entry points mirror the two directions a transfer can be observed
//! in: [`apply_observed_tx_in`] for inbound user transfers (the memo
//! selects a staking/swap/pool-lifecycle intent) and
//! [`apply_observed_tx_out`] for outbound settlement confirmations (the
//! memo selects which queued `TxOutItem` the observation completes).

use std::collections::BTreeSet;

use primitives::{Address, Amount, Asset, BlockHeight, Coin, NodeAddress};

use crate::{
    error::{Error, Result},
    handlers::{self, check_gate, refund_coin, SignerGate},
    memo::{self, ParsedMemo},
    store::Store,
    types::{EventType, ObservedTx, ObservedTxVoter, TxId},
};

/// Sum every coin in `coins` matching `pred`, ignoring the rest. Returns
/// zero (never an error) so a memo's coin requirements can always be
/// evaluated even when the tx carries none of the asset in question.
fn sum_matching(coins: &[Coin], pred: impl Fn(&Asset) -> bool) -> Amount {
    coins
        .iter()
        .filter(|c| pred(&c.asset))
        .fold(Amount::ZERO, |acc, c| acc.checked_add(c.amount).unwrap_or(acc))
}

fn rune_amount(coins: &[Coin]) -> Amount {
    sum_matching(coins, Asset::is_rune)
}

fn asset_amount(coins: &[Coin], pool_asset: &Asset) -> Amount {
    sum_matching(coins, |a| a == pool_asset)
}

/// `Swap`/`YggdrasilFund`/`YggdrasilReturn` memos name a single coin; a tx
/// observed with more than one coin attached still yields a deterministic
/// choice by taking the first, since the memo — not the coin list — is
/// authoritative for what the sender intended.
fn single_coin(coins: &[Coin]) -> Coin {
    coins.first().cloned().unwrap_or_else(|| Coin::rune(Amount::ZERO))
}

/// Refund-class errors are already self-handled by the handler that
/// raised them (it enqueues the refund before returning `Err`); the
/// dispatcher's job is only to decide whether the block continues. Only
/// a broken invariant halts processing.
fn swallow_refund_class(result: Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err @ (Error::StoreCorruption(_) | Error::Internal(_))) => Err(err),
        Err(err) => {
            logging::log::warn!("observation dispatch refused: {err}");
            Ok(())
        }
    }
}

/// Cast `signer`'s witness of `incoming` into the voter for
/// `incoming.tx.id`, firing `dispatch` exactly once on the block where a
/// payload first reaches super-majority. Shared by both directions;
/// `dispatch` differs only in which memo tags it understands.
fn record_observation(
    store: &mut Store,
    height: BlockHeight,
    signer: &NodeAddress,
    incoming: ObservedTx,
    dispatch: impl FnOnce(&mut Store, BlockHeight, NodeAddress, &ObservedTx) -> Result<()>,
) -> Result<()> {
    check_gate(store, signer, SignerGate::ActiveObserver)?;
    if !incoming.signers.contains(signer) {
        return Err(Error::InvalidMessage("observation is not signed by its submitting signer".to_owned()));
    }

    let mut voter = match store.get_voter(&incoming.tx.id)? {
        Some(voter) => voter,
        None => ObservedTxVoter::new(incoming.tx.id, height, store.active_node_count()?),
    };
    if voter.done || voter.abandoned {
        return Ok(());
    }

    let was_settled = voter.winning_payload().is_some();
    let incoming_hash = incoming.payload_hash();
    match voter.txs.iter_mut().find(|tx| tx.payload_hash() == incoming_hash) {
        Some(existing) => {
            existing.signers.insert(signer.clone());
        }
        None => {
            let mut incoming = incoming;
            incoming.signers = BTreeSet::from([signer.clone()]);
            voter.txs.push(incoming);
        }
    }

    if !was_settled {
        if let Some(winning) = voter.winning_payload().cloned() {
            voter.done = true;
            voter.decided_height = Some(height);
            let representative = winning
                .signers
                .iter()
                .next()
                .cloned()
                .ok_or_else(|| Error::Internal("winning payload has no signers".to_owned()))?;
            swallow_refund_class(dispatch(store, height, representative, &winning))?;
        }
    }

    store.set_voter(&voter)?;
    Ok(())
}

/// Inbound user transfers: `STAKE`, `WITHDRAW`, `SWAP`, `ADD`, `GAS`,
/// `RESERVE` and `CREATE` select a C4 handler keyed off the tx's coins and
/// `from` address. Every other tag — including `Invalid` — has no
/// sensible inbound interpretation and is refunded in full
/// (`spec.md` §9 Open Question (a)).
pub fn apply_observed_tx_in(store: &mut Store, height: BlockHeight, signer: NodeAddress, txs: Vec<ObservedTx>) -> Result<()> {
    for tx in txs {
        record_observation(store, height, &signer, tx, dispatch_tx_in)?;
    }
    Ok(())
}

fn dispatch_tx_in(store: &mut Store, height: BlockHeight, signer: NodeAddress, tx: &ObservedTx) -> Result<()> {
    let tx_id = tx.tx.id;
    let from = tx.tx.from.clone();
    let coins = &tx.tx.coins;

    match memo::parse(&tx.tx.memo) {
        ParsedMemo::Stake { pool_asset } => {
            let rune = rune_amount(coins);
            let asset = asset_amount(coins, &pool_asset);
            handlers::stake::handle(store, height, signer, tx_id, from, pool_asset, rune, asset)
        }
        ParsedMemo::Withdraw { pool_asset, basis_points } => {
            handlers::unstake::handle(store, height, signer, tx_id, from, pool_asset, basis_points)
        }
        ParsedMemo::Swap { target_asset, dest_address, target_price } => {
            let input = single_coin(coins);
            let dest = dest_address.unwrap_or_else(|| from.clone());
            handlers::swap::handle(store, height, signer, tx_id, from, input, target_asset, dest, target_price)
        }
        ParsedMemo::Add { pool_asset } => {
            let rune = rune_amount(coins);
            let asset = asset_amount(coins, &pool_asset);
            handlers::add::handle(store, height, signer, tx_id, pool_asset, rune, asset, EventType::Add)
        }
        ParsedMemo::Gas { pool_asset } => {
            let rune = rune_amount(coins);
            let asset = asset_amount(coins, &pool_asset);
            handlers::supplements::handle_gas(store, height, signer, tx_id, pool_asset, rune, asset)
        }
        ParsedMemo::Reserve => {
            let amount = rune_amount(coins);
            handlers::supplements::handle_reserve(store, height, signer, from, amount)
        }
        ParsedMemo::CreatePool { pool_asset } => handlers::pool_lifecycle::handle_create_pool(store, height, signer, pool_asset),
        ParsedMemo::Invalid(reason) => refund_inbound(store, height, tx_id, from, coins, &format!("invalid memo: {reason}")),
        ParsedMemo::Outbound { .. }
        | ParsedMemo::Migrate { .. }
        | ParsedMemo::Apply { .. }
        | ParsedMemo::Bond { .. }
        | ParsedMemo::Leave { .. }
        | ParsedMemo::YggdrasilFund { .. }
        | ParsedMemo::YggdrasilReturn { .. }
        | ParsedMemo::Ragnarok { .. }
        | ParsedMemo::SetAdminConfig { .. }
        | ParsedMemo::Errata { .. } => refund_inbound(store, height, tx_id, from, coins, "memo tag is not a valid inbound intent"),
    }
}

fn refund_inbound(store: &mut Store, height: BlockHeight, tx_id: TxId, to: Address, coins: &[Coin], reason: &str) -> Result<()> {
    logging::log::warn!("refunding inbound observation {tx_id}: {reason}");
    for coin in coins {
        refund_coin(store, height, tx_id, &to, coin.clone())?;
    }
    Ok(())
}

/// Outbound settlement confirmations: `OUT`/`MIGRATE`/`YGGDRASIL+`/
/// `YGGDRASIL-` select which queued item the observation completes. Any
/// other tag — most commonly a ragnarok-style sweep with no memo at all —
/// falls back to the blank-sentinel match in
/// [`handlers::outbound::handle_outbound`], the same path the protocol's
/// own ragnarok settlement uses.
pub fn apply_observed_tx_out(store: &mut Store, height: BlockHeight, signer: NodeAddress, txs: Vec<ObservedTx>) -> Result<()> {
    for tx in txs {
        record_observation(store, height, &signer, tx, dispatch_tx_out)?;
    }
    Ok(())
}

fn dispatch_tx_out(store: &mut Store, height: BlockHeight, signer: NodeAddress, tx: &ObservedTx) -> Result<()> {
    match memo::parse(&tx.tx.memo) {
        ParsedMemo::Outbound { in_hash } => handlers::outbound::handle_outbound(store, height, signer, tx.clone(), Some(in_hash)),
        ParsedMemo::Migrate { in_hash } => handlers::outbound::handle_migrate(store, height, signer, tx.clone(), in_hash),
        ParsedMemo::YggdrasilFund { pub_key } => {
            let coin = single_coin(&tx.tx.coins);
            handlers::supplements::handle_yggdrasil_fund(store, height, signer, pub_key, coin)
        }
        ParsedMemo::YggdrasilReturn { pub_key } => {
            let coin = single_coin(&tx.tx.coins);
            handlers::supplements::handle_yggdrasil_return(store, height, signer, pub_key, coin)
        }
        ParsedMemo::Invalid(reason) => {
            logging::log::warn!("unmatched outbound observation {} falling back to blank-sentinel settlement: {reason}", tx.tx.id);
            handlers::outbound::handle_outbound(store, height, signer, tx.clone(), None)
        }
        ParsedMemo::Stake { .. }
        | ParsedMemo::Withdraw { .. }
        | ParsedMemo::Swap { .. }
        | ParsedMemo::Add { .. }
        | ParsedMemo::Gas { .. }
        | ParsedMemo::Reserve
        | ParsedMemo::CreatePool { .. }
        | ParsedMemo::Apply { .. }
        | ParsedMemo::Bond { .. }
        | ParsedMemo::Leave { .. }
        | ParsedMemo::Ragnarok { .. }
        | ParsedMemo::SetAdminConfig { .. }
        | ParsedMemo::Errata { .. } => {
            logging::log::warn!("outbound observation {} carried a non-settlement memo, using blank-sentinel match", tx.tx.id);
            handlers::outbound::handle_outbound(store, height, signer, tx.clone(), None)
        }
    }
}
