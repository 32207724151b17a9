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

//! Colon-delimited memo grammar (C3). Parsing never fails with an internal
//! error: anything the grammar doesn't recognize becomes
//! [`ParsedMemo::Invalid`], which the observation path turns into a refund,
//! never a dispatch failure visible to the runtime.

use primitives::{Address, Amount, Asset, Chain, NodeAddress, PubKey};

use crate::{config::ConfigKey, types::TxId};

pub const MAX_MEMO_BYTES: usize = 250;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedMemo {
    Stake { pool_asset: Asset },
    Withdraw { pool_asset: Asset, basis_points: u16 },
    Swap { target_asset: Asset, dest_address: Option<Address>, target_price: Option<Amount> },
    Add { pool_asset: Asset },
    Gas { pool_asset: Asset },
    Outbound { in_hash: TxId },
    CreatePool { pool_asset: Asset },
    SetAdminConfig { key: ConfigKey, value: u64 },
    Apply { node_addr: NodeAddress },
    Bond { node_addr: NodeAddress },
    Leave { node_addr: NodeAddress },
    YggdrasilFund { pub_key: PubKey },
    YggdrasilReturn { pub_key: PubKey },
    Ragnarok { pool_asset: Option<Asset> },
    Reserve,
    Migrate { in_hash: TxId },
    Errata { tx_id: TxId },
    Invalid(String),
}

fn parse_asset(s: &str) -> Option<Asset> {
    let (chain, rest) = s.split_once('.')?;
    if chain.is_empty() {
        return None;
    }
    let (symbol, ticker) = match rest.split_once('-') {
        Some((symbol, ticker)) => (symbol, ticker),
        None => (rest, rest),
    };
    if symbol.is_empty() || ticker.is_empty() {
        return None;
    }
    Some(Asset::new(Chain::from(chain), symbol, ticker))
}

fn parse_tx_id(s: &str) -> Option<TxId> {
    TxId::from_hex(s)
}

fn parse_basis_points(s: &str) -> Option<u16> {
    let bp: u32 = s.parse().ok()?;
    if (1..=10_000).contains(&bp) {
        Some(bp as u16)
    } else {
        None
    }
}

fn config_key_from_segment(s: &str) -> Option<ConfigKey> {
    let keys = [
        ConfigKey::Gsl,
        ConfigKey::StakerAmtInterval,
        ConfigKey::MinValidatorBond,
        ConfigKey::WhiteListGasAsset,
        ConfigKey::DesireValidatorSet,
        ConfigKey::RotatePerBlockHeight,
        ConfigKey::ValidatorsChangeWindow,
        ConfigKey::PoolRefundGas,
        ConfigKey::TransactionFee,
        ConfigKey::MinimumNodesForBft,
        ConfigKey::MinimumNodesForYggdrasil,
        ConfigKey::NewPoolCycle,
        ConfigKey::FailKeygenSlashPoints,
        ConfigKey::SigningTransactionPeriod,
        ConfigKey::ObservationExpiryBlocks,
    ];
    keys.into_iter().find(|k| k.store_segment().eq_ignore_ascii_case(s))
}

/// Parse a memo into its classified intent. Total over the grammar: every
/// reachable input produces a variant, with anything malformed or
/// unrecognized falling through to `Invalid` rather than panicking or
/// returning an error up the call stack.
pub fn parse(memo: &str) -> ParsedMemo {
    if memo.as_bytes().len() > MAX_MEMO_BYTES {
        return ParsedMemo::Invalid("memo exceeds maximum length".to_owned());
    }

    let parts: Vec<&str> = memo.split(':').collect();
    let Some(tag) = parts.first() else {
        return ParsedMemo::Invalid("empty memo".to_owned());
    };
    let tag = tag.to_ascii_uppercase();
    let args = &parts[1..];

    match tag.as_str() {
        "STAKE" => match args.first().and_then(|a| parse_asset(a)) {
            Some(pool_asset) => ParsedMemo::Stake { pool_asset },
            None => ParsedMemo::Invalid("STAKE requires a pool asset".to_owned()),
        },
        "WITHDRAW" => match (args.first().and_then(|a| parse_asset(a)), args.get(1).and_then(|a| parse_basis_points(a))) {
            (Some(pool_asset), Some(basis_points)) => ParsedMemo::Withdraw { pool_asset, basis_points },
            _ => ParsedMemo::Invalid("WITHDRAW requires a pool asset and basis points".to_owned()),
        },
        "SWAP" | "=" => match args.first().and_then(|a| parse_asset(a)) {
            Some(target_asset) => {
                let dest_address = args.get(1).filter(|a| !a.is_empty()).map(|a| Address::from(*a));
                let target_price = args.get(2).and_then(|a| a.parse::<u128>().ok()).map(Amount::from_atoms);
                ParsedMemo::Swap { target_asset, dest_address, target_price }
            }
            None => ParsedMemo::Invalid("SWAP requires a target asset".to_owned()),
        },
        "ADD" => match args.first().and_then(|a| parse_asset(a)) {
            Some(pool_asset) => ParsedMemo::Add { pool_asset },
            None => ParsedMemo::Invalid("ADD requires a pool asset".to_owned()),
        },
        "GAS" => match args.first().and_then(|a| parse_asset(a)) {
            Some(pool_asset) => ParsedMemo::Gas { pool_asset },
            None => ParsedMemo::Invalid("GAS requires a pool asset".to_owned()),
        },
        "OUT" | "OUTBOUND" => match args.first().and_then(|a| parse_tx_id(a)) {
            Some(in_hash) => ParsedMemo::Outbound { in_hash },
            None => ParsedMemo::Invalid("OUT requires an in-hash".to_owned()),
        },
        "CREATE" => match args.first().and_then(|a| parse_asset(a)) {
            Some(pool_asset) => ParsedMemo::CreatePool { pool_asset },
            None => ParsedMemo::Invalid("CREATE requires a pool asset".to_owned()),
        },
        "ADMIN" => match (args.first().and_then(|a| config_key_from_segment(a)), args.get(1).and_then(|a| a.parse::<u64>().ok())) {
            (Some(key), Some(value)) => ParsedMemo::SetAdminConfig { key, value },
            _ => ParsedMemo::Invalid("ADMIN requires a recognized key and a value".to_owned()),
        },
        "APPLY" => match args.first() {
            Some(addr) => ParsedMemo::Apply { node_addr: NodeAddress::from(*addr) },
            None => ParsedMemo::Invalid("APPLY requires a node address".to_owned()),
        },
        "BOND" => match args.first() {
            Some(addr) => ParsedMemo::Bond { node_addr: NodeAddress::from(*addr) },
            None => ParsedMemo::Invalid("BOND requires a node address".to_owned()),
        },
        "LEAVE" => match args.first() {
            Some(addr) => ParsedMemo::Leave { node_addr: NodeAddress::from(*addr) },
            None => ParsedMemo::Invalid("LEAVE requires a node address".to_owned()),
        },
        "YGGDRASIL+" => match args.first().and_then(|a| hex::decode(a).ok()) {
            Some(bytes) => ParsedMemo::YggdrasilFund { pub_key: PubKey::new(bytes) },
            None => ParsedMemo::Invalid("YGGDRASIL+ requires a hex pub key".to_owned()),
        },
        "YGGDRASIL-" => match args.first().and_then(|a| hex::decode(a).ok()) {
            Some(bytes) => ParsedMemo::YggdrasilReturn { pub_key: PubKey::new(bytes) },
            None => ParsedMemo::Invalid("YGGDRASIL- requires a hex pub key".to_owned()),
        },
        "RAGNAROK" => {
            let pool_asset = args.first().and_then(|a| parse_asset(a));
            ParsedMemo::Ragnarok { pool_asset }
        }
        "RESERVE" => ParsedMemo::Reserve,
        "MIGRATE" => match args.first().and_then(|a| parse_tx_id(a)) {
            Some(in_hash) => ParsedMemo::Migrate { in_hash },
            None => ParsedMemo::Invalid("MIGRATE requires an in-hash".to_owned()),
        },
        "ERRATA" => match args.first().and_then(|a| parse_tx_id(a)) {
            Some(tx_id) => ParsedMemo::Errata { tx_id },
            None => ParsedMemo::Invalid("ERRATA requires a tx id".to_owned()),
        },
        _ => ParsedMemo::Invalid(format!("unrecognized memo tag '{tag}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stake_memo_parses_pool_asset() {
        assert_eq!(parse("STAKE:BNB.BNB"), ParsedMemo::Stake { pool_asset: Asset::new("BNB", "BNB", "BNB") });
    }

    #[test]
    fn swap_alias_equals_sign_parses_same_as_swap() {
        assert_eq!(parse("=:BNB.BNB"), parse("SWAP:BNB.BNB"));
    }

    #[test]
    fn withdraw_rejects_out_of_range_basis_points() {
        assert!(matches!(parse("WITHDRAW:BNB.BNB:10001"), ParsedMemo::Invalid(_)));
    }

    #[test]
    fn unrecognized_tag_is_invalid_not_a_panic() {
        assert!(matches!(parse("NOT-A-REAL-TAG"), ParsedMemo::Invalid(_)));
    }

    #[test]
    fn oversized_memo_is_invalid() {
        let memo = "STAKE:".to_owned() + &"A".repeat(300);
        assert!(matches!(parse(&memo), ParsedMemo::Invalid(_)));
    }

    #[test]
    fn ragnarok_with_no_args_targets_whole_network() {
        assert_eq!(parse("RAGNAROK"), ParsedMemo::Ragnarok { pool_asset: None });
    }
}
