//! Token balances reconstructed by replaying `Transfer` events
//!
//! - transfers from the zero address are mints: supply grows, nobody is debited
//! - transfers to `0x…dEaD` are burns: supply shrinks, nobody is credited
//! - an address whose balance reaches exactly zero is dropped

mod log;

pub use log::{transfer_topic, JsonLogSource, RawLog, Transfer, TransferSource, TRANSFER_SIGNATURE};

use crate::input::TOTAL_SUPPLY_KEY;
use crate::model::{Address, HolderRecord};
use crate::{Error, Result};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Blocks requested from a source per query
pub const BLOCK_WINDOW: u64 = 2000;

/// Balances and total supply at the end of a replayed block range
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub balances: BTreeMap<Address, BigInt>,
    pub total_supply: BigInt,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply transfers in order
    pub fn replay<'a>(transfers: impl IntoIterator<Item = &'a Transfer>) -> Self {
        let mut snapshot = Snapshot::new();
        for transfer in transfers {
            snapshot.apply(transfer);
        }
        snapshot
    }

    /// Apply one transfer
    pub fn apply(&mut self, transfer: &Transfer) {
        if transfer.from == Address::ZERO {
            self.total_supply += &transfer.value;
        } else {
            *self.balances.entry(transfer.from).or_default() -= &transfer.value;
        }

        if transfer.to == Address::DEAD {
            self.total_supply -= &transfer.value;
        } else {
            *self.balances.entry(transfer.to).or_default() += &transfer.value;
        }

        for addr in [transfer.from, transfer.to] {
            if self.balances.get(&addr).is_some_and(Zero::is_zero) {
                self.balances.remove(&addr);
            }
        }
    }

    pub fn balance(&self, addr: &Address) -> BigInt {
        self.balances.get(addr).cloned().unwrap_or_default()
    }

    /// Addresses holding a negative balance; only possible when history is incomplete
    pub fn negative_balances(&self) -> Vec<Address> {
        self.balances
            .iter()
            .filter(|(_, balance)| balance.is_negative())
            .map(|(addr, _)| *addr)
            .collect()
    }

    /// `{address: balance, "totalSupply": supply}` with decimal strings
    pub fn to_json_map(&self) -> BTreeMap<String, String> {
        let mut map: BTreeMap<String, String> = self
            .balances
            .iter()
            .map(|(addr, balance)| (addr.to_checksum(), balance.to_string()))
            .collect();
        map.insert(TOTAL_SUPPLY_KEY.to_string(), self.total_supply.to_string());
        map
    }

    /// Holder records in address order
    pub fn to_records(&self) -> Vec<HolderRecord> {
        self.balances
            .iter()
            .map(|(addr, balance)| HolderRecord::balance(*addr, balance.clone()))
            .collect()
    }

    /// Write `to_json_map` as pretty JSON, creating parent directories
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&self.to_json_map())?)?;
        Ok(())
    }
}

/// Replay every transfer of `token` in `start_block..=end_block`
///
/// The source is queried in windows of [`BLOCK_WINDOW`] blocks.
pub fn snapshot_balances(
    source: &dyn TransferSource,
    start_block: u64,
    end_block: u64,
    token: &Address,
) -> Result<Snapshot> {
    if start_block > end_block {
        return Err(Error::Input(format!(
            "start block {} is after end block {}",
            start_block, end_block
        )));
    }

    let mut snapshot = Snapshot::new();
    let mut scanned = 0usize;
    let mut from = start_block;
    while from <= end_block {
        let to = from.saturating_add(BLOCK_WINDOW - 1).min(end_block);
        debug!("Reading blocks {} - {}", from, to);

        for log in source.logs(token, from, to)? {
            scanned += 1;
            if let Some(transfer) = Transfer::decode(&log)? {
                snapshot.apply(&transfer);
            }
        }

        if to == end_block {
            break;
        }
        from = to + 1;
    }

    let negative = snapshot.negative_balances();
    if !negative.is_empty() {
        warn!(
            "{} addresses ended with a negative balance; is the block range complete?",
            negative.len()
        );
    }
    info!(
        "Replayed {} logs: {} holders, total supply {}",
        scanned,
        snapshot.balances.len(),
        snapshot.total_supply
    );
    Ok(snapshot)
}
