// ── Firewall priority allocation ──
//
// One allocator per sandbox operation and network. It combines what the
// network already holds (`observe`) with what this operation has handed
// out (`reserved`), so allocation tolerates rules created elsewhere and
// never returns the same value twice.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::CoreError;

/// Priority of the "deny traffic from other sandboxes" rule.
pub const SENTINEL_PRIORITY: u16 = 4090;

/// A reserved sub-range of the priority space.
///
/// Allocation scans the open interval `(floor, ceiling)`, starting just
/// past `start` in the requested direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PriorityBand {
    pub name: &'static str,
    pub floor: u16,
    pub start: u16,
    pub ceiling: u16,
}

impl PriorityBand {
    /// Subnet-scoped allow/deny rules: 2001..=3999.
    pub const LOW: Self = Self {
        name: "low",
        floor: 1000,
        start: 2000,
        ceiling: 4000,
    };

    /// Management and inbound rules: 4001..=4089.
    pub const HIGH: Self = Self {
        name: "high",
        floor: 4000,
        start: 4000,
        ceiling: SENTINEL_PRIORITY,
    };

    pub fn contains(&self, priority: u16) -> bool {
        priority > self.floor && priority < self.ceiling
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Default)]
pub struct PriorityAllocator {
    /// Priorities observed on the network.
    occupied: BTreeSet<u16>,
    /// Priorities handed out by this allocator.
    reserved: BTreeSet<u16>,
    cursors: HashMap<(PriorityBand, ScanOrder), u16>,
}

impl PriorityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator seeded with the priorities already present on a network.
    pub fn with_occupied(priorities: impl IntoIterator<Item = u16>) -> Self {
        let mut allocator = Self::new();
        allocator.observe(priorities);
        allocator
    }

    pub fn observe(&mut self, priorities: impl IntoIterator<Item = u16>) {
        self.occupied.extend(priorities);
    }

    /// Mark a priority as taken without scanning (fixed-priority rules).
    pub fn reserve(&mut self, priority: u16) {
        self.reserved.insert(priority);
    }

    pub fn is_free(&self, priority: u16) -> bool {
        !self.occupied.contains(&priority) && !self.reserved.contains(&priority)
    }

    /// Every value this allocator has handed out or reserved, ascending.
    pub fn reserved(&self) -> impl Iterator<Item = u16> + '_ {
        self.reserved.iter().copied()
    }

    /// Next free priority in `band`, continuing from the previous call for
    /// the same band and order. Ascending results strictly increase.
    pub fn next_in_band(&mut self, band: PriorityBand, order: ScanOrder) -> Result<u16, CoreError> {
        let cursor = self
            .cursors
            .get(&(band, order))
            .copied()
            .unwrap_or(band.start);

        let found = match order {
            ScanOrder::Ascending => (cursor.saturating_add(1)..band.ceiling).find(|p| self.is_free(*p)),
            ScanOrder::Descending => (band.floor.saturating_add(1)..cursor)
                .rev()
                .find(|p| self.is_free(*p)),
        };

        let Some(priority) = found else {
            return Err(CoreError::PriorityBandExhausted {
                band: band.name.to_owned(),
                start: band.start,
                limit: match order {
                    ScanOrder::Ascending => band.ceiling,
                    ScanOrder::Descending => band.floor,
                },
            });
        };

        trace!(band = band.name, ?order, priority, "allocated priority");
        self.cursors.insert((band, order), priority);
        self.reserved.insert(priority);
        Ok(priority)
    }

    /// First free priority strictly greater (ascending) or strictly less
    /// (descending) than `start`, bounded only by the priority domain.
    pub fn first_free(&mut self, start: u16, order: ScanOrder) -> Result<u16, CoreError> {
        let found = match order {
            ScanOrder::Ascending => start
                .checked_add(1)
                .and_then(|first| (first..=u16::MAX).find(|p| self.is_free(*p))),
            ScanOrder::Descending => (0..start).rev().find(|p| self.is_free(*p)),
        };

        let Some(priority) = found else {
            return Err(CoreError::PriorityBandExhausted {
                band: "first-free".into(),
                start,
                limit: match order {
                    ScanOrder::Ascending => u16::MAX,
                    ScanOrder::Descending => 0,
                },
            });
        };

        trace!(start, ?order, priority, "first free priority");
        self.reserved.insert(priority);
        Ok(priority)
    }
}
