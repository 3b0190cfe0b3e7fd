//! Sequential `WBTransgeneNNNNNNNN` identifier allocation.
//!
//! The allocator is seeded once from the store's current maximum and then
//! hands out consecutive numbers locally. The seeding read must happen inside
//! the same write transaction as the inserts that use the numbers (see
//! [`crate::reconcile`]), which is what makes allocation collision-free against
//! other writers.

use serde::Serialize;

use crate::error::AllocatorError;

/// Identifier prefix.
pub const TRANSGENE_PREFIX: &str = "WBTransgene";

/// Largest number that still formats into 8 digits.
pub const MAX_TRANSGENE_NUMBER: u64 = 99_999_999;

/// A knowledge-base transgene identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TransgeneId(u64);

impl TransgeneId {
    /// Wrap a sequence number. Returns `None` for 0 or numbers above 8 digits.
    pub fn new(number: u64) -> Option<Self> {
        (1..=MAX_TRANSGENE_NUMBER).contains(&number).then_some(Self(number))
    }

    /// The bare sequence number, as stored in `joinkey` columns.
    pub fn number(self) -> u64 {
        self.0
    }

    /// Parse `WBTransgene00000042`.
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.strip_prefix(TRANSGENE_PREFIX)?;
        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().and_then(Self::new)
    }
}

impl std::fmt::Display for TransgeneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{TRANSGENE_PREFIX}{:08}", self.0)
    }
}

/// Local counter seeded from the authoritative store maximum.
#[derive(Debug)]
pub struct IdentifierAllocator {
    last: u64,
}

impl IdentifierAllocator {
    /// Seed from the stored maximum (`None` when no record exists).
    pub fn seeded(current_max: Option<i64>) -> Result<Self, AllocatorError> {
        let last = match current_max {
            None => 0,
            Some(v) if v < 0 => return Err(AllocatorError::Negative { value: v }),
            Some(v) => v as u64,
        };
        Ok(Self { last })
    }

    /// Allocate the next identifier.
    pub fn next_id(&mut self) -> Result<TransgeneId, AllocatorError> {
        let next = self.last + 1;
        let id = TransgeneId::new(next).ok_or(AllocatorError::Exhausted { next })?;
        self.last = next;
        Ok(id)
    }

    /// The number that the next call to [`next_id`](Self::next_id) would return.
    pub fn peek_next(&self) -> u64 {
        self.last + 1
    }
}
