//! Allocation ledger
//!
//! Records every native object a wrapper call hands back with the allocation
//! flag set. Ids come from a per-ledger counter: strictly increasing, starting
//! at 1, never reused. A record leaves the ledger only when the exact id is
//! deregistered; anything left at cleanup is a leak.

use crate::error::{BindingError, BindingResult};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Number of leaked records a report lists
pub const LEAK_SAMPLE_LIMIT: usize = 10;

/// Session-unique allocation id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocationId(u64);

impl AllocationId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AllocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One outstanding allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRecord {
    pub id: AllocationId,
    /// Name of the declaration that produced the object
    pub tag: String,
}

impl fmt::Display for AllocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.tag)
    }
}

/// Outstanding allocations for one library handle
#[derive(Debug, Default)]
pub struct AllocationLedger {
    counter: u64,
    records: BTreeMap<AllocationId, String>,
}

impl AllocationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new allocation and return its id
    pub fn register(&mut self, tag: impl Into<String>) -> AllocationId {
        self.counter += 1;
        let id = AllocationId(self.counter);
        let tag = tag.into();
        tracing::trace!(%id, %tag, "registered allocation");
        self.records.insert(id, tag);
        id
    }

    /// Remove the record for exactly `id`
    pub fn deregister(&mut self, id: AllocationId) -> BindingResult<AllocationRecord> {
        match self.records.remove(&id) {
            Some(tag) => {
                tracing::trace!(%id, %tag, "deregistered allocation");
                Ok(AllocationRecord { id, tag })
            }
            None => Err(BindingError::AllocationNotFound(id)),
        }
    }

    /// Snapshot of the ids currently registered
    pub fn outstanding(&self) -> BTreeSet<AllocationId> {
        self.records.keys().copied().collect()
    }

    /// Outstanding records in id order
    pub fn records(&self) -> impl Iterator<Item = AllocationRecord> + '_ {
        self.records.iter().map(|(id, tag)| AllocationRecord {
            id: *id,
            tag: tag.clone(),
        })
    }

    pub fn tag_of(&self, id: AllocationId) -> Option<&str> {
        self.records.get(&id).map(String::as_str)
    }

    pub fn contains(&self, id: AllocationId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Summarize outstanding allocations without changing them
    pub fn report(&self) -> LeakReport {
        LeakReport {
            outstanding: self.records.len(),
            sample: self.records().take(LEAK_SAMPLE_LIMIT).collect(),
        }
    }
}

/// Advisory summary of unreleased allocations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakReport {
    /// Total outstanding records
    pub outstanding: usize,
    /// The first records by id, at most `LEAK_SAMPLE_LIMIT`
    pub sample: Vec<AllocationRecord>,
}

impl LeakReport {
    pub fn is_clean(&self) -> bool {
        self.outstanding == 0
    }
}

impl fmt::Display for LeakReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return f.write_str("all native objects released");
        }
        write!(f, "{} native object(s) not released", self.outstanding)?;
        for record in &self.sample {
            write!(f, "\n  {}", record)?;
        }
        if self.outstanding > self.sample.len() {
            write!(f, "\n  ... and {} more", self.outstanding - self.sample.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one() {
        let mut ledger = AllocationLedger::new();
        assert_eq!(ledger.register("new_int_vector").get(), 1);
        assert_eq!(ledger.register("new_int_vector").get(), 2);
    }

    #[test]
    fn test_deregister_removes_exactly_that_id() {
        let mut ledger = AllocationLedger::new();
        let first = ledger.register("a");
        let second = ledger.register("b");

        let record = ledger.deregister(first).unwrap();
        assert_eq!(record.tag, "a");
        assert!(!ledger.contains(first));
        assert!(ledger.contains(second));
    }

    #[test]
    fn test_deregister_unknown_id() {
        let mut ledger = AllocationLedger::new();
        let id = ledger.register("a");
        ledger.deregister(id).unwrap();
        assert!(matches!(
            ledger.deregister(id),
            Err(BindingError::AllocationNotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn test_report_display() {
        let mut ledger = AllocationLedger::new();
        assert_eq!(ledger.report().to_string(), "all native objects released");

        ledger.register("new_int_vector");
        assert_eq!(
            ledger.report().to_string(),
            "1 native object(s) not released\n  #1 new_int_vector"
        );
    }

    #[test]
    fn test_report_sample_is_bounded() {
        let mut ledger = AllocationLedger::new();
        for _ in 0..12 {
            ledger.register("make");
        }
        let report = ledger.report();
        assert_eq!(report.outstanding, 12);
        assert_eq!(report.sample.len(), LEAK_SAMPLE_LIMIT);
        assert_eq!(report.sample[0].id, AllocationId::from_raw(1));
        assert!(report.to_string().ends_with("... and 2 more"));
    }
}
