//! Lossy transposition table. One slot per index, no stored key: any
//! position hashing to an occupied slot sees whatever was written there
//! last. The search treats hits as hints, never as proof.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub depth: u32,
    pub score: i32,
    pub bound: Bound,
}

pub const DEFAULT_ENTRIES: usize = 1 << 15;

pub struct TransTable {
    slots: Vec<Option<Entry>>,
}

impl TransTable {
    pub fn new(entries: usize) -> Self {
        TransTable { slots: vec![None; entries.max(1)] }
    }

    fn slot_index(&self, key: u64) -> usize {
        (key % self.slots.len() as u64) as usize
    }

    /// Whatever occupies the slot `key` maps to. Distinct positions can
    /// share a slot, so a hit may describe another position entirely.
    pub fn probe(&self, key: u64) -> Option<Entry> {
        self.slots[self.slot_index(key)]
    }

    /// Last write wins; an earlier occupant is overwritten unconditionally.
    pub fn store(&mut self, key: u64, depth: u32, score: i32, bound: Bound) {
        let idx = self.slot_index(key);
        self.slots[idx] = Some(Entry { depth, score, bound });
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

impl Default for TransTable {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_then_probe_round_trips() {
        let mut tt = TransTable::new(64);
        tt.store(17, 3, 250, Bound::Exact);
        let entry = tt.probe(17).unwrap();
        assert_eq!(entry, Entry { depth: 3, score: 250, bound: Bound::Exact });
        assert_eq!(tt.occupied(), 1);
    }

    #[test]
    fn colliding_keys_share_a_slot_and_last_write_wins() {
        let mut tt = TransTable::new(64);
        tt.store(5, 4, 100, Bound::Lower);
        tt.store(5 + 64, 1, -700, Bound::Upper);
        let entry = tt.probe(5).unwrap();
        assert_eq!(entry.score, -700, "the later write owns the slot");
        assert_eq!(tt.occupied(), 1);
    }

    #[test]
    fn capacity_is_clamped_to_at_least_one_slot() {
        let tt = TransTable::new(0);
        assert_eq!(tt.capacity(), 1);
        assert!(tt.probe(123).is_none());
    }
}
