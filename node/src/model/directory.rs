/*
The global process directory. Every node keeps a mirror of which task lives in
which slot on which node, and generates globally unique ids for the tasks that
it creates. Ids encode the rank of the node that generated them.
*/

use std::collections::BTreeMap;

use load_balancer_net::data_types::{GlobalId, Rank, Slot, NO_GLOBAL_ID};

/// Number of ids that one node can generate. Ids are `rank * GLOBAL_ID_STRIDE + counter`.
pub const GLOBAL_ID_STRIDE: GlobalId = 1000;

#[derive(Debug, PartialEq)]
pub enum DirectoryError {
    /// This node has generated all of the ids in its range
    IdSpaceExhausted { rank: Rank },

    /// The coordinates are outside of the network or the task table
    OutOfBounds { rank: Rank, slot: Slot },
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[derive(Debug)]
pub struct GlobalIdGenerator {
    rank: Rank,
    counter: GlobalId,
}

impl GlobalIdGenerator {
    pub fn new(rank: Rank) -> Self {
        // Counter starts at 1 so that rank 0 never generates the empty id
        Self { rank, counter: 1 }
    }

    pub fn generate(self: &mut Self) -> DirectoryResult<GlobalId> {
        if self.counter >= GLOBAL_ID_STRIDE {
            return Err(DirectoryError::IdSpaceExhausted { rank: self.rank });
        }
        let global_id = self.rank as GlobalId * GLOBAL_ID_STRIDE + self.counter;
        self.counter += 1;
        Ok(global_id)
    }
}

/// Sparse map of `(rank, slot) -> global id`, bounded by the network size and
/// the task table capacity
#[derive(Debug)]
pub struct DirectoryMirror {
    size: usize,
    slots: usize,
    entries: BTreeMap<(Rank, Slot), GlobalId>,
}

impl DirectoryMirror {
    pub fn new(size: usize, slots: usize) -> Self {
        Self {
            size,
            slots,
            entries: BTreeMap::new(),
        }
    }

    pub fn len(self: &Self) -> usize { self.entries.len() }

    pub fn get(self: &Self, rank: Rank, slot: Slot) -> Option<GlobalId> {
        self.entries.get(&(rank, slot)).copied()
    }

    /// Records that a rank holds a task in a slot. Setting the empty id clears the entry.
    pub fn set(self: &mut Self, rank: Rank, slot: Slot, global_id: GlobalId) -> DirectoryResult<()> {
        self.check_bounds(rank, slot)?;
        if global_id == NO_GLOBAL_ID {
            self.entries.remove(&(rank, slot));
        } else {
            self.entries.insert((rank, slot), global_id);
        }
        Ok(())
    }

    /// Clears an entry if it still holds the given id. A newer task that has already
    /// taken the slot is left in place. Returns true if an entry was removed.
    pub fn clear(self: &mut Self, rank: Rank, slot: Slot, global_id: GlobalId) -> DirectoryResult<bool> {
        self.check_bounds(rank, slot)?;
        match self.entries.get(&(rank, slot)) {
            Some(existing) if *existing == global_id => {
                self.entries.remove(&(rank, slot));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Scans the mirror in rank then slot order for the first entry holding the id
    pub fn find_owner(self: &Self, global_id: GlobalId) -> Option<(Rank, Slot)> {
        self.entries
            .iter()
            .find(|(_, id)| **id == global_id)
            .map(|(coordinates, _)| *coordinates)
    }

    fn check_bounds(self: &Self, rank: Rank, slot: Slot) -> DirectoryResult<()> {
        if (rank as usize) < self.size && (slot as usize) < self.slots {
            Ok(())
        } else {
            Err(DirectoryError::OutOfBounds { rank, slot })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_within_a_rank() {
        let mut generator = GlobalIdGenerator::new(3);
        let ids: HashSet<GlobalId> = (1..GLOBAL_ID_STRIDE)
            .map(|_| generator.generate().unwrap())
            .collect();

        assert_eq!((GLOBAL_ID_STRIDE - 1) as usize, ids.len());
        assert!(ids.iter().all(|id| (3001..4000).contains(id)));
    }

    #[test]
    fn ids_are_unique_across_ranks() {
        let mut ids = HashSet::new();
        for rank in 1..5 {
            let mut generator = GlobalIdGenerator::new(rank);
            for _ in 0..50 {
                assert!(ids.insert(generator.generate().unwrap()));
            }
        }
        assert_eq!(200, ids.len());
    }

    #[test]
    fn generator_refuses_to_wrap() {
        let mut generator = GlobalIdGenerator::new(2);
        for _ in 1..GLOBAL_ID_STRIDE {
            generator.generate().unwrap();
        }

        assert_eq!(
            Err(DirectoryError::IdSpaceExhausted { rank: 2 }),
            generator.generate()
        );
    }

    #[test]
    fn first_id_encodes_the_rank() {
        assert_eq!(Ok(2001), GlobalIdGenerator::new(2).generate());
    }

    #[test]
    fn clear_only_removes_matching_id() {
        let mut mirror = DirectoryMirror::new(4, 10);
        mirror.set(2, 0, 1001).unwrap();

        assert_eq!(Ok(false), mirror.clear(2, 0, 3005));
        assert_eq!(Some(1001), mirror.get(2, 0));

        assert_eq!(Ok(true), mirror.clear(2, 0, 1001));
        assert_eq!(None, mirror.get(2, 0));
    }

    #[test]
    fn find_owner_scans_in_rank_order() {
        let mut mirror = DirectoryMirror::new(4, 10);
        mirror.set(3, 1, 1001).unwrap();
        mirror.set(2, 7, 1001).unwrap();
        mirror.set(1, 0, 1002).unwrap();

        assert_eq!(Some((2, 7)), mirror.find_owner(1001));
        assert_eq!(None, mirror.find_owner(9999));
    }

    #[test]
    fn out_of_bounds_coordinates_are_rejected() {
        let mut mirror = DirectoryMirror::new(4, 10);

        assert_eq!(
            Err(DirectoryError::OutOfBounds { rank: 4, slot: 0 }),
            mirror.set(4, 0, 1001)
        );
        assert_eq!(
            Err(DirectoryError::OutOfBounds { rank: 1, slot: 10 }),
            mirror.clear(1, 10, 1001)
        );
        assert_eq!(0, mirror.len());
    }

    #[test]
    fn setting_empty_id_clears() {
        let mut mirror = DirectoryMirror::new(2, 2);
        mirror.set(1, 1, 1001).unwrap();
        mirror.set(1, 1, NO_GLOBAL_ID).unwrap();

        assert_eq!(0, mirror.len());
    }
}
