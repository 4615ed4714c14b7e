use load_balancer_net::data_types::{Load, Rank, OPERATOR_RANK};

/// A node's view of which workers participate in load balancing and the most
/// recent load sample that it knows for each of them. The operator rank has
/// entries in both tables but is never counted.
#[derive(Debug, Clone)]
pub struct Ledger {
    rank: Rank,
    participating: Vec<bool>,
    loads: Vec<Load>,
}

impl Ledger {
    pub fn new(rank: Rank, size: usize) -> Self {
        Self {
            rank,
            participating: vec![true; size],
            loads: vec![0.0; size],
        }
    }

    pub fn rank(self: &Self) -> Rank { self.rank }
    pub fn size(self: &Self) -> usize { self.participating.len() }

    pub fn is_participating(self: &Self, rank: Rank) -> bool {
        rank != OPERATOR_RANK && self.participating.get(rank as usize).copied().unwrap_or(false)
    }

    /// Returns false if the rank is outside of the network
    pub fn set_participating(self: &mut Self, rank: Rank, participating: bool) -> bool {
        match self.participating.get_mut(rank as usize) {
            Some(flag) => {
                *flag = participating;
                true
            }
            None => false,
        }
    }

    pub fn load(self: &Self, rank: Rank) -> Load {
        self.loads.get(rank as usize).copied().unwrap_or(0.0)
    }

    pub fn own_load(self: &Self) -> Load {
        self.load(self.rank)
    }

    /// Returns false if the rank is outside of the network
    pub fn set_load(self: &mut Self, rank: Rank, load: Load) -> bool {
        match self.loads.get_mut(rank as usize) {
            Some(sample) => {
                *sample = load;
                true
            }
            None => false,
        }
    }

    /// Worker ranks in increasing order
    pub fn workers(self: &Self) -> impl Iterator<Item = Rank> + '_ {
        (1..self.size()).map(|rank| rank as Rank)
    }

    /// Participating worker ranks in increasing order
    pub fn participants(self: &Self) -> impl Iterator<Item = Rank> + '_ {
        self.workers().filter(|rank| self.is_participating(*rank))
    }

    /// Participating workers other than this node
    pub fn other_participants(self: &Self) -> Vec<Rank> {
        self.participants().filter(|rank| *rank != self.rank).collect()
    }

    /// Workers other than this node, participating or not
    pub fn other_workers(self: &Self) -> Vec<Rank> {
        self.workers().filter(|rank| *rank != self.rank).collect()
    }

    pub fn participant_count(self: &Self) -> usize {
        self.participants().count()
    }

    /// Mean load over the participating workers, or None when nobody participates
    pub fn average_load(self: &Self) -> Option<Load> {
        let (sum, count) = self
            .participants()
            .fold((0.0, 0usize), |(sum, count), rank| (sum + self.load(rank), count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as Load)
        }
    }

    pub fn minimum_load(self: &Self) -> Option<Load> {
        self.participants()
            .map(|rank| self.load(rank))
            .fold(None, |min: Option<Load>, load| match min {
                Some(min) if min <= load => Some(min),
                _ => Some(load),
            })
    }

    /// Participating ranks whose load equals the network minimum, in increasing order
    pub fn least_loaded_set(self: &Self) -> Vec<Rank> {
        match self.minimum_load() {
            Some(min) => self.participants().filter(|rank| self.load(*rank) == min).collect(),
            None => Vec::new(),
        }
    }

    /// The participating rank with the lowest load, the lowest rank wins a tie
    pub fn least_loaded(self: &Self, exclude: Option<Rank>) -> Option<Rank> {
        let mut best: Option<Rank> = None;
        for rank in self.participants() {
            if Some(rank) == exclude {
                continue;
            }
            best = match best {
                Some(current) if self.load(current) <= self.load(rank) => Some(current),
                _ => Some(rank),
            };
        }
        best
    }

    /// The lowest worker rank that does not participate
    pub fn first_non_participant(self: &Self) -> Option<Rank> {
        self.workers().find(|rank| !self.is_participating(*rank))
    }

    /// The next rank around the ring of workers, skipping the operator
    pub fn ring_next(self: &Self) -> Rank {
        let next = (self.rank as usize + 1) % self.size();
        if next == OPERATOR_RANK as usize { 1 } else { next as Rank }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with_loads(loads: &[Load]) -> Ledger {
        let mut ledger = Ledger::new(1, loads.len());
        for (rank, load) in loads.iter().enumerate() {
            ledger.set_load(rank as Rank, *load);
        }
        ledger
    }

    #[test]
    fn average_excludes_operator() {
        let ledger = ledger_with_loads(&[100.0, 10.0, 1.0, 1.0]);

        assert_eq!(Some(4.0), ledger.average_load());
    }

    #[test]
    fn average_excludes_withdrawn_ranks() {
        let mut ledger = ledger_with_loads(&[0.0, 10.0, 1.0, 1.0]);
        ledger.set_participating(1, false);

        assert_eq!(Some(1.0), ledger.average_load());
    }

    #[test]
    fn removing_a_rank_at_the_average_keeps_the_average() {
        let mut ledger = ledger_with_loads(&[0.0, 2.0, 4.0, 3.0]);
        ledger.set_participating(3, false);

        assert_eq!(Some(3.0), ledger.average_load());
    }

    #[test]
    fn average_is_undefined_without_participants() {
        let mut ledger = ledger_with_loads(&[0.0, 1.0, 2.0]);
        ledger.set_participating(1, false);
        ledger.set_participating(2, false);

        assert_eq!(None, ledger.average_load());
        assert_eq!(None, ledger.least_loaded(None));
    }

    #[test]
    fn least_loaded_set_includes_ties() {
        let ledger = ledger_with_loads(&[0.0, 10.0, 1.0, 1.0]);

        assert_eq!(vec![2, 3], ledger.least_loaded_set());
        assert_eq!(Some(2), ledger.least_loaded(None));
        assert_eq!(Some(3), ledger.least_loaded(Some(2)));
    }

    #[test]
    fn ring_wraps_past_the_operator() {
        assert_eq!(2, Ledger::new(1, 4).ring_next());
        assert_eq!(1, Ledger::new(3, 4).ring_next());
    }

    #[test]
    fn first_non_participant_in_rank_order() {
        let mut ledger = Ledger::new(1, 5);
        assert_eq!(None, ledger.first_non_participant());

        ledger.set_participating(4, false);
        ledger.set_participating(2, false);

        assert_eq!(Some(2), ledger.first_non_participant());
        assert_eq!(vec![3], ledger.other_participants());
        assert_eq!(vec![2, 3, 4], ledger.other_workers());
    }

    #[test]
    fn out_of_range_ranks_are_ignored() {
        let mut ledger = Ledger::new(1, 3);

        assert!(!ledger.set_load(7, 1.0));
        assert!(!ledger.set_participating(7, true));
        assert!(!ledger.is_participating(7));
        assert!(!ledger.is_participating(OPERATOR_RANK));
    }
}
