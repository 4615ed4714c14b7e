use load_balancer_net::data_types::{CommandLine, GlobalId, LocalHandle, Slot};

#[derive(Debug, PartialEq)]
pub enum TaskTableError {
    /// Every slot is occupied
    Full { capacity: usize },
}

pub type TaskTableResult<T> = Result<T, TaskTableError>;

/// A task owned by this node
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEntry {
    pub local_handle: LocalHandle,
    pub global_id: GlobalId,
    pub command_line: CommandLine,
}

/// Fixed capacity table of the tasks running on this node, indexed by slot
#[derive(Debug)]
pub struct TaskTable {
    slots: Vec<Option<TaskEntry>>,
}

impl TaskTable {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots }
    }

    pub fn capacity(self: &Self) -> usize { self.slots.len() }

    pub fn len(self: &Self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(self: &Self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }

    /// The lowest slot that is free to hold a new task
    pub fn first_free(self: &Self) -> TaskTableResult<Slot> {
        match self.slots.iter().position(|slot| slot.is_none()) {
            Some(index) => Ok(index as Slot),
            None => Err(TaskTableError::Full { capacity: self.capacity() }),
        }
    }

    /// The lowest slot that holds a task
    pub fn first_occupied(self: &Self) -> Option<Slot> {
        self.slots.iter().position(|slot| slot.is_some()).map(|index| index as Slot)
    }

    pub fn get(self: &Self, slot: Slot) -> Option<&TaskEntry> {
        self.slots.get(slot as usize)?.as_ref()
    }

    /// Stores a task in a slot, returning the task that was replaced if any
    pub fn insert(self: &mut Self, slot: Slot, entry: TaskEntry) -> Option<TaskEntry> {
        self.slots.get_mut(slot as usize)?.replace(entry)
    }

    pub fn remove(self: &mut Self, slot: Slot) -> Option<TaskEntry> {
        self.slots.get_mut(slot as usize)?.take()
    }

    pub fn find(self: &Self, global_id: GlobalId) -> Option<Slot> {
        self.slots
            .iter()
            .position(|slot| matches!(slot, Some(entry) if entry.global_id == global_id))
            .map(|index| index as Slot)
    }

    /// Occupied slots in slot order
    pub fn iter(self: &Self) -> impl Iterator<Item = (Slot, &TaskEntry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|entry| (index as Slot, entry)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(local_handle: LocalHandle, global_id: GlobalId) -> TaskEntry {
        TaskEntry {
            local_handle,
            global_id,
            command_line: vec![String::from("sleep"), String::from("10")],
        }
    }

    #[test]
    fn fills_lowest_free_slot_first() {
        let mut table = TaskTable::new(3);
        table.insert(table.first_free().unwrap(), entry(100, 1001));
        table.insert(table.first_free().unwrap(), entry(101, 1002));
        table.remove(0);

        assert_eq!(Ok(0), table.first_free());
        assert_eq!(Some(1), table.first_occupied());
        assert_eq!(1, table.len());
    }

    #[test]
    fn full_table_reports_capacity() {
        let mut table = TaskTable::new(2);
        table.insert(0, entry(100, 1001));
        table.insert(1, entry(101, 1002));

        assert_eq!(Err(TaskTableError::Full { capacity: 2 }), table.first_free());
    }

    #[test]
    fn finds_tasks_by_global_id() {
        let mut table = TaskTable::new(4);
        table.insert(2, entry(100, 3001));
        table.insert(3, entry(101, 3002));

        assert_eq!(Some(3), table.find(3002));
        assert_eq!(None, table.find(3003));
        assert_eq!(vec![2, 3], table.iter().map(|(slot, _)| slot).collect::<Vec<Slot>>());
    }

    #[test]
    fn out_of_range_slots_are_empty() {
        let mut table = TaskTable::new(1);

        assert_eq!(None, table.get(5));
        assert_eq!(None, table.remove(5));
        assert_eq!(None, table.insert(5, entry(100, 1001)));
        assert!(table.is_empty());
    }
}
