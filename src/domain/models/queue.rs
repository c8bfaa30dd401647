//! Min-priority heap with stable ties and lazy removal.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Identity of an item stored in a [`PriorityHeap`].
///
/// The heap indexes entries by key so that `remove`, `contains` and
/// `get_priority` are O(1) and re-pushing an item replaces its old entry.
pub trait Keyed {
    /// Key type used for identity lookups
    type Key: Eq + Hash + Clone;

    /// Returns the identity of this item
    fn key(&self) -> Self::Key;
}

macro_rules! impl_keyed_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Keyed for $ty {
                type Key = $ty;

                #[allow(clippy::clone_on_copy)]
                fn key(&self) -> Self::Key {
                    self.clone()
                }
            }
        )*
    };
}

impl_keyed_by_value!(&'static str, String, u8, u16, u32, u64, usize, i32, i64, char);

/// State of one physical heap slot.
#[derive(Debug, Clone)]
enum Slot<T> {
    Live(T),
    Tombstoned,
}

/// Priority heap entry
///
/// Wraps a payload with its priority and creation sequence. Entries are
/// ordered by `(priority, sequence)`; lower keys are popped first.
#[derive(Debug, Clone)]
pub struct HeapEntry<T> {
    /// Priority value (lower values = popped first)
    pub priority: i32,
    /// Creation sequence used to break priority ties
    pub sequence: u64,
    slot: Slot<T>,
}

impl<T> HeapEntry<T> {
    fn sort_key(&self) -> (i32, u64) {
        (self.priority, self.sequence)
    }

    const fn is_tombstoned(&self) -> bool {
        matches!(self.slot, Slot::Tombstoned)
    }
}

impl<T> PartialEq for HeapEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl<T> Eq for HeapEntry<T> {}

impl<T> PartialOrd for HeapEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for HeapEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// An item removed from the heap together with its ordering key.
///
/// Handing a `Popped` back to [`PriorityHeap::reinsert`] restores the item
/// with the same priority and sequence, so it keeps its place in line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popped<T> {
    /// The removed item
    pub item: T,
    /// Priority it was stored with
    pub priority: i32,
    /// Creation sequence it was stored with
    pub sequence: u64,
}

/// Min-priority heap with stable tie-breaking and lazy removal
///
/// Array-backed binary heap keyed by `(priority, sequence)`. Items with the
/// lowest priority value are popped first; equal priorities pop in insertion
/// order. `remove` tombstones the entry in place in O(1); tombstones are
/// purged only when they surface at the root during `pop` or `peek`.
///
/// # Examples
///
/// ```
/// use castellan::domain::models::PriorityHeap;
///
/// let mut heap = PriorityHeap::new();
/// heap.push("A", 5);
/// heap.push("B", 5);
/// heap.push("C", 1);
///
/// assert_eq!(heap.pop(), Some("C"));
/// assert_eq!(heap.pop(), Some("A"));
/// assert_eq!(heap.pop(), Some("B"));
/// assert_eq!(heap.pop(), None);
/// ```
#[derive(Debug, Clone)]
pub struct PriorityHeap<T: Keyed> {
    entries: Vec<HeapEntry<T>>,
    /// key -> position of the live entry in `entries`
    positions: HashMap<T::Key, usize>,
    counter: u64,
}

impl<T: Keyed> PriorityHeap<T> {
    /// Creates a new empty heap
    ///
    /// # Examples
    ///
    /// ```
    /// use castellan::domain::models::PriorityHeap;
    ///
    /// let heap: PriorityHeap<String> = PriorityHeap::new();
    /// assert!(heap.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
            counter: 0,
        }
    }

    /// Creates a new heap with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
            counter: 0,
        }
    }

    /// Inserts an item with the given priority
    ///
    /// If an item with the same key is already present it is tombstoned
    /// first, so pushing twice acts as a priority update.
    ///
    /// # Examples
    ///
    /// ```
    /// use castellan::domain::models::PriorityHeap;
    ///
    /// let mut heap = PriorityHeap::new();
    /// heap.push("task", 5);
    /// heap.push("task", 1);
    /// assert_eq!(heap.len(), 1);
    /// assert_eq!(heap.get_priority(&"task"), Some(1));
    /// ```
    pub fn push(&mut self, item: T, priority: i32) {
        self.counter += 1;
        let sequence = self.counter;
        self.insert(item, priority, sequence);
    }

    /// Inserts an item carrying its own creation sequence
    ///
    /// Used by callers whose payloads already hold a sequence number. The
    /// internal counter is advanced past `sequence` so later plain pushes
    /// still order after it.
    pub fn push_with_sequence(&mut self, item: T, priority: i32, sequence: u64) {
        self.counter = self.counter.max(sequence);
        self.insert(item, priority, sequence);
    }

    /// Restores a previously popped item with its original priority and sequence
    pub fn reinsert(&mut self, popped: Popped<T>) {
        self.push_with_sequence(popped.item, popped.priority, popped.sequence);
    }

    /// Removes and returns the item with the smallest `(priority, sequence)`
    ///
    /// Returns `None` when no live entries remain.
    pub fn pop(&mut self) -> Option<T> {
        self.pop_entry().map(|popped| popped.item)
    }

    /// Like [`pop`](Self::pop) but also returns the entry's ordering key
    pub fn pop_entry(&mut self) -> Option<Popped<T>> {
        while let Some(entry) = self.pop_root() {
            if let Slot::Live(item) = entry.slot {
                self.positions.remove(&item.key());
                return Some(Popped {
                    item,
                    priority: entry.priority,
                    sequence: entry.sequence,
                });
            }
        }
        None
    }

    /// Returns the next item to be popped without removing it
    ///
    /// Tombstoned entries sitting at the root are discarded on the way.
    pub fn peek(&mut self) -> Option<&T> {
        while self.entries.first().is_some_and(HeapEntry::is_tombstoned) {
            self.pop_root();
        }
        match self.entries.first() {
            Some(HeapEntry {
                slot: Slot::Live(item),
                ..
            }) => Some(item),
            _ => None,
        }
    }

    /// Tombstones the item with the given key
    ///
    /// Returns `true` if the item was present. The physical entry stays in
    /// the array until it reaches the root.
    pub fn remove(&mut self, key: &T::Key) -> bool {
        self.take(key).is_some()
    }

    /// Tombstones the item with the given key and hands it back
    pub fn take(&mut self, key: &T::Key) -> Option<T> {
        let position = self.positions.remove(key)?;
        let slot = std::mem::replace(&mut self.entries[position].slot, Slot::Tombstoned);
        match slot {
            Slot::Live(item) => Some(item),
            Slot::Tombstoned => None,
        }
    }

    /// Changes the priority of an item, inserting it if absent
    pub fn update_priority(&mut self, item: T, priority: i32) {
        self.push(item, priority);
    }

    /// Returns `true` if an item with this key is live in the heap
    pub fn contains(&self, key: &T::Key) -> bool {
        self.positions.contains_key(key)
    }

    /// Returns the stored priority of the item with this key
    pub fn get_priority(&self, key: &T::Key) -> Option<i32> {
        self.positions
            .get(key)
            .map(|&position| self.entries[position].priority)
    }

    /// Returns a reference to the live item with this key
    pub fn get(&self, key: &T::Key) -> Option<&T> {
        let position = *self.positions.get(key)?;
        match &self.entries[position].slot {
            Slot::Live(item) => Some(item),
            Slot::Tombstoned => None,
        }
    }

    /// Number of live items
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Alias of [`len`](Self::len)
    pub fn size(&self) -> usize {
        self.len()
    }

    /// Returns `true` if no live items remain
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of physical slots, tombstones included
    pub fn physical_len(&self) -> usize {
        self.entries.len()
    }

    /// Removes every entry and resets the sequence counter
    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
        self.counter = 0;
    }

    /// All live items with their priorities, in pop order
    ///
    /// # Examples
    ///
    /// ```
    /// use castellan::domain::models::PriorityHeap;
    ///
    /// let mut heap = PriorityHeap::new();
    /// heap.push("low", 9);
    /// heap.push("high", 0);
    ///
    /// let items: Vec<_> = heap.sorted_items().into_iter().map(|(item, _)| *item).collect();
    /// assert_eq!(items, vec!["high", "low"]);
    /// ```
    pub fn sorted_items(&self) -> Vec<(&T, i32)> {
        let mut live: Vec<&HeapEntry<T>> = self
            .entries
            .iter()
            .filter(|entry| !entry.is_tombstoned())
            .collect();
        live.sort();
        live.into_iter()
            .filter_map(|entry| match &entry.slot {
                Slot::Live(item) => Some((item, entry.priority)),
                Slot::Tombstoned => None,
            })
            .collect()
    }

    /// The `n` next items in pop order, without removing them
    pub fn top_n(&self, n: usize) -> Vec<&T> {
        self.sorted_items()
            .into_iter()
            .take(n)
            .map(|(item, _)| item)
            .collect()
    }

    /// Iterates over live items in storage order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().filter_map(|entry| match &entry.slot {
            Slot::Live(item) => Some(item),
            Slot::Tombstoned => None,
        })
    }

    fn insert(&mut self, item: T, priority: i32, sequence: u64) {
        let key = item.key();
        if let Some(position) = self.positions.remove(&key) {
            self.entries[position].slot = Slot::Tombstoned;
        }

        let index = self.entries.len();
        self.entries.push(HeapEntry {
            priority,
            sequence,
            slot: Slot::Live(item),
        });
        self.positions.insert(key, index);
        self.bubble_up(index);
    }

    fn pop_root(&mut self) -> Option<HeapEntry<T>> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.swap(0, last);
        let root = self.entries.pop();
        if !self.entries.is_empty() {
            self.bubble_down(0);
        }
        root
    }

    fn bubble_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.entries[index] < self.entries[parent] {
                self.swap(index, parent);
                index = parent;
            } else {
                break;
            }
        }
    }

    fn bubble_down(&mut self, mut index: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * index + 1;
            let right = 2 * index + 2;
            let mut smallest = index;

            if left < len && self.entries[left] < self.entries[smallest] {
                smallest = left;
            }
            if right < len && self.entries[right] < self.entries[smallest] {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.swap(index, smallest);
            index = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.entries.swap(a, b);
        for position in [a, b] {
            if let Slot::Live(item) = &self.entries[position].slot {
                self.positions.insert(item.key(), position);
            }
        }
    }

    #[cfg(test)]
    fn heap_property_holds(&self) -> bool {
        (1..self.entries.len()).all(|i| self.entries[(i - 1) / 2] <= self.entries[i])
    }
}

impl<T: Keyed> Default for PriorityHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed + fmt::Display> fmt::Display for PriorityHeap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = self.sorted_items();
        write!(f, "PriorityHeap([")?;
        for (i, (item, priority)) in items.iter().take(5).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{item}({priority})")?;
        }
        if items.len() > 5 {
            write!(f, "... (+{} more)", items.len() - 5)?;
        }
        write!(f, "])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_heap_is_empty() {
        let mut heap: PriorityHeap<String> = PriorityHeap::new();
        assert!(heap.is_empty());
        assert_eq!(heap.len(), 0);
        assert_eq!(heap.pop(), None);
        assert_eq!(heap.peek(), None);
    }

    #[test]
    fn test_priority_ordering() {
        let mut heap = PriorityHeap::new();
        heap.push("low", 10);
        heap.push("high", 1);
        heap.push("medium", 5);

        assert_eq!(heap.pop(), Some("high"));
        assert_eq!(heap.pop(), Some("medium"));
        assert_eq!(heap.pop(), Some("low"));
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn test_ties_pop_in_insertion_order() {
        let mut heap = PriorityHeap::new();
        heap.push("A", 5);
        heap.push("B", 5);
        heap.push("C", 1);

        assert_eq!(heap.pop(), Some("C"));
        assert_eq!(heap.pop(), Some("A"));
        assert_eq!(heap.pop(), Some("B"));
    }

    #[test]
    fn test_push_existing_item_replaces_entry() {
        let mut heap = PriorityHeap::new();
        heap.push("a", 5);
        heap.push("b", 3);
        heap.push("a", 1);

        assert_eq!(heap.len(), 2);
        assert_eq!(heap.physical_len(), 3);
        assert_eq!(heap.pop(), Some("a"));
        assert_eq!(heap.pop(), Some("b"));
        assert_eq!(heap.pop(), None);
        assert_eq!(heap.physical_len(), 0);
    }

    #[test]
    fn test_remove_is_lazy() {
        let mut heap = PriorityHeap::new();
        heap.push(1u32, 1);
        heap.push(2u32, 2);
        heap.push(3u32, 3);

        assert!(heap.remove(&1));
        assert!(!heap.remove(&1));
        assert!(!heap.contains(&1));
        assert_eq!(heap.len(), 2);
        // The tombstone still occupies the root slot
        assert_eq!(heap.physical_len(), 3);

        assert_eq!(heap.peek(), Some(&2));
        assert_eq!(heap.physical_len(), 2);
        assert_eq!(heap.pop(), Some(2));
        assert_eq!(heap.pop(), Some(3));
    }

    #[test]
    fn test_remove_unknown_item() {
        let mut heap: PriorityHeap<u32> = PriorityHeap::new();
        assert!(!heap.remove(&42));
        assert_eq!(heap.get_priority(&42), None);
    }

    #[test]
    fn test_take_returns_payload() {
        let mut heap = PriorityHeap::new();
        heap.push(String::from("x"), 4);
        assert_eq!(heap.take(&String::from("x")), Some(String::from("x")));
        assert!(heap.is_empty());
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut heap = PriorityHeap::new();
        heap.push("item", 5);

        assert_eq!(heap.peek(), Some(&"item"));
        assert_eq!(heap.len(), 1);
        assert_eq!(heap.peek(), Some(&"item"));
    }

    #[test]
    fn test_reinsert_keeps_place_in_line() {
        let mut heap = PriorityHeap::new();
        heap.push("first", 5);
        heap.push("second", 5);

        let popped = heap.pop_entry().unwrap();
        assert_eq!(popped.item, "first");
        heap.push("third", 5);
        heap.reinsert(popped);

        assert_eq!(heap.pop(), Some("first"));
        assert_eq!(heap.pop(), Some("second"));
        assert_eq!(heap.pop(), Some("third"));
    }

    #[test]
    fn test_update_priority_inserts_when_absent() {
        let mut heap = PriorityHeap::new();
        heap.update_priority("new", 3);
        assert_eq!(heap.get_priority(&"new"), Some(3));
        heap.update_priority("new", 0);
        assert_eq!(heap.get_priority(&"new"), Some(0));
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn test_sorted_items_and_top_n() {
        let mut heap = PriorityHeap::new();
        heap.push("c", 3);
        heap.push("a", 1);
        heap.push("b", 1);
        heap.push("d", 4);
        heap.remove(&"d");

        let items: Vec<(&str, i32)> = heap
            .sorted_items()
            .into_iter()
            .map(|(item, priority)| (*item, priority))
            .collect();
        assert_eq!(items, vec![("a", 1), ("b", 1), ("c", 3)]);
        assert_eq!(heap.top_n(2), vec![&"a", &"b"]);
    }

    #[test]
    fn test_clear() {
        let mut heap = PriorityHeap::new();
        heap.push("item1", 5);
        heap.push("item2", 10);

        heap.clear();
        assert!(heap.is_empty());
        assert_eq!(heap.physical_len(), 0);
    }

    #[test]
    fn test_display_truncates_after_five() {
        let mut heap = PriorityHeap::new();
        for i in 0..7u32 {
            heap.push(i, i as i32);
        }
        assert_eq!(
            heap.to_string(),
            "PriorityHeap([0(0), 1(1), 2(2), 3(3), 4(4)... (+2 more)])"
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push(u8, i8),
        Pop,
        Peek,
        Remove(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0u8..32, -5i8..5).prop_map(|(item, p)| Op::Push(item, p)),
            1 => Just(Op::Pop),
            1 => Just(Op::Peek),
            1 => (0u8..32).prop_map(Op::Remove),
        ]
    }

    proptest! {
        /// Property: parent key <= child key after every public operation
        #[test]
        fn prop_heap_property_after_every_operation(ops in prop::collection::vec(op_strategy(), 0..200)) {
            let mut heap: PriorityHeap<u8> = PriorityHeap::new();
            for op in ops {
                match op {
                    Op::Push(item, priority) => heap.push(item, i32::from(priority)),
                    Op::Pop => { heap.pop(); }
                    Op::Peek => { heap.peek(); }
                    Op::Remove(item) => { heap.remove(&item); }
                }
                prop_assert!(heap.heap_property_holds());
                for (key, &position) in &heap.positions {
                    match &heap.entries[position].slot {
                        Slot::Live(item) => prop_assert_eq!(item, key),
                        Slot::Tombstoned => prop_assert!(false, "index points at tombstone"),
                    }
                }
            }
        }
    }
}
