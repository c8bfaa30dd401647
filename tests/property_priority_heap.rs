use castellan::domain::models::PriorityHeap;
use proptest::prelude::*;

proptest! {
    /// Property: equal priorities pop in insertion order
    #[test]
    fn prop_fifo_among_equal_priorities(count in 1usize..60, priority in 0i32..10) {
        let mut heap = PriorityHeap::new();
        for id in 0..count {
            heap.push(id, priority);
        }

        let popped: Vec<usize> = std::iter::from_fn(|| heap.pop()).collect();
        prop_assert_eq!(popped, (0..count).collect::<Vec<_>>());
    }

    /// Property: pops come out sorted by (priority, insertion order)
    #[test]
    fn prop_pop_order_matches_stable_sort(priorities in prop::collection::vec(0i32..10, 0..80)) {
        let mut heap = PriorityHeap::new();
        for (id, &priority) in priorities.iter().enumerate() {
            heap.push(id, priority);
        }

        let mut expected: Vec<(i32, usize)> = priorities
            .iter()
            .enumerate()
            .map(|(id, &priority)| (priority, id))
            .collect();
        expected.sort();

        let popped: Vec<usize> = std::iter::from_fn(|| heap.pop()).collect();
        prop_assert_eq!(popped, expected.into_iter().map(|(_, id)| id).collect::<Vec<_>>());
    }

    /// Property: size after N distinct pushes and M pops is N - M
    #[test]
    fn prop_size_conservation(n in 0usize..60, m_ratio in 0.0f64..=1.0) {
        let m = (n as f64 * m_ratio) as usize;
        let mut heap = PriorityHeap::new();
        for id in 0..n {
            heap.push(id as u64, (id % 7) as i32);
        }
        for _ in 0..m {
            prop_assert!(heap.pop().is_some());
        }
        prop_assert_eq!(heap.size(), n - m);
    }

    /// Property: removed items never come back out
    #[test]
    fn prop_removed_items_never_pop(
        priorities in prop::collection::vec(0i32..5, 1..50),
        removals in prop::collection::vec(any::<prop::sample::Index>(), 0..25),
    ) {
        let mut heap = PriorityHeap::new();
        for (id, &priority) in priorities.iter().enumerate() {
            heap.push(id, priority);
        }
        let mut removed = std::collections::HashSet::new();
        for index in removals {
            let id = index.index(priorities.len());
            prop_assert_eq!(heap.remove(&id), removed.insert(id));
        }

        let popped: Vec<usize> = std::iter::from_fn(|| heap.pop()).collect();
        prop_assert_eq!(popped.len(), priorities.len() - removed.len());
        prop_assert!(popped.iter().all(|id| !removed.contains(id)));
    }
}

#[test]
fn test_push_then_pop_returns_same_item() {
    let mut heap = PriorityHeap::new();
    heap.push("only".to_string(), 3);
    assert_eq!(heap.pop(), Some("only".to_string()));
    assert!(heap.is_empty());
    assert_eq!(heap.pop(), None);
}

#[test]
fn test_scenario_pop_sequence() {
    let mut heap = PriorityHeap::new();
    heap.push("A", 5);
    heap.push("B", 5);
    heap.push("C", 1);

    assert_eq!(heap.pop(), Some("C"));
    assert_eq!(heap.pop(), Some("A"));
    assert_eq!(heap.pop(), Some("B"));
}

#[test]
fn test_update_moves_item_to_new_position() {
    let mut heap = PriorityHeap::new();
    heap.push("A", 5);
    heap.push("B", 5);
    heap.update_priority("B", 1);

    assert_eq!(heap.len(), 2);
    assert!(heap.physical_len() >= 2);
    assert_eq!(heap.pop(), Some("B"));
    assert_eq!(heap.pop(), Some("A"));
    assert_eq!(heap.pop(), None);
}
