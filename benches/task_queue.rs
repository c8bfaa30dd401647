use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use castellan::domain::models::{FactionId, PriorityHeap, Task, TaskId, TaskType};

fn tasks(count: u64) -> Vec<Task> {
    let faction = FactionId::from("stark");
    (1..=count)
        .map(|id| {
            let task_type = TaskType::ALL[(id % 14) as usize];
            let priority = (id % 10 + 1) as u8;
            Task::clamped(TaskId(id), task_type, priority, faction.clone())
        })
        .collect()
}

fn bench_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("heap_push_pop");
    for size in [100u64, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || tasks(size),
                |tasks| {
                    let mut heap = PriorityHeap::with_capacity(tasks.len());
                    for task in tasks {
                        let priority = task.heap_priority();
                        heap.push(task, priority);
                    }
                    while let Some(task) = heap.pop() {
                        black_box(task);
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_lazy_remove(c: &mut Criterion) {
    c.bench_function("heap_remove_half_then_drain", |b| {
        b.iter_batched(
            || {
                let mut heap = PriorityHeap::new();
                for task in tasks(5_000) {
                    let priority = task.heap_priority();
                    heap.push(task, priority);
                }
                heap
            },
            |mut heap| {
                for id in (1..=5_000).step_by(2) {
                    heap.remove(&TaskId(id));
                }
                while let Some(task) = heap.pop() {
                    black_box(task);
                }
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_push_pop, bench_lazy_remove);
criterion_main!(benches);
