// Hand-off throughput of the queues under one producer and one consumer.

use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use syncqueue::{BoundedQueue, MessageQueue, Queue};

const ITEMS: u64 = 10_000;

fn relay(queue: &dyn MessageQueue<u64>) {
    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..ITEMS {
                queue.push(i);
            }
        });
        for _ in 0..ITEMS {
            black_box(queue.pop());
        }
    });
}

fn single_thread_benchmark(c: &mut Criterion) {
    let queue = Queue::new();
    c.bench_function("unbounded push/pop same thread", |b| {
        b.iter(|| {
            queue.push(black_box(1u64));
            black_box(queue.pop());
        });
    });
}

fn handoff_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("handoff");
    group.throughput(Throughput::Elements(ITEMS));

    group.bench_function("unbounded", |b| {
        let queue = Queue::new();
        b.iter(|| relay(&queue));
    });

    for capacity in [1, 16, 256].iter() {
        group.bench_with_input(BenchmarkId::new("bounded", capacity), capacity, |b, &capacity| {
            let queue = BoundedQueue::new(capacity).expect("positive capacity");
            b.iter(|| relay(&queue));
        });
    }

    group.finish();
}

criterion_group!(benches, single_thread_benchmark, handoff_benchmark);
criterion_main!(benches);
