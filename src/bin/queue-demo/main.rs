use std::thread;
use std::time::Duration;

use bounded_blocking_queue::{BoundedBlockingQueue, CountdownLatch};
use clap::Parser;
use rand::Rng;
use tracing::{info, warn};
use tracing_subscriber;

#[derive(Default, Debug, Clone, Copy)]
struct Tally {
    accepted: usize,
    missed: usize,
}

fn jitter(max_us: u64) {
    if max_us > 0 {
        let us = rand::thread_rng().gen_range(0..=max_us);
        thread::sleep(Duration::from_micros(us));
    }
}

fn producer(
    id: usize,
    queue: BoundedBlockingQueue<u64>,
    start: CountdownLatch,
    options: Options,
) -> Tally {
    let timeout = Duration::from_millis(options.timeout_ms);
    let mut tally = Tally::default();
    start.wait();
    for i in 0..options.items {
        jitter(options.jitter_us);
        let value = (id as u64) << 32 | i as u64;
        if queue.push(value, timeout) {
            tally.accepted += 1;
        } else {
            tally.missed += 1;
        }
    }
    info!("producer {} done: {:?}", id, tally);
    tally
}

fn consumer(
    id: usize,
    queue: BoundedBlockingQueue<u64>,
    start: CountdownLatch,
    options: Options,
) -> Tally {
    let timeout = Duration::from_millis(options.timeout_ms);
    let mut tally = Tally::default();
    start.wait();
    for _ in 0..options.pops {
        jitter(options.jitter_us);
        match queue.pop(timeout) {
            Some(_) => tally.accepted += 1,
            None => tally.missed += 1,
        }
    }
    info!("consumer {} done: {:?}", id, tally);
    tally
}

#[derive(Parser, Debug, Clone, Copy)]
#[clap(author, version, about, long_about = None)]
struct Options {
    /// producer threads
    #[clap(long)]
    #[clap(default_value_t = 3)]
    producers: usize,

    /// consumer threads
    #[clap(long)]
    #[clap(default_value_t = 5)]
    consumers: usize,

    /// queue capacity
    #[clap(short, long)]
    #[clap(default_value_t = 10)]
    capacity: usize,

    /// items pushed by each producer
    #[clap(long)]
    #[clap(default_value_t = 20)]
    items: usize,

    /// pops attempted by each consumer
    #[clap(long)]
    #[clap(default_value_t = 30)]
    pops: usize,

    /// timeout of every push and pop, in milliseconds
    #[clap(short, long)]
    #[clap(default_value_t = 300)]
    timeout_ms: u64,

    /// upper bound of the random delay before each operation, in microseconds
    #[clap(long)]
    #[clap(default_value_t = 0)]
    jitter_us: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let options = Options::parse();
    info!("{:?}", options);

    let queue = BoundedBlockingQueue::new(options.capacity)?;
    let start = CountdownLatch::new(1);

    let producers: Vec<_> = (0..options.producers)
        .map(|id| {
            let (queue, start) = (queue.clone(), start.clone());
            thread::spawn(move || producer(id, queue, start, options))
        })
        .collect();
    let consumers: Vec<_> = (0..options.consumers)
        .map(|id| {
            let (queue, start) = (queue.clone(), start.clone());
            thread::spawn(move || consumer(id, queue, start, options))
        })
        .collect();

    start.countdown();

    let mut pushed = Tally::default();
    for handle in producers {
        let tally = handle.join().map_err(|_| "producer thread panicked")?;
        pushed.accepted += tally.accepted;
        pushed.missed += tally.missed;
    }
    let mut popped = Tally::default();
    for handle in consumers {
        let tally = handle.join().map_err(|_| "consumer thread panicked")?;
        popped.accepted += tally.accepted;
        popped.missed += tally.missed;
    }

    info!("pushed {} rejected {}", pushed.accepted, pushed.missed);
    info!("popped {} timed out {}", popped.accepted, popped.missed);

    let left = queue.size();
    if pushed.accepted != popped.accepted + left {
        warn!(
            "accounting mismatch: {} pushed, {} popped, {} left",
            pushed.accepted, popped.accepted, left
        );
    }
    info!("{} items left in queue", left);

    Ok(())
}
