//! Producer/consumer demo driven by a TOML config.
//!
//! Run with: cargo run --bin prodcons -- [config.toml]
//! Set RUST_LOG=syncqueue=trace to watch threads block and wake.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use colored::Colorize;
use crossbeam::channel;
use rand::Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use syncqueue::config::{ConfigError, DemoConfig};

#[derive(Debug, Clone, Copy)]
struct Job {
    producer: usize,
    seq: usize,
}

#[derive(Debug, Default)]
struct Report {
    produced: usize,
    consumed: usize,
    duplicates: usize,
    missing: usize,
    out_of_order: usize,
    peak_waiting: usize,
    elapsed: Duration,
}

impl Report {
    fn is_clean(&self) -> bool {
        self.duplicates == 0 && self.missing == 0 && self.out_of_order == 0
    }
}

// =============================================================================
// Setup
// =============================================================================

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("syncqueue=info,prodcons=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .init();
}

fn load_config() -> Result<DemoConfig, ConfigError> {
    match env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            DemoConfig::load(&path)
        }
        None => {
            info!("no config given, using defaults");
            let config = DemoConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn jitter(rng: &mut impl Rng, max_ms: u64) {
    if max_ms > 0 {
        thread::sleep(Duration::from_millis(rng.gen_range(0..=max_ms)));
    }
}

// =============================================================================
// Workload
// =============================================================================

fn run(config: &DemoConfig) -> Result<Report, ConfigError> {
    let queue = config.queue.build::<Job>()?;
    let workload = &config.workload;
    let total = workload.total_items()?;
    let per_consumer = total / workload.consumers;
    let peak_waiting = AtomicUsize::new(0);
    let (tx, rx) = channel::unbounded();
    let start = Instant::now();

    info!(
        capacity = ?queue.capacity(),
        producers = workload.producers,
        consumers = workload.consumers,
        items = total,
        "starting workload"
    );

    thread::scope(|s| {
        for producer in 0..workload.producers {
            let queue = &queue;
            let peak_waiting = &peak_waiting;
            s.spawn(move || {
                let mut rng = rand::thread_rng();
                for seq in 0..workload.items_per_producer {
                    jitter(&mut rng, workload.max_work_jitter_ms);
                    queue.push(Job { producer, seq });
                    peak_waiting.fetch_max(queue.waiting_count(), Ordering::Relaxed);
                }
            });
        }

        for consumer in 0..workload.consumers {
            let queue = &queue;
            let peak_waiting = &peak_waiting;
            let tx = tx.clone();
            s.spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..per_consumer {
                    let job = queue.pop();
                    peak_waiting.fetch_max(queue.waiting_count(), Ordering::Relaxed);
                    if tx.send((consumer, job)).is_err() {
                        warn!(consumer, "report channel closed early");
                        break;
                    }
                    jitter(&mut rng, workload.max_work_jitter_ms);
                }
            });
        }
    });
    drop(tx);

    let mut report = Report {
        produced: total,
        peak_waiting: peak_waiting.into_inner(),
        elapsed: start.elapsed(),
        ..Report::default()
    };

    // Last sequence number each consumer saw per producer.
    let mut last_seen: HashMap<(usize, usize), usize> = HashMap::new();
    let mut seen = vec![vec![false; workload.items_per_producer]; workload.producers];

    for (consumer, job) in rx.iter() {
        report.consumed += 1;

        let slot = &mut seen[job.producer][job.seq];
        if *slot {
            report.duplicates += 1;
        }
        *slot = true;

        if let Some(previous) = last_seen.insert((consumer, job.producer), job.seq) {
            if previous > job.seq {
                report.out_of_order += 1;
            }
        }
    }
    report.missing = seen.iter().flatten().filter(|received| !**received).count();

    if !queue.is_empty() {
        warn!(left = queue.len(), "items left in queue after run");
    }
    Ok(report)
}

// =============================================================================
// Output
// =============================================================================

fn print_report(report: &Report) {
    println!("{}", "=== Producer/Consumer Summary ===".bold());
    println!("  produced:      {}", report.produced);
    println!("  consumed:      {}", report.consumed);
    println!("  peak waiting:  {}", report.peak_waiting);
    println!("  elapsed:       {:?}", report.elapsed);

    let show = |label: &str, count: usize| {
        let value = if count == 0 {
            count.to_string().green()
        } else {
            count.to_string().red()
        };
        println!("  {label:<14} {value}");
    };
    show("duplicates:", report.duplicates);
    show("missing:", report.missing);
    show("out of order:", report.out_of_order);

    if report.is_clean() {
        println!("\n{}", "Every item delivered exactly once, in order.".green());
    } else {
        println!("\n{}", "Delivery problems detected!".red().bold());
    }
}

fn main() -> ExitCode {
    init_tracing();

    let report = load_config().and_then(|config| run(&config));
    match report {
        Ok(report) => {
            print_report(&report);
            if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
