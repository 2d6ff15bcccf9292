//! Synthetic-load demo: wires two lanes (A-M / N-Z), each with its own
//! pinned worker thread, matching engine, and SPSC rings either side of it,
//! feeds it a burst of orders, and reports end-to-end ack latency
//! percentiles. Grounded on the teacher's own `main.rs` micro-benchmark,
//! rewritten around the real ingress/worker/egress pipeline instead of a
//! bare loop calling the matcher directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lighting_match_core::config;
use lighting_match_core::cpu_affinity;
use lighting_match_core::engine::{InputMsg, MatchingEngine};
use lighting_match_core::envelope::{InputEnvelope, OutputEnvelope, OutputMsg};
use lighting_match_core::high_resolution_timer::HighResolutionCounter;
use lighting_match_core::partition::lane_of;
use lighting_match_core::perf_stats::{calculate_perf, print_stats};
use lighting_match_core::ring::SpscRing;
use lighting_match_core::types::{OrderType, Side, Symbol};
use lighting_match_core::worker::Worker;

/// Base frequency assumed for TSC-to-nanosecond conversion on this demo
/// host. Not auto-detected; override by changing this constant if the TSC
/// rate on the target machine differs materially.
const ASSUMED_CPU_GHZ: f64 = 3.0;

const DEMO_SYMBOLS: &[&str] = &["AAPL", "MSFT", "GOOG", "NFLX", "TSLA", "ZTS"];
const ORDERS_PER_LANE: usize = 20_000;

/// Prints `text` centered between `=` fill on its own line, bracketed by
/// blank separator lines. The demo only ever needs this one banner shape,
/// so it is not worth its own module.
fn print_banner(text: &str, width: usize) {
    let rule = "=".repeat(width);
    let pad = width.saturating_sub(text.len());
    let left = "=".repeat(pad / 2);
    let right = "=".repeat(pad - pad / 2);
    println!("\n{rule}\n");
    println!("{left}{text}{right}");
    println!("\n{rule}\n");
}

struct Lane {
    input: Arc<SpscRing<InputEnvelope>>,
    output: Arc<SpscRing<OutputEnvelope>>,
    shutdown: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

fn main() {
    let cfg = match config::get_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("engine_demo: invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    print_banner(&format!("engine_demo: {}", cfg.instance_name), 60);
    println!(
        "lanes={} pool_size={} queue_capacity={} symbol_capacity={}",
        cfg.lanes, cfg.pool_size, cfg.queue_capacity, cfg.symbol_capacity
    );

    let lane_count = cfg.lanes as usize;
    let lanes: Vec<Lane> = (0..lane_count)
        .map(|i| spawn_lane(i, &cfg))
        .collect();

    let timer = HighResolutionCounter::start(ASSUMED_CPU_GHZ);
    let mut send_times: Vec<Vec<u128>> = vec![Vec::with_capacity(ORDERS_PER_LANE); lane_count];

    let symbols: Vec<Symbol> = DEMO_SYMBOLS
        .iter()
        .map(|s| Symbol::new(s.as_bytes()).expect("demo symbols fit SYMBOL_MAX_LEN"))
        .collect();

    for i in 0..ORDERS_PER_LANE * lane_count {
        let symbol = symbols[i % symbols.len()];
        let lane = (lane_of(symbol.as_bytes()) as usize) % lane_count;
        let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
        let price = 10_000 + (i as u32 % 50);
        let envelope = InputEnvelope {
            client_id: 1,
            msg: InputMsg::NewOrder {
                symbol,
                user_id: 1,
                user_order_id: i as u32,
                side,
                kind: OrderType::Limit,
                price,
                quantity: 10,
            },
        };
        send_times[lane].push(timer.ns());
        if !lanes[lane].input.enqueue(envelope) {
            eprintln!("engine_demo: input ring full, dropping order {i}");
        }
    }

    // Give the workers time to drain before asking them to stop; a real
    // deployment would stop on an external signal instead.
    thread::sleep(Duration::from_millis(200));
    for lane in &lanes {
        lane.shutdown.store(true, Ordering::Release);
    }

    let mut latencies_ns: Vec<u32> = Vec::new();
    for (lane_idx, lane) in lanes.into_iter().enumerate() {
        lane.handle.join().expect("worker thread panicked");
        let mut ack_index = 0usize;
        while let Some(envelope) = lane.output.dequeue() {
            if let OutputMsg::Ack { .. } = envelope.msg {
                if let Some(&sent) = send_times[lane_idx].get(ack_index) {
                    let elapsed = timer.ns().saturating_sub(sent);
                    latencies_ns.push(elapsed.min(u32::MAX as u128) as u32);
                }
                ack_index += 1;
            }
        }
    }

    match calculate_perf(latencies_ns) {
        Some(stats) => print_stats(&stats),
        None => println!("engine_demo: no acks observed, nothing to report"),
    }
}

fn spawn_lane(index: usize, cfg: &config::EngineConfig) -> Lane {
    let input = Arc::new(SpscRing::new(cfg.queue_capacity as usize));
    let output = Arc::new(SpscRing::new(cfg.queue_capacity as usize));
    let shutdown = Arc::new(AtomicBool::new(false));

    let worker_input = input.clone();
    let worker_output = output.clone();
    let worker_shutdown = shutdown.clone();
    let pool_size = cfg.pool_size as usize;
    let symbol_capacity = cfg.symbol_capacity as usize;

    let handle = thread::spawn(move || {
        if !cpu_affinity::set_core(index) {
            eprintln!("engine_demo: lane {index} could not be pinned, running unpinned");
        }
        let engine = MatchingEngine::with_capacity(pool_size, symbol_capacity);
        let mut worker = Worker::new(engine, worker_input, worker_output, worker_shutdown);
        worker.run();
    });

    Lane {
        input,
        output,
        shutdown,
        handle,
    }
}
