//! C7 — the worker stage. Owns one matching engine and the input/output
//! rings either side of it; runs the dequeue-process-route loop until told
//! to stop. No suspension points other than the idle backoff sleep.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::{InputMsg, MatchingEngine};
use crate::envelope::{route, InputEnvelope, OutputEnvelope};
use crate::ring::SpscRing;
use crate::types::{ClientId, BATCH_SIZE, IDLE_THRESHOLD};

/// Fans an in-band mass-cancel command out to every lane's input queue,
/// per §4.9's disconnection-handler delivery contract: a disconnect
/// handler calls this instead of reaching into any book directly, and each
/// worker picks the command up on its next `run` iteration. Returns the
/// number of lanes the command was successfully enqueued to; a lane whose
/// input ring is full is skipped, same as any other dropped input.
pub fn request_mass_cancel(client_id: ClientId, lane_inputs: &[Arc<SpscRing<InputEnvelope>>]) -> usize {
    let envelope = InputEnvelope {
        client_id,
        msg: InputMsg::MassCancel { client_id },
    };
    lane_inputs
        .iter()
        .filter(|ring| ring.enqueue(envelope))
        .count()
}

/// Bumped whenever an output envelope is dropped because the output ring
/// was full. The book state is never rolled back for this — the client
/// simply misses that notification (§4.8).
#[derive(Default)]
pub struct WorkerStats {
    pub output_drops: AtomicU64,
    pub batches_processed: AtomicU64,
    pub envelopes_processed: AtomicU64,
}

pub struct Worker {
    engine: MatchingEngine,
    input: Arc<SpscRing<InputEnvelope>>,
    output: Arc<SpscRing<OutputEnvelope>>,
    seq: AtomicU64,
    shutdown: Arc<AtomicBool>,
    pub stats: WorkerStats,
}

impl Worker {
    pub fn new(
        engine: MatchingEngine,
        input: Arc<SpscRing<InputEnvelope>>,
        output: Arc<SpscRing<OutputEnvelope>>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Worker {
            engine,
            input,
            output,
            seq: AtomicU64::new(0),
            shutdown,
            stats: WorkerStats::default(),
        }
    }

    /// Runs the dequeue/process/route loop until the shutdown flag is set.
    /// Drains whatever remains in the input ring before honouring shutdown,
    /// so a stop request never silently discards already-queued work.
    pub fn run(&mut self) {
        let mut idle_polls: u32 = 0;
        let mut batch = Vec::with_capacity(BATCH_SIZE);
        loop {
            batch.clear();
            self.input.dequeue_batch(&mut batch, BATCH_SIZE);
            if batch.is_empty() {
                if self.shutdown.load(Ordering::Acquire) {
                    return;
                }
                idle_polls = idle_polls.saturating_add(1);
                let backoff = if idle_polls > IDLE_THRESHOLD {
                    Duration::from_micros(100)
                } else {
                    Duration::from_micros(1)
                };
                std::thread::sleep(backoff);
                continue;
            }
            idle_polls = 0;
            self.process_batch(&batch);
            self.stats.batches_processed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn process_batch(&mut self, batch: &[InputEnvelope]) {
        let mut raw = Vec::new();
        for envelope in batch {
            raw.clear();
            // A capacity-exhaustion error is a deployment sizing bug; the
            // worker logs and moves on rather than taking the whole process
            // down over one rejected order.
            if let Err(err) = self.engine.process(envelope.client_id, envelope.msg, &mut raw) {
                eprintln!("worker: rejecting input, engine error: {err}");
                continue;
            }
            for symbol_msg in raw.drain(..) {
                let mut routed = Vec::new();
                route(symbol_msg, envelope.client_id, &self.seq, &mut routed);
                for out_envelope in routed {
                    if !self.output.enqueue(out_envelope) {
                        self.stats.output_drops.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            self.stats.envelopes_processed.fetch_add(1, Ordering::Relaxed);
        }
    }
}
