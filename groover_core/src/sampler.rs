//! Background microphone sampling.
//!
//! Spawns a thread that owns the `Microphone` and a `SampleRing`, pushes one
//! sample per tick period, and hands each completed block to the consumer
//! over a bounded channel. The thread stands in for an 8 kHz timer
//! interrupt: it only fills the ring and raises the full handoff, and it
//! never blocks on the consumer.
//!
//! Safety: each `MicSampler` spawns exactly one thread that is shut down
//! when the `MicSampler` is dropped, preventing thread leaks.
use crossbeam_channel as xch;
use groover_traits::Microphone;
use groover_traits::clock::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::SamplingCfg;
use crate::ring::SampleRing;

pub struct MicSampler {
    rx: xch::Receiver<Vec<u16>>,
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl MicSampler {
    pub fn spawn<M: Microphone + Send + 'static, C: Clock + Send + Sync + 'static>(
        mut mic: M,
        cfg: &SamplingCfg,
        clock: C,
    ) -> Self {
        // Capacity 1 models the single full flag: at most one unconsumed
        // block exists, and the producer drops rather than waits.
        let (tx, rx) = xch::bounded(1);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let period = Duration::from_micros(crate::util::period_us(cfg.rate_hz));
        let block_samples = cfg.block_samples;

        let join_handle = std::thread::spawn(move || {
            let mut ring = SampleRing::new(block_samples);
            loop {
                // Immediate shutdown check (lock-free atomic)
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("mic sampler thread received shutdown signal");
                    break;
                }

                match mic.read_sample() {
                    Ok(sample) => {
                        if ring.push(sample) {
                            match tx.try_send(ring.snapshot()) {
                                Ok(()) => {}
                                Err(xch::TrySendError::Full(_)) => {
                                    // Consumer still holds the previous
                                    // block; this one is lost, not queued.
                                    tracing::trace!("sample block dropped, consumer busy");
                                }
                                Err(xch::TrySendError::Disconnected(_)) => {
                                    tracing::debug!("mic consumer disconnected, exiting thread");
                                    break;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        // A missed sample heals on the next tick; out-of-range
                        // or stuck readings are not detected here.
                        tracing::trace!(error = %e, "mic read failed, skipping tick");
                    }
                }

                // Check shutdown before sleep to avoid unnecessary delay
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(period);
            }
            tracing::trace!("mic sampler thread exiting cleanly");
        });

        Self {
            rx,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Take the pending block, if one completed since the last call. Each
    /// block is observed at most once.
    pub fn try_block(&self) -> Option<Vec<u16>> {
        self.rx.try_recv().ok()
    }

    /// Block until a full sample block arrives or the timeout expires.
    pub fn recv_block(&self, timeout: Duration) -> Option<Vec<u16>> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl Drop for MicSampler {
    fn drop(&mut self) {
        // Signal shutdown immediately; the thread notices between ticks.
        self.shutdown.store(true, Ordering::Relaxed);

        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("mic sampler thread joined successfully");
                }
                Err(e) => {
                    // Thread panicked; log but don't propagate (we're in Drop)
                    tracing::warn!(?e, "mic sampler thread panicked during shutdown");
                }
            }
        }
    }
}
