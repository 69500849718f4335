//! Asynchronous frame reader.
//!
//! Decouples a blocking, device-paced frame source from consumers that only
//! ever want the most recent frame. One background producer thread pulls
//! frames from the source and publishes each success into a single mutex-
//! guarded slot (last-write-wins, no queueing); any number of readers copy
//! the latest published frame out of the slot without ever waiting on device
//! I/O.
//!
//! The slot pairs the frame with a `grabbed` flag and both are always written
//! together under the lock, so a reader can never observe a torn pair. The
//! lock is held for the assignment only, never across an acquisition, which
//! bounds `read()` latency by a pointer swap rather than by sensor timing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::GrabdConfig;
use crate::frame::PixelBuffer;
use crate::source::{self, FrameSource};

/// Default bound on how long `start()` waits for the first successful grab.
pub const DEFAULT_WARMUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors surfaced by [`AsyncFrameReader`].
///
/// Only construction and warmup fail synchronously; steady-state capture
/// misses are retried inside the producer loop and never reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// The frame source could not be opened or configured.
    #[error("failed to open frame source")]
    DeviceInit(#[source] anyhow::Error),

    /// No frame was grabbed within the warmup window. The producer is still
    /// running and stoppable; callers typically `stop()` and retry.
    #[error("no frame grabbed within warmup window (waited {elapsed:?}, timeout {timeout:?}); try restarting the capture")]
    WarmupTimeout { elapsed: Duration, timeout: Duration },

    /// `start()` after `shutdown()` has already released the device.
    #[error("frame source already released")]
    SourceReleased,
}

/// The latest-frame mailbox. Both fields are written together under the lock.
struct FrameSlot {
    frame: Arc<PixelBuffer>,
    grabbed: bool,
}

struct Shared {
    slot: Mutex<FrameSlot>,
    /// Signalled on every successful publish; `start()` waits on it during
    /// warmup instead of sleep-polling the flag.
    grabbed_cond: Condvar,
    /// Cooperative stop flag, checked once per producer iteration.
    running: AtomicBool,
}

impl Shared {
    fn lock_slot(&self) -> std::sync::MutexGuard<'_, FrameSlot> {
        // Slot writes are two plain assignments; a poisoned lock still holds
        // a coherent pair, so recover rather than propagate.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Background frame grabber with a latest-frame mailbox.
///
/// Lifecycle: construct (priming capture) -> `start()` (spawn producer +
/// warmup wait) -> any number of `read()`s -> `stop()` -> `shutdown()`.
/// `stop()` and `shutdown()` are idempotent and safe in any order; dropping
/// the reader performs both.
pub struct AsyncFrameReader<S: FrameSource> {
    shared: Arc<Shared>,
    /// Present while the producer is not running; moves into the producer
    /// thread on `start()` and returns through the join on `stop()`.
    source: Option<S>,
    worker: Option<JoinHandle<S>>,
    warmup_timeout: Duration,
}

impl AsyncFrameReader<Box<dyn FrameSource>> {
    /// Open the backend named by the config and build a reader over it.
    pub fn open(config: &GrabdConfig) -> Result<Self, ReaderError> {
        let source = source::open_source(&config.capture).map_err(ReaderError::DeviceInit)?;
        Ok(Self::new(source).with_warmup_timeout(config.warmup_timeout))
    }
}

impl<S: FrameSource> AsyncFrameReader<S> {
    /// Wrap a source, performing one synchronous priming capture so `read()`
    /// is well-defined before `start()`.
    pub fn new(mut source: S) -> Self {
        let (grabbed, frame) = match source.acquire_frame() {
            Some(frame) => (true, frame),
            None => (false, PixelBuffer::default()),
        };
        if !grabbed {
            log::warn!("priming capture missed; first frame arrives after start()");
        }

        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(FrameSlot {
                    frame: Arc::new(frame),
                    grabbed,
                }),
                grabbed_cond: Condvar::new(),
                running: AtomicBool::new(false),
            }),
            source: Some(source),
            worker: None,
            warmup_timeout: DEFAULT_WARMUP_TIMEOUT,
        }
    }

    pub fn with_warmup_timeout(mut self, timeout: Duration) -> Self {
        self.warmup_timeout = timeout;
        self
    }

    /// Whether the background producer is currently running.
    pub fn is_started(&self) -> bool {
        self.worker.is_some()
    }

    /// Spawn the background producer and wait (bounded) for the first
    /// successful grab.
    ///
    /// Calling `start()` on an already-started reader logs a warning and
    /// returns `Ok` without side effects; it never spawns a second producer.
    /// On `WarmupTimeout` the producer is left running but remains fully
    /// stoppable via `stop()`/`shutdown()`.
    pub fn start(&mut self) -> Result<(), ReaderError> {
        if self.worker.is_some() {
            log::warn!("asynchronous capture already started; ignoring start()");
            return Ok(());
        }
        let mut source = self.source.take().ok_or(ReaderError::SourceReleased)?;

        self.shared.running.store(true, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let worker = thread::spawn(move || {
            while shared.running.load(Ordering::SeqCst) {
                // Block on the device outside the lock.
                let Some(frame) = source.acquire_frame() else {
                    // Transient miss; retry on the next pass.
                    continue;
                };
                let mut slot = shared.lock_slot();
                slot.frame = Arc::new(frame);
                slot.grabbed = true;
                drop(slot);
                shared.grabbed_cond.notify_all();
            }
            source
        });
        self.worker = Some(worker);
        log::info!("asynchronous capture started");

        // Warmup: wait until the first grab lands or the window closes. The
        // priming capture usually satisfies this immediately.
        let warmup_start = Instant::now();
        let slot = self.shared.lock_slot();
        let (slot, timeout) = self
            .shared
            .grabbed_cond
            .wait_timeout_while(slot, self.warmup_timeout, |slot| !slot.grabbed)
            .unwrap_or_else(PoisonError::into_inner);
        if timeout.timed_out() && !slot.grabbed {
            drop(slot);
            return Err(ReaderError::WarmupTimeout {
                elapsed: warmup_start.elapsed(),
                timeout: self.warmup_timeout,
            });
        }
        Ok(())
    }

    /// Copy out the latest published (`grabbed`, frame) pair.
    ///
    /// Never blocks on device I/O; worst case is the producer's in-progress
    /// slot assignment. `grabbed == false` means no capture has ever
    /// succeeded, and the frame is the empty placeholder.
    pub fn read(&self) -> (bool, Arc<PixelBuffer>) {
        let slot = self.shared.lock_slot();
        (slot.grabbed, Arc::clone(&slot.frame))
    }

    /// Signal the producer to exit and wait for it. Safe to call when not
    /// started, and safe to call twice.
    ///
    /// Latency is bounded by one in-flight `acquire_frame()` call.
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(source) => {
                    self.source = Some(source);
                    log::info!("asynchronous capture stopped");
                }
                Err(_) => log::error!("capture producer panicked; source lost"),
            }
        }
    }

    /// Stop the producer (if running) and release the device. Idempotent;
    /// also what `Drop` does.
    pub fn shutdown(&mut self) {
        self.stop();
        if let Some(mut source) = self.source.take() {
            source.release();
        }
    }
}

impl<S: FrameSource> Drop for AsyncFrameReader<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
