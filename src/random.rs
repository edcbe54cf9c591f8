use parking_lot::Mutex;
use rand::{Rng, RngCore};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of randomness for simulated outcomes, hashes and fake addresses
pub trait RandomSource: Send + Sync {
    /// Uniform draw in [0, 1)
    fn next_f64(&self) -> f64;
    fn fill_bytes(&self, dest: &mut [u8]);
}

/// `rand::thread_rng` backed source
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn fill_bytes(&self, dest: &mut [u8]) {
        rand::thread_rng().fill_bytes(dest);
    }
}

/// Replays queued draws so both settlement branches can be forced.
///
/// Once the queue is empty it keeps returning the fallback draw. Bytes are a
/// counter so generated hashes stay distinct.
#[derive(Debug)]
pub struct ScriptedRandom {
    draws: Mutex<VecDeque<f64>>,
    fallback: f64,
    draw_count: AtomicUsize,
    byte_counter: AtomicUsize,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            draws: Mutex::new(draws.into_iter().collect()),
            fallback,
            draw_count: AtomicUsize::new(0),
            byte_counter: AtomicUsize::new(0),
        }
    }

    /// Source returning `draw` on every call
    pub fn always(draw: f64) -> Self {
        Self::new([], draw)
    }

    /// Number of `next_f64` calls so far
    pub fn draw_count(&self) -> usize {
        self.draw_count.load(Ordering::SeqCst)
    }

    pub fn push(&self, draw: f64) {
        self.draws.lock().push_back(draw);
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&self) -> f64 {
        self.draw_count.fetch_add(1, Ordering::SeqCst);
        self.draws.lock().pop_front().unwrap_or(self.fallback)
    }

    fn fill_bytes(&self, dest: &mut [u8]) {
        for byte in dest.iter_mut() {
            *byte = (self.byte_counter.fetch_add(1, Ordering::SeqCst) % 256) as u8;
        }
    }
}

/// Lowercase hex string of `len` random bytes
pub fn random_hex(source: &dyn RandomSource, len: usize) -> String {
    let mut bytes = vec![0u8; len];
    source.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
