//! Serial numbers for issued certificates.
//!
//! A serial is 16 bytes: an 8-byte process-local counter followed by 8 bytes
//! from the OS random source. The counter is seeded from the wall clock on
//! first use and only moves forward, so two serials drawn by one process never
//! collide, and the random half separates serials drawn by different
//! processes that happen to share a counter value.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand_core::{OsRng, RngCore};

use crate::error::Result;

pub const SERIAL_LEN: usize = 16;

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_counter() -> u64 {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(1);
    let mut current = COUNTER.load(Ordering::Relaxed);
    loop {
        let next = current.max(seed).wrapping_add(1).max(1);
        match COUNTER.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => current = actual,
        }
    }
}

/// Draws a fresh positive, non-zero serial number.
pub fn generate() -> Result<[u8; SERIAL_LEN]> {
    let mut serial = [0u8; SERIAL_LEN];
    serial[..8].copy_from_slice(&next_counter().to_be_bytes());
    OsRng.try_fill_bytes(&mut serial[8..])?;
    // keep the INTEGER positive without a leading pad byte
    serial[0] &= 0x7f;
    if serial.iter().all(|b| *b == 0) {
        serial[SERIAL_LEN - 1] = 1;
    }
    Ok(serial)
}
