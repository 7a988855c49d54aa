//! Rotary encoder tracking with burst detection.
//!
//! The hardware (QDEC peripheral or a GPIO decoder) maintains a raw
//! position counter and raises a [`TransitionSignal`] from interrupt
//! context whenever it moves.  Signals coalesce: the tracker only learns
//! that *something* happened since the previous [`EncoderTracker::update`],
//! reads the counter once and applies a single step in the direction of
//! travel.
//!
//! ## Step size
//!
//! With fast stepping enabled every applied transition stamps the
//! current time into a ring of `K` slots.  Once the ring has wrapped,
//! the slot about to be overwritten holds the oldest stamp, and the
//! step is [`FAST_STEP`] when that stamp is at most the window old
//! (`K` transitions inside the window).  Before the first wrap the
//! ring only approximates this: the step turns fast once `K - 1`
//! stamps are present and the first of them is inside the window, one
//! transition earlier than the steady-state rule.
//!
//! ## Clamping
//!
//! The logical value always lies in `[min, max]`, and the raw counter
//! is rewritten to the logical value whenever they differ, so hardware
//! and logical state never drift apart at the limits.

use core::sync::atomic::{AtomicI32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::config::{
    DYNAMIC_STEP_TRIG, DYNAMIC_STEP_WINDOW_MS, ENCODER_DEFAULT_MAX, ENCODER_DEFAULT_MIN,
    FAST_STEP, SLOW_STEP,
};

/// Raised from interrupt context on every hardware transition.
pub type TransitionSignal = Signal<CriticalSectionRawMutex, ()>;

/// Raw position counter maintained by the quadrature decoder.
pub trait EncoderCounter {
    fn count(&self) -> i32;
    fn set_count(&mut self, count: i32);
}

/// A counter shared with the interrupt handler that accumulates decoder
/// output.
impl EncoderCounter for &AtomicI32 {
    fn count(&self) -> i32 {
        self.load(Ordering::Relaxed)
    }

    fn set_count(&mut self, count: i32) {
        self.store(count, Ordering::Relaxed)
    }
}

pub struct EncoderTracker<'a, C: EncoderCounter, const K: usize = DYNAMIC_STEP_TRIG> {
    counter: C,
    pending: &'a TransitionSignal,

    /// Logical value; also the last value read from (or written to) the
    /// counter.
    value: i32,
    min: i32,
    max: i32,

    invert: bool,
    fast_step: bool,

    /// Transition timestamps (ms), written round-robin.
    history: [u64; K],
    index: usize,
    history_filled: bool,

    changed: bool,
    forced_changed: bool,
}

impl<'a, C: EncoderCounter, const K: usize> EncoderTracker<'a, C, K> {
    /// Wrap `counter`, resetting it to 0 with the default range.
    pub fn new(counter: C, pending: &'a TransitionSignal) -> Self {
        let mut tracker = Self {
            counter,
            pending,
            value: 0,
            min: ENCODER_DEFAULT_MIN,
            max: ENCODER_DEFAULT_MAX,
            invert: false,
            fast_step: false,
            history: [0; K],
            index: 0,
            history_filled: false,
            changed: false,
            forced_changed: false,
        };
        tracker.counter.set_count(0);
        tracker
    }

    /// Process transitions since the previous call.
    ///
    /// Returns the applied change of the logical value (0 when nothing
    /// moved or the value is pinned at a limit).
    pub fn update(&mut self, now_ms: u64) -> i32 {
        if self.pending.try_take().is_none() {
            self.changed = false;
            return 0;
        }

        let raw = self.counter.count();
        if raw == self.value {
            // Woken without net movement.
            self.changed = false;
            return 0;
        }

        let forward = (raw > self.value) != self.invert;
        let step = self.step_size(now_ms);
        let delta = if forward { step } else { -step };

        let old = self.value;
        let new = old.saturating_add(delta).clamp(self.min, self.max);
        if raw != new {
            self.counter.set_count(new);
        }
        self.value = new;
        self.changed = new != old;
        new - old
    }

    fn step_size(&mut self, now_ms: u64) -> i32 {
        if !self.fast_step {
            return SLOW_STEP;
        }

        self.history[self.index] = now_ms;
        self.index += 1;
        if self.index >= K {
            self.index = 0;
            self.history_filled = true;
        }

        let fast = if self.history_filled {
            // The next slot to be overwritten is the oldest stamp.
            now_ms.saturating_sub(self.history[self.index]) <= DYNAMIC_STEP_WINDOW_MS
        } else {
            self.index >= K - 1 && now_ms.saturating_sub(self.history[0]) <= DYNAMIC_STEP_WINDOW_MS
        };

        if fast {
            trace!("encoder fast step at {} ms", now_ms);
            FAST_STEP
        } else {
            SLOW_STEP
        }
    }

    /// Set the logical value (clamped) and write it through to the counter.
    ///
    /// `force` marks the tracker as changed even if the value is the same,
    /// so the UI redraws on the next tick.
    pub fn set_value(&mut self, value: i32, force: bool) {
        self.value = value.clamp(self.min, self.max);
        self.counter.set_count(self.value);
        self.forced_changed = force;
    }

    /// Set the lower bound. Raising it above `max` raises `max` too.
    pub fn set_min(&mut self, min: i32) {
        self.min = min;
        if self.max < min {
            self.max = min;
        }
        self.reclamp();
    }

    /// Set the upper bound. Lowering it below `min` lowers `min` too.
    pub fn set_max(&mut self, max: i32) {
        self.max = max;
        if self.min > max {
            self.min = max;
        }
        self.reclamp();
    }

    /// Set bounds and value in one go.
    pub fn set_range(&mut self, value: i32, min: i32, max: i32, force: bool) {
        self.min = min;
        self.max = max.max(min);
        self.set_value(value, force);
    }

    fn reclamp(&mut self) {
        if self.value < self.min || self.value > self.max {
            self.set_value(self.value, true);
        }
    }

    pub fn set_invert(&mut self, invert: bool) {
        self.invert = invert;
    }

    pub fn set_fast_step(&mut self, enable: bool) {
        self.fast_step = enable;
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// Moved by the last `update`, or forced by `set_value`.
    pub fn has_changed(&self) -> bool {
        self.changed || self.forced_changed
    }

    /// Consume the change flags once the caller has reacted to them.
    pub fn acknowledge(&mut self) {
        self.changed = false;
        self.forced_changed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ════════════════════════════════════════════════════════════════════════
    // Helpers
    // ════════════════════════════════════════════════════════════════════════

    /// One detent on the hardware side: move the raw counter and raise the
    /// interrupt signal.
    fn turn(raw: &AtomicI32, signal: &TransitionSignal, steps: i32) {
        raw.fetch_add(steps, Ordering::Relaxed);
        signal.signal(());
    }

    fn fast_tracker<'a>(
        raw: &'a AtomicI32,
        signal: &'a TransitionSignal,
    ) -> EncoderTracker<'a, &'a AtomicI32> {
        let mut enc = EncoderTracker::new(raw, signal);
        enc.set_range(0, -1000, 1000, false);
        enc.set_fast_step(true);
        enc
    }

    // ════════════════════════════════════════════════════════════════════════
    // Basic movement
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn no_pending_transition_is_a_noop() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = EncoderTracker::<_>::new(&raw, &signal);

        // Counter moved but no signal raised: ignored.
        raw.store(5, Ordering::Relaxed);
        assert_eq!(enc.update(0), 0);
        assert!(!enc.has_changed());
        assert_eq!(enc.value(), 0);
    }

    #[test]
    fn spurious_wake_without_movement_clears_changed() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = EncoderTracker::<_>::new(&raw, &signal);

        turn(&raw, &signal, 1);
        assert_eq!(enc.update(0), 1);
        assert!(enc.has_changed());

        signal.signal(());
        assert_eq!(enc.update(10), 0);
        assert!(!enc.has_changed());
    }

    #[test]
    fn slow_steps_follow_direction() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = EncoderTracker::<_>::new(&raw, &signal);

        turn(&raw, &signal, 1);
        assert_eq!(enc.update(0), 1);
        turn(&raw, &signal, -1);
        assert_eq!(enc.update(300), -1);
        turn(&raw, &signal, -1);
        assert_eq!(enc.update(600), -1);
        assert_eq!(enc.value(), -1);
        assert_eq!(raw.load(Ordering::Relaxed), -1);
    }

    #[test]
    fn coalesced_transitions_apply_one_step() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = EncoderTracker::<_>::new(&raw, &signal);

        turn(&raw, &signal, 1);
        turn(&raw, &signal, 1);
        turn(&raw, &signal, 1);
        assert_eq!(enc.update(0), 1);
        // Counter resynchronised to the logical value.
        assert_eq!(raw.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn invert_flips_direction() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = EncoderTracker::<_>::new(&raw, &signal);
        enc.set_invert(true);

        turn(&raw, &signal, 1);
        assert_eq!(enc.update(0), -1);
        assert_eq!(raw.load(Ordering::Relaxed), -1);

        turn(&raw, &signal, -1);
        assert_eq!(enc.update(500), 1);
        assert_eq!(enc.value(), 0);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Clamping
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn value_pins_at_max_and_counter_follows() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = EncoderTracker::<_>::new(&raw, &signal);
        enc.set_range(99, 0, 100, false);

        turn(&raw, &signal, 1);
        assert_eq!(enc.update(0), 1);
        turn(&raw, &signal, 1);
        assert_eq!(enc.update(500), 0);
        assert!(!enc.has_changed());
        assert_eq!(enc.value(), 100);
        assert_eq!(raw.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn set_value_clamps_and_writes_through() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = EncoderTracker::<_>::new(&raw, &signal);
        enc.set_range(0, 0, 100, false);

        enc.set_value(250, true);
        assert_eq!(enc.value(), 100);
        assert_eq!(raw.load(Ordering::Relaxed), 100);
        assert!(enc.has_changed());

        enc.acknowledge();
        assert!(!enc.has_changed());

        enc.set_value(-3, false);
        assert_eq!(enc.value(), 0);
        assert!(!enc.has_changed());
    }

    #[test]
    fn moving_bounds_reclamps_value() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = EncoderTracker::<_>::new(&raw, &signal);
        enc.set_value(50, false);

        enc.set_max(20);
        assert_eq!(enc.value(), 20);
        assert_eq!(raw.load(Ordering::Relaxed), 20);
        assert!(enc.has_changed());

        enc.set_min(30);
        assert_eq!(enc.min(), 30);
        assert_eq!(enc.max(), 30);
        assert_eq!(enc.value(), 30);

        enc.set_max(-10);
        assert_eq!(enc.min(), -10);
        assert_eq!(enc.value(), -10);
    }

    #[test]
    fn bounds_inside_range_leave_value_alone() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = EncoderTracker::<_>::new(&raw, &signal);
        enc.set_value(5, false);
        enc.set_min(0);
        enc.set_max(10);
        assert_eq!(enc.value(), 5);
        assert!(!enc.has_changed());
    }

    #[test]
    fn value_and_counter_stay_in_range_under_random_input() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = fast_tracker(&raw, &signal);
        enc.set_range(0, -50, 50, false);

        // Deterministic LCG so failures are reproducible.
        let mut seed: u32 = 0x1234_5678;
        let mut next = move || {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            seed >> 8
        };

        let mut now = 0u64;
        for _ in 0..5_000 {
            now += u64::from(next() % 60);
            match next() % 8 {
                0 => enc.set_value((next() % 200) as i32 - 100, false),
                1 => {
                    signal.signal(());
                    enc.update(now);
                }
                n => {
                    let dir = if n % 2 == 0 { 1 } else { -1 };
                    turn(&raw, &signal, dir * (1 + (next() % 3) as i32));
                    enc.update(now);
                }
            }
            assert!((-50..=50).contains(&enc.value()));
            assert_eq!(raw.load(Ordering::Relaxed), enc.value());
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Burst detection
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn fast_step_disabled_always_slow() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = EncoderTracker::<_>::new(&raw, &signal);

        for t in 0..10 {
            turn(&raw, &signal, 1);
            assert_eq!(enc.update(t * 5), SLOW_STEP);
        }
    }

    #[test]
    fn rapid_burst_switches_to_fast_step() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = fast_tracker(&raw, &signal);

        let mut deltas = [0; 10];
        for (i, delta) in deltas.iter_mut().enumerate() {
            turn(&raw, &signal, 1);
            *delta = enc.update(i as u64 * 20);
        }

        // K - 1 = 5 stamps inside the window trip the bootstrap rule.
        assert_eq!(deltas[..4], [1, 1, 1, 1]);
        assert!(deltas[4..].iter().all(|&d| d == FAST_STEP));
        assert_eq!(deltas[9], 20);
    }

    #[test]
    fn slow_rotation_stays_on_slow_step() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = fast_tracker(&raw, &signal);

        // Ten transitions spread over two seconds.
        for i in 0..10u64 {
            turn(&raw, &signal, 1);
            assert_eq!(enc.update(i * 222), SLOW_STEP);
        }
        assert_eq!(enc.value(), 10);
    }

    #[test]
    fn full_ring_inside_window_is_fast() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = fast_tracker(&raw, &signal);

        // Fill the ring slowly so it has wrapped once.
        for i in 0..6u64 {
            turn(&raw, &signal, 1);
            enc.update(i * 1000);
        }
        // Six quick transitions: the sixth sees all K stamps in the window.
        let base = 10_000;
        let mut last = 0;
        for i in 0..6u64 {
            turn(&raw, &signal, 1);
            last = enc.update(base + i * 30);
        }
        assert_eq!(last, FAST_STEP);
    }

    #[test]
    fn full_ring_spread_beyond_window_is_slow() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = fast_tracker(&raw, &signal);

        // Every transition 41 ms apart: K stamps span 205 ms > 200 ms.
        let mut deltas = std::vec::Vec::new();
        for i in 0..12u64 {
            turn(&raw, &signal, 1);
            deltas.push(enc.update(i * 41));
        }
        // Steady state (after the wrap at transition 6) never goes fast.
        assert!(deltas[6..].iter().all(|&d| d == SLOW_STEP));
    }

    #[test]
    fn ring_compares_against_the_slot_after_the_newest() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = fast_tracker(&raw, &signal);

        // Stamps 0, 1000, 1100, 1150, 1175, 1190 -> ring wraps on the sixth.
        for t in [0u64, 1000, 1100, 1150, 1175, 1190] {
            turn(&raw, &signal, 1);
            enc.update(t);
        }
        // Seventh at 1199: oldest remaining stamp is 1000 (199 ms ago).
        turn(&raw, &signal, 1);
        assert_eq!(enc.update(1199), FAST_STEP);
        // Eighth at 1301: oldest is now 1100 (201 ms ago).
        turn(&raw, &signal, 1);
        assert_eq!(enc.update(1301), SLOW_STEP);
    }

    #[test]
    fn fast_step_is_clamped() {
        let raw = AtomicI32::new(0);
        let signal = TransitionSignal::new();
        let mut enc = fast_tracker(&raw, &signal);
        enc.set_range(0, 0, 30, false);

        let mut last = 0;
        for i in 0..10u64 {
            turn(&raw, &signal, 1);
            last = enc.update(i * 10);
        }
        assert_eq!(enc.value(), 30);
        assert_eq!(last, 0);
        assert_eq!(raw.load(Ordering::Relaxed), 30);
    }
}
