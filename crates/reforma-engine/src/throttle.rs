use std::thread;
use std::time::{Duration, Instant};

/// Gate called before every vision request.
pub trait Throttle {
    fn wait_turn(&mut self);
}

/// Keeps at least `delay` between the starts of two successive requests. The first
/// request goes through immediately. Nothing here reacts to responses.
#[derive(Debug, Clone)]
pub struct FixedDelayGate {
    delay: Duration,
    last_turn: Option<Instant>,
}

impl FixedDelayGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_turn: None,
        }
    }
}

impl Throttle for FixedDelayGate {
    fn wait_turn(&mut self) {
        if let Some(last) = self.last_turn {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                thread::sleep(self.delay - elapsed);
            }
        }
        self.last_turn = Some(Instant::now());
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoThrottle;

impl Throttle for NoThrottle {
    fn wait_turn(&mut self) {}
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{FixedDelayGate, Throttle};

    #[test]
    fn first_turn_is_immediate_and_next_waits() {
        let mut gate = FixedDelayGate::new(Duration::from_millis(40));
        let started = Instant::now();
        gate.wait_turn();
        assert!(started.elapsed() < Duration::from_millis(40));

        gate.wait_turn();
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn zero_delay_never_sleeps() {
        let mut gate = FixedDelayGate::new(Duration::ZERO);
        let started = Instant::now();
        for _ in 0..5 {
            gate.wait_turn();
        }
        assert!(started.elapsed() < Duration::from_millis(50));
    }
}
