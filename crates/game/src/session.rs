//! Round bookkeeping: score and countdown timer.

use log::info;

/// Receives one notification per successful cut. The sink is handed to the
/// cut reaction explicitly so nothing reaches into global game state.
pub trait ScoreSink {
    fn increment(&mut self);
}

/// A timed round with a score counter.
#[derive(Debug)]
pub struct Round {
    score: u32,
    time_remaining: f32,
    duration: f32,
    running: bool,
}

impl Round {
    pub fn new(duration: f32) -> Self {
        Self {
            score: 0,
            time_remaining: duration,
            duration,
            running: false,
        }
    }

    /// Reset score and clock and start the round.
    pub fn start(&mut self) {
        self.score = 0;
        self.time_remaining = self.duration;
        self.running = true;
        info!("round started ({:.0}s)", self.duration);
    }

    /// Stop the round. Further scoring becomes a no-op.
    pub fn end(&mut self) {
        self.running = false;
        self.time_remaining = 0.0;
        info!("round over, final score {}", self.score);
    }

    /// Count the round clock down; ends the round when it reaches zero.
    pub fn update(&mut self, dt: f32) {
        if !self.running {
            return;
        }
        self.time_remaining -= dt;
        if self.time_remaining <= 0.0 {
            self.end();
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_remaining(&self) -> f32 {
        self.time_remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl ScoreSink for Round {
    fn increment(&mut self) {
        // Scoring after the round has ended is silently dropped.
        if !self.running {
            return;
        }
        self.score += 1;
        info!("score: {}", self.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoring_after_end_is_a_no_op() {
        let mut round = Round::new(60.0);
        round.start();
        round.increment();
        round.increment();
        assert_eq!(round.score(), 2);

        round.end();
        round.increment();
        assert_eq!(round.score(), 2);
    }

    #[test]
    fn clock_counts_down_and_ends_the_round() {
        let mut round = Round::new(1.0);
        round.start();
        for _ in 0..49 {
            round.update(0.02);
        }
        assert!(round.is_running());
        round.update(0.02);
        assert!(!round.is_running());
        assert_eq!(round.time_remaining(), 0.0);
    }

    #[test]
    fn update_before_start_does_nothing() {
        let mut round = Round::new(5.0);
        round.update(100.0);
        assert!(!round.is_running());
        assert!((round.time_remaining() - 5.0).abs() < 1e-6);
    }
}
