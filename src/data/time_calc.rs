use std::time::Duration;

/// Stages timed for every detection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preprocess = 0,
    Forward = 1,
    Postprocess = 2,
}

/// Running totals of per-stage durations across detection cycles.
#[derive(Debug, Default, Clone)]
pub struct TimeCalc {
    n: usize,
    duration: Vec<Duration>,
}

impl TimeCalc {
    /// Number of completed cycles.
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn total(&self) -> Duration {
        self.duration.iter().sum::<Duration>()
    }

    /// Average full-cycle time, zero before the first cycle.
    pub fn avg(&self) -> Duration {
        if self.n == 0 {
            return Duration::ZERO;
        }
        self.total() / self.n as u32
    }

    pub fn avg_stage(&self, stage: Stage) -> Duration {
        match self.duration.get(stage as usize) {
            Some(d) if self.n > 0 => *d / self.n as u32,
            _ => Duration::ZERO,
        }
    }

    pub fn add(&mut self, stage: Stage, x: Duration) {
        let i = stage as usize;
        if self.duration.len() <= i {
            self.duration.resize(i + 1, Duration::ZERO);
        }
        self.duration[i] += x;
    }

    pub fn finish_cycle(&mut self) {
        self.n += 1;
    }
}
