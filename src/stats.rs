use serde::{Deserialize, Serialize};

/// Running mean and variance of the samples in one phase bin.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    /// Population statistics; an empty accumulator reports zeros.
    pub fn report(&self) -> AccumulatorReport {
        if self.n_vals == 0 {
            return AccumulatorReport {
                mean: 0.0,
                std_dev: 0.0,
                count: 0,
            };
        }
        AccumulatorReport {
            mean: self.mean,
            std_dev: (self.diff_2_sum / self.n_vals as f64).max(0.0).sqrt(),
            count: self.n_vals,
        }
    }
}
