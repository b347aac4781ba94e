use burn::{
    lr_scheduler::{
        linear::{LinearLrScheduler, LinearLrSchedulerConfig},
        LrScheduler,
    },
    tensor::backend::Backend,
    LearningRate,
};

/// One linear segment of the schedule. The first step yields the initial rate.
#[derive(Clone, Copy, Debug)]
struct Segment {
    initial: LearningRate,
    scheduler: LinearLrScheduler,
    taken: usize,
}

impl Segment {
    fn new(initial: LearningRate, last: LearningRate, num_iters: usize) -> Self {
        Self {
            initial,
            scheduler: LinearLrSchedulerConfig::new(initial, last, num_iters.max(1)).init(),
            taken: 0,
        }
    }

    fn step<B: Backend>(&mut self) -> LearningRate {
        self.taken += 1;

        if self.taken == 1 {
            self.initial
        } else {
            LrScheduler::<B>::step(&mut self.scheduler)
        }
    }
}

/// Linear warmup up to the base rate, then linear decay to zero at `total_steps`.
///
/// Without warmup, step `k` of `total_steps` (counting from zero) uses
/// `base * (total_steps - k) / total_steps`. With `warmup_steps` of warmup, step `k` uses
/// `base * (k + 1) / warmup_steps` until the base rate is reached.
#[derive(Clone, Copy, Debug)]
pub struct WarmupLinearDecay {
    warmup: Option<Segment>,
    warmup_steps: usize,
    decay: Segment,
    taken: usize,
}

impl WarmupLinearDecay {
    /// Create a schedule over `total_steps` optimizer steps.
    ///
    /// # Panics
    ///
    /// If `base` is not in `(0, 1]`.
    pub fn new(base: LearningRate, warmup_steps: usize, total_steps: usize) -> Self {
        let warmup = (warmup_steps > 0)
            .then(|| Segment::new(base / warmup_steps as f64, base, warmup_steps - 1));

        Self {
            warmup,
            warmup_steps,
            decay: Segment::new(base, 0.0, total_steps.saturating_sub(warmup_steps)),
            taken: 0,
        }
    }

    /// Returns the rate for the next optimizer step
    pub fn step<B: Backend>(&mut self) -> LearningRate {
        self.taken += 1;

        match self.warmup.as_mut() {
            Some(warmup) if self.taken <= self.warmup_steps => warmup.step::<B>(),
            _ => self.decay.step::<B>(),
        }
    }

    /// The number of steps taken so far
    pub fn steps_taken(&self) -> usize {
        self.taken
    }
}
