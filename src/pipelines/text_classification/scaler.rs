use burn::{
    module::{AutodiffModule, ModuleVisitor, ParamId},
    optim::GradientsParams,
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion, Tensor,
    },
};

/// Dynamic loss scaling for reduced-precision training.
///
/// The loss is multiplied by the current scale before back-propagation so small gradients
/// survive half precision, and the gradients are divided by it again before the optimizer
/// step. A step whose gradients overflow is skipped and the scale is halved; after
/// `growth_interval` consecutive finite steps the scale doubles.
#[derive(Clone, Debug)]
pub struct GradScaler {
    scale: f32,
    growth_factor: f32,
    backoff_factor: f32,
    growth_interval: usize,
    finite_steps: usize,
}

impl Default for GradScaler {
    fn default() -> Self {
        Self::new(65536.0, 2.0, 0.5, 2000)
    }
}

impl GradScaler {
    /// Create a scaler with an explicit policy
    pub fn new(scale: f32, growth_factor: f32, backoff_factor: f32, growth_interval: usize) -> Self {
        Self {
            scale,
            growth_factor,
            backoff_factor,
            growth_interval,
            finite_steps: 0,
        }
    }

    /// The current loss scale
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Multiply a loss by the current scale
    pub fn scale_loss<B: Backend>(&self, loss: Tensor<B, 1>) -> Tensor<B, 1> {
        loss.mul_scalar(self.scale)
    }

    /// Divide every gradient of the module by the current scale, in place. Returns `false` when
    /// any gradient holds an infinite or NaN value.
    pub fn unscale<B, M>(&self, module: &M, grads: &mut GradientsParams) -> bool
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
    {
        let mut unscaler = Unscaler::<B> {
            grads,
            inv_scale: 1.0 / self.scale,
            total: None,
        };

        module.visit(&mut unscaler);

        unscaler
            .total
            .map(|total| total.into_scalar().elem::<f32>().is_finite())
            .unwrap_or(true)
    }

    /// Adjust the scale after a step
    pub fn update(&mut self, finite: bool) {
        if finite {
            self.finite_steps += 1;

            if self.finite_steps >= self.growth_interval {
                self.scale *= self.growth_factor;
                self.finite_steps = 0;
            }
        } else {
            self.scale *= self.backoff_factor;
            self.finite_steps = 0;
        }
    }
}

/// Visits every float parameter, rescaling its gradient and summing all gradient values
struct Unscaler<'a, B: AutodiffBackend> {
    grads: &'a mut GradientsParams,
    inv_scale: f32,
    total: Option<Tensor<B::InnerBackend, 1>>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for Unscaler<'_, B> {
    fn visit_float<const D: usize>(&mut self, id: &ParamId, _tensor: &Tensor<B, D>) {
        let Some(grad) = self.grads.remove::<B::InnerBackend, D>(id) else {
            return;
        };

        let grad = grad.mul_scalar(self.inv_scale);

        // A single overflow anywhere turns the running sum into inf or NaN
        let sum = grad.clone().sum();
        self.total = Some(match self.total.take() {
            Some(total) => total + sum,
            None => sum,
        });

        self.grads.register::<B::InnerBackend, D>(id.clone(), grad);
    }
}

#[cfg(test)]
mod tests {
    use burn::{
        backend::{Autodiff, NdArray},
        module::Module,
        nn::{Linear, LinearConfig},
        tensor::Data,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    type B = Autodiff<NdArray<f32>>;

    #[derive(Module, Debug)]
    struct Weights<B: Backend> {
        linear: Linear<B>,
    }

    fn weights(device: &<B as Backend>::Device) -> Weights<B> {
        Weights {
            linear: LinearConfig::new(2, 1).init(device),
        }
    }

    fn gradients(module: &Weights<B>, loss: Tensor<B, 1>) -> GradientsParams {
        GradientsParams::from_grads(loss.backward(), module)
    }

    /// Drains every parameter gradient into flat vectors, in visiting order
    struct Drain<'a> {
        grads: &'a mut GradientsParams,
        values: Vec<Vec<f32>>,
    }

    impl ModuleVisitor<B> for Drain<'_> {
        fn visit_float<const D: usize>(&mut self, id: &ParamId, _tensor: &Tensor<B, D>) {
            if let Some(grad) = self.grads.remove::<NdArray<f32>, D>(id) {
                self.values.push(grad.into_data().value);
            }
        }
    }

    fn drain(module: &Weights<B>, grads: &mut GradientsParams) -> Vec<Vec<f32>> {
        let mut drain = Drain {
            grads,
            values: Vec::new(),
        };
        module.visit(&mut drain);

        drain.values
    }

    #[test]
    fn unscaled_gradients_match_unscaled_loss() {
        let device = Default::default();
        let module = weights(&device);
        let input = Tensor::<B, 2>::from_data(Data::from([[1.0, 2.0]]), &device);
        let scaler = GradScaler::new(1024.0, 2.0, 0.5, 10);

        let loss = module.linear.forward(input.clone()).sum();
        let mut expected = gradients(&module, loss);

        let loss = module.linear.forward(input).sum();
        let mut scaled = gradients(&module, scaler.scale_loss(loss));

        assert!(scaler.unscale(&module, &mut scaled));

        let expected = drain(&module, &mut expected);
        let unscaled = drain(&module, &mut scaled);

        assert_eq!(expected.len(), 2);
        assert_eq!(unscaled, expected);
    }

    #[test]
    fn overflow_is_detected() {
        let device = Default::default();
        let module = weights(&device);
        let input = Tensor::<B, 2>::from_data(Data::from([[f32::MAX, f32::MAX]]), &device);
        let scaler = GradScaler::new(1024.0, 2.0, 0.5, 10);

        let loss = module.linear.forward(input).sum();
        let mut grads = gradients(&module, scaler.scale_loss(loss));

        assert!(!scaler.unscale(&module, &mut grads));
    }

    #[test]
    fn scale_backs_off_and_grows() {
        let mut scaler = GradScaler::new(8.0, 2.0, 0.5, 2);

        scaler.update(false);
        assert_eq!(scaler.scale(), 4.0);

        scaler.update(true);
        assert_eq!(scaler.scale(), 4.0);
        scaler.update(true);
        assert_eq!(scaler.scale(), 8.0);

        scaler.update(true);
        scaler.update(false);
        assert_eq!(scaler.scale(), 4.0);
    }
}
