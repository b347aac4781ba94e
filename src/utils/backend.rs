//! Compile-time backend selection. `tch-gpu` takes priority over `tch-cpu`, which takes
//! priority over the default `ndarray`.

#[cfg(not(any(feature = "ndarray", feature = "tch-cpu", feature = "tch-gpu")))]
compile_error!("enable one of the `ndarray`, `tch-cpu` or `tch-gpu` features");

/// Float element type of the LibTorch backends
#[cfg(all(any(feature = "tch-cpu", feature = "tch-gpu"), feature = "f16"))]
pub type Elem = burn::tensor::f16;

/// Float element type of the LibTorch backends
#[cfg(all(any(feature = "tch-cpu", feature = "tch-gpu"), not(feature = "f16")))]
pub type Elem = f32;

/// The forward-only backend used for inference
#[cfg(any(feature = "tch-cpu", feature = "tch-gpu"))]
pub type Backend = burn::backend::LibTorch<Elem>;

/// The forward-only backend used for inference
#[cfg(not(any(feature = "tch-cpu", feature = "tch-gpu")))]
pub type Backend = burn::backend::NdArray<f32>;

/// The backend used for training
pub type TrainBackend = burn::backend::Autodiff<Backend>;

/// The device type shared by both backends
pub type Device = <Backend as burn::tensor::backend::Backend>::Device;

/// The process-wide compute device
#[cfg(feature = "tch-gpu")]
pub fn device() -> Device {
    burn::backend::libtorch::LibTorchDevice::Cuda(0)
}

/// The process-wide compute device
#[cfg(all(feature = "tch-cpu", not(feature = "tch-gpu")))]
pub fn device() -> Device {
    burn::backend::libtorch::LibTorchDevice::Cpu
}

/// The process-wide compute device
#[cfg(not(any(feature = "tch-cpu", feature = "tch-gpu")))]
pub fn device() -> Device {
    burn::backend::ndarray::NdArrayDevice::Cpu
}

/// A short description of the selected backend for logs
pub fn describe() -> String {
    format!("{:?}", device())
}
