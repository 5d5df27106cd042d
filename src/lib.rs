// Quantized int8 element-wise multiply for microcontroller inference
pub mod error;
pub mod kernels;

// Re-exports for operator-dispatch callers
pub use error::{KernelError, Result};
pub use kernels::params::{ActivationRange, MulParams};
pub use kernels::{elementwise_mul_s8, elementwise_mul_s8_par, MulSummary};
