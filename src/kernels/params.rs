use crate::error::{KernelError, Result};
use crate::kernels::fixed_point::quantize_multiplier;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest shift magnitude `requantize` accepts in either direction.
pub const MAX_SHIFT: i32 = 31;

/// Inclusive output clamp applied after rescaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRange {
    pub min: i32,
    pub max: i32,
}

impl ActivationRange {
    pub fn new(min: i32, max: i32) -> Self { Self { min, max } }

    /// The whole int8 range, i.e. no fused activation.
    pub fn full() -> Self { Self { min: i8::MIN as i32, max: i8::MAX as i32 } }

    /// Fused ReLU: everything below the output zero point is clipped.
    pub fn relu(out_offset: i32) -> Self {
        Self { min: out_offset.max(i8::MIN as i32), max: i8::MAX as i32 }
    }

    /// Range the stored int8 values can actually reach.
    pub fn effective(&self) -> (i8, i8) {
        let lo = self.min.clamp(i8::MIN as i32, i8::MAX as i32) as i8;
        let hi = self.max.clamp(i8::MIN as i32, i8::MAX as i32) as i8;
        (lo, hi)
    }
}

impl Default for ActivationRange {
    fn default() -> Self { Self::full() }
}

/// Quantization parameters for one element-wise multiply node.
///
/// `out_mult`/`out_shift` encode the real rescale `s1 * s2 / s_out`
/// as `out_mult * 2^(out_shift - 31)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MulParams {
    pub input_1_offset: i32,
    pub input_2_offset: i32,
    pub out_offset: i32,
    pub out_mult: i32,
    pub out_shift: i32,
    #[serde(default)]
    pub activation: ActivationRange,
}

impl Default for MulParams {
    /// Unity scale, zero offsets, full int8 range.
    fn default() -> Self {
        Self {
            input_1_offset: 0,
            input_2_offset: 0,
            out_offset: 0,
            out_mult: i32::MAX,
            out_shift: 0,
            activation: ActivationRange::full(),
        }
    }
}

impl MulParams {
    /// Build parameters from tensor scales and zero points.
    pub fn from_scales(
        input_1_scale: f64,
        input_1_zero_point: i32,
        input_2_scale: f64,
        input_2_zero_point: i32,
        output_scale: f64,
        output_zero_point: i32,
    ) -> Result<Self> {
        if !(output_scale > 0.0) {
            return Err(KernelError::invalid("output_scale", format!("must be positive, got {output_scale}")));
        }
        let real = input_1_scale * input_2_scale / output_scale;
        let (out_mult, out_shift) = quantize_multiplier(real)
            .ok_or_else(|| KernelError::invalid("scale", format!("rescale factor {real} is not representable")))?;
        let input_1_offset = input_1_zero_point
            .checked_neg()
            .ok_or_else(|| KernelError::invalid("input_1_zero_point", format!("{input_1_zero_point} has no offset")))?;
        let input_2_offset = input_2_zero_point
            .checked_neg()
            .ok_or_else(|| KernelError::invalid("input_2_zero_point", format!("{input_2_zero_point} has no offset")))?;
        Ok(Self {
            input_1_offset,
            input_2_offset,
            out_offset: output_zero_point,
            out_mult,
            out_shift,
            activation: ActivationRange::full(),
        })
    }

    pub fn with_activation(mut self, activation: ActivationRange) -> Self {
        self.activation = activation;
        self
    }

    /// Checks the kernel relies on; buffer sizes are checked by the dispatcher.
    pub fn validate(&self) -> Result<()> {
        if !(-MAX_SHIFT..=MAX_SHIFT).contains(&self.out_shift) {
            return Err(KernelError::invalid(
                "out_shift",
                format!("{} outside [-{MAX_SHIFT}, {MAX_SHIFT}]", self.out_shift),
            ));
        }
        if self.activation.min > self.activation.max {
            return Err(KernelError::invalid(
                "activation",
                format!("min {} greater than max {}", self.activation.min, self.activation.max),
            ));
        }
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| KernelError::Config { reason: format!("read {}: {e}", path.display()) })?;
        let params: Self = serde_json::from_str(&text)
            .map_err(|e| KernelError::Config { reason: format!("parse {}: {e}", path.display()) })?;
        params.validate()?;
        Ok(params)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| KernelError::Config { reason: format!("serialize params: {e}") })?;
        std::fs::write(path, text)
            .map_err(|e| KernelError::Config { reason: format!("write {}: {e}", path.display()) })
    }
}
