use crate::kernels::fixed_point::requantize;
use crate::kernels::params::MulParams;

/// Rescale one offset-adjusted product into the output domain and clamp it.
///
/// Both the scalar and packed paths finish every element through here.
#[inline]
pub(crate) fn mul_lane(lhs: i32, rhs: i32, params: &MulParams) -> i8 {
    let product = lhs.wrapping_mul(rhs);
    let out = requantize(product, params.out_mult, params.out_shift).wrapping_add(params.out_offset);
    // max-then-min: an inverted range yields `max`
    let clamped = out.max(params.activation.min).min(params.activation.max);
    clamped.clamp(i8::MIN as i32, i8::MAX as i32) as i8
}

/// Reference element-wise multiply over `output.len()` elements.
///
/// Inputs must hold at least as many elements as `output`. `MulParams::validate`
/// is not re-run here: shifts outside `-31..=31` clamp inside `requantize`, and
/// offsets and products wrap in two's complement.
pub fn mul_s8_scalar(input_1: &[i8], input_2: &[i8], params: &MulParams, output: &mut [i8]) {
    for i in 0..output.len() {
        let lhs = (input_1[i] as i32).wrapping_add(params.input_1_offset);
        let rhs = (input_2[i] as i32).wrapping_add(params.input_2_offset);
        output[i] = mul_lane(lhs, rhs, params);
    }
}
