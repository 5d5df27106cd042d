/// Fixed-point rescaling shared by every kernel path. No floats past `quantize_multiplier`.

const Q31_ONE: i64 = 1 << 31;

/// Rounding high half of `2 * a * b`; `i32::MIN * i32::MIN` saturates to `i32::MAX`.
#[inline]
pub fn sat_doubling_high_mult(a: i32, b: i32) -> i32 {
    if a == b && a == i32::MIN {
        return i32::MAX;
    }
    let ab = (a as i64) * (b as i64);
    let nudge: i64 = if ab >= 0 { 1 << 30 } else { 1 - (1 << 30) };
    // |ab| < 2^62 here, so the quotient fits in i32.
    ((ab + nudge) / Q31_ONE) as i32
}

/// Arithmetic right shift by `exponent`, rounding half away from zero. Exponents above 31 act as 31.
#[inline]
pub fn divide_by_power_of_two(dividend: i32, exponent: u32) -> i32 {
    let exponent = exponent.min(31);
    let mask = ((1i64 << exponent) - 1) as i32;
    let remainder = dividend & mask;
    let mut result = dividend >> exponent;
    let mut threshold = mask >> 1;
    if result < 0 {
        threshold += 1;
    }
    if remainder > threshold {
        result += 1;
    }
    result
}

/// Scale `value` by `multiplier * 2^shift` where `multiplier` is a Q31 fraction.
///
/// A positive `shift` left-shifts `value` (saturating) ahead of the high multiply,
/// a negative one is applied afterwards as a rounding right shift.
/// `shift` is clamped to `-31..=31`.
#[inline]
pub fn requantize(value: i32, multiplier: i32, shift: i32) -> i32 {
    let shift = shift.clamp(-31, 31);
    let left = shift.max(0) as u32;
    let right = shift.min(0).unsigned_abs();
    let shifted = if left == 0 {
        value
    } else {
        ((value as i64) << left).clamp(i32::MIN as i64, i32::MAX as i64) as i32
    };
    divide_by_power_of_two(sat_doubling_high_mult(shifted, multiplier), right)
}

/// Encode a positive real scale as `(multiplier, shift)` with the multiplier in `[2^30, 2^31)`.
///
/// Zero and scales too small to represent map to `(0, 0)`. Negative, non-finite
/// or scales needing a shift above 31 yield `None`.
pub fn quantize_multiplier(real: f64) -> Option<(i32, i32)> {
    if !real.is_finite() || real < 0.0 {
        return None;
    }
    if real == 0.0 {
        return Some((0, 0));
    }
    // frexp: real = q * 2^shift with q in [0.5, 1)
    let mut q = real;
    let mut shift = 0i32;
    while q >= 1.0 {
        q /= 2.0;
        shift += 1;
    }
    while q < 0.5 {
        q *= 2.0;
        shift -= 1;
    }
    let mut q_fixed = (q * Q31_ONE as f64).round() as i64;
    if q_fixed == Q31_ONE {
        q_fixed /= 2;
        shift += 1;
    }
    if shift < -31 {
        return Some((0, 0));
    }
    if shift > 31 {
        return None;
    }
    Some((q_fixed as i32, shift))
}
