pub mod fixed_point;
#[cfg(feature = "dsp")]
pub mod packed;
pub mod params;
pub mod scalar;

use crate::error::{KernelError, Result};
use log::trace;
use params::MulParams;
use rayon::prelude::*;

/// Elements handled per packed iteration.
pub const GROUP: usize = 4;

/// Success status of one dispatch: which path handled which elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MulSummary {
    /// Groups of four written by the packed path.
    pub packed_groups: usize,
    /// Elements written one at a time by the scalar path.
    pub scalar_tail: usize,
}

impl MulSummary {
    pub fn elements(&self) -> usize { self.packed_groups * GROUP + self.scalar_tail }

    fn merge(self, other: Self) -> Self {
        Self {
            packed_groups: self.packed_groups + other.packed_groups,
            scalar_tail: self.scalar_tail + other.scalar_tail,
        }
    }
}

fn check_buffers(input_1: &[i8], input_2: &[i8], output: &[i8], block_size: usize) -> Result<()> {
    for (arg, len) in [("input_1", input_1.len()), ("input_2", input_2.len()), ("output", output.len())] {
        if len < block_size {
            return Err(KernelError::invalid(arg, format!("holds {len} elements, block size is {block_size}")));
        }
    }
    Ok(())
}

/// Packed groups first, scalar remainder after. Slices are exactly `block_size` long.
fn dispatch(input_1: &[i8], input_2: &[i8], params: &MulParams, output: &mut [i8]) -> MulSummary {
    let n = output.len();

    #[cfg(feature = "dsp")]
    let packed_groups = if packed::offsets_fit_lanes(params) {
        let whole = n / GROUP * GROUP;
        packed::mul_s8_packed(&input_1[..whole], &input_2[..whole], params, &mut output[..whole])
    } else {
        log::debug!(
            "input offsets ({}, {}) overflow 16-bit lanes; using scalar path for {} elements",
            params.input_1_offset, params.input_2_offset, n
        );
        0
    };
    #[cfg(not(feature = "dsp"))]
    let packed_groups = 0;

    let done = packed_groups * GROUP;
    scalar::mul_s8_scalar(&input_1[done..n], &input_2[done..n], params, &mut output[done..n]);
    MulSummary { packed_groups, scalar_tail: n - done }
}

/// Quantized element-wise multiply of the first `block_size` elements.
///
/// Each output is `clamp(requantize((x1 + off1) * (x2 + off2)) + out_offset)`
/// truncated to int8. Elements past `block_size` are left untouched.
/// Input and output buffers must not overlap, which the borrow rules already enforce.
pub fn elementwise_mul_s8(
    input_1: &[i8],
    input_2: &[i8],
    params: &MulParams,
    output: &mut [i8],
    block_size: usize,
) -> Result<MulSummary> {
    params.validate()?;
    check_buffers(input_1, input_2, output, block_size)?;
    trace!("elementwise_mul_s8 block_size={block_size}");
    Ok(dispatch(&input_1[..block_size], &input_2[..block_size], params, &mut output[..block_size]))
}

/// Same result as `elementwise_mul_s8`, with the block split into disjoint chunks across rayon workers.
///
/// `chunk_size` is capped at `block_size` and rounded up to a whole number of groups.
pub fn elementwise_mul_s8_par(
    input_1: &[i8],
    input_2: &[i8],
    params: &MulParams,
    output: &mut [i8],
    block_size: usize,
    chunk_size: usize,
) -> Result<MulSummary> {
    params.validate()?;
    check_buffers(input_1, input_2, output, block_size)?;
    let chunk = chunk_size.clamp(1, block_size.max(1)).div_ceil(GROUP) * GROUP;
    trace!("elementwise_mul_s8_par block_size={block_size} chunk={chunk}");
    let summary = output[..block_size]
        .par_chunks_mut(chunk)
        .enumerate()
        .map(|(i, out)| {
            let start = i * chunk;
            let end = start + out.len();
            dispatch(&input_1[start..end], &input_2[start..end], params, out)
        })
        .reduce(MulSummary::default, MulSummary::merge);
    Ok(summary)
}
