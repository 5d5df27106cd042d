//! Packed 16-bit lane path: four elements per iteration in two 32-bit words per input.
//!
//! Mirrors the DSP-extension register layout of Cortex-M cores. Every lane is
//! finished by the same `mul_lane` as the scalar path, so output is byte-identical.

use crate::kernels::params::MulParams;
use crate::kernels::scalar::mul_lane;

/// Input offsets within this range keep `i8 + offset` inside an `i16` lane.
const LANE_OFFSET_MIN: i32 = i16::MIN as i32 - i8::MIN as i32;
const LANE_OFFSET_MAX: i32 = i16::MAX as i32 - i8::MAX as i32;

/// Whether both input offsets survive the 16-bit lane add without saturating.
#[inline]
pub fn offsets_fit_lanes(params: &MulParams) -> bool {
    let fits = |o: i32| (LANE_OFFSET_MIN..=LANE_OFFSET_MAX).contains(&o);
    fits(params.input_1_offset) && fits(params.input_2_offset)
}

/// Sign-extend bytes 0 and 2 of `word` into the low and high half-words.
#[inline]
fn sxtb16(word: u32) -> u32 {
    let lo = word as u8 as i8 as i16 as u16 as u32;
    let hi = (word >> 16) as u8 as i8 as i16 as u16 as u32;
    lo | (hi << 16)
}

/// Load four bytes and split them into `(lanes 0 & 2, lanes 1 & 3)`.
#[inline]
pub fn read_and_pad_reordered(bytes: [i8; 4]) -> (u32, u32) {
    let word = u32::from_le_bytes(bytes.map(|b| b as u8));
    (sxtb16(word), sxtb16(word.rotate_right(8)))
}

/// Lane-wise saturating add of two packed `i16` pairs.
#[inline]
pub fn sadd16(a: u32, b: u32) -> u32 {
    let lo = lane_lo(a).saturating_add(lane_lo(b));
    let hi = lane_hi(a).saturating_add(lane_hi(b));
    (lo as u16 as u32) | ((hi as u16 as u32) << 16)
}

/// Replicate the low 16 bits of `offset` into both lanes.
#[inline]
pub fn pack_offset(offset: i32) -> u32 {
    let half = offset as u16 as u32;
    (half << 16) | half
}

#[inline]
fn lane_lo(word: u32) -> i16 { word as u16 as i16 }

#[inline]
fn lane_hi(word: u32) -> i16 { (word >> 16) as u16 as i16 }

/// Pack four bytes, first argument in the lowest byte.
#[inline]
pub fn pack_q7x4(r1: i8, r2: i8, r3: i8, r4: i8) -> u32 {
    u32::from_le_bytes([r1 as u8, r2 as u8, r3 as u8, r4 as u8])
}

#[inline]
fn load_q7x4(src: &[i8]) -> [i8; 4] { [src[0], src[1], src[2], src[3]] }

/// Process `output.len() / 4` whole groups and return how many were written.
///
/// Callers must check `offsets_fit_lanes` first; otherwise the lane add
/// saturates where the scalar path would not.
pub fn mul_s8_packed(input_1: &[i8], input_2: &[i8], params: &MulParams, output: &mut [i8]) -> usize {
    let offset_1 = pack_offset(params.input_1_offset);
    let offset_2 = pack_offset(params.input_2_offset);
    let groups = output.len() / 4;

    for g in 0..groups {
        let base = g * 4;
        let (b_1, a_1) = read_and_pad_reordered(load_q7x4(&input_1[base..]));
        let (b_2, a_2) = read_and_pad_reordered(load_q7x4(&input_2[base..]));

        let a_1 = sadd16(a_1, offset_1);
        let b_1 = sadd16(b_1, offset_1);
        let a_2 = sadd16(a_2, offset_2);
        let b_2 = sadd16(b_2, offset_2);

        // lane order 0, 2, 1, 3 follows the sign-extension layout
        let r1 = mul_lane(lane_lo(b_1) as i32, lane_lo(b_2) as i32, params);
        let r3 = mul_lane(lane_hi(b_1) as i32, lane_hi(b_2) as i32, params);
        let r2 = mul_lane(lane_lo(a_1) as i32, lane_lo(a_2) as i32, params);
        let r4 = mul_lane(lane_hi(a_1) as i32, lane_hi(a_2) as i32, params);

        let packed = pack_q7x4(r1, r2, r3, r4).to_le_bytes();
        for (dst, byte) in output[base..base + 4].iter_mut().zip(packed) {
            *dst = byte as i8;
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::scalar::mul_s8_scalar;

    #[test]
    fn reordered_load_splits_even_and_odd_lanes() {
        let (even, odd) = read_and_pad_reordered([1, -2, 3, -4]);
        assert_eq!((lane_lo(even), lane_hi(even)), (1, 3));
        assert_eq!((lane_lo(odd), lane_hi(odd)), (-2, -4));
    }

    #[test]
    fn sadd16_saturates_per_lane() {
        let a = (i16::MAX as u16 as u32) | ((-5i16 as u16 as u32) << 16);
        let r = sadd16(a, pack_offset(10));
        assert_eq!(lane_lo(r), i16::MAX);
        assert_eq!(lane_hi(r), 5);
        let r = sadd16(pack_offset(i16::MIN as i32), pack_offset(-1));
        assert_eq!((lane_lo(r), lane_hi(r)), (i16::MIN, i16::MIN));
    }

    #[test]
    fn pack_keeps_element_order() {
        assert_eq!(pack_q7x4(1, 2, 3, -1).to_le_bytes(), [1, 2, 3, 0xff]);
    }

    #[test]
    fn lane_offset_bounds() {
        let mut p = MulParams::default();
        p.input_1_offset = LANE_OFFSET_MAX;
        p.input_2_offset = LANE_OFFSET_MIN;
        assert!(offsets_fit_lanes(&p));
        p.input_1_offset += 1;
        assert!(!offsets_fit_lanes(&p));
    }

    #[test]
    fn matches_scalar_on_all_byte_pairs_at_extreme_offsets() {
        let p = MulParams { input_1_offset: 128, input_2_offset: -127, out_mult: 1 << 30, out_shift: -6, out_offset: -3, ..MulParams::default() };
        let a: Vec<i8> = (0..256).map(|i| (i as u8) as i8).collect();
        for shift in 0..4 {
            let b: Vec<i8> = a.iter().map(|v| v.wrapping_mul(3).wrapping_add(shift)).collect();
            let mut packed = vec![0i8; 256];
            let mut scalar = vec![0i8; 256];
            assert_eq!(mul_s8_packed(&a, &b, &p, &mut packed), 64);
            mul_s8_scalar(&a, &b, &p, &mut scalar);
            assert_eq!(packed, scalar);
        }
    }
}
