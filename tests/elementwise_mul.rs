use pretty_assertions::assert_eq;
use quantmul::{elementwise_mul_s8, ActivationRange, KernelError, MulParams};

#[test]
fn neutral_scale_yields_plain_products() {
    // both unity encodings: Q31 max with no shift, and 0.5 with one left shift
    for (out_mult, out_shift) in [(i32::MAX, 0), (1 << 30, 1)] {
        let p = MulParams { out_mult, out_shift, ..MulParams::default() };
        let mut out = [0i8; 4];
        elementwise_mul_s8(&[1, 2, 3, 4], &[5, 6, 7, 8], &p, &mut out, 4).unwrap();
        assert_eq!(out, [5, 12, 21, 32]);
    }
}

#[test]
fn offsets_follow_reference_formula() {
    let a = [-10i8, -3, 0, 4, 9, 12, -128];
    let b = [2i8, 7, -1, 5, -6, 3, 1];
    let p = MulParams { input_1_offset: 3, input_2_offset: -2, out_offset: -5, ..MulParams::default() };
    let mut out = [0i8; 7];
    elementwise_mul_s8(&a, &b, &p, &mut out, 7).unwrap();
    let expected: Vec<i8> = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| ((x as i32 + 3) * (y as i32 - 2) - 5).clamp(-128, 127) as i8)
        .collect();
    assert_eq!(out.to_vec(), expected);
}

#[test]
fn saturates_to_activation_bounds() {
    let a = [127i8, -128, 127, -128, 10, -10];
    let b = [127i8, 127, -128, -128, 1, 1];
    let mut out = [0i8; 6];
    elementwise_mul_s8(&a, &b, &MulParams::default(), &mut out, 6).unwrap();
    assert_eq!(out, [127, -128, -128, 127, 10, -10]);

    let relu6 = MulParams::default().with_activation(ActivationRange::new(0, 6));
    elementwise_mul_s8(&a, &b, &relu6, &mut out, 6).unwrap();
    assert_eq!(out, [6, 0, 0, 6, 6, 0]);
}

#[test]
fn wide_activation_still_fits_int8() {
    let p = MulParams::default().with_activation(ActivationRange::new(-1000, 1000));
    let mut out = [0i8; 2];
    elementwise_mul_s8(&[100, -100], &[100, 100], &p, &mut out, 2).unwrap();
    // saturates at the int8 limits instead of wrapping
    assert_eq!(out, [127, -128]);
}

#[test]
fn zero_block_size_is_success_without_writes() {
    let mut out = [55i8; 3];
    let s = elementwise_mul_s8(&[1, 2, 3], &[1, 2, 3], &MulParams::default(), &mut out, 0).unwrap();
    assert_eq!(s.elements(), 0);
    assert_eq!(out, [55; 3]);
}

#[test]
fn block_size_shorter_than_buffers_leaves_tail() {
    let mut out = [0i8; 6];
    let s = elementwise_mul_s8(&[2; 6], &[3; 6], &MulParams::default(), &mut out, 5).unwrap();
    assert_eq!(s.elements(), 5);
    assert_eq!(out, [6, 6, 6, 6, 6, 0]);
}

#[test]
fn downscale_rounds_half_away_from_zero() {
    // 1/4 scale on even inputs: 6 -> 1.5 -> 2, -10 -> -2.5 -> -3, -2 -> -0.5 -> -1
    let p = MulParams { out_mult: 1 << 30, out_shift: -1, ..MulParams::default() };
    let mut out = [0i8; 6];
    elementwise_mul_s8(&[6, -6, 10, -10, 4, -2], &[1; 6], &p, &mut out, 6).unwrap();
    assert_eq!(out, [2, -2, 3, -3, 1, -1]);
}

#[test]
fn invalid_arguments_are_reported() {
    let mut out = [0i8; 4];
    let short = elementwise_mul_s8(&[1, 2], &[1, 2, 3, 4], &MulParams::default(), &mut out, 4);
    assert!(matches!(short, Err(KernelError::InvalidArgument { arg: "input_1", .. })));

    let p = MulParams { out_shift: 40, ..MulParams::default() };
    let shift = elementwise_mul_s8(&[1; 4], &[1; 4], &p, &mut out, 4);
    assert!(matches!(shift, Err(KernelError::InvalidArgument { arg: "out_shift", .. })));

    let p = MulParams::default().with_activation(ActivationRange::new(5, 4));
    let clamp = elementwise_mul_s8(&[1; 4], &[1; 4], &p, &mut out, 4);
    assert!(matches!(clamp, Err(KernelError::InvalidArgument { arg: "activation", .. })));
    assert_eq!(out, [0; 4], "rejected calls must not write");
}
