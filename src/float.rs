//! IEEE 754 binary16 conversion helpers.
//!
//! Half-precision values are carried as `f64` in memory and converted at the
//! byte boundary.

/// Converts an `f64` to binary16 bits with a single rounding to nearest even.
/// Values beyond the binary16 range become infinity.
pub fn f64_to_f16_bits(value: f64) -> u16 {
    let x = value.to_bits();

    let sign = ((x >> 48) & 0x8000) as u16;
    let exp = ((x >> 52) & 0x7FF) as i32;
    let man = x & 0x000F_FFFF_FFFF_FFFF;

    // Infinity or NaN. Keep NaNs quiet.
    if exp == 0x7FF {
        let nan_bits = if man == 0 { 0 } else { 0x0200 | (man >> 42) as u16 };
        return sign | 0x7C00 | nan_bits;
    }

    let half_exp = exp - 1023 + 15;
    if half_exp >= 0x1F {
        return sign | 0x7C00;
    }

    let (base, man, shift) = if half_exp <= 0 {
        // Subnormal result: the implicit bit joins the shifted mantissa.
        let shift = 43 - half_exp;
        if shift > 53 {
            return sign;
        }
        (0, man | (1 << 52), shift as u32)
    } else {
        ((half_exp as u64) << 10, man, 42)
    };

    let mut half = base | (man >> shift);
    let round_bit = 1u64 << (shift - 1);
    if (man & round_bit) != 0 && (man & (3 * round_bit - 1)) != 0 {
        // A carry out of the mantissa bumps the exponent, possibly to infinity.
        half += 1;
    }

    sign | half as u16
}

/// Converts binary16 bits to an `f32`. Exact for every input.
pub fn f16_bits_to_f32(bits: u16) -> f32 {
    let sign = ((bits & 0x8000) as u32) << 16;
    let exp = ((bits >> 10) & 0x1F) as u32;
    let man = (bits & 0x03FF) as u32;

    match (exp, man) {
        (0, 0) => f32::from_bits(sign),
        (0, _) => {
            let magnitude = man as f32 * 2f32.powi(-24);
            if sign != 0 { -magnitude } else { magnitude }
        }
        (0x1F, 0) => f32::from_bits(sign | 0x7F80_0000),
        (0x1F, _) => f32::from_bits(sign | 0x7FC0_0000 | (man << 13)),
        _ => f32::from_bits(sign | ((exp + 127 - 15) << 23) | (man << 13)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_values() {
        assert_eq!(f64_to_f16_bits(1.0), 0x3C00);
        assert_eq!(f64_to_f16_bits(-2.0), 0xC000);
        assert_eq!(f64_to_f16_bits(0.5), 0x3800);
        assert_eq!(f64_to_f16_bits(65504.0), 0x7BFF);
        assert_eq!(f64_to_f16_bits(0.0), 0x0000);
        assert_eq!(f64_to_f16_bits(-0.0), 0x8000);
    }

    #[test]
    fn test_overflow_to_infinity() {
        assert_eq!(f64_to_f16_bits(65536.0), 0x7C00);
        assert_eq!(f64_to_f16_bits(65520.0), 0x7C00);
        assert_eq!(f64_to_f16_bits(f64::INFINITY), 0x7C00);
        assert_eq!(f64_to_f16_bits(f64::NEG_INFINITY), 0xFC00);
    }

    #[test]
    fn test_nan_stays_nan() {
        assert_eq!(f64_to_f16_bits(f64::NAN), 0x7E00);
        assert!(f16_bits_to_f32(f64_to_f16_bits(f64::NAN)).is_nan());
    }

    #[test]
    fn test_subnormal() {
        let smallest = 2f64.powi(-24);
        assert_eq!(f64_to_f16_bits(smallest), 0x0001);
        assert_eq!(f16_bits_to_f32(0x0001) as f64, smallest);
        assert_eq!(f16_bits_to_f32(0x03FF) as f64, 1023.0 * smallest);
        // Exactly half the smallest subnormal ties to zero; anything above rounds up.
        assert_eq!(f64_to_f16_bits(2f64.powi(-25)), 0x0000);
        assert_eq!(f64_to_f16_bits(2f64.powi(-25) * (1.0 + 2f64.powi(-30))), 0x0001);
        assert_eq!(f64_to_f16_bits(1e-300), 0x0000);
    }

    #[test]
    fn test_round_to_nearest_even() {
        // 1 + 2^-11 sits halfway between 1.0 and the next half; ties to even.
        assert_eq!(f64_to_f16_bits(1.0 + 2f64.powi(-11)), 0x3C00);
        assert_eq!(f64_to_f16_bits(1.0 + 3.0 * 2f64.powi(-11)), 0x3C02);
    }

    #[test]
    fn test_rounds_once_from_f64() {
        // Narrowing to f32 first would drop the 2^-40 and land on the tie.
        let just_above_tie = 1.0 + 2f64.powi(-11) + 2f64.powi(-40);
        assert_eq!(f64_to_f16_bits(just_above_tie), 0x3C01);
        assert_eq!(f16_bits_to_f32(0x3C01), 1.0009765625);
    }

    #[test]
    fn test_back_and_forth() {
        for bits in [0x3C00u16, 0x3555, 0xC5A0, 0x7BFF, 0x0400, 0x0200, 0x8001] {
            assert_eq!(f64_to_f16_bits(f16_bits_to_f32(bits) as f64), bits);
        }
    }
}
