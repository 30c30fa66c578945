// src/convert.rs
//
// Mg II core-to-wing ratio → JB2008 solar indices.

/// Round to one decimal place.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// `M10 = -1943.85 + 7606.56 * MgII`, floored at zero.
pub fn mg2_to_m10(mgii: f64) -> f64 {
    let m10 = -1943.85 + 7606.56 * mgii;
    if m10 > 0.0 {
        round1(m10)
    } else {
        0.0
    }
}

/// MgII → EUV → S10, floored at zero.
///
///   EUV = 110.324 * MgII - 28.065
///   S10 = -12.01 + 141.23 * (EUV / 1.9955)
pub fn mg2_to_s10(mgii: f64) -> f64 {
    let euv = 110.324 * mgii - 28.065;
    let s10 = -12.01 + 141.23 * (euv / 1.9955);
    if s10 > 0.0 {
        round1(s10)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn m10_matches_formula() {
        // -1943.85 + 7606.56 * 0.27 = 109.9212
        assert_eq!(mg2_to_m10(0.27), 109.9);
        assert_eq!(mg2_to_m10(0.28), round1(-1943.85 + 7606.56 * 0.28));
    }

    #[test]
    fn s10_matches_formula() {
        let mgii = 0.27;
        let expected = -12.01 + 141.23 * ((110.324 * mgii - 28.065) / 1.9955);
        assert_eq!(mg2_to_s10(mgii), round1(expected));
    }

    #[test]
    fn clamps_below_zero_crossing() {
        assert_eq!(mg2_to_m10(0.0), 0.0);
        // zero crossing of M10 sits near 0.2555
        assert_eq!(mg2_to_m10(0.25), 0.0);
        assert_eq!(mg2_to_s10(0.0), 0.0);
        // EUV is negative below ~0.2544
        assert_eq!(mg2_to_s10(0.2), 0.0);
    }

    #[test]
    fn pure_and_monotonic() {
        let proxies: Vec<f64> = (0..200).map(|i| 0.24 + i as f64 * 0.0005).collect();
        for pair in proxies.windows(2) {
            assert!(mg2_to_m10(pair[0]) <= mg2_to_m10(pair[1]));
            assert!(mg2_to_s10(pair[0]) <= mg2_to_s10(pair[1]));
        }
        for &p in &proxies {
            assert_eq!(mg2_to_m10(p), mg2_to_m10(p));
            assert_eq!(mg2_to_s10(p), mg2_to_s10(p));
        }
    }
}
