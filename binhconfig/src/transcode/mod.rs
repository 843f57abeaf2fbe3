//! Output formats backed by external crates.

pub mod cbor;
pub mod toml;
pub mod yaml;

/// Largest magnitude below which every integer is an exact `f64` (2^53).
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// `n` as an integer, when it is integral and exactly representable.
pub fn as_integer(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= EXACT_INTEGER_LIMIT {
        Some(n as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_integer() {
        assert_eq!(as_integer(80.0), Some(80));
        assert_eq!(as_integer(-3.0), Some(-3));
        assert_eq!(as_integer(0.5), None);
        assert_eq!(as_integer(1e300), None);
        assert_eq!(as_integer(f64::NAN), None);
    }
}
