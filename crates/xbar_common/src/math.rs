//! Integer sizing helpers shared by the floor-planner and the estimators.

/// Ceiling division for partition counts. A zero divisor yields zero.
pub fn ceil_div(a: usize, b: usize) -> usize {
    if b == 0 {
        0
    } else {
        a.div_ceil(b)
    }
}

/// Smallest `r` with `r * r >= n`.
pub fn ceil_sqrt(n: usize) -> usize {
    let mut r = (n as f64).sqrt() as usize;
    while r * r < n {
        r += 1;
    }
    while r > 0 && (r - 1) * (r - 1) >= n {
        r -= 1;
    }
    r
}

/// Smallest `k` with `2^k >= n`; zero for `n <= 1`.
pub fn log2_ceil(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}

/// `floor(available / needed)`, never below one.
///
/// Used for duplication factors: a block that does not fit even once is
/// still mapped a single time.
pub fn floor_ratio_at_least_one(available: usize, needed: usize) -> usize {
    if needed == 0 {
        return 1;
    }
    (available / needed).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_div_rounds_up() {
        assert_eq!(ceil_div(256, 128), 2);
        assert_eq!(ceil_div(257, 128), 3);
        assert_eq!(ceil_div(0, 128), 0);
        assert_eq!(ceil_div(5, 0), 0);
    }

    #[test]
    fn ceil_sqrt_values() {
        assert_eq!(ceil_sqrt(0), 0);
        assert_eq!(ceil_sqrt(1), 1);
        assert_eq!(ceil_sqrt(4), 2);
        assert_eq!(ceil_sqrt(5), 3);
        assert_eq!(ceil_sqrt(9), 3);
        assert_eq!(ceil_sqrt(16), 4);
    }

    #[test]
    fn log2_ceil_values() {
        assert_eq!(log2_ceil(1), 0);
        assert_eq!(log2_ceil(2), 1);
        assert_eq!(log2_ceil(3), 2);
        assert_eq!(log2_ceil(128), 7);
        assert_eq!(log2_ceil(129), 8);
    }

    #[test]
    fn duplication_ratio_clamps_to_one() {
        assert_eq!(floor_ratio_at_least_one(4, 2), 2);
        assert_eq!(floor_ratio_at_least_one(4, 3), 1);
        assert_eq!(floor_ratio_at_least_one(1, 3), 1);
        assert_eq!(floor_ratio_at_least_one(4, 0), 1);
    }
}
