//! Trial-division integer factorization.

/// Ordered prime factors of a number, with multiplicity.
pub type Factors = Vec<u64>;

/// Returns the prime factors of `n` in non-decreasing order.
///
/// Values up to 3 are returned as-is, so `factorize(1) == [1]` and
/// `factorize(0) == [0]`. Everything else is split by trial division with 2
/// followed by odd divisors.
///
/// ```
/// use chainmix::factorize;
///
/// assert_eq!(factorize(24), vec![2, 2, 2, 3]);
/// assert_eq!(factorize(7), vec![7]);
/// ```
#[must_use]
pub fn factorize(mut n: u64) -> Factors {
    if n <= 3 {
        return vec![n];
    }

    let mut factors = Vec::new();
    let mut d: u64 = 2;

    // `d <= n / d` is `d * d <= n` without the overflow.
    while d <= n / d {
        if n % d == 0 {
            factors.push(d);
            n /= d;
        } else {
            d = if d == 2 { 3 } else { d + 2 };
        }
    }

    if n > 1 {
        factors.push(n);
    }

    factors
}
