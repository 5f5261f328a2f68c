//! Scalar membership-function families.
//!
//! Each family maps a crisp error value to a degree in `[0,1]` per
//! linguistic term. The formulas below are the standard triangular/
//! Gaussian/pi-shaped definitions applied to fixed per-term breakpoints —
//! including the non-monotonic breakpoints on the extreme terms (`EN` in
//! Triangular, `LP`/`LN` in Pi), which are preserved as given rather than
//! re-sorted.

use crate::shared::MembershipFamily;

/// Error terms in rule order: extremely/large/small positive, zero,
/// small/large/extremely negative.
pub const ERROR_TERMS: [&str; 7] = ["EP", "LP", "SP", "ZE", "SN", "LN", "EN"];

/// Triangular tent function. Generalised so a degenerate edge (`a == b` or
/// `b == c`) reads as a step rather than dividing by zero.
pub fn triangular(x: f64, a: f64, b: f64, c: f64) -> f64 {
    let left = if b == a {
        if x >= a {
            1.0
        } else {
            0.0
        }
    } else {
        (x - a) / (b - a)
    };
    let right = if c == b {
        if x <= c {
            1.0
        } else {
            0.0
        }
    } else {
        (c - x) / (c - b)
    };
    left.min(right).clamp(0.0, 1.0)
}

/// `exp(-(x-mu)^2 / (2*sigma^2))`.
pub fn gaussian(x: f64, mu: f64, sigma: f64) -> f64 {
    (-(x - mu).powi(2) / (2.0 * sigma * sigma)).exp()
}

/// Four-point S-Z composite (pi-shaped): rises from `a` to `b`, plateaus at
/// 1 between `b` and `c`, falls from `c` to `d`.
pub fn pi(x: f64, a: f64, b: f64, c: f64, d: f64) -> f64 {
    if x <= a || x > d {
        return 0.0;
    }
    let mid_rise = (a + b) / 2.0;
    let mid_fall = (c + d) / 2.0;

    let v = if x <= mid_rise {
        2.0 * ((x - a) / (b - a)).powi(2)
    } else if x <= b {
        1.0 - 2.0 * ((x - b) / (b - a)).powi(2)
    } else if x <= c {
        1.0
    } else if x <= mid_fall {
        1.0 - 2.0 * ((x - c) / (d - c)).powi(2)
    } else {
        2.0 * ((x - d) / (d - c)).powi(2)
    };
    v.clamp(0.0, 1.0)
}

/// Fuzzify an error value into the seven terms, in [`ERROR_TERMS`] order.
pub fn fuzzify_error(e: f64, family: MembershipFamily) -> [f64; 7] {
    match family {
        MembershipFamily::Triangular => [
            triangular(e, 1250.0, 5000.0, 10000.0),
            triangular(e, 500.0, 1250.0, 2000.0),
            triangular(e, 0.0, 625.0, 1250.0),
            triangular(e, -500.0, 0.0, 500.0),
            triangular(e, -1250.0, -625.0, 0.0),
            triangular(e, -2000.0, -1250.0, -500.0),
            triangular(e, -1250.0, -5000.0, -10000.0),
        ],
        MembershipFamily::Gaussian => [
            gaussian(e, 3000.0, 0.01),
            gaussian(e, 1500.0, 0.01),
            gaussian(e, 500.0, 0.01),
            gaussian(e, 0.0, 0.1),
            gaussian(e, -500.0, 0.01),
            gaussian(e, -1500.0, 0.01),
            gaussian(e, -3000.0, 0.01),
        ],
        MembershipFamily::Pi => [
            pi(e, 1250.0, 2500.0, 5000.0, 10000.0),
            pi(e, 500.0, 250.0, 1750.0, 2000.0),
            pi(e, 0.0, 250.0, 1000.0, 1250.0),
            pi(e, -500.0, -250.0, 250.0, 500.0),
            pi(e, -1250.0, -1000.0, -250.0, 0.0),
            pi(e, -2000.0, -1750.0, -250.0, -500.0),
            pi(e, -10000.0, -5000.0, -2500.0, -1250.0),
        ],
    }
}
