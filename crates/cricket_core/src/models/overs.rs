//! Cricket over notation.
//!
//! Overs are written `completed.balls`, so 37 legal balls read as `6.1`.
//! The fractional digit is a ball count, not a decimal fraction: `6.5`
//! is followed by `7.0`.

pub const BALLS_PER_OVER: u32 = 6;

/// Convert a legal-ball count to cricket notation.
pub fn overs_from_balls(balls: u32) -> f64 {
    (balls / BALLS_PER_OVER) as f64 + (balls % BALLS_PER_OVER) as f64 / 10.0
}

/// Convert a legal-ball count to true (decimal) overs, for rate maths.
pub fn decimal_overs(balls: u32) -> f64 {
    balls as f64 / BALLS_PER_OVER as f64
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
