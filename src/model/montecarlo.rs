//! Outcome probabilities against offered lines.
//!
//! Game lines (spread, moneyline, total) are priced by sampling a normal
//! outcome distribution. Team totals and player props use the closed-form
//! normal CDF instead. Every call draws a fresh sample; nothing is reused
//! between markets.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::{PI, SQRT_2};

use super::projection::{MARGIN_SD, TOTAL_SD};

/// Standard normal CDF (Abramowitz and Stegun 7.1.26).
pub fn norm_cdf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let z = x.abs() / SQRT_2;

    let t = 1.0 / (1.0 + p * z);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-z * z).exp();

    0.5 * (1.0 + sign * y)
}

/// P(X > line) for X ~ N(mean, sd). A non-positive sd yields 0.5.
pub fn prob_over_normal(mean: f64, sd: f64, line: f64) -> f64 {
    if sd <= 0.0 {
        return 0.5;
    }
    1.0 - norm_cdf((line - mean) / sd)
}

/// Sampling engine for game lines. One per report run.
pub struct Simulator {
    rng: StdRng,
    samples: usize,
}

impl Simulator {
    /// Seeded when `seed` is given, otherwise from OS entropy.
    pub fn new(samples: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng, samples: samples.max(1) }
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Box–Muller standard normal variate.
    fn standard_normal(&mut self) -> f64 {
        // (0, 1] keeps ln() finite
        let u1: f64 = 1.0 - self.rng.gen::<f64>();
        let u2: f64 = self.rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    fn fraction(&mut self, mean: f64, sd: f64, hit: impl Fn(f64) -> bool) -> f64 {
        let mut hits = 0usize;
        for _ in 0..self.samples {
            if hit(mean + sd * self.standard_normal()) {
                hits += 1;
            }
        }
        hits as f64 / self.samples as f64
    }

    /// Share of sampled margins (centered on `mean_margin`) above `line`.
    /// Moneyline is the special case `line = 0`.
    pub fn spread_probability(&mut self, mean_margin: f64, line: f64) -> f64 {
        self.fraction(mean_margin, MARGIN_SD, |x| x > line)
    }

    /// Share of sampled totals above (`over`) or below the line.
    pub fn total_probability(&mut self, mean_total: f64, line: f64, over: bool) -> f64 {
        if over {
            self.fraction(mean_total, TOTAL_SD, |x| x > line)
        } else {
            self.fraction(mean_total, TOTAL_SD, |x| x < line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_cdf_reference_points() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((norm_cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((norm_cdf(-1.96) - 0.025).abs() < 1e-3);
        assert!(norm_cdf(8.0) > 0.999_999);
        assert!(norm_cdf(-8.0) < 1e-6);
    }

    #[test]
    fn test_prob_over_normal() {
        assert!((prob_over_normal(20.0, 5.0, 20.0) - 0.5).abs() < 1e-7);
        assert!(prob_over_normal(25.0, 5.0, 20.0) > 0.8);
        assert_eq!(prob_over_normal(25.0, 0.0, 20.0), 0.5);
        assert_eq!(prob_over_normal(25.0, -1.0, 20.0), 0.5);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let mut a = Simulator::new(10_000, Some(7));
        let mut b = Simulator::new(10_000, Some(7));
        assert_eq!(a.spread_probability(3.0, -1.5), b.spread_probability(3.0, -1.5));
    }

    #[test]
    fn test_spread_probability_tracks_cdf() {
        let mut sim = Simulator::new(20_000, Some(42));
        // Mean margin 5, line 0: P = 1 - Φ(-5 / 11.5) ≈ 0.668
        let p = sim.spread_probability(5.0, 0.0);
        let expected = prob_over_normal(5.0, MARGIN_SD, 0.0);
        assert!((p - expected).abs() < 0.02, "p={p} expected={expected}");
    }

    #[test]
    fn test_total_over_under_complement() {
        let mut sim = Simulator::new(20_000, Some(1));
        let over = sim.total_probability(220.0, 215.5, true);
        let under = sim.total_probability(220.0, 215.5, false);
        assert!(over > 0.55);
        assert!((over + under - 1.0).abs() < 0.03);
    }

    #[test]
    fn test_probabilities_bounded() {
        let mut sim = Simulator::new(1_000, Some(3));
        let p = sim.spread_probability(-40.0, 30.0);
        assert!((0.0..=1.0).contains(&p));
        assert!(p < 0.01);
    }
}
