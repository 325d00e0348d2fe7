//! Noisy traffic sampling around the operator-set level.

use rand::Rng;

use tierscale_state::non_negative;

/// Relative width of the noise band (±10% around the level).
pub const NOISE_FACTOR: f64 = 0.2;

/// Draw this tick's actual traffic from the operator-set `traffic_level`.
///
/// `noise = U(-0.5, 0.5) * level * 0.2`, result clamped at zero. Negative
/// or non-finite levels are treated as zero.
pub fn sample<R: Rng + ?Sized>(rng: &mut R, traffic_level: f64) -> f64 {
    let level = non_negative(traffic_level);
    let noise = rng.random_range(-0.5_f64..0.5) * level * NOISE_FACTOR;
    (level + noise).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn samples_stay_in_noise_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let t = sample(&mut rng, 100.0);
            assert!((0.0..=120.0).contains(&t), "sample out of range: {t}");
            assert!((90.0..=110.0).contains(&t), "sample outside ±10%: {t}");
        }
    }

    #[test]
    fn zero_level_yields_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sample(&mut rng, 0.0), 0.0);
    }

    #[test]
    fn negative_and_nan_levels_yield_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sample(&mut rng, -50.0), 0.0);
        assert_eq!(sample(&mut rng, f64::NAN), 0.0);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            assert_eq!(sample(&mut a, 500.0), sample(&mut b, 500.0));
        }
    }
}
