//! Complementary-filter pitch estimation.

/// Fuses the accelerometer-derived tilt with the gyro rate into a smoothed
/// pitch angle. The gyro term is integrated over the measured elapsed time,
/// so callers must pass the actual `dt`, never an assumed constant.
#[derive(Debug, Clone)]
pub struct PitchEstimator {
    /// Weight on the gyro-integrated term; larger means a longer time
    /// constant before the accelerometer pulls the estimate back.
    alpha: f32,
    filtered_deg: f32,
}

impl PitchEstimator {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            filtered_deg: 0.0,
        }
    }

    /// One filter step: `a*(prev + rate*dt) + (1-a)*raw`.
    ///
    /// Assumes `dt_s` is small and positive; there is no discontinuity
    /// handling. The estimate is not clamped to a tilt range.
    pub fn update(&mut self, raw_pitch_deg: f32, rate_dps: f32, dt_s: f32) -> f32 {
        self.filtered_deg = self.alpha * (self.filtered_deg + rate_dps * dt_s)
            + (1.0 - self.alpha) * raw_pitch_deg;
        self.filtered_deg
    }

    pub fn pitch_deg(&self) -> f32 {
        self.filtered_deg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_to_static_tilt() {
        // With zero rate, repeated updates approach the raw reading.
        let mut est = PitchEstimator::new(0.9);
        for _ in 0..200 {
            est.update(10.0, 0.0, 0.02);
        }
        assert!((est.pitch_deg() - 10.0).abs() < 0.01);
    }

    #[test]
    fn gyro_term_scales_with_dt() {
        let mut a = PitchEstimator::new(0.9);
        let mut b = PitchEstimator::new(0.9);
        a.update(0.0, 100.0, 0.02);
        b.update(0.0, 100.0, 0.04);
        // Twice the elapsed time integrates twice the rate contribution.
        assert!((b.pitch_deg() - 2.0 * a.pitch_deg()).abs() < 1e-5);
    }

    #[test]
    fn single_step_matches_formula() {
        let mut est = PitchEstimator::new(0.9);
        let out = est.update(4.0, 50.0, 0.02);
        // 0.9*(0 + 50*0.02) + 0.1*4 = 0.9 + 0.4
        assert!((out - 1.3).abs() < 1e-6);
    }
}
