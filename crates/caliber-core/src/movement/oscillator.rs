//! Phase accumulators shared by the moving components
//!
//! Positions are closed-form functions of accumulated time, never of the
//! previous frame's position.

use std::f64::consts::TAU;

/// Elapsed-time accumulator for periodic motion
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Phase {
    elapsed: f64,
}

impl Phase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one frame's delta and return the new elapsed time
    pub fn advance(&mut self, delta_time: f32) -> f64 {
        self.elapsed += delta_time as f64;
        self.elapsed
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// `sin(2π·f·t)` for a frequency in hertz
    pub fn sine_hz(&self, frequency: f64) -> f64 {
        (TAU * frequency * self.elapsed).sin()
    }

    /// `sin(ω·t)` for an angular rate in rad/s
    pub fn sine(&self, angular_rate: f64) -> f64 {
        (angular_rate * self.elapsed).sin()
    }

    /// `sin(ω·t)` remapped onto [0, 1]
    pub fn pulse(&self, angular_rate: f64) -> f64 {
        (self.sine(angular_rate) + 1.0) / 2.0
    }
}

/// Constant-rate rotation, accumulated per frame and kept within one turn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    rate: f64,
    angle: f64,
}

impl Spin {
    /// `rate` in rad/s; negative spins clockwise
    pub fn new(rate: f64) -> Self {
        Self { rate, angle: 0.0 }
    }

    pub fn advance(&mut self, delta_time: f32) -> f64 {
        self.angle = (self.angle + self.rate * delta_time as f64) % TAU;
        self.angle
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_accumulates() {
        let mut phase = Phase::new();
        phase.advance(0.125);
        phase.advance(0.125);
        assert_eq!(phase.elapsed(), 0.25);
        // Quarter period of 1 Hz
        assert!((phase.sine_hz(1.0) - 1.0).abs() < 1e-12);
        assert!((phase.pulse(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_spin_wraps_with_sign() {
        let mut spin = Spin::new(-0.5);
        spin.advance(1.0);
        assert!((spin.angle() + 0.5).abs() < 1e-12);

        let mut fast = Spin::new(TAU * 8.0);
        for _ in 0..1000 {
            fast.advance(0.016);
        }
        assert!(fast.angle().abs() < TAU);
        let elapsed = 0.016f32 as f64 * 1000.0;
        let expected = (TAU * 8.0 * elapsed) % TAU;
        assert!((fast.angle() - expected).abs() < 1e-6);
    }
}
