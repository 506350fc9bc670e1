//! Gear tooth profiles
//!
//! A single routine produces every toothed part in the movement. The tooth
//! shape is a policy: a list of (slot fraction, height fraction) control
//! points visited once per tooth slot. Radii are measured from the root
//! circle (`outer - tooth height`) up to the tip circle.
//!
//! Wheel and pinion teeth are asymmetric trapezoids: they rise to the tip
//! early in the slot, hold, and fall back to the root at the end of the
//! slot, giving a "pushing" flank on one side.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::geometry::{extrude_rings, Bevel, GeometryError, Mesh, Ring};

/// Tooth-shape policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToothShape {
    /// Main wheel tooth: rises over 40% of the slot, flat top to 50%
    Wheel,
    /// Pinion leaf: steeper rise over 30% of the slot
    Pinion,
    /// Escape wheel "club" tooth: sharp tip at 30%, deep drop at 90%
    Escape,
}

impl ToothShape {
    /// Control points as (fraction of slot, fraction of tooth height)
    fn control_points(self) -> &'static [(f32, f32)] {
        match self {
            ToothShape::Wheel => &[(0.0, 0.0), (0.4, 1.0), (0.5, 1.0)],
            ToothShape::Pinion => &[(0.0, 0.0), (0.3, 1.0), (0.5, 1.0)],
            ToothShape::Escape => &[(0.0, 0.2), (0.3, 1.0), (0.9, 0.0)],
        }
    }

    /// Outline points contributed by each tooth
    pub fn points_per_tooth(self) -> usize {
        self.control_points().len()
    }
}

/// How the centre hole is sized
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bore {
    /// Absolute radius
    Radius(f32),
    /// Fraction of the outer radius
    Ratio(f32),
}

/// Immutable description of a toothed disc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearProfile {
    pub teeth: u32,
    pub outer_radius: f32,
    pub bore_radius: f32,
    pub tooth_height: f32,
    pub shape: ToothShape,
}

impl GearProfile {
    /// Build and validate a profile.
    ///
    /// `tooth_height_ratio` is the tooth height as a fraction of the outer
    /// radius. The bore must fit strictly inside the root circle.
    pub fn new(
        teeth: u32,
        outer_radius: f32,
        bore: Bore,
        tooth_height_ratio: f32,
        shape: ToothShape,
    ) -> Result<Self, GeometryError> {
        if teeth == 0 {
            return Err(GeometryError::NoTeeth);
        }
        if !(outer_radius > 0.0) || !outer_radius.is_finite() {
            return Err(GeometryError::NonPositive {
                what: "outer radius",
                value: outer_radius,
            });
        }
        if !(tooth_height_ratio > 0.0 && tooth_height_ratio < 1.0) {
            return Err(GeometryError::ToothHeight(tooth_height_ratio));
        }

        let tooth_height = outer_radius * tooth_height_ratio;
        let root = outer_radius - tooth_height;
        let bore_radius = match bore {
            Bore::Radius(r) => r,
            Bore::Ratio(ratio) => outer_radius * ratio,
        };
        if !(bore_radius > 0.0 && bore_radius < root) {
            return Err(GeometryError::BoreTooLarge {
                bore: bore_radius,
                root,
            });
        }

        Ok(Self {
            teeth,
            outer_radius,
            bore_radius,
            tooth_height,
            shape,
        })
    }

    pub fn root_radius(&self) -> f32 {
        self.outer_radius - self.tooth_height
    }

    /// Polar samples of the outer outline as (angle, radius), counter-clockwise
    fn polar_outline(&self) -> Vec<(f32, f32)> {
        let root = self.root_radius();
        let slot = TAU / self.teeth as f32;
        let controls = self.shape.control_points();
        let mut samples = Vec::with_capacity(self.teeth as usize * controls.len());
        for i in 0..self.teeth {
            for &(along, up) in controls {
                samples.push(((i as f32 + along) * slot, root + up * self.tooth_height));
            }
        }
        samples
    }

    /// The closed 2D outline of the toothed rim
    pub fn outline(&self) -> Vec<Vec2> {
        self.polar_outline()
            .into_iter()
            .map(|(angle, r)| Vec2::from_angle(angle) * r)
            .collect()
    }

    /// Extrude the profile to a solid gear centred on z = 0.
    ///
    /// The bore has as many points as the rim, evenly spaced, so the cap
    /// is a strip of quads between the two loops.
    pub fn extrude(&self, depth: f32, bevel: Option<Bevel>) -> Result<Mesh, GeometryError> {
        if !(depth > 0.0) {
            return Err(GeometryError::NonPositive {
                what: "gear thickness",
                value: depth,
            });
        }
        if let Some(b) = bevel {
            b.validate()?;
            if b.size >= self.root_radius() - self.bore_radius {
                return Err(GeometryError::BoreTooLarge {
                    bore: self.bore_radius + b.size,
                    root: self.root_radius(),
                });
            }
        }

        let polar = self.polar_outline();
        let n = polar.len() as u32;
        let radial: Vec<Vec2> = polar.iter().map(|(a, _)| Vec2::from_angle(*a)).collect();

        let rim = Ring {
            points: polar
                .iter()
                .zip(&radial)
                .map(|((_, r), dir)| *dir * *r)
                .collect(),
            normals: radial.clone(),
            hole: false,
        };
        let even: Vec<Vec2> = (0..n)
            .map(|j| Vec2::from_angle(j as f32 * TAU / n as f32))
            .collect();
        let bore = Ring {
            points: even.iter().map(|dir| *dir * self.bore_radius).collect(),
            normals: even.iter().map(|dir| -*dir).collect(),
            hole: true,
        };

        let mut cap = Vec::with_capacity(2 * n as usize);
        for j in 0..n {
            let k = (j + 1) % n;
            let (p0, p1, h0, h1) = (j, k, n + j, n + k);
            cap.push([p0, p1, h1]);
            cap.push([p0, h1, h0]);
        }

        Ok(extrude_rings(&[rim, bore], &cap, depth, bevel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center_wheel() -> GearProfile {
        GearProfile::new(80, 0.18, Bore::Ratio(0.3), 0.12, ToothShape::Wheel).unwrap()
    }

    #[test]
    fn test_outline_alternates_root_and_tip() {
        let profile = center_wheel();
        let outline = profile.outline();
        assert_eq!(outline.len(), 80 * 3);

        let root = profile.root_radius();
        for tooth in outline.chunks(3) {
            assert!((tooth[0].length() - root).abs() < 1e-5);
            assert!((tooth[1].length() - 0.18).abs() < 1e-5);
            assert!((tooth[2].length() - 0.18).abs() < 1e-5);
        }
    }

    #[test]
    fn test_tooth_is_asymmetric() {
        let profile =
            GearProfile::new(10, 1.0, Bore::Ratio(0.3), 0.25, ToothShape::Pinion).unwrap();
        let outline = profile.outline();
        let slot = TAU / 10.0;
        // Rise ends at 0.3 of the slot, fall starts at 0.5 and ends at 1.0
        let rise = outline[1].to_angle() - outline[0].to_angle();
        let fall = slot - (outline[2].to_angle() - outline[0].to_angle());
        assert!((rise - 0.3 * slot).abs() < 1e-5);
        assert!((fall - 0.5 * slot).abs() < 1e-5);
        assert!((rise - fall).abs() > 1e-3);
    }

    #[test]
    fn test_escape_profile_radii() {
        // 20 teeth, tip 0.08; drop radius 0.0525 and rest radius 0.058
        let profile =
            GearProfile::new(20, 0.08, Bore::Radius(0.01), 0.34375, ToothShape::Escape).unwrap();
        let outline = profile.outline();
        assert!((outline[0].length() - 0.058).abs() < 1e-5);
        assert!((outline[1].length() - 0.08).abs() < 1e-5);
        assert!((outline[2].length() - 0.0525).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_profiles_rejected() {
        assert_eq!(
            GearProfile::new(0, 0.18, Bore::Ratio(0.3), 0.12, ToothShape::Wheel),
            Err(GeometryError::NoTeeth)
        );
        assert!(matches!(
            GearProfile::new(80, 0.18, Bore::Radius(0.17), 0.12, ToothShape::Wheel),
            Err(GeometryError::BoreTooLarge { .. })
        ));
        assert!(matches!(
            GearProfile::new(80, 0.18, Bore::Radius(0.0), 0.12, ToothShape::Wheel),
            Err(GeometryError::BoreTooLarge { .. })
        ));
        assert!(matches!(
            GearProfile::new(80, -1.0, Bore::Ratio(0.3), 0.12, ToothShape::Wheel),
            Err(GeometryError::NonPositive { .. })
        ));
        assert_eq!(
            GearProfile::new(80, 0.18, Bore::Ratio(0.3), 1.0, ToothShape::Wheel),
            Err(GeometryError::ToothHeight(1.0))
        );
    }

    #[test]
    fn test_extrusion_is_deterministic() {
        let a = center_wheel().extrude(0.025, Some(Bevel::SOFT)).unwrap();
        let b = center_wheel().extrude(0.025, Some(Bevel::SOFT)).unwrap();
        assert_eq!(a.vertex_count(), b.vertex_count());
        assert_eq!(a.bounding_radius(), b.bounding_radius());
        assert_eq!(a, b);
    }

    #[test]
    fn test_extrusion_counts_without_bevel() {
        let profile =
            GearProfile::new(10, 0.03, Bore::Ratio(0.35), 0.25, ToothShape::Pinion).unwrap();
        let mesh = profile.extrude(0.015, None).unwrap();
        let section = 10 * 3 * 2;
        assert_eq!(mesh.vertex_count(), section * 2);
        // Two cap strips plus rim and bore walls
        assert_eq!(mesh.triangle_count(), 2 * 60 + 2 * 60);
        let (min, max) = mesh.bounds().unwrap();
        assert!((max.z - 0.0075).abs() < 1e-6);
        assert!((min.z + 0.0075).abs() < 1e-6);
        assert!((mesh.bounding_radius() - (0.03f32.powi(2) + 0.0075f32.powi(2)).sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_bevel_rejected() {
        let profile = center_wheel();
        assert!(matches!(
            profile.extrude(0.025, Some(Bevel::new(0.002, 0.002, 0))),
            Err(GeometryError::NonPositive { .. })
        ));
        assert!(matches!(
            profile.extrude(0.025, Some(Bevel::new(0.002, -0.48, 2))),
            Err(GeometryError::NonPositive { .. })
        ));
        assert!(matches!(
            profile.extrude(0.025, Some(Bevel::new(-0.002, 0.002, 2))),
            Err(GeometryError::NonPositive { .. })
        ));
    }

    #[test]
    fn test_escape_bore_is_even() {
        let profile =
            GearProfile::new(20, 0.08, Bore::Radius(0.01), 0.34375, ToothShape::Escape).unwrap();
        let mesh = profile.extrude(0.012, None).unwrap();
        let n = 20 * 3;
        let bore = &mesh.positions[n..2 * n];
        let step = TAU / n as f32;
        for (j, p) in bore.iter().enumerate() {
            assert!((p.truncate().length() - 0.01).abs() < 1e-6);
            let angle = p.truncate().to_angle().rem_euclid(TAU);
            let expected = j as f32 * step;
            let diff = (angle - expected).abs();
            assert!(diff < 1e-4 || (TAU - diff) < 1e-4, "bore point {j} at {angle}");
        }

        // Front cap triangles all wind counter-clockwise
        for tri in mesh.indices[..2 * n * 3].chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.positions[i as usize].truncate());
            assert!((b - a).perp_dot(c - a) > 0.0);
        }
    }

    #[test]
    fn test_bevel_grows_rim() {
        let plain = center_wheel().extrude(0.025, None).unwrap();
        let soft = center_wheel().extrude(0.025, Some(Bevel::SOFT)).unwrap();
        assert!(soft.vertex_count() > plain.vertex_count());
        assert!(soft.bounding_radius() > plain.bounding_radius());
    }
}
