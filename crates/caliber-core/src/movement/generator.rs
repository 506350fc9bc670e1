//! Generator - magnet rotor and braking coil
//!
//! The rotor turns at a constant rate rather than following the time of
//! day. The coil's emissive colour ramps blue, white, orange as the
//! electromagnetic brake cycles.

use glam::Vec3;
use std::f32::consts::{FRAC_PI_2, PI};
use std::f64::consts::TAU;
use tracing::debug;

use super::oscillator::{Phase, Spin};
use super::{Mechanism, Tick};
use crate::catalog::{CatalogError, PartCatalog};
use crate::geometry::{Bevel, GeometryError, Outline};
use crate::material::{self, Color, Pole};
use crate::part::{Part, Renderable};
use crate::scene::{Geometry, MaterialId, Node, NodeId, Scene};

/// Rotor speed in revolutions per second
pub const ROTOR_REVS_PER_SECOND: f64 = 8.0;

/// Angular rate of the brake cycle in rad/s
pub const BRAKE_RATE: f64 = 10.0;

/// Coil emissive intensity at full brake
pub const MAX_COIL_INTENSITY: f64 = 0.02;

const COIL_RINGS: usize = 5;

/// Left of the movement, above the barrel
const POSITION: Vec3 = Vec3::new(-0.52, 0.28, -0.05);

const BRAKE_LOW: u32 = 0x4169e1;
const BRAKE_HIGH: u32 = 0xff8c00;

/// Brake duty at elapsed time `t`, in [0, 1]
pub fn brake_strength(t: f64) -> f64 {
    ((BRAKE_RATE * t).sin() + 1.0) / 2.0
}

/// Coil colour for a brake strength in [0, 1]
pub fn brake_color(strength: f64) -> Color {
    let strength = strength.clamp(0.0, 1.0) as f32;
    if strength < 0.5 {
        Color::hex(BRAKE_LOW).lerp(Color::WHITE, strength * 2.0)
    } else {
        Color::WHITE.lerp(Color::hex(BRAKE_HIGH), (strength - 0.5) * 2.0)
    }
}

#[derive(Debug)]
pub struct Generator {
    root: NodeId,
    rotor: NodeId,
    coil: NodeId,
    coil_material: MaterialId,
    phase: Phase,
    spin: Spin,
}

impl Generator {
    pub fn build(scene: &mut Scene, parent: NodeId) -> Result<Self, GeometryError> {
        let root = scene.add(Some(parent), Node::group("generator").at(POSITION));
        let rotor = scene.add(Some(root), Node::group("rotor"));

        let mut half = Outline::half_disc(0.06, 24)?.extrude(0.015, Some(Bevel::SOFT))?;
        half.center();
        let half = scene.add_geometry(Geometry::Mesh(half));
        let north = scene.add_material(material::magnet(Pole::North));
        let south = scene.add_material(material::magnet(Pole::South));
        scene.add(
            Some(rotor),
            Node::mesh(half, north)
                .named("rotor_north")
                .at(Vec3::new(0.03, 0.0, 0.0))
                .order(50),
        );
        scene.add(
            Some(rotor),
            Node::mesh(half, south)
                .named("rotor_south")
                .at(Vec3::new(-0.03, 0.0, 0.0))
                .rotated(Vec3::Y * PI)
                .order(50),
        );
        scene.add_mesh(
            rotor,
            Geometry::Cylinder {
                radius_top: 0.008,
                radius_bottom: 0.008,
                height: 0.04,
                segments: 16,
            },
            material::metal(material::DEFAULT_METAL),
            |n| n.rotated(Vec3::X * FRAC_PI_2).order(51),
        );

        // All rings share the coil material so one write recolours the coil
        let coil = scene.add(Some(root), Node::group("coil").at(Vec3::new(0.0, -0.12, 0.0)));
        let ring = scene.add_geometry(Geometry::Torus {
            radius: 0.04,
            tube: 0.008,
            radial_segments: 8,
            tubular_segments: 24,
        });
        let coil_material = scene.add_material(material::coil());
        for i in 0..COIL_RINGS {
            let grow = 1.0 + i as f32 * 0.05;
            scene.add(
                Some(coil),
                Node::mesh(ring, coil_material)
                    .at(Vec3::new(0.0, 0.0, (i as f32 - 2.0) * 0.006))
                    .scaled(Vec3::new(grow, grow, 1.0))
                    .order(52),
            );
        }

        debug!(rings = COIL_RINGS, "Built generator");
        Ok(Self {
            root,
            rotor,
            coil,
            coil_material,
            phase: Phase::new(),
            spin: Spin::new(TAU * ROTOR_REVS_PER_SECOND),
        })
    }

    pub fn rotor_angle(&self) -> f64 {
        self.spin.angle()
    }

    pub fn coil_material(&self) -> MaterialId {
        self.coil_material
    }
}

impl Mechanism for Generator {
    fn name(&self) -> &'static str {
        "generator"
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn update(&mut self, scene: &mut Scene, tick: &Tick<'_>) {
        let t = self.phase.advance(tick.delta_time);
        let angle = self.spin.advance(tick.delta_time);
        scene.set_rotation_z(self.rotor, angle as f32);

        let strength = brake_strength(t);
        if let Some(m) = scene.material_mut(self.coil_material) {
            m.emissive = brake_color(strength);
            m.emissive_intensity = (strength * MAX_COIL_INTENSITY) as f32;
        }
    }

    fn parts(&self, scene: &Scene, catalog: &PartCatalog) -> Result<Vec<Part>, CatalogError> {
        Ok(vec![
            Part::from_catalog(catalog, "rotor", Renderable::composite(scene, self.rotor))?,
            Part::from_catalog(catalog, "coil", Renderable::composite(scene, self.coil))?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeState;
    use std::f64::consts::PI as PI64;

    #[test]
    fn test_color_ramp_endpoints() {
        assert_eq!(brake_color(0.0), Color::hex(BRAKE_LOW));
        assert_eq!(brake_color(0.5), Color::WHITE);
        assert_eq!(brake_color(1.0), Color::hex(BRAKE_HIGH));
        // Just below the midpoint is almost white but still blue-tinted
        let c = brake_color(0.49);
        assert!(c.b > c.r);
    }

    #[test]
    fn test_brake_strength_range() {
        assert!((brake_strength(0.0) - 0.5).abs() < 1e-12);
        assert!((brake_strength(PI64 / 20.0) - 1.0).abs() < 1e-12);
        assert!(brake_strength(3.0 * PI64 / 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotor_speed_and_coil() {
        let mut scene = Scene::new();
        let parent = scene.add(None, Node::group("movement"));
        let mut generator = Generator::build(&mut scene, parent).unwrap();
        let time = TimeState::default();

        // 1/32 s is a quarter revolution at 8 rev/s
        generator.update(&mut scene, &Tick { delta_time: 0.03125, time: &time });
        assert!((generator.rotor_angle() - PI64 / 2.0).abs() < 1e-9);

        let coil = scene.material(generator.coil_material()).unwrap();
        let strength = brake_strength(0.03125);
        assert!((coil.emissive_intensity as f64 - strength * 0.02).abs() < 1e-7);
        assert!(coil.emissive_intensity <= 0.02);
    }

    #[test]
    fn test_coil_rings_share_material() {
        let mut scene = Scene::new();
        let parent = scene.add(None, Node::group("movement"));
        let generator = Generator::build(&mut scene, parent).unwrap();
        let parts = generator.parts(&scene, &PartCatalog::builtin().unwrap()).unwrap();
        let coil = &parts[1].renderable;
        assert_eq!(coil.meshes().len(), COIL_RINGS);
        for mesh in coil.meshes() {
            assert_eq!(
                scene.node(*mesh).unwrap().material,
                Some(generator.coil_material())
            );
        }
        assert_eq!(parts[0].renderable.meshes().len(), 3);
    }
}
