//! Balance - the regulating wheel and its hairspring
//!
//! Same 4 Hz beat as the anchor with a much wider swing. The hairspring
//! follows at 30% of the wheel's angle and breathes ±5% in step with it.

use glam::Vec3;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
use std::f64::consts::PI;
use tracing::debug;

use super::oscillator::Phase;
use super::{Mechanism, Tick};
use crate::catalog::{CatalogError, PartCatalog};
use crate::geometry::{spiral, GeometryError};
use crate::material::{self, Color};
use crate::part::{Part, Renderable};
use crate::scene::{Geometry, Node, NodeId, Scene};

pub const FREQUENCY: f64 = 4.0;
pub const AMPLITUDE: f64 = PI * 1.5;

/// Hairspring angle as a fraction of the wheel angle
pub const HAIRSPRING_FOLLOW: f64 = 0.3;

/// Peak relative change of the hairspring's radial scale
pub const HAIRSPRING_BREATH: f64 = 0.05;

/// Above the escapement, linked through the anchor
const POSITION: Vec3 = Vec3::new(0.40, 0.27, 0.0);

const RIM_RADIUS: f32 = 0.06;

#[derive(Debug)]
pub struct Balance {
    root: NodeId,
    wheel: NodeId,
    hairspring: NodeId,
    phase: Phase,
    angle: f64,
}

impl Balance {
    pub fn build(scene: &mut Scene, parent: NodeId) -> Result<Self, GeometryError> {
        let root = scene.add(Some(parent), Node::group("balance_assembly").at(POSITION));
        let wheel = scene.add(Some(root), Node::group("balance"));

        scene.add_mesh(
            wheel,
            Geometry::Torus {
                radius: RIM_RADIUS,
                tube: 0.008,
                radial_segments: 8,
                tubular_segments: 32,
            },
            material::metal(0xd4af37),
            |n| n.named("balance_rim").order(40),
        );

        let spoke = scene.add_geometry(Geometry::Cuboid {
            size: Vec3::new(0.12, 0.006, 0.004),
        });
        let spoke_material = scene.add_material(material::metal(0xc0c0c0));
        for i in 0..4 {
            scene.add(
                Some(wheel),
                Node::mesh(spoke, spoke_material)
                    .rotated(Vec3::Z * i as f32 * FRAC_PI_4)
                    .order(41),
            );
        }

        scene.add_mesh(
            wheel,
            Geometry::Cylinder {
                radius_top: 0.015,
                radius_bottom: 0.015,
                height: 0.015,
                segments: 16,
            },
            material::metal(0xb0b0b0),
            |n| n.rotated(Vec3::X * FRAC_PI_2).order(42),
        );

        let weight = scene.add_geometry(Geometry::Sphere {
            radius: 0.008,
            width_segments: 8,
            height_segments: 8,
        });
        let gold = scene.add_material(material::gold());
        for at in [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y] {
            scene.add(
                Some(wheel),
                Node::mesh(weight, gold).at(at * RIM_RADIUS).order(43),
            );
        }

        let mut spring = material::spring();
        spring.color = Color::hex(0x6495ed);
        let hairspring = scene.add_mesh(
            root,
            Geometry::Tube {
                path: spiral(12.0, 0.008, 0.045, 300),
                radius: 0.001,
                radial_segments: 6,
            },
            spring,
            |n| n.named("hairspring").order(44),
        );

        debug!("Built balance wheel");
        Ok(Self {
            root,
            wheel,
            hairspring,
            phase: Phase::new(),
            angle: 0.0,
        })
    }

    /// Current wheel angle in radians
    pub fn angle(&self) -> f64 {
        self.angle
    }
}

impl Mechanism for Balance {
    fn name(&self) -> &'static str {
        "balance"
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn update(&mut self, scene: &mut Scene, tick: &Tick<'_>) {
        self.phase.advance(tick.delta_time);
        let swing = self.phase.sine_hz(FREQUENCY);
        self.angle = swing * AMPLITUDE;

        scene.set_rotation_z(self.wheel, self.angle as f32);
        scene.set_rotation_z(self.hairspring, (self.angle * HAIRSPRING_FOLLOW) as f32);
        let breath = (1.0 + swing * HAIRSPRING_BREATH) as f32;
        scene.set_scale(self.hairspring, Vec3::new(breath, breath, 1.0));
    }

    fn parts(&self, scene: &Scene, catalog: &PartCatalog) -> Result<Vec<Part>, CatalogError> {
        Ok(vec![
            Part::from_catalog(catalog, "balance", Renderable::composite(scene, self.wheel))?,
            Part::from_catalog(catalog, "hairspring", Renderable::single(self.hairspring))?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeState;

    fn balance() -> (Scene, Balance) {
        let mut scene = Scene::new();
        let parent = scene.add(None, Node::group("movement"));
        let balance = Balance::build(&mut scene, parent).unwrap();
        (scene, balance)
    }

    #[test]
    fn test_swing_is_bounded() {
        let (mut scene, mut balance) = balance();
        let time = TimeState::default();
        for _ in 0..1000 {
            balance.update(&mut scene, &Tick { delta_time: 0.011, time: &time });
            assert!(balance.angle().abs() <= AMPLITUDE + 1e-12);
        }
    }

    #[test]
    fn test_hairspring_follows_wheel() {
        let (mut scene, mut balance) = balance();
        let time = TimeState::default();
        // Peak of the first beat
        balance.update(&mut scene, &Tick { delta_time: 0.0625, time: &time });

        let wheel = scene.node(scene.find("balance").unwrap()).unwrap();
        let spring = scene.node(scene.find("hairspring").unwrap()).unwrap();
        assert!((wheel.transform.rotation.z as f64 - AMPLITUDE).abs() < 1e-5);
        assert!((spring.transform.rotation.z as f64 - AMPLITUDE * 0.3).abs() < 1e-5);
        assert!((spring.transform.scale.x - 1.05).abs() < 1e-6);
        assert_eq!(spring.transform.scale.x, spring.transform.scale.y);
        assert_eq!(spring.transform.scale.z, 1.0);
    }

    #[test]
    fn test_wheel_is_composite() {
        let (scene, balance) = balance();
        let parts = balance.parts(&scene, &PartCatalog::builtin().unwrap()).unwrap();
        // Rim, four spokes, hub, four weights
        assert_eq!(parts[0].renderable.meshes().len(), 10);
        assert_eq!(parts[1].renderable.meshes().len(), 1);
    }
}
