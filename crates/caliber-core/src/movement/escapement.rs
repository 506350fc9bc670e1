//! Escapement - escape wheel, anchor and pallet stones
//!
//! The anchor swings as a continuous sine rather than stepping. The escape
//! wheel turns at a constant rate and is not locked to the swing. Pallet
//! stones glow near the ends of the swing to suggest contact.

use glam::{Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_6};
use std::f64::consts::PI;
use tracing::debug;

use super::oscillator::{Phase, Spin};
use super::{Mechanism, Tick};
use crate::catalog::{CatalogError, PartCatalog};
use crate::gear::{Bore, GearProfile, ToothShape};
use crate::geometry::{GeometryError, Outline};
use crate::material;
use crate::part::{Part, Renderable};
use crate::scene::{Geometry, MaterialId, Node, NodeId, Scene};

/// Anchor swing frequency in hertz
pub const FREQUENCY: f64 = 4.0;

/// Anchor swing amplitude in radians
pub const AMPLITUDE: f64 = PI / 22.0;

/// Escape wheel rate in rad/s
pub const ESCAPE_RATE: f64 = -0.5;

/// Pallets light up while |swing| exceeds this fraction of the amplitude
pub const PALLET_CONTACT_THRESHOLD: f64 = 0.9;

pub const PALLET_CONTACT_INTENSITY: f32 = 0.8;
pub const PALLET_REST_INTENSITY: f32 = 0.3;

/// Fourth wheel r 0.10 plus escape pinion r 0.018 from (0.30, 0.01)
const POSITION: Vec3 = Vec3::new(0.40, 0.07, -0.04);

const ANCHOR_BODY: [Vec2; 6] = [
    Vec2::new(0.0, 0.02),
    Vec2::new(-0.04, 0.08),
    Vec2::new(-0.035, 0.09),
    Vec2::new(0.0, 0.035),
    Vec2::new(0.035, 0.09),
    Vec2::new(0.04, 0.08),
];

#[derive(Debug)]
pub struct Escapement {
    root: NodeId,
    wheel: NodeId,
    anchor: NodeId,
    pallets: NodeId,
    pallet_materials: [MaterialId; 2],
    phase: Phase,
    spin: Spin,
    anchor_angle: f64,
}

impl Escapement {
    pub fn build(scene: &mut Scene, parent: NodeId) -> Result<Self, GeometryError> {
        let root = scene.add(Some(parent), Node::group("escapement").at(POSITION));

        let profile = GearProfile::new(20, 0.08, Bore::Radius(0.01), 0.34375, ToothShape::Escape)?;
        let wheel = scene.add_mesh(
            root,
            Geometry::Mesh(profile.extrude(0.012, None)?),
            material::metal(0xc8c8c8),
            |n| n.named("gear_escape").order(35),
        );

        let pinion = GearProfile::new(8, 0.018, Bore::Ratio(0.35), 0.25, ToothShape::Pinion)?;
        scene.add_mesh(
            root,
            Geometry::Mesh(pinion.extrude(0.012, None)?),
            material::metal(0xd0d0d0),
            |n| n.named("escape_pinion").at(Vec3::new(0.0, 0.0, -0.015)).order(34),
        );

        let anchor = scene.add(Some(root), Node::group("anchor"));

        let mut body = Outline::new(ANCHOR_BODY)?.extrude(0.008, None)?;
        body.center();
        scene.add_mesh(anchor, Geometry::Mesh(body), material::metal(0xb0b0b0), |n| {
            n.named("anchor_body")
                .at(Vec3::new(0.0, 0.12, 0.0))
                .rotated(Vec3::X * FRAC_PI_2)
                .order(36)
        });

        // Stones carry their own rubies, apart from the jewel bearings
        let pallets = scene.add(Some(anchor), Node::group("pallets"));
        let stone = scene.add_geometry(Geometry::Cuboid {
            size: Vec3::new(0.015, 0.008, 0.012),
        });
        let pallet_materials = [
            scene.add_material(material::ruby()),
            scene.add_material(material::ruby()),
        ];
        for (side, material) in [(-1.0f32, pallet_materials[0]), (1.0, pallet_materials[1])] {
            scene.add(
                Some(pallets),
                Node::mesh(stone, material)
                    .named("pallet_stone")
                    .at(Vec3::new(0.035 * side, 0.16, 0.0))
                    .rotated(Vec3::Z * -side * FRAC_PI_6)
                    .order(37),
            );
        }

        scene.add_mesh(
            anchor,
            Geometry::Cylinder {
                radius_top: 0.008,
                radius_bottom: 0.008,
                height: 0.02,
                segments: 16,
            },
            material::metal(material::DEFAULT_METAL),
            |n| {
                n.named("anchor_pivot")
                    .at(Vec3::new(0.0, 0.12, 0.0))
                    .rotated(Vec3::X * FRAC_PI_2)
                    .order(36)
            },
        );

        debug!(teeth = profile.teeth, "Built escapement");
        Ok(Self {
            root,
            wheel,
            anchor,
            pallets,
            pallet_materials,
            phase: Phase::new(),
            spin: Spin::new(ESCAPE_RATE),
            anchor_angle: 0.0,
        })
    }

    pub fn anchor_angle(&self) -> f64 {
        self.anchor_angle
    }

    pub fn wheel_angle(&self) -> f64 {
        self.spin.angle()
    }

    pub fn pallet_materials(&self) -> [MaterialId; 2] {
        self.pallet_materials
    }
}

/// Pallet glow for a normalized swing value in [-1, 1]
pub fn pallet_intensity(swing: f64) -> f32 {
    if swing.abs() > PALLET_CONTACT_THRESHOLD {
        PALLET_CONTACT_INTENSITY
    } else {
        PALLET_REST_INTENSITY
    }
}

impl Mechanism for Escapement {
    fn name(&self) -> &'static str {
        "escapement"
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn update(&mut self, scene: &mut Scene, tick: &Tick<'_>) {
        self.phase.advance(tick.delta_time);
        let swing = self.phase.sine_hz(FREQUENCY);
        self.anchor_angle = swing * AMPLITUDE;
        scene.set_rotation_z(self.anchor, self.anchor_angle as f32);

        let wheel_angle = self.spin.advance(tick.delta_time);
        scene.set_rotation_z(self.wheel, wheel_angle as f32);

        let intensity = pallet_intensity(swing);
        for id in self.pallet_materials {
            if let Some(m) = scene.material_mut(id) {
                m.emissive_intensity = intensity;
            }
        }
    }

    fn parts(&self, scene: &Scene, catalog: &PartCatalog) -> Result<Vec<Part>, CatalogError> {
        Ok(vec![
            Part::from_catalog(catalog, "gear_escape", Renderable::single(self.wheel))?,
            Part::from_catalog(catalog, "anchor", Renderable::composite(scene, self.anchor))?,
            Part::from_catalog(
                catalog,
                "pallet_stones",
                Renderable::composite(scene, self.pallets),
            )?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeState;

    fn escapement() -> (Scene, Escapement) {
        let mut scene = Scene::new();
        let parent = scene.add(None, Node::group("movement"));
        let escapement = Escapement::build(&mut scene, parent).unwrap();
        (scene, escapement)
    }

    #[test]
    fn test_anchor_stays_within_amplitude() {
        let (mut scene, mut esc) = escapement();
        let time = TimeState::default();
        let mut max: f64 = 0.0;
        for _ in 0..2000 {
            esc.update(&mut scene, &Tick { delta_time: 0.0037, time: &time });
            assert!(esc.anchor_angle().abs() <= AMPLITUDE + 1e-12);
            max = max.max(esc.anchor_angle().abs());
        }
        assert!(max > AMPLITUDE * 0.99);
    }

    #[test]
    fn test_pallets_flash_near_extremes() {
        let (mut scene, mut esc) = escapement();
        let time = TimeState::default();
        // A sixteenth of a second is a quarter period at 4 Hz
        esc.update(&mut scene, &Tick { delta_time: 0.0625, time: &time });
        for id in esc.pallet_materials() {
            assert_eq!(scene.material(id).unwrap().emissive_intensity, 0.8);
        }
        esc.update(&mut scene, &Tick { delta_time: 0.0625, time: &time });
        for id in esc.pallet_materials() {
            assert_eq!(scene.material(id).unwrap().emissive_intensity, 0.3);
        }
        assert_ne!(esc.pallet_materials()[0], esc.pallet_materials()[1]);
    }

    #[test]
    fn test_threshold_is_strict() {
        assert_eq!(pallet_intensity(0.9), PALLET_REST_INTENSITY);
        assert_eq!(pallet_intensity(-0.95), PALLET_CONTACT_INTENSITY);
    }

    #[test]
    fn test_escape_wheel_turns_steadily() {
        let (mut scene, mut esc) = escapement();
        let time = TimeState::default();
        esc.update(&mut scene, &Tick { delta_time: 0.05, time: &time });
        esc.update(&mut scene, &Tick { delta_time: 0.05, time: &time });
        assert!((esc.wheel_angle() + 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_parts_nest() {
        let (scene, esc) = escapement();
        let parts = esc.parts(&scene, &PartCatalog::builtin().unwrap()).unwrap();
        let anchor = &parts[1].renderable;
        let pallets = &parts[2].renderable;
        assert_eq!(pallets.meshes().len(), 2);
        // Body, two stones, pivot
        assert_eq!(anchor.meshes().len(), 4);
        assert!(pallets.meshes().iter().all(|m| anchor.contains(*m)));
    }
}
