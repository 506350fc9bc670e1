//! Quartz crystal and IC
//!
//! Two decorative pulses with unrelated phases. Neither models the
//! 32,768 Hz crystal or the divider chain.

use glam::Vec3;
use tracing::debug;

use super::oscillator::Phase;
use super::{Mechanism, Tick};
use crate::catalog::{CatalogError, PartCatalog};
use crate::geometry::GeometryError;
use crate::material;
use crate::part::{Part, Renderable};
use crate::scene::{Geometry, MaterialId, Node, NodeId, Scene};

/// Crystal shimmer rate in rad/s
pub const CRYSTAL_RATE: f64 = 100.0;
pub const CRYSTAL_BASE: f64 = 0.3;
pub const CRYSTAL_SWING: f64 = 0.4;

/// IC pulse rate in rad/s
pub const IC_RATE: f64 = 5.0;
pub const IC_BASE: f64 = 0.1;
pub const IC_SWING: f64 = 0.3;

/// Below left, clear of the barrel
const POSITION: Vec3 = Vec3::new(-0.12, -0.28, -0.08);

#[derive(Debug)]
pub struct Quartz {
    root: NodeId,
    crystal: NodeId,
    ic: NodeId,
    crystal_material: MaterialId,
    ic_material: MaterialId,
    phase: Phase,
}

impl Quartz {
    pub fn build(scene: &mut Scene, parent: NodeId) -> Result<Self, GeometryError> {
        let root = scene.add(Some(parent), Node::group("quartz_module").at(POSITION));

        let crystal = scene.add(Some(root), Node::group("quartz"));
        let crystal_material = scene.add_material(material::quartz());
        let base = scene.add_geometry(Geometry::Cuboid {
            size: Vec3::new(0.025, 0.006, 0.008),
        });
        scene.add(
            Some(crystal),
            Node::mesh(base, crystal_material)
                .at(Vec3::new(0.0, -0.02, 0.0))
                .order(55),
        );
        let prong = scene.add_geometry(Geometry::Cuboid {
            size: Vec3::new(0.008, 0.04, 0.006),
        });
        for x in [-0.006, 0.006] {
            scene.add(
                Some(crystal),
                Node::mesh(prong, crystal_material)
                    .at(Vec3::new(x, 0.01, 0.0))
                    .order(56),
            );
        }

        let ic = scene.add(Some(root), Node::group("ic").at(Vec3::new(0.0, -0.08, 0.0)));
        let ic_material = scene.add_material(material::circuit());
        let chip = scene.add_geometry(Geometry::Cuboid {
            size: Vec3::new(0.04, 0.04, 0.008),
        });
        scene.add(Some(ic), Node::mesh(chip, ic_material).order(57));

        let pin = scene.add_geometry(Geometry::Cuboid {
            size: Vec3::new(0.004, 0.015, 0.003),
        });
        let pin_material = scene.add_material(material::metal(0xc0c0c0));
        for y in [0.025, -0.025] {
            for x in [-0.015, -0.005, 0.005, 0.015] {
                scene.add(
                    Some(ic),
                    Node::mesh(pin, pin_material)
                        .at(Vec3::new(x, y, 0.0))
                        .order(58),
                );
            }
        }

        debug!("Built quartz module");
        Ok(Self {
            root,
            crystal,
            ic,
            crystal_material,
            ic_material,
            phase: Phase::new(),
        })
    }

    pub fn crystal_material(&self) -> MaterialId {
        self.crystal_material
    }

    pub fn ic_material(&self) -> MaterialId {
        self.ic_material
    }
}

/// Crystal glow for the accumulated phase, within [0.3, 0.7]
pub fn crystal_intensity(phase: &Phase) -> f64 {
    CRYSTAL_BASE + phase.pulse(CRYSTAL_RATE) * CRYSTAL_SWING
}

/// IC glow for the accumulated phase, within [0.1, 0.4]
pub fn ic_intensity(phase: &Phase) -> f64 {
    IC_BASE + phase.pulse(IC_RATE) * IC_SWING
}

impl Mechanism for Quartz {
    fn name(&self) -> &'static str {
        "quartz"
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn update(&mut self, scene: &mut Scene, tick: &Tick<'_>) {
        self.phase.advance(tick.delta_time);
        if let Some(m) = scene.material_mut(self.crystal_material) {
            m.emissive_intensity = crystal_intensity(&self.phase) as f32;
        }
        if let Some(m) = scene.material_mut(self.ic_material) {
            m.emissive_intensity = ic_intensity(&self.phase) as f32;
        }
    }

    fn parts(&self, scene: &Scene, catalog: &PartCatalog) -> Result<Vec<Part>, CatalogError> {
        Ok(vec![
            Part::from_catalog(catalog, "quartz", Renderable::composite(scene, self.crystal))?,
            Part::from_catalog(catalog, "ic", Renderable::composite(scene, self.ic))?,
        ])
    }
}
