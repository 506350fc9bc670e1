//! Watch Assembly - the complete movement
//!
//! Owns the scene arena and one instance of every component. Each frame the
//! same `(delta_time, TimeState)` pair is handed to the components in a
//! fixed order, which keeps frame output reproducible.
//!
//! Highlighting is reversible: the emissive state of every affected material
//! is saved before it is overwritten and restored exactly on reset. Saves
//! are keyed by material handle, because several meshes of one part may
//! share a material and only the first save holds the original value.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, PartCatalog};
use crate::geometry::GeometryError;
use crate::material::Color;
use crate::movement::{
    Balance, Barrel, Case, Escapement, GearTrain, Generator, Hands, Mechanism, Quartz, Tick,
};
use crate::part::Part;
use crate::scene::{MaterialId, Node, NodeId, Scene};
use crate::settings::{DisplayChange, DisplaySettings};
use crate::time::TimeState;

/// Emissive colour applied to highlighted meshes
pub const HIGHLIGHT_EMISSIVE: u32 = 0x444444;
pub const HIGHLIGHT_INTENSITY: f32 = 1.0;

#[derive(Error, Debug)]
pub enum MovementError {
    #[error("Failed to build geometry: {0}")]
    Geometry(#[from] GeometryError),
    #[error("Part catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Emissive colour and intensity of a material
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Emissive {
    pub color: Color,
    pub intensity: f32,
}

/// Pose of one named node after an update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePose {
    pub id: NodeId,
    pub name: String,
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emissive: Option<Emissive>,
}

/// Serializable view of the animated state, for renderers and tests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementSnapshot {
    pub time: Option<TimeState>,
    pub highlighted: Option<String>,
    pub settings: DisplaySettings,
    pub nodes: Vec<NodePose>,
}

pub struct WatchAssembly {
    scene: Scene,
    root: NodeId,
    case: Case,
    barrel: Barrel,
    gear_train: GearTrain,
    escapement: Escapement,
    balance: Balance,
    generator: Generator,
    quartz: Quartz,
    hands: Hands,
    parts: Vec<Part>,
    highlighted: Option<String>,
    saved: BTreeMap<MaterialId, Emissive>,
    settings: DisplaySettings,
    time: Option<TimeState>,
}

impl WatchAssembly {
    /// Build the movement with the built-in part catalog
    pub fn new() -> Result<Self, MovementError> {
        Self::with_catalog(&PartCatalog::builtin()?)
    }

    pub fn with_catalog(catalog: &PartCatalog) -> Result<Self, MovementError> {
        let mut scene = Scene::new();
        let root = scene.add(None, Node::group("watch"));
        let movement = scene.add(Some(root), Node::group("movement"));

        let case = Case::build(&mut scene, root)?;
        let barrel = Barrel::build(&mut scene, movement)?;
        let gear_train = GearTrain::build(&mut scene, movement)?;
        let escapement = Escapement::build(&mut scene, movement)?;
        let balance = Balance::build(&mut scene, movement)?;
        let generator = Generator::build(&mut scene, movement)?;
        let quartz = Quartz::build(&mut scene, movement)?;
        let hands = Hands::build(&mut scene, root)?;

        let mut parts = Vec::new();
        let components: [&dyn Mechanism; 8] = [
            &case,
            &barrel,
            &gear_train,
            &escapement,
            &balance,
            &generator,
            &quartz,
            &hands,
        ];
        for component in components {
            let found = component.parts(&scene, catalog)?;
            debug!(component = component.name(), parts = found.len(), "Collected parts");
            parts.extend(found);
        }

        info!(
            parts = parts.len(),
            nodes = scene.node_count(),
            materials = scene.material_count(),
            "Built watch assembly"
        );

        Ok(Self {
            scene,
            root,
            case,
            barrel,
            gear_train,
            escapement,
            balance,
            generator,
            quartz,
            hands,
            parts,
            highlighted: None,
            saved: BTreeMap::new(),
            settings: DisplaySettings::default(),
            time: None,
        })
    }

    /// Advance every component by one frame
    pub fn update(&mut self, delta_time: f32, time: &TimeState) {
        let tick = Tick { delta_time, time };
        let order: [&mut dyn Mechanism; 7] = [
            &mut self.barrel,
            &mut self.gear_train,
            &mut self.escapement,
            &mut self.balance,
            &mut self.generator,
            &mut self.quartz,
            &mut self.hands,
        ];
        for component in order {
            component.update(&mut self.scene, &tick);
        }
        self.time = Some(*time);
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Time passed to the most recent update
    pub fn time(&self) -> Option<TimeState> {
        self.time
    }

    pub fn case(&self) -> &Case {
        &self.case
    }

    pub fn gear_train(&self) -> &GearTrain {
        &self.gear_train
    }

    pub fn escapement(&self) -> &Escapement {
        &self.escapement
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// All parts in catalog order: case, barrel, gear train, escapement,
    /// balance, generator, quartz, hands
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn part(&self, id: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.id == id)
    }

    /// Resolve a picked node to the part it belongs to.
    ///
    /// Walks from the node towards the root and stops at the first node
    /// that some part claims. When several parts claim it (pallet stones
    /// inside the anchor) the part with the fewest meshes wins. Nodes no
    /// part claims fall back to a part whose id equals a node name on the
    /// way up.
    pub fn part_for_node(&self, node: NodeId) -> Option<&Part> {
        for id in self.scene.ancestors(node) {
            let claimed = self
                .parts
                .iter()
                .filter(|p| p.renderable.contains(id))
                .min_by_key(|p| p.renderable.meshes().len());
            if claimed.is_some() {
                return claimed;
            }
        }
        self.scene
            .ancestors(node)
            .filter_map(|id| self.scene.node(id)?.name.as_deref())
            .find_map(|name| self.part(name))
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.as_deref()
    }

    /// Emphasise one part, replacing any current highlight.
    /// Returns false (and changes nothing) for an unknown id.
    pub fn highlight_part(&mut self, id: &str) -> bool {
        let Some(part) = self.parts.iter().find(|p| p.id == id) else {
            warn!(part = id, "Ignoring highlight of unknown part");
            return false;
        };
        let meshes = part.renderable.meshes().to_vec();

        self.reset_highlight();

        for mesh in meshes {
            let Some(material_id) = self.scene.node(mesh).and_then(|n| n.material) else {
                continue;
            };
            let Some(material) = self.scene.material_mut(material_id) else {
                continue;
            };
            self.saved.entry(material_id).or_insert(Emissive {
                color: material.emissive,
                intensity: material.emissive_intensity,
            });
            material.emissive = Color::hex(HIGHLIGHT_EMISSIVE);
            material.emissive_intensity = HIGHLIGHT_INTENSITY;
        }

        info!(part = id, materials = self.saved.len(), "Highlighted part");
        self.highlighted = Some(id.to_string());
        true
    }

    /// Restore the saved emissive state; a no-op when nothing is highlighted
    pub fn reset_highlight(&mut self) {
        let Some(id) = self.highlighted.take() else {
            return;
        };
        if let Some(part) = self.parts.iter().find(|p| p.id == id) {
            for mesh in part.renderable.meshes() {
                let Some(material_id) = self.scene.node(*mesh).and_then(|n| n.material) else {
                    continue;
                };
                let (Some(saved), Some(material)) = (
                    self.saved.get(&material_id),
                    self.scene.material_mut(material_id),
                ) else {
                    continue;
                };
                material.emissive = saved.color;
                material.emissive_intensity = saved.intensity;
            }
        }
        self.saved.clear();
        debug!(part = %id, "Cleared highlight");
    }

    pub fn settings(&self) -> DisplaySettings {
        self.settings
    }

    /// Toggle wireframe on every material in the scene
    pub fn set_wireframe(&mut self, wireframe: bool) {
        for material in self.scene.materials_mut() {
            material.wireframe = wireframe;
        }
        self.settings.wireframe = wireframe;
    }

    /// Apply a partial settings change and return the result.
    /// Performance mode is only recorded; the renderer acts on it.
    pub fn apply_settings(&mut self, change: DisplayChange) -> DisplaySettings {
        let before = self.settings;
        self.settings.apply(change);
        if self.settings.wireframe != before.wireframe {
            self.set_wireframe(self.settings.wireframe);
        }
        if self.settings != before {
            info!(
                wireframe = self.settings.wireframe,
                performance_mode = self.settings.performance_mode,
                "Display settings changed"
            );
        }
        self.settings
    }

    /// Pose of every named node plus the current time and highlight
    pub fn snapshot(&self) -> MovementSnapshot {
        let nodes = self
            .scene
            .nodes()
            .filter_map(|(id, node)| {
                let name = node.name.clone()?;
                let emissive = self.scene.node_material(id).map(|m| Emissive {
                    color: m.emissive,
                    intensity: m.emissive_intensity,
                });
                Some(NodePose {
                    id,
                    name,
                    rotation: node.transform.rotation.to_array(),
                    scale: node.transform.scale.to_array(),
                    emissive,
                })
            })
            .collect();

        MovementSnapshot {
            time: self.time,
            highlighted: self.highlighted.clone(),
            settings: self.settings,
            nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::{balance, escapement};
    use std::collections::HashSet;

    fn assembly() -> WatchAssembly {
        WatchAssembly::new().unwrap()
    }

    fn emissive_state(assembly: &WatchAssembly) -> Vec<(u32, u32, u32, u32)> {
        let scene = assembly.scene();
        scene
            .nodes()
            .filter_map(|(id, _)| scene.node_material(id))
            .map(|m| {
                (
                    m.emissive.r.to_bits(),
                    m.emissive.g.to_bits(),
                    m.emissive.b.to_bits(),
                    m.emissive_intensity.to_bits(),
                )
            })
            .collect()
    }

    fn run(assembly: &mut WatchAssembly, frames: usize, start: f64) {
        for i in 0..frames {
            let time = TimeState::from_total_seconds(start + i as f64 / 60.0);
            assembly.update(1.0 / 60.0, &time);
        }
    }

    #[test]
    fn test_part_table() {
        let assembly = assembly();
        let ids: Vec<_> = assembly.parts().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), 21);
        assert_eq!(&ids[..4], ["dial", "case", "crystal", "barrel"]);
        assert_eq!(ids.last(), Some(&"second_hand"));
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());

        // Every catalogued part is built
        let catalog = PartCatalog::builtin().unwrap();
        for entry in &catalog.part {
            assert!(assembly.part(&entry.id).is_some(), "missing {}", entry.id);
        }
        assert!(assembly.part("tourbillon").is_none());
    }

    #[test]
    fn test_end_to_end_hands() {
        let mut assembly = assembly();
        let time = TimeState::new(3, 15, 30.0);
        assert_eq!(time.total_seconds(), 11730.0);
        assembly.update(0.016, &time);

        let snapshot = assembly.snapshot();
        let angle = |name: &str| {
            snapshot
                .nodes
                .iter()
                .find(|n| n.name == name)
                .map(|n| n.rotation[2])
                .unwrap()
        };
        assert!((angle("hour_hand") + 1.702).abs() < 1e-3);
        assert!((angle("minute_hand") + 1.623).abs() < 1e-3);
        assert!((angle("second_hand") + std::f32::consts::PI).abs() < 1e-6);
        assert_eq!(snapshot.time, Some(time));
    }

    #[test]
    fn test_gear_ratios_through_assembly() {
        let mut assembly = assembly();
        assembly.update(0.016, &TimeState::new(5, 7, 12.5));
        let train = assembly.gear_train();
        let center = train.wheel_angle("gear_center").unwrap();
        let third = train.wheel_angle("gear_third").unwrap();
        let fourth = train.wheel_angle("gear_fourth").unwrap();
        assert!((third / center + 8.0).abs() < 1e-9);
        assert!((fourth / center - 60.0).abs() < 1e-9);

        // A long pause does not shift the train
        assembly.update(0.016, &TimeState::new(5, 7, 12.5));
        assert_eq!(assembly.gear_train().wheel_angle("gear_center"), Some(center));
    }

    #[test]
    fn test_oscillators_bounded() {
        let mut assembly = assembly();
        for i in 0..600 {
            assembly.update(0.0071, &TimeState::from_total_seconds(i as f64));
            assert!(assembly.balance().angle().abs() <= balance::AMPLITUDE + 1e-12);
            assert!(assembly.escapement().anchor_angle().abs() <= escapement::AMPLITUDE + 1e-12);
        }
    }

    #[test]
    fn test_highlight_round_trip() {
        let mut assembly = assembly();
        run(&mut assembly, 37, 1000.0);
        let before = emissive_state(&assembly);

        for id in ["pallet_stones", "jewel", "coil", "balance", "dial", "second_hand"] {
            assert!(assembly.highlight_part(id));
            assert_eq!(assembly.highlighted(), Some(id));
            let part = assembly.part(id).unwrap();
            for mesh in part.renderable.meshes() {
                let m = assembly.scene().node_material(*mesh).unwrap();
                assert_eq!(m.emissive, Color::hex(HIGHLIGHT_EMISSIVE));
                assert_eq!(m.emissive_intensity, HIGHLIGHT_INTENSITY);
            }
            assembly.reset_highlight();
            assert_eq!(assembly.highlighted(), None);
            assert_eq!(emissive_state(&assembly), before, "after {id}");
        }
    }

    #[test]
    fn test_highlight_replaces_previous() {
        let mut assembly = assembly();
        run(&mut assembly, 5, 0.0);
        let before = emissive_state(&assembly);

        assert!(assembly.highlight_part("coil"));
        assert!(assembly.highlight_part("quartz"));
        let coil = assembly.generator().coil_material();
        assert_ne!(
            assembly.scene().material(coil).unwrap().emissive,
            Color::hex(HIGHLIGHT_EMISSIVE)
        );
        assembly.reset_highlight();
        assert_eq!(emissive_state(&assembly), before);
    }

    #[test]
    fn test_unknown_highlight_and_idle_reset() {
        let mut assembly = assembly();
        let before = emissive_state(&assembly);
        assert!(!assembly.highlight_part("tourbillon"));
        assert_eq!(assembly.highlighted(), None);
        assembly.reset_highlight();
        assembly.reset_highlight();
        assert_eq!(emissive_state(&assembly), before);

        // An unknown id leaves an existing highlight alone
        assert!(assembly.highlight_part("ic"));
        assert!(!assembly.highlight_part("nope"));
        assert_eq!(assembly.highlighted(), Some("ic"));
    }

    #[test]
    fn test_part_for_node() {
        let assembly = assembly();
        let scene = assembly.scene();
        let resolve = |name: &str| {
            let node = scene.find(name).unwrap();
            assembly.part_for_node(node).map(|p| p.id.as_str())
        };
        assert_eq!(resolve("pallet_stone"), Some("pallet_stones"));
        assert_eq!(resolve("anchor_body"), Some("anchor"));
        assert_eq!(resolve("gear_center_pinion"), Some("gear_center"));
        assert_eq!(resolve("balance_rim"), Some("balance"));
        assert_eq!(resolve("jewel"), Some("jewel"));
        assert_eq!(resolve("dial_base"), Some("dial"));
        assert_eq!(resolve("escape_pinion"), None);
        // Group nodes resolve through the part rooted at them
        assert_eq!(resolve("pallets"), Some("pallet_stones"));
        assert_eq!(resolve("anchor"), Some("anchor"));
        assert_eq!(resolve("watch"), None);

        // Unnamed meshes resolve too
        let dial = assembly.part("dial").unwrap();
        let ring = *dial.renderable.meshes().last().unwrap();
        assert!(scene.node(ring).unwrap().name.is_none());
        assert_eq!(assembly.part_for_node(ring).map(|p| p.id.as_str()), Some("dial"));
    }

    #[test]
    fn test_wireframe_applies_everywhere() {
        let mut assembly = assembly();
        let settings = assembly.apply_settings(DisplayChange {
            wireframe: Some(true),
            performance_mode: None,
        });
        assert!(settings.wireframe);
        let scene = assembly.scene();
        assert!(scene
            .nodes()
            .filter_map(|(id, _)| scene.node_material(id))
            .all(|m| m.wireframe));

        assembly.apply_settings(DisplayChange {
            wireframe: None,
            performance_mode: Some(true),
        });
        assert!(assembly.settings().wireframe);
        assert!(assembly.settings().performance_mode);

        assembly.set_wireframe(false);
        let scene = assembly.scene();
        assert!(scene
            .nodes()
            .filter_map(|(id, _)| scene.node_material(id))
            .all(|m| !m.wireframe));
    }

    #[test]
    fn test_frames_are_reproducible() {
        let mut a = assembly();
        let mut b = assembly();
        run(&mut a, 120, 43_200.0);
        run(&mut b, 120, 43_200.0);
        assert_eq!(a.snapshot(), b.snapshot());
        assert!(!a.snapshot().nodes.is_empty());
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut assembly = assembly();
        assembly.update(0.016, &TimeState::new(10, 10, 10.0));
        assembly.highlight_part("rotor");
        let json = serde_json::to_value(assembly.snapshot()).unwrap();
        assert_eq!(json["time"]["hours"], 10);
        assert_eq!(json["highlighted"], "rotor");
        assert!(json["nodes"].as_array().unwrap().iter().any(|n| n["name"] == "hour_hand"));
    }
}
