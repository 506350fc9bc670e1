//! Material presets
//!
//! Every constructor returns a fresh `Material` by value. Nothing here is
//! shared or cached; a component that wants several meshes to share one
//! material registers it once in the scene and reuses the handle.

use serde::{Deserialize, Serialize};

/// Linear RGB colour with components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Colour from a 0xRRGGBB literal
    pub fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as f32 / 255.0,
            g: ((value >> 8) & 0xff) as f32 / 255.0,
            b: (value & 0xff) as f32 / 255.0,
        }
    }

    /// Linear interpolation toward `other`; `t` is clamped to [0, 1]
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }
}

/// Surface parameters consumed by the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Color,
    pub emissive: Color,
    pub emissive_intensity: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub transmission: f32,
    pub thickness: f32,
    pub env_map_intensity: f32,
    pub transparent: bool,
    pub double_sided: bool,
    pub depth_write: bool,
    pub wireframe: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            emissive: Color::BLACK,
            emissive_intensity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
            opacity: 1.0,
            transmission: 0.0,
            thickness: 0.0,
            env_map_intensity: 1.0,
            transparent: false,
            double_sided: false,
            depth_write: true,
            wireframe: false,
        }
    }
}

/// Every part of the movement is see-through, rendered double sided
/// without depth writes so the layers behind stay visible.
fn see_through(color: u32, opacity: f32) -> Material {
    Material {
        color: Color::hex(color),
        opacity,
        transparent: true,
        double_sided: true,
        depth_write: false,
        ..Material::default()
    }
}

pub const DEFAULT_METAL: u32 = 0xc0c0c0;

pub fn metal(color: u32) -> Material {
    Material {
        metalness: 0.9,
        roughness: 0.2,
        env_map_intensity: 1.5,
        ..see_through(color, 0.5)
    }
}

pub fn glass() -> Material {
    Material {
        roughness: 0.05,
        transmission: 0.95,
        thickness: 0.5,
        ..see_through(0xffffff, 0.3)
    }
}

pub fn gold() -> Material {
    Material {
        metalness: 0.95,
        roughness: 0.15,
        env_map_intensity: 2.0,
        ..see_through(0xffd700, 0.75)
    }
}

pub fn ruby() -> Material {
    Material {
        roughness: 0.1,
        transmission: 0.8,
        thickness: 0.3,
        emissive: Color::hex(0xe31b23),
        emissive_intensity: 0.3,
        ..see_through(0xe31b23, 0.6)
    }
}

pub fn circuit() -> Material {
    Material {
        metalness: 0.3,
        roughness: 0.6,
        emissive: Color::hex(0x00ff00),
        emissive_intensity: 0.2,
        ..see_through(0x1a5f1a, 0.8)
    }
}

pub fn quartz() -> Material {
    Material {
        roughness: 0.05,
        transmission: 0.9,
        thickness: 0.2,
        emissive: Color::hex(0x88ccff),
        emissive_intensity: 0.5,
        ..see_through(0xffffff, 0.4)
    }
}

pub fn coil() -> Material {
    Material {
        metalness: 0.95,
        roughness: 0.3,
        emissive: Color::hex(0x4169e1),
        emissive_intensity: 0.0,
        ..see_through(0xb87333, 0.5)
    }
}

/// Magnet pole of the generator rotor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pole {
    North,
    South,
}

pub fn magnet(pole: Pole) -> Material {
    let color = match pole {
        Pole::North => 0x8a7060,
        Pole::South => 0x506878,
    };
    Material {
        metalness: 0.85,
        roughness: 0.25,
        ..see_through(color, 0.7)
    }
}

pub fn dial() -> Material {
    Material {
        metalness: 0.1,
        roughness: 0.8,
        ..see_through(0x1a1a2e, 0.85)
    }
}

pub fn hand(color: u32) -> Material {
    Material {
        metalness: 0.95,
        roughness: 0.1,
        env_map_intensity: 2.0,
        ..see_through(color, 0.9)
    }
}

pub fn spring() -> Material {
    Material {
        metalness: 0.92,
        roughness: 0.2,
        env_map_intensity: 1.5,
        ..see_through(0xc0c0c8, 0.1)
    }
}

pub fn case() -> Material {
    Material {
        metalness: 0.95,
        roughness: 0.15,
        env_map_intensity: 1.5,
        ..see_through(0x888888, 0.3)
    }
}
