//! Display settings consumed from outside the core

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Render every material as wireframe
    #[serde(default)]
    pub wireframe: bool,
    /// Renderer-side quality trade-off; recorded but unused by the core
    #[serde(default)]
    pub performance_mode: bool,
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayChange {
    #[serde(default)]
    pub wireframe: Option<bool>,
    #[serde(default)]
    pub performance_mode: Option<bool>,
}

impl DisplaySettings {
    pub fn apply(&mut self, change: DisplayChange) {
        if let Some(wireframe) = change.wireframe {
            self.wireframe = wireframe;
        }
        if let Some(performance_mode) = change.performance_mode {
            self.performance_mode = performance_mode;
        }
    }
}
