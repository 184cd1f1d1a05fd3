//! Visual object definition.

use std::collections::HashMap;

use uuid::Uuid;

use crate::widget::VisualDescription;

/// A model's visual in the scene.
///
/// Holds everything needed to draw the model; its placement comes from the
/// frame tree, looked up by `frame`.
#[derive(Debug, Clone)]
pub struct VisualObject {
    /// Unique identifier for this object.
    pub id: Uuid,

    /// Plugin name, unique within the scene.
    pub name: String,

    /// Frame the visual is attached to.
    pub frame: String,

    /// Marker color (RGBA).
    pub color: [u8; 4],

    /// Whether this object is drawn.
    pub visible: bool,

    /// Joint names known to this visual.
    pub joints: Vec<String>,

    /// Last applied joint positions.
    pub joint_positions: HashMap<String, f64>,
}

impl VisualObject {
    /// Creates a visual object from its description.
    pub fn from_description(desc: VisualDescription) -> Self {
        Self {
            id: Uuid::new_v4(),
            color: color_for_name(&desc.name),
            visible: true,
            joint_positions: desc.joints.iter().map(|j| (j.clone(), 0.0)).collect(),
            name: desc.name,
            frame: desc.frame,
            joints: desc.joints,
        }
    }

    /// Applies the known joints of `joints`; returns how many were applied.
    pub fn apply_joints(&mut self, joints: &[(String, f64)]) -> usize {
        let mut applied = 0;
        for (name, position) in joints {
            if let Some(slot) = self.joint_positions.get_mut(name) {
                *slot = *position;
                applied += 1;
            }
        }
        applied
    }
}

/// Stable, well-spread marker color derived from a name.
pub fn color_for_name(name: &str) -> [u8; 4] {
    // FNV-1a
    let mut hash: u32 = 0x811c_9dc5;
    for byte in name.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }

    let hue = (hash % 360) as f32;
    let (r, g, b) = hsv_to_rgb(hue, 0.65, 0.9);
    [r, g, b, 255]
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 {
        0..60 => (c, x, 0.0),
        60..120 => (x, c, 0.0),
        120..180 => (0.0, c, x),
        180..240 => (0.0, x, c),
        240..300 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |f: f32| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r), to_u8(g), to_u8(b))
}
