//! Named coordinate frame tree.
//!
//! Each frame is attached to a parent frame with a rigid transform. World
//! poses are found by walking up to a root frame.

use std::collections::{HashMap, HashSet};

use glam::{DAffine3, DQuat, DVec3};

/// Transform of a frame relative to its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTransform {
    pub parent: String,
    pub position: DVec3,
    pub orientation: DQuat,
}

impl FrameTransform {
    pub fn to_affine(&self) -> DAffine3 {
        DAffine3::from_rotation_translation(self.orientation, self.position)
    }
}

/// Tree of named frames.
#[derive(Debug, Default)]
pub struct FrameTree {
    links: HashMap<String, FrameTransform>,
}

impl FrameTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `source` in `target` with the given transform.
    ///
    /// Returns false (and leaves the tree unchanged) if the link would close a
    /// cycle.
    pub fn set(&mut self, target: &str, source: &str, position: DVec3, orientation: DQuat) -> bool {
        if target == source || self.is_ancestor(source, target) {
            tracing::warn!("Ignoring transform {} -> {}: would create a cycle", source, target);
            return false;
        }
        self.links.insert(
            source.to_string(),
            FrameTransform {
                parent: target.to_string(),
                position,
                orientation: orientation.normalize(),
            },
        );
        true
    }

    /// Transform of `frame` relative to its parent.
    pub fn get(&self, frame: &str) -> Option<&FrameTransform> {
        self.links.get(frame)
    }

    /// Transform from `frame` to its root frame.
    pub fn world_transform(&self, frame: &str) -> DAffine3 {
        let mut transform = DAffine3::IDENTITY;
        let mut current = frame;
        let mut visited = HashSet::new();

        // Build transform chain from the frame up to the root
        while let Some(link) = self.links.get(current) {
            if !visited.insert(current) {
                break;
            }
            transform = link.to_affine() * transform;
            current = &link.parent;
        }

        transform
    }

    /// True if `ancestor` is on the parent chain of `frame`.
    fn is_ancestor(&self, ancestor: &str, frame: &str) -> bool {
        let mut current = frame;
        let mut visited = HashSet::new();
        while let Some(link) = self.links.get(current) {
            if !visited.insert(current) {
                return false;
            }
            if link.parent == ancestor {
                return true;
            }
            current = &link.parent;
        }
        false
    }

    pub fn remove(&mut self, frame: &str) -> Option<FrameTransform> {
        self.links.remove(frame)
    }

    pub fn clear(&mut self) {
        self.links.clear();
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_transform_chains_parents() {
        let mut tree = FrameTree::new();
        tree.set("world", "robot", DVec3::new(1.0, 0.0, 0.0), DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2));
        tree.set("robot", "sensor", DVec3::new(1.0, 0.0, 0.0), DQuat::IDENTITY);

        let p = tree.world_transform("sensor").transform_point3(DVec3::ZERO);
        assert!(p.abs_diff_eq(DVec3::new(1.0, 1.0, 0.0), 1e-12));
        assert_eq!(tree.world_transform("world"), DAffine3::IDENTITY);
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut tree = FrameTree::new();
        assert!(tree.set("world", "a", DVec3::ZERO, DQuat::IDENTITY));
        assert!(tree.set("a", "b", DVec3::ZERO, DQuat::IDENTITY));
        assert!(!tree.set("b", "a", DVec3::X, DQuat::IDENTITY));
        assert!(!tree.set("a", "a", DVec3::X, DQuat::IDENTITY));
        assert_eq!(tree.get("a").unwrap().parent, "world");
    }

    #[test]
    fn test_reparenting_replaces_link() {
        let mut tree = FrameTree::new();
        tree.set("world", "a", DVec3::X, DQuat::IDENTITY);
        tree.set("other", "a", DVec3::Y, DQuat::IDENTITY);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("a").unwrap().position, DVec3::Y);
    }
}
