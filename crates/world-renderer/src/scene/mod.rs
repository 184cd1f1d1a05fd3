//! Scene management for model visuals.
//!
//! This module keeps visual data apart from drawing so that widgets can
//! share the bookkeeping.

mod visual_object;

pub use visual_object::*;

use std::collections::HashMap;
use uuid::Uuid;

/// Scene containing all model visuals.
pub struct Scene {
    objects: HashMap<Uuid, VisualObject>,
    by_name: HashMap<String, Uuid>,
    dirty: bool,
}

impl Scene {
    /// Creates a new empty scene.
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            by_name: HashMap::new(),
            dirty: false,
        }
    }

    /// Returns true if the scene has been modified since last render.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the scene as clean (called after rendering).
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Adds an object to the scene, replacing any object with the same name.
    pub fn add_object(&mut self, object: VisualObject) -> Uuid {
        let id = object.id;
        if let Some(previous) = self.by_name.insert(object.name.clone(), id) {
            self.objects.remove(&previous);
        }
        self.objects.insert(id, object);
        self.dirty = true;
        id
    }

    /// Gets an object by ID.
    pub fn get_object(&self, id: Uuid) -> Option<&VisualObject> {
        self.objects.get(&id)
    }

    /// Gets a mutable reference to an object by ID.
    pub fn get_object_mut(&mut self, id: Uuid) -> Option<&mut VisualObject> {
        self.dirty = true;
        self.objects.get_mut(&id)
    }

    /// Gets an object by name.
    pub fn find(&self, name: &str) -> Option<&VisualObject> {
        self.by_name.get(name).and_then(|id| self.objects.get(id))
    }

    /// Removes an object from the scene.
    pub fn remove_object(&mut self, id: Uuid) -> Option<VisualObject> {
        let object = self.objects.remove(&id)?;
        self.by_name.remove(&object.name);
        self.dirty = true;
        Some(object)
    }

    /// Returns true if the scene contains an object with the given ID.
    pub fn contains(&self, id: Uuid) -> bool {
        self.objects.contains_key(&id)
    }

    /// Returns the number of objects in the scene.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Clears all objects from the scene.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.by_name.clear();
        self.dirty = true;
    }

    /// Returns an iterator over all objects.
    pub fn objects(&self) -> impl Iterator<Item = &VisualObject> {
        self.objects.values()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::VisualDescription;

    fn object(name: &str) -> VisualObject {
        VisualObject::from_description(VisualDescription {
            name: name.into(),
            frame: name.into(),
            sdf: String::new(),
            joints: Vec::new(),
        })
    }

    #[test]
    fn test_add_find_remove() {
        let mut scene = Scene::new();
        let id = scene.add_object(object("robot"));
        assert!(scene.is_dirty());
        assert_eq!(scene.find("robot").map(|o| o.id), Some(id));

        scene.mark_clean();
        assert!(scene.remove_object(id).is_some());
        assert!(scene.find("robot").is_none());
        assert!(scene.is_empty());
        assert!(scene.is_dirty());
    }

    #[test]
    fn test_same_name_replaces() {
        let mut scene = Scene::new();
        let first = scene.add_object(object("robot"));
        let second = scene.add_object(object("robot"));
        assert_eq!(scene.len(), 1);
        assert!(!scene.contains(first));
        assert!(scene.contains(second));
    }
}
