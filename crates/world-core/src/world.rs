//! Loaded world description

use std::collections::{HashMap, HashSet};

use crate::types::Pose;

/// Where a model's description came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOrigin {
    /// Declared inline as a `<model>` under `<world>`
    Inline,
    /// Pulled in by an `<include>` with the given URI
    Include(String),
}

/// One model of the world
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    /// Unique name, possibly suffixed to disambiguate duplicates
    pub name: String,
    /// Name as declared in the description
    pub declared_name: String,
    /// Initial placement relative to the world frame
    pub pose: Pose,
    /// Names of the joints declared by the model
    pub joints: Vec<String>,
    /// Excluded from visualization by the caller's ignore-set
    pub ignored: bool,
    pub origin: ModelOrigin,
    /// XML text of the `<model>` subtree
    pub source: String,
}

impl ModelEntry {
    /// Standalone SDF document containing only this model
    pub fn description(&self, version: &str) -> String {
        format!("<sdf version='{}'>{}</sdf>", version, self.source)
    }
}

/// A parsed world: its name and models in document order
#[derive(Debug, Clone, PartialEq)]
pub struct WorldDescriptor {
    pub name: String,
    /// SDF version declared on the root element
    pub version: String,
    pub models: Vec<ModelEntry>,
}

impl WorldDescriptor {
    pub fn model(&self, name: &str) -> Option<&ModelEntry> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Recorded pose of a model, ignored models included
    pub fn pose_of(&self, name: &str) -> Option<Pose> {
        self.model(name).map(|m| m.pose)
    }

    /// Models that receive a visual handle
    pub fn visible_models(&self) -> impl Iterator<Item = &ModelEntry> {
        self.models.iter().filter(|m| !m.ignored)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Hands out unique model names, suffixing repeats with a per-name counter.
///
/// The first occurrence keeps its name; later ones become `name_0`, `name_1`, ...
#[derive(Debug, Default)]
pub struct NameAllocator {
    taken: HashSet<String>,
    counters: HashMap<String, usize>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, declared: &str) -> String {
        if self.taken.insert(declared.to_string()) {
            return declared.to_string();
        }

        let counter = self.counters.entry(declared.to_string()).or_insert(0);
        loop {
            let candidate = format!("{}_{}", declared, *counter);
            *counter += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}
