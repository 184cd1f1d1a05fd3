//! World description import
//!
//! Parses SDF world documents into a [`WorldDescriptor`]. Only the elements the
//! visualization needs are interpreted: `<sdf>`, `<world>`, `<model>`,
//! `<include>`, `<pose>` and `<joint>`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glam::{DQuat, DVec3};
use roxmltree::{Document, Node};

use crate::search_path::ModelSearchPaths;
use crate::types::Pose;
use crate::world::{ModelEntry, ModelOrigin, NameAllocator, WorldDescriptor};

/// SDF version assumed when the root element does not declare one
pub const DEFAULT_SDF_VERSION: &str = "1.6";

/// World name used when `<world>` has no `name` attribute
pub const DEFAULT_WORLD_NAME: &str = "default";

/// Options for world loading
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Roots searched for `model://` includes
    pub search_paths: ModelSearchPaths,
    /// Model names (after disambiguation) that get no visual
    pub ignored_models: HashSet<String>,
    /// Base directory for relative include paths
    pub base_dir: PathBuf,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            search_paths: ModelSearchPaths::new(),
            ignored_models: HashSet::new(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl LoadOptions {
    pub fn with_search_paths(mut self, search_paths: ModelSearchPaths) -> Self {
        self.search_paths = search_paths;
        self
    }

    pub fn with_ignored<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_models = names.into_iter().map(Into::into).collect();
        self
    }
}

/// Errors that can occur while loading a world description
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to parse world description: {0}")]
    Parse(String),

    #[error("Invalid world structure: {0}")]
    Structure(String),

    #[error("Failed to read '{path}': {reason}")]
    Io { path: String, reason: String },

    #[error("Invalid pose '{value}' in model '{model}'")]
    InvalidPose { model: String, value: String },

    #[error("<{element}> is missing its '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Included model not found: {0}")]
    IncludeNotFound(String),
}

/// Load a world description from a file
///
/// Relative includes resolve against the file's directory unless
/// `options.base_dir` was changed from its default.
pub fn load_file(path: impl AsRef<Path>, options: &LoadOptions) -> Result<WorldDescriptor, LoadError> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let base_dir = if options.base_dir == Path::new(".") {
        path.parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        options.base_dir.clone()
    };

    tracing::debug!("Loading world from {:?}", path);
    load_with_base(&xml, options, &base_dir)
}

/// Load a world description from XML text
pub fn load_str(xml: &str, options: &LoadOptions) -> Result<WorldDescriptor, LoadError> {
    load_with_base(xml, options, &options.base_dir)
}

fn load_with_base(
    xml: &str,
    options: &LoadOptions,
    base_dir: &Path,
) -> Result<WorldDescriptor, LoadError> {
    let doc = Document::parse(xml).map_err(|e| LoadError::Parse(e.to_string()))?;

    let root = doc.root_element();
    if !root.has_tag_name("sdf") {
        return Err(LoadError::Structure(format!(
            "expected an <sdf> root element, found <{}>",
            root.tag_name().name()
        )));
    }
    let version = root.attribute("version").unwrap_or(DEFAULT_SDF_VERSION);

    let world = child_element(root, "world")
        .ok_or_else(|| LoadError::Structure("the SDF doesn't have a <world> tag".to_string()))?;

    let world_name = world.attribute("name").unwrap_or_else(|| {
        tracing::debug!("<world> has no name, using '{}'", DEFAULT_WORLD_NAME);
        DEFAULT_WORLD_NAME
    });

    let mut names = NameAllocator::new();
    let mut models = Vec::new();

    for node in world.children().filter(|n| n.is_element()) {
        let raw = match node.tag_name().name() {
            "model" => read_model(node, xml)?,
            "include" => read_include(node, options, base_dir)?,
            _ => continue,
        };

        // Ignored models still claim their name, so the names of the other
        // models do not depend on the ignore set. With two `robot`s and
        // `robot` ignored, the second one becomes a visible `robot_0`.
        let name = names.allocate(&raw.declared_name);
        let ignored = options.ignored_models.contains(&name);
        if ignored {
            tracing::debug!("Model '{}' is ignored for visualization", name);
        }

        models.push(ModelEntry {
            name,
            declared_name: raw.declared_name,
            pose: raw.pose,
            joints: raw.joints,
            ignored,
            origin: raw.origin,
            source: raw.source,
        });
    }

    tracing::info!("Loaded world '{}' with {} models", world_name, models.len());

    Ok(WorldDescriptor {
        name: world_name.to_string(),
        version: version.to_string(),
        models,
    })
}

/// Model data before name disambiguation
struct RawModel {
    declared_name: String,
    pose: Pose,
    joints: Vec<String>,
    origin: ModelOrigin,
    source: String,
}

fn read_model(node: Node<'_, '_>, text: &str) -> Result<RawModel, LoadError> {
    let declared_name = node
        .attribute("name")
        .ok_or(LoadError::MissingAttribute {
            element: "model",
            attribute: "name",
        })?
        .to_string();

    let pose = match child_element(node, "pose") {
        Some(pose) => parse_pose(pose, &declared_name)?,
        None => Pose::IDENTITY,
    };

    let joints = node
        .children()
        .filter(|n| n.has_tag_name("joint"))
        .filter_map(|j| j.attribute("name"))
        .map(str::to_string)
        .collect();

    Ok(RawModel {
        declared_name,
        pose,
        joints,
        origin: ModelOrigin::Inline,
        source: text[node.range()].to_string(),
    })
}

fn read_include(
    node: Node<'_, '_>,
    options: &LoadOptions,
    base_dir: &Path,
) -> Result<RawModel, LoadError> {
    let uri = child_text(node, "uri").ok_or(LoadError::MissingAttribute {
        element: "include",
        attribute: "uri",
    })?;

    let path = options
        .search_paths
        .resolve(uri, base_dir)
        .ok_or_else(|| LoadError::IncludeNotFound(uri.to_string()))?;

    let content = std::fs::read_to_string(&path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let doc = Document::parse(&content)
        .map_err(|e| LoadError::Parse(format!("{}: {}", path.display(), e)))?;
    let model = doc
        .descendants()
        .find(|n| n.has_tag_name("model"))
        .ok_or_else(|| LoadError::Structure(format!("{} has no <model>", path.display())))?;

    let mut raw = read_model(model, &content)?;
    if let Some(name) = child_text(node, "name") {
        raw.declared_name = name.to_string();
    }
    if let Some(pose) = child_element(node, "pose") {
        raw.pose = parse_pose(pose, &raw.declared_name)?;
    }
    raw.origin = ModelOrigin::Include(uri.to_string());

    tracing::debug!("Resolved include {} -> {:?}", uri, path);
    Ok(raw)
}

/// Parse a `<pose>` element.
///
/// Accepts `x y z roll pitch yaw` (radians, or degrees with `degrees="true"`)
/// and `x y z qx qy qz qw` with `rotation_format="quat_xyzw"`. An empty pose is
/// the identity.
fn parse_pose(node: Node<'_, '_>, model: &str) -> Result<Pose, LoadError> {
    let text = node.text().unwrap_or("").trim();
    if text.is_empty() {
        return Ok(Pose::IDENTITY);
    }

    let invalid = || LoadError::InvalidPose {
        model: model.to_string(),
        value: text.to_string(),
    };

    let values = text
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    let quaternion = node.attribute("rotation_format") == Some("quat_xyzw");
    match (quaternion, values.as_slice()) {
        (false, &[x, y, z, roll, pitch, yaw]) => {
            let rpy = if node.attribute("degrees") == Some("true") {
                [roll.to_radians(), pitch.to_radians(), yaw.to_radians()]
            } else {
                [roll, pitch, yaw]
            };
            Ok(Pose::from_xyz_rpy([x, y, z], rpy))
        }
        (true, &[x, y, z, qx, qy, qz, qw]) => {
            let q = DQuat::from_xyzw(qx, qy, qz, qw);
            if q.length_squared() < f64::EPSILON {
                return Err(invalid());
            }
            Ok(Pose::new(DVec3::new(x, y, z), q))
        }
        _ => Err(invalid()),
    }
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    child_element(node, tag)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
