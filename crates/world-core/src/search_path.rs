//! Model search path resolution for `model://` URIs

use std::path::{Path, PathBuf};

/// URI scheme for models looked up in the search roots
pub const MODEL_URI_SCHEME: &str = "model://";

/// Environment variables holding colon-separated search roots, in lookup order
pub const SEARCH_PATH_VARIABLES: [&str; 2] = ["GAZEBO_MODEL_PATH", "PATH"];

/// Default model directory relative to the home directory
pub const HOME_MODEL_DIR: &str = ".gazebo/models";

/// Ordered list of directories searched for `model://` references
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSearchPaths {
    roots: Vec<PathBuf>,
}

impl ModelSearchPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect roots from explicit paths, the home model directory and the
    /// search path environment variables.
    pub fn from_environment(explicit: &[PathBuf]) -> Self {
        let home = std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir);

        let lists: Vec<String> = SEARCH_PATH_VARIABLES
            .iter()
            .map(|var| std::env::var(var).unwrap_or_default())
            .collect();
        let list_refs: Vec<&str> = lists.iter().map(String::as_str).collect();

        Self::from_sources(explicit, home.as_deref(), &list_refs)
    }

    /// Collect roots from already-resolved sources
    pub fn from_sources(explicit: &[PathBuf], home: Option<&Path>, lists: &[&str]) -> Self {
        let mut paths = Self::new();
        for path in explicit {
            paths.add(path);
        }
        if let Some(home) = home {
            paths.add(home.join(HOME_MODEL_DIR));
        }
        for list in lists {
            for entry in split_search_list(list) {
                paths.add(entry);
            }
        }
        tracing::debug!("Registered {} model search roots", paths.roots.len());
        paths
    }

    /// Register a root. Empty and duplicate roots are ignored.
    pub fn add(&mut self, root: impl AsRef<Path>) {
        let root = root.as_ref();
        if root.as_os_str().is_empty() || self.roots.iter().any(|r| r == root) {
            return;
        }
        self.roots.push(root.to_path_buf());
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Resolve an include URI to the model description file.
    ///
    /// `model://name[/sub]` is looked up in every root in order; `file://` and
    /// plain paths are resolved relative to `base_dir`. A directory resolves to
    /// the file named in its `model.config`, or `model.sdf`.
    pub fn resolve(&self, uri: &str, base_dir: &Path) -> Option<PathBuf> {
        if let Some(rest) = uri.strip_prefix(MODEL_URI_SCHEME) {
            let rest = rest.trim_matches('/');
            if rest.is_empty() {
                return None;
            }
            return self
                .roots
                .iter()
                .map(|root| root.join(rest))
                .find_map(|candidate| model_file(&candidate));
        }

        let path_str = uri.strip_prefix("file://").unwrap_or(uri);
        let path = Path::new(path_str);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        };
        model_file(&path)
    }
}

/// Split a colon-separated search list, dropping empty entries
pub fn split_search_list(list: &str) -> Vec<PathBuf> {
    list.split(':')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Locate the description file for a model path (file or model directory)
fn model_file(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    if !path.is_dir() {
        return None;
    }

    if let Some(name) = config_sdf_name(&path.join("model.config")) {
        let candidate = path.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let fallback = path.join("model.sdf");
    fallback.is_file().then_some(fallback)
}

/// Read the first `<sdf>` entry of a `model.config` manifest
fn config_sdf_name(config_path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(config_path).ok()?;
    let doc = roxmltree::Document::parse(&content).ok()?;
    doc.descendants()
        .find(|n| n.has_tag_name("sdf"))
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
