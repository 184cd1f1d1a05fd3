//! Joint state samples

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// A set of named joint positions captured at one instant.
///
/// Positions are in radians for rotational joints and metres for prismatic
/// joints. `names` and `positions` are parallel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointSample {
    pub names: Vec<String>,
    pub positions: Vec<f64>,
    pub time: SystemTime,
}

impl Default for JointSample {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            positions: Vec::new(),
            time: SystemTime::UNIX_EPOCH,
        }
    }
}

impl JointSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sample from `(name, position)` pairs, stamped now
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut sample = Self {
            time: SystemTime::now(),
            ..Self::default()
        };
        for (name, position) in pairs {
            sample.push(name, position);
        }
        sample
    }

    pub fn push(&mut self, name: impl Into<String>, position: f64) {
        self.names.push(name.into());
        self.positions.push(position);
    }

    /// Position of the named joint, if present
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.positions.get(i).copied())
    }

    /// Iterate `(name, position)` pairs. Unpaired trailing entries are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.positions.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.names.len().min(self.positions.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_and_lookup() {
        let sample = JointSample::from_pairs([("shoulder", 0.5), ("elbow", -1.0)]);
        assert_eq!(sample.len(), 2);
        assert_eq!(sample.get("elbow"), Some(-1.0));
        assert_eq!(sample.get("wrist"), None);
    }

    #[test]
    fn test_mismatched_lengths_are_truncated() {
        let sample = JointSample {
            names: vec!["a".into(), "b".into()],
            positions: vec![1.0],
            time: SystemTime::now(),
        };
        assert_eq!(sample.len(), 1);
        assert_eq!(sample.iter().collect::<Vec<_>>(), vec![("a", 1.0)]);
    }
}
