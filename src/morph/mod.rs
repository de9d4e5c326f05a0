//! Morph-target (blend shape) registry.
//!
//! The asset loader hands over each mesh as a name plus the ordered list of
//! its morph target names. From that we build a name → influence-index
//! dictionary once; it is read-only afterwards. The only mutable parts of a
//! [`Mesh`] are its influence weights and its visibility flag.

pub mod rig;

pub use rig::{AvatarRig, MeshRole};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name → influence-index table for one mesh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MorphTargetDictionary {
    by_name: BTreeMap<String, usize>,
}

impl MorphTargetDictionary {
    /// Build a dictionary where each name maps to its position in `names`.
    ///
    /// A duplicated name keeps its first index.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut by_name = BTreeMap::new();
        for (index, name) in names.into_iter().enumerate() {
            by_name.entry(name.into()).or_insert(index);
        }
        Self { by_name }
    }

    /// Influence index for `name`.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// First of `candidates` present in the dictionary.
    pub fn first_of<S: AsRef<str>>(&self, candidates: &[S]) -> Option<usize> {
        candidates.iter().find_map(|c| self.get(c.as_ref()))
    }

    /// Number of distinct morph target names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True when the mesh has no morph targets.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterate `(name, index)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.by_name.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// A resolved morph target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorphTarget {
    /// Name of the owning mesh.
    pub mesh: String,
    /// Blend shape name.
    pub name: String,
    /// Slot in the mesh's influence array.
    pub index: usize,
}

/// Mesh description supplied by the asset loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshDescriptor {
    /// Node name in the scene graph.
    pub name: String,
    /// Morph target names in influence-array order.
    #[serde(default)]
    pub morph_targets: Vec<String>,
}

impl MeshDescriptor {
    /// Convenience constructor.
    pub fn new<S: Into<String>>(name: impl Into<String>, morph_targets: Vec<S>) -> Self {
        Self {
            name: name.into(),
            morph_targets: morph_targets.into_iter().map(Into::into).collect(),
        }
    }
}

/// A loaded mesh: its morph dictionary, influence weights and visibility.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    name: String,
    dictionary: MorphTargetDictionary,
    influences: Vec<f32>,
    visible: bool,
}

impl Mesh {
    /// Build a visible mesh with every influence at zero.
    pub fn new(descriptor: MeshDescriptor) -> Self {
        let influences = vec![0.0; descriptor.morph_targets.len()];
        Self {
            dictionary: MorphTargetDictionary::from_names(descriptor.morph_targets),
            name: descriptor.name,
            influences,
            visible: true,
        }
    }

    /// Scene-graph name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Morph dictionary.
    pub fn dictionary(&self) -> &MorphTargetDictionary {
        &self.dictionary
    }

    /// Current influence weights.
    pub fn influences(&self) -> &[f32] {
        &self.influences
    }

    /// Weight at `index`, if the slot exists.
    pub fn influence(&self, index: usize) -> Option<f32> {
        self.influences.get(index).copied()
    }

    /// Weight of the morph target called `name`.
    pub fn influence_of(&self, name: &str) -> Option<f32> {
        self.dictionary.get(name).and_then(|i| self.influence(i))
    }

    /// Write `value` at `index`; out-of-range slots are ignored.
    pub fn set_influence(&mut self, index: usize, value: f32) {
        if let Some(slot) = self.influences.get_mut(index) {
            *slot = value;
        }
    }

    /// Whether the mesh is drawn.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the mesh.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// All morph targets of this mesh, in name order.
    pub fn morph_targets(&self) -> Vec<MorphTarget> {
        self.dictionary
            .iter()
            .map(|(name, index)| MorphTarget {
                mesh: self.name.clone(),
                name: name.to_owned(),
                index,
            })
            .collect()
    }
}
