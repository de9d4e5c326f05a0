//! Role resolution over a loaded avatar.
//!
//! Meshes are matched to roles by substring on their scene-graph name. Only
//! meshes that carry morph targets are candidates, and the first match for
//! a role wins. Any role may stay unresolved; every write through the rig
//! is then a silent no-op.

use super::{Mesh, MeshDescriptor};
use crate::config::MeshNamesConfig;
use crate::viseme::VisemeWeights;
use tracing::{debug, info};

/// The parts of the avatar the animation drivers touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshRole {
    /// Face mesh carrying the mouth morph targets.
    Head,
    /// Teeth mesh, mirrors the head's mouth weights when it can.
    Teeth,
    /// Left eye, hidden during a blink.
    EyeLeft,
    /// Right eye, hidden during a blink.
    EyeRight,
    /// Body mesh whose morph targets drive idle gestures.
    Body,
}

impl MeshRole {
    /// Every role in resolution order.
    pub const ALL: [MeshRole; 5] = [
        MeshRole::Head,
        MeshRole::Teeth,
        MeshRole::EyeLeft,
        MeshRole::EyeRight,
        MeshRole::Body,
    ];

    fn slot(self) -> usize {
        match self {
            MeshRole::Head => 0,
            MeshRole::Teeth => 1,
            MeshRole::EyeLeft => 2,
            MeshRole::EyeRight => 3,
            MeshRole::Body => 4,
        }
    }

    fn pattern(self, names: &MeshNamesConfig) -> &str {
        match self {
            MeshRole::Head => &names.head,
            MeshRole::Teeth => &names.teeth,
            MeshRole::EyeLeft => &names.eye_left,
            MeshRole::EyeRight => &names.eye_right,
            MeshRole::Body => &names.body,
        }
    }
}

/// Mouth morph indices on a single mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouthTargets {
    /// Index of the mouth-open target.
    pub open: Option<usize>,
    /// Index of the mouth-smile target.
    pub smile: Option<usize>,
}

impl MouthTargets {
    fn resolve(mesh: Option<&Mesh>, names: &MeshNamesConfig) -> Self {
        match mesh {
            Some(m) => Self {
                open: m.dictionary().get(&names.mouth_open),
                smile: m.dictionary().get(&names.mouth_smile),
            },
            None => Self::default(),
        }
    }
}

/// A loaded avatar with its meshes assigned to roles.
#[derive(Debug, Clone, Default)]
pub struct AvatarRig {
    meshes: Vec<Mesh>,
    roles: [Option<usize>; 5],
    head_mouth: MouthTargets,
    teeth_mouth: MouthTargets,
    blink_left: Option<usize>,
    blink_right: Option<usize>,
}

impl AvatarRig {
    /// A rig with nothing loaded yet. Every driver treats it as absent.
    pub fn unloaded() -> Self {
        Self::default()
    }

    /// Build meshes from loader descriptors and resolve roles.
    pub fn from_descriptors<I>(descriptors: I, names: &MeshNamesConfig) -> Self
    where
        I: IntoIterator<Item = MeshDescriptor>,
    {
        Self::resolve(descriptors.into_iter().map(Mesh::new).collect(), names)
    }

    /// Resolve roles over already-built meshes.
    pub fn resolve(meshes: Vec<Mesh>, names: &MeshNamesConfig) -> Self {
        let mut roles = [None; 5];
        for role in MeshRole::ALL {
            let pattern = role.pattern(names);
            roles[role.slot()] = meshes.iter().position(|m| {
                !m.dictionary().is_empty() && !pattern.is_empty() && m.name().contains(pattern)
            });
        }

        let mut rig = Self {
            meshes,
            roles,
            ..Self::default()
        };
        rig.head_mouth = MouthTargets::resolve(rig.mesh(MeshRole::Head), names);
        rig.teeth_mouth = MouthTargets::resolve(rig.mesh(MeshRole::Teeth), names);
        rig.blink_left = rig
            .mesh(MeshRole::EyeLeft)
            .and_then(|m| m.dictionary().first_of(&names.blink_left));
        rig.blink_right = rig
            .mesh(MeshRole::EyeRight)
            .and_then(|m| m.dictionary().first_of(&names.blink_right));

        for role in MeshRole::ALL {
            match rig.mesh(role) {
                Some(mesh) => debug!(?role, mesh = mesh.name(), "resolved mesh role"),
                None => debug!(?role, "mesh role unresolved"),
            }
        }
        info!(
            meshes = rig.meshes.len(),
            mouth_open = ?rig.head_mouth.open,
            mouth_smile = ?rig.head_mouth.smile,
            blink_left = ?rig.blink_left,
            blink_right = ?rig.blink_right,
            "avatar rig resolved"
        );
        rig
    }

    /// All meshes in load order.
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// The mesh playing `role`, if resolved.
    pub fn mesh(&self, role: MeshRole) -> Option<&Mesh> {
        self.roles[role.slot()].and_then(|i| self.meshes.get(i))
    }

    /// Mutable access to the mesh playing `role`.
    pub fn mesh_mut(&mut self, role: MeshRole) -> Option<&mut Mesh> {
        match self.roles[role.slot()] {
            Some(i) => self.meshes.get_mut(i),
            None => None,
        }
    }

    /// Whether `role` resolved to a mesh.
    pub fn has(&self, role: MeshRole) -> bool {
        self.mesh(role).is_some()
    }

    /// Mouth indices on the head mesh.
    pub fn head_mouth(&self) -> MouthTargets {
        self.head_mouth
    }

    /// Mouth indices on the teeth mesh.
    pub fn teeth_mouth(&self) -> MouthTargets {
        self.teeth_mouth
    }

    /// Blink morph indices found on the eye meshes, left then right.
    ///
    /// Informational only: blinking hides the eye meshes rather than
    /// driving these targets.
    pub fn blink_targets(&self) -> (Option<usize>, Option<usize>) {
        (self.blink_left, self.blink_right)
    }

    /// Write open/smile weights onto the head, mirroring onto the teeth.
    ///
    /// Targets missing from either mesh are skipped.
    pub fn write_mouth(&mut self, weights: VisemeWeights) {
        let head = self.head_mouth;
        let teeth = self.teeth_mouth;
        if let Some(mesh) = self.mesh_mut(MeshRole::Head) {
            apply_mouth(mesh, head, weights);
        }
        if let Some(mesh) = self.mesh_mut(MeshRole::Teeth) {
            apply_mouth(mesh, teeth, weights);
        }
    }

    /// Show or hide both eyes. Returns `false`, changing nothing, unless
    /// both eye meshes are resolved.
    pub fn set_eyes_visible(&mut self, visible: bool) -> bool {
        if !(self.has(MeshRole::EyeLeft) && self.has(MeshRole::EyeRight)) {
            return false;
        }
        for role in [MeshRole::EyeLeft, MeshRole::EyeRight] {
            if let Some(mesh) = self.mesh_mut(role) {
                mesh.set_visible(visible);
            }
        }
        true
    }
}

fn apply_mouth(mesh: &mut Mesh, targets: MouthTargets, weights: VisemeWeights) {
    if let Some(i) = targets.open {
        mesh.set_influence(i, weights.open);
    }
    if let Some(i) = targets.smile {
        mesh.set_influence(i, weights.smile);
    }
}
