// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Shader identities and their display names.

Timings are grouped by the exact set of shader objects bound for a drawcall.  Grouping is
by *identity*: two distinct shader objects are distinct keys even if they were compiled
from the same source.  Turning those identities into something a human can read happens
only when a frame is resolved, never on the drawcall hot path.
*/

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// An opaque, non-null handle to a backend shader object.
///
/// For native APIs this is usually the object pointer or name the host hands us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderHandle(u64);

impl ShaderHandle {
    /// Wraps a raw handle.  Zero is the null handle, so it yields `None`.
    pub const fn new(raw: u64) -> Option<Self> {
        if raw == 0 { None } else { Some(ShaderHandle(raw)) }
    }

    /// Wraps a host object pointer.
    pub fn from_ptr<T>(ptr: *const T) -> Option<Self> {
        Self::new(ptr as usize as u64)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl Display for ShaderHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Hull,
    Domain,
    Fragment,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 5] = [
        ShaderStage::Vertex,
        ShaderStage::Geometry,
        ShaderStage::Hull,
        ShaderStage::Domain,
        ShaderStage::Fragment,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Hull => "hull",
            ShaderStage::Domain => "domain",
            ShaderStage::Fragment => "fragment",
        }
    }
}

/**
The shader stages bound for a drawcall, plus the stereo eye being rendered.

This is the payload of the host's "before drawcall" signal.  Equality and hashing cover
all six fields.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShaderCombinationKey {
    pub vertex: Option<ShaderHandle>,
    pub geometry: Option<ShaderHandle>,
    pub hull: Option<ShaderHandle>,
    pub domain: Option<ShaderHandle>,
    pub fragment: Option<ShaderHandle>,
    pub eye_index: u32,
}

impl ShaderCombinationKey {
    /// A vertex + fragment combination for the first eye, the common case.
    pub const fn new(vertex: Option<ShaderHandle>, fragment: Option<ShaderHandle>) -> Self {
        ShaderCombinationKey {
            vertex,
            geometry: None,
            hull: None,
            domain: None,
            fragment,
            eye_index: 0,
        }
    }

    pub const fn with_geometry(mut self, geometry: Option<ShaderHandle>) -> Self {
        self.geometry = geometry;
        self
    }

    pub const fn with_tessellation(
        mut self,
        hull: Option<ShaderHandle>,
        domain: Option<ShaderHandle>,
    ) -> Self {
        self.hull = hull;
        self.domain = domain;
        self
    }

    pub const fn with_eye_index(mut self, eye_index: u32) -> Self {
        self.eye_index = eye_index;
        self
    }

    pub const fn stage(&self, stage: ShaderStage) -> Option<ShaderHandle> {
        match stage {
            ShaderStage::Vertex => self.vertex,
            ShaderStage::Geometry => self.geometry,
            ShaderStage::Hull => self.hull,
            ShaderStage::Domain => self.domain,
            ShaderStage::Fragment => self.fragment,
        }
    }

    /// The bound stages, skipping unused ones.
    pub fn stages(&self) -> impl Iterator<Item = (ShaderStage, ShaderHandle)> + '_ {
        ShaderStage::ALL
            .into_iter()
            .filter_map(|stage| self.stage(stage).map(|handle| (stage, handle)))
    }
}

/**
Human-readable names for a [ShaderCombinationKey].

Absent stages stay `None` and are left out of the [Display] form.
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ShaderNames {
    pub vertex: Option<String>,
    pub geometry: Option<String>,
    pub hull: Option<String>,
    pub domain: Option<String>,
    pub fragment: Option<String>,
    pub eye_index: u32,
}

impl ShaderNames {
    /// Resolves every bound stage of `key` through `name_of`.
    pub fn resolve<F>(key: &ShaderCombinationKey, mut name_of: F) -> Self
    where
        F: FnMut(ShaderStage, ShaderHandle) -> String,
    {
        let mut names = ShaderNames {
            eye_index: key.eye_index,
            ..Default::default()
        };
        for (stage, handle) in key.stages() {
            *names.slot_mut(stage) = Some(name_of(stage, handle));
        }
        names
    }

    pub fn stage(&self, stage: ShaderStage) -> Option<&str> {
        match stage {
            ShaderStage::Vertex => self.vertex.as_deref(),
            ShaderStage::Geometry => self.geometry.as_deref(),
            ShaderStage::Hull => self.hull.as_deref(),
            ShaderStage::Domain => self.domain.as_deref(),
            ShaderStage::Fragment => self.fragment.as_deref(),
        }
    }

    fn slot_mut(&mut self, stage: ShaderStage) -> &mut Option<String> {
        match stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Geometry => &mut self.geometry,
            ShaderStage::Hull => &mut self.hull,
            ShaderStage::Domain => &mut self.domain,
            ShaderStage::Fragment => &mut self.fragment,
        }
    }
}

impl Display for ShaderNames {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for stage in ShaderStage::ALL {
            if let Some(name) = self.stage(stage) {
                if !first {
                    f.write_str(" ")?;
                }
                write!(f, "{}={}", stage.label(), name)?;
                first = false;
            }
        }
        if self.eye_index != 0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "eye={}", self.eye_index)?;
        }
        Ok(())
    }
}

/**
Debug labels for backends that cannot read a label back from the API.

Hosts register a label when they create a shader object.  A handle with no label
resolves to its hexadecimal value, so bound-but-unlabelled stages still show up.
*/
#[derive(Debug, Clone, Default)]
pub struct ShaderLabels {
    labels: HashMap<ShaderHandle, String>,
}

impl ShaderLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, handle: ShaderHandle, label: impl Into<String>) {
        self.labels.insert(handle, label.into());
    }

    pub fn remove(&mut self, handle: ShaderHandle) -> Option<String> {
        self.labels.remove(&handle)
    }

    pub fn get(&self, handle: ShaderHandle) -> Option<&str> {
        self.labels.get(&handle).map(String::as_str)
    }

    pub fn resolve(&self, handle: ShaderHandle) -> String {
        match self.get(handle) {
            Some(label) => label.to_owned(),
            None => handle.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn handle(raw: u64) -> Option<ShaderHandle> {
        ShaderHandle::new(raw)
    }

    fn hash_of(key: &ShaderCombinationKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn null_handle_is_absent() {
        assert_eq!(ShaderHandle::new(0), None);
        assert_eq!(ShaderHandle::from_ptr(std::ptr::null::<u8>()), None);
        assert_eq!(ShaderHandle::new(7).map(ShaderHandle::raw), Some(7));
    }

    #[test]
    fn keys_differ_by_every_field() {
        let base = ShaderCombinationKey::new(handle(1), handle(2));
        let variants = [
            base.with_geometry(handle(3)),
            base.with_tessellation(handle(4), None),
            base.with_tessellation(None, handle(5)),
            base.with_eye_index(1),
            ShaderCombinationKey::new(handle(9), handle(2)),
            ShaderCombinationKey::new(handle(1), handle(9)),
        ];
        for variant in variants {
            assert_ne!(base, variant);
        }
        assert_eq!(base, ShaderCombinationKey::new(handle(1), handle(2)));
        assert_eq!(
            hash_of(&base),
            hash_of(&ShaderCombinationKey::new(handle(1), handle(2)))
        );
    }

    #[test]
    fn stages_skip_unused() {
        let key = ShaderCombinationKey::new(handle(1), handle(2)).with_geometry(handle(3));
        let stages: Vec<_> = key.stages().map(|(stage, _)| stage).collect();
        assert_eq!(
            stages,
            vec![ShaderStage::Vertex, ShaderStage::Geometry, ShaderStage::Fragment]
        );
    }

    #[test]
    fn names_resolve_and_display() {
        let mut labels = ShaderLabels::new();
        labels.set(ShaderHandle::new(1).unwrap(), "lit_vs");
        labels.set(ShaderHandle::new(2).unwrap(), "lit_fs");
        let key = ShaderCombinationKey::new(handle(1), handle(2))
            .with_geometry(handle(0x30))
            .with_eye_index(1);
        let names = ShaderNames::resolve(&key, |_, h| labels.resolve(h));
        assert_eq!(names.vertex.as_deref(), Some("lit_vs"));
        assert_eq!(names.hull, None);
        assert_eq!(
            names.to_string(),
            "vertex=lit_vs geometry=0x30 fragment=lit_fs eye=1"
        );
    }
}
