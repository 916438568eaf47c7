// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time-varying uniforms and the per-frame update function.
//!
//! Clock nodes declare a [`ClockSpec`]. During compilation every discovered
//! clock registers one bound value with the [`UpdateBinder`]; clocks that share a
//! source (the same instance, or the same [`ClockSource::Shared`] name) share one
//! accumulator. [`ShaderUpdate::update`] advances each accumulator once and
//! refreshes every bound value derived from it.

use crate::node::NodeId;
use crate::port::PortValue;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;

/// Where a clock's accumulated time comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClockSource {
    /// One accumulator per clock instance
    Instance,
    /// One accumulator per name, shared by every clock using it
    Shared(String),
}

/// Uniform driven by accumulated time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockSpec {
    /// Uniform name as the node's code refers to it (`u_<uniform>`)
    pub uniform: String,
    /// Accumulator the uniform reads
    pub source: ClockSource,
    /// Factor applied to the accumulated time
    pub scale: f32,
}

impl ClockSpec {
    /// Per-instance clock with unit speed
    pub fn new(uniform: impl Into<String>) -> Self {
        Self {
            uniform: uniform.into(),
            source: ClockSource::Instance,
            scale: 1.0,
        }
    }

    /// Share the accumulator with every clock using the same name
    pub fn shared(mut self, name: impl Into<String>) -> Self {
        self.source = ClockSource::Shared(name.into());
        self
    }

    /// Multiply accumulated time by `scale`
    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

/// Handle to a compiled shader's uniform values.
///
/// Clones share storage: the host reads through its copy while
/// [`ShaderUpdate`] writes through another.
#[derive(Debug, Clone, Default)]
pub struct BoundValues(Arc<RwLock<IndexMap<String, PortValue>>>);

impl BoundValues {
    fn from_map(values: IndexMap<String, PortValue>) -> Self {
        Self(Arc::new(RwLock::new(values)))
    }

    /// Current value of a uniform
    pub fn get(&self, name: &str) -> Option<PortValue> {
        self.0.read().get(name).copied()
    }

    /// Copy of all values, in registration order
    pub fn snapshot(&self) -> IndexMap<String, PortValue> {
        self.0.read().clone()
    }

    /// Uniform names, in registration order
    pub fn names(&self) -> Vec<String> {
        self.0.read().keys().cloned().collect()
    }

    /// Number of uniforms
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Whether there are no uniforms
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }
}

impl Serialize for BoundValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.read().serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum AccumulatorKey {
    Instance(NodeId),
    Shared(String),
}

/// Lookup name of an accumulator; instance and shared names never mix
#[derive(Debug, Clone, PartialEq, Eq)]
enum AccumulatorLabel {
    Instance(String),
    Shared(String),
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    /// Index into the bound value map
    slot: usize,
    /// Index into the accumulators
    accumulator: usize,
    scale: f32,
}

/// Collects clock registrations during one compilation
#[derive(Debug, Default)]
pub(crate) struct UpdateBinder {
    /// Accumulator keys and their lookup labels
    sources: IndexMap<AccumulatorKey, AccumulatorLabel>,
    bindings: Vec<Binding>,
    values: IndexMap<String, PortValue>,
}

impl UpdateBinder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a clock node; returns the global uniform name
    pub(crate) fn register(&mut self, node: NodeId, ident: &str, spec: &ClockSpec) -> String {
        let (key, label) = match &spec.source {
            ClockSource::Instance => (
                AccumulatorKey::Instance(node),
                AccumulatorLabel::Instance(ident.to_string()),
            ),
            ClockSource::Shared(name) => (
                AccumulatorKey::Shared(name.clone()),
                AccumulatorLabel::Shared(name.clone()),
            ),
        };
        let accumulator = match self.sources.get_index_of(&key) {
            Some(index) => index,
            None => self.sources.insert_full(key, label).0,
        };

        let uniform = format!("u_{ident}_{}", spec.uniform);
        let (slot, _) = self.values.insert_full(uniform.clone(), PortValue::Float(0.0));
        self.bindings.push(Binding {
            slot,
            accumulator,
            scale: spec.scale,
        });
        uniform
    }

    pub(crate) fn finish(self) -> (BoundValues, ShaderUpdate) {
        let values = BoundValues::from_map(self.values);
        let update = ShaderUpdate {
            values: values.clone(),
            accumulators: vec![0.0; self.sources.len()],
            sources: self.sources.into_values().collect(),
            bindings: self.bindings,
        };
        (values, update)
    }
}

/// Per-frame update function for one compiled shader.
///
/// Accumulated time is kept in `f64`; bound values are narrowed to `f32` when
/// written.
#[derive(Debug)]
pub struct ShaderUpdate {
    values: BoundValues,
    accumulators: Vec<f64>,
    sources: Vec<AccumulatorLabel>,
    bindings: Vec<Binding>,
}

impl ShaderUpdate {
    /// Advance every distinct clock source by `delta_seconds` and refresh the
    /// bound values derived from it.
    pub fn update(&mut self, delta_seconds: f64) {
        for accumulator in &mut self.accumulators {
            *accumulator += delta_seconds;
        }

        let mut values = self.values.0.write();
        for binding in &self.bindings {
            let time = self.accumulators[binding.accumulator] * f64::from(binding.scale);
            if let Some((_, value)) = values.get_index_mut(binding.slot) {
                *value = PortValue::Float(time as f32);
            }
        }
    }

    /// Accumulated time of a per-instance clock, by node identifier
    pub fn elapsed(&self, ident: &str) -> Option<f64> {
        self.find(|label| matches!(label, AccumulatorLabel::Instance(i) if i == ident))
    }

    /// Accumulated time of a shared clock, by source name
    pub fn shared_elapsed(&self, name: &str) -> Option<f64> {
        self.find(|label| matches!(label, AccumulatorLabel::Shared(n) if n == name))
    }

    fn find(&self, pred: impl Fn(&AccumulatorLabel) -> bool) -> Option<f64> {
        self.sources
            .iter()
            .position(pred)
            .map(|index| self.accumulators[index])
    }

    /// Number of distinct clock sources
    pub fn source_count(&self) -> usize {
        self.accumulators.len()
    }

    /// The values this function writes
    pub fn bound_values(&self) -> &BoundValues {
        &self.values
    }
}
