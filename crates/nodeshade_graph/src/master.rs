// SPDX-License-Identifier: MIT OR Apache-2.0
//! Master (terminal) nodes.
//!
//! A master node has no outputs. Each of its slot inputs is assigned to a fixed
//! pipeline variable at the end of the slot's stage, e.g. `csm_Position` in the
//! vertex stage.

use crate::node::{NodeTemplate, Stage};
use crate::port::Port;
use serde::{Deserialize, Serialize};

/// Placeholder for the resolved value inside a slot template
pub const SLOT_VALUE: &str = "{value}";

/// A fixed pipeline output written by a master node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Pipeline variable assigned to
    pub target: String,
    /// Stage the assignment happens in
    pub stage: Stage,
    /// Right-hand side, with [`SLOT_VALUE`] standing for the resolved value
    pub template: String,
}

impl Slot {
    /// Slot written in the vertex stage
    pub fn vertex(target: impl Into<String>) -> Self {
        Self::new(target, Stage::Vertex)
    }

    /// Slot written in the fragment stage
    pub fn fragment(target: impl Into<String>) -> Self {
        Self::new(target, Stage::Fragment)
    }

    fn new(target: impl Into<String>, stage: Stage) -> Self {
        Self {
            target: target.into(),
            stage,
            template: SLOT_VALUE.to_string(),
        }
    }

    /// Wrap the value before assignment, e.g. `vec4({value}, 1.0)`
    pub fn wrapped(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// The assignment statement for a resolved value
    pub fn assignment(&self, value: &str) -> String {
        format!("{} = {};", self.target, self.template.replace(SLOT_VALUE, value))
    }
}

impl NodeTemplate {
    /// Declare an input bound to a pipeline slot. Slot inputs are optional:
    /// unwired ones are skipped.
    pub fn slot(mut self, name: impl Into<String>, port: Port, slot: Slot) -> Self {
        let name = name.into();
        self.inputs.insert(name.clone(), port.optional());
        self.slots.insert(name, slot);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{color, vec3};

    #[test]
    fn test_slot_assignment() {
        let slot = Slot::fragment("csm_DiffuseColor").wrapped("vec4({value}, 1.0)");
        assert_eq!(
            slot.assignment("Color_3_out_value"),
            "csm_DiffuseColor = vec4(Color_3_out_value, 1.0);"
        );
        assert_eq!(Slot::vertex("csm_Position").assignment("p"), "csm_Position = p;");
    }

    #[test]
    fn test_master_template() {
        let master = NodeTemplate::new("Master")
            .slot("position", vec3(), Slot::vertex("csm_Position"))
            .slot("color", color(), Slot::fragment("csm_DiffuseColor"))
            .instantiate();

        assert!(master.is_master());
        assert!(master.primary_output().is_none());
        assert!(master.input("position").unwrap().optional);
    }
}
