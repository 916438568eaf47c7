// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stacks: a value threaded through an ordered list of filter nodes.
//!
//! A stack instance is made of three parts:
//! - the *head*, a plain node carrying the stack's name, declared inputs and
//!   declared outputs;
//! - the filters, each with its primary input wired to the previous stage's
//!   primary output (the first one to the head);
//! - the *tail* (`"<name> Output"`), whose `value` output is the last filter's
//!   output. The tail is the node handed back to the caller and forwards
//!   every [`Node::set_input`] call to the head, even for names the tail
//!   declares itself.
//!
//! With no filters the tail reads the head directly, so the stack is a
//! passthrough.

use crate::node::{Node, NodeError, NodeTemplate, NodeType, OutputSpec, Props};
use crate::port::{Port, ValueKind};
use indexmap::IndexMap;
use tracing::warn;

/// Description of a stack, produced by a builder function
#[derive(Debug, Clone)]
pub struct StackTemplate {
    /// Display name
    pub name: String,
    /// Declared inputs
    pub inputs: IndexMap<String, Port>,
    /// Declared outputs; the first one is threaded through the filters
    pub outputs: IndexMap<String, OutputSpec>,
    /// Filter instances, in application order
    pub filters: Vec<Node>,
}

impl StackTemplate {
    /// Create an empty stack
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
            filters: Vec::new(),
        }
    }

    /// Declare an input port
    pub fn input(mut self, name: impl Into<String>, port: Port) -> Self {
        self.inputs.insert(name.into(), port);
        self
    }

    /// Declare an output defined by an expression over the inputs
    pub fn output(mut self, name: impl Into<String>, kind: ValueKind, expr: impl Into<String>) -> Self {
        self.outputs.insert(
            name.into(),
            OutputSpec {
                kind,
                expr: Some(expr.into()),
            },
        );
        self
    }

    /// Append a filter
    pub fn filter(mut self, filter: Node) -> Self {
        self.filters.push(filter);
        self
    }

    /// Append several filters
    pub fn filters(mut self, filters: impl IntoIterator<Item = Node>) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Build the head, chain the filters and return the tail
    pub fn assemble(self, props: Props) -> Result<Node, NodeError> {
        let mut head = NodeTemplate::new(self.name.clone());
        head.inputs = self.inputs;
        head.outputs = self.outputs;
        let head = head.instantiate_with(props)?;

        let mut upstream = head.primary_output().ok_or_else(|| NodeError::NoOutput {
            node: self.name.clone(),
            port: String::new(),
            producer: self.name.clone(),
        })?;

        for filter in &self.filters {
            let primary = filter.primary_input().ok_or_else(|| NodeError::NoPrimaryInput {
                node: filter.name().to_string(),
            })?;
            if filter.input(&primary).is_some_and(|port| port.source.is_some()) {
                warn!(
                    stack = %self.name,
                    filter = filter.name(),
                    input = %primary,
                    "stack overrides a filter input that was already set"
                );
            }
            filter.set_input(&primary, upstream)?;
            upstream = filter.primary_output().ok_or_else(|| NodeError::NoOutput {
                node: self.name.clone(),
                port: primary.clone(),
                producer: filter.name().to_string(),
            })?;
        }

        let tail_name = format!("{} Output", self.name);
        let kind = upstream
            .kind()
            .map_err(|fault| NodeError::from_fault(&tail_name, "value", fault))?;
        let tail = NodeTemplate::new(tail_name)
            .input("value", Port::new(kind).with_default(upstream))
            .output("value", kind, "in_value");
        Ok(Node::with_delegate(tail, head))
    }
}

/// Node types built from stack templates
pub struct StackType;

impl StackType {
    /// Turn a stack builder into a node type.
    ///
    /// The builder runs once per instance, so every stack gets fresh filters.
    pub fn new<F>(id: impl Into<String>, builder: F) -> NodeType
    where
        F: Fn() -> StackTemplate + Send + Sync + 'static,
    {
        NodeType::from_constructor(id, move |props| builder().assemble(props))
    }

    /// Like [`StackType::new`], for builders whose filters can fail to build
    pub fn try_new<F>(id: impl Into<String>, builder: F) -> NodeType
    where
        F: Fn() -> Result<StackTemplate, NodeError> + Send + Sync + 'static,
    {
        NodeType::from_constructor(id, move |props| builder()?.assemble(props))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{float, vec3, PortSource, PortValue};

    fn scale_x() -> Node {
        NodeTemplate::new("Scale X")
            .input("a", vec3())
            .input("factor", float().with_default(2.0))
            .output("value", ValueKind::Vector3, "in_a")
            .vertex_body("out_value.x *= in_factor;")
            .instantiate()
    }

    fn source_node(port: &Port) -> Node {
        port.connection().unwrap().node().clone()
    }

    #[test]
    fn test_filters_are_chained() {
        let first = scale_x();
        let second = scale_x();
        let stack = StackTemplate::new("Scale Stack")
            .input("a", vec3().with_default([1.0, 1.0, 1.0]))
            .output("value", ValueKind::Vector3, "in_a")
            .filters([first.clone(), second.clone()])
            .assemble(Props::new())
            .unwrap();

        assert_eq!(stack.name(), "Scale Stack Output");
        assert_eq!(source_node(&stack.input("value").unwrap()), second);
        assert_eq!(source_node(&second.input("a").unwrap()), first);

        let head = source_node(&first.input("a").unwrap());
        assert_eq!(head.name(), "Scale Stack");
        assert_eq!(stack.delegate(), Some(&head));
    }

    #[test]
    fn test_empty_stack_is_passthrough() {
        let stack = StackTemplate::new("Empty")
            .input("a", vec3().with_default([3.0, 2.0, 1.0]))
            .output("value", ValueKind::Vector3, "in_a")
            .assemble(Props::new())
            .unwrap();

        let head = source_node(&stack.input("value").unwrap());
        assert_eq!(head.name(), "Empty");
        assert!(matches!(
            head.input("a").unwrap().source,
            Some(PortSource::Literal(PortValue::Vector3([3.0, 2.0, 1.0])))
        ));
    }

    #[test]
    fn test_props_and_set_input_reach_the_head() {
        let stack_type = StackType::new("tint_stack", || {
            StackTemplate::new("Tint Stack")
                .input("color", vec3())
                .output("value", ValueKind::Vector3, "in_color")
        });

        let stack = stack_type
            .create(Props::new().with("color", [0.5, 0.5, 0.5]))
            .unwrap();
        stack.set_input("color", [0.1, 0.2, 0.3]).unwrap();

        let head = stack.delegate().unwrap();
        assert!(matches!(
            head.input("color").unwrap().source,
            Some(PortSource::Literal(PortValue::Vector3([0.1, 0.2, 0.3])))
        ));
        assert!(matches!(
            stack.set_input("missing", 1.0),
            Err(NodeError::UnknownInput { .. })
        ));
    }

    #[test]
    fn test_input_named_like_the_tail_port_reaches_the_head() {
        let filter = scale_x();
        let stack = StackTemplate::new("Stack")
            .input("value", vec3().with_default([1.0, 1.0, 1.0]))
            .output("value", ValueKind::Vector3, "in_value")
            .filter(filter.clone())
            .assemble(Props::new())
            .unwrap();

        stack.set_input("value", [5.0, 5.0, 5.0]).unwrap();

        assert_eq!(source_node(&stack.input("value").unwrap()), filter);
        let head = stack.delegate().unwrap();
        assert!(matches!(
            head.input("value").unwrap().source,
            Some(PortSource::Literal(PortValue::Vector3([5.0, 5.0, 5.0])))
        ));
    }

    #[test]
    fn test_filter_kind_mismatch() {
        let scalar_filter = NodeTemplate::new("Scalar Filter")
            .input("a", float())
            .output("value", ValueKind::Float, "in_a")
            .instantiate();
        let err = StackTemplate::new("Bad Stack")
            .input("a", vec3().with_default([1.0, 1.0, 1.0]))
            .output("value", ValueKind::Vector3, "in_a")
            .filter(scalar_filter)
            .assemble(Props::new())
            .unwrap_err();
        assert!(matches!(
            err,
            NodeError::TypeMismatch {
                expected: ValueKind::Float,
                found: ValueKind::Vector3,
                ..
            }
        ));
    }

    #[test]
    fn test_each_instance_gets_fresh_filters() {
        let stack_type = StackType::new("scale_stack", || {
            StackTemplate::new("Scale Stack")
                .input("a", vec3().with_default([1.0, 1.0, 1.0]))
                .output("value", ValueKind::Vector3, "in_a")
                .filter(scale_x())
        });
        let one = stack_type.instance().unwrap();
        let two = stack_type.instance().unwrap();
        assert_ne!(
            source_node(&one.input("value").unwrap()),
            source_node(&two.input("value").unwrap())
        );
    }
}
