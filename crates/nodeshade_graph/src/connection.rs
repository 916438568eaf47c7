// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.
//!
//! Edges live inside the consumer's input port: a port whose source is a
//! [`Connection`] depends on the named output of the producer node.

use crate::node::{Node, NodeId};
use crate::port::{PortFault, ValueKind};

/// Reference to one declared output of a node
#[derive(Debug, Clone)]
pub struct Connection {
    /// Producer node
    node: Node,
    /// Output name on the producer
    output: String,
}

impl Connection {
    /// Create a connection to a named output
    pub fn new(node: Node, output: impl Into<String>) -> Self {
        Self {
            node,
            output: output.into(),
        }
    }

    /// Connection to the node's primary (first declared) output.
    ///
    /// Nodes without outputs produce a connection that fails validation.
    pub fn primary(node: &Node) -> Self {
        let output = node.primary_output_name().unwrap_or_default();
        Self::new(node.clone(), output)
    }

    /// The producer node
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// The producer's output name
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Check if this connection reads from a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.node.id() == node_id
    }

    /// Kind of the referenced output
    pub(crate) fn kind(&self) -> Result<ValueKind, PortFault> {
        let template = self.node.template();
        if template.outputs.is_empty() {
            return Err(PortFault::NoOutput {
                producer: self.node.name().to_string(),
            });
        }
        template
            .outputs
            .get(&self.output)
            .map(|spec| spec.kind)
            .ok_or_else(|| PortFault::UnknownOutput {
                producer: self.node.name().to_string(),
                output: self.output.clone(),
            })
    }
}
