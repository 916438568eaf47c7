// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph discovery and ordering.
//!
//! [`GraphWalk::discover`] follows port edges from a root node, numbering each
//! instance in the order it is first reached. The walk's post-order is the
//! global topological order; per-stage orders are that list filtered to the
//! nodes participating in the stage.

use crate::compiler::CompileError;
use crate::glsl;
use crate::node::{Node, NodeId, Stage};
use crate::port::Port;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

/// Set of stages a node takes part in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stages {
    vertex: bool,
    fragment: bool,
}

impl Stages {
    /// Add a stage
    pub fn insert(&mut self, stage: Stage) {
        match stage {
            Stage::Vertex => self.vertex = true,
            Stage::Fragment => self.fragment = true,
        }
    }

    /// Check membership
    pub fn contains(&self, stage: Stage) -> bool {
        match stage {
            Stage::Vertex => self.vertex,
            Stage::Fragment => self.fragment,
        }
    }

    /// First stage in emission order, if any
    pub fn first(&self) -> Option<Stage> {
        Stage::ALL.into_iter().find(|stage| self.contains(*stage))
    }
}

/// A node reached by the walk
#[derive(Debug)]
pub struct DiscoveredNode {
    /// The instance
    pub node: Node,
    /// Generated identifier, unique within this walk
    pub ident: String,
    /// Input ports as they were when discovered
    pub inputs: IndexMap<String, Port>,
    /// Stages this node is emitted in
    pub stages: Stages,
    /// Outputs read by the fragment stage through varyings
    pub varying_outputs: IndexSet<String>,
}

/// Result of walking a graph from its root
#[derive(Debug)]
pub struct GraphWalk {
    nodes: Vec<DiscoveredNode>,
    index_of: HashMap<NodeId, usize>,
    /// Indices in dependency order (producers before consumers)
    order: Vec<usize>,
}

impl GraphWalk {
    /// Discover every node reachable from `root`.
    ///
    /// Fails with [`CompileError::GraphCycle`] when a node depends on itself.
    pub fn discover(root: &Node) -> Result<Self, CompileError> {
        let mut walk = Self {
            nodes: Vec::new(),
            index_of: HashMap::new(),
            order: Vec::new(),
        };
        let mut path = Vec::new();
        walk.visit(root, &mut path)?;
        Ok(walk)
    }

    fn visit(&mut self, node: &Node, path: &mut Vec<usize>) -> Result<usize, CompileError> {
        if let Some(&index) = self.index_of.get(&node.id()) {
            if let Some(start) = path.iter().position(|&on_path| on_path == index) {
                let mut cycle: Vec<String> = path[start..]
                    .iter()
                    .map(|&i| self.nodes[i].ident.clone())
                    .collect();
                cycle.push(self.nodes[index].ident.clone());
                return Err(CompileError::GraphCycle { path: cycle });
            }
            return Ok(index);
        }

        let index = self.nodes.len();
        let inputs = node.inputs();
        self.nodes.push(DiscoveredNode {
            node: node.clone(),
            ident: format!("{}_{index}", glsl::identifier_stem(node.name())),
            inputs: inputs.clone(),
            stages: Stages::default(),
            varying_outputs: IndexSet::new(),
        });
        self.index_of.insert(node.id(), index);

        path.push(index);
        for port in inputs.values() {
            if let Some(connection) = port.connection() {
                self.visit(connection.node(), path)?;
            }
        }
        path.pop();

        self.order.push(index);
        Ok(index)
    }

    /// Mark which stages each node takes part in.
    ///
    /// Master slot inputs demand their slot's stage. A node takes part in a
    /// stage it has a body for, or one that a participating consumer reads it
    /// in; interpolated producers read by the fragment stage are demanded in
    /// the vertex stage instead.
    pub fn assign_stages(&mut self) {
        // Consumers come before producers in reverse post-order.
        let order: Vec<usize> = self.order.iter().rev().copied().collect();
        for index in order {
            let node = self.nodes[index].node.clone();
            let template = node.template();
            let mut stages = self.nodes[index].stages;
            for stage in Stage::ALL {
                if template.stage(stage).body.is_some() {
                    stages.insert(stage);
                }
            }
            self.nodes[index].stages = stages;

            let is_master = template.is_master();
            let mut demands = Vec::new();
            for (name, port) in &self.nodes[index].inputs {
                let Some(connection) = port.connection() else {
                    continue;
                };
                let producer = self.index_of[&connection.node().id()];
                let output = connection.output().to_string();
                if is_master {
                    if let Some(slot) = template.slots.get(name) {
                        demands.push((producer, slot.stage, output));
                    }
                } else {
                    for stage in Stage::ALL.into_iter().filter(|s| stages.contains(*s)) {
                        demands.push((producer, stage, output.clone()));
                    }
                }
            }

            for (producer, stage, output) in demands {
                self.demand(producer, stage, output);
            }
        }
    }

    fn demand(&mut self, producer: usize, stage: Stage, output: String) {
        let entry = &mut self.nodes[producer];
        if stage == Stage::Fragment && entry.node.template().interpolated {
            entry.stages.insert(Stage::Vertex);
            entry.varying_outputs.insert(output);
        } else {
            entry.stages.insert(stage);
        }
    }

    /// All discovered nodes, in discovery order. The root is index 0.
    pub fn nodes(&self) -> &[DiscoveredNode] {
        &self.nodes
    }

    /// Number of discovered nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing was discovered
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a discovered node by instance ID
    pub fn get(&self, id: NodeId) -> Option<&DiscoveredNode> {
        self.index_of.get(&id).map(|&index| &self.nodes[index])
    }

    /// Nodes in dependency order (producers first), root last
    pub fn topological_order(&self) -> impl Iterator<Item = &DiscoveredNode> {
        self.order.iter().map(|&index| &self.nodes[index])
    }

    /// Nodes taking part in a stage, in dependency order, root excluded
    pub fn stage_order(&self, stage: Stage) -> impl Iterator<Item = &DiscoveredNode> {
        self.topological_order()
            .filter(move |entry| entry.stages.contains(stage) && !entry.node.is_master())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::master::Slot;
    use crate::node::NodeTemplate;
    use crate::port::{float, vec3, ValueKind};

    fn passthrough(name: &str) -> Node {
        NodeTemplate::new(name)
            .input("a", float().with_default(1.0))
            .output("value", ValueKind::Float, "in_a")
            .instantiate()
    }

    fn master(input: &Node) -> Node {
        let master = NodeTemplate::new("Master")
            .slot("position", vec3().broadcast(), Slot::vertex("csm_Position"))
            .instantiate();
        master.set_input("position", input).unwrap();
        master
    }

    #[test]
    fn test_diamond_is_discovered_once() {
        let shared = passthrough("Shared");
        let left = passthrough("Left");
        let right = passthrough("Right");
        left.set_input("a", &shared).unwrap();
        right.set_input("a", &shared).unwrap();
        let join = NodeTemplate::new("Join")
            .input("a", float().with_default(&left))
            .input("b", float().with_default(&right))
            .output("value", ValueKind::Float, "in_a + in_b")
            .instantiate();

        let walk = GraphWalk::discover(&master(&join)).unwrap();
        assert_eq!(walk.len(), 5);
        let order: Vec<&str> = walk.topological_order().map(|n| n.ident.as_str()).collect();
        assert_eq!(order, vec!["Shared_3", "Left_2", "Right_4", "Join_1", "Master_0"]);
    }

    #[test]
    fn test_cycle_is_reported_with_path() {
        let a = passthrough("A");
        let b = passthrough("B");
        a.set_input("a", &b).unwrap();
        b.set_input("a", &a).unwrap();

        let err = GraphWalk::discover(&master(&a)).unwrap_err();
        match err {
            CompileError::GraphCycle { path } => {
                assert_eq!(path, vec!["A_1", "B_2", "A_1"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let a = passthrough("A");
        a.set_input("a", &a).unwrap();
        assert!(matches!(
            GraphWalk::discover(&master(&a)),
            Err(CompileError::GraphCycle { .. })
        ));
    }

    #[test]
    fn test_stage_assignment() {
        let tinted = NodeTemplate::new("Tint")
            .input("a", float().with_default(1.0))
            .output("value", ValueKind::Float, "in_a")
            .fragment_body("out_value *= 0.5;")
            .instantiate();
        let producer = passthrough("Producer");
        tinted.set_input("a", &producer).unwrap();

        let mut walk = GraphWalk::discover(&master(&tinted)).unwrap();
        walk.assign_stages();

        let tint = walk.get(tinted.id()).unwrap();
        assert!(tint.stages.contains(Stage::Vertex));
        assert!(tint.stages.contains(Stage::Fragment));
        let producer = walk.get(producer.id()).unwrap();
        assert!(producer.stages.contains(Stage::Fragment));
        assert_eq!(walk.stage_order(Stage::Fragment).count(), 2);
    }

    #[test]
    fn test_interpolated_producer_stays_in_vertex() {
        let varying = NodeTemplate::new("World Position")
            .output("value", ValueKind::Vector3, "position")
            .interpolated()
            .instantiate();
        let shade = NodeTemplate::new("Shade")
            .input("p", vec3().with_default(&varying))
            .output("value", ValueKind::Vector3, "in_p")
            .fragment_body("out_value = normalize(out_value);")
            .instantiate();
        let master = NodeTemplate::new("Master")
            .slot("color", vec3(), Slot::fragment("csm_DiffuseColor"))
            .instantiate();
        master.set_input("color", &shade).unwrap();

        let mut walk = GraphWalk::discover(&master).unwrap();
        walk.assign_stages();

        let entry = walk.get(varying.id()).unwrap();
        assert!(entry.stages.contains(Stage::Vertex));
        assert!(!entry.stages.contains(Stage::Fragment));
        assert!(entry.varying_outputs.contains("value"));
        assert_eq!(walk.stage_order(Stage::Vertex).count(), 1);
    }
}
