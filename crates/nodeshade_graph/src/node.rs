// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.
//!
//! A [`NodeTemplate`] is the plain description a builder function returns.
//! A [`Node`] is one instance built from a template: it owns a fresh identity,
//! and the template's input ports with caller overrides applied. A
//! [`NodeType`] wraps a builder so every call produces an independent instance.

use crate::connection::Connection;
use crate::master::Slot;
use crate::port::{Port, PortFault, PortSource, ValueKind};
use crate::update::ClockSpec;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a node instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Shading stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Per-vertex stage
    Vertex,
    /// Per-fragment stage
    Fragment,
}

impl Stage {
    /// Both stages, in emission order
    pub const ALL: [Stage; 2] = [Stage::Vertex, Stage::Fragment];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Raw GLSL a node contributes to one stage
#[derive(Debug, Clone, Default)]
pub struct StageCode {
    /// Top-level code (functions, constants), emitted once per distinct text
    pub header: Option<String>,
    /// Statements emitted after the node's outputs are initialized
    pub body: Option<String>,
}

/// A declared output
#[derive(Debug, Clone)]
pub struct OutputSpec {
    /// Output type
    pub kind: ValueKind,
    /// Initial value in terms of `in_*` names. `None` starts at zero and
    /// leaves the value to the body.
    pub expr: Option<String>,
}

/// Node description produced by a builder function
#[derive(Debug, Clone)]
pub struct NodeTemplate {
    /// Display name, also the stem of generated identifiers
    pub name: String,
    /// Input ports, in declaration order
    pub inputs: IndexMap<String, Port>,
    /// Outputs, in declaration order. The first one is the primary output.
    pub outputs: IndexMap<String, OutputSpec>,
    /// Vertex stage code
    pub vertex: StageCode,
    /// Fragment stage code
    pub fragment: StageCode,
    /// Input that a stack threads its value into (defaults to the first input)
    pub primary: Option<String>,
    /// Computed in the vertex stage and read by the fragment stage through a varying
    pub interpolated: bool,
    /// Time-varying uniform driven by the update function
    pub clock: Option<ClockSpec>,
    /// Pipeline slots written by a master node, keyed by input name
    pub slots: IndexMap<String, Slot>,
}

impl NodeTemplate {
    /// Create an empty template
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
            vertex: StageCode::default(),
            fragment: StageCode::default(),
            primary: None,
            interpolated: false,
            clock: None,
            slots: IndexMap::new(),
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

    /// Declare an output that the stage body writes
    pub fn body_output(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.outputs.insert(name.into(), OutputSpec { kind, expr: None });
        self
    }

    /// Set the vertex stage body
    pub fn vertex_body(mut self, body: impl Into<String>) -> Self {
        self.vertex.body = Some(body.into());
        self
    }

    /// Set the vertex stage header
    pub fn vertex_header(mut self, header: impl Into<String>) -> Self {
        self.vertex.header = Some(header.into());
        self
    }

    /// Set the fragment stage body
    pub fn fragment_body(mut self, body: impl Into<String>) -> Self {
        self.fragment.body = Some(body.into());
        self
    }

    /// Set the fragment stage header
    pub fn fragment_header(mut self, header: impl Into<String>) -> Self {
        self.fragment.header = Some(header.into());
        self
    }

    /// Designate the input a stack threads its value into
    pub fn primary(mut self, input: impl Into<String>) -> Self {
        self.primary = Some(input.into());
        self
    }

    /// Compute this node in the vertex stage and interpolate it for the fragment stage
    pub fn interpolated(mut self) -> Self {
        self.interpolated = true;
        self
    }

    /// Drive a uniform from the update function
    pub fn clock(mut self, clock: ClockSpec) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Get the code for a stage
    pub fn stage(&self, stage: Stage) -> &StageCode {
        match stage {
            Stage::Vertex => &self.vertex,
            Stage::Fragment => &self.fragment,
        }
    }

    /// Whether this template writes pipeline slots
    pub fn is_master(&self) -> bool {
        !self.slots.is_empty()
    }

    /// Instantiate without overrides or checks.
    ///
    /// Meant for default sub-nodes inside builders, which cannot return errors.
    /// Ports are not validated here; [`NodeType::create`] and
    /// [`NodeTemplate::instantiate_with`] validate at construction, and the
    /// compiler rejects any invalid port left by this path.
    pub fn instantiate(self) -> Node {
        Node::new(self)
    }

    /// Instantiate with caller overrides, checking every port
    pub fn instantiate_with(mut self, props: Props) -> Result<Node, NodeError> {
        for (name, source) in props.0 {
            let port = self
                .inputs
                .get_mut(&name)
                .ok_or_else(|| NodeError::UnknownProperty {
                    node: self.name.clone(),
                    property: name.clone(),
                })?;
            port.source = Some(source);
        }

        for (name, port) in &self.inputs {
            port.validate()
                .map_err(|fault| NodeError::from_fault(&self.name, name, fault))?;
        }

        Ok(Node::new(self))
    }
}

/// Caller-supplied property values, applied over a template's input defaults
#[derive(Debug, Clone, Default)]
pub struct Props(Vec<(String, PortSource)>);

impl Props {
    /// Create an empty property bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PortSource>) -> Self {
        self.0.push((name.into(), value.into()));
        self
    }

    /// Whether no property is set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

struct NodeInner {
    id: NodeId,
    /// Template with its inputs moved into `inputs`
    template: NodeTemplate,
    inputs: RwLock<IndexMap<String, Port>>,
    /// Node that owns the inputs this node exposes (stack outputs forward to their head)
    delegate: Option<Node>,
}

/// A node instance in the graph.
///
/// Cloning the handle does not copy the node: clones compare equal and are
/// emitted once by the compiler.
#[derive(Clone)]
pub struct Node(Arc<NodeInner>);

impl Node {
    /// Create a node from a template, taking its ports as they are
    pub fn new(template: NodeTemplate) -> Self {
        Self::build(template, None)
    }

    /// Create a node whose unknown inputs are forwarded to `delegate`
    pub(crate) fn with_delegate(template: NodeTemplate, delegate: Node) -> Self {
        Self::build(template, Some(delegate))
    }

    fn build(mut template: NodeTemplate, delegate: Option<Node>) -> Self {
        let inputs = std::mem::take(&mut template.inputs);
        Self(Arc::new(NodeInner {
            id: NodeId::new(),
            template,
            inputs: RwLock::new(inputs),
            delegate,
        }))
    }

    /// Unique instance ID
    pub fn id(&self) -> NodeId {
        self.0.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.0.template.name
    }

    /// The template this node was built from. Its `inputs` map is empty;
    /// use [`Node::inputs`].
    pub fn template(&self) -> &NodeTemplate {
        &self.0.template
    }

    /// Whether this is a master node
    pub fn is_master(&self) -> bool {
        self.0.template.is_master()
    }

    /// Get a copy of an input port
    pub fn input(&self, name: &str) -> Option<Port> {
        self.0.inputs.read().get(name).cloned()
    }

    /// Snapshot of all input ports
    pub fn inputs(&self) -> IndexMap<String, Port> {
        self.0.inputs.read().clone()
    }

    /// Node whose inputs this node forwards to, if any
    pub fn delegate(&self) -> Option<&Node> {
        self.0.delegate.as_ref()
    }

    /// Wire or override an input after construction.
    ///
    /// Nodes with a delegate own none of their inputs: every call goes to the
    /// delegate, so a stack's link to its last filter cannot be replaced.
    pub fn set_input(&self, name: &str, source: impl Into<PortSource>) -> Result<(), NodeError> {
        let source = source.into();
        if let Some(delegate) = &self.0.delegate {
            return delegate.set_input(name, source);
        }

        let mut inputs = self.0.inputs.write();
        let Some(port) = inputs.get_mut(name) else {
            return Err(NodeError::UnknownInput {
                node: self.name().to_string(),
                port: name.to_string(),
            });
        };

        let mut candidate = port.clone();
        candidate.source = Some(source);
        candidate
            .validate()
            .map_err(|fault| NodeError::from_fault(self.name(), name, fault))?;
        *port = candidate;
        Ok(())
    }

    /// Connection to a named output
    pub fn output(&self, name: impl Into<String>) -> Connection {
        Connection::new(self.clone(), name)
    }

    /// Name of the primary output
    pub fn primary_output_name(&self) -> Option<String> {
        self.0.template.outputs.keys().next().cloned()
    }

    /// Connection to the primary output
    pub fn primary_output(&self) -> Option<Connection> {
        self.primary_output_name().map(|name| self.output(name))
    }

    /// Name of the input a stack threads into
    pub fn primary_input(&self) -> Option<String> {
        self.0
            .template
            .primary
            .clone()
            .or_else(|| self.0.inputs.read().keys().next().cloned())
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Ports are left out: graphs may be cyclic.
        f.debug_struct("Node")
            .field("id", &self.0.id)
            .field("name", &self.0.template.name)
            .finish_non_exhaustive()
    }
}

/// Reusable node constructor
#[derive(Clone)]
pub struct NodeType {
    id: String,
    make: Arc<dyn Fn(Props) -> Result<Node, NodeError> + Send + Sync>,
}

impl NodeType {
    /// Turn a template builder into a node type
    pub fn new<F>(id: impl Into<String>, builder: F) -> Self
    where
        F: Fn() -> NodeTemplate + Send + Sync + 'static,
    {
        Self::from_constructor(id, move |props| builder().instantiate_with(props))
    }

    /// Wrap an arbitrary constructor (used by stacks)
    pub fn from_constructor<F>(id: impl Into<String>, make: F) -> Self
    where
        F: Fn(Props) -> Result<Node, NodeError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            make: Arc::new(make),
        }
    }

    /// Type identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Build a new instance with caller overrides
    pub fn create(&self, props: Props) -> Result<Node, NodeError> {
        (self.make)(props)
    }

    /// Build a new instance with template defaults
    pub fn instance(&self) -> Result<Node, NodeError> {
        self.create(Props::new())
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeType").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Node type that takes a configuration before its properties
/// (e.g. the axis a filter operates on)
pub struct ConfigurableNodeType<C> {
    id: String,
    builder: Arc<dyn Fn(&C) -> NodeTemplate + Send + Sync>,
}

impl<C> ConfigurableNodeType<C>
where
    C: Send + Sync + 'static,
{
    /// Turn a configurable template builder into a configurable node type
    pub fn new<F>(id: impl Into<String>, builder: F) -> Self
    where
        F: Fn(&C) -> NodeTemplate + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            builder: Arc::new(builder),
        }
    }

    /// Specialize to a configuration, returning a fresh node type
    pub fn with(&self, config: C) -> NodeType {
        let builder = Arc::clone(&self.builder);
        NodeType::new(self.id.clone(), move || builder(&config))
    }
}

impl<C> Clone for ConfigurableNodeType<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            builder: Arc::clone(&self.builder),
        }
    }
}

/// Registry of available node types
pub struct NodeRegistry {
    /// Registered node types by ID
    types: IndexMap<String, NodeType>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Register a node type
    pub fn register(&mut self, node_type: NodeType) {
        self.types.insert(node_type.id().to_string(), node_type);
    }

    /// Get a node type by ID
    pub fn get(&self, id: &str) -> Option<&NodeType> {
        self.types.get(id)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Create a node from a type ID
    pub fn create_node(&self, type_id: &str, props: Props) -> Result<Node, NodeError> {
        self.get(type_id)
            .ok_or_else(|| NodeError::UnknownType(type_id.to_string()))?
            .create(props)
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Error when constructing or wiring a node
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Property does not match a declared input
    #[error("{node}: unknown property `{property}`")]
    UnknownProperty {
        /// Node display name
        node: String,
        /// Property name
        property: String,
    },

    /// Input does not exist
    #[error("{node}: no input named `{port}`")]
    UnknownInput {
        /// Node display name
        node: String,
        /// Input name
        port: String,
    },

    /// Wired value does not fit the port
    #[error("{node}.{port}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Node display name
        node: String,
        /// Input name
        port: String,
        /// Declared kind
        expected: ValueKind,
        /// Kind of the wired value
        found: ValueKind,
    },

    /// Producer has no outputs (e.g. a master node)
    #[error("{node}.{port}: `{producer}` has no outputs to connect")]
    NoOutput {
        /// Node display name
        node: String,
        /// Input name
        port: String,
        /// Producer display name
        producer: String,
    },

    /// Producer has no output by that name
    #[error("{node}.{port}: `{producer}` has no output `{output}`")]
    UnknownOutput {
        /// Node display name
        node: String,
        /// Input name
        port: String,
        /// Producer display name
        producer: String,
        /// Requested output
        output: String,
    },

    /// Literal has a NaN or infinite component
    #[error("{node}.{port}: literal is not a finite number")]
    NonFiniteLiteral {
        /// Node display name
        node: String,
        /// Input name
        port: String,
    },

    /// Filter in a stack has no input to thread into
    #[error("{node}: filter has no primary input")]
    NoPrimaryInput {
        /// Filter display name
        node: String,
    },

    /// Registry lookup failed
    #[error("Unknown node type: {0}")]
    UnknownType(String),
}

impl NodeError {
    pub(crate) fn from_fault(node: &str, port: &str, fault: PortFault) -> Self {
        let node = node.to_string();
        let port = port.to_string();
        match fault {
            PortFault::Mismatch { expected, found } => Self::TypeMismatch {
                node,
                port,
                expected,
                found,
            },
            PortFault::NoOutput { producer } => Self::NoOutput {
                node,
                port,
                producer,
            },
            PortFault::UnknownOutput { producer, output } => Self::UnknownOutput {
                node,
                port,
                producer,
                output,
            },
            PortFault::NonFinite => Self::NonFiniteLiteral { node, port },
        }
    }
}
