// SPDX-License-Identifier: MIT OR Apache-2.0
//! Declarative shader graphs for nodeshade.
//!
//! Small node descriptors (typed inputs, output expressions and optional
//! per-stage GLSL snippets) are wired into a dependency graph and compiled
//! into vertex and fragment shader source plus a per-frame update function.
//!
//! ## Architecture
//!
//! - [`port`]: typed ports and the values, expressions and edges they resolve to
//! - [`node`]: templates, instances, node types and the registry
//! - [`stack`]: nodes that thread a value through a chain of filters
//! - [`master`]: terminal nodes writing pipeline slots
//! - [`graph`]: discovery, cycle detection and ordering
//! - [`compiler`]: naming, emission and assembly of GLSL
//! - [`update`]: clock uniforms and the per-frame updater
//! - [`nodes`]: built-in node library

pub mod compiler;
pub mod connection;
pub mod glsl;
pub mod graph;
pub mod master;
pub mod node;
pub mod nodes;
pub mod port;
pub mod stack;
pub mod update;

pub use compiler::{compile_shader, CompileError, CompiledShader};
pub use connection::Connection;
pub use master::Slot;
pub use node::{ConfigurableNodeType, Node, NodeError, NodeId, NodeRegistry, NodeTemplate, NodeType, Props, Stage};
pub use port::{Port, PortSource, PortValue, Rgb, ValueKind};
pub use stack::{StackTemplate, StackType};
pub use update::{BoundValues, ClockSource, ClockSpec, ShaderUpdate};
