// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compilation of a node graph to GLSL.
//!
//! [`compile_shader`] walks the graph from a master node, orders it per stage,
//! emits one block of statements per node and finishes each stage with the
//! master's slot assignments. Generated names follow one scheme:
//!
//! | Name | Meaning |
//! |------|---------|
//! | `<Stem>_<n>_in_<port>` | literal or raw input |
//! | `<Stem>_<n>_out_<output>` | node output |
//! | `v_<Stem>_<n>_<output>` | varying carrying an interpolated output |
//! | `u_<Stem>_<n>_<uniform>` | bound uniform of a clock node |
//!
//! `<n>` is the discovery index, so compiling the same graph shape twice
//! yields identical text.

use crate::connection::Connection;
use crate::glsl;
use crate::graph::{DiscoveredNode, GraphWalk};
use crate::node::{Node, NodeId, Stage};
use crate::port::{Port, PortFault, PortSource, ValueKind};
use crate::update::{BoundValues, ShaderUpdate, UpdateBinder};
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, trace};

const INDENT: &str = "    ";

/// Output of a successful compilation
#[derive(Debug, Clone, Serialize)]
pub struct CompiledShader {
    vertex_source: String,
    fragment_source: String,
    bound_values: BoundValues,
}

impl CompiledShader {
    /// Vertex shader source
    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    /// Fragment shader source
    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    /// Source for a stage
    pub fn source(&self, stage: Stage) -> &str {
        match stage {
            Stage::Vertex => &self.vertex_source,
            Stage::Fragment => &self.fragment_source,
        }
    }

    /// Uniform values, refreshed by the companion [`ShaderUpdate`]
    pub fn bound_values(&self) -> &BoundValues {
        &self.bound_values
    }
}

/// Compile the graph rooted at a master node.
///
/// Returns the shader and the update function driving its bound values.
/// Any error aborts the whole compilation.
pub fn compile_shader(root: &Node) -> Result<(CompiledShader, ShaderUpdate), CompileError> {
    if !root.is_master() {
        return Err(CompileError::RootNotMaster {
            node: root.name().to_string(),
        });
    }

    let mut walk = GraphWalk::discover(root)?;
    walk.assign_stages();
    debug!(nodes = walk.len(), root = root.name(), "discovered shader graph");

    check_ports(&walk)?;
    check_slots(&walk)?;

    let mut binder = UpdateBinder::new();
    let mut uniforms = HashMap::new();
    for entry in walk.nodes() {
        if let Some(clock) = &entry.node.template().clock {
            let name = binder.register(entry.node.id(), &entry.ident, clock);
            uniforms.insert(entry.node.id(), name);
        }
    }

    let emitter = Emitter {
        walk: &walk,
        uniforms: &uniforms,
    };
    let vertex_source = emitter.emit_stage(Stage::Vertex)?;
    let fragment_source = emitter.emit_stage(Stage::Fragment)?;

    let (bound_values, update) = binder.finish();
    debug!(
        uniforms = bound_values.len(),
        clocks = update.source_count(),
        "compiled shader graph"
    );

    Ok((
        CompiledShader {
            vertex_source,
            fragment_source,
            bound_values,
        },
        update,
    ))
}

/// Every required port must have a source whose kind fits.
fn check_ports(walk: &GraphWalk) -> Result<(), CompileError> {
    for entry in walk.nodes() {
        let stage = entry.stages.first();
        for (name, port) in &entry.inputs {
            if port.source.is_none() {
                if port.optional {
                    continue;
                }
                return Err(CompileError::UnresolvedPort {
                    node: entry.ident.clone(),
                    port: name.clone(),
                    stage,
                });
            }
            port.validate()
                .map_err(|fault| CompileError::from_fault(&entry.ident, name, stage, fault))?;
        }
    }
    Ok(())
}

/// At most one wired input may target each master slot.
fn check_slots(walk: &GraphWalk) -> Result<(), CompileError> {
    let root = &walk.nodes()[0];
    let mut writers: HashMap<&str, &str> = HashMap::new();
    for (name, slot) in &root.node.template().slots {
        let wired = root
            .inputs
            .get(name)
            .is_some_and(|port| port.source.is_some());
        if !wired {
            continue;
        }
        if let Some(first) = writers.insert(slot.target.as_str(), name.as_str()) {
            return Err(CompileError::DuplicateSlotWrite {
                slot: slot.target.clone(),
                first: first.to_string(),
                second: name.clone(),
            });
        }
    }
    Ok(())
}

struct Emitter<'a> {
    walk: &'a GraphWalk,
    uniforms: &'a HashMap<NodeId, String>,
}

impl Emitter<'_> {
    fn emit_stage(&self, stage: Stage) -> Result<String, CompileError> {
        let mut headers = IndexSet::new();
        let mut uniforms = Vec::new();
        let mut statements = Vec::new();

        for entry in self.walk.stage_order(stage) {
            trace!(node = %entry.ident, %stage, "emitting node");
            let template = entry.node.template();
            if let Some(header) = &template.stage(stage).header {
                headers.insert(header.trim().to_string());
            }
            if let Some(uniform) = self.uniforms.get(&entry.node.id()) {
                uniforms.push(format!("uniform float {uniform};"));
            }
            self.emit_node(entry, stage, &mut statements)?;
        }

        let root = &self.walk.nodes()[0];
        for (name, slot) in &root.node.template().slots {
            if slot.stage != stage {
                continue;
            }
            let Some(port) = root.inputs.get(name) else {
                continue;
            };
            let Some(value) = self.resolve_inline(root, name, port, stage)? else {
                continue;
            };
            statements.push(slot.assignment(&value));
        }

        let varyings: Vec<String> = self
            .walk
            .nodes()
            .iter()
            .flat_map(|entry| {
                let template = entry.node.template();
                entry.varying_outputs.iter().filter_map(move |output| {
                    template.outputs.get(output).map(|spec| {
                        format!("varying {} v_{}_{output};", spec.kind.glsl_type(), entry.ident)
                    })
                })
            })
            .collect();

        debug!(%stage, statements = statements.len(), "emitted stage");
        Ok(assemble(&uniforms, &varyings, &headers, &statements))
    }

    fn emit_node(
        &self,
        entry: &DiscoveredNode,
        stage: Stage,
        out: &mut Vec<String>,
    ) -> Result<(), CompileError> {
        let template = entry.node.template();
        let ident = &entry.ident;
        out.push(format!("// {} ({ident})", template.name));

        let mut inputs: HashMap<&str, String> = HashMap::new();
        for (name, port) in &entry.inputs {
            let reference = match &port.source {
                Some(PortSource::Connection(connection)) => {
                    self.reference(entry, name, port, connection, stage)?
                }
                Some(PortSource::Literal(value)) => {
                    let variable = format!("{ident}_in_{name}");
                    let literal = glsl::coerce(&value.to_glsl(), value.kind(), port.kind);
                    out.push(format!("{} {variable} = {literal};", port.kind.glsl_type()));
                    variable
                }
                Some(PortSource::Raw(expr)) => {
                    let variable = format!("{ident}_in_{name}");
                    out.push(format!("{} {variable} = {expr};", port.kind.glsl_type()));
                    variable
                }
                None => {
                    return Err(CompileError::UnresolvedPort {
                        node: ident.clone(),
                        port: name.clone(),
                        stage: Some(stage),
                    })
                }
            };
            inputs.insert(name.as_str(), reference);
        }

        let uniform = self.uniforms.get(&entry.node.id());
        let rename = |word: &str| -> Result<Option<String>, CompileError> {
            if let Some(port) = word.strip_prefix("in_") {
                return inputs
                    .get(port)
                    .cloned()
                    .map(Some)
                    .ok_or_else(|| CompileError::UnresolvedPort {
                        node: ident.clone(),
                        port: port.to_string(),
                        stage: Some(stage),
                    });
            }
            if let Some(output) = word.strip_prefix("out_") {
                if template.outputs.contains_key(output) {
                    return Ok(Some(format!("{ident}_out_{output}")));
                }
                return Err(CompileError::UnresolvedPort {
                    node: ident.clone(),
                    port: word.to_string(),
                    stage: Some(stage),
                });
            }
            if let (Some(name), Some(clock)) = (word.strip_prefix("u_"), &template.clock) {
                if name == clock.uniform {
                    return Ok(uniform.cloned());
                }
            }
            Ok(None)
        };

        for (name, spec) in &template.outputs {
            let init = match &spec.expr {
                Some(expr) => glsl::rewrite_identifiers(expr, &rename)?,
                None => spec.kind.zero(),
            };
            out.push(format!("{} {ident}_out_{name} = {init};", spec.kind.glsl_type()));
        }

        if let Some(body) = &template.stage(stage).body {
            let body = glsl::rewrite_identifiers(body, &rename)?;
            out.push("{".to_string());
            out.extend(glsl::indent_lines(&body, INDENT));
            out.push("}".to_string());
        }

        if stage == Stage::Vertex {
            for output in &entry.varying_outputs {
                out.push(format!("v_{ident}_{output} = {ident}_out_{output};"));
            }
        }

        Ok(())
    }

    /// Expression for an edge input, read directly from the producer
    fn reference(
        &self,
        consumer: &DiscoveredNode,
        port_name: &str,
        port: &Port,
        connection: &Connection,
        stage: Stage,
    ) -> Result<String, CompileError> {
        let kind = connection
            .kind()
            .map_err(|fault| CompileError::from_fault(&consumer.ident, port_name, Some(stage), fault))?;
        let producer = self
            .walk
            .get(connection.node().id())
            .ok_or_else(|| CompileError::UnresolvedPort {
                node: consumer.ident.clone(),
                port: port_name.to_string(),
                stage: Some(stage),
            })?;

        let variable = if stage == Stage::Fragment && producer.varying_outputs.contains(connection.output()) {
            format!("v_{}_{}", producer.ident, connection.output())
        } else {
            format!("{}_out_{}", producer.ident, connection.output())
        };
        Ok(glsl::coerce(&variable, kind, port.kind))
    }

    /// Inline expression for a master slot input; `None` when unwired
    fn resolve_inline(
        &self,
        root: &DiscoveredNode,
        name: &str,
        port: &Port,
        stage: Stage,
    ) -> Result<Option<String>, CompileError> {
        let value = match &port.source {
            None => return Ok(None),
            Some(PortSource::Literal(value)) => glsl::coerce(&value.to_glsl(), value.kind(), port.kind),
            Some(PortSource::Raw(expr)) => expr.clone(),
            Some(PortSource::Connection(connection)) => {
                self.reference(root, name, port, connection, stage)?
            }
        };
        Ok(Some(value))
    }
}

fn assemble(
    uniforms: &[String],
    varyings: &[String],
    headers: &IndexSet<String>,
    statements: &[String],
) -> String {
    let mut source = String::new();
    for section in [uniforms, varyings] {
        if !section.is_empty() {
            source.push_str(&section.join("\n"));
            source.push_str("\n\n");
        }
    }
    for header in headers {
        source.push_str(header);
        source.push_str("\n\n");
    }

    source.push_str("void main() {\n");
    for statement in statements {
        source.push_str(INDENT);
        source.push_str(statement);
        source.push('\n');
    }
    source.push_str("}\n");
    source
}

fn stage_suffix(stage: &Option<Stage>) -> String {
    stage.map(|s| format!(" in {s} stage")).unwrap_or_default()
}

/// Error during compilation
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A node depends on itself
    #[error("Graph contains a cycle: {}", .path.join(" -> "))]
    GraphCycle {
        /// Identifiers along the cycle, first repeated at the end
        path: Vec<String>,
    },

    /// Port has no default, edge or raw expression, or code names an undeclared port
    #[error("Unresolved port {node}.{port}{}", stage_suffix(.stage))]
    UnresolvedPort {
        /// Node identifier
        node: String,
        /// Port name
        port: String,
        /// Stage being compiled, if known
        stage: Option<Stage>,
    },

    /// Wired value does not fit the port
    #[error("Type mismatch at {node}.{port}{}: expected {expected}, found {found}", stage_suffix(.stage))]
    TypeMismatch {
        /// Node identifier
        node: String,
        /// Port name
        port: String,
        /// Stage being compiled, if known
        stage: Option<Stage>,
        /// Declared kind
        expected: ValueKind,
        /// Kind of the wired value
        found: ValueKind,
    },

    /// Literal has a NaN or infinite component
    #[error("Non-finite literal at {node}.{port}{}", stage_suffix(.stage))]
    NonFiniteLiteral {
        /// Node identifier
        node: String,
        /// Port name
        port: String,
        /// Stage being compiled, if known
        stage: Option<Stage>,
    },

    /// Edge names an output the producer does not declare
    #[error("{node}.{port}: `{producer}` has no output {output:?}")]
    MissingOutput {
        /// Node identifier
        node: String,
        /// Port name
        port: String,
        /// Producer display name
        producer: String,
        /// Requested output
        output: String,
    },

    /// Two inputs write the same master slot
    #[error("Slot `{slot}` is written by both `{first}` and `{second}`")]
    DuplicateSlotWrite {
        /// Slot target variable
        slot: String,
        /// First input writing it
        first: String,
        /// Second input writing it
        second: String,
    },

    /// Compilation must start at a master node
    #[error("Root node `{node}` is not a master node")]
    RootNotMaster {
        /// Root display name
        node: String,
    },
}

impl CompileError {
    fn from_fault(node: &str, port: &str, stage: Option<Stage>, fault: PortFault) -> Self {
        let node = node.to_string();
        let port = port.to_string();
        match fault {
            PortFault::Mismatch { expected, found } => Self::TypeMismatch {
                node,
                port,
                stage,
                expected,
                found,
            },
            PortFault::NoOutput { producer } => Self::MissingOutput {
                node,
                port,
                producer,
                output: String::new(),
            },
            PortFault::UnknownOutput { producer, output } => Self::MissingOutput {
                node,
                port,
                producer,
                output,
            },
            PortFault::NonFinite => Self::NonFiniteLiteral { node, port, stage },
        }
    }
}
