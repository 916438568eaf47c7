// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compiles the demo material, drives its update function and renders the result.

use crate::config::{OutputFormat, SandboxConfig};
use crate::demo;
use indexmap::IndexMap;
use nodeshade_graph::{compile_shader, CompileError, NodeError, PortValue, Stage};
use serde::Serialize;
use tracing::{debug, info};

/// Uniform values after one simulated frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    /// Frame number, starting at 1
    pub frame: u32,
    /// Simulated seconds since compilation
    pub elapsed: f64,
    /// Bound values by uniform name
    pub values: IndexMap<String, PortValue>,
}

/// Everything one sandbox run produces
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Vertex shader source
    pub vertex_source: String,
    /// Fragment shader source
    pub fragment_source: String,
    /// Uniforms after each simulated frame
    pub frames: Vec<FrameSnapshot>,
}

impl Report {
    /// Render in the requested format
    pub fn render(&self, format: OutputFormat) -> Result<String, RunError> {
        match format {
            OutputFormat::Glsl => Ok(self.to_glsl()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    fn to_glsl(&self) -> String {
        let mut out = String::new();
        for (stage, source) in [
            (Stage::Vertex, &self.vertex_source),
            (Stage::Fragment, &self.fragment_source),
        ] {
            out.push_str(&format!("// ---- {stage} shader ----\n"));
            out.push_str(source);
            out.push('\n');
        }

        for frame in &self.frames {
            out.push_str(&format!("// frame {} (t = {:.4}s)\n", frame.frame, frame.elapsed));
            for (name, value) in &frame.values {
                out.push_str(&format!("//   {name} = {}\n", value.to_glsl()));
            }
        }
        out
    }
}

/// Build the demo material, compile it and simulate `config.frames` frames
pub fn run(config: &SandboxConfig) -> Result<Report, RunError> {
    let master = demo::build_material(config)?;
    let (shader, mut update) = compile_shader(&master)?;
    info!(
        vertex_lines = shader.vertex_source().lines().count(),
        fragment_lines = shader.fragment_source().lines().count(),
        uniforms = shader.bound_values().len(),
        "compiled demo material"
    );

    let mut frames = Vec::with_capacity(config.frames as usize);
    let mut elapsed = 0.0;
    for frame in 1..=config.frames {
        update.update(config.frame_delta);
        elapsed += config.frame_delta;
        let values = shader.bound_values().snapshot();
        debug!(frame, elapsed, ?values, "advanced frame");
        frames.push(FrameSnapshot {
            frame,
            elapsed,
            values,
        });
    }

    Ok(Report {
        vertex_source: shader.vertex_source().to_string(),
        fragment_source: shader.fragment_source().to_string(),
        frames,
    })
}

/// Error during a sandbox run
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// A demo node could not be built
    #[error("Failed to build demo graph: {0}")]
    Node(#[from] NodeError),

    /// The demo graph did not compile
    #[error("Failed to compile demo graph: {0}")]
    Compile(#[from] CompileError),

    /// JSON output failed
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}
