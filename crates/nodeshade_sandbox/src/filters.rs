// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time-driven vertex filters used by the animation stack.

use nodeshade_graph::nodes::inputs::time_template;
use nodeshade_graph::port::{float, vec3};
use nodeshade_graph::{ConfigurableNodeType, NodeTemplate, NodeType, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Components a filter operates on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    #[default]
    All,
}

impl Axis {
    /// GLSL swizzle selecting the components
    pub fn swizzle(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
            Axis::All => "xyz",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.swizzle())
    }
}

/// Input, frequency and a time source shared by every filter
fn timed(name: &str) -> NodeTemplate {
    NodeTemplate::new(name)
        .input("a", vec3())
        .input("frequency", float().with_default(1.0))
        .input("time", float().with_default(time_template().instantiate()))
        .output("value", ValueKind::Vector3, "in_a")
}

/// Narrows the shape along x in a wave travelling over the surface
pub fn squeeze_with_time() -> NodeType {
    NodeType::new("squeeze_with_time", || {
        timed("Squeeze with Time").vertex_body(
            "out_value.x *= (1.0 + sin(in_time * in_frequency + position.y * 0.3 + position.x * 0.3) * 0.2);",
        )
    })
}

/// Pulses the scale of the selected components
pub fn scale_with_time() -> ConfigurableNodeType<Axis> {
    ConfigurableNodeType::new("scale_with_time", |axis: &Axis| {
        timed("Scale with Time").vertex_body(format!(
            "out_value.{axis} *= (1.0 + sin(in_time * in_frequency) * 0.5);"
        ))
    })
}

/// Sways the selected components back and forth
pub fn move_with_time() -> ConfigurableNodeType<Axis> {
    ConfigurableNodeType::new("move_with_time", |axis: &Axis| {
        timed("Move with Time")
            .input("amplitude", float().with_default(1.0))
            .vertex_body(format!(
                "out_value.{axis} += sin(in_time * in_frequency) * in_amplitude;"
            ))
    })
}

/// Every filter type, for listing
pub fn filter_types() -> Vec<NodeType> {
    vec![
        squeeze_with_time(),
        scale_with_time().with(Axis::All),
        move_with_time().with(Axis::All),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeshade_graph::Props;

    #[test]
    fn test_axis_swizzle() {
        assert_eq!(Axis::X.swizzle(), "x");
        assert_eq!(Axis::All.to_string(), "xyz");
    }

    #[test]
    fn test_scale_body_uses_axis() {
        let node = scale_with_time().with(Axis::Y).instance().unwrap();
        let body = node.template().vertex.body.clone().unwrap();
        assert_eq!(body, "out_value.y *= (1.0 + sin(in_time * in_frequency) * 0.5);");
        assert_eq!(node.primary_input().as_deref(), Some("a"));
    }

    #[test]
    fn test_move_accepts_amplitude() {
        let node = move_with_time()
            .with(Axis::Z)
            .create(Props::new().with("frequency", 0.3).with("amplitude", 0.8))
            .unwrap();
        assert!(node.input("amplitude").is_some());
        assert!(move_with_time()
            .with(Axis::Z)
            .create(Props::new().with("bogus", 1.0))
            .is_err());
    }

    #[test]
    fn test_each_filter_has_its_own_clock() {
        let first = squeeze_with_time().instance().unwrap();
        let second = squeeze_with_time().instance().unwrap();
        let clock = |node: &nodeshade_graph::Node| {
            node.input("time").unwrap().connection().unwrap().node().id()
        };
        assert_ne!(clock(&first), clock(&second));
    }
}
