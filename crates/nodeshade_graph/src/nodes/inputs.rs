// SPDX-License-Identifier: MIT OR Apache-2.0
//! Source nodes: time, constants and geometry attributes.

use crate::node::{NodeTemplate, NodeType};
use crate::port::{color, float, vec3, Rgb, ValueKind};
use crate::update::ClockSpec;

// ============================================================================
// Time
// ============================================================================

/// Seconds since the shader was compiled, advanced by `ShaderUpdate::update`
pub fn time_template() -> NodeTemplate {
    NodeTemplate::new("Time")
        .output("value", ValueKind::Float, "u_time")
        .clock(ClockSpec::new("time"))
}

/// Time node type
pub fn time() -> NodeType {
    NodeType::new("time", time_template)
}

/// Time read from an accumulator shared by every clock with the same name
pub fn shared_time_template(source: &str) -> NodeTemplate {
    NodeTemplate::new("Time")
        .output("value", ValueKind::Float, "u_time")
        .clock(ClockSpec::new("time").shared(source))
}

// ============================================================================
// Constants
// ============================================================================

/// Float constant
pub fn float_template() -> NodeTemplate {
    NodeTemplate::new("Float")
        .input("value", float().with_default(0.0))
        .output("value", ValueKind::Float, "in_value")
}

/// 3D vector constant
pub fn vec3_template() -> NodeTemplate {
    NodeTemplate::new("Vector3")
        .input("value", vec3().with_default([0.0, 0.0, 0.0]))
        .output("value", ValueKind::Vector3, "in_value")
}

/// Color constant
pub fn color_template() -> NodeTemplate {
    NodeTemplate::new("Color")
        .input("value", color().with_default(Rgb::splat(1.0)))
        .output("value", ValueKind::Color, "in_value")
}

// ============================================================================
// Geometry
// ============================================================================

/// Object-space vertex position
pub fn geometry_position_template() -> NodeTemplate {
    NodeTemplate::new("Geometry Position").output("value", ValueKind::Vector3, "position")
}

/// Object-space vertex normal
pub fn geometry_normal_template() -> NodeTemplate {
    NodeTemplate::new("Geometry Normal").output("value", ValueKind::Vector3, "normal")
}

/// World-space position, interpolated for the fragment stage
pub fn world_position_template() -> NodeTemplate {
    NodeTemplate::new("World Position")
        .output("value", ValueKind::Vector3, "(modelMatrix * vec4(position, 1.0)).xyz")
        .interpolated()
}

/// World-space normal, interpolated for the fragment stage
pub fn world_normal_template() -> NodeTemplate {
    NodeTemplate::new("World Normal")
        .output("value", ValueKind::Vector3, "normalize(mat3(modelMatrix) * normal)")
        .interpolated()
}

/// Register every source node type
pub(super) fn types() -> Vec<NodeType> {
    vec![
        time(),
        NodeType::new("float", float_template),
        NodeType::new("vec3", vec3_template),
        NodeType::new("color", color_template),
        NodeType::new("geometry_position", geometry_position_template),
        NodeType::new("geometry_normal", geometry_normal_template),
        NodeType::new("world_position", world_position_template),
        NodeType::new("world_normal", world_normal_template),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::ClockSource;

    #[test]
    fn test_time_is_a_clock() {
        let node = time().instance().unwrap();
        let clock = node.template().clock.as_ref().unwrap();
        assert_eq!(clock.uniform, "time");
        assert_eq!(clock.source, ClockSource::Instance);

        let shared = shared_time_template("global");
        assert_eq!(
            shared.clock.map(|clock| clock.source),
            Some(ClockSource::Shared("global".to_string()))
        );
    }

    #[test]
    fn test_world_attributes_are_interpolated() {
        assert!(world_position_template().interpolated);
        assert!(world_normal_template().interpolated);
        assert!(!geometry_position_template().interpolated);
    }
}
