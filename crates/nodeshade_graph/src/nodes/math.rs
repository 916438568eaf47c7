// SPDX-License-Identifier: MIT OR Apache-2.0
//! Math and shading nodes.

use super::inputs::{world_normal_template, world_position_template};
use crate::node::{ConfigurableNodeType, NodeTemplate, NodeType};
use crate::port::{float, vec3, Port, ValueKind};

fn binary(name: &str, kind: ValueKind, operator: &str) -> NodeTemplate {
    let mut b = Port::new(kind);
    if kind != ValueKind::Float {
        b = b.broadcast();
    }
    NodeTemplate::new(name)
        .input("a", Port::new(kind))
        .input("b", b)
        .output("value", kind, format!("in_a {operator} in_b"))
}

/// `a + b`; a scalar `b` is widened to `a`'s kind
pub fn add_template(kind: ValueKind) -> NodeTemplate {
    binary("Add", kind, "+")
}

/// `a * b`; a scalar `b` is widened to `a`'s kind
pub fn multiply_template(kind: ValueKind) -> NodeTemplate {
    binary("Multiply", kind, "*")
}

/// Add node type, configured by value kind
pub fn add() -> ConfigurableNodeType<ValueKind> {
    ConfigurableNodeType::new("add", |kind: &ValueKind| add_template(*kind))
}

/// Multiply node type, configured by value kind
pub fn multiply() -> ConfigurableNodeType<ValueKind> {
    ConfigurableNodeType::new("multiply", |kind: &ValueKind| multiply_template(*kind))
}

/// Linear blend from `a` to `b`
pub fn mix_template() -> NodeTemplate {
    NodeTemplate::new("Mix")
        .input("a", vec3())
        .input("b", vec3())
        .input("amount", float().with_default(0.5))
        .output("value", ValueKind::Vector3, "mix(in_a, in_b, in_amount)")
        .primary("a")
}

/// Mix node type
pub fn mix() -> NodeType {
    NodeType::new("mix", mix_template)
}

/// View-dependent rim factor in `0.0..=1.0`, computed per fragment
pub fn fresnel_template() -> NodeTemplate {
    NodeTemplate::new("Fresnel")
        .input("bias", float().with_default(0.0))
        .input("intensity", float().with_default(1.0))
        .input("power", float().with_default(2.0))
        .input("factor", float().with_default(1.0))
        .input("world_position", vec3().with_default(world_position_template().instantiate()))
        .input("world_normal", vec3().with_default(world_normal_template().instantiate()))
        .body_output("value", ValueKind::Float)
        .fragment_body(
            "vec3 viewDirection = normalize(in_world_position - cameraPosition);
             float rim = pow(1.0 + dot(viewDirection, in_world_normal), in_power);
             out_value = clamp((in_bias + in_intensity * rim) * in_factor, 0.0, 1.0);",
        )
}

/// Fresnel node type
pub fn fresnel() -> NodeType {
    NodeType::new("fresnel", fresnel_template)
}

pub(super) fn types() -> Vec<NodeType> {
    vec![
        add().with(ValueKind::Vector3),
        multiply().with(ValueKind::Vector3),
        mix(),
        fresnel(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Props;
    use crate::port::PortSource;

    #[test]
    fn test_binary_broadcasts_vectors_only() {
        let add = add_template(ValueKind::Vector3);
        assert!(add.inputs["b"].broadcast);
        assert_eq!(add.outputs["value"].expr.as_deref(), Some("in_a + in_b"));

        let scalar = multiply_template(ValueKind::Float);
        assert!(!scalar.inputs["b"].broadcast);
    }

    #[test]
    fn test_multiply_accepts_scalar_node() {
        let fresnel = fresnel().instance().unwrap();
        let product = multiply()
            .with(ValueKind::Vector3)
            .create(Props::new().with("a", [2.0, 2.0, 2.0]).with("b", &fresnel))
            .unwrap();
        let port = product.input("b").unwrap();
        assert!(port.connection().unwrap().involves_node(fresnel.id()));
    }

    #[test]
    fn test_fresnel_defaults_are_fresh_per_instance() {
        let first = fresnel().instance().unwrap();
        let second = fresnel().instance().unwrap();
        let producer = |node: &crate::node::Node| match node.input("world_position").unwrap().source {
            Some(PortSource::Connection(connection)) => connection.node().id(),
            other => panic!("unexpected source: {other:?}"),
        };
        assert_ne!(producer(&first), producer(&second));
    }
}
