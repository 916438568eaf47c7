// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node library.
//!
//! Each node comes as a `*_template()` builder, usable for default
//! sub-nodes, and a `NodeType` constructor registered by [`builtin_registry`].

pub mod inputs;
pub mod math;
pub mod outputs;

use crate::node::NodeRegistry;

/// Create a registry with every built-in node type
pub fn builtin_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    for node_type in inputs::types()
        .into_iter()
        .chain(math::types())
        .chain(outputs::types())
    {
        registry.register(node_type);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Props;

    #[test]
    fn test_builtin_registry() {
        let registry = builtin_registry();
        assert_eq!(registry.len(), 14);

        for node_type in registry.types() {
            assert!(
                node_type.instance().is_ok(),
                "{} failed to build with defaults",
                node_type.id()
            );
        }
        assert!(registry.create_node("fresnel", Props::new().with("power", 3.0)).is_ok());
    }
}
