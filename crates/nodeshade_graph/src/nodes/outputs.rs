// SPDX-License-Identifier: MIT OR Apache-2.0
//! Master nodes for the supported material targets.

use crate::master::Slot;
use crate::node::{NodeTemplate, NodeType};
use crate::port::{color, float, vec3};

/// Master for three-custom-shader-material's patched standard material
pub fn custom_shader_material_master_template() -> NodeTemplate {
    NodeTemplate::new("CustomShaderMaterial Master")
        .slot("position", vec3(), Slot::vertex("csm_Position"))
        .slot("normal", vec3(), Slot::vertex("csm_Normal"))
        .slot(
            "diffuse_color",
            color(),
            Slot::fragment("csm_DiffuseColor").wrapped("vec4({value}, 1.0)"),
        )
        .slot("emissive_color", color(), Slot::fragment("csm_Emissive"))
        .slot("roughness", float(), Slot::fragment("csm_Roughness"))
        .slot("metalness", float(), Slot::fragment("csm_Metalness"))
}

/// `CustomShaderMaterial` master node type
pub fn custom_shader_material_master() -> NodeType {
    NodeType::new("custom_shader_material_master", custom_shader_material_master_template)
}

/// Master for a plain `ShaderMaterial`, writing the built-in outputs directly
pub fn shader_material_master_template() -> NodeTemplate {
    NodeTemplate::new("ShaderMaterial Master")
        .slot(
            "position",
            vec3(),
            Slot::vertex("gl_Position").wrapped("projectionMatrix * modelViewMatrix * vec4({value}, 1.0)"),
        )
        .slot(
            "color",
            color(),
            Slot::fragment("gl_FragColor").wrapped("vec4({value}, 1.0)"),
        )
}

/// `ShaderMaterial` master node type
pub fn shader_material_master() -> NodeType {
    NodeType::new("shader_material_master", shader_material_master_template)
}

pub(super) fn types() -> Vec<NodeType> {
    vec![custom_shader_material_master(), shader_material_master()]
}
