// SPDX-License-Identifier: MIT OR Apache-2.0
//! The demo material: an animated, rim-lit blob.
//!
//! Vertex positions run through the animation stack; the diffuse color runs
//! through the color stack, which blends the base color with a fresnel rim.

use crate::config::{AnimationSettings, ColorSettings, FilterSettings, SandboxConfig};
use crate::filters::{move_with_time, scale_with_time, squeeze_with_time};
use nodeshade_graph::nodes::{inputs, math, outputs};
use nodeshade_graph::port::{color, vec3};
use nodeshade_graph::{
    Node, NodeError, NodeType, Props, Rgb, StackTemplate, StackType, ValueKind,
};

/// Build one filter instance
fn filter(settings: &FilterSettings, clock: Option<&str>) -> Result<Node, NodeError> {
    let (node_type, props) = match *settings {
        FilterSettings::Squeeze { frequency } => {
            (squeeze_with_time(), Props::new().with("frequency", frequency))
        }
        FilterSettings::Scale { axis, frequency } => (
            scale_with_time().with(axis),
            Props::new().with("frequency", frequency),
        ),
        FilterSettings::Move {
            axis,
            frequency,
            amplitude,
        } => (
            move_with_time().with(axis),
            Props::new()
                .with("frequency", frequency)
                .with("amplitude", amplitude),
        ),
    };

    let props = match clock {
        Some(name) => props.with("time", inputs::shared_time_template(name).instantiate()),
        None => props,
    };
    node_type.create(props)
}

/// Stack animating the geometry position
pub fn animation_stack(settings: &AnimationSettings) -> NodeType {
    let settings = settings.clone();
    StackType::try_new("animation_stack", move || {
        let clock = settings.shared_clock.as_deref();
        let filters = settings
            .filters
            .iter()
            .map(|settings| filter(settings, clock))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StackTemplate::new("Animation Stack")
            .input(
                "origin",
                vec3().with_default(inputs::geometry_position_template().instantiate()),
            )
            .output("value", ValueKind::Vector3, "in_origin")
            .filters(filters))
    })
}

/// Stack blending a color towards a fresnel rim highlight
pub fn color_stack(settings: &ColorSettings) -> NodeType {
    let settings = settings.clone();
    StackType::try_new("color_stack", move || {
        let rim = math::fresnel().create(Props::new().with("power", settings.fresnel_power))?;
        let highlight = math::multiply()
            .with(ValueKind::Vector3)
            .create(Props::new().with("a", settings.highlight).with("b", rim))?;
        let blend = math::mix().create(
            Props::new()
                .with("b", highlight)
                .with("amount", settings.mix_amount),
        )?;

        Ok(StackTemplate::new("Color Stack")
            .input("color", color())
            .output("value", ValueKind::Color, "in_color")
            .filter(blend))
    })
}

/// Build the master node of the demo material
pub fn build_material(config: &SandboxConfig) -> Result<Node, NodeError> {
    let base = inputs::color_template()
        .instantiate_with(Props::new().with("value", Rgb(config.color.base_color)))?;

    let position = animation_stack(&config.animation).instance()?;
    let diffuse = color_stack(&config.color).create(Props::new().with("color", base))?;

    outputs::custom_shader_material_master().create(
        Props::new()
            .with("position", position)
            .with("diffuse_color", diffuse),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeshade_graph::compile_shader;

    #[test]
    fn test_demo_compiles() {
        let master = build_material(&SandboxConfig::default()).unwrap();
        let (shader, mut update) = compile_shader(&master).unwrap();

        let vertex = shader.vertex_source();
        assert_eq!(vertex.matches("// Scale with Time (").count(), 3);
        assert_eq!(vertex.matches("// Move with Time (").count(), 3);
        assert!(vertex.contains("// Squeeze with Time (SqueezeWithTime_"));
        assert!(vertex.contains("csm_Position = AnimationStackOutput_1_out_value;"));
        assert!(shader
            .fragment_source()
            .contains("csm_DiffuseColor = vec4(ColorStackOutput_"));

        // One clock per filter by default.
        assert_eq!(update.source_count(), 7);
        update.update(0.5);
        assert!(shader
            .bound_values()
            .snapshot()
            .values()
            .all(|value| value.as_float() == Some(0.5)));
    }

    #[test]
    fn test_shared_clock() {
        let mut config = SandboxConfig::default();
        config.animation.shared_clock = Some("wave".to_string());
        let master = build_material(&config).unwrap();
        let (shader, mut update) = compile_shader(&master).unwrap();

        assert_eq!(update.source_count(), 1);
        assert_eq!(shader.bound_values().len(), 7);
        update.update(0.25);
        assert_eq!(update.shared_elapsed("wave"), Some(0.25));
    }

    #[test]
    fn test_empty_animation_is_passthrough() {
        let mut config = SandboxConfig::default();
        config.animation.filters.clear();
        let master = build_material(&config).unwrap();
        let (shader, update) = compile_shader(&master).unwrap();

        assert_eq!(update.source_count(), 0);
        assert!(shader
            .vertex_source()
            .contains("vec3 AnimationStack_2_out_value = GeometryPosition_3_out_value;"));
    }
}
