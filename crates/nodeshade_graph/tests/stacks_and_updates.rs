// SPDX-License-Identifier: MIT OR Apache-2.0
use nodeshade_graph::nodes::{inputs, math, outputs};
use nodeshade_graph::port::{color, float, vec3};
use nodeshade_graph::{
    compile_shader, Node, NodeTemplate, PortSource, Props, Rgb, StackTemplate, StackType, ValueKind,
};

fn position_master(input: &Node) -> Node {
    let master = outputs::custom_shader_material_master()
        .instance()
        .expect("build master");
    master.set_input("position", input).expect("wire position");
    master
}

fn scale_x(factor: f32) -> Node {
    NodeTemplate::new("Scale X")
        .input("a", vec3())
        .input("factor", float().with_default(factor))
        .output("value", ValueKind::Vector3, "in_a")
        .vertex_body("out_value.x *= in_factor;")
        .instantiate()
}

#[test]
fn scale_stack_scales_x_by_two() {
    let stack = StackTemplate::new("Scale Stack")
        .input("a", vec3().with_default([1.0, 1.0, 1.0]))
        .output("value", ValueKind::Vector3, "in_a")
        .filter(scale_x(2.0))
        .assemble(Props::new())
        .expect("assemble stack");

    let (shader, _) = compile_shader(&position_master(&stack)).expect("compile");
    let expected = "\
void main() {
    // Scale Stack (ScaleStack_3)
    vec3 ScaleStack_3_in_a = vec3(1.0, 1.0, 1.0);
    vec3 ScaleStack_3_out_value = ScaleStack_3_in_a;
    // Scale X (ScaleX_2)
    float ScaleX_2_in_factor = 2.0;
    vec3 ScaleX_2_out_value = ScaleStack_3_out_value;
    {
        ScaleX_2_out_value.x *= ScaleX_2_in_factor;
    }
    // Scale Stack Output (ScaleStackOutput_1)
    vec3 ScaleStackOutput_1_out_value = ScaleX_2_out_value;
    csm_Position = ScaleStackOutput_1_out_value;
}
";
    assert_eq!(shader.vertex_source(), expected);
    assert_eq!(shader.fragment_source(), "void main() {\n}\n");
}

#[test]
fn empty_filter_chain_passes_input_through() {
    let stack = StackTemplate::new("Color Stack")
        .input("color", color().with_default(Rgb([1.0, 0.5, 0.25])))
        .output("value", ValueKind::Color, "in_color")
        .assemble(Props::new())
        .expect("assemble stack");
    let master = outputs::custom_shader_material_master()
        .instance()
        .expect("build master");
    master.set_input("diffuse_color", &stack).expect("wire color");

    let (shader, _) = compile_shader(&master).expect("compile");
    let fragment = shader.fragment_source();
    assert!(fragment.contains("vec3 ColorStack_2_in_color = vec3(1.0, 0.5, 0.25);"));
    assert!(fragment.contains("vec3 ColorStackOutput_1_out_value = ColorStack_2_out_value;"));
    assert!(fragment.contains("csm_DiffuseColor = vec4(ColorStackOutput_1_out_value, 1.0);"));
}

#[test]
fn stack_type_applies_props_to_head() {
    let stack_type = StackType::new("color_stack", || {
        StackTemplate::new("Color Stack")
            .input("color", color())
            .output("value", ValueKind::Color, "in_color")
            .filter(math::mix_template().instantiate())
    });
    let tinted = stack_type
        .create(Props::new().with("color", inputs::color_template().instantiate()))
        .expect("create stack");
    tinted.set_input("color", Rgb::from_hex(0xff69b4)).expect("override color");

    let master = outputs::custom_shader_material_master()
        .instance()
        .expect("build master");
    master.set_input("diffuse_color", &tinted).expect("wire color");

    // The filter's `b` input is still unwired.
    assert!(compile_shader(&master).is_err());
}

#[test]
fn updates_accumulate_across_frames() {
    let time = inputs::time_template().instantiate();
    let pulse = math::multiply()
        .with(ValueKind::Vector3)
        .create(Props::new().with("a", PortSource::raw("position")).with("b", &time))
        .expect("build pulse");
    let offset = math::add()
        .with(ValueKind::Vector3)
        .create(Props::new().with("a", &pulse).with("b", &time))
        .expect("build offset");

    let (shader, mut update) = compile_shader(&position_master(&offset)).expect("compile");
    assert_eq!(shader.bound_values().len(), 1);
    assert_eq!(shader.vertex_source().matches("uniform float").count(), 1);

    update.update(0.5);
    update.update(0.25);
    let name = &shader.bound_values().names()[0];
    assert_eq!(
        shader.bound_values().get(name).and_then(|value| value.as_float()),
        Some(0.75)
    );
}

#[test]
fn shared_clocks_advance_once_per_frame() {
    let sum = math::add()
        .with(ValueKind::Float)
        .create(
            Props::new()
                .with("a", inputs::shared_time_template("global").instantiate())
                .with("b", inputs::shared_time_template("global").instantiate()),
        )
        .expect("build sum");
    let lift = math::multiply()
        .with(ValueKind::Vector3)
        .create(Props::new().with("a", PortSource::raw("position")).with("b", &sum))
        .expect("build lift");

    let (shader, mut update) = compile_shader(&position_master(&lift)).expect("compile");
    assert_eq!(update.source_count(), 1);
    assert_eq!(shader.bound_values().names(), vec!["u_Time_3_time", "u_Time_4_time"]);

    update.update(1.0);
    update.update(0.5);
    assert_eq!(update.shared_elapsed("global"), Some(1.5));
    for name in ["u_Time_3_time", "u_Time_4_time"] {
        assert_eq!(
            shader.bound_values().get(name).and_then(|value| value.as_float()),
            Some(1.5)
        );
    }
}

#[test]
fn compiled_shader_serializes_bound_values() {
    let lift = math::add()
        .with(ValueKind::Vector3)
        .create(
            Props::new()
                .with("a", PortSource::raw("position"))
                .with("b", inputs::time_template().instantiate()),
        )
        .expect("build lift");
    let (shader, mut update) = compile_shader(&position_master(&lift)).expect("compile");
    update.update(2.0);

    let json = serde_json::to_value(&shader).expect("serialize");
    assert_eq!(json["bound_values"]["u_Time_2_time"]["Float"], 2.0);
    assert!(json["vertex_source"].as_str().expect("string").contains("u_Time_2_time"));
}
