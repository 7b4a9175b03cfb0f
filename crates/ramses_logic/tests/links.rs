//! Linking rules and value propagation between nodes

use ramses_logic::{
    LogicEngine, LogicError, NodeId, PropertyDecl, PropertyType, RotationType, ScriptDefinition,
};
use ramses_scene::{InMemoryScene, SceneBackend};

fn int_script() -> ScriptDefinition {
    ScriptDefinition::new("int", |ctx| {
        let value = ctx.input::<i32>("value").unwrap_or_default();
        ctx.set_output("value", value + 1)
    })
    .with_input(PropertyDecl::new("value", PropertyType::Int32))
    .with_output(PropertyDecl::new("value", PropertyType::Int32))
}

fn float_script() -> ScriptDefinition {
    ScriptDefinition::new("float", |_| Ok(()))
        .with_input(PropertyDecl::new("speed", PropertyType::Float))
        .with_input(PropertyDecl::structure(
            "nested",
            vec![PropertyDecl::new("x", PropertyType::Int32)],
        ))
        .with_output(PropertyDecl::structure(
            "nested",
            vec![PropertyDecl::new("x", PropertyType::Int32)],
        ))
}

fn link_message(error: LogicError) -> String {
    match error {
        LogicError::Link(message) => message,
        other => panic!("expected a link error, got {other:?}"),
    }
}

struct Setup {
    engine: LogicEngine<InMemoryScene>,
    a: NodeId,
    b: NodeId,
    c: NodeId,
}

fn setup() -> Setup {
    let mut engine = LogicEngine::new(InMemoryScene::new());
    let a = engine.create_script(&int_script(), "A");
    let b = engine.create_script(&int_script(), "B");
    let c = engine.create_script(&float_script(), "C");
    Setup { engine, a, b, c }
}

#[test]
fn test_only_outputs_link_to_inputs() {
    let Setup { mut engine, a, b, .. } = setup();
    let a_out = engine.output_property(a, "value").unwrap();
    let b_out = engine.output_property(b, "value").unwrap();
    let a_in = engine.input_property(a, "value").unwrap();
    let b_in = engine.input_property(b, "value").unwrap();

    assert_eq!(
        link_message(engine.link(a_out, b_out).unwrap_err()),
        "Failed to link output property 'value' to output property 'value'. Only outputs can be linked to inputs"
    );
    assert_eq!(
        link_message(engine.link(a_in, b_in).unwrap_err()),
        "Failed to link input property 'value' to input property 'value'. Only outputs can be linked to inputs"
    );
    assert_eq!(
        link_message(engine.link(a_out, a_in).unwrap_err()),
        "Link source and target can't belong to the same node! ('A')"
    );
    assert!(!engine.is_linked(a));
}

#[test]
fn test_target_accepts_a_single_link() {
    let Setup { mut engine, a, b, .. } = setup();
    let third = engine.create_script(&int_script(), "third");
    let a_out = engine.output_property(a, "value").unwrap();
    let b_out = engine.output_property(b, "value").unwrap();
    let target = engine.input_property(third, "value").unwrap();

    engine.link(a_out, target).unwrap();
    assert_eq!(
        link_message(engine.link(b_out, target).unwrap_err()),
        "The property 'value' of LogicNode 'third' is already linked (to property 'value' of LogicNode 'A')"
    );

    // one output may feed many inputs
    let b_in = engine.input_property(b, "value").unwrap();
    engine.link(a_out, b_in).unwrap();
    assert_eq!(engine.property(a_out).unwrap().outgoing_links_count(), 2);
}

#[test]
fn test_types_must_match() {
    let Setup { mut engine, a, c, .. } = setup();
    let a_out = engine.output_property(a, "value").unwrap();
    let speed = engine.input_property(c, "speed").unwrap();
    assert_eq!(
        link_message(engine.link(a_out, speed).unwrap_err()),
        "Types of source property 'value:Int32' does not match target property 'speed:Float'"
    );

    let nested_out = engine.output_property(c, "nested").unwrap();
    let a_in = engine.input_property(a, "value").unwrap();
    assert_eq!(
        link_message(engine.link(nested_out, a_in).unwrap_err()),
        "Can't link properties of complex types directly, currently only primitive properties can be linked"
    );

    let nested_x = engine.output_property(c, "nested.x").unwrap();
    engine.link(nested_x, a_in).unwrap();
    assert!(engine.is_linked(c));
}

#[test]
fn test_unlink_errors() {
    let Setup { mut engine, a, b, c } = setup();
    let a_out = engine.output_property(a, "value").unwrap();
    let b_out = engine.output_property(b, "value").unwrap();
    let c_in = engine.input_property(c, "nested.x").unwrap();

    assert_eq!(
        link_message(engine.unlink(a_out, c_in).unwrap_err()),
        "Input property 'x' is not currently linked!"
    );
    engine.link(a_out, c_in).unwrap();
    assert_eq!(
        link_message(engine.unlink(b_out, c_in).unwrap_err()),
        "Input property 'x' is not currently linked!"
    );

    let nested_out = engine.output_property(c, "nested").unwrap();
    let nested_in = engine.input_property(c, "nested").unwrap();
    assert_eq!(
        link_message(engine.unlink(nested_out, nested_in).unwrap_err()),
        "Can't unlink properties of complex types directly!"
    );

    engine.unlink(a_out, c_in).unwrap();
    assert!(!engine.is_linked(a));
}

#[test]
fn test_linked_value_reaches_downstream_after_update() {
    let Setup { mut engine, a, b, .. } = setup();
    let a_out = engine.output_property(a, "value").unwrap();
    let b_in = engine.input_property(b, "value").unwrap();
    engine.link(a_out, b_in).unwrap();

    let a_in = engine.input_property(a, "value").unwrap();
    assert!(engine.set_property(a_in, 10));
    engine.update().unwrap();

    let b_out = engine.output_property(b, "value").unwrap();
    assert_eq!(engine.property(b_in).unwrap().get::<i32>(), Some(11));
    assert_eq!(engine.property(b_out).unwrap().get::<i32>(), Some(12));

    // unlinked input keeps the last propagated value
    engine.unlink(a_out, b_in).unwrap();
    assert_eq!(engine.property(b_in).unwrap().get::<i32>(), Some(11));
    assert!(engine.set_property(b_in, 1));
}

#[test]
fn test_execution_follows_links_not_creation_order() {
    let mut engine = LogicEngine::new(InMemoryScene::new());
    engine.enable_update_report(true);
    let last = engine.create_script(&int_script(), "last");
    let first = engine.create_script(&int_script(), "first");
    let out = engine.output_property(first, "value").unwrap();
    let input = engine.input_property(last, "value").unwrap();
    engine.link(out, input).unwrap();

    engine.update().unwrap();
    let order: Vec<NodeId> = engine
        .last_update_report()
        .nodes_executed()
        .iter()
        .map(|&(id, _)| id)
        .collect();
    assert_eq!(order, vec![first, last]);
    assert_eq!(engine.property(input).unwrap().get::<i32>(), Some(1));
}

#[test]
fn test_script_output_drives_node_binding() {
    let mut engine = LogicEngine::new(InMemoryScene::new());
    let node = engine.scene_mut().create_node("node");
    let mover = ScriptDefinition::new("mover", |ctx| {
        let x = ctx.input::<f32>("x").unwrap_or_default();
        ctx.set_output("translation", [x, 0.0f32, 0.0])
    })
    .with_input(PropertyDecl::new("x", PropertyType::Float))
    .with_output(PropertyDecl::new("translation", PropertyType::Vec3f));
    let script = engine.create_script(&mover, "mover");
    let binding = engine
        .create_node_binding(node, RotationType::default(), "binding")
        .unwrap();

    let out = engine.output_property(script, "translation").unwrap();
    let target = engine.input_property(binding, "translation").unwrap();
    engine.link(out, target).unwrap();
    let x = engine.input_property(script, "x").unwrap();
    assert!(engine.set_property(x, 4.0f32));
    engine.update().unwrap();

    assert_eq!(engine.scene().node_translation(node), Ok([4.0, 0.0, 0.0]));
    assert!(!engine.set_property(target, [1.0f32, 1.0, 1.0]));
}

#[test]
fn test_validate_warns_about_unapplied_binding_values() {
    let mut engine = LogicEngine::new(InMemoryScene::new());
    let node = engine.scene_mut().create_node("node");
    let binding = engine
        .create_node_binding(node, RotationType::default(), "binding")
        .unwrap();
    assert!(engine.validate().is_empty());

    let translation = engine.input_property(binding, "translation").unwrap();
    assert!(engine.set_property(translation, [1.0f32, 0.0, 0.0]));
    assert_eq!(
        engine.validate(),
        vec!["Saving logic engine content with manually updated binding values without calling update() will result in those values being lost!"]
    );

    engine.update().unwrap();
    assert!(engine.validate().is_empty());
}
