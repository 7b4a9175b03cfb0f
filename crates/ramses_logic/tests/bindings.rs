//! Bindings pushing property values into an in-memory scene

use ramses_logic::{
    LogicEngine, LogicError, NodeId, RenderGroupBindingElements, RotationType,
};
use ramses_scene::{
    InMemoryScene, Mat4, NodeRotation, RenderBufferProperties, RotationConvention, SceneBackend,
    SceneObjectId, VisibilityMode,
};

fn engine() -> LogicEngine<InMemoryScene> {
    LogicEngine::new(InMemoryScene::new())
}

fn set<T: ramses_logic::PropertyValueType>(
    engine: &mut LogicEngine<InMemoryScene>,
    node: NodeId,
    path: &str,
    value: T,
) {
    let id = engine.input_property(node, path).unwrap();
    assert!(engine.set_property(id, value));
}

fn runtime_message(error: LogicError) -> String {
    match error {
        LogicError::Runtime { error, .. } => error.message,
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

fn invalid_argument(error: LogicError) -> String {
    match error {
        LogicError::InvalidArgument(message) => message,
        other => panic!("expected an invalid argument error, got {other:?}"),
    }
}

#[test]
fn test_node_binding_maps_visibility_and_enabled() {
    let mut engine = engine();
    let node = engine.scene_mut().create_node("node");
    let binding = engine
        .create_node_binding(node, RotationType::default(), "binding")
        .unwrap();

    let inputs = engine.node_inputs(binding).unwrap();
    let names: Vec<&str> = inputs.children().map(|p| p.name()).collect();
    assert_eq!(
        names,
        ["visibility", "rotation", "translation", "scaling", "enabled"]
    );
    assert_eq!(inputs.child_by_name("visibility").unwrap().get::<bool>(), Some(true));
    assert_eq!(
        inputs.child_by_name("scaling").unwrap().get::<[f32; 3]>(),
        Some([1.0, 1.0, 1.0])
    );

    set(&mut engine, binding, "visibility", false);
    engine.update().unwrap();
    assert_eq!(engine.scene().node_visibility(node), Ok(VisibilityMode::Invisible));

    set(&mut engine, binding, "enabled", false);
    engine.update().unwrap();
    assert_eq!(engine.scene().node_visibility(node), Ok(VisibilityMode::Off));

    set(&mut engine, binding, "visibility", true);
    engine.update().unwrap();
    assert_eq!(engine.scene().node_visibility(node), Ok(VisibilityMode::Off));

    set(&mut engine, binding, "enabled", true);
    engine.update().unwrap();
    assert_eq!(engine.scene().node_visibility(node), Ok(VisibilityMode::Visible));
}

#[test]
fn test_node_binding_pushes_only_changed_values() {
    let mut engine = engine();
    let node = engine.scene_mut().create_node("node");
    let binding = engine
        .create_node_binding(node, RotationType::Euler(RotationConvention::Zyx), "binding")
        .unwrap();

    // creating and updating the binding leaves the scene alone
    engine.scene_mut().set_node_translation(node, [5.0, 0.0, 0.0]).unwrap();
    engine.update().unwrap();
    assert_eq!(engine.scene().node_translation(node), Ok([5.0, 0.0, 0.0]));

    set(&mut engine, binding, "translation", [1.0f32, 2.0, 3.0]);
    set(&mut engine, binding, "rotation", [0.0f32, 90.0, 0.0]);
    engine.update().unwrap();
    assert_eq!(engine.scene().node_translation(node), Ok([1.0, 2.0, 3.0]));
    assert_eq!(
        engine.scene().node_rotation(node),
        Ok(NodeRotation::Euler([0.0, 90.0, 0.0], RotationConvention::Zyx))
    );
    assert_eq!(engine.scene().node_scaling(node), Ok([1.0, 1.0, 1.0]));
}

#[test]
fn test_quaternion_binding_initializes_from_euler_node_as_identity() {
    let mut engine = engine();
    let node = engine.scene_mut().create_node("node");
    let binding = engine
        .create_node_binding(node, RotationType::Quaternion, "binding")
        .unwrap();
    let rotation = engine.input_property(binding, "rotation").unwrap();
    assert_eq!(
        engine.property(rotation).unwrap().get::<[f32; 4]>(),
        Some([0.0, 0.0, 0.0, 1.0])
    );
}

#[test]
fn test_binding_creation_checks_object_type() {
    let mut engine = engine();
    let pass = engine.scene_mut().create_render_pass("pass");
    assert!(engine.create_mesh_node_binding(pass, "mesh").is_err());
    assert!(engine
        .create_node_binding(SceneObjectId(999), RotationType::default(), "node")
        .is_err());
    assert_eq!(engine.node_count(), 0);
}

#[test]
fn test_mesh_node_binding_rejects_negative_values() {
    let mut engine = engine();
    let mesh = engine.scene_mut().create_mesh_node("mesh");
    let binding = engine.create_mesh_node_binding(mesh, "binding").unwrap();
    assert_eq!(
        engine
            .property(engine.input_property(binding, "instanceCount").unwrap())
            .unwrap()
            .get::<i32>(),
        Some(1)
    );

    set(&mut engine, binding, "indexCount", 12);
    engine.update().unwrap();
    assert_eq!(engine.scene().mesh_parameters(mesh).unwrap().index_count, 12);

    set(&mut engine, binding, "vertexOffset", -1);
    assert_eq!(
        runtime_message(engine.update().unwrap_err()),
        "MeshNodeBinding vertex offset cannot be negative"
    );
}

#[test]
fn test_render_pass_binding() {
    let mut engine = engine();
    let pass = engine.scene_mut().create_render_pass("pass");
    let binding = engine.create_render_pass_binding(pass, "binding").unwrap();

    set(&mut engine, binding, "renderOrder", 5);
    set(&mut engine, binding, "enabled", false);
    set(&mut engine, binding, "clearColor", [1.0f32, 0.0, 0.0, 1.0]);
    engine.update().unwrap();

    let state = engine.scene().render_pass_state(pass).unwrap();
    assert_eq!(state.render_order, 5);
    assert!(!state.enabled);
    assert_eq!(state.clear_color, [1.0, 0.0, 0.0, 1.0]);
    assert!(!state.render_once);
}

#[test]
fn test_render_buffer_binding() {
    let mut engine = engine();
    let buffer = engine.scene_mut().create_render_buffer(
        "buffer",
        RenderBufferProperties {
            width: 4,
            height: 4,
            sample_count: 0,
        },
    );
    let binding = engine.create_render_buffer_binding(buffer, "binding").unwrap();

    set(&mut engine, binding, "width", 16);
    set(&mut engine, binding, "height", 8);
    engine.update().unwrap();
    assert_eq!(
        engine.scene().render_buffer_properties(buffer),
        Ok(RenderBufferProperties {
            width: 16,
            height: 8,
            sample_count: 0,
        })
    );

    set(&mut engine, binding, "width", -1);
    assert_eq!(
        runtime_message(engine.update().unwrap_err()),
        "RenderBufferBinding width cannot be negative"
    );
}

#[test]
fn test_render_group_binding() {
    let mut engine = engine();
    let scene = engine.scene_mut();
    let group = scene.create_render_group("group");
    let mesh = scene.create_mesh_node("mesh");
    let other = scene.create_mesh_node("other");
    scene.add_to_render_group(group, mesh, 3).unwrap();

    let empty = RenderGroupBindingElements::new();
    assert_eq!(
        invalid_argument(
            engine
                .create_render_group_binding(group, &empty, "binding")
                .unwrap_err()
        ),
        "Cannot create RenderGroupBinding, there were no elements provided."
    );

    let mut foreign = RenderGroupBindingElements::new();
    foreign.add_element("other", other);
    assert_eq!(
        invalid_argument(
            engine
                .create_render_group_binding(group, &foreign, "binding")
                .unwrap_err()
        ),
        "Cannot create RenderGroupBinding, one or more of the provided elements is not contained in the RenderGroup to bind."
    );

    let mut elements = RenderGroupBindingElements::new();
    elements.add_element("mesh", mesh);
    let binding = engine
        .create_render_group_binding(group, &elements, "binding")
        .unwrap();
    let order = engine.input_property(binding, "renderOrders.mesh").unwrap();
    assert_eq!(engine.property(order).unwrap().get::<i32>(), Some(3));

    assert!(engine.set_property(order, 7));
    engine.update().unwrap();
    assert_eq!(engine.scene().render_group_element_order(group, mesh), Ok(Some(7)));

    engine.scene_mut().remove_from_render_group(group, mesh).unwrap();
    assert!(engine.set_property(order, 8));
    assert_eq!(
        runtime_message(engine.update().unwrap_err()),
        "Cannot set render order of MeshNode which is not contained in bound RenderGroup."
    );
}

struct SkinSetup {
    engine: LogicEngine<InMemoryScene>,
    appearance: SceneObjectId,
    joints: [NodeId; 2],
}

fn skin_setup(uniform_size: usize) -> SkinSetup {
    let mut engine = engine();
    let scene = engine.scene_mut();
    let effect = scene.create_effect("effect", &[], &[("u_jointMat", uniform_size)]);
    let appearance = scene.create_appearance(effect, "appearance").unwrap();
    let first = scene.create_node("joint0");
    let second = scene.create_node("joint1");
    scene.set_node_translation(first, [1.0, 0.0, 0.0]).unwrap();

    let joints = [
        engine
            .create_node_binding(first, RotationType::default(), "joint0")
            .unwrap(),
        engine
            .create_node_binding(second, RotationType::default(), "joint1")
            .unwrap(),
    ];
    SkinSetup {
        engine,
        appearance,
        joints,
    }
}

#[test]
fn test_skin_binding_writes_joint_matrices() {
    let SkinSetup {
        mut engine,
        appearance,
        joints,
    } = skin_setup(2);
    let inverse = [Mat4::IDENTITY, Mat4::translation(0.0, -1.0, 0.0)];
    let skin = engine
        .create_skin_binding(&joints, &inverse, appearance, "u_jointMat", "skin")
        .unwrap();
    engine.update().unwrap();

    let matrices = engine
        .scene()
        .uniform_matrices(appearance, "u_jointMat")
        .unwrap();
    assert!(matrices[0].approx_eq(&Mat4::translation(1.0, 0.0, 0.0), 1e-5));
    assert!(matrices[1].approx_eq(&Mat4::translation(0.0, -1.0, 0.0), 1e-5));

    // joint bindings run before the skin
    set(&mut engine, joints[1], "translation", [0.0f32, 1.0, 0.0]);
    engine.update().unwrap();
    let matrices = engine
        .scene()
        .uniform_matrices(appearance, "u_jointMat")
        .unwrap();
    assert!(matrices[1].approx_eq(&Mat4::IDENTITY, 1e-5));

    assert!(engine.destroy(joints[0]).is_err());
    engine.destroy(skin).unwrap();
    engine.destroy(joints[0]).unwrap();
}

#[test]
fn test_skin_binding_validation() {
    let SkinSetup {
        mut engine,
        appearance,
        joints,
    } = skin_setup(2);

    assert_eq!(
        invalid_argument(
            engine
                .create_skin_binding(&[], &[], appearance, "u_jointMat", "skin")
                .unwrap_err()
        ),
        "Cannot create SkinBinding, there must be at least one joint."
    );
    assert_eq!(
        invalid_argument(
            engine
                .create_skin_binding(&joints, &[Mat4::IDENTITY], appearance, "u_jointMat", "skin")
                .unwrap_err()
        ),
        "Cannot create SkinBinding, number of inverse matrices must match the number of joints."
    );
    assert_eq!(
        invalid_argument(
            engine
                .create_skin_binding(
                    &joints[..1],
                    &[Mat4::IDENTITY],
                    appearance,
                    "u_jointMat",
                    "skin"
                )
                .unwrap_err()
        ),
        "Cannot create SkinBinding, appearance uniform 'u_jointMat' must hold one matrix per joint."
    );
}
