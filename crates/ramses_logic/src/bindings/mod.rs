//! Binding nodes
//!
//! Bindings own a fixed input struct named `IN` and no outputs. On update a
//! binding pushes only the inputs that received a new value since its last
//! update into the scene backend.

mod mesh_node;
mod node;
mod render_buffer;
mod render_group;
mod render_pass;
mod skin;

pub use node::RotationType;
pub use render_group::RenderGroupBindingElements;

pub(crate) use mesh_node::MeshNodeBinding;
pub(crate) use node::NodeBinding;
pub(crate) use render_buffer::RenderBufferBinding;
pub(crate) use render_group::RenderGroupBinding;
pub(crate) use render_pass::RenderPassBinding;
pub(crate) use skin::SkinBinding;

use crate::property::{PropertyArena, PropertyId};
use crate::types::PropertyValueType;
use ramses_scene::{SceneBackend, SceneObjectId, SceneObjectType};

/// Value of `path` if it was set since the binding last looked at it
pub(crate) fn take_pending<T: PropertyValueType>(
    properties: &mut PropertyArena,
    inputs: Option<PropertyId>,
    path: &str,
) -> Option<T> {
    let id = properties.find_path(inputs?, path)?;
    if !properties.check_for_binding_input_new_value_and_reset(id) {
        return None;
    }
    properties.typed_value(id)
}

pub(crate) fn current<T: PropertyValueType>(
    properties: &PropertyArena,
    inputs: Option<PropertyId>,
    path: &str,
) -> Option<T> {
    properties.typed_value(properties.find_path(inputs?, path)?)
}

pub(crate) fn initialize(
    properties: &mut PropertyArena,
    inputs: PropertyId,
    path: &str,
    value: impl PropertyValueType,
) {
    if let Some(id) = properties.find_path(inputs, path) {
        properties.initialize_binding_input_value(id, value.into_value());
    }
}

/// Check that `object` exists in the scene and has the expected type
pub(crate) fn check_object_type(
    scene: &dyn SceneBackend,
    object: SceneObjectId,
    expected: SceneObjectType,
    binding: &str,
) -> Result<(), String> {
    match scene.object_type(object) {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(format!(
            "Cannot create {} for scene object {}: expected a {:?}, got a {:?}",
            binding, object, expected, actual
        )),
        None => Err(format!(
            "Cannot create {}, scene object {} does not exist",
            binding, object
        )),
    }
}

/// Convert a signed input into an unsigned backend value
pub(crate) fn non_negative(value: i32, what: &str) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("{} cannot be negative", what))
}
