//! RAMSES scene backend surface
//!
//! The text and logic crates never own scene objects themselves. They talk to
//! an external scene graph through the two traits defined here:
//!
//! - [`SceneBackend`]: node transforms, mesh parameters, render passes, render
//!   groups, render buffers and uniform arrays (used by logic bindings)
//! - [`GeometryBackend`]: effects, textures, buffers and text meshes (used by
//!   the text cache)
//!
//! [`InMemoryScene`] implements both and keeps every object in process memory,
//! which makes it usable for tests and for headless evaluation.

pub mod math;
pub mod memory;
pub mod object;

pub use math::Mat4;
pub use memory::InMemoryScene;
pub use object::{
    EffectSemantic, MeshParameters, NodeRotation, RenderBufferProperties, RenderPassState,
    RotationConvention, SceneObjectId, SceneObjectType, TextMeshDescription, TextMeshObjects,
    VisibilityMode,
};

use thiserror::Error;

/// Errors reported by a scene backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Scene object {0} does not exist")]
    UnknownObject(SceneObjectId),

    #[error("Scene object {id} is a {actual:?}, expected {expected:?}")]
    WrongObjectType {
        id: SceneObjectId,
        expected: SceneObjectType,
        actual: SceneObjectType,
    },

    #[error("Scene object {element} is not contained in render group {group}")]
    NotContained {
        group: SceneObjectId,
        element: SceneObjectId,
    },

    #[error("Appearance has no uniform named '{0}'")]
    UnknownUniform(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, SceneError>;

/// Scene operations used by logic bindings
pub trait SceneBackend {
    /// Type of an object, `None` if the id is unknown
    fn object_type(&self, id: SceneObjectId) -> Option<SceneObjectType>;

    /// Name given to an object at creation
    fn object_name(&self, id: SceneObjectId) -> Option<&str>;

    fn node_translation(&self, node: SceneObjectId) -> Result<[f32; 3]>;
    fn set_node_translation(&mut self, node: SceneObjectId, value: [f32; 3]) -> Result<()>;

    fn node_scaling(&self, node: SceneObjectId) -> Result<[f32; 3]>;
    fn set_node_scaling(&mut self, node: SceneObjectId, value: [f32; 3]) -> Result<()>;

    fn node_rotation(&self, node: SceneObjectId) -> Result<NodeRotation>;
    fn set_node_rotation(&mut self, node: SceneObjectId, rotation: NodeRotation) -> Result<()>;

    fn node_visibility(&self, node: SceneObjectId) -> Result<VisibilityMode>;
    fn set_node_visibility(&mut self, node: SceneObjectId, mode: VisibilityMode) -> Result<()>;

    /// Model matrix of a node including all of its parents
    fn node_world_matrix(&self, node: SceneObjectId) -> Result<Mat4>;

    fn mesh_parameters(&self, mesh: SceneObjectId) -> Result<MeshParameters>;
    fn set_mesh_vertex_offset(&mut self, mesh: SceneObjectId, offset: u32) -> Result<()>;
    fn set_mesh_index_offset(&mut self, mesh: SceneObjectId, offset: u32) -> Result<()>;
    fn set_mesh_index_count(&mut self, mesh: SceneObjectId, count: u32) -> Result<()>;
    fn set_mesh_instance_count(&mut self, mesh: SceneObjectId, count: u32) -> Result<()>;

    fn render_pass_state(&self, pass: SceneObjectId) -> Result<RenderPassState>;
    fn set_render_pass_enabled(&mut self, pass: SceneObjectId, enabled: bool) -> Result<()>;
    fn set_render_pass_render_order(&mut self, pass: SceneObjectId, order: i32) -> Result<()>;
    fn set_render_pass_clear_color(&mut self, pass: SceneObjectId, color: [f32; 4]) -> Result<()>;
    fn set_render_pass_render_once(&mut self, pass: SceneObjectId, once: bool) -> Result<()>;

    /// Render order of `element` inside `group`, `None` if it is not contained
    fn render_group_element_order(
        &self,
        group: SceneObjectId,
        element: SceneObjectId,
    ) -> Result<Option<i32>>;

    /// Fails with [`SceneError::NotContained`] if `element` is not in `group`
    fn set_render_group_element_order(
        &mut self,
        group: SceneObjectId,
        element: SceneObjectId,
        order: i32,
    ) -> Result<()>;

    fn render_buffer_properties(&self, buffer: SceneObjectId) -> Result<RenderBufferProperties>;
    fn set_render_buffer_properties(
        &mut self,
        buffer: SceneObjectId,
        properties: RenderBufferProperties,
    ) -> Result<()>;

    /// Number of elements of a matrix array uniform
    fn uniform_element_count(&self, appearance: SceneObjectId, uniform: &str) -> Result<usize>;

    fn set_uniform_matrices(
        &mut self,
        appearance: SceneObjectId,
        uniform: &str,
        matrices: &[Mat4],
    ) -> Result<()>;
}

/// Scene operations used by the text cache
pub trait GeometryBackend {
    /// Name of the effect input carrying `semantic`, if the effect declares it
    fn find_effect_input(&self, effect: SceneObjectId, semantic: EffectSemantic) -> Option<String>;

    /// Create a single channel 8-bit texture
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        data: &[u8],
        name: &str,
    ) -> Result<SceneObjectId>;

    /// Replace the full content of a texture
    fn update_texture(&mut self, texture: SceneObjectId, data: &[u8]) -> Result<()>;

    fn create_index_buffer(&mut self, indices: &[u16], name: &str) -> Result<SceneObjectId>;

    fn create_vertex_buffer(
        &mut self,
        data: &[f32],
        components: u32,
        name: &str,
    ) -> Result<SceneObjectId>;

    /// Wire buffers, texture and effect into a renderable mesh
    fn create_text_mesh(&mut self, description: &TextMeshDescription) -> Result<TextMeshObjects>;

    fn destroy_object(&mut self, id: SceneObjectId) -> Result<()>;
}

impl<T: SceneBackend + ?Sized> SceneBackend for &mut T {
    fn object_type(&self, id: SceneObjectId) -> Option<SceneObjectType> {
        (**self).object_type(id)
    }
    fn object_name(&self, id: SceneObjectId) -> Option<&str> {
        (**self).object_name(id)
    }
    fn node_translation(&self, node: SceneObjectId) -> Result<[f32; 3]> {
        (**self).node_translation(node)
    }
    fn set_node_translation(&mut self, node: SceneObjectId, value: [f32; 3]) -> Result<()> {
        (**self).set_node_translation(node, value)
    }
    fn node_scaling(&self, node: SceneObjectId) -> Result<[f32; 3]> {
        (**self).node_scaling(node)
    }
    fn set_node_scaling(&mut self, node: SceneObjectId, value: [f32; 3]) -> Result<()> {
        (**self).set_node_scaling(node, value)
    }
    fn node_rotation(&self, node: SceneObjectId) -> Result<NodeRotation> {
        (**self).node_rotation(node)
    }
    fn set_node_rotation(&mut self, node: SceneObjectId, rotation: NodeRotation) -> Result<()> {
        (**self).set_node_rotation(node, rotation)
    }
    fn node_visibility(&self, node: SceneObjectId) -> Result<VisibilityMode> {
        (**self).node_visibility(node)
    }
    fn set_node_visibility(&mut self, node: SceneObjectId, mode: VisibilityMode) -> Result<()> {
        (**self).set_node_visibility(node, mode)
    }
    fn node_world_matrix(&self, node: SceneObjectId) -> Result<Mat4> {
        (**self).node_world_matrix(node)
    }
    fn mesh_parameters(&self, mesh: SceneObjectId) -> Result<MeshParameters> {
        (**self).mesh_parameters(mesh)
    }
    fn set_mesh_vertex_offset(&mut self, mesh: SceneObjectId, offset: u32) -> Result<()> {
        (**self).set_mesh_vertex_offset(mesh, offset)
    }
    fn set_mesh_index_offset(&mut self, mesh: SceneObjectId, offset: u32) -> Result<()> {
        (**self).set_mesh_index_offset(mesh, offset)
    }
    fn set_mesh_index_count(&mut self, mesh: SceneObjectId, count: u32) -> Result<()> {
        (**self).set_mesh_index_count(mesh, count)
    }
    fn set_mesh_instance_count(&mut self, mesh: SceneObjectId, count: u32) -> Result<()> {
        (**self).set_mesh_instance_count(mesh, count)
    }
    fn render_pass_state(&self, pass: SceneObjectId) -> Result<RenderPassState> {
        (**self).render_pass_state(pass)
    }
    fn set_render_pass_enabled(&mut self, pass: SceneObjectId, enabled: bool) -> Result<()> {
        (**self).set_render_pass_enabled(pass, enabled)
    }
    fn set_render_pass_render_order(&mut self, pass: SceneObjectId, order: i32) -> Result<()> {
        (**self).set_render_pass_render_order(pass, order)
    }
    fn set_render_pass_clear_color(&mut self, pass: SceneObjectId, color: [f32; 4]) -> Result<()> {
        (**self).set_render_pass_clear_color(pass, color)
    }
    fn set_render_pass_render_once(&mut self, pass: SceneObjectId, once: bool) -> Result<()> {
        (**self).set_render_pass_render_once(pass, once)
    }
    fn render_group_element_order(
        &self,
        group: SceneObjectId,
        element: SceneObjectId,
    ) -> Result<Option<i32>> {
        (**self).render_group_element_order(group, element)
    }
    fn set_render_group_element_order(
        &mut self,
        group: SceneObjectId,
        element: SceneObjectId,
        order: i32,
    ) -> Result<()> {
        (**self).set_render_group_element_order(group, element, order)
    }
    fn render_buffer_properties(&self, buffer: SceneObjectId) -> Result<RenderBufferProperties> {
        (**self).render_buffer_properties(buffer)
    }
    fn set_render_buffer_properties(
        &mut self,
        buffer: SceneObjectId,
        properties: RenderBufferProperties,
    ) -> Result<()> {
        (**self).set_render_buffer_properties(buffer, properties)
    }
    fn uniform_element_count(&self, appearance: SceneObjectId, uniform: &str) -> Result<usize> {
        (**self).uniform_element_count(appearance, uniform)
    }
    fn set_uniform_matrices(
        &mut self,
        appearance: SceneObjectId,
        uniform: &str,
        matrices: &[Mat4],
    ) -> Result<()> {
        (**self).set_uniform_matrices(appearance, uniform, matrices)
    }
}

impl<T: GeometryBackend + ?Sized> GeometryBackend for &mut T {
    fn find_effect_input(&self, effect: SceneObjectId, semantic: EffectSemantic) -> Option<String> {
        (**self).find_effect_input(effect, semantic)
    }
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        data: &[u8],
        name: &str,
    ) -> Result<SceneObjectId> {
        (**self).create_texture(width, height, data, name)
    }
    fn update_texture(&mut self, texture: SceneObjectId, data: &[u8]) -> Result<()> {
        (**self).update_texture(texture, data)
    }
    fn create_index_buffer(&mut self, indices: &[u16], name: &str) -> Result<SceneObjectId> {
        (**self).create_index_buffer(indices, name)
    }
    fn create_vertex_buffer(
        &mut self,
        data: &[f32],
        components: u32,
        name: &str,
    ) -> Result<SceneObjectId> {
        (**self).create_vertex_buffer(data, components, name)
    }
    fn create_text_mesh(&mut self, description: &TextMeshDescription) -> Result<TextMeshObjects> {
        (**self).create_text_mesh(description)
    }
    fn destroy_object(&mut self, id: SceneObjectId) -> Result<()> {
        (**self).destroy_object(id)
    }
}
