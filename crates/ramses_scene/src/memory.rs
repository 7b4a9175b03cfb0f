//! In-process scene implementation
//!
//! Objects live in a hash map keyed by [`SceneObjectId`]. Ids are issued by a
//! monotonically increasing counter and never reused.

use crate::math::Mat4;
use crate::object::{
    EffectSemantic, MeshParameters, NodeRotation, RenderBufferProperties, RenderPassState,
    SceneObjectId, SceneObjectType, TextMeshDescription, TextMeshObjects, VisibilityMode,
};
use crate::{GeometryBackend, Result, SceneBackend, SceneError};
use rustc_hash::FxHashMap;

/// Transform state shared by nodes and mesh nodes
#[derive(Clone, Debug)]
pub struct NodeData {
    pub translation: [f32; 3],
    pub scaling: [f32; 3],
    pub rotation: NodeRotation,
    pub visibility: VisibilityMode,
    pub parent: Option<SceneObjectId>,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            scaling: [1.0; 3],
            rotation: NodeRotation::default(),
            visibility: VisibilityMode::Visible,
            parent: None,
        }
    }
}

/// Payload of a scene object
#[derive(Clone, Debug)]
pub enum ObjectData {
    Node(NodeData),
    MeshNode {
        node: NodeData,
        parameters: MeshParameters,
        appearance: Option<SceneObjectId>,
        geometry: Option<SceneObjectId>,
    },
    RenderPass(RenderPassState),
    /// Contained meshes and nested groups with their render order
    RenderGroup(Vec<(SceneObjectId, i32)>),
    RenderBuffer(RenderBufferProperties),
    Effect {
        inputs: FxHashMap<EffectSemantic, String>,
        matrix_uniforms: Vec<(String, usize)>,
    },
    Appearance {
        effect: SceneObjectId,
        matrices: FxHashMap<String, Vec<Mat4>>,
        texture: Option<SceneObjectId>,
    },
    Geometry {
        effect: SceneObjectId,
        indices: SceneObjectId,
        positions: SceneObjectId,
        texcoords: SceneObjectId,
    },
    Texture {
        width: u32,
        height: u32,
        data: Vec<u8>,
        updates: u32,
    },
    IndexBuffer(Vec<u16>),
    VertexBuffer {
        components: u32,
        data: Vec<f32>,
    },
}

impl ObjectData {
    fn object_type(&self) -> SceneObjectType {
        match self {
            ObjectData::Node(_) => SceneObjectType::Node,
            ObjectData::MeshNode { .. } => SceneObjectType::MeshNode,
            ObjectData::RenderPass(_) => SceneObjectType::RenderPass,
            ObjectData::RenderGroup(_) => SceneObjectType::RenderGroup,
            ObjectData::RenderBuffer(_) => SceneObjectType::RenderBuffer,
            ObjectData::Effect { .. } => SceneObjectType::Effect,
            ObjectData::Appearance { .. } => SceneObjectType::Appearance,
            ObjectData::Geometry { .. } => SceneObjectType::Geometry,
            ObjectData::Texture { .. } => SceneObjectType::Texture,
            ObjectData::IndexBuffer(_) | ObjectData::VertexBuffer { .. } => {
                SceneObjectType::ArrayBuffer
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneObject {
    pub name: String,
    pub data: ObjectData,
}

/// Scene kept entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryScene {
    objects: FxHashMap<SceneObjectId, SceneObject>,
    next_id: u64,
}

impl InMemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, name: &str, data: ObjectData) -> SceneObjectId {
        let id = SceneObjectId(self.next_id);
        self.next_id += 1;
        tracing::trace!("scene: created {:?} '{}' as {}", data.object_type(), name, id);
        self.objects.insert(
            id,
            SceneObject {
                name: name.to_string(),
                data,
            },
        );
        id
    }

    pub fn object(&self, id: SceneObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn contains(&self, id: SceneObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Object creation
    // ─────────────────────────────────────────────────────────────────────────

    pub fn create_node(&mut self, name: &str) -> SceneObjectId {
        self.insert(name, ObjectData::Node(NodeData::default()))
    }

    pub fn create_mesh_node(&mut self, name: &str) -> SceneObjectId {
        self.insert(
            name,
            ObjectData::MeshNode {
                node: NodeData::default(),
                parameters: MeshParameters::default(),
                appearance: None,
                geometry: None,
            },
        )
    }

    pub fn create_render_pass(&mut self, name: &str) -> SceneObjectId {
        self.insert(name, ObjectData::RenderPass(RenderPassState::default()))
    }

    pub fn create_render_group(&mut self, name: &str) -> SceneObjectId {
        self.insert(name, ObjectData::RenderGroup(Vec::new()))
    }

    pub fn create_render_buffer(
        &mut self,
        name: &str,
        properties: RenderBufferProperties,
    ) -> SceneObjectId {
        self.insert(name, ObjectData::RenderBuffer(properties))
    }

    /// Effect declaring the given attribute semantics and matrix array uniforms
    pub fn create_effect(
        &mut self,
        name: &str,
        inputs: &[(EffectSemantic, &str)],
        matrix_uniforms: &[(&str, usize)],
    ) -> SceneObjectId {
        self.insert(
            name,
            ObjectData::Effect {
                inputs: inputs
                    .iter()
                    .map(|(semantic, input)| (*semantic, input.to_string()))
                    .collect(),
                matrix_uniforms: matrix_uniforms
                    .iter()
                    .map(|(uniform, count)| (uniform.to_string(), *count))
                    .collect(),
            },
        )
    }

    /// Appearance with every matrix uniform of `effect` set to identity
    pub fn create_appearance(&mut self, effect: SceneObjectId, name: &str) -> Result<SceneObjectId> {
        let matrices = match self.data(effect)? {
            ObjectData::Effect {
                matrix_uniforms, ..
            } => matrix_uniforms
                .iter()
                .map(|(uniform, count)| (uniform.clone(), vec![Mat4::IDENTITY; *count]))
                .collect(),
            other => {
                return Err(SceneError::WrongObjectType {
                    id: effect,
                    expected: SceneObjectType::Effect,
                    actual: other.object_type(),
                })
            }
        };
        Ok(self.insert(
            name,
            ObjectData::Appearance {
                effect,
                matrices,
                texture: None,
            },
        ))
    }

    pub fn set_parent(&mut self, child: SceneObjectId, parent: SceneObjectId) -> Result<()> {
        self.node(parent)?;
        if self.ancestors(parent).any(|ancestor| ancestor == child) || child == parent {
            return Err(SceneError::InvalidArgument(format!(
                "parenting {} under {} would create a cycle",
                child, parent
            )));
        }
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn add_to_render_group(
        &mut self,
        group: SceneObjectId,
        element: SceneObjectId,
        order: i32,
    ) -> Result<()> {
        match self.object_type(element) {
            Some(SceneObjectType::MeshNode) | Some(SceneObjectType::RenderGroup) => {}
            Some(actual) => {
                return Err(SceneError::WrongObjectType {
                    id: element,
                    expected: SceneObjectType::MeshNode,
                    actual,
                })
            }
            None => return Err(SceneError::UnknownObject(element)),
        }
        let elements = self.render_group_mut(group)?;
        match elements.iter().position(|(id, _)| *id == element) {
            Some(index) => elements[index].1 = order,
            None => elements.push((element, order)),
        }
        Ok(())
    }

    pub fn remove_from_render_group(
        &mut self,
        group: SceneObjectId,
        element: SceneObjectId,
    ) -> Result<()> {
        let elements = self.render_group_mut(group)?;
        let before = elements.len();
        elements.retain(|(id, _)| *id != element);
        if elements.len() == before {
            return Err(SceneError::NotContained { group, element });
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────────

    pub fn texture_data(&self, texture: SceneObjectId) -> Option<(u32, u32, &[u8])> {
        match self.objects.get(&texture).map(|o| &o.data) {
            Some(ObjectData::Texture {
                width,
                height,
                data,
                ..
            }) => Some((*width, *height, data.as_slice())),
            _ => None,
        }
    }

    /// How often a texture was re-uploaded after creation
    pub fn texture_update_count(&self, texture: SceneObjectId) -> Option<u32> {
        match self.objects.get(&texture).map(|o| &o.data) {
            Some(ObjectData::Texture { updates, .. }) => Some(*updates),
            _ => None,
        }
    }

    pub fn index_buffer_data(&self, buffer: SceneObjectId) -> Option<&[u16]> {
        match self.objects.get(&buffer).map(|o| &o.data) {
            Some(ObjectData::IndexBuffer(data)) => Some(data),
            _ => None,
        }
    }

    pub fn vertex_buffer_data(&self, buffer: SceneObjectId) -> Option<(u32, &[f32])> {
        match self.objects.get(&buffer).map(|o| &o.data) {
            Some(ObjectData::VertexBuffer { components, data }) => Some((*components, data)),
            _ => None,
        }
    }

    pub fn uniform_matrices(&self, appearance: SceneObjectId, uniform: &str) -> Option<&[Mat4]> {
        match self.objects.get(&appearance).map(|o| &o.data) {
            Some(ObjectData::Appearance { matrices, .. }) => {
                matrices.get(uniform).map(|m| m.as_slice())
            }
            _ => None,
        }
    }

    pub fn mesh_appearance(&self, mesh: SceneObjectId) -> Option<SceneObjectId> {
        match self.objects.get(&mesh).map(|o| &o.data) {
            Some(ObjectData::MeshNode { appearance, .. }) => *appearance,
            _ => None,
        }
    }

    pub fn appearance_texture(&self, appearance: SceneObjectId) -> Option<SceneObjectId> {
        match self.objects.get(&appearance).map(|o| &o.data) {
            Some(ObjectData::Appearance { texture, .. }) => *texture,
            _ => None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal accessors
    // ─────────────────────────────────────────────────────────────────────────

    fn data(&self, id: SceneObjectId) -> Result<&ObjectData> {
        self.objects
            .get(&id)
            .map(|o| &o.data)
            .ok_or(SceneError::UnknownObject(id))
    }

    fn data_mut(&mut self, id: SceneObjectId) -> Result<&mut ObjectData> {
        self.objects
            .get_mut(&id)
            .map(|o| &mut o.data)
            .ok_or(SceneError::UnknownObject(id))
    }

    fn wrong_type(id: SceneObjectId, expected: SceneObjectType, data: &ObjectData) -> SceneError {
        SceneError::WrongObjectType {
            id,
            expected,
            actual: data.object_type(),
        }
    }

    fn node(&self, id: SceneObjectId) -> Result<&NodeData> {
        match self.data(id)? {
            ObjectData::Node(node) | ObjectData::MeshNode { node, .. } => Ok(node),
            other => Err(Self::wrong_type(id, SceneObjectType::Node, other)),
        }
    }

    fn node_mut(&mut self, id: SceneObjectId) -> Result<&mut NodeData> {
        match self.data_mut(id)? {
            ObjectData::Node(node) | ObjectData::MeshNode { node, .. } => Ok(node),
            other => Err(Self::wrong_type(id, SceneObjectType::Node, other)),
        }
    }

    fn mesh_mut(&mut self, id: SceneObjectId) -> Result<&mut MeshParameters> {
        match self.data_mut(id)? {
            ObjectData::MeshNode { parameters, .. } => Ok(parameters),
            other => Err(Self::wrong_type(id, SceneObjectType::MeshNode, other)),
        }
    }

    fn render_pass_mut(&mut self, id: SceneObjectId) -> Result<&mut RenderPassState> {
        match self.data_mut(id)? {
            ObjectData::RenderPass(state) => Ok(state),
            other => Err(Self::wrong_type(id, SceneObjectType::RenderPass, other)),
        }
    }

    fn render_group(&self, id: SceneObjectId) -> Result<&Vec<(SceneObjectId, i32)>> {
        match self.data(id)? {
            ObjectData::RenderGroup(elements) => Ok(elements),
            other => Err(Self::wrong_type(id, SceneObjectType::RenderGroup, other)),
        }
    }

    fn render_group_mut(&mut self, id: SceneObjectId) -> Result<&mut Vec<(SceneObjectId, i32)>> {
        match self.data_mut(id)? {
            ObjectData::RenderGroup(elements) => Ok(elements),
            other => Err(Self::wrong_type(id, SceneObjectType::RenderGroup, other)),
        }
    }

    fn ancestors(&self, id: SceneObjectId) -> impl Iterator<Item = SceneObjectId> + '_ {
        std::iter::successors(self.node(id).ok().and_then(|n| n.parent), move |current| {
            self.node(*current).ok().and_then(|n| n.parent)
        })
    }

    fn expect_type(&self, id: SceneObjectId, expected: SceneObjectType) -> Result<()> {
        let data = self.data(id)?;
        if data.object_type() != expected {
            return Err(Self::wrong_type(id, expected, data));
        }
        Ok(())
    }
}

impl SceneBackend for InMemoryScene {
    fn object_type(&self, id: SceneObjectId) -> Option<SceneObjectType> {
        self.objects.get(&id).map(|o| o.data.object_type())
    }

    fn object_name(&self, id: SceneObjectId) -> Option<&str> {
        self.objects.get(&id).map(|o| o.name.as_str())
    }

    fn node_translation(&self, node: SceneObjectId) -> Result<[f32; 3]> {
        Ok(self.node(node)?.translation)
    }

    fn set_node_translation(&mut self, node: SceneObjectId, value: [f32; 3]) -> Result<()> {
        self.node_mut(node)?.translation = value;
        Ok(())
    }

    fn node_scaling(&self, node: SceneObjectId) -> Result<[f32; 3]> {
        Ok(self.node(node)?.scaling)
    }

    fn set_node_scaling(&mut self, node: SceneObjectId, value: [f32; 3]) -> Result<()> {
        self.node_mut(node)?.scaling = value;
        Ok(())
    }

    fn node_rotation(&self, node: SceneObjectId) -> Result<NodeRotation> {
        Ok(self.node(node)?.rotation)
    }

    fn set_node_rotation(&mut self, node: SceneObjectId, rotation: NodeRotation) -> Result<()> {
        self.node_mut(node)?.rotation = rotation;
        Ok(())
    }

    fn node_visibility(&self, node: SceneObjectId) -> Result<VisibilityMode> {
        Ok(self.node(node)?.visibility)
    }

    fn set_node_visibility(&mut self, node: SceneObjectId, mode: VisibilityMode) -> Result<()> {
        self.node_mut(node)?.visibility = mode;
        Ok(())
    }

    fn node_world_matrix(&self, node: SceneObjectId) -> Result<Mat4> {
        let data = self.node(node)?;
        let mut world = Mat4::from_trs(data.translation, &data.rotation, data.scaling);
        for ancestor in self.ancestors(node) {
            let parent = self.node(ancestor)?;
            world = Mat4::from_trs(parent.translation, &parent.rotation, parent.scaling).mul(&world);
        }
        Ok(world)
    }

    fn mesh_parameters(&self, mesh: SceneObjectId) -> Result<MeshParameters> {
        match self.data(mesh)? {
            ObjectData::MeshNode { parameters, .. } => Ok(*parameters),
            other => Err(Self::wrong_type(mesh, SceneObjectType::MeshNode, other)),
        }
    }

    fn set_mesh_vertex_offset(&mut self, mesh: SceneObjectId, offset: u32) -> Result<()> {
        self.mesh_mut(mesh)?.vertex_offset = offset;
        Ok(())
    }

    fn set_mesh_index_offset(&mut self, mesh: SceneObjectId, offset: u32) -> Result<()> {
        self.mesh_mut(mesh)?.index_offset = offset;
        Ok(())
    }

    fn set_mesh_index_count(&mut self, mesh: SceneObjectId, count: u32) -> Result<()> {
        self.mesh_mut(mesh)?.index_count = count;
        Ok(())
    }

    fn set_mesh_instance_count(&mut self, mesh: SceneObjectId, count: u32) -> Result<()> {
        if count == 0 {
            return Err(SceneError::InvalidArgument(
                "instance count must be at least 1".to_string(),
            ));
        }
        self.mesh_mut(mesh)?.instance_count = count;
        Ok(())
    }

    fn render_pass_state(&self, pass: SceneObjectId) -> Result<RenderPassState> {
        match self.data(pass)? {
            ObjectData::RenderPass(state) => Ok(*state),
            other => Err(Self::wrong_type(pass, SceneObjectType::RenderPass, other)),
        }
    }

    fn set_render_pass_enabled(&mut self, pass: SceneObjectId, enabled: bool) -> Result<()> {
        self.render_pass_mut(pass)?.enabled = enabled;
        Ok(())
    }

    fn set_render_pass_render_order(&mut self, pass: SceneObjectId, order: i32) -> Result<()> {
        self.render_pass_mut(pass)?.render_order = order;
        Ok(())
    }

    fn set_render_pass_clear_color(&mut self, pass: SceneObjectId, color: [f32; 4]) -> Result<()> {
        self.render_pass_mut(pass)?.clear_color = color;
        Ok(())
    }

    fn set_render_pass_render_once(&mut self, pass: SceneObjectId, once: bool) -> Result<()> {
        self.render_pass_mut(pass)?.render_once = once;
        Ok(())
    }

    fn render_group_element_order(
        &self,
        group: SceneObjectId,
        element: SceneObjectId,
    ) -> Result<Option<i32>> {
        Ok(self
            .render_group(group)?
            .iter()
            .find(|(id, _)| *id == element)
            .map(|(_, order)| *order))
    }

    fn set_render_group_element_order(
        &mut self,
        group: SceneObjectId,
        element: SceneObjectId,
        order: i32,
    ) -> Result<()> {
        let entry = self
            .render_group_mut(group)?
            .iter_mut()
            .find(|(id, _)| *id == element)
            .ok_or(SceneError::NotContained { group, element })?;
        entry.1 = order;
        Ok(())
    }

    fn render_buffer_properties(&self, buffer: SceneObjectId) -> Result<RenderBufferProperties> {
        match self.data(buffer)? {
            ObjectData::RenderBuffer(properties) => Ok(*properties),
            other => Err(Self::wrong_type(buffer, SceneObjectType::RenderBuffer, other)),
        }
    }

    fn set_render_buffer_properties(
        &mut self,
        buffer: SceneObjectId,
        properties: RenderBufferProperties,
    ) -> Result<()> {
        if properties.width == 0 || properties.height == 0 {
            return Err(SceneError::InvalidArgument(format!(
                "render buffer size {}x{} is empty",
                properties.width, properties.height
            )));
        }
        match self.data_mut(buffer)? {
            ObjectData::RenderBuffer(current) => {
                *current = properties;
                Ok(())
            }
            other => Err(Self::wrong_type(buffer, SceneObjectType::RenderBuffer, other)),
        }
    }

    fn uniform_element_count(&self, appearance: SceneObjectId, uniform: &str) -> Result<usize> {
        match self.data(appearance)? {
            ObjectData::Appearance { matrices, .. } => matrices
                .get(uniform)
                .map(|m| m.len())
                .ok_or_else(|| SceneError::UnknownUniform(uniform.to_string())),
            other => Err(Self::wrong_type(appearance, SceneObjectType::Appearance, other)),
        }
    }

    fn set_uniform_matrices(
        &mut self,
        appearance: SceneObjectId,
        uniform: &str,
        values: &[Mat4],
    ) -> Result<()> {
        match self.data_mut(appearance)? {
            ObjectData::Appearance { matrices, .. } => {
                let target = matrices
                    .get_mut(uniform)
                    .ok_or_else(|| SceneError::UnknownUniform(uniform.to_string()))?;
                if target.len() != values.len() {
                    return Err(SceneError::InvalidArgument(format!(
                        "uniform '{}' holds {} matrices, got {}",
                        uniform,
                        target.len(),
                        values.len()
                    )));
                }
                target.copy_from_slice(values);
                Ok(())
            }
            other => Err(Self::wrong_type(appearance, SceneObjectType::Appearance, other)),
        }
    }
}

impl GeometryBackend for InMemoryScene {
    fn find_effect_input(&self, effect: SceneObjectId, semantic: EffectSemantic) -> Option<String> {
        match self.objects.get(&effect).map(|o| &o.data) {
            Some(ObjectData::Effect { inputs, .. }) => inputs.get(&semantic).cloned(),
            _ => None,
        }
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        data: &[u8],
        name: &str,
    ) -> Result<SceneObjectId> {
        if data.len() != (width as usize) * (height as usize) {
            return Err(SceneError::InvalidArgument(format!(
                "texture '{}' expects {} bytes, got {}",
                name,
                width * height,
                data.len()
            )));
        }
        Ok(self.insert(
            name,
            ObjectData::Texture {
                width,
                height,
                data: data.to_vec(),
                updates: 0,
            },
        ))
    }

    fn update_texture(&mut self, texture: SceneObjectId, new_data: &[u8]) -> Result<()> {
        match self.data_mut(texture)? {
            ObjectData::Texture { data, updates, .. } => {
                if data.len() != new_data.len() {
                    return Err(SceneError::InvalidArgument(format!(
                        "texture update expects {} bytes, got {}",
                        data.len(),
                        new_data.len()
                    )));
                }
                data.copy_from_slice(new_data);
                *updates += 1;
                Ok(())
            }
            other => Err(Self::wrong_type(texture, SceneObjectType::Texture, other)),
        }
    }

    fn create_index_buffer(&mut self, indices: &[u16], name: &str) -> Result<SceneObjectId> {
        Ok(self.insert(name, ObjectData::IndexBuffer(indices.to_vec())))
    }

    fn create_vertex_buffer(
        &mut self,
        data: &[f32],
        components: u32,
        name: &str,
    ) -> Result<SceneObjectId> {
        if components == 0 || data.len() % components as usize != 0 {
            return Err(SceneError::InvalidArgument(format!(
                "vertex buffer '{}' length {} is not a multiple of {}",
                name,
                data.len(),
                components
            )));
        }
        Ok(self.insert(
            name,
            ObjectData::VertexBuffer {
                components,
                data: data.to_vec(),
            },
        ))
    }

    fn create_text_mesh(&mut self, description: &TextMeshDescription) -> Result<TextMeshObjects> {
        self.expect_type(description.effect, SceneObjectType::Effect)?;
        self.expect_type(description.texture, SceneObjectType::Texture)?;
        for buffer in [
            description.indices,
            description.positions,
            description.texcoords,
        ] {
            self.expect_type(buffer, SceneObjectType::ArrayBuffer)?;
        }

        let appearance =
            self.create_appearance(description.effect, &format!("{}_appearance", description.name))?;
        if let ObjectData::Appearance { texture, .. } = self.data_mut(appearance)? {
            *texture = Some(description.texture);
        }
        let geometry = self.insert(
            &format!("{}_geometry", description.name),
            ObjectData::Geometry {
                effect: description.effect,
                indices: description.indices,
                positions: description.positions,
                texcoords: description.texcoords,
            },
        );
        let mesh_node = self.insert(
            &description.name,
            ObjectData::MeshNode {
                node: NodeData::default(),
                parameters: MeshParameters {
                    index_count: description.index_count,
                    ..MeshParameters::default()
                },
                appearance: Some(appearance),
                geometry: Some(geometry),
            },
        );

        Ok(TextMeshObjects {
            mesh_node,
            appearance,
            geometry,
        })
    }

    fn destroy_object(&mut self, id: SceneObjectId) -> Result<()> {
        self.objects
            .remove(&id)
            .map(|_| ())
            .ok_or(SceneError::UnknownObject(id))?;
        for object in self.objects.values_mut() {
            match &mut object.data {
                ObjectData::RenderGroup(elements) => elements.retain(|(e, _)| *e != id),
                ObjectData::Node(node) | ObjectData::MeshNode { node, .. } => {
                    if node.parent == Some(id) {
                        node.parent = None;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_matrix_includes_parents() {
        let mut scene = InMemoryScene::new();
        let parent = scene.create_node("parent");
        let child = scene.create_node("child");
        scene.set_parent(child, parent).unwrap();
        scene.set_node_translation(parent, [1.0, 0.0, 0.0]).unwrap();
        scene.set_node_translation(child, [0.0, 2.0, 0.0]).unwrap();

        let world = scene.node_world_matrix(child).unwrap();
        let origin = world.transform_point([0.0, 0.0, 0.0]);
        assert_eq!(origin, [1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let mut scene = InMemoryScene::new();
        let a = scene.create_node("a");
        let b = scene.create_node("b");
        scene.set_parent(b, a).unwrap();
        assert!(scene.set_parent(a, b).is_err());
        assert!(scene.set_parent(a, a).is_err());
    }

    #[test]
    fn test_render_group_membership() {
        let mut scene = InMemoryScene::new();
        let group = scene.create_render_group("group");
        let mesh = scene.create_mesh_node("mesh");
        let node = scene.create_node("node");

        scene.add_to_render_group(group, mesh, 3).unwrap();
        assert!(scene.add_to_render_group(group, node, 1).is_err());
        assert_eq!(scene.render_group_element_order(group, mesh).unwrap(), Some(3));

        scene.remove_from_render_group(group, mesh).unwrap();
        assert_eq!(scene.render_group_element_order(group, mesh).unwrap(), None);
        assert_eq!(
            scene.set_render_group_element_order(group, mesh, 1),
            Err(SceneError::NotContained {
                group,
                element: mesh
            })
        );
    }

    #[test]
    fn test_wrong_object_type() {
        let mut scene = InMemoryScene::new();
        let pass = scene.create_render_pass("pass");
        assert!(matches!(
            scene.set_node_translation(pass, [0.0; 3]),
            Err(SceneError::WrongObjectType { .. })
        ));
        assert_eq!(scene.object_type(pass), Some(SceneObjectType::RenderPass));
        assert_eq!(scene.object_name(pass), Some("pass"));
    }

    #[test]
    fn test_text_mesh_wiring() {
        let mut scene = InMemoryScene::new();
        let effect = scene.create_effect(
            "text",
            &[
                (EffectSemantic::TextPositions, "a_position"),
                (EffectSemantic::TextTextureCoordinates, "a_texcoord"),
                (EffectSemantic::TextTexture, "u_texture"),
            ],
            &[],
        );
        let texture = scene.create_texture(2, 2, &[0, 1, 2, 3], "atlas").unwrap();
        let indices = scene.create_index_buffer(&[0, 1, 2], "indices").unwrap();
        let positions = scene.create_vertex_buffer(&[0.0; 6], 2, "positions").unwrap();
        let texcoords = scene.create_vertex_buffer(&[0.0; 6], 2, "texcoords").unwrap();

        let objects = scene
            .create_text_mesh(&TextMeshDescription {
                name: "line".to_string(),
                effect,
                indices,
                positions,
                texcoords,
                texture,
                index_count: 3,
            })
            .unwrap();

        assert_eq!(scene.mesh_parameters(objects.mesh_node).unwrap().index_count, 3);
        assert_eq!(scene.mesh_appearance(objects.mesh_node), Some(objects.appearance));
        assert_eq!(scene.appearance_texture(objects.appearance), Some(texture));
        assert_eq!(
            scene.find_effect_input(effect, EffectSemantic::TextTexture),
            Some("u_texture".to_string())
        );

        scene.update_texture(texture, &[4, 5, 6, 7]).unwrap();
        assert_eq!(scene.texture_update_count(texture), Some(1));
        assert_eq!(scene.texture_data(texture).unwrap().2, &[4, 5, 6, 7]);
    }

    #[test]
    fn test_uniform_matrices_size_checked() {
        let mut scene = InMemoryScene::new();
        let effect = scene.create_effect("skin", &[], &[("u_jointMat", 2)]);
        let appearance = scene.create_appearance(effect, "appearance").unwrap();

        assert_eq!(scene.uniform_element_count(appearance, "u_jointMat"), Ok(2));
        assert!(scene
            .set_uniform_matrices(appearance, "u_jointMat", &[Mat4::IDENTITY])
            .is_err());
        let values = [Mat4::translation(1.0, 0.0, 0.0), Mat4::scale(2.0, 2.0, 2.0)];
        scene
            .set_uniform_matrices(appearance, "u_jointMat", &values)
            .unwrap();
        assert_eq!(scene.uniform_matrices(appearance, "u_jointMat"), Some(&values[..]));
    }
}
