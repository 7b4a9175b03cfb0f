//! Scene object handles and the plain value types exchanged with a backend

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of an object owned by a scene backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneObjectId(pub u64);

impl fmt::Display for SceneObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Concrete type of a scene object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneObjectType {
    Node,
    MeshNode,
    RenderPass,
    RenderGroup,
    RenderBuffer,
    Effect,
    Appearance,
    Geometry,
    Texture,
    ArrayBuffer,
}

impl SceneObjectType {
    /// Whether objects of this type carry a node transform
    pub fn is_node(self) -> bool {
        matches!(self, SceneObjectType::Node | SceneObjectType::MeshNode)
    }
}

/// Tri-state node visibility
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisibilityMode {
    /// Not rendered and not uploaded
    Off,
    /// Uploaded but not rendered
    Invisible,
    #[default]
    Visible,
}

/// Order in which euler angles are applied
///
/// `Xyz` rotates around X first, then Y, then Z.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationConvention {
    #[default]
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
}

/// Rotation stored on a node
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum NodeRotation {
    /// Angles in degrees
    Euler([f32; 3], RotationConvention),
    /// Unit quaternion `[x, y, z, w]`
    Quaternion([f32; 4]),
}

impl Default for NodeRotation {
    fn default() -> Self {
        NodeRotation::Euler([0.0; 3], RotationConvention::Xyz)
    }
}

/// Draw parameters of a mesh node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshParameters {
    pub vertex_offset: u32,
    pub index_offset: u32,
    pub index_count: u32,
    pub instance_count: u32,
}

impl Default for MeshParameters {
    fn default() -> Self {
        Self {
            vertex_offset: 0,
            index_offset: 0,
            index_count: 0,
            instance_count: 1,
        }
    }
}

/// Settable state of a render pass
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderPassState {
    pub enabled: bool,
    pub render_order: i32,
    pub clear_color: [f32; 4],
    pub render_once: bool,
}

impl Default for RenderPassState {
    fn default() -> Self {
        Self {
            enabled: true,
            render_order: 0,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            render_once: false,
        }
    }
}

/// Size and multisampling of a render buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderBufferProperties {
    pub width: u32,
    pub height: u32,
    pub sample_count: u32,
}

/// Effect inputs the text cache needs to bind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectSemantic {
    /// vec2 vertex position attribute
    TextPositions,
    /// vec2 texture coordinate attribute
    TextTextureCoordinates,
    /// 2D sampler uniform
    TextTexture,
}

/// Everything needed to build one text mesh
#[derive(Clone, Debug)]
pub struct TextMeshDescription {
    pub name: String,
    pub effect: SceneObjectId,
    pub indices: SceneObjectId,
    pub positions: SceneObjectId,
    pub texcoords: SceneObjectId,
    pub texture: SceneObjectId,
    pub index_count: u32,
}

/// Objects created for one text mesh
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextMeshObjects {
    pub mesh_node: SceneObjectId,
    pub appearance: SceneObjectId,
    pub geometry: SceneObjectId,
}
