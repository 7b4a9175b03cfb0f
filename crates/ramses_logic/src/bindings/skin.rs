use crate::node::NodeId;
use crate::LogicNodeRuntimeError;
use ramses_scene::{Mat4, SceneBackend, SceneObjectId};

/// Writes `world(joint) * inverse_bind(joint)` for every joint into a
/// matrix array uniform
pub(crate) struct SkinBinding {
    /// Node bindings of the joints, in uniform order
    pub(crate) joints: Vec<NodeId>,
    /// Scene nodes bound by `joints`
    pub(crate) joint_nodes: Vec<SceneObjectId>,
    pub(crate) inverse_bind_matrices: Vec<Mat4>,
    pub(crate) appearance: SceneObjectId,
    pub(crate) uniform: String,
}

impl SkinBinding {
    pub(crate) fn validate(
        scene: &dyn SceneBackend,
        joint_count: usize,
        inverse_bind_matrices: &[Mat4],
        appearance: SceneObjectId,
        uniform: &str,
    ) -> Result<(), String> {
        if joint_count == 0 {
            return Err("Cannot create SkinBinding, there must be at least one joint.".into());
        }
        if joint_count != inverse_bind_matrices.len() {
            return Err(
                "Cannot create SkinBinding, number of inverse matrices must match the number of joints."
                    .into(),
            );
        }
        match scene.uniform_element_count(appearance, uniform) {
            Ok(count) if count == joint_count => Ok(()),
            Ok(_) => Err(format!(
                "Cannot create SkinBinding, appearance uniform '{}' must hold one matrix per joint.",
                uniform
            )),
            Err(e) => Err(format!("Cannot create SkinBinding, {}", e)),
        }
    }

    pub(crate) fn update(&mut self, scene: &mut dyn SceneBackend) -> Result<(), LogicNodeRuntimeError> {
        let matrices = self
            .joint_nodes
            .iter()
            .zip(&self.inverse_bind_matrices)
            .map(|(&joint, inverse)| Ok(scene.node_world_matrix(joint)?.mul(inverse)))
            .collect::<Result<Vec<Mat4>, LogicNodeRuntimeError>>()?;
        scene.set_uniform_matrices(self.appearance, &self.uniform, &matrices)?;
        Ok(())
    }
}
