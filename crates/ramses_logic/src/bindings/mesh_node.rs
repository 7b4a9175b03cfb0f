use super::{initialize, non_negative, take_pending};
use crate::property::{PropertyArena, PropertyId};
use crate::types::{PropertyDecl, PropertyType};
use crate::LogicNodeRuntimeError;
use ramses_scene::{SceneBackend, SceneError, SceneObjectId};

const INPUTS: [&str; 4] = ["vertexOffset", "indexOffset", "indexCount", "instanceCount"];

pub(crate) struct MeshNodeBinding {
    pub(crate) mesh: SceneObjectId,
}

impl MeshNodeBinding {
    pub(crate) fn input_decl() -> PropertyDecl {
        PropertyDecl::structure(
            "IN",
            INPUTS
                .iter()
                .map(|name| PropertyDecl::new(*name, PropertyType::Int32))
                .collect(),
        )
    }

    pub(crate) fn initialize_inputs(
        &self,
        properties: &mut PropertyArena,
        inputs: PropertyId,
        scene: &dyn SceneBackend,
    ) -> Result<(), SceneError> {
        let parameters = scene.mesh_parameters(self.mesh)?;
        let values = [
            parameters.vertex_offset,
            parameters.index_offset,
            parameters.index_count,
            parameters.instance_count,
        ];
        for (name, value) in INPUTS.iter().zip(values) {
            initialize(properties, inputs, name, value.min(i32::MAX as u32) as i32);
        }
        Ok(())
    }

    pub(crate) fn update(
        &mut self,
        properties: &mut PropertyArena,
        inputs: Option<PropertyId>,
        scene: &mut dyn SceneBackend,
    ) -> Result<(), LogicNodeRuntimeError> {
        if let Some(value) = take_pending::<i32>(properties, inputs, "vertexOffset") {
            let offset = non_negative(value, "MeshNodeBinding vertex offset")?;
            scene.set_mesh_vertex_offset(self.mesh, offset)?;
        }
        if let Some(value) = take_pending::<i32>(properties, inputs, "indexOffset") {
            let offset = non_negative(value, "MeshNodeBinding index offset")?;
            scene.set_mesh_index_offset(self.mesh, offset)?;
        }
        if let Some(value) = take_pending::<i32>(properties, inputs, "indexCount") {
            let count = non_negative(value, "MeshNodeBinding index count")?;
            scene.set_mesh_index_count(self.mesh, count)?;
        }
        if let Some(value) = take_pending::<i32>(properties, inputs, "instanceCount") {
            let count = non_negative(value, "MeshNodeBinding instance count")?;
            scene.set_mesh_instance_count(self.mesh, count)?;
        }
        Ok(())
    }
}
