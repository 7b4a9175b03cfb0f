use super::{current, initialize, take_pending};
use crate::property::{PropertyArena, PropertyId};
use crate::types::{PropertyDecl, PropertyType, Vec3f, Vec4f};
use crate::LogicNodeRuntimeError;
use ramses_scene::{
    NodeRotation, RotationConvention, SceneBackend, SceneError, SceneObjectId, VisibilityMode,
};
use serde::{Deserialize, Serialize};

/// How the `rotation` input of a node binding is interpreted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationType {
    /// Euler angles in degrees, Vec3f input
    Euler(RotationConvention),
    /// Quaternion `[x, y, z, w]`, Vec4f input
    Quaternion,
}

impl Default for RotationType {
    fn default() -> Self {
        RotationType::Euler(RotationConvention::Xyz)
    }
}

pub(crate) struct NodeBinding {
    pub(crate) node: SceneObjectId,
    pub(crate) rotation_type: RotationType,
}

impl NodeBinding {
    pub(crate) fn input_decl(rotation_type: RotationType) -> PropertyDecl {
        let rotation = match rotation_type {
            RotationType::Euler(_) => PropertyType::Vec3f,
            RotationType::Quaternion => PropertyType::Vec4f,
        };
        PropertyDecl::structure(
            "IN",
            vec![
                PropertyDecl::new("visibility", PropertyType::Bool),
                PropertyDecl::new("rotation", rotation),
                PropertyDecl::new("translation", PropertyType::Vec3f),
                PropertyDecl::new("scaling", PropertyType::Vec3f),
                PropertyDecl::new("enabled", PropertyType::Bool),
            ],
        )
    }

    /// Seed inputs from the bound node's current state
    pub(crate) fn initialize_inputs(
        &self,
        properties: &mut PropertyArena,
        inputs: PropertyId,
        scene: &dyn SceneBackend,
    ) -> Result<(), SceneError> {
        let visibility = scene.node_visibility(self.node)?;
        initialize(properties, inputs, "visibility", visibility == VisibilityMode::Visible);
        initialize(properties, inputs, "enabled", visibility != VisibilityMode::Off);
        initialize(properties, inputs, "translation", scene.node_translation(self.node)?);
        initialize(properties, inputs, "scaling", scene.node_scaling(self.node)?);

        match (self.rotation_type, scene.node_rotation(self.node)?) {
            (RotationType::Quaternion, NodeRotation::Quaternion(q)) => {
                initialize(properties, inputs, "rotation", q)
            }
            (RotationType::Quaternion, NodeRotation::Euler(..)) => {
                initialize(properties, inputs, "rotation", [0.0f32, 0.0, 0.0, 1.0])
            }
            (RotationType::Euler(convention), NodeRotation::Euler(angles, actual))
                if convention == actual =>
            {
                initialize(properties, inputs, "rotation", angles)
            }
            (RotationType::Euler(_), _) => initialize(properties, inputs, "rotation", [0.0f32; 3]),
        }
        Ok(())
    }

    pub(crate) fn update(
        &mut self,
        properties: &mut PropertyArena,
        inputs: Option<PropertyId>,
        scene: &mut dyn SceneBackend,
    ) -> Result<(), LogicNodeRuntimeError> {
        let visibility_changed = take_pending::<bool>(properties, inputs, "visibility").is_some();
        let enabled_changed = take_pending::<bool>(properties, inputs, "enabled").is_some();
        if visibility_changed || enabled_changed {
            let visible = current::<bool>(properties, inputs, "visibility").unwrap_or(true);
            let enabled = current::<bool>(properties, inputs, "enabled").unwrap_or(true);
            let mode = match (enabled, visible) {
                (false, _) => VisibilityMode::Off,
                (true, false) => VisibilityMode::Invisible,
                (true, true) => VisibilityMode::Visible,
            };
            scene.set_node_visibility(self.node, mode)?;
        }

        match self.rotation_type {
            RotationType::Euler(convention) => {
                if let Some(angles) = take_pending::<Vec3f>(properties, inputs, "rotation") {
                    scene.set_node_rotation(self.node, NodeRotation::Euler(angles, convention))?;
                }
            }
            RotationType::Quaternion => {
                if let Some(q) = take_pending::<Vec4f>(properties, inputs, "rotation") {
                    scene.set_node_rotation(self.node, NodeRotation::Quaternion(q))?;
                }
            }
        }

        if let Some(translation) = take_pending::<Vec3f>(properties, inputs, "translation") {
            scene.set_node_translation(self.node, translation)?;
        }
        if let Some(scaling) = take_pending::<Vec3f>(properties, inputs, "scaling") {
            scene.set_node_scaling(self.node, scaling)?;
        }
        Ok(())
    }
}
