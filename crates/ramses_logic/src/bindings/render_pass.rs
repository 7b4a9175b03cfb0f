use super::{initialize, take_pending};
use crate::property::{PropertyArena, PropertyId};
use crate::types::{PropertyDecl, PropertyType, Vec4f};
use crate::LogicNodeRuntimeError;
use ramses_scene::{SceneBackend, SceneError, SceneObjectId};

pub(crate) struct RenderPassBinding {
    pub(crate) pass: SceneObjectId,
}

impl RenderPassBinding {
    pub(crate) fn input_decl() -> PropertyDecl {
        PropertyDecl::structure(
            "IN",
            vec![
                PropertyDecl::new("enabled", PropertyType::Bool),
                PropertyDecl::new("renderOrder", PropertyType::Int32),
                PropertyDecl::new("clearColor", PropertyType::Vec4f),
                PropertyDecl::new("renderOnce", PropertyType::Bool),
            ],
        )
    }

    pub(crate) fn initialize_inputs(
        &self,
        properties: &mut PropertyArena,
        inputs: PropertyId,
        scene: &dyn SceneBackend,
    ) -> Result<(), SceneError> {
        let state = scene.render_pass_state(self.pass)?;
        initialize(properties, inputs, "enabled", state.enabled);
        initialize(properties, inputs, "renderOrder", state.render_order);
        initialize(properties, inputs, "clearColor", state.clear_color);
        initialize(properties, inputs, "renderOnce", state.render_once);
        Ok(())
    }

    pub(crate) fn update(
        &mut self,
        properties: &mut PropertyArena,
        inputs: Option<PropertyId>,
        scene: &mut dyn SceneBackend,
    ) -> Result<(), LogicNodeRuntimeError> {
        if let Some(enabled) = take_pending::<bool>(properties, inputs, "enabled") {
            scene.set_render_pass_enabled(self.pass, enabled)?;
        }
        if let Some(order) = take_pending::<i32>(properties, inputs, "renderOrder") {
            scene.set_render_pass_render_order(self.pass, order)?;
        }
        if let Some(color) = take_pending::<Vec4f>(properties, inputs, "clearColor") {
            scene.set_render_pass_clear_color(self.pass, color)?;
        }
        if let Some(once) = take_pending::<bool>(properties, inputs, "renderOnce") {
            scene.set_render_pass_render_once(self.pass, once)?;
        }
        Ok(())
    }
}
