use super::{initialize, non_negative, take_pending};
use crate::property::{PropertyArena, PropertyId};
use crate::types::{PropertyDecl, PropertyType};
use crate::LogicNodeRuntimeError;
use ramses_scene::{SceneBackend, SceneError, SceneObjectId};

pub(crate) struct RenderBufferBinding {
    pub(crate) buffer: SceneObjectId,
}

impl RenderBufferBinding {
    pub(crate) fn input_decl() -> PropertyDecl {
        PropertyDecl::structure(
            "IN",
            vec![
                PropertyDecl::new("width", PropertyType::Int32),
                PropertyDecl::new("height", PropertyType::Int32),
                PropertyDecl::new("sampleCount", PropertyType::Int32),
            ],
        )
    }

    pub(crate) fn initialize_inputs(
        &self,
        properties: &mut PropertyArena,
        inputs: PropertyId,
        scene: &dyn SceneBackend,
    ) -> Result<(), SceneError> {
        let current = scene.render_buffer_properties(self.buffer)?;
        let clamp = |v: u32| v.min(i32::MAX as u32) as i32;
        initialize(properties, inputs, "width", clamp(current.width));
        initialize(properties, inputs, "height", clamp(current.height));
        initialize(properties, inputs, "sampleCount", clamp(current.sample_count));
        Ok(())
    }

    /// Pushes all pending values with a single backend call
    pub(crate) fn update(
        &mut self,
        properties: &mut PropertyArena,
        inputs: Option<PropertyId>,
        scene: &mut dyn SceneBackend,
    ) -> Result<(), LogicNodeRuntimeError> {
        let width = take_pending::<i32>(properties, inputs, "width");
        let height = take_pending::<i32>(properties, inputs, "height");
        let sample_count = take_pending::<i32>(properties, inputs, "sampleCount");
        if width.is_none() && height.is_none() && sample_count.is_none() {
            return Ok(());
        }

        let mut buffer = scene.render_buffer_properties(self.buffer)?;
        if let Some(width) = width {
            buffer.width = non_negative(width, "RenderBufferBinding width")?;
        }
        if let Some(height) = height {
            buffer.height = non_negative(height, "RenderBufferBinding height")?;
        }
        if let Some(sample_count) = sample_count {
            buffer.sample_count = non_negative(sample_count, "RenderBufferBinding sample count")?;
        }
        scene.set_render_buffer_properties(self.buffer, buffer)?;
        Ok(())
    }
}
