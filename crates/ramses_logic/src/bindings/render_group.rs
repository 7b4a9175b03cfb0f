use crate::property::{PropertyArena, PropertyId};
use crate::types::{PropertyDecl, PropertyType};
use crate::LogicNodeRuntimeError;
use ramses_scene::{SceneBackend, SceneError, SceneObjectId, SceneObjectType};

pub(crate) const RENDER_ORDERS: &str = "renderOrders";

/// Elements of a render group exposed by a [`RenderGroupBinding`] input
///
/// Each element becomes one Int32 input under `renderOrders`, named by the
/// element name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderGroupBindingElements {
    elements: Vec<(String, SceneObjectId)>,
}

impl RenderGroupBindingElements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mesh node or nested render group under `name`
    pub fn add_element(&mut self, name: impl Into<String>, element: SceneObjectId) -> &mut Self {
        self.elements.push((name.into(), element));
        self
    }

    pub fn elements(&self) -> &[(String, SceneObjectId)] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl FromIterator<(String, SceneObjectId)> for RenderGroupBindingElements {
    fn from_iter<I: IntoIterator<Item = (String, SceneObjectId)>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

pub(crate) struct RenderGroupBinding {
    pub(crate) group: SceneObjectId,
    pub(crate) elements: RenderGroupBindingElements,
}

impl RenderGroupBinding {
    /// Reject bindings that would expose nothing or foreign elements
    pub(crate) fn validate(
        scene: &dyn SceneBackend,
        group: SceneObjectId,
        elements: &RenderGroupBindingElements,
    ) -> Result<(), String> {
        if elements.is_empty() {
            return Err("Cannot create RenderGroupBinding, there were no elements provided.".into());
        }
        let all_contained = elements.elements.iter().all(|(_, element)| {
            matches!(scene.render_group_element_order(group, *element), Ok(Some(_)))
        });
        if !all_contained {
            return Err("Cannot create RenderGroupBinding, one or more of the provided elements is not contained in the RenderGroup to bind.".into());
        }
        Ok(())
    }

    pub(crate) fn input_decl(elements: &RenderGroupBindingElements) -> PropertyDecl {
        PropertyDecl::structure(
            "IN",
            vec![PropertyDecl::structure(
                RENDER_ORDERS,
                elements
                    .elements
                    .iter()
                    .map(|(name, _)| PropertyDecl::new(name.clone(), PropertyType::Int32))
                    .collect(),
            )],
        )
    }

    pub(crate) fn initialize_inputs(
        &self,
        properties: &mut PropertyArena,
        inputs: PropertyId,
        scene: &dyn SceneBackend,
    ) -> Result<(), SceneError> {
        let Some(orders) = properties.find_path(inputs, RENDER_ORDERS) else {
            return Ok(());
        };
        for (index, (_, element)) in self.elements.elements.iter().enumerate() {
            let order = scene
                .render_group_element_order(self.group, *element)?
                .unwrap_or_default();
            if let Some(id) = properties.child(orders, index) {
                properties.initialize_binding_input_value(id, order.into());
            }
        }
        Ok(())
    }

    pub(crate) fn update(
        &mut self,
        properties: &mut PropertyArena,
        inputs: Option<PropertyId>,
        scene: &mut dyn SceneBackend,
    ) -> Result<(), LogicNodeRuntimeError> {
        let Some(orders) = inputs.and_then(|root| properties.find_path(root, RENDER_ORDERS)) else {
            return Ok(());
        };
        for (index, (_, element)) in self.elements.elements.iter().enumerate() {
            let Some(id) = properties.child(orders, index) else {
                continue;
            };
            if !properties.check_for_binding_input_new_value_and_reset(id) {
                continue;
            }
            let Some(order) = properties.typed_value::<i32>(id) else {
                continue;
            };
            match scene.set_render_group_element_order(self.group, *element, order) {
                Ok(()) => {}
                Err(SceneError::NotContained { .. }) => {
                    let kind = match scene.object_type(*element) {
                        Some(SceneObjectType::RenderGroup) => "RenderGroup",
                        _ => "MeshNode",
                    };
                    return Err(LogicNodeRuntimeError::new(format!(
                        "Cannot set render order of {} which is not contained in bound RenderGroup.",
                        kind
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
