//! Logic nodes
//!
//! A node owns an optional input tree and an optional output tree in the
//! engine's property arena plus the type specific state that runs on update.

use crate::bindings::{
    MeshNodeBinding, NodeBinding, RenderBufferBinding, RenderGroupBinding, RenderPassBinding,
    SkinBinding,
};
use crate::property::{PropertyArena, PropertyId};
use crate::script::ScriptNode;
use crate::timer::TimerNode;
use crate::LogicNodeRuntimeError;
use ramses_scene::{SceneBackend, SceneError};
use slotmap::new_key_type;

new_key_type! {
    /// Handle of a logic node inside an engine
    pub struct NodeId;
}

/// Concrete type of a logic node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicNodeType {
    Script,
    Timer,
    NodeBinding,
    MeshNodeBinding,
    RenderPassBinding,
    RenderGroupBinding,
    RenderBufferBinding,
    SkinBinding,
}

impl LogicNodeType {
    pub fn name(self) -> &'static str {
        match self {
            LogicNodeType::Script => "Script",
            LogicNodeType::Timer => "TimerNode",
            LogicNodeType::NodeBinding => "NodeBinding",
            LogicNodeType::MeshNodeBinding => "MeshNodeBinding",
            LogicNodeType::RenderPassBinding => "RenderPassBinding",
            LogicNodeType::RenderGroupBinding => "RenderGroupBinding",
            LogicNodeType::RenderBufferBinding => "RenderBufferBinding",
            LogicNodeType::SkinBinding => "SkinBinding",
        }
    }

    pub fn is_binding(self) -> bool {
        !matches!(self, LogicNodeType::Script | LogicNodeType::Timer)
    }
}

pub(crate) enum NodeKind {
    Script(ScriptNode),
    Timer(TimerNode),
    NodeBinding(NodeBinding),
    MeshNodeBinding(MeshNodeBinding),
    RenderPassBinding(RenderPassBinding),
    RenderGroupBinding(RenderGroupBinding),
    RenderBufferBinding(RenderBufferBinding),
    SkinBinding(SkinBinding),
}

impl NodeKind {
    pub(crate) fn node_type(&self) -> LogicNodeType {
        match self {
            NodeKind::Script(_) => LogicNodeType::Script,
            NodeKind::Timer(_) => LogicNodeType::Timer,
            NodeKind::NodeBinding(_) => LogicNodeType::NodeBinding,
            NodeKind::MeshNodeBinding(_) => LogicNodeType::MeshNodeBinding,
            NodeKind::RenderPassBinding(_) => LogicNodeType::RenderPassBinding,
            NodeKind::RenderGroupBinding(_) => LogicNodeType::RenderGroupBinding,
            NodeKind::RenderBufferBinding(_) => LogicNodeType::RenderBufferBinding,
            NodeKind::SkinBinding(_) => LogicNodeType::SkinBinding,
        }
    }

    /// Nodes that must run every update regardless of their inputs
    pub(crate) fn always_dirty(&self) -> bool {
        matches!(self, NodeKind::Timer(_) | NodeKind::SkinBinding(_))
    }

    /// Seed binding inputs from the current scene state
    pub(crate) fn initialize_inputs(
        &self,
        properties: &mut PropertyArena,
        inputs: PropertyId,
        scene: &dyn SceneBackend,
    ) -> Result<(), SceneError> {
        match self {
            NodeKind::NodeBinding(binding) => binding.initialize_inputs(properties, inputs, scene),
            NodeKind::MeshNodeBinding(binding) => {
                binding.initialize_inputs(properties, inputs, scene)
            }
            NodeKind::RenderPassBinding(binding) => {
                binding.initialize_inputs(properties, inputs, scene)
            }
            NodeKind::RenderGroupBinding(binding) => {
                binding.initialize_inputs(properties, inputs, scene)
            }
            NodeKind::RenderBufferBinding(binding) => {
                binding.initialize_inputs(properties, inputs, scene)
            }
            NodeKind::Script(_) | NodeKind::Timer(_) | NodeKind::SkinBinding(_) => Ok(()),
        }
    }

    pub(crate) fn update(
        &mut self,
        properties: &mut PropertyArena,
        inputs: Option<PropertyId>,
        outputs: Option<PropertyId>,
        scene: &mut dyn SceneBackend,
    ) -> Result<(), LogicNodeRuntimeError> {
        match self {
            NodeKind::Script(script) => script.update(properties, inputs, outputs),
            NodeKind::Timer(timer) => timer.update(properties, inputs, outputs),
            NodeKind::NodeBinding(binding) => binding.update(properties, inputs, scene),
            NodeKind::MeshNodeBinding(binding) => binding.update(properties, inputs, scene),
            NodeKind::RenderPassBinding(binding) => binding.update(properties, inputs, scene),
            NodeKind::RenderGroupBinding(binding) => binding.update(properties, inputs, scene),
            NodeKind::RenderBufferBinding(binding) => binding.update(properties, inputs, scene),
            NodeKind::SkinBinding(binding) => binding.update(scene),
        }
    }
}

pub(crate) struct LogicNode {
    pub(crate) name: String,
    pub(crate) user_id: (u64, u64),
    pub(crate) kind: NodeKind,
    pub(crate) inputs: Option<PropertyId>,
    pub(crate) outputs: Option<PropertyId>,
    pub(crate) dirty: bool,
}
