//! Logic engine
//!
//! Owns the logic nodes, their property trees and the links between them,
//! plus the scene backend the bindings write into. [`LogicEngine::update`]
//! runs dirty nodes in link order and propagates their outputs.

use crate::bindings::{
    check_object_type, MeshNodeBinding, NodeBinding, RenderBufferBinding, RenderGroupBinding,
    RenderGroupBindingElements, RenderPassBinding, RotationType, SkinBinding,
};
use crate::config::LogicEngineConfig;
use crate::dependencies::sort_nodes;
use crate::node::{LogicNode, LogicNodeType, NodeId, NodeKind};
use crate::property::{PropertyArena, PropertyId, PropertyLink, PropertyRef, PropertySemantics};
use crate::report::UpdateReport;
use crate::script::{ScriptDefinition, ScriptNode};
use crate::statistics::{LogicNodeUpdateStatistics, StatisticsLogLevel, StatisticsLogMode};
use crate::timer::{self, TimerNode};
use crate::types::{PropertyDecl, PropertyValue, PropertyValueType};
use crate::{LogicError, Result};
use ramses_scene::{Mat4, SceneBackend, SceneObjectId, SceneObjectType};
use slotmap::SlotMap;
use std::time::Instant;

pub(crate) const PENDING_BINDING_VALUES_WARNING: &str = "Saving logic engine content with manually updated binding values without calling update() will result in those values being lost!";

pub struct LogicEngine<S: SceneBackend> {
    pub(crate) scene: S,
    pub(crate) properties: PropertyArena,
    pub(crate) nodes: SlotMap<NodeId, LogicNode>,
    /// Node ids in creation order
    pub(crate) creation_order: Vec<NodeId>,
    /// Cached execution order, `None` after the link graph changed
    pub(crate) sorted_nodes: Option<Vec<NodeId>>,
    dirty_tracking: bool,
    report_enabled: bool,
    report: UpdateReport,
    statistics: LogicNodeUpdateStatistics,
    statistics_log: Vec<String>,
}

fn invalid_argument(message: String) -> LogicError {
    tracing::error!("{}", message);
    LogicError::InvalidArgument(message)
}

fn link_error(message: String) -> LogicError {
    tracing::error!("{}", message);
    LogicError::Link(message)
}

impl<S: SceneBackend> LogicEngine<S> {
    pub fn new(scene: S) -> Self {
        Self::with_config(scene, &LogicEngineConfig::default())
    }

    pub fn with_config(scene: S, config: &LogicEngineConfig) -> Self {
        Self {
            scene,
            properties: PropertyArena::new(),
            nodes: SlotMap::with_key(),
            creation_order: Vec::new(),
            sorted_nodes: None,
            dirty_tracking: config.dirty_tracking,
            report_enabled: config.update_report,
            report: UpdateReport::default(),
            statistics: LogicNodeUpdateStatistics::new(
                config.statistics_logging_rate,
                config.statistics_log_mode,
                config.statistics_log_level,
            ),
            statistics_log: Vec::new(),
        }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn into_scene(self) -> S {
        self.scene
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Node creation
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn insert_node(
        &mut self,
        name: &str,
        kind: NodeKind,
        inputs: Option<(&PropertyDecl, PropertySemantics)>,
        outputs: Option<&PropertyDecl>,
        dirty: bool,
    ) -> NodeId {
        let id = self.nodes.insert(LogicNode {
            name: name.to_string(),
            user_id: (0, 0),
            kind,
            inputs: None,
            outputs: None,
            dirty,
        });
        let input_root =
            inputs.map(|(decl, semantics)| self.properties.create_tree(decl, id, semantics));
        let output_root = outputs
            .map(|decl| self.properties.create_tree(decl, id, PropertySemantics::ScriptOutput));
        if let Some(node) = self.nodes.get_mut(id) {
            node.inputs = input_root;
            node.outputs = output_root;
        }
        self.creation_order.push(id);
        self.sorted_nodes = None;
        id
    }

    /// Insert a binding and seed its inputs from the scene
    fn insert_binding(&mut self, name: &str, kind: NodeKind, decl: &PropertyDecl) -> Result<NodeId> {
        let id = self.insert_node(
            name,
            kind,
            Some((decl, PropertySemantics::BindingInput)),
            None,
            false,
        );
        let initialized = match self.nodes.get(id) {
            Some(LogicNode {
                kind,
                inputs: Some(inputs),
                ..
            }) => kind.initialize_inputs(&mut self.properties, *inputs, &self.scene),
            _ => Ok(()),
        };
        if let Err(error) = initialized {
            self.remove_node(id);
            return Err(invalid_argument(format!(
                "Cannot create binding '{}': {}",
                name, error
            )));
        }
        tracing::debug!("Created binding '{}'", name);
        Ok(id)
    }

    pub fn create_script(&mut self, definition: &ScriptDefinition, name: &str) -> NodeId {
        let id = self.insert_node(
            name,
            NodeKind::Script(ScriptNode {
                definition: definition.clone(),
            }),
            Some((&definition.input_decl(), PropertySemantics::ScriptInput)),
            Some(&definition.output_decl()),
            true,
        );
        tracing::debug!("Created script '{}' from '{}'", name, definition.source());
        id
    }

    /// Timer node, outputs the steady clock in microseconds unless its
    /// `ticker_us` input is set to a non-zero value
    pub fn create_timer_node(&mut self, name: &str) -> NodeId {
        self.insert_node(
            name,
            NodeKind::Timer(TimerNode),
            Some((&timer::input_decl(), PropertySemantics::ScriptInput)),
            Some(&timer::output_decl()),
            true,
        )
    }

    pub fn create_node_binding(
        &mut self,
        node: SceneObjectId,
        rotation_type: RotationType,
        name: &str,
    ) -> Result<NodeId> {
        match self.scene.object_type(node) {
            Some(object_type) if object_type.is_node() => {}
            _ => {
                check_object_type(&self.scene, node, SceneObjectType::Node, "NodeBinding")
                    .map_err(invalid_argument)?;
            }
        }
        self.insert_binding(
            name,
            NodeKind::NodeBinding(NodeBinding {
                node,
                rotation_type,
            }),
            &NodeBinding::input_decl(rotation_type),
        )
    }

    pub fn create_mesh_node_binding(&mut self, mesh: SceneObjectId, name: &str) -> Result<NodeId> {
        check_object_type(&self.scene, mesh, SceneObjectType::MeshNode, "MeshNodeBinding")
            .map_err(invalid_argument)?;
        self.insert_binding(
            name,
            NodeKind::MeshNodeBinding(MeshNodeBinding { mesh }),
            &MeshNodeBinding::input_decl(),
        )
    }

    pub fn create_render_pass_binding(&mut self, pass: SceneObjectId, name: &str) -> Result<NodeId> {
        check_object_type(&self.scene, pass, SceneObjectType::RenderPass, "RenderPassBinding")
            .map_err(invalid_argument)?;
        self.insert_binding(
            name,
            NodeKind::RenderPassBinding(RenderPassBinding { pass }),
            &RenderPassBinding::input_decl(),
        )
    }

    pub fn create_render_buffer_binding(
        &mut self,
        buffer: SceneObjectId,
        name: &str,
    ) -> Result<NodeId> {
        check_object_type(
            &self.scene,
            buffer,
            SceneObjectType::RenderBuffer,
            "RenderBufferBinding",
        )
        .map_err(invalid_argument)?;
        self.insert_binding(
            name,
            NodeKind::RenderBufferBinding(RenderBufferBinding { buffer }),
            &RenderBufferBinding::input_decl(),
        )
    }

    /// Binding exposing the render order of selected elements of a render
    /// group as `IN.renderOrders.<element name>`
    pub fn create_render_group_binding(
        &mut self,
        group: SceneObjectId,
        elements: &RenderGroupBindingElements,
        name: &str,
    ) -> Result<NodeId> {
        check_object_type(&self.scene, group, SceneObjectType::RenderGroup, "RenderGroupBinding")
            .map_err(invalid_argument)?;
        RenderGroupBinding::validate(&self.scene, group, elements).map_err(invalid_argument)?;
        self.insert_binding(
            name,
            NodeKind::RenderGroupBinding(RenderGroupBinding {
                group,
                elements: elements.clone(),
            }),
            &RenderGroupBinding::input_decl(elements),
        )
    }

    /// Skinning binding, `joints` must be node bindings of this engine
    pub fn create_skin_binding(
        &mut self,
        joints: &[NodeId],
        inverse_bind_matrices: &[Mat4],
        appearance: SceneObjectId,
        uniform: &str,
        name: &str,
    ) -> Result<NodeId> {
        let joint_nodes = joints
            .iter()
            .map(|&joint| match self.nodes.get(joint).map(|node| &node.kind) {
                Some(NodeKind::NodeBinding(binding)) => Ok(binding.node),
                _ => Err(invalid_argument(
                    "Cannot create SkinBinding, joints must be NodeBindings of this LogicEngine."
                        .to_string(),
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        check_object_type(&self.scene, appearance, SceneObjectType::Appearance, "SkinBinding")
            .map_err(invalid_argument)?;
        SkinBinding::validate(
            &self.scene,
            joints.len(),
            inverse_bind_matrices,
            appearance,
            uniform,
        )
        .map_err(invalid_argument)?;

        Ok(self.insert_node(
            name,
            NodeKind::SkinBinding(SkinBinding {
                joints: joints.to_vec(),
                joint_nodes,
                inverse_bind_matrices: inverse_bind_matrices.to_vec(),
                appearance,
                uniform: uniform.to_string(),
            }),
            None,
            None,
            true,
        ))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Node access
    // ─────────────────────────────────────────────────────────────────────────

    /// Destroy a node together with its properties and links
    pub fn destroy(&mut self, node: NodeId) -> Result<()> {
        let Some(entry) = self.nodes.get(node) else {
            return Err(invalid_argument(
                "Failed to destroy LogicNode, it is not an instance of this LogicEngine".to_string(),
            ));
        };
        if let Some(skin) = self.skin_using_joint(node) {
            return Err(invalid_argument(format!(
                "Failed to destroy NodeBinding '{}', it is used in SkinBinding '{}'",
                entry.name, skin
            )));
        }
        tracing::debug!("Destroying {} '{}'", entry.kind.node_type().name(), entry.name);
        self.remove_node(node);
        Ok(())
    }

    fn skin_using_joint(&self, joint: NodeId) -> Option<&str> {
        self.nodes.values().find_map(|node| match &node.kind {
            NodeKind::SkinBinding(skin) if skin.joints.contains(&joint) => Some(node.name.as_str()),
            _ => None,
        })
    }

    pub(crate) fn remove_node(&mut self, node: NodeId) {
        let Some(entry) = self.nodes.remove(node) else {
            return;
        };
        for root in [entry.inputs, entry.outputs].into_iter().flatten() {
            for link in self.properties.links_of_tree(root) {
                self.properties.remove_link(link.source, link.target);
            }
            self.properties.remove_tree(root);
        }
        self.creation_order.retain(|&id| id != node);
        self.sorted_nodes = None;
    }

    /// First node created with `name`
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.creation_order
            .iter()
            .copied()
            .find(|&id| self.nodes.get(id).is_some_and(|node| node.name == name))
    }

    /// All nodes in creation order
    pub fn nodes(&self) -> &[NodeId] {
        &self.creation_order
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node).map(|n| n.name.as_str())
    }

    pub fn set_node_name(&mut self, node: NodeId, name: &str) -> bool {
        match self.nodes.get_mut(node) {
            Some(entry) => {
                entry.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn node_type(&self, node: NodeId) -> Option<LogicNodeType> {
        self.nodes.get(node).map(|n| n.kind.node_type())
    }

    /// Attach a 128 bit user id, `(0, 0)` means none
    pub fn set_user_id(&mut self, node: NodeId, high: u64, low: u64) -> bool {
        match self.nodes.get_mut(node) {
            Some(entry) => {
                entry.user_id = (high, low);
                true
            }
            None => false,
        }
    }

    pub fn user_id(&self, node: NodeId) -> Option<(u64, u64)> {
        self.nodes.get(node).map(|n| n.user_id)
    }

    pub fn node_inputs(&self, node: NodeId) -> Option<PropertyRef<'_>> {
        PropertyRef::new(&self.properties, self.nodes.get(node)?.inputs?)
    }

    pub fn node_outputs(&self, node: NodeId) -> Option<PropertyRef<'_>> {
        PropertyRef::new(&self.properties, self.nodes.get(node)?.outputs?)
    }

    /// Input property at a dot separated path below the node's input root
    pub fn input_property(&self, node: NodeId, path: &str) -> Option<PropertyId> {
        self.properties.find_path(self.nodes.get(node)?.inputs?, path)
    }

    pub fn output_property(&self, node: NodeId, path: &str) -> Option<PropertyId> {
        self.properties.find_path(self.nodes.get(node)?.outputs?, path)
    }

    pub fn property(&self, id: PropertyId) -> Option<PropertyRef<'_>> {
        PropertyRef::new(&self.properties, id)
    }

    /// Whether any property of the node takes part in a link
    pub fn is_linked(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(|entry| {
            [entry.inputs, entry.outputs]
                .into_iter()
                .flatten()
                .any(|root| !self.properties.links_of_tree(root).is_empty())
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Property values
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_property<T: PropertyValueType>(&mut self, id: PropertyId, value: T) -> bool {
        self.set_property_value(id, value.into_value())
    }

    /// Set an unlinked primitive input; failures are logged and return false
    pub fn set_property_value(&mut self, id: PropertyId, value: PropertyValue) -> bool {
        let Some(data) = self.properties.get(id) else {
            tracing::error!("Cannot set property, it is not an instance of this LogicEngine");
            return false;
        };
        if !data.semantics.is_input() {
            tracing::error!("Cannot set property '{}' which is an output.", data.name);
            return false;
        }
        if let Some(link) = data.incoming {
            let source = self
                .properties
                .get(link.source)
                .map(|s| s.name.as_str())
                .unwrap_or_default();
            tracing::error!(
                "Property '{}' is currently linked (to property '{}'). Unlink it first before setting its value!",
                data.name,
                source
            );
            return false;
        }
        if !data.property_type.is_primitive() {
            tracing::error!(
                "Property '{}' is not a primitive type, can't set its value directly!",
                data.name
            );
            return false;
        }
        if data.property_type != value.property_type() {
            tracing::error!(
                "Invalid type when setting property '{}', correct type is '{}'",
                data.name,
                data.property_type
            );
            return false;
        }

        let forces_update = data.semantics == PropertySemantics::BindingInput;
        let node = data.node;
        if self.properties.set_value(id, value) || forces_update {
            self.mark_dirty(node);
        }
        true
    }

    fn mark_dirty(&mut self, node: NodeId) {
        if let Some(entry) = self.nodes.get_mut(node) {
            entry.dirty = true;
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Links
    // ─────────────────────────────────────────────────────────────────────────

    /// Link an output to an input; the pair takes part in execution ordering
    pub fn link(&mut self, source: PropertyId, target: PropertyId) -> Result<()> {
        self.add_link(source, target, false)
    }

    /// Link that does not order execution, allowed to close a cycle. The
    /// target sees the source value of the previous update.
    pub fn link_weak(&mut self, source: PropertyId, target: PropertyId) -> Result<()> {
        self.add_link(source, target, true)
    }

    fn add_link(&mut self, source: PropertyId, target: PropertyId, weak: bool) -> Result<()> {
        self.check_link(source, target).map_err(link_error)?;
        self.properties.add_link(PropertyLink {
            source,
            target,
            weak,
        });
        let nodes = [source, target].map(|id| self.properties.get(id).map(|data| data.node));
        for node in nodes.into_iter().flatten() {
            self.mark_dirty(node);
        }
        self.sorted_nodes = None;
        Ok(())
    }

    fn property_node_name(&self, id: PropertyId) -> &str {
        self.properties
            .get(id)
            .and_then(|data| self.nodes.get(data.node))
            .map(|node| node.name.as_str())
            .unwrap_or_default()
    }

    fn check_link(&self, source: PropertyId, target: PropertyId) -> std::result::Result<(), String> {
        let (Some(src), Some(tgt)) = (self.properties.get(source), self.properties.get(target))
        else {
            return Err("Failed to link properties, at least one of them is not an instance of this LogicEngine".into());
        };
        let direction = |semantics: PropertySemantics| {
            if semantics.is_input() {
                "input"
            } else {
                "output"
            }
        };
        if src.semantics.is_input() || !tgt.semantics.is_input() {
            return Err(format!(
                "Failed to link {} property '{}' to {} property '{}'. Only outputs can be linked to inputs",
                direction(src.semantics),
                src.name,
                direction(tgt.semantics),
                tgt.name
            ));
        }
        if src.node == tgt.node {
            return Err(format!(
                "Link source and target can't belong to the same node! ('{}')",
                self.property_node_name(source)
            ));
        }
        if let Some(existing) = tgt.incoming {
            let existing_name = self
                .properties
                .get(existing.source)
                .map(|data| data.name.as_str())
                .unwrap_or_default();
            return Err(format!(
                "The property '{}' of LogicNode '{}' is already linked (to property '{}' of LogicNode '{}')",
                tgt.name,
                self.property_node_name(target),
                existing_name,
                self.property_node_name(existing.source)
            ));
        }
        if !src.property_type.is_primitive() || !tgt.property_type.is_primitive() {
            return Err("Can't link properties of complex types directly, currently only primitive properties can be linked".into());
        }
        if src.property_type != tgt.property_type {
            return Err(format!(
                "Types of source property '{}:{}' does not match target property '{}:{}'",
                src.name, src.property_type, tgt.name, tgt.property_type
            ));
        }
        Ok(())
    }

    pub fn unlink(&mut self, source: PropertyId, target: PropertyId) -> Result<()> {
        let (Some(src), Some(tgt)) = (self.properties.get(source), self.properties.get(target))
        else {
            return Err(link_error(
                "Failed to unlink properties, at least one of them is not an instance of this LogicEngine".into(),
            ));
        };
        if !src.property_type.is_primitive() || !tgt.property_type.is_primitive() {
            return Err(link_error(
                "Can't unlink properties of complex types directly!".into(),
            ));
        }
        if !tgt.incoming.is_some_and(|link| link.source == source) {
            return Err(link_error(format!(
                "Input property '{}' is not currently linked!",
                tgt.name
            )));
        }
        self.properties.remove_link(source, target);
        self.sorted_nodes = None;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Update
    // ─────────────────────────────────────────────────────────────────────────

    /// Node level edges: strong links plus joint to skin dependencies
    pub(crate) fn dependency_edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges = Vec::new();
        for (id, node) in &self.nodes {
            if let Some(inputs) = node.inputs {
                for leaf in self.properties.leaves(inputs) {
                    let source = self
                        .properties
                        .get(leaf)
                        .and_then(|data| data.incoming)
                        .filter(|link| !link.weak)
                        .and_then(|link| self.properties.get(link.source));
                    if let Some(source) = source {
                        edges.push((source.node, id));
                    }
                }
            }
            if let NodeKind::SkinBinding(skin) = &node.kind {
                edges.extend(skin.joints.iter().map(|&joint| (joint, id)));
            }
        }
        edges
    }

    /// Current execution order, recomputed after link changes
    pub(crate) fn execution_order(&mut self, caller: &'static str) -> Result<Vec<NodeId>> {
        if let Some(order) = &self.sorted_nodes {
            return Ok(order.clone());
        }
        let start = Instant::now();
        let Some(order) = sort_nodes(&self.creation_order, self.dependency_edges()) else {
            let error = LogicError::LinkCycle(caller);
            tracing::error!("{}", error);
            return Err(error);
        };
        self.report.topology_sort_time = start.elapsed();
        self.sorted_nodes = Some(order.clone());
        Ok(order)
    }

    /// Run every dirty node in link order and propagate changed outputs
    ///
    /// A node failing aborts the update and stays dirty.
    pub fn update(&mut self) -> Result<()> {
        let start = Instant::now();
        self.report.clear();
        self.statistics_log.clear();

        let order = self.execution_order("update")?;
        for node in self.nodes.values_mut() {
            if node.kind.always_dirty() {
                node.dirty = true;
            }
        }

        let collect_details = self.report_enabled || self.statistics.needs_node_timing();
        for id in order {
            self.execute_node(id, collect_details)?;
        }
        self.report.total_update_time = start.elapsed();

        if self.statistics.is_enabled() {
            self.statistics.collect(&self.report, self.nodes.len());
            if self.statistics.is_window_complete() {
                let nodes = &self.nodes;
                self.statistics_log = self.statistics.calculate_and_log(|id| {
                    nodes.get(id).map(|node| node.name.clone()).unwrap_or_default()
                });
            }
        }
        Ok(())
    }

    fn execute_node(&mut self, id: NodeId, collect_details: bool) -> Result<()> {
        let Some(node) = self.nodes.get_mut(id) else {
            return Ok(());
        };
        if self.dirty_tracking && !node.dirty {
            if collect_details {
                self.report.nodes_skipped.push(id);
            }
            return Ok(());
        }

        let start = Instant::now();
        if let Err(error) = node
            .kind
            .update(&mut self.properties, node.inputs, node.outputs, &mut self.scene)
        {
            tracing::error!("Error while updating LogicNode '{}': {}", node.name, error);
            return Err(LogicError::Runtime {
                node: node.name.clone(),
                error,
            });
        }
        let outputs = node.outputs;
        if let Some(outputs) = outputs {
            self.activate_links(outputs);
        }
        if collect_details {
            self.report.nodes_executed.push((id, start.elapsed()));
        }
        self.report.executed_count += 1;
        self.mark_clean(id);
        Ok(())
    }

    fn mark_clean(&mut self, node: NodeId) {
        if let Some(entry) = self.nodes.get_mut(node) {
            entry.dirty = false;
        }
    }

    fn activate_links(&mut self, outputs: PropertyId) {
        for leaf in self.properties.leaves(outputs) {
            let Some(data) = self.properties.get(leaf) else {
                continue;
            };
            let (Some(value), false) = (data.value.clone(), data.outgoing.is_empty()) else {
                continue;
            };
            let targets: Vec<PropertyId> = data.outgoing.iter().map(|link| link.target).collect();
            for target in targets {
                if self.properties.set_value(target, value.clone()) {
                    if let Some(node) = self.properties.get(target).map(|t| t.node) {
                        self.mark_dirty(node);
                    }
                    self.report.links_activated += 1;
                }
            }
        }
    }

    /// Run nodes regardless of their dirty state when disabled
    pub fn set_dirty_tracking_enabled(&mut self, enabled: bool) {
        self.dirty_tracking = enabled;
    }

    pub fn enable_update_report(&mut self, enabled: bool) {
        self.report_enabled = enabled;
    }

    /// Report of the last update, empty unless reporting is enabled
    pub fn last_update_report(&self) -> &UpdateReport {
        &self.report
    }

    /// Log statistics every `rate` updates, 0 disables them
    pub fn set_statistics_logging_rate(&mut self, rate: usize, mode: StatisticsLogMode) {
        self.statistics.set_logging_rate(rate, mode);
    }

    pub fn set_statistics_log_level(&mut self, level: StatisticsLogLevel) {
        self.statistics.set_log_level(level);
    }

    /// Lines emitted by the last update, empty if it did not close a window
    pub fn last_statistics_log(&self) -> &[String] {
        &self.statistics_log
    }

    /// Content warnings, also emitted through `tracing`
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let pending = self.nodes.values().any(|node| {
            node.kind.node_type().is_binding()
                && node
                    .inputs
                    .is_some_and(|inputs| self.properties.has_pending_binding_value(inputs))
        });
        if pending {
            warnings.push(PENDING_BINDING_VALUES_WARNING.to_string());
        }
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        warnings
    }
}
