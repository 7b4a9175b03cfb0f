//! Saving and loading a logic engine as JSON
//!
//! Nodes are written in creation order with their full property trees.
//! Links refer to nodes by their position in that order and to properties by
//! the child indices leading to them from the node's root. Scripts are
//! written by source name and restored from a [`ScriptLibrary`]; bindings
//! re-resolve their scene objects on load.

use crate::bindings::{
    MeshNodeBinding, NodeBinding, RenderBufferBinding, RenderGroupBinding,
    RenderGroupBindingElements, RenderPassBinding, RotationType, SkinBinding,
};
use crate::dependencies::sort_nodes;
use crate::engine::LogicEngine;
use crate::node::{LogicNode, LogicNodeType, NodeId, NodeKind};
use crate::property::{PropertyArena, PropertyId, PropertyLink, PropertySemantics};
use crate::script::{ScriptLibrary, ScriptNode};
use crate::timer::{self, TimerNode};
use crate::types::{PropertyDecl, PropertyType, PropertyValue};
use crate::{LogicError, Result};
use ramses_scene::{Mat4, SceneBackend, SceneObjectId, SceneObjectType};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::fs;
use std::path::Path;

const FILE_FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SerializedEngine {
    file_version: u32,
    #[serde(default)]
    nodes: Vec<SerializedNode>,
    #[serde(default)]
    links: Vec<SerializedLink>,
}

#[derive(Serialize, Deserialize)]
struct SerializedNode {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    user_id: (u64, u64),
    kind: SerializedKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inputs: Option<SerializedProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    outputs: Option<SerializedProperty>,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum SerializedKind {
    Script {
        source: String,
    },
    #[serde(rename = "TimerNode")]
    Timer,
    NodeBinding {
        #[serde(default)]
        object: Option<SceneObjectId>,
        #[serde(default)]
        rotation_type: RotationType,
    },
    MeshNodeBinding {
        #[serde(default)]
        object: Option<SceneObjectId>,
    },
    RenderPassBinding {
        #[serde(default)]
        object: Option<SceneObjectId>,
    },
    RenderGroupBinding {
        #[serde(default)]
        object: Option<SceneObjectId>,
        #[serde(default)]
        elements: Vec<(String, SceneObjectId)>,
    },
    RenderBufferBinding {
        #[serde(default)]
        object: Option<SceneObjectId>,
    },
    SkinBinding {
        joints: Vec<u64>,
        inverse_bind_matrices: Vec<Mat4>,
        #[serde(default)]
        appearance: Option<SceneObjectId>,
        uniform: String,
    },
}

impl SerializedKind {
    fn node_type(&self) -> LogicNodeType {
        match self {
            SerializedKind::Script { .. } => LogicNodeType::Script,
            SerializedKind::Timer => LogicNodeType::Timer,
            SerializedKind::NodeBinding { .. } => LogicNodeType::NodeBinding,
            SerializedKind::MeshNodeBinding { .. } => LogicNodeType::MeshNodeBinding,
            SerializedKind::RenderPassBinding { .. } => LogicNodeType::RenderPassBinding,
            SerializedKind::RenderGroupBinding { .. } => LogicNodeType::RenderGroupBinding,
            SerializedKind::RenderBufferBinding { .. } => LogicNodeType::RenderBufferBinding,
            SerializedKind::SkinBinding { .. } => LogicNodeType::SkinBinding,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SerializedProperty {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<PropertyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<SerializedProperty>,
}

#[derive(Serialize, Deserialize)]
struct SerializedLink {
    source_node: u64,
    source_path: Vec<usize>,
    target_node: u64,
    target_path: Vec<usize>,
    #[serde(default)]
    weak: bool,
}

fn fatal(type_name: &str, problem: &str) -> LogicError {
    let message = format!(
        "Fatal error during loading of {} from serialized data: {}",
        type_name, problem
    );
    tracing::error!("{}", message);
    LogicError::Deserialization(message)
}

// ─────────────────────────────────────────────────────────────────────────────
// Saving
// ─────────────────────────────────────────────────────────────────────────────

impl<S: SceneBackend> LogicEngine<S> {
    pub fn save_to_string(&self) -> Result<String> {
        let serialized = self.serialize("save_to_string")?;
        Ok(serde_json::to_string_pretty(&serialized)?)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let serialized = self.serialize("save_to_file")?;
        fs::write(path, serde_json::to_string_pretty(&serialized)?)?;
        tracing::info!(
            "Saved {} logic nodes to {}",
            serialized.nodes.len(),
            path.display()
        );
        Ok(())
    }

    fn serialize(&self, caller: &'static str) -> Result<SerializedEngine> {
        if sort_nodes(&self.creation_order, self.dependency_edges()).is_none() {
            let error = LogicError::LinkCycle(caller);
            tracing::error!("{}", error);
            return Err(error);
        }
        self.validate();

        let positions: FxHashMap<NodeId, u64> = self
            .creation_order
            .iter()
            .enumerate()
            .map(|(index, &id)| (id, index as u64))
            .collect();

        let mut nodes = Vec::with_capacity(self.creation_order.len());
        let mut links = Vec::new();
        for (&id, node) in self
            .creation_order
            .iter()
            .filter_map(|id| self.nodes.get(*id).map(|node| (id, node)))
        {
            let is_timer = matches!(node.kind, NodeKind::Timer(_));
            nodes.push(SerializedNode {
                name: Some(node.name.clone()),
                id: positions.get(&id).copied(),
                user_id: node.user_id,
                kind: self.serialize_kind(&node.kind, &positions),
                inputs: node
                    .inputs
                    .and_then(|root| self.serialize_property(root, false)),
                // the ticker is not meaningful in another process
                outputs: node
                    .outputs
                    .and_then(|root| self.serialize_property(root, is_timer)),
            });

            let Some(inputs) = node.inputs else {
                continue;
            };
            for leaf in self.properties.leaves(inputs) {
                if let Some(link) = self.properties.get(leaf).and_then(|data| data.incoming) {
                    links.extend(self.serialize_link(link, inputs, &positions));
                }
            }
        }

        Ok(SerializedEngine {
            file_version: FILE_FORMAT_VERSION,
            nodes,
            links,
        })
    }

    fn serialize_kind(&self, kind: &NodeKind, positions: &FxHashMap<NodeId, u64>) -> SerializedKind {
        match kind {
            NodeKind::Script(script) => SerializedKind::Script {
                source: script.definition.source().to_string(),
            },
            NodeKind::Timer(_) => SerializedKind::Timer,
            NodeKind::NodeBinding(binding) => SerializedKind::NodeBinding {
                object: Some(binding.node),
                rotation_type: binding.rotation_type,
            },
            NodeKind::MeshNodeBinding(binding) => SerializedKind::MeshNodeBinding {
                object: Some(binding.mesh),
            },
            NodeKind::RenderPassBinding(binding) => SerializedKind::RenderPassBinding {
                object: Some(binding.pass),
            },
            NodeKind::RenderGroupBinding(binding) => SerializedKind::RenderGroupBinding {
                object: Some(binding.group),
                elements: binding.elements.elements().to_vec(),
            },
            NodeKind::RenderBufferBinding(binding) => SerializedKind::RenderBufferBinding {
                object: Some(binding.buffer),
            },
            NodeKind::SkinBinding(skin) => SerializedKind::SkinBinding {
                joints: skin
                    .joints
                    .iter()
                    .filter_map(|joint| positions.get(joint).copied())
                    .collect(),
                inverse_bind_matrices: skin.inverse_bind_matrices.clone(),
                appearance: Some(skin.appearance),
                uniform: skin.uniform.clone(),
            },
        }
    }

    fn serialize_property(&self, id: PropertyId, zero_values: bool) -> Option<SerializedProperty> {
        let data = self.properties.get(id)?;
        Some(SerializedProperty {
            name: Some(data.name.clone()),
            property_type: data.property_type,
            value: if zero_values {
                data.property_type.default_value()
            } else {
                data.value.clone()
            },
            children: data
                .children
                .iter()
                .filter_map(|&child| self.serialize_property(child, zero_values))
                .collect(),
        })
    }

    fn serialize_link(
        &self,
        link: PropertyLink,
        target_root: PropertyId,
        positions: &FxHashMap<NodeId, u64>,
    ) -> Option<SerializedLink> {
        let target = self.properties.get(link.target)?;
        let source = self.properties.get(link.source)?;
        let source_root = self.nodes.get(source.node)?.outputs?;
        Some(SerializedLink {
            source_node: *positions.get(&source.node)?,
            source_path: self.properties.index_path(source_root, link.source)?,
            target_node: *positions.get(&target.node)?,
            target_path: self.properties.index_path(target_root, link.target)?,
            weak: link.weak,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the engine content with a saved one
    ///
    /// The engine is left untouched if loading fails.
    pub fn load_from_str(&mut self, content: &str, library: &ScriptLibrary) -> Result<()> {
        let serialized: SerializedEngine = serde_json::from_str(content).map_err(|e| {
            let message = format!("Failed to parse logic engine data: {}", e);
            tracing::error!("{}", message);
            LogicError::Deserialization(message)
        })?;
        if serialized.file_version != FILE_FORMAT_VERSION {
            let message = format!(
                "Version mismatch while loading data! Expected file format version {}, found {}",
                FILE_FORMAT_VERSION, serialized.file_version
            );
            tracing::error!("{}", message);
            return Err(LogicError::Deserialization(message));
        }

        let mut loader = Loader {
            scene: &self.scene,
            library,
            properties: PropertyArena::new(),
            nodes: SlotMap::with_key(),
            creation_order: Vec::new(),
            ids: FxHashMap::default(),
        };
        for node in &serialized.nodes {
            loader.load_node(node)?;
        }
        for link in &serialized.links {
            loader.load_link(link)?;
        }

        let Loader {
            properties,
            nodes,
            creation_order,
            ..
        } = loader;
        tracing::info!("Loaded {} logic nodes", nodes.len());
        self.properties = properties;
        self.nodes = nodes;
        self.creation_order = creation_order;
        self.sorted_nodes = None;
        Ok(())
    }

    pub fn load_from_file(&mut self, path: impl AsRef<Path>, library: &ScriptLibrary) -> Result<()> {
        let content = fs::read_to_string(path.as_ref())?;
        self.load_from_str(&content, library)
    }
}

struct Loader<'a> {
    scene: &'a dyn SceneBackend,
    library: &'a ScriptLibrary,
    properties: PropertyArena,
    nodes: SlotMap<NodeId, LogicNode>,
    creation_order: Vec<NodeId>,
    /// File ids to loaded nodes
    ids: FxHashMap<u64, NodeId>,
}

impl Loader<'_> {
    fn scene_object(
        &self,
        type_name: &str,
        object: Option<SceneObjectId>,
        accepts: impl Fn(SceneObjectType) -> bool,
    ) -> Result<SceneObjectId> {
        let object = object.ok_or_else(|| fatal(type_name, "missing ramses object reference!"))?;
        match self.scene.object_type(object) {
            Some(object_type) if accepts(object_type) => Ok(object),
            Some(_) => Err(fatal(
                type_name,
                "loaded object type does not match referenced object type!",
            )),
            None => Err(fatal(type_name, "could not resolve referenced ramses object!")),
        }
    }

    fn load_node(&mut self, node: &SerializedNode) -> Result<()> {
        let node_type = node.kind.node_type();
        let type_name = node_type.name();
        let (Some(name), Some(file_id)) = (&node.name, node.id) else {
            return Err(fatal(type_name, "missing name and/or ID!"));
        };

        let (kind, expected_inputs) = self.load_kind(type_name, &node.kind)?;
        let semantics = if node_type.is_binding() {
            PropertySemantics::BindingInput
        } else {
            PropertySemantics::ScriptInput
        };

        let has_interface = !matches!(kind, NodeKind::SkinBinding(_));
        let inputs = match (&node.inputs, has_interface) {
            (Some(inputs), true) => {
                if inputs.property_type != PropertyType::Struct {
                    return Err(fatal(type_name, "root input has unexpected type!"));
                }
                let decl = to_decl(inputs)?;
                if expected_inputs.as_ref().is_some_and(|expected| *expected != decl) {
                    return Err(fatal(
                        type_name,
                        if node_type == LogicNodeType::RenderGroupBinding {
                            "input properties do not match RenderGroup's elements!"
                        } else {
                            "input properties do not match the node interface!"
                        },
                    ));
                }
                Some((inputs, decl))
            }
            (None, true) => return Err(fatal(type_name, "missing root input!")),
            (_, false) => None,
        };
        let outputs = match (&node.outputs, node_type.is_binding()) {
            (Some(outputs), false) => {
                if outputs.property_type != PropertyType::Struct {
                    return Err(fatal(type_name, "root output has unexpected type!"));
                }
                let decl = to_decl(outputs)?;
                let expected = match &kind {
                    NodeKind::Script(script) => Some(script.definition.output_decl()),
                    NodeKind::Timer(_) => Some(timer::output_decl()),
                    _ => None,
                };
                if expected.is_some_and(|expected| expected != decl) {
                    return Err(fatal(
                        type_name,
                        "output properties do not match the node interface!",
                    ));
                }
                Some((outputs, decl))
            }
            (None, false) => return Err(fatal(type_name, "missing root output!")),
            (_, true) => None,
        };

        let dirty = !node_type.is_binding() || kind.always_dirty();
        let id = self.nodes.insert(LogicNode {
            name: name.clone(),
            user_id: node.user_id,
            kind,
            inputs: None,
            outputs: None,
            dirty,
        });
        let input_root = match inputs {
            Some((serialized, decl)) => {
                let root = self.properties.create_tree(&decl, id, semantics);
                restore_values(&mut self.properties, root, serialized)?;
                Some(root)
            }
            None => None,
        };
        let output_root = match outputs {
            Some((serialized, decl)) => {
                let root =
                    self.properties
                        .create_tree(&decl, id, PropertySemantics::ScriptOutput);
                restore_values(&mut self.properties, root, serialized)?;
                Some(root)
            }
            None => None,
        };
        if let Some(entry) = self.nodes.get_mut(id) {
            entry.inputs = input_root;
            entry.outputs = output_root;
        }
        self.creation_order.push(id);
        self.ids.insert(file_id, id);
        Ok(())
    }

    /// Node state plus the input interface the saved tree must match
    fn load_kind(
        &self,
        type_name: &str,
        kind: &SerializedKind,
    ) -> Result<(NodeKind, Option<PropertyDecl>)> {
        Ok(match kind {
            SerializedKind::Script { source } => {
                let definition = self.library.get(source).ok_or_else(|| {
                    fatal(
                        type_name,
                        &format!("script '{}' is not registered in the ScriptLibrary!", source),
                    )
                })?;
                (
                    NodeKind::Script(ScriptNode {
                        definition: definition.clone(),
                    }),
                    Some(definition.input_decl()),
                )
            }
            SerializedKind::Timer => (NodeKind::Timer(TimerNode), Some(timer::input_decl())),
            SerializedKind::NodeBinding {
                object,
                rotation_type,
            } => {
                let node = self.scene_object(type_name, *object, SceneObjectType::is_node)?;
                (
                    NodeKind::NodeBinding(NodeBinding {
                        node,
                        rotation_type: *rotation_type,
                    }),
                    Some(NodeBinding::input_decl(*rotation_type)),
                )
            }
            SerializedKind::MeshNodeBinding { object } => {
                let mesh = self.scene_object(type_name, *object, |t| t == SceneObjectType::MeshNode)?;
                (
                    NodeKind::MeshNodeBinding(MeshNodeBinding { mesh }),
                    Some(MeshNodeBinding::input_decl()),
                )
            }
            SerializedKind::RenderPassBinding { object } => {
                let pass =
                    self.scene_object(type_name, *object, |t| t == SceneObjectType::RenderPass)?;
                (
                    NodeKind::RenderPassBinding(RenderPassBinding { pass }),
                    Some(RenderPassBinding::input_decl()),
                )
            }
            SerializedKind::RenderBufferBinding { object } => {
                let buffer =
                    self.scene_object(type_name, *object, |t| t == SceneObjectType::RenderBuffer)?;
                (
                    NodeKind::RenderBufferBinding(RenderBufferBinding { buffer }),
                    Some(RenderBufferBinding::input_decl()),
                )
            }
            SerializedKind::RenderGroupBinding { object, elements } => {
                let group =
                    self.scene_object(type_name, *object, |t| t == SceneObjectType::RenderGroup)?;
                let elements: RenderGroupBindingElements = elements.iter().cloned().collect();
                let decl = RenderGroupBinding::input_decl(&elements);
                (
                    NodeKind::RenderGroupBinding(RenderGroupBinding { group, elements }),
                    Some(decl),
                )
            }
            SerializedKind::SkinBinding {
                joints,
                inverse_bind_matrices,
                appearance,
                uniform,
            } => {
                let appearance =
                    self.scene_object(type_name, *appearance, |t| t == SceneObjectType::Appearance)?;
                let mut joint_ids = Vec::with_capacity(joints.len());
                let mut joint_nodes = Vec::with_capacity(joints.len());
                for file_id in joints {
                    let joint = self.ids.get(file_id).copied();
                    match joint.and_then(|id| self.nodes.get(id)).map(|node| &node.kind) {
                        Some(NodeKind::NodeBinding(binding)) => {
                            joint_ids.extend(joint);
                            joint_nodes.push(binding.node);
                        }
                        _ => return Err(fatal(type_name, "could not resolve joint NodeBinding!")),
                    }
                }
                SkinBinding::validate(
                    self.scene,
                    joint_ids.len(),
                    inverse_bind_matrices,
                    appearance,
                    uniform,
                )
                .map_err(|e| fatal(type_name, &e))?;
                (
                    NodeKind::SkinBinding(SkinBinding {
                        joints: joint_ids,
                        joint_nodes,
                        inverse_bind_matrices: inverse_bind_matrices.clone(),
                        appearance,
                        uniform: uniform.clone(),
                    }),
                    None,
                )
            }
        })
    }

    fn resolve(&self, node: u64, path: &[usize], output: bool) -> Option<PropertyId> {
        let node = self.nodes.get(*self.ids.get(&node)?)?;
        let root = if output { node.outputs } else { node.inputs }?;
        let id = self.properties.follow_index_path(root, path)?;
        self.properties
            .get(id)
            .is_some_and(|data| data.property_type.is_primitive())
            .then_some(id)
    }

    fn load_link(&mut self, link: &SerializedLink) -> Result<()> {
        let source = self
            .resolve(link.source_node, &link.source_path, true)
            .ok_or_else(|| fatal("Link", "could not resolve link source property!"))?;
        let target = self
            .resolve(link.target_node, &link.target_path, false)
            .ok_or_else(|| fatal("Link", "could not resolve link target property!"))?;
        let (Some(src), Some(tgt)) = (self.properties.get(source), self.properties.get(target))
        else {
            return Err(fatal("Link", "could not resolve link properties!"));
        };
        if tgt.incoming.is_some() {
            return Err(fatal("Link", "target property is already linked!"));
        }
        if src.property_type != tgt.property_type {
            return Err(fatal("Link", "source and target property types do not match!"));
        }
        self.properties.add_link(PropertyLink {
            source,
            target,
            weak: link.weak,
        });
        Ok(())
    }
}

fn to_decl(serialized: &SerializedProperty) -> Result<PropertyDecl> {
    let name = serialized
        .name
        .clone()
        .ok_or_else(|| fatal("Property", "missing name!"))?;
    Ok(PropertyDecl {
        name,
        property_type: serialized.property_type,
        children: serialized
            .children
            .iter()
            .map(to_decl)
            .collect::<Result<Vec<_>>>()?,
    })
}

/// Copy saved values into a freshly created tree without pending binding flags
fn restore_values(
    properties: &mut PropertyArena,
    id: PropertyId,
    serialized: &SerializedProperty,
) -> Result<()> {
    if let Some(value) = &serialized.value {
        let Some(data) = properties.get_mut(id) else {
            return Err(fatal("Property", "missing property!"));
        };
        if value.property_type() != data.property_type {
            return Err(fatal("Property", "value has unexpected type!"));
        }
        data.value = Some(value.clone());
    }
    for (index, child) in serialized.children.iter().enumerate() {
        if let Some(child_id) = properties.child(id, index) {
            restore_values(properties, child_id, child)?;
        }
    }
    Ok(())
}
