//! Property tree storage
//!
//! All properties of an engine live in one [`PropertyArena`]. A property knows
//! its children, the node owning it and the links ending or starting at it.
//! Links are stored on both endpoints so they can be walked in either
//! direction without a search.

use crate::node::NodeId;
use crate::types::{PropertyDecl, PropertyType, PropertyValue, PropertyValueType};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Handle of a property inside an engine
    pub struct PropertyId;
}

/// Role of a property within its node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertySemantics {
    ScriptInput,
    ScriptOutput,
    BindingInput,
}

impl PropertySemantics {
    pub fn is_input(self) -> bool {
        !matches!(self, PropertySemantics::ScriptOutput)
    }
}

/// Connection from an output property to an input property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PropertyLink {
    pub source: PropertyId,
    pub target: PropertyId,
    /// Weak links do not take part in execution ordering
    pub weak: bool,
}

pub(crate) struct PropertyData {
    pub(crate) name: String,
    pub(crate) property_type: PropertyType,
    pub(crate) value: Option<PropertyValue>,
    pub(crate) children: Vec<PropertyId>,
    pub(crate) node: NodeId,
    pub(crate) semantics: PropertySemantics,
    pub(crate) binding_new_value: bool,
    pub(crate) incoming: Option<PropertyLink>,
    pub(crate) outgoing: SmallVec<[PropertyLink; 2]>,
}

#[derive(Default)]
pub(crate) struct PropertyArena {
    properties: SlotMap<PropertyId, PropertyData>,
}

impl PropertyArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Create a property tree from `decl` and return its root
    pub(crate) fn create_tree(
        &mut self,
        decl: &PropertyDecl,
        node: NodeId,
        semantics: PropertySemantics,
    ) -> PropertyId {
        let children = decl
            .children
            .iter()
            .map(|child| self.create_tree(child, node, semantics))
            .collect();
        self.properties.insert(PropertyData {
            name: decl.name.clone(),
            property_type: decl.property_type,
            value: decl.property_type.default_value(),
            children,
            node,
            semantics,
            binding_new_value: false,
            incoming: None,
            outgoing: SmallVec::new(),
        })
    }

    /// Remove a whole tree; links touching it must already be gone
    pub(crate) fn remove_tree(&mut self, root: PropertyId) {
        if let Some(data) = self.properties.remove(root) {
            for child in data.children {
                self.remove_tree(child);
            }
        }
    }

    pub(crate) fn get(&self, id: PropertyId) -> Option<&PropertyData> {
        self.properties.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: PropertyId) -> Option<&mut PropertyData> {
        self.properties.get_mut(id)
    }

    pub(crate) fn contains(&self, id: PropertyId) -> bool {
        self.properties.contains_key(id)
    }

    /// Primitive properties of a tree in depth-first order
    pub(crate) fn leaves(&self, root: PropertyId) -> Vec<PropertyId> {
        let mut leaves = Vec::new();
        self.collect_leaves(root, &mut leaves);
        leaves
    }

    fn collect_leaves(&self, id: PropertyId, out: &mut Vec<PropertyId>) {
        let Some(data) = self.properties.get(id) else {
            return;
        };
        if data.property_type.is_primitive() {
            out.push(id);
        } else {
            for &child in &data.children {
                self.collect_leaves(child, out);
            }
        }
    }

    pub(crate) fn child(&self, id: PropertyId, index: usize) -> Option<PropertyId> {
        self.properties.get(id)?.children.get(index).copied()
    }

    pub(crate) fn child_by_name(&self, id: PropertyId, name: &str) -> Option<PropertyId> {
        self.properties
            .get(id)?
            .children
            .iter()
            .copied()
            .find(|&child| self.properties.get(child).is_some_and(|c| c.name == name))
    }

    /// Resolve a dot separated path; numeric segments index into arrays
    pub(crate) fn find_path(&self, root: PropertyId, path: &str) -> Option<PropertyId> {
        if path.is_empty() {
            return Some(root);
        }
        path.split('.').try_fold(root, |current, segment| {
            let data = self.properties.get(current)?;
            match data.property_type {
                PropertyType::Array => self.child(current, segment.parse().ok()?),
                _ => self.child_by_name(current, segment),
            }
        })
    }

    /// Child indices leading from `root` to `id`
    pub(crate) fn index_path(&self, root: PropertyId, id: PropertyId) -> Option<Vec<usize>> {
        if root == id {
            return Some(Vec::new());
        }
        let data = self.properties.get(root)?;
        data.children.iter().enumerate().find_map(|(index, &child)| {
            self.index_path(child, id).map(|mut path| {
                path.insert(0, index);
                path
            })
        })
    }

    pub(crate) fn follow_index_path(&self, root: PropertyId, path: &[usize]) -> Option<PropertyId> {
        path.iter()
            .try_fold(root, |current, &index| self.child(current, index))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Values
    // ─────────────────────────────────────────────────────────────────────────

    /// Store a value without any API checks, returns whether it changed
    ///
    /// A binding input always records a pending new value.
    pub(crate) fn set_value(&mut self, id: PropertyId, value: PropertyValue) -> bool {
        let Some(data) = self.properties.get_mut(id) else {
            return false;
        };
        if data.semantics == PropertySemantics::BindingInput {
            data.binding_new_value = true;
        }
        if data.value.as_ref().is_some_and(|current| current.is_identical(&value)) {
            return false;
        }
        data.value = Some(value);
        true
    }

    /// Edge triggered read of the pending new value flag
    pub(crate) fn check_for_binding_input_new_value_and_reset(&mut self, id: PropertyId) -> bool {
        match self.properties.get_mut(id) {
            Some(data) => std::mem::take(&mut data.binding_new_value),
            None => false,
        }
    }

    /// Seed a binding input from scene state without a pending new value
    pub(crate) fn initialize_binding_input_value(&mut self, id: PropertyId, value: PropertyValue) {
        self.set_value(id, value);
        if let Some(data) = self.properties.get_mut(id) {
            data.binding_new_value = false;
        }
    }

    pub(crate) fn value(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.properties.get(id)?.value.as_ref()
    }

    pub(crate) fn typed_value<T: PropertyValueType>(&self, id: PropertyId) -> Option<T> {
        self.value(id).and_then(T::from_value)
    }

    pub(crate) fn has_pending_binding_value(&self, root: PropertyId) -> bool {
        self.leaves(root)
            .into_iter()
            .any(|leaf| self.properties.get(leaf).is_some_and(|d| d.binding_new_value))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Links
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn add_link(&mut self, link: PropertyLink) {
        if let Some(target) = self.properties.get_mut(link.target) {
            target.incoming = Some(link);
        }
        if let Some(source) = self.properties.get_mut(link.source) {
            source.outgoing.push(link);
        }
    }

    pub(crate) fn remove_link(&mut self, source: PropertyId, target: PropertyId) {
        if let Some(data) = self.properties.get_mut(target) {
            if data.incoming.is_some_and(|link| link.source == source) {
                data.incoming = None;
            }
        }
        if let Some(data) = self.properties.get_mut(source) {
            data.outgoing.retain(|link| link.target != target);
        }
    }

    /// Every link starting or ending inside the tree of `root`
    pub(crate) fn links_of_tree(&self, root: PropertyId) -> Vec<PropertyLink> {
        let mut links = Vec::new();
        for leaf in self.leaves(root) {
            if let Some(data) = self.properties.get(leaf) {
                links.extend(data.incoming);
                links.extend(data.outgoing.iter().copied());
            }
        }
        links
    }
}

/// Read access to one property
#[derive(Clone, Copy)]
pub struct PropertyRef<'a> {
    arena: &'a PropertyArena,
    id: PropertyId,
    data: &'a PropertyData,
}

impl<'a> PropertyRef<'a> {
    pub(crate) fn new(arena: &'a PropertyArena, id: PropertyId) -> Option<Self> {
        let data = arena.get(id)?;
        Some(Self { arena, id, data })
    }

    pub fn id(&self) -> PropertyId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.data.name
    }

    pub fn property_type(&self) -> PropertyType {
        self.data.property_type
    }

    pub fn semantics(&self) -> PropertySemantics {
        self.data.semantics
    }

    /// Node owning this property
    pub fn node(&self) -> NodeId {
        self.data.node
    }

    pub fn child_count(&self) -> usize {
        self.data.children.len()
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.arena.child_by_name(self.id, name).is_some()
    }

    pub fn child(&self, index: usize) -> Option<PropertyRef<'a>> {
        PropertyRef::new(self.arena, self.arena.child(self.id, index)?)
    }

    pub fn child_by_name(&self, name: &str) -> Option<PropertyRef<'a>> {
        PropertyRef::new(self.arena, self.arena.child_by_name(self.id, name)?)
    }

    pub fn children(&self) -> impl Iterator<Item = PropertyRef<'a>> + 'a {
        let arena = self.arena;
        self.data
            .children
            .iter()
            .filter_map(move |&child| PropertyRef::new(arena, child))
    }

    /// Typed value, `None` for complex properties or a type mismatch
    pub fn get<T: PropertyValueType>(&self) -> Option<T> {
        self.data.value.as_ref().and_then(T::from_value)
    }

    pub fn value(&self) -> Option<&'a PropertyValue> {
        self.data.value.as_ref()
    }

    pub fn is_linked(&self) -> bool {
        self.has_incoming_link() || self.has_outgoing_link()
    }

    pub fn has_incoming_link(&self) -> bool {
        self.data.incoming.is_some()
    }

    pub fn has_outgoing_link(&self) -> bool {
        !self.data.outgoing.is_empty()
    }

    pub fn incoming_link(&self) -> Option<PropertyLink> {
        self.data.incoming
    }

    pub fn outgoing_links_count(&self) -> usize {
        self.data.outgoing.len()
    }

    pub fn outgoing_link(&self, index: usize) -> Option<PropertyLink> {
        self.data.outgoing.get(index).copied()
    }
}

impl std::fmt::Debug for PropertyRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyRef")
            .field("id", &self.id)
            .field("name", &self.data.name)
            .field("type", &self.data.property_type)
            .field("value", &self.data.value)
            .finish()
    }
}
