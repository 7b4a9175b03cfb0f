//! Script nodes
//!
//! A script is a typed interface (input and output property declarations)
//! plus a Rust closure that reads the inputs and writes the outputs. Scripts
//! are identified by a source name so that a saved engine can be restored
//! from a [`ScriptLibrary`].

use crate::property::{PropertyArena, PropertyId};
use crate::types::{PropertyDecl, PropertyValueType};
use crate::LogicNodeRuntimeError;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Body of a script
pub type ScriptFn = Arc<dyn Fn(&mut ScriptContext<'_>) -> Result<(), String> + Send + Sync>;

/// Interface and body of a script
#[derive(Clone)]
pub struct ScriptDefinition {
    source: String,
    inputs: Vec<PropertyDecl>,
    outputs: Vec<PropertyDecl>,
    run: ScriptFn,
}

impl ScriptDefinition {
    pub fn new<F>(source: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut ScriptContext<'_>) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            run: Arc::new(run),
        }
    }

    pub fn with_input(mut self, decl: PropertyDecl) -> Self {
        self.inputs.push(decl);
        self
    }

    pub fn with_output(mut self, decl: PropertyDecl) -> Self {
        self.outputs.push(decl);
        self
    }

    /// Name the script is registered and saved under
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn input_decl(&self) -> PropertyDecl {
        PropertyDecl::structure("IN", self.inputs.clone())
    }

    pub(crate) fn output_decl(&self) -> PropertyDecl {
        PropertyDecl::structure("OUT", self.outputs.clone())
    }
}

impl fmt::Debug for ScriptDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptDefinition")
            .field("source", &self.source)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

/// Scripts available when loading a saved engine
#[derive(Clone, Debug, Default)]
pub struct ScriptLibrary {
    scripts: FxHashMap<String, ScriptDefinition>,
}

impl ScriptLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a script, replacing any earlier one with the same source name
    pub fn register(&mut self, definition: ScriptDefinition) {
        self.scripts.insert(definition.source.clone(), definition);
    }

    pub fn get(&self, source: &str) -> Option<&ScriptDefinition> {
        self.scripts.get(source)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

/// View of a running script's properties
pub struct ScriptContext<'a> {
    properties: &'a mut PropertyArena,
    inputs: Option<PropertyId>,
    outputs: Option<PropertyId>,
}

impl ScriptContext<'_> {
    /// Value of an input, `path` is dot separated with numeric array indices
    pub fn input<T: PropertyValueType>(&self, path: &str) -> Option<T> {
        let id = self.properties.find_path(self.inputs?, path)?;
        self.properties.typed_value(id)
    }

    pub fn output<T: PropertyValueType>(&self, path: &str) -> Option<T> {
        let id = self.properties.find_path(self.outputs?, path)?;
        self.properties.typed_value(id)
    }

    pub fn set_output<T: PropertyValueType>(&mut self, path: &str, value: T) -> Result<(), String> {
        let id = self
            .outputs
            .and_then(|outputs| self.properties.find_path(outputs, path))
            .ok_or_else(|| format!("Tried to access undefined struct field '{}'", path))?;
        let property_type = self
            .properties
            .get(id)
            .map(|data| data.property_type)
            .ok_or_else(|| format!("Tried to access undefined struct field '{}'", path))?;
        if property_type != T::PROPERTY_TYPE {
            return Err(format!(
                "Assigning {} to output '{}' of type {}",
                T::PROPERTY_TYPE,
                path,
                property_type
            ));
        }
        self.properties.set_value(id, value.into_value());
        Ok(())
    }
}

pub(crate) struct ScriptNode {
    pub(crate) definition: ScriptDefinition,
}

impl ScriptNode {
    pub(crate) fn update(
        &mut self,
        properties: &mut PropertyArena,
        inputs: Option<PropertyId>,
        outputs: Option<PropertyId>,
    ) -> Result<(), LogicNodeRuntimeError> {
        let mut context = ScriptContext {
            properties,
            inputs,
            outputs,
        };
        (self.definition.run)(&mut context).map_err(LogicNodeRuntimeError::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;
    use crate::property::PropertySemantics;
    use crate::types::PropertyType;
    use slotmap::SlotMap;

    fn doubler() -> ScriptDefinition {
        ScriptDefinition::new("doubler", |ctx| {
            let value = ctx.input::<i32>("value").unwrap_or_default();
            ctx.set_output("value", value * 2)
        })
        .with_input(PropertyDecl::new("value", PropertyType::Int32))
        .with_output(PropertyDecl::new("value", PropertyType::Int32))
    }

    #[test]
    fn test_script_runs_against_its_properties() {
        let mut keys: SlotMap<NodeId, ()> = SlotMap::with_key();
        let node = keys.insert(());
        let definition = doubler();
        let mut arena = PropertyArena::new();
        let inputs =
            arena.create_tree(&definition.input_decl(), node, PropertySemantics::ScriptInput);
        let outputs =
            arena.create_tree(&definition.output_decl(), node, PropertySemantics::ScriptOutput);
        let input = arena.find_path(inputs, "value").unwrap();
        arena.set_value(input, 21i32.into());

        let mut script = ScriptNode { definition };
        script.update(&mut arena, Some(inputs), Some(outputs)).unwrap();
        let output = arena.find_path(outputs, "value").unwrap();
        assert_eq!(arena.typed_value::<i32>(output), Some(42));
    }

    #[test]
    fn test_wrong_output_type_is_a_runtime_error() {
        let mut keys: SlotMap<NodeId, ()> = SlotMap::with_key();
        let node = keys.insert(());
        let definition = ScriptDefinition::new("bad", |ctx| ctx.set_output("value", 1.5f32))
            .with_output(PropertyDecl::new("value", PropertyType::Int32));
        let mut arena = PropertyArena::new();
        let outputs =
            arena.create_tree(&definition.output_decl(), node, PropertySemantics::ScriptOutput);

        let mut script = ScriptNode { definition };
        let error = script.update(&mut arena, None, Some(outputs)).unwrap_err();
        assert_eq!(error.message, "Assigning Float to output 'value' of type Int32");
    }

    #[test]
    fn test_library_lookup() {
        let mut library = ScriptLibrary::new();
        assert!(library.is_empty());
        library.register(doubler());
        library.register(doubler());
        assert_eq!(library.len(), 1);
        assert_eq!(library.get("doubler").unwrap().source(), "doubler");
        assert!(library.get("other").is_none());
    }
}
