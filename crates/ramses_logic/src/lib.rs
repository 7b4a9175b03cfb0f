//! Logic graph for RAMSES scenes
//!
//! This crate provides:
//! - Typed property trees with links between node outputs and inputs
//! - Script nodes (Rust closures with a declared interface) and a timer node
//! - Bindings that push property values into a scene backend
//! - A dependency ordered, dirty tracked update with optional reports and
//!   periodic statistics
//! - Saving and loading of a whole engine as JSON

pub mod bindings;
pub mod config;
mod dependencies;
pub mod engine;
pub mod node;
pub mod property;
pub mod report;
pub mod script;
mod serialization;
pub mod statistics;
pub mod timer;
pub mod types;

pub use bindings::{RenderGroupBindingElements, RotationType};
pub use config::LogicEngineConfig;
pub use engine::LogicEngine;
pub use node::{LogicNodeType, NodeId};
pub use property::{PropertyId, PropertyLink, PropertyRef, PropertySemantics};
pub use report::UpdateReport;
pub use script::{ScriptContext, ScriptDefinition, ScriptFn, ScriptLibrary};
pub use statistics::{LogicNodeUpdateStatistics, StatisticsLogLevel, StatisticsLogMode};
pub use types::{
    PropertyDecl, PropertyType, PropertyValue, PropertyValueType, Vec2f, Vec2i, Vec3f, Vec3i,
    Vec4f, Vec4i,
};

use ramses_scene::SceneError;
use thiserror::Error;

/// Failure of a single node during update
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct LogicNodeRuntimeError {
    pub message: String,
}

impl LogicNodeRuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for LogicNodeRuntimeError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<SceneError> for LogicNodeRuntimeError {
    fn from(error: SceneError) -> Self {
        Self {
            message: error.to_string(),
        }
    }
}

/// Logic engine errors
#[derive(Error, Debug)]
pub enum LogicError {
    #[error("{0}")]
    Link(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Failed to sort logic nodes based on links between their properties. Create a loop-free link graph before calling {0}()!")]
    LinkCycle(&'static str),

    #[error("Error while updating LogicNode '{node}': {error}")]
    Runtime {
        node: String,
        #[source]
        error: LogicNodeRuntimeError,
    },

    #[error("{0}")]
    Deserialization(String),

    #[error("Failed to serialize logic engine: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to access file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene backend error: {0}")]
    Scene(#[from] SceneError),
}

pub type Result<T> = std::result::Result<T, LogicError>;
