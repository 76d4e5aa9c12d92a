//! Named-field archive with nested scopes
//!
//! Components write their state as `name = value` pairs through an
//! [`ArchiveWriter`], grouping related fields with `start_scope` /
//! `end_scope`. The result is a [`Scope`] tree that persists as RON text and is
//! read back field by field with [`Scope::read_variable`].
//!
//! ```text
//! TestLevel (
//!     numGameObjects = 2
//!     Player (
//!         Transform ( localTranslation = [5, -2, 0] ... )
//!     )
//! )
//! ```

use crate::foundation::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors raised while writing or reading an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A variable was requested that the scope does not contain
    #[error("Variable '{name}' not found in scope '{scope}'")]
    MissingVariable {
        /// Scope that was searched
        scope: String,
        /// Requested variable
        name: String,
    },

    /// A nested scope was requested that does not exist
    #[error("Scope '{name}' not found in scope '{parent}'")]
    MissingScope {
        /// Scope that was searched
        parent: String,
        /// Requested scope
        name: String,
    },

    /// The stored value has a different type than requested
    #[error("Variable '{name}' holds {found}, expected {expected}")]
    TypeMismatch {
        /// Variable name
        name: String,
        /// Requested type
        expected: &'static str,
        /// Stored type
        found: &'static str,
    },

    /// `end_scope` without a matching `start_scope`, or unclosed scopes at finish
    #[error("Unbalanced scopes: {0}")]
    UnbalancedScope(String),

    /// The text could not be parsed or produced
    #[error("Format error: {0}")]
    Format(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single stored value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// Unsigned integer (counts, sizes)
    UInt(u64),
    /// Floating point scalar
    Float(f32),
    /// Text
    Text(String),
    /// Two component vector
    Vec2([f32; 2]),
    /// Three component vector
    Vec3([f32; 3]),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::UInt(u64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::UInt(value as u64)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec2> for Value {
    fn from(value: Vec2) -> Self {
        Self::Vec2([value.x, value.y])
    }
}

impl From<Vec3> for Value {
    fn from(value: Vec3) -> Self {
        Self::Vec3([value.x, value.y, value.z])
    }
}

/// Types that can be read back out of a [`Value`]
pub trait FromValue: Sized {
    /// Name used in type mismatch errors
    const TYPE_NAME: &'static str;

    /// Convert, or `None` when the stored variant does not match
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for u32 {
    const TYPE_NAME: &'static str = "uint";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::UInt(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromValue for u64 {
    const TYPE_NAME: &'static str = "uint";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for usize {
    const TYPE_NAME: &'static str = "uint";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::UInt(v) => usize::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    const TYPE_NAME: &'static str = "float";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for String {
    const TYPE_NAME: &'static str = "text";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for Vec2 {
    const TYPE_NAME: &'static str = "vec2";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Vec2([x, y]) => Some(Vec2::new(*x, *y)),
            _ => None,
        }
    }
}

impl FromValue for Vec3 {
    const TYPE_NAME: &'static str = "vec3";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Vec3([x, y, z]) => Some(Vec3::new(*x, *y, *z)),
            _ => None,
        }
    }
}

/// A named scope holding ordered variables and nested scopes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    /// Scope name (empty for the archive root)
    pub name: String,
    /// Variables in write order
    pub variables: Vec<(String, Value)>,
    /// Nested scopes in write order
    pub scopes: Vec<Scope>,
}

impl Scope {
    /// Create an empty scope
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            scopes: Vec::new(),
        }
    }

    /// Raw value of a variable
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.variables
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Read a typed variable
    pub fn read_variable<T: FromValue>(&self, name: &str) -> ArchiveResult<T> {
        let value = self.value(name).ok_or_else(|| ArchiveError::MissingVariable {
            scope: self.name.clone(),
            name: name.to_string(),
        })?;

        T::from_value(value).ok_or_else(|| ArchiveError::TypeMismatch {
            name: name.to_string(),
            expected: T::TYPE_NAME,
            found: value.type_name(),
        })
    }

    /// First nested scope with the given name
    pub fn scope(&self, name: &str) -> ArchiveResult<&Scope> {
        self.scopes
            .iter()
            .find(|scope| scope.name == name)
            .ok_or_else(|| ArchiveError::MissingScope {
                parent: self.name.clone(),
                name: name.to_string(),
            })
    }

    /// Parse a scope tree from RON text
    pub fn from_ron_str(text: &str) -> ArchiveResult<Self> {
        ron::from_str(text).map_err(|e| ArchiveError::Format(e.to_string()))
    }

    /// Render the scope tree as RON text
    pub fn to_ron_string(&self) -> ArchiveResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ArchiveError::Format(e.to_string()))
    }

    /// Write the scope tree to a file
    pub fn save_to_file(&self, path: &str) -> ArchiveResult<()> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    /// Read a scope tree from a file
    pub fn load_from_file(path: &str) -> ArchiveResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }
}

/// Builds a [`Scope`] tree with scope-open / scope-close calls
#[derive(Debug)]
pub struct ArchiveWriter {
    stack: Vec<Scope>,
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter {
    /// Create a writer positioned in an unnamed root scope
    pub fn new() -> Self {
        Self {
            stack: vec![Scope::default()],
        }
    }

    fn current(&mut self) -> &mut Scope {
        // The root is never popped
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    /// Write `name = value` into the current scope
    pub fn write_variable(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        self.current().variables.push((name.to_string(), value));
    }

    /// Open a nested scope
    pub fn start_scope(&mut self, name: &str) {
        self.stack.push(Scope::new(name));
    }

    /// Close the innermost scope
    pub fn end_scope(&mut self) -> ArchiveResult<()> {
        if self.stack.len() <= 1 {
            return Err(ArchiveError::UnbalancedScope(
                "end_scope called at the archive root".to_string(),
            ));
        }

        if let Some(scope) = self.stack.pop() {
            self.current().scopes.push(scope);
        }
        Ok(())
    }

    /// Current nesting depth (0 at the root)
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Finish writing and return the root scope
    pub fn finish(mut self) -> ArchiveResult<Scope> {
        if self.stack.len() != 1 {
            return Err(ArchiveError::UnbalancedScope(format!(
                "{} scope(s) left open",
                self.stack.len() - 1
            )));
        }

        Ok(self.stack.pop().unwrap_or_default())
    }
}
