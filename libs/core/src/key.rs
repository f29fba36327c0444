use std::fmt;

use crate::error::{Error, Result};

/// Address of one remotely invocable operation
///
/// Both parts are non-empty and compared exactly. The operation may not
/// contain `/`, so a request path always splits back into the same key
/// at its last separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationKey {
    namespace: String,
    operation: String,
}

impl OperationKey {
    pub fn new(namespace: impl Into<String>, operation: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let operation = operation.into();

        if namespace.is_empty() {
            return Err(Error::InvalidKey("namespace is empty".to_string()));
        }
        if operation.is_empty() {
            return Err(Error::InvalidKey(format!(
                "operation is empty in namespace {namespace}"
            )));
        }
        if operation.contains('/') {
            return Err(Error::InvalidKey(format!(
                "operation {operation:?} contains '/'"
            )));
        }

        Ok(Self {
            namespace,
            operation,
        })
    }

    /// Parse a key from a request path of the form `/namespace/operation`
    ///
    /// Returns `None` when the path does not have that shape.
    pub fn from_path(path: &str) -> Option<Self> {
        let rest = path.strip_prefix('/')?;
        let (namespace, operation) = rest.rsplit_once('/')?;
        Self::new(namespace, operation).ok()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Request path for this key, `/namespace/operation`
    pub fn path(&self) -> String {
        format!("/{}/{}", self.namespace, self.operation)
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.operation)
    }
}
