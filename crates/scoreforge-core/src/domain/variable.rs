//! Variable type definitions

/// The type of a planning variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    /// A genuine planning variable assigned by the search.
    Genuine,
    /// A shadow variable derived from other variables by a listener.
    Shadow,
}

impl VariableType {
    /// Returns true if this is a genuine (non-shadow) variable.
    pub fn is_genuine(&self) -> bool {
        matches!(self, VariableType::Genuine)
    }

    /// Returns true if this is a shadow variable.
    pub fn is_shadow(&self) -> bool {
        matches!(self, VariableType::Shadow)
    }
}

/// Direct handle to a variable descriptor.
///
/// Internal callers use this instead of a variable name to skip the name
/// resolution on every notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId {
    /// Index of the owning entity descriptor in the solution descriptor.
    pub descriptor_index: usize,
    /// Index of the variable within its entity descriptor.
    pub variable_index: usize,
}

impl VariableId {
    pub const fn new(descriptor_index: usize, variable_index: usize) -> Self {
        Self {
            descriptor_index,
            variable_index,
        }
    }
}
