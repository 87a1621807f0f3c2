//! Variable descriptor.

use crate::domain::variable::VariableType;

/// Describes a planning variable at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDescriptor {
    /// Name of the variable (field name).
    pub name: &'static str,
    /// Type of the variable.
    pub variable_type: VariableType,
    /// Whether the variable can be unassigned.
    pub allows_unassigned: bool,
}

impl VariableDescriptor {
    /// Creates a new genuine variable descriptor.
    pub fn genuine(name: &'static str) -> Self {
        VariableDescriptor {
            name,
            variable_type: VariableType::Genuine,
            allows_unassigned: false,
        }
    }

    /// Creates a new shadow variable descriptor.
    ///
    /// Shadow variables start unassigned until their listener first runs.
    pub fn shadow(name: &'static str) -> Self {
        VariableDescriptor {
            name,
            variable_type: VariableType::Shadow,
            allows_unassigned: true,
        }
    }

    /// Sets whether unassigned values are allowed.
    pub fn with_allows_unassigned(mut self, allows: bool) -> Self {
        self.allows_unassigned = allows;
        self
    }
}
