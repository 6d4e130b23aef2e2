//! Form state and validation for tickets and projects.
//!
//! Forms hold raw user input, validate it into per-field errors, and shape
//! it into the payloads the gateway sends. Editing a field clears that
//! field's error and nothing else.

pub mod project;
pub mod ticket;

use std::collections::BTreeMap;
use std::fmt;

pub use project::ProjectForm;
pub use ticket::TicketForm;

/// Form fields that can carry a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Subject,
    Description,
    Category,
    Project,
    Priority,
    StartDate,
    EndDate,
    Name,
    Code,
    Comment,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Subject => "subject",
            Field::Description => "description",
            Field::Category => "category",
            Field::Project => "project",
            Field::Priority => "priority",
            Field::StartDate => "start date",
            Field::EndDate => "end date",
            Field::Name => "name",
            Field::Code => "code",
            Field::Comment => "comment",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn clear(&mut self, field: Field) {
        self.0.remove(&field);
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    /// `Ok(())` when empty, otherwise a validation error.
    pub fn into_result(self) -> crate::error::Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::error::DeskError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Require a non-blank value.
pub(crate) fn require(errors: &mut FieldErrors, field: Field, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.insert(field, message);
    }
}

/// Require a present, non-blank value.
pub(crate) fn require_some(
    errors: &mut FieldErrors,
    field: Field,
    value: Option<&str>,
    message: &str,
) {
    require(errors, field, value.unwrap_or(""), message);
}
