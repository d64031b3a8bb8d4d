use thiserror::Error;

use crate::model::ids::ModuleId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModuleError {
    #[error("module title cannot be empty")]
    EmptyTitle,
}

/// Top level of the course hierarchy. Lessons hang off a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    id: ModuleId,
    title: String,
    description: String,
    order_index: i32,
}

impl Module {
    /// Creates a module after validating its title.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::EmptyTitle` if the title is blank.
    pub fn new(
        id: ModuleId,
        title: impl Into<String>,
        description: impl Into<String>,
        order_index: i32,
    ) -> Result<Self, ModuleError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(ModuleError::EmptyTitle);
        }
        Ok(Self {
            id,
            title,
            description: description.into(),
            order_index,
        })
    }

    #[must_use]
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

/// Authoring input for a module, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDraft {
    pub title: String,
    pub description: String,
    pub order_index: i32,
}

impl ModuleDraft {
    /// # Errors
    ///
    /// Returns `ModuleError` when the draft is not a valid module.
    pub fn into_module(self, id: ModuleId) -> Result<Module, ModuleError> {
        Module::new(id, self.title, self.description, self.order_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_requires_title() {
        let err = Module::new(ModuleId::new("m1"), "   ", "desc", 0).unwrap_err();
        assert_eq!(err, ModuleError::EmptyTitle);
    }

    #[test]
    fn draft_assigns_id_and_trims_title() {
        let draft = ModuleDraft {
            title: "  Foundation ".into(),
            description: "Manual testing basics".into(),
            order_index: 1,
        };
        let module = draft.into_module(ModuleId::new("m1")).unwrap();
        assert_eq!(module.id(), &ModuleId::new("m1"));
        assert_eq!(module.title(), "Foundation");
        assert_eq!(module.order_index(), 1);
    }
}
