//! Grouped document formatting.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::{
    grouping::DocumentGroups,
    models::{Document, StepCatalog},
};

/// Documents listed under their step labels.
///
/// Catalog steps with documents come first, in catalog order. Groups whose
/// key is not in the catalog follow under their raw key.
pub struct DocumentGroupsView<'a> {
    groups: &'a DocumentGroups,
    catalog: &'a StepCatalog,
}

impl<'a> DocumentGroupsView<'a> {
    pub fn new(groups: &'a DocumentGroups, catalog: &'a StepCatalog) -> Self {
        Self { groups, catalog }
    }
}

fn write_documents(f: &mut fmt::Formatter<'_>, documents: &[Document]) -> fmt::Result {
    for document in documents {
        writeln!(
            f,
            "- [{}] {} (uploaded {})",
            document.file_type,
            document.url,
            LocalDateTime(&document.uploaded_at)
        )?;
    }
    Ok(())
}

impl fmt::Display for DocumentGroupsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.groups.is_empty() {
            return writeln!(f, "No documents uploaded.");
        }

        writeln!(f, "## Documents")?;

        for step in self.catalog.steps() {
            let Some(documents) = self.groups.get(&step.key) else {
                continue;
            };
            writeln!(f)?;
            writeln!(f, "### {} ({})", step.label, documents.len())?;
            writeln!(f)?;
            write_documents(f, documents)?;
        }

        for key in self.groups.orphans(self.catalog) {
            let documents = &self.groups[key];
            writeln!(f)?;
            writeln!(f, "### {key} (unknown step, {})", documents.len())?;
            writeln!(f)?;
            write_documents(f, documents)?;
        }

        Ok(())
    }
}
