//! Step list formatting.

use std::fmt;

use crate::models::{PodKey, StepCatalog};

/// The catalog with each step marked done, current or pending.
///
/// Formats as:
///
/// ```text
/// # POD: trip T-100 / client C-7
///
/// - ✓ Started
/// - ➤ Complete
/// - ○ POD Received
/// ...
///
/// Step 2 of 5
/// ```
pub struct ProgressionView<'a> {
    key: &'a PodKey,
    catalog: &'a StepCatalog,
    current: usize,
}

impl<'a> ProgressionView<'a> {
    pub fn new(key: &'a PodKey, catalog: &'a StepCatalog, current: usize) -> Self {
        Self {
            key,
            catalog,
            current,
        }
    }
}

impl fmt::Display for ProgressionView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# POD: {}", self.key)?;
        writeln!(f)?;

        for (index, step) in self.catalog.steps().iter().enumerate() {
            let state = self.catalog.state_at(index, self.current);
            writeln!(f, "- {} {}", state.icon(), step.label)?;
        }

        writeln!(f)?;
        writeln!(f, "Step {} of {}", self.current + 1, self.catalog.len())
    }
}

/// The bare catalog: keys and labels in order.
pub struct CatalogView<'a>(pub &'a StepCatalog);

impl fmt::Display for CatalogView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# POD steps")?;
        writeln!(f)?;
        for (index, step) in self.0.steps().iter().enumerate() {
            writeln!(f, "{}. {} (`{}`)", index + 1, step.label, step.key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progression_marks_states() {
        let key = PodKey::new("T1", "C1");
        let catalog = StepCatalog::standard();
        let output = ProgressionView::new(&key, &catalog, 3).to_string();

        assert!(output.starts_with("# POD: trip T1 / client C1\n"));
        assert!(output.contains("- ✓ POD Received\n"));
        assert!(output.contains("- ➤ POD Submitted\n"));
        assert!(output.contains("- ○ Settled\n"));
        assert!(output.contains("Step 4 of 5"));
    }

    #[test]
    fn test_catalog_view_lists_keys() {
        let output = CatalogView(&StepCatalog::standard()).to_string();
        assert!(output.contains("1. Started (`started`)"));
        assert!(output.contains("5. Settled (`settled`)"));
    }
}
