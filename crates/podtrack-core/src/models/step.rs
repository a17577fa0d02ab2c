//! Step catalog and persisted-status resolution.

use std::collections::HashSet;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{PodError, Result};

/// One labeled stage in the POD lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    /// Stable identifier persisted as the record's status
    pub key: String,

    /// Human readable label
    pub label: String,
}

impl Step {
    /// Creates a step from a key and a label.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// How an unrecognized persisted status is handled when a tracker loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Fail with [`PodError::UnknownStatus`]
    #[default]
    Strict,

    /// Fall back to the first step and log a warning
    Lenient,
}

/// Where a step sits relative to the current index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    /// Before the current step
    Done,

    /// The current step
    Current,

    /// After the current step
    Pending,
}

impl StepState {
    /// Icon used when listing steps.
    pub fn icon(&self) -> &'static str {
        match self {
            StepState::Done => "✓",
            StepState::Current => "➤",
            StepState::Pending => "○",
        }
    }
}

/// Ordered, non-empty list of steps with unique keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCatalog {
    steps: Vec<Step>,
}

impl StepCatalog {
    /// Builds a catalog, rejecting empty lists and duplicate keys.
    pub fn new(steps: Vec<Step>) -> Result<Self> {
        if steps.is_empty() {
            return Err(PodError::invalid_input("steps").with_reason("Catalog cannot be empty"));
        }

        let mut seen = HashSet::new();
        for step in &steps {
            if step.key.trim().is_empty() {
                return Err(PodError::invalid_input("steps").with_reason("Step key cannot be empty"));
            }
            if !seen.insert(step.key.as_str()) {
                return Err(PodError::invalid_input("steps")
                    .with_reason(format!("Duplicate step key '{}'", step.key)));
            }
        }

        Ok(Self { steps })
    }

    /// The canonical delivery lifecycle:
    /// `started → complete → pod_received → pod_submitted → settled`.
    pub fn standard() -> Self {
        Self {
            steps: vec![
                Step::new("started", "Started"),
                Step::new("complete", "Complete"),
                Step::new("pod_received", "POD Received"),
                Step::new("pod_submitted", "POD Submitted"),
                Step::new("settled", "Settled"),
            ],
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a catalog built through [`StepCatalog::new`].
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// Index of the last step.
    pub fn terminal_index(&self) -> usize {
        self.steps.len() - 1
    }

    /// Position of the step with the given key.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Label for a key, if the key is in the catalog.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.steps
            .iter()
            .find(|step| step.key == key)
            .map(|step| step.label.as_str())
    }

    /// Resolves a persisted status to an index under the given policy.
    ///
    /// An absent status always resolves to the first step. An unrecognized
    /// one fails under [`StatusPolicy::Strict`].
    pub fn resolve(&self, status: Option<&str>, policy: StatusPolicy) -> Result<usize> {
        let index = initialize(self, status);

        match status {
            Some(status) if !self.contains(status) => match policy {
                StatusPolicy::Strict => Err(PodError::UnknownStatus {
                    status: status.to_string(),
                }),
                StatusPolicy::Lenient => {
                    warn!("Unrecognized POD status '{status}', showing first step");
                    Ok(index)
                }
            },
            _ => Ok(index),
        }
    }

    /// State of the step at `index` when the tracker sits at `current`.
    pub fn state_at(&self, index: usize, current: usize) -> StepState {
        match index.cmp(&current) {
            std::cmp::Ordering::Less => StepState::Done,
            std::cmp::Ordering::Equal => StepState::Current,
            std::cmp::Ordering::Greater => StepState::Pending,
        }
    }
}

impl Default for StepCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Index of the first step whose key equals `persisted_status`, or `0` when
/// the status is absent or unrecognized.
///
/// ```rust
/// use podtrack_core::models::{initialize, StepCatalog};
///
/// let catalog = StepCatalog::standard();
/// assert_eq!(initialize(&catalog, Some("pod_received")), 2);
/// assert_eq!(initialize(&catalog, Some("lost_in_transit")), 0);
/// assert_eq!(initialize(&catalog, None), 0);
/// ```
pub fn initialize(catalog: &StepCatalog, persisted_status: Option<&str>) -> usize {
    persisted_status
        .and_then(|status| catalog.position(status))
        .unwrap_or(0)
}
