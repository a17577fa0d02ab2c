//! Partitioning evidence documents by step.

use std::ops::Index;

use crate::models::{Document, StepCatalog};

/// Documents partitioned by step key.
///
/// Groups are kept in the order their key was first seen, and documents keep
/// their input order within a group. Keys are not checked against any
/// catalog; see [`DocumentGroups::orphans`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentGroups {
    groups: Vec<(String, Vec<Document>)>,
}

impl DocumentGroups {
    /// Documents for a step key, if any were grouped under it.
    pub fn get(&self, step_key: &str) -> Option<&[Document]> {
        self.groups
            .iter()
            .find(|(key, _)| key == step_key)
            .map(|(_, docs)| docs.as_slice())
    }

    /// Step keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Document])> {
        self.groups
            .iter()
            .map(|(key, docs)| (key.as_str(), docs.as_slice()))
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of documents across all groups.
    pub fn document_count(&self) -> usize {
        self.groups.iter().map(|(_, docs)| docs.len()).sum()
    }

    /// Keys that do not name a step in `catalog`, in first-seen order.
    pub fn orphans<'a>(&'a self, catalog: &'a StepCatalog) -> impl Iterator<Item = &'a str> + 'a {
        self.keys().filter(move |key| !catalog.contains(key))
    }
}

impl Index<&str> for DocumentGroups {
    type Output = [Document];

    fn index(&self, step_key: &str) -> &Self::Output {
        self.get(step_key).unwrap_or(&[])
    }
}

impl FromIterator<Document> for DocumentGroups {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        let mut groups: Vec<(String, Vec<Document>)> = Vec::new();
        for document in iter {
            match groups.iter_mut().find(|(key, _)| *key == document.step_key) {
                Some((_, docs)) => docs.push(document),
                None => groups.push((document.step_key.clone(), vec![document])),
            }
        }
        Self { groups }
    }
}

/// Groups documents by their step key, preserving input order.
pub fn group_by_step<I>(documents: I) -> DocumentGroups
where
    I: IntoIterator<Item = Document>,
{
    documents.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;

    fn doc(id: &str, step_key: &str) -> Document {
        Document {
            id: id.to_string(),
            step_key: step_key.to_string(),
            url: format!("https://files.example.com/{id}.pdf"),
            file_type: "pdf".to_string(),
            uploaded_at: Timestamp::from_second(1_700_000_000).unwrap(),
        }
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_groups_preserve_relative_order() {
        let groups = group_by_step(vec![
            doc("doc0", "started"),
            doc("doc1", "complete"),
            doc("doc2", "started"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(ids(&groups["started"]), ["doc0", "doc2"]);
        assert_eq!(ids(&groups["complete"]), ["doc1"]);
        assert_eq!(groups.keys().collect::<Vec<_>>(), ["started", "complete"]);
        assert_eq!(groups.document_count(), 3);
    }

    #[test]
    fn test_unknown_keys_form_their_own_group() {
        let catalog = StepCatalog::standard();
        let groups = group_by_step(vec![
            doc("a", "legacy_pod"),
            doc("b", "settled"),
            doc("c", "legacy_pod"),
        ]);

        assert_eq!(ids(&groups["legacy_pod"]), ["a", "c"]);
        assert_eq!(groups.orphans(&catalog).collect::<Vec<_>>(), ["legacy_pod"]);
    }

    #[test]
    fn test_empty_input() {
        let groups = group_by_step(Vec::new());
        assert!(groups.is_empty());
        assert!(groups.get("started").is_none());
        assert!(groups["started"].is_empty());
    }
}
