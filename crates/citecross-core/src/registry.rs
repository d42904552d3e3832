use std::collections::BTreeMap;

use crate::Subject;

/// Subjects keyed by canonical name, iterated in name order.
#[derive(Debug, Clone, Default)]
pub struct SubjectRegistry {
    subjects: BTreeMap<String, Subject>,
}

impl SubjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subject, replacing any earlier one with the same canonical name.
    /// Returns the replaced subject.
    pub fn register(&mut self, subject: Subject) -> Option<Subject> {
        let replaced = self
            .subjects
            .insert(subject.canonical_name.clone(), subject);
        if let Some(ref old) = replaced {
            tracing::warn!(
                subject = %old.canonical_name,
                "duplicate subject name, keeping the last document's variants"
            );
        }
        replaced
    }

    pub fn get(&self, canonical_name: &str) -> Option<&Subject> {
        self.subjects.get(canonical_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Subject> {
        self.subjects.values_mut()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Sum of `total_matches` over all subjects.
    pub fn total_matches(&self) -> usize {
        self.subjects.values().map(|s| s.total_matches).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(name: &str, variant: &str) -> Subject {
        Subject::new(name, vec![variant.to_string()]).unwrap()
    }

    #[test]
    fn iterates_in_name_order() {
        let mut registry = SubjectRegistry::new();
        registry.register(subject("Paulo Reis", "REIS, P."));
        registry.register(subject("Ana Costa", "COSTA, A."));

        let names: Vec<_> = registry.iter().map(|s| s.canonical_name.as_str()).collect();
        assert_eq!(names, vec!["Ana Costa", "Paulo Reis"]);
    }

    #[test]
    fn duplicate_name_replaces_earlier_entry() {
        let mut registry = SubjectRegistry::new();
        assert!(registry.register(subject("Ana Costa", "COSTA, A.")).is_none());
        let old = registry.register(subject("Ana Costa", "A. Costa")).unwrap();

        assert!(old.citation_variants().contains("COSTA, A."));
        assert_eq!(registry.len(), 1);
        assert!(
            registry
                .get("Ana Costa")
                .unwrap()
                .citation_variants()
                .contains("A. Costa")
        );
    }

    #[test]
    fn total_matches_sums_subjects() {
        let mut registry = SubjectRegistry::new();
        registry.register(subject("Ana Costa", "COSTA, A."));
        registry.register(subject("Paulo Reis", "REIS, P."));
        for s in registry.iter_mut() {
            s.total_matches += 2;
        }
        assert_eq!(registry.total_matches(), 4);
        assert!(!registry.is_empty());
    }
}
