// 🔍 Deduplication - detect names that occur more than once
// Two views: a name → count multiset, and full groups for catalog entities
// (so a report can show which entries collided).

use crate::catalog::NamedEntity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// DUPLICATE GROUP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Display name shared by every entry
    pub name: String,

    /// Colliding entities, in catalog order
    pub entries: Vec<NamedEntity>,
}

impl DuplicateGroup {
    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

// ============================================================================
// DETECTION
// ============================================================================

/// Names appearing at least twice, with their occurrence count
pub fn count_duplicates<I, S>(names: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for name in names {
        *counts.entry(name.as_ref().to_string()).or_insert(0) += 1;
    }

    counts.retain(|_, count| *count > 1);
    counts
}

/// Group entities by their already-resolved display names, keeping only
/// groups of size > 1
///
/// `names[i]` is the name of `entities[i]`. Groups come out in order of each
/// name's first appearance.
pub fn duplicate_groups<S: AsRef<str>>(
    entities: &[NamedEntity],
    names: &[S],
) -> Vec<DuplicateGroup> {
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    let mut index_by_name: HashMap<&str, usize> = HashMap::new();

    for (name, entity) in names.iter().zip(entities) {
        let name = name.as_ref();
        match index_by_name.get(name) {
            Some(&i) => groups[i].entries.push(entity.clone()),
            None => {
                index_by_name.insert(name, groups.len());
                groups.push(DuplicateGroup {
                    name: name.to_string(),
                    entries: vec![entity.clone()],
                });
            }
        }
    }

    groups.retain(|group| group.count() > 1);
    groups
}

// ============================================================================
// TESTS
// ============================================================================
