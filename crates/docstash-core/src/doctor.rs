//! Index consistency checks.
//!
//! Looks only at the keys each pointer names; un-indexed `image_*` and
//! `response_*` keys are never enumerated or touched.

use std::collections::HashSet;

use anyhow::Result;
use serde::Serialize;

use crate::index::ReferenceIndex;
use crate::models::DocumentRecord;
use crate::records::RecordStore;

/// A pointer whose record is missing exactly one of its two keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialRecord {
    pub pointer: DocumentRecord,
    pub missing_image: bool,
    pub missing_response: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DoctorReport {
    /// Pointers examined.
    pub checked: usize,
    /// Pointers with neither record key present.
    pub dangling: Vec<DocumentRecord>,
    /// Pointers with one record key present.
    pub partial: Vec<PartialRecord>,
    /// Repeated pointers after their first occurrence.
    pub duplicates: Vec<DocumentRecord>,
    /// Pointers dropped by a repair; zero for a plain diagnosis.
    pub removed: usize,
}

impl DoctorReport {
    pub fn is_healthy(&self) -> bool {
        self.dangling.is_empty() && self.partial.is_empty() && self.duplicates.is_empty()
    }
}

pub async fn diagnose(index: &ReferenceIndex, records: &RecordStore) -> DoctorReport {
    let pointers = index.load().await;
    let mut report = DoctorReport {
        checked: pointers.len(),
        ..DoctorReport::default()
    };

    let mut seen = HashSet::new();
    for pointer in pointers {
        if !seen.insert(pointer.clone()) {
            report.duplicates.push(pointer);
            continue;
        }
        let stored = records.get(&pointer).await;
        if stored.is_empty() {
            report.dangling.push(pointer);
        } else if !stored.is_complete() {
            report.partial.push(PartialRecord {
                missing_image: stored.image_uri.is_none(),
                missing_response: stored.response.is_none(),
                pointer,
            });
        }
    }

    tracing::debug!(
        checked = report.checked,
        dangling = report.dangling.len(),
        partial = report.partial.len(),
        duplicates = report.duplicates.len(),
        "index diagnosis complete"
    );
    report
}

/// Drop dangling pointers and repeated pointers, keeping the first of each.
///
/// Partial records stay indexed since they still render.
pub async fn repair(index: &ReferenceIndex, records: &RecordStore) -> Result<DoctorReport> {
    let mut report = diagnose(index, records).await;
    if report.dangling.is_empty() && report.duplicates.is_empty() {
        return Ok(report);
    }

    let dangling: HashSet<DocumentRecord> = report.dangling.iter().cloned().collect();
    let mut kept = HashSet::new();
    report.removed = index
        .retain(|pointer| !dangling.contains(pointer) && kept.insert(pointer.clone()))
        .await?;

    tracing::info!(removed = report.removed, "repaired document index");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SAVED_REFERENCES_KEY;
    use crate::kv::memory::MemoryStore;
    use crate::models::DocumentId;
    use std::sync::Arc;

    fn setup() -> (Arc<MemoryStore>, ReferenceIndex, RecordStore) {
        let store = Arc::new(MemoryStore::new());
        let index = ReferenceIndex::new(store.clone());
        let records = RecordStore::new(store.clone());
        (store, index, records)
    }

    async fn save(index: &ReferenceIndex, records: &RecordStore, id: &str) -> DocumentRecord {
        let id = DocumentId::new(id);
        records.put(&id, "file:///a.jpg", "text").await.unwrap();
        let pointer = DocumentRecord::for_id(&id);
        index.append(pointer.clone()).await.unwrap();
        pointer
    }

    #[tokio::test]
    async fn test_healthy_index() {
        let (_store, index, records) = setup();
        save(&index, &records, "1").await;
        save(&index, &records, "2").await;

        let report = diagnose(&index, &records).await;
        assert_eq!(report.checked, 2);
        assert!(report.is_healthy());
    }

    #[tokio::test]
    async fn test_detects_each_problem() {
        let (store, index, records) = setup();
        let dangling = save(&index, &records, "1").await;
        let partial = save(&index, &records, "2").await;
        let dup = save(&index, &records, "3").await;
        index.append(dup.clone()).await.unwrap();

        store.remove_raw(&dangling.image_key);
        store.remove_raw(&dangling.response_key);
        store.remove_raw(&partial.response_key);

        let report = diagnose(&index, &records).await;
        assert_eq!(report.checked, 4);
        assert_eq!(report.dangling, vec![dangling]);
        assert_eq!(
            report.partial,
            vec![PartialRecord {
                pointer: partial,
                missing_image: false,
                missing_response: true,
            }]
        );
        assert_eq!(report.duplicates, vec![dup]);
    }

    #[tokio::test]
    async fn test_repair_keeps_partial_and_first_duplicate() {
        let (store, index, records) = setup();
        let dangling = save(&index, &records, "1").await;
        let partial = save(&index, &records, "2").await;
        let dup = save(&index, &records, "3").await;
        index.append(dup.clone()).await.unwrap();

        store.remove_raw(&dangling.image_key);
        store.remove_raw(&dangling.response_key);
        store.remove_raw(&partial.image_key);

        let report = repair(&index, &records).await.unwrap();
        assert_eq!(report.removed, 2);
        assert_eq!(index.load().await, vec![partial, dup]);
    }

    #[tokio::test]
    async fn test_repair_healthy_index_writes_nothing() {
        let (store, index, records) = setup();
        save(&index, &records, "1").await;
        store.fail_writes_matching(SAVED_REFERENCES_KEY);

        let report = repair(&index, &records).await.unwrap();
        assert_eq!(report.removed, 0);
    }

    #[tokio::test]
    async fn test_never_touches_unindexed_keys() {
        let (store, index, records) = setup();
        store.insert_raw("image_99", "file:///stray.jpg");
        store.insert_raw("response_99", "\"stray\"");

        let report = repair(&index, &records).await.unwrap();
        assert_eq!(report.checked, 0);
        assert!(store.contains_key("image_99"));
        assert!(store.contains_key("response_99"));
    }
}
