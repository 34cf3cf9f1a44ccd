//! In-process record store.

use crate::model::hash::DocumentHash;
use crate::model::identity::Identity;
use crate::model::record::{Record, Timestamp};
use crate::repo::record_store::{plan_append, plan_close, RecordStore, StoreResult};
use std::collections::BTreeMap;

/// Arena-style `DocumentHash -> Record` map.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: BTreeMap<DocumentHash, Record>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, hash: &DocumentHash) -> StoreResult<Option<Record>> {
        Ok(self.records.get(hash).cloned())
    }

    fn append(&mut self, hash: DocumentHash, record: Record) -> StoreResult<Option<Record>> {
        let predecessor = record
            .past_document_hash
            .non_zero()
            .and_then(|past| self.records.get(&past));
        let plan = plan_append(hash, record, self.records.get(&hash), predecessor)?;

        // Plan is fully validated; nothing below can fail.
        self.records.insert(plan.hash, plan.record);
        Ok(plan.predecessor.map(|(past, linked)| {
            self.records.insert(past, linked.clone());
            linked
        }))
    }

    fn close(
        &mut self,
        hash: DocumentHash,
        updater: Identity,
        now: Timestamp,
    ) -> StoreResult<Record> {
        let closed = plan_close(hash, self.records.get(&hash), updater, now)?;
        self.records.insert(hash, closed.clone());
        Ok(closed)
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryRecordStore;
    use crate::model::hash::DocumentHash;
    use crate::model::identity::Identity;
    use crate::model::record::{NewRecord, Record};
    use crate::repo::record_store::{RecordStore, StoreError};

    fn hash(byte: u8) -> DocumentHash {
        DocumentHash::from_bytes([byte; 32])
    }

    #[test]
    fn failed_append_leaves_store_untouched() {
        let creator = Identity::generate();
        let mut store = MemoryRecordStore::new();
        let first = Record::created(creator, &NewRecord::new(hash(1), "a", "b"), 10);
        store.append(hash(1), first.clone()).expect("first append");

        let dangling = Record::created(
            creator,
            &NewRecord::new(hash(2), "a", "b").superseding(hash(7)),
            20,
        );
        let err = store.append(hash(2), dangling).expect_err("dangling");
        assert!(matches!(err, StoreError::DanglingLink(_)));
        assert_eq!(store.len().expect("len"), 1);
        assert_eq!(store.get(&hash(1)).expect("get"), Some(first));
        assert_eq!(store.get(&hash(2)).expect("get"), None);
    }

    #[test]
    fn append_returns_linked_predecessor() {
        let creator = Identity::generate();
        let mut store = MemoryRecordStore::new();
        store
            .append(
                hash(1),
                Record::created(creator, &NewRecord::new(hash(1), "a", "b"), 10),
            )
            .expect("first");
        let linked = store
            .append(
                hash(2),
                Record::created(
                    creator,
                    &NewRecord::new(hash(2), "a", "b").superseding(hash(1)),
                    11,
                ),
            )
            .expect("second")
            .expect("predecessor");
        assert_eq!(linked.next_document_hash, hash(2));
        assert_eq!(store.get(&hash(1)).expect("get"), Some(linked));
    }
}
