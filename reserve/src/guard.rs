//! Hooks that can veto an allocation before anything is written.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::RecordStatus;
use crate::store::SequenceLock;

/// Decides whether an allocation may proceed.
///
/// Evaluated after the numeric gap check, while the allocator holds the
/// sequence lock. Returning `Ok(false)` fails the request with
/// [`InvalidTargetReason::GuardRejected`](crate::InvalidTargetReason::GuardRejected);
/// returning an error fails it as a store rejection.
#[async_trait]
pub trait AllocationGuard: Send + Sync {
    async fn may_allocate(&self, sequence: &SequenceLock<'_>) -> Result<bool>;
}

/// Never vetoes. The default guard.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl AllocationGuard for AllowAll {
    async fn may_allocate(&self, _sequence: &SequenceLock<'_>) -> Result<bool> {
        Ok(true)
    }
}

/// Refuses to allocate while any record is in the given status.
#[derive(Debug, Clone, Copy)]
pub struct NoRecordInStatus(pub RecordStatus);

#[async_trait]
impl AllocationGuard for NoRecordInStatus {
    async fn may_allocate(&self, sequence: &SequenceLock<'_>) -> Result<bool> {
        Ok(sequence.count_with_status(self.0).await? == 0)
    }
}

/// A constant answer, for hosts that evaluate their condition elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct Fixed(pub bool);

#[async_trait]
impl AllocationGuard for Fixed {
    async fn may_allocate(&self, _sequence: &SequenceLock<'_>) -> Result<bool> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::storage::in_memory::InMemoryStorage;

    use super::*;
    use crate::model::RecordFields;
    use crate::store::ContentStore;

    fn store() -> ContentStore {
        ContentStore::with_storage(Arc::new(InMemoryStorage::new()))
    }

    #[tokio::test]
    async fn should_allow_when_no_record_has_status() {
        // given
        let store = store();
        store
            .insert_record(RecordFields::post("p", "b"), None)
            .await
            .unwrap();
        let guard = NoRecordInStatus(RecordStatus::Pending);

        // when
        let lock = store.lock_sequence().await;
        let allowed = guard.may_allocate(&lock).await.unwrap();

        // then
        assert!(allowed);
    }

    #[tokio::test]
    async fn should_refuse_when_record_has_status() {
        // given
        let store = store();
        store
            .insert_record(
                RecordFields::post("p", "b").with_status(RecordStatus::Pending),
                None,
            )
            .await
            .unwrap();
        let guard = NoRecordInStatus(RecordStatus::Pending);

        // when
        let lock = store.lock_sequence().await;
        let allowed = guard.may_allocate(&lock).await.unwrap();

        // then
        assert!(!allowed);
    }

    #[tokio::test]
    async fn should_answer_constant_for_fixed_guard() {
        let store = store();
        let lock = store.lock_sequence().await;

        assert!(Fixed(true).may_allocate(&lock).await.unwrap());
        assert!(!Fixed(false).may_allocate(&lock).await.unwrap());
        assert!(AllowAll.may_allocate(&lock).await.unwrap());
    }
}
