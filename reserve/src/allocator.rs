//! Gap-filling allocation of a target identifier.
//!
//! An operator asks that the next record inserted into the store receive a
//! specific identifier `target`. The allocator consumes the identifiers
//! between the store's current maximum `M` and `target` with placeholder
//! records so the sequence ends up positioned at `target`.
//!
//! # Validation
//!
//! - `target` must be strictly greater than `M + 1`. `target == M + 1` is
//!   refused even though the next insertion would already receive it.
//! - The configured [`AllocationGuard`] must allow the request.
//!
//! # Strategies
//!
//! - [`PlacementStrategy::Hint`] writes a single placeholder with the
//!   identifier hint `target - 1`.
//! - [`PlacementStrategy::Sequential`] writes `target - M - 1` placeholders
//!   without hints.
//!
//! With a store that honors hints, both leave the sequence at `target`.
//!
//! # Placeholder lifecycle
//!
//! Placeholders are held by a [`PlaceholderLease`]: acquired by inserting
//! them, confirmed by reading the sequence back, then either released
//! (deleted) or kept as drafts depending on
//! [`AllocatorConfig::release_placeholders`]. The whole sequence, from reading
//! `M` to releasing, runs under the store's sequence lock.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{AllocatorConfig, Config, PlacementStrategy};
use crate::error::{AllocationError, AllocationResult, InvalidTargetReason, Result};
use crate::guard::{AllocationGuard, AllowAll};
use crate::inspector::SequenceInspector;
use crate::model::{RecordFields, RecordId};
use crate::report::ErrorReporter;
use crate::store::{ContentStore, SequenceLock};

/// Outcome of a successful allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// The identifier that was requested.
    pub target: RecordId,
    /// Identifier the store assigned to the first placeholder.
    pub assigned: RecordId,
    /// Number of placeholders written.
    pub placeholders: u64,
    /// Identifier the next ordinary insertion will receive, read back after
    /// the placeholders were written.
    pub next_id: RecordId,
    /// Whether the placeholders were deleted again.
    pub released: bool,
}

impl Allocation {
    /// Whether the sequence landed exactly on the target.
    pub fn is_exact(&self) -> bool {
        self.next_id == self.target
    }
}

/// Reserves the next identifier of a [`ContentStore`].
///
/// Constructed explicitly and shared by reference or `Arc`; there is no
/// process-wide instance.
pub struct GapAllocator {
    store: Arc<ContentStore>,
    guard: Arc<dyn AllocationGuard>,
    config: AllocatorConfig,
    reporter: ErrorReporter,
}

impl GapAllocator {
    pub fn new(store: Arc<ContentStore>, config: AllocatorConfig) -> Self {
        Self {
            store,
            guard: Arc::new(AllowAll),
            config,
            reporter: ErrorReporter::default(),
        }
    }

    /// Allocator with the allocator and reporting sections of `config`.
    pub fn from_config(store: Arc<ContentStore>, config: &Config) -> Self {
        Self::new(store, config.allocator.clone())
            .with_reporter(ErrorReporter::new(config.reporting.clone()))
    }

    pub fn with_guard(mut self, guard: Arc<dyn AllocationGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn store(&self) -> &Arc<ContentStore> {
        &self.store
    }

    pub fn inspector(&self) -> SequenceInspector {
        SequenceInspector::new(Arc::clone(&self.store))
    }

    /// Makes `target_id` the identifier of the next inserted record.
    ///
    /// # Errors
    ///
    /// [`AllocationError::InvalidTarget`] when validation fails; nothing is
    /// written. [`AllocationError::StoreRejected`] when the store fails; any
    /// placeholder already written by this call is deleted on a best-effort
    /// basis, but the sequence stays where the store moved it.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn allocate(&self, target_id: u64) -> AllocationResult<Allocation> {
        let result = self.try_allocate(RecordId::new(target_id)).await;
        if let Err(err) = &result {
            self.reporter.report_failure(target_id, err);
        }
        result
    }

    async fn try_allocate(&self, target: RecordId) -> AllocationResult<Allocation> {
        let sequence = self.store.lock_sequence().await;
        let current_max = SequenceInspector::current_max_locked(&sequence).await?;
        let gap = self.validate(&sequence, target, current_max).await?;
        debug!(%target, %current_max, gap, "allocation validated");

        let mut lease = PlaceholderLease::new(&sequence);
        let filled = match self.fill(&mut lease, target, gap).await {
            Ok(()) => sequence.next_id().await,
            Err(err) => Err(err),
        };
        let next_id = match filled {
            Ok(next_id) => next_id,
            Err(err) => {
                if let Err(release_err) = lease.release().await {
                    warn!(error = %release_err, "failed to release placeholders after store error");
                }
                return Err(err.into());
            }
        };
        if next_id != target {
            warn!(
                %target,
                %next_id,
                "store did not position the sequence on the target"
            );
        }

        let assigned = lease.first().unwrap_or(RecordId::NONE);
        let placeholders = lease.len();
        let released = if self.config.release_placeholders {
            match lease.release().await {
                Ok(()) => true,
                Err(err) => {
                    warn!(error = %err, "placeholders were not released");
                    false
                }
            }
        } else {
            lease.keep();
            false
        };

        info!(%target, %assigned, placeholders, %next_id, released, "identifier reserved");
        Ok(Allocation {
            target,
            assigned,
            placeholders,
            next_id,
            released,
        })
    }

    /// Checks the request and returns the gap size `target - current_max - 1`.
    async fn validate(
        &self,
        sequence: &SequenceLock<'_>,
        target: RecordId,
        current_max: RecordId,
    ) -> AllocationResult<u64> {
        if target == RecordId::NONE {
            return Err(InvalidTargetReason::NotPositive.into());
        }
        let threshold = current_max.get().saturating_add(1);
        if target.get() <= threshold {
            return Err(InvalidTargetReason::NoGap {
                target,
                current_max,
            }
            .into());
        }
        if !self.guard.may_allocate(sequence).await? {
            return Err(InvalidTargetReason::GuardRejected.into());
        }

        let gap = target.get() - threshold;
        if self.config.strategy == PlacementStrategy::Sequential
            && gap > self.config.max_sequential_gap
        {
            return Err(InvalidTargetReason::GapTooLarge {
                gap,
                limit: self.config.max_sequential_gap,
            }
            .into());
        }
        Ok(gap)
    }

    async fn fill(&self, lease: &mut PlaceholderLease<'_, '_>, target: RecordId, gap: u64) -> Result<()> {
        match self.config.strategy {
            PlacementStrategy::Hint => {
                lease.acquire(Some(target.saturating_prev())).await?;
            }
            PlacementStrategy::Sequential => {
                for _ in 0..gap {
                    lease.acquire(None).await?;
                }
            }
        }
        Ok(())
    }
}

/// Placeholders written during one allocation, pending release.
///
/// Must be consumed with [`release`](PlaceholderLease::release) or
/// [`keep`](PlaceholderLease::keep). Dropping a lease that still holds
/// placeholders (for example when the allocation future is cancelled) leaves
/// them in the store as drafts and logs a warning.
pub(crate) struct PlaceholderLease<'s, 'a> {
    sequence: &'s SequenceLock<'a>,
    ids: Vec<RecordId>,
}

impl<'s, 'a> PlaceholderLease<'s, 'a> {
    pub(crate) fn new(sequence: &'s SequenceLock<'a>) -> Self {
        Self {
            sequence,
            ids: Vec::new(),
        }
    }

    /// Inserts one placeholder and holds on to its identifier.
    pub(crate) async fn acquire(&mut self, hint: Option<RecordId>) -> Result<RecordId> {
        let id = self
            .sequence
            .insert_record(RecordFields::placeholder(), hint)
            .await?;
        self.ids.push(id);
        Ok(id)
    }

    pub(crate) fn first(&self) -> Option<RecordId> {
        self.ids.first().copied()
    }

    pub(crate) fn len(&self) -> u64 {
        self.ids.len() as u64
    }

    /// Deletes every held placeholder in one batch.
    pub(crate) async fn release(mut self) -> Result<()> {
        let ids = std::mem::take(&mut self.ids);
        if let Err(err) = self.sequence.delete_records(&ids).await {
            self.ids = ids;
            return Err(err);
        }
        debug!(count = ids.len(), "released placeholders");
        Ok(())
    }

    /// Leaves the placeholders in the store.
    pub(crate) fn keep(mut self) -> Vec<RecordId> {
        std::mem::take(&mut self.ids)
    }
}

impl Drop for PlaceholderLease<'_, '_> {
    fn drop(&mut self) {
        if !self.ids.is_empty() {
            warn!(ids = ?self.ids, "placeholder records left in the store");
        }
    }
}

#[cfg(test)]
mod tests {
    use common::storage::in_memory::InMemoryStorage;
    use rstest::rstest;

    use super::*;
    use crate::guard::{Fixed, NoRecordInStatus};
    use crate::model::RecordStatus;

    fn store() -> Arc<ContentStore> {
        Arc::new(ContentStore::with_storage(Arc::new(InMemoryStorage::new())))
    }

    async fn store_with_max(max: u64) -> Arc<ContentStore> {
        let store = store();
        for i in 0..max {
            store
                .insert_record(RecordFields::post(format!("post {}", i), "body"), None)
                .await
                .unwrap();
        }
        store
    }

    fn config(strategy: PlacementStrategy, release_placeholders: bool) -> AllocatorConfig {
        AllocatorConfig {
            strategy,
            release_placeholders,
            ..AllocatorConfig::default()
        }
    }

    async fn ids(store: &ContentStore) -> Vec<RecordId> {
        store
            .records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect()
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(9)]
    #[case(10)]
    #[case(11)]
    #[tokio::test]
    async fn should_refuse_target_without_gap(#[case] target: u64) {
        // given
        let store = store_with_max(10).await;
        let allocator = GapAllocator::new(Arc::clone(&store), AllocatorConfig::default());
        let before = ids(&store).await;

        // when
        let result = allocator.allocate(target).await;

        // then
        assert!(matches!(result, Err(AllocationError::InvalidTarget(_))));
        assert_eq!(ids(&store).await, before);
        assert_eq!(store.max_identifier().await.unwrap(), RecordId::new(10));
    }

    #[tokio::test]
    async fn should_report_zero_target_as_not_positive() {
        let allocator = GapAllocator::new(store(), AllocatorConfig::default());

        let result = allocator.allocate(0).await;

        assert_eq!(
            result,
            Err(AllocationError::InvalidTarget(InvalidTargetReason::NotPositive))
        );
    }

    #[tokio::test]
    async fn should_report_boundary_target_as_no_gap() {
        // given
        let allocator = GapAllocator::new(store_with_max(10).await, AllocatorConfig::default());

        // when
        let result = allocator.allocate(11).await;

        // then
        assert_eq!(
            result,
            Err(AllocationError::InvalidTarget(InvalidTargetReason::NoGap {
                target: RecordId::new(11),
                current_max: RecordId::new(10),
            }))
        );
    }

    #[tokio::test]
    async fn should_allocate_into_empty_store_as_draft() {
        // given
        let store = store();
        let allocator = GapAllocator::new(
            Arc::clone(&store),
            config(PlacementStrategy::Hint, false),
        );

        // when
        let allocation = allocator.allocate(5).await.unwrap();

        // then
        assert!(allocation.assigned >= RecordId::FIRST);
        assert!(allocation.assigned <= RecordId::new(5));
        let placeholder = store.get_record(allocation.assigned).await.unwrap().unwrap();
        assert_eq!(placeholder.fields.status, RecordStatus::Draft);
        assert!(placeholder.fields.is_placeholder());
        assert!(store.published().await.unwrap().is_empty());
    }

    #[rstest]
    #[case(PlacementStrategy::Hint, true)]
    #[case(PlacementStrategy::Hint, false)]
    #[case(PlacementStrategy::Sequential, true)]
    #[case(PlacementStrategy::Sequential, false)]
    #[tokio::test]
    async fn should_give_next_insert_the_target(
        #[case] strategy: PlacementStrategy,
        #[case] release: bool,
    ) {
        // given
        let store = store_with_max(10).await;
        let allocator = GapAllocator::new(Arc::clone(&store), config(strategy, release));

        // when
        let allocation = allocator.allocate(15).await.unwrap();
        let next = store
            .insert_record(RecordFields::post("real", "content"), None)
            .await
            .unwrap();

        // then
        assert!(allocation.is_exact());
        assert_eq!(allocation.released, release);
        assert_eq!(next, RecordId::new(15));
    }

    #[tokio::test]
    async fn should_write_single_hinted_placeholder() {
        // given
        let store = store_with_max(10).await;
        let allocator = GapAllocator::new(
            Arc::clone(&store),
            config(PlacementStrategy::Hint, false),
        );

        // when
        let allocation = allocator.allocate(15).await.unwrap();

        // then
        assert_eq!(allocation.placeholders, 1);
        assert_eq!(allocation.assigned, RecordId::new(14));
        assert_eq!(store.records().await.unwrap().len(), 11);
    }

    #[tokio::test]
    async fn should_write_one_placeholder_per_missing_id() {
        // given
        let store = store_with_max(10).await;
        let allocator = GapAllocator::new(
            Arc::clone(&store),
            config(PlacementStrategy::Sequential, false),
        );

        // when
        let allocation = allocator.allocate(15).await.unwrap();

        // then
        assert_eq!(allocation.placeholders, 4);
        assert_eq!(allocation.assigned, RecordId::new(11));
        let drafts: Vec<_> = store
            .records()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.fields.is_placeholder())
            .map(|r| r.id.get())
            .collect();
        assert_eq!(drafts, vec![11, 12, 13, 14]);
    }

    #[tokio::test]
    async fn should_remove_placeholders_when_released() {
        // given
        let store = store_with_max(10).await;
        let allocator = GapAllocator::new(Arc::clone(&store), AllocatorConfig::default());
        let before = ids(&store).await;

        // when
        let allocation = allocator.allocate(15).await.unwrap();

        // then
        assert!(allocation.released);
        assert_eq!(ids(&store).await, before);
        assert_eq!(store.max_identifier().await.unwrap(), RecordId::new(14));
    }

    #[tokio::test]
    async fn should_refuse_repeated_target() {
        // given
        let allocator = GapAllocator::new(store_with_max(10).await, AllocatorConfig::default());
        allocator.allocate(20).await.unwrap();

        // when
        let second = allocator.allocate(20).await;

        // then
        assert!(matches!(second, Err(AllocationError::InvalidTarget(_))));
    }

    #[tokio::test]
    async fn should_refuse_when_guard_vetoes() {
        // given
        let store = store_with_max(10).await;
        let allocator = GapAllocator::new(Arc::clone(&store), AllocatorConfig::default())
            .with_guard(Arc::new(Fixed(false)));

        // when
        let result = allocator.allocate(20).await;

        // then
        assert_eq!(
            result,
            Err(AllocationError::InvalidTarget(
                InvalidTargetReason::GuardRejected
            ))
        );
        assert_eq!(store.max_identifier().await.unwrap(), RecordId::new(10));
    }

    #[tokio::test]
    async fn should_refuse_while_record_in_disallowed_status() {
        // given
        let store = store_with_max(9).await;
        store
            .insert_record(
                RecordFields::post("queued", "body").with_status(RecordStatus::Pending),
                None,
            )
            .await
            .unwrap();
        let allocator = GapAllocator::new(Arc::clone(&store), AllocatorConfig::default())
            .with_guard(Arc::new(NoRecordInStatus(RecordStatus::Pending)));

        // when
        let result = allocator.allocate(20).await;

        // then
        assert!(matches!(
            result,
            Err(AllocationError::InvalidTarget(
                InvalidTargetReason::GuardRejected
            ))
        ));
    }

    #[tokio::test]
    async fn should_refuse_gap_beyond_sequential_limit() {
        // given
        let allocator = GapAllocator::new(
            store(),
            AllocatorConfig {
                strategy: PlacementStrategy::Sequential,
                release_placeholders: true,
                max_sequential_gap: 3,
            },
        );

        // when
        let result = allocator.allocate(6).await;

        // then
        assert_eq!(
            result,
            Err(AllocationError::InvalidTarget(
                InvalidTargetReason::GapTooLarge { gap: 4, limit: 3 }
            ))
        );
    }

    #[tokio::test]
    async fn should_keep_hint_strategy_unbounded_by_sequential_limit() {
        let allocator = GapAllocator::new(
            store(),
            AllocatorConfig {
                strategy: PlacementStrategy::Hint,
                release_placeholders: true,
                max_sequential_gap: 3,
            },
        );

        let allocation = allocator.allocate(1_000_000).await.unwrap();

        assert_eq!(allocation.next_id, RecordId::new(1_000_000));
    }

    #[tokio::test]
    async fn should_take_strategy_and_reporting_from_config() {
        // given
        let config = Config::from_toml_str(
            "[allocator]\nstrategy = \"sequential\"\nrelease_placeholders = false\n\n[reporting]\nsite_url = \"https://blog.example\"\n",
        )
        .unwrap();
        let allocator = GapAllocator::from_config(store_with_max(10).await, &config);

        // when
        let allocation = allocator.allocate(15).await.unwrap();

        // then
        assert_eq!(allocation.placeholders, 4);
        assert!(!allocation.released);
        assert_eq!(
            allocator.reporter.prefix(),
            "(reserve | https://blog.example) => "
        );
    }
}
