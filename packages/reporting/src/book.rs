//! Session owner of the visible report set.
//!
//! [`ReportBook`] is the only thing that mutates the device's reports and
//! submission meta. Each operation runs the pure guard/lifecycle transforms,
//! then persists the result through its [`LocalStore`] and, best effort,
//! its [`RemoteFeed`].

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, Utc};
use firemap_report_models::{Report, ReportId, SubmissionMeta};
use thiserror::Error;

use crate::authority::BypassGrant;
use crate::feed::{FeedRecord, RemoteFeed};
use crate::guard::{Decision, Rejection, SubmissionGuard, local_day, record_submission};
use crate::lifecycle::{ReportFields, ReportLifecycle, ReportPatch};
use crate::store::{LocalStore, StoreError};
use crate::{ReportingPolicy, ValidationError};

/// Errors from [`ReportBook`] operations.
#[derive(Debug, Error)]
pub enum BookError {
    /// The submitted or edited fields were malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The local store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No visible report has this id.
    #[error("Report {0} not found")]
    NotFound(ReportId),
}

/// Outcome of [`ReportBook::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The report was created and persisted.
    Created(Report),
    /// The guard turned the submission away.
    Rejected(Rejection),
}

/// Where the device stands against the guard right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    /// Successful submissions today.
    pub used: u32,
    /// Submissions allowed per day.
    pub limit: u32,
    /// Minutes left on the cooldown, if it is still running.
    pub cooldown_remaining_minutes: Option<i64>,
}

/// Result of merging a feed snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Reports newly shown from the feed.
    pub added: usize,
    /// Reports removed because they expired.
    pub removed: Vec<ReportId>,
}

/// The device's visible reports and submission history for one session.
pub struct ReportBook<S: LocalStore, F: RemoteFeed> {
    guard: SubmissionGuard,
    lifecycle: ReportLifecycle,
    store: S,
    feed: F,
    offset: FixedOffset,
    reports: Vec<Report>,
    meta: SubmissionMeta,
}

impl<S: LocalStore, F: RemoteFeed> ReportBook<S, F> {
    /// Loads reports and meta from `store`.
    ///
    /// `offset` is the device's UTC offset, used to decide which calendar day
    /// the daily quota belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn open(
        policy: ReportingPolicy,
        store: S,
        feed: F,
        offset: FixedOffset,
        now: DateTime<Utc>,
    ) -> Result<Self, BookError> {
        let reports = store.load_reports()?;
        let today = local_day(now, offset);
        let meta = store
            .load_meta()?
            .map_or_else(|| SubmissionMeta::fresh(today), |meta| meta.rolled_to(today));

        log::debug!(
            "Opened report book with {} report(s), {} submission(s) on {}",
            reports.len(),
            meta.count,
            meta.date_key
        );

        Ok(Self {
            guard: SubmissionGuard::new(policy),
            lifecycle: ReportLifecycle::new(policy),
            store,
            feed,
            offset,
            reports,
            meta,
        })
    }

    /// The reports currently known, including any not yet pruned.
    #[must_use]
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// The lifecycle rules this book applies.
    #[must_use]
    pub const fn lifecycle(&self) -> &ReportLifecycle {
        &self.lifecycle
    }

    /// The local store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The remote feed.
    #[must_use]
    pub const fn feed(&self) -> &F {
        &self.feed
    }

    /// The submission meta as seen at `now`.
    #[must_use]
    pub fn meta(&self, now: DateTime<Utc>) -> SubmissionMeta {
        self.meta.clone().rolled_to(local_day(now, self.offset))
    }

    /// Quota and cooldown state at `now`.
    #[must_use]
    pub fn quota_status(&self, now: DateTime<Utc>) -> QuotaStatus {
        let meta = self.meta(now);
        QuotaStatus {
            used: meta.count,
            limit: self.guard.policy().daily_limit,
            cooldown_remaining_minutes: self.guard.cooldown_remaining_minutes(&meta, now),
        }
    }

    /// Removes expired reports and persists the result if anything changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn prune(&mut self, now: DateTime<Utc>) -> Result<Vec<ReportId>, BookError> {
        let pruned = self
            .lifecycle
            .prune(std::mem::take(&mut self.reports), now);
        self.reports = pruned.survivors;

        if !pruned.removed.is_empty() {
            self.store.save_reports(&self.reports)?;
        }

        Ok(pruned.removed)
    }

    /// Validates, gates and, if approved, creates and persists a report.
    ///
    /// Expired reports are pruned first so they never count as duplicates.
    /// On success the meta is advanced and the report is offered to the feed;
    /// a feed failure is logged and otherwise ignored. A store failure leaves
    /// the book unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the fields are malformed or the store fails.
    pub fn submit(
        &mut self,
        fields: ReportFields,
        now: DateTime<Utc>,
        bypass: Option<&BypassGrant>,
    ) -> Result<Submission, BookError> {
        let location = self.lifecycle.check(&fields)?;
        self.prune(now)?;

        let meta = self.meta(now);
        if let Decision::Rejected(rejection) =
            self.guard
                .evaluate(location, &self.reports, &meta, now, bypass)
        {
            log::info!("Submission rejected: {}", rejection.message);
            return Ok(Submission::Rejected(rejection));
        }

        let report = self.lifecycle.create(fields, now)?;
        let next_meta = record_submission(meta, now);
        let mut next_reports = self.reports.clone();
        next_reports.push(report.clone());

        // Meta is written first; a failed report write restores the old meta.
        self.store.save_meta(&next_meta)?;
        if let Err(e) = self.store.save_reports(&next_reports) {
            if let Err(rollback) = self.store.save_meta(&self.meta) {
                log::error!("Failed to roll back submission meta: {rollback}");
            }
            return Err(e.into());
        }

        self.reports = next_reports;
        self.meta = next_meta;

        log::info!(
            "Submitted {} report {} ({}/{} today)",
            report.report_type,
            report.id,
            self.meta.count,
            self.guard.policy().daily_limit
        );

        let record = FeedRecord::for_report(report.clone(), self.guard.policy().active_ttl);
        if let Err(e) = self.feed.publish(&record, now) {
            log::warn!("Failed to publish report {} to feed: {e}", report.id);
        }

        Ok(Submission::Created(report))
    }

    /// Applies `patch` to the visible report `id`.
    ///
    /// Expired reports are pruned first, so an expired report cannot be
    /// edited back to life.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::NotFound`] if no visible report has `id`, or an
    /// error if the patch is malformed or the store fails.
    pub fn edit(
        &mut self,
        id: &ReportId,
        patch: ReportPatch,
        now: DateTime<Utc>,
    ) -> Result<Report, BookError> {
        self.prune(now)?;

        let index = self
            .reports
            .iter()
            .position(|report| &report.id == id)
            .ok_or_else(|| BookError::NotFound(id.clone()))?;

        let updated = self.lifecycle.update(&self.reports[index], patch, now)?;
        self.reports[index] = updated.clone();
        self.store.save_reports(&self.reports)?;

        Ok(updated)
    }

    /// Merges a full feed snapshot into the visible set.
    ///
    /// Records past their expiry hint remove any local copy. Public records
    /// not known locally are added unless the local lifecycle already
    /// considers them expired. Local copies of known
    /// reports win over the feed. The merged set is then pruned.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn apply_feed_snapshot(
        &mut self,
        records: Vec<FeedRecord>,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome, BookError> {
        let (expired, live): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|record| record.is_expired(now));

        let expired_ids: BTreeSet<ReportId> =
            expired.into_iter().map(|record| record.report.id).collect();

        let mut removed = Vec::new();
        self.reports.retain(|report| {
            if expired_ids.contains(&report.id) {
                removed.push(report.id.clone());
                false
            } else {
                true
            }
        });

        let mut known: BTreeSet<ReportId> =
            self.reports.iter().map(|report| report.id.clone()).collect();
        let mut added = 0;
        for record in live {
            if !record.is_public()
                || known.contains(&record.report.id)
                || self.lifecycle.is_expired(&record.report, now)
            {
                continue;
            }
            known.insert(record.report.id.clone());
            self.reports.push(record.report);
            added += 1;
        }

        let pruned = self
            .lifecycle
            .prune(std::mem::take(&mut self.reports), now);
        self.reports = pruned.survivors;
        removed.extend(pruned.removed);

        if added > 0 || !removed.is_empty() {
            self.store.save_reports(&self.reports)?;
        }

        log::debug!(
            "Merged feed snapshot: {added} added, {} removed",
            removed.len()
        );

        Ok(SyncOutcome { added, removed })
    }

    /// Pulls a snapshot from the feed and merges it.
    ///
    /// An unreachable feed is logged and leaves the local set as it is.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn sync(&mut self, now: DateTime<Utc>) -> Result<SyncOutcome, BookError> {
        match self.feed.snapshot(now) {
            Ok(records) => self.apply_feed_snapshot(records, now),
            Err(e) => {
                log::warn!("Feed snapshot unavailable, keeping local reports: {e}");
                Ok(SyncOutcome {
                    added: 0,
                    removed: self.prune(now)?,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeDelta;
    use firemap_report_models::ModerationStatus;

    use crate::authority::{OperatorAuthority, token_digest_hex};
    use crate::feed::{FeedError, NullFeed};
    use crate::guard::RejectionReason;
    use crate::store::MemoryStore;

    const MINUTE_MS: i64 = 60_000;
    const HOUR_MS: i64 = 60 * MINUTE_MS;

    fn at(ms: i64) -> DateTime<Utc> {
        // 2024-08-12T00:00:00Z
        DateTime::from_timestamp_millis(1_723_420_800_000 + ms).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn fields(latitude: f64, longitude: f64) -> ReportFields {
        ReportFields {
            report_type: "fire".to_string(),
            severity: "moderate".to_string(),
            description: "Brush fire next to the highway".to_string(),
            latitude,
            longitude,
            contact_info: None,
            reporter: None,
        }
    }

    fn book() -> ReportBook<MemoryStore, NullFeed> {
        ReportBook::open(
            ReportingPolicy::default(),
            MemoryStore::default(),
            NullFeed,
            utc(),
            at(0),
        )
        .unwrap()
    }

    fn created(submission: Submission) -> Report {
        match submission {
            Submission::Created(report) => report,
            Submission::Rejected(rejection) => panic!("rejected: {}", rejection.message),
        }
    }

    /// Feed that remembers what it was given and can be told to fail.
    #[derive(Default)]
    struct RecordingFeed {
        published: Vec<FeedRecord>,
        snapshot: Vec<FeedRecord>,
        offline: bool,
    }

    impl RemoteFeed for RecordingFeed {
        fn publish(&mut self, record: &FeedRecord, _now: DateTime<Utc>) -> Result<(), FeedError> {
            if self.offline {
                return Err(FeedError::Unavailable("offline".to_string()));
            }
            self.published.push(record.clone());
            Ok(())
        }

        fn snapshot(&mut self, _now: DateTime<Utc>) -> Result<Vec<FeedRecord>, FeedError> {
            if self.offline {
                return Err(FeedError::Unavailable("offline".to_string()));
            }
            Ok(self.snapshot.clone())
        }
    }

    /// Store whose writes can be told to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_meta: bool,
        fail_reports: bool,
    }

    impl LocalStore for FlakyStore {
        fn load_reports(&self) -> Result<Vec<Report>, StoreError> {
            self.inner.load_reports()
        }

        fn save_reports(&mut self, reports: &[Report]) -> Result<(), StoreError> {
            if self.fail_reports {
                return Err(StoreError::Backend("disk full".to_string()));
            }
            self.inner.save_reports(reports)
        }

        fn load_meta(&self) -> Result<Option<SubmissionMeta>, StoreError> {
            self.inner.load_meta()
        }

        fn save_meta(&mut self, meta: &SubmissionMeta) -> Result<(), StoreError> {
            if self.fail_meta {
                return Err(StoreError::Backend("disk full".to_string()));
            }
            self.inner.save_meta(meta)
        }
    }

    fn flaky_book(store: FlakyStore) -> ReportBook<FlakyStore, RecordingFeed> {
        ReportBook::open(
            ReportingPolicy::default(),
            store,
            RecordingFeed::default(),
            utc(),
            at(0),
        )
        .unwrap()
    }

    fn remote_report(id: &str, created_ms: i64) -> Report {
        let lifecycle = ReportLifecycle::default();
        let mut report = lifecycle.create(fields(10.0, 10.0), at(created_ms)).unwrap();
        report.id = ReportId::from(id);
        report
    }

    #[test]
    fn submit_creates_persists_and_counts() {
        let mut book = book();

        let report = created(book.submit(fields(34.0, -118.0), at(0), None).unwrap());

        assert_eq!(book.reports(), std::slice::from_ref(&report));
        assert_eq!(book.store().load_reports().unwrap(), vec![report]);
        let meta = book.store().load_meta().unwrap().unwrap();
        assert_eq!(meta.count, 1);
        assert_eq!(meta.last_submission_time, Some(at(0)));
    }

    #[test]
    fn rejected_submission_changes_nothing() {
        let mut book = book();
        created(book.submit(fields(34.0, -118.0), at(0), None).unwrap());
        let writes = book.store().writes();

        let submission = book
            .submit(fields(50.0, 50.0), at(5 * MINUTE_MS), None)
            .unwrap();

        let Submission::Rejected(rejection) = submission else {
            panic!("expected rejection");
        };
        assert_eq!(
            rejection.reason,
            RejectionReason::Cooldown {
                remaining_minutes: 25
            }
        );
        assert_eq!(book.reports().len(), 1);
        assert_eq!(book.store().writes(), writes);
        assert_eq!(book.meta(at(5 * MINUTE_MS)).count, 1);
    }

    #[test]
    fn failed_meta_write_persists_nothing() {
        let mut book = flaky_book(FlakyStore {
            fail_meta: true,
            ..FlakyStore::default()
        });

        assert!(matches!(
            book.submit(fields(34.0, -118.0), at(0), None),
            Err(BookError::Store(StoreError::Backend(_)))
        ));

        assert!(book.store().inner.load_reports().unwrap().is_empty());
        assert!(book.store().inner.load_meta().unwrap().is_none());
        assert!(book.reports().is_empty());
        assert_eq!(book.meta(at(0)).count, 0);
        assert!(book.feed().published.is_empty());
    }

    #[test]
    fn failed_report_write_restores_meta() {
        let mut book = flaky_book(FlakyStore::default());
        created(book.submit(fields(34.0, -118.0), at(0), None).unwrap());
        let persisted = book.store().inner.load_meta().unwrap();

        book.store.fail_reports = true;
        let later = at(HOUR_MS);
        assert!(book.submit(fields(50.0, 50.0), later, None).is_err());

        assert_eq!(book.store().inner.load_meta().unwrap(), persisted);
        assert_eq!(book.store().inner.load_reports().unwrap().len(), 1);
        assert_eq!(book.reports().len(), 1);
        assert_eq!(book.meta(later).count, 1);
        assert_eq!(book.feed().published.len(), 1);
    }

    #[test]
    fn malformed_fields_fail_before_the_guard() {
        let mut book = book();
        let bad = ReportFields {
            description: "short".to_string(),
            ..fields(34.0, -118.0)
        };

        assert!(matches!(
            book.submit(bad, at(0), None),
            Err(BookError::Validation(ValidationError::DescriptionTooShort { .. }))
        ));
        assert_eq!(book.meta(at(0)).count, 0);
    }

    #[test]
    fn quota_is_enforced_and_resets_next_day() {
        let mut book = book();
        for i in 0..3 {
            let lat = 30.0 + f64::from(i);
            created(
                book.submit(fields(lat, -118.0), at(i64::from(i) * 31 * MINUTE_MS), None)
                    .unwrap(),
            );
        }

        let fourth = book
            .submit(fields(40.0, -118.0), at(3 * 31 * MINUTE_MS), None)
            .unwrap();
        assert!(matches!(
            fourth,
            Submission::Rejected(Rejection {
                reason: RejectionReason::DailyQuota { limit: 3 },
                ..
            })
        ));

        let status = book.quota_status(at(3 * 31 * MINUTE_MS));
        assert_eq!(status.used, 3);
        assert_eq!(status.limit, 3);
        assert_eq!(status.cooldown_remaining_minutes, None);

        let tomorrow = at(24 * HOUR_MS + MINUTE_MS);
        assert_eq!(book.quota_status(tomorrow).used, 0);
        created(book.submit(fields(41.0, -118.0), tomorrow, None).unwrap());
        assert_eq!(book.meta(tomorrow).count, 1);
    }

    #[test]
    fn bypass_submits_past_every_limit() {
        let mut book = book();
        let authority = OperatorAuthority::from_hex_digest(&token_digest_hex("ops-token")).unwrap();
        let grant = authority.authorize("ops", "ops-token", at(0)).unwrap();

        for i in 0..5 {
            created(
                book.submit(fields(34.0, -118.0), at(i), Some(&grant))
                    .unwrap(),
            );
        }

        assert_eq!(book.reports().len(), 5);
        assert_eq!(book.meta(at(5)).count, 5);
        authority.revoke(grant, at(5));
    }

    #[test]
    fn expired_reports_are_pruned_before_dedupe() {
        let mut book = book();
        let first = created(book.submit(fields(34.0, -118.0), at(0), None).unwrap());

        let later = at(25 * HOUR_MS);
        let second = created(book.submit(fields(34.0, -118.0), later, None).unwrap());

        assert_eq!(book.reports(), std::slice::from_ref(&second));
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn edit_updates_and_persists() {
        let mut book = book();
        let report = created(book.submit(fields(34.0, -118.0), at(0), None).unwrap());

        let updated = book
            .edit(
                &report.id,
                ReportPatch {
                    is_active: Some(false),
                    ..ReportPatch::default()
                },
                at(2 * HOUR_MS),
            )
            .unwrap();

        assert!(!updated.is_active);
        assert_eq!(book.store().load_reports().unwrap(), vec![updated]);

        let removed = book.prune(at(3 * HOUR_MS + 1)).unwrap();
        assert_eq!(removed, vec![report.id]);
        assert!(book.reports().is_empty());
    }

    #[test]
    fn expired_report_cannot_be_edited() {
        let mut book = book();
        let report = created(book.submit(fields(34.0, -118.0), at(0), None).unwrap());

        let result = book.edit(
            &report.id,
            ReportPatch {
                is_active: Some(true),
                ..ReportPatch::default()
            },
            at(24 * HOUR_MS + 1),
        );

        assert!(matches!(result, Err(BookError::NotFound(id)) if id == report.id));
    }

    #[test]
    fn feed_failure_does_not_block_local_submit() {
        let mut book = ReportBook::open(
            ReportingPolicy::default(),
            MemoryStore::default(),
            RecordingFeed {
                offline: true,
                ..RecordingFeed::default()
            },
            utc(),
            at(0),
        )
        .unwrap();

        let report = created(book.submit(fields(34.0, -118.0), at(0), None).unwrap());

        assert_eq!(book.reports(), std::slice::from_ref(&report));
        assert!(book.feed().published.is_empty());

        let outcome = book.sync(at(1)).unwrap();
        assert_eq!(outcome, SyncOutcome::default());
        assert_eq!(book.reports().len(), 1);
    }

    #[test]
    fn published_record_carries_expiry_hint() {
        let mut book = ReportBook::open(
            ReportingPolicy::default(),
            MemoryStore::default(),
            RecordingFeed::default(),
            utc(),
            at(0),
        )
        .unwrap();

        let report = created(book.submit(fields(34.0, -118.0), at(0), None).unwrap());

        let published = &book.feed().published;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].report, report);
        assert_eq!(published[0].expires_at, at(24 * HOUR_MS));
    }

    #[test]
    fn snapshot_merge_respects_expiry_hint_and_moderation() {
        let local = remote_report("local", 0);
        let mut book = ReportBook::open(
            ReportingPolicy::default(),
            MemoryStore::with_state(vec![local.clone()], None),
            NullFeed,
            utc(),
            at(0),
        )
        .unwrap();

        let fresh = FeedRecord::for_report(remote_report("fresh", HOUR_MS), TimeDelta::hours(24));
        let pending = FeedRecord {
            status: Some(ModerationStatus::Pending),
            ..FeedRecord::for_report(remote_report("pending", HOUR_MS), TimeDelta::hours(24))
        };
        let approved = FeedRecord {
            status: Some(ModerationStatus::Approved),
            ..FeedRecord::for_report(remote_report("approved", HOUR_MS), TimeDelta::hours(24))
        };
        // The feed says the local report is already gone.
        let stale_local = FeedRecord {
            expires_at: at(HOUR_MS),
            ..FeedRecord::for_report(local.clone(), TimeDelta::hours(24))
        };

        let outcome = book
            .apply_feed_snapshot(vec![fresh, pending, approved, stale_local], at(2 * HOUR_MS))
            .unwrap();

        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.removed, vec![local.id]);
        let ids: Vec<&str> = book.reports().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["fresh", "approved"]);
    }

    #[test]
    fn local_copy_wins_over_feed_copy() {
        let lifecycle = ReportLifecycle::default();
        let original = remote_report("shared", 0);
        let edited = lifecycle
            .update(
                &original,
                ReportPatch {
                    is_active: Some(false),
                    ..ReportPatch::default()
                },
                at(HOUR_MS),
            )
            .unwrap();

        let mut book = ReportBook::open(
            ReportingPolicy::default(),
            MemoryStore::with_state(vec![edited.clone()], None),
            RecordingFeed {
                snapshot: vec![FeedRecord::for_report(original, TimeDelta::hours(24))],
                ..RecordingFeed::default()
            },
            utc(),
            at(0),
        )
        .unwrap();

        let outcome = book.sync(at(HOUR_MS + 1)).unwrap();

        assert_eq!(outcome.added, 0);
        assert_eq!(book.reports(), std::slice::from_ref(&edited));
    }

    #[test]
    fn snapshot_skips_records_the_lifecycle_already_expired() {
        let mut book = book();
        let mut resolved = remote_report("resolved", 0);
        resolved.is_active = false;
        let snapshot = vec![FeedRecord::for_report(resolved, TimeDelta::hours(24))];

        let outcome = book.apply_feed_snapshot(snapshot, at(2 * HOUR_MS)).unwrap();

        assert_eq!(outcome, SyncOutcome::default());
        assert!(book.reports().is_empty());
        assert_eq!(book.store().writes(), 0);
    }

    #[test]
    fn snapshot_merge_is_idempotent() {
        let mut book = book();
        let snapshot = vec![FeedRecord::for_report(
            remote_report("r1", 0),
            TimeDelta::hours(24),
        )];

        let first = book.apply_feed_snapshot(snapshot.clone(), at(HOUR_MS)).unwrap();
        let second = book.apply_feed_snapshot(snapshot, at(HOUR_MS)).unwrap();

        assert_eq!(first.added, 1);
        assert_eq!(second, SyncOutcome::default());
        assert_eq!(book.reports().len(), 1);
    }

    #[test]
    fn open_rolls_stale_meta() {
        let yesterday = local_day(at(0), utc()).pred_opt().unwrap();
        let stale = SubmissionMeta {
            date_key: yesterday,
            count: 3,
            last_submission_time: Some(at(-MINUTE_MS)),
        };
        let book = ReportBook::open(
            ReportingPolicy::default(),
            MemoryStore::with_state(Vec::new(), Some(stale)),
            NullFeed,
            utc(),
            at(0),
        )
        .unwrap();

        let status = book.quota_status(at(0));
        assert_eq!(status.used, 0);
        assert_eq!(status.cooldown_remaining_minutes, None);
    }
}
