//! Subcommand implementations.

use chrono::{DateTime, FixedOffset, Local, Offset as _, Utc};
use firemap_report_models::{Advisory, Report, ReportId};
use firemap_reporting::authority::{AuthorizationError, OperatorAuthority};
use firemap_reporting::book::{BookError, ReportBook, Submission};
use firemap_reporting::feed::{FeedError, FeedRecord, NullFeed, RemoteFeed};
use firemap_reporting::lifecycle::{ReportFields, ReportPatch, ReportState};
use firemap_reporting::store::StoreError;
use firemap_store::{JsonDirStore, JsonFeedFile};
use thiserror::Error;

use crate::config::{ConfigError, FiremapConfig, OPERATOR_TOKEN_ENV};

/// The book type the CLI works with.
pub type Book = ReportBook<JsonDirStore, ConfiguredFeed>;

/// Errors surfaced by a subcommand.
#[derive(Debug, Error)]
pub enum CliError {
    /// Config could not be loaded or interpreted.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The data directory could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The shared feed could not be opened.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// A report operation failed.
    #[error(transparent)]
    Book(#[from] BookError),

    /// The bypass request was refused.
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    /// `--bypass` was given without a token in the environment.
    #[error("--bypass requires the operator token in {OPERATOR_TOKEN_ENV}")]
    MissingOperatorToken,
}

/// The feed picked by config: the shared file when configured, otherwise
/// none.
#[derive(Debug)]
pub enum ConfiguredFeed {
    /// Reports stay on this device.
    Offline(NullFeed),
    /// Reports are shared through a feed file.
    Shared(JsonFeedFile),
}

impl RemoteFeed for ConfiguredFeed {
    fn publish(&mut self, record: &FeedRecord, now: DateTime<Utc>) -> Result<(), FeedError> {
        match self {
            Self::Offline(feed) => feed.publish(record, now),
            Self::Shared(feed) => feed.publish(record, now),
        }
    }

    fn snapshot(&mut self, now: DateTime<Utc>) -> Result<Vec<FeedRecord>, FeedError> {
        match self {
            Self::Offline(feed) => feed.snapshot(now),
            Self::Shared(feed) => feed.snapshot(now),
        }
    }
}

/// The device's current UTC offset.
fn local_offset() -> FixedOffset {
    Local::now().offset().fix()
}

/// Opens the report book described by `config` at the current time.
///
/// # Errors
///
/// Returns an error if the policy is invalid or the store or feed cannot be
/// opened.
pub fn open_book(config: &FiremapConfig) -> Result<Book, CliError> {
    open_book_at(config, local_offset(), Utc::now())
}

fn open_book_at(
    config: &FiremapConfig,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Result<Book, CliError> {
    let policy = config.policy.to_policy()?;
    let store = JsonDirStore::open(&config.data_dir)?;
    let feed = match &config.feed_path {
        Some(path) => ConfiguredFeed::Shared(JsonFeedFile::open(path, now)?),
        None => ConfiguredFeed::Offline(NullFeed),
    };

    Ok(ReportBook::open(policy, store, feed, offset, now)?)
}

/// Submits a report, optionally under an operator bypass.
///
/// # Errors
///
/// Returns an error if bypass is refused, the fields are malformed or the
/// store fails.
pub fn submit(
    book: &mut Book,
    config: &FiremapConfig,
    fields: ReportFields,
    operator: Option<&str>,
) -> Result<(), CliError> {
    let bypass = match operator {
        Some(operator) => {
            let token =
                std::env::var(OPERATOR_TOKEN_ENV).map_err(|_| CliError::MissingOperatorToken)?;
            Some((operator, token))
        }
        None => None,
    };

    let authority = config.operator.authority()?;
    let submission = submit_at(
        book,
        &authority,
        fields,
        bypass.as_ref().map(|(operator, token)| (*operator, token.as_str())),
        Utc::now(),
    )?;

    match submission {
        Submission::Created(report) => {
            println!("Submitted report {}", report.id);
            print_report(book, &report, Utc::now());
        }
        Submission::Rejected(rejection) => println!("{}", rejection.message),
    }

    Ok(())
}

fn submit_at(
    book: &mut Book,
    authority: &OperatorAuthority,
    fields: ReportFields,
    bypass: Option<(&str, &str)>,
    now: DateTime<Utc>,
) -> Result<Submission, CliError> {
    let grant = bypass
        .map(|(operator, token)| authority.authorize(operator, token, now))
        .transpose()?;

    let result = book.submit(fields, now, grant.as_ref());

    if let Some(grant) = grant {
        authority.revoke(grant, now);
    }

    Ok(result?)
}

/// Applies `patch` to report `id`.
///
/// # Errors
///
/// Returns an error if the report is not visible, the patch is malformed or
/// the store fails.
pub fn update(book: &mut Book, id: &str, patch: ReportPatch) -> Result<(), CliError> {
    let now = Utc::now();
    let report = book.edit(&ReportId::from(id), patch, now)?;

    println!("Updated report {}", report.id);
    print_report(book, &report, now);
    Ok(())
}

/// Removes expired reports.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn prune(book: &mut Book) -> Result<(), CliError> {
    let removed = book.prune(Utc::now())?;

    if removed.is_empty() {
        println!("No expired reports");
    } else {
        for id in &removed {
            println!("Removed {id}");
        }
        println!("Removed {} expired report(s)", removed.len());
    }
    Ok(())
}

/// Prints every visible report.
pub fn list(book: &Book) {
    let now = Utc::now();
    let reports: Vec<&Report> = book
        .reports()
        .iter()
        .filter(|report| book.lifecycle().state(report, now) != ReportState::Expired)
        .collect();

    if reports.is_empty() {
        println!("No reports");
        return;
    }

    for report in reports {
        print_report(book, report, now);
        println!();
    }
}

/// Prints today's quota and cooldown.
pub fn quota(book: &Book) {
    let status = book.quota_status(Utc::now());

    println!("Reports today: {}/{}", status.used, status.limit);
    match status.cooldown_remaining_minutes {
        Some(minutes) => println!("Next report allowed in {minutes} minute(s)"),
        None => println!("No cooldown active"),
    }
}

/// Pulls reports from the shared feed.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn sync(book: &mut Book) -> Result<(), CliError> {
    if matches!(book.feed(), ConfiguredFeed::Offline(_)) {
        log::warn!("No feed_path configured, only pruning local reports");
    }

    let outcome = book.sync(Utc::now())?;
    println!(
        "Added {} report(s), removed {} expired report(s)",
        outcome.added,
        outcome.removed.len()
    );
    Ok(())
}

const fn state_label(state: ReportState) -> &'static str {
    match state {
        ReportState::Active => "ACTIVE",
        ReportState::Inactive => "RESOLVED",
        ReportState::Expired => "EXPIRED",
    }
}

fn print_report(book: &Book, report: &Report, now: DateTime<Utc>) {
    let lifecycle = book.lifecycle();
    let local = |time: DateTime<Utc>| time.with_timezone(&Local).format("%Y-%m-%d %H:%M");

    println!(
        "{}  {}  {} ({})  radius {}m  at {:.5}, {:.5}",
        report.id,
        state_label(lifecycle.state(report, now)),
        report.report_type.label(),
        report.severity,
        report.severity.marker_radius_meters(),
        report.location.latitude,
        report.location.longitude,
    );
    println!("    {}", report.description);

    let edited = if report.was_edited() {
        format!(", edited {}", local(report.last_updated))
    } else {
        String::new()
    };
    println!(
        "    by {} at {}{edited}, visible until {}",
        report.reporter,
        local(report.created_at),
        local(lifecycle.visible_until(report)),
    );

    if let Some(contact) = &report.contact_info {
        println!("    contact: {contact}");
    }

    if let Some(advisory) = Advisory::for_incident(report.report_type, report.severity) {
        println!("    {advisory}:");
        for line in advisory.guidance() {
            println!("      - {line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeDelta;
    use firemap_reporting::authority::token_digest_hex;
    use firemap_reporting::guard::RejectionReason;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_723_456_800_000).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn config(dir: &std::path::Path, shared: bool) -> FiremapConfig {
        FiremapConfig {
            data_dir: dir.join("device"),
            feed_path: shared.then(|| dir.join("feed.json")),
            ..FiremapConfig::default()
        }
    }

    fn fields(latitude: f64) -> ReportFields {
        ReportFields {
            report_type: "fire".to_string(),
            severity: "high".to_string(),
            description: "Flames moving downhill toward the road".to_string(),
            latitude,
            longitude: -122.0,
            contact_info: None,
            reporter: None,
        }
    }

    #[test]
    fn submissions_persist_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), false);
        let authority = OperatorAuthority::disabled();

        let mut book = open_book_at(&config, utc(), t0()).unwrap();
        let first = submit_at(&mut book, &authority, fields(38.0), None, t0()).unwrap();
        assert!(matches!(first, Submission::Created(_)));

        let later = t0() + TimeDelta::minutes(5);
        let mut reopened = open_book_at(&config, utc(), later).unwrap();
        assert_eq!(reopened.reports().len(), 1);

        let second = submit_at(&mut reopened, &authority, fields(39.0), None, later).unwrap();
        let Submission::Rejected(rejection) = second else {
            panic!("expected cooldown rejection");
        };
        assert_eq!(
            rejection.reason,
            RejectionReason::Cooldown {
                remaining_minutes: 25
            }
        );
    }

    #[test]
    fn authorized_bypass_skips_the_guard() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), false);
        let authority = OperatorAuthority::from_hex_digest(&token_digest_hex("s3cret")).unwrap();

        let mut book = open_book_at(&config, utc(), t0()).unwrap();
        for _ in 0..4 {
            let submission =
                submit_at(&mut book, &authority, fields(38.0), Some(("ops", "s3cret")), t0())
                    .unwrap();
            assert!(matches!(submission, Submission::Created(_)));
        }
        assert_eq!(book.quota_status(t0()).used, 4);
    }

    #[test]
    fn wrong_token_is_refused_before_submitting() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), false);
        let authority = OperatorAuthority::from_hex_digest(&token_digest_hex("s3cret")).unwrap();

        let mut book = open_book_at(&config, utc(), t0()).unwrap();
        let err = submit_at(&mut book, &authority, fields(38.0), Some(("ops", "nope")), t0())
            .unwrap_err();

        assert!(matches!(
            err,
            CliError::Authorization(AuthorizationError::InvalidToken)
        ));
        assert!(book.reports().is_empty());
    }

    #[test]
    fn shared_feed_carries_reports_between_devices() {
        let dir = tempfile::tempdir().unwrap();
        let authority = OperatorAuthority::disabled();

        let first = config(dir.path(), true);
        let mut sender = open_book_at(&first, utc(), t0()).unwrap();
        submit_at(&mut sender, &authority, fields(38.0), None, t0()).unwrap();

        let second = FiremapConfig {
            data_dir: dir.path().join("other-device"),
            ..first
        };
        let later = t0() + TimeDelta::minutes(1);
        let mut receiver = open_book_at(&second, utc(), later).unwrap();
        let outcome = receiver.sync(later).unwrap();

        assert_eq!(outcome.added, 1);
        assert_eq!(receiver.reports(), sender.reports());
    }
}
