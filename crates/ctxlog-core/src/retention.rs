//! Age-based retention sweeps.

use crate::error::ContextError;
use crate::record::{Record, StoreKind};
use crate::store::BoundedStore;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use std::fmt;

type Undo<'a> = Box<dyn FnOnce() -> Result<(), ContextError> + 'a>;

/// Records dropped from one store, with a way to put them back.
pub struct Removal<'a> {
    pub count: usize,
    undo: Undo<'a>,
}

impl<'a> Removal<'a> {
    pub fn new(count: usize, undo: impl FnOnce() -> Result<(), ContextError> + 'a) -> Self {
        Self {
            count,
            undo: Box::new(undo),
        }
    }

    /// Restore the store to its contents before the removal.
    pub fn undo(self) -> Result<(), ContextError> {
        (self.undo)()
    }
}

impl fmt::Debug for Removal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Removal").field("count", &self.count).finish()
    }
}

/// A store that can drop records by age.
pub trait RetentionTarget: Send + Sync {
    fn kind(&self) -> StoreKind;

    /// Remove records stamped at or before `cutoff`.
    fn remove_older_than(&self, cutoff: DateTime<Utc>) -> Result<Removal<'_>, ContextError>;
}

impl<R: Record> RetentionTarget for BoundedStore<R> {
    fn kind(&self) -> StoreKind {
        R::KIND
    }

    fn remove_older_than(&self, cutoff: DateTime<Utc>) -> Result<Removal<'_>, ContextError> {
        let before = self.snapshot();
        let count = BoundedStore::remove_older_than(self, cutoff)?;
        Ok(Removal::new(count, move || self.replace_all(before)))
    }
}

/// Instant `days` before `now`, or `None` when it is not representable.
pub fn cutoff(now: DateTime<Utc>, days: u64) -> Option<DateTime<Utc>> {
    let days = i64::try_from(days).ok()?;
    let delta = TimeDelta::try_days(days)?;
    now.checked_sub_signed(delta)
}

/// Outcome of a retention sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionReport {
    pub days: u64,
    /// Per-store removal counts, in store order.
    pub removed: Vec<(StoreKind, usize)>,
}

impl RetentionReport {
    pub fn total(&self) -> usize {
        self.removed.iter().map(|(_, count)| count).sum()
    }

    pub fn removed_from(&self, kind: StoreKind) -> usize {
        self.removed
            .iter()
            .find(|(store, _)| *store == kind)
            .map_or(0, |(_, count)| *count)
    }
}

impl fmt::Display for RetentionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total();
        if total == 0 {
            return write!(f, "No entries older than {} days found", self.days);
        }
        write!(f, "Removed {total} entries older than {} days:", self.days)?;
        for (kind, count) in self.removed.iter().filter(|(_, count)| *count > 0) {
            write!(f, "\n  - {kind}: {count} entries")?;
        }
        Ok(())
    }
}

/// Remove records older than `days` from every target.
///
/// If a target fails, the targets already swept are restored before the
/// error is returned.
pub fn sweep(
    targets: &[&dyn RetentionTarget],
    now: DateTime<Utc>,
    days: u64,
) -> Result<RetentionReport, ContextError> {
    let Some(cutoff) = cutoff(now, days) else {
        debug!("retention cutoff out of range (days={days}); nothing removed");
        return Ok(RetentionReport {
            days,
            removed: targets.iter().map(|target| (target.kind(), 0)).collect(),
        });
    };
    let mut swept: Vec<(StoreKind, Removal<'_>)> = Vec::with_capacity(targets.len());
    for target in targets {
        match target.remove_older_than(cutoff) {
            Ok(removal) => swept.push((target.kind(), removal)),
            Err(err) => {
                warn!(
                    "retention sweep failed on {} store, restoring earlier stores ({err})",
                    target.kind()
                );
                for (kind, removal) in swept.into_iter().rev() {
                    if removal.count == 0 {
                        continue;
                    }
                    if let Err(undo) = removal.undo() {
                        warn!("could not restore {kind} store: {undo}");
                    }
                }
                return Err(err);
            }
        }
    }
    let removed = swept
        .into_iter()
        .map(|(kind, removal)| (kind, removal.count))
        .collect();
    let report = RetentionReport { days, removed };
    info!(
        "retention sweep finished (days={days}, cutoff={cutoff}, removed={})",
        report.total()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{Removal, RetentionReport, RetentionTarget, cutoff, sweep};
    use crate::error::ContextError;
    use crate::record::StoreKind;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    struct FakeStore {
        kind: StoreKind,
        stamps: Mutex<Vec<DateTime<Utc>>>,
        broken: bool,
    }

    impl FakeStore {
        fn new(kind: StoreKind, stamps: Vec<DateTime<Utc>>) -> Self {
            Self {
                kind,
                stamps: Mutex::new(stamps),
                broken: false,
            }
        }
    }

    impl RetentionTarget for FakeStore {
        fn kind(&self) -> StoreKind {
            self.kind
        }

        fn remove_older_than(&self, cutoff: DateTime<Utc>) -> Result<Removal<'_>, ContextError> {
            if self.broken {
                return Err(ContextError::Io(std::io::Error::other("disk full")));
            }
            let mut stamps = self.stamps.lock();
            let before = stamps.clone();
            stamps.retain(|stamp| *stamp > cutoff);
            let count = before.len() - stamps.len();
            Ok(Removal::new(count, move || {
                *self.stamps.lock() = before;
                Ok(())
            }))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn cutoff_handles_extremes() {
        assert_eq!(cutoff(now(), 0), Some(now()));
        assert_eq!(cutoff(now(), 2), Some(now() - TimeDelta::days(2)));
        assert_eq!(cutoff(now(), u64::MAX), None);
        assert_eq!(cutoff(now(), 1_000_000_000), None);
    }

    #[test]
    fn sweep_counts_per_store() {
        let sessions = FakeStore::new(
            StoreKind::Sessions,
            vec![now() - TimeDelta::days(40), now() - TimeDelta::days(1)],
        );
        let events = FakeStore::new(StoreKind::Events, vec![now() - TimeDelta::days(31)]);
        let targets: [&dyn RetentionTarget; 2] = [&sessions, &events];
        let report = sweep(&targets, now(), 30).expect("sweep");
        assert_eq!(report.total(), 2);
        assert_eq!(report.removed_from(StoreKind::Events), 1);
        assert_eq!(
            report.to_string(),
            "Removed 2 entries older than 30 days:\n  - sessions: 1 entries\n  - events: 1 entries"
        );

        let again = sweep(&targets, now(), 30).expect("sweep");
        assert_eq!(again.to_string(), "No entries older than 30 days found");
    }

    #[test]
    fn failed_store_restores_earlier_stores() {
        let sessions = FakeStore::new(StoreKind::Sessions, vec![now() - TimeDelta::days(40)]);
        let events = FakeStore {
            broken: true,
            ..FakeStore::new(StoreKind::Events, vec![now() - TimeDelta::days(40)])
        };
        let targets: [&dyn RetentionTarget; 2] = [&sessions, &events];
        assert!(sweep(&targets, now(), 30).is_err());
        assert_eq!(*sessions.stamps.lock(), vec![now() - TimeDelta::days(40)]);
        assert_eq!(events.stamps.lock().len(), 1);
    }

    #[test]
    fn empty_report_renders_nothing_found() {
        let report = RetentionReport {
            days: 7,
            removed: vec![(StoreKind::Sessions, 0)],
        };
        assert_eq!(report.to_string(), "No entries older than 7 days found");
    }
}
