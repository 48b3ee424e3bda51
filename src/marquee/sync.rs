//! Capture/restore driver, independent of the DOM
//!
//! `TapeSync` is the one persistor instance a page creates. It talks to the
//! tapes through [`TapeDeck`] and to storage through [`KeyValueStore`], so the
//! browser wiring in `dom.rs` stays thin.

use super::retry::{AttemptOutcome, RestoreRetry, RetryPhase, RetrySchedule};
use super::snapshot::{MarqueeSnapshot, SnapshotError, TapeReading};
use super::timeline::{PhaseTable, start_delay_secs};
use crate::persistence::KeyValueStore;

/// The tracked tape elements on the current page, in selector order
pub trait TapeDeck {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live animation state of tape `index`, if it has one
    fn read(&self, index: usize) -> Option<TapeReading>;

    /// Whether tape `index` has an observable animation yet
    fn is_animating(&self, index: usize) -> bool;

    /// Reapply tape `index`'s animation starting `delay_secs` (negative) in
    fn apply_delay(&mut self, index: usize, delay_secs: f64);
}

/// Result of one save trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Positions for this many tapes were written
    Saved(usize),
    /// Nothing readable on the page, storage untouched
    Skipped,
    /// Storage rejected the write
    Failed,
}

/// Restore plan for one tape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestoreTarget {
    pub index: usize,
    /// Saved shared-timeline position
    pub shared_ms: f64,
    /// Raw elapsed time the tape must show
    pub elapsed_ms: f64,
    /// `animation-delay` in seconds (zero or negative)
    pub delay_secs: f64,
}

impl RestoreTarget {
    pub fn plan(table: &PhaseTable, index: usize, shared_ms: f64) -> Self {
        let elapsed_ms = table.restore(index, shared_ms, None);
        Self {
            index,
            shared_ms,
            elapsed_ms,
            delay_secs: start_delay_secs(elapsed_ms),
        }
    }
}

/// Pending restores for every tape with a saved position
#[derive(Debug, Clone)]
pub struct RestoreBatch {
    entries: Vec<(RestoreTarget, RestoreRetry)>,
    schedule: RetrySchedule,
}

impl RestoreBatch {
    pub fn new(targets: Vec<RestoreTarget>, schedule: RetrySchedule) -> Self {
        let entries = targets
            .into_iter()
            .map(|t| (t, RestoreRetry::new(schedule.max_attempts)))
            .collect();
        Self { entries, schedule }
    }

    pub fn targets(&self) -> impl Iterator<Item = &RestoreTarget> + '_ {
        self.entries.iter().map(|(t, _)| t)
    }

    /// Tapes whose saved phase has not been applied yet
    pub fn waiting(&self) -> impl Iterator<Item = &RestoreTarget> + '_ {
        self.entries
            .iter()
            .filter(|(_, r)| r.phase() == RetryPhase::Waiting)
            .map(|(t, _)| t)
    }

    /// True while some tape is still waiting for another attempt
    pub fn is_pending(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, r)| r.phase() == RetryPhase::Waiting)
    }

    /// Delay before the next attempt, `None` once every tape is settled
    pub fn next_delay_ms(&self) -> Option<u32> {
        self.entries
            .iter()
            .filter(|(_, r)| r.phase() == RetryPhase::Waiting)
            .map(|(_, r)| self.schedule.delay_before(r.attempts() + 1))
            .min()
    }

    /// Run one attempt on every waiting tape. Returns true if more remain.
    pub fn step<D: TapeDeck>(&mut self, deck: &mut D) -> bool {
        for (target, retry) in self.entries.iter_mut() {
            let phase = retry.attempt(|| {
                if deck.is_animating(target.index) {
                    AttemptOutcome::Ready
                } else {
                    AttemptOutcome::NotReady
                }
            });
            match phase {
                RetryPhase::Succeeded => {
                    deck.apply_delay(target.index, target.delay_secs);
                    log::debug!(
                        "Restored tape {} at {:.0}ms (attempt {})",
                        target.index,
                        target.elapsed_ms,
                        retry.attempts()
                    );
                }
                RetryPhase::Exhausted => {
                    log::info!(
                        "Tape {} never started animating, leaving default phase",
                        target.index
                    );
                }
                RetryPhase::Waiting | RetryPhase::Attempting => {}
            }
        }
        // Succeeded/Exhausted entries stay put; their retry state absorbs
        self.is_pending()
    }

    pub fn phases(&self) -> Vec<RetryPhase> {
        self.entries.iter().map(|(_, r)| r.phase()).collect()
    }
}

/// Marquee persistor for one page load
pub struct TapeSync<S: KeyValueStore> {
    table: PhaseTable,
    schedule: RetrySchedule,
    key: String,
    store: S,
}

impl<S: KeyValueStore> TapeSync<S> {
    pub fn new(table: PhaseTable, schedule: RetrySchedule, key: impl Into<String>, store: S) -> Self {
        Self {
            table,
            schedule,
            key: key.into(),
            store,
        }
    }

    pub fn table(&self) -> &PhaseTable {
        &self.table
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Warn when the page has a different number of tapes than offsets
    pub fn check_layout(&self, tracked: usize) -> bool {
        if tracked > 0 && !self.table.matches(tracked) {
            log::warn!(
                "Found {} tapes but {} phase offsets; positions may drift between pages",
                tracked,
                self.table.len()
            );
            return false;
        }
        true
    }

    /// Capture every tape and overwrite the stored snapshot.
    ///
    /// Tapes still waiting in `restoring` keep their saved position; their
    /// live reading is the stylesheet's default phase.
    pub fn save<D: TapeDeck>(
        &mut self,
        deck: &D,
        restoring: Option<&RestoreBatch>,
    ) -> SaveOutcome {
        let waiting: Vec<&RestoreTarget> = restoring
            .map(|batch| batch.waiting().collect())
            .unwrap_or_default();
        let readings: Vec<Option<TapeReading>> = (0..deck.len())
            .map(|i| {
                if waiting.iter().any(|t| t.index == i) {
                    None
                } else {
                    deck.read(i)
                }
            })
            .collect();

        let mut snapshot = MarqueeSnapshot::capture(&self.table, &readings).unwrap_or_default();
        for target in &waiting {
            snapshot.insert(target.index, target.shared_ms);
        }
        if snapshot.is_empty() {
            return SaveOutcome::Skipped;
        }
        match snapshot.save(&mut self.store, &self.key) {
            Ok(()) => SaveOutcome::Saved(snapshot.len()),
            Err(e) => {
                log::debug!("Could not save marquee state: {}", e);
                SaveOutcome::Failed
            }
        }
    }

    /// Load the stored snapshot; errors mean nothing to restore
    pub fn load(&self) -> Option<MarqueeSnapshot> {
        match MarqueeSnapshot::load(&self.store, &self.key) {
            Ok(snapshot) => snapshot,
            Err(SnapshotError::Malformed(e)) => {
                log::info!("Ignoring malformed marquee state: {}", e);
                None
            }
            Err(e) => {
                log::info!("Could not restore marquee state: {}", e);
                None
            }
        }
    }

    /// Plan restores for the tapes present on this page
    pub fn begin_restore(&self, tracked: usize) -> Option<RestoreBatch> {
        let snapshot = self.load()?;
        let targets: Vec<RestoreTarget> = snapshot
            .iter()
            .filter(|(index, _)| *index < tracked)
            .map(|(index, shared)| RestoreTarget::plan(&self.table, index, shared))
            .collect();
        if targets.is_empty() {
            None
        } else {
            Some(RestoreBatch::new(targets, self.schedule))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    /// Tapes whose animations attach after a number of checks. Reapplying an
    /// animation restarts `currentTime` at zero, as browsers do.
    struct FakeDeck {
        readings: Vec<Option<TapeReading>>,
        probes_until_ready: Vec<u32>,
        probes: Vec<u32>,
        applied: Vec<Option<f64>>,
    }

    impl FakeDeck {
        fn new(readings: Vec<Option<TapeReading>>) -> Self {
            let n = readings.len();
            Self {
                readings,
                probes_until_ready: vec![0; n],
                probes: vec![0; n],
                applied: vec![None; n],
            }
        }

        fn fresh(n: usize) -> Self {
            Self::new(vec![None; n])
        }
    }

    impl TapeDeck for FakeDeck {
        fn len(&self) -> usize {
            self.readings.len()
        }

        fn read(&self, index: usize) -> Option<TapeReading> {
            self.readings[index]
        }

        fn is_animating(&self, index: usize) -> bool {
            self.probes_until_ready[index] <= self.probes[index]
        }

        fn apply_delay(&mut self, index: usize, delay_secs: f64) {
            self.applied[index] = Some(delay_secs);
            self.readings[index] = Some(TapeReading::new(0.0).with_delay(delay_secs * 1000.0));
        }
    }

    impl FakeDeck {
        fn tick(&mut self) {
            for p in self.probes.iter_mut() {
                *p += 1;
            }
        }

        fn advance(&mut self, ms: f64) {
            for reading in self.readings.iter_mut().flatten() {
                reading.current_time_ms += ms;
            }
        }
    }

    fn sync(store: MemoryStore) -> TapeSync<MemoryStore> {
        TapeSync::new(
            PhaseTable::new(30_000.0, vec![0.0, 21_800.0, 15_300.0]),
            RetrySchedule::default(),
            "marquee-state",
            store,
        )
    }

    #[test]
    fn test_no_tapes_no_write() {
        let mut s = sync(MemoryStore::new());
        let deck = FakeDeck::fresh(0);
        assert_eq!(s.save(&deck, None), SaveOutcome::Skipped);
        assert_eq!(s.store().write_count(), 0);
        assert!(s.begin_restore(0).is_none());
    }

    #[test]
    fn test_unreadable_tapes_no_write() {
        let mut s = sync(MemoryStore::new());
        let deck = FakeDeck::fresh(3);
        assert_eq!(s.save(&deck, None), SaveOutcome::Skipped);
        assert_eq!(s.store().write_count(), 0);
    }

    #[test]
    fn test_three_tape_scenario() {
        let mut s = sync(MemoryStore::new());
        let deck = FakeDeck::new(vec![Some(TapeReading::new(5_000.0)), None, None]);
        assert_eq!(s.save(&deck, None), SaveOutcome::Saved(1));

        let batch = s.begin_restore(3).unwrap();
        let target = batch.targets().next().unwrap();
        assert_eq!(target.index, 0);
        assert_eq!(target.elapsed_ms, 5_000.0);

        // Same shared position played back on tape 1
        let plan = RestoreTarget::plan(s.table(), 1, 5_000.0);
        assert_eq!(plan.elapsed_ms, 13_200.0);
        assert!((plan.delay_secs + 13.2).abs() < 1e-9);
    }

    #[test]
    fn test_restore_keeps_phase_across_pages() {
        let mut s = sync(MemoryStore::new());
        let readings = vec![
            Some(TapeReading::new(5_000.0)),
            Some(TapeReading::new(13_200.0)),
            Some(TapeReading::new(19_700.0)),
        ];
        assert_eq!(s.save(&FakeDeck::new(readings), None), SaveOutcome::Saved(3));

        let mut batch = s.begin_restore(3).unwrap();
        let mut next_page = FakeDeck::fresh(3);
        assert!(!batch.step(&mut next_page));
        assert_eq!(next_page.applied[0], Some(-5.0));
        assert!((next_page.applied[1].unwrap() + 13.2).abs() < 1e-9);
        assert!((next_page.applied[2].unwrap() + 19.7).abs() < 1e-9);
    }

    #[test]
    fn test_phase_survives_two_navigations() {
        let mut s = sync(MemoryStore::new());
        let page_a = FakeDeck::new(vec![
            Some(TapeReading::new(10_000.0)),
            Some(TapeReading::new(18_200.0)),
            Some(TapeReading::new(24_700.0)),
        ]);
        assert_eq!(s.save(&page_a, None), SaveOutcome::Saved(3));

        let mut batch = s.begin_restore(3).unwrap();
        let mut page_b = FakeDeck::fresh(3);
        assert!(!batch.step(&mut page_b));
        page_b.advance(3_000.0);
        assert_eq!(s.save(&page_b, Some(&batch)), SaveOutcome::Saved(3));

        let page_c = s.begin_restore(3).unwrap();
        let elapsed: Vec<f64> = page_c.targets().map(|t| t.elapsed_ms).collect();
        assert!((elapsed[0] - 13_000.0).abs() < 1e-6);
        assert!((elapsed[1] - 21_200.0).abs() < 1e-6);
        assert!((elapsed[2] - 27_700.0).abs() < 1e-6);
    }

    #[test]
    fn test_save_during_restore_keeps_saved_position() {
        let mut store = MemoryStore::new();
        store.set("marquee-state", r#"{"0":10000}"#).unwrap();
        let mut s = sync(store);

        let mut batch = s.begin_restore(3).unwrap();
        // Page is being left before the first attempt; tapes show the default phase
        let mut deck = FakeDeck::new(vec![
            Some(TapeReading::new(700.0)),
            Some(TapeReading::new(700.0)),
            None,
        ]);
        assert_eq!(s.save(&deck, Some(&batch)), SaveOutcome::Saved(2));
        let saved = s.load().unwrap();
        assert_eq!(saved.position(0), Some(10_000.0));
        assert_eq!(saved.position(1), Some(22_500.0));

        // Once applied, the live tape is captured again
        assert!(!batch.step(&mut deck));
        deck.advance(1_000.0);
        assert_eq!(s.save(&deck, Some(&batch)), SaveOutcome::Saved(2));
        assert_eq!(s.load().unwrap().position(0), Some(11_000.0));
    }

    #[test]
    fn test_invalid_json_leaves_default_phase() {
        let mut store = MemoryStore::new();
        store.set("marquee-state", "{\"0\": oops").unwrap();
        let s = sync(store);
        assert!(s.load().is_none());
        assert!(s.begin_restore(3).is_none());
    }

    #[test]
    fn test_restore_succeeds_on_fourth_attempt() {
        let mut store = MemoryStore::new();
        store.set("marquee-state", r#"{"1":5000}"#).unwrap();
        let s = sync(store);

        let mut batch = s.begin_restore(3).unwrap();
        let mut deck = FakeDeck::fresh(3);
        deck.probes_until_ready[1] = 3;

        assert_eq!(batch.next_delay_ms(), Some(500));
        for _ in 0..3 {
            assert!(batch.step(&mut deck));
            assert_eq!(batch.next_delay_ms(), Some(200));
            deck.tick();
        }
        assert!(!batch.step(&mut deck));
        assert_eq!(batch.phases(), vec![RetryPhase::Succeeded]);
        assert!((deck.applied[1].unwrap() + 13.2).abs() < 1e-9);
        assert_eq!(batch.next_delay_ms(), None);
    }

    #[test]
    fn test_restore_gives_up_after_budget() {
        let mut store = MemoryStore::new();
        store.set("marquee-state", r#"{"0":1000}"#).unwrap();
        let s = TapeSync::new(
            PhaseTable::new(30_000.0, vec![0.0]),
            RetrySchedule {
                initial_delay_ms: 500,
                retry_delay_ms: 200,
                max_attempts: 4,
            },
            "marquee-state",
            store,
        );

        let mut batch = s.begin_restore(1).unwrap();
        let mut deck = FakeDeck::fresh(1);
        deck.probes_until_ready[0] = u32::MAX;

        let mut steps = 0;
        while batch.step(&mut deck) {
            steps += 1;
            deck.tick();
        }
        assert_eq!(steps, 3);
        assert_eq!(batch.phases(), vec![RetryPhase::Exhausted]);
        assert_eq!(deck.applied[0], None);
    }

    #[test]
    fn test_saved_index_past_page_is_ignored() {
        let mut store = MemoryStore::new();
        store.set("marquee-state", r#"{"5":1000}"#).unwrap();
        let s = sync(store);
        assert!(s.begin_restore(3).is_none());
    }

    #[test]
    fn test_layout_check() {
        let s = sync(MemoryStore::new());
        assert!(s.check_layout(3));
        assert!(s.check_layout(0));
        assert!(!s.check_layout(2));
    }
}
