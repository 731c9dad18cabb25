//! The confidential verification ledger.
//!
//! Composes the authorization registry, pause gate, record store, predicate
//! orchestration and history log into one façade. Operations execute as
//! serialized, all-or-nothing transactions. Every entry point validates its
//! preconditions, including any engine calls, before it writes. A failed
//! operation leaves records, history and counters exactly as they were.

use crate::authz::AuthorizationRegistry;
use crate::errors::LedgerError;
use crate::events::Notification;
use crate::history::{HistoryEntry, HistoryLedger, Stats};
use crate::identity::Identity;
use crate::pause::PauseGate;
use crate::predicates;
use crate::records::{RecordStatus, RecordStore, VerificationRecord};
use chrono::Utc;
use fhe_engine::engine::ComputationEngine;
use fhe_engine::handle::CiphertextHandle;
use std::sync::Arc;

pub struct Ledger {
    engine: Arc<dyn ComputationEngine>,
    authz: AuthorizationRegistry,
    gate: PauseGate,
    records: RecordStore,
    history: HistoryLedger,
}

/// Persisted state needed to rebuild a ledger, e.g. at backend boot.
pub struct LedgerSnapshot {
    pub owner: Identity,
    pub paused: bool,
    pub verifiers: Vec<Identity>,
    pub records: Vec<(Identity, VerificationRecord)>,
    pub history: Vec<HistoryEntry>,
    pub total_submissions: u64,
}

impl Ledger {
    pub fn new(owner: Identity, engine: Arc<dyn ComputationEngine>) -> Self {
        Self {
            engine,
            authz: AuthorizationRegistry::new(owner),
            gate: PauseGate::new(),
            records: RecordStore::new(),
            history: HistoryLedger::new(),
        }
    }

    pub fn restore(snapshot: LedgerSnapshot, engine: Arc<dyn ComputationEngine>) -> Self {
        let mut gate = PauseGate::new();
        gate.set(snapshot.paused);

        Self {
            engine,
            authz: AuthorizationRegistry::restore(snapshot.owner, snapshot.verifiers),
            gate,
            records: RecordStore::restore(snapshot.records),
            history: HistoryLedger::restore(snapshot.history, snapshot.total_submissions),
        }
    }

    // --- authorization registry -------------------------------------------

    pub fn owner(&self) -> Identity {
        self.authz.owner()
    }

    pub fn is_owner(&self, id: Identity) -> bool {
        self.authz.is_owner(id)
    }

    pub fn is_verifier(&self, id: Identity) -> bool {
        self.authz.is_verifier(id)
    }

    pub fn verifiers(&self) -> impl Iterator<Item = Identity> + '_ {
        self.authz.verifiers()
    }

    pub fn grant_verifier(
        &mut self,
        caller: Identity,
        target: Identity,
    ) -> Result<Notification, LedgerError> {
        self.authz.grant(caller, target)?;
        Ok(Notification::VerifierAdded { identity: target })
    }

    pub fn revoke_verifier(
        &mut self,
        caller: Identity,
        target: Identity,
    ) -> Result<Notification, LedgerError> {
        self.authz.revoke(caller, target)?;
        Ok(Notification::VerifierRemoved { identity: target })
    }

    // --- pause gate --------------------------------------------------------

    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    pub fn pause(&mut self, caller: Identity) -> Result<(), LedgerError> {
        if !self.authz.is_owner(caller) {
            return Err(LedgerError::Unauthorized);
        }
        self.gate.set(true);
        Ok(())
    }

    pub fn unpause(&mut self, caller: Identity) -> Result<(), LedgerError> {
        if !self.authz.is_owner(caller) {
            return Err(LedgerError::Unauthorized);
        }
        self.gate.set(false);
        Ok(())
    }

    // --- verification record store ----------------------------------------

    /// Register an encrypted age for `caller`. One-shot per identity until
    /// an owner reset. The adult flag is derived before any state is
    /// written, so an engine failure creates no record and bumps no counter.
    pub fn submit(
        &mut self,
        caller: Identity,
        encrypted_age: CiphertextHandle,
    ) -> Result<Notification, LedgerError> {
        self.gate.ensure_open()?;
        if self.records.get(caller).is_some() {
            return Err(LedgerError::AlreadyVerified);
        }

        let is_adult = predicates::derive_adult_flag(self.engine.as_ref(), &encrypted_age)?;
        let now = Utc::now();

        self.records.insert_submitted(
            caller,
            VerificationRecord {
                encrypted_age,
                is_adult,
                submitted_at: now,
                completed: false,
            },
        )?;
        self.history.record_submission();

        Ok(Notification::AgeSubmitted {
            identity: caller,
            timestamp: now,
        })
    }

    /// Owner-issued reset: erase `target`'s record back to the absent state
    /// so it may resubmit. Already-appended history entries are untouched.
    pub fn reset(&mut self, caller: Identity, target: Identity) -> Result<(), LedgerError> {
        self.gate.ensure_open()?;
        if !self.authz.is_owner(caller) {
            return Err(LedgerError::Unauthorized);
        }
        self.records.remove(target);
        Ok(())
    }

    pub fn status(&self, target: Identity) -> RecordStatus {
        self.records.status(target)
    }

    /// The caller's own encrypted adult flag. Never discloses another
    /// identity's handle, nor whether another identity has a record at all.
    pub fn result_handle(
        &self,
        caller: Identity,
        target: Identity,
    ) -> Result<CiphertextHandle, LedgerError> {
        if caller != target {
            return Err(LedgerError::Unauthorized);
        }
        let record = self.records.get(caller).ok_or(LedgerError::NotSubmitted)?;
        Ok(record.is_adult.clone())
    }

    pub fn record(&self, id: Identity) -> Option<&VerificationRecord> {
        self.records.get(id)
    }

    // --- predicate engine --------------------------------------------------

    /// Encrypted `(age >= min) AND (age <= max)` over the caller's record.
    pub fn verify_range(
        &self,
        caller: Identity,
        min_age: u8,
        max_age: u8,
    ) -> Result<CiphertextHandle, LedgerError> {
        self.gate.ensure_open()?;
        let record = self.records.get(caller).ok_or(LedgerError::NotSubmitted)?;
        predicates::derive_range_flag(self.engine.as_ref(), &record.encrypted_age, min_age, max_age)
    }

    /// Encrypted `caller_age > other_age`. Both parties need a submitted
    /// record; neither age is revealed.
    pub fn compare(
        &self,
        caller: Identity,
        other: Identity,
    ) -> Result<CiphertextHandle, LedgerError> {
        self.gate.ensure_open()?;
        let caller_record = self.records.get(caller).ok_or(LedgerError::NotSubmitted)?;
        let other_record = self.records.get(other).ok_or(LedgerError::NotSubmitted)?;
        predicates::derive_older_flag(
            self.engine.as_ref(),
            &caller_record.encrypted_age,
            &other_record.encrypted_age,
        )
    }

    // --- history & statistics ----------------------------------------------

    /// Verifier-attested completion: the sole path by which a cleartext
    /// adult/minor determination enters the durable history.
    pub fn complete_verification(
        &mut self,
        caller: Identity,
        target: Identity,
        is_adult: bool,
    ) -> Result<Notification, LedgerError> {
        self.gate.ensure_open()?;
        if !self.authz.is_verifier(caller) {
            return Err(LedgerError::Unauthorized);
        }

        self.records.complete(target)?;

        let now = Utc::now();
        self.history.append(HistoryEntry {
            subject: target,
            is_adult,
            timestamp: now,
            success: true,
        });

        Ok(Notification::VerificationCompleted {
            identity: target,
            is_adult,
            timestamp: now,
        })
    }

    /// `(known, is_adult)`: the most recently attested outcome for `target`,
    /// valid only while `target`'s current record is completed.
    pub fn is_user_adult(&self, target: Identity) -> (bool, bool) {
        let completed = self
            .records
            .get(target)
            .map(|r| r.completed)
            .unwrap_or(false);
        if !completed {
            return (false, false);
        }

        match self.history.latest_for(target) {
            Some(entry) => (true, entry.is_adult),
            None => (false, false),
        }
    }

    /// Verifier-only paginated read of the append-only history.
    pub fn history_page(
        &self,
        caller: Identity,
        start: usize,
        count: usize,
    ) -> Result<&[HistoryEntry], LedgerError> {
        if !self.authz.is_verifier(caller) {
            return Err(LedgerError::Unauthorized);
        }
        self.history.page(start, count)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn stats(&self) -> Stats {
        self.history.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhe_engine::local::LocalEngine;

    fn id(b: u8) -> Identity {
        Identity::from_bytes([b; 20])
    }

    struct Fixture {
        engine: Arc<LocalEngine>,
        ledger: Ledger,
        owner: Identity,
    }

    impl Fixture {
        fn new() -> Self {
            let engine = Arc::new(LocalEngine::new());
            let owner = id(1);
            let ledger = Ledger::new(owner, engine.clone());
            Self {
                engine,
                ledger,
                owner,
            }
        }

        fn submit_age(&mut self, who: Identity, age: u8) {
            let handle = self.engine.encode(age).unwrap();
            self.ledger.submit(who, handle).unwrap();
        }
    }

    #[test]
    fn submit_complete_lifecycle() {
        // Scenario A: submit, then verifier-attested completion.
        let mut fx = Fixture::new();
        let u1 = id(10);

        fx.submit_age(u1, 25);

        let status = fx.ledger.status(u1);
        assert!(status.submitted);
        assert!(!status.completed);
        assert!(status.submitted_at > 0);

        let note = fx.ledger.complete_verification(fx.owner, u1, true).unwrap();
        assert!(matches!(
            note,
            Notification::VerificationCompleted { is_adult: true, .. }
        ));

        let status = fx.ledger.status(u1);
        assert!(status.submitted);
        assert!(status.completed);

        assert_eq!(fx.ledger.is_user_adult(u1), (true, true));

        let stats = fx.ledger.stats();
        assert_eq!(
            (stats.total_submissions, stats.completed, stats.pending),
            (1, 1, 0)
        );
    }

    #[test]
    fn second_submission_fails_without_side_effects() {
        // Scenario B.
        let mut fx = Fixture::new();
        let u2 = id(20);

        fx.submit_age(u2, 30);
        let again = fx.engine.encode(31).unwrap();
        assert!(matches!(
            fx.ledger.submit(u2, again),
            Err(LedgerError::AlreadyVerified)
        ));
        assert_eq!(fx.ledger.stats().total_submissions, 1);
    }

    #[test]
    fn non_owner_cannot_grant_verifier() {
        // Scenario C.
        let mut fx = Fixture::new();
        assert!(matches!(
            fx.ledger.grant_verifier(id(5), id(6)),
            Err(LedgerError::Unauthorized)
        ));
        assert!(!fx.ledger.is_verifier(id(6)));
    }

    #[test]
    fn pause_blocks_mutations_but_not_reads() {
        // Scenario D.
        let mut fx = Fixture::new();
        let user = id(30);

        assert!(matches!(
            fx.ledger.pause(user),
            Err(LedgerError::Unauthorized)
        ));

        fx.ledger.pause(fx.owner).unwrap();
        assert!(fx.ledger.is_paused());

        let handle = fx.engine.encode(40).unwrap();
        assert!(matches!(
            fx.ledger.submit(user, handle.clone()),
            Err(LedgerError::SystemPaused)
        ));
        assert!(matches!(
            fx.ledger.verify_range(user, 18, 65),
            Err(LedgerError::SystemPaused)
        ));
        assert!(matches!(
            fx.ledger.complete_verification(fx.owner, user, true),
            Err(LedgerError::SystemPaused)
        ));

        // Reads are never blocked.
        assert_eq!(fx.ledger.stats().total_submissions, 0);
        assert!(!fx.ledger.status(user).submitted);

        fx.ledger.unpause(fx.owner).unwrap();
        fx.ledger.submit(user, handle).unwrap();
        assert_eq!(fx.ledger.stats().total_submissions, 1);
    }

    #[test]
    fn history_page_start_past_end_is_invalid() {
        // Scenario E.
        let mut fx = Fixture::new();
        let user = id(40);
        fx.submit_age(user, 50);
        fx.ledger.complete_verification(fx.owner, user, true).unwrap();

        let len = fx.ledger.history_len();
        assert!(matches!(
            fx.ledger.history_page(fx.owner, len, 1),
            Err(LedgerError::InvalidStart { .. })
        ));
    }

    #[test]
    fn compare_requires_both_records() {
        // Scenario F.
        let mut fx = Fixture::new();
        let alice = id(50);
        let bob = id(51);

        fx.submit_age(alice, 33);
        assert!(matches!(
            fx.ledger.compare(alice, bob),
            Err(LedgerError::NotSubmitted)
        ));

        fx.submit_age(bob, 28);
        let flag = fx.ledger.compare(alice, bob).unwrap();
        assert_eq!(fx.engine.reveal(&flag).unwrap(), 1);

        let flag = fx.ledger.compare(bob, alice).unwrap();
        assert_eq!(fx.engine.reveal(&flag).unwrap(), 0);
    }

    #[test]
    fn adult_flag_is_derived_at_submission() {
        let mut fx = Fixture::new();
        let minor = id(60);
        let adult = id(61);

        fx.submit_age(minor, 17);
        fx.submit_age(adult, 18);

        let minor_flag = fx.ledger.result_handle(minor, minor).unwrap();
        let adult_flag = fx.ledger.result_handle(adult, adult).unwrap();
        assert_eq!(fx.engine.reveal(&minor_flag).unwrap(), 0);
        assert_eq!(fx.engine.reveal(&adult_flag).unwrap(), 1);
    }

    #[test]
    fn result_handle_never_discloses_foreign_records() {
        let mut fx = Fixture::new();
        let alice = id(70);
        let mallory = id(71);
        fx.submit_age(alice, 44);

        // Foreign target fails closed even before record existence is known.
        assert!(matches!(
            fx.ledger.result_handle(mallory, alice),
            Err(LedgerError::Unauthorized)
        ));
        assert!(matches!(
            fx.ledger.result_handle(mallory, id(72)),
            Err(LedgerError::Unauthorized)
        ));
        assert!(matches!(
            fx.ledger.result_handle(mallory, mallory),
            Err(LedgerError::NotSubmitted)
        ));
    }

    #[test]
    fn verify_range_requires_submission() {
        let fx = Fixture::new();
        assert!(matches!(
            fx.ledger.verify_range(id(80), 18, 65),
            Err(LedgerError::NotSubmitted)
        ));
    }

    #[test]
    fn granted_verifier_can_complete_until_revoked() {
        let mut fx = Fixture::new();
        let verifier = id(90);
        let u1 = id(91);
        let u2 = id(92);

        fx.submit_age(u1, 21);
        fx.submit_age(u2, 22);

        assert!(matches!(
            fx.ledger.complete_verification(verifier, u1, true),
            Err(LedgerError::Unauthorized)
        ));

        let note = fx.ledger.grant_verifier(fx.owner, verifier).unwrap();
        assert!(matches!(note, Notification::VerifierAdded { .. }));
        fx.ledger.complete_verification(verifier, u1, true).unwrap();

        fx.ledger.revoke_verifier(fx.owner, verifier).unwrap();
        assert!(matches!(
            fx.ledger.complete_verification(verifier, u2, true),
            Err(LedgerError::Unauthorized)
        ));
    }

    #[test]
    fn completion_is_one_shot_per_record() {
        let mut fx = Fixture::new();
        let user = id(100);
        fx.submit_age(user, 19);

        fx.ledger.complete_verification(fx.owner, user, true).unwrap();
        assert!(matches!(
            fx.ledger.complete_verification(fx.owner, user, false),
            Err(LedgerError::AlreadyCompleted)
        ));
        // The failed re-entry appended nothing.
        assert_eq!(fx.ledger.history_len(), 1);
    }

    #[test]
    fn reset_clears_the_record_but_not_history() {
        let mut fx = Fixture::new();
        let user = id(110);

        fx.submit_age(user, 25);
        fx.ledger.complete_verification(fx.owner, user, true).unwrap();

        assert!(matches!(
            fx.ledger.reset(user, user),
            Err(LedgerError::Unauthorized)
        ));

        fx.ledger.reset(fx.owner, user).unwrap();
        assert!(!fx.ledger.status(user).submitted);
        assert_eq!(fx.ledger.history_len(), 1);

        // Record absent: the past attestation is no longer served.
        assert_eq!(fx.ledger.is_user_adult(user), (false, false));
    }

    #[test]
    fn latest_attestation_wins_after_reverification() {
        let mut fx = Fixture::new();
        let user = id(120);

        fx.submit_age(user, 25);
        fx.ledger.complete_verification(fx.owner, user, false).unwrap();
        fx.ledger.reset(fx.owner, user).unwrap();

        fx.submit_age(user, 26);
        fx.ledger.complete_verification(fx.owner, user, true).unwrap();

        assert_eq!(fx.ledger.is_user_adult(user), (true, true));
        assert_eq!(fx.ledger.history_len(), 2);

        let stats = fx.ledger.stats();
        assert_eq!(stats.total_submissions, 2);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.pending, 0);
    }

    #[test]
    fn history_is_ordered_and_verifier_gated() {
        let mut fx = Fixture::new();
        for (i, is_adult) in [(130u8, true), (131, false), (132, true)] {
            let who = id(i);
            fx.submit_age(who, 20 + i - 130);
            fx.ledger.complete_verification(fx.owner, who, is_adult).unwrap();
        }

        assert!(matches!(
            fx.ledger.history_page(id(140), 0, 10),
            Err(LedgerError::Unauthorized)
        ));

        let all = fx.ledger.history_page(fx.owner, 0, fx.ledger.history_len()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].subject, id(130));
        assert_eq!(all[2].subject, id(132));
        assert!(all.iter().all(|e| e.success));

        let page = fx.ledger.history_page(fx.owner, 1, 1).unwrap();
        assert_eq!(page[0].subject, id(131));
    }

    #[test]
    fn engine_failure_leaves_state_untouched() {
        let mut fx = Fixture::new();
        let user = id(150);

        // A handle minted by a different engine instance is uninitialized
        // for the ledger's engine, so submit must fail atomically.
        let foreign_engine = LocalEngine::new();
        let foreign = foreign_engine.encode(30).unwrap();

        assert!(matches!(
            fx.ledger.submit(user, foreign),
            Err(LedgerError::Engine(_))
        ));
        assert!(!fx.ledger.status(user).submitted);
        assert_eq!(fx.ledger.stats().total_submissions, 0);
    }

    #[test]
    fn counters_hold_after_every_operation() {
        let mut fx = Fixture::new();

        for i in 0..5u8 {
            fx.submit_age(id(160 + i), 20 + i);
            let stats = fx.ledger.stats();
            assert_eq!(stats.pending + stats.completed, stats.total_submissions);
        }
        for i in 0..3u8 {
            fx.ledger
                .complete_verification(fx.owner, id(160 + i), true)
                .unwrap();
            let stats = fx.ledger.stats();
            assert_eq!(stats.pending + stats.completed, stats.total_submissions);
        }

        let stats = fx.ledger.stats();
        assert_eq!(stats.total_submissions, 5);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.pending, 2);
    }

    #[test]
    fn restore_roundtrips_through_a_snapshot() {
        let mut fx = Fixture::new();
        let verifier = id(170);
        let user = id(171);

        fx.ledger.grant_verifier(fx.owner, verifier).unwrap();
        fx.submit_age(user, 35);
        fx.ledger.complete_verification(verifier, user, true).unwrap();
        fx.ledger.pause(fx.owner).unwrap();

        let snapshot = LedgerSnapshot {
            owner: fx.ledger.owner(),
            paused: fx.ledger.is_paused(),
            verifiers: fx.ledger.verifiers().collect(),
            records: fx
                .ledger
                .record(user)
                .map(|r| (user, r.clone()))
                .into_iter()
                .collect(),
            history: fx.ledger.history_page(fx.owner, 0, usize::MAX).unwrap().to_vec(),
            total_submissions: fx.ledger.stats().total_submissions,
        };

        let restored = Ledger::restore(snapshot, fx.engine.clone());
        assert!(restored.is_paused());
        assert!(restored.is_verifier(verifier));
        assert!(restored.status(user).completed);
        assert_eq!(restored.is_user_adult(user), (true, true));
        assert_eq!(restored.stats().total_submissions, 1);
    }
}
