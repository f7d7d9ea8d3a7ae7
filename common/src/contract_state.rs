//! The contract state as replicated between peers.
//!
//! Peers exchange the journal of successful mutating invocations rather than
//! raw balances. Every replica re-executes the journal through the same state
//! machine, so agreeing on the journal means agreeing on every digit of every
//! balance.

use crate::error::{ErrorKind, InvocationError};
use crate::field::Field;
use crate::ledger;
use crate::operation::Invocation;
use crate::snapshot::ContractSnapshot;
use crate::store::MemoryStore;
use freenet_scaffold::ComposableState;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Debug)]
pub struct ContractState {
    store: MemoryStore,
    journal: Vec<Invocation>,
}

/// The contract takes no parameters; one deployment is one contract.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Debug)]
pub struct ContractParameters;

#[derive(Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct ContractSummary {
    /// Number of journaled invocations.
    pub applied: u64,
}

impl ContractState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn journal(&self) -> &[Invocation] {
        &self.journal
    }

    /// Runs one invocation. Successful mutating invocations are journaled;
    /// queries and rejected invocations leave the state as it was.
    pub fn apply(&mut self, invocation: &Invocation) -> Result<String, InvocationError> {
        let operation = invocation.operation()?;
        let result = ledger::invoke(&mut self.store, invocation)?;
        if operation.is_mutating() {
            self.journal.push(invocation.clone());
        }
        Ok(result)
    }

    pub fn query(&self, field: Field) -> Result<String, InvocationError> {
        ledger::query(&self.store, field)
    }

    pub fn snapshot(&self) -> Result<ContractSnapshot, ErrorKind> {
        ContractSnapshot::load(&self.store)
    }

    /// Rebuilds a state from scratch by re-executing `journal`.
    pub fn replay(journal: &[Invocation]) -> Result<Self, InvocationError> {
        let mut state = ContractState::new();
        for invocation in journal {
            state.apply(invocation)?;
        }
        Ok(state)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, ciborium::ser::Error<std::io::Error>> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(self, &mut bytes)?;
        Ok(bytes)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, ciborium::de::Error<std::io::Error>> {
        ciborium::de::from_reader(bytes)
    }
}

impl ComposableState for ContractState {
    type ParentState = ContractState;
    type Summary = ContractSummary;
    type Delta = Vec<Invocation>;
    type Parameters = ContractParameters;

    fn verify(
        &self,
        _parent_state: &Self::ParentState,
        _parameters: &Self::Parameters,
    ) -> Result<(), String> {
        let replayed = ContractState::replay(&self.journal)
            .map_err(|e| format!("Journal does not replay: {}", e))?;
        if replayed.store != self.store {
            return Err("Stored entries do not match the journal replay".to_string());
        }
        let snapshot = self.snapshot().map_err(|e| e.to_string())?;
        snapshot
            .audit()
            .map_err(|e| format!("Audit failed: {}", e))
    }

    fn summarize(
        &self,
        _parent_state: &Self::ParentState,
        _parameters: &Self::Parameters,
    ) -> Self::Summary {
        ContractSummary {
            applied: self.journal.len() as u64,
        }
    }

    fn delta(
        &self,
        _parent_state: &Self::ParentState,
        _parameters: &Self::Parameters,
        old_state_summary: &Self::Summary,
    ) -> Option<Self::Delta> {
        let applied = usize::try_from(old_state_summary.applied).ok()?;
        if applied >= self.journal.len() {
            return None;
        }
        Some(self.journal[applied..].to_vec())
    }

    /// All or nothing: if any invocation in the delta is rejected the state is
    /// left untouched.
    fn apply_delta(
        &mut self,
        _parent_state: &Self::ParentState,
        _parameters: &Self::Parameters,
        delta: &Option<Self::Delta>,
    ) -> Result<(), String> {
        let Some(invocations) = delta else {
            return Ok(());
        };
        let mut next = self.clone();
        for (index, invocation) in invocations.iter().enumerate() {
            next.apply(invocation)
                .map_err(|e| format!("Delta entry {} ({}) rejected: {}", index, invocation, e))?;
        }
        debug!(applied = invocations.len(), "delta applied");
        *self = next;
        Ok(())
    }

    /// Journals must agree on their common prefix; the longer one wins.
    fn merge(
        &mut self,
        parent_state: &Self::ParentState,
        parameters: &Self::Parameters,
        other_state: &Self,
    ) -> Result<(), String> {
        let ours = self.journal.len();
        let theirs = other_state.journal.len();
        let common = ours.min(theirs);
        if self.journal[..common] != other_state.journal[..common] {
            return Err(format!(
                "Journals diverge within their first {} invocations",
                common
            ));
        }
        if theirs <= ours {
            return Ok(());
        }
        let suffix = Some(other_state.journal[ours..].to_vec());
        self.apply_delta(parent_state, parameters, &suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_state() -> ContractState {
        let mut state = ContractState::new();
        state
            .apply(&Invocation::initialize(["10", "100", "5", "50", "8", "80"]))
            .unwrap();
        state
    }

    #[test]
    fn test_apply_journals_only_mutations() {
        let mut state = scenario_state();
        state.apply(&Invocation::query_field("payment_1")).unwrap();
        assert!(state.apply(&Invocation::deliver_first_period("9")).is_err());
        state.apply(&Invocation::deliver_first_period("10")).unwrap();

        assert_eq!(state.journal().len(), 2);
        assert_eq!(state.journal()[1], Invocation::deliver_first_period("10"));
        assert_eq!(state.query(Field::SupplierBalance).unwrap(), "100");
    }

    #[test]
    fn test_verify_accepts_honest_state() {
        let mut state = scenario_state();
        state.apply(&Invocation::record_signal("1")).unwrap();
        state.apply(&Invocation::deliver_first_period("10")).unwrap();
        state.apply(&Invocation::realize_second_period()).unwrap();
        assert!(state.verify(&state, &ContractParameters).is_ok());
        assert!(ContractState::new().verify(&ContractState::new(), &ContractParameters).is_ok());
    }

    #[test]
    fn test_verify_rejects_entries_not_backed_by_journal() {
        let mut state = scenario_state();
        let mut forged = MemoryStore::new();
        ledger::invoke(
            &mut forged,
            &Invocation::initialize(["10", "100", "5", "50", "8", "800"]),
        )
        .unwrap();
        state.store = forged;
        let err = state.verify(&state, &ContractParameters).unwrap_err();
        assert!(err.contains("do not match"), "{err}");
    }

    #[test]
    fn test_verify_rejects_unreplayable_journal() {
        let mut state = scenario_state();
        state.journal.push(Invocation::deliver_first_period("11"));
        let err = state.verify(&state, &ContractParameters).unwrap_err();
        assert!(err.contains("does not replay"), "{err}");
    }

    #[test]
    fn test_delta_brings_replica_up_to_date() {
        let mut leader = scenario_state();
        let mut follower = leader.clone();
        leader.apply(&Invocation::deliver_first_period("10")).unwrap();
        leader.apply(&Invocation::record_signal("0")).unwrap();

        let summary = follower.summarize(&follower, &ContractParameters);
        assert_eq!(summary.applied, 1);
        let delta = leader.delta(&leader, &ContractParameters, &summary);
        assert_eq!(delta.as_ref().map(Vec::len), Some(2));

        follower
            .apply_delta(&follower.clone(), &ContractParameters, &delta)
            .unwrap();
        assert_eq!(follower, leader);

        let summary = follower.summarize(&follower, &ContractParameters);
        assert_eq!(leader.delta(&leader, &ContractParameters, &summary), None);
    }

    #[test]
    fn test_rejected_delta_leaves_state_untouched() {
        let mut state = scenario_state();
        let before = state.clone();
        let delta = Some(vec![
            Invocation::deliver_first_period("10"),
            Invocation::deliver_first_period("10"),
        ]);
        let err = state
            .apply_delta(&state.clone(), &ContractParameters, &delta)
            .unwrap_err();
        assert!(err.contains("Delta entry 1"), "{err}");
        assert_eq!(state, before);
    }

    #[test]
    fn test_merge_takes_longer_journal() {
        let mut behind = scenario_state();
        let mut ahead = behind.clone();
        ahead.apply(&Invocation::record_signal("1")).unwrap();

        behind.merge(&behind.clone(), &ContractParameters, &ahead).unwrap();
        assert_eq!(behind, ahead);

        // merging an older state is a no-op
        let older = scenario_state();
        ahead.merge(&ahead.clone(), &ContractParameters, &older).unwrap();
        assert_eq!(ahead.journal().len(), 2);
    }

    #[test]
    fn test_merge_rejects_divergent_journals() {
        let mut zero = scenario_state();
        let mut one = scenario_state();
        zero.apply(&Invocation::record_signal("0")).unwrap();
        one.apply(&Invocation::record_signal("1")).unwrap();

        let before = zero.clone();
        assert!(zero.merge(&zero.clone(), &ContractParameters, &one).is_err());
        assert_eq!(zero, before);
    }

    #[test]
    fn test_cbor_round_trip_preserves_state() {
        let mut state = scenario_state();
        state.apply(&Invocation::deliver_first_period("10")).unwrap();
        let bytes = state.to_cbor().unwrap();
        let decoded = ContractState::from_cbor(&bytes).unwrap();
        assert_eq!(decoded, state);
        assert_eq!(
            decoded.snapshot().unwrap().supplier_balance.map(|a| a.to_string()),
            Some("100".to_string())
        );
    }

    #[test]
    fn test_unsupported_invocation_is_not_journaled() {
        let mut state = scenario_state();
        let err = state.apply(&Invocation::new("refund", ["5"])).unwrap_err();
        assert_eq!(err.kind(), None::<&ErrorKind>);
        assert_eq!(state.journal().len(), 1);
    }
}
