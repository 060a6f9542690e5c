//! Optional snapshot format for time-travel debugging and session persistence.
//!
//! This is explicitly NOT part of the W3C algorithm: the interpreter never reads or writes a
//! snapshot on its own. It is a contract a host (a debugger UI, a crash-recovery layer) can use
//! to freeze a session and later restore it. A snapshot captures:
//! - the active configuration (state names)
//! - the recorded history values
//! - a key/value dump of the document's declared \<data\> items
//! - the pending internal queue (name + serialized data)
//! - a step counter and the last executed transition, for diagnostics
//!
//! The external queue is intentionally not captured: it is backed by an mpsc channel (see
//! [crate::fsm::BlockingQueue]) that can only be drained, never peeked, so a host that needs to
//! preserve in-flight external events must intercept them at the I/O processor boundary before
//! they reach the channel.
//!
//! Restoring a snapshot bypasses entry/exit actions entirely ([restore_active_states]): no
//! \<onentry\> content runs and no invokes are (re-)deferred. Invokes are restored separately
//! via [restore_invokes], which re-spawns a fresh child session for each recorded invoke whose
//! `src` can still be resolved, again without re-running onentry at any level.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::datamodel::Datamodel;
use crate::fsm::{Event, Fsm, InvokeId, OrderedSet, ParamPair, SessionId};
use crate::fsm_executor::FsmExecutor;
use crate::get_global;

/// A serialized snapshot of a single session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// SCXML ids of the states currently in the configuration.
    pub active_states: Vec<String>,

    /// History-state id -> recorded descendant/child ids, by SCXML id.
    pub history: HashMap<String, Vec<String>>,

    /// Declared \<data\> item id -> its current value, rendered via `Display`.
    pub datamodel: HashMap<String, String>,

    /// Pending internal-queue events, in FIFO order.
    pub internal_queue: Vec<EventSnapshot>,

    /// Number of microsteps executed so far.
    pub step_counter: u64,

    /// SCXML id of the last transition's source/target, if any transition has fired yet.
    pub last_transition: Option<(String, String)>,

    /// Invoke id -> src URI, for every invoke still active when the snapshot was taken.
    /// Empty `src` means the invoke used inline content, which this format cannot re-resolve.
    pub invoke_srcs: HashMap<String, String>,
}

/// A minimal, serializable projection of an [Event].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub name: String,
    pub data: Option<String>,
}

impl From<&Event> for EventSnapshot {
    fn from(e: &Event) -> Self {
        EventSnapshot {
            name: e.name.clone(),
            data: e.content.clone(),
        }
    }
}

/// Collects the ids of every \<data\> item declared anywhere in the document (root and
/// per-state). This is the complete set of keys a snapshot's `datamodel` map can meaningfully
/// hold: the ECMAScript engine itself is opaque, only locations the document declares are
/// guaranteed addressable via `Datamodel::get_by_location`.
fn declared_data_ids(fsm: &Fsm) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for state in &fsm.states {
        ids.extend(state.data.values.keys().cloned());
    }
    ids
}

/// Captures a [Snapshot] of the given session's current state. Does not stop or mutate the
/// session; the caller is responsible for quiescing the interpreter first (e.g. calling this
/// between macrosteps, never from inside a microstep) to get a consistent picture.
pub fn capture(fsm: &Fsm, datamodel: &mut dyn Datamodel) -> Snapshot {
    let mut active_states = Vec::new();
    let mut history = HashMap::new();
    let mut invoke_srcs = HashMap::new();
    let internal_queue: Vec<EventSnapshot>;
    let step_counter;
    let last_transition;

    {
        let gd = get_global!(datamodel);

        for sid in gd.configuration.iterator() {
            active_states.push(fsm.get_state_by_id(*sid).name.clone());
        }

        for (hid, recorded) in gd.historyValue.entries() {
            let names: Vec<String> = recorded
                .iterator()
                .map(|s| fsm.get_state_by_id(*s).name.clone())
                .collect();
            history.insert(fsm.get_state_by_id(hid).name.clone(), names);
        }

        internal_queue = gd
            .internal_queue_snapshot()
            .into_iter()
            .map(EventSnapshot::from)
            .collect();

        step_counter = gd.step_counter;
        last_transition = gd.last_transition.map(|(src, tgt)| {
            (
                fsm.get_state_by_id(src).name.clone(),
                fsm.get_state_by_id(tgt).name.clone(),
            )
        });

        for state in &fsm.states {
            for inv in state.invoke.iterator() {
                if gd.active_invokes.get(&inv.doc_id).is_some() {
                    invoke_srcs.insert(inv.invoke_id.clone(), inv.src.clone());
                }
            }
        }
    }

    let mut dm_values = HashMap::new();
    for id in declared_data_ids(fsm) {
        if let Ok(value) = datamodel.get_by_location(&id) {
            dm_values.insert(id, value.to_string());
        }
    }

    Snapshot {
        active_states,
        history,
        datamodel: dm_values,
        internal_queue,
        step_counter,
        last_transition,
        invoke_srcs,
    }
}

/// Restores the active configuration and history values recorded in `snapshot` directly into
/// `datamodel`'s global data, bypassing [Fsm]'s normal enter-state sequence: no \<onentry\>
/// content runs and no invokes are (re-)deferred (see [restore_invokes] for those).
///
/// Returns the names that could not be resolved against `fsm` (stale ids from a document that
/// has since changed), so the caller can decide whether to abort or proceed best-effort.
pub fn restore_active_states(fsm: &Fsm, datamodel: &mut dyn Datamodel, snapshot: &Snapshot) -> Vec<String> {
    let mut unresolved = Vec::new();
    let mut gd = get_global!(datamodel);

    gd.configuration.clear();
    for name in &snapshot.active_states {
        match fsm.try_get_state_id_by_name(name) {
            Some(sid) => gd.configuration.add(sid),
            None => unresolved.push(name.clone()),
        }
    }

    gd.historyValue.clear();
    for (history_name, recorded_names) in &snapshot.history {
        match fsm.try_get_state_id_by_name(history_name) {
            Some(hid) => {
                let mut set: OrderedSet<u32> = OrderedSet::new();
                for n in recorded_names {
                    match fsm.try_get_state_id_by_name(n) {
                        Some(sid) => set.add(sid),
                        None => unresolved.push(n.clone()),
                    }
                }
                gd.historyValue.put_move(hid, set);
            }
            None => unresolved.push(history_name.clone()),
        }
    }

    gd.step_counter = snapshot.step_counter;
    unresolved
}

/// Re-spawns a child session for each entry in `snapshot.invoke_srcs` whose `src` is non-empty,
/// with no \<onentry\> side effects at any level. Invokes started from inline content (empty
/// `src`) cannot be re-resolved without the original document and are reported as errors rather
/// than silently dropped.
pub fn restore_invokes(
    executor: &mut FsmExecutor,
    parent_session: SessionId,
    snapshot: &Snapshot,
) -> HashMap<InvokeId, Result<crate::fsm::ScxmlSession, String>> {
    let mut results = HashMap::new();
    for (invoke_id, src) in &snapshot.invoke_srcs {
        let outcome = if src.is_empty() {
            Err(format!(
                "invoke '{}' was started from inline content and cannot be restored",
                invoke_id
            ))
        } else {
            let data: Vec<ParamPair> = Vec::new();
            executor.execute_with_data(
                src,
                &data,
                Some(parent_session),
                invoke_id,
                #[cfg(feature = "Trace")]
                crate::tracer::TraceMode::STATES,
            )
        };
        results.insert(invoke_id.clone(), outcome);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_snapshot_carries_name_and_data() {
        let mut e = Event::new_simple("x");
        e.content = Some("payload".to_string());
        let s = EventSnapshot::from(&e);
        assert_eq!(s.name, "x");
        assert_eq!(s.data.as_deref(), Some("payload"));
    }
}
