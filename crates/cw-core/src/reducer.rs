use crate::types::execution::{DtmfEntry, ExecutionState};
use cw_events::types::{EventKind, EventRecord};

// Single left-to-right fold over events in storage order. Sequence numbers
// are the ordering key; occurred_at is source-supplied and may collide or
// regress, so it only ever feeds the monotonic created_at/last_activity
// bookkeeping.
pub fn reduce(execution_id: &str, events: Vec<EventRecord>) -> ExecutionState {
    let mut state = ExecutionState::empty(execution_id);

    for event in events {
        if state.created_at.is_none() {
            state.created_at = Some(event.occurred_at);
        }
        if state.last_activity.is_none_or(|last| event.occurred_at > last) {
            state.last_activity = Some(event.occurred_at);
        }

        if state.call_id.is_none() {
            state.call_id = event.call_id.clone();
        }
        if state.to_number.is_none() {
            state.to_number = event.to_number.clone();
        }
        if state.from_number.is_none() {
            state.from_number = event.from_number.clone();
        }

        match event.kind {
            EventKind::Status => {
                if let Some(status) = &event.status {
                    state.status = Some(status.clone());
                }
            }
            EventKind::Dtmf => {
                state.dtmf_actions.push(DtmfEntry {
                    digits: event.digits.clone().unwrap_or_default(),
                    action: event.action,
                    occurred_at: event.occurred_at,
                });
            }
            EventKind::Flow => {}
        }

        state.events.push(event);
    }

    state
}
