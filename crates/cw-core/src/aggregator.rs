use crate::error::CallwatchError;
use crate::events::EventRepository;
use crate::reducer::reduce;
use crate::store::Store;
use crate::types::execution::{ExecutionState, ExecutionSummary};
use crate::types::io::{Page, WindowQuery};
use crate::types::stats::WindowCounts;
use cw_events::bus::EventBus;
use cw_events::normalize::normalize;
use cw_events::types::{EventRecord, EventSource};
use serde_json::Value;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub source: EventSource,
    pub correlation_id: Option<String>,
}

impl RequestContext {
    pub fn new(source: EventSource, correlation_id: Option<String>) -> Self {
        Self {
            source,
            correlation_id,
        }
    }
}

pub struct Aggregator<S: Store> {
    store: S,
    event_bus: EventBus,
}

impl<S: Store> Aggregator<S> {
    pub fn new(store: S, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    pub fn events(&self) -> EventsApi<'_, S> {
        EventsApi { core: self }
    }

    pub fn executions(&self) -> ExecutionsApi<'_, S> {
        ExecutionsApi { core: self }
    }

    pub fn stats(&self) -> StatsApi<'_, S> {
        StatsApi { core: self }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

pub struct EventsApi<'a, S: Store> {
    core: &'a Aggregator<S>,
}

impl<'a, S: Store> EventsApi<'a, S> {
    pub fn ingest(
        &self,
        ctx: &RequestContext,
        raw: Value,
    ) -> Result<EventRecord, CallwatchError> {
        let mut event = normalize(raw)?;
        event.source = ctx.source;
        event.correlation_id = ctx.correlation_id.clone();

        let record = self.core.store.with_tx(|store| {
            store
                .events()
                .append(event.clone())
                .map_err(CallwatchError::from)
        })?;
        let _ = self.core.event_bus.publish(record.clone());
        Ok(record)
    }

    pub fn list(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, CallwatchError> {
        self.core
            .store
            .events()
            .list(after, limit)
            .map_err(CallwatchError::from)
    }
}

pub struct ExecutionsApi<'a, S: Store> {
    core: &'a Aggregator<S>,
}

impl<'a, S: Store> ExecutionsApi<'a, S> {
    // An execution with zero stored events reduces to an empty state; the
    // caller cannot distinguish it from one that never happened, and must
    // not treat either as an error.
    pub fn get(&self, execution_id: &str) -> Result<ExecutionState, CallwatchError> {
        let events = self.core.store.events().list_by_execution(execution_id)?;
        Ok(reduce(execution_id, events))
    }

    pub fn list(
        &self,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Page<ExecutionSummary>, CallwatchError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        let offset = offset.unwrap_or(0);

        let repo = self.core.store.events();
        let (ids, total) = repo.list_executions(limit, offset)?;
        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            let events = repo.list_by_execution(&id)?;
            items.push(reduce(&id, events).summary());
        }
        Ok(Page::new(items, total, limit, offset))
    }
}

pub struct StatsApi<'a, S: Store> {
    core: &'a Aggregator<S>,
}

impl<'a, S: Store> StatsApi<'a, S> {
    pub fn window(&self, window: WindowQuery) -> Result<WindowCounts, CallwatchError> {
        self.core
            .store
            .events()
            .counts_for(window)
            .map_err(CallwatchError::from)
    }
}
