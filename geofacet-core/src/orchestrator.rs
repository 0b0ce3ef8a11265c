//! Owner of the current query state.
//!
//! Every external mutation enters `PendingRecompute`. Immediate commands are
//! applied and recomputed synchronously; text edits wait in a debouncer and
//! only the last edit inside the window is applied. A recompute runs the
//! query engine, then the aggregator, then builds taxonomy forests, and
//! hands one consistent [`Update`] to the [`Publisher`].

use crate::aggregation::Aggregations;
use crate::chronology::DateRange;
use crate::debounce::{Debouncer, TimerHandle};
use crate::engine::Engine;
use crate::models::Item;
use crate::state::{Command, QueryState};
use crate::taxonomy::TaxonomyForest;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    PendingRecompute,
}

/// Everything a rendering collaborator needs after a recompute
#[derive(Debug, Serialize)]
pub struct Update<'a> {
    pub state: &'a QueryState,
    pub items: &'a [&'a Item],
    pub aggregations: &'a Aggregations,
    pub taxonomies: &'a BTreeMap<String, TaxonomyForest>,
    pub extents: &'a BTreeMap<String, DateRange>,
}

/// Receives every published update
pub trait Publisher {
    fn publish(&mut self, update: &Update<'_>);
}

impl<F> Publisher for F
where
    F: FnMut(&Update<'_>),
{
    fn publish(&mut self, update: &Update<'_>) {
        self(update)
    }
}

pub struct Orchestrator<P: Publisher> {
    engine: Engine,
    state: QueryState,
    phase: Phase,
    debounce: Duration,
    pending_query: Debouncer<String>,
    query_timer: Option<TimerHandle>,
    publisher: P,
    recomputes: u64,
}

impl<P: Publisher> Orchestrator<P> {
    pub fn new(engine: Engine, publisher: P) -> Self {
        let state = engine.initial_state();
        let debounce = engine.config().debounce();
        Self {
            engine,
            state,
            phase: Phase::Idle,
            debounce,
            pending_query: Debouncer::new(),
            query_timer: None,
            publisher,
            recomputes: 0,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn into_publisher(self) -> P {
        self.publisher
    }

    /// Number of recomputes published so far
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    /// When the pending text edit will fire, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_query.deadline()
    }

    /// Publish the current state without mutating it (initial render)
    pub fn refresh(&mut self) {
        self.phase = Phase::PendingRecompute;
        self.recompute();
    }

    /// Route one command
    ///
    /// Returns true when a recompute was published. Text edits return false:
    /// they are scheduled and published later by `poll` or `flush`.
    pub fn dispatch(&mut self, command: Command, now: Instant) -> bool {
        if let Command::SetQuery { text } = command {
            if let Some(handle) = self.query_timer.take() {
                self.pending_query.cancel(handle);
            }
            self.query_timer = Some(self.pending_query.schedule(now, self.debounce, text));
            self.phase = Phase::PendingRecompute;
            return false;
        }

        match self.state.apply(&command, self.engine.config()) {
            Some(next) => {
                self.state = next;
                self.phase = Phase::PendingRecompute;
                self.recompute();
                true
            }
            None => {
                debug!(?command, "command left state unchanged");
                false
            }
        }
    }

    /// Apply a debounced text edit once its window has elapsed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending_query.fire_due(now) {
            Some(text) => {
                self.apply_query(text);
                true
            }
            None => false,
        }
    }

    /// Apply a pending text edit immediately
    pub fn flush(&mut self) -> bool {
        match self.pending_query.flush() {
            Some(text) => {
                self.apply_query(text);
                true
            }
            None => false,
        }
    }

    fn apply_query(&mut self, text: String) {
        self.query_timer = None;
        if let Some(next) = self.state.apply(&Command::SetQuery { text }, self.engine.config()) {
            self.state = next;
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        let result = self.engine.evaluate(&self.state);
        let taxonomies = self.engine.taxonomies(&result.aggregations);
        let extents = self.engine.extents(&result.aggregations);

        self.publisher.publish(&Update {
            state: &self.state,
            items: &result.items,
            aggregations: &result.aggregations,
            taxonomies: &taxonomies,
            extents: &extents,
        });
        self.recomputes += 1;

        self.phase = if self.pending_query.is_pending() {
            Phase::PendingRecompute
        } else {
            Phase::Idle
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use serde_json::json;

    /// Owned copy of the parts of an update the tests look at
    #[derive(Debug, Default)]
    struct Recorded {
        updates: Vec<(String, Vec<String>, usize)>,
    }

    impl Publisher for Recorded {
        fn publish(&mut self, update: &Update<'_>) {
            let ids = update.items.iter().map(|i| i.id.clone()).collect();
            let region_nodes = update.taxonomies.get("region").map_or(0, |f| f.len());
            self.updates.push((update.state.query.clone(), ids, region_nodes));
        }
    }

    fn engine() -> Engine {
        let config: EngineConfig = serde_json::from_value(json!({
            "searchConfig": {"defaultSort": "title_asc", "debounceTime": 250},
            "aggregations": {
                "mainSpace": {"title": "Main space"},
                "region": {"title": "Region", "type": "taxonomy"}
            }
        }))
        .unwrap();
        let items = [
            json!({"id": "a", "title": "Fresco", "mainSpace": "Wall", "region": "Alps > Mont Blanc"}),
            json!({"id": "b", "title": "Frieze", "mainSpace": "Cave", "region": "Alps"}),
            json!({"id": "c", "title": "Mosaic", "mainSpace": "Wall", "region": "Dolomites"}),
        ]
        .iter()
        .enumerate()
        .map(|(i, r)| Item::from_record(i, r).unwrap())
        .collect();
        Engine::new(config, items).unwrap()
    }

    fn set_query(text: &str) -> Command {
        Command::SetQuery {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_refresh_publishes_initial_state() {
        let mut orchestrator = Orchestrator::new(engine(), Recorded::default());
        orchestrator.refresh();

        let updates = &orchestrator.publisher().updates;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1, vec!["a", "b", "c"]);
        assert_eq!(updates[0].2, 3);
        assert_eq!(orchestrator.phase(), Phase::Idle);
    }

    #[test]
    fn test_immediate_commands_recompute_synchronously() {
        let mut orchestrator = Orchestrator::new(engine(), Recorded::default());
        let now = Instant::now();

        let published = orchestrator.dispatch(
            Command::SetTermsFilter {
                field: "mainSpace".to_string(),
                values: vec!["Wall".to_string()],
            },
            now,
        );

        assert!(published);
        assert_eq!(orchestrator.phase(), Phase::Idle);
        assert_eq!(orchestrator.publisher().updates[0].1, vec!["a", "c"]);
    }

    #[test]
    fn test_unknown_field_is_ignored() {
        let mut orchestrator = Orchestrator::new(engine(), Recorded::default());
        let before = orchestrator.state().clone();

        let published = orchestrator.dispatch(
            Command::SetTermsFilter {
                field: "nope".to_string(),
                values: vec!["x".to_string()],
            },
            Instant::now(),
        );

        assert!(!published);
        assert_eq!(orchestrator.state(), &before);
        assert_eq!(orchestrator.recomputes(), 0);
    }

    #[test]
    fn test_text_edits_are_debounced_last_write_wins() {
        let mut orchestrator = Orchestrator::new(engine(), Recorded::default());
        let start = Instant::now();

        assert!(!orchestrator.dispatch(set_query("f"), start));
        assert!(!orchestrator.dispatch(set_query("fr"), start + Duration::from_millis(100)));
        assert!(!orchestrator.dispatch(set_query("fri"), start + Duration::from_millis(200)));
        assert_eq!(orchestrator.phase(), Phase::PendingRecompute);

        assert!(!orchestrator.poll(start + Duration::from_millis(400)));
        assert_eq!(
            orchestrator.next_deadline(),
            Some(start + Duration::from_millis(450))
        );

        assert!(orchestrator.poll(start + Duration::from_millis(450)));
        assert_eq!(orchestrator.phase(), Phase::Idle);

        let updates = &orchestrator.publisher().updates;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "fri");
        assert_eq!(updates[0].1, vec!["b"]);
    }

    #[test]
    fn test_facet_change_during_pending_text_still_recomputes() {
        let mut orchestrator = Orchestrator::new(engine(), Recorded::default());
        let start = Instant::now();

        orchestrator.dispatch(set_query("mosaic"), start);
        orchestrator.dispatch(
            Command::SetSort {
                key: "title_desc".to_string(),
            },
            start + Duration::from_millis(10),
        );

        // Sort applied immediately with the old (empty) query
        assert_eq!(orchestrator.phase(), Phase::PendingRecompute);
        assert_eq!(orchestrator.publisher().updates[0].1, vec!["c", "b", "a"]);

        assert!(orchestrator.flush());
        assert_eq!(orchestrator.publisher().updates[1].1, vec!["c"]);
        assert_eq!(orchestrator.phase(), Phase::Idle);
        assert!(!orchestrator.flush());
    }

    #[test]
    fn test_closure_publisher() {
        let mut seen = Vec::new();
        {
            let mut orchestrator =
                Orchestrator::new(engine(), |update: &Update<'_>| seen.push(update.items.len()));
            orchestrator.refresh();
            orchestrator.dispatch(
                Command::SetTaxonomyFilter {
                    field: "region".to_string(),
                    paths: vec!["Alps".to_string()],
                },
                Instant::now(),
            );
        }
        assert_eq!(seen, vec![3, 2]);
    }
}
