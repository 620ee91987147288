use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tracing::{debug, warn};

use crate::{Suggestion, SuggestionSource, debounce::Debouncer};

pub const MIN_QUERY_CHARS: usize = 2;

/// What the search box renders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub input: String,
    pub suggestions: Vec<Suggestion>,
    pub loading: bool,
    pub show_suggestions: bool,
}

#[derive(Default)]
struct Shared {
    view: Snapshot,
    generation: u64,
}

type State = Arc<Mutex<Shared>>;

fn lock(state: &State) -> MutexGuard<'_, Shared> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SuggestionBox<S> {
    source: Arc<S>,
    state: State,
    debouncer: Debouncer,
}

impl<S: SuggestionSource + 'static> SuggestionBox<S> {
    pub fn new(source: S) -> Self {
        Self::with_debouncer(source, Debouncer::default())
    }

    pub fn with_quiet_period(source: S, quiet_period: Duration) -> Self {
        Self::with_debouncer(source, Debouncer::new(quiet_period))
    }

    fn with_debouncer(source: S, debouncer: Debouncer) -> Self {
        Self {
            source: Arc::new(source),
            state: State::default(),
            debouncer,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        lock(&self.state).view.clone()
    }

    pub fn on_input(&mut self, text: impl Into<String>) {
        let text = text.into();

        let generation = {
            let mut shared = lock(&self.state);
            shared.generation += 1;
            shared.view.input = text.clone();

            if text.trim().chars().count() < MIN_QUERY_CHARS {
                shared.view.suggestions.clear();
                shared.view.loading = false;
                drop(shared);

                self.debouncer.cancel();
                return;
            }

            shared.generation
        };

        let source = self.source.clone();
        let state = self.state.clone();
        self.debouncer.schedule(fetch(source, state, text, generation));
    }

    /// Copies the chosen name into the box and closes the dropdown. Never fetches.
    pub fn select(&mut self, suggestion: &Suggestion) {
        self.debouncer.cancel();

        let mut shared = lock(&self.state);
        shared.generation += 1;
        shared.view.input = suggestion.name.clone();
        shared.view.loading = false;
        shared.view.show_suggestions = false;
    }

    pub fn on_click_outside(&mut self) {
        lock(&self.state).view.show_suggestions = false;
    }

    /// Reopens the dropdown if there is something to show.
    pub fn on_focus(&mut self) {
        let mut shared = lock(&self.state);
        shared.view.show_suggestions = !shared.view.suggestions.is_empty();
    }
}

async fn fetch<S: SuggestionSource>(source: Arc<S>, state: State, query: String, generation: u64) {
    {
        let mut shared = lock(&state);
        if shared.generation != generation {
            return;
        }
        shared.view.loading = true;
    }

    let result = source.suggest(&query).await;

    let mut shared = lock(&state);
    if shared.generation != generation {
        debug!("Dropping stale suggestions for generation {generation}");
        return;
    }

    shared.view.loading = false;
    match result {
        Ok(suggestions) => {
            shared.view.suggestions = suggestions;
            shared.view.show_suggestions = true;
        }
        Err(e) => {
            warn!("Error fetching suggestions: {e}");
            shared.view.suggestions.clear();
        }
    }
}
