use crate::rack::InstrumentRack;
use bingen_ports::instrument::{
    Instrument, InstrumentError, InstrumentLoaderPort, InstrumentName, LoadCancellation,
};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub type LoadOutcome = Result<(), InstrumentError>;

#[derive(Default)]
struct TicketState {
    outcome: Mutex<Option<LoadOutcome>>,
    done: Condvar,
}

/// Completion handle returned by `set_instrument`.
#[derive(Clone)]
pub struct LoadTicket {
    name: InstrumentName,
    state: Arc<TicketState>,
}

impl LoadTicket {
    fn pending(name: InstrumentName) -> Self {
        Self {
            name,
            state: Arc::new(TicketState::default()),
        }
    }

    pub(crate) fn ready(name: InstrumentName, outcome: LoadOutcome) -> Self {
        let ticket = Self::pending(name);
        ticket.resolve(outcome);
        ticket
    }

    fn resolve(&self, outcome: LoadOutcome) {
        let mut slot = self.state.outcome.lock();
        if slot.is_none() {
            *slot = Some(outcome);
            self.state.done.notify_all();
        }
    }

    pub fn instrument(&self) -> InstrumentName {
        self.name
    }

    pub fn is_done(&self) -> bool {
        self.state.outcome.lock().is_some()
    }

    /// Blocks until the load finishes, fails or is superseded.
    pub fn wait(&self) -> LoadOutcome {
        let mut slot = self.state.outcome.lock();
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            self.state.done.wait(&mut slot);
        }
    }

    /// Like [`LoadTicket::wait`], giving up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<LoadOutcome> {
        let mut slot = self.state.outcome.lock();
        if slot.is_none() {
            self.state.done.wait_for(&mut slot, timeout);
        }
        slot.clone()
    }
}

struct InFlight {
    name: InstrumentName,
    generation: u64,
    cancel: LoadCancellation,
    ticket: LoadTicket,
}

#[derive(Default)]
struct LoadState {
    generation: u64,
    in_flight: Option<InFlight>,
    last_error: Option<InstrumentError>,
}

/// Background instrument loading with a per-name cache. A newer request cancels
/// the one in flight; a superseded result is dropped, never activated.
pub struct InstrumentLoads {
    loader: Arc<dyn InstrumentLoaderPort>,
    rack: Arc<InstrumentRack>,
    cache: Mutex<HashMap<InstrumentName, Arc<dyn Instrument>>>,
    state: Mutex<LoadState>,
}

impl InstrumentLoads {
    pub fn new(loader: Arc<dyn InstrumentLoaderPort>, rack: Arc<InstrumentRack>) -> Self {
        Self {
            loader,
            rack,
            cache: Mutex::new(HashMap::new()),
            state: Mutex::new(LoadState::default()),
        }
    }

    pub fn loading(&self) -> Option<InstrumentName> {
        self.state.lock().in_flight.as_ref().map(|load| load.name)
    }

    pub fn is_loading(&self) -> bool {
        self.loading().is_some()
    }

    pub fn last_error(&self) -> Option<InstrumentError> {
        self.state.lock().last_error.clone()
    }

    /// Starts making `name` the active instrument. `None` means it already is.
    pub fn request(self: &Arc<Self>, name: InstrumentName) -> Option<LoadTicket> {
        let mut state = self.state.lock();

        if let Some(load) = state.in_flight.as_ref() {
            if load.name == name {
                return Some(load.ticket.clone());
            }
        } else if self.rack.active_name() == Some(name) {
            return None;
        }

        if let Some(previous) = state.in_flight.take() {
            tracing::debug!(superseded = %previous.name, by = %name, "cancelling instrument load");
            previous.cancel.cancel();
            previous.ticket.resolve(Err(InstrumentError::Cancelled));
        }
        state.generation += 1;

        let cached = self.cache.lock().get(&name).cloned();
        if let Some(instrument) = cached {
            tracing::debug!(instrument = %name, "activating cached instrument");
            self.rack.set_active(name, instrument);
            state.last_error = None;
            return Some(LoadTicket::ready(name, Ok(())));
        }

        let generation = state.generation;
        let cancel = LoadCancellation::new();
        let ticket = LoadTicket::pending(name);
        state.in_flight = Some(InFlight {
            name,
            generation,
            cancel: cancel.clone(),
            ticket: ticket.clone(),
        });
        drop(state);

        tracing::info!(instrument = %name, "loading instrument");
        let loads = Arc::clone(self);
        let spawned = std::thread::Builder::new()
            .name(format!("load-{name}"))
            .spawn(move || {
                let result = loads.loader.load(name, &cancel);
                loads.finish(name, generation, &cancel, result);
            });
        if let Err(e) = spawned {
            let error = InstrumentError::Backend(e.to_string());
            tracing::error!(instrument = %name, error = %error, "failed to start instrument load");
            let mut state = self.state.lock();
            if state
                .in_flight
                .as_ref()
                .map_or(false, |load| load.generation == generation)
            {
                state.in_flight = None;
            }
            state.last_error = Some(error.clone());
            ticket.resolve(Err(error));
        }

        Some(ticket)
    }

    fn finish(
        &self,
        name: InstrumentName,
        generation: u64,
        cancel: &LoadCancellation,
        result: Result<Arc<dyn Instrument>, InstrumentError>,
    ) {
        let mut state = self.state.lock();
        let current = state
            .in_flight
            .as_ref()
            .map_or(false, |load| load.generation == generation);
        if !current || cancel.is_cancelled() {
            tracing::debug!(instrument = %name, "dropping superseded instrument load");
            return;
        }
        let Some(load) = state.in_flight.take() else {
            return;
        };

        match result {
            Ok(instrument) => {
                self.cache.lock().insert(name, instrument.clone());
                self.rack.set_active(name, instrument);
                state.last_error = None;
                tracing::info!(instrument = %name, "instrument ready");
                load.ticket.resolve(Ok(()));
            }
            Err(error) => {
                tracing::error!(instrument = %name, error = %error, "instrument load failed");
                state.last_error = Some(error.clone());
                load.ticket.resolve(Err(error));
            }
        }
    }
}
