use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::AbortHandle;

use crate::models::{CoreError, CoreErrorKind, Location, Place, PriceTierSet};
use crate::providers::{NearbySearchRequest, NearbySearchResponse, PlacesProvider, ProviderResult};

pub type SessionResult<T> = Result<T, CoreError>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SessionState {
    Idle,
    InFlight,
    Cancelled,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SearchPurpose {
    Interactive,
    Preload,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionTicket {
    pub generation: u64,
    pub location: Location,
    pub tiers: PriceTierSet,
    pub purpose: SearchPurpose,
}

/// Completion racing for a session: the provider reply and the timeout timer.
#[derive(Debug)]
pub enum SessionSignal {
    ProviderReplied {
        generation: u64,
        result: ProviderResult<NearbySearchResponse>,
    },
    TimerElapsed {
        generation: u64,
    },
}

impl SessionSignal {
    pub fn generation(&self) -> u64 {
        match self {
            Self::ProviderReplied { generation, .. } | Self::TimerElapsed { generation } => {
                *generation
            }
        }
    }
}

/// How a started session ended, when it was not discarded.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionOutcome {
    pub ticket: SessionTicket,
    pub result: SessionResult<Vec<Place>>,
}

/// Single-flight provider query with a timeout and cooperative cancellation.
///
/// Signals are delivered through an internal channel and only acted on in
/// [`SearchSession::resolve`], which checks them against the current
/// generation and state. Each `start` therefore ends in exactly one of: a
/// returned outcome, or a silent discard after `cancel`.
pub struct SearchSession {
    timeout: Duration,
    radius_meters: u32,
    category: String,
    state: SessionState,
    next_generation: u64,
    active: Option<SessionTicket>,
    timer: Option<AbortHandle>,
    signals_tx: UnboundedSender<SessionSignal>,
    signals_rx: UnboundedReceiver<SessionSignal>,
}

impl SearchSession {
    pub fn new(timeout: Duration, radius_meters: u32, category: impl Into<String>) -> Self {
        let (signals_tx, signals_rx) = unbounded_channel();
        Self {
            timeout,
            radius_meters,
            category: category.into(),
            state: SessionState::Idle,
            next_generation: 1,
            active: None,
            timer: None,
            signals_tx,
            signals_rx,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn active(&self) -> Option<&SessionTicket> {
        self.active.as_ref()
    }

    /// Issues the provider query and arms the timeout. Must be called from
    /// within a tokio runtime.
    pub fn start(
        &mut self,
        provider: &Arc<dyn PlacesProvider>,
        location: Location,
        tiers: PriceTierSet,
        purpose: SearchPurpose,
    ) -> SessionResult<SessionTicket> {
        if self.state == SessionState::InFlight {
            let generation = self.active.as_ref().map(|ticket| ticket.generation);
            return Err(CoreError::new(
                CoreErrorKind::SearchInFlight,
                format!("search session {generation:?} is still in flight"),
            ));
        }

        let generation = self.next_generation;
        self.next_generation = self.next_generation.saturating_add(1);

        let request = NearbySearchRequest {
            location,
            radius_meters: self.radius_meters,
            category: self.category.clone(),
        };
        tracing::info!(
            generation,
            purpose = ?purpose,
            lat = location.lat,
            lng = location.lng,
            radius = request.radius_meters,
            tiers = %tiers,
            "starting nearby search"
        );

        let reply = provider.nearby_search(request);
        let signals = self.signals_tx.clone();
        tokio::spawn(async move {
            let result = reply.await;
            let _ = signals.send(SessionSignal::ProviderReplied { generation, result });
        });

        let signals = self.signals_tx.clone();
        let timeout = self.timeout;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = signals.send(SessionSignal::TimerElapsed { generation });
        });
        self.timer = Some(timer.abort_handle());

        let ticket = SessionTicket {
            generation,
            location,
            tiers,
            purpose,
        };
        self.active = Some(ticket.clone());
        self.state = SessionState::InFlight;

        Ok(ticket)
    }

    /// Marks the in-flight session so its reply is dropped on arrival.
    /// Returns false when there was nothing in flight.
    pub fn cancel(&mut self) -> bool {
        if self.state != SessionState::InFlight {
            return false;
        }

        self.clear_timer();
        self.state = SessionState::Cancelled;
        if let Some(ticket) = &self.active {
            tracing::info!(generation = ticket.generation, "search session cancelled");
        }
        true
    }

    pub async fn next_signal(&mut self) -> Option<SessionSignal> {
        self.signals_rx.recv().await
    }

    pub fn try_next_signal(&mut self) -> Option<SessionSignal> {
        self.signals_rx.try_recv().ok()
    }

    pub fn resolve(&mut self, signal: SessionSignal) -> Option<SessionOutcome> {
        let generation = signal.generation();
        let current = self.active.as_ref().map(|ticket| ticket.generation);
        if current != Some(generation) {
            tracing::debug!(
                generation,
                current = ?current,
                "discarding signal for a finished session"
            );
            return None;
        }

        match (self.state, signal) {
            (SessionState::InFlight, SessionSignal::ProviderReplied { result, .. }) => {
                self.clear_timer();
                let ticket = self.finish()?;
                let result = filter_reply(result, &ticket.tiers);
                match &result {
                    Ok(places) => tracing::info!(
                        generation,
                        count = places.len(),
                        "nearby search completed"
                    ),
                    Err(error) => tracing::warn!(
                        generation,
                        kind = ?error.kind,
                        message = %error.message,
                        "nearby search failed"
                    ),
                }
                Some(SessionOutcome { ticket, result })
            }
            (SessionState::InFlight, SessionSignal::TimerElapsed { .. }) => {
                self.timer = None;
                let ticket = self.finish()?;
                tracing::warn!(
                    generation,
                    timeout_secs = self.timeout.as_secs(),
                    "nearby search timed out"
                );
                Some(SessionOutcome {
                    ticket,
                    result: Err(CoreError::new(
                        CoreErrorKind::Timeout,
                        format!("no provider reply within {:?}", self.timeout),
                    )),
                })
            }
            (SessionState::Cancelled, SessionSignal::ProviderReplied { .. }) => {
                self.finish();
                tracing::debug!(generation, "discarding reply for cancelled session");
                None
            }
            (state, _) => {
                tracing::debug!(generation, state = ?state, "ignoring signal");
                None
            }
        }
    }

    fn finish(&mut self) -> Option<SessionTicket> {
        self.state = SessionState::Idle;
        self.active.take()
    }

    fn clear_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.clear_timer();
    }
}

/// Keeps the places whose tier is accepted; unpriced places count as tier 0.
pub fn filter_by_tiers(places: Vec<Place>, tiers: &PriceTierSet) -> Vec<Place> {
    places
        .into_iter()
        .filter(|place| {
            let accepted = tiers.accepts(place.price_tier);
            if !accepted {
                tracing::debug!(
                    place = %place.name,
                    tier = ?place.price_tier,
                    "filtered out by price tier"
                );
            }
            accepted
        })
        .collect()
}

fn filter_reply(
    result: ProviderResult<NearbySearchResponse>,
    tiers: &PriceTierSet,
) -> SessionResult<Vec<Place>> {
    let response = result.map_err(provider_failure)?;
    if let Some(error) = response.status.into_error() {
        return Err(error);
    }

    let received = response.places.len();
    let filtered = filter_by_tiers(response.places, tiers);
    if filtered.is_empty() {
        return Err(CoreError::new(
            CoreErrorKind::NoMatch,
            format!("none of {received} places matched tiers {tiers}"),
        ));
    }
    Ok(filtered)
}

fn provider_failure(error: CoreError) -> CoreError {
    match error.kind {
        CoreErrorKind::ProviderZeroResults
        | CoreErrorKind::ProviderQuotaExceeded
        | CoreErrorKind::ProviderRequestDenied
        | CoreErrorKind::ProviderMalformedRequest
        | CoreErrorKind::ProviderUnknown => error,
        _ => CoreError::new(CoreErrorKind::ProviderUnknown, error.message),
    }
}

#[cfg(test)]
mod tests {
    use super::{filter_by_tiers, filter_reply};
    use crate::models::{CoreError, CoreErrorKind, Location, Place, PriceTier, PriceTierSet};
    use crate::providers::{NearbySearchResponse, ProviderStatus};

    fn tiers(levels: &[u8]) -> PriceTierSet {
        levels
            .iter()
            .map(|level| PriceTier::new(*level).unwrap())
            .collect()
    }

    fn place(id: &str, tier: Option<u8>) -> Place {
        Place {
            id: id.to_string(),
            name: format!("Diner {id}"),
            price_tier: tier.map(|level| PriceTier::new(level).unwrap()),
            rating: Some(4.0),
            rating_count: Some(10),
            location: Location::new(25.0331, 121.5655),
        }
    }

    #[test]
    fn places_outside_selected_tiers_are_excluded() {
        let filtered = filter_by_tiers(
            vec![place("a", Some(1)), place("b", Some(3)), place("c", Some(2))],
            &tiers(&[1, 2]),
        );
        let ids: Vec<_> = filtered.iter().map(|place| place.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn unpriced_place_is_included_when_lowest_tier_selected() {
        let filtered = filter_by_tiers(vec![place("a", None)], &tiers(&[0]));
        assert_eq!(filtered.len(), 1);

        let filtered = filter_by_tiers(vec![place("a", None)], &tiers(&[1]));
        assert!(filtered.is_empty());
    }

    #[test]
    fn empty_filter_result_is_no_match_not_a_provider_error() {
        let error = filter_reply(
            Ok(NearbySearchResponse::ok(vec![place("a", Some(4))])),
            &tiers(&[0, 1]),
        )
        .unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::NoMatch);
    }

    #[test]
    fn provider_status_is_mapped_before_filtering() {
        let error = filter_reply(
            Ok(NearbySearchResponse::failed(ProviderStatus::OverQueryLimit)),
            &tiers(&[1]),
        )
        .unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::ProviderQuotaExceeded);
    }

    #[test]
    fn transport_failure_becomes_provider_unknown() {
        let error = filter_reply(
            Err(CoreError::new(CoreErrorKind::Internal, "connection reset")),
            &tiers(&[1]),
        )
        .unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::ProviderUnknown);
        assert_eq!(error.message, "connection reset");
    }
}
