pub mod observer;

pub use observer::{
    Notice, NoticeKind, SearchObserver, SilentObserver, geolocation_message, user_message,
};

use std::sync::Arc;

use rand::Rng;
use rand::rngs::StdRng;

use crate::cache::ResultCache;
use crate::config::SearchConfig;
use crate::models::{
    CoreError, CoreErrorKind, CoreResult, GeocodedLocation, GeolocationFailure, Location, Place,
    PriceTierSet, normalize_selections,
};
use crate::providers::{GeocodeRequest, Geocoder, PlacesProvider};
use crate::selector::Selector;
use crate::session::{
    SearchPurpose, SearchSession, SessionOutcome, SessionSignal, SessionState, SessionTicket,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ControllerState {
    Idle,
    Searching,
    /// Transient: only observable from inside a cancellation.
    Cancelling,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RequestOutcome {
    /// Picks drawn from a cached result set; no provider call was made.
    Served(Vec<Place>),
    Started(SessionTicket),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ToggleOutcome {
    Cancelled,
    Requested(RequestOutcome),
}

/// What handling one session signal did.
#[derive(Clone, Debug, PartialEq)]
pub enum SignalEffect {
    Presented(Vec<Place>),
    Failed(CoreError),
    Preloaded(usize),
    PreloadFailed(CoreError),
    Discarded,
}

/// Owns the search pipeline: tier normalization, the result cache, the
/// single-flight session, and the selector. Hosts talk to nothing else.
///
/// The controller is driven from a single task. Provider replies and timer
/// expiries queue up inside the session and take effect only when the host
/// feeds them back through [`SearchController::handle_signal`].
pub struct SearchController<R: Rng = StdRng> {
    config: SearchConfig,
    state: ControllerState,
    location: Option<Location>,
    provider: Option<Arc<dyn PlacesProvider>>,
    geocoder: Option<Arc<dyn Geocoder>>,
    cache: ResultCache,
    session: SearchSession,
    selector: Selector<R>,
    observer: Box<dyn SearchObserver>,
    current: Vec<Place>,
    current_tiers: Option<PriceTierSet>,
}

impl SearchController<StdRng> {
    pub fn new(config: SearchConfig, observer: Box<dyn SearchObserver>) -> Self {
        Self::with_selector(config, observer, Selector::from_entropy())
    }
}

impl<R: Rng> SearchController<R> {
    pub fn with_selector(
        config: SearchConfig,
        observer: Box<dyn SearchObserver>,
        selector: Selector<R>,
    ) -> Self {
        let cache = ResultCache::new(config.cache_ttl());
        let session = SearchSession::new(
            config.search_timeout(),
            config.radius_meters,
            config.category.clone(),
        );
        Self {
            config,
            state: ControllerState::Idle,
            location: None,
            provider: None,
            geocoder: None,
            cache,
            session,
            selector,
            observer,
            current: Vec::new(),
            current_tiers: None,
        }
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state != ControllerState::Idle
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn current_results(&self) -> &[Place] {
        &self.current
    }

    pub fn provider_ready(&self) -> bool {
        self.provider.is_some()
    }

    pub fn attach_provider(&mut self, provider: Arc<dyn PlacesProvider>) {
        tracing::info!("places provider attached");
        self.provider = Some(provider);
    }

    /// Geolocation hand-off. A failed fix leaves any known location alone
    /// and asks for manual entry.
    pub fn locate(&mut self, fix: Result<Location, GeolocationFailure>) {
        match fix {
            Ok(location) => {
                tracing::info!(lat = location.lat, lng = location.lng, "location fixed");
                self.location = Some(location);
                let label = format!("{:.4}, {:.4}", location.lat, location.lng);
                self.observer.location_changed(&location, &label);
            }
            Err(failure) => {
                tracing::warn!(failure = ?failure, "geolocation failed");
                self.observer.notice(&Notice {
                    kind: NoticeKind::Failure(CoreErrorKind::NeedsLocation),
                    message: geolocation_message(failure).to_string(),
                    dismiss_after: self.config.notice_dismiss_after(),
                });
            }
        }
    }

    /// Resolves a typed address and moves the search anchor there.
    pub async fn relocate(&mut self, address: &str) -> CoreResult<GeocodedLocation> {
        let address = address.trim();
        if address.is_empty() {
            return Err(self.fail(CoreError::new(
                CoreErrorKind::AddressRequired,
                "manual location is blank",
            )));
        }

        let Some(geocoder) = self.geocoder.clone() else {
            return Err(self.fail(CoreError::new(
                CoreErrorKind::ProviderUnavailable,
                "no geocoder configured",
            )));
        };

        let request = GeocodeRequest {
            address: address.to_string(),
            region: self.config.geocode_region.clone(),
        };
        tracing::info!(address, "geocoding manual location");

        match geocoder.geocode(request).await {
            Ok(found) => {
                self.apply_location_change(found.clone());
                Ok(found)
            }
            Err(error) => {
                tracing::warn!(address, message = %error.message, "geocoding failed");
                Err(self.fail(CoreError::new(CoreErrorKind::GeocodeNotFound, error.message)))
            }
        }
    }

    /// Anchors searches at a new location: clears the cache, drops any
    /// in-flight session without a callback, and returns to idle.
    pub fn apply_location_change(&mut self, found: GeocodedLocation) {
        tracing::info!(
            lat = found.location.lat,
            lng = found.location.lng,
            address = %found.formatted_address,
            "search location changed"
        );
        self.location = Some(found.location);
        self.cache.invalidate();
        self.session.cancel();
        self.clear_results();
        self.set_idle();

        self.observer
            .location_changed(&found.location, &found.formatted_address);
        self.observer.notice(&Notice {
            kind: NoticeKind::LocationUpdated,
            message: "Location updated, search again".to_string(),
            dismiss_after: self.config.notice_dismiss_after(),
        });
    }

    pub fn request<S: AsRef<str>>(&mut self, selections: &[S]) -> CoreResult<RequestOutcome> {
        if self.state != ControllerState::Idle {
            tracing::warn!(state = ?self.state, "request rejected while a search is running");
            return Err(self.fail(CoreError::new(
                CoreErrorKind::SearchInFlight,
                "request() called while searching",
            )));
        }

        let Some(location) = self.location else {
            return Err(self.fail(CoreError::new(
                CoreErrorKind::NeedsLocation,
                "no location available",
            )));
        };

        let Some(provider) = self.provider.clone() else {
            return Err(self.fail(CoreError::new(
                CoreErrorKind::ProviderUnavailable,
                "places provider not attached",
            )));
        };

        let tiers = match normalize_selections(selections) {
            Ok(tiers) => tiers,
            Err(error) => return Err(self.fail(error)),
        };
        if tiers.is_empty() {
            return Err(self.fail(CoreError::new(
                CoreErrorKind::NoFilterSelected,
                "no price tiers selected",
            )));
        }

        if let Some(cached) = self.cache.lookup(&location, &tiers) {
            tracing::info!(count = cached.len(), tiers = %tiers, "serving search from cache");
            self.current = cached.to_vec();
            self.current_tiers = Some(tiers);
            return Ok(RequestOutcome::Served(self.present()));
        }

        if self.session.cancel() {
            tracing::debug!("interactive search supersedes preload");
        }
        self.clear_results();

        let ticket = match self.session.start(
            &provider,
            location,
            tiers,
            SearchPurpose::Interactive,
        ) {
            Ok(ticket) => ticket,
            Err(error) => return Err(self.fail(error)),
        };

        self.state = ControllerState::Searching;
        self.observer.busy_changed(true);
        Ok(RequestOutcome::Started(ticket))
    }

    /// The single button: cancels a running search, otherwise requests.
    pub fn toggle<S: AsRef<str>>(&mut self, selections: &[S]) -> CoreResult<ToggleOutcome> {
        match self.state {
            ControllerState::Searching | ControllerState::Cancelling => {
                self.cancel_search();
                Ok(ToggleOutcome::Cancelled)
            }
            ControllerState::Idle => self.request(selections).map(ToggleOutcome::Requested),
        }
    }

    /// Background fetch that warms the cache. Never toggles busy and never
    /// surfaces errors.
    pub fn preload<S: AsRef<str>>(&mut self, selections: &[S]) -> Option<SessionTicket> {
        if self.state != ControllerState::Idle || self.session.state() == SessionState::InFlight {
            tracing::debug!("skipping preload while a search is in flight");
            return None;
        }
        let location = self.location?;
        let provider = self.provider.clone()?;
        let tiers = match normalize_selections(selections) {
            Ok(tiers) => tiers,
            Err(error) => {
                tracing::warn!(message = %error.message, "skipping preload");
                return None;
            }
        };
        if tiers.is_empty() || self.cache.lookup(&location, &tiers).is_some() {
            return None;
        }

        match self
            .session
            .start(&provider, location, tiers, SearchPurpose::Preload)
        {
            Ok(ticket) => Some(ticket),
            Err(error) => {
                tracing::warn!(message = %error.message, "preload not started");
                None
            }
        }
    }

    /// Records a new price selection. Results fetched under a different tier
    /// set are dropped, so a reroll never draws from deselected tiers.
    pub fn select_tiers<S: AsRef<str>>(&mut self, selections: &[S]) -> CoreResult<PriceTierSet> {
        let tiers = match normalize_selections(selections) {
            Ok(tiers) => tiers,
            Err(error) => return Err(self.fail(error)),
        };
        if self
            .current_tiers
            .as_ref()
            .is_some_and(|current| *current != tiers)
        {
            tracing::info!(tiers = %tiers, "price selection changed, dropping fetched results");
            self.clear_results();
        }
        Ok(tiers)
    }

    pub fn reroll(&mut self) -> CoreResult<Vec<Place>> {
        if self.current.is_empty() {
            return Err(self.fail(CoreError::new(
                CoreErrorKind::NothingToReroll,
                "no fetched results to draw from",
            )));
        }
        Ok(self.present())
    }

    pub async fn next_signal(&mut self) -> Option<SessionSignal> {
        self.session.next_signal().await
    }

    pub async fn process_next_signal(&mut self) -> Option<SignalEffect> {
        let signal = self.session.next_signal().await?;
        Some(self.handle_signal(signal))
    }

    /// Handles every signal that has already arrived, without waiting.
    pub fn process_pending_signals(&mut self) -> Vec<SignalEffect> {
        let mut effects = Vec::new();
        while let Some(signal) = self.session.try_next_signal() {
            effects.push(self.handle_signal(signal));
        }
        effects
    }

    pub fn handle_signal(&mut self, signal: SessionSignal) -> SignalEffect {
        let Some(SessionOutcome { ticket, result }) = self.session.resolve(signal) else {
            return SignalEffect::Discarded;
        };

        match ticket.purpose {
            SearchPurpose::Interactive => {
                self.set_idle();
                match result {
                    Ok(places) => {
                        self.current_tiers = Some(ticket.tiers.clone());
                        self.cache
                            .store(ticket.location, ticket.tiers, places.clone());
                        self.current = places;
                        SignalEffect::Presented(self.present())
                    }
                    Err(error) => SignalEffect::Failed(self.fail(error)),
                }
            }
            SearchPurpose::Preload => match result {
                Ok(places) => {
                    let count = places.len();
                    self.cache.store(ticket.location, ticket.tiers, places);
                    tracing::info!(count, "preload stored");
                    SignalEffect::Preloaded(count)
                }
                Err(error) => {
                    tracing::warn!(
                        kind = ?error.kind,
                        message = %error.message,
                        "preload failed"
                    );
                    SignalEffect::PreloadFailed(error)
                }
            },
        }
    }

    pub fn cached_for<S: AsRef<str>>(&self, selections: &[S]) -> bool {
        let (Some(location), Ok(tiers)) = (self.location, normalize_selections(selections)) else {
            return false;
        };
        self.cache.lookup(&location, &tiers).is_some()
    }

    fn cancel_search(&mut self) {
        self.state = ControllerState::Cancelling;
        self.session.cancel();
        self.set_idle();
        self.notify(&CoreError::new(
            CoreErrorKind::UserCancelled,
            "search cancelled by user",
        ));
    }

    fn present(&mut self) -> Vec<Place> {
        let picks = self.selector.choose(&self.current, self.config.pick_count);
        tracing::info!(
            picked = picks.len(),
            from = self.current.len(),
            "presenting picks"
        );
        self.observer.picks_ready(&picks);
        picks
    }

    fn clear_results(&mut self) {
        self.current.clear();
        self.current_tiers = None;
    }

    fn set_idle(&mut self) {
        if self.state != ControllerState::Idle {
            self.state = ControllerState::Idle;
            self.observer.busy_changed(false);
        }
    }

    fn fail(&mut self, error: CoreError) -> CoreError {
        self.notify(&error);
        error
    }

    fn notify(&mut self, error: &CoreError) {
        tracing::debug!(kind = ?error.kind, message = %error.message, "surfacing failure");
        let notice = observer::failure_notice(error, self.config.notice_dismiss_after());
        self.observer.notice(&notice);
    }
}
