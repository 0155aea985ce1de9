//! One-shot geolocation
//!
//! [`GeolocationProvider`] asks a [`LocationSource`] for a single position
//! and publishes the outcome. It never polls; callers that want a fresher fix
//! call [`GeolocationProvider::retry`], which bypasses cached positions.

use crate::error::LocationError;
use async_trait::async_trait;
use fourmore_core::config::GeolocationSettings;
use fourmore_core::sequence::RequestSequence;
use fourmore_geo::Coordinate;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Parameters of one position request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the source may return
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self::from_settings(&GeolocationSettings::default())
    }
}

impl PositionOptions {
    pub fn from_settings(settings: &GeolocationSettings) -> Self {
        Self {
            high_accuracy: settings.high_accuracy,
            timeout: Duration::from_secs(settings.timeout_secs),
            maximum_age: Duration::from_secs(settings.maximum_age_secs),
        }
    }

    /// Same request, but refusing cached fixes
    pub fn uncached(self) -> Self {
        Self {
            maximum_age: Duration::ZERO,
            ..self
        }
    }
}

/// Platform positioning
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_position(&self, options: PositionOptions) -> Result<Coordinate, LocationError>;
}

/// Always reports the same position
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationSource {
    position: Coordinate,
}

impl FixedLocationSource {
    pub fn new(position: Coordinate) -> Self {
        Self { position }
    }
}

#[async_trait]
impl LocationSource for FixedLocationSource {
    async fn current_position(&self, _options: PositionOptions) -> Result<Coordinate, LocationError> {
        if self.position.is_valid() {
            Ok(self.position)
        } else {
            Err(LocationError::PositionUnavailable)
        }
    }
}

/// For hosts with no positioning at all
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedLocationSource;

#[async_trait]
impl LocationSource for UnsupportedLocationSource {
    async fn current_position(&self, _options: PositionOptions) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// Published location state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocationState {
    /// Last successful fix; kept when a later request fails
    pub location: Option<Coordinate>,
    pub error: Option<LocationError>,
    pub loading: bool,
}

impl LocationState {
    pub fn error_message(&self) -> Option<&'static str> {
        self.error.as_ref().map(LocationError::user_message)
    }
}

#[derive(Debug)]
pub struct GeolocationProvider<S> {
    source: S,
    options: PositionOptions,
    sequence: RequestSequence,
    state: watch::Sender<LocationState>,
}

impl<S: LocationSource> GeolocationProvider<S> {
    pub fn new(source: S, options: PositionOptions) -> Self {
        let (state, _) = watch::channel(LocationState::default());
        Self {
            source,
            options,
            sequence: RequestSequence::new(),
            state,
        }
    }

    pub fn state(&self) -> LocationState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LocationState> {
        self.state.subscribe()
    }

    /// Initial request; a recently cached fix is acceptable
    pub async fn locate(&self) -> Result<Coordinate, LocationError> {
        self.request(self.options).await
    }

    /// Ask again, refusing cached fixes
    pub async fn retry(&self) -> Result<Coordinate, LocationError> {
        self.request(self.options.uncached()).await
    }

    async fn request(&self, options: PositionOptions) -> Result<Coordinate, LocationError> {
        let ticket = self.sequence.issue();
        self.state.send_modify(|s| s.loading = true);
        debug!(?options, "Requesting position");

        let result = match tokio::time::timeout(options.timeout, self.source.current_position(options)).await {
            Ok(result) => result,
            Err(_) => Err(LocationError::Timeout),
        };

        if !self.sequence.is_current(ticket) {
            debug!("Superseded position request finished");
            return result;
        }

        match result {
            Ok(location) => {
                info!(lat = location.latitude, lon = location.longitude, "Position acquired");
                self.state.send_modify(|s| {
                    s.location = Some(location);
                    s.error = None;
                    s.loading = false;
                });
            }
            Err(error) => {
                warn!(%error, "Position request failed");
                self.state.send_modify(|s| {
                    s.error = Some(error);
                    s.loading = false;
                });
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Answers from a script and records the options it was asked with
    #[derive(Debug)]
    struct ScriptedSource {
        answers: Mutex<Vec<(Duration, Result<Coordinate, LocationError>)>>,
        seen: Mutex<Vec<PositionOptions>>,
    }

    impl ScriptedSource {
        fn new(answers: Vec<(Duration, Result<Coordinate, LocationError>)>) -> Self {
            Self {
                answers: Mutex::new(answers),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LocationSource for ScriptedSource {
        async fn current_position(&self, options: PositionOptions) -> Result<Coordinate, LocationError> {
            self.seen.lock().unwrap().push(options);
            let (delay, answer) = self.answers.lock().unwrap().remove(0);
            tokio::time::sleep(delay).await;
            answer
        }
    }

    const HOME: Coordinate = Coordinate {
        latitude: 40.0,
        longitude: -74.0,
    };

    #[test]
    fn test_default_options() {
        let options = PositionOptions::default();
        assert!(options.high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.maximum_age, Duration::from_secs(300));
        assert_eq!(options.uncached().maximum_age, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_locate_publishes_position() {
        let provider = GeolocationProvider::new(FixedLocationSource::new(HOME), PositionOptions::default());
        assert_eq!(provider.locate().await, Ok(HOME));

        let state = provider.state();
        assert_eq!(state.location, Some(HOME));
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_unsupported_source() {
        let provider = GeolocationProvider::new(UnsupportedLocationSource, PositionOptions::default());
        assert_eq!(provider.locate().await, Err(LocationError::Unsupported));
        assert_eq!(
            provider.state().error_message(),
            Some(LocationError::Unsupported.user_message())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_times_out() {
        let source = ScriptedSource::new(vec![(Duration::from_secs(30), Ok(HOME))]);
        let provider = GeolocationProvider::new(source, PositionOptions::default());

        assert_eq!(provider.locate().await, Err(LocationError::Timeout));
        assert!(!provider.state().loading);
    }

    #[tokio::test]
    async fn test_retry_bypasses_cache_and_keeps_last_fix_on_failure() {
        let source = ScriptedSource::new(vec![
            (Duration::ZERO, Ok(HOME)),
            (Duration::ZERO, Err(LocationError::PositionUnavailable)),
        ]);
        let provider = GeolocationProvider::new(source, PositionOptions::default());

        provider.locate().await.unwrap();
        assert_eq!(provider.retry().await, Err(LocationError::PositionUnavailable));

        let seen = provider.source.seen.lock().unwrap().clone();
        assert_eq!(seen[0].maximum_age, Duration::from_secs(300));
        assert_eq!(seen[1].maximum_age, Duration::ZERO);

        let state = provider.state();
        assert_eq!(state.location, Some(HOME));
        assert_eq!(state.error, Some(LocationError::PositionUnavailable));
    }

    #[tokio::test]
    async fn test_permission_denied_is_not_retried() {
        let source = ScriptedSource::new(vec![(Duration::ZERO, Err(LocationError::PermissionDenied))]);
        let provider = GeolocationProvider::new(source, PositionOptions::default());

        assert_eq!(provider.locate().await, Err(LocationError::PermissionDenied));
        assert_eq!(provider.source.seen.lock().unwrap().len(), 1);
    }
}
