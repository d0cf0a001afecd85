//! "Use my location".
//!
//! Reads the device position once, then asks a [`ReverseGeocoder`] for a
//! label. Reverse geocoding is best effort: if it fails the place is still
//! returned, labelled [`CURRENT_LOCATION_LABEL`].

use std::future::Future;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use alertx_geo_models::Coordinate;
use alertx_geocoder::ReverseGeocoder;
use thiserror::Error;

/// Label used when reverse geocoding yields nothing.
pub const CURRENT_LOCATION_LABEL: &str = "Current Location";

/// Popup text on the marker placed at the device position.
pub const CURRENT_LOCATION_POPUP: &str = "Your Current Location";

/// Failure reported by a [`PositionSource`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("User denied the request for Geolocation.")]
    PermissionDenied,
    #[error("Location information is unavailable.")]
    PositionUnavailable,
    #[error("The request to get user location timed out.")]
    Timeout,
}

/// Errors from [`Geolocator::request_current_location`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocateError {
    /// The host has no position capability at all.
    #[error("Geolocation is not supported by your browser")]
    Unavailable,

    /// A request is already in flight.
    #[error("Already locating")]
    AlreadyInProgress,

    /// The position source refused or failed.
    #[error("Unable to retrieve your location: {0}")]
    Position(#[from] PositionError),
}

/// One-shot device position reader.
#[async_trait::async_trait]
pub trait PositionSource: Send + Sync {
    /// Reads the current position.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError`] if permission is denied or no fix is
    /// available.
    async fn current_position(&self) -> Result<Coordinate, PositionError>;
}

/// A fixed position, for hosts where the user types their location.
pub struct FixedPosition(pub Coordinate);

#[async_trait::async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        Ok(self.0)
    }
}

/// The device position and its label.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedPlace {
    pub label: String,
    pub coordinate: Coordinate,
}

pub struct Geolocator {
    source: Option<Arc<dyn PositionSource>>,
    reverse: Arc<dyn ReverseGeocoder>,
    loading: Arc<AtomicBool>,
}

/// Holds the loading flag for the lifetime of one request.
struct LoadingGuard(Arc<AtomicBool>);

impl LoadingGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Geolocator {
    /// `source` is `None` on hosts with no position capability.
    #[must_use]
    pub fn new(source: Option<Arc<dyn PositionSource>>, reverse: Arc<dyn ReverseGeocoder>) -> Self {
        Self {
            source,
            reverse,
            loading: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.source.is_some()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Starts a location request.
    ///
    /// Capability and overlap are checked up front, so the loading flag is
    /// set before this returns. The flag clears when the returned future
    /// completes or is dropped.
    ///
    /// # Errors
    ///
    /// * [`GeolocateError::Unavailable`] if there is no position source
    /// * [`GeolocateError::AlreadyInProgress`] if a request is running
    ///
    /// The future itself fails with [`GeolocateError::Position`] if the
    /// source refuses.
    pub fn request_current_location(
        &self,
    ) -> Result<impl Future<Output = Result<LocatedPlace, GeolocateError>> + Send + 'static, GeolocateError>
    {
        let source = self.source.clone().ok_or(GeolocateError::Unavailable)?;
        let guard = LoadingGuard::acquire(&self.loading).ok_or(GeolocateError::AlreadyInProgress)?;
        let reverse = Arc::clone(&self.reverse);

        Ok(async move {
            let result = locate(source.as_ref(), reverse.as_ref()).await;
            drop(guard);
            result
        })
    }
}

async fn locate(
    source: &dyn PositionSource,
    reverse: &dyn ReverseGeocoder,
) -> Result<LocatedPlace, GeolocateError> {
    let coordinate = source.current_position().await?;

    let label = match reverse.reverse(coordinate).await {
        Ok(Some(label)) if !label.trim().is_empty() => label,
        Ok(_) => CURRENT_LOCATION_LABEL.to_string(),
        Err(e) => {
            log::warn!("Reverse geocoding {coordinate} failed: {e}");
            CURRENT_LOCATION_LABEL.to_string()
        }
    };

    Ok(LocatedPlace { label, coordinate })
}
