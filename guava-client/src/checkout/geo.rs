//! Best-effort geolocation address autofill.
//!
//! Autofill can fail for several distinguishable reasons; each carries
//! actionable guidance for the user. A failure never blocks checkout:
//! the manual address field stays available on every path.

use async_trait::async_trait;
use thiserror::Error;

/// Why the address lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("location request timed out")]
    Timeout,

    #[error("location lookup failed: {0}")]
    Unknown(String),
}

impl GeoError {
    /// Guidance shown next to the manual address field.
    pub fn guidance(&self) -> &'static str {
        match self {
            GeoError::PermissionDenied => {
                "Location access was denied. Allow it in your browser settings or type the address."
            }
            GeoError::PositionUnavailable => {
                "Your position could not be determined. Please type the address."
            }
            GeoError::Timeout => "Locating you took too long. Please type the address.",
            GeoError::Unknown(_) => "Address lookup failed. Please type the address.",
        }
    }
}

/// A device position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Platform seam for the position + reverse-geocoding services.
#[async_trait]
pub trait AddressProvider: Send + Sync {
    async fn locate(&self) -> Result<GeoPoint, GeoError>;
    async fn reverse_geocode(&self, point: GeoPoint) -> Result<String, GeoError>;
}

/// Try to prefill the delivery address. The caller treats the error as
/// display-only; manual entry must remain possible either way.
pub async fn autofill_address(provider: &dyn AddressProvider) -> Result<String, GeoError> {
    let point = provider.locate().await?;
    tracing::debug!(
        latitude = point.latitude,
        longitude = point.longitude,
        "Position acquired, reverse-geocoding"
    );
    provider.reverse_geocode(point).await
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubProvider {
        locate: Result<GeoPoint, GeoError>,
        address: Result<String, GeoError>,
    }

    #[async_trait]
    impl AddressProvider for StubProvider {
        async fn locate(&self) -> Result<GeoPoint, GeoError> {
            self.locate.clone()
        }

        async fn reverse_geocode(&self, _point: GeoPoint) -> Result<String, GeoError> {
            self.address.clone()
        }
    }

    #[tokio::test]
    async fn autofill_returns_resolved_address() {
        let provider = StubProvider {
            locate: Ok(GeoPoint {
                latitude: 19.43,
                longitude: -99.13,
            }),
            address: Ok("12 Palm Street".to_string()),
        };
        assert_eq!(
            autofill_address(&provider).await.unwrap(),
            "12 Palm Street"
        );
    }

    #[tokio::test]
    async fn failure_reasons_stay_distinguishable() {
        let provider = StubProvider {
            locate: Err(GeoError::PermissionDenied),
            address: Ok(String::new()),
        };
        let err = autofill_address(&provider).await.unwrap_err();
        assert_eq!(err, GeoError::PermissionDenied);
        assert!(err.guidance().contains("denied"));

        let provider = StubProvider {
            locate: Ok(GeoPoint {
                latitude: 0.0,
                longitude: 0.0,
            }),
            address: Err(GeoError::Timeout),
        };
        assert_eq!(
            autofill_address(&provider).await.unwrap_err(),
            GeoError::Timeout
        );
    }
}
