//! Router plugin protocol
//!
//! A [`Router`] computes a route between two [`Location`]s and delivers the
//! outcome through a single-shot callback: exactly one invocation per call,
//! carrying either a populated [`PathData`] or a [`RouterError`]. Backends may
//! complete synchronously (a local algorithm) or from a background task (a
//! remote HTTP service); callers must not assume either. There is no
//! cancellation: a started request runs to completion or failure.
//!
//! [`calculate`] adapts the callback contract to a future.

mod direct;
mod error;
mod google;
pub mod http;
mod query;
mod registry;
pub mod remote;
mod yandex;

pub use direct::{DirectRouter, SpeedClass};
pub use error::RouterError;
pub use google::GoogleRouter;
pub use http::{HttpTransport, ReqwestTransport, TransportError};
pub use query::{Location, RouterQuery};
pub use registry::RouterRegistry;
pub use yandex::YandexRouter;

use crate::store::OptionStore;
use crate::{GeoPoint, PathData};
use tokio::sync::oneshot;

pub type RouteResult = Result<PathData, RouterError>;

/// Completion callback of [`Router::calculate_route`]
pub type RouteCallback = Box<dyn FnOnce(RouteResult) + Send + 'static>;

/// Completion callback of [`Router::geocode`]
pub type GeocodeCallback = Box<dyn FnOnce(Result<GeoPoint, RouterError>) + Send + 'static>;

/// A routing backend
pub trait Router: Send + Sync {
    /// Static identifier, also used to namespace persisted options
    fn name(&self) -> &'static str;

    /// Calculate a route and invoke `callback` exactly once with the outcome.
    ///
    /// The callback may run before this method returns or later from another
    /// thread. Option state is captured when the call is made.
    fn calculate_route(&self, query: RouterQuery, callback: RouteCallback);

    /// Resolve an address to a position by routing from it to itself and
    /// taking the first point of the result.
    fn geocode(&self, address: &str, callback: GeocodeCallback) {
        let location = Location::from_address(address);
        let query = RouterQuery::new(location.clone(), location);
        self.calculate_route(
            query,
            Box::new(move |result| {
                callback(result.and_then(|path| {
                    path.first()
                        .map(|point| point.geo)
                        .ok_or_else(|| RouterError::InvalidAddress("address not found".into()))
                }))
            }),
        );
    }

    /// Whether the backend has user-configurable options
    fn has_options(&self) -> bool {
        false
    }

    /// Read persisted options. Never called while a calculation is in flight.
    fn load_options(&mut self, _store: &dyn OptionStore) -> Result<(), RouterError> {
        Ok(())
    }

    /// Persist the current options
    fn save_options(&self, _store: &dyn OptionStore) -> Result<(), RouterError> {
        Ok(())
    }
}

/// Run [`Router::calculate_route`] and await its callback
pub async fn calculate(router: &dyn Router, query: RouterQuery) -> RouteResult {
    let (sender, receiver) = oneshot::channel();
    router.calculate_route(
        query,
        Box::new(move |result| {
            let _ = sender.send(result);
        }),
    );
    receiver.await.unwrap_or_else(|_| {
        Err(RouterError::Generic(format!(
            "{} dropped its completion callback",
            router.name()
        )))
    })
}

/// Run [`Router::geocode`] and await its callback
pub async fn geocode(router: &dyn Router, address: &str) -> Result<GeoPoint, RouterError> {
    let (sender, receiver) = oneshot::channel();
    router.geocode(
        address,
        Box::new(move |result| {
            let _ = sender.send(result);
        }),
    );
    receiver.await.unwrap_or_else(|_| {
        Err(RouterError::Generic(format!(
            "{} dropped its completion callback",
            router.name()
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PathPoint;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Completes synchronously with a fixed outcome
    struct Fixed(RouteResult);

    impl Router for Fixed {
        fn name(&self) -> &'static str {
            "Fixed"
        }

        fn calculate_route(&self, _query: RouterQuery, callback: RouteCallback) {
            callback(self.0.clone());
        }
    }

    /// Breaks the contract by never calling back
    struct Silent;

    impl Router for Silent {
        fn name(&self) -> &'static str {
            "Silent"
        }

        fn calculate_route(&self, _query: RouterQuery, _callback: RouteCallback) {}
    }

    fn query() -> RouterQuery {
        RouterQuery::new(Location::from_address("A"), Location::from_address("B"))
    }

    #[tokio::test]
    async fn test_calculate_awaits_callback() {
        let mut path = PathData::new();
        path.append_point(PathPoint::new(GeoPoint::new(1.0, 2.0)));
        let router = Fixed(Ok(path.clone()));
        assert_eq!(calculate(&router, query()).await, Ok(path));
    }

    #[tokio::test]
    async fn test_dropped_callback_is_an_error() {
        assert!(matches!(
            calculate(&Silent, query()).await,
            Err(RouterError::Generic(_))
        ));
    }

    #[tokio::test]
    async fn test_default_geocode_takes_first_point() {
        let mut path = PathData::new();
        path.append_point(PathPoint::new(GeoPoint::new(60.2, 24.9)));
        path.append_point(PathPoint::new(GeoPoint::new(61.0, 25.0)));
        let found = geocode(&Fixed(Ok(path)), "Helsinki").await;
        assert_eq!(found, Ok(GeoPoint::new(60.2, 24.9)));

        let empty = geocode(&Fixed(Ok(PathData::new())), "Atlantis").await;
        assert!(matches!(empty, Err(RouterError::InvalidAddress(_))));

        let failed = geocode(&Fixed(Err(RouterError::Network("down".into()))), "x").await;
        assert_eq!(failed, Err(RouterError::Network("down".into())));
    }

    #[test]
    fn test_callback_runs_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        Fixed(Err(RouterError::UserCanceled)).calculate_route(
            query(),
            Box::new(move |result| {
                assert_eq!(result, Err(RouterError::UserCanceled));
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_options_are_noops() {
        let store = crate::MemoryStore::new();
        let mut router = Silent;
        assert!(!router.has_options());
        router.load_options(&store).unwrap();
        router.save_options(&store).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }
}
