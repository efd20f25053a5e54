//! Driving directions through the gnuite.com GPX gateway to Google Maps

use super::http::{HttpTransport, ReqwestTransport};
use super::remote::{escape, spawn_route_request};
use super::{RouteCallback, Router, RouterError, RouterQuery};
use crate::ProjectionHandle;
use crate::store::OptionStore;
use std::sync::Arc;

pub const DEFAULT_URL: &str = "http://www.gnuite.com/cgi-bin/gpx.cgi";
const KEY_AVOID_HIGHWAYS: &str = "routers/google/avoid_highways";

pub struct GoogleRouter<C: HttpTransport = ReqwestTransport> {
    transport: Arc<C>,
    projection: ProjectionHandle,
    base_url: String,
    avoid_highways: bool,
}

impl<C: HttpTransport> GoogleRouter<C> {
    pub fn new(transport: C, projection: ProjectionHandle) -> Self {
        Self {
            transport: Arc::new(transport),
            projection,
            base_url: DEFAULT_URL.to_string(),
            avoid_highways: false,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn avoid_highways(&self) -> bool {
        self.avoid_highways
    }

    pub fn set_avoid_highways(&mut self, avoid: bool) {
        self.avoid_highways = avoid;
    }

    pub fn request_url(&self, query: &RouterQuery) -> String {
        let projection = self.projection.current();
        let mut url = format!(
            "{}?saddr={}&daddr={}",
            self.base_url,
            escape(&query.from.query_text(projection.as_ref())),
            escape(&query.to.query_text(projection.as_ref())),
        );
        if self.avoid_highways {
            url.push_str("&avoid_highways=on");
        }
        url
    }
}

impl<C: HttpTransport> Router for GoogleRouter<C> {
    fn name(&self) -> &'static str {
        "Google"
    }

    fn calculate_route(&self, query: RouterQuery, callback: RouteCallback) {
        spawn_route_request(
            self.name(),
            self.transport.clone(),
            self.request_url(&query),
            callback,
        );
    }

    fn has_options(&self) -> bool {
        true
    }

    fn load_options(&mut self, store: &dyn OptionStore) -> Result<(), RouterError> {
        if let Some(avoid) = store.get_bool(KEY_AVOID_HIGHWAYS)? {
            self.avoid_highways = avoid;
        }
        Ok(())
    }

    fn save_options(&self, store: &dyn OptionStore) -> Result<(), RouterError> {
        store.set_bool(KEY_AVOID_HIGHWAYS, self.avoid_highways)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::http::tests::StubTransport;
    use crate::router::{Location, calculate};
    use crate::{GeoPoint, MemoryStore, WebMercator};

    const ROUTE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.0"><trk><trkseg>
<trkpt lat="60.2" lon="24.9"><desc>Head north</desc></trkpt>
<trkpt lat="60.3" lon="24.95"/>
</trkseg></trk></gpx>"#;

    fn coordinates_query() -> RouterQuery {
        RouterQuery::new(
            Location::from_geo(GeoPoint::new(60.2, 24.9), &WebMercator),
            Location::from_address("Tampere"),
        )
    }

    #[test]
    fn test_request_url() {
        let mut router = GoogleRouter::new(StubTransport::body(ROUTE), ProjectionHandle::default());
        assert_eq!(
            router.request_url(&coordinates_query()),
            "http://www.gnuite.com/cgi-bin/gpx.cgi?saddr=60.200000%2C%2024.900000&daddr=Tampere"
        );

        router.set_avoid_highways(true);
        assert!(router
            .request_url(&coordinates_query())
            .ends_with("&daddr=Tampere&avoid_highways=on"));
    }

    #[test]
    fn test_custom_base_url() {
        let router = GoogleRouter::new(StubTransport::body(ROUTE), ProjectionHandle::default())
            .with_base_url("http://localhost:8080/gpx");
        assert!(router
            .request_url(&coordinates_query())
            .starts_with("http://localhost:8080/gpx?saddr="));
    }

    #[tokio::test]
    async fn test_route_from_response() {
        let router = GoogleRouter::new(StubTransport::body(ROUTE), ProjectionHandle::default());
        let path = calculate(&router, coordinates_query()).await.unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.waypoint_at(0).unwrap().description, "Head north");
    }

    #[tokio::test]
    async fn test_error_page_is_invalid_address() {
        let router = GoogleRouter::new(
            StubTransport::body("Address not found"),
            ProjectionHandle::default(),
        );
        let result = calculate(&router, coordinates_query()).await;
        assert!(matches!(result, Err(RouterError::InvalidAddress(_))));
    }

    #[test]
    fn test_options_persist() {
        let store = MemoryStore::new();
        let mut router = GoogleRouter::new(StubTransport::body(ROUTE), ProjectionHandle::default());
        router.load_options(&store).unwrap();
        assert!(!router.avoid_highways());

        router.set_avoid_highways(true);
        router.save_options(&store).unwrap();
        assert_eq!(store.get_bool(KEY_AVOID_HIGHWAYS).unwrap(), Some(true));

        let mut restored =
            GoogleRouter::new(StubTransport::body(ROUTE), ProjectionHandle::default());
        restored.load_options(&store).unwrap();
        assert!(restored.avoid_highways());
    }
}
