//! Traffic-aware driving directions from Yandex, through the mm-proxy gateway

use super::http::{HttpTransport, ReqwestTransport};
use super::remote::{escape, spawn_route_request};
use super::{RouteCallback, Router, RouterError, RouterQuery};
use crate::ProjectionHandle;
use crate::store::OptionStore;
use std::sync::Arc;

pub const DEFAULT_URL: &str = "http://mm-proxy.appspot.com/yaroute";
const KEY_USE_TRAFFIC: &str = "routers/yandex/use_traffic";

pub struct YandexRouter<C: HttpTransport = ReqwestTransport> {
    transport: Arc<C>,
    projection: ProjectionHandle,
    base_url: String,
    use_traffic: bool,
}

impl<C: HttpTransport> YandexRouter<C> {
    pub fn new(transport: C, projection: ProjectionHandle) -> Self {
        Self {
            transport: Arc::new(transport),
            projection,
            base_url: DEFAULT_URL.to_string(),
            use_traffic: false,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn use_traffic(&self) -> bool {
        self.use_traffic
    }

    pub fn set_use_traffic(&mut self, use_traffic: bool) {
        self.use_traffic = use_traffic;
    }

    pub fn request_url(&self, query: &RouterQuery) -> String {
        let projection = self.projection.current();
        format!(
            "{}?from={}&to={}&traffic={}",
            self.base_url,
            escape(&query.from.query_text(projection.as_ref())),
            escape(&query.to.query_text(projection.as_ref())),
            u8::from(self.use_traffic),
        )
    }
}

impl<C: HttpTransport> Router for YandexRouter<C> {
    fn name(&self) -> &'static str {
        "Yandex"
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
        if let Some(use_traffic) = store.get_bool(KEY_USE_TRAFFIC)? {
            self.use_traffic = use_traffic;
        }
        Ok(())
    }

    fn save_options(&self, store: &dyn OptionStore) -> Result<(), RouterError> {
        store.set_bool(KEY_USE_TRAFFIC, self.use_traffic)?;
        Ok(())
    }
}
