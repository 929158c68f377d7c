use crate::adapters::WebPushSender;
use crate::config::AppConfig;
use crate::push::PushDispatcher;
use crate::store::NotificationStore;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState<S = WebPushSender> {
    pub config: Arc<AppConfig>,
    pub store: Arc<NotificationStore>,
    pub dispatcher: PushDispatcher<S>,
}

impl AppState {
    pub fn from_config(config: AppConfig, store: NotificationStore) -> Self {
        let store = Arc::new(store);
        let dispatcher = PushDispatcher::from_config(&config, Arc::clone(&store));
        Self {
            config: Arc::new(config),
            store,
            dispatcher,
        }
    }
}
