use std::sync::Arc;

use application::{
    BlobStore, ChatService, ConnectionRegistry, ContactService, PresenceBroadcaster, UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub chat_service: Arc<ChatService>,
    pub contact_service: Arc<ContactService>,
    pub presence: Arc<PresenceBroadcaster>,
    pub registry: Arc<ConnectionRegistry>,
    pub blob_store: Arc<dyn BlobStore>,
    pub admin_secret: Arc<str>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_service: Arc<UserService>,
        chat_service: Arc<ChatService>,
        contact_service: Arc<ContactService>,
        presence: Arc<PresenceBroadcaster>,
        registry: Arc<ConnectionRegistry>,
        blob_store: Arc<dyn BlobStore>,
        admin_secret: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            user_service,
            chat_service,
            contact_service,
            presence,
            registry,
            blob_store,
            admin_secret: admin_secret.into(),
        }
    }
}
