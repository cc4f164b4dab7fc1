//! Application facade over the gateway, the query cache and the session.
//!
//! Reads go through the cache under a [`QueryKey`]; writes go straight to the
//! server and, only when they succeed, invalidate the queries they affect.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::api::{
    load_upload, AuthApi, Credentials, DocumentItem, DocumentPage, DocumentsApi, UserData,
    ValidationError,
};
use crate::cache::{
    DocumentsQuery, InvalidationReport, QueryCache, QueryEvent, QueryFilter, QueryKey,
    ResourceKind, Subscription,
};
use crate::config::Config;
use crate::gateway::{ApiGateway, GatewayError};
use crate::outcome::{settle, ErrorInfo, Outcome};
use crate::session::{CookieJarMarker, FileDisplayNameStore, SessionBridge, StorageError};

/// Everything the cache holds, one variant per [`QueryKey`] family.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    DocumentPage(DocumentPage),
    DocumentList(Vec<DocumentItem>),
    Account(UserData),
}

impl TryFrom<QueryData> for DocumentPage {
    type Error = ErrorInfo;

    fn try_from(data: QueryData) -> Result<Self, Self::Error> {
        match data {
            QueryData::DocumentPage(page) => Ok(page),
            other => Err(mismatch("document page", &other)),
        }
    }
}

impl TryFrom<QueryData> for Vec<DocumentItem> {
    type Error = ErrorInfo;

    fn try_from(data: QueryData) -> Result<Self, Self::Error> {
        match data {
            QueryData::DocumentList(items) => Ok(items),
            other => Err(mismatch("document list", &other)),
        }
    }
}

impl TryFrom<QueryData> for UserData {
    type Error = ErrorInfo;

    fn try_from(data: QueryData) -> Result<Self, Self::Error> {
        match data {
            QueryData::Account(user) => Ok(user),
            other => Err(mismatch("account", &other)),
        }
    }
}

fn mismatch(expected: &str, found: &QueryData) -> ErrorInfo {
    tracing::error!(expected, found = ?found, "Cached value has the wrong shape");
    ErrorInfo::internal(format!("Unexpected cached value (wanted {})", expected))
}

/// Failure of a user-initiated action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Rejected locally; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Request(#[from] ErrorInfo),

    #[error("Could not save session: {0}")]
    Storage(#[from] StorageError),

    #[error("Already signed in as {0}")]
    AlreadySignedIn(String),
}

/// Resolves a [`QueryKey`] to the request that fills it.
#[derive(Clone)]
struct Loader {
    documents: DocumentsApi,
    auth: AuthApi,
}

impl Loader {
    async fn load(self, key: QueryKey) -> Outcome<QueryData> {
        match key {
            QueryKey::DocumentPage(query) => {
                self.documents.page(query).await.map(QueryData::DocumentPage)
            }
            QueryKey::AllDocuments => self.documents.all().await.map(QueryData::DocumentList),
            QueryKey::Account => self.auth.token_data().await.map(QueryData::Account),
        }
    }
}

/// Constructed once per process; clone the `Arc`s it hands out, not the client.
pub struct DocumentClient {
    loader: Loader,
    cache: QueryCache<QueryKey, QueryData>,
    session: Arc<SessionBridge>,
    max_upload_bytes: u64,
}

impl DocumentClient {
    pub fn new(gateway: ApiGateway, session: Arc<SessionBridge>, config: &Config) -> Self {
        Self {
            loader: Loader {
                documents: DocumentsApi::new(gateway.clone()),
                auth: AuthApi::new(gateway),
            },
            cache: QueryCache::new(Duration::from_secs(config.cache.gc_after_seconds)),
            session,
            max_upload_bytes: config.documents.max_upload_bytes,
        }
    }

    /// Wire the gateway's cookie jar and the display-name file into a
    /// session bridge and initialize it.
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let gateway = ApiGateway::new(&config.api)?;
        let marker = CookieJarMarker::new(
            gateway.cookie_jar(),
            gateway.base_url().clone(),
            config.session.cookie_name.clone(),
        );
        let store = FileDisplayNameStore::new(config.session.resolved_storage_path());
        let session = Arc::new(SessionBridge::new(Arc::new(marker), Arc::new(store)));
        session.initialize();
        Ok(Self::new(gateway, session, config))
    }

    pub fn session(&self) -> &Arc<SessionBridge> {
        &self.session
    }

    pub fn cache(&self) -> &QueryCache<QueryKey, QueryData> {
        &self.cache
    }

    pub async fn document_page(&self, query: DocumentsQuery) -> Outcome<DocumentPage> {
        self.query(QueryKey::DocumentPage(query)).await?.try_into()
    }

    pub async fn all_documents(&self) -> Outcome<Vec<DocumentItem>> {
        self.query(QueryKey::AllDocuments).await?.try_into()
    }

    pub async fn account(&self) -> Outcome<UserData> {
        self.query(QueryKey::Account).await?.try_into()
    }

    async fn query(&self, key: QueryKey) -> Outcome<QueryData> {
        let loader = self.loader.clone();
        let target = key.clone();
        self.cache
            .fetch_or_get(key, move || loader.clone().load(target.clone()))
            .await
    }

    /// Observe `key` and make sure it is loaded; see [`QueryCache::mount`].
    pub fn mount<C>(&self, key: QueryKey, callback: C) -> Subscription
    where
        C: Fn(&QueryEvent<QueryData>) + Send + Sync + 'static,
    {
        let loader = self.loader.clone();
        let target = key.clone();
        self.cache
            .mount(key, move || loader.clone().load(target.clone()), callback)
    }

    pub fn invalidate(&self, filter: &QueryFilter<QueryKey>) -> InvalidationReport {
        self.cache.invalidate(filter)
    }

    pub async fn upload(&self, paths: &[PathBuf]) -> Result<(), ActionError> {
        let file = load_upload(paths, self.max_upload_bytes).await?;
        let documents = self.loader.documents.clone();
        self.mutate(
            async move { documents.upload(file).await },
            QueryFilter::Resource(ResourceKind::Documents),
        )
        .await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Outcome<()> {
        let documents = self.loader.documents.clone();
        self.mutate(
            async move { documents.delete(id).await },
            QueryFilter::Resource(ResourceKind::Documents),
        )
        .await
    }

    pub async fn process(&self, id: i64) -> Outcome<()> {
        let documents = self.loader.documents.clone();
        self.mutate(
            async move { documents.process(id).await },
            QueryFilter::Resource(ResourceKind::Documents),
        )
        .await
    }

    /// Does not touch the cache.
    pub async fn download(&self, item: &DocumentItem) -> Outcome<Vec<u8>> {
        let documents = self.loader.documents.clone();
        let item = item.clone();
        settle(async move { documents.download(&item).await }).await
    }

    /// Sign in and publish the server-confirmed username.
    ///
    /// Refused locally while a display name is already set. On a failed
    /// request the session and the cache are left as they were.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ActionError> {
        if let Some(current) = self.session.current() {
            return Err(ActionError::AlreadySignedIn(current));
        }
        let credentials = Credentials::new(username, password)?;
        let auth = self.loader.auth.clone();
        let response = settle(async move { auth.login(&credentials).await }).await?;

        let stored = self.session.set_session(Some(&response.username));
        self.cache.invalidate(&QueryFilter::All);
        stored?;
        tracing::info!(username = %response.username, "Signed in");
        Ok(response.username)
    }

    /// Sign out and forget every cached query without refetching.
    pub async fn logout(&self) -> Result<(), ActionError> {
        let auth = self.loader.auth.clone();
        settle(async move { auth.logout().await }).await?;

        let cleared = self.session.set_session(None);
        // Signed out: nothing cached is valid and refetching would be unauthorized.
        self.cache.remove(&QueryFilter::All);
        cleared?;
        tracing::info!("Signed out");
        Ok(())
    }

    /// Create an account. The session is not changed; sign in afterwards.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), ActionError> {
        let credentials = Credentials::new(username, password)?;
        let auth = self.loader.auth.clone();
        settle(async move { auth.register(&credentials).await }).await?;
        Ok(())
    }

    async fn mutate<F, T>(&self, action: F, invalidates: QueryFilter<QueryKey>) -> Outcome<T>
    where
        F: Future<Output = Outcome<T>> + Send + 'static,
        T: Send + 'static,
    {
        let value = settle(action).await?;
        self.cache.invalidate(&invalidates);
        Ok(value)
    }
}
