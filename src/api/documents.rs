use crate::cache::DocumentsQuery;
use crate::gateway::{ApiGateway, ApiRequest, FilePart};
use crate::outcome::Outcome;

use super::models::{DocumentItem, DocumentList, DocumentPage};

/// Document endpoints. Every call goes straight to the server; caching is
/// the query cache's job.
#[derive(Clone)]
pub struct DocumentsApi {
    gateway: ApiGateway,
}

impl DocumentsApi {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// `GET /document/get?page=&page_size=`; the server counts `page` from 1.
    pub async fn page(&self, query: DocumentsQuery) -> Outcome<DocumentPage> {
        let req = ApiRequest::get("/document/get")
            .query("page", u64::from(query.page_index) + 1)
            .query("page_size", query.page_size);
        self.gateway.request(req).await
    }

    /// `GET /document/all`
    pub async fn all(&self) -> Outcome<Vec<DocumentItem>> {
        let list: DocumentList = self.gateway.request(ApiRequest::get("/document/all")).await?;
        Ok(list.urls)
    }

    pub async fn upload(&self, file: FilePart) -> Outcome<()> {
        tracing::info!(file = %file.file_name, bytes = file.bytes.len(), "Uploading document");
        self.gateway
            .execute(ApiRequest::post("/document/upload").file(file))
            .await
    }

    pub async fn delete(&self, id: i64) -> Outcome<()> {
        self.gateway
            .execute(ApiRequest::post("/document/delete").query("id", id))
            .await
    }

    /// Ask the server to start processing a document.
    pub async fn process(&self, id: i64) -> Outcome<()> {
        self.gateway
            .execute(ApiRequest::post("/document/process").query("id", id))
            .await
    }

    /// Raw bytes behind an item's resource locator.
    pub async fn download(&self, item: &DocumentItem) -> Outcome<Vec<u8>> {
        self.gateway.download(&item.url).await
    }
}
