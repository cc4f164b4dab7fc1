use serde::{Deserialize, Serialize};

/// One stored document as the server reports it. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentItem {
    pub id: i64,
    /// Display name.
    pub key: String,
    /// Free text set by the server ("CREATED", "PROCESSING", ...).
    pub status: String,
    /// Absolute resource locator for downloads.
    pub url: String,
}

/// Body of `GET /document/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPage {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub documents: Vec<DocumentItem>,
}

/// Body of `GET /document/all`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DocumentList {
    pub urls: Vec<DocumentItem>,
}

/// Body of a successful `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub username: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /auth/token_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_body_deserializes() {
        let page: DocumentPage = serde_json::from_str(
            r#"{"page":0,"page_size":10,"total_items":1,
                "documents":[{"id":7,"key":"report","status":"CREATED","url":"http://s3/report.pdf"}]}"#,
        )
        .unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.documents[0].id, 7);
        assert_eq!(page.documents[0].key, "report");
    }

    #[test]
    fn login_body_tolerates_extra_and_missing_fields() {
        let body: LoginResponse =
            serde_json::from_str(r#"{"message":"login successful","user_id":"3","username":"alice"}"#)
                .unwrap();
        assert_eq!(body.username, "alice");

        let minimal: LoginResponse = serde_json::from_str(r#"{"username":"bob"}"#).unwrap();
        assert_eq!(minimal.user_id, None);
    }
}
