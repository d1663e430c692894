use std::time::Duration;

use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use url::Url;

use coda_core::{
    CodaColumn, CodaControl, CodaDoc, CodaError, CodaFormula, CodaPage, CodaRow, CodaTable,
    CodaUser, ListResponse, MutationStatus, RowsInserted,
};

pub const CODA_API_BASE_URL: &str = "https://coda.io/apis/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Filters for `GET /docs`.
#[derive(Debug, Clone, Default)]
pub struct ListDocsParams {
    pub is_owner: Option<bool>,
    pub query: Option<String>,
    pub source_doc: Option<String>,
    pub is_starred: Option<bool>,
    pub in_gallery: Option<bool>,
    pub workspace_id: Option<String>,
    pub folder_id: Option<String>,
    pub limit: Option<u32>,
    pub page_token: Option<String>,
}

impl ListDocsParams {
    fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        push_bool(&mut query, "isOwner", self.is_owner);
        push_str(&mut query, "query", self.query.as_deref());
        push_str(&mut query, "sourceDoc", self.source_doc.as_deref());
        push_bool(&mut query, "isStarred", self.is_starred);
        push_bool(&mut query, "inGallery", self.in_gallery);
        push_str(&mut query, "workspaceId", self.workspace_id.as_deref());
        push_str(&mut query, "folderId", self.folder_id.as_deref());
        push_num(&mut query, "limit", self.limit);
        push_str(&mut query, "pageToken", self.page_token.as_deref());
        query
    }
}

/// Plain pagination window, shared by pages/columns/formulas listings.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub limit: Option<u32>,
    pub page_token: Option<String>,
}

impl ListParams {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            page_token: None,
        }
    }

    fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        push_num(&mut query, "limit", self.limit);
        push_str(&mut query, "pageToken", self.page_token.as_deref());
        query
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListTablesParams {
    pub limit: Option<u32>,
    pub page_token: Option<String>,
    pub sort_by: Option<String>,
    /// Restricts results to the given kinds ("table", "view"); sent
    /// comma-joined the way the API expects.
    pub table_types: Option<Vec<String>>,
}

impl ListTablesParams {
    fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        push_num(&mut query, "limit", self.limit);
        push_str(&mut query, "pageToken", self.page_token.as_deref());
        push_str(&mut query, "sortBy", self.sort_by.as_deref());
        if let Some(kinds) = &self.table_types {
            if !kinds.is_empty() {
                query.push(("tableTypes".to_string(), kinds.join(",")));
            }
        }
        query
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListControlsParams {
    pub limit: Option<u32>,
    pub page_token: Option<String>,
    pub sort_by: Option<String>,
}

impl ListControlsParams {
    fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        push_num(&mut query, "limit", self.limit);
        push_str(&mut query, "pageToken", self.page_token.as_deref());
        push_str(&mut query, "sortBy", self.sort_by.as_deref());
        query
    }
}

/// Cell value rendering for row reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Simple,
    SimpleWithArrays,
    Rich,
}

impl ValueFormat {
    fn as_str(self) -> &'static str {
        match self {
            ValueFormat::Simple => "simple",
            ValueFormat::SimpleWithArrays => "simpleWithArrays",
            ValueFormat::Rich => "rich",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListRowsParams {
    /// Column filter in the API's `"<column>":"<value>"` syntax.
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub use_column_names: Option<bool>,
    pub value_format: Option<ValueFormat>,
    pub limit: Option<u32>,
    pub page_token: Option<String>,
    pub visible_only: Option<bool>,
}

impl ListRowsParams {
    fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        push_str(&mut query, "query", self.query.as_deref());
        push_str(&mut query, "sortBy", self.sort_by.as_deref());
        push_bool(&mut query, "useColumnNames", self.use_column_names);
        push_str(
            &mut query,
            "valueFormat",
            self.value_format.map(ValueFormat::as_str),
        );
        push_num(&mut query, "limit", self.limit);
        push_str(&mut query, "pageToken", self.page_token.as_deref());
        push_bool(&mut query, "visibleOnly", self.visible_only);
        query
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetRowParams {
    pub use_column_names: Option<bool>,
    pub value_format: Option<ValueFormat>,
}

impl GetRowParams {
    fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        push_bool(&mut query, "useColumnNames", self.use_column_names);
        push_str(
            &mut query,
            "valueFormat",
            self.value_format.map(ValueFormat::as_str),
        );
        query
    }
}

/// One cell assignment in a row write. `column` is a column id or name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellEdit {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowEdit {
    pub cells: Vec<CellEdit>,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocParams {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_doc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    /// Initial page payload (name/subtitle/pageContent), passed through as
    /// the API defines it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_page: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreatePageParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_content: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_update: Option<Value>,
}

/// Async client for the Coda REST API. Cheap to clone; all methods take
/// `&self` and are safe to call concurrently.
#[derive(Clone, Debug)]
pub struct CodaClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CodaClient {
    /// `base_url` overrides the public API endpoint (useful for tests and
    /// proxies); trailing slashes are ignored.
    pub fn new(api_key: impl Into<String>, base_url: Option<&str>) -> Result<Self, CodaError> {
        let base_url = base_url
            .unwrap_or(CODA_API_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        Url::parse(&base_url).map_err(|e| CodaError::InvalidUrl(format!("{base_url}: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CodaError::Request {
                url: base_url.clone(),
                message: format!("failed to construct HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // User

    pub async fn whoami(&self) -> Result<CodaUser, CodaError> {
        self.get(&["whoami"], &[]).await
    }

    // Documents

    pub async fn list_docs(&self, params: &ListDocsParams) -> Result<ListResponse<CodaDoc>, CodaError> {
        self.get(&["docs"], &params.to_query()).await
    }

    pub async fn get_doc(&self, doc_id: &str) -> Result<CodaDoc, CodaError> {
        self.get(&["docs", doc_id], &[]).await
    }

    pub async fn create_doc(&self, params: &CreateDocParams) -> Result<CodaDoc, CodaError> {
        self.send_as(Method::POST, &["docs"], &[], Some(to_body(params)?))
            .await
    }

    pub async fn delete_doc(&self, doc_id: &str) -> Result<MutationStatus, CodaError> {
        self.send_as(Method::DELETE, &["docs", doc_id], &[], None)
            .await
    }

    // Pages

    pub async fn list_pages(
        &self,
        doc_id: &str,
        params: &ListParams,
    ) -> Result<ListResponse<CodaPage>, CodaError> {
        self.get(&["docs", doc_id, "pages"], &params.to_query()).await
    }

    pub async fn get_page(&self, doc_id: &str, page_id: &str) -> Result<CodaPage, CodaError> {
        self.get(&["docs", doc_id, "pages", page_id], &[]).await
    }

    pub async fn create_page(
        &self,
        doc_id: &str,
        params: &CreatePageParams,
    ) -> Result<MutationStatus, CodaError> {
        self.send_as(
            Method::POST,
            &["docs", doc_id, "pages"],
            &[],
            Some(to_body(params)?),
        )
        .await
    }

    pub async fn update_page(
        &self,
        doc_id: &str,
        page_id: &str,
        params: &UpdatePageParams,
    ) -> Result<MutationStatus, CodaError> {
        self.send_as(
            Method::PUT,
            &["docs", doc_id, "pages", page_id],
            &[],
            Some(to_body(params)?),
        )
        .await
    }

    pub async fn delete_page(
        &self,
        doc_id: &str,
        page_id: &str,
    ) -> Result<MutationStatus, CodaError> {
        self.send_as(Method::DELETE, &["docs", doc_id, "pages", page_id], &[], None)
            .await
    }

    // Tables

    pub async fn list_tables(
        &self,
        doc_id: &str,
        params: &ListTablesParams,
    ) -> Result<ListResponse<CodaTable>, CodaError> {
        self.get(&["docs", doc_id, "tables"], &params.to_query()).await
    }

    pub async fn get_table(&self, doc_id: &str, table_id: &str) -> Result<CodaTable, CodaError> {
        self.get(&["docs", doc_id, "tables", table_id], &[]).await
    }

    // Columns

    pub async fn list_columns(
        &self,
        doc_id: &str,
        table_id: &str,
        params: &ListParams,
    ) -> Result<ListResponse<CodaColumn>, CodaError> {
        self.get(
            &["docs", doc_id, "tables", table_id, "columns"],
            &params.to_query(),
        )
        .await
    }

    pub async fn get_column(
        &self,
        doc_id: &str,
        table_id: &str,
        column_id: &str,
    ) -> Result<CodaColumn, CodaError> {
        self.get(&["docs", doc_id, "tables", table_id, "columns", column_id], &[])
            .await
    }

    // Rows

    pub async fn list_rows(
        &self,
        doc_id: &str,
        table_id: &str,
        params: &ListRowsParams,
    ) -> Result<ListResponse<CodaRow>, CodaError> {
        self.get(&["docs", doc_id, "tables", table_id, "rows"], &params.to_query())
            .await
    }

    pub async fn get_row(
        &self,
        doc_id: &str,
        table_id: &str,
        row_id: &str,
        params: &GetRowParams,
    ) -> Result<CodaRow, CodaError> {
        self.get(
            &["docs", doc_id, "tables", table_id, "rows", row_id],
            &params.to_query(),
        )
        .await
    }

    /// Insert rows, or upsert when `key_columns` is given. `disable_parsing`
    /// travels as a query parameter, not in the body.
    pub async fn create_rows(
        &self,
        doc_id: &str,
        table_id: &str,
        rows: &[RowEdit],
        key_columns: Option<&[String]>,
        disable_parsing: Option<bool>,
    ) -> Result<RowsInserted, CodaError> {
        let mut body = json!({ "rows": rows });
        if let Some(keys) = key_columns {
            body["keyColumns"] = json!(keys);
        }
        let mut query = Vec::new();
        push_bool(&mut query, "disableParsing", disable_parsing);
        self.send_as(
            Method::POST,
            &["docs", doc_id, "tables", table_id, "rows"],
            &query,
            Some(body),
        )
        .await
    }

    pub async fn update_row(
        &self,
        doc_id: &str,
        table_id: &str,
        row_id: &str,
        row: &RowEdit,
        disable_parsing: Option<bool>,
    ) -> Result<MutationStatus, CodaError> {
        let mut query = Vec::new();
        push_bool(&mut query, "disableParsing", disable_parsing);
        self.send_as(
            Method::PUT,
            &["docs", doc_id, "tables", table_id, "rows", row_id],
            &query,
            Some(json!({ "row": row })),
        )
        .await
    }

    pub async fn delete_row(
        &self,
        doc_id: &str,
        table_id: &str,
        row_id: &str,
    ) -> Result<MutationStatus, CodaError> {
        self.send_as(
            Method::DELETE,
            &["docs", doc_id, "tables", table_id, "rows", row_id],
            &[],
            None,
        )
        .await
    }

    pub async fn delete_rows(
        &self,
        doc_id: &str,
        table_id: &str,
        row_ids: &[String],
    ) -> Result<MutationStatus, CodaError> {
        self.send_as(
            Method::DELETE,
            &["docs", doc_id, "tables", table_id, "rows"],
            &[],
            Some(json!({ "rowIds": row_ids })),
        )
        .await
    }

    // Formulas

    pub async fn list_formulas(
        &self,
        doc_id: &str,
        params: &ListParams,
    ) -> Result<ListResponse<CodaFormula>, CodaError> {
        self.get(&["docs", doc_id, "formulas"], &params.to_query()).await
    }

    pub async fn get_formula(&self, doc_id: &str, formula_id: &str) -> Result<CodaFormula, CodaError> {
        self.get(&["docs", doc_id, "formulas", formula_id], &[]).await
    }

    // Controls

    pub async fn list_controls(
        &self,
        doc_id: &str,
        params: &ListControlsParams,
    ) -> Result<ListResponse<CodaControl>, CodaError> {
        self.get(&["docs", doc_id, "controls"], &params.to_query()).await
    }

    pub async fn get_control(&self, doc_id: &str, control_id: &str) -> Result<CodaControl, CodaError> {
        self.get(&["docs", doc_id, "controls", control_id], &[]).await
    }

    /// Push a button cell through the row-button endpoint.
    pub async fn push_button(
        &self,
        doc_id: &str,
        table_id: &str,
        row_id: &str,
        column_id: &str,
    ) -> Result<MutationStatus, CodaError> {
        self.send_as(
            Method::POST,
            &[
                "docs", doc_id, "tables", table_id, "rows", row_id, "buttons", column_id,
            ],
            &[],
            None,
        )
        .await
    }

    /// Older control-push endpoint, kept as a fallback for button controls
    /// that are not table columns.
    pub async fn push_control_button_legacy(
        &self,
        doc_id: &str,
        control_id: &str,
    ) -> Result<MutationStatus, CodaError> {
        self.send_as(
            Method::POST,
            &["docs", doc_id, "controls", control_id, "push"],
            &[],
            None,
        )
        .await
    }

    // Request plumbing

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(String, String)],
    ) -> Result<T, CodaError> {
        self.send_as(Method::GET, segments, query, None).await
    }

    async fn send_as<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<T, CodaError> {
        let value = self.send(method, segments, query, body).await?;
        // Bodyless 202s land here as Null; give serde an empty object so
        // all-optional result types still deserialize.
        let value = match value {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        serde_json::from_value(value).map_err(|e| CodaError::Decode(e.to_string()))
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value, CodaError> {
        let url = self.endpoint(segments, query)?;

        let mut request = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key));
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| CodaError::Request {
            url: self.base_url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| CodaError::Request {
            url: self.base_url.clone(),
            message: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            let fallback = status.canonical_reason().unwrap_or("request failed");
            return Err(CodaError::api(
                status.as_u16(),
                upstream_message(&bytes, fallback),
            ));
        }

        Ok(parse_response_body(&bytes))
    }

    fn endpoint(&self, segments: &[&str], query: &[(String, String)]) -> Result<Url, CodaError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CodaError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| CodaError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .extend(segments);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

fn to_body<T: Serialize>(params: &T) -> Result<Value, CodaError> {
    serde_json::to_value(params).map_err(|e| CodaError::Decode(e.to_string()))
}

fn parse_response_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).to_string()))
}

/// Prefer the API's own error message; fall back to the raw body, then the
/// HTTP reason phrase.
fn upstream_message(bytes: &[u8], fallback: &str) -> String {
    if let Ok(body) = serde_json::from_slice::<Value>(bytes) {
        if let Some(message) = body.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
        if let Some(message) = body.get("statusMessage").and_then(Value::as_str) {
            return message.to_string();
        }
    }
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}

fn push_str(query: &mut Vec<(String, String)>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        query.push((key.to_string(), value.to_string()));
    }
}

fn push_bool(query: &mut Vec<(String, String)>, key: &str, value: Option<bool>) {
    if let Some(value) = value {
        query.push((key.to_string(), value.to_string()));
    }
}

fn push_num(query: &mut Vec<(String, String)>, key: &str, value: Option<u32>) {
    if let Some(value) = value {
        query.push((key.to_string(), value.to_string()));
    }
}
