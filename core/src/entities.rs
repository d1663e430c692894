use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One page of a paginated listing. `next_page_token` is an opaque cursor,
/// valid only for fetching the immediately following page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_link: Option<String>,
}

/// Result of a write that Coda processes asynchronously (deletes, button
/// pushes, row updates). The request id is the only reliable field; anything
/// else the API returns rides along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of a row insert/upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsInserted {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_row_ids: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference to a parent page, as embedded in table listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRef {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_link: Option<String>,
    pub name: String,
}

/// The authenticated API token holder, as returned by `/whoami`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodaUser {
    pub name: String,
    pub login_id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub scoped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_name: Option<String>,
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodaDoc {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub href: String,
    pub browser_link: String,
    pub name: String,
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodaPage {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_link: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<PageRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A table or view. Listings return the reference shape (no layout or row
/// count); detail fetches fill the remaining fields. The resolver only needs
/// `name` and `parent`, so everything past those is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodaTable {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_link: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_table: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_column: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorts: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CodaTable {
    /// Parent page id, empty when the listing omitted the parent.
    pub fn parent_id(&self) -> &str {
        self.parent.as_ref().map(|p| p.id.as_str()).unwrap_or("")
    }

    /// Parent page name, empty when the listing omitted the parent.
    pub fn parent_name(&self) -> &str {
        self.parent.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodaColumn {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub href: String,
    pub name: String,
    #[serde(default)]
    pub calculated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub display: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodaRow {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_link: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub values: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodaFormula {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub href: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodaControl {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub href: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_listing_shape_deserializes_without_detail_fields() {
        let raw = json!({
            "id": "grid-abc",
            "type": "table",
            "tableType": "table",
            "href": "https://coda.io/apis/v1/docs/d1/tables/grid-abc",
            "browserLink": "https://coda.io/d/_dd1#t_abc",
            "name": "Insights",
            "parent": {
                "id": "canvas-xyz",
                "type": "page",
                "href": "https://coda.io/apis/v1/docs/d1/pages/canvas-xyz",
                "browserLink": "https://coda.io/d/_dd1/p1",
                "name": "Insights RH"
            }
        });

        let table: CodaTable = serde_json::from_value(raw).unwrap();
        assert_eq!(table.name, "Insights");
        assert_eq!(table.parent_id(), "canvas-xyz");
        assert_eq!(table.parent_name(), "Insights RH");
        assert_eq!(
            table.extra.get("tableType").and_then(Value::as_str),
            Some("table")
        );
        assert!(table.row_count.is_none());
    }

    #[test]
    fn unknown_fields_round_trip_through_extra() {
        let raw = json!({
            "id": "c-1",
            "type": "column",
            "href": "https://coda.io/apis/v1/docs/d1/tables/t1/columns/c-1",
            "name": "Status",
            "display": true,
            "format": { "type": "select", "isArray": false },
            "someFutureField": 42
        });

        let column: CodaColumn = serde_json::from_value(raw.clone()).unwrap();
        let back = serde_json::to_value(&column).unwrap();
        assert_eq!(back["someFutureField"], 42);
        assert_eq!(back["display"], true);
        assert!(!column.calculated);
    }

    #[test]
    fn list_response_carries_opaque_cursor() {
        let raw = json!({
            "items": [],
            "nextPageToken": "tok-2",
            "nextPageLink": "https://coda.io/apis/v1/docs/d1/tables?pageToken=tok-2"
        });
        let page: ListResponse<CodaTable> = serde_json::from_value(raw).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("tok-2"));
        assert!(page.items.is_empty());
    }

    #[test]
    fn mutation_status_tolerates_missing_request_id() {
        let status: MutationStatus = serde_json::from_value(json!({})).unwrap();
        assert!(status.request_id.is_none());
    }
}
