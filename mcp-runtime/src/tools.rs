use serde::Serialize;
use serde_json::{Map, Value, json};

use coda_client::{
    CellEdit, CreateDocParams, ListControlsParams, ListDocsParams, ListParams, ListRowsParams,
    ListTablesParams, RowEdit,
};

use crate::resolve::{self, TableSearch};
use crate::{McpServer, ToolError, to_pretty_json, tool_error_result, tool_text_result};

pub(crate) struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

pub(crate) fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "coda_whoami",
            description: "Get information about the current authenticated user. Use this to verify API key and check permissions.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: "coda_list_docs",
            description: "List all Coda documents accessible to the authenticated user. Supports filtering by owner, workspace, folder, and search query.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "isOwner": {
                        "type": "boolean",
                        "description": "Filter to only docs owned by the user"
                    },
                    "query": {
                        "type": "string",
                        "description": "Search query to filter documents by name"
                    },
                    "workspaceId": {
                        "type": "string",
                        "description": "Filter to docs in a specific workspace"
                    },
                    "folderId": {
                        "type": "string",
                        "description": "Filter to docs in a specific folder"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of documents to return (default: 100)"
                    }
                },
                "required": []
            }),
        },
        ToolDefinition {
            name: "coda_get_doc",
            description: "Get detailed information about a specific Coda document by its ID. Returns metadata like name, owner, creation date, and links.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "docId": {
                        "type": "string",
                        "description": "The ID of the document to retrieve"
                    }
                },
                "required": ["docId"]
            }),
        },
        ToolDefinition {
            name: "coda_create_doc",
            description: "Create a new Coda document. Can optionally copy from an existing document (sourceDoc) or create with initial content.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "The title of the new document"
                    },
                    "sourceDoc": {
                        "type": "string",
                        "description": "Optional: ID of a document to copy from"
                    },
                    "folderId": {
                        "type": "string",
                        "description": "Optional: Folder ID where the document should be created"
                    },
                    "timezone": {
                        "type": "string",
                        "description": "Optional: Timezone for the document (e.g., \"America/Los_Angeles\")"
                    }
                },
                "required": ["title"]
            }),
        },
        ToolDefinition {
            name: "coda_delete_doc",
            description: "Permanently delete a Coda document. This action cannot be undone. Use with caution.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "docId": {
                        "type": "string",
                        "description": "The ID of the document to delete"
                    }
                },
                "required": ["docId"]
            }),
        },
        ToolDefinition {
            name: "coda_list_pages",
            description: "List all pages in a Coda document",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "docId": { "type": "string", "description": "The ID of the document" },
                    "limit": { "type": "number", "description": "Maximum pages to return (default: 100)" }
                },
                "required": ["docId"]
            }),
        },
        ToolDefinition {
            name: "coda_list_tables",
            description: "List tables in a Coda document, with optional fuzzy search by table name/page name or Coda URL context",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "docId": {
                        "type": "string",
                        "description": "The document ID (optional if contextUrl contains a Coda doc URL)"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum tables to return (default: 100)"
                    },
                    "query": {
                        "type": "string",
                        "description": "Free-text query to find relevant tables by table/page name"
                    },
                    "pageName": {
                        "type": "string",
                        "description": "Hint for the parent page name (e.g. \"Insights RH\")"
                    },
                    "pageId": {
                        "type": "string",
                        "description": "Filter tables under a specific page ID"
                    },
                    "contextUrl": {
                        "type": "string",
                        "description": "Optional full Coda URL; used to infer docId and search hints"
                    },
                    "includeColumns": {
                        "type": "boolean",
                        "description": "When true, include column list for each matched table"
                    },
                    "scanLimit": {
                        "type": "number",
                        "description": "Maximum tables to scan before ranking (default: 500)"
                    }
                },
                "required": []
            }),
        },
        ToolDefinition {
            name: "coda_get_table",
            description: "Get detailed information about a specific table",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "docId": { "type": "string", "description": "The ID of the document" },
                    "tableId": { "type": "string", "description": "The ID or name of the table" }
                },
                "required": ["docId", "tableId"]
            }),
        },
        ToolDefinition {
            name: "coda_list_columns",
            description: "List all columns in a table",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "docId": { "type": "string", "description": "The ID of the document" },
                    "tableId": { "type": "string", "description": "The ID or name of the table" },
                    "limit": { "type": "number", "description": "Maximum columns to return (default: 100)" }
                },
                "required": ["docId", "tableId"]
            }),
        },
        ToolDefinition {
            name: "coda_list_rows",
            description: "List all rows in a table with optional filtering",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "docId": { "type": "string", "description": "The ID of the document" },
                    "tableId": { "type": "string", "description": "The ID or name of the table" },
                    "query": { "type": "string", "description": "Optional query to filter rows" },
                    "limit": { "type": "number", "description": "Maximum rows to return (default: 100)" }
                },
                "required": ["docId", "tableId"]
            }),
        },
        ToolDefinition {
            name: "coda_create_row",
            description: "Create a new row in a table. Accepts either `cells` for one row or `rows` for advanced/batch payload.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "docId": { "type": "string", "description": "The ID of the document" },
                    "tableId": { "type": "string", "description": "The ID or name of the table" },
                    "cells": {
                        "type": "array",
                        "description": "Array of cell objects with column and value",
                        "items": {
                            "type": "object",
                            "properties": {
                                "column": { "type": "string", "description": "Column ID or name" },
                                "value": { "description": "Value to set" }
                            },
                            "required": ["column", "value"]
                        }
                    },
                    "rows": {
                        "type": "array",
                        "description": "Optional advanced format matching Coda API: array of row objects",
                        "items": {
                            "type": "object",
                            "properties": {
                                "cells": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "properties": {
                                            "column": { "type": "string", "description": "Column ID or name" },
                                            "value": { "description": "Value to set" }
                                        },
                                        "required": ["column", "value"]
                                    }
                                }
                            },
                            "required": ["cells"]
                        }
                    },
                    "keyColumns": {
                        "type": "array",
                        "description": "Optional key columns for upsert behavior (Coda API keyColumns parameter)",
                        "items": { "type": "string" }
                    },
                    "disableParsing": {
                        "type": "boolean",
                        "description": "Optional. If true, Coda will not parse/formula-convert input values."
                    }
                },
                "required": ["docId", "tableId"]
            }),
        },
        ToolDefinition {
            name: "coda_update_row",
            description: "Update an existing row in a table",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "docId": { "type": "string", "description": "The ID of the document" },
                    "tableId": { "type": "string", "description": "The ID or name of the table" },
                    "rowId": { "type": "string", "description": "The ID of the row to update" },
                    "cells": {
                        "type": "array",
                        "description": "Array of cell objects to update",
                        "items": {
                            "type": "object",
                            "properties": {
                                "column": { "type": "string", "description": "Column ID or name" },
                                "value": { "description": "New value" }
                            },
                            "required": ["column", "value"]
                        }
                    },
                    "disableParsing": {
                        "type": "boolean",
                        "description": "Optional. If true, Coda will not parse/formula-convert input values."
                    }
                },
                "required": ["docId", "tableId", "rowId", "cells"]
            }),
        },
        ToolDefinition {
            name: "coda_list_formulas",
            description: "List all formulas in a Coda document",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "docId": { "type": "string", "description": "The ID of the document" },
                    "limit": { "type": "number", "description": "Maximum formulas to return (default: 100)" }
                },
                "required": ["docId"]
            }),
        },
        ToolDefinition {
            name: "coda_list_controls",
            description: "List all controls (buttons, sliders, etc.) in a Coda document",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "docId": { "type": "string", "description": "The ID of the document" },
                    "limit": { "type": "number", "description": "Maximum controls to return (default: 100)" }
                },
                "required": ["docId"]
            }),
        },
        ToolDefinition {
            name: "coda_push_button",
            description: "Push a button in a Coda table row (recommended: docId + tableId + rowId + columnId). Legacy controlId fallback is also supported.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "docId": { "type": "string", "description": "The ID of the document" },
                    "tableId": {
                        "type": "string",
                        "description": "The table ID or name containing the button column"
                    },
                    "rowId": {
                        "type": "string",
                        "description": "The row ID or name where the button will be pushed"
                    },
                    "columnId": {
                        "type": "string",
                        "description": "The button column ID or name to push"
                    },
                    "controlId": {
                        "type": "string",
                        "description": "Legacy fallback only. Prefer tableId + rowId + columnId for Coda API v1 compatibility."
                    }
                },
                "required": ["docId"]
            }),
        },
    ]
}

/// Internal identifier the wire-level tool name parses into before dispatch.
/// The string names are the external contract; nothing routes on prefixes or
/// substrings of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ToolName {
    Whoami,
    ListDocs,
    GetDoc,
    CreateDoc,
    DeleteDoc,
    ListPages,
    ListTables,
    GetTable,
    ListColumns,
    ListRows,
    CreateRow,
    UpdateRow,
    ListFormulas,
    ListControls,
    PushButton,
}

impl ToolName {
    pub(crate) fn parse(name: &str) -> Option<Self> {
        match name {
            "coda_whoami" => Some(Self::Whoami),
            "coda_list_docs" => Some(Self::ListDocs),
            "coda_get_doc" => Some(Self::GetDoc),
            "coda_create_doc" => Some(Self::CreateDoc),
            "coda_delete_doc" => Some(Self::DeleteDoc),
            "coda_list_pages" => Some(Self::ListPages),
            "coda_list_tables" => Some(Self::ListTables),
            "coda_get_table" => Some(Self::GetTable),
            "coda_list_columns" => Some(Self::ListColumns),
            "coda_list_rows" => Some(Self::ListRows),
            "coda_create_row" => Some(Self::CreateRow),
            "coda_update_row" => Some(Self::UpdateRow),
            "coda_list_formulas" => Some(Self::ListFormulas),
            "coda_list_controls" => Some(Self::ListControls),
            "coda_push_button" => Some(Self::PushButton),
            _ => None,
        }
    }
}

impl McpServer {
    pub(crate) async fn execute_tool(&self, name: &str, args: &Map<String, Value>) -> Value {
        let Some(tool) = ToolName::parse(name) else {
            return json!({
                "content": [{ "type": "text", "text": format!("Unknown tool: {name}") }],
                "isError": true
            });
        };

        let handled = match tool {
            ToolName::Whoami => self.tool_whoami(args).await,
            ToolName::ListDocs => self.tool_list_docs(args).await,
            ToolName::GetDoc => self.tool_get_doc(args).await,
            ToolName::CreateDoc => self.tool_create_doc(args).await,
            ToolName::DeleteDoc => self.tool_delete_doc(args).await,
            ToolName::ListPages => self.tool_list_pages(args).await,
            ToolName::ListTables => self.tool_list_tables(args).await,
            ToolName::GetTable => self.tool_get_table(args).await,
            ToolName::ListColumns => self.tool_list_columns(args).await,
            ToolName::ListRows => self.tool_list_rows(args).await,
            ToolName::CreateRow => self.tool_create_row(args).await,
            ToolName::UpdateRow => self.tool_update_row(args).await,
            ToolName::ListFormulas => self.tool_list_formulas(args).await,
            ToolName::ListControls => self.tool_list_controls(args).await,
            ToolName::PushButton => self.tool_push_button(args).await,
        };

        match handled {
            Ok(text) => tool_text_result(text),
            Err(err) => tool_error_result(&err),
        }
    }

    async fn tool_whoami(&self, _args: &Map<String, Value>) -> Result<String, ToolError> {
        let user = self.client().whoami().await?;
        pretty(&user)
    }

    async fn tool_list_docs(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let params = ListDocsParams {
            is_owner: arg_optional_bool(args, "isOwner")?,
            query: arg_optional_string(args, "query")?,
            workspace_id: arg_optional_string(args, "workspaceId")?,
            folder_id: arg_optional_string(args, "folderId")?,
            limit: Some(limit_or_default(args)?),
            ..Default::default()
        };
        let docs = self.client().list_docs(&params).await?;
        pretty(&docs)
    }

    async fn tool_get_doc(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let doc_id = required_string(args, "docId")?;
        let doc = self.client().get_doc(&doc_id).await?;
        pretty(&doc)
    }

    async fn tool_create_doc(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let params = CreateDocParams {
            title: required_string(args, "title")?,
            source_doc: arg_optional_string(args, "sourceDoc")?,
            folder_id: arg_optional_string(args, "folderId")?,
            timezone: arg_optional_string(args, "timezone")?,
            initial_page: None,
        };
        let doc = self.client().create_doc(&params).await?;
        pretty(&doc)
    }

    async fn tool_delete_doc(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let doc_id = required_string(args, "docId")?;
        let result = self.client().delete_doc(&doc_id).await?;
        Ok(format!(
            "Document delete queued for {doc_id}. Request ID: {}",
            result.request_id.as_deref().unwrap_or("unknown")
        ))
    }

    async fn tool_list_pages(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let doc_id = required_string(args, "docId")?;
        let params = ListParams::with_limit(limit_or_default(args)?);
        let pages = self.client().list_pages(&doc_id, &params).await?;
        pretty(&pages)
    }

    async fn tool_list_tables(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let explicit_doc_id = arg_optional_string(args, "docId")?;
        let context_url = arg_optional_string(args, "contextUrl")?;
        let inferred_doc_id = context_url
            .as_deref()
            .and_then(resolve::extract_doc_id_from_url);

        let Some(doc_id) = explicit_doc_id.or(inferred_doc_id) else {
            return Err(ToolError::msg(
                "docId is required (or provide a valid contextUrl with a Coda doc ID)",
            ));
        };

        let query = arg_optional_string(args, "query")?;
        let page_name = arg_optional_string(args, "pageName")?;
        let page_id = arg_optional_string(args, "pageId")?;
        let include_columns = arg_optional_bool(args, "includeColumns")?.unwrap_or(false);

        let has_search_filters = query.is_some()
            || page_name.is_some()
            || page_id.is_some()
            || context_url.is_some()
            || include_columns;

        // Plain listing keeps the single-page shape for backwards compatibility.
        if !has_search_filters {
            let params = ListTablesParams {
                limit: Some(limit_or_default(args)?),
                ..Default::default()
            };
            let tables = self.client().list_tables(&doc_id, &params).await?;
            return pretty(&tables);
        }

        let search = TableSearch {
            doc_id: &doc_id,
            query: query.as_deref(),
            page_name: page_name.as_deref(),
            page_id: page_id.as_deref(),
            context_url: context_url.as_deref(),
            include_columns,
            scan_limit: arg_optional_u64(args, "scanLimit")?,
            limit: arg_optional_u64(args, "limit")?,
        };
        let payload = resolve::search_tables(self.client(), &search).await?;
        Ok(to_pretty_json(&payload))
    }

    async fn tool_get_table(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let doc_id = required_string(args, "docId")?;
        let table_id = required_string(args, "tableId")?;
        let table = self.client().get_table(&doc_id, &table_id).await?;
        pretty(&table)
    }

    async fn tool_list_columns(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let doc_id = required_string(args, "docId")?;
        let table_id = required_string(args, "tableId")?;
        let params = ListParams::with_limit(limit_or_default(args)?);
        let columns = self.client().list_columns(&doc_id, &table_id, &params).await?;
        pretty(&columns)
    }

    async fn tool_list_rows(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let doc_id = required_string(args, "docId")?;
        let table_id = required_string(args, "tableId")?;
        let params = ListRowsParams {
            query: arg_optional_string(args, "query")?,
            use_column_names: Some(true),
            limit: Some(limit_or_default(args)?),
            ..Default::default()
        };
        let rows = self.client().list_rows(&doc_id, &table_id, &params).await?;
        pretty(&rows)
    }

    async fn tool_create_row(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let doc_id = required_string(args, "docId")?;
        let table_id = required_string(args, "tableId")?;

        let rows: Vec<RowEdit> = match args.get("rows") {
            Some(value @ Value::Array(_)) => parse_row_edits(value.clone())?,
            _ => match args.get("cells") {
                Some(value @ Value::Array(_)) => {
                    let cells = parse_cell_edits(value.clone(), "cells")?;
                    vec![RowEdit { cells }]
                }
                _ => Vec::new(),
            },
        };

        if rows.is_empty() {
            return Err(ToolError::msg(
                "coda_create_row requires `cells` (single row) or `rows` (array).",
            ));
        }

        let key_columns = arg_optional_string_array(args, "keyColumns")?;
        let disable_parsing = arg_optional_bool(args, "disableParsing")?;
        let result = self
            .client()
            .create_rows(
                &doc_id,
                &table_id,
                &rows,
                key_columns.as_deref(),
                disable_parsing,
            )
            .await?;
        pretty(&result)
    }

    async fn tool_update_row(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let doc_id = required_string(args, "docId")?;
        let table_id = required_string(args, "tableId")?;
        let row_id = required_string(args, "rowId")?;
        let cells = match args.get("cells") {
            None | Some(Value::Null) => {
                return Err(ToolError::msg("Missing required field 'cells'"));
            }
            Some(value) => parse_cell_edits(value.clone(), "cells")?,
        };
        let disable_parsing = arg_optional_bool(args, "disableParsing")?;

        let row = RowEdit { cells };
        let result = self
            .client()
            .update_row(&doc_id, &table_id, &row_id, &row, disable_parsing)
            .await?;
        pretty(&result)
    }

    async fn tool_list_formulas(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let doc_id = required_string(args, "docId")?;
        let params = ListParams::with_limit(limit_or_default(args)?);
        let formulas = self.client().list_formulas(&doc_id, &params).await?;
        pretty(&formulas)
    }

    async fn tool_list_controls(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let doc_id = required_string(args, "docId")?;
        let params = ListControlsParams {
            limit: Some(limit_or_default(args)?),
            ..Default::default()
        };
        let controls = self.client().list_controls(&doc_id, &params).await?;
        pretty(&controls)
    }

    async fn tool_push_button(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let doc_id = required_string(args, "docId")?;
        let table_id = arg_optional_string(args, "tableId")?;
        let row_id = arg_optional_string(args, "rowId")?;
        let column_id = arg_optional_string(args, "columnId")?;

        // The row-button endpoint is the supported path; controlId only exists
        // for callers still on the old control-push endpoint.
        if let (Some(table_id), Some(row_id), Some(column_id)) = (&table_id, &row_id, &column_id) {
            let result = self
                .client()
                .push_button(&doc_id, table_id, row_id, column_id)
                .await?;
            return Ok(format!(
                "Button pushed successfully. Request ID: {}",
                result.request_id.as_deref().unwrap_or("unknown")
            ));
        }

        if let Some(control_id) = arg_optional_string(args, "controlId")? {
            let result = self
                .client()
                .push_control_button_legacy(&doc_id, &control_id)
                .await?;
            return Ok(format!(
                "Button pushed via legacy control endpoint. Request ID: {}",
                result.request_id.as_deref().unwrap_or("unknown")
            ));
        }

        Err(ToolError::msg(
            "coda_push_button requires either (tableId + rowId + columnId) or legacy controlId.",
        ))
    }
}

fn pretty<T: Serialize>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ToolError::msg(format!("failed to render result: {e}")))
}

fn parse_row_edits(value: Value) -> Result<Vec<RowEdit>, ToolError> {
    serde_json::from_value(value).map_err(|e| {
        ToolError::msg(format!(
            "'rows' must be an array of row objects with cells: {e}"
        ))
    })
}

fn parse_cell_edits(value: Value, key: &str) -> Result<Vec<CellEdit>, ToolError> {
    serde_json::from_value(value).map_err(|e| {
        ToolError::msg(format!(
            "'{key}' must be an array of {{column, value}} objects: {e}"
        ))
    })
}

fn required_string(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    let value = args
        .get(key)
        .ok_or_else(|| ToolError::msg(format!("Missing required field '{key}'")))?;
    match value {
        Value::String(v) if !v.trim().is_empty() => Ok(v.clone()),
        Value::String(_) => Err(ToolError::msg(format!("'{key}' must not be empty"))),
        _ => Err(ToolError::msg(format!("'{key}' must be a string"))),
    }
}

fn arg_optional_string(args: &Map<String, Value>, key: &str) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(v)) if v.trim().is_empty() => Ok(None),
        Some(Value::String(v)) => Ok(Some(v.clone())),
        Some(_) => Err(ToolError::msg(format!("'{key}' must be a string"))),
    }
}

fn arg_optional_bool(args: &Map<String, Value>, key: &str) -> Result<Option<bool>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(v)) => Ok(Some(*v)),
        Some(_) => Err(ToolError::msg(format!("'{key}' must be a boolean"))),
    }
}

fn arg_optional_u64(args: &Map<String, Value>, key: &str) -> Result<Option<u64>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| ToolError::msg(format!("'{key}' must be an unsigned integer")))
            .map(Some),
        Some(_) => Err(ToolError::msg(format!("'{key}' must be an unsigned integer"))),
    }
}

fn arg_optional_string_array(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<String>>, ToolError> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let items = value
        .as_array()
        .ok_or_else(|| ToolError::msg(format!("'{key}' must be an array of strings")))?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let text = item
            .as_str()
            .ok_or_else(|| ToolError::msg(format!("'{key}' items must be strings")))?;
        let normalized = text.trim();
        if !normalized.is_empty() {
            out.push(normalized.to_string());
        }
    }
    Ok(Some(out))
}

// A zero or missing limit falls back to the documented default of 100.
fn limit_or_default(args: &Map<String, Value>) -> Result<u32, ToolError> {
    Ok(match arg_optional_u64(args, "limit")? {
        Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => 100,
    })
}
