//! Fuzzy table lookup behind `coda_list_tables`.
//!
//! Callers rarely know table ids; they paste a doc URL or type a fragment of
//! a table or page name. This module scans the doc's table listing, scores
//! every table against the supplied terms, and returns the ranked slice with
//! enough context to pick the right one.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};
use tokio::task::JoinSet;
use unicode_normalization::UnicodeNormalization;
use url::Url;

use coda_client::{CodaClient, ListParams, ListTablesParams};
use coda_core::{CodaColumn, CodaTable};

use crate::ToolError;

// The Coda API caps listing pages at 100 items.
const SCAN_PAGE_SIZE: u32 = 100;
const DEFAULT_SCAN_LIMIT: u64 = 500;
const MIN_SCAN_LIMIT: u64 = 100;
const DEFAULT_RESULT_LIMIT: u64 = 100;
const COLUMNS_PER_TABLE: u32 = 200;

const WEIGHT_PAGE_ID: i64 = 120;
const WEIGHT_EXACT_NAME: i64 = 80;
const WEIGHT_NAME_SUBSTRING: i64 = 40;
const WEIGHT_PARENT_SUBSTRING: i64 = 24;

// Doc ids embedded in browser links carry a `_d` marker, e.g.
// `/d/Quarterly-Report_dAbCd123`.
static EMBEDDED_DOC_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_d([A-Za-z0-9_-]+)").expect("valid doc id regex"));

// Coda appends slugs like `_suBt3VMg` to page segments and fragments.
static TRAILING_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_[A-Za-z0-9]{6,}$").expect("valid slug regex"));

static SEPARATOR_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_]+").expect("valid separator regex"));

/// Arguments for a ranked table search, already validated by the tool layer.
pub(crate) struct TableSearch<'a> {
    pub(crate) doc_id: &'a str,
    pub(crate) query: Option<&'a str>,
    pub(crate) page_name: Option<&'a str>,
    pub(crate) page_id: Option<&'a str>,
    pub(crate) context_url: Option<&'a str>,
    pub(crate) include_columns: bool,
    pub(crate) scan_limit: Option<u64>,
    pub(crate) limit: Option<u64>,
}

struct RankedTable {
    table: CodaTable,
    score: i64,
    reasons: Vec<String>,
}

struct MatchScore {
    score: i64,
    reasons: Vec<String>,
}

/// Scans the doc's tables, ranks them against the search terms, and builds
/// the response payload with scores, reasons, and (optionally) columns.
pub(crate) async fn search_tables(
    client: &CodaClient,
    search: &TableSearch<'_>,
) -> Result<Value, ToolError> {
    let scan_limit = effective_scan_limit(search.scan_limit);
    let tables = list_all_tables(client, search.doc_id, scan_limit).await?;
    let total_scanned = tables.len();

    let hints = search
        .context_url
        .map(extract_search_hints_from_url)
        .unwrap_or_default();
    let mut sources: Vec<&str> = Vec::new();
    sources.extend(search.query);
    sources.extend(search.page_name);
    sources.extend(hints.iter().map(String::as_str));
    let keywords = build_keywords(&sources);

    let ranked = rank_tables(tables, &keywords, search.page_id);
    let total_matched = ranked.len();
    let selected: Vec<RankedTable> = ranked
        .into_iter()
        .take(effective_result_limit(search.limit))
        .collect();

    let column_lookups = if search.include_columns {
        Some(fetch_columns(client, search.doc_id, &selected).await?)
    } else {
        None
    };

    let mut items = Vec::with_capacity(selected.len());
    for (idx, entry) in selected.into_iter().enumerate() {
        let mut item = serde_json::to_value(&entry.table)
            .map_err(|err| ToolError::msg(format!("failed to serialize table: {err}")))?;
        if let Some(lookups) = &column_lookups {
            match &lookups[idx] {
                Ok(columns) => {
                    item["columns"] = serde_json::to_value(columns).map_err(|err| {
                        ToolError::msg(format!("failed to serialize columns: {err}"))
                    })?;
                }
                // One table's column listing failing should not sink the
                // whole search; surface the error on that entry instead.
                Err(message) => {
                    item["columns"] = json!([]);
                    item["columnsError"] = json!(message);
                }
            }
        }
        item["matchScore"] = json!(entry.score);
        item["matchReasons"] = json!(entry.reasons);
        items.push(item);
    }

    Ok(json!({
        "items": items,
        "totalMatched": total_matched,
        "totalScanned": total_scanned,
        "filters": {
            "docId": search.doc_id,
            "query": search.query,
            "pageName": search.page_name,
            "pageId": search.page_id,
            "contextUrl": search.context_url,
        },
        "hintsFromContextUrl": hints,
    }))
}

/// Pulls the doc's table listing page by page until the scan budget is spent
/// or the listing runs out.
async fn list_all_tables(
    client: &CodaClient,
    doc_id: &str,
    max_items: usize,
) -> Result<Vec<CodaTable>, ToolError> {
    let mut tables: Vec<CodaTable> = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let params = ListTablesParams {
            limit: Some(SCAN_PAGE_SIZE),
            page_token: page_token.take(),
            ..Default::default()
        };
        let page = client.list_tables(doc_id, &params).await?;
        tables.extend(page.items);

        match page.next_page_token {
            Some(token) if tables.len() < max_items => page_token = Some(token),
            _ => break,
        }
    }

    tables.truncate(max_items);
    Ok(tables)
}

fn rank_tables(
    tables: Vec<CodaTable>,
    keywords: &[String],
    requested_page_id: Option<&str>,
) -> Vec<RankedTable> {
    let mut ranked: Vec<RankedTable> = tables
        .into_iter()
        .map(|table| {
            let rating = score_match(&table, keywords, requested_page_id);
            RankedTable {
                table,
                score: rating.score,
                reasons: rating.reasons,
            }
        })
        .filter(|entry| {
            if let Some(page_id) = requested_page_id {
                if normalize_text(entry.table.parent_id()) == normalize_text(page_id) {
                    return true;
                }
            }
            // Without search terms this is a plain listing; with them, only
            // scoring tables survive.
            keywords.is_empty() || entry.score > 0
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.table.name.cmp(&b.table.name))
    });
    ranked
}

fn score_match(
    table: &CodaTable,
    keywords: &[String],
    requested_page_id: Option<&str>,
) -> MatchScore {
    let table_name = normalize_text(&table.name);
    let parent_name = normalize_text(table.parent_name());
    let mut score = 0;
    let mut reasons: Vec<String> = Vec::new();

    if let Some(page_id) = requested_page_id {
        if normalize_text(table.parent_id()) == normalize_text(page_id) {
            score += WEIGHT_PAGE_ID;
            push_reason(&mut reasons, "pageId match".to_string());
        }
    }

    for keyword in keywords {
        if table_name == *keyword {
            score += WEIGHT_EXACT_NAME;
            push_reason(&mut reasons, format!("exact table match: {keyword}"));
            // An exact hit supersedes the substring score for this keyword.
            continue;
        }
        if table_name.contains(keyword.as_str()) {
            score += WEIGHT_NAME_SUBSTRING;
            push_reason(&mut reasons, format!("table match: {keyword}"));
        }
        if !parent_name.is_empty() && parent_name.contains(keyword.as_str()) {
            score += WEIGHT_PARENT_SUBSTRING;
            push_reason(&mut reasons, format!("page match: {keyword}"));
        }
    }

    MatchScore { score, reasons }
}

fn push_reason(reasons: &mut Vec<String>, reason: String) {
    if !reasons.contains(&reason) {
        reasons.push(reason);
    }
}

/// Fetches columns for every selected table concurrently. Per-table failures
/// come back as `Err(message)` in the matching slot rather than failing the
/// batch.
async fn fetch_columns(
    client: &CodaClient,
    doc_id: &str,
    selected: &[RankedTable],
) -> Result<Vec<Result<Vec<CodaColumn>, String>>, ToolError> {
    let mut lookups = JoinSet::new();
    for (idx, entry) in selected.iter().enumerate() {
        let client = client.clone();
        let doc_id = doc_id.to_string();
        let table_id = entry.table.id.clone();
        lookups.spawn(async move {
            let result = client
                .list_columns(&doc_id, &table_id, &ListParams::with_limit(COLUMNS_PER_TABLE))
                .await;
            (idx, result.map(|page| page.items).map_err(|err| err.to_string()))
        });
    }

    let mut results = vec![Ok(Vec::new()); selected.len()];
    while let Some(joined) = lookups.join_next().await {
        let (idx, columns) =
            joined.map_err(|err| ToolError::msg(format!("column lookup task failed: {err}")))?;
        results[idx] = columns;
    }
    Ok(results)
}

/// Lowercases, folds accents (NFD, then drops combining marks), and collapses
/// every run of non-alphanumeric characters into a single space, so
/// "Café-Insights!" and "cafe insights" compare equal.
fn normalize_text(value: &str) -> String {
    let stripped: String = value
        .nfd()
        .filter(|ch| !matches!(ch, '\u{0300}'..='\u{036f}'))
        .collect();

    let mut normalized = String::with_capacity(stripped.len());
    let mut pending_space = false;
    for ch in stripped.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_space && !normalized.is_empty() {
                normalized.push(' ');
            }
            normalized.push(ch);
            pending_space = false;
        } else {
            pending_space = true;
        }
    }
    normalized
}

/// Expands the raw search terms into normalized keywords: each whole phrase
/// plus its tokens of three or more characters, deduplicated in insertion
/// order.
fn build_keywords(sources: &[&str]) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for source in sources {
        let normalized = normalize_text(source);
        if normalized.is_empty() {
            continue;
        }
        if !keywords.contains(&normalized) {
            keywords.push(normalized.clone());
        }
        for token in normalized.split(' ') {
            if token.len() >= 3 && !keywords.iter().any(|keyword| keyword == token) {
                keywords.push(token.to_string());
            }
        }
    }
    keywords
}

/// Pulls the doc id out of a pasted Coda URL. Handles the canonical
/// `/d/_d<id>` form, browser links with the id embedded after a name slug,
/// and bare `/d/<id>` paths.
pub(crate) fn extract_doc_id_from_url(raw_url: &str) -> Option<String> {
    let url = Url::parse(raw_url).ok()?;
    let parts = path_parts(&url);
    if parts.first() != Some(&"d") {
        return None;
    }
    let candidate = parts.get(1).copied()?;

    let doc_id = if let Some(stripped) = candidate.strip_prefix("_d") {
        stripped.to_string()
    } else if let Some(embedded) = EMBEDDED_DOC_ID_RE.captures(candidate) {
        embedded[1].to_string()
    } else {
        candidate.to_string()
    };

    Some(doc_id).filter(|id| !id.is_empty())
}

/// Derives search hints from the page segment and fragment of a pasted URL,
/// e.g. `/d/_dABC123/Insights-RH_suBt3VMg#Section-Name_xYz987` yields
/// `["insights rh", "section name"]`.
fn extract_search_hints_from_url(raw_url: &str) -> Vec<String> {
    let Ok(url) = Url::parse(raw_url) else {
        return Vec::new();
    };
    let parts = path_parts(&url);
    let page_part = parts.get(2).copied().unwrap_or("");
    let fragment = url.fragment().unwrap_or("");

    // Either part failing to decode drops both hints.
    let (Some(page_hint), Some(fragment_hint)) = (clean_hint(page_part), clean_hint(fragment))
    else {
        return Vec::new();
    };

    [page_hint, fragment_hint]
        .into_iter()
        .filter(|hint| !hint.is_empty())
        .collect()
}

fn path_parts(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|part| !part.is_empty()).collect())
        .unwrap_or_default()
}

/// Turns one URL piece into a lowercase hint: percent-decode, drop the
/// trailing slug, and replace separator runs with spaces. `None` when the
/// piece is not valid percent-encoded UTF-8.
fn clean_hint(part: &str) -> Option<String> {
    let decoded = percent_decode(part)?;
    let without_slug = TRAILING_SLUG_RE.replace(&decoded, "");
    let spaced = SEPARATOR_RUN_RE.replace_all(&without_slug, " ");
    Some(spaced.trim().to_lowercase())
}

fn percent_decode(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = hex_digit(*bytes.get(i + 1)?)?;
            let lo = hex_digit(*bytes.get(i + 2)?)?;
            decoded.push(hi << 4 | lo);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

fn hex_digit(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|digit| digit as u8)
}

fn effective_scan_limit(requested: Option<u64>) -> usize {
    let limit = match requested {
        Some(n) if n > 0 => n,
        _ => DEFAULT_SCAN_LIMIT,
    };
    limit.max(MIN_SCAN_LIMIT) as usize
}

fn effective_result_limit(requested: Option<u64>) -> usize {
    let limit = match requested {
        Some(n) if n > 0 => n,
        _ => DEFAULT_RESULT_LIMIT,
    };
    limit.max(1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(id: &str, name: &str, page_id: &str, page_name: &str) -> CodaTable {
        serde_json::from_value(fixture_table(id, name, page_id, page_name))
            .expect("fixture table deserializes")
    }

    fn fixture_table(id: &str, name: &str, page_id: &str, page_name: &str) -> Value {
        json!({
            "id": id,
            "type": "table",
            "href": "",
            "name": name,
            "parent": { "id": page_id, "type": "page", "href": "", "name": page_name },
        })
    }

    #[test]
    fn normalize_strips_accents_and_punctuation() {
        assert_eq!(normalize_text("Café-Insights!"), "cafe insights");
        assert_eq!(normalize_text("  Ünïcode   Test  "), "unicode test");
        assert_eq!(normalize_text("Q3//2024__plan"), "q3 2024 plan");
        assert_eq!(normalize_text("!!!"), "");
    }

    #[test]
    fn doc_id_comes_from_the_canonical_url_shape() {
        let url = "https://example.com/d/_dABC123/Insights-RH_suBt3VMg#Section-Name_xYz987";
        assert_eq!(extract_doc_id_from_url(url).as_deref(), Some("ABC123"));
    }

    #[test]
    fn doc_id_handles_prefix_embedded_and_plain_candidates() {
        assert_eq!(
            extract_doc_id_from_url("https://coda.io/d/_dAbC-12_3").as_deref(),
            Some("AbC-12_3"),
        );
        assert_eq!(
            extract_doc_id_from_url("https://coda.io/d/Quarterly-Report_dXy42Zz/Page").as_deref(),
            Some("Xy42Zz"),
        );
        assert_eq!(
            extract_doc_id_from_url("https://coda.io/d/plainid99").as_deref(),
            Some("plainid99"),
        );
    }

    #[test]
    fn doc_id_rejects_urls_without_a_doc_path() {
        assert_eq!(extract_doc_id_from_url("https://example.com/not-a-doc-path"), None);
        assert_eq!(extract_doc_id_from_url("https://coda.io/d/_d"), None);
        assert_eq!(extract_doc_id_from_url("https://coda.io/workspaces/ws-1"), None);
        assert_eq!(extract_doc_id_from_url("not a url at all"), None);
    }

    #[test]
    fn hints_come_from_the_page_segment_and_fragment() {
        let url = "https://example.com/d/_dABC123/Insights-RH_suBt3VMg#Section-Name_xYz987";
        assert_eq!(
            extract_search_hints_from_url(url),
            vec!["insights rh".to_string(), "section name".to_string()],
        );
    }

    #[test]
    fn hints_keep_suffixes_shorter_than_slug_length() {
        // "_suABC" is only five characters after the underscore, so it stays.
        let url = "https://coda.io/d/_dA1/Page-Name_suABC";
        assert_eq!(
            extract_search_hints_from_url(url),
            vec!["page name suabc".to_string()],
        );
    }

    #[test]
    fn hints_decode_percent_escapes() {
        let url = "https://coda.io/d/_dA1/Caf%C3%A9-Notes_q1WeRt9#R%C3%A9sum%C3%A9-Page_zZzZz9";
        assert_eq!(
            extract_search_hints_from_url(url),
            vec!["café notes".to_string(), "résumé page".to_string()],
        );
    }

    #[test]
    fn hints_are_empty_for_shallow_or_broken_urls() {
        assert!(extract_search_hints_from_url("https://example.com/not-a-doc-path").is_empty());
        assert!(extract_search_hints_from_url("not a url at all").is_empty());
        // A malformed escape anywhere poisons both hints.
        let bad_escape = "https://coda.io/d/_dA1/Bad%GG#Fine-Part";
        assert!(extract_search_hints_from_url(bad_escape).is_empty());
    }

    #[test]
    fn keywords_expand_phrases_into_long_tokens() {
        assert_eq!(
            build_keywords(&["Insights RH", "Insights", "hr"]),
            vec![
                "insights rh".to_string(),
                "insights".to_string(),
                "hr".to_string(),
            ],
        );
    }

    #[test]
    fn keywords_skip_empty_and_symbol_only_sources() {
        assert!(build_keywords(&["", "!!!", "  "]).is_empty());
    }

    #[test]
    fn exact_name_match_does_not_stack_with_substring() {
        let table = table("t1", "Tasks", "p1", "Projects");
        let rating = score_match(&table, &["tasks".to_string()], None);
        assert_eq!(rating.score, 80);
        assert_eq!(rating.reasons, vec!["exact table match: tasks".to_string()]);
    }

    #[test]
    fn substring_scores_stack_across_table_and_page_names() {
        let table = table("t1", "Insights 2024", "p1", "Insights RH");
        let rating = score_match(&table, &["insights".to_string()], None);
        assert_eq!(rating.score, 64);
        assert_eq!(
            rating.reasons,
            vec![
                "table match: insights".to_string(),
                "page match: insights".to_string(),
            ],
        );
    }

    #[test]
    fn page_id_comparison_ignores_case_and_separators() {
        let table = table("t1", "Budget", "canvas-AbC", "Money");
        let rating = score_match(&table, &[], Some("Canvas ABC"));
        assert_eq!(rating.score, 120);
        assert_eq!(rating.reasons, vec!["pageId match".to_string()]);
    }

    #[test]
    fn ranking_sorts_by_score_then_name() {
        let tables = vec![
            table("t1", "Zeta", "p1", "Home"),
            table("t2", "Alpha", "p1", "Home"),
            table("t3", "Tasks", "p2", "Work"),
        ];
        let ranked = rank_tables(tables, &[], Some("p1"));
        let names: Vec<&str> = ranked.iter().map(|entry| entry.table.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta", "Tasks"]);
        assert_eq!(ranked[0].score, 120);
        assert_eq!(ranked[2].score, 0);
    }

    #[test]
    fn keyword_filters_drop_tables_that_score_zero() {
        let tables = vec![
            table("t1", "Insights", "pA", "Home"),
            table("t2", "Tasks", "pB", "Work"),
        ];
        let ranked = rank_tables(tables, &["insights".to_string()], None);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].table.name, "Insights");
    }

    #[test]
    fn page_scoped_tables_survive_keyword_filtering() {
        // The keyword matches nothing; the page-scoped table must stay anyway.
        let tables = vec![
            table("t1", "Budget", "p1", "Money"),
            table("t2", "Tasks", "p2", "Work"),
        ];
        let ranked = rank_tables(tables, &["zzz".to_string()], Some("p1"));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].table.name, "Budget");
        assert_eq!(ranked[0].score, 120);
    }

    #[test]
    fn empty_keywords_keep_the_whole_listing() {
        let tables = vec![
            table("t1", "Insights", "pA", "Home"),
            table("t2", "Tasks", "pB", "Work"),
        ];
        assert_eq!(rank_tables(tables, &[], None).len(), 2);
    }

    #[test]
    fn scan_limit_clamps_to_floor_and_default() {
        assert_eq!(effective_scan_limit(None), 500);
        assert_eq!(effective_scan_limit(Some(0)), 500);
        assert_eq!(effective_scan_limit(Some(50)), 100);
        assert_eq!(effective_scan_limit(Some(2000)), 2000);
    }

    #[test]
    fn result_limit_defaults_and_floors() {
        assert_eq!(effective_result_limit(None), 100);
        assert_eq!(effective_result_limit(Some(0)), 100);
        assert_eq!(effective_result_limit(Some(7)), 7);
    }

    mod against_local_server {
        use std::collections::HashMap;
        use std::net::SocketAddr;
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        use axum::extract::{Path, Query};
        use axum::http::StatusCode;
        use axum::response::{IntoResponse, Response};
        use axum::routing::get;
        use axum::{Json, Router};

        use super::*;

        async fn spawn(app: Router) -> SocketAddr {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind test listener");
            let addr = listener.local_addr().expect("listener addr");
            tokio::spawn(async move {
                axum::serve(listener, app).await.expect("serve test app");
            });
            addr
        }

        fn client_for(addr: SocketAddr) -> CodaClient {
            CodaClient::new("test-key", Some(&format!("http://{addr}"))).expect("test client")
        }

        fn blank_search(doc_id: &str) -> TableSearch<'_> {
            TableSearch {
                doc_id,
                query: None,
                page_name: None,
                page_id: None,
                context_url: None,
                include_columns: false,
                scan_limit: None,
                limit: None,
            }
        }

        async fn spawn_fixture_doc() -> SocketAddr {
            let app = Router::new()
                .route("/docs/{doc}/tables", get(list_tables_fixture))
                .route("/docs/{doc}/tables/{table}/columns", get(list_columns_fixture));
            spawn(app).await
        }

        async fn list_tables_fixture() -> Json<Value> {
            Json(json!({
                "items": [
                    fixture_table("tbl-insights", "Insights RH Data", "page-insights", "Insights RH"),
                    fixture_table("tbl-tasks", "Tasks", "page-projects", "Projects"),
                    fixture_table("tbl-archive", "Archive", "page-old", "Old Stuff"),
                    fixture_table("tbl-roadmap", "Roadmap", "page-projects", "Projects"),
                    fixture_table("tbl-broken", "Insights Broken", "page-insights", "Insights RH"),
                    fixture_table("tbl-people", "People Directory", "page-hr", "HR"),
                ]
            }))
        }

        async fn list_columns_fixture(Path((_, table)): Path<(String, String)>) -> Response {
            if table == "tbl-broken" {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "boom" })),
                )
                    .into_response();
            }
            Json(json!({
                "items": [
                    { "id": format!("{table}-c1"), "type": "column", "href": "", "name": "Name", "display": true },
                    { "id": format!("{table}-c2"), "type": "column", "href": "", "name": "Status" },
                ]
            }))
            .into_response()
        }

        #[tokio::test]
        async fn keyword_search_ranks_and_annotates_matches() {
            let addr = spawn_fixture_doc().await;
            let client = client_for(addr);

            let search = TableSearch {
                query: Some("insights"),
                ..blank_search("fixture")
            };
            let payload = search_tables(&client, &search).await.expect("search succeeds");

            let items = payload["items"].as_array().expect("items array");
            assert_eq!(items.len(), 2);
            // Tied at 40 + 24; names break the tie.
            assert_eq!(items[0]["name"], "Insights Broken");
            assert_eq!(items[1]["name"], "Insights RH Data");
            assert_eq!(items[0]["matchScore"], 64);
            assert_eq!(
                items[0]["matchReasons"],
                json!(["table match: insights", "page match: insights"]),
            );
            assert!(items[0].get("columns").is_none());

            assert_eq!(payload["totalMatched"], 2);
            assert_eq!(payload["totalScanned"], 6);
            assert_eq!(payload["filters"]["query"], "insights");
            assert_eq!(payload["filters"]["pageName"], Value::Null);
            assert_eq!(payload["hintsFromContextUrl"], json!([]));
        }

        #[tokio::test]
        async fn column_enrichment_survives_a_failing_table() {
            let addr = spawn_fixture_doc().await;
            let client = client_for(addr);

            let search = TableSearch {
                page_id: Some("page-insights"),
                include_columns: true,
                ..blank_search("fixture")
            };
            let payload = search_tables(&client, &search).await.expect("search succeeds");

            let items = payload["items"].as_array().expect("items array");
            assert_eq!(items.len(), 6);
            assert_eq!(payload["totalMatched"], 6);

            // The two page-scoped tables lead, alphabetically.
            assert_eq!(items[0]["name"], "Insights Broken");
            assert_eq!(items[0]["matchScore"], 120);
            assert_eq!(items[0]["matchReasons"], json!(["pageId match"]));
            assert_eq!(items[1]["name"], "Insights RH Data");

            let error = items[0]["columnsError"].as_str().expect("columns error");
            assert!(error.contains("(500)"), "unexpected error: {error}");
            assert!(error.contains("boom"), "unexpected error: {error}");
            assert_eq!(items[0]["columns"], json!([]));

            for item in &items[1..] {
                assert!(item.get("columnsError").is_none());
                assert_eq!(item["columns"].as_array().map(Vec::len), Some(2));
            }
        }

        #[tokio::test]
        async fn context_url_hints_feed_the_keyword_ranking() {
            let addr = spawn_fixture_doc().await;
            let client = client_for(addr);

            let search = TableSearch {
                context_url: Some("https://coda.io/d/_dFixture/Insights-RH_suBt3VMg"),
                ..blank_search("fixture")
            };
            let payload = search_tables(&client, &search).await.expect("search succeeds");

            assert_eq!(payload["hintsFromContextUrl"], json!(["insights rh"]));
            let items = payload["items"].as_array().expect("items array");
            assert_eq!(items.len(), 2);
            // "Insights RH Data" hits both keywords in both names.
            assert_eq!(items[0]["name"], "Insights RH Data");
            assert_eq!(items[0]["matchScore"], 128);
            assert_eq!(items[1]["name"], "Insights Broken");
            assert_eq!(items[1]["matchScore"], 88);
        }

        #[tokio::test]
        async fn result_limit_truncates_but_counts_all_matches() {
            let addr = spawn_fixture_doc().await;
            let client = client_for(addr);

            let search = TableSearch {
                page_id: Some("page-insights"),
                limit: Some(1),
                ..blank_search("fixture")
            };
            let payload = search_tables(&client, &search).await.expect("search succeeds");

            assert_eq!(payload["items"].as_array().map(Vec::len), Some(1));
            assert_eq!(payload["totalMatched"], 6);
            assert_eq!(payload["totalScanned"], 6);
        }

        #[tokio::test]
        async fn scan_stops_at_the_requested_ceiling() {
            let pages_served = Arc::new(AtomicUsize::new(0));
            let counter = pages_served.clone();
            let app = Router::new().route(
                "/docs/{doc}/tables",
                get(move |Query(params): Query<HashMap<String, String>>| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        let start: usize = params
                            .get("pageToken")
                            .and_then(|token| token.parse().ok())
                            .unwrap_or(0);
                        let items: Vec<Value> = (start..start + 100)
                            .map(|n| {
                                json!({
                                    "id": format!("grid-{n}"),
                                    "type": "table",
                                    "href": "",
                                    "name": format!("Grid {n}"),
                                })
                            })
                            .collect();
                        Json(json!({
                            "items": items,
                            "nextPageToken": (start + 100).to_string(),
                        }))
                    }
                }),
            );
            let addr = spawn(app).await;
            let client = client_for(addr);

            let search = TableSearch {
                query: Some("no such table anywhere"),
                scan_limit: Some(150),
                ..blank_search("endless")
            };
            let payload = search_tables(&client, &search).await.expect("search succeeds");

            assert_eq!(payload["totalScanned"], 150);
            assert_eq!(payload["totalMatched"], 0);
            assert_eq!(payload["items"], json!([]));
            assert_eq!(pages_served.load(Ordering::SeqCst), 2);
        }

        #[tokio::test]
        async fn unreachable_api_propagates_as_a_tool_error() {
            let client = CodaClient::new("test-key", Some("http://127.0.0.1:9")).expect("client");
            let err = search_tables(&client, &blank_search("d1"))
                .await
                .expect_err("search fails");
            assert!(
                err.message.starts_with("Failed to reach Coda API at"),
                "unexpected error: {}",
                err.message,
            );
        }
    }
}
