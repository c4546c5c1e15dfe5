//! Handle to a completed search

use super::types::{ResultOptions, ResultPage};
use crate::error::Result;
use crate::search::api::SearchApi;
use crate::search::SearchStatus;
use futures::stream::{self, Stream};
use std::fmt;

/// A search the service has reported as finished
///
/// Counts are snapshots taken when the search finished. The context only holds
/// the search id and a capability to issue further calls; the transport stays
/// owned by whoever created the client.
#[derive(Clone)]
pub struct ResultsContext {
    api: SearchApi,
    search_id: String,
    result_count: u64,
    error_count: u64,
    host_count: u64,
    subscribed_host_count: u64,
}

impl ResultsContext {
    pub(crate) fn new(api: SearchApi, search_id: String, status: &SearchStatus) -> Self {
        Self {
            api,
            search_id,
            result_count: status.results,
            error_count: status.errors,
            host_count: status.hosts,
            subscribed_host_count: status.subscribed_hosts,
        }
    }

    pub fn search_id(&self) -> &str {
        &self.search_id
    }

    /// Number of result items
    pub fn result_count(&self) -> u64 {
        self.result_count
    }

    /// Number of errors reported by hosts
    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    /// Number of hosts that responded
    pub fn host_count(&self) -> u64 {
        self.host_count
    }

    /// Number of hosts subscribed to the search
    pub fn subscribed_host_count(&self) -> u64 {
        self.subscribed_host_count
    }

    pub fn has_results(&self) -> bool {
        self.result_count > 0
    }

    /// Fetch one page of results
    ///
    /// Each call is an independent read; calls may be repeated or interleaved freely.
    pub async fn get_results(&self, options: &ResultOptions) -> Result<ResultPage> {
        self.api.results(&self.search_id, options).await
    }

    /// Fetch successive pages of `page_size` items until `result_count` items are covered
    ///
    /// `offset` and `limit` of `options` are overridden; sorting and filtering are kept.
    /// The stream ends after the first error.
    pub fn pages(
        &self,
        page_size: u64,
        options: ResultOptions,
    ) -> impl Stream<Item = Result<ResultPage>> + '_ {
        let total = if page_size == 0 { 0 } else { self.result_count };
        stream::try_unfold(0u64, move |offset| {
            let options = options.clone().offset(offset).limit(page_size);
            async move {
                if offset >= total {
                    return Ok(None);
                }
                let page = self.get_results(&options).await?;
                Ok(Some((page, offset + page_size)))
            }
        })
    }
}

impl fmt::Debug for ResultsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultsContext")
            .field("search_id", &self.search_id)
            .field("result_count", &self.result_count)
            .field("error_count", &self.error_count)
            .field("host_count", &self.host_count)
            .field("subscribed_host_count", &self.subscribed_host_count)
            .field("topic", &self.api.topic())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarError;
    use crate::metrics::{ClientMetrics, Operation};
    use crate::results::SortDirection;
    use crate::transport::testing::{ok, ScriptedTransport};
    use crate::transport::ResponseEnvelope;
    use futures::TryStreamExt;
    use serde_json::json;
    use std::sync::Arc;

    fn context(transport: Arc<ScriptedTransport>, results: u64) -> ResultsContext {
        let api = SearchApi::new(transport, "/test/topic", Arc::new(ClientMetrics::new()));
        let status = SearchStatus {
            status: Some("FINISHED".to_string()),
            results,
            errors: 1,
            hosts: 2,
            subscribed_hosts: 3,
        };
        ResultsContext::new(api, "abc".to_string(), &status)
    }

    fn page_body(offset: u64, count: u64, total: u64) -> serde_json::Value {
        let items: Vec<_> = (offset..offset + count)
            .map(|i| json!({"id": i.to_string(), "count": 1, "created_at": "", "output": {}}))
            .collect();
        json!({
            "startIndex": offset,
            "totalItems": total,
            "itemsPerPage": count,
            "currentItemCount": count,
            "items": items
        })
    }

    #[test]
    fn test_has_results_boundary() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| Ok(ResponseEnvelope::new(200))));
        assert!(!context(transport.clone(), 0).has_results());
        assert!(context(transport.clone(), 1).has_results());
        assert!(context(transport, 250).has_results());
    }

    #[test]
    fn test_counts_snapshot() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| Ok(ResponseEnvelope::new(200))));
        let ctx = context(transport, 9);
        assert_eq!(ctx.search_id(), "abc");
        assert_eq!(
            (ctx.result_count(), ctx.error_count(), ctx.host_count(), ctx.subscribed_host_count()),
            (9, 1, 2, 3)
        );
    }

    #[tokio::test]
    async fn test_default_result_parameters() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| Ok(ok(json!({"items": []})))));
        let ctx = context(transport.clone(), 1);

        ctx.get_results(&ResultOptions::default()).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].topic, "/test/topic");
        let request = &calls[0].request;
        assert_eq!(request.target, "/v1/abc/results");
        assert_eq!(request.method, crate::transport::Method::Get);
        assert_eq!(
            serde_json::Value::Object(request.parameters.clone()),
            json!({
                "$offset": 0,
                "$limit": 20,
                "filter": "",
                "sortBy": "count",
                "sortDirection": "desc"
            })
        );
    }

    #[tokio::test]
    async fn test_custom_result_parameters() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| Ok(ok(json!({"items": []})))));
        let ctx = context(transport.clone(), 1);

        let options = ResultOptions::new()
            .offset(10)
            .limit(5)
            .text_filter("svchost")
            .sort_by("Processes|name")
            .sort_direction(SortDirection::Asc);
        ctx.get_results(&options).await.unwrap();

        let params = &transport.calls()[0].request.parameters;
        assert_eq!(params["$offset"], json!(10));
        assert_eq!(params["$limit"], json!(5));
        assert_eq!(params["filter"], json!("svchost"));
        assert_eq!(params["sortBy"], json!("Processes|name"));
        assert_eq!(params["sortDirection"], json!("asc"));
    }

    #[tokio::test]
    async fn test_missing_body_versus_empty_page() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| Ok(ResponseEnvelope::new(200))));
        let err = context(transport, 1)
            .get_results(&ResultOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MarError::MissingResultBody));

        let transport = Arc::new(ScriptedTransport::new(|_, _| {
            Ok(ok(json!({"startIndex": 0, "totalItems": 0, "items": []})))
        }));
        let page = context(transport, 1)
            .get_results(&ResultOptions::default())
            .await
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total_items, 0);
    }

    #[tokio::test]
    async fn test_results_error_is_interpreted() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| {
            Ok(ResponseEnvelope::new(404).with_body(json!({
                "applicationErrorList": [{"message": "Search not found", "code": 3}]
            })))
        }));
        let ctx = context(transport, 1);
        let err = ctx.get_results(&ResultOptions::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Search not found: 3");
        assert_eq!(ctx.api.metrics().errors(Operation::Results), 1);
    }

    #[tokio::test]
    async fn test_pages_cover_result_count() {
        let transport = Arc::new(ScriptedTransport::new(|request, _| {
            let offset = request.parameters["$offset"].as_u64().unwrap();
            let limit = request.parameters["$limit"].as_u64().unwrap();
            let count = limit.min(12 - offset);
            Ok(ok(page_body(offset, count, 12)))
        }));
        let ctx = context(transport.clone(), 12);

        let pages: Vec<ResultPage> = ctx
            .pages(5, ResultOptions::new().sort_by("Processes|name"))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2].items.len(), 2);
        let offsets: Vec<_> = transport
            .calls()
            .iter()
            .map(|c| c.request.parameters["$offset"].clone())
            .collect();
        assert_eq!(offsets, vec![json!(0), json!(5), json!(10)]);
        assert!(transport
            .calls()
            .iter()
            .all(|c| c.request.parameters["sortBy"] == json!("Processes|name")));
    }

    #[tokio::test]
    async fn test_pages_without_results() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| Ok(ok(json!({"items": []})))));
        let ctx = context(transport.clone(), 0);
        let pages: Vec<ResultPage> = ctx.pages(5, ResultOptions::new()).try_collect().await.unwrap();
        assert!(pages.is_empty());
        assert!(transport.calls().is_empty());
    }
}
