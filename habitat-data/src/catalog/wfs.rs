//! WFS 2.0 `GetFeature` client for GeoServer-backed catalogs.
//!
//! # Architecture
//!
//! [`CatalogClient`] is synchronous so the ingestor stays usable from plain
//! threads. This client bridges to async HTTP by blocking on a Tokio runtime
//! it owns, or on the caller's multi-threaded runtime when there is one.
//!
//! Results are paged with `count`/`startIndex` under a stable `sortBy` key
//! until the server's reported match count is reached or a page comes back
//! empty.

use std::time::Duration;

use geojson::FeatureCollection;
use habitat_core::RawLayer;
use log::debug;
use reqwest::Client;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

use super::{CatalogClient, CatalogRequest};
use crate::convert::{collection_to_layer, parse_collection};
use crate::error::{ClientBuildError, RetrievalError};

/// Public WFS endpoint of the BC Geographic Warehouse.
pub const DEFAULT_CATALOG_URL: &str = "https://openmaps.gov.bc.ca/geo/pub/wfs";

/// BC Albers, the warehouse's native projection.
pub const DEFAULT_SRS_NAME: &str = "EPSG:3005";

/// Features requested per page; matches the warehouse's server-side cap.
pub const DEFAULT_PAGE_SIZE: usize = 10_000;

/// Attribute used to give paging a stable order.
pub const DEFAULT_SORT_KEY: &str = "OBJECTID";

/// Default user agent for catalog requests.
pub const DEFAULT_USER_AGENT: &str = "habitat-layers/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for [`WfsCatalogClient`].
#[derive(Debug, Clone)]
pub struct WfsCatalogClientConfig {
    /// WFS endpoint.
    pub base_url: String,
    /// Output spatial reference system.
    pub srs_name: String,
    /// Features requested per page.
    pub page_size: usize,
    /// Attribute to sort by while paging.
    pub sort_key: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for WfsCatalogClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_owned(),
            srs_name: DEFAULT_SRS_NAME.to_owned(),
            page_size: DEFAULT_PAGE_SIZE,
            sort_key: DEFAULT_SORT_KEY.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl WfsCatalogClientConfig {
    /// Create a configuration for the given endpoint.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the page size. Zero is treated as one.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the output spatial reference system.
    #[must_use]
    pub fn with_srs_name(mut self, srs_name: impl Into<String>) -> Self {
        self.srs_name = srs_name.into();
        self
    }

    /// Set the paging sort key.
    #[must_use]
    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = sort_key.into();
        self
    }
}

/// Catalog client speaking WFS 2.0 with GeoServer's `CQL_FILTER` extension.
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime, or inside a `current_thread` runtime, requests
/// run on the client's own runtime. Inside a multi-threaded runtime they run
/// on the caller's runtime under [`tokio::task::block_in_place`].
pub struct WfsCatalogClient {
    client: Client,
    base_url: Url,
    config: WfsCatalogClientConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for WfsCatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WfsCatalogClient")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

impl WfsCatalogClient {
    /// Create a client for `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientBuildError> {
        Self::with_config(WfsCatalogClientConfig::new(base_url))
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn with_config(config: WfsCatalogClientConfig) -> Result<Self, ClientBuildError> {
        let base_url =
            Url::parse(&config.base_url).map_err(|source| ClientBuildError::InvalidUrl {
                url: config.base_url.clone(),
                source,
            })?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ClientBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ClientBuildError::Runtime)?;
        Ok(Self {
            client,
            base_url,
            config,
            runtime,
        })
    }

    /// The active configuration.
    pub const fn config(&self) -> &WfsCatalogClientConfig {
        &self.config
    }

    /// Build the `GetFeature` URL for one page of `request`.
    fn page_url(&self, request: &CatalogRequest, start_index: usize) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("service", "WFS")
                .append_pair("version", "2.0.0")
                .append_pair("request", "GetFeature")
                .append_pair("typeNames", &request.record_id)
                .append_pair("outputFormat", "application/json")
                .append_pair("srsName", &self.config.srs_name)
                .append_pair("propertyName", &request.property_names().join(","));
            if let Some(filter) = request.cql_filter() {
                pairs.append_pair("CQL_FILTER", &filter);
            }
            pairs
                .append_pair("sortBy", &self.config.sort_key)
                .append_pair("count", &self.config.page_size.to_string())
                .append_pair("startIndex", &start_index.to_string());
        }
        url
    }

    async fn fetch_all(&self, request: &CatalogRequest) -> Result<RawLayer, RetrievalError> {
        let mut start_index = 0;
        let mut merged: Option<RawLayer> = None;
        loop {
            let url = self.page_url(request, start_index);
            let page = self.fetch_page(&url).await?;
            debug!(
                "{}: page at {start_index} returned {} of {:?} features",
                request.record_id, page.returned, page.matched
            );
            start_index += page.returned;
            match merged.as_mut() {
                Some(layer) => layer.features.extend(page.layer.features),
                None => merged = Some(page.layer),
            }
            // Servers may cap pages below `count`, so a short page is not the end.
            let exhausted = page.matched.is_some_and(|total| start_index >= total);
            if page.returned == 0 || exhausted {
                break;
            }
        }
        Ok(merged.unwrap_or_else(|| RawLayer::new(request.geometry_column.clone(), Vec::new())))
    }

    async fn fetch_page(&self, url: &Url) -> Result<Page, RetrievalError> {
        let body = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, url))?
            .text()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?;

        let collection = parse_collection(&body).map_err(|err| RetrievalError::Decode {
            url: url.to_string(),
            message: err.to_string(),
        })?;
        let returned = collection.features.len();
        let matched = matched_count(&collection);
        let layer = collection_to_layer(collection, url.as_str())?;
        Ok(Page {
            returned,
            matched,
            layer,
        })
    }

    /// Convert a reqwest error to a `RetrievalError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &Url) -> RetrievalError {
        if error.is_timeout() {
            return RetrievalError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return RetrievalError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        if error.is_decode() || error.is_body() {
            return RetrievalError::Decode {
                url: url.to_string(),
                message: error.to_string(),
            };
        }

        RetrievalError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// One response of a paged query.
struct Page {
    /// Features in the response, including any skipped for lacking geometry.
    returned: usize,
    /// Total matching records, when the server reports it.
    matched: Option<usize>,
    layer: RawLayer,
}

/// Read `numberMatched` (WFS 2.0) or GeoServer's `totalFeatures`.
///
/// GeoServer may answer `"unknown"`, which yields `None`.
fn matched_count(collection: &FeatureCollection) -> Option<usize> {
    let members = collection.foreign_members.as_ref()?;
    ["numberMatched", "totalFeatures"]
        .into_iter()
        .find_map(|key| members.get(key).and_then(serde_json::Value::as_u64))
        .and_then(|count| usize::try_from(count).ok())
}

impl CatalogClient for WfsCatalogClient {
    fn execute(&self, request: &CatalogRequest) -> Result<RawLayer, RetrievalError> {
        let future = self.fetch_all(request);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Predicate;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use std::collections::HashMap;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    #[fixture]
    fn wetlands_request() -> CatalogRequest {
        let mut request = CatalogRequest::new("WHSE_BASEMAPPING.FWA_WETLANDS_POLY");
        request
            .predicates
            .push(Predicate::intersects("POLYGON ((0 0, 1 0, 1 1, 0 0))"));
        request
    }

    fn query_map(url: &Url) -> HashMap<String, String> {
        url.query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    #[rstest]
    fn page_url_carries_wfs_parameters(wetlands_request: CatalogRequest) {
        let client = WfsCatalogClient::with_config(
            WfsCatalogClientConfig::new("https://catalog.example.com/geo/pub/wfs").with_page_size(500),
        )
        .expect("client should build");

        let url = client.page_url(&wetlands_request, 1000);
        let params = query_map(&url);

        assert_eq!(url.path(), "/geo/pub/wfs");
        assert_eq!(params["request"], "GetFeature");
        assert_eq!(params["typeNames"], "WHSE_BASEMAPPING.FWA_WETLANDS_POLY");
        assert_eq!(params["outputFormat"], "application/json");
        assert_eq!(params["srsName"], DEFAULT_SRS_NAME);
        assert_eq!(params["propertyName"], "GEOMETRY");
        assert_eq!(
            params["CQL_FILTER"],
            "INTERSECTS(GEOMETRY, POLYGON ((0 0, 1 0, 1 1, 0 0)))"
        );
        assert_eq!(params["sortBy"], DEFAULT_SORT_KEY);
        assert_eq!(params["count"], "500");
        assert_eq!(params["startIndex"], "1000");
    }

    #[rstest]
    fn page_url_omits_filter_without_predicates() {
        let client = WfsCatalogClient::new("https://catalog.example.com/wfs").expect("client");
        let url = client.page_url(&CatalogRequest::new("WHSE_BASEMAPPING.FWA_RIVERS_POLY"), 0);
        assert!(!query_map(&url).contains_key("CQL_FILTER"));
    }

    #[rstest]
    fn rejects_invalid_base_url() {
        let err = WfsCatalogClient::new("not a url").expect_err("invalid url");
        assert!(matches!(err, ClientBuildError::InvalidUrl { .. }), "got {err:?}");
    }

    /// Serve each canned `(status, body)` response to one connection, in order.
    fn serve(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        let address = listener.local_addr().expect("local address");
        let handle = std::thread::spawn(move || {
            let mut request_lines = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().expect("accept");
                let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
                let mut line = String::new();
                reader.read_line(&mut line).expect("read request line");
                request_lines.push(line.trim_end().to_owned());
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).expect("read header");
                    if header.trim_end().is_empty() {
                        break;
                    }
                }
                let response = format!(
                    "HTTP/1.1 {status} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).expect("write response");
            }
            request_lines
        });
        (format!("http://{address}/wfs"), handle)
    }

    fn page_of(count: usize, offset: usize, matched: Option<usize>) -> String {
        let features: Vec<_> = (0..count)
            .map(|index| {
                json!({
                    "type": "Feature",
                    "geometry_name": "GEOMETRY",
                    "properties": {"ID": offset + index},
                    "geometry": {"type": "Point", "coordinates": [index, index]}
                })
            })
            .collect();
        let mut page = json!({"type": "FeatureCollection", "features": features});
        if let Some(total) = matched {
            page["numberMatched"] = json!(total);
        }
        page.to_string()
    }

    fn rivers_client(base_url: String, page_size: usize) -> WfsCatalogClient {
        WfsCatalogClient::with_config(WfsCatalogClientConfig::new(base_url).with_page_size(page_size))
            .expect("client")
    }

    #[rstest]
    fn pages_until_the_matched_count() {
        let (base_url, server) =
            serve(vec![(200, page_of(2, 0, Some(3))), (200, page_of(1, 2, Some(3)))]);
        let client = rivers_client(base_url, 2);

        let layer = client
            .execute(&CatalogRequest::new("WHSE_BASEMAPPING.FWA_RIVERS_POLY"))
            .expect("fetch");
        let requests = server.join().expect("server thread");

        assert_eq!(layer.len(), 3);
        assert_eq!(layer.geometry_column, "GEOMETRY");
        assert_eq!(requests.len(), 2);
        assert!(requests[0].contains("startIndex=0"), "{}", requests[0]);
        assert!(requests[1].contains("startIndex=2"), "{}", requests[1]);
    }

    #[rstest]
    fn keeps_paging_when_the_server_caps_pages() {
        let (base_url, server) =
            serve(vec![(200, page_of(2, 0, Some(4))), (200, page_of(2, 2, Some(4)))]);
        let client = rivers_client(base_url, 3);

        let layer = client
            .execute(&CatalogRequest::new("WHSE_BASEMAPPING.FWA_RIVERS_POLY"))
            .expect("fetch");
        let requests = server.join().expect("server thread");

        assert_eq!(layer.len(), 4, "every matching record is collected");
        assert_eq!(requests.len(), 2);
        assert!(requests[1].contains("startIndex=2"), "{}", requests[1]);
    }

    #[rstest]
    fn pages_until_empty_without_a_matched_count() {
        let (base_url, server) = serve(vec![
            (200, page_of(2, 0, None)),
            (200, page_of(1, 2, None)),
            (200, page_of(0, 3, None)),
        ]);
        let client = rivers_client(base_url, 3);

        let layer = client
            .execute(&CatalogRequest::new("WHSE_BASEMAPPING.FWA_RIVERS_POLY"))
            .expect("fetch");
        let requests = server.join().expect("server thread");

        assert_eq!(layer.len(), 3);
        assert_eq!(requests.len(), 3);
        assert!(requests[2].contains("startIndex=3"), "{}", requests[2]);
    }

    #[rstest]
    #[case::wfs_two(json!({"numberMatched": 12}), Some(12))]
    #[case::geoserver(json!({"totalFeatures": 7}), Some(7))]
    #[case::unknown(json!({"numberMatched": "unknown"}), None)]
    #[case::absent(json!({}), None)]
    fn reads_the_matched_count(#[case] members: serde_json::Value, #[case] expected: Option<usize>) {
        let mut document = json!({"type": "FeatureCollection", "features": []});
        if let (Some(target), Some(extra)) = (document.as_object_mut(), members.as_object()) {
            target.extend(extra.clone());
        }
        let collection = parse_collection(&document.to_string()).expect("collection");
        assert_eq!(matched_count(&collection), expected);
    }

    #[rstest]
    fn maps_error_status_to_http_error() {
        let (base_url, server) = serve(vec![(500, "{}".to_owned())]);
        let client = WfsCatalogClient::new(base_url).expect("client");

        let err = client
            .execute(&CatalogRequest::new("WHSE_BASEMAPPING.FWA_RIVERS_POLY"))
            .expect_err("server error");
        server.join().expect("server thread");

        assert!(matches!(err, RetrievalError::Http { status: 500, .. }), "got {err:?}");
    }

    #[rstest]
    fn maps_non_geojson_body_to_decode_error() {
        let (base_url, server) = serve(vec![(200, "<ows:ExceptionReport/>".to_owned())]);
        let client = WfsCatalogClient::new(base_url).expect("client");

        let err = client
            .execute(&CatalogRequest::new("WHSE_BASEMAPPING.FWA_RIVERS_POLY"))
            .expect_err("decode failure");
        server.join().expect("server thread");

        assert!(matches!(err, RetrievalError::Decode { .. }), "got {err:?}");
    }
}
