//! Catalog requests and the chainable query builder.

use habitat_core::{AttributeValue, RawLayer};

use super::CatalogClient;
use crate::error::RetrievalError;

/// Geometry column assumed when a query does not name one.
pub const DEFAULT_CATALOG_GEOMETRY_COLUMN: &str = "GEOMETRY";

/// A server-side filter on catalog records.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Records whose geometry intersects the given WKT geometry.
    Intersects {
        /// Filter geometry as well-known text.
        wkt: String,
    },
    /// Records whose attribute equals a value.
    Equals {
        /// Attribute name.
        attribute: String,
        /// Expected value.
        value: AttributeValue,
    },
}

impl Predicate {
    /// Spatial intersection with `wkt`.
    pub fn intersects(wkt: impl Into<String>) -> Self {
        Self::Intersects { wkt: wkt.into() }
    }

    /// Attribute equality.
    pub fn equals(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Render as ECQL, naming the record's geometry column for spatial tests.
    ///
    /// # Examples
    /// ```
    /// use habitat_data::catalog::Predicate;
    ///
    /// assert_eq!(
    ///     Predicate::equals("FEATURE_CODE", "WA24111100").to_cql("GEOMETRY"),
    ///     "FEATURE_CODE = 'WA24111100'"
    /// );
    /// assert_eq!(
    ///     Predicate::intersects("POINT(1 2)").to_cql("SHAPE"),
    ///     "INTERSECTS(SHAPE, POINT(1 2))"
    /// );
    /// ```
    pub fn to_cql(&self, geometry_column: &str) -> String {
        match self {
            Self::Intersects { wkt } => format!("INTERSECTS({geometry_column}, {wkt})"),
            Self::Equals { attribute, value } => match value {
                AttributeValue::Null => format!("{attribute} IS NULL"),
                AttributeValue::Bool(flag) => {
                    format!("{attribute} = {}", if *flag { "TRUE" } else { "FALSE" })
                }
                AttributeValue::Integer(number) => format!("{attribute} = {number}"),
                AttributeValue::Float(number) => format!("{attribute} = {number}"),
                AttributeValue::Text(text) => {
                    format!("{attribute} = '{}'", text.replace('\'', "''"))
                }
            },
        }
    }
}

/// Everything a [`CatalogClient`] needs to fetch one record set.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRequest {
    /// Catalog object name, e.g. `WHSE_BASEMAPPING.FWA_RIVERS_POLY`.
    pub record_id: String,
    /// Geometry column of the catalog object.
    pub geometry_column: String,
    /// Attributes to project. Empty means geometry only.
    pub attributes: Vec<String>,
    /// Filters combined with logical AND.
    pub predicates: Vec<Predicate>,
}

impl CatalogRequest {
    /// A geometry-only request with no filters.
    pub fn new(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            geometry_column: DEFAULT_CATALOG_GEOMETRY_COLUMN.to_owned(),
            attributes: Vec::new(),
            predicates: Vec::new(),
        }
    }

    /// Projected attributes followed by the geometry column.
    pub fn property_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.iter().map(String::as_str).collect();
        if !names.contains(&self.geometry_column.as_str()) {
            names.push(&self.geometry_column);
        }
        names
    }

    /// All predicates as one ECQL expression, or `None` without filters.
    pub fn cql_filter(&self) -> Option<String> {
        if self.predicates.is_empty() {
            return None;
        }
        let clauses: Vec<String> = self
            .predicates
            .iter()
            .map(|predicate| predicate.to_cql(&self.geometry_column))
            .collect();
        Some(clauses.join(" AND "))
    }
}

/// Chainable query against a [`CatalogClient`].
///
/// Built by [`super::CatalogQueryExt::query`]; nothing is sent until
/// [`CatalogQuery::collect`].
///
/// # Examples
/// ```
/// use habitat_core::RawLayer;
/// use habitat_data::catalog::test_support::StubCatalogClient;
/// use habitat_data::catalog::{CatalogQueryExt, Predicate};
///
/// let client = StubCatalogClient::with_layer(RawLayer::new("SHAPE", Vec::new()));
/// let layer = client
///     .query("WHSE_FOREST_VEGETATION.VEG_CONSOLIDATED_CUT_BLOCKS_SP")
///     .geometry_column("SHAPE")
///     .select(["HARVEST_YEAR"])
///     .filter(Predicate::equals("HARVEST_YEAR", 2001_i64))
///     .collect()?;
/// assert!(layer.is_empty());
/// assert_eq!(client.requests()[0].property_names(), ["HARVEST_YEAR", "SHAPE"]);
/// # Ok::<(), habitat_data::RetrievalError>(())
/// ```
#[derive(Debug)]
pub struct CatalogQuery<'a, C: ?Sized> {
    client: &'a C,
    request: CatalogRequest,
}

impl<'a, C: CatalogClient + ?Sized> CatalogQuery<'a, C> {
    /// Start a query for `record_id`.
    pub fn new(client: &'a C, record_id: impl Into<String>) -> Self {
        Self {
            client,
            request: CatalogRequest::new(record_id),
        }
    }

    /// Name the record's geometry column.
    #[must_use]
    pub fn geometry_column(mut self, column: impl Into<String>) -> Self {
        self.request.geometry_column = column.into();
        self
    }

    /// Add attributes to the projection.
    #[must_use]
    pub fn select<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request
            .attributes
            .extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Add a filter; repeated filters are combined with AND.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.request.predicates.push(predicate);
        self
    }

    /// The request built so far.
    pub const fn request(&self) -> &CatalogRequest {
        &self.request
    }

    /// Execute the query and return every matching record.
    pub fn collect(self) -> Result<RawLayer, RetrievalError> {
        self.client.execute(&self.request)
    }
}
