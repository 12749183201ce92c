// Query parameter model
//
// Small value objects describing one dimension of a request: a named
// argument, a sort rule, a filter rule, or the page window. They validate on
// construction and know nothing about the wire format; `uapi.rs` owns the
// `api.*` serialization.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::Error;

// ── Argument ─────────────────────────────────────────────────────────

/// One named request parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Argument {
    name: String,
    value: Value,
}

impl Argument {
    /// Build an argument from anything convertible into a JSON value.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Result<Self, Error> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid_argument(
                "You must provide a name when creating a name/value argument",
            ));
        }
        Ok(Self {
            name,
            value: value.into(),
        })
    }

    /// Build an argument from any `Serialize` value.
    ///
    /// Fails with [`Error::NonSerializableValue`] when serde cannot represent
    /// the value as JSON (non-string map keys, failing `Serialize` impls).
    pub fn serialized<T: Serialize + ?Sized>(
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self, Error> {
        let name = name.into();
        let value = serde_json::to_value(value).map_err(|e| Error::NonSerializableValue {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        Self::new(name, value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Plain `{name, value}` literal, as found in a [`RequestInit`](crate::RequestInit).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArgumentLiteral {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

/// Either a pre-built [`Argument`] or a literal still to be validated.
#[derive(Debug, Clone)]
pub enum ArgumentInput {
    Built(Argument),
    Literal(ArgumentLiteral),
}

impl ArgumentInput {
    pub(crate) fn into_argument(self) -> Result<Argument, Error> {
        match self {
            Self::Built(argument) => Ok(argument),
            Self::Literal(ArgumentLiteral { name, value }) => Argument::new(name, value),
        }
    }
}

impl From<Argument> for ArgumentInput {
    fn from(argument: Argument) -> Self {
        Self::Built(argument)
    }
}

impl From<ArgumentLiteral> for ArgumentInput {
    fn from(literal: ArgumentLiteral) -> Self {
        Self::Literal(literal)
    }
}

impl<N: Into<String>, V: Into<Value>> From<(N, V)> for ArgumentInput {
    fn from((name, value): (N, V)) -> Self {
        Self::Literal(ArgumentLiteral {
            name: name.into(),
            value: value.into(),
        })
    }
}

// ── Sort ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Comparison the backend uses when sorting a column.
///
/// The snake_case name is the `api.sort_method_N` wire value.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum SortType {
    #[default]
    Lexicographic,
    Ipv4,
    Numeric,
    #[strum(to_string = "numeric_zero_as_max", serialize = "numericzeroasmax")]
    NumericZeroAsMax,
}

impl SortType {
    /// Wire name sent as `api.sort_method_N`.
    pub fn wire_name(self) -> &'static str {
        self.into()
    }
}

/// A sort rule for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sort {
    column: String,
    direction: SortDirection,
    sort_type: SortType,
}

impl Sort {
    /// Ascending, lexicographic sort on `column`.
    pub fn new(column: impl Into<String>) -> Result<Self, Error> {
        Self::with(column, SortDirection::default(), SortType::default())
    }

    pub fn with(
        column: impl Into<String>,
        direction: SortDirection,
        sort_type: SortType,
    ) -> Result<Self, Error> {
        let column = column.into();
        if column.is_empty() {
            return Err(Error::invalid_argument(
                "You must provide a non-empty column name for a Sort rule.",
            ));
        }
        Ok(Self {
            column,
            direction,
            sort_type,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn sort_type(&self) -> SortType {
        self.sort_type
    }
}

/// Plain `{column, direction?, type?}` literal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SortLiteral {
    pub column: String,
    #[serde(default)]
    pub direction: Option<SortDirection>,
    #[serde(default, rename = "type", alias = "sort_type")]
    pub sort_type: Option<SortType>,
}

#[derive(Debug, Clone)]
pub enum SortInput {
    Built(Sort),
    Literal(SortLiteral),
}

impl SortInput {
    pub(crate) fn into_sort(self) -> Result<Sort, Error> {
        match self {
            Self::Built(sort) => Ok(sort),
            Self::Literal(SortLiteral {
                column,
                direction,
                sort_type,
            }) => Sort::with(
                column,
                direction.unwrap_or_default(),
                sort_type.unwrap_or_default(),
            ),
        }
    }
}

impl From<Sort> for SortInput {
    fn from(sort: Sort) -> Self {
        Self::Built(sort)
    }
}

impl From<SortLiteral> for SortInput {
    fn from(literal: SortLiteral) -> Self {
        Self::Literal(literal)
    }
}

impl From<&str> for SortInput {
    fn from(column: &str) -> Self {
        Self::Literal(SortLiteral {
            column: column.to_owned(),
            direction: None,
            sort_type: None,
        })
    }
}

impl From<(&str, SortDirection)> for SortInput {
    fn from((column, direction): (&str, SortDirection)) -> Self {
        Self::Literal(SortLiteral {
            column: column.to_owned(),
            direction: Some(direction),
            sort_type: None,
        })
    }
}

impl From<(&str, SortDirection, SortType)> for SortInput {
    fn from((column, direction, sort_type): (&str, SortDirection, SortType)) -> Self {
        Self::Literal(SortLiteral {
            column: column.to_owned(),
            direction: Some(direction),
            sort_type: Some(sort_type),
        })
    }
}

// ── Filter ───────────────────────────────────────────────────────────

/// Comparison applied by a [`Filter`].
///
/// Parses from either the UAPI wire name (`eq`, `lt_handle_unlimited`) or the
/// variant name (`Equal`, `LessThanUnlimited`), case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum FilterOperator {
    #[strum(serialize = "contains")]
    Contains,
    #[strum(serialize = "begins")]
    Begins,
    #[strum(serialize = "ends")]
    Ends,
    #[strum(serialize = "matches")]
    Matches,
    #[strum(serialize = "eq", serialize = "equal")]
    Equal,
    #[strum(serialize = "ne", serialize = "notequal")]
    NotEqual,
    #[strum(serialize = "lt", serialize = "lessthan")]
    LessThan,
    #[strum(serialize = "lt_handle_unlimited", serialize = "lessthanunlimited")]
    LessThanUnlimited,
    #[strum(serialize = "gt", serialize = "greaterthan")]
    GreaterThan,
    #[strum(serialize = "gt_handle_unlimited", serialize = "greaterthanunlimited")]
    GreaterThanUnlimited,
    #[strum(serialize = "defined")]
    Defined,
    #[strum(serialize = "undefined")]
    Undefined,
}

impl FilterOperator {
    /// Parse an operator name, failing with
    /// [`Error::UnsupportedFilterOperator`] when UAPI has no mapping for it.
    pub fn parse(name: &str) -> Result<Self, Error> {
        name.parse().map_err(|_| Error::UnsupportedFilterOperator {
            operator: name.to_owned(),
        })
    }

    /// The `api.filter_type_N` wire value.
    pub fn uapi_name(self) -> &'static str {
        match self {
            Self::GreaterThanUnlimited => "gt_handle_unlimited",
            Self::GreaterThan => "gt",
            Self::LessThanUnlimited => "lt_handle_unlimited",
            Self::LessThan => "lt",
            Self::NotEqual => "ne",
            Self::Equal => "eq",
            Self::Defined => "defined",
            Self::Undefined => "undefined",
            Self::Matches => "matches",
            Self::Ends => "ends",
            Self::Begins => "begins",
            Self::Contains => "contains",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uapi_name())
    }
}

/// A filter rule for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    column: String,
    operator: FilterOperator,
    value: Value,
}

impl Filter {
    pub fn new(
        column: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<Value>,
    ) -> Result<Self, Error> {
        let column = column.into();
        if column.is_empty() {
            return Err(Error::invalid_argument(
                "You must define a non-empty column name.",
            ));
        }
        Ok(Self {
            column,
            operator,
            value: value.into(),
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Plain `{column, operator, value}` literal. The operator is a name,
/// resolved through [`FilterOperator::parse`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterLiteral {
    pub column: String,
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone)]
pub enum FilterInput {
    Built(Filter),
    Typed {
        column: String,
        operator: FilterOperator,
        value: Value,
    },
    Literal(FilterLiteral),
}

impl FilterInput {
    pub(crate) fn into_filter(self) -> Result<Filter, Error> {
        match self {
            Self::Built(filter) => Ok(filter),
            Self::Typed {
                column,
                operator,
                value,
            } => Filter::new(column, operator, value),
            Self::Literal(FilterLiteral {
                column,
                operator,
                value,
            }) => Filter::new(column, FilterOperator::parse(&operator)?, value),
        }
    }
}

impl From<Filter> for FilterInput {
    fn from(filter: Filter) -> Self {
        Self::Built(filter)
    }
}

impl From<FilterLiteral> for FilterInput {
    fn from(literal: FilterLiteral) -> Self {
        Self::Literal(literal)
    }
}

impl<C: Into<String>, V: Into<Value>> From<(C, FilterOperator, V)> for FilterInput {
    fn from((column, operator, value): (C, FilterOperator, V)) -> Self {
        Self::Typed {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }
}

// ── Pager ────────────────────────────────────────────────────────────

pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Records per page, or every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageSize {
    Size(u64),
    /// Best effort on the backend: some APIs still cap the result set.
    All,
}

impl Default for PageSize {
    fn default() -> Self {
        Self::Size(DEFAULT_PAGE_SIZE)
    }
}

/// 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pager {
    page: u64,
    page_size: PageSize,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: PageSize::default(),
        }
    }
}

impl Pager {
    /// `page` is the logical page (1 or greater), not a programming index.
    pub fn new(page: i64, page_size: i64) -> Result<Self, Error> {
        let page = Self::check_page(page)?;
        let size = u64::try_from(page_size)
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| Error::PagerRange {
                message: "The page_size must be set to 'ALL' or a number > 0".into(),
            })?;
        first_record(page, size)
            .filter(|start| i64::try_from(*start).is_ok())
            .ok_or_else(|| Error::PagerRange {
                message: format!(
                    "Page {page} of size {size} starts past the last addressable record"
                ),
            })?;
        Ok(Self {
            page,
            page_size: PageSize::Size(size),
        })
    }

    /// Request every record starting at `page`.
    pub fn unbounded(page: i64) -> Result<Self, Error> {
        Ok(Self {
            page: Self::check_page(page)?,
            page_size: PageSize::All,
        })
    }

    fn check_page(page: i64) -> Result<u64, Error> {
        u64::try_from(page)
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| Error::PagerRange {
                message: "The page must be 1 or greater. This is the logical page, not a \
                          programming index."
                    .into(),
            })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// `true` when the page size is the ALL sentinel.
    pub fn all(&self) -> bool {
        self.page_size == PageSize::All
    }

    /// 1-based offset of the first record on this page, or `None` for ALL.
    pub fn start_record(&self) -> Option<u64> {
        match self.page_size {
            PageSize::Size(size) => Some(first_record(self.page, size).unwrap_or(u64::MAX)),
            PageSize::All => None,
        }
    }
}

fn first_record(page: u64, size: u64) -> Option<u64> {
    page.checked_sub(1)?.checked_mul(size)?.checked_add(1)
}

/// Plain `{page, page_size?, all?}` literal. A missing or zero page size
/// falls back to [`DEFAULT_PAGE_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PagerLiteral {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default, alias = "pageSize")]
    pub page_size: Option<i64>,
    #[serde(default)]
    pub all: bool,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Clone, Copy)]
pub enum PagerInput {
    Built(Pager),
    Literal(PagerLiteral),
}

impl PagerInput {
    pub(crate) fn into_pager(self) -> Result<Pager, Error> {
        match self {
            Self::Built(pager) => Ok(pager),
            Self::Literal(PagerLiteral { page, all: true, .. }) => Pager::unbounded(page),
            Self::Literal(PagerLiteral {
                page, page_size, ..
            }) => {
                let default = i64::try_from(DEFAULT_PAGE_SIZE).unwrap_or(20);
                Pager::new(page, page_size.filter(|s| *s != 0).unwrap_or(default))
            }
        }
    }
}

impl From<Pager> for PagerInput {
    fn from(pager: Pager) -> Self {
        Self::Built(pager)
    }
}

impl From<PagerLiteral> for PagerInput {
    fn from(literal: PagerLiteral) -> Self {
        Self::Literal(literal)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn argument_requires_name() {
        assert!(matches!(
            Argument::new("", 1),
            Err(Error::InvalidArgument { .. })
        ));
        let arg = Argument::new("domain", "example.com").unwrap();
        assert_eq!(arg.name(), "domain");
        assert_eq!(arg.value(), &json!("example.com"));
    }

    #[test]
    fn argument_rejects_unserializable_values() {
        use std::collections::HashMap;

        // JSON object keys must be strings.
        let mut map = HashMap::new();
        map.insert((1, 2), "pair-key");
        let err = Argument::serialized("k", &map).unwrap_err();
        assert!(matches!(err, Error::NonSerializableValue { ref name, .. } if name == "k"));
    }

    #[test]
    fn sort_defaults_and_validation() {
        let sort = Sort::new("user").unwrap();
        assert_eq!(sort.direction(), SortDirection::Ascending);
        assert_eq!(sort.sort_type(), SortType::Lexicographic);
        assert!(Sort::new("").is_err());
    }

    #[test]
    fn sort_type_wire_names() {
        let names: Vec<_> = SortType::iter().map(SortType::wire_name).collect();
        assert_eq!(
            names,
            ["lexicographic", "ipv4", "numeric", "numeric_zero_as_max"]
        );
        assert_eq!(
            "NumericZeroAsMax".parse::<SortType>().unwrap(),
            SortType::NumericZeroAsMax
        );
    }

    #[test]
    fn filter_requires_column() {
        assert!(Filter::new("", FilterOperator::Equal, "x").is_err());
    }

    #[test]
    fn filter_operator_parses_wire_and_variant_names() {
        for op in FilterOperator::iter() {
            assert_eq!(FilterOperator::parse(op.uapi_name()).unwrap(), op);
        }
        assert_eq!(
            FilterOperator::parse("GreaterThanUnlimited").unwrap(),
            FilterOperator::GreaterThanUnlimited
        );
        assert!(matches!(
            FilterOperator::parse("between"),
            Err(Error::UnsupportedFilterOperator { ref operator }) if operator == "between"
        ));
    }

    #[test]
    fn pager_range_checks() {
        assert!(matches!(Pager::new(0, 10), Err(Error::PagerRange { .. })));
        assert!(matches!(Pager::new(1, 0), Err(Error::PagerRange { .. })));
        assert!(matches!(Pager::new(-3, 10), Err(Error::PagerRange { .. })));
        assert!(matches!(Pager::unbounded(0), Err(Error::PagerRange { .. })));
    }

    #[test]
    fn pager_rejects_offsets_past_i64() {
        assert!(matches!(
            Pager::new(i64::MAX, 4),
            Err(Error::PagerRange { .. })
        ));
        assert!(matches!(
            Pager::new(3, i64::MAX),
            Err(Error::PagerRange { .. })
        ));
        // Page 1 never multiplies, whatever the size.
        let pager = Pager::new(1, i64::MAX).unwrap();
        assert_eq!(pager.start_record(), Some(1));
        // Huge pages stay legal when nothing is skipped past them.
        assert!(Pager::unbounded(i64::MAX).unwrap().all());
    }

    #[test]
    fn pager_defaults() {
        let pager = Pager::default();
        assert_eq!(pager.page(), 1);
        assert_eq!(pager.page_size(), PageSize::Size(20));
        assert!(!pager.all());
        assert!(Pager::unbounded(2).unwrap().all());
    }

    #[test]
    fn start_record_is_one_based_offset() {
        for page in 1..=7_i64 {
            for size in [1_i64, 5, 20, 100] {
                let pager = Pager::new(page, size).unwrap();
                let expected = u64::try_from((page - 1) * size + 1).unwrap();
                assert_eq!(pager.start_record(), Some(expected));
            }
        }
        assert_eq!(Pager::unbounded(3).unwrap().start_record(), None);
    }

    #[test]
    fn pager_literal_falls_back_to_default_size() {
        let literal: PagerLiteral = serde_json::from_value(json!({ "page": 2 })).unwrap();
        let pager = PagerInput::from(literal).into_pager().unwrap();
        assert_eq!(pager.page_size(), PageSize::Size(20));

        let literal: PagerLiteral =
            serde_json::from_value(json!({ "page": 1, "pageSize": 0 })).unwrap();
        let pager = PagerInput::from(literal).into_pager().unwrap();
        assert_eq!(pager.page_size(), PageSize::Size(20));
    }

    #[test]
    fn literals_normalize_through_constructors() {
        let sort = SortInput::from(("ip", SortDirection::Descending, SortType::Ipv4))
            .into_sort()
            .unwrap();
        assert_eq!(sort.sort_type(), SortType::Ipv4);

        let literal: FilterLiteral = serde_json::from_value(
            json!({ "column": "domain", "operator": "begins", "value": "mail" }),
        )
        .unwrap();
        let filter = FilterInput::from(literal).into_filter().unwrap();
        assert_eq!(filter.operator(), FilterOperator::Begins);

        assert!(ArgumentInput::from(("", 1)).into_argument().is_err());
    }
}
