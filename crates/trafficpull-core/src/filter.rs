//! Traffic-segment filters.
//!
//! A [`Filter`] is a small predicate tree over report dimensions. It can be
//! evaluated locally against a row of dimension values, or rendered into the
//! `dimensionFilterClauses` shape the reporting API expects.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const CHANNEL_GROUPING: &str = "ga:channelGrouping";
pub const LANDING_PAGE_PATH: &str = "ga:landingPagePath";
pub const ORGANIC_SEARCH: &str = "Organic Search";
pub const BLOG_PATTERN: &str = "blog";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Exact {
        dimension: String,
        value: String,
    },
    Regex {
        dimension: String,
        pattern: String,
        negate: bool,
    },
    And(Box<Filter>, Box<Filter>),
}

impl Filter {
    pub fn exact(dimension: &str, value: &str) -> Self {
        Self::Exact {
            dimension: dimension.to_string(),
            value: value.to_string(),
        }
    }

    pub fn regex(dimension: &str, pattern: &str, negate: bool) -> Self {
        Self::Regex {
            dimension: dimension.to_string(),
            pattern: pattern.to_string(),
            negate,
        }
    }

    pub fn and(left: Filter, right: Filter) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    /// Evaluate the filter against one row of dimension values.
    ///
    /// A dimension missing from `dims` compares as the empty string.
    pub fn matches(&self, dims: &HashMap<String, String>) -> bool {
        match self {
            Filter::Exact { dimension, value } => {
                dims.get(dimension).map(String::as_str).unwrap_or("") == value
            }
            Filter::Regex {
                dimension,
                pattern,
                negate,
            } => {
                let subject = dims.get(dimension).map(String::as_str).unwrap_or("");
                let hit = match Regex::new(pattern) {
                    Ok(re) => re.is_match(subject),
                    Err(err) => {
                        warn!(pattern = %pattern, error = %err, "invalid filter pattern");
                        false
                    }
                };
                hit != *negate
            }
            Filter::And(left, right) => left.matches(dims) && right.matches(dims),
        }
    }

    /// Leaf predicates in left-to-right order, with `And` nodes flattened.
    pub fn leaves(&self) -> Vec<&Filter> {
        match self {
            Filter::And(left, right) => {
                let mut out = left.leaves();
                out.extend(right.leaves());
                out
            }
            leaf => vec![leaf],
        }
    }

    /// Render as API filter clauses.
    ///
    /// Always a single clause. A conjunction lists every leaf under the `AND`
    /// operator; a lone leaf leaves the clause operator unset.
    pub fn to_clauses(&self) -> Vec<DimensionFilterClause> {
        let filters: Vec<DimensionFilter> = self
            .leaves()
            .into_iter()
            .filter_map(DimensionFilter::from_leaf)
            .collect();
        let operator = match self {
            Filter::And(..) => Some(ClauseOperator::And),
            _ => None,
        };
        vec![DimensionFilterClause { operator, filters }]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClauseOperator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterOperator {
    Exact,
    Regexp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionFilterClause {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<ClauseOperator>,
    pub filters: Vec<DimensionFilter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionFilter {
    pub dimension_name: String,
    pub operator: FilterOperator,
    pub expressions: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub not: bool,
}

impl DimensionFilter {
    fn from_leaf(leaf: &Filter) -> Option<Self> {
        match leaf {
            Filter::Exact { dimension, value } => Some(Self {
                dimension_name: dimension.clone(),
                operator: FilterOperator::Exact,
                expressions: vec![value.clone()],
                not: false,
            }),
            Filter::Regex {
                dimension,
                pattern,
                negate,
            } => Some(Self {
                dimension_name: dimension.clone(),
                operator: FilterOperator::Regexp,
                expressions: vec![pattern.clone()],
                not: *negate,
            }),
            Filter::And(..) => None,
        }
    }
}

/// Organic search traffic only.
pub fn organic() -> Filter {
    Filter::exact(CHANNEL_GROUPING, ORGANIC_SEARCH)
}

/// Sessions whose landing page is not a blog page.
pub fn non_blog() -> Filter {
    Filter::regex(LANDING_PAGE_PATH, BLOG_PATTERN, true)
}

pub fn organic_non_blog() -> Filter {
    Filter::and(organic(), non_blog())
}

/// The four fixed traffic segments every period is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Total,
    Organic,
    NonBlog,
    OrganicNonBlog,
}

impl Segment {
    pub const ALL: [Segment; 4] = [
        Segment::Total,
        Segment::Organic,
        Segment::NonBlog,
        Segment::OrganicNonBlog,
    ];

    /// `None` for the unfiltered total.
    pub fn filter(self) -> Option<Filter> {
        match self {
            Segment::Total => None,
            Segment::Organic => Some(organic()),
            Segment::NonBlog => Some(non_blog()),
            Segment::OrganicNonBlog => Some(organic_non_blog()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Total => "total",
            Segment::Organic => "organic",
            Segment::NonBlog => "non_blog",
            Segment::OrganicNonBlog => "organic_non_blog",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
