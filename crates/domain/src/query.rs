use std::str::FromStr;

use congress_core::AppError;
use serde::{Deserialize, Serialize};

/// Filter operators shared by query-string suffixes and explicit conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Equality comparison.
    Eq,
    /// Inequality comparison.
    Ne,
    /// Greater-than comparison.
    Gt,
    /// Greater-than-or-equal comparison.
    Gte,
    /// Less-than comparison.
    Lt,
    /// Less-than-or-equal comparison.
    Lte,
    /// Substring match for text values.
    Contains,
    /// Substring match; same semantics as `contains`.
    Like,
    /// Membership in provided set.
    In,
}

impl FilterOperator {
    /// Returns a stable transport value for this operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Contains => "contains",
            Self::Like => "like",
            Self::In => "in",
        }
    }

    /// Returns all supported operators.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[FilterOperator] = &[
            FilterOperator::Eq,
            FilterOperator::Ne,
            FilterOperator::Gt,
            FilterOperator::Gte,
            FilterOperator::Lt,
            FilterOperator::Lte,
            FilterOperator::Contains,
            FilterOperator::Like,
            FilterOperator::In,
        ];

        ALL
    }

    /// Recognises a query-parameter suffix; anything else is not an operator.
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|operator| operator.as_str() == suffix)
    }

    /// Parses an explicit operator name.
    pub fn parse_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }

    /// Returns whether the operator is an ordered comparison.
    #[must_use]
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Gt | Self::Gte | Self::Lt | Self::Lte
        )
    }
}

impl FromStr for FilterOperator {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_suffix(value).ok_or_else(|| AppError::UnsupportedOperator(value.to_owned()))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns a stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Parses a direction leniently; unknown values sort ascending.
    #[must_use]
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

/// Logical combinator for a group of predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalMode {
    /// All predicates must match.
    #[default]
    And,
    /// Any predicate may match.
    Or,
}

impl LogicalMode {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl FromStr for LogicalMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            _ => Err(AppError::Validation(format!(
                "unknown logical mode '{value}'"
            ))),
        }
    }
}

/// Case handling for substring operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMatchMode {
    /// Letters must match exactly.
    CaseSensitive,
    /// Letters match regardless of case.
    #[default]
    CaseInsensitive,
}

impl TextMatchMode {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CaseSensitive => "case_sensitive",
            Self::CaseInsensitive => "case_insensitive",
        }
    }
}

impl FromStr for TextMatchMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "case_sensitive" => Ok(Self::CaseSensitive),
            "case_insensitive" => Ok(Self::CaseInsensitive),
            _ => Err(AppError::Validation(format!(
                "unknown text match mode '{value}'"
            ))),
        }
    }
}
