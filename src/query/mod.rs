//! Search query model
//!
//! Projections select which collector outputs appear in the results. Conditions
//! restrict which records qualify, as an OR of AND clauses:
//!
//! ```json
//! {"or": [{"and": [{"name": "HostInfo", "output": "ip_address", "op": "EQUALS", "value": "10.0.0.1"}]}]}
//! ```
//!
//! Values are passed through verbatim; the remote service decides whether an
//! operator is legal for a given output type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Separator between collector and output names in condition shorthand and result keys
pub const OUTPUT_SEPARATOR: char = '|';

/// Collector outputs to include in the search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    /// Collector name
    pub name: String,
    /// Outputs to retrieve (empty = all outputs of the collector)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub outputs: BTreeSet<String>,
}

impl Projection {
    /// Project every output of a collector
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outputs: BTreeSet::new(),
        }
    }

    /// Add an output to retrieve
    pub fn output(mut self, output: impl Into<String>) -> Self {
        self.outputs.insert(output.into());
        self
    }

    /// Add several outputs
    pub fn outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs.extend(outputs.into_iter().map(Into::into));
        self
    }
}

impl FromStr for Projection {
    type Err = String;

    /// Parse `Collector` or `Collector:out1,out2`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, outputs) = match s.split_once(':') {
            Some((name, outputs)) => (name.trim(), Some(outputs)),
            None => (s.trim(), None),
        };
        if name.is_empty() {
            return Err(format!("missing collector name in projection '{}'", s));
        }

        let projection = Projection::new(name);
        Ok(match outputs {
            Some(list) => projection.outputs(
                list.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty()),
            ),
            None => projection,
        })
    }
}

/// Comparison operator of a condition predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    GreaterEqualThan,
    LessThan,
    LessEqualThan,
    Before,
    After,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::Equals,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::GreaterThan,
        Operator::GreaterEqualThan,
        Operator::LessThan,
        Operator::LessEqualThan,
        Operator::Before,
        Operator::After,
    ];

    /// Wire token for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "EQUALS",
            Operator::Contains => "CONTAINS",
            Operator::StartsWith => "STARTS_WITH",
            Operator::EndsWith => "ENDS_WITH",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::GreaterEqualThan => "GREATER_EQUAL_THAN",
            Operator::LessThan => "LESS_THAN",
            Operator::LessEqualThan => "LESS_EQUAL_THAN",
            Operator::Before => "BEFORE",
            Operator::After => "AFTER",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_uppercase();
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == token)
            .ok_or_else(|| format!("unknown operator '{}'", s))
    }
}

/// Leaf predicate of a condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Collector name
    pub name: String,
    /// Collector output the predicate applies to
    pub output: String,
    pub op: Operator,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negated: Option<bool>,
}

impl Predicate {
    pub fn new(
        name: impl Into<String>,
        output: impl Into<String>,
        op: Operator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
            op,
            value: value.into(),
            negated: None,
        }
    }

    /// Invert the predicate
    pub fn negate(mut self) -> Self {
        self.negated = Some(true);
        self
    }

    pub fn is_negated(&self) -> bool {
        self.negated.unwrap_or(false)
    }
}

impl FromStr for Predicate {
    type Err = String;

    /// Parse `Collector|output|OPERATOR|value`; a leading `!` negates the predicate
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negated, rest) = match s.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let mut parts = rest.splitn(4, OUTPUT_SEPARATOR);
        let (name, output, op, value) = match (parts.next(), parts.next(), parts.next(), parts.next())
        {
            (Some(n), Some(o), Some(op), Some(v)) if !n.is_empty() && !o.is_empty() => {
                (n, o, op, v)
            }
            _ => {
                return Err(format!(
                    "expected Collector|output|OPERATOR|value, got '{}'",
                    s
                ))
            }
        };

        let predicate = Predicate::new(name, output, op.parse()?, value);
        Ok(if negated { predicate.negate() } else { predicate })
    }
}

/// Conjunction of predicates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AndClause {
    pub and: Vec<Predicate>,
}

impl AndClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.and.push(predicate);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.and.is_empty()
    }
}

impl From<Vec<Predicate>> for AndClause {
    fn from(and: Vec<Predicate>) -> Self {
        Self { and }
    }
}

/// Top-level disjunction of AND clauses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub or: Vec<AndClause>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Condition consisting of a single predicate
    pub fn single(predicate: Predicate) -> Self {
        Self::new().or(AndClause::new().with(predicate))
    }

    /// Add an alternative clause
    pub fn or(mut self, clause: impl Into<AndClause>) -> Self {
        self.or.push(clause.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.or.iter().all(AndClause::is_empty)
    }
}
