//! Sort engine
//!
//! Reorders scored hits by keyword field values, relevance score, document
//! id, or a caller-supplied script. Keyword values compare byte by byte,
//! never numerically: `"2000"` sorts before `"5"` ascending. Sorting is
//! stable, so hits with equal keys keep their relevance order.

use crate::error::TermdexError;
use crate::models::Document;
use crate::query::{QueryContext, ScoredDoc};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Sort direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// How the values a sort script returns are compared
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptSortType {
    #[default]
    Number,
    String,
}

/// Value produced by a script
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptValue {
    Bool(bool),
    Number(f64),
    String(String),
    Null,
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        ScriptValue::Number(value)
    }
}

impl From<i64> for ScriptValue {
    fn from(value: i64) -> Self {
        ScriptValue::Number(value as f64)
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        ScriptValue::Bool(value)
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        ScriptValue::String(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        ScriptValue::String(value)
    }
}

impl<T: Into<ScriptValue>> From<Option<T>> for ScriptValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ScriptValue::Null, Into::into)
    }
}

/// Compiled per-document function used by script sorts and script fields
#[derive(Clone)]
pub struct Script(Arc<dyn Fn(&Document) -> ScriptValue + Send + Sync>);

impl Script {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Document) -> ScriptValue + Send + Sync + 'static,
    {
        Script(Arc::new(f))
    }

    pub fn evaluate(&self, doc: &Document) -> ScriptValue {
        (self.0)(doc)
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Script(..)")
    }
}

/// One sort key
#[derive(Clone, Debug)]
pub enum SortCriterion {
    /// Raw keyword value; multi-valued fields use min ascending, max descending
    Field { field: String, order: SortOrder },
    Score { order: SortOrder },
    Id { order: SortOrder },
    Script {
        script: Script,
        kind: ScriptSortType,
        order: SortOrder,
    },
}

impl SortCriterion {
    pub fn field(field: impl Into<String>, order: SortOrder) -> Self {
        SortCriterion::Field {
            field: field.into(),
            order,
        }
    }

    pub fn score() -> Self {
        SortCriterion::Score {
            order: SortOrder::Desc,
        }
    }

    pub fn id(order: SortOrder) -> Self {
        SortCriterion::Id { order }
    }

    pub fn script(script: Script, kind: ScriptSortType, order: SortOrder) -> Self {
        SortCriterion::Script {
            script,
            kind,
            order,
        }
    }

    pub fn order(&self) -> SortOrder {
        match self {
            SortCriterion::Field { order, .. }
            | SortCriterion::Score { order }
            | SortCriterion::Id { order }
            | SortCriterion::Script { order, .. } => *order,
        }
    }

    /// Reject fields that cannot be sorted on
    pub fn validate(&self, ctx: &QueryContext<'_>) -> Result<()> {
        if let SortCriterion::Field { field, .. } = self {
            let field_type = ctx.field_type(field)?;
            if !field_type.is_aggregatable() {
                return Err(TermdexError::InvalidRequest(format!(
                    "cannot sort on {} field '{}'",
                    field_type.type_name(),
                    field
                )));
            }
        }
        Ok(())
    }

    fn key(&self, doc: Option<&Document>, hit: &ScoredDoc) -> SortValue {
        match self {
            SortCriterion::Score { .. } => SortValue::Number(hit.score as f64),
            SortCriterion::Id { .. } => doc.map_or(SortValue::Null, |d| SortValue::Integer(d.id)),
            SortCriterion::Field { field, order } => {
                let values = doc.map(|d| d.values(field)).unwrap_or_default();
                let chosen = match order {
                    SortOrder::Asc => values.into_iter().min(),
                    SortOrder::Desc => values.into_iter().max(),
                };
                chosen.map_or(SortValue::Null, |v| SortValue::String(v.to_string()))
            }
            SortCriterion::Script { script, kind, .. } => match doc {
                Some(doc) => script_key(script.evaluate(doc), *kind),
                None => SortValue::Null,
            },
        }
    }
}

fn script_key(value: ScriptValue, kind: ScriptSortType) -> SortValue {
    match (kind, value) {
        (_, ScriptValue::Null) => SortValue::Null,
        (ScriptSortType::Number, ScriptValue::Number(n)) => SortValue::Number(n),
        (ScriptSortType::Number, ScriptValue::Bool(b)) => SortValue::Number(if b { 1.0 } else { 0.0 }),
        (ScriptSortType::Number, ScriptValue::String(s)) => {
            s.trim().parse().map_or(SortValue::Null, SortValue::Number)
        }
        (ScriptSortType::String, ScriptValue::String(s)) => SortValue::String(s),
        (ScriptSortType::String, ScriptValue::Number(n)) => SortValue::String(n.to_string()),
        (ScriptSortType::String, ScriptValue::Bool(b)) => SortValue::String(b.to_string()),
    }
}

/// Sort key of one hit, reported back in `Hit::sort`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortValue {
    Integer(u64),
    Number(f64),
    String(String),
    Null,
}

impl SortValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SortValue::Null)
    }

    /// Compare two keys of the same criterion; missing keys sort last
    fn compare(&self, other: &SortValue, order: SortOrder) -> Ordering {
        match (self, other) {
            (SortValue::Null, SortValue::Null) => Ordering::Equal,
            (SortValue::Null, _) => Ordering::Greater,
            (_, SortValue::Null) => Ordering::Less,
            (SortValue::Integer(a), SortValue::Integer(b)) => order.apply(a.cmp(b)),
            (SortValue::Number(a), SortValue::Number(b)) => order.apply(a.total_cmp(b)),
            (SortValue::String(a), SortValue::String(b)) => {
                order.apply(a.as_bytes().cmp(b.as_bytes()))
            }
            // Mixed kinds only arise from inconsistent scripts
            (a, b) => order.apply(a.rank().cmp(&b.rank())),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortValue::Integer(_) | SortValue::Number(_) => 0,
            SortValue::String(_) => 1,
            SortValue::Null => 2,
        }
    }
}

/// A hit with the sort keys that placed it
#[derive(Clone, Debug, PartialEq)]
pub struct SortedHit {
    pub hit: ScoredDoc,
    pub sort: Vec<SortValue>,
}

/// Sort hits by `criteria`
///
/// `hits` must already be in relevance order; it is the final tie-breaker.
/// With no criteria the hits are returned unchanged with empty keys.
pub fn sort_hits(
    ctx: &QueryContext<'_>,
    hits: Vec<ScoredDoc>,
    criteria: &[SortCriterion],
) -> Result<Vec<SortedHit>> {
    for criterion in criteria {
        criterion.validate(ctx)?;
    }

    let mut sorted: Vec<SortedHit> = hits
        .into_iter()
        .map(|hit| {
            let doc = ctx.document(hit.docno);
            let sort = criteria.iter().map(|c| c.key(doc, &hit)).collect();
            SortedHit { hit, sort }
        })
        .collect();

    if !criteria.is_empty() {
        sorted.sort_by(|a, b| {
            criteria
                .iter()
                .zip(a.sort.iter().zip(b.sort.iter()))
                .map(|(criterion, (ka, kb))| ka.compare(kb, criterion.order()))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    Ok(sorted)
}
