//! Caller-supplied query conditions.

use chrono::{DateTime, Utc};
use ledgerhub_core::{AppError, AppResult};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// A bindable column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
    Int(i64),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
    UuidList(Vec<Uuid>),
    TextList(Vec<String>),
}

impl Value {
    pub(crate) fn push_bind(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        match self.clone() {
            Self::Uuid(v) => qb.push_bind(v),
            Self::Text(v) => qb.push_bind(v),
            Self::Bool(v) => qb.push_bind(v),
            Self::Int(v) => qb.push_bind(v),
            Self::Timestamp(v) => qb.push_bind(v),
            Self::Json(v) => qb.push_bind(v),
            Self::UuidList(v) => qb.push_bind(v),
            Self::TextList(v) => qb.push_bind(v),
        };
    }

    fn is_list(&self) -> bool {
        matches!(self, Self::UuidList(_) | Self::TextList(_))
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<Vec<Uuid>> for Value {
    fn from(v: Vec<Uuid>) -> Self {
        Self::UuidList(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Self::TextList(v)
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
}

impl Op {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => " = ",
            Self::Ne => " <> ",
            Self::Lt => " < ",
            Self::Le => " <= ",
            Self::Gt => " > ",
            Self::Ge => " >= ",
            Self::In => " = ANY(",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Compare {
        column: &'static str,
        op: Op,
        value: Value,
    },
    IsNull(&'static str),
    IsNotNull(&'static str),
}

/// Conditions, ordering and limit appended after the scope predicate.
///
/// ```ignore
/// let filter = Filter::new()
///     .eq("is_active", true)
///     .order_by("created_at")
///     .limit(50);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
    order: Vec<(&'static str, bool)>,
    limit: Option<i64>,
}

impl Filter {
    /// An empty filter matching every row in scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on a single primary key.
    pub fn by_id(id: Uuid) -> Self {
        Self::new().eq("id", id)
    }

    fn compare(mut self, column: &'static str, op: Op, value: Value) -> Self {
        self.conditions.push(Condition::Compare { column, op, value });
        self
    }

    pub fn eq(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.compare(column, Op::Eq, value.into())
    }

    pub fn ne(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.compare(column, Op::Ne, value.into())
    }

    pub fn lt(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.compare(column, Op::Lt, value.into())
    }

    pub fn le(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.compare(column, Op::Le, value.into())
    }

    pub fn gt(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.compare(column, Op::Gt, value.into())
    }

    pub fn ge(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.compare(column, Op::Ge, value.into())
    }

    /// Match any of the listed values.
    pub fn is_in(self, column: &'static str, values: impl Into<Value>) -> Self {
        self.compare(column, Op::In, values.into())
    }

    pub fn is_null(mut self, column: &'static str) -> Self {
        self.conditions.push(Condition::IsNull(column));
        self
    }

    pub fn is_not_null(mut self, column: &'static str) -> Self {
        self.conditions.push(Condition::IsNotNull(column));
        self
    }

    /// Ascending order on `column`.
    pub fn order_by(mut self, column: &'static str) -> Self {
        self.order.push((column, false));
        self
    }

    /// Descending order on `column`.
    pub fn order_by_desc(mut self, column: &'static str) -> Self {
        self.order.push((column, true));
        self
    }

    /// Cap the number of returned rows.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Reject filters that touch reserved columns or are malformed.
    pub(crate) fn check(&self, reserved: &[&str]) -> AppResult<()> {
        for condition in &self.conditions {
            let column = match condition {
                Condition::Compare { column, op, value } => {
                    if (*op == Op::In) != value.is_list() {
                        return Err(AppError::validation(format!(
                            "Operator {op:?} on '{column}' does not match the value shape"
                        )));
                    }
                    column
                }
                Condition::IsNull(column) | Condition::IsNotNull(column) => column,
            };
            check_column(column, reserved)?;
        }
        for (column, _) in &self.order {
            check_identifier(column)?;
        }
        if matches!(self.limit, Some(n) if n < 0) {
            return Err(AppError::validation("Query limit must not be negative"));
        }
        Ok(())
    }

    /// Append ` AND <cond>` for each condition.
    pub(crate) fn push_conditions(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        for condition in &self.conditions {
            qb.push(" AND ");
            match condition {
                Condition::Compare { column, op, value } => {
                    qb.push(*column).push(op.as_sql());
                    value.push_bind(qb);
                    if *op == Op::In {
                        qb.push(")");
                    }
                }
                Condition::IsNull(column) => {
                    qb.push(*column).push(" IS NULL");
                }
                Condition::IsNotNull(column) => {
                    qb.push(*column).push(" IS NOT NULL");
                }
            }
        }
    }

    /// Append `ORDER BY` and `LIMIT` clauses.
    pub(crate) fn push_tail(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        if !self.order.is_empty() {
            qb.push(" ORDER BY ");
            let mut separated = qb.separated(", ");
            for (column, desc) in &self.order {
                separated.push(if *desc {
                    format!("{column} DESC")
                } else {
                    column.to_string()
                });
            }
        }
        if let Some(limit) = self.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }
    }
}

/// Accept plain lowercase SQL identifiers only.
pub(crate) fn check_identifier(name: &str) -> AppResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(AppError::validation(format!("Invalid column or table name: '{name}'")))
    }
}

/// Accept an identifier that is not one of the scope columns.
pub(crate) fn check_column(name: &str, reserved: &[&str]) -> AppResult<()> {
    check_identifier(name)?;
    if reserved.contains(&name) {
        return Err(AppError::validation(format!(
            "Column '{name}' is managed by the tenant scope and cannot be set by callers"
        )));
    }
    Ok(())
}
