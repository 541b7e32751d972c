//! Query construction and filtering API for the SQL-like query language.
//!
//! This module provides an immutable query value with filtering and ordering, a
//! closed expression tree for WHERE clauses, and a visitor trait that turns an
//! expression into backend output (see [`crate::sql::SqlRenderer`]).
//!
//! # Query Building
//!
//! ```ignore
//! use cosmosdb_core::query::{Query, Filter, SortDirection};
//!
//! let query = Query::select(["a", "b"])
//!     .filter(Filter::eq("x", 1))
//!     .order_by("y", SortDirection::Desc);
//!
//! assert_eq!(query.to_string(), "SELECT a,b FROM c WHERE x = 1 ORDER BY y DESC");
//! ```
//!
//! # Filter Expression API
//!
//! The [`Filter`] struct provides static constructors for expressions:
//!
//! - Comparison: `eq`, `ne`, `gt`, `gte`, `lt`, `lte`
//! - Membership: `is_in`, `try_in`
//! - Null and definedness: `is_null`, `is_not_null`, `is_defined`, `is_not_defined`
//! - Arrays: `array_contains`, `array_contains_partial`, `array_not_contains`
//! - Logical: `and`, `or`
//!
//! Every builder method returns a new value, so a base query can be specialized
//! along several branches without affecting the others.

use bson::Bson;
use std::fmt;

use crate::{
    error::{CosmosError, CosmosResult},
    sql::SqlRenderer,
};

/// Source alias used when a query does not name one.
pub const DEFAULT_SOURCE: &str = "c";

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns the keyword used in an ORDER BY clause.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Ordering specification for query results.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field to order by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Comparison operators for filter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal to.
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
}

impl CompareOp {
    /// Returns the operator token.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

/// An operand of an `ARRAY_CONTAINS` predicate.
///
/// A field reference is emitted as-is, a value goes through the literal renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A path into the document, such as `c.tags`.
    Field(String),
    /// A constant or `@parameter` reference.
    Value(Bson),
}

impl Operand {
    /// Creates a field reference operand.
    pub fn field(path: impl Into<String>) -> Self {
        Operand::Field(path.into())
    }

    /// Creates a value operand.
    pub fn value(value: impl Into<Bson>) -> Self {
        Operand::Value(value.into())
    }
}

/// A node in a boolean filter expression.
///
/// Composite nodes always parenthesize their rendering so that precedence is
/// preserved at any nesting depth.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of the expressions, in order.
    And(Vec<Expr>),
    /// Logical OR of the expressions, in order.
    Or(Vec<Expr>),
    /// Field comparison.
    Compare {
        /// The field to compare.
        field: String,
        /// The comparison operator.
        op: CompareOp,
        /// The value to compare against.
        value: Bson,
    },
    /// Field membership in a list of values.
    In {
        /// The field to test.
        field: String,
        /// The candidate values.
        values: Vec<Bson>,
    },
    /// `IS_NULL(field)`, negated when `is_null` is false.
    IsNull {
        /// The field to test.
        field: String,
        /// Polarity of the check.
        is_null: bool,
    },
    /// `IS_DEFINED(field)`, negated when `is_defined` is false.
    IsDefined {
        /// The field to test.
        field: String,
        /// Polarity of the check.
        is_defined: bool,
    },
    /// `ARRAY_CONTAINS(container, value, partial)`, negated when `contains` is false.
    ArrayContains {
        /// The array to search.
        container: Operand,
        /// The element to look for.
        value: Operand,
        /// Whether a partial object match is enough.
        partial: bool,
        /// Polarity of the check.
        contains: bool,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn compare(field: String, op: CompareOp, value: Bson) -> Self {
        Expr::Compare { field, op, value }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR.
    ///
    /// If this expression is already an OR, the other expression is appended
    /// to the list. Otherwise, a new OR expression is created.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = SqlRenderer.visit_expr(self).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

/// Helper struct for constructing filter expressions.
///
/// Field names are accepted as `Into<String>` and values as `Into<Bson>`.
///
/// # Example
///
/// ```ignore
/// use cosmosdb_core::query::Filter;
///
/// let expr = Filter::eq("c.name", "Alice").and(Filter::gt("c.age", 18));
/// assert_eq!(expr.to_string(), "(c.name = 'Alice' AND c.age > 18)");
/// ```
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::compare(field.into(), CompareOp::Eq, value.into())
    }

    /// Matches documents where the field does not equal the value.
    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::compare(field.into(), CompareOp::Ne, value.into())
    }

    /// Matches documents where the field is greater than the value.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::compare(field.into(), CompareOp::Gt, value.into())
    }

    /// Matches documents where the field is greater than or equal to the value.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::compare(field.into(), CompareOp::Gte, value.into())
    }

    /// Matches documents where the field is less than the value.
    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::compare(field.into(), CompareOp::Lt, value.into())
    }

    /// Matches documents where the field is less than or equal to the value.
    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::compare(field.into(), CompareOp::Lte, value.into())
    }

    /// Matches documents where the field equals one of the values.
    pub fn is_in<V>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Expr
    where
        V: Into<Bson>,
    {
        Expr::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Like [`Filter::is_in`] for a value only known to be an array at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidQuery`] if `values` is not an array.
    pub fn try_in(field: impl Into<String>, values: impl Into<Bson>) -> CosmosResult<Expr> {
        let field = field.into();
        match values.into() {
            Bson::Array(values) => Ok(Expr::In { field, values }),
            other => Err(CosmosError::InvalidQuery(format!(
                "IN on field {} requires an array, got {:?}",
                field,
                other.element_type(),
            ))),
        }
    }

    /// Matches documents where the field is null.
    pub fn is_null(field: impl Into<String>) -> Expr {
        Expr::IsNull { field: field.into(), is_null: true }
    }

    /// Matches documents where the field is not null.
    pub fn is_not_null(field: impl Into<String>) -> Expr {
        Expr::IsNull { field: field.into(), is_null: false }
    }

    /// Matches documents where the field is present.
    pub fn is_defined(field: impl Into<String>) -> Expr {
        Expr::IsDefined { field: field.into(), is_defined: true }
    }

    /// Matches documents where the field is absent.
    pub fn is_not_defined(field: impl Into<String>) -> Expr {
        Expr::IsDefined { field: field.into(), is_defined: false }
    }

    /// Matches documents where the container array holds the value.
    pub fn array_contains(container: Operand, value: Operand) -> Expr {
        Expr::ArrayContains { container, value, partial: false, contains: true }
    }

    /// Like [`Filter::array_contains`], matching objects on a subset of their fields.
    pub fn array_contains_partial(container: Operand, value: Operand) -> Expr {
        Expr::ArrayContains { container, value, partial: true, contains: true }
    }

    /// Matches documents where the container array does not hold the value.
    pub fn array_not_contains(container: Operand, value: Operand) -> Expr {
        Expr::ArrayContains { container, value, partial: false, contains: false }
    }

    /// Combines expressions such that all must match.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Combines expressions such that any may match.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }
}

/// An immutable `SELECT` statement.
///
/// Builder methods borrow the receiver and return a modified copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    fields: Vec<String>,
    source: String,
    filter: Option<Expr>,
    sort: Option<Sort>,
}

impl Query {
    /// Starts a query projecting the given fields; no fields selects `*`.
    pub fn select<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields = fields.into_iter().map(Into::into).collect::<Vec<String>>();
        if fields.is_empty() {
            fields.push("*".to_string());
        }

        Query {
            fields,
            source: DEFAULT_SOURCE.to_string(),
            filter: None,
            sort: None,
        }
    }

    /// Starts a query selecting `*`.
    pub fn all() -> Self {
        Query::select(Vec::<String>::new())
    }

    /// Returns a copy reading from the given source alias.
    pub fn from(&self, source: impl Into<String>) -> Self {
        Query { source: source.into(), ..self.clone() }
    }

    /// Returns a copy with the WHERE expression replaced.
    pub fn filter(&self, filter: Expr) -> Self {
        Query { filter: Some(filter), ..self.clone() }
    }

    /// Returns a copy with the ORDER BY clause replaced.
    pub fn order_by(&self, field: impl Into<String>, direction: SortDirection) -> Self {
        Query {
            sort: Some(Sort { field: field.into(), direction }),
            ..self.clone()
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn filter_expr(&self) -> Option<&Expr> {
        self.filter.as_ref()
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }
}

impl Default for Query {
    fn default() -> Self {
        Query::all()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT {} FROM {}", self.fields.join(","), self.source)?;

        if let Some(filter) = &self.filter {
            write!(f, " WHERE {}", filter)?;
        }

        if let Some(sort) = &self.sort {
            write!(f, " ORDER BY {} {}", sort.field, sort.direction.as_str())?;
        }

        Ok(())
    }
}

/// Walks an expression tree, producing one output per node.
pub trait QueryVisitor {
    type Output;
    type Error: Into<CosmosError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_compare(
        &mut self,
        field: &str,
        op: CompareOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_in(&mut self, field: &str, values: &[Bson]) -> Result<Self::Output, Self::Error>;
    fn visit_is_null(&mut self, field: &str, is_null: bool) -> Result<Self::Output, Self::Error>;
    fn visit_is_defined(
        &mut self,
        field: &str,
        is_defined: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_array_contains(
        &mut self,
        container: &Operand,
        value: &Operand,
        partial: bool,
        contains: bool,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Compare { field, op, value } => self.visit_compare(field, *op, value),
            Expr::In { field, values } => self.visit_in(field, values),
            Expr::IsNull { field, is_null } => self.visit_is_null(field, *is_null),
            Expr::IsDefined { field, is_defined } => self.visit_is_defined(field, *is_defined),
            Expr::ArrayContains { container, value, partial, contains } => {
                self.visit_array_contains(container, value, *partial, *contains)
            }
        }
    }
}
