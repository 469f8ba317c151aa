//! Composable filter expressions and query options.
//!
//! Expressions are built with [`Filter`] and combined with [`Expr::and`], [`Expr::or`] and
//! [`Expr::not`]. A [`Query`] bundles an expression with sort keys, skip and limit and is
//! translated into a MongoDB filter document by [`FilterTranslator`].
//!
//! ```ignore
//! use mongolayer::query::{Filter, Query, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("status", "published").and(Filter::gte("view_count", 100)))
//!     .sort("created_at", SortDirection::Desc)
//!     .limit(10)
//!     .build();
//! ```
//!
//! # Filter Expression API
//!
//! - Comparison: `eq`, `ne`, `gt`, `gte`, `lt`, `lte`
//! - String: `starts_with`, `ends_with`, `contains`, `not_contains`, `regex`
//! - Existence: `exists`, `not_exists`
//! - Array: `any_of`, `none_of`
//! - Full text: `text`
//! - Logical: `and`, `or`

use bson::{Bson, Document, doc};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// The numeric form used in sort and index key documents.
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// A single sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Field comparison operators for filter expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// String contains value (case-insensitive) or array contains all values.
    Contains,
    /// Negation of [`FieldOp::Contains`].
    NotContains,
    /// String starts with value (case-insensitive).
    StartsWith,
    /// String ends with value (case-insensitive).
    EndsWith,
    /// Field matches any of the values.
    AnyOf,
    /// Field matches none of the values.
    NoneOf,
}

/// A filter expression for querying documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// All expressions must match.
    And(Vec<Expr>),
    /// Any expression must match.
    Or(Vec<Expr>),
    /// Inverts the expression.
    Not(Box<Expr>),
    /// Field exists (`true`) or is missing (`false`).
    Exists(String, bool),
    /// Field comparison expression.
    Field {
        field: String,
        op: FieldOp,
        value: Bson,
    },
    /// Raw regular expression match, pattern passed through untouched.
    Regex {
        field: String,
        pattern: String,
        options: String,
    },
    /// Full-text search over the collection's text index.
    Text(String),
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
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

    /// Negates this expression (logical NOT).
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Translates this expression into a MongoDB filter document.
    pub fn to_filter(&self) -> DocumentStoreResult<Document> {
        FilterTranslator.visit_expr(self)
    }
}

/// Static constructors for filter expressions.
///
/// All methods accept field names and values as `Into<String>` and `Into<Bson>`.
pub struct Filter;

macro_rules! field_constructors {
    ($($(#[$attr:meta])* $name:ident => $op:ident;)*) => {
        $(
            $(#[$attr])*
            pub fn $name(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
                Expr::field(field.into(), FieldOp::$op, value.into())
            }
        )*
    };
}

impl Filter {
    field_constructors! {
        eq => Eq;
        ne => Ne;
        gt => Gt;
        gte => Gte;
        lt => Lt;
        lte => Lte;
        /// Matches strings starting with `value`, ignoring case. `value` is matched literally.
        starts_with => StartsWith;
        /// Matches strings ending with `value`, ignoring case. `value` is matched literally.
        ends_with => EndsWith;
        /// Matches strings containing `value` (ignoring case) or arrays containing every
        /// element of an array `value`.
        contains => Contains;
        not_contains => NotContains;
        /// Matches documents whose field equals any element of the array `value`.
        any_of => AnyOf;
        /// Matches documents whose field equals no element of the array `value`.
        none_of => NoneOf;
    }

    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }

    /// Raw regular expression with MongoDB option letters (`i`, `m`, `x`, `s`).
    pub fn regex(field: impl Into<String>, pattern: impl Into<String>, options: impl Into<String>) -> Expr {
        Expr::Regex {
            field: field.into(),
            pattern: pattern.into(),
            options: options.into(),
        }
    }

    /// Full-text search. The collection needs a text index.
    pub fn text(search: impl Into<String>) -> Expr {
        Expr::Text(search.into())
    }
}

/// A structured query: filter, sort keys, skip and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Expr>,
    pub sort: Vec<Sort>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// The filter document, `{}` when no filter is set.
    pub fn filter_document(&self) -> DocumentStoreResult<Document> {
        match &self.filter {
            Some(expr) => expr.to_filter(),
            None => Ok(Document::new()),
        }
    }

    /// The sort document, or `None` when no sort keys are set.
    pub fn sort_document(&self) -> Option<Document> {
        if self.sort.is_empty() {
            return None;
        }

        Some(
            self.sort
                .iter()
                .map(|sort| (sort.field.clone(), Bson::Int32(sort.direction.as_i32())))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter expression for this query.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: i64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Sets the number of documents to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.query.skip = Some(skip);
        self
    }

    /// Appends a sort key. Keys apply in the order they are added.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort.push(Sort { field: field.into(), direction });
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}

/// Visitor over [`Expr`] trees.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_regex(
        &mut self,
        field: &str,
        pattern: &str,
        options: &str,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_text(&mut self, search: &str) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
            Expr::Regex { field, pattern, options } => self.visit_regex(field, pattern, options),
            Expr::Text(search) => self.visit_text(search),
        }
    }
}

/// Translates [`Expr`] trees into MongoDB filter documents.
///
/// String operators escape regular expression metacharacters in the value, so
/// `Filter::contains("title", "c++")` matches the literal text.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilterTranslator;

impl FilterTranslator {
    fn visit_all(&mut self, exprs: &[Expr]) -> DocumentStoreResult<Vec<Document>> {
        exprs.iter().map(|expr| self.visit_expr(expr)).collect()
    }

    fn literal_regex(pattern: String) -> Document {
        doc! { "$regex": pattern, "$options": "i" }
    }
}

impl QueryVisitor for FilterTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> DocumentStoreResult<Document> {
        Ok(doc! { "$and": self.visit_all(exprs)? })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> DocumentStoreResult<Document> {
        Ok(doc! { "$or": self.visit_all(exprs)? })
    }

    // `$not` only applies to operator expressions, `$nor` negates a whole filter.
    fn visit_not(&mut self, expr: &Expr) -> DocumentStoreResult<Document> {
        let negated = self.visit_expr(expr)?;
        Ok(doc! { "$nor": [negated] })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> DocumentStoreResult<Document> {
        Ok(doc! { field: { "$exists": should_exist } })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> DocumentStoreResult<Document> {
        let condition = match op {
            FieldOp::Eq => doc! { "$eq": value },
            FieldOp::Ne => doc! { "$ne": value },
            FieldOp::Gt => doc! { "$gt": value },
            FieldOp::Gte => doc! { "$gte": value },
            FieldOp::Lt => doc! { "$lt": value },
            FieldOp::Lte => doc! { "$lte": value },
            FieldOp::Contains => match value {
                Bson::String(s) => Self::literal_regex(escape_regex(s)),
                Bson::Array(arr) => doc! { "$all": arr },
                _ => return Err(invalid_operand("contains", "a string or array")),
            },
            FieldOp::NotContains => match value {
                Bson::String(s) => doc! { "$not": Self::literal_regex(escape_regex(s)) },
                Bson::Array(arr) => doc! { "$nin": arr },
                _ => return Err(invalid_operand("not_contains", "a string or array")),
            },
            FieldOp::StartsWith => match value {
                Bson::String(s) => Self::literal_regex(format!("^{}", escape_regex(s))),
                _ => return Err(invalid_operand("starts_with", "a string")),
            },
            FieldOp::EndsWith => match value {
                Bson::String(s) => Self::literal_regex(format!("{}$", escape_regex(s))),
                _ => return Err(invalid_operand("ends_with", "a string")),
            },
            FieldOp::AnyOf => match value {
                Bson::Array(arr) => doc! { "$in": arr },
                _ => return Err(invalid_operand("any_of", "an array")),
            },
            FieldOp::NoneOf => match value {
                Bson::Array(arr) => doc! { "$nin": arr },
                _ => return Err(invalid_operand("none_of", "an array")),
            },
        };

        Ok(doc! { field: condition })
    }

    fn visit_regex(&mut self, field: &str, pattern: &str, options: &str) -> DocumentStoreResult<Document> {
        let mut regex = doc! { "$regex": pattern };
        if !options.is_empty() {
            regex.insert("$options", options);
        }

        Ok(doc! { field: regex })
    }

    fn visit_text(&mut self, search: &str) -> DocumentStoreResult<Document> {
        Ok(doc! { "$text": { "$search": search } })
    }
}

fn invalid_operand(op: &str, expected: &str) -> DocumentStoreError {
    DocumentStoreError::InvalidDocument(format!("{op} operator requires {expected} value"))
}

/// Escapes regular expression metacharacters so `text` matches literally.
pub fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | '#' | '-'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn comparison_operators() {
        assert_eq!(Filter::eq("status", "active").to_filter().unwrap(), doc! { "status": { "$eq": "active" } });
        assert_eq!(Filter::gte("age", 18).to_filter().unwrap(), doc! { "age": { "$gte": 18 } });
        assert_eq!(Filter::lt("age", 65).to_filter().unwrap(), doc! { "age": { "$lt": 65 } });
    }

    #[test]
    fn and_flattens_chained_calls() {
        let expr = Filter::eq("a", 1).and(Filter::eq("b", 2)).and(Filter::eq("c", 3));
        let Expr::And(list) = &expr else {
            panic!("expected and expression");
        };
        assert_eq!(list.len(), 3);

        assert_eq!(
            expr.to_filter().unwrap(),
            doc! { "$and": [{ "a": { "$eq": 1 } }, { "b": { "$eq": 2 } }, { "c": { "$eq": 3 } }] },
        );
    }

    #[test]
    fn or_and_not() {
        let expr = Filter::or([Filter::exists("email"), Filter::not_exists("phone")]).not();

        assert_eq!(
            expr.to_filter().unwrap(),
            doc! { "$nor": [{ "$or": [{ "email": { "$exists": true } }, { "phone": { "$exists": false } }] }] },
        );
    }

    #[test]
    fn string_operators_escape_input() {
        assert_eq!(
            Filter::contains("title", "c++").to_filter().unwrap(),
            doc! { "title": { "$regex": "c\\+\\+", "$options": "i" } },
        );
        assert_eq!(
            Filter::starts_with("title", "Go").to_filter().unwrap(),
            doc! { "title": { "$regex": "^Go", "$options": "i" } },
        );
        assert_eq!(
            Filter::ends_with("file", ".rs").to_filter().unwrap(),
            doc! { "file": { "$regex": "\\.rs$", "$options": "i" } },
        );
    }

    #[test]
    fn array_operators() {
        let tags = vec!["rust", "mongodb"];
        assert_eq!(
            Filter::contains("tags", tags.clone()).to_filter().unwrap(),
            doc! { "tags": { "$all": ["rust", "mongodb"] } },
        );
        assert_eq!(
            Filter::any_of("status", tags.clone()).to_filter().unwrap(),
            doc! { "status": { "$in": ["rust", "mongodb"] } },
        );
        assert_eq!(
            Filter::none_of("status", tags).to_filter().unwrap(),
            doc! { "status": { "$nin": ["rust", "mongodb"] } },
        );
    }

    #[test]
    fn wrong_operand_type_is_an_error() {
        let err = Filter::starts_with("age", 3).to_filter().unwrap_err();
        assert!(matches!(err, DocumentStoreError::InvalidDocument(_)));

        let err = Filter::any_of("status", "draft").to_filter().unwrap_err();
        assert!(matches!(err, DocumentStoreError::InvalidDocument(_)));
    }

    #[test]
    fn regex_and_text() {
        assert_eq!(
            Filter::regex("name", "^a.*z$", "").to_filter().unwrap(),
            doc! { "name": { "$regex": "^a.*z$" } },
        );
        assert_eq!(
            Filter::regex("name", "^a", "im").to_filter().unwrap(),
            doc! { "name": { "$regex": "^a", "$options": "im" } },
        );
        assert_eq!(Filter::text("rust").to_filter().unwrap(), doc! { "$text": { "$search": "rust" } });
    }

    #[test]
    fn query_builder_collects_options() {
        let query = Query::builder()
            .filter(Filter::eq("status", "published"))
            .sort("created_at", SortDirection::Desc)
            .sort("title", SortDirection::Asc)
            .skip(20)
            .limit(10)
            .build();

        assert_eq!(query.skip, Some(20));
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.sort_document(), Some(doc! { "created_at": -1, "title": 1 }));
        assert_eq!(query.filter_document().unwrap(), doc! { "status": { "$eq": "published" } });
    }

    #[test]
    fn empty_query() {
        let query = Query::new();
        assert_eq!(query.filter_document().unwrap(), Document::new());
        assert_eq!(query.sort_document(), None);
    }
}
