use std::fmt;

use crate::{sql::SelectBuilder, tsquery::TsQueryExpression, value::SqlValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
	Asc,
	Desc,
}
impl SortDirection {
	pub fn as_sql(self) -> &'static str {
		match self {
			Self::Asc => "ASC",
			Self::Desc => "DESC",
		}
	}
}

/// Builds the query expression for one request, overriding the configured
/// default variant. Receives the request, the resolved text-search
/// configuration, and the in-progress select statement.
pub type ExpressionCallback =
	Box<dyn Fn(&SearchRequest, Option<&str>, &mut SelectBuilder) -> Box<dyn TsQueryExpression> + Send + Sync>;

/// One search call: query string plus the caller's filters, ordering, and
/// limits. Constructed per call and discarded after use.
pub struct SearchRequest {
	pub query: String,
	/// Explicit table override; `None` uses the entity's index name.
	pub index: Option<String>,
	/// Equality filters, applied in order.
	pub wheres: Vec<(String, SqlValue)>,
	/// Explicit sort clauses; when empty the default rank/key order applies.
	pub orders: Vec<(String, SortDirection)>,
	/// Row cap for unpaginated search; `None` returns all matches.
	pub limit: Option<u32>,
	pub expression: Option<ExpressionCallback>,
}
impl SearchRequest {
	pub fn new(query: impl Into<String>) -> Self {
		Self {
			query: query.into(),
			index: None,
			wheres: Vec::new(),
			orders: Vec::new(),
			limit: None,
			expression: None,
		}
	}

	pub fn within(mut self, index: impl Into<String>) -> Self {
		self.index = Some(index.into());

		self
	}

	pub fn filter(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
		self.wheres.push((column.into(), value.into()));

		self
	}

	pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
		self.orders.push((column.into(), direction));

		self
	}

	pub fn take(mut self, limit: u32) -> Self {
		self.limit = Some(limit);

		self
	}

	pub fn with_expression(mut self, callback: ExpressionCallback) -> Self {
		self.expression = Some(callback);

		self
	}
}
impl fmt::Debug for SearchRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SearchRequest")
			.field("query", &self.query)
			.field("index", &self.index)
			.field("wheres", &self.wheres)
			.field("orders", &self.orders)
			.field("limit", &self.limit)
			.field("expression", &self.expression.as_ref().map(|_| "<callback>"))
			.finish()
	}
}
