//! SQL fragment assembly for search statements.
//!
//! Fragments carry position-independent `?` placeholders; a single numbering
//! pass at build time rewrites them into `$n` form and merges binding groups
//! in textual order. This is the minimum assembly search needs, not a
//! query-builder DSL.

use crate::{request::SortDirection, value::SqlValue};

/// A finished statement: numbered placeholders plus bindings in placeholder
/// order.
#[derive(Debug)]
pub struct Statement {
	pub sql: String,
	pub bindings: Vec<SqlValue>,
}

pub fn quote_ident(ident: &str) -> String {
	format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Rewrites each `?` into `$1..$n` in order of appearance. Values are always
/// bound, never inlined, so a literal `?` cannot occur outside a placeholder.
fn number_placeholders(sql: &str) -> String {
	let mut out = String::with_capacity(sql.len() + 8);
	let mut n = 0_usize;

	for ch in sql.chars() {
		if ch == '?' {
			n += 1;

			out.push('$');
			out.push_str(&n.to_string());
		} else {
			out.push(ch);
		}
	}

	out
}

fn finalize(sql: String, bindings: Vec<SqlValue>) -> Statement {
	Statement { sql: number_placeholders(&sql), bindings }
}

/// Assembles one `SELECT` statement clause by clause. Binding groups merge in
/// the order the clauses render: select items, joins, predicates.
#[derive(Debug, Default)]
pub struct SelectBuilder {
	table: String,
	columns: Vec<String>,
	select_bindings: Vec<SqlValue>,
	joins: Vec<String>,
	join_bindings: Vec<SqlValue>,
	wheres: Vec<String>,
	where_bindings: Vec<SqlValue>,
	orders: Vec<String>,
	offset: Option<u64>,
	limit: Option<u64>,
}
impl SelectBuilder {
	pub fn new(table: &str) -> Self {
		Self { table: quote_ident(table), ..Self::default() }
	}

	pub fn select(&mut self, column: &str) -> &mut Self {
		self.columns.push(quote_ident(column));

		self
	}

	pub fn select_raw(&mut self, expression: &str, bindings: Vec<SqlValue>) -> &mut Self {
		self.columns.push(expression.to_string());
		self.select_bindings.extend(bindings);

		self
	}

	pub fn where_raw(&mut self, predicate: &str, bindings: Vec<SqlValue>) -> &mut Self {
		self.wheres.push(predicate.to_string());
		self.where_bindings.extend(bindings);

		self
	}

	pub fn where_eq(&mut self, column: &str, value: SqlValue) -> &mut Self {
		self.wheres.push(format!("{} = {}", quote_ident(column), value.placeholder()));
		self.where_bindings.push(value);

		self
	}

	pub fn where_null(&mut self, column: &str) -> &mut Self {
		self.wheres.push(format!("{} IS NULL", quote_ident(column)));

		self
	}

	pub fn order_by(&mut self, column: &str, direction: SortDirection) -> &mut Self {
		self.orders.push(format!("{} {}", quote_ident(column), direction.as_sql()));

		self
	}

	pub fn skip(&mut self, offset: u64) -> &mut Self {
		self.offset = Some(offset);

		self
	}

	pub fn limit(&mut self, limit: u64) -> &mut Self {
		self.limit = Some(limit);

		self
	}

	/// Joins a raw derived relation, e.g. a parsed query expression aliased to
	/// its placeholder name. Its bindings splice in at the join's textual
	/// position.
	pub fn cross_join_raw(&mut self, relation: &str, bindings: Vec<SqlValue>) -> &mut Self {
		self.joins.push(relation.to_string());
		self.join_bindings.extend(bindings);

		self
	}

	pub fn build(self) -> Statement {
		let mut sql = format!("SELECT {} FROM {}", self.columns.join(", "), self.table);
		let mut bindings = self.select_bindings;

		for join in &self.joins {
			sql.push_str(" CROSS JOIN ");
			sql.push_str(join);
		}

		bindings.extend(self.join_bindings);

		if !self.wheres.is_empty() {
			sql.push_str(" WHERE ");
			sql.push_str(&self.wheres.join(" AND "));
		}

		bindings.extend(self.where_bindings);

		if !self.orders.is_empty() {
			sql.push_str(" ORDER BY ");
			sql.push_str(&self.orders.join(", "));
		}
		if let Some(limit) = self.limit {
			sql.push_str(&format!(" LIMIT {limit}"));
		}
		if let Some(offset) = self.offset {
			sql.push_str(&format!(" OFFSET {offset}"));
		}

		finalize(sql, bindings)
	}
}

/// Pure expression evaluation, no table.
pub fn scalar_select(expression: &str, bindings: Vec<SqlValue>) -> Statement {
	finalize(format!("SELECT {expression}"), bindings)
}

pub fn update(
	table: &str,
	assignments: &[(String, SqlValue)],
	key: &str,
	key_value: &SqlValue,
) -> Statement {
	let set = assignments
		.iter()
		.map(|(column, value)| format!("{} = {}", quote_ident(column), value.placeholder()))
		.collect::<Vec<_>>()
		.join(", ");
	let sql = format!(
		"UPDATE {} SET {set} WHERE {} = {}",
		quote_ident(table),
		quote_ident(key),
		key_value.placeholder(),
	);
	let mut bindings = assignments.iter().map(|(_, value)| value.clone()).collect::<Vec<_>>();

	bindings.push(key_value.clone());

	finalize(sql, bindings)
}

pub fn update_where_in(
	table: &str,
	assignments: &[(String, SqlValue)],
	key: &str,
	key_values: &[SqlValue],
) -> Statement {
	let set = assignments
		.iter()
		.map(|(column, value)| format!("{} = {}", quote_ident(column), value.placeholder()))
		.collect::<Vec<_>>()
		.join(", ");
	let membership = if key_values.is_empty() {
		// Vacuous batch; match nothing rather than emit `IN ()`.
		"1 = 0".to_string()
	} else {
		let placeholders =
			key_values.iter().map(SqlValue::placeholder).collect::<Vec<_>>().join(", ");

		format!("{} IN ({placeholders})", quote_ident(key))
	};
	let sql = format!("UPDATE {} SET {set} WHERE {membership}", quote_ident(table));
	let mut bindings = assignments.iter().map(|(_, value)| value.clone()).collect::<Vec<_>>();

	bindings.extend(key_values.iter().cloned());

	finalize(sql, bindings)
}

pub fn update_all(table: &str, assignments: &[(String, SqlValue)]) -> Statement {
	let set = assignments
		.iter()
		.map(|(column, value)| format!("{} = {}", quote_ident(column), value.placeholder()))
		.collect::<Vec<_>>()
		.join(", ");

	finalize(
		format!("UPDATE {} SET {set}", quote_ident(table)),
		assignments.iter().map(|(_, value)| value.clone()).collect(),
	)
}

pub fn insert(table: &str, assignments: &[(String, SqlValue)]) -> Statement {
	let columns =
		assignments.iter().map(|(column, _)| quote_ident(column)).collect::<Vec<_>>().join(", ");
	let placeholders = assignments
		.iter()
		.map(|(_, value)| value.placeholder())
		.collect::<Vec<_>>()
		.join(", ");

	finalize(
		format!("INSERT INTO {} ({columns}) VALUES ({placeholders})", quote_ident(table)),
		assignments.iter().map(|(_, value)| value.clone()).collect(),
	)
}

/// Probe for an existing row at the given key.
pub fn exists(table: &str, key: &str, key_value: &SqlValue) -> Statement {
	finalize(
		format!(
			"SELECT 1 AS one FROM {} WHERE {} = {} LIMIT 1",
			quote_ident(table),
			quote_ident(key),
			key_value.placeholder(),
		),
		vec![key_value.clone()],
	)
}
