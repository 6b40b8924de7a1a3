use std::collections::HashMap;

use crate::{Error, Result, value::SqlValue};

/// One way of turning a raw user query into a parsed tsquery expression.
///
/// `sql()` emits a fragment with `?` placeholders; `bindings()` returns the
/// matching values in emission order. Placeholder count and binding count are
/// always equal.
pub trait TsQueryExpression: Send + Sync {
	fn sql(&self) -> String;
	fn bindings(&self) -> Vec<SqlValue>;
}

/// Loose multi-word matching; punctuation and operators in the input are
/// ignored and terms are AND-ed.
pub struct PlainQuery {
	query: String,
	config: Option<String>,
}

/// Ordered-adjacency matching; terms must appear in sequence.
pub struct PhraseQuery {
	query: String,
	config: Option<String>,
}

/// Raw operator syntax; the input must already use tsquery operators, and
/// malformed syntax surfaces as a database error.
pub struct TsQuery {
	query: String,
	config: Option<String>,
}

/// Web-search syntax: quoted phrases, `-exclude`, "or".
pub struct WebSearchQuery {
	query: String,
	config: Option<String>,
}

macro_rules! impl_expression {
	($type:ident, $function:literal) => {
		impl $type {
			pub fn new(query: impl Into<String>, config: Option<String>) -> Self {
				Self { query: query.into(), config }
			}

			pub fn boxed(query: String, config: Option<String>) -> Box<dyn TsQueryExpression> {
				Box::new(Self { query, config })
			}
		}
		impl TsQueryExpression for $type {
			fn sql(&self) -> String {
				parse_call_sql($function)
			}

			fn bindings(&self) -> Vec<SqlValue> {
				parse_call_bindings(self.config.as_deref(), &self.query)
			}
		}
	};
}

impl_expression!(PlainQuery, "plainto_tsquery");
impl_expression!(PhraseQuery, "phraseto_tsquery");
impl_expression!(TsQuery, "to_tsquery");
impl_expression!(WebSearchQuery, "websearch_to_tsquery");

// The configuration is bound rather than inlined so a null falls back to the
// session default at evaluation time, not at call time.
fn parse_call_sql(function: &str) -> String {
	format!("{function}(COALESCE(?::regconfig, get_current_ts_config()), ?)")
}

fn parse_call_bindings(config: Option<&str>, query: &str) -> Vec<SqlValue> {
	vec![SqlValue::from(config.map(str::to_string)), SqlValue::from(query)]
}

pub type ExpressionFactory = fn(String, Option<String>) -> Box<dyn TsQueryExpression>;

/// Maps a variant name to a constructor. New variants are added by
/// registering a factory, never by branching in the assembler.
pub struct QueryExpressionRegistry {
	factories: HashMap<String, ExpressionFactory>,
}
impl QueryExpressionRegistry {
	pub fn register(&mut self, name: &str, factory: ExpressionFactory) -> Result<()> {
		let name = name.to_lowercase();

		if self.factories.contains_key(&name) {
			return Err(Error::DuplicateExpression { name });
		}

		self.factories.insert(name, factory);

		Ok(())
	}

	/// Builds the named variant; unknown names fall back to `plainquery`.
	pub fn resolve(
		&self,
		name: &str,
		query: String,
		config: Option<String>,
	) -> Box<dyn TsQueryExpression> {
		let factory =
			self.factories.get(&name.to_lowercase()).copied().unwrap_or(PlainQuery::boxed);

		factory(query, config)
	}
}
impl Default for QueryExpressionRegistry {
	fn default() -> Self {
		let mut registry = Self { factories: HashMap::new() };

		for (name, factory) in [
			("plainquery", PlainQuery::boxed as ExpressionFactory),
			("phrasequery", PhraseQuery::boxed),
			("tsquery", TsQuery::boxed),
			("websearchquery", WebSearchQuery::boxed),
		] {
			registry.factories.insert(name.to_string(), factory);
		}

		registry
	}
}
