use std::{
	collections::HashMap,
	hash::{Hash, Hasher},
	mem,
};

/// A positional binding value, covering the PostgreSQL types this backend
/// reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
	/// A computed tsvector carried in its text form. Its placeholder renders
	/// with a `::tsvector` cast so the typed parameter assigns cleanly.
	Vector(String),
	Uuid(uuid::Uuid),
	Timestamp(time::OffsetDateTime),
	Json(serde_json::Value),
}
impl SqlValue {
	/// The placeholder text this value occupies in a SQL fragment, before
	/// placeholder numbering.
	pub fn placeholder(&self) -> &'static str {
		match self {
			Self::Vector(_) => "?::tsvector",
			_ => "?",
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Int(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Float(value) => Some(*value),
			Self::Int(value) => Some(*value as f64),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Text(value) | Self::Vector(value) => Some(value),
			_ => None,
		}
	}
}
// Keys index a map during hydration. Floats hash by bit pattern; NaN keys
// would never equal themselves, which matches the silent-drop contract.
impl Eq for SqlValue {}
impl Hash for SqlValue {
	fn hash<H: Hasher>(&self, state: &mut H) {
		mem::discriminant(self).hash(state);

		match self {
			Self::Null => {},
			Self::Bool(value) => value.hash(state),
			Self::Int(value) => value.hash(state),
			Self::Float(value) => value.to_bits().hash(state),
			Self::Text(value) | Self::Vector(value) => value.hash(state),
			Self::Uuid(value) => value.hash(state),
			Self::Timestamp(value) => value.unix_timestamp_nanos().hash(state),
			Self::Json(value) => value.to_string().hash(state),
		}
	}
}
impl From<bool> for SqlValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<i64> for SqlValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}
impl From<f64> for SqlValue {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}
impl From<&str> for SqlValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}
impl From<String> for SqlValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<uuid::Uuid> for SqlValue {
	fn from(value: uuid::Uuid) -> Self {
		Self::Uuid(value)
	}
}
impl From<time::OffsetDateTime> for SqlValue {
	fn from(value: time::OffsetDateTime) -> Self {
		Self::Timestamp(value)
	}
}
impl From<serde_json::Value> for SqlValue {
	fn from(value: serde_json::Value) -> Self {
		Self::Json(value)
	}
}
impl<T> From<Option<T>> for SqlValue
where
	T: Into<SqlValue>,
{
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(Self::Null)
	}
}

/// One raw result row: column name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlRow(HashMap<String, SqlValue>);
impl SqlRow {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
		self.0.insert(column.into(), value.into());
	}

	pub fn get(&self, column: &str) -> Option<&SqlValue> {
		self.0.get(column)
	}

	pub fn as_i64(&self, column: &str) -> Option<i64> {
		self.get(column).and_then(SqlValue::as_i64)
	}

	pub fn as_f64(&self, column: &str) -> Option<f64> {
		self.get(column).and_then(SqlValue::as_f64)
	}
}
impl FromIterator<(String, SqlValue)> for SqlRow {
	fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vector_placeholder_carries_cast() {
		assert_eq!(SqlValue::Vector("'foo':1".to_string()).placeholder(), "?::tsvector");
		assert_eq!(SqlValue::Text("foo".to_string()).placeholder(), "?");
	}

	#[test]
	fn values_of_different_variants_are_distinct_keys() {
		let mut row = SqlRow::new();

		row.insert("id", 1_i64);
		row.insert("label", "1");

		assert_ne!(row.get("id"), row.get("label"));
	}

	#[test]
	fn option_none_becomes_null() {
		assert!(SqlValue::from(None::<String>).is_null());
		assert_eq!(SqlValue::from(Some("en")), SqlValue::Text("en".to_string()));
	}
}
