use crate::{Error, Result, entity::RankOptions, value::SqlValue};

/// A combined tsvector expression over an entity's searchable fields, with
/// `?` placeholders and bindings in emission order.
#[derive(Debug)]
pub struct VectorExpression {
	pub sql: String,
	pub bindings: Vec<SqlValue>,
}

/// Builds the indexed representation of one entity: per-field
/// `to_tsvector` calls, optionally wrapped in `setweight`, concatenated in
/// field order with the vector union operator.
pub fn vector_expression(
	fields: &[(String, Option<String>)],
	rank: &RankOptions,
	config: Option<&str>,
) -> Result<VectorExpression> {
	if fields.is_empty() {
		return Err(Error::NoSearchableFields);
	}

	let mut parts = Vec::with_capacity(fields.len());
	let mut bindings = Vec::with_capacity(fields.len() * 2);

	for (field, value) in fields {
		let mut part =
			"to_tsvector(COALESCE(?::regconfig, get_current_ts_config()), ?)".to_string();

		bindings.push(SqlValue::from(config.map(str::to_string)));
		// A null field contributes an empty document, not a parse error.
		bindings.push(SqlValue::from(value.clone().unwrap_or_default()));

		if let Some(label) = rank.field_label(field) {
			part = format!("setweight({part}, ?)");

			bindings.push(SqlValue::from(label.as_str()));
		}

		parts.push(part);
	}

	Ok(VectorExpression { sql: parts.join(" || "), bindings })
}
