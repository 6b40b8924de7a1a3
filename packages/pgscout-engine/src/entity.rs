use crate::value::SqlValue;

/// Coarse priority tier attached to part of a vector; ranking functions use
/// it to bias scores.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightLabel {
	A,
	B,
	C,
	D,
}
impl WeightLabel {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::A => "A",
			Self::B => "B",
			Self::C => "C",
			Self::D => "D",
		}
	}
}

#[derive(Clone, Debug)]
pub struct RankOptions {
	/// Ranking function name; anything outside the allow-list falls back to
	/// `ts_rank`.
	pub function: String,
	/// Exactly four weights, one per label, rendered as an array literal.
	pub weights: Option<[f32; 4]>,
	/// Normalization bit flags; zero is omitted from the call.
	pub normalization: i32,
	/// Per-field weight labels; unlisted fields stay unweighted.
	pub fields: Vec<(String, WeightLabel)>,
}
impl RankOptions {
	pub fn field_label(&self, field: &str) -> Option<WeightLabel> {
		self.fields.iter().find(|(name, _)| name == field).map(|(_, label)| *label)
	}
}
impl Default for RankOptions {
	fn default() -> Self {
		Self {
			function: "ts_rank".to_string(),
			weights: None,
			normalization: 0,
			fields: Vec::new(),
		}
	}
}

/// Per-entity search configuration, read at call time and never cached.
#[derive(Clone, Debug)]
pub struct SearchOptions {
	/// Column holding the combined vector.
	pub column: String,
	/// Whether vector storage lives in a table separate from the primary row.
	pub external: bool,
	/// Entity-level maintenance override; `None` defers to the global switch.
	pub maintain_index: Option<bool>,
	/// Text-search configuration; `None` defers to the global default, and a
	/// global `None` to the session default.
	pub config: Option<String>,
	pub rank: RankOptions,
}
impl Default for SearchOptions {
	fn default() -> Self {
		Self {
			column: "searchable".to_string(),
			external: false,
			maintain_index: None,
			config: None,
			rank: RankOptions::default(),
		}
	}
}

/// A record that can be indexed and searched.
///
/// The optional capabilities default to "absent": no options override, no
/// supplemental columns, no soft-delete marker.
pub trait Searchable {
	/// Primary key column name.
	fn key_name(&self) -> &str;

	/// Primary key value.
	fn key(&self) -> SqlValue;

	/// Table holding the searchable vector (the entity table, or the external
	/// index table when `SearchOptions::external` is set).
	fn index_name(&self) -> &str;

	/// Searchable content in field order; `None` values index as empty
	/// documents.
	fn searchable_fields(&self) -> Vec<(String, Option<String>)>;

	fn options(&self) -> SearchOptions {
		SearchOptions::default()
	}

	/// Extra columns written alongside the vector on every upsert.
	fn supplemental_fields(&self) -> Vec<(String, SqlValue)> {
		Vec::new()
	}

	/// Soft-delete marker column, if the entity uses one. Only consulted when
	/// the vector lives in the primary row.
	fn soft_delete_column(&self) -> Option<&str> {
		None
	}
}
