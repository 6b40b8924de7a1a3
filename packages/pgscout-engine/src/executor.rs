use sqlx::{
	Column, Row, TypeInfo,
	postgres::{PgArguments, PgPool, PgPoolOptions, PgRow},
	query::Query,
};

use crate::{
	Error, Result,
	value::{SqlRow, SqlValue},
};

/// The datastore collaborator: raw SQL plus positional bindings in, rows or
/// affected counts out. Failures propagate unchanged; this layer never
/// retries.
#[allow(async_fn_in_trait)]
pub trait QueryExecutor {
	async fn fetch(&self, sql: &str, bindings: &[SqlValue]) -> Result<Vec<SqlRow>>;

	/// Evaluates a statement expected to yield at most one row and returns its
	/// first column.
	async fn fetch_scalar(&self, sql: &str, bindings: &[SqlValue]) -> Result<Option<SqlValue>>;

	async fn execute(&self, sql: &str, bindings: &[SqlValue]) -> Result<u64>;
}

/// Production executor backed by a PostgreSQL pool.
pub struct PgQueryExecutor {
	pool: PgPool,
}
impl PgQueryExecutor {
	/// Connects per the configured DSN. Construction fails up front when the
	/// DSN names any other database engine.
	pub async fn connect(cfg: &pgscout_config::Connection) -> Result<Self> {
		let scheme = cfg.dsn.split_once("://").map(|(scheme, _)| scheme).unwrap_or_default();

		if !matches!(scheme, "postgres" | "postgresql") {
			return Err(Error::UnsupportedDriver { scheme: scheme.to_string() });
		}

		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub fn pool(&self) -> &PgPool {
		&self.pool
	}
}
impl QueryExecutor for PgQueryExecutor {
	async fn fetch(&self, sql: &str, bindings: &[SqlValue]) -> Result<Vec<SqlRow>> {
		let rows = bind_all(sql, bindings).fetch_all(&self.pool).await?;

		Ok(rows.iter().map(decode_row).collect())
	}

	async fn fetch_scalar(&self, sql: &str, bindings: &[SqlValue]) -> Result<Option<SqlValue>> {
		let row = bind_all(sql, bindings).fetch_optional(&self.pool).await?;

		Ok(row.as_ref().map(|row| match row.columns().first() {
			Some(column) => decode_column(row, 0, column.type_info().name()),
			None => SqlValue::Null,
		}))
	}

	async fn execute(&self, sql: &str, bindings: &[SqlValue]) -> Result<u64> {
		let result = bind_all(sql, bindings).execute(&self.pool).await?;

		Ok(result.rows_affected())
	}
}

fn bind_all<'q>(
	sql: &'q str,
	bindings: &'q [SqlValue],
) -> Query<'q, sqlx::Postgres, PgArguments> {
	let mut query = sqlx::query(sql);

	for value in bindings {
		query = match value {
			SqlValue::Null => query.bind(None::<String>),
			SqlValue::Bool(value) => query.bind(*value),
			SqlValue::Int(value) => query.bind(*value),
			SqlValue::Float(value) => query.bind(*value),
			SqlValue::Text(value) | SqlValue::Vector(value) => query.bind(value.as_str()),
			SqlValue::Uuid(value) => query.bind(*value),
			SqlValue::Timestamp(value) => query.bind(*value),
			SqlValue::Json(value) => query.bind(value.clone()),
		};
	}

	query
}

fn decode_row(row: &PgRow) -> SqlRow {
	row.columns()
		.iter()
		.enumerate()
		.map(|(idx, column)| {
			(column.name().to_string(), decode_column(row, idx, column.type_info().name()))
		})
		.collect()
}

fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> SqlValue {
	let value = match type_name {
		"BOOL" => row.try_get::<Option<bool>, _>(idx).ok().flatten().map(SqlValue::Bool),
		"INT2" =>
			row.try_get::<Option<i16>, _>(idx).ok().flatten().map(|value| SqlValue::Int(value.into())),
		"INT4" =>
			row.try_get::<Option<i32>, _>(idx).ok().flatten().map(|value| SqlValue::Int(value.into())),
		"INT8" => row.try_get::<Option<i64>, _>(idx).ok().flatten().map(SqlValue::Int),
		"FLOAT4" => row
			.try_get::<Option<f32>, _>(idx)
			.ok()
			.flatten()
			.map(|value| SqlValue::Float(value.into())),
		"FLOAT8" => row.try_get::<Option<f64>, _>(idx).ok().flatten().map(SqlValue::Float),
		"UUID" => row.try_get::<Option<uuid::Uuid>, _>(idx).ok().flatten().map(SqlValue::Uuid),
		"TIMESTAMPTZ" => row
			.try_get::<Option<time::OffsetDateTime>, _>(idx)
			.ok()
			.flatten()
			.map(SqlValue::Timestamp),
		"JSON" | "JSONB" =>
			row.try_get::<Option<serde_json::Value>, _>(idx).ok().flatten().map(SqlValue::Json),
		// Text-ish types, plus anything with a textual representation.
		_ => row.try_get::<Option<String>, _>(idx).ok().flatten().map(SqlValue::Text),
	};

	value.unwrap_or(SqlValue::Null)
}
