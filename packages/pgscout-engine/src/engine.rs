use std::{collections::HashMap, future::Future, sync::Mutex};

use tracing::debug;

use crate::{
	Error, Result,
	entity::{SearchOptions, Searchable},
	executor::{PgQueryExecutor, QueryExecutor},
	ranking::ranking_expression,
	request::{SearchRequest, SortDirection},
	sql::{self, SelectBuilder, quote_ident},
	tsquery::QueryExpressionRegistry,
	value::{SqlRow, SqlValue},
	vector::vector_expression,
};

/// The search backend: translates index/search/delete calls into PostgreSQL
/// full-text SQL and runs them through the executor.
pub struct PostgresEngine<E> {
	executor: E,
	search: pgscout_config::Search,
	registry: QueryExpressionRegistry,
	/// Key column of the most recently searched entity, consulted by
	/// [`extract_ids`](Self::extract_ids). Interleaving searches for different
	/// entity types on one shared engine instance without serializing them
	/// makes this stale; serialize, or extract against the right entity.
	last_key_name: Mutex<Option<String>>,
}

impl PostgresEngine<PgQueryExecutor> {
	pub async fn connect(cfg: &pgscout_config::Config) -> Result<Self> {
		let executor = PgQueryExecutor::connect(&cfg.connection).await?;

		Ok(Self::new(executor, cfg.search.clone()))
	}
}

impl<E> PostgresEngine<E>
where
	E: QueryExecutor,
{
	pub fn new(executor: E, search: pgscout_config::Search) -> Self {
		Self {
			executor,
			search,
			registry: QueryExpressionRegistry::default(),
			last_key_name: Mutex::new(None),
		}
	}

	/// Registration point for additional query-expression variants.
	pub fn registry_mut(&mut self) -> &mut QueryExpressionRegistry {
		&mut self.registry
	}

	/// Upserts each entity's vector into its storage row. A disabled
	/// maintenance switch, global or per-entity, skips the write silently.
	pub async fn index<T>(&self, entities: &[T]) -> Result<()>
	where
		T: Searchable,
	{
		if !self.search.maintain_index {
			debug!("index maintenance disabled globally; skipping index");

			return Ok(());
		}

		for entity in entities {
			let options = entity.options();

			if !options.maintain_index.unwrap_or(true) {
				debug!(index = entity.index_name(), "index maintenance disabled; skipping entity");

				continue;
			}

			self.perform_index(entity, &options).await?;
		}

		Ok(())
	}

	/// Clears the vector column for the batch in one `IN` update.
	pub async fn remove_from_index<T>(&self, entities: &[T]) -> Result<()>
	where
		T: Searchable,
	{
		let Some(first) = entities.first() else {
			return Ok(());
		};
		let options = first.options();

		if !self.should_maintain(&options) {
			debug!(index = first.index_name(), "index maintenance disabled; skipping removal");

			return Ok(());
		}

		let keys = entities.iter().map(Searchable::key).collect::<Vec<_>>();
		let statement = sql::update_where_in(
			first.index_name(),
			&[(options.column.clone(), SqlValue::Null)],
			first.key_name(),
			&keys,
		);

		self.executor.execute(&statement.sql, &statement.bindings).await?;

		Ok(())
	}

	/// Nulls out the vector column for every row in the entity's storage
	/// location.
	pub async fn flush<T>(&self, entity: &T) -> Result<()>
	where
		T: Searchable,
	{
		let options = entity.options();

		if !self.should_maintain(&options) {
			debug!(index = entity.index_name(), "index maintenance disabled; skipping flush");

			return Ok(());
		}

		let statement =
			sql::update_all(entity.index_name(), &[(options.column.clone(), SqlValue::Null)]);

		self.executor.execute(&statement.sql, &statement.bindings).await?;

		Ok(())
	}

	/// Runs the search, honoring the request's own row cap.
	pub async fn search<T>(&self, entity: &T, request: &SearchRequest) -> Result<Vec<SqlRow>>
	where
		T: Searchable,
	{
		self.perform_search(entity, request, request.limit.unwrap_or(0), 1).await
	}

	/// Runs the search windowed to one page. Pages are 1-based.
	pub async fn paginate<T>(
		&self,
		entity: &T,
		request: &SearchRequest,
		per_page: u32,
		page: u32,
	) -> Result<Vec<SqlRow>>
	where
		T: Searchable,
	{
		self.perform_search(entity, request, per_page, page).await
	}

	/// Total match count ignoring pagination; every row of one result set
	/// carries the same windowed count.
	pub fn total_count(&self, rows: &[SqlRow]) -> i64 {
		rows.first().and_then(|row| row.as_i64("total_count")).unwrap_or(0)
	}

	/// Primary keys in row order, duplicates preserved.
	pub fn extract_ids(&self, rows: &[SqlRow]) -> Vec<SqlValue> {
		let key_name = self
			.last_key_name
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.clone()
			.unwrap_or_else(|| "id".to_string());

		rows.iter().filter_map(|row| row.get(&key_name).cloned()).collect()
	}

	/// Loads the entities behind a result set and re-emits them in row order.
	/// Keys that no longer resolve are dropped silently; a concurrent delete
	/// between search and load is a defined race outcome, not an error.
	pub async fn map<T, F, Fut>(&self, rows: &[SqlRow], loader: F) -> Result<Vec<T>>
	where
		T: Searchable + Clone,
		F: FnOnce(Vec<SqlValue>) -> Fut,
		Fut: Future<Output = Result<Vec<T>>>,
	{
		if rows.is_empty() {
			return Ok(Vec::new());
		}

		let keys = self.extract_ids(rows);
		let loaded = loader(keys.clone()).await?;
		let by_key =
			loaded.into_iter().map(|entity| (entity.key(), entity)).collect::<HashMap<_, _>>();

		Ok(keys.iter().filter_map(|key| by_key.get(key).cloned()).collect())
	}

	/// Index DDL is delegated to schema migrations; always fails.
	pub fn create_index(&self, _name: &str) -> Result<()> {
		Err(Error::IndexManagement)
	}

	/// Index DDL is delegated to schema migrations; always fails.
	pub fn delete_index(&self, _name: &str) -> Result<()> {
		Err(Error::IndexManagement)
	}

	async fn perform_index<T>(&self, entity: &T, options: &SearchOptions) -> Result<()>
	where
		T: Searchable,
	{
		let vector = self.compute_vector(entity, options).await?;
		let mut assignments = vec![(options.column.clone(), SqlValue::Vector(vector))];

		assignments.extend(entity.supplemental_fields());

		let table = entity.index_name();
		let key_name = entity.key_name();
		let key = entity.key();

		// The vector either lives beside the row (always update) or in an
		// external table (upsert). The exists-then-insert race is tolerated;
		// a duplicate insert fails loudly on the key constraint.
		let statement = if !options.external || self.row_exists(table, key_name, &key).await? {
			sql::update(table, &assignments, key_name, &key)
		} else {
			assignments.push((key_name.to_string(), key));

			sql::insert(table, &assignments)
		};

		self.executor.execute(&statement.sql, &statement.bindings).await?;

		Ok(())
	}

	/// Evaluates the entity's combined vector expression as a pure scalar
	/// query and returns the stored form.
	async fn compute_vector<T>(&self, entity: &T, options: &SearchOptions) -> Result<String>
	where
		T: Searchable,
	{
		let fields = entity.searchable_fields();
		let config = self.search_config(options);
		let expression = vector_expression(&fields, &options.rank, config)?;
		let statement = sql::scalar_select(
			&format!("({})::text AS tsvector", expression.sql),
			expression.bindings,
		);
		let value = self.executor.fetch_scalar(&statement.sql, &statement.bindings).await?;

		Ok(value.and_then(|value| value.as_str().map(str::to_string)).unwrap_or_default())
	}

	async fn perform_search<T>(
		&self,
		entity: &T,
		request: &SearchRequest,
		per_page: u32,
		page: u32,
	) -> Result<Vec<SqlRow>>
	where
		T: Searchable,
	{
		// Preserved so a following extract_ids call can resolve the key column.
		*self.last_key_name.lock().unwrap_or_else(|err| err.into_inner()) =
			Some(entity.key_name().to_string());

		let options = entity.options();
		let config = self.search_config(&options);
		let table = request.index.as_deref().unwrap_or(entity.index_name());
		let mut builder = SelectBuilder::new(table);

		builder
			.select(entity.key_name())
			.select_raw(
				&format!("{} AS rank", ranking_expression(&options.rank, &options.column)),
				Vec::new(),
			)
			.select_raw("COUNT(*) OVER () AS total_count", Vec::new())
			.where_raw(&format!("{} @@ \"tsquery\"", quote_ident(&options.column)), Vec::new());

		for (column, value) in &request.wheres {
			builder.where_eq(column, value.clone());
		}

		// External index tables do not carry the soft-delete marker.
		if !options.external && let Some(column) = entity.soft_delete_column() {
			builder.where_null(column);
		}

		for (column, direction) in &request.orders {
			builder.order_by(column, *direction);
		}

		if request.orders.is_empty() {
			// Rank first, key as a deterministic tie-break.
			builder.order_by("rank", SortDirection::Desc);
			builder.order_by(entity.key_name(), SortDirection::Asc);
		}

		if per_page > 0 {
			builder.skip(u64::from(page.max(1) - 1) * u64::from(per_page));
			builder.limit(u64::from(per_page));
		}

		let expression = match &request.expression {
			Some(callback) => callback(request, config, &mut builder),
			None =>
				self.registry.resolve(
					&self.search.search_using,
					request.query.clone(),
					config.map(str::to_string),
				),
		};

		builder
			.cross_join_raw(&format!("{} AS \"tsquery\"", expression.sql()), expression.bindings());

		let statement = builder.build();

		debug!(sql = statement.sql.as_str(), "executing search");

		// Rows come back database-ordered and are never re-sorted here.
		self.executor.fetch(&statement.sql, &statement.bindings).await
	}

	fn should_maintain(&self, options: &SearchOptions) -> bool {
		if !self.search.maintain_index {
			return false;
		}

		options.maintain_index.unwrap_or(true)
	}

	/// Entity-level configuration wins over the global default.
	fn search_config<'a>(&'a self, options: &'a SearchOptions) -> Option<&'a str> {
		options.config.as_deref().or(self.search.config.as_deref())
	}

	async fn row_exists(&self, table: &str, key_name: &str, key: &SqlValue) -> Result<bool> {
		let statement = sql::exists(table, key_name, key);
		let value = self.executor.fetch_scalar(&statement.sql, &statement.bindings).await?;

		Ok(value.is_some())
	}
}
