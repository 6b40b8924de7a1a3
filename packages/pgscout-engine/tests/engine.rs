use std::{
	collections::VecDeque,
	sync::{Arc, Mutex},
};

use pgscout_engine::{
	Error, PostgresEngine, QueryExecutor, RankOptions, Result, SearchOptions, SearchRequest,
	Searchable, SortDirection, SqlRow, SqlValue, TsQuery, WeightLabel,
};

#[derive(Debug, Clone)]
struct Call {
	kind: &'static str,
	sql: String,
	bindings: Vec<SqlValue>,
}

#[derive(Clone, Default)]
struct MockExecutor {
	calls: Arc<Mutex<Vec<Call>>>,
	rows: Arc<Mutex<VecDeque<Vec<SqlRow>>>>,
	scalars: Arc<Mutex<VecDeque<Option<SqlValue>>>>,
}
impl MockExecutor {
	fn push_rows(&self, rows: Vec<SqlRow>) {
		self.rows.lock().unwrap().push_back(rows);
	}

	fn push_scalar(&self, value: Option<SqlValue>) {
		self.scalars.lock().unwrap().push_back(value);
	}

	fn calls(&self) -> Vec<Call> {
		self.calls.lock().unwrap().clone()
	}

	fn record(&self, kind: &'static str, sql: &str, bindings: &[SqlValue]) {
		self.calls.lock().unwrap().push(Call {
			kind,
			sql: sql.to_string(),
			bindings: bindings.to_vec(),
		});
	}
}
impl QueryExecutor for MockExecutor {
	async fn fetch(&self, sql: &str, bindings: &[SqlValue]) -> Result<Vec<SqlRow>> {
		self.record("fetch", sql, bindings);

		Ok(self.rows.lock().unwrap().pop_front().unwrap_or_default())
	}

	async fn fetch_scalar(&self, sql: &str, bindings: &[SqlValue]) -> Result<Option<SqlValue>> {
		self.record("scalar", sql, bindings);

		Ok(self.scalars.lock().unwrap().pop_front().flatten())
	}

	async fn execute(&self, sql: &str, bindings: &[SqlValue]) -> Result<u64> {
		self.record("execute", sql, bindings);

		Ok(1)
	}
}

#[derive(Clone)]
struct Post {
	id: i64,
	text: Option<String>,
	options: SearchOptions,
	soft_delete: Option<&'static str>,
}
impl Post {
	fn new(id: i64, text: &str) -> Self {
		Self { id, text: Some(text.to_string()), options: SearchOptions::default(), soft_delete: None }
	}
}
impl Searchable for Post {
	fn key_name(&self) -> &str {
		"id"
	}

	fn key(&self) -> SqlValue {
		SqlValue::Int(self.id)
	}

	fn index_name(&self) -> &str {
		"posts"
	}

	fn searchable_fields(&self) -> Vec<(String, Option<String>)> {
		vec![("text".to_string(), self.text.clone())]
	}

	fn options(&self) -> SearchOptions {
		self.options.clone()
	}

	fn soft_delete_column(&self) -> Option<&str> {
		self.soft_delete
	}
}

fn search_config() -> pgscout_config::Search {
	pgscout_config::Search {
		maintain_index: true,
		search_using: "plainquery".to_string(),
		config: None,
	}
}

fn engine(executor: MockExecutor) -> PostgresEngine<MockExecutor> {
	PostgresEngine::new(executor, search_config())
}

fn result_row(id: i64, rank: f64, total_count: i64) -> SqlRow {
	let mut row = SqlRow::new();

	row.insert("id", id);
	row.insert("rank", rank);
	row.insert("total_count", total_count);

	row
}

#[tokio::test]
async fn index_updates_vector_in_place() {
	let executor = MockExecutor::default();

	executor.push_scalar(Some(SqlValue::Text("'foo':1".to_string())));

	let engine = engine(executor.clone());

	engine.index(&[Post::new(1, "Foo")]).await.unwrap();

	let calls = executor.calls();

	assert_eq!(calls.len(), 2);
	assert_eq!(calls[0].kind, "scalar");
	assert_eq!(
		calls[0].sql,
		"SELECT (to_tsvector(COALESCE($1::regconfig, get_current_ts_config()), $2))::text \
		AS tsvector"
	);
	assert_eq!(calls[0].bindings, vec![SqlValue::Null, SqlValue::from("Foo")]);
	assert_eq!(calls[1].kind, "execute");
	assert_eq!(calls[1].sql, "UPDATE \"posts\" SET \"searchable\" = $1::tsvector WHERE \"id\" = $2");
	assert_eq!(
		calls[1].bindings,
		vec![SqlValue::Vector("'foo':1".to_string()), SqlValue::Int(1)]
	);
}

#[tokio::test]
async fn index_inserts_into_external_table_when_row_is_absent() {
	let executor = MockExecutor::default();

	executor.push_scalar(Some(SqlValue::Text("'foo':1".to_string())));
	// Existence probe misses.
	executor.push_scalar(None);

	let engine = engine(executor.clone());
	let mut post = Post::new(1, "Foo");

	post.options.external = true;

	engine.index(&[post]).await.unwrap();

	let calls = executor.calls();

	assert_eq!(calls.len(), 3);
	assert_eq!(calls[1].sql, "SELECT 1 AS one FROM \"posts\" WHERE \"id\" = $1 LIMIT 1");
	assert_eq!(
		calls[2].sql,
		"INSERT INTO \"posts\" (\"searchable\", \"id\") VALUES ($1::tsvector, $2)"
	);
	assert_eq!(
		calls[2].bindings,
		vec![SqlValue::Vector("'foo':1".to_string()), SqlValue::Int(1)]
	);
}

#[tokio::test]
async fn index_updates_external_table_when_row_exists() {
	let executor = MockExecutor::default();

	executor.push_scalar(Some(SqlValue::Text("'foo':1".to_string())));
	executor.push_scalar(Some(SqlValue::Int(1)));

	let engine = engine(executor.clone());
	let mut post = Post::new(1, "Foo");

	post.options.external = true;

	engine.index(&[post]).await.unwrap();

	let calls = executor.calls();

	assert_eq!(calls.len(), 3);
	assert!(calls[2].sql.starts_with("UPDATE \"posts\" SET"));
}

#[tokio::test]
async fn index_skips_everything_when_disabled_globally() {
	let executor = MockExecutor::default();
	let mut config = search_config();

	config.maintain_index = false;

	let engine = PostgresEngine::new(executor.clone(), config);
	let posts = [Post::new(1, "Foo")];

	engine.index(&posts).await.unwrap();
	engine.remove_from_index(&posts).await.unwrap();
	engine.flush(&posts[0]).await.unwrap();

	assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn index_skips_entities_that_opt_out() {
	let executor = MockExecutor::default();
	let engine = engine(executor.clone());
	let mut post = Post::new(1, "Foo");

	post.options.maintain_index = Some(false);

	engine.index(&[post]).await.unwrap();

	assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn remove_from_index_clears_vectors_in_one_batch() {
	let executor = MockExecutor::default();
	let engine = engine(executor.clone());

	engine.remove_from_index(&[Post::new(1, "Foo"), Post::new(2, "Bar")]).await.unwrap();

	let calls = executor.calls();

	assert_eq!(calls.len(), 1);
	assert_eq!(
		calls[0].sql,
		"UPDATE \"posts\" SET \"searchable\" = $1 WHERE \"id\" IN ($2, $3)"
	);
	assert_eq!(calls[0].bindings, vec![SqlValue::Null, SqlValue::Int(1), SqlValue::Int(2)]);
}

#[tokio::test]
async fn flush_clears_the_whole_index() {
	let executor = MockExecutor::default();
	let engine = engine(executor.clone());

	engine.flush(&Post::new(1, "Foo")).await.unwrap();

	let calls = executor.calls();

	assert_eq!(calls.len(), 1);
	assert_eq!(calls[0].sql, "UPDATE \"posts\" SET \"searchable\" = $1");
	assert_eq!(calls[0].bindings, vec![SqlValue::Null]);
}

#[tokio::test]
async fn search_emits_one_counted_ranked_statement() {
	let executor = MockExecutor::default();
	let engine = engine(executor.clone());

	engine.search(&Post::new(1, "Foo"), &SearchRequest::new("hello")).await.unwrap();

	let calls = executor.calls();

	assert_eq!(calls.len(), 1);
	assert_eq!(
		calls[0].sql,
		"SELECT \"id\", ts_rank(\"searchable\",\"tsquery\") AS rank, \
		COUNT(*) OVER () AS total_count FROM \"posts\" \
		CROSS JOIN plainto_tsquery(COALESCE($1::regconfig, get_current_ts_config()), $2) \
		AS \"tsquery\" WHERE \"searchable\" @@ \"tsquery\" \
		ORDER BY \"rank\" DESC, \"id\" ASC"
	);
	assert_eq!(calls[0].bindings, vec![SqlValue::Null, SqlValue::from("hello")]);
}

#[tokio::test]
async fn search_applies_filters_in_caller_order() {
	let executor = MockExecutor::default();
	let engine = engine(executor.clone());
	let request = SearchRequest::new("hello")
		.filter("status", "published")
		.filter("author_id", 7_i64);

	engine.search(&Post::new(1, "Foo"), &request).await.unwrap();

	let call = &executor.calls()[0];

	assert!(call.sql.contains("WHERE \"searchable\" @@ \"tsquery\" AND \"status\" = $3 AND \"author_id\" = $4"));
	assert_eq!(
		call.bindings,
		vec![
			SqlValue::Null,
			SqlValue::from("hello"),
			SqlValue::from("published"),
			SqlValue::Int(7),
		]
	);
}

#[tokio::test]
async fn explicit_orders_suppress_the_default_ordering() {
	let executor = MockExecutor::default();
	let engine = engine(executor.clone());
	let request = SearchRequest::new("hello").order_by("created_at", SortDirection::Desc);

	engine.search(&Post::new(1, "Foo"), &request).await.unwrap();

	let call = &executor.calls()[0];

	assert!(call.sql.contains("ORDER BY \"created_at\" DESC"));
	assert!(!call.sql.contains("\"rank\" DESC"));
}

#[tokio::test]
async fn pagination_is_one_based() {
	let executor = MockExecutor::default();
	let engine = engine(executor.clone());
	let request = SearchRequest::new("hello");
	let post = Post::new(1, "Foo");

	engine.paginate(&post, &request, 5, 1).await.unwrap();
	engine.paginate(&post, &request, 5, 2).await.unwrap();
	engine.search(&post, &request).await.unwrap();

	let calls = executor.calls();

	assert!(calls[0].sql.ends_with("LIMIT 5 OFFSET 0"));
	assert!(calls[1].sql.ends_with("LIMIT 5 OFFSET 5"));
	assert!(!calls[2].sql.contains("LIMIT"));
	assert!(!calls[2].sql.contains("OFFSET"));
}

#[tokio::test]
async fn request_limit_caps_unpaginated_search() {
	let executor = MockExecutor::default();
	let engine = engine(executor.clone());

	engine.search(&Post::new(1, "Foo"), &SearchRequest::new("hello").take(5)).await.unwrap();

	assert!(executor.calls()[0].sql.ends_with("LIMIT 5 OFFSET 0"));
}

#[tokio::test]
async fn soft_delete_exclusion_applies_only_to_in_table_storage() {
	let executor = MockExecutor::default();
	let engine = engine(executor.clone());
	let mut post = Post::new(1, "Foo");

	post.soft_delete = Some("deleted_at");

	engine.search(&post, &SearchRequest::new("hello")).await.unwrap();

	post.options.external = true;

	engine.search(&post, &SearchRequest::new("hello")).await.unwrap();

	let calls = executor.calls();

	assert!(calls[0].sql.contains("\"deleted_at\" IS NULL"));
	assert!(!calls[1].sql.contains("\"deleted_at\" IS NULL"));
}

#[tokio::test]
async fn entity_config_overrides_the_global_default() {
	let executor = MockExecutor::default();
	let mut config = search_config();

	config.config = Some("simple".to_string());

	let engine = PostgresEngine::new(executor.clone(), config);
	let mut post = Post::new(1, "Foo");

	post.options.config = Some("english".to_string());

	engine.search(&post, &SearchRequest::new("hello")).await.unwrap();

	assert_eq!(executor.calls()[0].bindings[0], SqlValue::from("english"));
}

#[tokio::test]
async fn weighted_rank_options_shape_the_ranking_call() {
	let executor = MockExecutor::default();
	let engine = engine(executor.clone());
	let mut post = Post::new(1, "Foo");

	post.options.rank = RankOptions {
		function: "ts_rank_cd".to_string(),
		weights: Some([0.1, 0.2, 0.4, 1.0]),
		normalization: 32,
		fields: vec![("text".to_string(), WeightLabel::A)],
	};

	engine.search(&post, &SearchRequest::new("hello")).await.unwrap();

	assert!(
		executor.calls()[0]
			.sql
			.contains("ts_rank_cd('{0.1,0.2,0.4,1}',\"searchable\",\"tsquery\",32) AS rank")
	);
}

#[tokio::test]
async fn configured_variant_drives_the_default_expression() {
	let executor = MockExecutor::default();
	let mut config = search_config();

	config.search_using = "websearchquery".to_string();

	let engine = PostgresEngine::new(executor.clone(), config);

	engine.search(&Post::new(1, "Foo"), &SearchRequest::new("\"fat cat\" -dog")).await.unwrap();

	assert!(executor.calls()[0].sql.contains("CROSS JOIN websearch_to_tsquery("));
}

#[tokio::test]
async fn expression_callback_overrides_the_configured_variant() {
	let executor = MockExecutor::default();
	let engine = engine(executor.clone());
	let request = SearchRequest::new("fat & cat").with_expression(Box::new(
		|request, config, _builder| {
			Box::new(TsQuery::new(request.query.clone(), config.map(str::to_string)))
		},
	));

	engine.search(&Post::new(1, "Foo"), &request).await.unwrap();

	let call = &executor.calls()[0];

	assert!(call.sql.contains("CROSS JOIN to_tsquery("));
	assert_eq!(call.bindings, vec![SqlValue::Null, SqlValue::from("fat & cat")]);
}

#[tokio::test]
async fn total_count_reads_the_windowed_count() {
	let executor = MockExecutor::default();
	let engine = engine(executor);

	assert_eq!(engine.total_count(&[]), 0);
	assert_eq!(engine.total_count(&[result_row(1, 0.6, 42), result_row(2, 0.3, 42)]), 42);
}

#[tokio::test]
async fn extract_ids_uses_the_last_searched_key_name() {
	let executor = MockExecutor::default();

	executor.push_rows(vec![result_row(1, 0.6, 2), result_row(2, 0.3, 2)]);

	let engine = engine(executor);
	let rows = engine.search(&Post::new(1, "Foo"), &SearchRequest::new("hello")).await.unwrap();

	assert_eq!(engine.extract_ids(&rows), vec![SqlValue::Int(1), SqlValue::Int(2)]);
}

#[tokio::test]
async fn map_preserves_row_order_and_drops_missing_keys() {
	let executor = MockExecutor::default();
	let engine = engine(executor);
	let rows = vec![result_row(1, 0.6, 2), result_row(2, 0.3, 2)];
	// Key 1 was deleted between search and load.
	let loaded = engine
		.map(&rows, |keys| async move {
			assert_eq!(keys, vec![SqlValue::Int(1), SqlValue::Int(2)]);

			Ok(vec![Post::new(2, "Bar")])
		})
		.await
		.unwrap();

	assert_eq!(loaded.len(), 1);
	assert_eq!(loaded[0].id, 2);
}

#[tokio::test]
async fn map_reorders_loaded_entities_to_row_order() {
	let executor = MockExecutor::default();
	let engine = engine(executor);
	let rows = vec![result_row(2, 0.6, 2), result_row(1, 0.3, 2)];
	let loaded = engine
		.map(&rows, |_| async move { Ok(vec![Post::new(1, "Foo"), Post::new(2, "Bar")]) })
		.await
		.unwrap();

	assert_eq!(loaded.iter().map(|post| post.id).collect::<Vec<_>>(), vec![2, 1]);
}

#[tokio::test]
async fn search_rows_flow_through_extraction_and_mapping() {
	let executor = MockExecutor::default();

	executor.push_rows(vec![result_row(1, 0.33, 1)]);

	let engine = engine(executor);
	let post = Post::new(1, "hello world");
	let rows = engine.search(&post, &SearchRequest::new("hello")).await.unwrap();

	assert_eq!(engine.total_count(&rows), 1);
	assert!(rows[0].as_f64("rank").unwrap() > 0.0);
	assert_eq!(engine.extract_ids(&rows), vec![SqlValue::Int(1)]);

	let loaded = engine.map(&rows, |_| async move { Ok(vec![post.clone()]) }).await.unwrap();

	assert_eq!(loaded.len(), 1);
	assert_eq!(loaded[0].id, 1);
}

#[tokio::test]
async fn index_ddl_is_refused() {
	let executor = MockExecutor::default();
	let engine = engine(executor);

	assert!(matches!(engine.create_index("posts"), Err(Error::IndexManagement)));
	assert!(matches!(engine.delete_index("posts"), Err(Error::IndexManagement)));
}
