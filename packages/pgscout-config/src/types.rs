use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub connection: Connection,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Connection {
	/// PostgreSQL DSN. Any other scheme is rejected when the engine connects.
	pub dsn: String,
	#[serde(default = "default_pool_max_conns")]
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	/// Global switch; `false` turns every index mutation into a no-op.
	#[serde(default = "default_maintain_index")]
	pub maintain_index: bool,
	/// Name of the query-expression variant used when a request supplies none.
	#[serde(default = "default_search_using")]
	pub search_using: String,
	/// Default text-search configuration. `None` defers to the session default.
	#[serde(default)]
	pub config: Option<String>,
}

impl Default for Search {
	fn default() -> Self {
		Self {
			maintain_index: default_maintain_index(),
			search_using: default_search_using(),
			config: None,
		}
	}
}

fn default_pool_max_conns() -> u32 {
	5
}

fn default_maintain_index() -> bool {
	true
}

fn default_search_using() -> String {
	"plainquery".to_string()
}
