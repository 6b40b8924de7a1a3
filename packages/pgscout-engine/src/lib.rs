pub mod engine;
pub mod entity;
pub mod executor;
pub mod ranking;
pub mod request;
pub mod sql;
pub mod tsquery;
pub mod value;
pub mod vector;

mod error;

pub use error::{Error, Result};

pub use engine::PostgresEngine;
pub use entity::{RankOptions, SearchOptions, Searchable, WeightLabel};
pub use executor::{PgQueryExecutor, QueryExecutor};
pub use request::{SearchRequest, SortDirection};
pub use tsquery::{
	PhraseQuery, PlainQuery, QueryExpressionRegistry, TsQuery, TsQueryExpression, WebSearchQuery,
};
pub use value::{SqlRow, SqlValue};
