pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Connection DSN must use the postgres scheme; got {scheme:?}.")]
	UnsupportedDriver { scheme: String },
	#[error("Search indexes are created and deleted through schema migrations, not this backend.")]
	IndexManagement,
	#[error("Searchable entities must declare at least one searchable field.")]
	NoSearchableFields,
	#[error("Query expression {name:?} is already registered.")]
	DuplicateExpression { name: String },
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
}
