use crate::{entity::RankOptions, sql::quote_ident};

const RANK_FUNCTIONS: [&str; 2] = ["ts_rank", "ts_rank_cd"];
const DEFAULT_RANK_FUNCTION: &str = "ts_rank";

/// Assembles the ranking call used to score matches:
/// `ts_rank([weights,] vector, query [, normalization])` or the
/// `ts_rank_cd` cover-density variant.
pub fn ranking_expression(rank: &RankOptions, index_column: &str) -> String {
	let mut args = vec![quote_ident(index_column), "\"tsquery\"".to_string()];

	if let Some(weights) = rank.weights {
		let rendered = weights.iter().map(|weight| weight.to_string()).collect::<Vec<_>>().join(",");

		args.insert(0, format!("'{{{rendered}}}'"));
	}
	if rank.normalization != 0 {
		args.push(rank.normalization.to_string());
	}

	format!("{}({})", rank_function(&rank.function), args.join(","))
}

/// Exact allow-list match; anything else falls back to the primary function.
fn rank_function(requested: &str) -> &str {
	if RANK_FUNCTIONS.contains(&requested) { requested } else { DEFAULT_RANK_FUNCTION }
}
