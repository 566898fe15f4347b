use serde::{Deserialize, Serialize};
use std::fmt;

/// Which upstream API a watcher talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
	/// Safe transaction service only
	Classic,
	/// Safe client gateway only
	Alt,
	/// Transaction service first, client gateway when it fails
	#[default]
	Fallback,
}

impl fmt::Display for ApiMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Classic => "classic",
			Self::Alt => "alt",
			Self::Fallback => "fallback",
		};
		f.write_str(name)
	}
}
