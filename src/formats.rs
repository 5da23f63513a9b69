pub mod project;
pub mod strm;

pub use strm::{DecodeError, Deser, IStrm, OStrm, Ser};

use crate::registry::UnknownClassError;

/// Why a serialized subtree could not be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
	#[error(transparent)]
	Decode(#[from] DecodeError),
	#[error(transparent)]
	UnknownClass(#[from] UnknownClassError),
	#[error("Node nesting deeper than {0} levels")]
	TooDeep(usize),
}
