//! Crate-wide error type.

use std::fmt;

/// Coarse classification of an [`Error`], for callers that branch on the
/// failure rather than print it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// A link names a node id that is not in the node set.
	DanglingLinkReference,
	/// A pin operation named a node id that is not in the node set.
	UnknownNode,
	/// Label text extent could not be measured.
	MeasurementFailure,
	/// The graph snapshot could not be loaded or parsed.
	DataUnavailable,
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ErrorKind::DanglingLinkReference => "DanglingLinkReference",
			ErrorKind::UnknownNode => "UnknownNode",
			ErrorKind::MeasurementFailure => "MeasurementFailure",
			ErrorKind::DataUnavailable => "DataUnavailable",
		};
		f.write_str(name)
	}
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(missing_docs)]
pub enum Error {
	#[error("link {from} -> {to} references unknown node: {missing}")]
	DanglingLinkReference {
		from: String,
		to: String,
		missing: String,
	},
	#[error("no node with id: {id}")]
	UnknownNode { id: String },
	#[error("could not measure label {label:?}: {reason}")]
	MeasurementFailure { label: String, reason: String },
	#[error("graph data unavailable: {reason}")]
	DataUnavailable { reason: String },
}

impl Error {
	/// The kind of this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::DanglingLinkReference { .. } => ErrorKind::DanglingLinkReference,
			Error::UnknownNode { .. } => ErrorKind::UnknownNode,
			Error::MeasurementFailure { .. } => ErrorKind::MeasurementFailure,
			Error::DataUnavailable { .. } => ErrorKind::DataUnavailable,
		}
	}

	pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
		Error::DataUnavailable {
			reason: reason.into(),
		}
	}
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
