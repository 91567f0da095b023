use thiserror::Error;

/// An error raised while training. Training has no notion of a failed round that can be skipped, so any error aborts the whole `train` call.
#[derive(Debug, Error)]
pub enum TrainError {
	#[error("invalid argument: {0}")]
	InvalidArgument(String),
	#[error("invariant violation: {0}")]
	InvariantViolation(String),
}

/// An error raised while predicting. Any error aborts the whole `predict` call.
#[derive(Debug, Error)]
pub enum PredictError {
	#[error("the feature vector has no value for attribute \"{0}\"")]
	MissingFeature(String),
	#[error("invariant violation: {0}")]
	InvariantViolation(String),
}
