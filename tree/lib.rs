/*!
This crate implements regression using an ensemble of decision trees trained with gradient boosting. Each round fits one tree to the residuals of the rounds before it, and the ensemble predicts by summing the learning-rate-scaled leaf values of every tree on top of an initial constant prediction.
*/

mod error;
mod loss;
mod progress;
mod regressor;
mod split;
mod train;
mod tree;

pub use self::error::{PredictError, TrainError};
pub use self::loss::{Loss, SquaredError};
pub use self::progress::{ProgressCounter, TrainProgress};
pub use self::regressor::Regressor;
pub use self::train::train_tree;
pub use self::tree::{BranchNode, LeafNode, Node, Tree};

/// These are the options passed to `Regressor::train`.
#[derive(Clone, Debug)]
pub struct TrainOptions {
	/// The learning rate scales the leaf values to control the effect each tree has on the output.
	pub learning_rate: f32,
	/// The depth of a single tree will never exceed this value.
	pub max_depth: usize,
	/// This is the number of rounds of training that will occur. Every round trains exactly one tree.
	pub max_rounds: usize,
}

impl Default for TrainOptions {
	fn default() -> Self {
		Self {
			learning_rate: 0.1,
			max_depth: 6,
			max_rounds: 100,
		}
	}
}
