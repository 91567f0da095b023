use crate::{
	error::{PredictError, TrainError},
	loss::Loss,
	progress::{ProgressCounter, TrainProgress},
	train::train_tree,
	tree::Tree,
	TrainOptions,
};
use bramble_dataset::{DatasetView, Example};
use num_traits::ToPrimitive;
use std::collections::BTreeMap;

/// A regressor predicts a continuous target value, for example a person's age. It holds the initial constant prediction (the bias), the learning rate, and one tree per training round, in training order.
#[derive(Debug)]
pub struct Regressor {
	/// The prediction of the model given no trained trees, fit by the loss over the whole training dataset.
	pub bias: f32,
	pub learning_rate: f32,
	pub trees: Vec<Tree>,
}

impl Regressor {
	/// Train a regressor. Each round fits one tree to the residuals of the current predictions, fits every leaf of that tree with the loss, and folds the learning-rate-scaled leaf values back into the running predictions. Exactly `max_rounds` rounds run; there is no early stopping.
	pub fn train(
		dataset: &DatasetView,
		loss: &dyn Loss,
		options: &TrainOptions,
		update_progress: &mut dyn FnMut(TrainProgress),
	) -> Result<Regressor, TrainError> {
		if dataset.is_empty() {
			return Err(TrainError::InvalidArgument(
				"cannot train on an empty dataset".to_owned(),
			));
		}
		if options.max_rounds < 1 {
			return Err(TrainError::InvalidArgument(format!(
				"max_rounds must be at least 1, got {}",
				options.max_rounds
			)));
		}
		if options.max_depth < 1 {
			return Err(TrainError::InvalidArgument(format!(
				"max_depth must be at least 1, got {}",
				options.max_depth
			)));
		}
		let bias = loss.initial_prediction(dataset)?;
		let mut predictions: BTreeMap<usize, f32> =
			dataset.ids().iter().map(|id| (*id, bias)).collect();
		let progress_counter = ProgressCounter::new(options.max_rounds.to_u64().unwrap());
		update_progress(TrainProgress::Training(progress_counter.clone()));
		let mut trees = Vec::with_capacity(options.max_rounds);
		for _ in 0..options.max_rounds {
			let residuals = loss.residuals(dataset, &predictions);
			let mut tree = train_tree(dataset, &residuals, options.max_depth)?;
			for position in 0..tree.leaf_indices.len() {
				let leaf_index = tree.leaf_indices[position];
				let gamma = {
					let leaf = tree.nodes[leaf_index].as_leaf().unwrap();
					loss.best_fit(dataset, &leaf.examples, Some(&predictions))?
				};
				tree.set_leaf_value(leaf_index, gamma)?;
				let leaf = tree.nodes[leaf_index].as_leaf().unwrap();
				for id in leaf.examples.iter() {
					*predictions.get_mut(id).unwrap() += options.learning_rate * gamma;
				}
			}
			trees.push(tree);
			progress_counter.inc(1);
		}
		Ok(Regressor {
			bias,
			learning_rate: options.learning_rate,
			trees,
		})
	}

	/// Make a prediction: the bias plus the learning-rate-scaled leaf value of every tree, in training order.
	pub fn predict(&self, example: &Example) -> Result<f32, PredictError> {
		let mut prediction = self.bias;
		for tree in self.trees.iter() {
			prediction += self.learning_rate * tree.predict(example)?;
		}
		Ok(prediction)
	}
}

#[cfg(test)]
use crate::loss::SquaredError;
#[cfg(test)]
use bramble_dataset::{Dataset, Value};
#[cfg(test)]
use maplit::btreemap;

#[cfg(test)]
fn two_example_dataset() -> Dataset {
	let examples = btreemap! {
		1 => btreemap! {
			"B".to_owned() => Value::Boolean(false),
			"y".to_owned() => Value::Number(10.0),
		},
		2 => btreemap! {
			"B".to_owned() => Value::Boolean(true),
			"y".to_owned() => Value::Number(20.0),
		},
	};
	Dataset::from_examples(vec!["B".to_owned()], "y".to_owned(), examples).unwrap()
}

#[cfg(test)]
fn training_mse(regressor: &Regressor, view: &DatasetView) -> f32 {
	let sum: f32 = view
		.ids()
		.iter()
		.map(|id| {
			let prediction = regressor.predict(view.get(*id).unwrap()).unwrap();
			(prediction - view.label_value(*id)).powi(2)
		})
		.sum();
	sum / view.len().to_f32().unwrap()
}

#[test]
fn test_one_round_recovers_a_separable_dataset() {
	let dataset = two_example_dataset();
	let view = dataset.view();
	let options = TrainOptions {
		learning_rate: 1.0,
		max_depth: 2,
		max_rounds: 1,
	};
	let regressor =
		Regressor::train(&view, &SquaredError, &options, &mut |_| {}).unwrap();
	assert_eq!(regressor.bias, 15.0);
	assert_eq!(regressor.trees.len(), 1);
	let tree = &regressor.trees[0];
	assert_eq!(tree.leaf_indices.len(), 2);
	let left = tree.nodes[tree.leaf_indices[0]].as_leaf().unwrap();
	let right = tree.nodes[tree.leaf_indices[1]].as_leaf().unwrap();
	assert_eq!(left.value(), Some(-5.0));
	assert_eq!(right.value(), Some(5.0));
	let example = btreemap! { "B".to_owned() => Value::Boolean(false) };
	assert_eq!(regressor.predict(&example).unwrap(), 10.0);
	let example = btreemap! { "B".to_owned() => Value::Boolean(true) };
	assert_eq!(regressor.predict(&example).unwrap(), 20.0);
}

#[test]
fn test_unsplittable_dataset_trains_single_leaf_trees() {
	// One distinct value per attribute, so every tree is a single leaf whose value is the mean residual over the whole dataset: zero after the bias is subtracted.
	let examples = btreemap! {
		1 => btreemap! {
			"A".to_owned() => Value::Number(3.0),
			"y".to_owned() => Value::Number(10.0),
		},
		2 => btreemap! {
			"A".to_owned() => Value::Number(3.0),
			"y".to_owned() => Value::Number(30.0),
		},
	};
	let dataset =
		Dataset::from_examples(vec!["A".to_owned()], "y".to_owned(), examples).unwrap();
	let view = dataset.view();
	let options = TrainOptions {
		learning_rate: 0.5,
		max_depth: 4,
		max_rounds: 3,
	};
	let regressor =
		Regressor::train(&view, &SquaredError, &options, &mut |_| {}).unwrap();
	assert_eq!(regressor.bias, 20.0);
	for tree in regressor.trees.iter() {
		assert_eq!(tree.nodes.len(), 1);
		assert_eq!(
			tree.nodes[tree.leaf_indices[0]].as_leaf().unwrap().value(),
			Some(0.0)
		);
	}
	let example = btreemap! { "A".to_owned() => Value::Number(3.0) };
	assert_eq!(regressor.predict(&example).unwrap(), 20.0);
}

#[test]
fn test_depth_limit_of_one_degenerates_to_the_bias() {
	let dataset = two_example_dataset();
	let view = dataset.view();
	let options = TrainOptions {
		learning_rate: 0.3,
		max_depth: 1,
		max_rounds: 5,
	};
	let regressor =
		Regressor::train(&view, &SquaredError, &options, &mut |_| {}).unwrap();
	for tree in regressor.trees.iter() {
		assert_eq!(tree.nodes.len(), 1);
	}
	// Every leaf fits the mean residual, which is zero from round one onward.
	let example = btreemap! { "B".to_owned() => Value::Boolean(true) };
	assert_eq!(regressor.predict(&example).unwrap(), regressor.bias);
}

#[test]
fn test_training_error_decreases_over_rounds() {
	let examples = btreemap! {
		1 => btreemap! {
			"LikesGardening".to_owned() => Value::Boolean(false),
			"PlaysVideoGames".to_owned() => Value::Boolean(true),
			"Age".to_owned() => Value::Number(13.0),
		},
		2 => btreemap! {
			"LikesGardening".to_owned() => Value::Boolean(false),
			"PlaysVideoGames".to_owned() => Value::Boolean(true),
			"Age".to_owned() => Value::Number(14.0),
		},
		3 => btreemap! {
			"LikesGardening".to_owned() => Value::Boolean(true),
			"PlaysVideoGames".to_owned() => Value::Boolean(false),
			"Age".to_owned() => Value::Number(35.0),
		},
		4 => btreemap! {
			"LikesGardening".to_owned() => Value::Boolean(true),
			"PlaysVideoGames".to_owned() => Value::Boolean(true),
			"Age".to_owned() => Value::Number(25.0),
		},
	};
	let dataset = Dataset::from_examples(
		vec!["LikesGardening".to_owned(), "PlaysVideoGames".to_owned()],
		"Age".to_owned(),
		examples,
	)
	.unwrap();
	let view = dataset.view();
	let mut previous_mse = f32::INFINITY;
	for max_rounds in [1, 4, 16].iter() {
		let options = TrainOptions {
			learning_rate: 0.5,
			max_depth: 3,
			max_rounds: *max_rounds,
		};
		let regressor =
			Regressor::train(&view, &SquaredError, &options, &mut |_| {}).unwrap();
		let mse = training_mse(&regressor, &view);
		assert!(mse <= previous_mse);
		previous_mse = mse;
	}
}

#[test]
fn test_training_is_deterministic() {
	let dataset = two_example_dataset();
	let view = dataset.view();
	let options = TrainOptions {
		learning_rate: 0.1,
		max_depth: 3,
		max_rounds: 10,
	};
	let first = Regressor::train(&view, &SquaredError, &options, &mut |_| {}).unwrap();
	let second = Regressor::train(&view, &SquaredError, &options, &mut |_| {}).unwrap();
	assert_eq!(first.bias, second.bias);
	assert_eq!(first.trees, second.trees);
	let example = btreemap! { "B".to_owned() => Value::Boolean(true) };
	assert_eq!(
		first.predict(&example).unwrap(),
		second.predict(&example).unwrap()
	);
}

#[test]
fn test_train_rejects_bad_arguments() {
	let dataset = two_example_dataset();
	let view = dataset.view();
	let empty_view = view.restrict(Vec::new());
	let options = TrainOptions::default();
	assert!(matches!(
		Regressor::train(&empty_view, &SquaredError, &options, &mut |_| {}),
		Err(TrainError::InvalidArgument(_))
	));
	let options = TrainOptions {
		max_rounds: 0,
		..TrainOptions::default()
	};
	assert!(matches!(
		Regressor::train(&view, &SquaredError, &options, &mut |_| {}),
		Err(TrainError::InvalidArgument(_))
	));
	let options = TrainOptions {
		max_depth: 0,
		..TrainOptions::default()
	};
	assert!(matches!(
		Regressor::train(&view, &SquaredError, &options, &mut |_| {}),
		Err(TrainError::InvalidArgument(_))
	));
}

#[test]
fn test_predict_with_a_missing_feature() {
	let dataset = two_example_dataset();
	let view = dataset.view();
	let options = TrainOptions {
		learning_rate: 1.0,
		max_depth: 2,
		max_rounds: 1,
	};
	let regressor =
		Regressor::train(&view, &SquaredError, &options, &mut |_| {}).unwrap();
	let example = btreemap! { "C".to_owned() => Value::Number(1.0) };
	assert!(matches!(
		regressor.predict(&example),
		Err(PredictError::MissingFeature(attribute)) if attribute == "B"
	));
}

#[test]
fn test_progress_counter_reports_every_round() {
	let dataset = two_example_dataset();
	let view = dataset.view();
	let options = TrainOptions {
		learning_rate: 0.1,
		max_depth: 2,
		max_rounds: 7,
	};
	let mut counter = None;
	Regressor::train(&view, &SquaredError, &options, &mut |progress| {
		let TrainProgress::Training(progress_counter) = progress;
		counter = Some(progress_counter);
	})
	.unwrap();
	let counter = counter.unwrap();
	assert_eq!(counter.total(), 7);
	assert_eq!(counter.get(), 7);
}
