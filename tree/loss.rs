use crate::error::TrainError;
use bramble_dataset::DatasetView;
use num_traits::ToPrimitive;
use std::collections::BTreeMap;

/// A loss function supplies the three quantities boosting needs: the initial constant prediction, the per-example residuals each new tree is fit against, and the constant that best fits a leaf's examples under the current predictions. Implementing this trait is the extension point for losses other than squared error.
pub trait Loss {
	/// The constant prediction of the model before any trees are trained.
	fn initial_prediction(&self, dataset: &DatasetView) -> Result<f32, TrainError> {
		self.best_fit(dataset, dataset.ids(), None)
	}

	/// The pseudo-target for each example given the current predictions.
	fn residuals(
		&self,
		dataset: &DatasetView,
		predictions: &BTreeMap<usize, f32>,
	) -> BTreeMap<usize, f32>;

	/// The constant that minimizes the loss over `ids`. With no predictions this fits the raw labels, which is how the initial prediction is computed; with predictions it fits the residuals.
	fn best_fit(
		&self,
		dataset: &DatasetView,
		ids: &[usize],
		predictions: Option<&BTreeMap<usize, f32>>,
	) -> Result<f32, TrainError>;
}

/// Squared error loss. The best constant fit is the mean, so residuals are plain differences and the initial prediction is the mean label.
pub struct SquaredError;

impl Loss for SquaredError {
	fn residuals(
		&self,
		dataset: &DatasetView,
		predictions: &BTreeMap<usize, f32>,
	) -> BTreeMap<usize, f32> {
		predictions
			.iter()
			.map(|(id, prediction)| (*id, dataset.label_value(*id) - prediction))
			.collect()
	}

	fn best_fit(
		&self,
		dataset: &DatasetView,
		ids: &[usize],
		predictions: Option<&BTreeMap<usize, f32>>,
	) -> Result<f32, TrainError> {
		if ids.is_empty() {
			return Err(TrainError::InvalidArgument(
				"cannot fit a constant to an empty set of examples".to_owned(),
			));
		}
		let count = ids.len().to_f32().unwrap();
		let label_sum: f32 = ids.iter().map(|id| dataset.label_value(*id)).sum();
		match predictions {
			// The mean residual, computed from the raw predictions.
			Some(predictions) => {
				let prediction_sum: f32 = ids.iter().map(|id| predictions[id]).sum();
				Ok((label_sum - prediction_sum) / count)
			}
			None => Ok(label_sum / count),
		}
	}
}

#[cfg(test)]
use bramble_dataset::{Dataset, Example, Value};

#[cfg(test)]
fn test_dataset(labels: &[f32]) -> Dataset {
	let examples = labels
		.iter()
		.enumerate()
		.map(|(index, label)| {
			let mut example = Example::new();
			example.insert("y".to_owned(), Value::Number(*label));
			(index + 1, example)
		})
		.collect();
	Dataset::from_examples(Vec::new(), "y".to_owned(), examples).unwrap()
}

#[test]
fn test_initial_prediction_is_the_mean_label() {
	let dataset = test_dataset(&[10.0, 20.0, 60.0]);
	let view = dataset.view();
	assert_eq!(SquaredError.initial_prediction(&view).unwrap(), 30.0);
}

#[test]
fn test_residuals() {
	let dataset = test_dataset(&[10.0, 20.0]);
	let view = dataset.view();
	let predictions = vec![(1, 15.0), (2, 15.0)].into_iter().collect();
	let residuals = SquaredError.residuals(&view, &predictions);
	assert_eq!(residuals[&1], -5.0);
	assert_eq!(residuals[&2], 5.0);
}

#[test]
fn test_best_fit_matches_the_mean_residual() {
	let dataset = test_dataset(&[10.0, 20.0, 60.0]);
	let view = dataset.view();
	let predictions: BTreeMap<usize, f32> = vec![(1, 12.0), (2, 24.0), (3, 30.0)]
		.into_iter()
		.collect();
	let fit = SquaredError
		.best_fit(&view, &[1, 2, 3], Some(&predictions))
		.unwrap();
	let residuals = SquaredError.residuals(&view, &predictions);
	let mean_residual = residuals.values().sum::<f32>() / 3.0;
	assert_eq!(fit, mean_residual);
	assert_eq!(fit, 8.0);
}

#[test]
fn test_best_fit_rejects_an_empty_set() {
	let dataset = test_dataset(&[10.0]);
	let view = dataset.view();
	assert!(matches!(
		SquaredError.best_fit(&view, &[], None),
		Err(TrainError::InvalidArgument(_))
	));
}
