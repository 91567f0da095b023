//! This module contains the main entrypoint to the bramble cli.

use anyhow::Result;
use bramble_dataset::Dataset;
use bramble_tree::{Regressor, SquaredError, TrainOptions, TrainProgress};
use clap::Clap;
use std::path::PathBuf;

#[derive(Clap)]
#[clap(about = "Train gradient boosted regression trees on a tabular text file.")]
struct Options {
	#[clap(short, long, about = "the path to your whitespace-separated data file")]
	file: PathBuf,
	#[clap(short, long, about = "the name of the column to predict")]
	target: String,
	#[clap(long, default_value = "0.1", about = "the shrinkage applied to every tree")]
	learning_rate: f32,
	#[clap(long, default_value = "6", about = "the maximum depth of each tree")]
	max_depth: usize,
	#[clap(long, default_value = "100", about = "the number of boosting rounds")]
	max_rounds: usize,
}

fn main() -> Result<()> {
	let options = Options::parse();
	let dataset = Dataset::from_path(&options.file, &options.target)?;
	let view = dataset.view();
	let train_options = TrainOptions {
		learning_rate: options.learning_rate,
		max_depth: options.max_depth,
		max_rounds: options.max_rounds,
	};
	let regressor = Regressor::train(&view, &SquaredError, &train_options, &mut |progress| {
		let TrainProgress::Training(counter) = progress;
		println!("training {} rounds on {} examples", counter.total(), view.len());
	})?;
	let mut sum_squared_error = 0.0;
	for id in view.ids() {
		let prediction = regressor.predict(view.get(*id).unwrap())?;
		sum_squared_error += (prediction - view.label_value(*id)).powi(2);
	}
	let mse = sum_squared_error / view.len() as f32;
	println!("bias: {}", regressor.bias);
	println!("trees: {}", regressor.trees.len());
	println!("training mse: {}", mse);
	Ok(())
}
