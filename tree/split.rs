use num_traits::ToPrimitive;

/// The sum of squared deviations from the mean. This is the impurity used to rank candidate splits; it has no probabilistic interpretation. The impurity of a set with one or zero values is zero.
pub fn sum_squared_error(values: &[f32]) -> f32 {
	if values.len() <= 1 {
		return 0.0;
	}
	let mean = values.iter().sum::<f32>() / values.len().to_f32().unwrap();
	values.iter().map(|value| (value - mean).powi(2)).sum()
}

/// The score of a candidate branch is the impurity of each side's targets, summed. Lower is better.
pub fn score_split(left_targets: &[f32], right_targets: &[f32]) -> f32 {
	sum_squared_error(left_targets) + sum_squared_error(right_targets)
}

#[test]
fn test_sum_squared_error() {
	assert_eq!(sum_squared_error(&[]), 0.0);
	assert_eq!(sum_squared_error(&[7.0]), 0.0);
	assert_eq!(sum_squared_error(&[1.0, 3.0]), 2.0);
	assert_eq!(sum_squared_error(&[2.0, 2.0, 2.0]), 0.0);
	// mean 4, deviations -3 -1 0 4
	assert_eq!(sum_squared_error(&[1.0, 3.0, 4.0, 8.0]), 26.0);
}

#[test]
fn test_score_split() {
	assert_eq!(score_split(&[1.0, 3.0], &[10.0, 14.0]), 10.0);
	assert_eq!(score_split(&[], &[1.0, 3.0]), 2.0);
}
