use crate::{
	error::TrainError,
	split::{score_split, sum_squared_error},
	tree::{BranchNode, LeafNode, Node, Tree},
};
use bramble_dataset::DatasetView;
use itertools::Itertools;
use rayon::prelude::*;
use std::{cmp::Ordering, collections::BTreeMap};

/// Grow one regression tree over `subset`, fitting `targets`. The tree partitions the subset greedily: at each node, every attribute and every candidate threshold is scored and the split with the lowest impurity wins. Leaves are registered in the tree's `leaf_indices` but their values are left unset; the boosting engine fits them afterwards.
pub fn train_tree(
	subset: &DatasetView,
	targets: &BTreeMap<usize, f32>,
	max_depth: usize,
) -> Result<Tree, TrainError> {
	if max_depth < 1 {
		return Err(TrainError::InvalidArgument(format!(
			"max_depth must be at least 1, got {}",
			max_depth
		)));
	}
	let mut tree = Tree {
		nodes: Vec::new(),
		leaf_indices: Vec::new(),
	};
	train_node(subset, targets, 0, max_depth, &mut tree);
	Ok(tree)
}

/// Grow the node for `subset` at `current_level`, push it onto the tree's node arena, and return its index. The top-level call pushes first, so the root is always at index 0.
fn train_node(
	subset: &DatasetView,
	targets: &BTreeMap<usize, f32>,
	current_level: usize,
	max_depth: usize,
	tree: &mut Tree,
) -> usize {
	// At the depth limit, force a leaf over the whole subset.
	if current_level == max_depth - 1 {
		return push_leaf(tree, subset.ids().to_vec());
	}
	let best = match choose_best_split(subset, targets) {
		Some(best) => best,
		None => return push_leaf(tree, subset.ids().to_vec()),
	};
	let (attribute_index, threshold) = match best.kind {
		// No attribute offered a split that beat leaving the subset whole.
		CandidateKind::Leaf => return push_leaf(tree, subset.ids().to_vec()),
		CandidateKind::Branch { threshold } => (best.attribute_index, threshold),
	};
	let attribute = &subset.attributes()[attribute_index];
	let node_index = tree.nodes.len();
	// The child indices are patched in after the recursion below has grown both subtrees.
	tree.nodes.push(Node::Branch(BranchNode {
		attribute: attribute.clone(),
		split_value: threshold,
		examples: subset.ids().to_vec(),
		left_child_index: None,
		right_child_index: None,
	}));
	let values = subset.attribute_values(attribute);
	let mut left_ids = Vec::new();
	let mut right_ids = Vec::new();
	for (id, value) in subset.ids().iter().zip(values.iter()) {
		if *value < threshold {
			left_ids.push(*id);
		} else {
			right_ids.push(*id);
		}
	}
	let left_child_index = train_node(
		&subset.restrict(left_ids),
		targets,
		current_level + 1,
		max_depth,
		tree,
	);
	let right_child_index = train_node(
		&subset.restrict(right_ids),
		targets,
		current_level + 1,
		max_depth,
		tree,
	);
	let branch = tree.nodes[node_index].as_branch_mut().unwrap();
	branch.left_child_index = Some(left_child_index);
	branch.right_child_index = Some(right_child_index);
	node_index
}

fn push_leaf(tree: &mut Tree, examples: Vec<usize>) -> usize {
	let node_index = tree.nodes.len();
	tree.nodes.push(Node::Leaf(LeafNode::new(examples)));
	tree.leaf_indices.push(node_index);
	node_index
}

#[derive(Debug)]
struct SplitCandidate {
	score: f32,
	attribute_index: usize,
	threshold_index: usize,
	kind: CandidateKind,
}

#[derive(Debug)]
enum CandidateKind {
	/// The attribute had at most one distinct value over the subset, so its candidate leaves the subset whole.
	Leaf,
	Branch { threshold: f32 },
}

/// Find the best candidate over every attribute, or `None` if the subset has no attributes at all. The attributes are scored in parallel; ordering candidates by score, then attribute position, then threshold position makes the outcome identical to a sequential scan in attribute order with strict-improvement tracking, so ties always keep the earliest candidate.
fn choose_best_split(
	subset: &DatasetView,
	targets: &BTreeMap<usize, f32>,
) -> Option<SplitCandidate> {
	subset
		.attributes()
		.par_iter()
		.enumerate()
		.map(|(attribute_index, attribute)| {
			best_candidate_for_attribute(subset, targets, attribute_index, attribute)
		})
		.min_by(compare_candidates)
}

fn compare_candidates(a: &SplitCandidate, b: &SplitCandidate) -> Ordering {
	a.score
		.partial_cmp(&b.score)
		.unwrap()
		.then(a.attribute_index.cmp(&b.attribute_index))
		.then(a.threshold_index.cmp(&b.threshold_index))
}

/// Find the best candidate for a single attribute. Candidate thresholds are the midpoints between consecutive distinct values, ascending, so a boolean attribute yields exactly one threshold at 0.5.
fn best_candidate_for_attribute(
	subset: &DatasetView,
	targets: &BTreeMap<usize, f32>,
	attribute_index: usize,
	attribute: &str,
) -> SplitCandidate {
	let values = subset.attribute_values(attribute);
	let mut distinct = values.clone();
	distinct.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap());
	distinct.dedup();
	if distinct.len() <= 1 {
		let subset_targets: Vec<f32> = subset.ids().iter().map(|id| targets[id]).collect();
		return SplitCandidate {
			score: sum_squared_error(&subset_targets),
			attribute_index,
			threshold_index: 0,
			kind: CandidateKind::Leaf,
		};
	}
	let mut best: Option<SplitCandidate> = None;
	for (threshold_index, (below, above)) in distinct.iter().tuple_windows().enumerate() {
		let threshold = (below + above) / 2.0;
		let mut left_targets = Vec::new();
		let mut right_targets = Vec::new();
		for (id, value) in subset.ids().iter().zip(values.iter()) {
			if *value < threshold {
				left_targets.push(targets[id]);
			} else {
				right_targets.push(targets[id]);
			}
		}
		let score = score_split(&left_targets, &right_targets);
		let improved = best
			.as_ref()
			.map(|best| score < best.score)
			.unwrap_or(true);
		if improved {
			best = Some(SplitCandidate {
				score,
				attribute_index,
				threshold_index,
				kind: CandidateKind::Branch { threshold },
			});
		}
	}
	best.unwrap()
}

#[cfg(test)]
use bramble_dataset::{Dataset, Value};

/// Build a dataset whose rows are feature values followed by the label value.
#[cfg(test)]
fn dataset_from_rows(attributes: &[&str], label: &str, rows: &[&[Value]]) -> Dataset {
	let mut examples = BTreeMap::new();
	for (index, row) in rows.iter().enumerate() {
		let mut example = bramble_dataset::Example::new();
		for (attribute, value) in attributes.iter().zip(row.iter()) {
			example.insert((*attribute).to_owned(), *value);
		}
		example.insert(label.to_owned(), *row.last().unwrap());
		examples.insert(index + 1, example);
	}
	Dataset::from_examples(
		attributes.iter().map(|a| (*a).to_owned()).collect(),
		label.to_owned(),
		examples,
	)
	.unwrap()
}

#[cfg(test)]
fn label_targets(view: &DatasetView) -> BTreeMap<usize, f32> {
	view.ids()
		.iter()
		.map(|id| (*id, view.label_value(*id)))
		.collect()
}

#[test]
fn test_train_tree_rejects_zero_depth() {
	let dataset = dataset_from_rows(
		&["A"],
		"y",
		&[&[Value::Number(1.0), Value::Number(1.0)]],
	);
	let view = dataset.view();
	let targets = label_targets(&view);
	assert!(matches!(
		train_tree(&view, &targets, 0),
		Err(TrainError::InvalidArgument(_))
	));
}

#[test]
fn test_depth_limit_of_one_forces_a_single_leaf() {
	let dataset = dataset_from_rows(
		&["A"],
		"y",
		&[
			&[Value::Number(1.0), Value::Number(10.0)],
			&[Value::Number(2.0), Value::Number(20.0)],
		],
	);
	let view = dataset.view();
	let targets = label_targets(&view);
	let tree = train_tree(&view, &targets, 1).unwrap();
	assert_eq!(tree.nodes.len(), 1);
	assert_eq!(tree.leaf_indices, vec![0]);
	assert_eq!(tree.nodes[0].as_leaf().unwrap().examples, vec![1, 2]);
}

#[test]
fn test_constant_attributes_collapse_to_a_leaf() {
	// Every attribute has one distinct value, so no split is possible at any depth.
	let dataset = dataset_from_rows(
		&["A", "B"],
		"y",
		&[
			&[Value::Boolean(true), Value::Number(3.0), Value::Number(10.0)],
			&[Value::Boolean(true), Value::Number(3.0), Value::Number(20.0)],
			&[Value::Boolean(true), Value::Number(3.0), Value::Number(30.0)],
		],
	);
	let view = dataset.view();
	let targets = label_targets(&view);
	let tree = train_tree(&view, &targets, 5).unwrap();
	assert_eq!(tree.nodes.len(), 1);
	assert_eq!(tree.leaf_indices, vec![0]);
	assert_eq!(tree.nodes[0].as_leaf().unwrap().examples, vec![1, 2, 3]);
}

#[test]
fn test_boolean_attribute_splits_at_one_half() {
	let dataset = dataset_from_rows(
		&["B"],
		"y",
		&[
			&[Value::Boolean(false), Value::Number(10.0)],
			&[Value::Boolean(true), Value::Number(20.0)],
		],
	);
	let view = dataset.view();
	let targets = label_targets(&view);
	let tree = train_tree(&view, &targets, 2).unwrap();
	let root = match &tree.nodes[0] {
		Node::Branch(branch) => branch,
		_ => panic!("expected the root to be a branch"),
	};
	assert_eq!(root.attribute, "B");
	assert_eq!(root.split_value, 0.5);
	let left = tree.nodes[root.left_child_index.unwrap()].as_leaf().unwrap();
	let right = tree.nodes[root.right_child_index.unwrap()].as_leaf().unwrap();
	assert_eq!(left.examples, vec![1]);
	assert_eq!(right.examples, vec![2]);
}

#[test]
fn test_tie_break_prefers_the_earlier_attribute() {
	// A and B are identical columns, so every candidate score ties. The earlier attribute must win.
	let dataset = dataset_from_rows(
		&["A", "B"],
		"y",
		&[
			&[Value::Number(1.0), Value::Number(1.0), Value::Number(10.0)],
			&[Value::Number(2.0), Value::Number(2.0), Value::Number(20.0)],
		],
	);
	let view = dataset.view();
	let targets = label_targets(&view);
	let tree = train_tree(&view, &targets, 2).unwrap();
	match &tree.nodes[0] {
		Node::Branch(branch) => assert_eq!(branch.attribute, "A"),
		_ => panic!("expected the root to be a branch"),
	}
}

#[test]
fn test_tie_break_prefers_the_smaller_threshold() {
	// Constant targets make every threshold score zero, so the smallest threshold must win.
	let dataset = dataset_from_rows(
		&["A"],
		"y",
		&[
			&[Value::Number(1.0), Value::Number(7.0)],
			&[Value::Number(2.0), Value::Number(7.0)],
			&[Value::Number(3.0), Value::Number(7.0)],
		],
	);
	let view = dataset.view();
	let targets = label_targets(&view);
	let tree = train_tree(&view, &targets, 2).unwrap();
	match &tree.nodes[0] {
		Node::Branch(branch) => assert_eq!(branch.split_value, 1.5),
		_ => panic!("expected the root to be a branch"),
	}
}

#[test]
fn test_best_split_minimizes_impurity() {
	// Splitting {1, 2, 10} at 6 separates targets {1, 2} from {30} for a score of 0.5, which beats splitting at 1.5.
	let dataset = dataset_from_rows(
		&["A"],
		"y",
		&[
			&[Value::Number(1.0), Value::Number(1.0)],
			&[Value::Number(2.0), Value::Number(2.0)],
			&[Value::Number(10.0), Value::Number(30.0)],
		],
	);
	let view = dataset.view();
	let targets = label_targets(&view);
	let tree = train_tree(&view, &targets, 2).unwrap();
	let root = match &tree.nodes[0] {
		Node::Branch(branch) => branch,
		_ => panic!("expected the root to be a branch"),
	};
	assert_eq!(root.split_value, 6.0);
	let left = tree.nodes[root.left_child_index.unwrap()].as_leaf().unwrap();
	assert_eq!(left.examples, vec![1, 2]);
}

#[test]
fn test_depth_bound_is_respected() {
	let dataset = dataset_from_rows(
		&["A"],
		"y",
		&[
			&[Value::Number(1.0), Value::Number(1.0)],
			&[Value::Number(2.0), Value::Number(4.0)],
			&[Value::Number(3.0), Value::Number(9.0)],
			&[Value::Number(4.0), Value::Number(16.0)],
			&[Value::Number(5.0), Value::Number(25.0)],
			&[Value::Number(6.0), Value::Number(36.0)],
			&[Value::Number(7.0), Value::Number(49.0)],
			&[Value::Number(8.0), Value::Number(64.0)],
		],
	);
	let view = dataset.view();
	let targets = label_targets(&view);
	let max_depth = 3;
	let tree = train_tree(&view, &targets, max_depth).unwrap();
	// Walk every path from the root and count its edges.
	fn max_level(tree: &Tree, node_index: usize, level: usize) -> usize {
		match &tree.nodes[node_index] {
			Node::Branch(branch) => max_level(tree, branch.left_child_index.unwrap(), level + 1)
				.max(max_level(tree, branch.right_child_index.unwrap(), level + 1)),
			Node::Leaf(_) => level,
		}
	}
	assert!(max_level(&tree, 0, 0) <= max_depth - 1);
	// 8 strictly increasing targets split all the way down to 4 leaves.
	assert_eq!(tree.leaf_indices.len(), 4);
}

#[test]
fn test_training_is_deterministic() {
	let dataset = dataset_from_rows(
		&["A", "B"],
		"y",
		&[
			&[Value::Number(3.0), Value::Boolean(true), Value::Number(7.0)],
			&[Value::Number(1.0), Value::Boolean(false), Value::Number(2.0)],
			&[Value::Number(4.0), Value::Boolean(true), Value::Number(9.0)],
			&[Value::Number(1.5), Value::Boolean(false), Value::Number(3.0)],
		],
	);
	let view = dataset.view();
	let targets = label_targets(&view);
	let first = train_tree(&view, &targets, 4).unwrap();
	let second = train_tree(&view, &targets, 4).unwrap();
	assert_eq!(first, second);
}
