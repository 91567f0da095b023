use crate::error::{PredictError, TrainError};
use bramble_dataset::Example;

/// A single regression tree. Nodes are stored in a flat arena; the root is at index 0. `leaf_indices` records every leaf so that the boosting engine can fit each leaf's value without re-traversing the tree.
#[derive(Debug, PartialEq)]
pub struct Tree {
	pub nodes: Vec<Node>,
	pub leaf_indices: Vec<usize>,
}

#[derive(Debug, PartialEq)]
pub enum Node {
	Branch(BranchNode),
	Leaf(LeafNode),
}

#[derive(Debug, PartialEq)]
pub struct BranchNode {
	/// The name of the attribute this branch splits on.
	pub attribute: String,
	/// Examples with an attribute value strictly below this threshold go to the left child, all others go to the right child.
	pub split_value: f32,
	/// The identifiers of the examples routed to this node during training.
	pub examples: Vec<usize>,
	pub left_child_index: Option<usize>,
	pub right_child_index: Option<usize>,
}

#[derive(Debug, PartialEq)]
pub struct LeafNode {
	/// The identifiers of the examples routed to this leaf during training.
	pub examples: Vec<usize>,
	value: Option<f32>,
}

impl Tree {
	/// Make a prediction for a single example. The returned leaf value is unscaled; the regressor applies the learning rate.
	pub fn predict(&self, example: &Example) -> Result<f32, PredictError> {
		// Start at the root node.
		let mut node_index = 0;
		loop {
			match &self.nodes[node_index] {
				Node::Branch(BranchNode {
					attribute,
					split_value,
					left_child_index,
					right_child_index,
					..
				}) => {
					let value = example
						.get(attribute)
						.ok_or_else(|| PredictError::MissingFeature(attribute.clone()))?;
					node_index = if value.to_f32() < *split_value {
						left_child_index.unwrap()
					} else {
						right_child_index.unwrap()
					};
				}
				Node::Leaf(leaf) => {
					return leaf.value.ok_or_else(|| {
						PredictError::InvariantViolation(
							"a leaf was reached before its value was fit".to_owned(),
						)
					})
				}
			}
		}
	}

	/// Fit the value of the leaf at `node_index`. Leaf values are write-once and can only be set on leaves.
	pub fn set_leaf_value(&mut self, node_index: usize, value: f32) -> Result<(), TrainError> {
		match &mut self.nodes[node_index] {
			Node::Leaf(leaf) => leaf.set_value(value),
			Node::Branch(_) => Err(TrainError::InvariantViolation(
				"cannot set a leaf value on a branch node".to_owned(),
			)),
		}
	}
}

impl Node {
	pub fn as_branch_mut(&mut self) -> Option<&mut BranchNode> {
		match self {
			Node::Branch(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_leaf(&self) -> Option<&LeafNode> {
		match self {
			Node::Leaf(s) => Some(s),
			_ => None,
		}
	}
}

impl LeafNode {
	pub fn new(examples: Vec<usize>) -> Self {
		Self {
			examples,
			value: None,
		}
	}

	pub fn value(&self) -> Option<f32> {
		self.value
	}

	pub fn set_value(&mut self, value: f32) -> Result<(), TrainError> {
		if self.value.is_some() {
			return Err(TrainError::InvariantViolation(
				"the value of this leaf is already set".to_owned(),
			));
		}
		self.value = Some(value);
		Ok(())
	}
}

#[test]
fn test_leaf_value_is_write_once() {
	let mut leaf = LeafNode::new(vec![1, 2]);
	assert_eq!(leaf.value(), None);
	leaf.set_value(1.5).unwrap();
	assert_eq!(leaf.value(), Some(1.5));
	assert!(matches!(
		leaf.set_value(2.0),
		Err(TrainError::InvariantViolation(_))
	));
}

#[test]
fn test_set_leaf_value_on_branch() {
	let mut tree = Tree {
		nodes: vec![
			Node::Branch(BranchNode {
				attribute: "A".to_owned(),
				split_value: 0.5,
				examples: vec![1, 2],
				left_child_index: Some(1),
				right_child_index: Some(2),
			}),
			Node::Leaf(LeafNode::new(vec![1])),
			Node::Leaf(LeafNode::new(vec![2])),
		],
		leaf_indices: vec![1, 2],
	};
	assert!(matches!(
		tree.set_leaf_value(0, 1.0),
		Err(TrainError::InvariantViolation(_))
	));
	tree.set_leaf_value(1, -1.0).unwrap();
	tree.set_leaf_value(2, 1.0).unwrap();
}

#[test]
fn test_predict_descends_to_the_correct_leaf() {
	use bramble_dataset::Value;
	use maplit::btreemap;
	let mut tree = Tree {
		nodes: vec![
			Node::Branch(BranchNode {
				attribute: "A".to_owned(),
				split_value: 0.5,
				examples: vec![1, 2],
				left_child_index: Some(1),
				right_child_index: Some(2),
			}),
			Node::Leaf(LeafNode::new(vec![1])),
			Node::Leaf(LeafNode::new(vec![2])),
		],
		leaf_indices: vec![1, 2],
	};
	tree.set_leaf_value(1, -5.0).unwrap();
	tree.set_leaf_value(2, 5.0).unwrap();
	let example = btreemap! { "A".to_owned() => Value::Boolean(false) };
	assert_eq!(tree.predict(&example).unwrap(), -5.0);
	let example = btreemap! { "A".to_owned() => Value::Boolean(true) };
	assert_eq!(tree.predict(&example).unwrap(), 5.0);
	let example = btreemap! { "B".to_owned() => Value::Number(1.0) };
	assert!(matches!(
		tree.predict(&example),
		Err(PredictError::MissingFeature(attribute)) if attribute == "A"
	));
}

#[test]
fn test_predict_before_fitting_leaves() {
	let tree = Tree {
		nodes: vec![Node::Leaf(LeafNode::new(vec![1]))],
		leaf_indices: vec![0],
	};
	assert!(matches!(
		tree.predict(&Example::new()),
		Err(PredictError::InvariantViolation(_))
	));
}
