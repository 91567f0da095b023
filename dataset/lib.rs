/*!
This crate provides a basic implementation of in-memory labeled datasets for training regression models. A dataset is a mapping from stable integer identifiers to examples, where an example maps attribute names to boolean or number values. Views make it possible to work with subsets of a dataset without copying any example payloads.
*/

use std::collections::BTreeMap;

pub mod load;

pub use self::load::*;

/// A single field value. Datasets only take booleans and numbers as content.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
	Boolean(bool),
	Number(f32),
}

/// One labeled example, as a mapping from attribute name to value. The identifier of an example lives in the keys of the [`Dataset`] that owns it.
pub type Example = BTreeMap<String, Value>;

/// An owning arena of examples keyed by identifier, together with the ordered feature attribute list and the name of the label attribute. A dataset is never mutated after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
	attributes: Vec<String>,
	label: String,
	examples: BTreeMap<usize, Example>,
}

/// A borrowed restriction of a [`Dataset`] to an explicit set of identifiers. Views share the arena and the attribute metadata of the dataset they were derived from, so restricting a view is cheap.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetView<'a> {
	dataset: &'a Dataset,
	ids: Vec<usize>,
}

/// An error constructing or loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("line {line}, column \"{column}\": \"{value}\" is neither a boolean nor a number")]
	MalformedValue {
		line: usize,
		column: String,
		value: String,
	},
	#[error("line {line} has {found} fields but the header has {expected}")]
	RaggedRow {
		line: usize,
		expected: usize,
		found: usize,
	},
	#[error("the label column \"{0}\" does not appear in the header")]
	MissingLabelColumn(String),
	#[error("example {id} has no value for attribute \"{attribute}\"")]
	MissingAttribute { id: usize, attribute: String },
	#[error("example {id} has a non-finite number for attribute \"{attribute}\"")]
	NonFiniteNumber { id: usize, attribute: String },
}

impl Value {
	/// Booleans compare as 1.0 and 0.0 when a tree descends through a threshold split.
	pub fn to_f32(self) -> f32 {
		match self {
			Value::Boolean(true) => 1.0,
			Value::Boolean(false) => 0.0,
			Value::Number(value) => value,
		}
	}

	pub fn as_number(&self) -> Option<&f32> {
		match self {
			Value::Number(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_boolean(&self) -> Option<&bool> {
		match self {
			Value::Boolean(s) => Some(s),
			_ => None,
		}
	}
}

impl Dataset {
	/// Construct a dataset from already-parsed examples. Every example must define a finite value for every feature attribute and for the label attribute.
	pub fn from_examples(
		attributes: Vec<String>,
		label: String,
		examples: BTreeMap<usize, Example>,
	) -> Result<Self, DatasetError> {
		for (id, example) in examples.iter() {
			for attribute in attributes.iter().chain(std::iter::once(&label)) {
				match example.get(attribute) {
					None => {
						return Err(DatasetError::MissingAttribute {
							id: *id,
							attribute: attribute.clone(),
						})
					}
					Some(Value::Number(value)) if !value.is_finite() => {
						return Err(DatasetError::NonFiniteNumber {
							id: *id,
							attribute: attribute.clone(),
						})
					}
					Some(_) => {}
				}
			}
		}
		Ok(Self {
			attributes,
			label,
			examples,
		})
	}

	/// The ordered feature attribute list. The label is excluded.
	pub fn attributes(&self) -> &[String] {
		&self.attributes
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	pub fn nrows(&self) -> usize {
		self.examples.len()
	}

	/// A view over every example in the dataset.
	pub fn view(&self) -> DatasetView {
		DatasetView {
			dataset: self,
			ids: self.examples.keys().copied().collect(),
		}
	}
}

impl<'a> DatasetView<'a> {
	/// The identifiers in this view, ascending.
	pub fn ids(&self) -> &[usize] {
		&self.ids
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	pub fn attributes(&self) -> &'a [String] {
		&self.dataset.attributes
	}

	pub fn label_name(&self) -> &'a str {
		&self.dataset.label
	}

	/// Restrict this view to a subset of its identifiers. The identifiers must be ascending. No example payloads are copied.
	pub fn restrict(&self, ids: Vec<usize>) -> DatasetView<'a> {
		DatasetView {
			dataset: self.dataset,
			ids,
		}
	}

	pub fn get(&self, id: usize) -> Option<&'a Example> {
		self.dataset.examples.get(&id)
	}

	/// The value of one attribute for one example. Every example defines every attribute, so this looks up unconditionally.
	pub fn value(&self, id: usize, attribute: &str) -> Value {
		self.dataset.examples[&id][attribute]
	}

	/// The values of one attribute across this view, aligned with `ids()`.
	pub fn attribute_values(&self, attribute: &str) -> Vec<f32> {
		self.ids
			.iter()
			.map(|id| self.dataset.examples[id][attribute].to_f32())
			.collect()
	}

	pub fn label_value(&self, id: usize) -> f32 {
		self.dataset.examples[&id][&self.dataset.label].to_f32()
	}

	/// The label values across this view, aligned with `ids()`.
	pub fn label_values(&self) -> Vec<f32> {
		self.ids
			.iter()
			.map(|id| self.dataset.examples[id][&self.dataset.label].to_f32())
			.collect()
	}
}

#[cfg(test)]
fn test_dataset() -> Dataset {
	let mut examples = BTreeMap::new();
	for (id, (gardening, age)) in vec![(false, 10.0), (true, 20.0), (true, 30.0)]
		.into_iter()
		.enumerate()
	{
		let mut example = BTreeMap::new();
		example.insert("LikesGardening".to_owned(), Value::Boolean(gardening));
		example.insert("Age".to_owned(), Value::Number(age));
		examples.insert(id + 1, example);
	}
	Dataset::from_examples(
		vec!["LikesGardening".to_owned()],
		"Age".to_owned(),
		examples,
	)
	.unwrap()
}

#[test]
fn test_view_restriction_shares_metadata() {
	let dataset = test_dataset();
	let view = dataset.view();
	assert_eq!(view.ids(), &[1, 2, 3]);
	let restricted = view.restrict(vec![2, 3]);
	assert_eq!(restricted.len(), 2);
	assert_eq!(restricted.attributes(), view.attributes());
	assert_eq!(restricted.label_name(), "Age");
	assert_eq!(restricted.attribute_values("LikesGardening"), vec![1.0, 1.0]);
	assert_eq!(restricted.label_values(), vec![20.0, 30.0]);
}

#[test]
fn test_value_to_f32() {
	assert_eq!(Value::Boolean(true).to_f32(), 1.0);
	assert_eq!(Value::Boolean(false).to_f32(), 0.0);
	assert_eq!(Value::Number(3.5).to_f32(), 3.5);
}

#[test]
fn test_from_examples_rejects_non_finite_numbers() {
	let mut example = BTreeMap::new();
	example.insert("A".to_owned(), Value::Number(f32::NAN));
	example.insert("y".to_owned(), Value::Number(1.0));
	let mut examples = BTreeMap::new();
	examples.insert(1, example);
	let error =
		Dataset::from_examples(vec!["A".to_owned()], "y".to_owned(), examples).unwrap_err();
	match error {
		DatasetError::NonFiniteNumber { id, attribute } => {
			assert_eq!(id, 1);
			assert_eq!(attribute, "A");
		}
		_ => panic!("expected a non-finite number error"),
	}
}

#[test]
fn test_from_examples_requires_every_attribute() {
	let mut example = BTreeMap::new();
	example.insert("Age".to_owned(), Value::Number(10.0));
	let mut examples = BTreeMap::new();
	examples.insert(1, example);
	let error = Dataset::from_examples(
		vec!["LikesGardening".to_owned()],
		"Age".to_owned(),
		examples,
	)
	.unwrap_err();
	match error {
		DatasetError::MissingAttribute { id, attribute } => {
			assert_eq!(id, 1);
			assert_eq!(attribute, "LikesGardening");
		}
		_ => panic!("expected a missing attribute error"),
	}
}
