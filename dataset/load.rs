use super::{Dataset, DatasetError, Example, Value};
use std::{collections::BTreeMap, path::Path};

impl Dataset {
	/// Load a dataset from a whitespace-separated text file whose first line is the header. `label` names the column to predict; it is removed from the feature attribute list. Identifiers are 1-based data line numbers.
	pub fn from_path(path: &Path, label: &str) -> Result<Self, DatasetError> {
		let text = std::fs::read_to_string(path)?;
		Self::from_text(&text, label)
	}

	pub fn from_reader(mut reader: impl std::io::Read, label: &str) -> Result<Self, DatasetError> {
		let mut text = String::new();
		reader.read_to_string(&mut text)?;
		Self::from_text(&text, label)
	}

	pub fn from_text(text: &str, label: &str) -> Result<Self, DatasetError> {
		let mut lines = text
			.lines()
			.filter(|line| !line.trim().is_empty());
		let header: Vec<String> = lines
			.next()
			.map(|line| line.split_whitespace().map(str::to_owned).collect())
			.unwrap_or_default();
		if !header.iter().any(|column| column == label) {
			return Err(DatasetError::MissingLabelColumn(label.to_owned()));
		}
		let mut examples = BTreeMap::new();
		for (index, line) in lines.enumerate() {
			let id = index + 1;
			let fields: Vec<&str> = line.split_whitespace().collect();
			if fields.len() != header.len() {
				return Err(DatasetError::RaggedRow {
					line: id,
					expected: header.len(),
					found: fields.len(),
				});
			}
			let mut example = Example::new();
			for (column, field) in header.iter().zip(fields.iter()) {
				example.insert(column.clone(), parse_value(field, id, column)?);
			}
			examples.insert(id, example);
		}
		let attributes = header
			.iter()
			.filter(|column| *column != label)
			.cloned()
			.collect();
		Dataset::from_examples(attributes, label.to_owned(), examples)
	}
}

/// A field is a boolean if its text is one of the six cased spellings below, otherwise it must parse as a finite number. Non-finite numbers are rejected here so that the impurity comparisons during training never see them.
fn parse_value(field: &str, line: usize, column: &str) -> Result<Value, DatasetError> {
	match field {
		"TRUE" | "true" | "True" => Ok(Value::Boolean(true)),
		"FALSE" | "false" | "False" => Ok(Value::Boolean(false)),
		_ => match lexical::parse::<f32, &str>(field) {
			Ok(value) if value.is_finite() => Ok(Value::Number(value)),
			_ => Err(DatasetError::MalformedValue {
				line,
				column: column.to_owned(),
				value: field.to_owned(),
			}),
		},
	}
}

#[cfg(test)]
const TEST_TEXT: &str = "LikesGardening PlaysVideoGames Age
True FALSE 13
false true 14.5
TRUE True 40
";

#[test]
fn test_load() {
	let dataset = Dataset::from_text(TEST_TEXT, "Age").unwrap();
	assert_eq!(dataset.attributes(), &["LikesGardening", "PlaysVideoGames"]);
	assert_eq!(dataset.label(), "Age");
	assert_eq!(dataset.nrows(), 3);
	let view = dataset.view();
	assert_eq!(view.ids(), &[1, 2, 3]);
	assert_eq!(view.value(1, "LikesGardening"), Value::Boolean(true));
	assert_eq!(view.value(2, "PlaysVideoGames"), Value::Boolean(true));
	assert_eq!(view.value(2, "Age"), Value::Number(14.5));
	assert_eq!(view.attribute_values("LikesGardening"), vec![1.0, 0.0, 1.0]);
	assert_eq!(view.label_values(), vec![13.0, 14.5, 40.0]);
}

#[test]
fn test_load_malformed_value() {
	let text = "A Age\nhello 1\n";
	let error = Dataset::from_text(text, "Age").unwrap_err();
	match error {
		DatasetError::MalformedValue {
			line,
			column,
			value,
		} => {
			assert_eq!(line, 1);
			assert_eq!(column, "A");
			assert_eq!(value, "hello");
		}
		_ => panic!("expected a malformed value error"),
	}
}

#[test]
fn test_load_rejects_non_finite_numbers() {
	let text = "A B y\n1 1 5\n1 2 NaN\n2 3 7\n";
	let error = Dataset::from_text(text, "y").unwrap_err();
	match error {
		DatasetError::MalformedValue {
			line,
			column,
			value,
		} => {
			assert_eq!(line, 2);
			assert_eq!(column, "y");
			assert_eq!(value, "NaN");
		}
		_ => panic!("expected a malformed value error"),
	}
	for field in ["nan", "-NaN", "inf", "-inf", "Infinity"].iter() {
		let text = format!("A y\n{} 1\n", field);
		let error = Dataset::from_text(&text, "y").unwrap_err();
		assert!(matches!(error, DatasetError::MalformedValue { .. }));
	}
}

#[test]
fn test_load_ragged_row() {
	let text = "A B Age\n1 2 3\n1 2\n";
	let error = Dataset::from_text(text, "Age").unwrap_err();
	match error {
		DatasetError::RaggedRow {
			line,
			expected,
			found,
		} => {
			assert_eq!(line, 2);
			assert_eq!(expected, 3);
			assert_eq!(found, 2);
		}
		_ => panic!("expected a ragged row error"),
	}
}

#[test]
fn test_load_missing_label_column() {
	let text = "A B\n1 2\n";
	let error = Dataset::from_text(text, "Age").unwrap_err();
	match error {
		DatasetError::MissingLabelColumn(label) => assert_eq!(label, "Age"),
		_ => panic!("expected a missing label column error"),
	}
}
