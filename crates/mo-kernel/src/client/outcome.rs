//! Outcome matching
//!
//! An expected value matches an actual value when:
//! - documents: every expected key is present in the actual document with a
//!   matching value; extra actual keys are allowed
//! - arrays: same length, elements match pairwise
//! - numbers: equal as numbers across int32, int64 and double
//! - anything else: equal

use super::DatabaseFailure;
use crate::error::ClientOperationError;
use bson::Bson;
use mo_spec::document::bson_to_relaxed_json;
use mo_spec::Outcome;

/// First difference found between an expected and an actual value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Dotted location, e.g. `result.insertedIds.0`
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl Mismatch {
    fn new(path: &str, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Attach the operation name
    #[must_use]
    pub fn into_error(self, operation: &str) -> ClientOperationError {
        ClientOperationError::OutcomeMismatch {
            operation: operation.to_string(),
            path: self.path,
            expected: self.expected,
            actual: self.actual,
        }
    }
}

/// Compare `actual` against `expected` at `path`
pub fn match_value(expected: &Bson, actual: &Bson, path: &str) -> Result<(), Mismatch> {
    match (expected, actual) {
        (Bson::Document(expected), Bson::Document(actual)) => {
            for (key, expected_value) in expected {
                let child = format!("{path}.{key}");
                match actual.get(key) {
                    Some(actual_value) => match_value(expected_value, actual_value, &child)?,
                    None => {
                        return Err(Mismatch::new(
                            &child,
                            bson_to_relaxed_json(expected_value),
                            "<missing>",
                        ))
                    }
                }
            }
            Ok(())
        }
        (Bson::Array(expected), Bson::Array(actual)) => {
            if expected.len() != actual.len() {
                return Err(Mismatch::new(
                    path,
                    format!("{} elements", expected.len()),
                    format!("{} elements", actual.len()),
                ));
            }
            expected
                .iter()
                .zip(actual)
                .enumerate()
                .try_for_each(|(i, (e, a))| match_value(e, a, &format!("{path}.{i}")))
        }
        _ => match (as_number(expected), as_number(actual)) {
            (Some(e), Some(a)) if e == a => Ok(()),
            _ if expected == actual => Ok(()),
            _ => Err(Mismatch::new(
                path,
                bson_to_relaxed_json(expected),
                bson_to_relaxed_json(actual),
            )),
        },
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl PartialEq for Number {
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => a as f64 == b,
            (Self::Float(a), Self::Float(b)) => a == b,
        }
    }
}

fn as_number(value: &Bson) -> Option<Number> {
    match value {
        Bson::Int32(n) => Some(Number::Int(i64::from(*n))),
        Bson::Int64(n) => Some(Number::Int(*n)),
        Bson::Double(n) => Some(Number::Float(*n)),
        _ => None,
    }
}

/// Check an operation's result or failure against its declared outcome
///
/// A failure the outcome says nothing about (no `result`, `error` or
/// `errorContains`) is logged and accepted.
pub fn check_result(
    operation: &str,
    outcome: &Outcome,
    actual: &Result<Bson, DatabaseFailure>,
) -> Result<(), ClientOperationError> {
    match actual {
        Err(failure) => {
            if outcome.expects_error() {
                if let Some(needle) = &outcome.error_contains {
                    if !failure.0.to_lowercase().contains(&needle.to_lowercase()) {
                        return Err(Mismatch::new(
                            "errorContains",
                            format!("an error containing \"{needle}\""),
                            failure.0.clone(),
                        )
                        .into_error(operation));
                    }
                }
                Ok(())
            } else if outcome.declares_result_or_error() {
                Err(Mismatch::new("error", "success", failure.0.clone()).into_error(operation))
            } else {
                tracing::warn!(operation, "ignoring operation error: {}", failure);
                Ok(())
            }
        }
        Ok(value) => {
            if outcome.expects_error() {
                return Err(
                    Mismatch::new("error", "an error", bson_to_relaxed_json(value))
                        .into_error(operation),
                );
            }
            match &outcome.result {
                Some(expected) => {
                    match_value(expected, value, "result").map_err(|m| m.into_error(operation))
                }
                None => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::bson;
    use pretty_assertions::assert_eq;

    #[test]
    fn extra_actual_keys_are_allowed() {
        let expected = bson!({ "insertedId": 1 });
        let actual = bson!({ "insertedId": 1, "acknowledged": true });
        assert!(match_value(&expected, &actual, "result").is_ok());
    }

    #[test]
    fn missing_key_reports_path() {
        let expected = bson!({ "a": { "b": 1 } });
        let actual = bson!({ "a": { "c": 1 } });
        let m = match_value(&expected, &actual, "result").unwrap_err();
        assert_eq!(m.path, "result.a.b");
        assert_eq!(m.actual, "<missing>");
    }

    #[test]
    fn numbers_compare_across_types() {
        assert!(match_value(&bson!(1), &Bson::Int64(1), "r").is_ok());
        assert!(match_value(&Bson::Double(2.0), &Bson::Int32(2), "r").is_ok());
        assert!(match_value(&Bson::Double(2.5), &Bson::Int32(2), "r").is_err());
    }

    #[test]
    fn arrays_must_have_same_length() {
        let m = match_value(&bson!([1, 2]), &bson!([1, 2, 3]), "result").unwrap_err();
        assert_eq!(m.expected, "2 elements");
        assert_eq!(m.actual, "3 elements");
    }

    #[test]
    fn array_elements_match_pairwise() {
        let expected = bson!([{ "_id": 1 }, { "_id": 2 }]);
        let actual = bson!([{ "_id": 1, "x": 1 }, { "_id": 3 }]);
        let m = match_value(&expected, &actual, "result").unwrap_err();
        assert_eq!(m.path, "result.1._id");
    }

    #[test]
    fn strings_compare_exactly() {
        assert!(match_value(&bson!("a"), &bson!("a"), "r").is_ok());
        assert!(match_value(&bson!("a"), &bson!("A"), "r").is_err());
        assert!(match_value(&bson!("1"), &bson!(1), "r").is_err());
    }

    #[test]
    fn expected_error_accepts_failure() {
        let outcome = Outcome {
            error: Some(true),
            error_contains: Some("DUPLICATE KEY".into()),
            ..Outcome::default()
        };
        let actual = Err(DatabaseFailure("E11000 duplicate key error".into()));
        assert!(check_result("insertOne", &outcome, &actual).is_ok());
    }

    #[test]
    fn wrong_error_text_is_mismatch() {
        let outcome = Outcome {
            error_contains: Some("timeout".into()),
            ..Outcome::default()
        };
        let actual = Err(DatabaseFailure("duplicate key".into()));
        let err = check_result("insertOne", &outcome, &actual).unwrap_err();
        assert!(matches!(
            err,
            ClientOperationError::OutcomeMismatch { ref path, .. } if path == "errorContains"
        ));
    }

    #[test]
    fn expected_error_rejects_success() {
        let outcome = Outcome {
            error: Some(true),
            ..Outcome::default()
        };
        let err =
            check_result("deleteOne", &outcome, &Ok(bson!({ "deletedCount": 1 }))).unwrap_err();
        assert!(matches!(
            err,
            ClientOperationError::OutcomeMismatch { ref expected, .. } if expected == "an error"
        ));
    }

    #[test]
    fn declared_result_rejects_failure() {
        let outcome = Outcome {
            result: Some(bson!(1)),
            ..Outcome::default()
        };
        let err = check_result("countDocuments", &outcome, &Err(DatabaseFailure("boom".into())))
            .unwrap_err();
        assert!(matches!(
            err,
            ClientOperationError::OutcomeMismatch { ref actual, .. } if actual == "boom"
        ));
    }

    #[test]
    fn undeclared_failure_is_ignored() {
        let actual = Err(DatabaseFailure("boom".into()));
        assert!(check_result("find", &Outcome::default(), &actual).is_ok());
    }

    #[test]
    fn result_mismatch_names_operation() {
        let outcome = Outcome {
            result: Some(bson!({ "deletedCount": 2 })),
            ..Outcome::default()
        };
        let err =
            check_result("deleteMany", &outcome, &Ok(bson!({ "deletedCount": 1 }))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "deleteMany: outcome mismatch at result.deletedCount: expected 2, got 1"
        );
    }
}
