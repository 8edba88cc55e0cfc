//! The parsed test specification document

use crate::document::{get_case_insensitive, parse_json_document};
use crate::error::{InputError, LoadError, SpecError};
use crate::topology::TopologyType;
use bson::{Bson, Document};
use std::path::Path;

/// A topology test read from a JSON document
///
/// Top-level keys are matched ignoring case. `phases` stay raw until the
/// dispatcher reaches them so that a malformed element stops the run at its
/// own position.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSpecification {
    /// Human readable test name
    pub description: String,
    /// Deployment kind to provision
    pub topology: TopologyType,
    /// Posted verbatim to the orchestration service
    pub init_config: Document,
    /// Ordered, unparsed phase elements
    pub phases: Vec<Bson>,
}

impl TestSpecification {
    /// Read and parse a specification file
    ///
    /// # Errors
    /// [`LoadError::Input`] when the file is unreadable or not a JSON
    /// document, [`LoadError::Spec`] when the document is not a valid
    /// specification.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| InputError::io_error(path, e))?;
        Self::from_json_str(&text, &path.display().to_string())
    }

    /// Parse a specification from JSON text
    pub fn from_json_str(text: &str, origin: &str) -> Result<Self, LoadError> {
        let doc = parse_json_document(text, origin)?;
        Ok(Self::from_document(&doc)?)
    }

    /// Build a specification from an already decoded document
    pub fn from_document(doc: &Document) -> Result<Self, SpecError> {
        let description = match get_case_insensitive(doc, "description") {
            Some(Bson::String(s)) => s.clone(),
            Some(_) => {
                return Err(SpecError::WrongType {
                    field: "description",
                    expected: "a string",
                })
            }
            None => return Err(SpecError::MissingField("description")),
        };

        let topology = match get_case_insensitive(doc, "type") {
            Some(Bson::String(s)) => s.parse::<TopologyType>()?,
            Some(_) => {
                return Err(SpecError::WrongType {
                    field: "type",
                    expected: "a string",
                })
            }
            None => return Err(SpecError::MissingField("type")),
        };

        let init_config = match get_case_insensitive(doc, "initConfig") {
            Some(Bson::Document(d)) => d.clone(),
            Some(_) => {
                return Err(SpecError::WrongType {
                    field: "initConfig",
                    expected: "a document",
                })
            }
            None => return Err(SpecError::MissingField("initConfig")),
        };

        // A specification without phases only provisions and tears down.
        let phases = match get_case_insensitive(doc, "phases") {
            Some(Bson::Array(items)) => items.clone(),
            Some(_) => {
                return Err(SpecError::WrongType {
                    field: "phases",
                    expected: "an array",
                })
            }
            None => Vec::new(),
        };

        Ok(Self {
            description,
            topology,
            init_config,
            phases,
        })
    }

    /// The `initConfig.id` naming the deployment
    ///
    /// # Errors
    /// [`SpecError::MissingDeploymentId`] when absent, empty or not a string.
    pub fn deployment_id(&self) -> Result<&str, SpecError> {
        match get_case_insensitive(&self.init_config, "id") {
            Some(Bson::String(id)) if !id.is_empty() => Ok(id.as_str()),
            _ => Err(SpecError::MissingDeploymentId),
        }
    }
}
