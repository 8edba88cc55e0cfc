//! Document helpers shared by the loader, the phase parser and the wire log

use crate::error::InputError;
use bson::{Bson, Document};

/// Find a field ignoring ASCII case. The first matching key wins.
#[must_use]
pub fn get_case_insensitive<'a>(doc: &'a Document, key: &str) -> Option<&'a Bson> {
    doc.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// Parse JSON text (extended JSON allowed) into a document
///
/// `origin` names the source in error messages, usually a file path.
pub fn parse_json_document(text: &str, origin: &str) -> Result<Document, InputError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|source| InputError::InvalidJson {
            origin: origin.to_string(),
            source,
        })?;

    match Bson::try_from(value) {
        Ok(Bson::Document(doc)) => Ok(doc),
        Ok(_) => Err(InputError::NotADocument {
            origin: origin.to_string(),
        }),
        Err(e) => Err(InputError::InvalidExtendedJson {
            origin: origin.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Render a document as relaxed extended JSON text
#[must_use]
pub fn to_relaxed_json(doc: &Document) -> String {
    Bson::Document(doc.clone()).into_relaxed_extjson().to_string()
}

/// Render any value as relaxed extended JSON text
#[must_use]
pub fn bson_to_relaxed_json(value: &Bson) -> String {
    value.clone().into_relaxed_extjson().to_string()
}
