//! Orchestration command envelopes
//!
//! The orchestration service receives one command document per request:
//!
//! ```text
//! { <verb>: <path>, body: <document> }
//! ```
//!
//! e.g. `{ post: "/v1/servers", body: { id: "s0", ... } }`.

use bson::Document;

/// Verb used to create a deployment
pub const VERB_POST: &str = "post";
/// Verb used to remove a deployment
pub const VERB_DELETE: &str = "delete";

/// Reply from the orchestration service
pub type ReplyDocument = Document;

/// One request to the orchestration service
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEnvelope {
    verb: String,
    path: String,
    body: Option<Document>,
}

impl CommandEnvelope {
    /// Create envelope without a body; the verb is lowercased
    #[must_use]
    pub fn new(verb: impl AsRef<str>, path: impl Into<String>) -> Self {
        Self {
            verb: verb.as_ref().to_ascii_lowercase(),
            path: path.into(),
            body: None,
        }
    }

    /// `post` to `path`
    #[must_use]
    pub fn post(path: impl Into<String>, body: Document) -> Self {
        Self::new(VERB_POST, path).with_body(body)
    }

    /// `delete` of `path`
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(VERB_DELETE, path)
    }

    /// Attach a body
    #[must_use]
    pub fn with_body(mut self, body: Document) -> Self {
        self.body = Some(body);
        self
    }

    #[inline]
    #[must_use]
    pub fn verb(&self) -> &str {
        &self.verb
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    #[must_use]
    pub fn body(&self) -> Option<&Document> {
        self.body.as_ref()
    }

    /// Wire form sent to the service
    #[must_use]
    pub fn to_command(&self) -> Document {
        let mut command = Document::new();
        command.insert(self.verb.clone(), self.path.clone());
        if let Some(body) = &self.body {
            command.insert("body", body.clone());
        }
        command
    }

    /// Recover an envelope from its wire form
    ///
    /// The first key is the verb; `body` is optional. Returns `None` for
    /// anything else.
    #[must_use]
    pub fn from_command(command: &Document) -> Option<Self> {
        let mut entries = command.iter();
        let (verb, path) = entries.next()?;
        let path = path.as_str()?;
        let body = match command.get("body") {
            Some(bson::Bson::Document(body)) => Some(body.clone()),
            Some(_) => return None,
            None => None,
        };
        if command.len() != 1 + usize::from(body.is_some()) {
            return None;
        }
        Some(Self {
            verb: verb.clone(),
            path: path.to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn verb_is_lowercased() {
        let env = CommandEnvelope::new("POST", "/servers/A");
        assert_eq!(env.verb(), "post");
        assert_eq!(env.to_command(), doc! { "post": "/servers/A" });
    }

    #[test]
    fn body_follows_verb() {
        let env = CommandEnvelope::post("/v1/servers", doc! { "id": "s0" });
        let command = env.to_command();
        assert_eq!(command.keys().collect::<Vec<_>>(), vec!["post", "body"]);
        assert_eq!(command.get_document("body").unwrap(), &doc! { "id": "s0" });
    }

    #[test]
    fn wire_form_round_trips() {
        let env = CommandEnvelope::delete("/v1/replica_sets/r0");
        assert_eq!(CommandEnvelope::from_command(&env.to_command()), Some(env));

        let env = CommandEnvelope::post("/v1/servers", doc! { "id": "s0" });
        assert_eq!(CommandEnvelope::from_command(&env.to_command()), Some(env));
    }

    #[test]
    fn from_command_rejects_foreign_documents() {
        assert!(CommandEnvelope::from_command(&doc! {}).is_none());
        assert!(CommandEnvelope::from_command(&doc! { "post": 1 }).is_none());
        assert!(CommandEnvelope::from_command(&doc! { "post": "/p", "extra": 1 }).is_none());
    }
}
