//! In-memory cache of open documents.
//!
//! Synchronisation is full-content only: every change replaces the stored
//! text wholesale.

use std::collections::HashMap;

use thiserror::Error;

/// A document the client has opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDocument {
    /// Document URI.
    pub uri: String,
    /// Language identifier supplied on open.
    pub language_id: String,
    /// Client-side version number.
    pub version: i32,
    /// Current text.
    pub text: String,
}

/// A command referenced a document the client never opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("document '{uri}' is not open")]
pub struct DocumentNotOpen {
    /// URI that was not found.
    pub uri: String,
}

impl DocumentNotOpen {
    fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_owned(),
        }
    }
}

/// Mapping from URI to open document.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: HashMap<String, OpenDocument>,
}

impl DocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `uri` with `text`, overwriting any existing entry.
    pub fn open(&mut self, uri: impl Into<String>, text: impl Into<String>) {
        self.insert(OpenDocument {
            uri: uri.into(),
            language_id: String::new(),
            version: 0,
            text: text.into(),
        });
    }

    /// Stores a fully described document, overwriting any existing entry.
    pub fn insert(&mut self, document: OpenDocument) {
        self.documents.insert(document.uri.clone(), document);
    }

    /// Replaces the text of an open document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentNotOpen`] when `uri` has no entry.
    pub fn replace(
        &mut self,
        uri: &str,
        text: impl Into<String>,
    ) -> Result<&mut OpenDocument, DocumentNotOpen> {
        let document = self
            .documents
            .get_mut(uri)
            .ok_or_else(|| DocumentNotOpen::new(uri))?;
        document.text = text.into();
        Ok(document)
    }

    /// Looks up an open document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentNotOpen`] when `uri` has no entry.
    pub fn get(&self, uri: &str) -> Result<&OpenDocument, DocumentNotOpen> {
        self.documents
            .get(uri)
            .ok_or_else(|| DocumentNotOpen::new(uri))
    }

    /// Current text of an open document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentNotOpen`] when `uri` has no entry.
    pub fn text(&self, uri: &str) -> Result<&str, DocumentNotOpen> {
        self.get(uri).map(|document| document.text.as_str())
    }

    /// Removes an open document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentNotOpen`] when `uri` has no entry.
    pub fn close(&mut self, uri: &str) -> Result<OpenDocument, DocumentNotOpen> {
        self.documents
            .remove(uri)
            .ok_or_else(|| DocumentNotOpen::new(uri))
    }

    /// Number of open documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` when no document is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
