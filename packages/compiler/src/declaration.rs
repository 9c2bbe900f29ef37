//! The declaration-dictionary contract the Lexer depends on (spec §3 "Token",
//! spec §6 "Declaration dictionary").
//!
//! This is deliberately a plain data shape with no parsing logic: it is what
//! an external structural decoder (SourceKit-like) is expected to deliver.
//! The core never constructs these directly from source text; see
//! `weaver-compiler-cli`'s `DeclarationScanner` for a minimal stand-in.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclarationKind {
    Class,
    Struct,
    Enum,
    Extension,
    VarInstance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecord {
    /// e.g. `"source.decl.attribute.custom"` or an `objc` marker.
    pub name: String,
    /// The raw annotation text (`@Weaver(...)`) when this is a custom
    /// property-wrapper attribute; `None` for bare markers like `objc`.
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationRecord {
    pub kind: DeclarationKind,
    pub name: String,
    pub typename: Option<String>,
    pub offset: usize,
    pub length: usize,
    pub accessibility: Option<String>,
    pub attributes: Vec<AttributeRecord>,
    pub substructure: Vec<DeclarationRecord>,
    pub body_offset: Option<usize>,
}

impl DeclarationRecord {
    pub fn has_body(&self) -> bool {
        self.body_offset.is_some()
    }

    /// The `objc` attribute marker is present among `attributes`.
    pub fn has_objc_attribute(&self) -> bool {
        self.attributes.iter().any(|a| a.name == "objc")
    }

    /// Custom property-wrapper annotation texts attached to this
    /// declaration (there may be more than one, though only the first
    /// recognized one is meaningful per variable in practice).
    pub fn custom_attribute_texts(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().filter_map(|a| a.text.as_deref())
    }
}
