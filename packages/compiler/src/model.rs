//! Type/Annotation value model.
//!
//! `CompositeType` is the parsed shape of a type expression written in the
//! host source; everything else in this module is the small closed-set
//! vocabulary layered on top of it (access levels, scopes, dependency kinds,
//! configuration attributes).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A parsed type expression, structural and whitespace-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompositeType {
    Named { name: String, generics: Vec<CompositeType> },
    Tuple(Vec<CompositeType>),
    Closure { params: Vec<CompositeType>, return_type: Box<CompositeType> },
    Optional(Box<CompositeType>),
}

impl CompositeType {
    pub fn named(name: impl Into<String>) -> Self {
        CompositeType::Named { name: name.into(), generics: Vec::new() }
    }

    /// The bare type name at the head of this expression, peeling through
    /// `Optional` wrappers. `None` for tuples/closures, which never name a
    /// single injectable type.
    pub fn head_name(&self) -> Option<&str> {
        match self {
            CompositeType::Named { name, .. } => Some(name),
            CompositeType::Optional(inner) => inner.head_name(),
            CompositeType::Tuple(_) | CompositeType::Closure { .. } => None,
        }
    }
}

impl fmt::Display for CompositeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositeType::Named { name, generics } => {
                write!(f, "{}", name)?;
                if !generics.is_empty() {
                    write!(f, "<")?;
                    for (i, g) in generics.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", g)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            CompositeType::Tuple(components) => {
                write!(f, "(")?;
                for (i, c) in components.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, ")")
            }
            CompositeType::Closure { params, return_type } => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", return_type)
            }
            CompositeType::Optional(inner) => write!(f, "Optional<{}>", inner),
        }
    }
}

/// The declared *interface* a dependency exposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbstractType(pub CompositeType);

/// The declared *implementation* backing a registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConcreteType(pub CompositeType);

/// One of `public`, `internal`, `default` ("inherit enclosing").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccessLevel {
    Public,
    Internal,
    Default,
}

impl AccessLevel {
    /// Parses by membership in a fixed set of keyword substrings, matching
    /// the first one found. Defaults to `internal`.
    pub fn parse(declaration_text: &str) -> Self {
        const KEYWORDS: &[(&str, AccessLevel)] = &[
            ("public", AccessLevel::Public),
            ("open", AccessLevel::Public),
            ("internal", AccessLevel::Internal),
            ("fileprivate", AccessLevel::Internal),
            ("private", AccessLevel::Internal),
        ];
        for word in declaration_text.split_whitespace() {
            for (keyword, level) in KEYWORDS {
                if word == *keyword {
                    return *level;
                }
            }
        }
        AccessLevel::Default
    }

    /// Resolves `Default` against an enclosing level; concrete levels pass
    /// through unchanged.
    pub fn resolve(self, enclosing: AccessLevel) -> AccessLevel {
        match self {
            AccessLevel::Default => enclosing,
            other => other,
        }
    }

    /// Whether `self` is at least as restrictive as `other` (i.e. does not
    /// leak access beyond it). `Public` is the least restrictive.
    pub fn is_no_wider_than(self, other: AccessLevel) -> bool {
        fn rank(level: AccessLevel) -> u8 {
            match level {
                AccessLevel::Public => 2,
                AccessLevel::Internal => 1,
                AccessLevel::Default => 1,
            }
        }
        rank(self) <= rank(other)
    }
}

/// Instance reuse rule across `resolve` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Transient,
    Graph,
    Container,
    Weak,
    Lazy,
}

impl Scope {
    pub fn parse(text: &str) -> Result<Self, crate::error::TokenError> {
        match text.trim_start_matches('.') {
            "transient" => Ok(Scope::Transient),
            "graph" => Ok(Scope::Graph),
            "container" => Ok(Scope::Container),
            "weak" => Ok(Scope::Weak),
            "lazy" => Ok(Scope::Lazy),
            other => Err(crate::error::TokenError::InvalidScope(other.to_string())),
        }
    }

    /// Scopes that share `container`'s lifetime management (I4).
    pub fn is_container_lifetime(self) -> bool {
        matches!(self, Scope::Container | Scope::Weak | Scope::Lazy)
    }
}

/// What fulfills a dependency slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    Registration,
    Reference,
    Parameter,
}

/// A value attached to a `ConfigurationAttribute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigValue {
    Bool(bool),
    String(String),
    Enum(String),
}

/// A name/value pair attached to a type or a dependency.
///
/// Names are drawn from a closed set (spec §6); unrecognized names are
/// rejected by the Lexer before a `ConfigurationAttribute` is ever built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationAttribute {
    pub name: String,
    pub value: ConfigValue,
}

/// Closed set of configuration attribute names the Lexer accepts.
pub const KNOWN_CONFIGURATION_KEYS: &[&str] = &[
    "scope",
    "customBuilder",
    "doesSupportObjc",
    "setter",
    "escaping",
    "projected",
    "objc",
    "isIsolated",
];

pub fn is_known_configuration_key(name: &str) -> bool {
    KNOWN_CONFIGURATION_KEYS.contains(&name)
}
