use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::operator::{ValidationError, ValidationErrorKind};

/// Errors that occur when building a graph from a description.
#[derive(Debug)]
pub struct LoadError {
    inner: LoadErrorImpl,
    node: Option<String>,
}

impl LoadError {
    pub(crate) fn new(kind: LoadErrorImpl) -> Self {
        Self {
            inner: kind,
            node: None,
        }
    }

    pub(crate) fn for_node(node: Option<&str>, kind: LoadErrorImpl) -> Self {
        Self {
            inner: kind,
            node: node.map(|n| n.to_string()),
        }
    }

    /// The name of the graph node that this error relates to.
    ///
    /// This can be `None` if the error is not about a specific node, or if that
    /// node doesn't have a name.
    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    /// Return the category of error.
    pub fn kind(&self) -> LoadErrorKind {
        self.inner.kind()
    }

    /// Return the distinct operator types that were not recognized, in the
    /// order they first appear in the description.
    ///
    /// This is empty unless the error kind is
    /// [`UnknownOperators`](LoadErrorKind::UnknownOperators).
    pub fn unknown_operators(&self) -> &[String] {
        match &self.inner {
            LoadErrorImpl::UnknownOperators(op_types) => op_types,
            _ => &[],
        }
    }

    /// Return the operator validation failure that caused this error, if any.
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match &self.inner {
            LoadErrorImpl::ValidationFailed { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(node) = self.node.as_deref() {
            write!(f, "in node \"{}\": {}", node, self.inner)
        } else {
            self.inner.fmt(f)
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source()
    }
}

impl From<LoadErrorImpl> for LoadError {
    fn from(val: LoadErrorImpl) -> Self {
        Self::new(val)
    }
}

/// Categories of error when building a graph.
///
/// See [`LoadError::kind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoadErrorKind {
    /// The textual graph description could not be parsed.
    ParseError,

    /// The description is malformed, eg. a node refers to a value that has
    /// not been defined.
    SchemaError,

    /// One or more nodes use operator types that are not registered.
    UnknownOperators,

    /// Failed to create an operator from its attributes.
    OperatorInvalid,

    /// An operator input has an unsupported element type.
    TypeConstraint,

    /// An operator input or attribute has an unsupported shape.
    ShapeConstraint,
}

/// The internal implementation of [`LoadError`].
#[derive(Debug)]
pub(crate) enum LoadErrorImpl {
    /// An error occurred parsing the textual description.
    ParseFailed(Box<dyn Error + Send + Sync>),

    /// The description is structurally invalid.
    SchemaError(Box<dyn Error + Send + Sync>),

    /// Distinct operator types which are not in the registry.
    UnknownOperators(Vec<String>),

    /// An error occurred reading an operator's attributes.
    OperatorInvalid(Box<dyn Error + Send + Sync>),

    /// An operator rejected its inputs.
    ValidationFailed {
        op: &'static str,
        error: ValidationError,
    },
}

impl LoadErrorImpl {
    fn kind(&self) -> LoadErrorKind {
        type Kind = LoadErrorKind;

        match self {
            Self::ParseFailed(_) => Kind::ParseError,
            Self::SchemaError(_) => Kind::SchemaError,
            Self::UnknownOperators(_) => Kind::UnknownOperators,
            Self::OperatorInvalid(_) => Kind::OperatorInvalid,
            Self::ValidationFailed { error, .. } => match error.kind() {
                ValidationErrorKind::Arity => Kind::SchemaError,
                ValidationErrorKind::Type => Kind::TypeConstraint,
                ValidationErrorKind::Shape => Kind::ShapeConstraint,
                ValidationErrorKind::Attribute => Kind::OperatorInvalid,
            },
        }
    }

    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ParseFailed(err) => Some(err.as_ref()),
            Self::SchemaError(err) => Some(err.as_ref()),
            Self::UnknownOperators(_) => None,
            Self::OperatorInvalid(err) => Some(err.as_ref()),
            Self::ValidationFailed { error, .. } => Some(error),
        }
    }
}

impl Display for LoadErrorImpl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseFailed(e) => write!(f, "parse error: {e}"),
            Self::SchemaError(e) => write!(f, "schema error: {e}"),
            Self::UnknownOperators(op_types) => {
                write!(f, "unknown operators: {}", op_types.join(", "))
            }
            Self::OperatorInvalid(e) => write!(f, "operator error: {e}"),
            Self::ValidationFailed { op, error } => write!(f, "{op} validation failed: {error}"),
        }
    }
}

/// Create a [`LoadError`] that relates to a specific graph node.
macro_rules! load_error {
    ($kind:ident, $node_name:expr, $format_str:literal, $($arg:tt)*) => {{
        let err = format!($format_str, $($arg)*);
        LoadError::for_node($node_name, LoadErrorImpl::$kind(err.into()))
    }};

    ($kind:ident, $node_name:expr, $err:expr) => {{
        LoadError::for_node($node_name, LoadErrorImpl::$kind($err.into()))
    }}
}

pub(crate) use load_error;
