use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tensor_ir_shape::{AxisSet, Shape};

use crate::element::ElementType;
use crate::model::{AttrValue, NodeDesc};
use crate::ops::Op;

mod read_ops;

/// Registry used to create operators from graph descriptions.
///
/// New registries have no operators registered by default. To create a
/// registry with all built-in operators pre-registered, use
/// [`OpRegistry::with_all_ops`]. Alternatively create a new registry and
/// selectively register the required operators using
/// [`OpRegistry::register_op`].
///
/// Each operator is available from the IR version returned by
/// [`ReadOp::since_version`]. Graphs declaring an older version cannot use
/// it.
#[derive(Default)]
pub struct OpRegistry {
    /// Map from operator type (the `NodeDesc::op_type` field) to factory.
    ops: FxHashMap<&'static str, Registration>,
}

struct Registration {
    since_version: u32,
    factory: ReadOpFunction,
}

type ReadOpFunction = fn(&Attrs) -> Result<Op, ReadOpError>;

impl OpRegistry {
    /// Create a new empty registry.
    pub fn new() -> OpRegistry {
        OpRegistry {
            ops: FxHashMap::default(),
        }
    }

    /// Register the built-in implementation of an operator.
    ///
    /// ```
    /// use tensor_ir::ops::{Add, Relu};
    /// use tensor_ir::OpRegistry;
    ///
    /// let mut reg = OpRegistry::new();
    /// reg.register_op::<Add>();
    /// reg.register_op::<Relu>();
    /// assert!(reg.contains("Relu", 1));
    /// assert!(!reg.contains("Concat", 1));
    /// ```
    pub fn register_op<T: ReadOp + 'static>(&mut self) {
        self.ops.insert(
            T::op_type(),
            Registration {
                since_version: T::since_version(),
                factory: T::read_op,
            },
        );
    }

    /// Return true if `op_type` is a recognized operator in graphs with
    /// the given IR version.
    pub fn contains(&self, op_type: &str, ir_version: u32) -> bool {
        self.ops
            .get(op_type)
            .is_some_and(|reg| reg.since_version <= ir_version)
    }

    /// Return the registered operator types in sorted order.
    pub fn op_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.ops.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Create the operator for a node in a graph description.
    ///
    /// If `strict` is true, attributes which the operator does not use are an
    /// error. Otherwise they are logged and ignored.
    pub fn read_op(
        &self,
        node: &NodeDesc,
        ir_version: u32,
        strict: bool,
    ) -> Result<Op, ReadOpError> {
        let reg = self
            .ops
            .get(node.op_type.as_str())
            .filter(|reg| reg.since_version <= ir_version)
            .ok_or_else(|| ReadOpError::OperatorUnavailable {
                op_type: node.op_type.clone(),
                ir_version,
            })?;

        let attrs = Attrs::new(&node.attribute);
        let op = (reg.factory)(&attrs)?;

        if let Some(attr) = attrs.unused().next() {
            if strict {
                return Err(ReadOpError::UnknownAttr {
                    attr: attr.to_string(),
                });
            }
            for attr in attrs.unused() {
                log::warn!(
                    "ignoring unsupported attribute \"{}\" of {} node \"{}\"",
                    attr,
                    node.op_type,
                    node.name.as_deref().unwrap_or_default()
                );
            }
        }

        Ok(op)
    }

    /// Create a new registry with all built-in operators registered.
    pub fn with_all_ops() -> OpRegistry {
        let mut reg = OpRegistry::new();

        macro_rules! register_op {
            ($op:ident) => {
                reg.register_op::<crate::ops::$op>()
            };
        }

        register_op!(Abs);
        register_op!(Add);
        register_op!(And);
        register_op!(AvgPool);
        register_op!(Concat);
        register_op!(Convert);
        register_op!(Dequantize);
        register_op!(Divide);
        register_op!(Equal);
        register_op!(GenerateMask);
        register_op!(Greater);
        register_op!(Less);
        register_op!(MaxPool);
        register_op!(Multiply);
        register_op!(Negative);
        register_op!(Not);
        register_op!(Or);
        register_op!(Pad);
        register_op!(Quantize);
        register_op!(Relu);
        register_op!(Reverse);
        register_op!(Slice);
        register_op!(Subtract);
        register_op!(Sum);
        register_op!(TopK);

        reg
    }
}

/// Error type for errors that occur when creating an operator from a node
/// description.
#[derive(Clone, Debug, PartialEq)]
pub enum ReadOpError {
    /// An attribute is missing, or has an unsupported or invalid value.
    AttrError {
        /// Name of the attribute.
        attr: String,
        /// Description of the attribute error.
        error: String,
    },

    /// The node has an attribute which the operator does not support.
    UnknownAttr { attr: String },

    /// The operator is unrecognized or not available in this IR version.
    OperatorUnavailable { op_type: String, ir_version: u32 },
}

impl ReadOpError {
    fn attr_error(attr: impl AsRef<str>, error: impl AsRef<str>) -> Self {
        Self::AttrError {
            attr: attr.as_ref().to_string(),
            error: error.as_ref().to_string(),
        }
    }
}

impl Display for ReadOpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadOpError::AttrError { attr, error } => {
                write!(f, "error in attribute \"{}\": {}", attr, error)
            }
            ReadOpError::UnknownAttr { attr } => write!(f, "unsupported attribute \"{}\"", attr),
            ReadOpError::OperatorUnavailable {
                op_type,
                ir_version,
            } => write!(
                f,
                "{} operator is not available in IR version {}",
                op_type, ir_version
            ),
        }
    }
}

impl Error for ReadOpError {}

/// Create an operator from the attributes of a node description.
pub trait ReadOp: Into<Op> + Sized {
    /// Return the operator name from the `NodeDesc::op_type` field.
    fn op_type() -> &'static str;

    /// Return the first IR version in which the operator is available.
    fn since_version() -> u32 {
        1
    }

    fn read(attrs: &Attrs) -> Result<Self, ReadOpError>;

    /// Create the operator and wrap it in an [`Op`].
    fn read_op(attrs: &Attrs) -> Result<Op, ReadOpError> {
        Ok(Self::read(attrs)?.into())
    }
}

/// Wrapper around the attributes of a node.
///
/// This provides methods to find attributes by name and convert them to a
/// target type. It also records which attributes have been read, to enable
/// detecting unsupported attributes.
pub struct Attrs<'a> {
    attrs: &'a BTreeMap<String, AttrValue>,
    used_attrs: RefCell<SmallVec<[&'static str; 6]>>,
}

impl<'a> Attrs<'a> {
    pub fn new(attrs: &'a BTreeMap<String, AttrValue>) -> Self {
        Self {
            attrs,
            used_attrs: RefCell::new(Default::default()),
        }
    }

    /// Get an optional attribute.
    pub fn get(&self, name: &'static str) -> Option<Attr<'a>> {
        self.used_attrs.borrow_mut().push(name);
        let value = self.attrs.get(name)?;
        Some(Attr { name, value })
    }

    /// Get a required attribute.
    pub fn require(&self, name: &'static str) -> Result<Attr<'a>, ReadOpError> {
        self.get(name)
            .ok_or_else(|| ReadOpError::attr_error(name, "required attribute missing"))
    }

    /// Return the names of attributes that have not been read.
    pub fn unused(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.attrs
            .keys()
            .map(|name| name.as_str())
            .filter(|name| !self.used_attrs.borrow().iter().any(|used| used == name))
    }
}

/// Wrapper around an attribute value.
///
/// This provides methods to extract the value as a given type. Each fails
/// if the value has a different type.
#[derive(Copy, Clone)]
pub struct Attr<'a> {
    name: &'static str,
    value: &'a AttrValue,
}

impl<'a> Attr<'a> {
    fn type_error(&self, expected: &str) -> ReadOpError {
        ReadOpError::attr_error(self.name, format!("expected {}", expected))
    }

    pub fn as_bool(&self) -> Result<bool, ReadOpError> {
        match self.value {
            AttrValue::Bool(value) => Ok(*value),
            AttrValue::Int(value) => Ok(*value != 0),
            _ => Err(self.type_error("a boolean")),
        }
    }

    pub fn as_i64(&self) -> Result<i64, ReadOpError> {
        match self.value {
            AttrValue::Int(value) => Ok(*value),
            _ => Err(self.type_error("an integer")),
        }
    }

    pub fn as_usize(&self) -> Result<usize, ReadOpError> {
        usize::try_from(self.as_i64()?)
            .map_err(|_| ReadOpError::attr_error(self.name, "value must be non-negative"))
    }

    pub fn as_f64(&self) -> Result<f64, ReadOpError> {
        match self.value {
            AttrValue::Float(value) => Ok(*value),
            AttrValue::Int(value) => Ok(*value as f64),
            _ => Err(self.type_error("a number")),
        }
    }

    pub fn as_ints(&self) -> Result<&'a [i64], ReadOpError> {
        match self.value {
            AttrValue::Ints(values) => Ok(values),
            _ => Err(self.type_error("a list of integers")),
        }
    }

    pub fn as_usize_ints(&self) -> Result<Vec<usize>, ReadOpError> {
        self.as_ints()?
            .iter()
            .map(|&value| {
                usize::try_from(value)
                    .map_err(|_| ReadOpError::attr_error(self.name, "values must be non-negative"))
            })
            .collect()
    }

    pub fn as_isize_ints(&self) -> Result<Vec<isize>, ReadOpError> {
        self.as_ints()?
            .iter()
            .map(|&value| {
                isize::try_from(value)
                    .map_err(|_| ReadOpError::attr_error(self.name, "value out of range"))
            })
            .collect()
    }

    pub fn as_axes(&self) -> Result<AxisSet, ReadOpError> {
        Ok(self.as_usize_ints()?.into_iter().collect())
    }

    pub fn as_shape(&self) -> Result<Shape, ReadOpError> {
        Ok(self.as_usize_ints()?.into())
    }

    pub fn as_str(&self) -> Result<&'a str, ReadOpError> {
        match self.value {
            AttrValue::String(value) => Ok(value),
            _ => Err(self.type_error("a string")),
        }
    }

    pub fn as_element_type(&self) -> Result<ElementType, ReadOpError> {
        self.as_str()?
            .parse()
            .map_err(|err| ReadOpError::attr_error(self.name, format!("{}", err)))
    }

    /// Get the value of a string enum and convert it to enum type `T`.
    pub fn as_string_enum<T: std::str::FromStr>(&self) -> Result<T, ReadOpError> {
        self.as_str()?
            .parse()
            .map_err(|_| ReadOpError::attr_error(self.name, "unsupported value"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tensor_ir_shape::AxisSet;

    use super::{Attrs, OpRegistry, ReadOpError};
    use crate::element::ElementType;
    use crate::model::{AttrValue, NodeDesc};
    use crate::ops::{Concat, Convert, Op, Quantize, RoundMode, Slice};

    fn node(op_type: &str, attrs: &[(&str, AttrValue)]) -> NodeDesc {
        NodeDesc {
            name: Some("node".to_string()),
            op_type: op_type.to_string(),
            input: Vec::new(),
            output: Vec::new(),
            attribute: attrs
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_read_ops() {
        let reg = OpRegistry::with_all_ops();

        let op = reg
            .read_op(&node("Concat", &[("axis", AttrValue::Int(1))]), 1, true)
            .unwrap();
        assert_eq!(op, Op::Concat(Concat { axis: 1 }));

        let op = reg
            .read_op(
                &node("Convert", &[("to", AttrValue::String("i64".into()))]),
                1,
                true,
            )
            .unwrap();
        assert_eq!(
            op,
            Op::Convert(Convert {
                to: ElementType::I64
            })
        );

        let op = reg
            .read_op(
                &node(
                    "Slice",
                    &[
                        ("lower_bounds", AttrValue::Ints(vec![0, 1])),
                        ("upper_bounds", AttrValue::Ints(vec![2, 3])),
                    ],
                ),
                1,
                true,
            )
            .unwrap();
        assert_eq!(op, Op::Slice(Slice::new(vec![0, 1], vec![2, 3])));

        let op = reg
            .read_op(
                &node(
                    "Quantize",
                    &[
                        ("to", AttrValue::String("u8".into())),
                        ("axes", AttrValue::Ints(vec![1])),
                        ("round_mode", AttrValue::String("half_to_even".into())),
                    ],
                ),
                2,
                true,
            )
            .unwrap();
        assert_eq!(
            op,
            Op::Quantize(Quantize {
                to: ElementType::U8,
                axes: AxisSet::from([1]),
                round_mode: RoundMode::HalfToEven,
            })
        );
    }

    #[test]
    fn test_since_version() {
        let reg = OpRegistry::with_all_ops();
        assert!(reg.contains("Add", 1));
        assert!(reg.contains("TopK", 2));
        assert!(!reg.contains("TopK", 1));
        assert!(!reg.contains("Conv", 2));

        let err = reg
            .read_op(&node("Dequantize", &[]), 1, true)
            .unwrap_err();
        assert_eq!(
            err,
            ReadOpError::OperatorUnavailable {
                op_type: "Dequantize".to_string(),
                ir_version: 1
            }
        );
    }

    #[test]
    fn test_attribute_errors() {
        let reg = OpRegistry::with_all_ops();

        let err = reg.read_op(&node("Concat", &[]), 1, true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "error in attribute \"axis\": required attribute missing"
        );

        let err = reg
            .read_op(
                &node("Concat", &[("axis", AttrValue::String("one".into()))]),
                1,
                true,
            )
            .unwrap_err();
        assert_eq!(
            err,
            ReadOpError::AttrError {
                attr: "axis".to_string(),
                error: "expected an integer".to_string()
            }
        );

        let err = reg
            .read_op(&node("Concat", &[("axis", AttrValue::Int(-1))]), 1, true)
            .unwrap_err();
        assert!(matches!(err, ReadOpError::AttrError { .. }));
    }

    #[test]
    fn test_unknown_attributes() {
        let reg = OpRegistry::with_all_ops();
        let desc = node(
            "Concat",
            &[("axis", AttrValue::Int(0)), ("extra", AttrValue::Int(1))],
        );

        assert_eq!(
            reg.read_op(&desc, 1, true),
            Err(ReadOpError::UnknownAttr {
                attr: "extra".to_string()
            })
        );
        assert_eq!(
            reg.read_op(&desc, 1, false),
            Ok(Op::Concat(Concat { axis: 0 }))
        );
    }

    #[test]
    fn test_attrs_tracks_used() {
        let values: BTreeMap<String, AttrValue> = [
            ("a".to_string(), AttrValue::Int(1)),
            ("b".to_string(), AttrValue::Float(0.5)),
        ]
        .into();
        let attrs = Attrs::new(&values);
        assert_eq!(attrs.unused().collect::<Vec<_>>(), ["a", "b"]);

        assert_eq!(attrs.require("b").unwrap().as_f64(), Ok(0.5));
        assert!(attrs.get("c").is_none());
        assert_eq!(attrs.unused().collect::<Vec<_>>(), ["a"]);
    }

    #[test]
    fn test_custom_registry() {
        let mut reg = OpRegistry::new();
        reg.register_op::<Concat>();
        assert_eq!(reg.op_types(), ["Concat"]);
        assert!(!reg.contains("Add", 1));
    }
}
