//! Parameter values of a transform, classified by shape.
//!
//! JSON numbers written with a fraction or exponent (`2.0`, `1e-3`) are [`Param::Scalar`] and
//! take part in interpolation. Integer literals, strings, booleans and null are carried as
//! [`Param::Opaque`] and never change.

use std::collections::BTreeMap;

use serde_json::Value;

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(from = "Value")]
pub enum Param {
    Scalar(f64),
    Mapping(BTreeMap<String, Param>),
    Sequence(Vec<Param>),
    Opaque(Value),
}

impl Param {
    /// Numeric view used for the end side of an interpolation; integers widen to `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Opaque(Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Param>> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Param]> {
        match self {
            Self::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Short shape name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "float",
            Self::Mapping(_) => "mapping",
            Self::Sequence(_) => "sequence",
            Self::Opaque(Value::Number(_)) => "integer",
            Self::Opaque(Value::String(_)) => "string",
            Self::Opaque(Value::Bool(_)) => "bool",
            Self::Opaque(_) => "null",
        }
    }
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        match v {
            Value::Number(n) if n.is_f64() => match n.as_f64() {
                Some(f) => Self::Scalar(f),
                None => Self::Opaque(Value::Number(n)),
            },
            Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            other => Self::Opaque(other),
        }
    }
}

impl serde::Serialize for Param {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::{Serialize as _, ser::Error as _};
        match self {
            Self::Scalar(f) if !f.is_finite() => Err(S::Error::custom(format!(
                "float parameter is not finite ({f}); JSON cannot represent it"
            ))),
            Self::Scalar(f) => serializer.serialize_f64(*f),
            Self::Mapping(m) => serializer.collect_map(m),
            Self::Sequence(s) => serializer.collect_seq(s),
            Self::Opaque(v) => v.serialize(serializer),
        }
    }
}
