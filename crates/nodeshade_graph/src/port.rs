// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs.
//!
//! A [`Port`] is a typed input slot. It is either left open (and must then be
//! wired before compilation), or resolved to one of three [`PortSource`]s:
//! a literal [`PortValue`], a raw GLSL expression passed through verbatim, or a
//! [`Connection`] to another node's output.

use crate::connection::Connection;
use crate::glsl;
use crate::node::Node;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data type that can flow through ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Floating point value
    Float,
    /// 2D vector
    Vector2,
    /// 3D vector
    Vector3,
    /// 4D vector
    Vector4,
    /// RGB color, stored as a 3D vector
    Color,
}

impl ValueKind {
    /// GLSL type name used in declarations
    pub fn glsl_type(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Vector2 => "vec2",
            Self::Vector3 | Self::Color => "vec3",
            Self::Vector4 => "vec4",
        }
    }

    /// Number of scalar components
    pub fn components(self) -> usize {
        match self {
            Self::Float => 1,
            Self::Vector2 => 2,
            Self::Vector3 | Self::Color => 3,
            Self::Vector4 => 4,
        }
    }

    /// GLSL expression for the zero value of this kind
    pub fn zero(self) -> String {
        match self {
            Self::Float => "0.0".to_string(),
            other => format!("{}(0.0)", other.glsl_type()),
        }
    }

    /// Whether a port of this kind can hold a value of kind `source`.
    ///
    /// Colors and 3D vectors share a representation and are interchangeable.
    /// A scalar widens to a vector only when `broadcast` is set on the port.
    pub fn accepts(self, source: ValueKind, broadcast: bool) -> bool {
        if self == source {
            return true;
        }

        match (self, source) {
            (Self::Color, Self::Vector3) | (Self::Vector3, Self::Color) => true,
            (Self::Vector2 | Self::Vector3 | Self::Vector4 | Self::Color, Self::Float) => broadcast,
            _ => false,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Float => "float",
            Self::Vector2 => "vec2",
            Self::Vector3 => "vec3",
            Self::Vector4 => "vec4",
            Self::Color => "color",
        };
        f.write_str(name)
    }
}

/// Literal value that can be stored in a port or a bound uniform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PortValue {
    /// Float
    Float(f32),
    /// 2D vector
    Vector2([f32; 2]),
    /// 3D vector
    Vector3([f32; 3]),
    /// 4D vector
    Vector4([f32; 4]),
    /// RGB color
    Color([f32; 3]),
}

impl PortValue {
    /// Get the kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Float(_) => ValueKind::Float,
            Self::Vector2(_) => ValueKind::Vector2,
            Self::Vector3(_) => ValueKind::Vector3,
            Self::Vector4(_) => ValueKind::Vector4,
            Self::Color(_) => ValueKind::Color,
        }
    }

    /// Scalar content, if this is a float
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether every component is a finite number. GLSL has no literal for
    /// NaN or infinity.
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Float(v) => v.is_finite(),
            Self::Vector2(v) => v.iter().all(|c| c.is_finite()),
            Self::Vector3(v) | Self::Color(v) => v.iter().all(|c| c.is_finite()),
            Self::Vector4(v) => v.iter().all(|c| c.is_finite()),
        }
    }

    /// GLSL literal expression for this value
    pub fn to_glsl(&self) -> String {
        match self {
            Self::Float(v) => glsl::float_literal(*v),
            Self::Vector2(v) => glsl::vector_literal("vec2", v),
            Self::Vector3(v) | Self::Color(v) => glsl::vector_literal("vec3", v),
            Self::Vector4(v) => glsl::vector_literal("vec4", v),
        }
    }
}

/// An RGB color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    /// Build a color from a `0xRRGGBB` integer
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self([channel(16), channel(8), channel(0)])
    }

    /// Uniform gray (or overdriven white when `value > 1.0`)
    pub fn splat(value: f32) -> Self {
        Self([value; 3])
    }
}

/// What a port resolves to
#[derive(Debug, Clone)]
pub enum PortSource {
    /// Constant value
    Literal(PortValue),
    /// Ambient GLSL expression emitted verbatim (e.g. the `position` attribute)
    Raw(String),
    /// Edge to another node's declared output
    Connection(Connection),
}

impl PortSource {
    /// Mark a GLSL expression to be passed through verbatim
    pub fn raw(expr: impl Into<String>) -> Self {
        Self::Raw(expr.into())
    }

    /// Get the connection, if this source is an edge
    pub fn connection(&self) -> Option<&Connection> {
        match self {
            Self::Connection(c) => Some(c),
            _ => None,
        }
    }
}

impl From<PortValue> for PortSource {
    fn from(value: PortValue) -> Self {
        Self::Literal(value)
    }
}

impl From<f32> for PortSource {
    fn from(value: f32) -> Self {
        Self::Literal(PortValue::Float(value))
    }
}

impl From<[f32; 2]> for PortSource {
    fn from(value: [f32; 2]) -> Self {
        Self::Literal(PortValue::Vector2(value))
    }
}

impl From<[f32; 3]> for PortSource {
    fn from(value: [f32; 3]) -> Self {
        Self::Literal(PortValue::Vector3(value))
    }
}

impl From<[f32; 4]> for PortSource {
    fn from(value: [f32; 4]) -> Self {
        Self::Literal(PortValue::Vector4(value))
    }
}

impl From<Rgb> for PortSource {
    fn from(value: Rgb) -> Self {
        Self::Literal(PortValue::Color(value.0))
    }
}

impl From<Connection> for PortSource {
    fn from(value: Connection) -> Self {
        Self::Connection(value)
    }
}

impl From<&Node> for PortSource {
    fn from(node: &Node) -> Self {
        Self::Connection(Connection::primary(node))
    }
}

impl From<Node> for PortSource {
    fn from(node: Node) -> Self {
        Self::from(&node)
    }
}

/// Why a port's source does not fit the port
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PortFault {
    Mismatch {
        expected: ValueKind,
        found: ValueKind,
    },
    NoOutput {
        producer: String,
    },
    UnknownOutput {
        producer: String,
        output: String,
    },
    NonFinite,
}

/// A typed input port on a node
#[derive(Debug, Clone)]
pub struct Port {
    /// Declared data type
    pub kind: ValueKind,
    /// Current value (default or wired)
    pub source: Option<PortSource>,
    /// Whether a scalar may be widened to this port's vector kind
    pub broadcast: bool,
    /// Whether the port may stay unresolved (master slots)
    pub optional: bool,
}

impl Port {
    /// Create an unresolved port of the given kind
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            source: None,
            broadcast: false,
            optional: false,
        }
    }

    /// Set the default value
    pub fn with_default(mut self, source: impl Into<PortSource>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Allow scalar values to be widened to this port's vector kind
    pub fn broadcast(mut self) -> Self {
        self.broadcast = true;
        self
    }

    /// Allow the port to stay unresolved
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Get the connection feeding this port, if any
    pub fn connection(&self) -> Option<&Connection> {
        self.source.as_ref().and_then(PortSource::connection)
    }

    /// Kind of the value currently in the port. `None` for raw expressions,
    /// which are trusted to match.
    pub(crate) fn source_kind(&self) -> Result<Option<ValueKind>, PortFault> {
        match &self.source {
            None | Some(PortSource::Raw(_)) => Ok(None),
            Some(PortSource::Literal(value)) => Ok(Some(value.kind())),
            Some(PortSource::Connection(connection)) => connection.kind().map(Some),
        }
    }

    /// Check the current source against the declared kind
    pub(crate) fn validate(&self) -> Result<(), PortFault> {
        if let Some(PortSource::Literal(value)) = &self.source {
            if !value.is_finite() {
                return Err(PortFault::NonFinite);
            }
        }
        match self.source_kind()? {
            Some(found) if !self.kind.accepts(found, self.broadcast) => Err(PortFault::Mismatch {
                expected: self.kind,
                found,
            }),
            _ => Ok(()),
        }
    }
}

/// Float input port
pub fn float() -> Port {
    Port::new(ValueKind::Float)
}

/// 2D vector input port
pub fn vec2() -> Port {
    Port::new(ValueKind::Vector2)
}

/// 3D vector input port
pub fn vec3() -> Port {
    Port::new(ValueKind::Vector3)
}

/// 4D vector input port
pub fn vec4() -> Port {
    Port::new(ValueKind::Vector4)
}

/// Color input port
pub fn color() -> Port {
    Port::new(ValueKind::Color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_compatibility() {
        assert!(ValueKind::Vector3.accepts(ValueKind::Vector3, false));
        assert!(ValueKind::Color.accepts(ValueKind::Vector3, false));
        assert!(ValueKind::Vector3.accepts(ValueKind::Color, false));
        assert!(!ValueKind::Vector3.accepts(ValueKind::Float, false));
        assert!(ValueKind::Vector3.accepts(ValueKind::Float, true));
        assert!(!ValueKind::Float.accepts(ValueKind::Vector3, true));
        assert!(!ValueKind::Vector2.accepts(ValueKind::Vector4, false));
    }

    #[test]
    fn test_literal_glsl() {
        assert_eq!(PortValue::Float(2.0).to_glsl(), "2.0");
        assert_eq!(PortValue::Float(0.25).to_glsl(), "0.25");
        assert_eq!(
            PortValue::Vector3([1.0, 1.0, 1.0]).to_glsl(),
            "vec3(1.0, 1.0, 1.0)"
        );
        assert_eq!(PortValue::Color([0.0, 0.5, 1.0]).to_glsl(), "vec3(0.0, 0.5, 1.0)");
    }

    #[test]
    fn test_hex_color() {
        let Rgb([r, g, b]) = Rgb::from_hex(0xff0080);
        assert_eq!(r, 1.0);
        assert_eq!(g, 0.0);
        assert!((b - 128.0 / 255.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_port_validation() {
        assert!(vec3().with_default([1.0, 2.0, 3.0]).validate().is_ok());
        assert!(vec3().with_default(PortSource::raw("position")).validate().is_ok());
        assert_eq!(
            vec3().with_default(0.5).validate(),
            Err(PortFault::Mismatch {
                expected: ValueKind::Vector3,
                found: ValueKind::Float,
            })
        );
        assert!(vec3().broadcast().with_default(0.5).validate().is_ok());
        assert!(float().validate().is_ok());
    }

    #[test]
    fn test_non_finite_literals_are_rejected() {
        assert!(!PortValue::Vector3([f32::NAN, 1.0, 0.0]).is_finite());
        assert!(PortValue::Color([0.0, 0.5, 1.0]).is_finite());
        assert_eq!(
            vec3().with_default([f32::NAN, f32::INFINITY, 0.0]).validate(),
            Err(PortFault::NonFinite)
        );
        assert_eq!(
            float().with_default(f32::NEG_INFINITY).validate(),
            Err(PortFault::NonFinite)
        );
    }
}
