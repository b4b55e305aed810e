use crate::core::error::{Result, TopologyError};
use crate::core::models::ids::{AtomKey, Correspondence};
use crate::core::models::molecule::Molecule;
use crate::core::models::value::Value;
use crate::core::utils::geometry;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const POSITION_ATTRIBUTE: &str = "position";

/// The geometric quantity an effector derives from atom positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectorKind {
    /// Euclidean distance between two atoms.
    Distance,
    /// Angle at the middle of three atoms, in degrees within `[0, 180]`.
    Angle,
    /// Signed dihedral angle about the middle bond of four atoms, in degrees within `(-180, 180]`.
    Dihedral,
    /// Dihedral angle shifted by 180 degrees, wrapped into `(-180, 180]`.
    DihedralPhase,
}

impl EffectorKind {
    /// The number of atom keys the computation consumes.
    pub fn arity(self) -> usize {
        match self {
            Self::Distance => 2,
            Self::Angle => 3,
            Self::Dihedral | Self::DihedralPhase => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Distance => "Distance",
            Self::Angle => "Angle",
            Self::Dihedral => "Dihedral",
            Self::DihedralPhase => "DihedralPhase",
        }
    }

    /// `None` when the number of positions does not match the arity.
    fn evaluate(self, positions: &[Point3<f64>]) -> Option<f64> {
        let value = match (self, positions) {
            (Self::Distance, [a, b]) => (b - a).norm(),
            (Self::Angle, [a, b, c]) => geometry::angle(&(a - b), &(c - b)).to_degrees(),
            (Self::Dihedral, [a, b, c, d]) => geometry::dihedral(&[*a, *b, *c, *d]).to_degrees(),
            (Self::DihedralPhase, [a, b, c, d]) => {
                geometry::dihedral_phase(&[*a, *b, *c, *d]).to_degrees()
            }
            _ => return None,
        };
        Some(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Notation {
    /// Shortest representation, or significant digits when a precision is given.
    #[default]
    General,
    Fixed,
    Exponent,
}

/// Presentation format applied to a computed parameter.
///
/// Parsed from a format specification of the form `[width][.precision][f|e]`,
/// for instance `.2f`, `8.3f` or `.4e`. Formatting only affects the rendered
/// string; the numeric value is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NumberFormat {
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub notation: Notation,
}

impl NumberFormat {
    /// Renders `value` right-aligned to the width.
    ///
    /// Exponents carry a sign and at least two digits (`1.23e+03`). General
    /// notation with a precision counts significant digits and switches to
    /// exponent notation for large or small magnitudes. Without a precision it
    /// uses the shortest representation, always with a fractional part.
    pub fn render(&self, value: f64) -> String {
        let body = if value.is_finite() {
            match (self.notation, self.precision) {
                (Notation::Fixed, precision) => format!("{:.*}", precision.unwrap_or(6), value),
                (Notation::Exponent, precision) => {
                    let (mantissa, exponent) =
                        split_exponent(format!("{:.*e}", precision.unwrap_or(6), value));
                    format!("{}{}", mantissa, exponent_suffix(exponent))
                }
                (Notation::General, Some(precision)) => significant(value, precision.max(1)),
                (Notation::General, None) => shortest(value),
            }
        } else if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
        match self.width {
            Some(width) => format!("{:>width$}", body, width = width),
            None => body,
        }
    }
}

fn split_exponent(formatted: String) -> (String, i32) {
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => (mantissa.to_string(), exponent.parse().unwrap_or(0)),
        None => (formatted, 0),
    }
}

fn exponent_suffix(exponent: i32) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("e{}{:02}", sign, exponent.unsigned_abs())
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

fn with_fraction(number: &str) -> String {
    if number.contains('.') {
        number.to_string()
    } else {
        format!("{}.0", number)
    }
}

fn significant(value: f64, digits: usize) -> String {
    let (mantissa, exponent) = split_exponent(format!("{:.*e}", digits - 1, value));
    let digits = digits as i32;
    if exponent < -4 || exponent >= digits - 1 {
        return format!("{}{}", trim_fraction(&mantissa), exponent_suffix(exponent));
    }
    let decimals = (digits - 1 - exponent) as usize;
    with_fraction(trim_fraction(&format!("{:.*}", decimals, value)))
}

fn shortest(value: f64) -> String {
    let (mantissa, exponent) = split_exponent(format!("{:e}", value));
    if (-4..16).contains(&exponent) {
        with_fraction(&format!("{}", value))
    } else {
        format!("{}{}", mantissa, exponent_suffix(exponent))
    }
}

impl FromStr for NumberFormat {
    type Err = TopologyError;

    fn from_str(spec: &str) -> Result<Self> {
        let invalid = || TopologyError::InvalidFormat(spec.to_string());

        let (body, notation) = match spec.chars().last() {
            Some('f' | 'F') => (&spec[..spec.len() - 1], Notation::Fixed),
            Some('e' | 'E') => (&spec[..spec.len() - 1], Notation::Exponent),
            _ => (spec, Notation::General),
        };

        let (width_part, precision_part) = match body.split_once('.') {
            Some((width, precision)) => (width, Some(precision)),
            None => (body, None),
        };

        let width = if width_part.is_empty() {
            None
        } else {
            Some(width_part.parse::<usize>().map_err(|_| invalid())?)
        };
        let precision = match precision_part {
            Some(p) => Some(p.parse::<usize>().map_err(|_| invalid())?),
            None => None,
        };

        Ok(Self {
            width,
            precision,
            notation,
        })
    }
}

/// Rule computing an interaction parameter from the geometry of a matched molecule.
///
/// An effector stores atom keys from a link template. When applied, the keys are
/// resolved through the template-to-molecule correspondence and the positions of
/// the resolved molecule atoms feed the computation.
///
/// Deserialization goes through [`ParamEffector::new`], so the arity check
/// holds for effectors read from configuration as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParamEffector")]
pub struct ParamEffector {
    kind: EffectorKind,
    keys: Vec<AtomKey>,
    format: Option<NumberFormat>,
}

#[derive(Deserialize)]
struct RawParamEffector {
    kind: EffectorKind,
    keys: Vec<AtomKey>,
    #[serde(default)]
    format: Option<NumberFormat>,
}

impl TryFrom<RawParamEffector> for ParamEffector {
    type Error = TopologyError;

    fn try_from(raw: RawParamEffector) -> Result<Self> {
        Self::new(raw.kind, raw.keys, raw.format)
    }
}

impl ParamEffector {
    /// Creates an effector, validating the key count against the kind's arity.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidArity`] if `keys.len()` differs from
    /// [`EffectorKind::arity`].
    pub fn new(kind: EffectorKind, keys: Vec<AtomKey>, format: Option<NumberFormat>) -> Result<Self> {
        if keys.len() != kind.arity() {
            return Err(TopologyError::InvalidArity {
                effector: kind.name(),
                expected: kind.arity(),
                found: keys.len(),
            });
        }
        Ok(Self { kind, keys, format })
    }

    pub fn kind(&self) -> EffectorKind {
        self.kind
    }

    pub fn keys(&self) -> &[AtomKey] {
        &self.keys
    }

    pub fn format(&self) -> Option<&NumberFormat> {
        self.format.as_ref()
    }

    /// Computes the raw numeric value against `molecule`.
    ///
    /// # Errors
    ///
    /// - [`TopologyError::UnresolvedKey`] if a key is missing from `correspondence`.
    /// - [`TopologyError::AtomNotFound`] if a resolved atom is not in the molecule.
    /// - [`TopologyError::MissingAttribute`] if a resolved atom has no position.
    /// - [`TopologyError::InvalidAttributeType`] if the position is not a point.
    pub fn compute(&self, molecule: &Molecule, correspondence: &Correspondence) -> Result<f64> {
        let positions = self
            .keys
            .iter()
            .map(|key| {
                let resolved = correspondence
                    .get(key)
                    .ok_or_else(|| TopologyError::UnresolvedKey { key: key.clone() })?;
                atom_position(molecule, resolved)
            })
            .collect::<Result<Vec<_>>>()?;
        self.kind
            .evaluate(&positions)
            .ok_or(TopologyError::InvalidArity {
                effector: self.kind.name(),
                expected: self.kind.arity(),
                found: positions.len(),
            })
    }

    /// Computes the value and renders it with the effector's format, if any.
    ///
    /// Returns [`Value::Float`] without a format and [`Value::Str`] with one.
    pub fn apply(&self, molecule: &Molecule, correspondence: &Correspondence) -> Result<Value> {
        let value = self.compute(molecule, correspondence)?;
        Ok(match &self.format {
            Some(format) => Value::Str(format.render(value)),
            None => Value::Float(value),
        })
    }
}

fn atom_position(molecule: &Molecule, key: &AtomKey) -> Result<Point3<f64>> {
    let attributes = molecule
        .node(key)
        .ok_or_else(|| TopologyError::AtomNotFound { key: key.clone() })?;
    let value = attributes
        .get(POSITION_ATTRIBUTE)
        .ok_or_else(|| TopologyError::MissingAttribute {
            atom: Some(key.clone()),
            attribute: POSITION_ATTRIBUTE.to_string(),
        })?;
    value
        .as_position()
        .copied()
        .ok_or_else(|| TopologyError::InvalidAttributeType {
            atom: Some(key.clone()),
            attribute: POSITION_ATTRIBUTE.to_string(),
            expected: "a position",
        })
}
