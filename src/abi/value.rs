use std::fmt;

use alloy_primitives::{Address, I256, U256};

use crate::error::AbiError;

/// The closed set of parameter types both dialects understand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// Unsigned integer with a width of 8..=256 bits.
    Uint(usize),
    /// Signed integer with a width of 8..=256 bits.
    Int(usize),
    Bool,
    Address,
    /// `bytesN`, 1..=32 bytes.
    FixedBytes(usize),
    Bytes,
    String,
    /// `T[]`
    Array(Box<ParamType>),
    /// `T[k]`
    FixedArray(Box<ParamType>, usize),
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Parses a declared type string such as `uint64`, `address` or
    /// `uint8[2][]`. Tuples cannot be named in a bare string; callers
    /// resolve `tuple` declarations through their `components` first and
    /// pass the result in.
    pub fn parse(decl: &str, tuple: Option<Vec<ParamType>>) -> Result<Self, AbiError> {
        let decl = decl.trim();

        if let Some(rest) = decl.strip_suffix(']') {
            let open = rest
                .rfind('[')
                .ok_or_else(|| AbiError::UnknownType(decl.to_string()))?;
            let inner = Self::parse(&rest[..open], tuple)?;
            let dims = &rest[open + 1..];
            return if dims.is_empty() {
                Ok(ParamType::Array(Box::new(inner)))
            } else {
                let len: usize = dims
                    .parse()
                    .map_err(|_| AbiError::UnknownType(decl.to_string()))?;
                Ok(ParamType::FixedArray(Box::new(inner), len))
            };
        }

        match decl {
            "bool" => Ok(ParamType::Bool),
            "address" => Ok(ParamType::Address),
            "string" => Ok(ParamType::String),
            "bytes" => Ok(ParamType::Bytes),
            "tuple" => tuple
                .map(ParamType::Tuple)
                .ok_or_else(|| AbiError::UnknownType("tuple without components".to_string())),
            _ => {
                if let Some(width) = decl.strip_prefix("uint") {
                    Ok(ParamType::Uint(parse_int_width(decl, width)?))
                } else if let Some(width) = decl.strip_prefix("int") {
                    Ok(ParamType::Int(parse_int_width(decl, width)?))
                } else if let Some(len) = decl.strip_prefix("bytes") {
                    let len: usize = len
                        .parse()
                        .map_err(|_| AbiError::UnknownType(decl.to_string()))?;
                    if (1..=32).contains(&len) {
                        Ok(ParamType::FixedBytes(len))
                    } else {
                        Err(AbiError::UnknownType(decl.to_string()))
                    }
                } else {
                    Err(AbiError::UnknownType(decl.to_string()))
                }
            }
        }
    }

    /// Canonical form used in function/event signatures, e.g. `uint256`.
    pub fn canonical(&self) -> String {
        match self {
            ParamType::Uint(w) => format!("uint{w}"),
            ParamType::Int(w) => format!("int{w}"),
            ParamType::Bool => "bool".to_string(),
            ParamType::Address => "address".to_string(),
            ParamType::FixedBytes(n) => format!("bytes{n}"),
            ParamType::Bytes => "bytes".to_string(),
            ParamType::String => "string".to_string(),
            ParamType::Array(inner) => format!("{}[]", inner.canonical()),
            ParamType::FixedArray(inner, n) => format!("{}[{n}]", inner.canonical()),
            ParamType::Tuple(members) => {
                let inner: Vec<String> = members.iter().map(ParamType::canonical).collect();
                format!("({})", inner.join(","))
            }
        }
    }

    /// Whether the head/tail encoding places this type behind an offset.
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            ParamType::Tuple(members) => members.iter().any(ParamType::is_dynamic),
            _ => false,
        }
    }
}

fn parse_int_width(decl: &str, width: &str) -> Result<usize, AbiError> {
    if width.is_empty() {
        return Ok(256);
    }
    let width: usize = width
        .parse()
        .map_err(|_| AbiError::UnknownType(decl.to_string()))?;
    if width == 0 || width > 256 || width % 8 != 0 {
        return Err(AbiError::UnknownType(decl.to_string()));
    }
    Ok(width)
}

/// A typed argument or decoded result value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Uint(U256, usize),
    Int(I256, usize),
    Bool(bool),
    Address(Address),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Value>),
    FixedArray(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    /// Parses one human-supplied string into a typed value, bounds-checked
    /// against the declared type.
    pub fn from_string(ty: &ParamType, raw: &str) -> Result<Self, AbiError> {
        let raw = raw.trim();
        match ty {
            ParamType::Uint(width) => {
                let value = parse_u256(raw, ty)?;
                check_uint_range(value, *width, ty, raw)?;
                Ok(Value::Uint(value, *width))
            }
            ParamType::Int(width) => {
                let value = parse_i256(raw, ty)?;
                check_int_range(value, *width, ty, raw)?;
                Ok(Value::Int(value, *width))
            }
            ParamType::Bool => match raw {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(type_parse(ty, raw)),
            },
            ParamType::Address => raw
                .parse::<Address>()
                .map(Value::Address)
                .map_err(|_| type_parse(ty, raw)),
            ParamType::FixedBytes(len) => {
                let bytes = parse_hex(raw).ok_or_else(|| type_parse(ty, raw))?;
                if bytes.len() != *len {
                    return Err(type_parse(ty, raw));
                }
                Ok(Value::FixedBytes(bytes))
            }
            ParamType::Bytes => parse_hex(raw)
                .map(Value::Bytes)
                .ok_or_else(|| type_parse(ty, raw)),
            ParamType::String => Ok(Value::String(raw.to_string())),
            ParamType::Array(inner) => {
                let parts = split_list(raw).ok_or_else(|| type_parse(ty, raw))?;
                let values = parts
                    .iter()
                    .map(|p| Value::from_string(inner, p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(values))
            }
            ParamType::FixedArray(inner, len) => {
                let parts = split_list(raw).ok_or_else(|| type_parse(ty, raw))?;
                if parts.len() != *len {
                    return Err(type_parse(ty, raw));
                }
                let values = parts
                    .iter()
                    .map(|p| Value::from_string(inner, p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::FixedArray(values))
            }
            ParamType::Tuple(members) => {
                let parts = split_list(raw).ok_or_else(|| type_parse(ty, raw))?;
                if parts.len() != members.len() {
                    return Err(type_parse(ty, raw));
                }
                let values = members
                    .iter()
                    .zip(parts.iter())
                    .map(|(m, p)| Value::from_string(m, p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Tuple(values))
            }
        }
    }

    /// True for values the event formatter leaves out of its output.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Uint(v, _) => v.is_zero(),
            Value::Int(v, _) => v.is_zero(),
            Value::Bool(v) => !v,
            Value::Address(a) => a.is_zero(),
            Value::FixedBytes(b) => b.iter().all(|b| *b == 0),
            Value::Bytes(b) => b.is_empty(),
            Value::String(s) => s.is_empty(),
            Value::Array(v) | Value::FixedArray(v) | Value::Tuple(v) => v.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Uint(v, _) => write!(f, "{v}"),
            Value::Int(v, _) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Address(a) => write!(f, "{a}"),
            Value::FixedBytes(b) | Value::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Value::String(s) => f.write_str(s),
            Value::Array(vs) | Value::FixedArray(vs) => {
                let parts: Vec<String> = vs.iter().map(Value::to_string).collect();
                write!(f, "[{}]", parts.join(","))
            }
            Value::Tuple(vs) => {
                let parts: Vec<String> = vs.iter().map(Value::to_string).collect();
                write!(f, "({})", parts.join(","))
            }
        }
    }
}

fn type_parse(ty: &ParamType, raw: &str) -> AbiError {
    AbiError::TypeParse {
        index: 0,
        ty: ty.canonical(),
        value: raw.to_string(),
    }
}

fn parse_u256(raw: &str, ty: &ParamType) -> Result<U256, AbiError> {
    let parsed = if let Some(hex_digits) = raw.strip_prefix("0x") {
        U256::from_str_radix(hex_digits, 16)
    } else {
        U256::from_str_radix(raw, 10)
    };
    parsed.map_err(|_| type_parse(ty, raw))
}

fn parse_i256(raw: &str, ty: &ParamType) -> Result<I256, AbiError> {
    if let Some(hex_digits) = raw.strip_prefix("0x") {
        // Hex literals are the raw two's-complement bit pattern.
        let bits = U256::from_str_radix(hex_digits, 16).map_err(|_| type_parse(ty, raw))?;
        Ok(I256::from_raw(bits))
    } else {
        I256::from_dec_str(raw).map_err(|_| type_parse(ty, raw))
    }
}

pub(crate) fn uint_max(width: usize) -> U256 {
    if width >= 256 {
        U256::MAX
    } else {
        (U256::from(1u8) << width) - U256::from(1u8)
    }
}

pub(crate) fn int_bounds(width: usize) -> (I256, I256) {
    if width >= 256 {
        (I256::MIN, I256::MAX)
    } else {
        let max = I256::from_raw((U256::from(1u8) << (width - 1)) - U256::from(1u8));
        (-max - I256::ONE, max)
    }
}

pub(crate) fn check_uint_range(
    value: U256,
    width: usize,
    ty: &ParamType,
    raw: &str,
) -> Result<(), AbiError> {
    if value > uint_max(width) {
        return Err(AbiError::OutOfRange {
            ty: ty.canonical(),
            value: raw.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn check_int_range(
    value: I256,
    width: usize,
    ty: &ParamType,
    raw: &str,
) -> Result<(), AbiError> {
    let (min, max) = int_bounds(width);
    if value < min || value > max {
        return Err(AbiError::OutOfRange {
            ty: ty.canonical(),
            value: raw.to_string(),
        });
    }
    Ok(())
}

fn parse_hex(raw: &str) -> Option<Vec<u8>> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).ok()
}

/// Splits a list literal: a JSON array when it looks like one, otherwise a
/// plain comma-separated form.
fn split_list(raw: &str) -> Option<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        let parsed: serde_json::Value = serde_json::from_str(trimmed).ok()?;
        let items = parsed.as_array()?;
        return Some(items.iter().map(json_item_to_string).collect());
    }
    if trimmed.is_empty() {
        return Some(Vec::new());
    }
    Some(trimmed.split(',').map(|p| p.trim().to_string()).collect())
}

fn json_item_to_string(item: &serde_json::Value) -> String {
    match item {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
