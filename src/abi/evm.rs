//! Selector-dispatched head/tail codec used by EVM contracts.

use alloy_primitives::{keccak256, Address, I256, U256};

use crate::abi::value::{ParamType, Value};
use crate::error::AbiError;

const WORD: usize = 32;

/// First four bytes of the keccak-256 hash of a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Encodes a full call payload: selector followed by the argument block.
pub fn encode_call(signature: &str, values: &[Value]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend(encode_values(values));
    out
}

/// Encodes an argument block. Static values sit in the head; dynamic values
/// leave a byte offset behind and append their content to the tail.
pub fn encode_values(values: &[Value]) -> Vec<u8> {
    let head_len: usize = values.iter().map(head_width).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for value in values {
        if is_dynamic(value) {
            head.extend(encode_word_usize(head_len + tail.len()));
            tail.extend(encode_tail(value));
        } else {
            encode_static(value, &mut head);
        }
    }

    head.extend(tail);
    head
}

/// Decodes an argument block against the declared return types.
pub fn decode_values(types: &[ParamType], data: &[u8]) -> Result<Vec<Value>, AbiError> {
    let mut values = Vec::with_capacity(types.len());
    let mut offset = 0;
    for ty in types {
        if ty.is_dynamic() {
            let rel = read_word_usize(data, offset)?;
            values.push(decode_tail(ty, data, rel)?);
            offset += WORD;
        } else {
            let (value, consumed) = decode_static_at(ty, data, offset)?;
            values.push(value);
            offset += consumed;
        }
    }
    Ok(values)
}

/// Extracts the human-readable message from an `Error(string)` revert
/// payload, if that is what the bytes are.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if data.len() < 4 || data[..4] != selector("Error(string)") {
        return None;
    }
    match decode_values(&[ParamType::String], &data[4..]) {
        Ok(values) => match values.into_iter().next() {
            Some(Value::String(reason)) => Some(reason),
            _ => None,
        },
        Err(_) => None,
    }
}

fn is_dynamic(value: &Value) -> bool {
    match value {
        Value::Bytes(_) | Value::String(_) | Value::Array(_) => true,
        Value::FixedArray(items) => items.iter().any(is_dynamic),
        Value::Tuple(items) => items.iter().any(is_dynamic),
        _ => false,
    }
}

fn head_width(value: &Value) -> usize {
    if is_dynamic(value) {
        return WORD;
    }
    match value {
        Value::FixedArray(items) | Value::Tuple(items) => items.iter().map(head_width).sum(),
        _ => WORD,
    }
}

fn encode_static(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Uint(v, _) => out.extend(v.to_be_bytes::<WORD>()),
        Value::Int(v, _) => out.extend(v.into_raw().to_be_bytes::<WORD>()),
        Value::Bool(v) => {
            let mut word = [0u8; WORD];
            word[WORD - 1] = u8::from(*v);
            out.extend(word);
        }
        Value::Address(a) => {
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(a.as_slice());
            out.extend(word);
        }
        Value::FixedBytes(b) => {
            let mut word = [0u8; WORD];
            word[..b.len()].copy_from_slice(b);
            out.extend(word);
        }
        Value::FixedArray(items) | Value::Tuple(items) => {
            for item in items {
                encode_static(item, out);
            }
        }
        Value::Bytes(_) | Value::String(_) | Value::Array(_) => {
            unreachable!("dynamic value routed to the head encoder")
        }
    }
}

fn encode_tail(value: &Value) -> Vec<u8> {
    match value {
        Value::Bytes(b) => encode_length_prefixed(b),
        Value::String(s) => encode_length_prefixed(s.as_bytes()),
        Value::Array(items) => {
            let mut out = encode_word_usize(items.len()).to_vec();
            out.extend(encode_values(items));
            out
        }
        Value::FixedArray(items) | Value::Tuple(items) => encode_values(items),
        _ => unreachable!("static value routed to the tail encoder"),
    }
}

fn encode_length_prefixed(bytes: &[u8]) -> Vec<u8> {
    let mut out = encode_word_usize(bytes.len()).to_vec();
    out.extend(bytes);
    let padding = (WORD - bytes.len() % WORD) % WORD;
    out.extend(std::iter::repeat(0u8).take(padding));
    out
}

fn encode_word_usize(n: usize) -> [u8; WORD] {
    U256::from(n).to_be_bytes::<WORD>()
}

fn word_at(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    data.get(offset..offset + WORD).ok_or_else(|| {
        AbiError::InvalidData(format!(
            "response truncated: need {} bytes, have {}",
            offset + WORD,
            data.len()
        ))
    })
}

fn read_word_usize(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    let word = word_at(data, offset)?;
    let value = U256::from_be_slice(word);
    usize::try_from(value)
        .map_err(|_| AbiError::InvalidData(format!("length word out of range: {value}")))
}

fn decode_static_at(
    ty: &ParamType,
    data: &[u8],
    offset: usize,
) -> Result<(Value, usize), AbiError> {
    match ty {
        ParamType::Uint(width) => {
            let word = word_at(data, offset)?;
            Ok((Value::Uint(U256::from_be_slice(word), *width), WORD))
        }
        ParamType::Int(width) => {
            let word = word_at(data, offset)?;
            let raw = U256::from_be_slice(word);
            Ok((Value::Int(I256::from_raw(raw), *width), WORD))
        }
        ParamType::Bool => {
            let word = word_at(data, offset)?;
            Ok((Value::Bool(word[WORD - 1] != 0), WORD))
        }
        ParamType::Address => {
            let word = word_at(data, offset)?;
            Ok((Value::Address(Address::from_slice(&word[12..])), WORD))
        }
        ParamType::FixedBytes(len) => {
            let word = word_at(data, offset)?;
            Ok((Value::FixedBytes(word[..*len].to_vec()), WORD))
        }
        ParamType::FixedArray(inner, len) => {
            let mut items = Vec::with_capacity(*len);
            let mut consumed = 0;
            for _ in 0..*len {
                let (item, used) = decode_static_at(inner, data, offset + consumed)?;
                items.push(item);
                consumed += used;
            }
            Ok((Value::FixedArray(items), consumed))
        }
        ParamType::Tuple(members) => {
            let mut items = Vec::with_capacity(members.len());
            let mut consumed = 0;
            for member in members {
                let (item, used) = decode_static_at(member, data, offset + consumed)?;
                items.push(item);
                consumed += used;
            }
            Ok((Value::Tuple(items), consumed))
        }
        ParamType::Bytes | ParamType::String | ParamType::Array(_) => Err(AbiError::InvalidData(
            format!("dynamic type {} decoded as static", ty.canonical()),
        )),
    }
}

fn decode_tail(ty: &ParamType, data: &[u8], rel: usize) -> Result<Value, AbiError> {
    let block = data.get(rel..).ok_or_else(|| {
        AbiError::InvalidData(format!(
            "offset {} past end of {}-byte response",
            rel,
            data.len()
        ))
    })?;
    match ty {
        ParamType::Bytes => Ok(Value::Bytes(read_length_prefixed(block)?.to_vec())),
        ParamType::String => {
            let bytes = read_length_prefixed(block)?;
            let text = String::from_utf8(bytes.to_vec())
                .map_err(|_| AbiError::InvalidData("string payload is not utf-8".to_string()))?;
            Ok(Value::String(text))
        }
        ParamType::Array(inner) => {
            let len = read_word_usize(block, 0)?;
            let element_types = vec![(**inner).clone(); len];
            let items = decode_values(&element_types, &block[WORD..])?;
            Ok(Value::Array(items))
        }
        ParamType::FixedArray(inner, len) => {
            let element_types = vec![(**inner).clone(); *len];
            Ok(Value::FixedArray(decode_values(&element_types, block)?))
        }
        ParamType::Tuple(members) => Ok(Value::Tuple(decode_values(members, block)?)),
        _ => Err(AbiError::InvalidData(format!(
            "static type {} decoded as dynamic",
            ty.canonical()
        ))),
    }
}

fn read_length_prefixed(block: &[u8]) -> Result<&[u8], AbiError> {
    let len = read_word_usize(block, 0)?;
    block.get(WORD..WORD + len).ok_or_else(|| {
        AbiError::InvalidData(format!(
            "payload truncated: declared {} bytes, have {}",
            len,
            block.len().saturating_sub(WORD)
        ))
    })
}
