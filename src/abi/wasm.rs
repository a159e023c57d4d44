//! RLP-positional codec used by WASM contracts. Calls travel as an RLP
//! list whose first item is the function name and whose remaining items
//! are fixed-width argument bytes.

use alloy_primitives::{Address, I256, U256};
use alloy_rlp::{Bytes as RlpBytes, Decodable, Encodable};

use crate::abi::value::{ParamType, Value};
use crate::error::AbiError;

/// Leading magic of a compiled WASM module.
pub const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6d];

pub fn is_wasm_bytecode(code: &[u8]) -> bool {
    code.starts_with(&WASM_MAGIC)
}

/// Encodes `[functionName, arg1, arg2, ...]`.
pub fn encode_call(name: &str, args: &[Value]) -> Result<Vec<u8>, AbiError> {
    let mut items = Vec::with_capacity(args.len() + 1);
    items.push(RlpBytes::from(name.as_bytes().to_vec()));
    for arg in args {
        items.push(RlpBytes::from(value_to_bytes(arg)?));
    }
    let mut out = Vec::new();
    items.encode(&mut out);
    Ok(out)
}

/// Encodes a WASM deploy payload: `[code, abiJson]`.
pub fn encode_deploy(code: &[u8], abi_json: &[u8]) -> Vec<u8> {
    let items = vec![
        RlpBytes::from(code.to_vec()),
        RlpBytes::from(abi_json.to_vec()),
    ];
    let mut out = Vec::new();
    items.encode(&mut out);
    out
}

/// Splits a call payload back into the function name and raw argument bytes.
pub fn decode_call(data: &[u8]) -> Result<(String, Vec<Vec<u8>>), AbiError> {
    let items = decode_byte_list(data)?;
    let mut iter = items.into_iter();
    let name = iter
        .next()
        .ok_or_else(|| AbiError::InvalidData("empty call payload".to_string()))?;
    let name = String::from_utf8(name)
        .map_err(|_| AbiError::InvalidData("function name is not utf-8".to_string()))?;
    Ok((name, iter.collect()))
}

/// Decodes an RLP list of byte strings against declared types, widening
/// short big-endian integers to their declared width.
pub fn decode_event_data(types: &[ParamType], data: &[u8]) -> Result<Vec<Value>, AbiError> {
    let items = decode_byte_list(data)?;
    if items.len() != types.len() {
        return Err(AbiError::InvalidData(format!(
            "event data has {} fields, abi declares {}",
            items.len(),
            types.len()
        )));
    }
    types
        .iter()
        .zip(items.iter())
        .map(|(ty, bytes)| bytes_to_value(ty, bytes))
        .collect()
}

fn decode_byte_list(data: &[u8]) -> Result<Vec<Vec<u8>>, AbiError> {
    let items = Vec::<RlpBytes>::decode(&mut &data[..])
        .map_err(|e| AbiError::InvalidData(format!("rlp list decode failed: {e}")))?;
    Ok(items.into_iter().map(|b| b.to_vec()).collect())
}

/// Fixed-width big-endian byte form of a value, as the VM expects it.
pub fn value_to_bytes(value: &Value) -> Result<Vec<u8>, AbiError> {
    match value {
        Value::Uint(v, width) => {
            let bytes = v.to_be_bytes::<32>();
            Ok(bytes[32 - width / 8..].to_vec())
        }
        Value::Int(v, width) => {
            let bytes = v.into_raw().to_be_bytes::<32>();
            Ok(bytes[32 - width / 8..].to_vec())
        }
        Value::Bool(b) => Ok(vec![u8::from(*b)]),
        Value::Address(a) => Ok(a.to_vec()),
        Value::FixedBytes(b) | Value::Bytes(b) => Ok(b.clone()),
        Value::String(s) => Ok(s.as_bytes().to_vec()),
        Value::Array(_) | Value::FixedArray(_) => Err(AbiError::Unsupported {
            ty: "array".to_string(),
            dialect: "wasm".to_string(),
        }),
        Value::Tuple(_) => Err(AbiError::Unsupported {
            ty: "tuple".to_string(),
            dialect: "wasm".to_string(),
        }),
    }
}

/// Reverses [`value_to_bytes`]. Shorter integer payloads are widened;
/// signed values are sign-extended from their leading byte.
pub fn bytes_to_value(ty: &ParamType, bytes: &[u8]) -> Result<Value, AbiError> {
    match ty {
        ParamType::Uint(width) => {
            if bytes.len() > 32 {
                return Err(invalid_width(ty, bytes));
            }
            Ok(Value::Uint(U256::from_be_slice(bytes), *width))
        }
        ParamType::Int(width) => {
            if bytes.len() > 32 {
                return Err(invalid_width(ty, bytes));
            }
            let negative = bytes.first().is_some_and(|b| b & 0x80 != 0);
            let mut word = if negative { [0xffu8; 32] } else { [0u8; 32] };
            word[32 - bytes.len()..].copy_from_slice(bytes);
            Ok(Value::Int(I256::from_raw(U256::from_be_bytes(word)), *width))
        }
        ParamType::Bool => Ok(Value::Bool(bytes.last().is_some_and(|b| *b != 0))),
        ParamType::Address => {
            if bytes.len() != 20 {
                return Err(invalid_width(ty, bytes));
            }
            Ok(Value::Address(Address::from_slice(bytes)))
        }
        ParamType::FixedBytes(len) => {
            if bytes.len() != *len {
                return Err(invalid_width(ty, bytes));
            }
            Ok(Value::FixedBytes(bytes.to_vec()))
        }
        ParamType::Bytes => Ok(Value::Bytes(bytes.to_vec())),
        ParamType::String => String::from_utf8(bytes.to_vec())
            .map(Value::String)
            .map_err(|_| AbiError::InvalidData("string field is not utf-8".to_string())),
        ParamType::Array(_) | ParamType::FixedArray(_, _) | ParamType::Tuple(_) => {
            Err(AbiError::Unsupported {
                ty: ty.canonical(),
                dialect: "wasm".to_string(),
            })
        }
    }
}

fn invalid_width(ty: &ParamType, bytes: &[u8]) -> AbiError {
    AbiError::InvalidData(format!(
        "{} field has unexpected width {}",
        ty.canonical(),
        bytes.len()
    ))
}
