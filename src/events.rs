//! Receipt log decoding.
//!
//! EVM contracts key their logs on `keccak256("Name(type1,type2)")`;
//! WASM contracts on `keccak256("Name")`. Either way a matched log renders
//! as `"Event <name>: <v1> <v2> ..."` with zero values left out. Logs with
//! no matching declared event are skipped without error; receipts from
//! shared blocks routinely interleave other contracts' events.

use alloy_primitives::{keccak256, B256};
use tracing::{debug, warn};

use crate::abi::{evm, wasm, Abi, AbiEntry, AbiParam, EntryKind, ParamType, Value};
use crate::error::AbiError;
use crate::rpc::Log;

/// Events every decode pass knows about even when the caller's interface
/// does not declare them. System contracts report through `Notify`:
/// deploy denials and naming-service registrations arrive this way.
pub fn system_events() -> Vec<AbiEntry> {
    vec![AbiEntry {
        kind: EntryKind::Event,
        name: "Notify".to_string(),
        inputs: vec![
            AbiParam {
                name: "code".to_string(),
                ty: "uint64".to_string(),
                components: None,
                indexed: false,
            },
            AbiParam {
                name: "message".to_string(),
                ty: "string".to_string(),
                components: None,
                indexed: false,
            },
        ],
        outputs: Vec::new(),
        constant: None,
        state_mutability: None,
        anonymous: false,
    }]
}

/// Decodes logs against an EVM interface plus the system events.
pub fn decode_evm_logs(abi: &Abi, logs: &[Log]) -> Vec<String> {
    let declared: Vec<&AbiEntry> = abi.events().collect();
    let system = system_events();
    let mut rendered = Vec::new();

    for log in logs {
        let Some(topic) = log.topics.first() else {
            continue;
        };
        let matched = declared
            .iter()
            .copied()
            .chain(system.iter())
            .find(|entry| match entry.signature() {
                Ok(signature) => keccak256(signature.as_bytes()) == *topic,
                Err(_) => false,
            });
        let Some(entry) = matched else {
            debug!(%topic, "no declared event for topic, skipping");
            continue;
        };
        match render_evm_event(entry, log) {
            Ok(line) => rendered.push(line),
            Err(e) => warn!(event = %entry.name, error = %e, "malformed event data, skipping"),
        }
    }
    rendered
}

/// Decodes logs against a WASM interface plus the system events.
pub fn decode_wasm_logs(abi: &Abi, logs: &[Log]) -> Vec<String> {
    let declared: Vec<&AbiEntry> = abi.events().collect();
    let system = system_events();
    let mut rendered = Vec::new();

    for log in logs {
        let Some(topic) = log.topics.first() else {
            continue;
        };
        let matched = declared
            .iter()
            .copied()
            .chain(system.iter())
            .find(|entry| keccak256(entry.name.as_bytes()) == *topic);
        let Some(entry) = matched else {
            debug!(%topic, "no declared event for topic, skipping");
            continue;
        };
        match render_wasm_event(entry, log) {
            Ok(line) => rendered.push(line),
            Err(e) => warn!(event = %entry.name, error = %e, "malformed event data, skipping"),
        }
    }
    rendered
}

fn render_evm_event(entry: &AbiEntry, log: &Log) -> Result<String, AbiError> {
    let data = log
        .data_bytes()
        .map_err(|e| AbiError::InvalidData(e.to_string()))?;

    let non_indexed: Vec<ParamType> = entry
        .inputs
        .iter()
        .filter(|p| !p.indexed)
        .map(AbiParam::param_type)
        .collect::<Result<_, _>>()?;
    let mut data_values = evm::decode_values(&non_indexed, &data)?.into_iter();
    let mut topics = log.topics.iter().skip(1);

    let mut values = Vec::with_capacity(entry.inputs.len());
    for param in &entry.inputs {
        if param.indexed {
            let topic = topics.next().ok_or_else(|| {
                AbiError::InvalidData(format!("missing indexed topic for {}", param.name))
            })?;
            values.push(decode_topic(&param.param_type()?, topic)?);
        } else {
            let value = data_values.next().ok_or_else(|| {
                AbiError::InvalidData(format!("missing data value for {}", param.name))
            })?;
            values.push(value);
        }
    }
    Ok(format_event(&entry.name, &values))
}

fn render_wasm_event(entry: &AbiEntry, log: &Log) -> Result<String, AbiError> {
    let types = entry.input_types()?;
    let data = log
        .data_bytes()
        .map_err(|e| AbiError::InvalidData(e.to_string()))?;
    let values = wasm::decode_event_data(&types, &data)?;
    Ok(format_event(&entry.name, &values))
}

fn decode_topic(ty: &ParamType, topic: &B256) -> Result<Value, AbiError> {
    if ty.is_dynamic() {
        // Only the hash of a dynamic value reaches the topics.
        return Ok(Value::FixedBytes(topic.to_vec()));
    }
    evm::decode_values(std::slice::from_ref(ty), topic.as_slice())?
        .into_iter()
        .next()
        .ok_or_else(|| AbiError::InvalidData("empty topic decode".to_string()))
}

fn format_event(name: &str, values: &[Value]) -> String {
    let parts: Vec<String> = values
        .iter()
        .filter(|v| !v.is_zero())
        .map(Value::to_string)
        .collect();
    if parts.is_empty() {
        format!("Event {name}:")
    } else {
        format!("Event {name}: {}", parts.join(" "))
    }
}
