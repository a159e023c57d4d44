//! Call-data generation: target resolution, dialect selection, and the
//! codec dispatch shared by reads, writes, and deploys.

use std::fmt;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::abi::{evm, wasm, Abi, AbiEntry, ParamType, Value};
use crate::error::{AbiError, CallError};
use crate::events;
use crate::rpc::Log;

/// Reserved address the naming service listens on. Calls aimed at a
/// contract name are sent here, with the name riding on the descriptor.
pub const CNS_INVOKE_ADDRESS: Address = Address::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x11,
]);

/// Which VM hosts the contract. Fixed per descriptor, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VmDialect {
    Evm,
    #[default]
    Wasm,
}

impl VmDialect {
    /// Case-insensitive name lookup. An absent or empty name means WASM.
    pub fn parse(name: Option<&str>) -> Result<Self, CallError> {
        let Some(name) = name else {
            return Ok(VmDialect::Wasm);
        };
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Ok(VmDialect::Wasm);
        }
        if trimmed.eq_ignore_ascii_case("evm") {
            Ok(VmDialect::Evm)
        } else if trimmed.eq_ignore_ascii_case("wasm") {
            Ok(VmDialect::Wasm)
        } else {
            Err(CallError::UnknownDialect(name.to_string()))
        }
    }

    pub fn codec(&self) -> &'static dyn DialectCodec {
        match self {
            VmDialect::Evm => &EvmCodec,
            VmDialect::Wasm => &WasmCodec,
        }
    }
}

impl fmt::Display for VmDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmDialect::Evm => f.write_str("evm"),
            VmDialect::Wasm => f.write_str("wasm"),
        }
    }
}

/// The four operations a dialect must provide.
pub trait DialectCodec: Send + Sync {
    /// Encodes a function invocation payload.
    fn encode_function(&self, entry: &AbiEntry, args: &[Value]) -> Result<Vec<u8>, AbiError>;

    /// Assembles the deploy payload from bytecode, interface JSON, and
    /// parsed constructor arguments.
    fn combine_deploy_data(
        &self,
        bytecode: &[u8],
        abi_json: &[u8],
        cons_args: &[Value],
    ) -> Result<Vec<u8>, AbiError>;

    /// Decodes returned bytes against the declared outputs.
    fn parse_response(&self, outputs: &[ParamType], data: &[u8]) -> Result<Vec<Value>, AbiError>;

    /// Renders the interface's events out of receipt logs.
    fn parse_receipt_logs(&self, abi: &Abi, logs: &[Log]) -> Vec<String>;
}

pub struct EvmCodec;

impl DialectCodec for EvmCodec {
    fn encode_function(&self, entry: &AbiEntry, args: &[Value]) -> Result<Vec<u8>, AbiError> {
        Ok(evm::encode_call(&entry.signature()?, args))
    }

    fn combine_deploy_data(
        &self,
        bytecode: &[u8],
        _abi_json: &[u8],
        cons_args: &[Value],
    ) -> Result<Vec<u8>, AbiError> {
        let mut data = bytecode.to_vec();
        data.extend(evm::encode_values(cons_args));
        Ok(data)
    }

    fn parse_response(&self, outputs: &[ParamType], data: &[u8]) -> Result<Vec<Value>, AbiError> {
        evm::decode_values(outputs, data)
    }

    fn parse_receipt_logs(&self, abi: &Abi, logs: &[Log]) -> Vec<String> {
        events::decode_evm_logs(abi, logs)
    }
}

pub struct WasmCodec;

impl DialectCodec for WasmCodec {
    fn encode_function(&self, entry: &AbiEntry, args: &[Value]) -> Result<Vec<u8>, AbiError> {
        wasm::encode_call(&entry.name, args)
    }

    fn combine_deploy_data(
        &self,
        bytecode: &[u8],
        abi_json: &[u8],
        _cons_args: &[Value],
    ) -> Result<Vec<u8>, AbiError> {
        Ok(wasm::encode_deploy(bytecode, abi_json))
    }

    fn parse_response(&self, outputs: &[ParamType], data: &[u8]) -> Result<Vec<Value>, AbiError> {
        // Call results come back in 32-byte words under both VMs.
        evm::decode_values(outputs, data)
    }

    fn parse_receipt_logs(&self, abi: &Abi, logs: &[Log]) -> Vec<String> {
        events::decode_wasm_logs(abi, logs)
    }
}

/// Where a call is aimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    Address(Address),
    /// A registered contract name, routed through the naming service.
    Name(String),
}

/// Classifies a target string: `0x` + 40 hex digits is a direct address,
/// a plain identifier is a naming-service name, anything else is invalid.
pub fn resolve_target(target: &str) -> Result<CallTarget, CallError> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err(CallError::InvalidTarget(target.to_string()));
    }

    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        let digits = &trimmed[2..];
        if digits.len() == 40 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            let bytes =
                hex::decode(digits).map_err(|_| CallError::InvalidTarget(target.to_string()))?;
            return Ok(CallTarget::Address(Address::from_slice(&bytes)));
        }
        return Err(CallError::InvalidTarget(target.to_string()));
    }

    let well_formed = trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if well_formed {
        Ok(CallTarget::Name(trimmed.to_string()))
    } else {
        Err(CallError::InvalidTarget(target.to_string()))
    }
}

/// An encoded, ready-to-submit invocation. Immutable once built.
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    /// `None` deploys a contract.
    pub to: Option<Address>,
    /// Set when the target was a naming-service name.
    pub cns_name: Option<String>,
    pub dialect: VmDialect,
    pub data: Vec<u8>,
    /// Writes go through the transaction pipeline; reads use `eth_call`.
    pub is_write: bool,
    pub outputs: Vec<ParamType>,
    pub function: Option<String>,
}

/// Builds a function-call descriptor.
///
/// `func` may be a bare name with `args` supplied separately, or the
/// inline shorthand `"name(arg1,arg2)"`. Supplying both forms at once is
/// rejected rather than merged.
pub fn build_call(
    abi: &Abi,
    dialect: VmDialect,
    target: &str,
    func: &str,
    args: &[String],
) -> Result<CallDescriptor, CallError> {
    let (name, inline) = split_shorthand(func)?;
    let args = match inline {
        Some(inline) if !args.is_empty() => {
            return Err(CallError::AmbiguousArguments {
                inline: inline.len(),
                separate: args.len(),
            });
        }
        Some(inline) => inline,
        None => args.to_vec(),
    };

    let (to, cns_name) = match resolve_target(target)? {
        CallTarget::Address(address) => (address, None),
        CallTarget::Name(name) => (CNS_INVOKE_ADDRESS, Some(name)),
    };

    let entry = abi.function(&name)?;
    let values = entry.string_to_args(&args)?;
    let data = dialect.codec().encode_function(entry, &values)?;

    Ok(CallDescriptor {
        to: Some(to),
        cns_name,
        dialect,
        data,
        is_write: !entry.is_constant(),
        outputs: entry.output_types()?,
        function: Some(entry.name.clone()),
    })
}

/// Builds a deploy descriptor. The dialect may be named explicitly;
/// bytecode carrying the WASM magic always deploys as WASM.
pub fn build_deploy(
    dialect: Option<&str>,
    abi_json: &[u8],
    bytecode: &[u8],
    cons_args: &[String],
) -> Result<CallDescriptor, CallError> {
    if abi_json.is_empty() || bytecode.is_empty() {
        return Err(CallError::MissingBytecodeOrAbi);
    }

    let dialect = if wasm::is_wasm_bytecode(bytecode) {
        VmDialect::Wasm
    } else {
        VmDialect::parse(dialect)?
    };

    let abi = Abi::parse(abi_json)?;
    let constructor = abi.constructor();
    let expected = constructor.map_or(0, |c| c.inputs.len());
    if cons_args.len() != expected {
        return Err(CallError::ConstructorArgMismatch {
            expected,
            got: cons_args.len(),
        });
    }
    let values = match constructor {
        Some(constructor) => constructor.string_to_args(cons_args)?,
        None => Vec::new(),
    };

    let data = dialect
        .codec()
        .combine_deploy_data(bytecode, abi_json, &values)?;

    Ok(CallDescriptor {
        to: None,
        cns_name: None,
        dialect,
        data,
        is_write: true,
        outputs: Vec::new(),
        function: None,
    })
}

/// Splits `"name(arg1,arg2)"` into the name and its inline arguments.
/// A bare name passes through with `None`. Commas nested inside brackets
/// do not split.
pub fn split_shorthand(func: &str) -> Result<(String, Option<Vec<String>>), CallError> {
    let func = func.trim();
    let Some(open) = func.find('(') else {
        if func.is_empty() {
            return Err(CallError::MalformedShorthand(func.to_string()));
        }
        return Ok((func.to_string(), None));
    };

    let name = func[..open].trim();
    if name.is_empty() || !func.ends_with(')') {
        return Err(CallError::MalformedShorthand(func.to_string()));
    }

    let body = &func[open + 1..func.len() - 1];
    if body.trim().is_empty() {
        return Ok((name.to_string(), Some(Vec::new())));
    }

    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| CallError::MalformedShorthand(func.to_string()))?;
            }
            ',' if depth == 0 => {
                args.push(body[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(CallError::MalformedShorthand(func.to_string()));
    }
    args.push(body[start..].trim().to_string());
    Ok((name.to_string(), Some(args)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_rlp::{Bytes as RlpBytes, Decodable};

    const COUNTER_ABI: &str = r#"[
        {
            "type": "function",
            "name": "setValue",
            "inputs": [{"name": "value", "type": "uint256"}],
            "outputs": []
        },
        {
            "type": "function",
            "name": "getValue",
            "inputs": [],
            "outputs": [{"name": "", "type": "uint256"}],
            "constant": true
        }
    ]"#;

    const CONSTRUCTED_ABI: &str = r#"[
        {"type": "constructor", "inputs": [{"name": "supply", "type": "uint64"}]},
        {"type": "function", "name": "noop", "inputs": [], "outputs": []}
    ]"#;

    fn abi() -> Abi {
        Abi::parse(COUNTER_ABI.as_bytes()).unwrap()
    }

    #[test]
    fn test_resolve_direct_address() {
        let target = resolve_target("0x00000000000000000000000000000000000000aa").unwrap();
        match target {
            CallTarget::Address(address) => assert_eq!(address.as_slice()[19], 0xaa),
            other => panic!("expected an address, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_cns_name() {
        let target = resolve_target("token.v2").unwrap();
        assert_eq!(target, CallTarget::Name("token.v2".to_string()));
    }

    #[test]
    fn test_invalid_targets_are_rejected() {
        assert!(matches!(
            resolve_target("0xabc"),
            Err(CallError::InvalidTarget(_))
        ));
        assert!(matches!(
            resolve_target("has space"),
            Err(CallError::InvalidTarget(_))
        ));
        assert!(matches!(
            resolve_target(""),
            Err(CallError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_dialect_parsing() {
        assert_eq!(VmDialect::parse(None).unwrap(), VmDialect::Wasm);
        assert_eq!(VmDialect::parse(Some("")).unwrap(), VmDialect::Wasm);
        assert_eq!(VmDialect::parse(Some("EVM")).unwrap(), VmDialect::Evm);
        assert_eq!(VmDialect::parse(Some("Wasm")).unwrap(), VmDialect::Wasm);
        assert!(matches!(
            VmDialect::parse(Some("jvm")),
            Err(CallError::UnknownDialect(_))
        ));
    }

    #[test]
    fn test_shorthand_splitting() {
        assert_eq!(
            split_shorthand("transfer").unwrap(),
            ("transfer".to_string(), None)
        );
        assert_eq!(
            split_shorthand("transfer(0xaa,5)").unwrap(),
            (
                "transfer".to_string(),
                Some(vec!["0xaa".to_string(), "5".to_string()])
            )
        );
        assert_eq!(
            split_shorthand("init()").unwrap(),
            ("init".to_string(), Some(Vec::new()))
        );
        // nested commas stay together
        assert_eq!(
            split_shorthand("f([1,2],3)").unwrap(),
            (
                "f".to_string(),
                Some(vec!["[1,2]".to_string(), "3".to_string()])
            )
        );
    }

    #[test]
    fn test_malformed_shorthand() {
        assert!(matches!(
            split_shorthand("f(1,2"),
            Err(CallError::MalformedShorthand(_))
        ));
        assert!(matches!(
            split_shorthand("(1)"),
            Err(CallError::MalformedShorthand(_))
        ));
        assert!(matches!(
            split_shorthand(""),
            Err(CallError::MalformedShorthand(_))
        ));
    }

    #[test]
    fn test_inline_and_separate_args_conflict() {
        let err = build_call(
            &abi(),
            VmDialect::Evm,
            "0x00000000000000000000000000000000000000aa",
            "setValue(42)",
            &["42".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, CallError::AmbiguousArguments { .. }));

        // Empty parens still count as an inline argument list.
        let err = build_call(
            &abi(),
            VmDialect::Evm,
            "0x00000000000000000000000000000000000000aa",
            "setValue()",
            &["42".to_string()],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CallError::AmbiguousArguments { inline: 0, separate: 1 }
        ));
    }

    #[test]
    fn test_build_call_evm() {
        let descriptor = build_call(
            &abi(),
            VmDialect::Evm,
            "0x00000000000000000000000000000000000000aa",
            "setValue",
            &["42".to_string()],
        )
        .unwrap();

        assert!(descriptor.is_write);
        assert_eq!(descriptor.data[..4], evm::selector("setValue(uint256)"));
        assert_eq!(descriptor.data.len(), 36);
        assert!(descriptor.cns_name.is_none());
    }

    #[test]
    fn test_build_call_read_only() {
        let descriptor = build_call(
            &abi(),
            VmDialect::Evm,
            "0x00000000000000000000000000000000000000aa",
            "getValue",
            &[],
        )
        .unwrap();
        assert!(!descriptor.is_write);
        assert_eq!(descriptor.outputs, vec![ParamType::Uint(256)]);
    }

    #[test]
    fn test_build_call_by_name_routes_to_cns() {
        let descriptor = build_call(
            &abi(),
            VmDialect::Wasm,
            "counter",
            "setValue",
            &["42".to_string()],
        )
        .unwrap();

        assert_eq!(descriptor.to, Some(CNS_INVOKE_ADDRESS));
        assert_eq!(descriptor.cns_name.as_deref(), Some("counter"));

        // WASM payload leads with the function name
        let fields = Vec::<RlpBytes>::decode(&mut &descriptor.data[..]).unwrap();
        assert_eq!(fields[0].as_ref(), b"setValue");
    }

    #[test]
    fn test_build_deploy_requires_inputs() {
        assert!(matches!(
            build_deploy(None, &[], b"\0asm", &[]),
            Err(CallError::MissingBytecodeOrAbi)
        ));
        assert!(matches!(
            build_deploy(None, b"[]", &[], &[]),
            Err(CallError::MissingBytecodeOrAbi)
        ));
    }

    #[test]
    fn test_wasm_magic_forces_wasm_deploy() {
        let code = b"\0asm\x01\x00\x00\x00";
        let descriptor = build_deploy(Some("evm"), b"[]", code, &[]).unwrap();
        assert_eq!(descriptor.dialect, VmDialect::Wasm);
        assert!(descriptor.is_write);
        assert!(descriptor.to.is_none());

        // payload is [code, interface]
        let fields = Vec::<RlpBytes>::decode(&mut &descriptor.data[..]).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].as_ref(), code);
        assert_eq!(fields[1].as_ref(), b"[]");
    }

    #[test]
    fn test_evm_deploy_appends_constructor_args() {
        let code = [0x60, 0x80, 0x60, 0x40];
        let descriptor = build_deploy(
            Some("evm"),
            CONSTRUCTED_ABI.as_bytes(),
            &code,
            &["1000".to_string()],
        )
        .unwrap();

        assert_eq!(descriptor.dialect, VmDialect::Evm);
        assert_eq!(&descriptor.data[..4], &code);
        assert_eq!(descriptor.data.len(), 4 + 32);
    }

    #[test]
    fn test_constructor_arg_mismatch() {
        let err = build_deploy(
            Some("evm"),
            CONSTRUCTED_ABI.as_bytes(),
            &[0x60, 0x80],
            &[],
        )
        .unwrap_err();
        match err {
            CallError::ConstructorArgMismatch { expected, got } => {
                assert_eq!(expected, 1);
                assert_eq!(got, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_function_surfaces_listing() {
        let err = build_call(
            &abi(),
            VmDialect::Evm,
            "0x00000000000000000000000000000000000000aa",
            "reset",
            &[],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CallError::Abi(AbiError::FunctionNotFound { .. })
        ));
    }
}
