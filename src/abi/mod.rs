//! Contract interface model shared by both VM dialects.
//!
//! An [`Abi`] is parsed from the JSON interface a compiler emits; entries
//! describe functions, events, and the constructor. The [`evm`] and
//! [`wasm`] submodules hold the two wire codecs.

pub mod evm;
pub mod value;
pub mod wasm;

use serde::{Deserialize, Serialize};

use crate::error::AbiError;
pub use value::{ParamType, Value};

/// One declared input or output parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<AbiParam>>,
    #[serde(default)]
    pub indexed: bool,
}

impl AbiParam {
    /// Resolves the declared type string, expanding `tuple` through the
    /// parameter's components.
    pub fn param_type(&self) -> Result<ParamType, AbiError> {
        let components = match &self.components {
            Some(members) => Some(
                members
                    .iter()
                    .map(AbiParam::param_type)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };
        ParamType::parse(&self.ty, components)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Function,
    Constructor,
    Event,
    Fallback,
    Receive,
    #[serde(other)]
    Unknown,
}

/// Some compilers emit `constant` as a bool, others as the strings
/// `"true"`/`"false"`. Accept both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstantFlag {
    Bool(bool),
    Text(String),
}

impl ConstantFlag {
    fn is_set(&self) -> bool {
        match self {
            ConstantFlag::Bool(b) => *b,
            ConstantFlag::Text(s) => s.eq_ignore_ascii_case("true"),
        }
    }
}

/// One entry of a contract interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiEntry {
    #[serde(rename = "type", default = "EntryKind::function")]
    pub kind: EntryKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub outputs: Vec<AbiParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<ConstantFlag>,
    #[serde(
        rename = "stateMutability",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub state_mutability: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
}

impl EntryKind {
    fn function() -> Self {
        EntryKind::Function
    }
}

impl AbiEntry {
    /// Whether a call to this function reads state without changing it.
    pub fn is_constant(&self) -> bool {
        if let Some(flag) = &self.constant {
            if flag.is_set() {
                return true;
            }
        }
        matches!(
            self.state_mutability.as_deref(),
            Some("view") | Some("pure") | Some("constant")
        )
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`.
    pub fn signature(&self) -> Result<String, AbiError> {
        let types = self
            .inputs
            .iter()
            .map(|p| p.param_type().map(|t| t.canonical()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("{}({})", self.name, types.join(",")))
    }

    pub fn input_types(&self) -> Result<Vec<ParamType>, AbiError> {
        self.inputs.iter().map(AbiParam::param_type).collect()
    }

    pub fn output_types(&self) -> Result<Vec<ParamType>, AbiError> {
        self.outputs.iter().map(AbiParam::param_type).collect()
    }

    /// Parses human-supplied argument strings against this entry's inputs.
    pub fn string_to_args(&self, args: &[String]) -> Result<Vec<Value>, AbiError> {
        if args.len() != self.inputs.len() {
            return Err(AbiError::ArgCountMismatch {
                expected: self.inputs.len(),
                got: args.len(),
            });
        }
        let mut values = Vec::with_capacity(args.len());
        for (index, (param, raw)) in self.inputs.iter().zip(args).enumerate() {
            let ty = param.param_type()?;
            let value = Value::from_string(&ty, raw).map_err(|e| match e {
                AbiError::TypeParse { ty, value, .. } => AbiError::TypeParse { index, ty, value },
                other => other,
            })?;
            values.push(value);
        }
        Ok(values)
    }
}

/// A parsed contract interface.
#[derive(Debug, Clone, Default)]
pub struct Abi {
    entries: Vec<AbiEntry>,
}

impl Abi {
    pub fn parse(json: &[u8]) -> Result<Self, AbiError> {
        let entries: Vec<AbiEntry> =
            serde_json::from_slice(json).map_err(|e| AbiError::MalformedInterface(e.to_string()))?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[AbiEntry] {
        &self.entries
    }

    pub fn functions(&self) -> impl Iterator<Item = &AbiEntry> {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Function)
    }

    pub fn events(&self) -> impl Iterator<Item = &AbiEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Event)
    }

    pub fn constructor(&self) -> Option<&AbiEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == EntryKind::Constructor)
    }

    /// Looks up a function by name, case-insensitively. The first match
    /// wins; overloads are not distinguished.
    pub fn function(&self, name: &str) -> Result<&AbiEntry, AbiError> {
        self.functions()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AbiError::FunctionNotFound {
                name: name.to_string(),
                available: self.describe_functions(),
            })
    }

    pub fn event(&self, name: &str) -> Result<&AbiEntry, AbiError> {
        self.events()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AbiError::FunctionNotFound {
                name: name.to_string(),
                available: self.describe_functions(),
            })
    }

    /// One-per-line signature listing used in "not found" errors.
    fn describe_functions(&self) -> String {
        let mut lines = Vec::new();
        for entry in self.functions() {
            match entry.signature() {
                Ok(sig) => lines.push(sig),
                Err(_) => lines.push(entry.name.clone()),
            }
        }
        if lines.is_empty() {
            "(no functions declared)".to_string()
        } else {
            lines.join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN_ABI: &str = r#"[
        {
            "type": "function",
            "name": "transfer",
            "inputs": [
                {"name": "to", "type": "address"},
                {"name": "amount", "type": "uint256"}
            ],
            "outputs": [{"name": "", "type": "bool"}],
            "stateMutability": "nonpayable"
        },
        {
            "type": "function",
            "name": "balanceOf",
            "inputs": [{"name": "owner", "type": "address"}],
            "outputs": [{"name": "", "type": "uint256"}],
            "constant": "true"
        },
        {
            "type": "event",
            "name": "Transfer",
            "inputs": [
                {"name": "from", "type": "address", "indexed": true},
                {"name": "to", "type": "address", "indexed": true},
                {"name": "value", "type": "uint256"}
            ]
        },
        {
            "type": "constructor",
            "inputs": [{"name": "supply", "type": "uint256"}]
        }
    ]"#;

    #[test]
    fn test_parse_and_lookup() {
        let abi = Abi::parse(TOKEN_ABI.as_bytes()).unwrap();
        assert_eq!(abi.functions().count(), 2);
        assert_eq!(abi.events().count(), 1);
        assert!(abi.constructor().is_some());

        let f = abi.function("transfer").unwrap();
        assert_eq!(f.signature().unwrap(), "transfer(address,uint256)");
        assert!(!f.is_constant());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let abi = Abi::parse(TOKEN_ABI.as_bytes()).unwrap();
        let f = abi.function("TRANSFER").unwrap();
        assert_eq!(f.name, "transfer");
    }

    #[test]
    fn test_missing_function_lists_alternatives() {
        let abi = Abi::parse(TOKEN_ABI.as_bytes()).unwrap();
        let err = abi.function("mint").unwrap_err();
        match err {
            AbiError::FunctionNotFound { name, available } => {
                assert_eq!(name, "mint");
                assert!(available.contains("transfer(address,uint256)"));
                assert!(available.contains("balanceOf(address)"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_string_constant_flag() {
        let abi = Abi::parse(TOKEN_ABI.as_bytes()).unwrap();
        assert!(abi.function("balanceOf").unwrap().is_constant());
    }

    #[test]
    fn test_arg_count_mismatch() {
        let abi = Abi::parse(TOKEN_ABI.as_bytes()).unwrap();
        let f = abi.function("transfer").unwrap();

        let err = f.string_to_args(&["0x1".to_string()]).unwrap_err();
        match err {
            AbiError::ArgCountMismatch { expected, got } => {
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_args_parse_with_index_in_error() {
        let abi = Abi::parse(TOKEN_ABI.as_bytes()).unwrap();
        let f = abi.function("transfer").unwrap();

        let err = f
            .string_to_args(&[
                "0x00000000000000000000000000000000000000aa".to_string(),
                "not-a-number".to_string(),
            ])
            .unwrap_err();
        match err {
            AbiError::TypeParse { index, ty, .. } => {
                assert_eq!(index, 1);
                assert_eq!(ty, "uint256");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_tuple_components_resolve() {
        let json = r#"[{
            "type": "function",
            "name": "submit",
            "inputs": [{
                "name": "order",
                "type": "tuple",
                "components": [
                    {"name": "id", "type": "uint64"},
                    {"name": "owner", "type": "address"}
                ]
            }],
            "outputs": []
        }]"#;
        let abi = Abi::parse(json.as_bytes()).unwrap();
        let f = abi.function("submit").unwrap();
        assert_eq!(f.signature().unwrap(), "submit((uint64,address))");
    }

    #[test]
    fn test_unknown_entry_kinds_are_tolerated() {
        let json = r#"[{"type": "error", "name": "Nope", "inputs": []}]"#;
        let abi = Abi::parse(json.as_bytes()).unwrap();
        assert_eq!(abi.functions().count(), 0);
    }
}
