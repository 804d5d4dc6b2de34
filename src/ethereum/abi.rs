use alloy::json_abi::Function;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

/// ABI of the ownership proxy contract this console manages by default.
const OWNERSHIP_ABI_JSON: &str = r#"[
  { "inputs": [], "stateMutability": "nonpayable", "type": "constructor" },
  { "inputs": [], "name": "MAX_ADMINS", "outputs": [{ "internalType": "uint8", "name": "", "type": "uint8" }], "stateMutability": "view", "type": "function" },
  { "inputs": [{ "internalType": "address", "name": "_admin", "type": "address" }], "name": "addAdmin", "outputs": [], "stateMutability": "nonpayable", "type": "function" },
  { "inputs": [{ "internalType": "uint256", "name": "", "type": "uint256" }], "name": "admins", "outputs": [{ "internalType": "address", "name": "", "type": "address" }], "stateMutability": "view", "type": "function" },
  { "inputs": [], "name": "factory", "outputs": [{ "internalType": "address", "name": "", "type": "address" }], "stateMutability": "view", "type": "function" },
  { "inputs": [{ "internalType": "string", "name": "_name", "type": "string" }, { "internalType": "address", "name": "_owner", "type": "address" }], "name": "initialize", "outputs": [], "stateMutability": "nonpayable", "type": "function" },
  { "inputs": [{ "internalType": "address", "name": "_address", "type": "address" }], "name": "isAdmin", "outputs": [{ "internalType": "bool", "name": "", "type": "bool" }], "stateMutability": "view", "type": "function" },
  { "inputs": [], "name": "name", "outputs": [{ "internalType": "string", "name": "", "type": "string" }], "stateMutability": "view", "type": "function" },
  { "inputs": [], "name": "owner", "outputs": [{ "internalType": "address", "name": "", "type": "address" }], "stateMutability": "view", "type": "function" },
  { "inputs": [{ "internalType": "address", "name": "_admin", "type": "address" }], "name": "removeAdmin", "outputs": [], "stateMutability": "nonpayable", "type": "function" },
  { "inputs": [], "name": "renounceOwnership", "outputs": [], "stateMutability": "nonpayable", "type": "function" },
  { "inputs": [{ "internalType": "address", "name": "newOwner", "type": "address" }], "name": "transferOwnership", "outputs": [], "stateMutability": "nonpayable", "type": "function" },
  { "inputs": [{ "internalType": "address", "name": "_asset", "type": "address" }, { "internalType": "address", "name": "_recipient", "type": "address" }, { "internalType": "uint256", "name": "_amount", "type": "uint256" }], "name": "withdrawAsset", "outputs": [], "stateMutability": "nonpayable", "type": "function" }
]"#;

/// The built-in ownership ABI, parsed once on first use.
pub fn ownership_abi() -> &'static ParsedAbi {
    static ABI: OnceLock<ParsedAbi> = OnceLock::new();
    ABI.get_or_init(|| {
        parse_custom_abi(OWNERSHIP_ABI_JSON).expect("built-in ownership ABI is valid")
    })
}

/// Whether calling a function mutates chain state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// `view` or `pure`; callable over RPC without signing.
    Read,
    /// Everything else, including functions with no declared mutability.
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AbiInput {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: String,
    #[serde(rename = "internalType", default)]
    pub internal_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub name: String,
    pub inputs: Vec<AbiInput>,
    pub state_mutability: Option<String>,
    pub kind: FunctionKind,
}

impl FunctionDescriptor {
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .inputs
            .iter()
            .map(|input| {
                if input.name.is_empty() {
                    input.ty.clone()
                } else {
                    format!("{} {}", input.ty, input.name)
                }
            })
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// A validated ABI: the original item list, forwardable to the encoding
/// layer untouched, plus the function descriptors split by kind.
#[derive(Debug, Clone)]
pub struct ParsedAbi {
    items: Vec<Value>,
    read_fns: Vec<FunctionDescriptor>,
    write_fns: Vec<FunctionDescriptor>,
}

impl ParsedAbi {
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn read_functions(&self) -> &[FunctionDescriptor] {
        &self.read_fns
    }

    pub fn write_functions(&self) -> &[FunctionDescriptor] {
        &self.write_fns
    }

    /// Read functions first, then write functions.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.read_fns.iter().chain(self.write_fns.iter())
    }

    pub fn find(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions().find(|f| f.name == name)
    }

    /// Resolve a function by name into its full `alloy` representation,
    /// taken from the original item so tuple components and output types
    /// survive even though descriptors do not carry them.
    pub fn resolve(&self, name: &str) -> Result<Function> {
        let item = self
            .items
            .iter()
            .find(|item| {
                item.get("type").and_then(Value::as_str) == Some("function")
                    && item.get("name").and_then(Value::as_str) == Some(name)
            })
            .ok_or_else(|| {
                let available: Vec<&str> = self.functions().map(|f| f.name.as_str()).collect();
                if available.is_empty() {
                    anyhow!("Function '{}' not found. The ABI contains no functions.", name)
                } else {
                    anyhow!(
                        "Function '{}' not found in the active ABI. Available functions: {}",
                        name,
                        available.join(", ")
                    )
                }
            })?;

        // Apply the same defaults the descriptor scan does, so minimal
        // custom items resolve instead of failing deserialization.
        let mut item = item.clone();
        if let Some(obj) = item.as_object_mut() {
            obj.entry("inputs").or_insert_with(|| Value::Array(Vec::new()));
            obj.entry("outputs").or_insert_with(|| Value::Array(Vec::new()));
            obj.entry("stateMutability")
                .or_insert_with(|| Value::String("nonpayable".to_string()));
        }

        serde_json::from_value(item)
            .map_err(|e| anyhow!("ABI entry for function '{}' is malformed: {}", name, e))
    }
}

/// Parse user-supplied ABI text. Accepts a JSON array of ABI items or an
/// object with an `abi` array (the shape of a verified-contract export).
/// Validation is ordered so the most specific problem is reported.
pub fn parse_custom_abi(input: &str) -> Result<ParsedAbi> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("ABI is empty"));
    }

    let raw: Value = serde_json::from_str(trimmed).map_err(|_| anyhow!("Invalid JSON"))?;

    let items: Vec<Value> = match raw {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("abi") {
            Some(Value::Array(items)) => items,
            _ => return Err(anyhow!("ABI must be a JSON array or object with 'abi' array")),
        },
        _ => return Err(anyhow!("ABI must be a JSON array or object with 'abi' array")),
    };

    let mut read_fns = Vec::new();
    let mut write_fns = Vec::new();
    for item in &items {
        let Some(descriptor) = function_descriptor(item) else {
            continue;
        };
        match descriptor.kind {
            FunctionKind::Read => read_fns.push(descriptor),
            FunctionKind::Write => write_fns.push(descriptor),
        }
    }

    if read_fns.is_empty() && write_fns.is_empty() {
        return Err(anyhow!("No functions found in ABI"));
    }

    Ok(ParsedAbi {
        items,
        read_fns,
        write_fns,
    })
}

/// Interpret one ABI item as a callable function, if it is shaped like one.
/// Non-function items (constructors, events, errors) and functions without
/// a name are skipped rather than coerced.
fn function_descriptor(item: &Value) -> Option<FunctionDescriptor> {
    let obj = item.as_object()?;
    if obj.get("type").and_then(Value::as_str) != Some("function") {
        return None;
    }
    let name = obj.get("name")?.as_str()?.to_string();

    let inputs = match obj.get("inputs") {
        Some(value @ Value::Array(_)) => serde_json::from_value(value.clone()).unwrap_or_default(),
        _ => Vec::new(),
    };

    let state_mutability = obj
        .get("stateMutability")
        .and_then(Value::as_str)
        .map(str::to_string);
    let kind = match state_mutability.as_deref() {
        Some("view") | Some("pure") => FunctionKind::Read,
        _ => FunctionKind::Write,
    };

    Some(FunctionDescriptor {
        name,
        inputs,
        state_mutability,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_rejected() {
        for input in ["", "   ", "\n\t "] {
            let err = parse_custom_abi(input).unwrap_err();
            assert_eq!(err.to_string(), "ABI is empty");
        }
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = parse_custom_abi("{not json").unwrap_err();
        assert_eq!(err.to_string(), "Invalid JSON");
    }

    #[test]
    fn non_array_shapes_are_rejected() {
        for input in ["42", "\"abi\"", "{\"functions\": []}", "{\"abi\": 7}"] {
            let err = parse_custom_abi(input).unwrap_err();
            assert_eq!(
                err.to_string(),
                "ABI must be a JSON array or object with 'abi' array"
            );
        }
    }

    #[test]
    fn empty_array_has_no_functions() {
        let err = parse_custom_abi("[]").unwrap_err();
        assert_eq!(err.to_string(), "No functions found in ABI");
    }

    #[test]
    fn events_alone_do_not_count_as_functions() {
        let err = parse_custom_abi(r#"[{"type":"event","name":"Transfer"}]"#).unwrap_err();
        assert_eq!(err.to_string(), "No functions found in ABI");
    }

    #[test]
    fn view_function_classifies_as_read() {
        let abi = parse_custom_abi(
            r#"[{"type":"function","name":"foo","stateMutability":"view","inputs":[]}]"#,
        )
        .unwrap();
        assert_eq!(abi.read_functions().len(), 1);
        assert_eq!(abi.write_functions().len(), 0);
        assert_eq!(abi.read_functions()[0].name, "foo");
        assert_eq!(abi.read_functions()[0].kind, FunctionKind::Read);
    }

    #[test]
    fn missing_inputs_default_to_empty() {
        let abi = parse_custom_abi(
            r#"[{"type":"function","name":"bar","stateMutability":"nonpayable"}]"#,
        )
        .unwrap();
        assert_eq!(abi.write_functions().len(), 1);
        let bar = &abi.write_functions()[0];
        assert_eq!(bar.name, "bar");
        assert!(bar.inputs.is_empty());
    }

    #[test]
    fn missing_mutability_classifies_as_write() {
        let abi = parse_custom_abi(r#"[{"type":"function","name":"baz"}]"#).unwrap();
        assert_eq!(abi.write_functions().len(), 1);
        assert_eq!(abi.write_functions()[0].state_mutability, None);
    }

    #[test]
    fn object_with_abi_key_parses_like_a_bare_array() {
        let wrapped = parse_custom_abi(
            r#"{"abi":[{"type":"function","name":"baz","stateMutability":"pure"}]}"#,
        )
        .unwrap();
        let bare =
            parse_custom_abi(r#"[{"type":"function","name":"baz","stateMutability":"pure"}]"#)
                .unwrap();
        assert_eq!(wrapped.read_functions(), bare.read_functions());
        assert_eq!(wrapped.items(), bare.items());
    }

    #[test]
    fn original_items_are_retained_verbatim() {
        let abi = parse_custom_abi(
            r#"[{"type":"constructor","inputs":[]},{"type":"function","name":"foo","stateMutability":"view"}]"#,
        )
        .unwrap();
        assert_eq!(abi.items().len(), 2);
        assert_eq!(abi.items()[0]["type"], "constructor");
    }

    #[test]
    fn ownership_abi_splits_into_six_read_and_six_write() {
        let abi = ownership_abi();
        let read: Vec<&str> = abi.read_functions().iter().map(|f| f.name.as_str()).collect();
        let write: Vec<&str> = abi.write_functions().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(read, ["MAX_ADMINS", "admins", "factory", "isAdmin", "name", "owner"]);
        assert_eq!(
            write,
            [
                "addAdmin",
                "initialize",
                "removeAdmin",
                "renounceOwnership",
                "transferOwnership",
                "withdrawAsset"
            ]
        );
    }

    #[test]
    fn resolve_produces_an_encodable_function() {
        let function = ownership_abi().resolve("isAdmin").unwrap();
        assert_eq!(function.inputs.len(), 1);
        assert_eq!(function.inputs[0].ty, "address");

        let err = ownership_abi().resolve("mint").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn resolve_applies_descriptor_defaults_to_minimal_items() {
        let abi = parse_custom_abi(r#"[{"type":"function","name":"poke"}]"#).unwrap();
        let function = abi.resolve("poke").unwrap();
        assert!(function.inputs.is_empty());
        assert!(function.outputs.is_empty());
    }

    #[test]
    fn descriptor_signatures_render_inputs() {
        let abi = ownership_abi();
        assert_eq!(abi.find("isAdmin").unwrap().signature(), "isAdmin(address _address)");
        assert_eq!(abi.find("owner").unwrap().signature(), "owner()");
    }
}
