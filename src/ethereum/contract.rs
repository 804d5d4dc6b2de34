use alloy::{
    dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt, Word},
    json_abi::Function,
    network::{ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes, TxHash, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::TransactionRequest,
    transports::http::{Client, Http},
};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{
    abi::{self, ParsedAbi},
    chains::ChainDescriptor,
    provider,
    transfer::{OwnershipContract, ReceiptStatus},
    utils,
    wallet::WalletSession,
    WriteSubmission,
};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const RECEIPT_POLL_ATTEMPTS: u32 = 150;

/// A coerced argument, typed for calldata encoding. Addresses stay as
/// trimmed strings until encoding so malformed input fails with a message
/// naming the argument rather than at transport level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    Uint(U256),
    Address(String),
    Text(String),
}

/// Coerce a raw argument string per the input's declared internal type.
/// Unsigned integer types parse as decimal or '0x' hex, with an empty
/// string meaning zero. Everything else passes through trimmed.
pub fn coerce_arg(value: &str, internal_type: &str) -> Result<CallArg> {
    let trimmed = value.trim();
    if internal_type.starts_with("uint") {
        if trimmed.is_empty() {
            return Ok(CallArg::Uint(U256::ZERO));
        }
        return Ok(CallArg::Uint(utils::parse_uint(trimmed)?));
    }
    if internal_type == "address" {
        return Ok(CallArg::Address(trimmed.to_string()));
    }
    Ok(CallArg::Text(trimmed.to_string()))
}

/// A contract bound to one endpoint and one ABI.
#[derive(Debug)]
pub struct ContractClient {
    provider: RootProvider<Http<Client>>,
    address: Address,
    abi: ParsedAbi,
    rpc_url: String,
}

impl ContractClient {
    pub fn new(rpc_url: &str, contract_address: &str, abi: ParsedAbi) -> Result<Self> {
        let address = utils::validate_address(contract_address)
            .map_err(|e| anyhow!("Invalid contract address: {}", e))?;
        let provider = provider::http_provider(rpc_url)?;
        Ok(Self {
            provider,
            address,
            abi,
            rpc_url: rpc_url.to_string(),
        })
    }

    pub fn abi(&self) -> &ParsedAbi {
        &self.abi
    }

    pub async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| anyhow!(utils::interpret_rpc_error(&e.to_string())))
    }

    /// Call a function with `eth_call` and render the decoded return value.
    /// No signing is involved.
    pub async fn read_function(&self, function_name: &str, raw_args: &[String]) -> Result<Value> {
        utils::validate_function_name(function_name)
            .map_err(|e| anyhow!("Invalid function name: {}", e))?;

        let function = self.abi.resolve(function_name)?;
        let calldata = encode_call(&function, raw_args)?;

        let request = TransactionRequest::default()
            .to(self.address)
            .input(calldata.into());

        let result = self
            .provider
            .call(&request)
            .await
            .map_err(|e| anyhow!(utils::interpret_rpc_error(&e.to_string())))?;

        decode_result(&function, &result)
    }

    /// Sign and submit a state-changing call. Returns as soon as the
    /// transaction is accepted by the endpoint; callers that need the
    /// receipt wait on the hash themselves.
    pub async fn write_function(
        &self,
        wallet: &WalletSession,
        function_name: &str,
        raw_args: &[String],
    ) -> Result<WriteSubmission> {
        utils::validate_function_name(function_name)
            .map_err(|e| anyhow!("Invalid function name: {}", e))?;

        let function = self.abi.resolve(function_name)?;
        let calldata = encode_call(&function, raw_args)?;

        let chain_id = self.chain_id().await.context("eth_chainId query failed")?;
        let chain = ChainDescriptor::custom(chain_id, &self.rpc_url);

        let hash = self.submit(wallet, &chain, calldata).await?;
        Ok(WriteSubmission {
            hash: format!("{hash:#x}"),
            from: format!("{:#x}", wallet.address()),
            chain_id,
        })
    }

    async fn submit(
        &self,
        wallet: &WalletSession,
        chain: &ChainDescriptor,
        calldata: Bytes,
    ) -> Result<TxHash> {
        let url = chain
            .rpc_url
            .parse()
            .map_err(|e| anyhow!("Invalid RPC URL '{}': {}", chain.rpc_url, e))?;

        let signing_provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet.ethereum_wallet())
            .on_http(url);

        let request = TransactionRequest::default()
            .to(self.address)
            .input(calldata.into())
            .with_chain_id(chain.id);

        tracing::info!(
            contract = %self.address,
            chain = %chain.name,
            chain_id = chain.id,
            from = %wallet.address(),
            "submitting transaction"
        );

        let pending = signing_provider
            .send_transaction(request)
            .await
            .map_err(|e| anyhow!(utils::interpret_rpc_error(&e.to_string())))?;

        Ok(*pending.tx_hash())
    }
}

/// Poll the endpoint until the transaction's receipt is available and map
/// its status. Gives up after a few minutes of polling.
pub async fn wait_for_receipt(
    provider: &RootProvider<Http<Client>>,
    hash: TxHash,
) -> Result<ReceiptStatus> {
    for _ in 0..RECEIPT_POLL_ATTEMPTS {
        match provider.get_transaction_receipt(hash).await {
            Ok(Some(receipt)) => {
                let status = if receipt.status() {
                    ReceiptStatus::Success
                } else {
                    ReceiptStatus::Reverted
                };
                return Ok(status);
            }
            Ok(None) => tokio::time::sleep(RECEIPT_POLL_INTERVAL).await,
            Err(e) => return Err(anyhow!(utils::interpret_rpc_error(&e.to_string()))),
        }
    }
    Err(anyhow!(
        "No receipt for transaction {:#x} after {} polls",
        hash,
        RECEIPT_POLL_ATTEMPTS
    ))
}

/// Ownership contract operations backed by a live endpoint and a signing
/// wallet. Reads go through `eth_call`; writes are signed submissions.
#[derive(Debug)]
pub struct OwnershipClient {
    client: ContractClient,
    wallet: WalletSession,
    chain: ChainDescriptor,
}

impl OwnershipClient {
    pub async fn connect(
        rpc_url: &str,
        contract_address: &str,
        wallet: WalletSession,
    ) -> Result<Self> {
        let client = ContractClient::new(rpc_url, contract_address, abi::ownership_abi().clone())?;
        let chain_id = client.chain_id().await.context("eth_chainId query failed")?;
        let chain = ChainDescriptor::custom(chain_id, rpc_url);
        Ok(Self {
            client,
            wallet,
            chain,
        })
    }

    pub fn chain(&self) -> &ChainDescriptor {
        &self.chain
    }

    async fn submit_write(&self, function_name: &str, account: Address) -> Result<TxHash> {
        let function = self.client.abi.resolve(function_name)?;
        let calldata = encode_call(&function, &[format!("{account:#x}")])?;
        self.client.submit(&self.wallet, &self.chain, calldata).await
    }
}

#[async_trait]
impl OwnershipContract for OwnershipClient {
    async fn is_admin(&self, account: Address) -> Result<bool> {
        let value = self
            .client
            .read_function("isAdmin", &[format!("{account:#x}")])
            .await?;
        value
            .as_bool()
            .ok_or_else(|| anyhow!("isAdmin returned a non-boolean value: {}", value))
    }

    async fn add_admin(&self, account: Address) -> Result<Option<TxHash>> {
        let hash = self.submit_write("addAdmin", account).await?;
        Ok(Some(hash))
    }

    async fn transfer_ownership(&self, new_owner: Address) -> Result<Option<TxHash>> {
        let hash = self.submit_write("transferOwnership", new_owner).await?;
        Ok(Some(hash))
    }

    async fn receipt_status(&self, hash: TxHash) -> Result<ReceiptStatus> {
        wait_for_receipt(&self.client.provider, hash).await
    }
}

/// Coerce and encode arguments for a function call.
fn encode_call(function: &Function, raw_args: &[String]) -> Result<Bytes> {
    if raw_args.len() != function.inputs.len() {
        let expected: Vec<String> = function
            .inputs
            .iter()
            .map(|input| format!("{} {}", input.ty, input.name).trim_end().to_string())
            .collect();
        return Err(anyhow!(
            "Argument count mismatch for function '{}': expected {}, got {}. Expected arguments: [{}]",
            function.name,
            function.inputs.len(),
            raw_args.len(),
            expected.join(", ")
        ));
    }

    let mut values = Vec::with_capacity(raw_args.len());
    for (i, raw) in raw_args.iter().enumerate() {
        let input = &function.inputs[i];
        let arg = coerce_arg(raw, &input.ty).with_context(|| {
            format!(
                "Invalid argument #{} ('{}' of type '{}')",
                i + 1,
                input.name,
                input.ty
            )
        })?;
        let value = arg_to_dyn_sol(&arg, &input.ty).with_context(|| {
            format!(
                "Invalid argument #{} ('{}' of type '{}')",
                i + 1,
                input.name,
                input.ty
            )
        })?;
        values.push(value);
    }

    let encoded = function
        .abi_encode_input(&values)
        .map_err(|e| anyhow!("Failed to encode arguments: {}", e))?;
    Ok(encoded.into())
}

fn arg_to_dyn_sol(arg: &CallArg, sol_type: &str) -> Result<DynSolValue> {
    match arg {
        CallArg::Uint(value) => {
            let bits = sol_type
                .strip_prefix("uint")
                .and_then(|b| b.parse().ok())
                .unwrap_or(256);
            Ok(DynSolValue::Uint(*value, bits))
        }
        CallArg::Address(s) => {
            let address = utils::validate_address(s)?;
            Ok(DynSolValue::Address(address))
        }
        CallArg::Text(s) => text_to_dyn_sol(s, sol_type),
    }
}

fn text_to_dyn_sol(value: &str, sol_type: &str) -> Result<DynSolValue> {
    match sol_type {
        "string" => Ok(DynSolValue::String(value.to_string())),
        "bool" => match value {
            "true" => Ok(DynSolValue::Bool(true)),
            "false" => Ok(DynSolValue::Bool(false)),
            _ => Err(anyhow!("Bool must be 'true' or 'false', got '{}'", value)),
        },
        "bytes" => {
            let bytes = hex::decode(value.trim_start_matches("0x"))
                .map_err(|_| anyhow!("Invalid hex string: {}", value))?;
            Ok(DynSolValue::Bytes(bytes))
        }
        ty if ty.starts_with("bytes") => {
            // Fixed bytes (e.g. bytes32), padded into a single word
            let bytes = hex::decode(value.trim_start_matches("0x"))
                .map_err(|_| anyhow!("Invalid hex string: {}", value))?;
            let mut word_bytes = [0u8; 32];
            let len = bytes.len().min(32);
            word_bytes[..len].copy_from_slice(&bytes[..len]);
            Ok(DynSolValue::FixedBytes(Word::from(word_bytes), len))
        }
        _ => Err(anyhow!("Unsupported Solidity type: {}", sol_type)),
    }
}

fn decode_result(function: &Function, data: &Bytes) -> Result<Value> {
    if data.is_empty() {
        return Ok(Value::Null);
    }

    let decoded = function
        .abi_decode_output(data, false)
        .map_err(|e| anyhow!("Failed to decode result: {}", e))?;

    render_values(&decoded)
}

fn render_values(values: &[DynSolValue]) -> Result<Value> {
    if values.len() == 1 {
        render_value(&values[0])
    } else {
        let mut rendered = Vec::new();
        for value in values {
            rendered.push(render_value(value)?);
        }
        Ok(Value::Array(rendered))
    }
}

/// Render a decoded value for display. Integers become decimal strings so
/// 256-bit values survive JSON.
fn render_value(value: &DynSolValue) -> Result<Value> {
    match value {
        DynSolValue::Address(addr) => Ok(Value::String(format!("0x{:x}", addr))),
        DynSolValue::Uint(num, _) => Ok(Value::String(num.to_string())),
        DynSolValue::Int(num, _) => Ok(Value::String(num.to_string())),
        DynSolValue::Bool(b) => Ok(Value::Bool(*b)),
        DynSolValue::String(s) => Ok(Value::String(s.clone())),
        DynSolValue::Bytes(bytes) => Ok(Value::String(format!("0x{}", hex::encode(bytes)))),
        DynSolValue::FixedBytes(bytes, _) => Ok(Value::String(format!("0x{}", hex::encode(bytes)))),
        DynSolValue::Array(arr) | DynSolValue::Tuple(arr) => {
            let mut rendered = Vec::new();
            for item in arr {
                rendered.push(render_value(item)?);
            }
            Ok(Value::Array(rendered))
        }
        _ => Err(anyhow!("Unsupported value type: {:?}", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_coercion_defaults_empty_to_zero() {
        assert_eq!(coerce_arg("", "uint256").unwrap(), CallArg::Uint(U256::ZERO));
        assert_eq!(coerce_arg("   ", "uint256").unwrap(), CallArg::Uint(U256::ZERO));
        assert_eq!(
            coerce_arg("42", "uint256").unwrap(),
            CallArg::Uint(U256::from(42))
        );
        assert_eq!(
            coerce_arg("0x2a", "uint8").unwrap(),
            CallArg::Uint(U256::from(42))
        );
        assert!(coerce_arg("not-a-number", "uint256").is_err());
    }

    #[test]
    fn address_coercion_trims_and_passes_through() {
        assert_eq!(
            coerce_arg(" 0xabc ", "address").unwrap(),
            CallArg::Address("0xabc".to_string())
        );
    }

    #[test]
    fn other_types_pass_through_trimmed() {
        assert_eq!(
            coerce_arg("  hello  ", "string").unwrap(),
            CallArg::Text("hello".to_string())
        );
    }

    #[test]
    fn encode_rejects_argument_count_mismatch() {
        let function = abi::ownership_abi().resolve("isAdmin").unwrap();
        let err = encode_call(&function, &[]).unwrap_err();
        assert!(err.to_string().contains("expected 1, got 0"));
    }

    #[test]
    fn encode_produces_selector_prefixed_calldata() {
        let function = abi::ownership_abi().resolve("isAdmin").unwrap();
        let calldata = encode_call(
            &function,
            &["0x742d35Cc6435C9c1c72c5E7b18BaB7e1DB7a5d6e".to_string()],
        )
        .unwrap();
        // 4-byte selector plus one 32-byte word
        assert_eq!(calldata.len(), 36);
    }

    #[test]
    fn encode_rejects_malformed_addresses_with_context() {
        let function = abi::ownership_abi().resolve("isAdmin").unwrap();
        let err = encode_call(&function, &["0xabc".to_string()]).unwrap_err();
        assert!(format!("{err:#}").contains("_address"));
    }

    #[test]
    fn rendered_integers_are_decimal_strings() {
        let rendered = render_value(&DynSolValue::Uint(U256::from(1_000_000u64), 256)).unwrap();
        assert_eq!(rendered, Value::String("1000000".to_string()));

        let rendered = render_value(&DynSolValue::Bool(true)).unwrap();
        assert_eq!(rendered, Value::Bool(true));
    }

    #[test]
    fn multiple_return_values_render_as_an_array() {
        let rendered = render_values(&[
            DynSolValue::Bool(false),
            DynSolValue::Uint(U256::from(7u64), 256),
        ])
        .unwrap();
        assert_eq!(
            rendered,
            serde_json::json!([false, "7"])
        );
    }
}
