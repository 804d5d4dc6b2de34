mod config;
mod ethereum;

use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use config::Config;
use ethereum::{
    abi::{self, FunctionKind, ParsedAbi},
    chains,
    contract::{ContractClient, OwnershipClient},
    provider::EndpointResolver,
    transfer, utils,
    wallet::WalletSession,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let matches = cli().get_matches();

    // Handle special commands first
    if matches.get_flag("generate-config") {
        println!("{}", Config::generate_sample());
        return Ok(());
    }

    if matches.get_flag("config-path") {
        match Config::default_config_path() {
            Ok(path) => {
                println!("{}", path.display());
                return Ok(());
            }
            Err(e) => {
                error!("Could not determine default config path: {}", e);
                return Err(e);
            }
        }
    }

    let config_path = matches.get_one::<String>("config").map(|s| s.as_str());
    let mut config = Config::load_or_default(config_path).await;

    if matches.get_flag("allow-writes") {
        config.security.allow_write_operations = true;
    }

    let result = match matches.subcommand() {
        Some(("functions", sub)) => cmd_functions(sub).await,
        Some(("chains", _)) => cmd_chains(),
        Some(("read", sub)) => cmd_read(&config, sub).await,
        Some(("write", sub)) => cmd_write(&config, sub).await,
        Some(("transfer-owner", sub)) => cmd_transfer_owner(&config, sub).await,
        Some(("wallet", sub)) => cmd_wallet(&config, sub).await,
        _ => {
            cli().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{e:#}");
        return Err(e);
    }

    Ok(())
}

fn cli() -> Command {
    Command::new("contract-console")
        .version("0.1.0")
        .about("Console for reading and writing Ethereum smart contracts over JSON-RPC")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to configuration file")
                .global(true),
        )
        .arg(
            Arg::new("allow-writes")
                .long("allow-writes")
                .help("Allow write operations (transactions)")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .help("Generate a sample configuration file and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config-path")
                .long("config-path")
                .help("Print the default configuration file path and exit")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("functions")
                .about("List the callable functions of the active ABI")
                .args(abi_args()),
        )
        .subcommand(Command::new("chains").about("List the bundled public RPC endpoints by chain"))
        .subcommand(
            Command::new("read")
                .about("Call a read function over RPC, without signing")
                .args(abi_args())
                .args(endpoint_args())
                .args(call_args()),
        )
        .subcommand(
            Command::new("write")
                .about("Sign and submit a write transaction, printing its hash")
                .args(abi_args())
                .args(endpoint_args())
                .args(call_args()),
        )
        .subcommand(
            Command::new("transfer-owner")
                .about("Grant admin rights to an address, then transfer contract ownership to it")
                .args(endpoint_args())
                .arg(
                    Arg::new("contract")
                        .long("contract")
                        .value_name("ADDRESS")
                        .help("Ownership contract address")
                        .required(true),
                )
                .arg(
                    Arg::new("target")
                        .long("target")
                        .value_name("ADDRESS")
                        .help("Address receiving admin rights and ownership")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("wallet")
                .about("Show the connected wallet account and endpoint chain")
                .args(endpoint_args()),
        )
}

fn abi_args() -> [Arg; 2] {
    [
        Arg::new("abi")
            .long("abi")
            .value_name("JSON")
            .help("Custom ABI as JSON text: an array of items or an object with an 'abi' array"),
        Arg::new("abi-file")
            .long("abi-file")
            .value_name("FILE")
            .help("Read the custom ABI from a file")
            .conflicts_with("abi"),
    ]
}

fn endpoint_args() -> [Arg; 2] {
    [
        Arg::new("rpc-url")
            .short('r')
            .long("rpc-url")
            .value_name("URL")
            .help("JSON-RPC endpoint URL (overrides --network)"),
        Arg::new("network")
            .short('n')
            .long("network")
            .value_name("NETWORK")
            .help("Configured network name"),
    ]
}

fn call_args() -> [Arg; 3] {
    [
        Arg::new("contract")
            .long("contract")
            .value_name("ADDRESS")
            .help("Contract address")
            .required(true),
        Arg::new("function")
            .long("function")
            .value_name("NAME")
            .help("Function to call")
            .required(true),
        Arg::new("arg")
            .short('a')
            .long("arg")
            .value_name("VALUE")
            .help("Function argument, repeatable, in declaration order")
            .action(ArgAction::Append),
    ]
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing required argument '--{}'", name))
}

fn endpoint_selection(matches: &ArgMatches) -> (Option<&str>, Option<&str>) {
    (
        matches.get_one::<String>("rpc-url").map(String::as_str),
        matches.get_one::<String>("network").map(String::as_str),
    )
}

/// The ABI the command operates on: a custom one when supplied, otherwise
/// the built-in ownership ABI.
async fn active_abi(matches: &ArgMatches) -> Result<ParsedAbi> {
    if let Some(path) = matches.get_one::<String>("abi-file") {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read ABI file '{}': {}", path, e))?;
        return abi::parse_custom_abi(&text);
    }
    if let Some(text) = matches.get_one::<String>("abi") {
        return abi::parse_custom_abi(text);
    }
    Ok(abi::ownership_abi().clone())
}

fn is_custom_abi(matches: &ArgMatches) -> bool {
    matches.get_one::<String>("abi").is_some() || matches.get_one::<String>("abi-file").is_some()
}

async fn cmd_functions(matches: &ArgMatches) -> Result<()> {
    let abi = active_abi(matches).await?;
    let source = if is_custom_abi(matches) {
        "custom ABI"
    } else {
        "built-in ownership ABI"
    };
    println!(
        "Using {} ({} read, {} write)",
        source,
        abi.read_functions().len(),
        abi.write_functions().len()
    );

    println!("\nRead functions:");
    for function in abi.read_functions() {
        println!("  {}", function.signature());
    }
    println!("\nWrite functions:");
    for function in abi.write_functions() {
        println!("  {}", function.signature());
    }
    Ok(())
}

fn cmd_chains() -> Result<()> {
    for chain in chains::CHAIN_PRESETS {
        println!("{} (chain id {})", chain.name, chain.chain_id);
        for endpoint in chain.endpoints {
            println!("  {:<20} {}", endpoint.label, endpoint.url);
        }
        println!();
    }
    Ok(())
}

async fn cmd_read(config: &Config, matches: &ArgMatches) -> Result<()> {
    let abi = active_abi(matches).await?;
    let contract_address = required(matches, "contract")?;
    let function_name = required(matches, "function")?;
    let raw_args: Vec<String> = matches
        .get_many::<String>("arg")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let resolver = EndpointResolver::new(config.clone());
    let (rpc_url_arg, network) = endpoint_selection(matches);
    let rpc_url = resolver.resolve(rpc_url_arg, network)?;

    let client = ContractClient::new(&rpc_url, contract_address, abi)?;
    let descriptor = client
        .abi()
        .find(function_name)
        .ok_or_else(|| anyhow!("Function '{}' not found in the active ABI", function_name))?;
    if descriptor.kind == FunctionKind::Write {
        return Err(anyhow!(
            "Function '{}' mutates state; use the 'write' command",
            function_name
        ));
    }

    info!(function = function_name, url = %rpc_url, "reading contract state");
    let value = client.read_function(function_name, &raw_args).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn cmd_write(config: &Config, matches: &ArgMatches) -> Result<()> {
    if !config.security.allow_write_operations {
        return Err(anyhow!(
            "Write operations are disabled. Use --allow-writes or enable them in the configuration."
        ));
    }

    let abi = active_abi(matches).await?;
    let contract_address = required(matches, "contract")?;
    let function_name = required(matches, "function")?;
    let raw_args: Vec<String> = matches
        .get_many::<String>("arg")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let Some(wallet) = WalletSession::connect(&config.wallet)? else {
        return Err(anyhow!(
            "Wallet not available. Set {} to a private key.",
            config.wallet.private_key_env
        ));
    };

    let resolver = EndpointResolver::new(config.clone());
    let (rpc_url_arg, network) = endpoint_selection(matches);
    let rpc_url = resolver.resolve(rpc_url_arg, network)?;

    let client = ContractClient::new(&rpc_url, contract_address, abi)?;
    let descriptor = client
        .abi()
        .find(function_name)
        .ok_or_else(|| anyhow!("Function '{}' not found in the active ABI", function_name))?;
    if descriptor.kind == FunctionKind::Read {
        return Err(anyhow!(
            "Function '{}' does not mutate state; use the 'read' command",
            function_name
        ));
    }

    let submission = client.write_function(&wallet, function_name, &raw_args).await?;
    println!("{}", serde_json::to_string_pretty(&submission)?);
    Ok(())
}

async fn cmd_transfer_owner(config: &Config, matches: &ArgMatches) -> Result<()> {
    if !config.security.allow_write_operations {
        return Err(anyhow!(
            "Write operations are disabled. Use --allow-writes or enable them in the configuration."
        ));
    }

    let contract_address = required(matches, "contract")?;
    let target = utils::validate_address(required(matches, "target")?)
        .map_err(|e| anyhow!("Invalid target address: {}", e))?;

    let resolver = EndpointResolver::new(config.clone());
    let (rpc_url_arg, network) = endpoint_selection(matches);
    let rpc_url = resolver.resolve(rpc_url_arg, network)?;

    let client = match WalletSession::connect(&config.wallet)? {
        Some(wallet) => Some(OwnershipClient::connect(&rpc_url, contract_address, wallet).await?),
        None => {
            warn!(
                "wallet not available; set {} to a private key",
                config.wallet.private_key_env
            );
            None
        }
    };
    let chain = client.as_ref().map(|c| c.chain().clone());

    let (pending, mut pending_rx) = transfer::pending_tx_channel();
    let progress = tokio::spawn(async move {
        while pending_rx.changed().await.is_ok() {
            let current = *pending_rx.borrow_and_update();
            if let Some(hash) = current {
                info!(hash = %hash, "waiting for transaction receipt");
            }
        }
    });

    let outcome = transfer::transfer_owner(client.as_ref(), chain.as_ref(), target, &pending).await;
    drop(pending);
    let _ = progress.await;

    match outcome? {
        Some(outcome) => println!("{}", serde_json::to_string_pretty(&outcome)?),
        None => println!("No transfer was made."),
    }
    Ok(())
}

async fn cmd_wallet(config: &Config, matches: &ArgMatches) -> Result<()> {
    match WalletSession::connect(&config.wallet)? {
        Some(session) => {
            println!("Wallet account: {:#x}", session.address());

            let resolver = EndpointResolver::new(config.clone());
            let (rpc_url_arg, network) = endpoint_selection(matches);
            match resolver.chain_id(rpc_url_arg, network).await {
                Ok(id) => {
                    let name = chains::find_chain(id).map(|c| c.name).unwrap_or("Custom");
                    println!("Endpoint chain: {} (chain id {})", name, id);
                }
                Err(e) => warn!("could not query the endpoint chain id: {e:#}"),
            }
        }
        None => {
            println!(
                "Wallet not available. Set {} to a private key.",
                config.wallet.private_key_env
            );
        }
    }
    Ok(())
}
