use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use abi_codec::{Argument, Value};
use abi_contract::{unpack_revert, Abi, Method};
use alloy::primitives::{hex, keccak256};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Context, Result};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::{json, Value as Json};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct AppContext {
    abi_path: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(name = "abi-tool")]
#[command(about = "Encode and decode contract call data, return data and logs")]
#[command(version)]
struct Cli {
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// JSON interface description of the contract.
    #[arg(long, global = true, env = "ABI_PATH")]
    abi: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the functions and events of the interface.
    Methods(MethodsArgs),
    /// Print the selector and topic of a human-readable signature.
    Selector(SelectorArgs),
    /// Encode call data for a function (empty name for the constructor).
    Encode(EncodeArgs),
    /// Decode function return data or event log data.
    Decode(DecodeArgs),
    /// Decode call data by resolving its selector.
    DecodeCall(DecodeCallArgs),
    /// Decode an `Error(string)` revert payload.
    Revert(RevertArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Args, Debug)]
struct MethodsArgs {
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,
}

#[derive(Args, Debug)]
struct SelectorArgs {
    /// e.g. `transfer(address to, uint256 amount)`.
    signature: String,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Function name as listed by `methods`; empty for the constructor.
    #[arg(default_value = "")]
    method: String,

    /// JSON array with one value per input.
    #[arg(long, default_value = "[]")]
    args: String,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Function or event name.
    name: String,

    /// `0x`-prefixed hex data.
    data: String,

    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,
}

#[derive(Args, Debug)]
struct DecodeCallArgs {
    /// `0x`-prefixed call data including the selector.
    data: String,

    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,
}

#[derive(Args, Debug)]
struct RevertArgs {
    /// `0x`-prefixed revert data.
    data: String,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    let ctx = AppContext { abi_path: cli.abi };

    match cli.command {
        Commands::Methods(args) => handle_methods(&ctx, args),
        Commands::Selector(args) => handle_selector(args),
        Commands::Encode(args) => handle_encode(&ctx, args),
        Commands::Decode(args) => handle_decode(&ctx, args),
        Commands::DecodeCall(args) => handle_decode_call(&ctx, args),
        Commands::Revert(args) => handle_revert(args),
    }
}

fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::WARN
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .wrap_err("failed to initialize tracing filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_abi(ctx: &AppContext) -> Result<Abi> {
    let path = ctx
        .abi_path
        .as_deref()
        .ok_or_else(|| eyre!("--abi or ABI_PATH is required for this command"))?;
    let file = File::open(path).wrap_err_with(|| format!("failed to open {}", path.display()))?;
    let abi = Abi::from_reader(BufReader::new(file))
        .wrap_err_with(|| format!("failed to load interface from {}", path.display()))?;
    info!(
        path = %path.display(),
        functions = abi.methods.len(),
        events = abi.events.len(),
        "loaded interface"
    );
    Ok(abi)
}

fn parse_hex(text: &str) -> Result<Vec<u8>> {
    hex::decode(text.trim()).wrap_err_with(|| format!("invalid hex data {text:?}"))
}

fn mutability(method: &Method) -> &str {
    if method.state_mutability.is_empty() {
        match (method.is_constant(), method.is_payable()) {
            (true, _) => "view",
            (_, true) => "payable",
            _ => "nonpayable",
        }
    } else {
        &method.state_mutability
    }
}

fn handle_methods(ctx: &AppContext, args: MethodsArgs) -> Result<()> {
    let abi = load_abi(ctx)?;

    match args.output {
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            table.set_header(vec!["Kind", "Name", "Signature", "Selector / Topic", "Mutability"]);

            if !abi.constructor.inputs.is_empty() {
                table.add_row(vec![
                    "constructor".to_string(),
                    String::new(),
                    abi.constructor.to_string(),
                    String::new(),
                    mutability(&abi.constructor).to_string(),
                ]);
            }
            for (name, method) in &abi.methods {
                table.add_row(vec![
                    "function".to_string(),
                    name.clone(),
                    method.signature.clone(),
                    method.selector.map(hex::encode_prefixed).unwrap_or_default(),
                    mutability(method).to_string(),
                ]);
            }
            for special in abi.fallback.iter().chain(abi.receive.iter()) {
                table.add_row(vec![
                    format!("{:?}", special.kind).to_lowercase(),
                    String::new(),
                    special.to_string(),
                    String::new(),
                    mutability(special).to_string(),
                ]);
            }
            for (name, event) in &abi.events {
                table.add_row(vec![
                    "event".to_string(),
                    name.clone(),
                    event.signature.clone(),
                    event
                        .id
                        .map(hex::encode_prefixed)
                        .unwrap_or_else(|| "anonymous".to_string()),
                    String::new(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Json => {
            let functions: Vec<Json> = abi
                .methods
                .iter()
                .map(|(name, method)| {
                    json!({
                        "name": name,
                        "signature": method.signature,
                        "selector": method.selector.map(hex::encode_prefixed),
                        "stateMutability": mutability(method),
                        "display": method.to_string(),
                    })
                })
                .collect();
            let events: Vec<Json> = abi
                .events
                .iter()
                .map(|(name, event)| {
                    json!({
                        "name": name,
                        "signature": event.signature,
                        "topic": event.id.map(hex::encode_prefixed),
                        "anonymous": event.anonymous,
                        "display": event.to_string(),
                    })
                })
                .collect();
            let output = json!({
                "constructor": abi.constructor.to_string(),
                "functions": functions,
                "events": events,
                "fallback": abi.has_fallback(),
                "receive": abi.has_receive(),
            });
            let json_str =
                serde_json::to_string_pretty(&output).wrap_err("failed to serialize JSON")?;
            println!("{json_str}");
        }
    }
    Ok(())
}

fn handle_selector(args: SelectorArgs) -> Result<()> {
    let method = Method::from_signature(&args.signature)
        .wrap_err_with(|| format!("invalid signature {:?}", args.signature))?;
    let selector = method.selector.ok_or_else(|| eyre!("signature has no selector"))?;

    println!("signature: {}", method.signature);
    println!("selector:  {}", hex::encode_prefixed(selector));
    println!(
        "topic:     {}",
        hex::encode_prefixed(keccak256(method.signature.as_bytes()))
    );
    Ok(())
}

fn handle_encode(ctx: &AppContext, args: EncodeArgs) -> Result<()> {
    let abi = load_abi(ctx)?;
    let inputs = if args.method.is_empty() {
        &abi.constructor.inputs
    } else {
        &abi.method(&args.method)?.inputs
    };

    let json: Json = serde_json::from_str(&args.args).wrap_err("--args is not valid JSON")?;
    let items = json
        .as_array()
        .ok_or_else(|| eyre!("--args must be a JSON array"))?;
    if items.len() != inputs.len() {
        return Err(eyre!(
            "{} takes {} arguments, got {}",
            display_name(&args.method),
            inputs.len(),
            items.len()
        ));
    }

    let values = inputs
        .iter()
        .zip(items)
        .map(|(input, item)| {
            Value::from_json(&input.ty, item)
                .wrap_err_with(|| format!("argument {:?} ({})", input.name, input.ty))
        })
        .collect::<Result<Vec<_>>>()?;

    let data = abi
        .pack(&args.method, &values)
        .wrap_err_with(|| format!("failed to encode {}", display_name(&args.method)))?;
    println!("{}", hex::encode_prefixed(&data));

    info!(method = %display_name(&args.method), bytes = data.len(), "encode command completed");
    Ok(())
}

fn display_name(method: &str) -> &str {
    if method.is_empty() {
        "constructor"
    } else {
        method
    }
}

fn handle_decode(ctx: &AppContext, args: DecodeArgs) -> Result<()> {
    let abi = load_abi(ctx)?;
    let data = parse_hex(&args.data)?;
    // Event log data wins over function outputs, same as the registry.
    let arguments: Vec<&Argument> = match abi.events.get(&args.name) {
        Some(event) => event.inputs.non_indexed().collect(),
        None => abi
            .method(&args.name)
            .wrap_err_with(|| format!("{} is neither a method nor an event", args.name))?
            .outputs
            .iter()
            .collect(),
    };
    let values = abi
        .unpack(&args.name, &data)
        .wrap_err_with(|| format!("failed to decode data for {}", args.name))?;
    print_values(&arguments, &values, args.output)
}

fn handle_decode_call(ctx: &AppContext, args: DecodeCallArgs) -> Result<()> {
    let abi = load_abi(ctx)?;
    let data = parse_hex(&args.data)?;
    let method = abi.method_by_selector(&data)?;
    let values = method
        .inputs
        .unpack(&data[4..])
        .wrap_err_with(|| format!("failed to decode inputs of {}", method.signature))?;

    if let OutputFormat::Table = args.output {
        println!("{method}");
    }
    let arguments: Vec<&Argument> = method.inputs.iter().collect();
    print_values(&arguments, &values, args.output)
}

fn handle_revert(args: RevertArgs) -> Result<()> {
    let data = parse_hex(&args.data)?;
    let reason = unpack_revert(&data).wrap_err("not an Error(string) revert")?;
    println!("{reason}");
    Ok(())
}

fn print_values(arguments: &[&Argument], values: &[Value], output: OutputFormat) -> Result<()> {
    let label = |index: usize| {
        arguments
            .get(index)
            .filter(|arg| !arg.name.is_empty())
            .map(|arg| arg.name.clone())
            .unwrap_or_else(|| format!("arg{index}"))
    };

    match output {
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            table.set_header(vec!["#", "Name", "Type", "Value"]);
            for (index, value) in values.iter().enumerate() {
                let ty = arguments
                    .get(index)
                    .map(|arg| arg.ty.to_string())
                    .unwrap_or_default();
                table.add_row(vec![index.to_string(), label(index), ty, value.to_json().to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Json => {
            let object: serde_json::Map<String, Json> = values
                .iter()
                .enumerate()
                .map(|(index, value)| (label(index), value.to_json()))
                .collect();
            let json_str = serde_json::to_string_pretty(&Json::Object(object))
                .wrap_err("failed to serialize JSON")?;
            println!("{json_str}");
        }
    }
    Ok(())
}
