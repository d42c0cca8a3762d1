//! sp-odata CLI
//!
//! Command-line interface for composing OData URLs, normalizing responses
//! and calling SharePoint REST and ProcessQuery endpoints.

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use sp_odata::{
    compose_url, normalize, normalize_collection, normalize_entity, Normalized, ODataMods,
    RequestConfig, ReqwestTransport, SpClient, Verb, Verbosity,
};

#[derive(Parser)]
#[command(name = "sp-odata")]
#[command(about = "Compose OData queries and normalize SharePoint REST responses")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an endpoint URL with OData modifiers applied
    Url {
        /// Base endpoint URL
        base: String,

        #[command(flatten)]
        modifiers: ModifierArgs,
    },

    /// Normalize a response body to canonical JSON
    Normalize {
        /// Response file, or "-" for stdin
        input: String,

        /// Require a collection and print its items as an array
        #[arg(long, conflicts_with = "entity")]
        collection: bool,

        /// Require a single entity
        #[arg(long, conflicts_with = "collection")]
        entity: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// GET an endpoint and print the response body
    Get {
        /// Endpoint URL
        endpoint: String,

        #[command(flatten)]
        modifiers: ModifierArgs,

        #[command(flatten)]
        request: RequestArgs,

        /// Normalize the body before printing
        #[arg(long)]
        normalize: bool,
    },

    /// POST a CSOM request body to the site's ProcessQuery endpoint
    ProcessQuery {
        /// Any URL under the site (the ProcessQuery endpoint is derived from it)
        endpoint: String,

        /// CSOM XML body file, or "-" for stdin
        body: String,

        #[command(flatten)]
        request: RequestArgs,
    },
}

#[derive(Args)]
struct ModifierArgs {
    /// Fields to select (repeatable, comma-separated)
    #[arg(long)]
    select: Vec<String>,

    /// Navigation properties to expand (repeatable, comma-separated)
    #[arg(long)]
    expand: Vec<String>,

    /// Filter expression
    #[arg(long)]
    filter: Option<String>,

    /// Maximum number of items
    #[arg(long)]
    top: Option<usize>,

    /// Field to order by
    #[arg(long)]
    orderby: Option<String>,

    /// Order descending (with --orderby)
    #[arg(long, requires = "orderby")]
    desc: bool,

    /// Number of items to skip
    #[arg(long)]
    skip: Option<usize>,

    /// Paging token
    #[arg(long)]
    skiptoken: Option<String>,
}

impl ModifierArgs {
    fn to_mods(&self) -> ODataMods {
        let mut mods = ODataMods::new();
        for fields in &self.select {
            mods.add_select(fields);
        }
        for fields in &self.expand {
            mods.add_expand(fields);
        }
        if let Some(filter) = &self.filter {
            mods.add_filter(filter);
        }
        if let Some(top) = self.top {
            mods.add_top(top);
        }
        if let Some(field) = &self.orderby {
            mods.add_order_by(field, !self.desc);
        }
        if let Some(skip) = self.skip {
            mods.add_skip(skip);
        }
        if let Some(token) = &self.skiptoken {
            mods.add_skip_token(token);
        }
        mods
    }
}

#[derive(Args)]
struct RequestArgs {
    /// Metadata verbosity: verbose, minimalmetadata or nometadata
    #[arg(long)]
    preset: Option<Verbosity>,

    /// Extra header as "Name: value" (repeatable)
    #[arg(long = "header", short = 'H')]
    headers: Vec<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

impl RequestArgs {
    fn to_config(&self) -> Result<RequestConfig, u8> {
        let mut config = match self.preset {
            Some(verbosity) => verbosity.preset().clone(),
            None => RequestConfig::new(),
        };
        for raw in &self.headers {
            let Some((name, value)) = raw.split_once(':') else {
                eprintln!("Error: invalid header '{}': expected \"Name: value\"", raw);
                return Err(2);
            };
            config = config.header(name.trim(), value.trim());
        }
        Ok(config)
    }

    fn client(&self) -> Result<SpClient<ReqwestTransport>, u8> {
        let transport =
            ReqwestTransport::with_timeout(Duration::from_secs(self.timeout)).map_err(|e| {
                eprintln!("Error: {}", e);
                3u8
            })?;
        Ok(SpClient::new(transport))
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Url { base, modifiers } => {
            println!("{}", compose_url(&base, &modifiers.to_mods()));
            Ok(())
        }

        Commands::Normalize {
            input,
            collection,
            entity,
            pretty,
        } => run_normalize(&input, collection, entity, pretty),

        Commands::Get {
            endpoint,
            modifiers,
            request,
            normalize,
        } => run_get(&endpoint, &modifiers.to_mods(), &request, normalize),

        Commands::ProcessQuery {
            endpoint,
            body,
            request,
        } => run_process_query(&endpoint, &body, &request),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_normalize(input: &str, collection: bool, entity: bool, pretty: bool) -> Result<(), u8> {
    let payload = read_input(input)?;

    let canonical = if collection {
        normalize_collection(&payload).map(|items| Normalized::Collection(items).to_bytes())
    } else if entity {
        normalize_entity(&payload)
    } else {
        normalize(&payload).map(|normalized| normalized.to_bytes())
    }
    .map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    print_json(&canonical, pretty)
}

fn run_get(
    endpoint: &str,
    mods: &ODataMods,
    args: &RequestArgs,
    normalize_body: bool,
) -> Result<(), u8> {
    let config = args.to_config()?;
    let client = args.client()?;
    let url = compose_url(endpoint, mods);

    let response = client
        .execute(Verb::Get, &url, None, Some(&config))
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    if normalize_body {
        let canonical = normalize(&response.body)
            .map(|normalized| normalized.to_bytes())
            .map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            })?;
        print_json(&canonical, false)?;
    } else {
        println!("{}", String::from_utf8_lossy(&response.body));
    }

    if response.is_success() {
        Ok(())
    } else {
        eprintln!("Error: HTTP status {}", response.status);
        Err(1)
    }
}

fn run_process_query(endpoint: &str, body_source: &str, args: &RequestArgs) -> Result<(), u8> {
    let body = read_input(body_source)?;
    let body = String::from_utf8(body).map_err(|e| {
        eprintln!("Error: request body is not UTF-8: {}", e);
        2u8
    })?;
    let config = args.to_config()?;
    let client = args.client()?;

    let reply = client
        .process_query(endpoint, body, Some(&config))
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    let output = serde_json::to_string(&reply.results).map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    println!("{}", output);
    Ok(())
}

/// Read a file, or stdin for "-".
fn read_input(source: &str) -> Result<Vec<u8>, u8> {
    if source == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf).map_err(|e| {
            eprintln!("Error reading stdin: {}", e);
            3u8
        })?;
        return Ok(buf);
    }
    std::fs::read(Path::new(source)).map_err(|e| {
        eprintln!("Error reading {}: {}", source, e);
        3u8
    })
}

fn print_json(canonical: &[u8], pretty: bool) -> Result<(), u8> {
    if !pretty {
        println!("{}", String::from_utf8_lossy(canonical));
        return Ok(());
    }
    let value: serde_json::Value = serde_json::from_slice(canonical).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;
    let output = serde_json::to_string_pretty(&value).map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    println!("{}", output);
    Ok(())
}
