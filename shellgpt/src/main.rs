use std::process::ExitCode;

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use shellgpt::sgchat::{
    DEFAULT_CHAT_MODEL, DEFAULT_MAX_SEARCH_RESULTS, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
use shellgpt::sgprovider::OpenAiHttpTransport;
use shellgpt::sgsearch::{SearchApiProvider, SearchProvider};
use shellgpt::{
    ChatConfig, ChatError, ChatRuntimeOptions, ConfigManager, KeyStatus, StdoutSink,
    build_chat_runtime, http_client, openai_key_status, resolve_openai_api_key, run_interactive,
    search_key_status,
};
use tokio::io::{AsyncBufRead, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shellgpt")]
#[command(about = "A ChatGPT gateway for the terminal with streaming answers and web search")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Model to use
    #[arg(short, long, global = true, default_value = DEFAULT_CHAT_MODEL)]
    model: String,

    /// Sampling temperature (0-2)
    #[arg(short, long, global = true, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Maximum tokens per response
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    /// Disable web search
    #[arg(long, global = true)]
    no_search: bool,

    /// Log tool calls and API traffic to stderr
    #[arg(long, global = true)]
    debug: bool,

    /// OpenAI-compatible API base URL
    #[arg(long, global = true, hide = true)]
    openai_base_url: Option<String>,

    /// SearchAPI base URL
    #[arg(long, global = true, hide = true)]
    searchapi_base_url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat session
    Chat,
    /// Send a single message
    Send {
        /// The message to send
        message: String,
    },
    /// Manage configuration
    Config(ConfigArgs),
    /// Test web search
    Search {
        /// Search query to test
        #[arg(default_value = "test")]
        query: String,
    },
}

#[derive(Args)]
#[group(multiple = false)]
struct ConfigArgs {
    /// Show current configuration
    #[arg(long)]
    show: bool,

    /// Delete the saved configuration
    #[arg(long)]
    clear: bool,

    /// Remove only the SearchAPI key
    #[arg(long)]
    clear_search: bool,

    /// Save an OpenAI API key
    #[arg(long, value_name = "KEY")]
    set_api_key: Option<String>,

    /// Save a SearchAPI key
    #[arg(long, value_name = "KEY")]
    set_search_key: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let default = if debug {
        "warn,shellgpt=debug,sgchat=debug,sgprovider=debug,sgsearch=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(debug)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let manager = ConfigManager::new()?;
    let mut stdin = BufReader::new(tokio::io::stdin());

    match &cli.command {
        None | Some(Command::Chat) => {
            let options = runtime_options(&cli, &manager, &mut stdin).await?;
            let mut runtime = build_chat_runtime(options).map_err(chat_error)?;
            run_interactive(&mut runtime, stdin, cli.debug).await
        }
        Some(Command::Send { message }) => {
            let options = runtime_options(&cli, &manager, &mut stdin).await?;
            let mut runtime = build_chat_runtime(options).map_err(chat_error)?;
            let mut sink = StdoutSink::stdio(cli.debug);
            runtime
                .service
                .run_turn(&mut runtime.session, message, &mut sink)
                .await
                .map_err(chat_error)?;
            Ok(())
        }
        Some(Command::Config(args)) => configure(&cli, &manager, args).await,
        Some(Command::Search { query }) => test_search(&cli, &manager, query).await,
    }
}

async fn runtime_options<R>(
    cli: &Cli,
    manager: &ConfigManager,
    stdin: &mut R,
) -> Result<ChatRuntimeOptions>
where
    R: AsyncBufRead + Unpin,
{
    let mut console = std::io::stdout();
    let api_key =
        resolve_openai_api_key(manager, &openai_transport(cli)?, stdin, &mut console).await?;

    let config = ChatConfig::default()
        .with_model(cli.model.clone())
        .with_temperature(cli.temperature)
        .with_max_tokens(cli.max_tokens)
        .with_web_search(!cli.no_search);

    let mut options = ChatRuntimeOptions::new(config).with_openai_api_key(api_key);
    if let Some(search_key) = manager.load_search_api_key()? {
        options = options.with_search_api_key(search_key);
    }
    if let Some(base_url) = &cli.openai_base_url {
        options = options.with_openai_base_url(base_url.clone());
    }
    if let Some(base_url) = &cli.searchapi_base_url {
        options = options.with_searchapi_base_url(base_url.clone());
    }
    Ok(options)
}

async fn configure(cli: &Cli, manager: &ConfigManager, args: &ConfigArgs) -> Result<()> {
    if args.show {
        let openai = openai_key_status(manager, &openai_transport(cli)?).await?;
        let search = search_key_status(search_provider(cli, manager)?.as_ref()).await;
        println!("OpenAI API key: {openai}");
        println!("SearchAPI key: {search}");
        println!("Config directory: {}", manager.config_dir().display());
    } else if args.clear {
        if manager.clear()? {
            println!("Configuration cleared");
        } else {
            println!("No configuration file found");
        }
    } else if args.clear_search {
        if manager.clear_search()? {
            println!("SearchAPI configuration cleared");
        } else {
            println!("No configuration file found");
        }
    } else if let Some(api_key) = &args.set_api_key {
        manager.save_api_key(api_key)?;
        println!("OpenAI API key saved");
    } else if let Some(search_key) = &args.set_search_key {
        manager.save_search_api_key(search_key)?;
        println!("SearchAPI key saved");
    } else {
        println!(
            "Use --show to view configuration, --clear to remove all config, or --clear-search to remove only search config"
        );
    }
    Ok(())
}

async fn test_search(cli: &Cli, manager: &ConfigManager, query: &str) -> Result<()> {
    println!("Testing web search with query: \"{query}\"");

    let Some(search) = search_provider(cli, manager)? else {
        println!("No SearchAPI key configured");
        println!("Set SEARCHAPI_API_KEY or run `shellgpt config --set-search-key <KEY>`");
        return Ok(());
    };

    match search_key_status(Some(&search)).await {
        KeyStatus::Valid => {}
        status => return Err(anyhow!("No valid SearchAPI configuration: key is {status}")),
    }

    let results = search
        .search(query, DEFAULT_MAX_SEARCH_RESULTS)
        .await
        .map_err(|error| anyhow!("web search test failed: {}", error.message))?;
    if results.is_empty() {
        println!("No results for \"{query}\"");
    }
    for result in &results {
        println!(
            "- {} {}",
            result.title.as_deref().unwrap_or("(untitled)"),
            result.url.as_deref().unwrap_or_default()
        );
    }
    println!("Web search is working");
    Ok(())
}

fn openai_transport(cli: &Cli) -> Result<OpenAiHttpTransport> {
    let http = http_client(shellgpt::runtime::DEFAULT_HTTP_TIMEOUT).map_err(chat_error)?;
    let transport = OpenAiHttpTransport::new(http);
    Ok(match &cli.openai_base_url {
        Some(base_url) => transport.with_base_url(base_url.clone()),
        None => transport,
    })
}

fn search_provider(cli: &Cli, manager: &ConfigManager) -> Result<Option<SearchApiProvider>> {
    let Some(search_key) = manager.load_search_api_key()? else {
        return Ok(None);
    };

    let http = http_client(shellgpt::runtime::DEFAULT_HTTP_TIMEOUT).map_err(chat_error)?;
    let search = SearchApiProvider::new(http, search_key).map_err(|error| anyhow!(error.message))?;
    Ok(Some(match &cli.searchapi_base_url {
        Some(base_url) => search.with_base_url(base_url.clone()),
        None => search,
    }))
}

fn chat_error(error: ChatError) -> anyhow::Error {
    anyhow!(error.message)
}
