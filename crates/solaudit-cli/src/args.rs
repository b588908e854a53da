use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use solaudit_core::ai::LlmBackend;
use solaudit_core::chain::ChainKey;
use solaudit_core::chain::reports::DateRange;
use solaudit_core::prompt::{TemplateKind, TestFramework};

#[derive(Debug, Parser)]
#[command(
    name = "solaudit",
    version,
    about = "AI-assisted Solidity audits with an on-chain audit registry"
)]
pub struct Args {
    /// Config file (defaults to ~/.config/solaudit/config.toml)
    #[arg(long, global = true, env = "SOLAUDIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Generation backend
    #[arg(long, global = true)]
    pub backend: Option<Backend>,

    /// Model name, overriding the backend default
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Audit a Solidity contract
    Audit {
        /// Path to the .sol source
        source: PathBuf,

        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Write the report to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Sanitize a saved model response without calling the service
    Sanitize {
        /// File holding the raw model text
        response: PathBuf,

        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Register the last audit of SOURCE on the wallet's current network
    Register {
        source: PathBuf,

        /// Wallet JSON-RPC endpoint
        #[arg(long)]
        wallet_url: Option<String>,
    },

    /// Generate Markdown documentation for a contract
    Docs {
        source: PathBuf,

        #[arg(long, default_value = "markdown")]
        format: DocsFormat,

        /// Output file, or a directory to write `<name>-documentation.md` into
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Generate test cases for a contract
    Tests {
        source: PathBuf,

        #[arg(long, default_value = "hardhat")]
        framework: Framework,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Generate a contract from a template
    Build {
        #[arg(long, default_value = "erc20")]
        template: Template,

        /// Extra features to ask for, in plain words
        #[arg(long)]
        features: Option<String>,

        /// Template parameter, e.g. --param symbol=ABC
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List contract templates
    Templates,

    /// List supported networks
    Chains {
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Switch the wallet to a supported network
    SwitchNetwork {
        #[arg(value_parser = parse_chain)]
        chain: ChainKey,

        #[arg(long)]
        wallet_url: Option<String>,
    },

    /// List registered audits across all networks
    Reports {
        /// Case-insensitive match on contract hash or auditor
        #[arg(long)]
        search: Option<String>,

        #[arg(long, value_parser = parse_chain)]
        chain: Option<ChainKey>,

        #[arg(long)]
        min_stars: Option<u8>,

        #[arg(long)]
        range: Option<Range>,

        /// Look up the registration transaction of each audit
        #[arg(long)]
        tx: bool,

        /// Write one JSON export per listed audit into this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,

        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show an auditor's registered audits
    Profile {
        /// Auditor address (defaults to the connected wallet account)
        auditor: Option<String>,

        #[arg(long)]
        wallet_url: Option<String>,

        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DocsFormat {
    Markdown,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    Gemini,
    Openai,
    Ollama,
}

impl From<Backend> for LlmBackend {
    fn from(value: Backend) -> Self {
        match value {
            Backend::Gemini => LlmBackend::Gemini,
            Backend::Openai => LlmBackend::OpenAi,
            Backend::Ollama => LlmBackend::Ollama,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Framework {
    Hardhat,
    Foundry,
    Remix,
}

impl From<Framework> for TestFramework {
    fn from(value: Framework) -> Self {
        match value {
            Framework::Hardhat => TestFramework::Hardhat,
            Framework::Foundry => TestFramework::Foundry,
            Framework::Remix => TestFramework::Remix,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Template {
    Erc20,
    Nft,
    Custom,
}

impl From<Template> for TemplateKind {
    fn from(value: Template) -> Self {
        match value {
            Template::Erc20 => TemplateKind::Erc20,
            Template::Nft => TemplateKind::Nft,
            Template::Custom => TemplateKind::Custom,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Range {
    Day,
    Week,
    Month,
}

impl From<Range> for DateRange {
    fn from(value: Range) -> Self {
        match value {
            Range::Day => DateRange::Day,
            Range::Week => DateRange::Week,
            Range::Month => DateRange::Month,
        }
    }
}

fn parse_chain(s: &str) -> Result<ChainKey, String> {
    s.parse::<ChainKey>().map_err(|e| {
        let known: Vec<&str> = ChainKey::ALL.iter().map(|k| k.as_str()).collect();
        format!("{e} (expected one of: {})", known.join(", "))
    })
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    if key.trim().is_empty() {
        return Err(format!("empty parameter name in `{s}`"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}
