use anyhow::{Context, Result, bail};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;

use solaudit_core::ai::{AiClient, Generator};
use solaudit_core::chain::registry::{AuditRegistryReader, RpcRegistry};
use solaudit_core::chain::reports::{self, AuditRecord, ReportFilter};
use solaudit_core::chain::rpc::HttpTransport;
use solaudit_core::chain::wallet::{RpcWallet, WalletEvent, WalletEventKind, WalletProvider};
use solaudit_core::chain::{CHAINS, ChainKey};
use solaudit_core::config::Config;
use solaudit_core::prompt::{TemplateKind, TestFramework};
use solaudit_core::report::model::{AuditReport, ToolInfo};
use solaudit_core::report::render;
use solaudit_core::sanitize::sanitize;
use solaudit_core::session::{AuditSession, SessionState};
use solaudit_core::source::{check_solidity, read_source};
use solaudit_core::{TOOL_NAME, docs, generate};

use crate::args::{Command, DocsFormat, OutputFormat};

pub fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Audit {
            source,
            format,
            out,
        } => audit(config, &source, format, out.as_deref()),
        Command::Sanitize { response, format } => sanitize_file(&response, format),
        Command::Register { source, wallet_url } => register(config, &source, wallet_url),
        Command::Docs {
            source,
            format,
            out,
        } => documentation(config, &source, format, out),
        Command::Tests {
            source,
            framework,
            out,
        } => test_cases(config, &source, framework.into(), out.as_deref()),
        Command::Build {
            template,
            features,
            params,
            out,
        } => build(config, template.into(), features.as_deref(), &params, out.as_deref()),
        Command::Templates => {
            print!("{}", list_templates());
            Ok(())
        }
        Command::Chains { format } => chains(format),
        Command::SwitchNetwork { chain, wallet_url } => switch_network(config, chain, wallet_url),
        Command::Reports {
            search,
            chain,
            min_stars,
            range,
            tx,
            export_dir,
            format,
        } => {
            let filter = ReportFilter {
                search,
                chain,
                min_stars,
                date_range: range.map(Into::into),
            };
            list_reports(config, &filter, tx, export_dir.as_deref(), format)
        }
        Command::Profile {
            auditor,
            wallet_url,
            format,
        } => profile(config, auditor, wallet_url, format),
    }
}

fn make_client(config: &Config) -> Result<AiClient> {
    Ok(AiClient::from_config(config.ai_config(), config.api_key())?)
}

fn make_wallet(config: &Config, url: Option<String>) -> RpcWallet<HttpTransport> {
    let url = url.unwrap_or_else(|| config.wallet_url().to_string());
    let wallet = RpcWallet::new(HttpTransport::new(url, config.rpc_timeout_secs())).with_polling(
        Duration::from_secs(config.receipt_poll_secs()),
        config.wallet.max_receipt_polls,
    );
    wallet.on(
        WalletEventKind::ChainChanged,
        Box::new(|event: &WalletEvent| {
            if let WalletEvent::ChainChanged(chain_id) = event {
                eprintln!("Network changed to {chain_id}");
            }
        }),
    );
    wallet
}

fn load_session(config: &Config) -> Result<AuditSession> {
    let state = match config.state_path() {
        Some(path) => SessionState::load(&path)?,
        None => SessionState::default(),
    };
    Ok(AuditSession::new(state, config.cooldown_secs()))
}

fn save_session(config: &Config, session: &AuditSession) -> Result<()> {
    if let Some(path) = config.state_path() {
        session.state().save(&path)?;
    }
    Ok(())
}

fn emit(output: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, output)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{output}"),
    }
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn audit(config: &Config, path: &Path, format: OutputFormat, out: Option<&Path>) -> Result<()> {
    let source = read_source(path)?;
    check_solidity(&source.code)?;

    let mut session = load_session(config)?;
    let client = make_client(config)?;
    let outcome = session.analyze(&client, &source, Utc::now())?.outcome.clone();
    save_session(config, &session)?;

    let report = AuditReport::new(
        ToolInfo {
            name: TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            model: client.model_name().map(str::to_string),
        },
        source.source_info(),
        outcome.result,
        outcome.policy,
    );

    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Text => render::render_text(&report),
    };
    emit(&output, out)
}

fn sanitize_file(path: &Path, format: OutputFormat) -> Result<()> {
    let outcome = sanitize(&read_text(path)?)?;
    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&outcome)?,
        OutputFormat::Text => render::render_result(&outcome.result, &outcome.policy),
    };
    emit(&output, None)
}

fn register(config: &Config, path: &Path, wallet_url: Option<String>) -> Result<()> {
    let source = read_source(path)?;
    let mut session = load_session(config)?;
    let wallet = make_wallet(config, wallet_url);

    let registered = session.register(&wallet, &source);
    save_session(config, &session)?;
    let info = registered?;

    println!("Registered on {} ({})", info.chain, info.chain_id);
    println!("Transaction: {}", info.transaction_hash);
    println!("Explorer: {}", info.explorer_url);
    Ok(())
}

fn documentation(
    config: &Config,
    path: &Path,
    format: DocsFormat,
    out: Option<PathBuf>,
) -> Result<()> {
    let code = read_text(path)?;
    let client = make_client(config)?;
    let documentation = generate::generate_documentation(&client, &code)?;

    let output = match format {
        DocsFormat::Markdown => docs::render_markdown(&documentation),
        DocsFormat::Json => serde_json::to_string_pretty(&documentation)?,
    };
    let out = out.map(|p| {
        if p.is_dir() {
            p.join(docs::export_file_name(&documentation))
        } else {
            p
        }
    });
    emit(&output, out.as_deref())
}

fn test_cases(
    config: &Config,
    path: &Path,
    framework: TestFramework,
    out: Option<&Path>,
) -> Result<()> {
    let code = read_text(path)?;
    let client = make_client(config)?;
    let generated = generate::generate_tests(&client, &code, framework)?;
    if out.is_none() {
        eprintln!("{} (suggested extension: .{})", framework.name(), framework.extension());
    }
    emit(&format!("{generated}\n"), out)
}

fn build(
    config: &Config,
    kind: TemplateKind,
    features: Option<&str>,
    params: &[(String, String)],
    out: Option<&Path>,
) -> Result<()> {
    let template = kind.template();
    let params = template.params_with(params);
    let client = make_client(config)?;

    let draft = generate::build_contract(&client, &template, features, &params)?;
    if let Some(e) = &draft.failure {
        eprintln!("Generation failed ({e}); using the {} base code", template.name);
    }
    emit(&format!("{}\n", draft.code), out)
}

fn list_templates() -> String {
    let mut out = String::new();
    for kind in TemplateKind::ALL {
        let template = kind.template();
        out.push_str(&format!("{}\n  {}\n", template.name, template.description));
        out.push_str(&format!("  Features: {}\n", template.features.join(", ")));
        let params = template.default_params();
        if !params.is_empty() {
            let defaults: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            out.push_str(&format!("  Defaults: {}\n", defaults.join(", ")));
        }
    }
    out
}

fn chains(format: OutputFormat) -> Result<()> {
    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&CHAINS)?,
        OutputFormat::Text => {
            let mut out = String::new();
            for chain in &CHAINS {
                out.push_str(&format!(
                    "{:<18} {:<10} {:<18} {:<5} {}\n",
                    chain.key.as_str(),
                    chain.chain_id,
                    chain.chain_name,
                    chain.native_currency.symbol,
                    chain.registry_address
                ));
            }
            out
        }
    };
    emit(&output, None)
}

fn switch_network(config: &Config, chain: ChainKey, wallet_url: Option<String>) -> Result<()> {
    let wallet = make_wallet(config, wallet_url);
    wallet.switch_chain(chain.config())?;
    println!("Switched to {} ({})", chain.config().chain_name, chain.config().chain_id);
    Ok(())
}

fn fetch_records(config: &Config, lookup_tx: bool) -> Vec<AuditRecord> {
    let registries: Vec<(ChainKey, RpcRegistry<HttpTransport>)> = ChainKey::ALL
        .into_iter()
        .map(|key| (key, RpcRegistry::public(key, config.rpc_timeout_secs())))
        .collect();
    let readers: Vec<(ChainKey, &dyn AuditRegistryReader)> = registries
        .iter()
        .map(|(key, registry)| (*key, registry as &dyn AuditRegistryReader))
        .collect();
    reports::collect_records(&readers, config.page_size(), lookup_tx)
}

fn record_line(record: &AuditRecord) -> String {
    let date = record
        .audited_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    let mut line = format!(
        "{} {} {}/5 {:<18} {} {}",
        date,
        record.contract_hash,
        record.stars,
        record.chain_name,
        record.auditor,
        record.summary
    );
    if let Some(url) = record.explorer_url() {
        line.push_str(&format!("\n    {url}"));
    }
    line
}

fn list_reports(
    config: &Config,
    filter: &ReportFilter,
    lookup_tx: bool,
    export_dir: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let records = fetch_records(config, lookup_tx);
    let now = Utc::now();
    let hits = filter.apply(&records, now);
    tracing::debug!(records = records.len(), hits = hits.len(), ?filter, "reports filtered");

    if let Some(dir) = export_dir {
        if !dir.is_dir() {
            bail!("export directory does not exist: {}", dir.display());
        }
        for record in &hits {
            let export = reports::export_record(record, now);
            let path = dir.join(reports::export_file_name(record));
            std::fs::write(&path, serde_json::to_string_pretty(&export)?)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        eprintln!("Exported {} audits to {}", hits.len(), dir.display());
    }

    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&hits)?,
        OutputFormat::Text => {
            let mut out = format!("{} of {} audits\n", hits.len(), records.len());
            for record in &hits {
                out.push_str(&record_line(record));
                out.push('\n');
            }
            out
        }
    };
    emit(&output, None)
}

fn profile(
    config: &Config,
    auditor: Option<String>,
    wallet_url: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let auditor = match auditor {
        Some(address) => address,
        None => make_wallet(config, wallet_url).connect()?,
    };
    let records = fetch_records(config, false);
    let stats = reports::auditor_stats(&records, &auditor);
    tracing::debug!(%auditor, audits = stats.total_audits, "profile built");

    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&stats)?,
        OutputFormat::Text => {
            let mut out = format!(
                "Auditor: {}\nTotal audits: {}\nAverage rating: {:.1}\n",
                stats.auditor, stats.total_audits, stats.average_stars
            );
            for (chain, count) in &stats.chain_breakdown {
                out.push_str(&format!("  {}: {count}\n", chain.config().chain_name));
            }
            if !stats.recent_audits.is_empty() {
                out.push_str("Recent audits:\n");
                for record in &stats.recent_audits {
                    out.push_str(&format!("  {}\n", record_line(record)));
                }
            }
            out
        }
    };
    emit(&output, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_listing_shows_defaults() {
        let listing = list_templates();
        assert!(listing.contains("ERC20 Token"));
        assert!(listing.contains("symbol=MTK"));
        assert!(listing.contains("Custom Contract"));
    }
}
