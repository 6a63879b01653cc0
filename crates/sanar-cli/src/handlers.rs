//! Command handlers

use crate::commands::{FmtArgs, ShowArgs};
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use sanar::LocatorStore;

/// Print the entries of a locator table.
pub fn run_show(reporter: &Reporter, args: &ShowArgs) -> CliResult<()> {
    let store = LocatorStore::load(&args.file)?;
    reporter.summary(format!(
        "{} ({} entries)",
        args.file.display(),
        store.len()
    ));
    for entry in &store {
        reporter.entry(&entry.name, &entry.selector);
    }
    Ok(())
}

/// Rewrite (or verify) a locator table through the canonical codec.
pub fn run_fmt(reporter: &Reporter, args: &FmtArgs) -> CliResult<()> {
    let original = std::fs::read_to_string(&args.file)?;
    let store = LocatorStore::parse(&original)?;
    let canonical = store.to_csv();

    if original == canonical {
        reporter.line(format!("{} already canonical", args.file.display()));
        return Ok(());
    }
    if args.check {
        return Err(CliError::FormatCheck {
            file: args.file.display().to_string(),
        });
    }
    std::fs::write(&args.file, canonical)?;
    reporter.line(format!("{} rewritten", args.file.display()));
    Ok(())
}

#[cfg(feature = "browser")]
pub use browser::{run_check, run_heal};

#[cfg(feature = "browser")]
mod browser {
    use super::{CliError, CliResult, Reporter};
    use crate::commands::{CheckArgs, HealArgs};
    use sanar::{CdpProbe, CdpProbeConfig, LocatorStore, ProbeOptions, Resolver, SanarError};
    use std::time::Duration;

    fn runtime() -> CliResult<tokio::runtime::Runtime> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Io)
    }

    fn probe_config(timeout_ms: u64, headed: bool, no_sandbox: bool) -> CdpProbeConfig {
        let mut config = CdpProbeConfig::default()
            .with_headless(!headed)
            .with_options(ProbeOptions::default().with_timeout(Duration::from_millis(timeout_ms)));
        if no_sandbox {
            config = config.with_no_sandbox();
        }
        config
    }

    /// Verify every entry of a table against a live page.
    pub fn run_check(reporter: &Reporter, args: &CheckArgs) -> CliResult<()> {
        let resolver = Resolver::new(LocatorStore::load(&args.file)?);
        let names: Vec<String> = resolver.store().names().iter().map(|n| (*n).to_string()).collect();
        let rt = runtime()?;

        let stale = rt.block_on(async {
            let probe =
                CdpProbe::launch(probe_config(args.timeout_ms, args.headed, args.no_sandbox))
                    .await?;
            probe.goto(&args.url).await?;

            let mut stale = 0usize;
            for name in &names {
                match resolver.verify_stored(&probe, name).await {
                    Ok(()) => {
                        reporter.ok(name, resolver.store().get(name).unwrap_or_default());
                    }
                    Err(SanarError::Verification { selector }) => {
                        reporter.stale(name, &selector);
                        stale += 1;
                    }
                    Err(e) => return Err(CliError::from(e)),
                }
            }
            probe.close().await?;
            Ok::<_, CliError>(stale)
        })?;

        reporter.summary(format!(
            "{}: {} of {} entries verified",
            args.file.display(),
            names.len() - stale,
            names.len()
        ));
        if stale > 0 {
            return Err(CliError::StaleLocators {
                count: stale,
                file: args.file.display().to_string(),
            });
        }
        Ok(())
    }

    /// Heal stale entries of a table against a live page.
    pub fn run_heal(reporter: &Reporter, args: &HealArgs) -> CliResult<()> {
        #[cfg(not(feature = "llm"))]
        {
            let _ = (reporter, args);
            Err(CliError::config(
                "healing requires the 'llm' feature; rebuild with --features llm",
            ))
        }

        #[cfg(feature = "llm")]
        {
            use sanar::{LlmSuggester, Settings, SuggesterConfig};
            use std::sync::Arc;
            use tracing::info;

            let settings = match &args.config {
                Some(path) => Settings::load(path)?,
                None => Settings::default(),
            };

            let endpoint = args
                .endpoint
                .as_deref()
                .or_else(|| settings.suggest_endpoint())
                .ok_or_else(|| {
                    CliError::config(
                        "no suggestion endpoint: pass --endpoint or set suggest_endpoint",
                    )
                })?
                .to_string();
            let model = args
                .model
                .as_deref()
                .unwrap_or_else(|| settings.suggest_model())
                .to_string();

            let mut config = SuggesterConfig::new(endpoint, model);
            if let Some(key) = settings.suggest_api_key() {
                config = config.with_api_key(key);
            }
            let suggester = Arc::new(LlmSuggester::new(config)?);

            let names: Vec<String> = {
                let store = LocatorStore::load(&args.file)?;
                store.names().iter().map(|n| (*n).to_string()).collect()
            };

            let rt = runtime()?;
            let (healed, failed) = rt.block_on(async {
                let probe =
                    CdpProbe::launch(probe_config(args.timeout_ms, args.headed, args.no_sandbox))
                        .await?;
                probe.goto(&args.url).await?;

                let mut resolver =
                    Resolver::new(LocatorStore::load(&args.file)?).with_suggester(suggester);
                let mut healed = 0usize;
                let mut failed = 0usize;

                for name in &names {
                    let old = resolver
                        .store()
                        .get(name)
                        .unwrap_or_default()
                        .to_string();
                    match resolver.resolve(&probe, name).await {
                        Ok(res) if res.healed => {
                            reporter.healed(name, &old, &res.selector);
                            healed += 1;
                        }
                        Ok(res) => reporter.ok(name, &res.selector),
                        Err(e) => {
                            info!(element = %name, error = %e, "entry not healed");
                            reporter.stale(name, &old);
                            failed += 1;
                        }
                    }
                }
                probe.close().await?;
                Ok::<_, CliError>((healed, failed))
            })?;

            reporter.summary(format!(
                "{}: {healed} healed, {failed} unresolvable",
                args.file.display()
            ));
            if failed > 0 {
                return Err(CliError::StaleLocators {
                    count: failed,
                    file: args.file.display().to_string(),
                });
            }
            Ok(())
        }
    }
}
