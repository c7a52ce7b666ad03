use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

/// Default directive when `RUST_LOG` is unset: our own spans at info,
/// dependency noise (reqwest, hyper) at warn.
const DEFAULT_DIRECTIVES: &str = "warn,docuvid=info";

/// Logs go to stderr so command output on stdout stays parseable.
pub fn init() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_DIRECTIVES))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("install tracing subscriber: {err}"))?;

    Ok(())
}
