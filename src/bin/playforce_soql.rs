//! Run one SOQL query against a profile and print the outcome as JSON.
//!
//! ```sh
//! export PLAYFORCE_CONFIG_DIR=~/.playforce/configs
//! RUST_LOG=playforce=debug cargo run --bin playforce-soql -- dev "SELECT * FROM Account"
//! ```
//!
//! Progress goes to stderr. Ctrl-C aborts the query and prints the
//! partial outcome.

use anyhow::{bail, Context};
use futures::StreamExt;
use playforce::{QueryEvent, Session, SessionConfig};
use tracing_subscriber::EnvFilter;

const QUERY_ID: &str = "cli";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(profile), Some(soql)) = (args.next(), args.next()) else {
        bail!("usage: playforce-soql <profile> <soql>");
    };

    let session = Session::create(SessionConfig::from_env())?;
    if !session.select_config(&profile) {
        bail!(
            "profile '{profile}' not found in {} (available: {})",
            session.config().config_dir.display(),
            session.list_configs().join(", ")
        );
    }

    let attempt = session.try_authenticate().await;
    if attempt.needs_oauth {
        let flow = session.start_oauth_flow().await?;
        eprintln!("Open this URL to sign in:\n\n  {}\n", flow.authorization_url);
        session
            .complete_oauth_flow(flow)
            .await
            .context("interactive sign-in failed")?;
    } else if let Some(error) = attempt.error {
        bail!("authentication failed: {error}");
    }

    let mut events = session.query_stream(QUERY_ID, soql);
    let outcome = loop {
        tokio::select! {
            event = events.next() => match event {
                Some(Ok(QueryEvent::Progress(p))) => {
                    eprintln!("page {}: {} of {} records", p.page, p.fetched, p.total_size);
                }
                Some(Ok(QueryEvent::Completed(outcome))) => break outcome,
                Some(Err(e)) => return Err(e.into()),
                None => bail!("query ended without a result"),
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Aborting...");
                session.abort_query(QUERY_ID);
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    session.shutdown();
    Ok(())
}
