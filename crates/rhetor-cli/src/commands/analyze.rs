//! Analyze command implementation.

use crate::cli::AnalyzeArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use rhetor_analyzer::AnalysisService;
use rhetor_domain::{AttemptStore, CompletionProvider};
use std::fmt::Display;
use std::io::{self, Read};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Execute the analyze command.
///
/// Ctrl-C cancels the analysis; the attempt is still recorded as cancelled.
pub async fn execute_analyze<P, S>(
    args: AnalyzeArgs,
    service: &AnalysisService<P, S>,
    formatter: &Formatter,
) -> Result<()>
where
    P: CompletionProvider + Send + Sync + 'static,
    S: AttemptStore,
    S::Error: Display,
{
    let respond = args.respond;
    let text = read_text(args)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, cancelling analysis");
            on_interrupt.cancel();
        }
    });

    let outcome = service.analyze_with_cancel(&text, &cancel).await;
    interrupt.abort();

    let report = outcome?;
    if let Some(storage_error) = &report.storage_error {
        eprintln!(
            "{}",
            formatter.warning(&format!("Analysis was not saved: {}", storage_error))
        );
    }

    println!("{}", formatter.format_report(&report)?);

    if respond {
        match service.respond(&report).await {
            Ok(Some(response)) => println!("{}", formatter.format_response(&response)?),
            Ok(None) => debug!("Nothing to respond to"),
            Err(e) => eprintln!(
                "{}",
                formatter.warning(&format!("Could not write a response: {}", e))
            ),
        }
    }
    Ok(())
}

/// Take the text from the argument or stdin.
fn read_text(args: AnalyzeArgs) -> Result<String> {
    if args.stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else if let Some(text) = args.text {
        Ok(text)
    } else {
        Err(CliError::InvalidInput(
            "Must provide TEXT or --stdin".to_string(),
        ))
    }
}
