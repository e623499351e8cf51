//! History command implementation.

use crate::cli::HistoryArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use rhetor_domain::AttemptStore;
use rhetor_store::StoreError;

/// Execute the history command.
pub fn execute_history<S>(args: HistoryArgs, store: &S, formatter: &Formatter) -> Result<()>
where
    S: AttemptStore<Error = StoreError>,
{
    if let (Some(since), Some(until)) = (args.query.since, args.query.until) {
        if since > until {
            return Err(CliError::InvalidInput(
                "--since must not be later than --until".to_string(),
            ));
        }
    }

    let attempts = store.list(&args.query.to_query(Some(args.limit)))?;
    println!("{}", formatter.format_attempts(&attempts)?);

    Ok(())
}
