//! Stats command implementation.

use crate::cli::StatsArgs;
use crate::error::Result;
use crate::output::Formatter;
use rhetor_analyzer::AttemptStats;
use rhetor_domain::AttemptStore;
use rhetor_store::StoreError;

/// Execute the stats command.
pub fn execute_stats<S>(args: StatsArgs, store: &S, formatter: &Formatter) -> Result<()>
where
    S: AttemptStore<Error = StoreError>,
{
    let attempts = store.list(&args.query.to_query(None))?;
    let stats = AttemptStats::from_attempts(&attempts);

    println!("{}", formatter.format_stats(&stats)?);
    Ok(())
}
