//! Show command implementation.

use crate::cli::ShowArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use rhetor_domain::{AttemptId, AttemptStore};
use rhetor_store::StoreError;

/// Execute the show command.
pub fn execute_show<S>(args: ShowArgs, store: &S, formatter: &Formatter) -> Result<()>
where
    S: AttemptStore<Error = StoreError>,
{
    let id = AttemptId::from_string(args.id.trim()).map_err(CliError::InvalidInput)?;

    let attempt = store
        .get(id)?
        .ok_or_else(|| CliError::NotFound(format!("attempt {}", id)))?;

    println!("{}", formatter.format_attempt(&attempt)?);
    Ok(())
}
