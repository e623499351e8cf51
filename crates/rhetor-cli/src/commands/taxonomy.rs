//! Kinds and explain command implementations.

use crate::cli::ExplainArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use rhetor_domain::FallacyKind;

/// Execute the kinds command.
pub fn execute_kinds(formatter: &Formatter) -> Result<()> {
    println!("{}", formatter.format_kinds()?);
    Ok(())
}

/// Execute the explain command.
pub fn execute_explain(args: ExplainArgs, formatter: &Formatter) -> Result<()> {
    let kind = parse_kind(&args.kind)?;
    println!("{}", formatter.format_explanation(kind)?);
    Ok(())
}

fn parse_kind(name: &str) -> Result<FallacyKind> {
    FallacyKind::parse(name).ok_or_else(|| {
        let known: Vec<&str> = FallacyKind::ALL.iter().map(|k| k.as_str()).collect();
        CliError::InvalidInput(format!(
            "Unknown fallacy kind '{}'. Known kinds: {}",
            name,
            known.join(", ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("Ad Hominem").unwrap(), FallacyKind::AdHominem);
        assert_eq!(parse_kind("slippery-slope").unwrap(), FallacyKind::SlipperySlope);
    }

    #[test]
    fn test_unknown_kind_lists_known() {
        let err = parse_kind("red herring").unwrap_err();
        assert!(err.to_string().contains("bandwagon"));
    }
}
