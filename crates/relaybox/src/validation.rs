//! Required-argument checks shared by the facade and service clients

use relaybox_security::{Error, Result};

/// Fail with a single `ValidationError` naming every absent argument, in order.
///
/// Each entry pairs an argument name with whether it was supplied.
///
/// # Errors
///
/// Returns `Missing required arguments: a, b` when any entry is absent.
pub(crate) fn require_params<'a, I>(params: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, bool)>,
{
    let missing: Vec<&str> = params
        .into_iter()
        .filter_map(|(name, present)| (!present).then_some(name))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "Missing required arguments: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_present() {
        assert!(require_params([("roomId", true), ("event", true)]).is_ok());
    }

    #[test]
    fn test_lists_missing_in_order() {
        let err = require_params([("roomId", false), ("event", true), ("data", false)])
            .unwrap_err();
        assert_eq!(err.message, "Missing required arguments: roomId, data");
    }
}
