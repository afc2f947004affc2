//! Passphrase precedence resolution.
//!
//! The certificate engine never touches the environment or the terminal;
//! callers gather the candidate passphrases from their three sources and this
//! pure function picks the winner.

/// Resolve a passphrase from its three competing sources.
///
/// Precedence is explicit value > environment value > interactive prompt;
/// the first non-absent candidate wins. Returns `None` when no source
/// produced a value, in which case private keys are written unencrypted.
pub fn resolve_passphrase(
    explicit: Option<String>,
    environment: Option<String>,
    prompt: Option<String>,
) -> Option<String> {
    explicit.or(environment).or(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn explicit_wins_over_all() {
        assert_eq!(resolve_passphrase(s("A"), s("B"), s("C")), s("A"));
    }

    #[test]
    fn environment_wins_over_prompt() {
        assert_eq!(resolve_passphrase(None, s("B"), s("C")), s("B"));
    }

    #[test]
    fn prompt_is_the_last_resort() {
        assert_eq!(resolve_passphrase(None, None, s("C")), s("C"));
    }

    #[test]
    fn all_absent_yields_none() {
        assert_eq!(resolve_passphrase(None, None, None), None);
    }
}
