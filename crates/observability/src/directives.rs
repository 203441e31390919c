//! Per-scope log level directives.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::Level;
use tracing::level_filters::LevelFilter;

use crate::LogError;

/// Level applied to targets no directive matches, unless the string sets one.
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::INFO;

/// Parsed log directives: a default level plus per-scope overrides.
///
/// Directive strings are comma-separated tokens. `scope=level` sets the level for
/// every target starting with `scope`, a bare `level` sets the default:
///
/// ```
/// # use ant_observability::LogDirectiveSet;
/// # use tracing::level_filters::LevelFilter;
/// let set: LogDirectiveSet = "warn,ant_net=debug,libp2p=off".parse().unwrap();
/// assert_eq!(set.level_for("ant_net_bootstrap::coordinator"), LevelFilter::DEBUG);
/// assert_eq!(set.level_for("libp2p_swarm"), LevelFilter::OFF);
/// assert_eq!(set.level_for("ant_client"), LevelFilter::WARN);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDirectiveSet {
    default: LevelFilter,
    scopes: BTreeMap<String, LevelFilter>,
}

impl Default for LogDirectiveSet {
    fn default() -> Self {
        Self {
            default: DEFAULT_LEVEL,
            scopes: BTreeMap::new(),
        }
    }
}

impl LogDirectiveSet {
    /// Parse a directive string. Later tokens override earlier ones for the same scope.
    pub fn parse(text: &str) -> Result<Self, LogError> {
        let mut set = Self::default();

        for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.split_once('=') {
                None => set.default = parse_level(token, token)?,
                Some((scope, level)) => {
                    let (scope, level) = (scope.trim(), level.trim());
                    if scope.is_empty() || level.contains('=') {
                        return Err(LogError::InvalidDirective(token.to_owned()));
                    }
                    set.scopes
                        .insert(scope.to_owned(), parse_level(token, level)?);
                }
            }
        }

        Ok(set)
    }

    pub fn with_default(mut self, level: LevelFilter) -> Self {
        self.default = level;
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>, level: LevelFilter) -> Self {
        self.scopes.insert(scope.into(), level);
        self
    }

    pub fn default_level(&self) -> LevelFilter {
        self.default
    }

    /// Level for `target`, from the longest scope that is a prefix of it.
    /// Falls back to the default level.
    ///
    /// Matches the way `tracing_subscriber::EnvFilter` selects a directive.
    pub fn level_for(&self, target: &str) -> LevelFilter {
        self.scopes
            .iter()
            .filter(|(scope, _)| target.starts_with(scope.as_str()))
            .max_by_key(|(scope, _)| scope.len())
            .map_or(self.default, |(_, level)| *level)
    }

    pub fn enabled(&self, target: &str, level: Level) -> bool {
        level <= self.level_for(target)
    }

    /// Most verbose level any directive allows.
    pub fn max_level(&self) -> LevelFilter {
        self.scopes
            .values()
            .copied()
            .fold(self.default, LevelFilter::max)
    }
}

fn parse_level(directive: &str, level: &str) -> Result<LevelFilter, LogError> {
    LevelFilter::from_str(level).map_err(|_| LogError::UnknownLevel {
        directive: directive.to_owned(),
        level: level.to_owned(),
    })
}

fn level_name(level: LevelFilter) -> String {
    level.to_string().to_lowercase()
}

impl FromStr for LogDirectiveSet {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LogDirectiveSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", level_name(self.default))?;
        for (scope, level) in &self.scopes {
            write!(f, ",{scope}={}", level_name(*level))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn empty_string_uses_default() {
        let set = LogDirectiveSet::parse("").unwrap();
        assert_eq!(set, LogDirectiveSet::default());
        assert_eq!(set.level_for("anything"), DEFAULT_LEVEL);
    }

    #[test]
    fn bare_level_sets_default() {
        let set = LogDirectiveSet::parse("trace").unwrap();
        assert_eq!(set.default_level(), LevelFilter::TRACE);
    }

    #[test]
    fn longest_scope_wins() {
        let set = LogDirectiveSet::parse("error,ant=warn,ant::net=debug,ant::net::dialer=trace")
            .unwrap();

        assert_eq!(set.level_for("ant::net::dialer::swarm"), LevelFilter::TRACE);
        assert_eq!(set.level_for("ant::net::bootstrap"), LevelFilter::DEBUG);
        assert_eq!(set.level_for("ant::client"), LevelFilter::WARN);
        assert_eq!(set.level_for("ant"), LevelFilter::WARN);
        assert_eq!(set.level_for("other"), LevelFilter::ERROR);
    }

    #[test]
    fn scope_matches_by_prefix() {
        let set = LogDirectiveSet::parse("off,ant_net=debug,ant_net_dialer=warn").unwrap();
        assert_eq!(set.level_for("ant_net_bootstrap"), LevelFilter::DEBUG);
        assert_eq!(set.level_for("ant_net::x"), LevelFilter::DEBUG);
        assert_eq!(set.level_for("ant_net_dialer::swarm"), LevelFilter::WARN);
        assert_eq!(set.level_for("ant_ne"), LevelFilter::OFF);
    }

    #[test]
    fn later_directives_override() {
        let set = LogDirectiveSet::parse("info,libp2p=debug,warn,libp2p=error").unwrap();
        assert_eq!(set.default_level(), LevelFilter::WARN);
        assert_eq!(set.level_for("libp2p"), LevelFilter::ERROR);
    }

    #[test]
    fn enabled_compares_verbosity() {
        let set = LogDirectiveSet::parse("info,noisy=error").unwrap();
        assert!(set.enabled("app", Level::INFO));
        assert!(set.enabled("app", Level::ERROR));
        assert!(!set.enabled("app", Level::DEBUG));
        assert!(!set.enabled("noisy::inner", Level::WARN));
    }

    #[test]
    fn whitespace_and_empty_tokens_are_ignored() {
        let set = LogDirectiveSet::parse(" debug , , ant = trace ,").unwrap();
        assert_eq!(set.default_level(), LevelFilter::DEBUG);
        assert_eq!(set.level_for("ant"), LevelFilter::TRACE);
    }

    #[test]
    fn unknown_level() {
        assert_matches!(
            LogDirectiveSet::parse("ant=loud"),
            Err(LogError::UnknownLevel { level, .. }) if level == "loud"
        );
        assert_matches!(
            LogDirectiveSet::parse("verbose"),
            Err(LogError::UnknownLevel { .. })
        );
    }

    #[test]
    fn invalid_directive() {
        assert_matches!(LogDirectiveSet::parse("=debug"), Err(LogError::InvalidDirective(_)));
        assert_matches!(LogDirectiveSet::parse("a=b=c"), Err(LogError::InvalidDirective(_)));
    }

    #[test]
    fn max_level() {
        let set = LogDirectiveSet::parse("warn,a=trace,b=error").unwrap();
        assert_eq!(set.max_level(), LevelFilter::TRACE);
    }

    #[test]
    fn display_reparses() {
        let set = LogDirectiveSet::parse("warn,b=trace,a=debug").unwrap();
        assert_eq!(set.to_string(), "warn,a=debug,b=trace");
        assert_eq!(LogDirectiveSet::parse(&set.to_string()).unwrap(), set);
    }
}
