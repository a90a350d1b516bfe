use camino::Utf8PathBuf;

use crate::config::DatabaseKind;

/// Fatal configuration errors. Any of these aborts startup; the registry is
/// never left holding a handle from a failed directive.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Database file could not be opened or is not a valid MMDB.
    #[error("GeoIP open failed: {path}")]
    Open {
        path: Utf8PathBuf,
        #[source]
        source: maxminddb::MaxMindDBError,
    },

    /// Database opened but its edition is not acceptable for the directive.
    #[error("invalid GeoIP database '{path}' type:{edition}")]
    Edition {
        path: Utf8PathBuf,
        kind: DatabaseKind,
        edition: String,
    },

    /// The same directive was given twice. The first handle is kept.
    #[error("duplicate {kind} database directive")]
    Duplicate { kind: DatabaseKind },

    /// Directive name is not one of `geoip_country` / `geoip_city`.
    #[error("unknown directive '{name}'")]
    UnknownDirective { name: String },
}

/// The request arena ran out of space while formatting a value.
///
/// This is the per-request allocation failure: it fails the one request
/// being processed and nothing else. Distinct from a value simply being
/// absent, which is [`ResolvedValue::NotFound`](crate::ResolvedValue).
#[derive(Debug, thiserror::Error)]
#[error("request arena limit of {limit} bytes exceeded")]
pub struct ArenaError {
    pub limit: usize,
}

/// Errors surfaced by variable resolution. Absence of data is never an
/// error; it is reported as `ResolvedValue::NotFound`.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Formatting a found value exhausted the request arena.
    #[error("formatting '{variable}' failed")]
    Arena {
        variable: &'static str,
        #[source]
        source: ArenaError,
    },

    /// The requested name is not in the variable table.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
}
