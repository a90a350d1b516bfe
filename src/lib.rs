//! Lazily-computed GeoIP request variables backed by MaxMind databases.
//!
//! This library resolves a client's network address into named request
//! attributes (`geoip_country_code`, `geoip_city`, `geoip_latitude`, ...)
//! for consumption by a request-processing pipeline. Databases are opened
//! and validated once at configuration time; after that the registry is
//! immutable, lock-free shared state. Values are rendered into a
//! per-request arena so nothing resolved ever outlives its request or
//! aliases database-owned memory.
//!
//! # Examples
//!
//! ```rust,no_run
//! use camino::Utf8Path;
//! use geoip_vars::{resolve, GeoDatabases, DatabaseKind, RequestArena, VariableTable};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // configuration phase, once per process
//! let mut dbs = GeoDatabases::new();
//! dbs.configure(DatabaseKind::Country, Utf8Path::new("/usr/share/GeoIP/GeoLite2-Country.mmdb"))?;
//! dbs.configure(DatabaseKind::City, Utf8Path::new("/usr/share/GeoIP/GeoLite2-City.mmdb"))?;
//! let table = VariableTable::new();
//!
//! // per request
//! let mut arena = RequestArena::new();
//! let addr = "89.160.20.112".parse()?;
//! let value = resolve(&table, &dbs, addr, "geoip_country_code", &mut arena)?;
//! match value.text(&arena) {
//!     Some(code) => println!("country: {code}"),
//!     None => println!("country: not found"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod arena;
pub mod codes;
pub mod config;
pub mod error;
pub mod record;
pub mod variables;

pub use crate::arena::{RequestArena, Span, DEFAULT_ARENA_LIMIT};
pub use crate::config::{DatabaseHandle, DatabaseKind, Edition, GeoDatabases};
pub use crate::error::{ArenaError, ConfigError, ResolveError};
pub use crate::record::{FloatField, IntField, LookupRecord, StringField};
pub use crate::variables::{
    resolve, CountryField, ResolvedValue, Resolver, VariableDescriptor, VariableTable, VARIABLES,
};
