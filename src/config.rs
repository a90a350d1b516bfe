use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use maxminddb::{Mmap, Reader};
use serde::Serialize;

use crate::error::ConfigError;

/// Directive name for loading the country-level database.
pub const DIRECTIVE_COUNTRY: &str = "geoip_country";
/// Directive name for loading the city-level database.
pub const DIRECTIVE_CITY: &str = "geoip_city";

/// The two database slots the registry can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DatabaseKind {
    Country,
    City,
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseKind::Country => f.write_str("country"),
            DatabaseKind::City => f.write_str("city"),
        }
    }
}

impl DatabaseKind {
    /// Whether `edition` is acceptable for this slot.
    ///
    /// The country slot also accepts proxy and netspeed-style databases,
    /// matching the historical directive contract; the city slot accepts
    /// only city editions.
    #[must_use]
    pub fn accepts(self, edition: Edition) -> bool {
        match self {
            DatabaseKind::Country => matches!(
                edition,
                Edition::Country | Edition::Proxy | Edition::NetSpeed
            ),
            DatabaseKind::City => matches!(edition, Edition::City),
        }
    }
}

/// Database edition, detected from the MMDB `database_type` metadata string
/// when a file is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Edition {
    Country,
    Proxy,
    NetSpeed,
    City,
    Asn,
    Unknown,
}

impl Edition {
    /// Map a `database_type` metadata string onto an edition.
    ///
    /// Matches by product family so that GeoIP2, GeoLite2, and compatible
    /// third-party databases (e.g. DBIP) all classify correctly.
    #[must_use]
    pub fn from_database_type(database_type: &str) -> Edition {
        if database_type.contains("City") {
            Edition::City
        } else if database_type.contains("Country") {
            Edition::Country
        } else if database_type.contains("ASN") {
            Edition::Asn
        } else if database_type.contains("Anonymous") || database_type.contains("Proxy") {
            Edition::Proxy
        } else if database_type.contains("Connection-Type") || database_type.contains("NetSpeed") {
            Edition::NetSpeed
        } else {
            Edition::Unknown
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Edition::Country => "country",
            Edition::Proxy => "proxy",
            Edition::NetSpeed => "netspeed",
            Edition::City => "city",
            Edition::Asn => "asn",
            Edition::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A validated, read-only handle to one opened database.
///
/// The memory-mapped reader is safe for concurrent lookups and is never
/// mutated after open. It is released exactly once, when the registry is
/// dropped at process shutdown.
pub struct DatabaseHandle {
    reader: Reader<Mmap>,
    edition: Edition,
    path: Utf8PathBuf,
}

impl DatabaseHandle {
    pub(crate) fn reader(&self) -> &Reader<Mmap> {
        &self.reader
    }

    #[must_use]
    pub fn edition(&self) -> Edition {
        self.edition
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl fmt::Debug for DatabaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseHandle")
            .field("path", &self.path)
            .field("edition", &self.edition)
            .finish()
    }
}

/// Registry of the geography databases, at most one handle per kind.
///
/// Populated during the configuration phase via [`configure`] or
/// [`apply_directive`]; immutable and shared (`&GeoDatabases`) once request
/// traffic starts. Resolution functions take it by reference rather than
/// reading ambient global state.
///
/// [`configure`]: GeoDatabases::configure
/// [`apply_directive`]: GeoDatabases::apply_directive
#[derive(Debug, Default)]
pub struct GeoDatabases {
    country: Option<DatabaseHandle>,
    city: Option<DatabaseHandle>,
}

impl GeoDatabases {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open and validate the database at `path` for the given slot.
    ///
    /// The duplicate check runs first, so a second directive for the same
    /// kind fails without touching the already-stored handle. The file is
    /// opened memory-mapped and its edition checked against the slot's
    /// allow-list before the handle is stored.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Duplicate`] if the slot is already configured,
    /// [`ConfigError::Open`] if the file cannot be opened as an MMDB, or
    /// [`ConfigError::Edition`] on an edition mismatch.
    pub fn configure(&mut self, kind: DatabaseKind, path: &Utf8Path) -> Result<(), ConfigError> {
        let slot = match kind {
            DatabaseKind::Country => &self.country,
            DatabaseKind::City => &self.city,
        };
        if slot.is_some() {
            return Err(ConfigError::Duplicate { kind });
        }

        let reader =
            Reader::open_mmap(path.as_std_path()).map_err(|source| ConfigError::Open {
                path: path.to_owned(),
                source,
            })?;

        let database_type = reader.metadata.database_type.clone();
        let edition = Edition::from_database_type(&database_type);
        if !kind.accepts(edition) {
            return Err(ConfigError::Edition {
                path: path.to_owned(),
                kind,
                edition: database_type,
            });
        }

        tracing::info!(%path, %kind, %edition, "opened GeoIP database");

        let handle = DatabaseHandle {
            reader,
            edition,
            path: path.to_owned(),
        };
        match kind {
            DatabaseKind::Country => self.country = Some(handle),
            DatabaseKind::City => self.city = Some(handle),
        }
        Ok(())
    }

    /// Apply a configuration directive by name.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownDirective`] for names other than
    /// `geoip_country` and `geoip_city`; otherwise as [`configure`].
    ///
    /// [`configure`]: GeoDatabases::configure
    pub fn apply_directive(&mut self, name: &str, path: &Utf8Path) -> Result<(), ConfigError> {
        match name {
            DIRECTIVE_COUNTRY => self.configure(DatabaseKind::Country, path),
            DIRECTIVE_CITY => self.configure(DatabaseKind::City, path),
            _ => Err(ConfigError::UnknownDirective {
                name: name.to_string(),
            }),
        }
    }

    /// The country-level handle, if configured.
    #[must_use]
    pub fn country(&self) -> Option<&DatabaseHandle> {
        self.country.as_ref()
    }

    /// The city-level handle, if configured.
    #[must_use]
    pub fn city(&self) -> Option<&DatabaseHandle> {
        self.city.as_ref()
    }
}
