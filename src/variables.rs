use std::net::IpAddr;

use maxminddb::geoip2;
use rustc_hash::FxHashMap;

use crate::arena::{RequestArena, Span};
use crate::codes;
use crate::config::GeoDatabases;
use crate::error::ResolveError;
use crate::record::{FloatField, IntField, StringField};

/// Fields served by the direct country-level lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountryField {
    Code,
    Code3,
    Name,
}

/// How a variable's value is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolver {
    /// Direct string lookup against the country database; no record object.
    Country(CountryField),
    /// String field read off a city-level lookup record.
    CityString(StringField),
    /// Float field, rendered with exactly four digits after the point.
    CityFloat(FloatField),
    /// Integer field, rendered as a plain decimal.
    CityInt(IntField),
    /// Region name derived from the record's (country, region) code pair.
    RegionName,
}

/// One entry of the variable table: a name bound to its resolver.
#[derive(Clone, Copy, Debug)]
pub struct VariableDescriptor {
    pub name: &'static str,
    pub resolver: Resolver,
}

const fn var(name: &'static str, resolver: Resolver) -> VariableDescriptor {
    VariableDescriptor { name, resolver }
}

/// The full, fixed set of geography variables. Not user-extensible.
pub const VARIABLES: &[VariableDescriptor] = &[
    var("geoip_country_code", Resolver::Country(CountryField::Code)),
    var("geoip_country_code3", Resolver::Country(CountryField::Code3)),
    var("geoip_country_name", Resolver::Country(CountryField::Name)),
    var(
        "geoip_city_continent_code",
        Resolver::CityString(StringField::ContinentCode),
    ),
    var(
        "geoip_city_country_code",
        Resolver::CityString(StringField::CountryCode),
    ),
    var(
        "geoip_city_country_code3",
        Resolver::CityString(StringField::CountryCode3),
    ),
    var(
        "geoip_city_country_name",
        Resolver::CityString(StringField::CountryName),
    ),
    var("geoip_region", Resolver::CityString(StringField::Region)),
    var("geoip_region_name", Resolver::RegionName),
    var("geoip_city", Resolver::CityString(StringField::City)),
    var(
        "geoip_postal_code",
        Resolver::CityString(StringField::PostalCode),
    ),
    var("geoip_latitude", Resolver::CityFloat(FloatField::Latitude)),
    var("geoip_longitude", Resolver::CityFloat(FloatField::Longitude)),
    var("geoip_dma_code", Resolver::CityInt(IntField::DmaCode)),
    var("geoip_area_code", Resolver::CityInt(IntField::AreaCode)),
];

/// The outcome of resolving one variable.
///
/// `NotFound` is a first-class value, never an error. A found value lives in
/// the request arena and carries a cacheability flag: the geography of a
/// request depends only on connection data fixed for its lifetime, so the
/// value may be reused within the same request, never across requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolvedValue {
    Found { span: Span, cacheable: bool },
    NotFound,
}

impl ResolvedValue {
    fn found(span: Span) -> ResolvedValue {
        ResolvedValue::Found {
            span,
            cacheable: true,
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, ResolvedValue::Found { .. })
    }

    /// The rendered text, if any.
    #[must_use]
    pub fn text<'a>(&self, arena: &'a RequestArena) -> Option<&'a str> {
        match self {
            ResolvedValue::Found { span, .. } => Some(arena.get(*span)),
            ResolvedValue::NotFound => None,
        }
    }
}

/// Name index over [`VARIABLES`], built once at process initialization and
/// read-only thereafter.
#[derive(Debug)]
pub struct VariableTable {
    index: FxHashMap<&'static str, &'static VariableDescriptor>,
}

impl Default for VariableTable {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableTable {
    #[must_use]
    pub fn new() -> Self {
        let mut index = FxHashMap::with_capacity_and_hasher(VARIABLES.len(), Default::default());
        for descriptor in VARIABLES {
            index.insert(descriptor.name, descriptor);
        }
        VariableTable { index }
    }

    /// Look up a descriptor by variable name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static VariableDescriptor> {
        self.index.get(name).copied()
    }

    /// All variable names, in table order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        VARIABLES.iter().map(|descriptor| descriptor.name)
    }
}

/// Resolve `name` for the request identified by `addr`.
///
/// # Errors
///
/// [`ResolveError::UnknownVariable`] if `name` is not in the table, or
/// [`ResolveError::Arena`] if the request arena is exhausted while
/// formatting a found value.
pub fn resolve(
    table: &VariableTable,
    db: &GeoDatabases,
    addr: IpAddr,
    name: &str,
    arena: &mut RequestArena,
) -> Result<ResolvedValue, ResolveError> {
    match table.get(name) {
        Some(descriptor) => descriptor.resolve(db, addr, arena),
        None => Err(ResolveError::UnknownVariable(name.to_string())),
    }
}

impl VariableDescriptor {
    /// Dispatch to this variable's resolver.
    ///
    /// Every path produces a [`ResolvedValue`]; missing handles, non-IPv4
    /// addresses, lookup misses, and absent fields are all `NotFound`. Any
    /// lookup record fetched along the way is released before this returns.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Arena`] if formatting exhausts the request arena.
    pub fn resolve(
        &self,
        db: &GeoDatabases,
        addr: IpAddr,
        arena: &mut RequestArena,
    ) -> Result<ResolvedValue, ResolveError> {
        let fail = |source| ResolveError::Arena {
            variable: self.name,
            source,
        };

        match self.resolver {
            Resolver::Country(field) => {
                let Some(handle) = db.country() else {
                    return Ok(ResolvedValue::NotFound);
                };
                if !matches!(addr, IpAddr::V4(_)) {
                    return Ok(ResolvedValue::NotFound);
                }
                let Ok(record) = handle.reader().lookup::<geoip2::Country>(addr) else {
                    return Ok(ResolvedValue::NotFound);
                };
                let value = match field {
                    CountryField::Code => record.country.and_then(|c| c.iso_code),
                    CountryField::Code3 => record
                        .country
                        .and_then(|c| c.iso_code)
                        .and_then(codes::country_code3),
                    CountryField::Name => record
                        .country
                        .and_then(|c| c.names)
                        .and_then(|names| names.get("en").copied()),
                };
                match value {
                    Some(text) => Ok(ResolvedValue::found(arena.push_str(text).map_err(fail)?)),
                    None => Ok(ResolvedValue::NotFound),
                }
            }

            Resolver::CityString(field) => {
                let Some(record) = db.fetch_city_record(addr) else {
                    return Ok(ResolvedValue::NotFound);
                };
                match record.string_field(field) {
                    Some(text) => Ok(ResolvedValue::found(arena.push_str(text).map_err(fail)?)),
                    None => Ok(ResolvedValue::NotFound),
                }
            }

            Resolver::CityFloat(field) => {
                let value = db
                    .fetch_city_record(addr)
                    .and_then(|record| record.float_field(field));
                match value {
                    Some(v) => {
                        let span = arena.push_fmt(format_args!("{v:.4}")).map_err(fail)?;
                        Ok(ResolvedValue::found(span))
                    }
                    None => Ok(ResolvedValue::NotFound),
                }
            }

            Resolver::CityInt(field) => {
                let value = db
                    .fetch_city_record(addr)
                    .and_then(|record| record.int_field(field));
                match value {
                    Some(v) => {
                        let mut buf = itoa::Buffer::new();
                        let span = arena.push_str(buf.format(v)).map_err(fail)?;
                        Ok(ResolvedValue::found(span))
                    }
                    None => Ok(ResolvedValue::NotFound),
                }
            }

            Resolver::RegionName => {
                let Some(record) = db.fetch_city_record(addr) else {
                    return Ok(ResolvedValue::NotFound);
                };
                let name = match (record.country_code.as_deref(), record.region.as_deref()) {
                    (Some(country), Some(region)) => codes::region_name(country, region),
                    _ => None,
                };
                match name {
                    Some(text) => Ok(ResolvedValue::found(arena.push_str(text).map_err(fail)?)),
                    None => Ok(ResolvedValue::NotFound),
                }
            }
        }
    }
}
