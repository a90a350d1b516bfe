use std::net::IpAddr;

use maxminddb::{geoip2, MaxMindDBError};
use serde::Serialize;

use crate::codes;
use crate::config::GeoDatabases;

/// String-valued fields of a [`LookupRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StringField {
    ContinentCode,
    CountryCode,
    CountryCode3,
    CountryName,
    Region,
    City,
    PostalCode,
}

/// Floating-point fields of a [`LookupRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatField {
    Latitude,
    Longitude,
}

/// Integer fields of a [`LookupRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntField {
    DmaCode,
    AreaCode,
}

/// Structured result of one city-level lookup.
///
/// Every field is independently optional. The record owns its data: it is a
/// snapshot copied out of the database while the underlying lookup result is
/// still borrowed, so it has no ties to the reader once constructed, and
/// dropping it is the single release on every exit path.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LookupRecord {
    pub continent_code: Option<String>,
    pub country_code: Option<String>,
    pub country_code3: Option<String>,
    pub country_name: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub dma_code: Option<u16>,
    /// Legacy telephone area code. GeoIP2 data carries no equivalent, so
    /// this is always absent when the record comes from a lookup.
    pub area_code: Option<u16>,
}

impl LookupRecord {
    fn from_city(city: geoip2::City<'_>) -> LookupRecord {
        let (country_code, country_code3, country_name) = match city.country {
            Some(country) => (
                country.iso_code.map(str::to_owned),
                country
                    .iso_code
                    .and_then(codes::country_code3)
                    .map(str::to_owned),
                country
                    .names
                    .and_then(|names| names.get("en").copied())
                    .map(str::to_owned),
            ),
            None => (None, None, None),
        };

        let (latitude, longitude, dma_code) = match city.location {
            Some(location) => (location.latitude, location.longitude, location.metro_code),
            None => (None, None, None),
        };

        LookupRecord {
            continent_code: city.continent.and_then(|c| c.code).map(str::to_owned),
            country_code,
            country_code3,
            country_name,
            // the region code is the first (widest) subdivision
            region: city
                .subdivisions
                .and_then(|subs| subs.into_iter().next())
                .and_then(|sub| sub.iso_code)
                .map(str::to_owned),
            city: city
                .city
                .and_then(|c| c.names)
                .and_then(|names| names.get("en").copied())
                .map(str::to_owned),
            postal_code: city.postal.and_then(|p| p.code).map(str::to_owned),
            latitude,
            longitude,
            dma_code,
            area_code: None,
        }
    }

    /// Typed accessor for string fields.
    #[must_use]
    pub fn string_field(&self, field: StringField) -> Option<&str> {
        let value = match field {
            StringField::ContinentCode => &self.continent_code,
            StringField::CountryCode => &self.country_code,
            StringField::CountryCode3 => &self.country_code3,
            StringField::CountryName => &self.country_name,
            StringField::Region => &self.region,
            StringField::City => &self.city,
            StringField::PostalCode => &self.postal_code,
        };
        value.as_deref()
    }

    /// Typed accessor for float fields.
    #[must_use]
    pub fn float_field(&self, field: FloatField) -> Option<f64> {
        match field {
            FloatField::Latitude => self.latitude,
            FloatField::Longitude => self.longitude,
        }
    }

    /// Typed accessor for integer fields.
    #[must_use]
    pub fn int_field(&self, field: IntField) -> Option<i64> {
        match field {
            IntField::DmaCode => self.dma_code.map(i64::from),
            IntField::AreaCode => self.area_code.map(i64::from),
        }
    }
}

impl GeoDatabases {
    /// Perform one city-level lookup for `addr`.
    ///
    /// Returns `None` when the city database is unconfigured, when the
    /// address is not IPv4 (geography variables only cover the IPv4 family;
    /// other families resolve to not-found by policy), or when the address
    /// misses. Exactly one lookup per call; results are never cached across
    /// requests.
    #[must_use]
    pub fn fetch_city_record(&self, addr: IpAddr) -> Option<LookupRecord> {
        let handle = self.city()?;
        if !matches!(addr, IpAddr::V4(_)) {
            return None;
        }
        match handle.reader().lookup::<geoip2::City>(addr) {
            Ok(city) => Some(LookupRecord::from_city(city)),
            Err(MaxMindDBError::AddressNotFoundError(_)) => None,
            Err(error) => {
                tracing::debug!(%addr, %error, "city lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LookupRecord {
        LookupRecord {
            continent_code: Some("NA".to_string()),
            country_code: Some("US".to_string()),
            country_code3: Some("USA".to_string()),
            country_name: Some("United States".to_string()),
            region: Some("CA".to_string()),
            city: Some("Mountain View".to_string()),
            postal_code: None,
            latitude: Some(37.386),
            longitude: Some(-122.0838),
            dma_code: Some(807),
            area_code: None,
        }
    }

    #[test]
    fn string_accessors() {
        let record = sample();
        assert_eq!(record.string_field(StringField::CountryCode), Some("US"));
        assert_eq!(
            record.string_field(StringField::City),
            Some("Mountain View")
        );
        // absent field on an otherwise-populated record
        assert_eq!(record.string_field(StringField::PostalCode), None);
    }

    #[test]
    fn numeric_accessors() {
        let record = sample();
        assert_eq!(record.float_field(FloatField::Latitude), Some(37.386));
        assert_eq!(record.int_field(IntField::DmaCode), Some(807));
        assert_eq!(record.int_field(IntField::AreaCode), None);
    }

    #[test]
    fn unconfigured_city_database_yields_none() {
        let dbs = GeoDatabases::new();
        assert!(dbs.fetch_city_record("1.2.3.4".parse().unwrap()).is_none());
    }
}
