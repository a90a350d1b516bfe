//! Static code tables: region codes to human-readable names, and ISO 3166-1
//! alpha-2 to alpha-3 country codes.
//!
//! Region names are defined for the United States (states, DC, territories,
//! and armed-forces codes) and Canada (provinces and territories), the
//! countries whose region codes in the city database are postal
//! abbreviations with documented names.

/// Look up the human-readable name for a (country code, region code) pair.
///
/// Returns `None` for any unrecognized pair; that is an expected outcome,
/// not an error.
#[must_use]
pub fn region_name(country_code: &str, region_code: &str) -> Option<&'static str> {
    match country_code {
        "US" => us_region_name(region_code),
        "CA" => ca_region_name(region_code),
        _ => None,
    }
}

fn us_region_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "AL" => "Alabama",
        "AK" => "Alaska",
        "AZ" => "Arizona",
        "AR" => "Arkansas",
        "CA" => "California",
        "CO" => "Colorado",
        "CT" => "Connecticut",
        "DE" => "Delaware",
        "DC" => "District of Columbia",
        "FL" => "Florida",
        "GA" => "Georgia",
        "HI" => "Hawaii",
        "ID" => "Idaho",
        "IL" => "Illinois",
        "IN" => "Indiana",
        "IA" => "Iowa",
        "KS" => "Kansas",
        "KY" => "Kentucky",
        "LA" => "Louisiana",
        "ME" => "Maine",
        "MD" => "Maryland",
        "MA" => "Massachusetts",
        "MI" => "Michigan",
        "MN" => "Minnesota",
        "MS" => "Mississippi",
        "MO" => "Missouri",
        "MT" => "Montana",
        "NE" => "Nebraska",
        "NV" => "Nevada",
        "NH" => "New Hampshire",
        "NJ" => "New Jersey",
        "NM" => "New Mexico",
        "NY" => "New York",
        "NC" => "North Carolina",
        "ND" => "North Dakota",
        "OH" => "Ohio",
        "OK" => "Oklahoma",
        "OR" => "Oregon",
        "PA" => "Pennsylvania",
        "RI" => "Rhode Island",
        "SC" => "South Carolina",
        "SD" => "South Dakota",
        "TN" => "Tennessee",
        "TX" => "Texas",
        "UT" => "Utah",
        "VT" => "Vermont",
        "VA" => "Virginia",
        "WA" => "Washington",
        "WV" => "West Virginia",
        "WI" => "Wisconsin",
        "WY" => "Wyoming",
        // territories and armed-forces codes
        "AS" => "American Samoa",
        "GU" => "Guam",
        "MP" => "Northern Mariana Islands",
        "PR" => "Puerto Rico",
        "UM" => "United States Minor Outlying Islands",
        "VI" => "Virgin Islands, U.S.",
        "AA" => "Armed Forces Americas",
        "AE" => "Armed Forces Europe",
        "AP" => "Armed Forces Pacific",
        _ => return None,
    };
    Some(name)
}

fn ca_region_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "AB" => "Alberta",
        "BC" => "British Columbia",
        "MB" => "Manitoba",
        "NB" => "New Brunswick",
        "NL" => "Newfoundland and Labrador",
        "NS" => "Nova Scotia",
        "NT" => "Northwest Territories",
        "NU" => "Nunavut",
        "ON" => "Ontario",
        "PE" => "Prince Edward Island",
        "QC" => "Quebec",
        "SK" => "Saskatchewan",
        "YT" => "Yukon Territory",
        _ => return None,
    };
    Some(name)
}

/// Look up the ISO 3166-1 alpha-3 code for an alpha-2 country code.
///
/// The city and country databases carry alpha-2 codes only; the three-letter
/// variables derive their value through this table.
#[must_use]
pub fn country_code3(alpha2: &str) -> Option<&'static str> {
    let code3 = match alpha2 {
        "AD" => "AND",
        "AE" => "ARE",
        "AF" => "AFG",
        "AG" => "ATG",
        "AI" => "AIA",
        "AL" => "ALB",
        "AM" => "ARM",
        "AO" => "AGO",
        "AQ" => "ATA",
        "AR" => "ARG",
        "AS" => "ASM",
        "AT" => "AUT",
        "AU" => "AUS",
        "AW" => "ABW",
        "AX" => "ALA",
        "AZ" => "AZE",
        "BA" => "BIH",
        "BB" => "BRB",
        "BD" => "BGD",
        "BE" => "BEL",
        "BF" => "BFA",
        "BG" => "BGR",
        "BH" => "BHR",
        "BI" => "BDI",
        "BJ" => "BEN",
        "BL" => "BLM",
        "BM" => "BMU",
        "BN" => "BRN",
        "BO" => "BOL",
        "BQ" => "BES",
        "BR" => "BRA",
        "BS" => "BHS",
        "BT" => "BTN",
        "BV" => "BVT",
        "BW" => "BWA",
        "BY" => "BLR",
        "BZ" => "BLZ",
        "CA" => "CAN",
        "CC" => "CCK",
        "CD" => "COD",
        "CF" => "CAF",
        "CG" => "COG",
        "CH" => "CHE",
        "CI" => "CIV",
        "CK" => "COK",
        "CL" => "CHL",
        "CM" => "CMR",
        "CN" => "CHN",
        "CO" => "COL",
        "CR" => "CRI",
        "CU" => "CUB",
        "CV" => "CPV",
        "CW" => "CUW",
        "CX" => "CXR",
        "CY" => "CYP",
        "CZ" => "CZE",
        "DE" => "DEU",
        "DJ" => "DJI",
        "DK" => "DNK",
        "DM" => "DMA",
        "DO" => "DOM",
        "DZ" => "DZA",
        "EC" => "ECU",
        "EE" => "EST",
        "EG" => "EGY",
        "EH" => "ESH",
        "ER" => "ERI",
        "ES" => "ESP",
        "ET" => "ETH",
        "FI" => "FIN",
        "FJ" => "FJI",
        "FK" => "FLK",
        "FM" => "FSM",
        "FO" => "FRO",
        "FR" => "FRA",
        "GA" => "GAB",
        "GB" => "GBR",
        "GD" => "GRD",
        "GE" => "GEO",
        "GF" => "GUF",
        "GG" => "GGY",
        "GH" => "GHA",
        "GI" => "GIB",
        "GL" => "GRL",
        "GM" => "GMB",
        "GN" => "GIN",
        "GP" => "GLP",
        "GQ" => "GNQ",
        "GR" => "GRC",
        "GS" => "SGS",
        "GT" => "GTM",
        "GU" => "GUM",
        "GW" => "GNB",
        "GY" => "GUY",
        "HK" => "HKG",
        "HM" => "HMD",
        "HN" => "HND",
        "HR" => "HRV",
        "HT" => "HTI",
        "HU" => "HUN",
        "ID" => "IDN",
        "IE" => "IRL",
        "IL" => "ISR",
        "IM" => "IMN",
        "IN" => "IND",
        "IO" => "IOT",
        "IQ" => "IRQ",
        "IR" => "IRN",
        "IS" => "ISL",
        "IT" => "ITA",
        "JE" => "JEY",
        "JM" => "JAM",
        "JO" => "JOR",
        "JP" => "JPN",
        "KE" => "KEN",
        "KG" => "KGZ",
        "KH" => "KHM",
        "KI" => "KIR",
        "KM" => "COM",
        "KN" => "KNA",
        "KP" => "PRK",
        "KR" => "KOR",
        "KW" => "KWT",
        "KY" => "CYM",
        "KZ" => "KAZ",
        "LA" => "LAO",
        "LB" => "LBN",
        "LC" => "LCA",
        "LI" => "LIE",
        "LK" => "LKA",
        "LR" => "LBR",
        "LS" => "LSO",
        "LT" => "LTU",
        "LU" => "LUX",
        "LV" => "LVA",
        "LY" => "LBY",
        "MA" => "MAR",
        "MC" => "MCO",
        "MD" => "MDA",
        "ME" => "MNE",
        "MF" => "MAF",
        "MG" => "MDG",
        "MH" => "MHL",
        "MK" => "MKD",
        "ML" => "MLI",
        "MM" => "MMR",
        "MN" => "MNG",
        "MO" => "MAC",
        "MP" => "MNP",
        "MQ" => "MTQ",
        "MR" => "MRT",
        "MS" => "MSR",
        "MT" => "MLT",
        "MU" => "MUS",
        "MV" => "MDV",
        "MW" => "MWI",
        "MX" => "MEX",
        "MY" => "MYS",
        "MZ" => "MOZ",
        "NA" => "NAM",
        "NC" => "NCL",
        "NE" => "NER",
        "NF" => "NFK",
        "NG" => "NGA",
        "NI" => "NIC",
        "NL" => "NLD",
        "NO" => "NOR",
        "NP" => "NPL",
        "NR" => "NRU",
        "NU" => "NIU",
        "NZ" => "NZL",
        "OM" => "OMN",
        "PA" => "PAN",
        "PE" => "PER",
        "PF" => "PYF",
        "PG" => "PNG",
        "PH" => "PHL",
        "PK" => "PAK",
        "PL" => "POL",
        "PM" => "SPM",
        "PN" => "PCN",
        "PR" => "PRI",
        "PS" => "PSE",
        "PT" => "PRT",
        "PW" => "PLW",
        "PY" => "PRY",
        "QA" => "QAT",
        "RE" => "REU",
        "RO" => "ROU",
        "RS" => "SRB",
        "RU" => "RUS",
        "RW" => "RWA",
        "SA" => "SAU",
        "SB" => "SLB",
        "SC" => "SYC",
        "SD" => "SDN",
        "SE" => "SWE",
        "SG" => "SGP",
        "SH" => "SHN",
        "SI" => "SVN",
        "SJ" => "SJM",
        "SK" => "SVK",
        "SL" => "SLE",
        "SM" => "SMR",
        "SN" => "SEN",
        "SO" => "SOM",
        "SR" => "SUR",
        "SS" => "SSD",
        "ST" => "STP",
        "SV" => "SLV",
        "SX" => "SXM",
        "SY" => "SYR",
        "SZ" => "SWZ",
        "TC" => "TCA",
        "TD" => "TCD",
        "TF" => "ATF",
        "TG" => "TGO",
        "TH" => "THA",
        "TJ" => "TJK",
        "TK" => "TKL",
        "TL" => "TLS",
        "TM" => "TKM",
        "TN" => "TUN",
        "TO" => "TON",
        "TR" => "TUR",
        "TT" => "TTO",
        "TV" => "TUV",
        "TW" => "TWN",
        "TZ" => "TZA",
        "UA" => "UKR",
        "UG" => "UGA",
        "UM" => "UMI",
        "US" => "USA",
        "UY" => "URY",
        "UZ" => "UZB",
        "VA" => "VAT",
        "VC" => "VCT",
        "VE" => "VEN",
        "VG" => "VGB",
        "VI" => "VIR",
        "VN" => "VNM",
        "VU" => "VUT",
        "WF" => "WLF",
        "WS" => "WSM",
        "YE" => "YEM",
        "YT" => "MYT",
        "ZA" => "ZAF",
        "ZM" => "ZMB",
        "ZW" => "ZWE",
        _ => return None,
    };
    Some(code3)
}
