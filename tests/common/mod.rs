//! Minimal in-memory MMDB fixtures for integration tests.
//!
//! Builds a database whose search tree maps the low half of IPv4 space
//! (first bit 0) to a single data record and misses everything else. The
//! payload and the `database_type` metadata string are caller-supplied, so
//! the same builder covers city, country, and wrong-edition fixtures.

use camino::Utf8PathBuf;
use tempfile::TempDir;

/// MaxMind data-section writer, enough of the encoding for the fixtures.
pub struct DataWriter {
    pub buf: Vec<u8>,
}

impl DataWriter {
    pub fn new() -> Self {
        DataWriter { buf: Vec::new() }
    }

    /// Map header with `entries` key/value pairs.
    pub fn map(&mut self, entries: usize) {
        assert!(entries < 29);
        self.buf.push(0xE0 | entries as u8);
    }

    /// UTF-8 string (short form only).
    pub fn str(&mut self, s: &str) {
        assert!(s.len() < 29);
        self.buf.push(0x40 | s.len() as u8);
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// IEEE-754 double.
    pub fn double(&mut self, v: f64) {
        self.buf.push(0x68);
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Unsigned 16-bit integer, minimal-width encoding.
    pub fn uint16(&mut self, v: u16) {
        if v == 0 {
            self.buf.push(0xA0);
        } else if v < 0x100 {
            self.buf.push(0xA1);
            self.buf.push(v as u8);
        } else {
            self.buf.push(0xA2);
            self.buf.extend_from_slice(&v.to_be_bytes());
        }
    }

    /// Unsigned 32-bit integer, single-byte payload is enough here.
    pub fn uint32(&mut self, v: u32) {
        assert!(v < 0x100);
        self.buf.push(0xC1);
        self.buf.push(v as u8);
    }

    /// Unsigned 64-bit zero (extended type, zero-length payload).
    pub fn uint64_zero(&mut self) {
        self.buf.extend_from_slice(&[0x00, 0x02]);
    }

    /// Array header with `entries` elements (extended type).
    pub fn array(&mut self, entries: usize) {
        assert!(entries < 29);
        self.buf.push(entries as u8);
        self.buf.push(0x04);
    }
}

/// Assemble a complete single-record MMDB image.
pub fn build_mmdb(database_type: &str, data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();

    // One search-tree node, record_size 24 (3 bytes per record):
    // left (addresses below 128.0.0.0) -> data pointer 17, which is
    // node_count(1) + separator(16) + offset 0; right -> node_count = miss.
    buf.extend_from_slice(&[0x00, 0x00, 0x11, 0x00, 0x00, 0x01]);
    buf.extend_from_slice(&[0u8; 16]);
    buf.extend_from_slice(data);

    buf.extend_from_slice(b"\xab\xcd\xefMaxMind.com");
    let mut md = DataWriter::new();
    md.map(9);
    md.str("binary_format_major_version");
    md.uint16(2);
    md.str("binary_format_minor_version");
    md.uint16(0);
    md.str("build_epoch");
    md.uint64_zero();
    md.str("database_type");
    md.str(database_type);
    md.str("description");
    md.map(0);
    md.str("ip_version");
    md.uint16(4);
    md.str("languages");
    md.array(1);
    md.str("en");
    md.str("node_count");
    md.uint32(1);
    md.str("record_size");
    md.uint16(24);
    buf.extend_from_slice(&md.buf);

    buf
}

/// City record with every field populated.
pub fn city_data() -> Vec<u8> {
    let mut w = DataWriter::new();
    w.map(6);
    w.str("city");
    w.map(1);
    w.str("names");
    w.map(1);
    w.str("en");
    w.str("Mountain View");
    w.str("continent");
    w.map(1);
    w.str("code");
    w.str("NA");
    w.str("country");
    w.map(2);
    w.str("iso_code");
    w.str("US");
    w.str("names");
    w.map(1);
    w.str("en");
    w.str("United States");
    w.str("location");
    w.map(3);
    w.str("latitude");
    w.double(37.386);
    w.str("longitude");
    w.double(-122.0838);
    w.str("metro_code");
    w.uint16(807);
    w.str("postal");
    w.map(1);
    w.str("code");
    w.str("94035");
    w.str("subdivisions");
    w.array(1);
    w.map(1);
    w.str("iso_code");
    w.str("CA");
    w.buf
}

/// City record carrying only a country code.
pub fn sparse_city_data() -> Vec<u8> {
    let mut w = DataWriter::new();
    w.map(1);
    w.str("country");
    w.map(1);
    w.str("iso_code");
    w.str("US");
    w.buf
}

/// City record whose (country, region) pair has no region-name entry.
pub fn german_city_data() -> Vec<u8> {
    let mut w = DataWriter::new();
    w.map(2);
    w.str("country");
    w.map(1);
    w.str("iso_code");
    w.str("DE");
    w.str("subdivisions");
    w.array(1);
    w.map(1);
    w.str("iso_code");
    w.str("BY");
    w.buf
}

/// Country record for the direct country-level lookups.
pub fn country_data() -> Vec<u8> {
    let mut w = DataWriter::new();
    w.map(2);
    w.str("continent");
    w.map(1);
    w.str("code");
    w.str("NA");
    w.str("country");
    w.map(2);
    w.str("iso_code");
    w.str("US");
    w.str("names");
    w.map(1);
    w.str("en");
    w.str("United States");
    w.buf
}

/// Write a fixture database into `dir` and return its path.
pub fn write_db(dir: &TempDir, filename: &str, database_type: &str, data: &[u8]) -> Utf8PathBuf {
    let path = dir.path().join(filename);
    std::fs::write(&path, build_mmdb(database_type, data)).expect("write fixture database");
    Utf8PathBuf::from_path_buf(path).expect("temp path is utf-8")
}
