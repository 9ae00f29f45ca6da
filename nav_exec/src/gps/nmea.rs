//! GGA sentence decoding
//!
//! Only the position fields of the GGA sentence are decoded, which is all the
//! planner needs. Any talker ID is accepted (`$GPGGA`, `$GNGGA`, ...).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::geodesy::{GeoPoint, GeodesyError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Sentence formatter for GPS fix data.
const GGA_FORMATTER: &str = "GGA";

/// Index of each field used from a GGA sentence, counting the address field
/// as zero.
const LAT_FIELD: usize = 2;
const NS_FIELD: usize = 3;
const LON_FIELD: usize = 4;
const EW_FIELD: usize = 5;
const QUALITY_FIELD: usize = 6;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur while decoding a sentence.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NmeaError {
    #[error("Sentence does not start with '$'")]
    MissingStart,

    #[error("Checksum field {0:?} is not a two digit hex number")]
    InvalidChecksumField(String),

    #[error("Checksum mismatch, sentence has {found:02X} but computed {computed:02X}")]
    BadChecksum {
        found: u8,
        computed: u8
    },

    #[error("Not a GGA sentence (address {0:?})")]
    NotGga(String),

    #[error("Sentence is missing the {0} field")]
    MissingField(&'static str),

    #[error("Receiver reports no position fix")]
    NoFix,

    #[error("Cannot decode coordinate {0:?}")]
    InvalidCoordinate(String),

    #[error("Invalid hemisphere indicator {0:?}")]
    InvalidHemisphere(String),

    #[error("Decoded position is invalid: {0}")]
    InvalidPosition(GeodesyError),
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decode the position from a GGA sentence.
///
/// If a GGA sentence carries a `*hh` checksum it is verified. Southern
/// latitudes and western longitudes are negative.
pub fn parse_gga(sentence: &str) -> Result<GeoPoint, NmeaError> {
    let body = sentence
        .trim()
        .strip_prefix('$')
        .ok_or(NmeaError::MissingStart)?;

    let (data, checksum_field) = match body.find('*') {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None)
    };

    let fields: Vec<&str> = data.split(',').collect();

    // Other sentence types are ignored before their checksum is looked at
    let address = fields[0];
    if address.len() != 5 || !address.ends_with(GGA_FORMATTER) {
        return Err(NmeaError::NotGga(address.to_string()))
    }

    if let Some(checksum_field) = checksum_field {
        verify_checksum(data, checksum_field)?;
    }

    let field = |index: usize, name: &'static str| {
        fields.get(index).copied().ok_or(NmeaError::MissingField(name))
    };

    let lat = field(LAT_FIELD, "latitude")?;
    let ns = field(NS_FIELD, "N/S indicator")?;
    let lon = field(LON_FIELD, "longitude")?;
    let ew = field(EW_FIELD, "E/W indicator")?;

    // Quality 0 means the receiver has no valid fix, even if it repeats an old
    // position
    if lat.is_empty() || lon.is_empty() || fields.get(QUALITY_FIELD) == Some(&"0") {
        return Err(NmeaError::NoFix)
    }

    let lat_deg = parse_coordinate(lat, 2)? * hemisphere_sign(ns, 'N', 'S')?;
    let lon_deg = parse_coordinate(lon, 3)? * hemisphere_sign(ew, 'E', 'W')?;

    GeoPoint::from_degrees(lat_deg, lon_deg).map_err(NmeaError::InvalidPosition)
}

/// Compute the NMEA checksum, the XOR of every byte between `$` and `*`.
pub fn checksum(data: &str) -> u8 {
    data.bytes().fold(0, |acc, b| acc ^ b)
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn verify_checksum(data: &str, checksum_field: &str) -> Result<(), NmeaError> {
    let checksum_field = checksum_field.trim();

    if checksum_field.len() != 2 {
        return Err(NmeaError::InvalidChecksumField(checksum_field.to_string()))
    }

    let found = u8::from_str_radix(checksum_field, 16)
        .map_err(|_| NmeaError::InvalidChecksumField(checksum_field.to_string()))?;
    let computed = checksum(data);

    if found != computed {
        return Err(NmeaError::BadChecksum { found, computed })
    }

    Ok(())
}

/// Convert an NMEA `(d)ddmm.mmmm` coordinate into decimal degrees.
fn parse_coordinate(field: &str, deg_digits: usize) -> Result<f64, NmeaError> {
    let invalid = || NmeaError::InvalidCoordinate(field.to_string());

    // The minutes always have two integer digits before the decimal point
    let point = field.find('.').unwrap_or_else(|| field.len());
    if point != deg_digits + 2 || !field.is_char_boundary(deg_digits) {
        return Err(invalid())
    }

    let (deg_str, min_str) = field.split_at(deg_digits);

    let degrees: u32 = deg_str.parse().map_err(|_| invalid())?;
    let minutes: f64 = min_str.parse().map_err(|_| invalid())?;

    if !(0.0..60.0).contains(&minutes) {
        return Err(invalid())
    }

    Ok(degrees as f64 + minutes / 60.0)
}

fn hemisphere_sign(field: &str, positive: char, negative: char) -> Result<f64, NmeaError> {
    match field.chars().next() {
        Some(c) if c == positive && field.len() == 1 => Ok(1.0),
        Some(c) if c == negative && field.len() == 1 => Ok(-1.0),
        _ => Err(NmeaError::InvalidHemisphere(field.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_gga_fixture() {
        let p = parse_gga(
            "$GPGGA,184353.07,1929.045,S,02410.506,E,1,04,2.6,100.00,M,-33.9,M,,0000*6D"
        ).unwrap();

        assert!((p.lat_deg() + 19.4841).abs() < 1e-4, "lat {}", p.lat_deg());
        assert!((p.lon_deg() - 24.1751).abs() < 1e-4, "lon {}", p.lon_deg());
        assert!((p.lat_rad() - (-19.4841f64).to_radians()).abs() < 1e-5);
    }

    #[test]
    fn test_parse_gga_north_west() {
        let p = parse_gga(
            "$GPGGA,003957.00,3252.88385,N,11714.01269,W,1,06,1.52,129.2,M,-33.8,M,,*6D\r\n"
        ).unwrap();

        assert!((p.lat_deg() - 32.8813975).abs() < 1e-6);
        assert!((p.lon_deg() + 117.2335448).abs() < 1e-6);
    }

    #[test]
    fn test_other_talker_without_checksum() {
        let p = parse_gga("$GNGGA,003957.00,3252.88385,N,11714.01269,W,1,06,1.52,129.2,M,-33.8,M,,")
            .unwrap();
        assert!((p.lat_deg() - 32.8813975).abs() < 1e-6);
    }

    #[test]
    fn test_checksum() {
        assert_eq!(
            checksum("GPGGA,003958.00,3252.88368,N,11714.01211,W,1,04,4.25,129.1,M,-33.8,M,,"),
            0x6A
        );

        assert_eq!(
            parse_gga("$GPGGA,184353.07,1929.045,S,02410.506,E,1,04,2.6,100.00,M,-33.9,M,,0000*00"),
            Err(NmeaError::BadChecksum { found: 0x00, computed: 0x6D })
        );
        assert!(matches!(
            parse_gga("$GPGGA,184353.07,1929.045,S,02410.506,E,1,04,2.6,100.00,M,-33.9,M,,0000*Z"),
            Err(NmeaError::InvalidChecksumField(_))
        ));
    }

    #[test]
    fn test_rejected_sentences() {
        assert_eq!(
            parse_gga("GPGGA,184353.07,1929.045,S,02410.506,E,1"),
            Err(NmeaError::MissingStart)
        );
        assert_eq!(
            parse_gga("$GPRMC,184353.07,A,1929.045,S,02410.506,E,0.0,0.0,010120,,"),
            Err(NmeaError::NotGga("GPRMC".to_string()))
        );
        assert_eq!(
            parse_gga("$GPRMC,003957.00,A,3252.88385,N,11714.01269,W,0.0,0.0,010120,,*00"),
            Err(NmeaError::NotGga("GPRMC".to_string()))
        );
        assert_eq!(
            parse_gga("$GPGGA,184353.07,,,,,0,00,,,M,,M,,"),
            Err(NmeaError::NoFix)
        );
        assert_eq!(
            parse_gga("$GPGGA,184353.07,1929.045,S,02410.506,E,0,00,,,M,,M,,"),
            Err(NmeaError::NoFix)
        );
        assert_eq!(
            parse_gga("$GPGGA,184353.07,1929.045"),
            Err(NmeaError::MissingField("N/S indicator"))
        );
        assert_eq!(
            parse_gga("$GPGGA,184353.07,1929.045,X,02410.506,E,1"),
            Err(NmeaError::InvalidHemisphere("X".to_string()))
        );
        assert_eq!(
            parse_gga("$GPGGA,184353.07,192.045,S,02410.506,E,1"),
            Err(NmeaError::InvalidCoordinate("192.045".to_string()))
        );
        assert_eq!(
            parse_gga("$GPGGA,184353.07,1961.000,S,02410.506,E,1"),
            Err(NmeaError::InvalidCoordinate("1961.000".to_string()))
        );
        assert!(matches!(
            parse_gga("$GPGGA,184353.07,9130.000,N,02410.506,E,1"),
            Err(NmeaError::InvalidPosition(GeodesyError::InvalidLatitude(_)))
        ));
    }
}
