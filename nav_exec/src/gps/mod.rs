//! # GPS module
//!
//! Position source for the planner. Sentences from the receiver are decoded
//! into [`GeoPoint`]s and the latest two fixes are tracked so the direction
//! of travel can be inferred.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod nmea;
pub use nmea::*;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use std::io::BufRead;

// Internal
use crate::geodesy::{FixPair, GeoPoint};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Tracks the previous and current fixes.
#[derive(Debug, Clone, Default)]
pub struct GpsTracker {
    previous: Option<GeoPoint>,
    current: Option<GeoPoint>,

    /// Number of fixes pushed since creation.
    num_fixes: u64,
}

/// Reads sentences line by line and yields decoded positions.
///
/// Sentences which are not GGA or which fail to decode are skipped, so only
/// valid positions are handed on.
pub struct SentenceSource<R> {
    reader: R,
    line: Vec<u8>,
    num_rejected: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl GpsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new fix, making the current fix the previous one.
    pub fn push(&mut self, point: GeoPoint) {
        self.previous = self.current.replace(point);
        self.num_fixes += 1;

        trace!("GPS fix {}: {}", self.num_fixes, point);
    }

    /// The most recent fix, if any.
    pub fn current(&self) -> Option<GeoPoint> {
        self.current
    }

    /// The last two fixes, or `None` until two fixes have been received.
    pub fn fix_pair(&self) -> Option<FixPair> {
        match (self.previous, self.current) {
            (Some(previous), Some(current)) => Some(FixPair { previous, current }),
            _ => None
        }
    }

    pub fn num_fixes(&self) -> u64 {
        self.num_fixes
    }
}

impl<R: BufRead> SentenceSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            num_rejected: 0
        }
    }

    /// Read until the next valid position.
    ///
    /// Returns `Ok(None)` at the end of the stream. Lines which are not valid
    /// UTF-8, for example after noise on a serial link, are rejected.
    pub fn next_fix(&mut self) -> std::io::Result<Option<GeoPoint>> {
        loop {
            self.line.clear();

            if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                return Ok(None)
            }

            let sentence = match std::str::from_utf8(&self.line) {
                Ok(s) => s.trim(),
                Err(e) => {
                    warn!("Rejected line which is not valid UTF-8: {}", e);
                    self.num_rejected += 1;
                    continue
                }
            };
            if sentence.is_empty() {
                continue
            }

            match parse_gga(sentence) {
                Ok(p) => return Ok(Some(p)),
                Err(NmeaError::NotGga(address)) => {
                    trace!("Ignoring {} sentence", address);
                },
                Err(NmeaError::NoFix) => {
                    debug!("Receiver has no fix");
                    self.num_rejected += 1;
                },
                Err(e) => {
                    warn!("Rejected sentence {:?}: {}", sentence, e);
                    self.num_rejected += 1;
                }
            }
        }
    }

    /// Number of GGA sentences that did not produce a position, including
    /// lines too corrupt to identify.
    pub fn num_rejected(&self) -> u64 {
        self.num_rejected
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_tracker_needs_two_fixes() {
        let a = GeoPoint::from_degrees(32.8800, -117.2300).unwrap();
        let b = GeoPoint::from_degrees(32.8801, -117.2300).unwrap();
        let c = GeoPoint::from_degrees(32.8802, -117.2301).unwrap();

        let mut tracker = GpsTracker::new();
        assert_eq!(tracker.fix_pair(), None);

        tracker.push(a);
        assert_eq!(tracker.current(), Some(a));
        assert_eq!(tracker.fix_pair(), None);

        tracker.push(b);
        assert_eq!(tracker.fix_pair(), Some(FixPair { previous: a, current: b }));

        tracker.push(c);
        assert_eq!(tracker.fix_pair(), Some(FixPair { previous: b, current: c }));
        assert_eq!(tracker.num_fixes(), 3);
    }

    #[test]
    fn test_source_skips_bad_sentences() {
        let stream = "\
$GPRMC,003957.00,A,3252.88385,N,11714.01269,W,0.0,0.0,010120,,*00
$GPGGA,003957.00,3252.88385,N,11714.01269,W,1,06,1.52,129.2,M,-33.8,M,,*6D

$GPGGA,003957.50,3252.88385,N,11714.01269,W,1,06,1.52,129.2,M,-33.8,M,,*00
$GPGGA,003957.70,,,,,0,00,,,M,,M,,
$GPGGA,003958.00,3252.88368,N,11714.01211,W,1,04,4.25,129.1,M,-33.8,M,,*6A
";
        let mut source = SentenceSource::new(Cursor::new(stream));

        let first = source.next_fix().unwrap().unwrap();
        assert!((first.lat_deg() - 32.8813975).abs() < 1e-6);

        let second = source.next_fix().unwrap().unwrap();
        assert!((second.lon_deg() + 117.2335352).abs() < 1e-6);

        assert_eq!(source.next_fix().unwrap(), None);
        assert_eq!(source.num_rejected(), 2);
    }

    #[test]
    fn test_source_recovers_from_corrupt_bytes() {
        let mut stream: Vec<u8> = b"$GPGGA,003957.00,3252.8\xff\xfe385,N\n".to_vec();
        stream.extend_from_slice(
            b"$GPGGA,003957.00,3252.88385,N,11714.01269,W,1,06,1.52,129.2,M,-33.8,M,,*6D\n"
        );
        let mut source = SentenceSource::new(Cursor::new(stream));

        let fix = source.next_fix().unwrap().unwrap();
        assert!((fix.lat_deg() - 32.8813975).abs() < 1e-6);
        assert_eq!(source.num_rejected(), 1);

        assert_eq!(source.next_fix().unwrap(), None);
    }
}
