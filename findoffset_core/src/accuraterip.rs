/*!
# Find Offset: AccurateRip
*/

use cdtoc::{
	AccurateRip,
	Toc,
};
use crate::{
	ArChecksum,
	FindOffsetError,
};
use fyi_msg::Msg;
use std::{
	fmt,
	io::Read,
	time::Duration,
};
use ureq::{
	Agent,
	AgentBuilder,
};



/// # Record Header Size.
///
/// Track count (1), disc ID one (4), disc ID two (4), CDDB ID (4).
const HEADER_SIZE: usize = 13;

/// # Record Track Size.
///
/// Confidence (1), checksum (4), frame 450 checksum (4).
const TRACK_SIZE: usize = 9;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Disc Identifier.
///
/// This pairs the AccurateRip ID, needed to build the database URL, with
/// the CDDB ID, which is repeated in each database record and can be used to
/// sanity-check the responses.
pub struct DiscId {
	/// # AccurateRip ID.
	ar: AccurateRip,

	/// # CDDB ID.
	cddb: u32,
}

impl fmt::Display for DiscId {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		<AccurateRip as fmt::Display>::fmt(&self.ar, f)
	}
}

impl From<&Toc> for DiscId {
	fn from(toc: &Toc) -> Self {
		Self {
			ar: toc.accuraterip_id(),
			cddb: cddb_id(toc),
		}
	}
}

impl DiscId {
	#[must_use]
	/// # CDDB ID.
	pub const fn cddb(&self) -> u32 { self.cddb }

	#[must_use]
	/// # Checksum URL.
	pub fn checksum_url(&self) -> String { self.ar.checksum_url() }
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Reference Record.
///
/// One set of AccurateRip track checksums for a given pressing of a disc. A
/// database response may hold several of these.
pub struct ReferenceRecord {
	/// # CDDB ID.
	cddb: u32,

	/// # Checksums, by Track.
	checksums: Vec<ArChecksum>,

	/// # Confidences, by Track.
	confidences: Vec<u8>,
}

impl ReferenceRecord {
	#[must_use]
	/// # New.
	///
	/// Build a record from known parts. The confidences are all assumed to be
	/// one.
	pub fn new(cddb: u32, checksums: Vec<ArChecksum>) -> Self {
		let confidences = vec![1; checksums.len()];
		Self { cddb, checksums, confidences }
	}

	#[must_use]
	/// # CDDB ID.
	///
	/// Note: this is informational; it is expected to match the disc, but
	/// the database has been known to be a little sloppy.
	pub const fn cddb(&self) -> u32 { self.cddb }

	#[must_use]
	/// # Checksum.
	///
	/// Return the checksum for the track, if any. Track numbers start at one.
	pub fn checksum(&self, track: u8) -> Option<ArChecksum> {
		let idx = usize::from(track).checked_sub(1)?;
		self.checksums.get(idx).copied()
	}

	#[must_use]
	/// # Confidence.
	///
	/// Return the submission count for the track, if any.
	pub fn confidence(&self, track: u8) -> Option<u8> {
		let idx = usize::from(track).checked_sub(1)?;
		self.confidences.get(idx).copied()
	}

	#[must_use]
	/// # Is Match?
	pub fn is_match(&self, track: u8, chk: ArChecksum) -> bool {
		self.checksum(track) == Some(chk)
	}

	#[must_use]
	/// # Number of Tracks.
	pub fn len(&self) -> usize { self.checksums.len() }

	#[must_use]
	/// # Is Empty?
	pub fn is_empty(&self) -> bool { self.checksums.is_empty() }
}

impl ReferenceRecord {
	/// # Parse Database Response.
	///
	/// The raw `.bin` data is a simple concatenation of records, each a
	/// 13-byte header followed by nine bytes for each track.
	///
	/// Incomplete trailing data is ignored (with a warning).
	pub(crate) fn parse_all(mut raw: &[u8]) -> Vec<Self> {
		let mut out = Vec::new();
		while HEADER_SIZE <= raw.len() {
			let tracks = usize::from(raw[0]);
			let cddb = u32::from_le_bytes([raw[9], raw[10], raw[11], raw[12]]);
			let len = HEADER_SIZE + tracks * TRACK_SIZE;
			if raw.len() < len { break; }

			let mut checksums = Vec::with_capacity(tracks);
			let mut confidences = Vec::with_capacity(tracks);
			for chunk in raw[HEADER_SIZE..len].chunks_exact(TRACK_SIZE) {
				confidences.push(chunk[0]);
				checksums.push(ArChecksum::from(u32::from_le_bytes([
					chunk[1], chunk[2], chunk[3], chunk[4],
				])));
			}

			if ! checksums.is_empty() {
				out.push(Self { cddb, checksums, confidences });
			}
			raw = &raw[len..];
		}

		if ! raw.is_empty() {
			Msg::warning(format!(
				"Ignoring {} trailing byte(s) in the AccurateRip response.",
				raw.len(),
			)).eprint();
		}

		out
	}
}



/// # Reference Database.
///
/// This is the source of truth for a disc's track checksums.
pub trait ReferenceDatabase {
	/// # Fetch Records.
	///
	/// Return all known records for the disc. An empty list means there's
	/// nothing to go on, same as a `ReferenceNotFound` error.
	///
	/// ## Errors
	///
	/// Return `ReferenceNotFound` if the database has never heard of the
	/// disc, or `ReferenceTransport` for any other communication problems.
	fn fetch(&self, id: &DiscId) -> Result<Vec<ReferenceRecord>, FindOffsetError>;
}



#[derive(Debug)]
/// # AccurateRip Client.
///
/// This queries the AccurateRip database over HTTP.
pub struct AccurateRipClient {
	/// # Connection Agent.
	agent: Agent,
}

impl Default for AccurateRipClient {
	fn default() -> Self {
		Self {
			agent: AgentBuilder::new()
				.timeout(Duration::from_secs(15))
				.user_agent(concat!(
					"Mozilla/5.0 (X11; Linux x86_64; rv:",
					env!("CARGO_PKG_VERSION"),
					") FindOffset/",
					env!("CARGO_PKG_VERSION"),
				))
				.max_idle_connections(0)
				.build(),
		}
	}
}

impl ReferenceDatabase for AccurateRipClient {
	fn fetch(&self, id: &DiscId) -> Result<Vec<ReferenceRecord>, FindOffsetError> {
		self.fetch_url(&id.checksum_url())
	}
}

impl AccurateRipClient {
	/// # Fetch and Parse.
	fn fetch_url(&self, url: &str) -> Result<Vec<ReferenceRecord>, FindOffsetError> {
		let res = self.agent.get(url).call().map_err(fetch_error)?;

		let mut out = Vec::new();
		res.into_reader()
			.read_to_end(&mut out)
			.map_err(|e| FindOffsetError::ReferenceTransport(e.to_string()))?;

		Ok(ReferenceRecord::parse_all(&out))
	}
}



/// # Fetch Error.
///
/// A 404 means the disc is unknown; anything else is a communication
/// problem.
fn fetch_error(err: ureq::Error) -> FindOffsetError {
	match err {
		ureq::Error::Status(404, _) => FindOffsetError::ReferenceNotFound,
		ureq::Error::Status(code, _) => FindOffsetError::ReferenceTransport(
			format!("HTTP {code}")
		),
		ureq::Error::Transport(e) => FindOffsetError::ReferenceTransport(e.to_string()),
	}
}



/// # CDDB ID.
///
/// `cdtoc` formats these as eight hex digits; we want the number.
fn cddb_id(toc: &Toc) -> u32 {
	u32::from_str_radix(&toc.cddb_id().to_string(), 16).unwrap_or_default()
}



#[cfg(test)]
mod tests {
	use super::*;
	use std::{
		io::Write,
		net::TcpListener,
	};

	/// # One-Shot Server.
	///
	/// Answer a single request with the given status and body, returning
	/// the URL to hit.
	fn serve_once(status: &'static str, body: Vec<u8>) -> String {
		let listener = TcpListener::bind("127.0.0.1:0").expect("Bind failed.");
		let addr = listener.local_addr().expect("Missing address.");
		std::thread::spawn(move || {
			let (mut stream, _) = listener.accept().expect("Accept failed.");

			// Read through the end of the request headers.
			let mut req = Vec::new();
			let mut buf = [0_u8; 512];
			while ! req.windows(4).any(|w| w == b"\r\n\r\n") {
				let len = stream.read(&mut buf).expect("Read failed.");
				if len == 0 { break; }
				req.extend_from_slice(&buf[..len]);
			}

			let head = format!(
				"HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
				body.len(),
			);
			stream.write_all(head.as_bytes()).expect("Write failed.");
			stream.write_all(&body).expect("Write failed.");
			stream.flush().expect("Flush failed.");
		});

		format!("http://{addr}/dBAR-004-0004a4f5-0019b3e1-1f02e004.bin")
	}

	/// # Build a Raw Record.
	fn raw_record(cddb: u32, chk: &[u32]) -> Vec<u8> {
		let mut out = vec![u8::try_from(chk.len()).expect("Too many tracks.")];
		out.extend_from_slice(&1_u32.to_le_bytes());
		out.extend_from_slice(&2_u32.to_le_bytes());
		out.extend_from_slice(&cddb.to_le_bytes());
		for (k, c) in chk.iter().enumerate() {
			out.push(u8::try_from(k + 3).expect("Bad confidence."));
			out.extend_from_slice(&c.to_le_bytes());
			out.extend_from_slice(&0_u32.to_le_bytes());
		}
		out
	}

	#[test]
	fn t_parse() {
		let mut raw = raw_record(0x1f02_e004, &[0xA, 0xB, 0xC]);
		raw.extend(raw_record(0x1f02_e004, &[0xD, 0xE, 0xF]));

		let records = ReferenceRecord::parse_all(&raw);
		assert_eq!(records.len(), 2, "Expected two records.");

		assert_eq!(records[0].cddb(), 0x1f02_e004, "CDDB ID mismatch.");
		assert_eq!(records[0].len(), 3, "Expected three tracks.");
		assert_eq!(records[0].checksum(1), Some(ArChecksum::from(0xA)), "Track one mismatch.");
		assert_eq!(records[0].checksum(3), Some(ArChecksum::from(0xC)), "Track three mismatch.");
		assert_eq!(records[0].checksum(0), None, "There is no track zero.");
		assert_eq!(records[0].checksum(4), None, "There is no track four.");
		assert_eq!(records[0].confidence(2), Some(4), "Confidence mismatch.");

		assert!(records[1].is_match(2, ArChecksum::from(0xE)), "Track two should match.");
		assert!(! records[1].is_match(2, ArChecksum::from(0xB)), "Track two should not match.");
	}

	#[test]
	fn t_parse_truncated() {
		let mut raw = raw_record(5, &[1, 2]);
		let good = raw.len();
		raw.extend(raw_record(5, &[3, 4]));
		raw.truncate(good + 20);

		let records = ReferenceRecord::parse_all(&raw);
		assert_eq!(records.len(), 1, "The partial record should be ignored.");

		assert!(ReferenceRecord::parse_all(&[]).is_empty(), "Nothing from nothing.");
		assert!(ReferenceRecord::parse_all(&[1, 2, 3]).is_empty(), "Nothing from garbage.");
	}

	#[test]
	fn t_mismatched_cddb() {
		// Records are kept regardless of their disc ID.
		let mut raw = raw_record(1, &[1]);
		raw.extend(raw_record(2, &[1]));
		let records = ReferenceRecord::parse_all(&raw);
		assert_eq!(records.len(), 2, "Records shouldn't be filtered by ID.");
	}

	#[test]
	fn t_disc_id() {
		let toc = Toc::from_cdtoc("4+96+2D2B+6256+B327+D84A").expect("Invalid CDTOC.");
		let id = DiscId::from(&toc);
		assert_eq!(
			format!("{:08x}", id.cddb()),
			toc.cddb_id().to_string(),
			"CDDB ID mismatch.",
		);
		assert_eq!(id.checksum_url(), toc.accuraterip_id().checksum_url(), "URL mismatch.");
		assert_eq!(id.to_string(), toc.accuraterip_id().to_string(), "Display mismatch.");
	}

	#[test]
	fn t_fetch_error() {
		let res = ureq::Response::new(404, "Not Found", "").expect("Response failed.");
		assert_eq!(
			fetch_error(ureq::Error::Status(404, res)),
			FindOffsetError::ReferenceNotFound,
			"404 means the disc is unknown.",
		);

		let res = ureq::Response::new(500, "Internal Server Error", "").expect("Response failed.");
		assert_eq!(
			fetch_error(ureq::Error::Status(500, res)),
			FindOffsetError::ReferenceTransport("HTTP 500".to_owned()),
			"Other statuses are transport failures.",
		);
	}

	#[test]
	fn t_fetch_ok() {
		let url = serve_once("200 OK", raw_record(0x1f02_e004, &[0xA, 0xB]));
		let records = AccurateRipClient::default().fetch_url(&url).expect("Fetch failed.");
		assert_eq!(records.len(), 1, "Expected one record.");
		assert!(records[0].is_match(2, ArChecksum::from(0xB)), "Track two should match.");
	}

	#[test]
	fn t_fetch_not_found() {
		let url = serve_once("404 Not Found", Vec::new());
		assert_eq!(
			AccurateRipClient::default().fetch_url(&url),
			Err(FindOffsetError::ReferenceNotFound),
			"404 means the disc is unknown.",
		);

		let url = serve_once("503 Service Unavailable", Vec::new());
		assert_eq!(
			AccurateRipClient::default().fetch_url(&url),
			Err(FindOffsetError::ReferenceTransport("HTTP 503".to_owned())),
			"Other statuses are transport failures.",
		);
	}

	#[test]
	fn t_fetch_transport() {
		// Grab a free port, then close it so nothing is listening.
		let addr = TcpListener::bind("127.0.0.1:0")
			.and_then(|l| l.local_addr())
			.expect("Bind failed.");
		let url = format!("http://{addr}/dBAR-004-0004a4f5-0019b3e1-1f02e004.bin");

		let res = AccurateRipClient::default().fetch_url(&url);
		assert!(
			matches!(res, Err(FindOffsetError::ReferenceTransport(_))),
			"Connection failures are transport failures: {res:?}",
		);
	}
}
