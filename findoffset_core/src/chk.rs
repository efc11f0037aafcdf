/*!
# Find Offset: Checksums
*/

use crate::{
	FindOffsetError,
	Sample,
	SAMPLES_PER_SECTOR,
};
use std::{
	fmt,
	path::Path,
};



#[derive(Debug, Clone, Copy, Default, Eq, Hash, PartialEq)]
/// # AccurateRip Checksum.
///
/// This is a (version one) AccurateRip track checksum. It is displayed as
/// eight lowercase hex digits, like `0a1b2c3d`.
pub struct ArChecksum(u32);

impl fmt::Display for ArChecksum {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:08x}", self.0)
	}
}

impl From<u32> for ArChecksum {
	#[inline]
	fn from(src: u32) -> Self { Self(src) }
}

impl From<ArChecksum> for u32 {
	#[inline]
	fn from(src: ArChecksum) -> Self { src.0 }
}

impl ArChecksum {
	#[allow(clippy::cast_possible_truncation)] // It's masked first.
	/// # From Samples.
	///
	/// The computation is non-standard, but is more or less the sum of the
	/// product of each sample pair (in byte form) and its relative index. All
	/// data is factored, except the first `2939` samples of the first track,
	/// and last `2941` samples of the last track.
	///
	/// Returns `None` if there are too few samples left to crunch.
	pub(crate) fn from_samples<I>(samples: I, len: usize, track: u8, total: u8)
	-> Option<Self>
	where I: IntoIterator<Item=Sample> {
		let start =
			if track == 1 { usize::from(SAMPLES_PER_SECTOR) * 5 - 1 }
			else { 0 };
		let end =
			if track == total { len.saturating_sub(usize::from(SAMPLES_PER_SECTOR) * 5 + 1) }
			else { len };
		if end <= start { return None; }

		// Sixty-four bits are only used to help with overflow; the final
		// checksum only uses half that much.
		let mut crc = 0_u64;
		for (idx, sample) in samples.into_iter().enumerate().take(end + 1) {
			if start <= idx {
				let v = u64::from(u32::from_le_bytes(sample));
				crc = crc.wrapping_add((idx as u64 + 1).wrapping_mul(v));
			}
		}

		Some(Self((crc & 0xFFFF_FFFF) as u32))
	}

	/// # From WAV.
	///
	/// Crunch the checksum for a track previously extracted to `src`.
	///
	/// ## Errors
	///
	/// This will return an error if the file cannot be decoded, or is too
	/// short to checksum.
	pub fn from_wav<P>(src: P, track: u8, total: u8) -> Result<Self, FindOffsetError>
	where P: AsRef<Path> {
		let mut reader = hound::WavReader::open(src)
			.map_err(|e| FindOffsetError::Wave(e.to_string()))?;
		let duration = reader.duration();
		let len = usize::try_from(duration)
			.map_err(|_| FindOffsetError::Bug("WAV too big"))?;

		// Hound gives us the channels one at a time; glue them back together
		// into left/right pairs.
		let mut samples = Vec::with_capacity(len);
		let mut iter = reader.samples::<i16>();
		while let Some(left) = iter.next() {
			let left = left.map_err(|e| FindOffsetError::Wave(e.to_string()))?;
			let right = iter.next()
				.ok_or_else(|| FindOffsetError::Wave("odd number of samples".to_owned()))?
				.map_err(|e| FindOffsetError::Wave(e.to_string()))?;
			let [l1, l2] = left.to_le_bytes();
			let [r1, r2] = right.to_le_bytes();
			samples.push([l1, l2, r1, r2]);
		}

		Self::from_samples(samples, len, track, total)
			.ok_or(FindOffsetError::FileSize {
				expected: u64::from(SAMPLES_PER_SECTOR) * 10,
				actual: u64::from(duration),
			})
	}
}
