/*!
# Find Offset: Read Offset
*/

use crate::FindOffsetError;
use std::fmt;



/// # Min Offset.
const MIN_OFFSET: i16 = -5880;

/// # Max Offset.
const MAX_OFFSET: i16 = 5880;



#[derive(Debug, Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
/// # Read Offset.
///
/// This holds a read offset in samples. Positive values mean the drive
/// delivers a given sample _later_ than it should, so the correct data for
/// sample `n` is found at position `n + offset`.
///
/// For historical reasons, values are restricted to `-5880..=5880`.
pub struct ReadOffset(i16);

impl fmt::Display for ReadOffset {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		<i16 as fmt::Display>::fmt(&self.0, f)
	}
}

impl TryFrom<i16> for ReadOffset {
	type Error = FindOffsetError;
	fn try_from(src: i16) -> Result<Self, Self::Error> {
		if (MIN_OFFSET..=MAX_OFFSET).contains(&src) { Ok(Self(src)) }
		else { Err(FindOffsetError::ReadOffset) }
	}
}

impl TryFrom<&str> for ReadOffset {
	type Error = FindOffsetError;
	fn try_from(src: &str) -> Result<Self, Self::Error> {
		// The standard parser is happy with an explicit "+".
		src.trim()
			.parse::<i16>()
			.map_err(|_| FindOffsetError::ReadOffset)
			.and_then(Self::try_from)
	}
}

impl ReadOffset {
	#[must_use]
	/// # Samples.
	pub const fn samples(self) -> i16 { self.0 }
}
