/*!
# Find Offset: Candidate Offsets
*/

use crate::{
	FindOffsetError,
	ReadOffset,
};
use std::{
	collections::HashSet,
	fmt,
	ops::Deref,
};



/// # Default Offsets.
///
/// These are the most common real-world drive offsets reported to
/// AccurateRip, ordered roughly by popularity, so a typical drive is found
/// within the first few attempts.
///
/// See [here](http://www.accuraterip.com/driveoffsets.htm) for the source.
pub const DEFAULT_OFFSETS: &str = "+6, +48, +102, +667, +12, +30, +618, +594, +738, -472, \
	+98, +116, +96, +733, +120, +691, +685, +97, +600, \
	+690, +1292, +99, +676, +686, +1182, -24, +704, +572, \
	+688, +91, +696, +103, -491, +689, +145, +708, +697, \
	+564, +86, +679, +355, -496, -1164, +1160, +694, 0, \
	-436, +79, +94, +684, +681, +106, +692, +943, +1194, \
	+92, +117, +680, +682, +1268, +678, -582, +1473, +1279, \
	-54, +1508, +740, +1272, +534, +976, +687, +675, +1303, \
	+674, +1263, +108, +974, +122, +111, -489, +772, +732, \
	-495, -494, +975, +935, +87, +668, +1776, +1364, +1336, \
	+1127";



#[derive(Debug, Clone, Default, Eq, PartialEq)]
/// # Offset List.
///
/// An ordered, duplicate-free list of candidate read offsets, parsed from a
/// comma-separated string of individual offsets and/or inclusive `low:high`
/// ranges, like `"6, 48, -10:10"`.
///
/// Order is preserved as given; if a value appears more than once, only its
/// first appearance counts.
///
/// ```
/// use findoffset_core::OffsetList;
///
/// let list = OffsetList::try_from("+6, 48, -1:1, 0").unwrap();
/// let list: Vec<i16> = list.iter().map(|o| o.samples()).collect();
/// assert_eq!(list, [6, 48, -1, 0, 1]);
/// ```
pub struct OffsetList(Vec<ReadOffset>);

impl Deref for OffsetList {
	type Target = [ReadOffset];
	#[inline]
	fn deref(&self) -> &Self::Target { self.0.as_slice() }
}

impl fmt::Display for OffsetList {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut iter = self.0.iter();
		if let Some(first) = iter.next() {
			write!(f, "{first}")?;
			for o in iter { write!(f, ", {o}")?; }
		}
		Ok(())
	}
}

impl TryFrom<&str> for OffsetList {
	type Error = FindOffsetError;

	/// # Parse.
	///
	/// ## Errors
	///
	/// If any token is non-numeric, out of range, or a backwards range, a
	/// `MalformedOffsetSpec` error naming that token is returned and nothing
	/// else.
	fn try_from(src: &str) -> Result<Self, Self::Error> {
		let mut out = Vec::new();
		let mut seen = HashSet::new();

		for token in src.split(',') {
			let token = token.trim();

			// Stray commas don't hurt anybody.
			if token.is_empty() { continue; }

			let malformed = || FindOffsetError::MalformedOffsetSpec(token.to_owned());

			// A range.
			if let Some((a, b)) = token.split_once(':') {
				let a = ReadOffset::try_from(a).map_err(|_| malformed())?;
				let b = ReadOffset::try_from(b).map_err(|_| malformed())?;
				if b < a { return Err(malformed()); }

				for v in a.samples()..=b.samples() {
					let v = ReadOffset::try_from(v).map_err(|_| malformed())?;
					if seen.insert(v) { out.push(v); }
				}
			}
			// A single value.
			else {
				let v = ReadOffset::try_from(token).map_err(|_| malformed())?;
				if seen.insert(v) { out.push(v); }
			}
		}

		Ok(Self(out))
	}
}

impl OffsetList {
	#[must_use]
	/// # Defaults.
	///
	/// Return the parsed [`DEFAULT_OFFSETS`].
	pub fn defaults() -> Self {
		Self::try_from(DEFAULT_OFFSETS).unwrap_or_default()
	}
}
