//! Rate-limit accounting advertised by the API through response headers.
//!
//! Every response carries `X-RateLimit-Limit` and `X-RateLimit-Usage`, each a comma-separated
//! pair of the short-term (15 minute) and daily windows. Throttled responses may also include
//! `Retry-After`.

// crates.io
use reqwest::header::{HeaderMap, RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const USAGE_HEADER: &str = "x-ratelimit-usage";

/// Request budget for one accounting window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitWindow {
	/// Requests allowed in the window.
	pub limit: u32,
	/// Requests already spent in the window.
	pub usage: u32,
}
impl RateLimitWindow {
	/// Requests left before the window is exhausted.
	pub fn remaining(self) -> u32 {
		self.limit.saturating_sub(self.usage)
	}

	/// Returns `true` once usage reached the limit.
	pub fn is_exhausted(self) -> bool {
		self.usage >= self.limit
	}
}

/// Rate-limit state parsed from a response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
	/// Short-term window.
	pub short_term: Option<RateLimitWindow>,
	/// Daily window.
	pub daily: Option<RateLimitWindow>,
	/// Retry hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}
impl RateLimitStatus {
	/// Parses the rate-limit headers; returns `None` when none of them are present.
	pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
		let limits = header_pair(headers, LIMIT_HEADER);
		let usages = header_pair(headers, USAGE_HEADER);
		let window = |idx: usize| -> Option<RateLimitWindow> {
			let limit = limits.as_ref()?.get(idx).copied()?;
			let usage = usages.as_ref()?.get(idx).copied()?;

			Some(RateLimitWindow { limit, usage })
		};
		let status = Self {
			short_term: window(0),
			daily: window(1),
			retry_after: parse_retry_after(headers),
		};

		if status == Self::default() { None } else { Some(status) }
	}

	/// Returns `true` if any known window is exhausted.
	pub fn is_exhausted(&self) -> bool {
		self.short_term.is_some_and(RateLimitWindow::is_exhausted)
			|| self.daily.is_some_and(RateLimitWindow::is_exhausted)
	}
}

/// Parses `Retry-After` as delta seconds or an RFC 2822 date.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(secs.into()));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

fn header_pair(headers: &HeaderMap, name: &str) -> Option<Vec<u32>> {
	let raw = headers.get(name)?.to_str().ok()?;

	raw.split(',').map(|part| part.trim().parse::<u32>().ok()).collect()
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
		let mut map = HeaderMap::new();

		for &(name, value) in pairs {
			map.insert(name, HeaderValue::from_static(value));
		}

		map
	}

	#[test]
	fn parses_both_windows() {
		let status = RateLimitStatus::from_headers(&headers(&[
			("x-ratelimit-limit", "200,2000"),
			("x-ratelimit-usage", "200,350"),
		]))
		.expect("Rate-limit headers should parse.");

		assert_eq!(status.short_term, Some(RateLimitWindow { limit: 200, usage: 200 }));
		assert_eq!(status.daily.map(RateLimitWindow::remaining), Some(1650));
		assert!(status.is_exhausted());
		assert_eq!(status.retry_after, None);
	}

	#[test]
	fn retry_after_alone_is_enough() {
		let status = RateLimitStatus::from_headers(&headers(&[("retry-after", "42")]))
			.expect("Retry-After should produce a status.");

		assert_eq!(status.retry_after, Some(Duration::seconds(42)));
		assert!(!status.is_exhausted());
	}

	#[test]
	fn garbage_headers_are_ignored() {
		assert!(RateLimitStatus::from_headers(&headers(&[("x-ratelimit-usage", "lots")])).is_none());
		assert!(RateLimitStatus::from_headers(&HeaderMap::new()).is_none());
	}
}
