//! Name sanitizer
//!
//! Maps one path segment to a name the remote accepts. The function is pure and
//! idempotent: feeding its output back in returns the same string. Rules, in order:
//!
//! 1. NFC normalization
//! 2. trim surrounding whitespace
//! 3. files only: strip trailing dots (and any whitespace they were hiding)
//! 4. `~$` prefix becomes `x_`
//! 5. invalid characters become `_`
//! 6. reserved device names get a `_` after the reserved component
//! 7. enforce the segment length limit, keeping the extension when possible
//! 8. an empty result becomes `_`

use crate::policy::SanitizePolicy;
use crate::types::EntryKind;
use std::ffi::OsStr;
use unicode_normalization::UnicodeNormalization;

/// Sanitize one path segment
///
/// Returns an empty string only for empty input; every other result is non-empty
/// and at most `policy.max_segment_len` characters long.
pub fn sanitize(name: &str, kind: EntryKind, policy: &SanitizePolicy) -> String {
	if name.is_empty() {
		return String::new();
	}

	let strip_dots = kind != EntryKind::Directory && policy.strip_trailing_dots;

	let normalized: String = name.nfc().collect();
	let mut name = trim_tail(normalized.trim_start(), strip_dots).to_string();

	if let Some(rule) = &policy.temp_prefix {
		if let Some(rest) = name.strip_prefix(rule.prefix.as_str()) {
			name = format!("{}{}", rule.replacement, rest);
		}
	}

	name = name
		.chars()
		.map(|c| if policy.is_invalid_char(c) { policy.replacement } else { c })
		.collect();

	name = guard_reserved(name, policy);
	name = enforce_length(name, strip_dots, policy);

	if name.is_empty() || name == "." || name == ".." {
		name = policy.replacement.to_string();
	}
	name
}

/// Sanitize a raw directory-entry name, returning `None` when no rename is needed
///
/// Names that are not valid UTF-8 are sanitized from their lossy rendering and
/// therefore always need a rename.
pub fn sanitized_name(name: &OsStr, kind: EntryKind, policy: &SanitizePolicy) -> Option<String> {
	if name.is_empty() {
		return None;
	}
	match name.to_str() {
		Some(s) => {
			let clean = sanitize(s, kind, policy);
			if clean == s {
				None
			} else {
				Some(clean)
			}
		}
		None => Some(sanitize(&name.to_string_lossy(), kind, policy)),
	}
}

/// Count of characters, the unit the length limit is expressed in
pub fn char_len(s: &str) -> usize {
	s.chars().count()
}

/// First `n` characters of `s`
pub(crate) fn take_chars(s: &str, n: usize) -> &str {
	match s.char_indices().nth(n) {
		Some((idx, _)) => &s[..idx],
		None => s,
	}
}

fn trim_tail(s: &str, strip_dots: bool) -> &str {
	if strip_dots {
		s.trim_end_matches(|c: char| c == '.' || c.is_whitespace())
	} else {
		s.trim_end()
	}
}

/// Portion before the first dot
fn stem(name: &str) -> &str {
	match name.find('.') {
		Some(idx) => &name[..idx],
		None => name,
	}
}

fn guard_reserved(mut name: String, policy: &SanitizePolicy) -> String {
	if policy.is_reserved(&name) {
		name.push(policy.replacement);
		return name;
	}
	if let Some(idx) = name.find('.') {
		if policy.is_reserved(&name[..idx]) {
			name.insert(idx, policy.replacement);
		}
	}
	name
}

fn enforce_length(name: String, strip_dots: bool, policy: &SanitizePolicy) -> String {
	let max = policy.max_segment_len;
	if char_len(&name) <= max {
		return name;
	}

	if let Some(idx) = name.rfind('.') {
		let (base, ext) = (&name[..idx], &name[idx + 1..]);
		let ext_len = char_len(ext);
		if ext_len + 1 < max {
			let candidate = format!("{}.{}", take_chars(base, max - ext_len - 1), ext);
			// Cutting the base can expose a reserved stem such as "CON.<long ext>"
			if !policy.is_reserved(stem(&candidate)) {
				return candidate;
			}
		}
	}

	let flat = guard_reserved(trim_tail(take_chars(&name, max), strip_dots).to_string(), policy);
	if char_len(&flat) <= max {
		return flat;
	}

	// The guard pushed a reserved prefix past the limit; one char less is never reserved
	guard_reserved(trim_tail(take_chars(&name, max - 1), strip_dots).to_string(), policy)
}


// vim: ts=4
