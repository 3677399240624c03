//! Character grammars for names and string values.
//!
//! Every function here is total and pure: it accepts or rejects a candidate and never panics.
//!
//! # Character classes
//!
//! | Class | Members |
//! |-------|---------|
//! | graphical | `0x21..=0x7E` |
//! | reserved | `(` `)` `<` `>` `,` `"` |
//! | nominal | space, or graphical and not reserved |
//! | quote-string | `0x20..=0x7E` except `"` |
//! | text | any `char <= 0x7F` except backspace, plus the legacy 8-bit repertoire below |
//!
//! # Grammars
//!
//! - Formal argument name: `<` one or more nominal characters `>`, with no space directly
//!   inside either bracket.
//! - Predicate name: one or more graphical, non-reserved characters (no spaces).
//! - Nominal / spreadsheet variable name: nominal characters, no leading or trailing space.
//! - Query variable: `?` followed by nominal characters, no trailing space.

/// Characters that may never appear in a name or nominal.
pub const RESERVED_CHARS: [char; 6] = ['(', ')', '<', '>', ',', '"'];

/// High-half characters of the legacy 8-bit text repertoire, as Unicode scalars.
const LEGACY_TEXT_CHARS: [u32; 128] = [
	0x00C4, 0x00C5, 0x00C7, 0x00C9, 0x00D1, 0x00D6, 0x00DC, 0x00E1, 0x00E0, 0x00E2, 0x00E4, 0x00E3,
	0x00E5, 0x00E7, 0x00E9, 0x00E8, 0x00EA, 0x00EB, 0x00ED, 0x00EC, 0x00EE, 0x00EF, 0x00F1, 0x00F3,
	0x00F2, 0x00F4, 0x00F6, 0x00F5, 0x00FA, 0x00F9, 0x00FB, 0x00FC, 0x2020, 0x00B0, 0x00A2, 0x00A3,
	0x00A7, 0x2022, 0x00B6, 0x00DF, 0x00AE, 0x00A9, 0x2122, 0x00B4, 0x00A8, 0x2260, 0x00C6, 0x00D8,
	0x221E, 0x00B1, 0x2264, 0x2265, 0x00A5, 0x00B5, 0x2202, 0x2211, 0x220F, 0x03C0, 0x222B, 0x00AA,
	0x00BA, 0x03A9, 0x00E6, 0x00F8, 0x00BF, 0x00A1, 0x00AC, 0x221A, 0x0192, 0x2248, 0x2206, 0x00AB,
	0x00BB, 0x2026, 0x00A0, 0x00C0, 0x00C3, 0x00D5, 0x0152, 0x0153, 0x2013, 0x2014, 0x201C, 0x201D,
	0x2018, 0x2019, 0x00F7, 0x25CA, 0x00FF, 0x0178, 0x2044, 0x20AC, 0x2039, 0x203A, 0xFB01, 0xFB02,
	0x2021, 0x00B7, 0x201A, 0x201E, 0x2030, 0x00C2, 0x00CA, 0x00C1, 0x00CB, 0x00C8, 0x00CD, 0x00CE,
	0x00CF, 0x00CC, 0x00D3, 0x00D4, 0xF8FF, 0x00D2, 0x00DA, 0x00DB, 0x00D9, 0x0131, 0x02C6, 0x02DC,
	0x00AF, 0x02D8, 0x02D9, 0x02DA, 0x00B8, 0x02DD, 0x02DB, 0x02C7,
];

#[inline]
pub fn is_graphical_char(c: char) -> bool {
	('\u{21}'..='\u{7E}').contains(&c)
}

#[inline]
pub fn is_reserved_char(c: char) -> bool {
	RESERVED_CHARS.contains(&c)
}

/// A character legal inside a nominal, spreadsheet variable name, or formal argument name.
#[inline]
pub fn is_nominal_char(c: char) -> bool {
	c == ' ' || (is_graphical_char(c) && !is_reserved_char(c))
}

#[inline]
pub fn is_quote_string_char(c: char) -> bool {
	('\u{20}'..='\u{7E}').contains(&c) && c != '"'
}

pub fn is_text_char(c: char) -> bool {
	if (c as u32) <= 0x7F {
		return c != '\u{08}';
	}
	LEGACY_TEXT_CHARS.contains(&(c as u32))
}

/// Formal argument name, e.g. `<a1>` or `<a b>`.
pub fn is_formal_arg_name(s: &str) -> bool {
	let Some(inner) = s.strip_prefix('<').and_then(|rest| rest.strip_suffix('>')) else {
		return false;
	};
	!inner.is_empty()
		&& !inner.starts_with(' ')
		&& !inner.ends_with(' ')
		&& inner.chars().all(is_nominal_char)
}

pub fn is_pred_name(s: &str) -> bool {
	!s.is_empty() && s.chars().all(|c| is_graphical_char(c) && !is_reserved_char(c))
}

pub fn is_nominal(s: &str) -> bool {
	!s.is_empty() && !s.starts_with(' ') && !s.ends_with(' ') && s.chars().all(is_nominal_char)
}

/// Spreadsheet variable (column) names follow the nominal grammar.
pub fn is_svar_name(s: &str) -> bool {
	is_nominal(s)
}

pub fn is_query_var_name(s: &str) -> bool {
	match s.strip_prefix('?') {
		Some(rest) => !rest.is_empty() && !rest.ends_with(' ') && rest.chars().all(is_nominal_char),
		None => false,
	}
}

pub fn is_quote_string(s: &str) -> bool {
	s.chars().all(is_quote_string_char)
}

pub fn is_text_string(s: &str) -> bool {
	s.chars().all(is_text_char)
}
