//! XML names and naming conventions

use std::{
	borrow::Cow,
	fmt,
};

/// Namespace of the `xsi:type` and `xsi:nil` attributes
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Usual prefix bound to [`XSI_NAMESPACE`]
pub const XSI_PREFIX: &str = "xsi";

/// XML name with optional namespace URI
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct QualifiedName {
	/// Local part of the name
	pub local: Cow<'static, str>,
	/// Namespace URI, if any
	pub namespace: Option<Cow<'static, str>>,
}

impl QualifiedName {
	/// Name without namespace
	pub fn new<S: Into<Cow<'static, str>>>(local: S) -> Self {
		Self {
			local: local.into(),
			namespace: None,
		}
	}

	/// Name within a namespace
	pub fn with_namespace<S: Into<Cow<'static, str>>, N: Into<Cow<'static, str>>>(local: S, namespace: N) -> Self {
		Self {
			local: local.into(),
			namespace: Some(namespace.into()),
		}
	}

	/// `xsi:type`
	pub const XSI_TYPE: QualifiedName = QualifiedName {
		local: Cow::Borrowed("type"),
		namespace: Some(Cow::Borrowed(XSI_NAMESPACE)),
	};

	/// `xsi:nil`
	pub const XSI_NIL: QualifiedName = QualifiedName {
		local: Cow::Borrowed("nil"),
		namespace: Some(Cow::Borrowed(XSI_NAMESPACE)),
	};

	/// Whether a name found in a document matches this name
	///
	/// A name without namespace only compares local names; this lets documents that put
	/// everything into a default namespace still match unqualified properties.
	pub fn matches(&self, local: &str, namespace: Option<&str>) -> bool {
		if self.local != local {
			return false;
		}
		match &self.namespace {
			None => true,
			Some(ns) => namespace == Some(ns.as_ref()),
		}
	}
}

impl fmt::Display for QualifiedName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.namespace {
			Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
			None => f.write_str(&self.local),
		}
	}
}

/// Transform from member and type names to XML local names
#[derive(Clone, Copy, Default)]
pub enum NamingConvention {
	/// Names are used as written
	#[default]
	Identity,
	/// `fooBar`
	CamelCase,
	/// `FooBar`
	PascalCase,
	/// `foo_bar`
	SnakeCase,
	/// `foo-bar`
	KebabCase,
	/// `foobar`
	LowerCase,
	/// Custom transform
	Custom(fn(&str) -> String),
}

impl fmt::Debug for NamingConvention {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Identity => f.write_str("Identity"),
			Self::CamelCase => f.write_str("CamelCase"),
			Self::PascalCase => f.write_str("PascalCase"),
			Self::SnakeCase => f.write_str("SnakeCase"),
			Self::KebabCase => f.write_str("KebabCase"),
			Self::LowerCase => f.write_str("LowerCase"),
			Self::Custom(_) => f.write_str("Custom(..)"),
		}
	}
}

impl NamingConvention {
	/// Apply the convention to a raw name
	pub fn apply(&self, name: &str) -> String {
		match self {
			Self::Identity => name.to_owned(),
			Self::CamelCase => {
				let mut out = String::with_capacity(name.len());
				for (i, word) in split_words(name).into_iter().enumerate() {
					if i == 0 {
						out.push_str(&word.to_lowercase());
					} else {
						push_capitalized(&mut out, word);
					}
				}
				out
			},
			Self::PascalCase => {
				let mut out = String::with_capacity(name.len());
				for word in split_words(name) {
					push_capitalized(&mut out, word);
				}
				out
			},
			Self::SnakeCase => join_lower(name, "_"),
			Self::KebabCase => join_lower(name, "-"),
			Self::LowerCase => join_lower(name, ""),
			Self::Custom(f) => f(name),
		}
	}
}

fn push_capitalized(out: &mut String, word: &str) {
	let mut chars = word.chars();
	if let Some(first) = chars.next() {
		out.extend(first.to_uppercase());
		out.push_str(&chars.as_str().to_lowercase());
	}
}

fn join_lower(name: &str, sep: &str) -> String {
	split_words(name)
		.into_iter()
		.map(str::to_lowercase)
		.collect::<Vec<_>>()
		.join(sep)
}

// Splits on `_`, `-` and case boundaries; an uppercase run followed by lowercase
// keeps its last letter for the next word ("XMLName" -> "XML", "Name").
fn split_words(name: &str) -> Vec<&str> {
	let mut words = Vec::new();
	for part in name.split(|c| c == '_' || c == '-') {
		let chars: Vec<(usize, char)> = part.char_indices().collect();
		let mut start = 0;
		for i in 1..chars.len() {
			let (pos, c) = chars[i];
			let prev = chars[i - 1].1;
			let next_lower = chars.get(i + 1).map_or(false, |&(_, n)| n.is_lowercase());
			let boundary = (c.is_uppercase() && (prev.is_lowercase() || prev.is_ascii_digit()))
				|| (c.is_uppercase() && prev.is_uppercase() && next_lower);
			if boundary {
				words.push(&part[start..pos]);
				start = pos;
			}
		}
		if start < part.len() {
			words.push(&part[start..]);
		}
	}
	words
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn camel_case() {
		let n = NamingConvention::CamelCase;
		assert_eq!(n.apply("Foo"), "foo");
		assert_eq!(n.apply("enum_value"), "enumValue");
		assert_eq!(n.apply("EnumValue"), "enumValue");
		assert_eq!(n.apply("XMLName"), "xmlName");
		assert_eq!(n.apply("id"), "id");
	}

	#[test]
	fn other_conventions() {
		assert_eq!(NamingConvention::PascalCase.apply("date_value"), "DateValue");
		assert_eq!(NamingConvention::SnakeCase.apply("DateValue"), "date_value");
		assert_eq!(NamingConvention::KebabCase.apply("dateValue"), "date-value");
		assert_eq!(NamingConvention::LowerCase.apply("Date_Value"), "datevalue");
		assert_eq!(NamingConvention::Identity.apply("Date_Value"), "Date_Value");
	}

	#[test]
	fn match_namespace() {
		let plain = QualifiedName::new("id");
		assert!(plain.matches("id", None));
		assert!(plain.matches("id", Some("http://example.org")));
		let qualified = QualifiedName::with_namespace("id", "http://example.org/id");
		assert!(qualified.matches("id", Some("http://example.org/id")));
		assert!(!qualified.matches("id", None));
		assert!(!qualified.matches("id", Some("http://example.org")));
	}
}
