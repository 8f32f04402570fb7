#![allow(missing_docs)] // names should be good enough
//! Error types
//!
//! Every failure is terminal for the serialize/deserialize call that raised it. Failures
//! are grouped into the contract, mapping and type resolution families; the remaining
//! variants cover malformed text values, malformed documents and the underlying XML
//! library.
//!
//! Prefer the constructor functions on [`Error`] (e.g. [`Error::required_property_missing`])
//! over building variants by hand.

use crate::types::TypeKey;
use std::{
	borrow::Cow,
	io,
};
use thiserror::Error;

/// A type cannot be classified, constructed or converted.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContractError {
	/// Object type without creation path or creation hook
	#[error("type {0} cannot be constructed: no creation path and no creation hook")]
	NotConstructible(TypeKey),
	/// No registered converter accepts the contract
	#[error("no converter registered for type {0}")]
	NoConverter(TypeKey),
	/// A property is flagged as collection but its type isn't a collection
	#[error("property {property:?} of {declaring_type} is flagged as collection but {value_type} is not a collection")]
	NotEnumerable {
		property: Cow<'static, str>,
		declaring_type: TypeKey,
		value_type: TypeKey,
	},
	/// A value didn't have the type its contract describes
	#[error("value type mismatch: expected {expected}")]
	TypeMismatch { expected: Cow<'static, str> },
	/// A converter was handed a contract of a kind it doesn't handle
	#[error("unexpected contract kind for {0}")]
	UnexpectedKind(TypeKey),
	/// A member can't be read or written through its accessor
	#[error("member {0:?} is not accessible in this direction")]
	NotAccessible(Cow<'static, str>),
}

/// The XML shape doesn't match what the contract allows.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MappingError {
	/// Object values can only be mapped to elements
	#[error("XML mapping of {0} must be Element")]
	InvalidMappingKind(TypeKey),
	/// A required property was never matched while reading
	#[error("property {property:?} of type {declaring_type} is required")]
	RequiredPropertyMissing {
		property: Cow<'static, str>,
		declaring_type: TypeKey,
	},
	/// Two properties of the same mapping kind share an XML name
	#[error("properties {first:?} and {second:?} of {declaring_type} both map to {name}")]
	AmbiguousName {
		declaring_type: TypeKey,
		name: String,
		first: Cow<'static, str>,
		second: Cow<'static, str>,
	},
	/// The property layout of a type can't be mapped
	#[error("invalid mapping for {declaring_type}: {reason}")]
	InvalidMapping {
		declaring_type: TypeKey,
		reason: Cow<'static, str>,
	},
	/// `xsi:nil` on a value that can't be null
	#[error("element {0} is nil but {1} is not nullable")]
	NilNotAllowed(String, TypeKey),
	/// Attributes must be written before element content
	#[error("attribute {0} written after element content")]
	AttributeAfterContent(String),
}

/// A polymorphic type marker couldn't be resolved.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TypeResolutionError {
	/// The marker isn't in the applicable known-type set and open resolution is disabled
	#[error("unknown or disallowed type marker {marker:?} for {declared}")]
	UnknownOrDisallowedType { marker: String, declared: TypeKey },
	/// The resolved type can't be stored in the declared slot
	#[error("type {resolved} is not assignable to {declared}")]
	NotAssignable { resolved: TypeKey, declared: TypeKey },
}

/// Error of a serialize or deserialize call
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	#[error(transparent)]
	Contract(#[from] ContractError),
	#[error(transparent)]
	Mapping(#[from] MappingError),
	#[error(transparent)]
	TypeResolution(#[from] TypeResolutionError),
	/// Text that doesn't parse as the target value
	#[error("invalid value {text:?} for {type_key}: {reason}")]
	InvalidValue {
		type_key: TypeKey,
		text: String,
		reason: Cow<'static, str>,
	},
	/// Structurally broken or truncated document
	#[error("invalid document: {0}")]
	Document(Cow<'static, str>),
	#[error(transparent)]
	Xml(#[from] quick_xml::Error),
	#[error(transparent)]
	Io(#[from] io::Error),
}

impl Error {
	#[cold]
	pub fn not_constructible(type_key: TypeKey) -> Self {
		ContractError::NotConstructible(type_key).into()
	}

	#[cold]
	pub fn no_converter(type_key: TypeKey) -> Self {
		ContractError::NoConverter(type_key).into()
	}

	#[cold]
	pub fn type_mismatch<S: Into<Cow<'static, str>>>(expected: S) -> Self {
		ContractError::TypeMismatch { expected: expected.into() }.into()
	}

	#[cold]
	pub fn unexpected_kind(type_key: TypeKey) -> Self {
		ContractError::UnexpectedKind(type_key).into()
	}

	#[cold]
	pub fn not_accessible<S: Into<Cow<'static, str>>>(member: S) -> Self {
		ContractError::NotAccessible(member.into()).into()
	}

	#[cold]
	pub fn invalid_mapping_kind(type_key: TypeKey) -> Self {
		MappingError::InvalidMappingKind(type_key).into()
	}

	#[cold]
	pub fn required_property_missing<S: Into<Cow<'static, str>>>(property: S, declaring_type: TypeKey) -> Self {
		MappingError::RequiredPropertyMissing {
			property: property.into(),
			declaring_type,
		}
		.into()
	}

	#[cold]
	pub fn invalid_mapping<S: Into<Cow<'static, str>>>(declaring_type: TypeKey, reason: S) -> Self {
		MappingError::InvalidMapping {
			declaring_type,
			reason: reason.into(),
		}
		.into()
	}

	#[cold]
	pub fn nil_not_allowed(element: &str, type_key: TypeKey) -> Self {
		MappingError::NilNotAllowed(element.to_owned(), type_key).into()
	}

	#[cold]
	pub fn attribute_after_content(name: &str) -> Self {
		MappingError::AttributeAfterContent(name.to_owned()).into()
	}

	#[cold]
	pub fn unknown_or_disallowed_type(marker: &str, declared: TypeKey) -> Self {
		TypeResolutionError::UnknownOrDisallowedType {
			marker: marker.to_owned(),
			declared,
		}
		.into()
	}

	#[cold]
	pub fn not_assignable(resolved: TypeKey, declared: TypeKey) -> Self {
		TypeResolutionError::NotAssignable { resolved, declared }.into()
	}

	#[cold]
	pub fn invalid_value<S: Into<Cow<'static, str>>>(type_key: TypeKey, text: &str, reason: S) -> Self {
		Error::InvalidValue {
			type_key,
			text: text.to_owned(),
			reason: reason.into(),
		}
	}

	#[cold]
	pub fn document<S: Into<Cow<'static, str>>>(msg: S) -> Self {
		Error::Document(msg.into())
	}

	#[cold]
	pub fn unexpected_eof(msg: &'static str) -> Self {
		Error::Document(Cow::Owned(format!("unexpected eof: {}", msg)))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn required_property_message() {
		let err = Error::required_property_missing("Name", TypeKey::new("Foo"));
		assert!(matches!(
			err,
			Error::Mapping(MappingError::RequiredPropertyMissing { .. })
		));
		assert_eq!(err.to_string(), r#"property "Name" of type Foo is required"#);
	}

	#[test]
	fn unknown_marker_message() {
		let err = Error::unknown_or_disallowed_type("Evil", TypeKey::new("Animal"));
		assert_eq!(err.to_string(), r#"unknown or disallowed type marker "Evil" for Animal"#);
	}
}
