//! Derive `xml-bind` type descriptions
//!
//! `#[derive(XmlType)]` works on structs with named fields (composite types), unit structs
//! and enums with unit variants only.
//!
//! Deriving supports the following attributes on the type:
//! - `#[xml(crate(...))]`: Name of `xml-bind` crate in local scope; defaults to `xml_bind`
//! - `#[xml(key = "...")]`: Type key (cache key and default type marker); defaults to the type
//!   name
//! - `#[xml(rename = "...")]`: Root element name, bypassing the naming convention
//! - `#[xml(namespace = "...")]`: Root element namespace
//! - `#[xml(create = "path")]`: Function creating a fresh instance; defaults to `Default`
//! - `#[xml(no_default)]`: No creation path; a creation hook must be registered on the
//!   resolver
//!
//! On struct fields:
//! - `#[xml(attribute)]`, `#[xml(text)]`, `#[xml(element)]`: Mapping kind (default: element)
//! - `#[xml(rename = "...")]`, `#[xml(namespace = "...")]`: XML name
//! - `#[xml(order = N)]`: Explicit write order
//! - `#[xml(required)]`: Fail reading if missing (and no default)
//! - `#[xml(collection)]`: Write items as repeated elements without wrapper;
//!   `#[xml(item = "...")]` also sets the item element name
//! - `#[xml(default)]`, `#[xml(default = "path")]`: Value for missing members while reading
//! - `#[xml(base)]`: Inherit all members of the (derived) field type
//! - `#[xml(skip)]`: Not mapped
//! - `#[xml(should_serialize = "path")]`: `fn(&Self) -> bool` deciding whether to write
//! - `#[xml(known_types(Type, Other = "marker"))]`: Types allowed in a polymorphic member
//! - `#[xml(type_handling = "none|auto|always")]`, `#[xml(null_handling = "ignore|include")]`,
//!   `#[xml(default_handling = "include|ignore")]`: Policy overrides
//!
//! On enum variants:
//! - `#[xml(rename = "...")]`: XML value, bypassing the naming convention
//!
//! Multiple attributes can be combined like `#[xml(attribute, rename = "id")]`.
#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/xml-bind-derive/0.1.0")]

extern crate proc_macro;

mod attributes;
mod enumeration;
mod object;

use proc_macro::TokenStream;
use syn::{
	parse_macro_input,
	Data,
	DeriveInput,
	Error,
};

/// Derive `xml_bind::XmlType` (and `xml_bind::XmlEnum` for enums)
#[proc_macro_derive(XmlType, attributes(xml))]
pub fn derive_xml_type(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as DeriveInput);

	let result = if !input.generics.params.is_empty() {
		Err(Error::new_spanned(&input.generics, "generic types are not supported"))
	} else {
		match &input.data {
			Data::Struct(data) => object::derive(&input, &data.fields),
			Data::Enum(data) => enumeration::derive(&input, data),
			Data::Union(_) => Err(Error::new_spanned(&input.ident, "unions are not supported")),
		}
	};

	TokenStream::from(result.unwrap_or_else(|e| e.to_compile_error()))
}
