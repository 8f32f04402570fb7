#![cfg_attr(doc_cfg, feature(doc_cfg))]
#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/xml-bind/0.1.0")]
//! This library maps typed object graphs to XML documents and back, driven by a declarative
//! contract per type instead of hand written marshaling code.
//!
//! Every mapped type implements [`XmlType`]: a stable [`TypeKey`](types::TypeKey) and a
//! [`TypeDescriptor`](types::TypeDescriptor) describing its shape. Builtin implementations
//! exist for primitives (numbers, strings, `bool`, `char`, `chrono` date/time types and
//! [`Base64Binary`](types::Base64Binary)), `Option<T>` and the std collections. Composite
//! types list their members with [`MemberSpec`](types::MemberSpec); usually this is derived.
//!
//! From the descriptor the [`ContractResolver`](contract::ContractResolver) builds (and
//! caches) a [`Contract`](contract::Contract): which members map to attributes, child
//! elements or the text content, in which order, under which names. The
//! [`XmlSerializer`] walks values along their contracts through an ordered list of
//! [converters](converters).
//!
//! Polymorphic members are trait objects declared with [`polymorphic!`]; the concrete type is
//! written as `xsi:type` marker and only resolved from an allow-list of known types while
//! reading, unless [open type resolution](XmlSettings::open_type_resolution) is enabled.
//!
//! If the `derive` feature is enabled (the default) the following can be derived:
//! - `XmlType` for structs (composite types) and unit enums
//!
//! ```
//! use xml_bind::{XmlSerializer, XmlType};
//!
//! #[derive(XmlType, Default, PartialEq, Debug)]
//! enum Color {
//! 	#[default]
//! 	Red,
//! 	#[xml(rename = "verde")]
//! 	Green,
//! }
//!
//! #[derive(XmlType, Default, PartialEq, Debug)]
//! struct Pen {
//! 	#[xml(attribute)]
//! 	id: u32,
//! 	color: Color,
//! 	#[xml(collection, item = "tag")]
//! 	tags: Vec<String>,
//! }
//!
//! let serializer = XmlSerializer::new();
//! let pen: Pen = serializer
//! 	.from_xml(r#"<Pen id="3"><color>verde</color><tag>a</tag><tag>b</tag></Pen>"#)
//! 	.unwrap();
//! assert_eq!(pen, Pen { id: 3, color: Color::Green, tags: vec!["a".into(), "b".into()] });
//! ```

extern crate self as xml_bind;

pub mod context;
pub mod contract;
pub mod converters;
pub mod errors;
pub mod name;
pub mod serializer;
pub mod settings;
pub mod type_handling;
pub mod types;
pub mod xml;

pub use self::errors::Error;
/// Result alias with our error type included
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(any(test, feature = "_private-test"))]
mod test_struct;

pub use self::{
	serializer::XmlSerializer,
	settings::XmlSettings,
	types::{
		XmlEnum,
		XmlType,
	},
};

#[cfg_attr(doc_cfg, doc(cfg(feature = "derive")))]
#[cfg(feature = "derive")]
pub use xml_bind_derive::XmlType;
