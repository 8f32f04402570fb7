//! Builtin implementations: primitives, `Option` and std collections

use crate::{
	types::{
		downcast,
		downcast_mut,
		downcast_ref,
		CollectionBuild,
		CollectionShape,
		EnumShape,
		EnumVariant,
		NullableShape,
		PrimitiveKind,
		PrimitiveShape,
		TypeDescriptor,
		TypeHandle,
		TypeKey,
		TypeShape,
		Value,
		XmlType,
	},
	Error,
	Result,
};
use base64::Engine as _;
use chrono::{
	DateTime,
	FixedOffset,
	NaiveDate,
	NaiveDateTime,
	NaiveTime,
	SecondsFormat,
	Utc,
};
use std::{
	any::Any,
	borrow::Cow,
	collections::{
		BTreeSet,
		HashSet,
		VecDeque,
	},
	hash::Hash,
};

/// Type mapped to a single text value
pub trait XmlPrimitive: XmlType {
	/// Primitive class
	const KIND: PrimitiveKind;

	/// Format as text
	fn to_xml_text(&self) -> String;

	/// Parse from text
	///
	/// Text of non-string kinds arrives trimmed.
	fn from_xml_text(text: &str) -> std::result::Result<Self, Cow<'static, str>>;
}

/// Shape of a primitive type
pub fn primitive_shape<T: XmlPrimitive>() -> PrimitiveShape {
	PrimitiveShape {
		kind: T::KIND,
		format: format_primitive::<T>,
		parse: parse_primitive::<T>,
	}
}

fn format_primitive<T: XmlPrimitive>(value: &dyn Any) -> Result<String> {
	Ok(downcast_ref::<T>(value)?.to_xml_text())
}

fn parse_primitive<T: XmlPrimitive>(text: &str) -> Result<Value> {
	let trimmed = if T::KIND.keeps_whitespace() { text } else { text.trim() };
	match T::from_xml_text(trimmed) {
		Ok(v) => Ok(Box::new(v)),
		Err(reason) => Err(Error::invalid_value(T::type_key(), text, reason)),
	}
}

/// Unit enum mapped to its variant names
///
/// Can be derived (if `derive` feature is active).
pub trait XmlEnum: XmlType {
	/// Variants in declaration order
	const VARIANTS: &'static [EnumVariant];

	/// Index of the variant into `VARIANTS`
	fn variant_index(&self) -> usize;

	/// Variant at index
	fn from_variant_index(index: usize) -> Option<Self>;
}

/// Shape of an enum type
pub fn enum_shape<T: XmlEnum>() -> EnumShape {
	EnumShape {
		variants: T::VARIANTS,
		index_of: enum_index_of::<T>,
		from_index: enum_from_index::<T>,
	}
}

fn enum_index_of<T: XmlEnum>(value: &dyn Any) -> Result<usize> {
	Ok(downcast_ref::<T>(value)?.variant_index())
}

fn enum_from_index<T: XmlEnum>(index: usize) -> Option<Value> {
	T::from_variant_index(index).map(|v| Box::new(v) as Value)
}

macro_rules! primitive_type {
	($ty:ty, $key:literal) => {
		impl XmlType for $ty {
			fn type_key() -> TypeKey {
				TypeKey::new($key)
			}

			fn descriptor() -> TypeDescriptor {
				TypeDescriptor::new(Self::type_key(), $key, TypeShape::Primitive(primitive_shape::<Self>()))
			}
		}
	};
}

macro_rules! integers {
	($($ty:ty => $key:literal,)*) => {$(
		primitive_type!($ty, $key);

		impl XmlPrimitive for $ty {
			const KIND: PrimitiveKind = PrimitiveKind::Integer;

			fn to_xml_text(&self) -> String {
				self.to_string()
			}

			fn from_xml_text(text: &str) -> std::result::Result<Self, Cow<'static, str>> {
				text.parse().map_err(|e: std::num::ParseIntError| Cow::Owned(e.to_string()))
			}
		}
	)*};
}

integers! {
	i8 => "i8",
	i16 => "i16",
	i32 => "i32",
	i64 => "i64",
	i128 => "i128",
	isize => "isize",
	u8 => "u8",
	u16 => "u16",
	u32 => "u32",
	u64 => "u64",
	u128 => "u128",
	usize => "usize",
}

// XML Schema spells infinity as `INF`
macro_rules! floats {
	($($ty:ty => $key:literal,)*) => {$(
		primitive_type!($ty, $key);

		impl XmlPrimitive for $ty {
			const KIND: PrimitiveKind = PrimitiveKind::Float;

			fn to_xml_text(&self) -> String {
				if self.is_nan() {
					"NaN".to_owned()
				} else if self.is_infinite() {
					let text = if *self > 0.0 { "INF" } else { "-INF" };
					text.to_owned()
				} else {
					self.to_string()
				}
			}

			fn from_xml_text(text: &str) -> std::result::Result<Self, Cow<'static, str>> {
				match text {
					"INF" => Ok(<$ty>::INFINITY),
					"-INF" => Ok(<$ty>::NEG_INFINITY),
					"NaN" => Ok(<$ty>::NAN),
					_ => text.parse().map_err(|e: std::num::ParseFloatError| Cow::Owned(e.to_string())),
				}
			}
		}
	)*};
}

floats! {
	f32 => "f32",
	f64 => "f64",
}

primitive_type!(bool, "bool");

impl XmlPrimitive for bool {
	const KIND: PrimitiveKind = PrimitiveKind::Boolean;

	fn to_xml_text(&self) -> String {
		let text = if *self { "true" } else { "false" };
		text.to_owned()
	}

	fn from_xml_text(text: &str) -> std::result::Result<Self, Cow<'static, str>> {
		match text {
			"true" | "1" => Ok(true),
			"false" | "0" => Ok(false),
			_ => Err(Cow::Borrowed("expected true, false, 1 or 0")),
		}
	}
}

primitive_type!(char, "char");

impl XmlPrimitive for char {
	const KIND: PrimitiveKind = PrimitiveKind::Character;

	fn to_xml_text(&self) -> String {
		self.to_string()
	}

	fn from_xml_text(text: &str) -> std::result::Result<Self, Cow<'static, str>> {
		let mut chars = text.chars();
		match (chars.next(), chars.next()) {
			(Some(c), None) => Ok(c),
			_ => Err(Cow::Borrowed("expected a single character")),
		}
	}
}

primitive_type!(String, "String");

impl XmlPrimitive for String {
	const KIND: PrimitiveKind = PrimitiveKind::String;

	fn to_xml_text(&self) -> String {
		self.clone()
	}

	fn from_xml_text(text: &str) -> std::result::Result<Self, Cow<'static, str>> {
		Ok(text.to_owned())
	}
}

macro_rules! chrono_naive {
	($($ty:ty => $key:literal, $kind:ident, $format:literal;)*) => {$(
		primitive_type!($ty, $key);

		impl XmlPrimitive for $ty {
			const KIND: PrimitiveKind = PrimitiveKind::$kind;

			fn to_xml_text(&self) -> String {
				self.format($format).to_string()
			}

			fn from_xml_text(text: &str) -> std::result::Result<Self, Cow<'static, str>> {
				<$ty>::parse_from_str(text, $format).map_err(|e| Cow::Owned(e.to_string()))
			}
		}
	)*};
}

chrono_naive! {
	NaiveDate => "NaiveDate", Date, "%Y-%m-%d";
	NaiveTime => "NaiveTime", Time, "%H:%M:%S%.f";
	NaiveDateTime => "NaiveDateTime", DateTime, "%Y-%m-%dT%H:%M:%S%.f";
}

primitive_type!(DateTime<Utc>, "DateTime<Utc>");

impl XmlPrimitive for DateTime<Utc> {
	const KIND: PrimitiveKind = PrimitiveKind::DateTime;

	fn to_xml_text(&self) -> String {
		self.to_rfc3339_opts(SecondsFormat::AutoSi, true)
	}

	fn from_xml_text(text: &str) -> std::result::Result<Self, Cow<'static, str>> {
		DateTime::parse_from_rfc3339(text)
			.map(|dt| dt.with_timezone(&Utc))
			.map_err(|e| Cow::Owned(e.to_string()))
	}
}

primitive_type!(DateTime<FixedOffset>, "DateTime<FixedOffset>");

impl XmlPrimitive for DateTime<FixedOffset> {
	const KIND: PrimitiveKind = PrimitiveKind::DateTime;

	fn to_xml_text(&self) -> String {
		self.to_rfc3339_opts(SecondsFormat::AutoSi, false)
	}

	fn from_xml_text(text: &str) -> std::result::Result<Self, Cow<'static, str>> {
		DateTime::parse_from_rfc3339(text).map_err(|e| Cow::Owned(e.to_string()))
	}
}

/// Binary data mapped as base64 text
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct Base64Binary(pub Vec<u8>);

primitive_type!(Base64Binary, "Base64Binary");

impl XmlPrimitive for Base64Binary {
	const KIND: PrimitiveKind = PrimitiveKind::Binary;

	fn to_xml_text(&self) -> String {
		base64::engine::general_purpose::STANDARD.encode(&self.0)
	}

	fn from_xml_text(text: &str) -> std::result::Result<Self, Cow<'static, str>> {
		base64::engine::general_purpose::STANDARD
			.decode(text)
			.map(Base64Binary)
			.map_err(|e| Cow::Owned(e.to_string()))
	}
}

impl<T: XmlType> XmlType for Option<T> {
	fn type_key() -> TypeKey {
		TypeKey::owned(format!("Option<{}>", T::type_key()))
	}

	fn descriptor() -> TypeDescriptor {
		TypeDescriptor::new(
			Self::type_key(),
			"Option",
			TypeShape::Nullable(NullableShape {
				inner: TypeHandle::of::<T>(),
				get: option_get::<T>,
				wrap: option_wrap::<T>,
			}),
		)
	}
}

fn option_get<T: XmlType>(value: &dyn Any) -> Result<Option<&dyn Any>> {
	Ok(downcast_ref::<Option<T>>(value)?.as_ref().map(|v| v as &dyn Any))
}

fn option_wrap<T: XmlType>(value: Option<Value>) -> Result<Value> {
	let value: Option<T> = match value {
		Some(v) => Some(downcast::<T>(v)?),
		None => None,
	};
	Ok(Box::new(value))
}

macro_rules! concrete_collection {
	($coll:ident, $name:literal, $push:ident $(, $bound:path)*) => {
		impl<T: XmlType $(+ $bound)*> XmlType for $coll<T> {
			fn type_key() -> TypeKey {
				TypeKey::owned(format!(concat!($name, "<{}>"), T::type_key()))
			}

			fn descriptor() -> TypeDescriptor {
				TypeDescriptor::new(
					Self::type_key(),
					$name,
					TypeShape::Collection(CollectionShape {
						item: TypeHandle::of::<T>(),
						items: |value| Ok(downcast_ref::<$coll<T>>(value)?.iter().map(|i| i as &dyn Any).collect()),
						build: CollectionBuild::Concrete {
							create: || Box::new($coll::<T>::new()),
							push: |coll, item| {
								downcast_mut::<$coll<T>>(coll)?.$push(downcast::<T>(item)?);
								Ok(())
							},
						},
					}),
				)
			}
		}
	};
}

concrete_collection!(Vec, "Vec", push);
concrete_collection!(VecDeque, "VecDeque", push_back);
concrete_collection!(BTreeSet, "BTreeSet", insert, Ord);
concrete_collection!(HashSet, "HashSet", insert, Eq, Hash);

impl<T: XmlType> XmlType for Box<[T]> {
	fn type_key() -> TypeKey {
		TypeKey::owned(format!("Box<[{}]>", T::type_key()))
	}

	fn descriptor() -> TypeDescriptor {
		TypeDescriptor::new(
			Self::type_key(),
			"Array",
			TypeShape::Collection(CollectionShape {
				item: TypeHandle::of::<T>(),
				items: |value| Ok(downcast_ref::<Box<[T]>>(value)?.iter().map(|i| i as &dyn Any).collect()),
				build: CollectionBuild::FromSequence(|items| {
					let items = items.into_iter().map(downcast::<T>).collect::<Result<Vec<T>>>()?;
					Ok(Box::new(items.into_boxed_slice()))
				}),
			}),
		)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn parse<T: XmlPrimitive>(text: &str) -> Result<T> {
		downcast::<T>(parse_primitive::<T>(text)?)
	}

	fn format<T: XmlPrimitive>(value: T) -> String {
		format_primitive::<T>(&value).unwrap()
	}

	#[test]
	fn numbers() {
		assert_eq!(parse::<i32>(" 42 ").unwrap(), 42);
		assert!(parse::<u8>("256").is_err());
		assert_eq!(format(f64::INFINITY), "INF");
		assert_eq!(parse::<f64>("-INF").unwrap(), f64::NEG_INFINITY);
		assert!(parse::<f32>("NaN").unwrap().is_nan());
		assert_eq!(format(1.5f32), "1.5");
	}

	#[test]
	fn strings_keep_whitespace() {
		assert_eq!(parse::<String>(" a b ").unwrap(), " a b ");
		assert_eq!(parse::<char>(" ").unwrap(), ' ');
		assert!(parse::<char>("ab").is_err());
	}

	#[test]
	fn dates() {
		let date = NaiveDate::from_ymd_opt(2011, 11, 10).unwrap();
		assert_eq!(format(date), "2011-11-10");
		let dt = date.and_hms_opt(1, 2, 3).unwrap();
		assert_eq!(format(dt), "2011-11-10T01:02:03");
		assert_eq!(parse::<NaiveDateTime>("2011-11-10T01:02:03").unwrap(), dt);
		let utc = parse::<DateTime<Utc>>("2024-01-23T10:00:00+02:00").unwrap();
		assert_eq!(format(utc), "2024-01-23T08:00:00Z");
	}

	#[test]
	fn binary() {
		assert_eq!(format(Base64Binary(b"hello".to_vec())), "aGVsbG8=");
		assert_eq!(parse::<Base64Binary>("aGVsbG8=").unwrap().0, b"hello");
		assert!(parse::<Base64Binary>("***").is_err());
	}

	#[test]
	fn bools() {
		assert!(parse::<bool>("1").unwrap());
		assert!(!parse::<bool>(" false").unwrap());
		assert!(parse::<bool>("yes").is_err());
	}

	#[test]
	fn generic_keys() {
		assert_eq!(<Vec<Option<i32>>>::type_key().as_str(), "Vec<Option<i32>>");
		assert_eq!(<Box<[String]>>::type_key().as_str(), "Box<[String]>");
	}
}
