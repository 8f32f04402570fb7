//! Per-call plumbing between converters
//!
//! Converters don't write element or attribute wrappers themselves; they call back into the
//! [`SerializationContext`] for nested values, which applies the null, default and type
//! marker policies and picks the converter for the nested contract.

use crate::{
	contract::{
		Contract,
		ContractKind,
		MappingKind,
		Property,
		XmlMember,
	},
	converters::ConverterRegistry,
	name::QualifiedName,
	settings::{
		DefaultValueHandling,
		DeserializedEvent,
		NullValueHandling,
		XmlSettings,
	},
	type_handling::TypeHandlingResolver,
	types::{
		DefaultValue,
		TypeHandle,
		TypeShape,
		Value,
	},
	xml::{
		XmlReader,
		XmlWriter,
	},
	Error,
	Result,
};
use std::{
	any::Any,
	sync::Arc,
};

/// Configuration and converters used by a single serialize or deserialize call
pub struct SerializationContext<'s> {
	settings: &'s XmlSettings,
	converters: &'s ConverterRegistry,
}

impl<'s> SerializationContext<'s> {
	/// Context over settings and converters
	pub fn new(settings: &'s XmlSettings, converters: &'s ConverterRegistry) -> Self {
		Self { settings, converters }
	}

	/// Settings of the call
	pub fn settings(&self) -> &'s XmlSettings {
		self.settings
	}

	/// Converters of the call
	pub fn converters(&self) -> &'s ConverterRegistry {
		self.converters
	}

	/// Contract of a type
	pub fn resolve(&self, handle: TypeHandle) -> Result<Arc<Contract>> {
		self.settings.resolver().resolve(handle)
	}

	/// Type marker resolution
	pub fn type_handling(&self) -> TypeHandlingResolver<'s> {
		TypeHandlingResolver::new(self.settings)
	}

	fn null_handling(&self, member: &XmlMember) -> NullValueHandling {
		member.null_handling.unwrap_or(self.settings.null_handling)
	}

	fn default_handling(&self, member: &XmlMember) -> DefaultValueHandling {
		member.default_handling.unwrap_or(self.settings.default_handling)
	}

	/// Write a value at the place described by `member`
	pub fn serialize(&self, writer: &mut XmlWriter, value: &dyn Any, member: &XmlMember) -> Result<()> {
		let mut declared = self.resolve(member.value_type)?;

		if let Some(default) = &member.default {
			if self.default_handling(member) == DefaultValueHandling::Ignore && self.is_default(value, &declared, default)? {
				return Ok(());
			}
		}

		let mut value = value;
		while let TypeShape::Nullable(shape) = &declared.shape {
			let shape = *shape;
			match (shape.get)(value)? {
				Some(inner) => {
					value = inner;
					declared = self.resolve(shape.inner)?;
				},
				None => return self.write_null(writer, member),
			}
		}

		let (value, runtime) = match declared.polymorphic() {
			Some(shape) => {
				let (inner, handle) = (shape.resolve)(value)?;
				(inner, self.resolve(handle)?)
			},
			None => (value, declared.clone()),
		};
		let converter = self.converters.select_for_write(&runtime)?;

		match member.mapping {
			MappingKind::Element => {
				writer.start_element(&member.name)?;
				if let Some(marker) = self.type_handling().marker_for_write(member, &declared, &runtime) {
					writer.write_attribute(&QualifiedName::XSI_TYPE, &marker)?;
				}
				converter.write(writer, value, member, &runtime, self)?;
				writer.end_element()
			},
			MappingKind::Attribute => {
				writer.start_attribute(&member.name)?;
				converter.write(writer, value, member, &runtime, self)?;
				writer.end_attribute()
			},
			MappingKind::InnerText => converter.write(writer, value, member, &runtime, self),
		}
	}

	fn write_null(&self, writer: &mut XmlWriter, member: &XmlMember) -> Result<()> {
		if member.mapping == MappingKind::Element && self.null_handling(member) == NullValueHandling::Include {
			writer.start_element(&member.name)?;
			writer.write_attribute(&QualifiedName::XSI_NIL, "true")?;
			writer.end_element()?;
		}
		Ok(())
	}

	fn is_default(&self, value: &dyn Any, contract: &Contract, default: &DefaultValue) -> Result<bool> {
		let default = default.make();
		self.same_value(value, &*default, contract)
	}

	// only primitives and enums (and optional ones) compare equal
	fn same_value(&self, a: &dyn Any, b: &dyn Any, contract: &Contract) -> Result<bool> {
		match &contract.shape {
			TypeShape::Primitive(shape) => Ok((shape.format)(a)? == (shape.format)(b)?),
			TypeShape::Enum(shape) => Ok((shape.index_of)(a)? == (shape.index_of)(b)?),
			TypeShape::Nullable(shape) => match ((shape.get)(a)?, (shape.get)(b)?) {
				(None, None) => Ok(true),
				(Some(a), Some(b)) => self.same_value(a, b, &*self.resolve(shape.inner)?),
				_ => Ok(false),
			},
			TypeShape::Collection(_) | TypeShape::Object(_) => Ok(false),
		}
	}

	/// Write the items of a collection property as repeated elements without wrapper
	pub fn serialize_items(&self, writer: &mut XmlWriter, value: &dyn Any, property: &Property) -> Result<()> {
		let (slot, item) = match (&property.collection, &property.item) {
			(Some(slot), Some(item)) => (slot, item),
			_ => return self.serialize(writer, value, &property.member),
		};
		let collection = match &slot.nullable {
			Some(nullable) => match (nullable.get)(value)? {
				Some(collection) => collection,
				None => return Ok(()),
			},
			None => value,
		};
		for item_value in (slot.shape.items)(collection)? {
			self.serialize(writer, item_value, item)?;
		}
		Ok(())
	}

	/// Read a value from the place described by `member`
	///
	/// For element mapping the reader must be positioned at the start tag, and the whole
	/// element is consumed. For attribute mapping the reader must be positioned at the
	/// attribute.
	pub fn deserialize(&self, reader: &mut XmlReader, member: &XmlMember) -> Result<Value> {
		let declared = self.resolve(member.value_type)?;
		if member.mapping == MappingKind::Element && reader.is_nil() {
			reader.skip();
			return match declared.nullable() {
				Some(shape) => (shape.wrap)(None),
				None => Err(Error::nil_not_allowed(&member.name.to_string(), declared.key().clone())),
			};
		}
		self.read_as(reader, member, &declared)
	}

	/// Read a value of the declared contract, honoring type markers on elements
	pub fn read_as(&self, reader: &mut XmlReader, member: &XmlMember, declared: &Contract) -> Result<Value> {
		if member.mapping == MappingKind::Element && declared.kind() != ContractKind::Nullable {
			if let Some(marker) = reader.type_marker().map(str::to_owned) {
				let type_handling = self.type_handling();
				if let Some(handle) = type_handling.resolve_marker(&marker, member, declared)? {
					let resolved = self.resolve(handle)?;
					let value = self.converters.select_for_read(&resolved)?.read(reader, member, &resolved, self)?;
					return type_handling.upcast(value, &resolved, declared);
				}
			}
		}
		self.converters.select_for_read(declared)?.read(reader, member, declared, self)
	}

	/// Whether a property of `target` should be written
	pub fn should_serialize(&self, target: &dyn Any, property: &Property) -> bool {
		if let Some(gate) = &property.should_serialize {
			if !gate(target) {
				return false;
			}
		}
		match self.settings.should_serialize_hook() {
			Some(hook) => hook(target, property.descriptor()),
			None => true,
		}
	}

	/// Notify the host that a property was matched
	pub fn on_deserialized(&self, line: usize, property: &Property, xml_name: &str) {
		if let Some(hook) = self.settings.deserialized_hook() {
			hook(&DeserializedEvent {
				line,
				member: property.descriptor(),
				xml_name,
			});
		}
	}

	/// Handle a child element no property matched
	///
	/// The element is skipped unless the unknown element hook consumed it. A hook leaving the
	/// reader inside the element is a document error.
	pub fn unknown_element(&self, reader: &mut XmlReader, target: &mut dyn Any) -> Result<()> {
		let position = reader.position();
		let depth = reader.depth();
		if let Some(hook) = self.settings.unknown_element_hook() {
			hook(reader, target)?;
		}
		if reader.position() != position && reader.depth() != depth {
			return Err(Error::document(format!(
				"unknown element handler stopped inside the element (line {})",
				reader.line()
			)));
		}
		if reader.position() == position {
			tracing::trace!(element = reader.local_name(), line = reader.line(), "skipping unknown element");
			reader.skip();
		}
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use crate::{
		errors::MappingError,
		settings::{
			DefaultValueHandling,
			NullValueHandling,
		},
		test_struct::*,
		Error,
		XmlSerializer,
		XmlSettings,
	};

	fn serializer(settings: XmlSettings) -> XmlSerializer {
		let mut settings = settings;
		settings.omit_xml_declaration = true;
		XmlSerializer::with_settings(settings)
	}

	#[test]
	fn null_ignored() {
		let xml = serializer(XmlSettings::new()).to_xml(&Holder::default()).unwrap();
		assert_eq!(
			xml,
			r#"<holder xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" level="Low"><count>0</count></holder>"#
		);
	}

	#[test]
	fn null_included_default_ignored() {
		let mut settings = XmlSettings::new();
		settings.null_handling = NullValueHandling::Include;
		settings.default_handling = DefaultValueHandling::Ignore;
		let holder = Holder {
			count: 10,
			..Holder::default()
		};
		let xml = serializer(settings).to_xml(&holder).unwrap();
		assert_eq!(
			xml,
			r#"<holder xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" level="Low"><note xsi:nil="true"/></holder>"#
		);
	}

	#[test]
	fn default_ignored_only_if_equal() {
		let mut settings = XmlSettings::new();
		settings.default_handling = DefaultValueHandling::Ignore;
		let holder = Holder {
			note: Some(String::from("n")),
			count: 3,
			..Holder::default()
		};
		let xml = serializer(settings).to_xml(&holder).unwrap();
		assert!(xml.ends_with("<note>n</note><count>3</count></holder>"));
	}

	#[test]
	fn optional_default_compared() {
		let mut settings = XmlSettings::new();
		settings.default_handling = DefaultValueHandling::Ignore;
		let serializer = serializer(settings);
		let xml = serializer.to_xml(&Reminder { note: Reminder::default_note() }).unwrap();
		assert!(xml.ends_with("/>"), "{}", xml);
		let xml = serializer.to_xml(&Reminder { note: None }).unwrap();
		assert!(xml.ends_with("/>"), "{}", xml);
		let xml = serializer
			.to_xml(&Reminder {
				note: Some(String::from("call")),
			})
			.unwrap();
		assert!(xml.ends_with("><note>call</note></reminder>"), "{}", xml);
	}

	#[test]
	fn nil_reads_as_none() {
		let holder: Holder = serializer(XmlSettings::new())
			.from_xml(r#"<holder xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" level="HIGH"><note xsi:nil="true"/><count>4</count></holder>"#)
			.unwrap();
		assert_eq!(
			holder,
			Holder {
				level: Level::High,
				note: None,
				count: 4,
			}
		);
	}

	#[test]
	fn nil_not_allowed() {
		let err = serializer(XmlSettings::new())
			.from_xml::<Foo>(r#"<foo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><id xsi:nil="1"/></foo>"#)
			.unwrap_err();
		assert!(matches!(err, Error::Mapping(MappingError::NilNotAllowed(..))), "{:?}", err);
	}

	#[test]
	fn null_root() {
		let mut settings = XmlSettings::new();
		settings.null_handling = NullValueHandling::Include;
		let xml = serializer(settings).to_xml::<Option<Foo>>(&None).unwrap();
		assert_eq!(xml, r#"<foo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:nil="true"/>"#);
		assert_eq!(serializer(XmlSettings::new()).from_xml::<Option<Foo>>(&xml).unwrap(), None);
	}

	#[test]
	fn should_serialize_gate_and_hook() {
		let gated = Gated {
			name: String::from("a"),
			note: String::new(),
		};
		let xml = serializer(XmlSettings::new()).to_xml(&gated).unwrap();
		assert!(xml.ends_with("><name>a</name></gated>"));

		let gated = Gated {
			note: String::from("b"),
			..gated
		};
		let xml = serializer(XmlSettings::new()).to_xml(&gated).unwrap();
		assert!(xml.ends_with("><name>a</name><note>b</note></gated>"));

		let settings = XmlSettings::new().on_should_serialize(|_, member| member.name != "name");
		let xml = serializer(settings).to_xml(&gated).unwrap();
		assert!(xml.ends_with("><note>b</note></gated>"));
	}

	#[test]
	fn unknown_element_partially_consumed() {
		let document = "<foo><extra><id>5</id></extra><id>1</id><name>test</name></foo>";

		// only the start tag
		let settings = XmlSettings::new().on_unknown_element(|reader, _target| {
			reader.read();
			Ok(())
		});
		let err = serializer(settings).from_xml::<Foo>(document).unwrap_err();
		assert!(matches!(err, Error::Document(_)), "{:?}", err);

		let settings = XmlSettings::new().on_unknown_element(|reader, _target| {
			reader.skip();
			Ok(())
		});
		assert_eq!(serializer(settings).from_xml::<Foo>(document).unwrap(), Foo::sample());
	}
}
