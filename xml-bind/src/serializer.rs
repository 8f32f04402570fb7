//! Entry points: values to documents and back

use crate::{
	context::SerializationContext,
	converters::{
		ConverterRegistry,
		XmlConverter,
	},
	settings::XmlSettings,
	types::{
		downcast,
		XmlType,
	},
	xml::{
		XmlReader,
		XmlWriter,
	},
	Error,
	Result,
};
use std::io;

/// Serializes values to XML documents and back
///
/// ```
/// use xml_bind::{XmlSerializer, XmlType};
///
/// #[derive(XmlType, Default, PartialEq, Debug)]
/// #[xml(rename = "foo")]
/// struct Foo {
/// 	id: i32,
/// 	name: String,
/// }
///
/// let serializer = XmlSerializer::new();
/// let foo = Foo { id: 1, name: "test".into() };
/// let xml = serializer.to_xml(&foo).unwrap();
/// assert!(xml.ends_with("<foo xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"><id>1</id><name>test</name></foo>"));
/// assert_eq!(serializer.from_xml::<Foo>(&xml).unwrap(), foo);
/// ```
#[derive(Clone, Debug, Default)]
pub struct XmlSerializer {
	settings: XmlSettings,
	converters: ConverterRegistry,
}

impl XmlSerializer {
	/// Serializer with default settings
	pub fn new() -> Self {
		Self::default()
	}

	/// Serializer with the given settings
	pub fn with_settings(settings: XmlSettings) -> Self {
		Self {
			settings,
			converters: ConverterRegistry::default(),
		}
	}

	/// Settings
	pub fn settings(&self) -> &XmlSettings {
		&self.settings
	}

	/// Mutable settings
	pub fn settings_mut(&mut self) -> &mut XmlSettings {
		&mut self.settings
	}

	/// Add a custom converter ahead of the builtin converters
	pub fn with_converter<C: XmlConverter + 'static>(mut self, converter: C) -> Self {
		self.converters.prepend(converter);
		self
	}

	/// Converter registry
	pub fn converters_mut(&mut self) -> &mut ConverterRegistry {
		&mut self.converters
	}

	fn context(&self) -> SerializationContext<'_> {
		SerializationContext::new(&self.settings, &self.converters)
	}

	/// Serialize a value into a document string
	///
	/// The root element is named after the type (or its explicit root name).
	pub fn to_xml<T: XmlType>(&self, value: &T) -> Result<String> {
		let ctx = self.context();
		let contract = self.settings.resolver().resolve_type::<T>()?;
		let mut writer = XmlWriter::new(&self.settings);
		if !self.settings.omit_xml_declaration {
			writer.write_declaration()?;
		}
		ctx.serialize(&mut writer, value, &contract.root_member())?;
		writer.into_string()
	}

	/// Serialize a value into a writer
	///
	/// Nothing is written if serialization fails.
	pub fn serialize<T: XmlType, W: io::Write>(&self, mut output: W, value: &T) -> Result<()> {
		let document = self.to_xml(value)?;
		output.write_all(document.as_bytes())?;
		Ok(())
	}

	/// Deserialize a value from a document string
	///
	/// The name of the root element isn't checked. An empty document deserializes into
	/// `None` for optional types.
	pub fn from_xml<T: XmlType>(&self, input: &str) -> Result<T> {
		self.read_document(XmlReader::from_str(input)?)
	}

	/// Deserialize a value from a reader
	pub fn deserialize<T: XmlType, R: io::BufRead>(&self, input: R) -> Result<T> {
		self.read_document(XmlReader::from_reader(input)?)
	}

	fn read_document<T: XmlType>(&self, mut reader: XmlReader) -> Result<T> {
		let ctx = self.context();
		let contract = self.settings.resolver().resolve_type::<T>()?;
		if !reader.move_to_content() {
			return match contract.nullable() {
				Some(shape) => downcast::<T>((shape.wrap)(None)?),
				None => Err(Error::unexpected_eof("empty document")),
			};
		}
		if !reader.is_start_element() {
			return Err(Error::document("text outside of the root element"));
		}
		let value = ctx.deserialize(&mut reader, &contract.root_member())?;
		if reader.move_to_content() {
			return Err(Error::document("content after the root element"));
		}
		downcast::<T>(value)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		name::NamingConvention,
		test_struct::*,
		types::Base64Binary,
	};

	#[test]
	fn serialize_to_writer() {
		let serializer = XmlSerializer::new();
		let mut output = Vec::new();
		serializer.serialize(&mut output, &Foo::sample()).unwrap();
		assert_eq!(String::from_utf8(output).unwrap(), Foo::SAMPLE_DOCUMENT);
	}

	#[test]
	fn deserialize_from_reader() {
		let serializer = XmlSerializer::new();
		let foo: Foo = serializer.deserialize(Foo::SAMPLE_DOCUMENT.as_bytes()).unwrap();
		assert_eq!(foo, Foo::sample());
	}

	#[test]
	fn empty_document() {
		let serializer = XmlSerializer::new();
		assert_eq!(serializer.from_xml::<Option<Foo>>("").unwrap(), None);
		assert!(serializer.from_xml::<Foo>("  ").is_err());
	}

	#[test]
	fn trailing_content() {
		let serializer = XmlSerializer::new();
		assert!(serializer.from_xml::<Foo>("<foo/><foo/>").is_err());
		assert!(serializer.from_xml::<Foo>("text<foo/>").is_err());
	}

	fn without_declaration() -> XmlSerializer {
		let mut serializer = XmlSerializer::new();
		serializer.settings_mut().omit_xml_declaration = true;
		serializer
	}

	#[test]
	fn namespaces() {
		let serializer = without_declaration();
		let sample = Sample {
			id: 7,
			value: String::from("x"),
		};
		assert_eq!(serializer.to_xml(&sample).unwrap(), Sample::SAMPLE_DOCUMENT);
		assert_eq!(serializer.from_xml::<Sample>(Sample::SAMPLE_DOCUMENT).unwrap(), sample);

		// attribute in the wrong namespace doesn't match
		let other: Sample = serializer
			.from_xml(r#"<sample xmlns="http://example.org" id="7"><value>x</value></sample>"#)
			.unwrap();
		assert_eq!(other.id, 0);
	}

	#[test]
	fn naming_convention() {
		let mut settings = XmlSettings::new().with_naming(NamingConvention::CamelCase);
		settings.omit_xml_declaration = true;
		let serializer = XmlSerializer::with_settings(settings);
		let person = Person {
			first_name: String::from("Ann"),
			level: Level::High,
		};
		let xml = serializer.to_xml(&person).unwrap();
		assert_eq!(
			xml,
			r#"<person xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><firstName>Ann</firstName><level>HIGH</level></person>"#
		);
		let person: Person = serializer
			.from_xml("<person><firstName>Bob</firstName><level>low</level></person>")
			.unwrap();
		assert_eq!(person.first_name, "Bob");
		assert_eq!(person.level, Level::Low);
	}

	#[test]
	fn enum_root() {
		let serializer = without_declaration();
		let xml = serializer.to_xml(&Level::High).unwrap();
		assert_eq!(xml, r#"<Level xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">HIGH</Level>"#);
		assert_eq!(serializer.from_xml::<Level>(&xml).unwrap(), Level::High);
		assert!(serializer.from_xml::<Level>("<Level>High</Level>").is_err());
	}

	#[test]
	fn collection_root() {
		let serializer = without_declaration();
		let xml = serializer.to_xml(&vec![1, 2]).unwrap();
		assert_eq!(xml, r#"<Vec xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><i32>1</i32><i32>2</i32></Vec>"#);
		assert_eq!(serializer.from_xml::<Vec<i32>>(&xml).unwrap(), vec![1, 2]);
	}

	#[test]
	fn dates_and_binary() {
		let serializer = without_declaration();
		let event = Event {
			at: chrono::NaiveDate::from_ymd_opt(2011, 11, 10)
				.and_then(|d| d.and_hms_opt(1, 2, 3))
				.unwrap(),
			payload: Base64Binary(b"hello".to_vec()),
		};
		let xml = serializer.to_xml(&event).unwrap();
		assert!(
			xml.ends_with("><at>2011-11-10T01:02:03</at><payload>aGVsbG8=</payload></event>"),
			"{}",
			xml
		);
		assert_eq!(serializer.from_xml::<Event>(&xml).unwrap(), event);
	}

	#[test]
	fn escaping() {
		let serializer = without_declaration();
		let foo = Foo {
			id: 2,
			name: String::from("a < b & \"c\""),
		};
		let xml = serializer.to_xml(&foo).unwrap();
		assert!(xml.contains("<name>a &lt; b &amp; &quot;c&quot;</name>"), "{}", xml);
		assert_eq!(serializer.from_xml::<Foo>(&xml).unwrap(), foo);
	}
}
