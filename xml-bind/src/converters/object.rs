use crate::{
	contract::{
		Contract,
		ContractKind,
		MappingKind,
		Property,
		XmlMember,
	},
	context::SerializationContext,
	converters::{
		CollectionProxy,
		XmlConverter,
	},
	name::XSI_NAMESPACE,
	types::Value,
	xml::{
		XmlReader,
		XmlWriter,
	},
	Error,
	Result,
};
use std::any::Any;

/// Read state of one property
enum Slot {
	Unmatched,
	Value(Value),
	Collection(CollectionProxy),
}

fn find_attribute<'c>(contract: &'c Contract, local: &str, namespace: Option<&str>) -> Option<(usize, &'c Property)> {
	contract.properties().iter().enumerate().find(|(_, p)| {
		p.mapping() == MappingKind::Attribute && p.descriptor().can_write && p.xml_name().matches(local, namespace)
	})
}

fn find_element<'c>(contract: &'c Contract, local: &str, namespace: Option<&str>) -> Option<(usize, &'c Property)> {
	contract.properties().iter().enumerate().find(|(_, p)| {
		p.mapping() == MappingKind::Element && p.descriptor().can_write && p.match_name().matches(local, namespace)
	})
}

/// Composite types: attributes and child elements per property
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectConverter;

impl ObjectConverter {
	fn read_attributes(
		&self,
		reader: &mut XmlReader,
		contract: &Contract,
		slots: &mut [Slot],
		ctx: &SerializationContext<'_>,
	) -> Result<()> {
		if !reader.move_to_first_attribute() {
			return Ok(());
		}
		loop {
			if reader.namespace() != Some(XSI_NAMESPACE) {
				let local = reader.local_name().to_owned();
				if let Some((index, property)) = find_attribute(contract, &local, reader.namespace()) {
					slots[index] = Slot::Value(ctx.deserialize(reader, property.member())?);
					ctx.on_deserialized(reader.line(), property, &local);
				}
			}
			if !reader.move_to_next_attribute() {
				break;
			}
		}
		reader.move_to_element();
		Ok(())
	}

	fn read_children(
		&self,
		reader: &mut XmlReader,
		contract: &Contract,
		target: &mut dyn Any,
		slots: &mut [Slot],
		ctx: &SerializationContext<'_>,
	) -> Result<()> {
		reader.read_start_element()?;
		loop {
			if !reader.move_to_content() {
				return Err(Error::unexpected_eof("unclosed element"));
			}
			if reader.is_end_element() {
				return reader.read_end_element();
			}
			if !reader.is_start_element() {
				// text in an element without inner text property
				reader.read();
				continue;
			}
			let local = reader.local_name().to_owned();
			let line = reader.line();
			let (index, property) = match find_element(contract, &local, reader.namespace()) {
				Some(found) => found,
				None => {
					ctx.unknown_element(reader, target)?;
					continue;
				},
			};
			match property.item() {
				Some(item) => {
					if !matches!(slots[index], Slot::Collection(_)) {
						let proxy = CollectionProxy::for_property(property)
							.ok_or_else(|| Error::unexpected_kind(property.descriptor().declared_type.clone()))?;
						slots[index] = Slot::Collection(proxy);
					}
					let value = ctx.deserialize(reader, item)?;
					if let Slot::Collection(proxy) = &mut slots[index] {
						proxy.add(value);
					}
				},
				None => {
					slots[index] = Slot::Value(ctx.deserialize(reader, property.member())?);
				},
			}
			ctx.on_deserialized(line, property, &local);
		}
	}

	fn apply(&self, contract: &Contract, target: &mut dyn Any, slots: Vec<Slot>) -> Result<()> {
		for (property, slot) in contract.properties().iter().zip(slots) {
			match slot {
				Slot::Value(value) => property.set(target, value)?,
				Slot::Collection(proxy) => property.set(target, proxy.finalize()?)?,
				Slot::Unmatched => {
					if !property.descriptor().can_write {
						continue;
					}
					if let Some(default) = &property.member().default {
						property.set(target, default.make())?;
					} else if property.is_required() {
						return Err(Error::required_property_missing(
							property.descriptor().name.clone(),
							contract.key().clone(),
						));
					}
				},
			}
		}
		Ok(())
	}
}

impl XmlConverter for ObjectConverter {
	fn can_read(&self, contract: &Contract) -> bool {
		contract.kind() == ContractKind::Object
	}

	fn can_write(&self, contract: &Contract) -> bool {
		contract.kind() == ContractKind::Object
	}

	fn read(&self, reader: &mut XmlReader, member: &XmlMember, contract: &Contract, ctx: &SerializationContext<'_>) -> Result<Value> {
		if member.mapping != MappingKind::Element {
			return Err(Error::invalid_mapping_kind(contract.key().clone()));
		}
		let mut target = contract.create()?;
		let mut slots: Vec<Slot> = contract.properties().iter().map(|_| Slot::Unmatched).collect();

		self.read_attributes(reader, contract, &mut slots, ctx)?;

		match contract.inner_text_index() {
			// no text to read; the property stays unmatched
			Some(_) if reader.is_empty_element() => reader.skip(),
			Some(index) if contract.properties()[index].descriptor().can_write => {
				let property = &contract.properties()[index];
				let line = reader.line();
				let local = reader.local_name().to_owned();
				slots[index] = Slot::Value(ctx.deserialize(reader, property.member())?);
				ctx.on_deserialized(line, property, &local);
			},
			Some(_) => reader.skip(),
			None => self.read_children(reader, contract, &mut *target, &mut slots, ctx)?,
		}

		self.apply(contract, &mut *target, slots)?;
		Ok(target)
	}

	fn write(
		&self,
		writer: &mut XmlWriter,
		value: &dyn Any,
		member: &XmlMember,
		contract: &Contract,
		ctx: &SerializationContext<'_>,
	) -> Result<()> {
		if member.mapping != MappingKind::Element {
			return Err(Error::invalid_mapping_kind(contract.key().clone()));
		}
		for property in contract.properties() {
			let descriptor = property.descriptor();
			if !descriptor.can_read || !descriptor.can_write || !ctx.should_serialize(value, property) {
				continue;
			}
			let property_value = property.get(value)?;
			if property.is_collection() {
				ctx.serialize_items(writer, property_value.as_any(), property)?;
			} else {
				ctx.serialize(writer, property_value.as_any(), property.member())?;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use crate::{
		errors::MappingError,
		test_struct::*,
		Error,
		XmlSerializer,
		XmlSettings,
	};
	use parking_lot::Mutex;
	use std::sync::Arc;

	fn serializer() -> XmlSerializer {
		let mut settings = XmlSettings::new();
		settings.omit_xml_declaration = true;
		XmlSerializer::with_settings(settings)
	}

	#[test]
	fn base_members_first() {
		let record = Record {
			base: BaseRecord {
				test2: String::from("b"),
			},
			test1: String::from("a"),
		};
		let xml = serializer().to_xml(&record).unwrap();
		assert!(xml.ends_with("><test2>b</test2><test1>a</test1></record>"), "{}", xml);
		assert_eq!(serializer().from_xml::<Record>(&xml).unwrap(), record);
	}

	#[test]
	fn explicit_order() {
		let xml = serializer().to_xml(&Ordered::default()).unwrap();
		assert!(xml.ends_with(r#" flag="false"><first>0</first><last>0</last></ordered>"#), "{}", xml);
	}

	#[test]
	fn inner_text() {
		let price: Price = serializer().from_xml(r#"<price currency="EUR"> 2.5 </price>"#).unwrap();
		assert_eq!(
			price,
			Price {
				currency: String::from("EUR"),
				amount: 2.5,
			}
		);
		let xml = serializer().to_xml(&price).unwrap();
		assert!(xml.ends_with(r#" currency="EUR">2.5</price>"#), "{}", xml);
	}

	#[test]
	fn empty_inner_text() {
		let price: Price = serializer().from_xml(r#"<price currency="EUR"/>"#).unwrap();
		assert_eq!(
			price,
			Price {
				currency: String::from("EUR"),
				amount: 0.0,
			}
		);

		let err = serializer().from_xml::<Measure>(r#"<measure unit="m"/>"#).unwrap_err();
		match err {
			Error::Mapping(MappingError::RequiredPropertyMissing { property, declaring_type }) => {
				assert_eq!(property, "value");
				assert_eq!(declaring_type.as_str(), "Measure");
			},
			err => panic!("unexpected error: {:?}", err),
		}
		let measure: Measure = serializer().from_xml(r#"<measure unit="m">1.5</measure>"#).unwrap();
		assert_eq!(measure.value, 1.5);
	}

	#[test]
	fn collections() {
		let bag = Bag {
			tags: vec![String::from("a"), String::from("b")],
			numbers: vec![1, 2],
			extras: Some(vec![String::from("x")]),
		};
		let xml = serializer().to_xml(&bag).unwrap();
		assert!(
			xml.ends_with("><tag>a</tag><tag>b</tag><numbers><i32>1</i32><i32>2</i32></numbers><extra>x</extra></bag>"),
			"{}",
			xml
		);
		assert_eq!(serializer().from_xml::<Bag>(&xml).unwrap(), bag);

		// interleaved items are still collected in document order
		let bag: Bag = serializer()
			.from_xml("<bag><tag>a</tag><numbers/><tag>b</tag></bag>")
			.unwrap();
		assert_eq!(bag.tags, vec!["a", "b"]);
		assert!(bag.numbers.is_empty());
		assert_eq!(bag.extras, None);
	}

	#[test]
	fn unknown_elements_skipped() {
		let foo: Foo = serializer()
			.from_xml("<foo><other><id>5</id></other><id>1</id>text<name>test</name></foo>")
			.unwrap();
		assert_eq!(foo, Foo::sample());
	}

	#[test]
	fn unknown_element_hook() {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let hook_seen = seen.clone();
		let mut settings = XmlSettings::new().on_unknown_element(move |reader, _target| {
			hook_seen.lock().push(reader.local_name().to_owned());
			Ok(())
		});
		settings.omit_xml_declaration = true;
		let foo: Foo = XmlSerializer::with_settings(settings)
			.from_xml("<foo><id>1</id><extra>1</extra><name>test</name><more/></foo>")
			.unwrap();
		assert_eq!(foo, Foo::sample());
		assert_eq!(*seen.lock(), vec!["extra", "more"]);
	}

	#[test]
	fn required_and_defaults() {
		let config: Config = serializer().from_xml("<config><name>n</name></config>").unwrap();
		assert_eq!(
			config,
			Config {
				name: String::from("n"),
				port: 8080,
				level: Level::Low,
			}
		);

		let err = serializer().from_xml::<Config>(r#"<config port="1"/>"#).unwrap_err();
		match err {
			Error::Mapping(MappingError::RequiredPropertyMissing { property, .. }) => assert_eq!(property, "name"),
			err => panic!("unexpected error: {:?}", err),
		}
	}

	#[test]
	fn deserialized_hook() {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let hook_seen = seen.clone();
		let mut settings = XmlSettings::new().on_deserialized(move |event| {
			hook_seen.lock().push((event.line, event.member.name.to_string(), event.xml_name.to_owned()));
		});
		settings.omit_xml_declaration = true;
		let _: Holder = XmlSerializer::with_settings(settings)
			.from_xml("<holder level=\"HIGH\">\n<count>1</count>\n</holder>")
			.unwrap();
		assert_eq!(
			*seen.lock(),
			vec![
				(1, String::from("level"), String::from("level")),
				(2, String::from("count"), String::from("count")),
			]
		);
	}

	#[test]
	fn invalid_primitive() {
		let err = serializer().from_xml::<Foo>("<foo><id>x</id></foo>").unwrap_err();
		assert!(matches!(err, Error::InvalidValue { .. }), "{:?}", err);
	}
}
