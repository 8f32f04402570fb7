//! Converters between values and XML
//!
//! The [`ConverterRegistry`] holds an ordered list of converters; the first converter
//! accepting a contract handles it. Custom converters are placed ahead of the builtin ones.

mod collection;
mod enumeration;
mod nullable;
mod object;
mod primitive;
mod proxy;

pub use self::{
	collection::CollectionConverter,
	enumeration::EnumConverter,
	nullable::NullableConverter,
	object::ObjectConverter,
	primitive::PrimitiveConverter,
	proxy::CollectionProxy,
};

use crate::{
	contract::{
		Contract,
		XmlMember,
	},
	context::SerializationContext,
	types::Value,
	xml::{
		XmlReader,
		XmlWriter,
	},
	Error,
	Result,
};
use std::{
	any::Any,
	fmt,
	sync::Arc,
};

/// Reads and writes values of the contracts it accepts
///
/// For element mapping `read` is called with the reader positioned at the start tag and
/// must consume the whole element; `write` is called after the start tag (and the type
/// marker) was written and must not close it. For attribute mapping `read` finds the reader
/// positioned at the attribute and `write` produces the attribute value as text.
pub trait XmlConverter: Send + Sync {
	/// Whether values of the contract can be read
	fn can_read(&self, contract: &Contract) -> bool;

	/// Whether values of the contract can be written
	fn can_write(&self, contract: &Contract) -> bool;

	/// Read a value
	fn read(
		&self,
		reader: &mut XmlReader,
		member: &XmlMember,
		contract: &Contract,
		ctx: &SerializationContext<'_>,
	) -> Result<Value>;

	/// Write a value
	fn write(
		&self,
		writer: &mut XmlWriter,
		value: &dyn Any,
		member: &XmlMember,
		contract: &Contract,
		ctx: &SerializationContext<'_>,
	) -> Result<()>;
}

/// Ordered converter list; first match wins
#[derive(Clone)]
pub struct ConverterRegistry {
	converters: Vec<Arc<dyn XmlConverter>>,
	// number of custom converters at the front
	custom: usize,
}

impl Default for ConverterRegistry {
	fn default() -> Self {
		Self {
			converters: vec![
				Arc::new(NullableConverter),
				Arc::new(EnumConverter),
				Arc::new(PrimitiveConverter),
				Arc::new(CollectionConverter),
				Arc::new(ObjectConverter),
			],
			custom: 0,
		}
	}
}

impl fmt::Debug for ConverterRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConverterRegistry")
			.field("converters", &self.converters.len())
			.field("custom", &self.custom)
			.finish()
	}
}

impl ConverterRegistry {
	/// Registry with the builtin converters
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a custom converter ahead of the builtin converters
	///
	/// Custom converters are consulted in registration order.
	pub fn prepend<C: XmlConverter + 'static>(&mut self, converter: C) {
		self.converters.insert(self.custom, Arc::new(converter));
		self.custom += 1;
	}

	/// Converter reading values of a contract
	pub fn select_for_read(&self, contract: &Contract) -> Result<&dyn XmlConverter> {
		self.converters
			.iter()
			.find(|c| c.can_read(contract))
			.map(|c| &**c)
			.ok_or_else(|| Error::no_converter(contract.key().clone()))
	}

	/// Converter writing values of a contract
	pub fn select_for_write(&self, contract: &Contract) -> Result<&dyn XmlConverter> {
		self.converters
			.iter()
			.find(|c| c.can_write(contract))
			.map(|c| &**c)
			.ok_or_else(|| Error::no_converter(contract.key().clone()))
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		contract::{
			ContractKind,
			ContractResolver,
		},
		settings::XmlSettings,
		types::downcast,
	};

	struct Loud;

	impl XmlConverter for Loud {
		fn can_read(&self, contract: &Contract) -> bool {
			contract.kind() == ContractKind::Primitive
		}

		fn can_write(&self, contract: &Contract) -> bool {
			contract.kind() == ContractKind::Primitive
		}

		fn read(&self, reader: &mut XmlReader, _: &XmlMember, _: &Contract, _: &SerializationContext<'_>) -> Result<Value> {
			Ok(Box::new(reader.read_element_content()?.to_lowercase()))
		}

		fn write(&self, _: &mut XmlWriter, _: &dyn Any, _: &XmlMember, _: &Contract, _: &SerializationContext<'_>) -> Result<()> {
			Ok(())
		}
	}

	struct Never;

	impl XmlConverter for Never {
		fn can_read(&self, _: &Contract) -> bool {
			false
		}

		fn can_write(&self, _: &Contract) -> bool {
			false
		}

		fn read(&self, _: &mut XmlReader, _: &XmlMember, _: &Contract, _: &SerializationContext<'_>) -> Result<Value> {
			unreachable!()
		}

		fn write(&self, _: &mut XmlWriter, _: &dyn Any, _: &XmlMember, _: &Contract, _: &SerializationContext<'_>) -> Result<()> {
			unreachable!()
		}
	}

	#[test]
	fn custom_first() {
		let resolver = ContractResolver::default();
		let string = resolver.resolve_type::<String>().unwrap();
		let mut registry = ConverterRegistry::new();
		assert!(registry.select_for_read(&string).is_ok());
		registry.prepend(Loud);
		registry.prepend(Never);
		assert_eq!(registry.custom, 2);
		assert_eq!(registry.converters.len(), 7);
		let converter = registry.select_for_read(&string).unwrap();
		let settings = XmlSettings::default();
		let ctx = SerializationContext::new(&settings, &registry);
		let mut reader = XmlReader::from_str("<a>HeLLo</a>").unwrap();
		reader.move_to_content();
		let value = converter.read(&mut reader, &string.root_member(), &string, &ctx).unwrap();
		assert_eq!(downcast::<String>(value).unwrap(), "hello");
	}

	#[test]
	fn no_converter() {
		let resolver = ContractResolver::default();
		let string = resolver.resolve_type::<String>().unwrap();
		let registry = ConverterRegistry {
			converters: vec![Arc::new(Never)],
			custom: 1,
		};
		assert!(matches!(
			registry.select_for_write(&string),
			Err(Error::Contract(crate::errors::ContractError::NoConverter(_)))
		));
	}
}
