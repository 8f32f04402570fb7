use crate::{
	contract::{
		Contract,
		ContractKind,
		MappingKind,
		XmlMember,
	},
	context::SerializationContext,
	converters::{
		CollectionProxy,
		XmlConverter,
	},
	types::Value,
	xml::{
		XmlReader,
		XmlWriter,
	},
	Error,
	Result,
};
use std::any::Any;

/// Collections as element with one child element per item
///
/// Collection-flagged properties don't use this converter; their items are written and
/// collected by the object converter directly.
#[derive(Clone, Copy, Debug, Default)]
pub struct CollectionConverter;

impl XmlConverter for CollectionConverter {
	fn can_read(&self, contract: &Contract) -> bool {
		contract.kind() == ContractKind::Collection
	}

	fn can_write(&self, contract: &Contract) -> bool {
		contract.kind() == ContractKind::Collection
	}

	fn read(&self, reader: &mut XmlReader, member: &XmlMember, contract: &Contract, ctx: &SerializationContext<'_>) -> Result<Value> {
		if member.mapping != MappingKind::Element {
			return Err(Error::invalid_mapping_kind(contract.key().clone()));
		}
		let (shape, item) = match (contract.collection(), contract.item()) {
			(Some(shape), Some(item)) => (*shape, item),
			_ => return Err(Error::unexpected_kind(contract.key().clone())),
		};
		let mut proxy = CollectionProxy::new(shape);
		reader.read_start_element()?;
		loop {
			if !reader.move_to_content() {
				return Err(Error::unexpected_eof("unclosed collection element"));
			}
			if reader.is_end_element() {
				reader.read_end_element()?;
				break;
			}
			if !reader.is_start_element() {
				// stray text between items
				reader.read();
				continue;
			}
			if reader.is_name(&item.name) {
				proxy.add(ctx.deserialize(reader, item)?);
			} else {
				tracing::trace!(element = reader.local_name(), line = reader.line(), "skipping unknown collection item");
				reader.skip();
			}
		}
		proxy.finalize()
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
		let (shape, item) = match (contract.collection(), contract.item()) {
			(Some(shape), Some(item)) => (shape, item),
			_ => return Err(Error::unexpected_kind(contract.key().clone())),
		};
		for item_value in (shape.items)(value)? {
			ctx.serialize(writer, item_value, item)?;
		}
		Ok(())
	}
}
