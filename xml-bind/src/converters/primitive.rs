use crate::{
	contract::{
		Contract,
		ContractKind,
		MappingKind,
		XmlMember,
	},
	context::SerializationContext,
	converters::XmlConverter,
	types::Value,
	xml::{
		XmlReader,
		XmlWriter,
	},
	Error,
	Result,
};
use std::any::Any;

fn shape(contract: &Contract) -> Result<&crate::types::PrimitiveShape> {
	contract.primitive().ok_or_else(|| Error::unexpected_kind(contract.key().clone()))
}

/// Single text values: attribute values, element text content or inner text
#[derive(Clone, Copy, Debug, Default)]
pub struct PrimitiveConverter;

impl XmlConverter for PrimitiveConverter {
	fn can_read(&self, contract: &Contract) -> bool {
		contract.kind() == ContractKind::Primitive
	}

	fn can_write(&self, contract: &Contract) -> bool {
		contract.kind() == ContractKind::Primitive
	}

	fn read(&self, reader: &mut XmlReader, member: &XmlMember, contract: &Contract, _ctx: &SerializationContext<'_>) -> Result<Value> {
		let shape = shape(contract)?;
		let text = match member.mapping {
			MappingKind::Attribute => reader.value().to_owned(),
			MappingKind::Element | MappingKind::InnerText => reader.read_element_content()?,
		};
		(shape.parse)(&text)
	}

	fn write(
		&self,
		writer: &mut XmlWriter,
		value: &dyn Any,
		_member: &XmlMember,
		contract: &Contract,
		_ctx: &SerializationContext<'_>,
	) -> Result<()> {
		let text = (shape(contract)?.format)(value)?;
		writer.write_text(&text)
	}
}
