use crate::{
	contract::{
		Contract,
		ContractKind,
		MappingKind,
		XmlMember,
	},
	context::SerializationContext,
	converters::XmlConverter,
	types::{
		EnumShape,
		Value,
	},
	xml::{
		XmlReader,
		XmlWriter,
	},
	Error,
	Result,
};
use std::any::Any;

fn shape(contract: &Contract) -> Result<&EnumShape> {
	contract.enumeration().ok_or_else(|| Error::unexpected_kind(contract.key().clone()))
}

/// Unit enums, written as the (convention applied) variant name
#[derive(Clone, Copy, Debug, Default)]
pub struct EnumConverter;

impl XmlConverter for EnumConverter {
	fn can_read(&self, contract: &Contract) -> bool {
		contract.kind() == ContractKind::Enum
	}

	fn can_write(&self, contract: &Contract) -> bool {
		contract.kind() == ContractKind::Enum
	}

	fn read(&self, reader: &mut XmlReader, member: &XmlMember, contract: &Contract, _ctx: &SerializationContext<'_>) -> Result<Value> {
		let shape = shape(contract)?;
		let text = match member.mapping {
			MappingKind::Attribute => reader.value().to_owned(),
			MappingKind::Element | MappingKind::InnerText => reader.read_element_content()?,
		};
		let name = text.trim();
		contract
			.enum_values()
			.iter()
			.position(|value| value == name)
			.and_then(shape.from_index)
			.ok_or_else(|| Error::invalid_value(contract.key().clone(), &text, "unknown enum value"))
	}

	fn write(
		&self,
		writer: &mut XmlWriter,
		value: &dyn Any,
		_member: &XmlMember,
		contract: &Contract,
		_ctx: &SerializationContext<'_>,
	) -> Result<()> {
		let index = (shape(contract)?.index_of)(value)?;
		let name = contract
			.enum_values()
			.get(index)
			.ok_or_else(|| Error::invalid_value(contract.key().clone(), &index.to_string(), "variant index out of range"))?;
		writer.write_text(name)
	}
}
