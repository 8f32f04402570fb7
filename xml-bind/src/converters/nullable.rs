use crate::{
	contract::{
		Contract,
		ContractKind,
		XmlMember,
	},
	context::SerializationContext,
	converters::XmlConverter,
	types::{
		NullableShape,
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

fn shape(contract: &Contract) -> Result<&NullableShape> {
	contract.nullable().ok_or_else(|| Error::unexpected_kind(contract.key().clone()))
}

/// `Option`-like wrappers; the inner value is handled by the converter of the inner type
///
/// Null values are handled by the context before a converter is selected.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullableConverter;

impl XmlConverter for NullableConverter {
	fn can_read(&self, contract: &Contract) -> bool {
		contract.kind() == ContractKind::Nullable
	}

	fn can_write(&self, contract: &Contract) -> bool {
		contract.kind() == ContractKind::Nullable
	}

	fn read(&self, reader: &mut XmlReader, member: &XmlMember, contract: &Contract, ctx: &SerializationContext<'_>) -> Result<Value> {
		let shape = shape(contract)?;
		let inner = ctx.resolve(shape.inner)?;
		let value = ctx.read_as(reader, member, &inner)?;
		(shape.wrap)(Some(value))
	}

	fn write(
		&self,
		writer: &mut XmlWriter,
		value: &dyn Any,
		member: &XmlMember,
		contract: &Contract,
		ctx: &SerializationContext<'_>,
	) -> Result<()> {
		let shape = shape(contract)?;
		match (shape.get)(value)? {
			Some(inner_value) => {
				let inner = ctx.resolve(shape.inner)?;
				ctx.converters()
					.select_for_write(&inner)?
					.write(writer, inner_value, member, &inner, ctx)
			},
			None => Ok(()),
		}
	}
}
