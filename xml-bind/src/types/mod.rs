//! Host type layer: how Rust types describe themselves to the mapping engine

mod builtin;
mod descriptor;
mod member;
mod polymorphic;

pub use self::{
	builtin::{
		enum_shape,
		primitive_shape,
		Base64Binary,
		XmlEnum,
		XmlPrimitive,
	},
	descriptor::{
		downcast,
		downcast_mut,
		downcast_ref,
		CollectionBuild,
		CollectionShape,
		EnumShape,
		EnumVariant,
		KnownType,
		NullableShape,
		ObjectBuilder,
		ObjectShape,
		PolymorphicShape,
		PrimitiveKind,
		PrimitiveShape,
		TypeDescriptor,
		TypeHandle,
		TypeKey,
		TypeShape,
		Value,
		XmlObject,
		XmlType,
	},
	member::{
		DefaultValue,
		Field,
		FieldAccessor,
		MappingKind,
		MemberSpec,
		Property,
		ShouldSerializeGate,
		ValueRef,
	},
};
