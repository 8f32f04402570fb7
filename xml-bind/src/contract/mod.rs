//! Contracts: cached per-type description of the XML mapping
//!
//! A [`Contract`] is built once per type by the [`ContractResolver`] and shared read-only
//! afterwards.

mod order;
mod resolver;

pub use self::resolver::{
	ContractResolver,
	CreationHook,
};
pub use crate::types::MappingKind;

use crate::{
	name::QualifiedName,
	settings::{
		DefaultValueHandling,
		NullValueHandling,
	},
	type_handling::TypeHandling,
	types::{
		CollectionShape,
		DefaultValue,
		EnumShape,
		FieldAccessor,
		KnownType,
		NullableShape,
		PolymorphicShape,
		PrimitiveShape,
		ShouldSerializeGate,
		TypeHandle,
		TypeKey,
		TypeShape,
		Value,
		ValueRef,
	},
	Error,
	Result,
};
use std::{
	any::Any,
	borrow::Cow,
	fmt,
	sync::Arc,
};

/// Kind of contract; selects the builtin converter
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ContractKind {
	/// Single text value
	Primitive,
	/// Unit enum
	Enum,
	/// Optional wrapper
	Nullable,
	/// Sequence of items
	Collection,
	/// Composite type
	Object,
}

/// Normalized view of a data member
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MemberDescriptor {
	/// Member name as declared
	pub name: Cow<'static, str>,
	/// Declared type
	pub declared_type: TypeKey,
	/// Member can be read
	pub can_read: bool,
	/// Member can be written
	pub can_write: bool,
}

/// Placement of a value in the document: name, mapping kind and policies
#[derive(Clone, Debug)]
pub struct XmlMember {
	/// Declared value type
	pub value_type: TypeHandle,
	/// XML name
	pub name: QualifiedName,
	/// Mapping kind
	pub mapping: MappingKind,
	/// Type marker policy override
	pub type_handling: Option<TypeHandling>,
	/// Null policy override
	pub null_handling: Option<NullValueHandling>,
	/// Default value policy override
	pub default_handling: Option<DefaultValueHandling>,
	/// Default value
	pub default: Option<DefaultValue>,
	/// Known types allowed in this slot
	pub known_types: Vec<KnownType>,
}

impl XmlMember {
	/// Element mapped member without overrides
	pub fn element(value_type: TypeHandle, name: QualifiedName) -> Self {
		Self {
			value_type,
			name,
			mapping: MappingKind::Element,
			type_handling: None,
			null_handling: None,
			default_handling: None,
			default: None,
			known_types: Vec::new(),
		}
	}
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct CollectionSlot {
	pub(crate) shape: CollectionShape,
	// set if the declared type is an optional collection
	pub(crate) nullable: Option<NullableShape>,
}

/// Mapped member of an object contract
pub struct Property {
	pub(crate) descriptor: MemberDescriptor,
	pub(crate) member: XmlMember,
	pub(crate) required: bool,
	pub(crate) order: i32,
	pub(crate) depth: u32,
	pub(crate) sequence: usize,
	pub(crate) collection: Option<CollectionSlot>,
	pub(crate) item: Option<XmlMember>,
	pub(crate) accessor: Arc<dyn FieldAccessor>,
	pub(crate) should_serialize: Option<ShouldSerializeGate>,
}

impl Property {
	/// Member descriptor
	pub fn descriptor(&self) -> &MemberDescriptor {
		&self.descriptor
	}

	/// Declared member name
	pub fn name(&self) -> &str {
		&self.descriptor.name
	}

	/// Placement of the member value
	pub fn member(&self) -> &XmlMember {
		&self.member
	}

	/// XML name
	pub fn xml_name(&self) -> &QualifiedName {
		&self.member.name
	}

	/// Mapping kind
	pub fn mapping(&self) -> MappingKind {
		self.member.mapping
	}

	/// Reading fails if the member is missing and has no default
	pub fn is_required(&self) -> bool {
		self.required
	}

	/// Items are written as repeated elements without wrapper
	pub fn is_collection(&self) -> bool {
		self.collection.is_some()
	}

	/// Explicit order, `-1` if unspecified
	pub fn order(&self) -> i32 {
		self.order
	}

	/// Inheritance distance from the contract's type
	pub fn declaring_depth(&self) -> u32 {
		self.depth
	}

	/// Declaration index
	pub fn sequence(&self) -> usize {
		self.sequence
	}

	/// Placement of collection items (collection properties only)
	pub fn item(&self) -> Option<&XmlMember> {
		self.item.as_ref()
	}

	/// Name matched against child elements: the item name for collection properties
	pub fn match_name(&self) -> &QualifiedName {
		match &self.item {
			Some(item) => &item.name,
			None => &self.member.name,
		}
	}

	/// Read the member
	pub fn get<'a>(&self, target: &'a dyn Any) -> Result<ValueRef<'a>> {
		self.accessor.get(target)
	}

	/// Replace the member
	pub fn set(&self, target: &mut dyn Any, value: Value) -> Result<()> {
		self.accessor.set(target, value)
	}
}

impl fmt::Debug for Property {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Property")
			.field("name", &self.descriptor.name)
			.field("xml_name", &self.member.name)
			.field("mapping", &self.member.mapping)
			.field("required", &self.required)
			.field("collection", &self.collection.is_some())
			.field("order", &self.order)
			.field("depth", &self.depth)
			.field("sequence", &self.sequence)
			.finish()
	}
}

/// Immutable description of how a type maps to XML
pub struct Contract {
	pub(crate) handle: TypeHandle,
	pub(crate) key: TypeKey,
	pub(crate) kind: ContractKind,
	pub(crate) name: QualifiedName,
	pub(crate) shape: TypeShape,
	pub(crate) properties: Vec<Property>,
	pub(crate) inner_text: Option<usize>,
	pub(crate) known_types: Vec<KnownType>,
	pub(crate) item: Option<XmlMember>,
	pub(crate) enum_values: Vec<String>,
	pub(crate) creator: Option<CreationHook>,
}

impl Contract {
	/// Handle of the described type
	pub fn handle(&self) -> TypeHandle {
		self.handle
	}

	/// Key of the described type
	pub fn key(&self) -> &TypeKey {
		&self.key
	}

	/// Contract kind
	pub fn kind(&self) -> ContractKind {
		self.kind
	}

	/// Element name of root values of this type
	pub fn xml_name(&self) -> &QualifiedName {
		&self.name
	}

	/// Properties in write order (object contracts)
	pub fn properties(&self) -> &[Property] {
		&self.properties
	}

	/// Index of the inner text property in [`properties`](Self::properties)
	pub fn inner_text_index(&self) -> Option<usize> {
		self.inner_text
	}

	/// Property mapped to the text content
	pub fn inner_text_property(&self) -> Option<&Property> {
		self.inner_text.map(|i| &self.properties[i])
	}

	/// Known types declared by the type
	pub fn known_types(&self) -> &[KnownType] {
		&self.known_types
	}

	/// Placement of items (collection contracts)
	pub fn item(&self) -> Option<&XmlMember> {
		self.item.as_ref()
	}

	/// XML names of enum variants, by variant index
	pub fn enum_values(&self) -> &[String] {
		&self.enum_values
	}

	/// Member placing a root value of this type
	pub fn root_member(&self) -> XmlMember {
		XmlMember::element(self.handle, self.name.clone())
	}

	/// Whether instances can be created
	pub fn is_constructible(&self) -> bool {
		self.creator.is_some()
	}

	/// Create a fresh instance
	pub fn create(&self) -> Result<Value> {
		match &self.creator {
			Some(create) => Ok(create()),
			None => Err(Error::not_constructible(self.key.clone())),
		}
	}

	/// Primitive shape
	pub fn primitive(&self) -> Option<&PrimitiveShape> {
		match &self.shape {
			TypeShape::Primitive(shape) => Some(shape),
			_ => None,
		}
	}

	/// Enum shape
	pub fn enumeration(&self) -> Option<&EnumShape> {
		match &self.shape {
			TypeShape::Enum(shape) => Some(shape),
			_ => None,
		}
	}

	/// Nullable shape
	pub fn nullable(&self) -> Option<&NullableShape> {
		match &self.shape {
			TypeShape::Nullable(shape) => Some(shape),
			_ => None,
		}
	}

	/// Collection shape
	pub fn collection(&self) -> Option<&CollectionShape> {
		match &self.shape {
			TypeShape::Collection(shape) => Some(shape),
			_ => None,
		}
	}

	/// Polymorphic bridge of trait object slots
	pub fn polymorphic(&self) -> Option<&PolymorphicShape> {
		match &self.shape {
			TypeShape::Object(shape) => shape.polymorphic.as_ref(),
			_ => None,
		}
	}
}

impl fmt::Debug for Contract {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Contract")
			.field("key", &self.key)
			.field("kind", &self.kind)
			.field("name", &self.name)
			.field("properties", &self.properties)
			.field("known_types", &self.known_types)
			.finish()
	}
}
