use crate::{
	name::QualifiedName,
	types::MemberSpec,
	Error,
	Result,
};
use std::{
	any::Any,
	borrow::Cow,
	fmt,
};

/// Type erased value
pub type Value = Box<dyn Any>;

/// Stable identifier of a mapped type
///
/// Used as contract cache key and as canonical polymorphic type marker.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Cow<'static, str>);

impl TypeKey {
	/// Key from a static name
	pub const fn new(name: &'static str) -> Self {
		Self(Cow::Borrowed(name))
	}

	/// Key from a computed name (generic types)
	pub fn owned(name: String) -> Self {
		Self(Cow::Owned(name))
	}

	/// Key as string
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self.as_str(), f)
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A type that can be mapped to XML
///
/// Can be derived (if `derive` feature is active); builtin implementations exist for
/// primitives, `Option` and the std collections.
pub trait XmlType: Any + Sized {
	/// Stable key of the type
	fn type_key() -> TypeKey;

	/// Describe the shape of the type
	///
	/// Nested types are only referenced through [`TypeHandle`]s, so this never recurses.
	fn descriptor() -> TypeDescriptor;
}

/// Runtime type information of a (possibly type erased) value
///
/// Implemented for all [`XmlType`]s; trait objects used as polymorphic slots require it as
/// supertrait (see [`polymorphic!`](crate::polymorphic)).
pub trait XmlObject: Any {
	/// Handle of the concrete type
	fn xml_type(&self) -> TypeHandle;

	/// Access as `Any` for downcasting
	fn as_any(&self) -> &dyn Any;
}

impl<T: XmlType> XmlObject for T {
	fn xml_type(&self) -> TypeHandle {
		TypeHandle::of::<T>()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

/// Lazy reference to a type's key and descriptor
#[derive(Clone, Copy)]
pub struct TypeHandle {
	key: fn() -> TypeKey,
	describe: fn() -> TypeDescriptor,
}

impl TypeHandle {
	/// Handle of `T`
	pub fn of<T: XmlType>() -> Self {
		Self {
			key: T::type_key,
			describe: T::descriptor,
		}
	}

	/// Key of the type
	pub fn key(&self) -> TypeKey {
		(self.key)()
	}

	/// Descriptor of the type
	pub fn describe(&self) -> TypeDescriptor {
		(self.describe)()
	}
}

impl PartialEq for TypeHandle {
	fn eq(&self, other: &Self) -> bool {
		self.key() == other.key()
	}
}

impl Eq for TypeHandle {}

impl fmt::Debug for TypeHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TypeHandle({})", self.key())
	}
}

/// Static description of a mapped type
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
	/// Type key
	pub key: TypeKey,
	/// Raw name; the naming convention turns it into the root element name
	pub name: Cow<'static, str>,
	/// Explicit root element name (bypasses the naming convention)
	pub root: Option<QualifiedName>,
	/// How values of the type are mapped
	pub shape: TypeShape,
}

impl TypeDescriptor {
	/// New descriptor
	pub fn new<S: Into<Cow<'static, str>>>(key: TypeKey, name: S, shape: TypeShape) -> Self {
		Self {
			key,
			name: name.into(),
			root: None,
			shape,
		}
	}
}

/// Shape of a type; selects the contract kind
#[derive(Clone, Debug)]
pub enum TypeShape {
	/// `Option`-like wrapper around another type
	Nullable(NullableShape),
	/// Unit enum mapped to its variant names
	Enum(EnumShape),
	/// Single text value
	Primitive(PrimitiveShape),
	/// Sequence of items
	Collection(CollectionShape),
	/// Composite type with members
	Object(ObjectShape),
}

/// Class of primitive
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PrimitiveKind {
	Boolean,
	Character,
	String,
	Integer,
	Float,
	Date,
	Time,
	DateTime,
	Binary,
}

impl PrimitiveKind {
	/// Whether surrounding whitespace is significant
	pub fn keeps_whitespace(self) -> bool {
		matches!(self, Self::String | Self::Character)
	}
}

/// Text conversion of a primitive type
#[derive(Clone, Copy)]
pub struct PrimitiveShape {
	/// Primitive class
	pub kind: PrimitiveKind,
	/// Format a value as text
	pub format: fn(&dyn Any) -> Result<String>,
	/// Parse text into a value
	pub parse: fn(&str) -> Result<Value>,
}

impl fmt::Debug for PrimitiveShape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PrimitiveShape").field("kind", &self.kind).finish()
	}
}

/// A variant of a unit enum
#[derive(Clone, Copy, Debug)]
pub struct EnumVariant {
	/// Variant name as declared
	pub name: &'static str,
	/// Explicit XML name (bypasses the naming convention)
	pub rename: Option<&'static str>,
}

/// Variant table of a unit enum
#[derive(Clone, Copy)]
pub struct EnumShape {
	/// Variants in declaration order
	pub variants: &'static [EnumVariant],
	/// Variant index of a value
	pub index_of: fn(&dyn Any) -> Result<usize>,
	/// Value of a variant index
	pub from_index: fn(usize) -> Option<Value>,
}

impl fmt::Debug for EnumShape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EnumShape").field("variants", &self.variants).finish()
	}
}

/// Access to an optional inner value
#[derive(Clone, Copy)]
pub struct NullableShape {
	/// Inner type
	pub inner: TypeHandle,
	/// Inner value, `None` for null
	pub get: fn(&dyn Any) -> Result<Option<&dyn Any>>,
	/// Wrap an inner value (or null)
	pub wrap: fn(Option<Value>) -> Result<Value>,
}

impl fmt::Debug for NullableShape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NullableShape").field("inner", &self.inner).finish()
	}
}

/// How a collection gets built from read items
#[derive(Clone, Copy)]
pub enum CollectionBuild {
	/// Create an empty collection, then push every item
	Concrete {
		/// Empty collection
		create: fn() -> Value,
		/// Append an item
		push: fn(&mut dyn Any, Value) -> Result<()>,
	},
	/// Build the collection from all items at once
	FromSequence(fn(Vec<Value>) -> Result<Value>),
}

/// Item access and construction of a collection type
#[derive(Clone, Copy)]
pub struct CollectionShape {
	/// Item type
	pub item: TypeHandle,
	/// Items of a collection value, in order
	pub items: fn(&dyn Any) -> Result<Vec<&dyn Any>>,
	/// Construction path
	pub build: CollectionBuild,
}

impl fmt::Debug for CollectionShape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CollectionShape").field("item", &self.item).finish()
	}
}

/// A type a polymorphic slot may hold, with its marker
#[derive(Clone, Debug)]
pub struct KnownType {
	marker: Option<Cow<'static, str>>,
	handle: TypeHandle,
}

impl KnownType {
	/// Known type using the type key as marker
	pub fn of<T: XmlType>() -> Self {
		Self {
			marker: None,
			handle: TypeHandle::of::<T>(),
		}
	}

	/// Known type with explicit marker
	pub fn with_marker<T: XmlType, S: Into<Cow<'static, str>>>(marker: S) -> Self {
		Self {
			marker: Some(marker.into()),
			handle: TypeHandle::of::<T>(),
		}
	}

	/// Known type from a handle
	pub fn from_handle(handle: TypeHandle, marker: Option<Cow<'static, str>>) -> Self {
		Self { marker, handle }
	}

	/// Marker written to and expected in documents
	pub fn marker(&self) -> Cow<'static, str> {
		match &self.marker {
			Some(m) => m.clone(),
			None => Cow::Owned(self.handle.key().as_str().to_owned()),
		}
	}

	/// The concrete type
	pub fn handle(&self) -> TypeHandle {
		self.handle
	}
}

/// Bridge between a trait object slot and its concrete types
#[derive(Clone, Copy)]
pub struct PolymorphicShape {
	/// Concrete value and type behind the slot
	pub resolve: fn(&dyn Any) -> Result<(&dyn Any, TypeHandle)>,
	/// Store a concrete value in the slot type; returns the value back if it doesn't fit
	pub upcast: fn(Value) -> std::result::Result<Value, Value>,
}

/// Members and construction of a composite type
#[derive(Clone)]
pub struct ObjectShape {
	/// Parameterless construction path
	pub create: Option<fn() -> Value>,
	/// Members in declaration order (inherited members first)
	pub members: Vec<MemberSpec>,
	/// Known types of this (polymorphic) type
	pub known_types: Vec<KnownType>,
	/// Set for trait object slots
	pub polymorphic: Option<PolymorphicShape>,
	/// Inherited types that aren't composite; rejected by the resolver
	pub invalid_bases: Vec<TypeKey>,
}

impl fmt::Debug for ObjectShape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ObjectShape")
			.field("constructible", &self.create.is_some())
			.field("members", &self.members)
			.field("known_types", &self.known_types)
			.field("polymorphic", &self.polymorphic.is_some())
			.field("invalid_bases", &self.invalid_bases)
			.finish()
	}
}

/// Builds the [`TypeDescriptor`] of a composite type
///
/// ```
/// use xml_bind::types::{MemberSpec, ObjectBuilder, TypeDescriptor, TypeKey, XmlType};
///
/// #[derive(Default)]
/// struct Point {
/// 	x: i32,
/// 	y: i32,
/// }
///
/// impl XmlType for Point {
/// 	fn type_key() -> TypeKey {
/// 		TypeKey::new("Point")
/// 	}
///
/// 	fn descriptor() -> TypeDescriptor {
/// 		ObjectBuilder::<Self>::new()
/// 			.constructible()
/// 			.member(MemberSpec::field("x", |p: &Point| &p.x, |p: &mut Point| &mut p.x).attribute())
/// 			.member(MemberSpec::field("y", |p: &Point| &p.y, |p: &mut Point| &mut p.y).attribute())
/// 			.build()
/// 	}
/// }
/// ```
pub struct ObjectBuilder<T: XmlType> {
	name: Cow<'static, str>,
	root: Option<QualifiedName>,
	shape: ObjectShape,
	_marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: XmlType> ObjectBuilder<T> {
	/// Start with the type key as name
	pub fn new() -> Self {
		Self {
			name: Cow::Owned(T::type_key().as_str().to_owned()),
			root: None,
			shape: ObjectShape {
				create: None,
				members: Vec::new(),
				known_types: Vec::new(),
				polymorphic: None,
				invalid_bases: Vec::new(),
			},
			_marker: std::marker::PhantomData,
		}
	}

	/// Raw type name used for the root element
	pub fn name<S: Into<Cow<'static, str>>>(mut self, name: S) -> Self {
		self.name = name.into();
		self
	}

	/// Explicit root element name
	pub fn root(mut self, root: QualifiedName) -> Self {
		self.root = Some(root);
		self
	}

	/// Construct instances through `Default`
	pub fn constructible(mut self) -> Self
	where
		T: Default,
	{
		self.shape.create = Some(create_default::<T>);
		self
	}

	/// Construct instances through a custom function
	pub fn creator(mut self, create: fn() -> Value) -> Self {
		self.shape.create = Some(create);
		self
	}

	/// Add a member
	pub fn member(mut self, member: MemberSpec) -> Self {
		self.shape.members.push(member);
		self
	}

	/// Inherit all members of a base type embedded in `T`
	///
	/// Inherited members are one level further away from `T` than the base's own members.
	/// A base that isn't a composite type fails contract resolution.
	pub fn inherit<B: XmlType>(mut self, base: fn(&T) -> &B, base_mut: fn(&mut T) -> &mut B) -> Self {
		match B::descriptor().shape {
			TypeShape::Object(shape) if shape.polymorphic.is_none() => {
				for member in shape.members {
					self.shape.members.push(member.inherited(base, base_mut));
				}
			},
			_ => self.shape.invalid_bases.push(B::type_key()),
		}
		self
	}

	/// Register a known type
	pub fn known_type(mut self, known: KnownType) -> Self {
		self.shape.known_types.push(known);
		self
	}

	/// Mark as polymorphic slot
	pub fn polymorphic(mut self, shape: PolymorphicShape) -> Self {
		self.shape.polymorphic = Some(shape);
		self
	}

	/// Finish the descriptor
	pub fn build(self) -> TypeDescriptor {
		TypeDescriptor {
			key: T::type_key(),
			name: self.name,
			root: self.root,
			shape: TypeShape::Object(self.shape),
		}
	}
}

impl<T: XmlType> Default for ObjectBuilder<T> {
	fn default() -> Self {
		Self::new()
	}
}

fn create_default<T: Default + Any>() -> Value {
	Box::new(T::default())
}

/// Downcast a borrowed value
pub fn downcast_ref<T: Any>(value: &dyn Any) -> Result<&T> {
	value
		.downcast_ref::<T>()
		.ok_or_else(|| Error::type_mismatch(std::any::type_name::<T>()))
}

/// Downcast a mutably borrowed value
pub fn downcast_mut<T: Any>(value: &mut dyn Any) -> Result<&mut T> {
	value
		.downcast_mut::<T>()
		.ok_or_else(|| Error::type_mismatch(std::any::type_name::<T>()))
}

/// Downcast an owned value
pub fn downcast<T: Any>(value: Value) -> Result<T> {
	value
		.downcast::<T>()
		.map(|v| *v)
		.map_err(|_| Error::type_mismatch(std::any::type_name::<T>()))
}
