use crate::{
	settings::{
		DefaultValueHandling,
		NullValueHandling,
	},
	type_handling::TypeHandling,
	types::{
		downcast,
		downcast_mut,
		downcast_ref,
		KnownType,
		TypeHandle,
		Value,
		XmlType,
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

/// Where a property lives in the XML
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MappingKind {
	/// Attribute of the containing element
	Attribute,
	/// Child element
	Element,
	/// Text content of the containing element
	InnerText,
}

/// A member value: borrowed from the instance or computed
pub enum ValueRef<'a> {
	/// Borrowed field
	Borrowed(&'a dyn Any),
	/// Computed value
	Owned(Value),
}

impl ValueRef<'_> {
	/// Access the value
	pub fn as_any(&self) -> &dyn Any {
		match self {
			Self::Borrowed(v) => *v,
			Self::Owned(v) => &**v,
		}
	}
}

/// Typed get/set access to a member of a type erased instance
pub trait FieldAccessor: Send + Sync {
	/// Whether `get` is supported
	fn can_read(&self) -> bool;

	/// Whether `set` is supported
	fn can_write(&self) -> bool;

	/// Read the member
	fn get<'a>(&self, target: &'a dyn Any) -> Result<ValueRef<'a>>;

	/// Replace the member
	fn set(&self, target: &mut dyn Any, value: Value) -> Result<()>;
}

/// Accessor for a plain struct field
pub struct Field<O, T> {
	get: fn(&O) -> &T,
	get_mut: fn(&mut O) -> &mut T,
}

impl<O, T> Field<O, T> {
	/// Accessor from shared and mutable projections
	pub fn new(get: fn(&O) -> &T, get_mut: fn(&mut O) -> &mut T) -> Self {
		Self { get, get_mut }
	}
}

impl<O: Any, T: Any> FieldAccessor for Field<O, T> {
	fn can_read(&self) -> bool {
		true
	}

	fn can_write(&self) -> bool {
		true
	}

	fn get<'a>(&self, target: &'a dyn Any) -> Result<ValueRef<'a>> {
		Ok(ValueRef::Borrowed((self.get)(downcast_ref::<O>(target)?)))
	}

	fn set(&self, target: &mut dyn Any, value: Value) -> Result<()> {
		*(self.get_mut)(downcast_mut::<O>(target)?) = downcast::<T>(value)?;
		Ok(())
	}
}

/// Accessor through getter and/or setter functions
pub struct Property<O, T> {
	getter: Option<fn(&O) -> T>,
	setter: Option<fn(&mut O, T)>,
}

impl<O, T> Property<O, T> {
	/// Accessor from optional getter and setter
	pub fn new(getter: Option<fn(&O) -> T>, setter: Option<fn(&mut O, T)>) -> Self {
		Self { getter, setter }
	}
}

impl<O: Any, T: Any> FieldAccessor for Property<O, T> {
	fn can_read(&self) -> bool {
		self.getter.is_some()
	}

	fn can_write(&self) -> bool {
		self.setter.is_some()
	}

	fn get<'a>(&self, target: &'a dyn Any) -> Result<ValueRef<'a>> {
		let getter = self.getter.ok_or_else(|| Error::not_accessible(std::any::type_name::<T>()))?;
		Ok(ValueRef::Owned(Box::new(getter(downcast_ref::<O>(target)?))))
	}

	fn set(&self, target: &mut dyn Any, value: Value) -> Result<()> {
		let setter = self.setter.ok_or_else(|| Error::not_accessible(std::any::type_name::<T>()))?;
		setter(downcast_mut::<O>(target)?, downcast::<T>(value)?);
		Ok(())
	}
}

/// Accessor for a member of an embedded base
struct Inherited<O, B> {
	base: fn(&O) -> &B,
	base_mut: fn(&mut O) -> &mut B,
	inner: Arc<dyn FieldAccessor>,
}

impl<O: Any, B: Any> FieldAccessor for Inherited<O, B> {
	fn can_read(&self) -> bool {
		self.inner.can_read()
	}

	fn can_write(&self) -> bool {
		self.inner.can_write()
	}

	fn get<'a>(&self, target: &'a dyn Any) -> Result<ValueRef<'a>> {
		self.inner.get((self.base)(downcast_ref::<O>(target)?))
	}

	fn set(&self, target: &mut dyn Any, value: Value) -> Result<()> {
		self.inner.set((self.base_mut)(downcast_mut::<O>(target)?), value)
	}
}

/// Per-instance "should serialize" gate declared by the type
pub type ShouldSerializeGate = Arc<dyn Fn(&dyn Any) -> bool + Send + Sync>;

/// Produces the default value of a property
#[derive(Clone)]
pub struct DefaultValue(Arc<dyn Fn() -> Value + Send + Sync>);

impl DefaultValue {
	/// Default from a function
	pub fn new<T: Any>(make: fn() -> T) -> Self {
		Self(Arc::new(move || Box::new(make()) as Value))
	}

	/// Fresh default value
	pub fn make(&self) -> Value {
		(self.0)()
	}
}

impl fmt::Debug for DefaultValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("DefaultValue(..)")
	}
}

/// Declaration of a member of a composite type
///
/// Starts out as element mapped with the naming convention applied to the member name;
/// the builder methods adjust the mapping.
#[derive(Clone)]
pub struct MemberSpec {
	pub(crate) name: Cow<'static, str>,
	pub(crate) value_type: TypeHandle,
	pub(crate) accessor: Arc<dyn FieldAccessor>,
	pub(crate) mapping: MappingKind,
	pub(crate) rename: Option<Cow<'static, str>>,
	pub(crate) namespace: Option<Cow<'static, str>>,
	pub(crate) required: bool,
	pub(crate) collection: bool,
	pub(crate) order: i32,
	pub(crate) default: Option<DefaultValue>,
	pub(crate) depth: u32,
	pub(crate) item_name: Option<Cow<'static, str>>,
	pub(crate) known_types: Vec<KnownType>,
	pub(crate) type_handling: Option<TypeHandling>,
	pub(crate) null_handling: Option<NullValueHandling>,
	pub(crate) default_handling: Option<DefaultValueHandling>,
	pub(crate) should_serialize: Option<ShouldSerializeGate>,
}

impl fmt::Debug for MemberSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemberSpec")
			.field("name", &self.name)
			.field("value_type", &self.value_type)
			.field("mapping", &self.mapping)
			.field("depth", &self.depth)
			.finish()
	}
}

impl MemberSpec {
	fn with_accessor<S: Into<Cow<'static, str>>>(name: S, value_type: TypeHandle, accessor: Arc<dyn FieldAccessor>) -> Self {
		Self {
			name: name.into(),
			value_type,
			accessor,
			mapping: MappingKind::Element,
			rename: None,
			namespace: None,
			required: false,
			collection: false,
			order: -1,
			default: None,
			depth: 0,
			item_name: None,
			known_types: Vec::new(),
			type_handling: None,
			null_handling: None,
			default_handling: None,
			should_serialize: None,
		}
	}

	/// Member backed by a struct field
	pub fn field<O: Any, T: XmlType, S: Into<Cow<'static, str>>>(
		name: S,
		get: fn(&O) -> &T,
		get_mut: fn(&mut O) -> &mut T,
	) -> Self {
		Self::with_accessor(name, TypeHandle::of::<T>(), Arc::new(Field { get, get_mut }))
	}

	/// Member backed by getter and setter functions
	///
	/// A member missing either function is neither read nor written.
	pub fn property<O: Any, T: XmlType, S: Into<Cow<'static, str>>>(
		name: S,
		getter: Option<fn(&O) -> T>,
		setter: Option<fn(&mut O, T)>,
	) -> Self {
		Self::with_accessor(name, TypeHandle::of::<T>(), Arc::new(Property { getter, setter }))
	}

	pub(crate) fn inherited<O: Any, B: Any>(mut self, base: fn(&O) -> &B, base_mut: fn(&mut O) -> &mut B) -> Self {
		self.accessor = Arc::new(Inherited {
			base,
			base_mut,
			inner: self.accessor,
		});
		if let Some(gate) = self.should_serialize.take() {
			self.should_serialize = Some(Arc::new(move |target: &dyn Any| match target.downcast_ref::<O>() {
				Some(o) => gate(base(o)),
				None => true,
			}));
		}
		self.depth += 1;
		self
	}

	/// Map to an attribute
	pub fn attribute(mut self) -> Self {
		self.mapping = MappingKind::Attribute;
		self
	}

	/// Map to the text content of the containing element
	pub fn text(mut self) -> Self {
		self.mapping = MappingKind::InnerText;
		self
	}

	/// Map to a child element (the default)
	pub fn element(mut self) -> Self {
		self.mapping = MappingKind::Element;
		self
	}

	/// Explicit XML local name
	pub fn rename<S: Into<Cow<'static, str>>>(mut self, name: S) -> Self {
		self.rename = Some(name.into());
		self
	}

	/// XML namespace URI
	pub fn namespace<S: Into<Cow<'static, str>>>(mut self, namespace: S) -> Self {
		self.namespace = Some(namespace.into());
		self
	}

	/// Fail reading if the member is missing and has no default
	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	/// Write the items as repeated elements without wrapping element
	pub fn collection(mut self) -> Self {
		self.collection = true;
		self
	}

	/// Explicit position; members without explicit order use `-1`
	pub fn order(mut self, order: i32) -> Self {
		self.order = order;
		self
	}

	/// Default applied when the member is missing while reading
	pub fn default_with<T: XmlType>(mut self, make: fn() -> T) -> Self {
		self.default = Some(DefaultValue::new(make));
		self
	}

	/// Element name of collection items (defaults to the member's name)
	pub fn item_name<S: Into<Cow<'static, str>>>(mut self, name: S) -> Self {
		self.item_name = Some(name.into());
		self
	}

	/// Allow a concrete type in this (polymorphic) member
	pub fn known_type(mut self, known: KnownType) -> Self {
		self.known_types.push(known);
		self
	}

	/// Type marker policy for this member
	pub fn type_handling(mut self, handling: TypeHandling) -> Self {
		self.type_handling = Some(handling);
		self
	}

	/// Null policy for this member
	pub fn null_handling(mut self, handling: NullValueHandling) -> Self {
		self.null_handling = Some(handling);
		self
	}

	/// Default value policy for this member
	pub fn default_handling(mut self, handling: DefaultValueHandling) -> Self {
		self.default_handling = Some(handling);
		self
	}

	/// Only write the member if the gate returns true for the instance
	pub fn should_serialize<O: Any>(mut self, gate: fn(&O) -> bool) -> Self {
		self.should_serialize = Some(Arc::new(move |target: &dyn Any| match target.downcast_ref::<O>() {
			Some(o) => gate(o),
			None => true,
		}));
		self
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[derive(Default)]
	struct Base {
		id: i32,
	}

	#[derive(Default)]
	struct Derived {
		base: Base,
		label: String,
	}

	#[test]
	fn field_access() {
		let spec = MemberSpec::field("label", |d: &Derived| &d.label, |d: &mut Derived| &mut d.label);
		let mut value = Derived::default();
		spec.accessor.set(&mut value, Box::new(String::from("x"))).unwrap();
		assert_eq!(value.label, "x");
		let got = spec.accessor.get(&value).unwrap();
		assert_eq!(got.as_any().downcast_ref::<String>().unwrap(), "x");
		assert!(spec.accessor.set(&mut value, Box::new(5i32)).is_err());
	}

	#[test]
	fn inherited_access() {
		let spec = MemberSpec::field("id", |b: &Base| &b.id, |b: &mut Base| &mut b.id)
			.should_serialize(|b: &Base| b.id != 0)
			.inherited(|d: &Derived| &d.base, |d: &mut Derived| &mut d.base);
		assert_eq!(spec.depth, 1);
		let mut value = Derived::default();
		let gate = spec.should_serialize.clone().unwrap();
		assert!(!gate(&value));
		spec.accessor.set(&mut value, Box::new(7i32)).unwrap();
		assert_eq!(value.base.id, 7);
		assert!(gate(&value));
	}

	fn double_id(b: &Base) -> i32 {
		b.id * 2
	}

	#[test]
	fn property_without_setter() {
		let spec = MemberSpec::property::<Base, i32, _>("double", Some(double_id as fn(&Base) -> i32), None);
		assert!(spec.accessor.can_read());
		assert!(!spec.accessor.can_write());
		let value = Base { id: 4 };
		let got = spec.accessor.get(&value).unwrap();
		assert_eq!(*got.as_any().downcast_ref::<i32>().unwrap(), 8);
	}
}
