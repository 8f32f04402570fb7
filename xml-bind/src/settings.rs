//! Serializer configuration and host hooks

use crate::{
	contract::{
		ContractResolver,
		MemberDescriptor,
	},
	name::{
		NamingConvention,
		XSI_NAMESPACE,
		XSI_PREFIX,
	},
	type_handling::TypeHandling,
	types::{
		KnownType,
		TypeHandle,
		TypeKey,
		XmlType,
	},
	xml::XmlReader,
	Result,
};
use std::{
	any::Any,
	collections::HashMap,
	fmt,
	sync::Arc,
};

/// How null values are written
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum NullValueHandling {
	/// Omit the node
	#[default]
	Ignore,
	/// Write an empty element marked with `xsi:nil="true"`
	Include,
}

/// How values equal to their declared default are written
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum DefaultValueHandling {
	/// Always write
	#[default]
	Include,
	/// Omit primitive and enum values equal to the property default
	Ignore,
}

/// Passed to the deserialized hook after a property was matched
#[derive(Debug)]
pub struct DeserializedEvent<'a> {
	/// Line of the matched element (or of the element carrying the attribute)
	pub line: usize,
	/// The matched member
	pub member: &'a MemberDescriptor,
	/// Local name that matched
	pub xml_name: &'a str,
}

/// Decides per instance whether a property is written
pub type ShouldSerializeHook = Arc<dyn Fn(&dyn Any, &MemberDescriptor) -> bool + Send + Sync>;

/// Observes matched properties while reading
pub type DeserializedHook = Arc<dyn Fn(&DeserializedEvent<'_>) + Send + Sync>;

/// Handles child elements no property matched
///
/// The reader is positioned at the unknown element; the hook must either consume the whole
/// element or leave the reader untouched (the element is skipped then). Stopping inside the
/// element fails the read with a document error.
pub type UnknownElementHook = Arc<dyn Fn(&mut XmlReader, &mut dyn Any) -> Result<()> + Send + Sync>;

/// Serializer configuration
///
/// Settings are read-only during a serialize/deserialize call. Callers sharing settings
/// between threads must clone them before changing anything.
#[derive(Clone)]
pub struct XmlSettings {
	/// Null handling policy
	pub null_handling: NullValueHandling,
	/// Default value handling policy
	pub default_handling: DefaultValueHandling,
	/// Type marker policy
	pub type_handling: TypeHandling,
	/// Resolve markers through the type registry if they aren't known types
	///
	/// Off by default: the document decides which registered type gets instantiated.
	pub open_type_resolution: bool,
	/// Don't write `<?xml ...?>`
	pub omit_xml_declaration: bool,
	/// Indent nested elements by this many spaces
	pub indent: Option<usize>,
	/// Namespace prefixes declared on the root element
	pub namespaces: Vec<(String, String)>,
	resolver: Arc<ContractResolver>,
	known_types: HashMap<TypeKey, Vec<KnownType>>,
	registry: HashMap<String, TypeHandle>,
	should_serialize: Option<ShouldSerializeHook>,
	deserialized: Option<DeserializedHook>,
	unknown_element: Option<UnknownElementHook>,
}

impl Default for XmlSettings {
	fn default() -> Self {
		XmlSettings {
			null_handling: NullValueHandling::default(),
			default_handling: DefaultValueHandling::default(),
			type_handling: TypeHandling::default(),
			open_type_resolution: false,
			omit_xml_declaration: false,
			indent: None,
			namespaces: vec![(XSI_PREFIX.to_owned(), XSI_NAMESPACE.to_owned())],
			resolver: ContractResolver::shared(),
			known_types: HashMap::new(),
			registry: HashMap::new(),
			should_serialize: None,
			deserialized: None,
			unknown_element: None,
		}
	}
}

impl fmt::Debug for XmlSettings {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("XmlSettings")
			.field("null_handling", &self.null_handling)
			.field("default_handling", &self.default_handling)
			.field("type_handling", &self.type_handling)
			.field("open_type_resolution", &self.open_type_resolution)
			.field("omit_xml_declaration", &self.omit_xml_declaration)
			.field("indent", &self.indent)
			.field("namespaces", &self.namespaces)
			.field("resolver", &self.resolver)
			.finish()
	}
}

impl XmlSettings {
	/// Default settings
	pub fn new() -> Self {
		Self::default()
	}

	/// Use a private resolver with the given naming convention
	pub fn with_naming(self, naming: NamingConvention) -> Self {
		self.with_resolver(Arc::new(ContractResolver::new(naming)))
	}

	/// Use the given resolver
	pub fn with_resolver(mut self, resolver: Arc<ContractResolver>) -> Self {
		self.resolver = resolver;
		self
	}

	/// Contract resolver
	pub fn resolver(&self) -> &Arc<ContractResolver> {
		&self.resolver
	}

	/// Allow a known type in every slot declared as `D`
	pub fn with_known_type<D: XmlType>(mut self, known: KnownType) -> Self {
		self.known_types.entry(D::type_key()).or_default().push(known);
		self
	}

	/// Known types registered for a declared type
	pub fn known_types(&self, declared: &TypeKey) -> &[KnownType] {
		self.known_types.get(declared).map_or(&[], Vec::as_slice)
	}

	/// Make `T` resolvable by its type key through open type resolution
	pub fn register_type<T: XmlType>(mut self) -> Self {
		self.registry.insert(T::type_key().as_str().to_owned(), TypeHandle::of::<T>());
		self
	}

	/// Registered type for a marker
	pub fn registered_type(&self, marker: &str) -> Option<TypeHandle> {
		self.registry.get(marker).copied()
	}

	/// Set the "should serialize" hook
	pub fn on_should_serialize<F>(mut self, hook: F) -> Self
	where
		F: Fn(&dyn Any, &MemberDescriptor) -> bool + Send + Sync + 'static,
	{
		self.should_serialize = Some(Arc::new(hook));
		self
	}

	/// Set the deserialized observer
	pub fn on_deserialized<F>(mut self, hook: F) -> Self
	where
		F: Fn(&DeserializedEvent<'_>) + Send + Sync + 'static,
	{
		self.deserialized = Some(Arc::new(hook));
		self
	}

	/// Set the unknown element handler
	pub fn on_unknown_element<F>(mut self, hook: F) -> Self
	where
		F: Fn(&mut XmlReader, &mut dyn Any) -> Result<()> + Send + Sync + 'static,
	{
		self.unknown_element = Some(Arc::new(hook));
		self
	}

	pub(crate) fn should_serialize_hook(&self) -> Option<&ShouldSerializeHook> {
		self.should_serialize.as_ref()
	}

	pub(crate) fn deserialized_hook(&self) -> Option<&DeserializedHook> {
		self.deserialized.as_ref()
	}

	pub(crate) fn unknown_element_hook(&self) -> Option<&UnknownElementHook> {
		self.unknown_element.as_ref()
	}
}
