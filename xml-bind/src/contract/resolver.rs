use crate::{
	contract::{
		order,
		CollectionSlot,
		Contract,
		ContractKind,
		MappingKind,
		MemberDescriptor,
		Property,
		XmlMember,
	},
	errors::{
		ContractError,
		MappingError,
	},
	name::{
		NamingConvention,
		QualifiedName,
	},
	types::{
		MemberSpec,
		ObjectShape,
		TypeDescriptor,
		TypeHandle,
		TypeKey,
		TypeShape,
		Value,
		XmlType,
	},
	Error,
	Result,
};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::{
	borrow::Cow,
	collections::HashMap,
	fmt,
	sync::Arc,
};

/// External creation path for types without a parameterless constructor
pub type CreationHook = Arc<dyn Fn() -> Value + Send + Sync>;

static SHARED: Lazy<Arc<ContractResolver>> = Lazy::new(|| Arc::new(ContractResolver::default()));

/// Builds contracts on first use and caches them for the lifetime of the resolver
///
/// Resolution is deterministic. Concurrent resolution of the same type may build the
/// contract twice; only the first published contract is kept and handed out.
pub struct ContractResolver {
	naming: NamingConvention,
	creators: HashMap<TypeKey, CreationHook>,
	cache: RwLock<HashMap<TypeKey, Arc<Contract>>>,
}

impl Default for ContractResolver {
	fn default() -> Self {
		Self::new(NamingConvention::Identity)
	}
}

impl fmt::Debug for ContractResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ContractResolver")
			.field("naming", &self.naming)
			.field("cached", &self.cache.read().len())
			.finish()
	}
}

impl ContractResolver {
	/// Resolver applying a naming convention
	pub fn new(naming: NamingConvention) -> Self {
		Self {
			naming,
			creators: HashMap::new(),
			cache: RwLock::new(HashMap::new()),
		}
	}

	/// Process wide resolver with identity naming
	pub fn shared() -> Arc<Self> {
		SHARED.clone()
	}

	/// Register a creation hook for `T`
	///
	/// Takes precedence over the type's own creation path.
	pub fn with_creator<T: XmlType, F>(mut self, create: F) -> Self
	where
		F: Fn() -> T + Send + Sync + 'static,
	{
		self.creators.insert(T::type_key(), Arc::new(move || Box::new(create()) as Value));
		self
	}

	/// Naming convention in use
	pub fn naming(&self) -> NamingConvention {
		self.naming
	}

	/// Number of cached contracts
	pub fn cached(&self) -> usize {
		self.cache.read().len()
	}

	/// Contract of `T`
	pub fn resolve_type<T: XmlType>(&self) -> Result<Arc<Contract>> {
		self.resolve(TypeHandle::of::<T>())
	}

	/// Contract of a type
	pub fn resolve(&self, handle: TypeHandle) -> Result<Arc<Contract>> {
		let key = handle.key();
		if let Some(contract) = self.cache.read().get(&key) {
			return Ok(contract.clone());
		}
		let contract = Arc::new(self.build(handle, key.clone())?);
		let mut cache = self.cache.write();
		Ok(cache.entry(key).or_insert(contract).clone())
	}

	fn build(&self, handle: TypeHandle, key: TypeKey) -> Result<Contract> {
		let descriptor = handle.describe();
		let name = self.descriptor_name(&descriptor);
		let mut contract = Contract {
			handle,
			key,
			kind: ContractKind::Object,
			name,
			shape: descriptor.shape.clone(),
			properties: Vec::new(),
			inner_text: None,
			known_types: Vec::new(),
			item: None,
			enum_values: Vec::new(),
			creator: None,
		};
		match &descriptor.shape {
			TypeShape::Nullable(_) => contract.kind = ContractKind::Nullable,
			TypeShape::Enum(shape) => {
				contract.kind = ContractKind::Enum;
				contract.enum_values = shape
					.variants
					.iter()
					.map(|v| match v.rename {
						Some(rename) => rename.to_owned(),
						None => self.naming.apply(v.name),
					})
					.collect();
			},
			TypeShape::Primitive(_) => contract.kind = ContractKind::Primitive,
			TypeShape::Collection(shape) => {
				contract.kind = ContractKind::Collection;
				contract.item = Some(XmlMember::element(shape.item, self.type_name(shape.item)));
			},
			TypeShape::Object(shape) => {
				contract.kind = ContractKind::Object;
				self.build_object(&mut contract, shape)?;
			},
		}
		tracing::debug!(type_key = %contract.key, kind = ?contract.kind, name = %contract.name, "built contract");
		Ok(contract)
	}

	fn build_object(&self, contract: &mut Contract, shape: &ObjectShape) -> Result<()> {
		if let Some(base) = shape.invalid_bases.first() {
			return Err(Error::invalid_mapping(
				contract.key.clone(),
				format!("base type {} is not a composite type", base),
			));
		}
		contract.known_types = shape.known_types.clone();
		contract.creator = match (self.creators.get(&contract.key), shape.create) {
			(Some(hook), _) => Some(hook.clone()),
			(None, Some(create)) => {
				let hook: CreationHook = Arc::new(move || create());
				Some(hook)
			},
			(None, None) => None,
		};
		if contract.creator.is_none() && shape.polymorphic.is_none() {
			return Err(Error::not_constructible(contract.key.clone()));
		}

		let mut properties = shape
			.members
			.iter()
			.enumerate()
			.map(|(sequence, spec)| self.build_property(&contract.key, sequence, spec))
			.collect::<Result<Vec<_>>>()?;
		order::sort(&mut properties);
		validate(&contract.key, &properties)?;

		contract.inner_text = properties.iter().position(|p| p.mapping() == MappingKind::InnerText);
		contract.properties = properties;
		Ok(())
	}

	fn build_property(&self, declaring_type: &TypeKey, sequence: usize, spec: &MemberSpec) -> Result<Property> {
		let name = QualifiedName {
			local: match &spec.rename {
				Some(rename) => rename.clone(),
				None => Cow::Owned(self.naming.apply(&spec.name)),
			},
			namespace: spec.namespace.clone(),
		};

		let collection = if spec.collection {
			let slot = collection_slot(&spec.value_type.describe()).ok_or_else(|| ContractError::NotEnumerable {
				property: spec.name.clone(),
				declaring_type: declaring_type.clone(),
				value_type: spec.value_type.key(),
			})?;
			if spec.mapping != MappingKind::Element {
				return Err(Error::invalid_mapping(
					declaring_type.clone(),
					format!("collection property {:?} must be mapped to elements", spec.name),
				));
			}
			Some(slot)
		} else {
			None
		};

		let member = XmlMember {
			value_type: spec.value_type,
			name,
			mapping: spec.mapping,
			type_handling: spec.type_handling,
			null_handling: spec.null_handling,
			default_handling: spec.default_handling,
			default: spec.default.clone(),
			known_types: spec.known_types.clone(),
		};
		let item = collection.map(|slot| XmlMember {
			value_type: slot.shape.item,
			name: QualifiedName {
				local: spec.item_name.clone().unwrap_or_else(|| member.name.local.clone()),
				namespace: member.name.namespace.clone(),
			},
			default: None,
			..member.clone()
		});

		Ok(Property {
			descriptor: MemberDescriptor {
				name: spec.name.clone(),
				declared_type: spec.value_type.key(),
				can_read: spec.accessor.can_read(),
				can_write: spec.accessor.can_write(),
			},
			member,
			required: spec.required,
			order: spec.order,
			depth: spec.depth,
			sequence,
			collection,
			item,
			accessor: spec.accessor.clone(),
			should_serialize: spec.should_serialize.clone(),
		})
	}

	/// Element name of values of a type without explicit member name
	pub fn type_name(&self, handle: TypeHandle) -> QualifiedName {
		self.descriptor_name(&handle.describe())
	}

	fn descriptor_name(&self, descriptor: &TypeDescriptor) -> QualifiedName {
		if let Some(root) = &descriptor.root {
			return root.clone();
		}
		match &descriptor.shape {
			TypeShape::Nullable(shape) => self.type_name(shape.inner),
			_ => QualifiedName::new(self.naming.apply(&descriptor.name)),
		}
	}
}

fn collection_slot(descriptor: &TypeDescriptor) -> Option<CollectionSlot> {
	match &descriptor.shape {
		TypeShape::Collection(shape) => Some(CollectionSlot {
			shape: *shape,
			nullable: None,
		}),
		TypeShape::Nullable(nullable) => match nullable.inner.describe().shape {
			TypeShape::Collection(shape) => Some(CollectionSlot {
				shape,
				nullable: Some(*nullable),
			}),
			_ => None,
		},
		_ => None,
	}
}

fn validate(declaring_type: &TypeKey, properties: &[Property]) -> Result<()> {
	let inner_text = properties.iter().filter(|p| p.mapping() == MappingKind::InnerText).count();
	if inner_text > 1 {
		return Err(Error::invalid_mapping(declaring_type.clone(), "more than one inner text property"));
	}
	if inner_text == 1 && properties.iter().any(|p| p.mapping() == MappingKind::Element) {
		return Err(Error::invalid_mapping(
			declaring_type.clone(),
			"inner text property can't be combined with element properties",
		));
	}
	for (i, a) in properties.iter().enumerate() {
		if a.mapping() == MappingKind::InnerText {
			continue;
		}
		for b in &properties[i + 1..] {
			if a.mapping() == b.mapping() && names_overlap(a.match_name(), b.match_name()) {
				return Err(MappingError::AmbiguousName {
					declaring_type: declaring_type.clone(),
					name: a.match_name().to_string(),
					first: a.descriptor.name.clone(),
					second: b.descriptor.name.clone(),
				}
				.into());
			}
		}
	}
	Ok(())
}

// Unqualified names match any namespace, so they collide with qualified names of the same
// local name.
fn names_overlap(a: &QualifiedName, b: &QualifiedName) -> bool {
	a.local == b.local && (a.namespace.is_none() || b.namespace.is_none() || a.namespace == b.namespace)
}
