//! Polymorphic type markers (`xsi:type`)

use crate::{
	contract::{
		Contract,
		XmlMember,
	},
	settings::XmlSettings,
	types::{
		KnownType,
		TypeHandle,
		Value,
	},
	Error,
	Result,
};
use std::borrow::Cow;

/// When type markers are written
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum TypeHandling {
	/// Never write markers; markers in documents are ignored
	None,
	/// Write a marker if the runtime type differs from the declared type
	#[default]
	Auto,
	/// Always write a marker
	Always,
}

/// Decides about writing markers and resolves markers back to types
///
/// Read side resolution is restricted to an allow-list: the known types of the member, of
/// the declared type and of the settings' known-type table. Only with
/// [`XmlSettings::open_type_resolution`] enabled the settings' type registry is consulted for
/// any other marker.
pub struct TypeHandlingResolver<'s> {
	settings: &'s XmlSettings,
}

impl<'s> TypeHandlingResolver<'s> {
	/// Resolver using the given settings
	pub fn new(settings: &'s XmlSettings) -> Self {
		Self { settings }
	}

	fn policy(&self, member: &XmlMember) -> TypeHandling {
		member.type_handling.unwrap_or(self.settings.type_handling)
	}

	fn known_types<'a>(&'a self, member: &'a XmlMember, declared: &'a Contract) -> impl Iterator<Item = &'a KnownType> + 'a {
		member
			.known_types
			.iter()
			.chain(declared.known_types())
			.chain(self.settings.known_types(declared.key()))
	}

	/// Marker to write for a value of type `runtime` in a slot declared as `declared`
	pub fn marker_for_write(&self, member: &XmlMember, declared: &Contract, runtime: &Contract) -> Option<Cow<'static, str>> {
		let emit = match self.policy(member) {
			TypeHandling::None => false,
			TypeHandling::Auto => runtime.key() != declared.key(),
			TypeHandling::Always => true,
		};
		if !emit {
			return None;
		}
		let marker = self
			.known_types(member, declared)
			.find(|known| known.handle().key() == *runtime.key())
			.map(KnownType::marker)
			.unwrap_or_else(|| Cow::Owned(runtime.key().as_str().to_owned()));
		Some(marker)
	}

	/// Resolve a marker found on an element
	///
	/// Returns `None` if the declared type should be used.
	pub fn resolve_marker(&self, marker: &str, member: &XmlMember, declared: &Contract) -> Result<Option<TypeHandle>> {
		if self.policy(member) == TypeHandling::None || marker == declared.key().as_str() {
			return Ok(None);
		}
		if let Some(known) = self.known_types(member, declared).find(|known| known.marker() == marker) {
			tracing::debug!(marker, declared = %declared.key(), "resolved known type marker");
			return Ok(Some(known.handle()));
		}
		if self.settings.open_type_resolution {
			if let Some(handle) = self.settings.registered_type(marker) {
				tracing::debug!(marker, declared = %declared.key(), "resolved type marker through open resolution");
				return Ok(Some(handle));
			}
		}
		Err(Error::unknown_or_disallowed_type(marker, declared.key().clone()))
	}

	/// Store a value read as `resolved` in a slot declared as `declared`
	pub fn upcast(&self, value: Value, resolved: &Contract, declared: &Contract) -> Result<Value> {
		let not_assignable = || Error::not_assignable(resolved.key().clone(), declared.key().clone());
		match declared.polymorphic() {
			Some(shape) => (shape.upcast)(value).map_err(|_| not_assignable()),
			None => Err(not_assignable()),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		errors::TypeResolutionError,
		test_struct::*,
		XmlSerializer,
	};

	fn serializer(settings: XmlSettings) -> XmlSerializer {
		let mut settings = settings;
		settings.omit_xml_declaration = true;
		XmlSerializer::with_settings(settings)
	}

	fn names(zoo: &Zoo) -> Vec<&str> {
		zoo.animals.iter().map(|a| a.name()).collect()
	}

	#[test]
	fn markers_for_known_types() {
		let xml = serializer(XmlSettings::new()).to_xml(&Zoo::sample()).unwrap();
		assert_eq!(xml, Zoo::SAMPLE_DOCUMENT);

		let zoo: Zoo = serializer(XmlSettings::new()).from_xml(&xml).unwrap();
		assert_eq!(names(&zoo), vec!["Rex", "Tom"]);
		assert_eq!(format!("{:?}", zoo.animals[1]), r#"Cat { name: "Tom", lives: 9 }"#);
		assert!(zoo.star.is_none());
	}

	#[test]
	fn disallowed_marker() {
		let err = serializer(XmlSettings::new())
			.from_xml::<Zoo>(r#"<zoo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><animal xsi:type="Foo"><id>1</id></animal></zoo>"#)
			.unwrap_err();
		match err {
			Error::TypeResolution(TypeResolutionError::UnknownOrDisallowedType { marker, .. }) => assert_eq!(marker, "Foo"),
			err => panic!("unexpected error: {:?}", err),
		}
	}

	#[test]
	fn member_known_types() {
		let kennel = Kennel {
			pet: Some(Box::new(Dog {
				name: String::from("Rex"),
				good: true,
			})),
		};
		// the member marker wins over the marker `Dog` of the declared type
		let xml = serializer(XmlSettings::new()).to_xml(&kennel).unwrap();
		assert_eq!(
			xml,
			r#"<kennel xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><pet xsi:type="hound"><name>Rex</name><good>true</good></pet></kennel>"#
		);
		let kennel: Kennel = serializer(XmlSettings::new()).from_xml(&xml).unwrap();
		assert_eq!(format!("{:?}", kennel.pet), r#"Some(Dog { name: "Rex", good: true })"#);

		// known types of the declared type stay allowed
		let kennel: Kennel = serializer(XmlSettings::new())
			.from_xml(r#"<kennel xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><pet xsi:type="cat"><name>Tom</name><lives>2</lives></pet></kennel>"#)
			.unwrap();
		assert_eq!(kennel.pet.map(|pet| pet.name().to_owned()), Some(String::from("Tom")));

		let err = serializer(XmlSettings::new())
			.from_xml::<Kennel>(r#"<kennel xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><pet xsi:type="wolf"><name>Grey</name></pet></kennel>"#)
			.unwrap_err();
		match err {
			Error::TypeResolution(TypeResolutionError::UnknownOrDisallowedType { marker, declared }) => {
				assert_eq!(marker, "wolf");
				assert_eq!(declared.as_str(), "Animal");
			},
			err => panic!("unexpected error: {:?}", err),
		}
	}

	#[test]
	fn not_assignable() {
		// registered and resolvable, but `Foo` isn't an animal
		let mut settings = XmlSettings::new().register_type::<Foo>();
		settings.open_type_resolution = true;
		let err = serializer(settings)
			.from_xml::<Zoo>(r#"<zoo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><animal xsi:type="Foo"><id>1</id></animal></zoo>"#)
			.unwrap_err();
		assert!(
			matches!(err, Error::TypeResolution(TypeResolutionError::NotAssignable { .. })),
			"{:?}",
			err
		);
	}

	#[test]
	fn open_resolution() {
		let document = r#"<zoo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><animal xsi:type="Cat"><name>Tom</name><lives>3</lives></animal></zoo>"#;
		// the type key of `Cat` isn't its marker
		assert!(serializer(XmlSettings::new().register_type::<Cat>()).from_xml::<Zoo>(document).is_err());

		let mut settings = XmlSettings::new().register_type::<Cat>();
		settings.open_type_resolution = true;
		let zoo: Zoo = serializer(settings).from_xml(document).unwrap();
		assert_eq!(names(&zoo), vec!["Tom"]);
	}

	#[test]
	fn settings_known_types() {
		let settings = XmlSettings::new().with_known_type::<Box<dyn Animal>>(KnownType::with_marker::<Cat, _>("kitty"));
		let zoo: Zoo = serializer(settings)
			.from_xml(r#"<zoo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><star xsi:type="kitty"><name>Tom</name><lives>1</lives></star></zoo>"#)
			.unwrap();
		assert_eq!(zoo.star.map(|star| star.name().to_owned()), Some(String::from("Tom")));
	}

	#[test]
	fn always_and_none() {
		let mut settings = XmlSettings::new();
		settings.type_handling = TypeHandling::Always;
		let xml = serializer(settings).to_xml(&Foo::sample()).unwrap();
		assert_eq!(
			xml,
			r#"<foo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="Foo"><id xsi:type="i32">1</id><name xsi:type="String">test</name></foo>"#
		);
		// markers naming the declared type need no resolution
		assert_eq!(serializer(XmlSettings::new()).from_xml::<Foo>(&xml).unwrap(), Foo::sample());

		let mut settings = XmlSettings::new();
		settings.type_handling = TypeHandling::None;
		let xml = serializer(settings).to_xml(&Zoo::sample()).unwrap();
		assert!(!xml.contains("xsi:type"), "{}", xml);
	}

	#[test]
	fn markers_ignored_without_type_handling() {
		let mut settings = XmlSettings::new();
		settings.type_handling = TypeHandling::None;
		let foo: Foo = serializer(settings)
			.from_xml(r#"<foo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><id xsi:type="Unknown">1</id><name>test</name></foo>"#)
			.unwrap();
		assert_eq!(foo, Foo::sample());
	}
}
