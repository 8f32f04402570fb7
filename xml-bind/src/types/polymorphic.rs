/// Declare a trait object slot `Box<dyn Trait>` with its known concrete types
///
/// The trait must have [`XmlObject`](crate::types::XmlObject) as supertrait. Each known
/// type is written with its type key as `xsi:type` marker unless an explicit marker is
/// given; when reading, only the listed markers are accepted (see
/// [`XmlSettings::open_type_resolution`](crate::XmlSettings::open_type_resolution)).
///
/// ```
/// use xml_bind::{polymorphic, types::XmlObject, XmlType};
///
/// trait Shape: XmlObject + std::fmt::Debug {}
///
/// #[derive(XmlType, Default, Debug)]
/// struct Circle {
/// 	radius: f64,
/// }
/// impl Shape for Circle {}
///
/// #[derive(XmlType, Default, Debug)]
/// struct Square {
/// 	side: f64,
/// }
/// impl Shape for Square {}
///
/// polymorphic!(dyn Shape as "Shape" {
/// 	Circle,
/// 	Square => "square",
/// });
/// ```
#[macro_export]
macro_rules! polymorphic {
	(dyn $trait:ident as $key:literal { $($known:ty $(=> $marker:literal)?),* $(,)? }) => {
		impl $crate::types::XmlType for ::std::boxed::Box<dyn $trait> {
			fn type_key() -> $crate::types::TypeKey {
				$crate::types::TypeKey::new($key)
			}

			fn descriptor() -> $crate::types::TypeDescriptor {
				$crate::types::ObjectBuilder::<Self>::new()
					$(.known_type($crate::polymorphic!(@known $known $(=> $marker)?)))*
					.polymorphic($crate::types::PolymorphicShape {
						resolve: |value| {
							let slot = $crate::types::downcast_ref::<::std::boxed::Box<dyn $trait>>(value)?;
							let inner: &dyn $trait = &**slot;
							Ok((
								$crate::types::XmlObject::as_any(inner),
								$crate::types::XmlObject::xml_type(inner),
							))
						},
						upcast: |value| {
							$(
								let value = match value.downcast::<$known>() {
									Ok(v) => {
										let slot: ::std::boxed::Box<dyn $trait> = v;
										return Ok(::std::boxed::Box::new(slot) as $crate::types::Value);
									},
									Err(v) => v,
								};
							)*
							Err(value)
						},
					})
					.build()
			}
		}
	};
	(@known $known:ty) => {
		$crate::types::KnownType::of::<$known>()
	};
	(@known $known:ty => $marker:literal) => {
		$crate::types::KnownType::with_marker::<$known, _>($marker)
	};
}

#[cfg(test)]
mod test {
	use crate::types::{
		TypeShape,
		Value,
		XmlObject,
		XmlType,
	};
	use std::any::Any;

	trait Pet: XmlObject {}
	impl Pet for i32 {}
	impl Pet for String {}

	polymorphic!(dyn Pet as "Pet" { i32, String => "text" });

	#[test]
	fn resolve_and_upcast() {
		let shape = match <Box<dyn Pet>>::descriptor().shape {
			TypeShape::Object(shape) => shape,
			_ => panic!("expected object shape"),
		};
		assert_eq!(shape.known_types.len(), 2);
		assert_eq!(shape.known_types[0].marker(), "i32");
		assert_eq!(shape.known_types[1].marker(), "text");
		let poly = shape.polymorphic.unwrap();

		let slot: Box<dyn Pet> = Box::new(5i32);
		let (inner, handle) = (poly.resolve)(&slot as &dyn Any).unwrap();
		assert_eq!(handle.key().as_str(), "i32");
		assert_eq!(inner.downcast_ref::<i32>(), Some(&5));

		let upcast = (poly.upcast)(Box::new(String::from("x")) as Value).unwrap();
		assert!(upcast.downcast_ref::<Box<dyn Pet>>().is_some());
		assert!((poly.upcast)(Box::new(1.5f64) as Value).is_err());
	}
}
