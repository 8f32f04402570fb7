use crate::contract::{
	MappingKind,
	Property,
};
use std::cmp::Ordering;

fn group(property: &Property) -> u8 {
	match property.mapping() {
		MappingKind::Attribute => 0,
		_ => 1,
	}
}

/// Write order of two properties
///
/// Attributes come first. An explicit order on either side compares numerically (an
/// unspecified order counts as `-1`); otherwise base-declared members precede derived ones
/// and declaration order decides within one type.
pub(crate) fn compare(a: &Property, b: &Property) -> Ordering {
	group(a).cmp(&group(b)).then_with(|| {
		if a.order != -1 || b.order != -1 {
			a.order.cmp(&b.order)
		} else {
			b.depth.cmp(&a.depth).then(a.sequence.cmp(&b.sequence))
		}
	})
}

/// Sort properties into write order (stable)
pub(crate) fn sort(properties: &mut [Property]) {
	properties.sort_by(compare);
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		contract::{
			MemberDescriptor,
			XmlMember,
		},
		name::QualifiedName,
		types::{
			Field,
			TypeHandle,
		},
	};
	use std::sync::Arc;

	struct Dummy {
		value: i32,
	}

	fn property(name: &'static str, mapping: MappingKind, order: i32, depth: u32, sequence: usize) -> Property {
		let mut member = XmlMember::element(TypeHandle::of::<i32>(), QualifiedName::new(name));
		member.mapping = mapping;
		Property {
			descriptor: MemberDescriptor {
				name: name.into(),
				declared_type: TypeHandle::of::<i32>().key(),
				can_read: true,
				can_write: true,
			},
			member,
			required: false,
			order,
			depth,
			sequence,
			collection: None,
			item: None,
			accessor: Arc::new(Field::new(|d: &Dummy| &d.value, |d: &mut Dummy| &mut d.value)),
			should_serialize: None,
		}
	}

	fn names(properties: &[Property]) -> Vec<&str> {
		properties.iter().map(|p| p.name()).collect()
	}

	#[test]
	fn attributes_first() {
		let mut properties = vec![
			property("child", MappingKind::Element, -1, 0, 0),
			property("id", MappingKind::Attribute, -1, 0, 1),
		];
		sort(&mut properties);
		assert_eq!(names(&properties), ["id", "child"]);
	}

	#[test]
	fn base_before_derived() {
		let mut properties = vec![
			property("test1", MappingKind::Element, -1, 0, 0),
			property("test2", MappingKind::Element, -1, 1, 1),
			property("test3", MappingKind::Element, -1, 0, 2),
		];
		sort(&mut properties);
		assert_eq!(names(&properties), ["test2", "test1", "test3"]);
	}

	#[test]
	fn explicit_order() {
		let mut properties = vec![
			property("c", MappingKind::Element, 2, 0, 0),
			property("a", MappingKind::Element, -1, 0, 1),
			property("b", MappingKind::Element, 1, 1, 2),
			property("d", MappingKind::Element, 2, 0, 3),
		];
		sort(&mut properties);
		assert_eq!(names(&properties), ["a", "b", "c", "d"]);
	}
}
