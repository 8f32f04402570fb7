use crate::{
	contract::{
		CollectionSlot,
		Property,
	},
	types::{
		CollectionBuild,
		CollectionShape,
		Value,
	},
	Result,
};

/// Accumulates the items of a collection while reading
///
/// Created on the first item of a collection property and finalized after the containing
/// element was read.
pub struct CollectionProxy {
	slot: CollectionSlot,
	items: Vec<Value>,
}

impl CollectionProxy {
	/// Proxy building a value of a collection shape
	pub fn new(shape: CollectionShape) -> Self {
		Self::for_slot(CollectionSlot { shape, nullable: None })
	}

	pub(crate) fn for_slot(slot: CollectionSlot) -> Self {
		Self { slot, items: Vec::new() }
	}

	/// Proxy for a collection property, `None` if the property isn't collection-flagged
	pub fn for_property(property: &Property) -> Option<Self> {
		property.collection.map(Self::for_slot)
	}

	/// Append an item
	pub fn add(&mut self, item: Value) {
		self.items.push(item);
	}

	/// Number of items collected so far
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Whether no items were collected
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Build the collection (wrapped in `Some` for optional collection properties)
	pub fn finalize(self) -> Result<Value> {
		let collection = match self.slot.shape.build {
			CollectionBuild::FromSequence(build) => build(self.items)?,
			CollectionBuild::Concrete { create, push } => {
				let mut collection = create();
				for item in self.items {
					push(&mut *collection, item)?;
				}
				collection
			},
		};
		match self.slot.nullable {
			Some(nullable) => (nullable.wrap)(Some(collection)),
			None => Ok(collection),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::types::{
		downcast,
		TypeShape,
		XmlType,
	};
	use std::collections::BTreeSet;

	fn shape<T: XmlType>() -> CollectionShape {
		match T::descriptor().shape {
			TypeShape::Collection(shape) => shape,
			_ => panic!("not a collection"),
		}
	}

	#[test]
	fn concrete() {
		let mut proxy = CollectionProxy::new(shape::<BTreeSet<i32>>());
		for i in [3, 1, 3] {
			proxy.add(Box::new(i));
		}
		assert_eq!(proxy.len(), 3);
		let set = downcast::<BTreeSet<i32>>(proxy.finalize().unwrap()).unwrap();
		assert_eq!(set.into_iter().collect::<Vec<_>>(), [1, 3]);
	}

	#[test]
	fn from_sequence() {
		let mut proxy = CollectionProxy::new(shape::<Box<[String]>>());
		proxy.add(Box::new(String::from("a")));
		proxy.add(Box::new(String::from("b")));
		let items = downcast::<Box<[String]>>(proxy.finalize().unwrap()).unwrap();
		assert_eq!(&*items, ["a", "b"]);
	}

	#[test]
	fn optional() {
		let slot = CollectionSlot {
			shape: shape::<Vec<i32>>(),
			nullable: match <Option<Vec<i32>>>::descriptor().shape {
				TypeShape::Nullable(shape) => Some(shape),
				_ => None,
			},
		};
		let proxy = CollectionProxy::for_slot(slot);
		assert!(proxy.is_empty());
		let value = downcast::<Option<Vec<i32>>>(proxy.finalize().unwrap()).unwrap();
		assert_eq!(value, Some(Vec::new()));
	}

	#[test]
	fn wrong_item_type() {
		let mut proxy = CollectionProxy::new(shape::<Vec<i32>>());
		proxy.add(Box::new("x"));
		assert!(proxy.finalize().is_err());
	}
}
