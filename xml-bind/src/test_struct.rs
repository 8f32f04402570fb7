use crate::{
	polymorphic,
	types::{
		Base64Binary,
		XmlObject,
	},
};
use chrono::NaiveDateTime;
use std::fmt;

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[xml(rename = "foo", crate(crate))]
pub struct Foo {
	pub id: i32,
	pub name: String,
}

impl Foo {
	pub const SAMPLE_DOCUMENT: &'static str = r#"<?xml version="1.0" encoding="utf-8"?><foo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><id>1</id><name>test</name></foo>"#;

	pub fn sample() -> Self {
		Self {
			id: 1,
			name: String::from("test"),
		}
	}
}

#[derive(crate::XmlType)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[xml(crate(crate))]
pub enum Level {
	#[default]
	Low,
	#[xml(rename = "HIGH")]
	High,
}

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[xml(rename = "holder", crate(crate))]
pub struct Holder {
	#[xml(attribute)]
	pub level: Level,
	pub note: Option<String>,
	#[xml(default = "Holder::default_count")]
	pub count: i32,
}

impl Holder {
	pub fn default_count() -> i32 {
		10
	}
}

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[xml(rename = "reminder", crate(crate))]
pub struct Reminder {
	#[xml(default = "Reminder::default_note")]
	pub note: Option<String>,
}

impl Reminder {
	pub fn default_note() -> Option<String> {
		Some(String::from("none"))
	}
}

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[xml(rename = "sample", namespace = "http://example.org", crate(crate))]
pub struct Sample {
	#[xml(attribute, namespace = "http://example.org/id")]
	pub id: i32,
	#[xml(namespace = "http://example.org")]
	pub value: String,
}

impl Sample {
	pub const SAMPLE_DOCUMENT: &'static str = r#"<sample xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns="http://example.org" xmlns:p1="http://example.org/id" p1:id="7"><value>x</value></sample>"#;
}

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[xml(crate(crate))]
pub struct BaseRecord {
	pub test2: String,
}

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[xml(rename = "record", crate(crate))]
pub struct Record {
	#[xml(base)]
	pub base: BaseRecord,
	pub test1: String,
}

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[xml(rename = "ordered", crate(crate))]
pub struct Ordered {
	#[xml(order = 2)]
	pub last: i32,
	#[xml(order = 1)]
	pub first: i32,
	#[xml(attribute, order = 5)]
	pub flag: bool,
}

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[xml(rename = "gated", crate(crate))]
pub struct Gated {
	pub name: String,
	#[xml(should_serialize = "Gated::has_note")]
	pub note: String,
}

impl Gated {
	pub fn has_note(&self) -> bool {
		!self.note.is_empty()
	}
}

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Debug, Default)]
#[xml(rename = "price", crate(crate))]
pub struct Price {
	#[xml(attribute)]
	pub currency: String,
	#[xml(text)]
	pub amount: f64,
}

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Debug, Default)]
#[xml(rename = "measure", crate(crate))]
pub struct Measure {
	#[xml(attribute)]
	pub unit: String,
	#[xml(text, required)]
	pub value: f64,
}

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[xml(rename = "bag", crate(crate))]
pub struct Bag {
	#[xml(collection, item = "tag")]
	pub tags: Vec<String>,
	pub numbers: Vec<i32>,
	#[xml(item = "extra")]
	pub extras: Option<Vec<String>>,
}

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[xml(rename = "config", crate(crate))]
pub struct Config {
	#[xml(required)]
	pub name: String,
	#[xml(attribute, default = "Config::default_port")]
	pub port: u16,
	#[xml(default)]
	pub level: Level,
}

impl Config {
	pub fn default_port() -> u16 {
		8080
	}
}

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[xml(crate(crate))]
pub struct Person {
	pub first_name: String,
	pub level: Level,
}

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[xml(rename = "event", crate(crate))]
pub struct Event {
	pub at: NaiveDateTime,
	pub payload: Base64Binary,
}

pub trait Animal: XmlObject + fmt::Debug {
	fn name(&self) -> &str;
}

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[xml(crate(crate))]
pub struct Dog {
	pub name: String,
	pub good: bool,
}

impl Animal for Dog {
	fn name(&self) -> &str {
		&self.name
	}
}

#[derive(crate::XmlType)]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[xml(crate(crate))]
pub struct Cat {
	pub name: String,
	pub lives: u8,
}

impl Animal for Cat {
	fn name(&self) -> &str {
		&self.name
	}
}

polymorphic!(dyn Animal as "Animal" {
	Dog,
	Cat => "cat",
});

#[derive(crate::XmlType)]
#[derive(Debug, Default)]
#[xml(rename = "zoo", crate(crate))]
pub struct Zoo {
	pub star: Option<Box<dyn Animal>>,
	#[xml(collection, item = "animal")]
	pub animals: Vec<Box<dyn Animal>>,
}

impl Zoo {
	pub fn sample() -> Self {
		Self {
			star: None,
			animals: vec![
				Box::new(Dog {
					name: String::from("Rex"),
					good: true,
				}),
				Box::new(Cat {
					name: String::from("Tom"),
					lives: 9,
				}),
			],
		}
	}

	pub const SAMPLE_DOCUMENT: &'static str = r#"<zoo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><animal xsi:type="Dog"><name>Rex</name><good>true</good></animal><animal xsi:type="cat"><name>Tom</name><lives>9</lives></animal></zoo>"#;
}

#[derive(crate::XmlType)]
#[derive(Debug, Default)]
#[xml(rename = "kennel", crate(crate))]
pub struct Kennel {
	#[xml(known_types(Dog = "hound"))]
	pub pet: Option<Box<dyn Animal>>,
}
