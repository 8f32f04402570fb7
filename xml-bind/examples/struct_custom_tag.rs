// use `cargo run -p xml-bind --example struct_custom_tag` to run from git repository base directory

use xml_bind::{XmlSerializer, XmlType};

/// a struct that customizes the tag name in XML serialization
#[derive(XmlType, Default, Debug)]
#[xml(rename = "datum")]
pub struct Data {
	#[xml(attribute)]
	pub key: String,
	#[xml(attribute)]
	pub other: u32,
	#[xml(collection, item = "note")]
	pub notes: Vec<String>,
}

fn main() {
	let stuff = Data {
		key: String::from("hello"),
		other: 5,
		notes: vec![String::from("first"), String::from("second")],
	};

	eprintln!("Generating XML output...");

	let serializer = XmlSerializer::new();
	let document = serializer.to_xml(&stuff).unwrap();
	// print serialized document
	println!("{}", document);

	eprintln!("Parsing it again...");
	let parsed: Data = serializer.from_xml(&document).unwrap();
	println!("{:?}", parsed);
}
