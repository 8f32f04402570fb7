use std::{
	any::Any,
	sync::Arc,
};
use xml_bind::{
	context::SerializationContext,
	contract::{
		Contract,
		ContractResolver,
		MappingKind,
		XmlMember,
	},
	converters::XmlConverter,
	errors::{
		ContractError,
		MappingError,
	},
	types::{
		MemberSpec,
		ObjectBuilder,
		TypeDescriptor,
		TypeKey,
		Value,
	},
	xml::{
		XmlReader,
		XmlWriter,
	},
	Error,
	Result,
	XmlSerializer,
	XmlSettings,
	XmlType,
};

#[derive(PartialEq, Debug)]
struct Account {
	owner: String,
	balance: i64,
}

impl Account {
	fn owner(&self) -> String {
		self.owner.clone()
	}

	fn set_owner(&mut self, owner: String) {
		self.owner = owner;
	}

	fn cents(&self) -> i64 {
		self.balance * 100
	}
}

// no parameterless constructor; needs a creation hook
impl XmlType for Account {
	fn type_key() -> TypeKey {
		TypeKey::new("Account")
	}

	fn descriptor() -> TypeDescriptor {
		ObjectBuilder::<Self>::new()
			.name("account")
			.member(
				MemberSpec::property(
					"owner",
					Some(Account::owner as fn(&Account) -> String),
					Some(Account::set_owner as fn(&mut Account, String)),
				)
				.attribute(),
			)
			.member(MemberSpec::field("balance", |a: &Account| &a.balance, |a: &mut Account| &mut a.balance).required())
			.member(MemberSpec::property::<Account, i64, _>("cents", Some(Account::cents as fn(&Account) -> i64), None))
			.build()
	}
}

fn account_serializer() -> XmlSerializer {
	let resolver = ContractResolver::default().with_creator(|| Account {
		owner: String::new(),
		balance: 0,
	});
	let mut settings = XmlSettings::new().with_resolver(Arc::new(resolver));
	settings.omit_xml_declaration = true;
	XmlSerializer::with_settings(settings)
}

#[test]
fn creation_hook_required() {
	let account = Account {
		owner: String::from("ann"),
		balance: 5,
	};
	let err = XmlSerializer::new().to_xml(&account).unwrap_err();
	assert!(
		matches!(err, Error::Contract(ContractError::NotConstructible(_))),
		"{:?}",
		err
	);

	let serializer = account_serializer();
	let xml = serializer.to_xml(&account).unwrap();
	assert_eq!(
		xml,
		r#"<account xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" owner="ann"><balance>5</balance></account>"#
	);
	assert_eq!(serializer.from_xml::<Account>(&xml).unwrap(), account);
}

#[test]
fn required_member() {
	let err = account_serializer()
		.from_xml::<Account>(r#"<account owner="bob"><cents>100</cents></account>"#)
		.unwrap_err();
	match err {
		Error::Mapping(MappingError::RequiredPropertyMissing { property, declaring_type }) => {
			assert_eq!(property, "balance");
			assert_eq!(declaring_type.as_str(), "Account");
		},
		err => panic!("unexpected error: {:?}", err),
	}
}

#[derive(XmlType, Default, PartialEq, Debug)]
#[xml(rename = "greeting")]
struct Greeting {
	#[xml(attribute)]
	lang: String,
	text: String,
	count: u32,
}

/// Upper case strings in documents, lower case in values
struct Shouting;

impl XmlConverter for Shouting {
	fn can_read(&self, contract: &Contract) -> bool {
		contract.key().as_str() == "String"
	}

	fn can_write(&self, contract: &Contract) -> bool {
		contract.key().as_str() == "String"
	}

	fn read(&self, reader: &mut XmlReader, member: &XmlMember, _contract: &Contract, _ctx: &SerializationContext<'_>) -> Result<Value> {
		let text = match member.mapping {
			MappingKind::Attribute => reader.value().to_owned(),
			_ => reader.read_element_content()?,
		};
		Ok(Box::new(text.to_lowercase()))
	}

	fn write(
		&self,
		writer: &mut XmlWriter,
		value: &dyn Any,
		_member: &XmlMember,
		_contract: &Contract,
		_ctx: &SerializationContext<'_>,
	) -> Result<()> {
		let text = value.downcast_ref::<String>().ok_or_else(|| Error::type_mismatch("String"))?;
		writer.write_text(&text.to_uppercase())
	}
}

#[test]
fn custom_converter_first() {
	let mut serializer = XmlSerializer::new().with_converter(Shouting);
	serializer.settings_mut().omit_xml_declaration = true;
	let greeting = Greeting {
		lang: String::from("en"),
		text: String::from("hello"),
		count: 2,
	};
	let xml = serializer.to_xml(&greeting).unwrap();
	assert_eq!(
		xml,
		r#"<greeting xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" lang="EN"><text>HELLO</text><count>2</count></greeting>"#
	);
	assert_eq!(serializer.from_xml::<Greeting>(&xml).unwrap(), greeting);
}

#[test]
fn shared_between_threads() {
	let serializer = XmlSerializer::new();
	std::thread::scope(|scope| {
		for i in 0..4u32 {
			let serializer = &serializer;
			scope.spawn(move || {
				let greeting = Greeting {
					lang: String::from("de"),
					text: format!("hallo {}", i),
					count: i,
				};
				let xml = serializer.to_xml(&greeting).unwrap();
				assert_eq!(serializer.from_xml::<Greeting>(&xml).unwrap(), greeting);
			});
		}
	});
}
