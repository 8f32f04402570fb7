use crate::{
	name::{
		QualifiedName,
		XSI_NAMESPACE,
		XSI_PREFIX,
	},
	settings::XmlSettings,
	Error,
	Result,
};
use quick_xml::events::{
	BytesDecl,
	BytesEnd,
	BytesStart,
	BytesText,
	Event,
};

// a namespace binding; `prefix: None` is the default namespace
#[derive(Debug)]
struct Binding {
	prefix: Option<String>,
	uri: String,
}

#[derive(Debug)]
struct Scope {
	tag: String,
	bindings: Vec<Binding>,
}

// start tag not written yet; attributes can still be added
#[derive(Debug)]
struct Pending {
	tag: String,
	attributes: Vec<(String, String)>,
}

#[derive(Debug)]
struct PendingAttribute {
	name: String,
	value: String,
}

/// Streaming XML output with namespace prefix management
///
/// Start tags are kept open until content follows, so attributes can be added after
/// [`start_element`](Self::start_element). Elements without content are written
/// self-closing.
pub struct XmlWriter {
	inner: quick_xml::Writer<Vec<u8>>,
	root_namespaces: Vec<(String, String)>,
	scopes: Vec<Scope>,
	pending: Option<Pending>,
	attribute: Option<PendingAttribute>,
	generated: usize,
}

impl XmlWriter {
	/// Writer configured from settings (indentation, root namespace declarations)
	pub fn new(settings: &XmlSettings) -> Self {
		let inner = match settings.indent {
			Some(indent) => quick_xml::Writer::new_with_indent(Vec::new(), b' ', indent),
			None => quick_xml::Writer::new(Vec::new()),
		};
		Self {
			inner,
			root_namespaces: settings.namespaces.clone(),
			scopes: Vec::new(),
			pending: None,
			attribute: None,
			generated: 0,
		}
	}

	/// Write the `<?xml ...?>` declaration
	pub fn write_declaration(&mut self) -> Result<()> {
		self.inner
			.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
		Ok(())
	}

	/// Nesting depth of open elements
	pub fn depth(&self) -> usize {
		self.scopes.len()
	}

	// prefix bound to uri, unless it got shadowed by an inner binding of the same prefix
	fn lookup(&self, uri: &str, allow_default: bool) -> Option<Option<&str>> {
		for (depth, scope) in self.scopes.iter().enumerate().rev() {
			for binding in scope.bindings.iter().rev() {
				if binding.uri != uri || (binding.prefix.is_none() && !allow_default) {
					continue;
				}
				let shadowed = self.scopes[depth + 1..]
					.iter()
					.flat_map(|s| &s.bindings)
					.any(|b| b.prefix == binding.prefix);
				if !shadowed {
					return Some(binding.prefix.as_deref());
				}
			}
		}
		None
	}

	fn default_namespace(&self) -> Option<&str> {
		self.scopes
			.iter()
			.rev()
			.flat_map(|s| s.bindings.iter().rev())
			.find(|b| b.prefix.is_none())
			.map(|b| b.uri.as_str())
	}

	fn prefix_in_use(&self, prefix: &str) -> bool {
		self.scopes
			.iter()
			.flat_map(|s| &s.bindings)
			.any(|b| b.prefix.as_deref() == Some(prefix))
	}

	fn bind(&mut self, prefix: Option<String>, uri: &str) -> Result<()> {
		let pending = self
			.pending
			.as_mut()
			.ok_or_else(|| Error::document("namespace declaration outside of a start tag"))?;
		let attribute = match &prefix {
			Some(prefix) => format!("xmlns:{}", prefix),
			None => "xmlns".to_owned(),
		};
		pending.attributes.push((attribute, uri.to_owned()));
		if let Some(scope) = self.scopes.last_mut() {
			scope.bindings.push(Binding {
				prefix,
				uri: uri.to_owned(),
			});
		}
		Ok(())
	}

	fn flush(&mut self) -> Result<()> {
		if let Some(pending) = self.pending.take() {
			let mut start = BytesStart::new(pending.tag);
			for (name, value) in &pending.attributes {
				start.push_attribute((name.as_str(), value.as_str()));
			}
			self.inner.write_event(Event::Start(start))?;
		}
		Ok(())
	}

	/// Open an element
	pub fn start_element(&mut self, name: &QualifiedName) -> Result<()> {
		if self.attribute.is_some() {
			return Err(Error::document("element started inside of an attribute"));
		}
		self.flush()?;
		let root = self.scopes.is_empty();
		let tag = match &name.namespace {
			Some(uri) => match self.lookup(uri, true) {
				Some(Some(prefix)) => format!("{}:{}", prefix, name.local),
				_ => name.local.to_string(),
			},
			None => name.local.to_string(),
		};
		self.scopes.push(Scope {
			tag: tag.clone(),
			bindings: Vec::new(),
		});
		self.pending = Some(Pending {
			tag,
			attributes: Vec::new(),
		});
		if root {
			for (prefix, uri) in self.root_namespaces.clone() {
				self.bind(Some(prefix), &uri)?;
			}
		}
		match &name.namespace {
			Some(uri) => {
				if self.lookup(uri, true).is_none() {
					self.bind(None, uri)?;
				}
			},
			None => {
				if self.default_namespace().map_or(false, |uri| !uri.is_empty()) {
					self.bind(None, "")?;
				}
			},
		}
		Ok(())
	}

	fn attribute_name(&mut self, name: &QualifiedName) -> Result<String> {
		let uri = match &name.namespace {
			None => return Ok(name.local.to_string()),
			Some(uri) => uri.to_string(),
		};
		if let Some(Some(prefix)) = self.lookup(&uri, false) {
			return Ok(format!("{}:{}", prefix, name.local));
		}
		let prefix = if uri == XSI_NAMESPACE && !self.prefix_in_use(XSI_PREFIX) {
			XSI_PREFIX.to_owned()
		} else {
			loop {
				self.generated += 1;
				let candidate = format!("p{}", self.generated);
				if !self.prefix_in_use(&candidate) {
					break candidate;
				}
			}
		};
		self.bind(Some(prefix.clone()), &uri)?;
		Ok(format!("{}:{}", prefix, name.local))
	}

	/// Add an attribute to the element just started
	pub fn write_attribute(&mut self, name: &QualifiedName, value: &str) -> Result<()> {
		if self.pending.is_none() {
			return Err(Error::attribute_after_content(&name.to_string()));
		}
		let name = self.attribute_name(name)?;
		if let Some(pending) = self.pending.as_mut() {
			pending.attributes.push((name, value.to_owned()));
		}
		Ok(())
	}

	/// Start collecting an attribute value; text written until
	/// [`end_attribute`](Self::end_attribute) becomes the value
	pub fn start_attribute(&mut self, name: &QualifiedName) -> Result<()> {
		if self.pending.is_none() {
			return Err(Error::attribute_after_content(&name.to_string()));
		}
		let name = self.attribute_name(name)?;
		self.attribute = Some(PendingAttribute {
			name,
			value: String::new(),
		});
		Ok(())
	}

	/// Finish the attribute started with [`start_attribute`](Self::start_attribute)
	pub fn end_attribute(&mut self) -> Result<()> {
		let attribute = self
			.attribute
			.take()
			.ok_or_else(|| Error::document("no attribute started"))?;
		match self.pending.as_mut() {
			Some(pending) => {
				pending.attributes.push((attribute.name, attribute.value));
				Ok(())
			},
			None => Err(Error::attribute_after_content(&attribute.name)),
		}
	}

	/// Write text (escaped); inside an attribute the text is appended to its value
	pub fn write_text(&mut self, text: &str) -> Result<()> {
		if let Some(attribute) = self.attribute.as_mut() {
			attribute.value.push_str(text);
			return Ok(());
		}
		if text.is_empty() {
			return Ok(());
		}
		self.flush()?;
		self.inner.write_event(Event::Text(BytesText::new(text)))?;
		Ok(())
	}

	/// Close the innermost open element
	pub fn end_element(&mut self) -> Result<()> {
		if self.attribute.is_some() {
			return Err(Error::document("element closed inside of an attribute"));
		}
		let scope = self
			.scopes
			.pop()
			.ok_or_else(|| Error::document("no open element to close"))?;
		match self.pending.take() {
			Some(pending) => {
				let mut start = BytesStart::new(pending.tag);
				for (name, value) in &pending.attributes {
					start.push_attribute((name.as_str(), value.as_str()));
				}
				self.inner.write_event(Event::Empty(start))?;
			},
			None => self.inner.write_event(Event::End(BytesEnd::new(scope.tag)))?,
		}
		Ok(())
	}

	/// Finish the document
	pub fn into_string(mut self) -> Result<String> {
		while !self.scopes.is_empty() {
			self.end_element()?;
		}
		String::from_utf8(self.inner.into_inner()).map_err(|e| Error::document(e.to_string()))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn writer() -> XmlWriter {
		XmlWriter::new(&XmlSettings::default())
	}

	#[test]
	fn root_declarations_and_empty_elements() {
		let mut w = writer();
		w.start_element(&QualifiedName::new("foo")).unwrap();
		w.start_element(&QualifiedName::new("id")).unwrap();
		w.write_text("1").unwrap();
		w.end_element().unwrap();
		w.start_element(&QualifiedName::new("empty")).unwrap();
		w.end_element().unwrap();
		w.end_element().unwrap();
		assert_eq!(
			w.into_string().unwrap(),
			r#"<foo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><id>1</id><empty/></foo>"#
		);
	}

	#[test]
	fn namespaces() {
		let mut w = writer();
		w.start_element(&QualifiedName::with_namespace("foo", "http://example.org")).unwrap();
		w.write_attribute(&QualifiedName::with_namespace("id", "http://example.org/id"), "1")
			.unwrap();
		w.write_attribute(&QualifiedName::XSI_NIL, "true").unwrap();
		w.start_element(&QualifiedName::with_namespace("child", "http://example.org")).unwrap();
		w.end_element().unwrap();
		w.start_element(&QualifiedName::new("plain")).unwrap();
		w.end_element().unwrap();
		w.end_element().unwrap();
		assert_eq!(
			w.into_string().unwrap(),
			concat!(
				r#"<foo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns="http://example.org" "#,
				r#"xmlns:p1="http://example.org/id" p1:id="1" xsi:nil="true">"#,
				r#"<child/><plain xmlns=""/></foo>"#,
			)
		);
	}

	#[test]
	fn attribute_after_content() {
		let mut w = writer();
		w.start_element(&QualifiedName::new("foo")).unwrap();
		w.write_text("x").unwrap();
		let err = w.write_attribute(&QualifiedName::new("late"), "1").unwrap_err();
		assert!(matches!(
			err,
			Error::Mapping(crate::errors::MappingError::AttributeAfterContent(_))
		));
	}

	#[test]
	fn attribute_from_text() {
		let mut w = writer();
		w.start_element(&QualifiedName::new("foo")).unwrap();
		w.start_attribute(&QualifiedName::new("a")).unwrap();
		w.write_text("x<").unwrap();
		w.end_attribute().unwrap();
		assert!(w.into_string().unwrap().ends_with(r#" a="x&lt;"/>"#));
	}
}
