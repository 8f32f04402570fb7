use crate::{
	name::QualifiedName,
	Error,
	Result,
};
use quick_xml::{
	events::Event,
	name::{
		Namespace,
		ResolveResult,
	},
	NsReader,
};
use std::io::BufRead;

#[derive(Clone, Debug)]
struct Attribute {
	local: String,
	namespace: Option<String>,
	value: String,
}

#[derive(Clone, Debug)]
struct Start {
	local: String,
	namespace: Option<String>,
	attributes: Vec<Attribute>,
	empty: bool,
	line: usize,
}

#[derive(Clone, Debug)]
enum Node {
	Start(Start),
	End { line: usize },
	Text { text: String, line: usize },
}

fn utf8(raw: &[u8]) -> Result<&str> {
	std::str::from_utf8(raw).map_err(|e| Error::document(format!("invalid utf-8: {}", e)))
}

fn namespace_of(resolved: ResolveResult<'_>) -> Result<Option<String>> {
	match resolved {
		ResolveResult::Bound(Namespace(ns)) => Ok(Some(utf8(ns)?.to_owned())),
		ResolveResult::Unbound => Ok(None),
		ResolveResult::Unknown(prefix) => Err(Error::document(format!(
			"unknown namespace prefix {:?}",
			String::from_utf8_lossy(&prefix)
		))),
	}
}

// 1-based line of byte offsets, counted incrementally
struct Lines<'i> {
	input: &'i str,
	offset: usize,
	line: usize,
}

impl Lines<'_> {
	fn at(&mut self, offset: usize) -> usize {
		let offset = offset.min(self.input.len());
		if offset > self.offset {
			self.line += self.input.as_bytes()[self.offset..offset].iter().filter(|&&b| b == b'\n').count();
			self.offset = offset;
		}
		self.line
	}
}

fn tokenize(input: &str) -> Result<Vec<Node>> {
	let mut reader = NsReader::from_str(input);
	let mut lines = Lines { input, offset: 0, line: 1 };
	let mut nodes = Vec::new();
	let mut depth = 0usize;
	loop {
		let line = lines.at(reader.buffer_position() as usize);
		let (resolved, event) = reader.read_resolved_event()?;
		let namespace = namespace_of(resolved)?;
		let empty = matches!(event, Event::Empty(_));
		match event {
			Event::Start(e) | Event::Empty(e) => {
				let mut attributes = Vec::new();
				for attr in e.attributes() {
					let attr = attr.map_err(quick_xml::Error::from)?;
					if attr.key.as_namespace_binding().is_some() {
						continue;
					}
					let (resolved, local) = reader.resolve_attribute(attr.key);
					let namespace = namespace_of(resolved)?;
					let local = utf8(local.as_ref())?.to_owned();
					let value = attr.decode_and_unescape_value(reader.decoder())?.into_owned();
					attributes.push(Attribute { local, namespace, value });
				}
				nodes.push(Node::Start(Start {
					local: utf8(e.local_name().as_ref())?.to_owned(),
					namespace,
					attributes,
					empty,
					line,
				}));
				if empty {
					nodes.push(Node::End { line });
				} else {
					depth += 1;
				}
			},
			Event::End(_) => {
				depth = depth
					.checked_sub(1)
					.ok_or_else(|| Error::document("end tag without start tag"))?;
				nodes.push(Node::End { line });
			},
			Event::Text(t) => push_text(&mut nodes, t.unescape()?.into_owned(), line),
			Event::CData(c) => push_text(&mut nodes, utf8(&c)?.to_owned(), line),
			Event::Eof => break,
			// declarations, comments, processing instructions and doctypes carry no data
			_ => (),
		}
	}
	if depth != 0 {
		return Err(Error::unexpected_eof("unclosed element"));
	}
	Ok(nodes)
}

fn push_text(nodes: &mut Vec<Node>, text: String, line: usize) {
	if let Some(Node::Text { text: previous, .. }) = nodes.last_mut() {
		previous.push_str(&text);
	} else {
		nodes.push(Node::Text { text, line });
	}
}

/// Forward-only cursor over the nodes of an XML document
///
/// Namespaces are resolved while loading; declarations, comments and processing
/// instructions are dropped. Self-closing elements report an end node right after their
/// start node.
#[derive(Debug)]
pub struct XmlReader {
	nodes: Vec<Node>,
	pos: usize,
	attribute: Option<usize>,
}

impl XmlReader {
	/// Load a document from a string
	pub fn from_str(input: &str) -> Result<Self> {
		Ok(Self {
			nodes: tokenize(input)?,
			pos: 0,
			attribute: None,
		})
	}

	/// Load a document from a reader
	pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self> {
		let mut input = String::new();
		reader.read_to_string(&mut input)?;
		Self::from_str(&input)
	}

	fn node(&self) -> Option<&Node> {
		self.nodes.get(self.pos)
	}

	fn start(&self) -> Option<&Start> {
		match self.node() {
			Some(Node::Start(start)) => Some(start),
			_ => None,
		}
	}

	fn current_attribute(&self) -> Option<&Attribute> {
		let start = self.start()?;
		start.attributes.get(self.attribute?)
	}

	/// Position in the node stream; changes whenever a node is consumed
	pub fn position(&self) -> usize {
		self.pos
	}

	/// Number of elements opened and not yet closed before the current node
	pub fn depth(&self) -> usize {
		self.nodes[..self.pos.min(self.nodes.len())]
			.iter()
			.fold(0usize, |depth, node| match node {
				Node::Start(_) => depth + 1,
				Node::End { .. } => depth.saturating_sub(1),
				Node::Text { .. } => depth,
			})
	}

	/// Skip whitespace-only text; returns false at the end of the document
	pub fn move_to_content(&mut self) -> bool {
		self.attribute = None;
		while let Some(Node::Text { text, .. }) = self.node() {
			if !text.trim().is_empty() {
				break;
			}
			self.pos += 1;
		}
		!self.is_eof()
	}

	/// End of document reached
	pub fn is_eof(&self) -> bool {
		self.pos >= self.nodes.len()
	}

	/// Positioned at a start tag (or one of its attributes)
	pub fn is_start_element(&self) -> bool {
		self.start().is_some()
	}

	/// Positioned at an end tag
	pub fn is_end_element(&self) -> bool {
		matches!(self.node(), Some(Node::End { .. }))
	}

	/// Positioned at a self-closing start tag
	pub fn is_empty_element(&self) -> bool {
		self.start().map_or(false, |start| start.empty)
	}

	/// Positioned at a text node
	pub fn is_text(&self) -> bool {
		matches!(self.node(), Some(Node::Text { .. }))
	}

	/// Local name of the current attribute or element
	pub fn local_name(&self) -> &str {
		if let Some(attr) = self.current_attribute() {
			return &attr.local;
		}
		self.start().map_or("", |start| &start.local)
	}

	/// Namespace of the current attribute or element
	pub fn namespace(&self) -> Option<&str> {
		if let Some(attr) = self.current_attribute() {
			return attr.namespace.as_deref();
		}
		self.start().and_then(|start| start.namespace.as_deref())
	}

	/// Whether the current attribute or element has the given name
	pub fn is_name(&self, name: &QualifiedName) -> bool {
		(self.is_start_element() || self.attribute.is_some()) && name.matches(self.local_name(), self.namespace())
	}

	/// Value of the current attribute or text node
	pub fn value(&self) -> &str {
		if let Some(attr) = self.current_attribute() {
			return &attr.value;
		}
		match self.node() {
			Some(Node::Text { text, .. }) => text,
			_ => "",
		}
	}

	/// Line of the current node, 0 at the end of the document
	pub fn line(&self) -> usize {
		match self.node() {
			Some(Node::Start(start)) => start.line,
			Some(Node::End { line }) | Some(Node::Text { line, .. }) => *line,
			None => 0,
		}
	}

	/// Move to the first attribute of the current element
	pub fn move_to_first_attribute(&mut self) -> bool {
		match self.start() {
			Some(start) if !start.attributes.is_empty() => {
				self.attribute = Some(0);
				true
			},
			_ => false,
		}
	}

	/// Move to the next attribute of the current element
	pub fn move_to_next_attribute(&mut self) -> bool {
		let count = self.start().map_or(0, |start| start.attributes.len());
		match self.attribute {
			Some(index) if index + 1 < count => {
				self.attribute = Some(index + 1);
				true
			},
			None if count > 0 => {
				self.attribute = Some(0);
				true
			},
			_ => false,
		}
	}

	/// Move from an attribute back to its element
	pub fn move_to_element(&mut self) {
		self.attribute = None;
	}

	/// Value of an attribute of the current element
	pub fn get_attribute(&self, name: &QualifiedName) -> Option<&str> {
		self.start()?
			.attributes
			.iter()
			.find(|attr| name.matches(&attr.local, attr.namespace.as_deref()))
			.map(|attr| attr.value.as_str())
	}

	/// Whether the current element carries `xsi:nil="true"`
	pub fn is_nil(&self) -> bool {
		matches!(self.get_attribute(&QualifiedName::XSI_NIL).map(str::trim), Some("true") | Some("1"))
	}

	/// Value of `xsi:type` on the current element
	pub fn type_marker(&self) -> Option<&str> {
		self.get_attribute(&QualifiedName::XSI_TYPE).map(str::trim)
	}

	/// Advance to the next node
	pub fn read(&mut self) -> bool {
		self.attribute = None;
		if !self.is_eof() {
			self.pos += 1;
		}
		!self.is_eof()
	}

	/// Consume the start tag the reader is positioned at
	pub fn read_start_element(&mut self) -> Result<()> {
		self.move_to_content();
		if !self.is_start_element() {
			return Err(self.unexpected("start tag"));
		}
		self.read();
		Ok(())
	}

	/// Consume the end tag the reader is positioned at
	pub fn read_end_element(&mut self) -> Result<()> {
		self.move_to_content();
		if !self.is_end_element() {
			return Err(self.unexpected("end tag"));
		}
		self.read();
		Ok(())
	}

	/// Skip the current element including its content, or the current node
	pub fn skip(&mut self) {
		self.attribute = None;
		if !self.is_start_element() {
			self.read();
			return;
		}
		let mut depth = 0usize;
		while let Some(node) = self.nodes.get(self.pos) {
			self.pos += 1;
			match node {
				Node::Start(_) => depth += 1,
				Node::End { .. } => {
					depth -= 1;
					if depth == 0 {
						return;
					}
				},
				Node::Text { .. } => (),
			}
		}
	}

	/// Read the text content of the current element and consume the element
	///
	/// Fails if the element has child elements.
	pub fn read_element_content(&mut self) -> Result<String> {
		let local = self.local_name().to_owned();
		self.read_start_element()?;
		let mut content = String::new();
		loop {
			match self.node() {
				Some(Node::Text { text, .. }) => {
					content.push_str(text);
					self.pos += 1;
				},
				Some(Node::End { .. }) => {
					self.pos += 1;
					return Ok(content);
				},
				Some(Node::Start(child)) => {
					return Err(Error::document(format!(
						"unexpected element {:?} in text content of {:?}",
						child.local, local
					)))
				},
				None => return Err(Error::unexpected_eof("unclosed element")),
			}
		}
	}

	/// Text of the current node if it is a text node; consumes the node
	pub fn read_text(&mut self) -> Option<String> {
		match self.node() {
			Some(Node::Text { text, .. }) => {
				let text = text.clone();
				self.read();
				Some(text)
			},
			_ => None,
		}
	}

	fn unexpected(&self, expected: &str) -> Error {
		match self.node() {
			None => Error::document(format!("expected {}, found end of document", expected)),
			Some(Node::Start(start)) => Error::document(format!(
				"expected {}, found element {:?} on line {}",
				expected, start.local, start.line
			)),
			Some(Node::End { line }) => Error::document(format!("expected {}, found end tag on line {}", expected, line)),
			Some(Node::Text { line, .. }) => Error::document(format!("expected {}, found text on line {}", expected, line)),
		}
	}
}
