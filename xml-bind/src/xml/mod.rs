//! Document level XML access on top of `quick_xml`

mod reader;
mod writer;

pub use self::{
	reader::XmlReader,
	writer::XmlWriter,
};
