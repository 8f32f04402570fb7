use proc_macro2::TokenStream;
use quote::quote;
use syn::{
	spanned::Spanned,
	Attribute,
	Error,
	Lit,
	LitStr,
	Meta,
	NestedMeta,
	Path,
	Result,
};

pub fn all_attributes(attrs: &[Attribute]) -> Result<Vec<NestedMeta>> {
	let mut nested = Vec::new();
	for attr in attrs {
		if !attr.path.is_ident("xml") {
			continue;
		}
		match attr.parse_meta()? {
			Meta::List(meta) => nested.extend(meta.nested),
			meta => return Err(Error::new(meta.span(), "expected #[xml(...)]")),
		}
	}
	Ok(nested)
}

pub fn meta_name(meta: &Meta) -> String {
	meta.path()
		.get_ident()
		.map(|ident| ident.to_string())
		.unwrap_or_default()
}

pub fn flag(meta: &Meta) -> Result<()> {
	match meta {
		Meta::Path(_) => Ok(()),
		_ => Err(Error::new(meta.span(), "flag doesn't take arguments")),
	}
}

pub fn single_lit(meta: &Meta) -> Result<&Lit> {
	match meta {
		Meta::NameValue(nv) => Ok(&nv.lit),
		Meta::List(l) if l.nested.len() == 1 => match l.nested.first() {
			Some(NestedMeta::Lit(lit)) => Ok(lit),
			_ => Err(Error::new(l.span(), "expected a single literal argument")),
		},
		_ => Err(Error::new(meta.span(), "expected `name = \"...\"` or `name(\"...\")`")),
	}
}

pub fn string_lit(meta: &Meta) -> Result<LitStr> {
	match single_lit(meta)? {
		Lit::Str(s) => Ok(s.clone()),
		lit => Err(Error::new(lit.span(), "invalid literal; expected string")),
	}
}

pub fn int_lit(meta: &Meta) -> Result<i32> {
	match single_lit(meta)? {
		Lit::Int(i) => i.base10_parse(),
		lit => Err(Error::new(lit.span(), "invalid literal; expected integer")),
	}
}

pub fn path_lit(meta: &Meta) -> Result<Path> {
	string_lit(meta)?.parse()
}

/// `crate(path)`
pub fn single_path(meta: &Meta) -> Result<Path> {
	match meta {
		Meta::List(l) if l.nested.len() == 1 => match l.nested.first() {
			Some(NestedMeta::Meta(Meta::Path(path))) => Ok(path.clone()),
			Some(NestedMeta::Lit(Lit::Str(s))) => s.parse(),
			_ => Err(Error::new(l.span(), "expected a path")),
		},
		Meta::NameValue(nv) => match &nv.lit {
			Lit::Str(s) => s.parse(),
			lit => Err(Error::new(lit.span(), "expected a path")),
		},
		_ => Err(Error::new(meta.span(), "expected a path")),
	}
}

pub fn unknown(meta: &Meta) -> Error {
	Error::new(meta.span(), format!("unknown xml attribute `{}`", meta_name(meta)))
}

/// Settings on the deriving type
pub struct ContainerAttrs {
	pub krate: Path,
	pub key: Option<LitStr>,
	pub rename: Option<LitStr>,
	pub namespace: Option<LitStr>,
	pub create: Option<Path>,
	pub no_default: bool,
}

impl ContainerAttrs {
	pub fn parse(attrs: &[Attribute]) -> Result<Self> {
		let mut result = Self {
			krate: syn::parse_quote!(::xml_bind),
			key: None,
			rename: None,
			namespace: None,
			create: None,
			no_default: false,
		};
		for nested in all_attributes(attrs)? {
			let meta = match nested {
				NestedMeta::Meta(meta) => meta,
				NestedMeta::Lit(lit) => return Err(Error::new(lit.span(), "unexpected literal")),
			};
			match meta_name(&meta).as_str() {
				"crate" => result.krate = single_path(&meta)?,
				"key" => result.key = Some(string_lit(&meta)?),
				"rename" | "root" => result.rename = Some(string_lit(&meta)?),
				"namespace" => result.namespace = Some(string_lit(&meta)?),
				"create" => result.create = Some(path_lit(&meta)?),
				"no_default" => {
					flag(&meta)?;
					result.no_default = true;
				},
				_ => return Err(unknown(&meta)),
			}
		}
		Ok(result)
	}

	/// `.root(...)` argument if a root name or namespace was given
	pub fn root(&self, default_local: &str) -> Option<TokenStream> {
		let krate = &self.krate;
		let local = match &self.rename {
			Some(rename) => rename.value(),
			None => default_local.to_owned(),
		};
		match (&self.rename, &self.namespace) {
			(None, None) => None,
			(_, Some(namespace)) => Some(quote!(#krate::name::QualifiedName::with_namespace(#local, #namespace))),
			(Some(_), None) => Some(quote!(#krate::name::QualifiedName::new(#local))),
		}
	}
}

/// Strip the `r#` of raw identifiers
pub fn unraw(ident: &syn::Ident) -> String {
	let name = ident.to_string();
	match name.strip_prefix("r#") {
		Some(stripped) => stripped.to_owned(),
		None => name,
	}
}
