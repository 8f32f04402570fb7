use crate::attributes::{
	all_attributes,
	flag,
	int_lit,
	meta_name,
	path_lit,
	string_lit,
	unknown,
	unraw,
	ContainerAttrs,
};
use proc_macro2::TokenStream;
use quote::{
	quote,
	quote_spanned,
};
use syn::{
	spanned::Spanned,
	DeriveInput,
	Error,
	Fields,
	Ident,
	Lit,
	LitStr,
	Meta,
	NestedMeta,
	Path,
	Result,
	Type,
};

enum Mapping {
	Element,
	Attribute,
	Text,
}

enum FieldDefault {
	None,
	Trait,
	Function(Path),
}

struct KnownType {
	ty: Path,
	marker: Option<LitStr>,
}

/// Mapping settings of a single field
struct FieldAttrs {
	mapping: Mapping,
	rename: Option<LitStr>,
	namespace: Option<LitStr>,
	order: Option<i32>,
	required: bool,
	collection: bool,
	item: Option<LitStr>,
	default: FieldDefault,
	base: bool,
	skip: bool,
	should_serialize: Option<Path>,
	known_types: Vec<KnownType>,
	type_handling: Option<TokenStream>,
	null_handling: Option<TokenStream>,
	default_handling: Option<TokenStream>,
}

fn policy(krate: &Path, meta: &Meta) -> Result<TokenStream> {
	let value = string_lit(meta)?;
	let name = meta_name(meta);
	let (ty, variants): (&str, &[(&str, &str)]) = match name.as_str() {
		"type_handling" => ("TypeHandling", &[("none", "None"), ("auto", "Auto"), ("always", "Always")]),
		"null_handling" => ("NullValueHandling", &[("ignore", "Ignore"), ("include", "Include")]),
		_ => ("DefaultValueHandling", &[("include", "Include"), ("ignore", "Ignore")]),
	};
	let module = if name == "type_handling" {
		quote!(type_handling)
	} else {
		quote!(settings)
	};
	let variant = variants
		.iter()
		.find(|(lit, _)| *lit == value.value())
		.map(|(_, variant)| *variant)
		.ok_or_else(|| Error::new(value.span(), format!("invalid value for {}", name)))?;
	let ty = Ident::new(ty, value.span());
	let variant = Ident::new(variant, value.span());
	Ok(quote!(#krate::#module::#ty::#variant))
}

fn known_types(meta: &Meta) -> Result<Vec<KnownType>> {
	let list = match meta {
		Meta::List(list) => list,
		_ => return Err(Error::new(meta.span(), "expected known_types(Type, Other = \"marker\")")),
	};
	list.nested
		.iter()
		.map(|nested| match nested {
			NestedMeta::Meta(Meta::Path(ty)) => Ok(KnownType {
				ty: ty.clone(),
				marker: None,
			}),
			NestedMeta::Meta(Meta::NameValue(nv)) => match &nv.lit {
				Lit::Str(marker) => Ok(KnownType {
					ty: nv.path.clone(),
					marker: Some(marker.clone()),
				}),
				lit => Err(Error::new(lit.span(), "expected string marker")),
			},
			_ => Err(Error::new(nested.span(), "expected a type")),
		})
		.collect()
}

impl FieldAttrs {
	fn parse(krate: &Path, field: &syn::Field) -> Result<Self> {
		let mut result = Self {
			mapping: Mapping::Element,
			rename: None,
			namespace: None,
			order: None,
			required: false,
			collection: false,
			item: None,
			default: FieldDefault::None,
			base: false,
			skip: false,
			should_serialize: None,
			known_types: Vec::new(),
			type_handling: None,
			null_handling: None,
			default_handling: None,
		};
		for nested in all_attributes(&field.attrs)? {
			let meta = match nested {
				NestedMeta::Meta(meta) => meta,
				NestedMeta::Lit(lit) => return Err(Error::new(lit.span(), "unexpected literal")),
			};
			match meta_name(&meta).as_str() {
				"attribute" | "attr" => {
					flag(&meta)?;
					result.mapping = Mapping::Attribute;
				},
				"text" => {
					flag(&meta)?;
					result.mapping = Mapping::Text;
				},
				"element" => {
					flag(&meta)?;
					result.mapping = Mapping::Element;
				},
				"rename" => result.rename = Some(string_lit(&meta)?),
				"namespace" => result.namespace = Some(string_lit(&meta)?),
				"order" => result.order = Some(int_lit(&meta)?),
				"required" => {
					flag(&meta)?;
					result.required = true;
				},
				"collection" => {
					flag(&meta)?;
					result.collection = true;
				},
				"item" => {
					result.collection = true;
					result.item = Some(string_lit(&meta)?);
				},
				"default" => {
					result.default = match meta {
						Meta::Path(_) => FieldDefault::Trait,
						_ => FieldDefault::Function(path_lit(&meta)?),
					}
				},
				"base" => {
					flag(&meta)?;
					result.base = true;
				},
				"skip" => {
					flag(&meta)?;
					result.skip = true;
				},
				"should_serialize" => result.should_serialize = Some(path_lit(&meta)?),
				"known_types" => result.known_types.extend(known_types(&meta)?),
				"type_handling" => result.type_handling = Some(policy(krate, &meta)?),
				"null_handling" => result.null_handling = Some(policy(krate, &meta)?),
				"default_handling" => result.default_handling = Some(policy(krate, &meta)?),
				_ => return Err(unknown(&meta)),
			}
		}
		Ok(result)
	}
}

fn member(krate: &Path, ident: &Ident, ty: &Type, attrs: FieldAttrs) -> TokenStream {
	let name = unraw(ident);
	let span = ident.span();

	if attrs.base {
		return quote_spanned! {span=>
			.inherit::<#ty>(|o: &Self| &o.#ident, |o: &mut Self| &mut o.#ident)
		};
	}

	let mut modifiers = TokenStream::new();
	match attrs.mapping {
		Mapping::Element => (),
		Mapping::Attribute => modifiers.extend(quote!(.attribute())),
		Mapping::Text => modifiers.extend(quote!(.text())),
	}
	if let Some(rename) = &attrs.rename {
		modifiers.extend(quote!(.rename(#rename)));
	}
	if let Some(namespace) = &attrs.namespace {
		modifiers.extend(quote!(.namespace(#namespace)));
	}
	if let Some(order) = attrs.order {
		modifiers.extend(quote!(.order(#order)));
	}
	if attrs.required {
		modifiers.extend(quote!(.required()));
	}
	if attrs.collection {
		modifiers.extend(quote!(.collection()));
	}
	if let Some(item) = &attrs.item {
		modifiers.extend(quote!(.item_name(#item)));
	}
	match &attrs.default {
		FieldDefault::None => (),
		FieldDefault::Trait => modifiers.extend(quote!(.default_with::<#ty>(<#ty as ::std::default::Default>::default))),
		FieldDefault::Function(path) => modifiers.extend(quote!(.default_with::<#ty>(#path))),
	}
	if let Some(gate) = &attrs.should_serialize {
		modifiers.extend(quote!(.should_serialize::<Self>(#gate)));
	}
	for known in &attrs.known_types {
		let known_ty = &known.ty;
		modifiers.extend(match &known.marker {
			Some(marker) => quote!(.known_type(#krate::types::KnownType::with_marker::<#known_ty, _>(#marker))),
			None => quote!(.known_type(#krate::types::KnownType::of::<#known_ty>())),
		});
	}
	if let Some(policy) = &attrs.type_handling {
		modifiers.extend(quote!(.type_handling(#policy)));
	}
	if let Some(policy) = &attrs.null_handling {
		modifiers.extend(quote!(.null_handling(#policy)));
	}
	if let Some(policy) = &attrs.default_handling {
		modifiers.extend(quote!(.default_handling(#policy)));
	}

	quote_spanned! {span=>
		.member(
			#krate::types::MemberSpec::field::<Self, #ty, _>(#name, |o: &Self| &o.#ident, |o: &mut Self| &mut o.#ident)
				#modifiers
		)
	}
}

pub fn derive(input: &DeriveInput, fields: &Fields) -> Result<TokenStream> {
	let container = ContainerAttrs::parse(&input.attrs)?;
	let krate = &container.krate;
	let ident = &input.ident;
	let name = unraw(ident);
	let key = container
		.key
		.as_ref()
		.map(LitStr::value)
		.unwrap_or_else(|| name.clone());

	let named = match fields {
		Fields::Named(named) => &named.named,
		Fields::Unit => return derive_unit(input, &container, &key, &name),
		Fields::Unnamed(_) => return Err(Error::new(fields.span(), "only structs with named fields are supported")),
	};

	let mut members = TokenStream::new();
	for field in named {
		let field_ident = field
			.ident
			.as_ref()
			.ok_or_else(|| Error::new(field.span(), "only named fields are supported"))?;
		let attrs = FieldAttrs::parse(krate, field)?;
		if attrs.skip {
			continue;
		}
		members.extend(member(krate, field_ident, &field.ty, attrs));
	}

	let root = container.root(&name).map(|root| quote!(.root(#root)));
	let create = creation(&container);

	Ok(quote! {
		impl #krate::types::XmlType for #ident {
			fn type_key() -> #krate::types::TypeKey {
				#krate::types::TypeKey::new(#key)
			}

			fn descriptor() -> #krate::types::TypeDescriptor {
				#krate::types::ObjectBuilder::<Self>::new()
					.name(#name)
					#root
					#create
					#members
					.build()
			}
		}
	})
}

fn creation(container: &ContainerAttrs) -> TokenStream {
	match (&container.create, container.no_default) {
		(Some(create), _) => quote!(.creator(|| ::std::boxed::Box::new(#create()))),
		(None, true) => TokenStream::new(),
		(None, false) => quote!(.constructible()),
	}
}

// a unit struct maps to an element without content
fn derive_unit(input: &DeriveInput, container: &ContainerAttrs, key: &str, name: &str) -> Result<TokenStream> {
	let krate = &container.krate;
	let ident = &input.ident;
	let root = container.root(name).map(|root| quote!(.root(#root)));
	Ok(quote! {
		impl #krate::types::XmlType for #ident {
			fn type_key() -> #krate::types::TypeKey {
				#krate::types::TypeKey::new(#key)
			}

			fn descriptor() -> #krate::types::TypeDescriptor {
				#krate::types::ObjectBuilder::<Self>::new()
					.name(#name)
					#root
					.creator(|| ::std::boxed::Box::new(#ident))
					.build()
			}
		}
	})
}
