use crate::attributes::{
	all_attributes,
	meta_name,
	string_lit,
	unknown,
	unraw,
	ContainerAttrs,
};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{
	spanned::Spanned,
	DataEnum,
	DeriveInput,
	Error,
	Fields,
	LitStr,
	NestedMeta,
	Result,
};

fn variant_rename(variant: &syn::Variant) -> Result<Option<LitStr>> {
	let mut rename = None;
	for nested in all_attributes(&variant.attrs)? {
		match nested {
			NestedMeta::Meta(meta) if meta_name(&meta) == "rename" => rename = Some(string_lit(&meta)?),
			NestedMeta::Meta(meta) => return Err(unknown(&meta)),
			NestedMeta::Lit(lit) => return Err(Error::new(lit.span(), "unexpected literal")),
		}
	}
	Ok(rename)
}

pub fn derive(input: &DeriveInput, data: &DataEnum) -> Result<TokenStream> {
	let container = ContainerAttrs::parse(&input.attrs)?;
	let krate = &container.krate;
	let ident = &input.ident;
	let name = unraw(ident);
	let key = container
		.key
		.as_ref()
		.map(LitStr::value)
		.unwrap_or_else(|| name.clone());

	let mut variants = Vec::new();
	let mut to_index = Vec::new();
	let mut from_index = Vec::new();
	for (index, variant) in data.variants.iter().enumerate() {
		if !matches!(variant.fields, Fields::Unit) {
			return Err(Error::new(variant.span(), "only unit variants are supported"));
		}
		let variant_ident = &variant.ident;
		let variant_name = unraw(variant_ident);
		let rename = match variant_rename(variant)? {
			Some(rename) => quote!(::std::option::Option::Some(#rename)),
			None => quote!(::std::option::Option::None),
		};
		variants.push(quote! {
			#krate::types::EnumVariant {
				name: #variant_name,
				rename: #rename,
			}
		});
		to_index.push(quote!(Self::#variant_ident => #index));
		from_index.push(quote!(#index => ::std::option::Option::Some(Self::#variant_ident)));
	}

	let root = container.root(&name).map(|root| {
		quote! {
			descriptor.root = ::std::option::Option::Some(#root);
		}
	});

	Ok(quote! {
		impl #krate::types::XmlType for #ident {
			fn type_key() -> #krate::types::TypeKey {
				#krate::types::TypeKey::new(#key)
			}

			fn descriptor() -> #krate::types::TypeDescriptor {
				#[allow(unused_mut)]
				let mut descriptor = #krate::types::TypeDescriptor::new(
					Self::type_key(),
					#name,
					#krate::types::TypeShape::Enum(#krate::types::enum_shape::<Self>()),
				);
				#root
				descriptor
			}
		}

		impl #krate::types::XmlEnum for #ident {
			const VARIANTS: &'static [#krate::types::EnumVariant] = &[#(#variants),*];

			fn variant_index(&self) -> usize {
				match self {
					#(#to_index,)*
				}
			}

			fn from_variant_index(index: usize) -> ::std::option::Option<Self> {
				match index {
					#(#from_index,)*
					_ => ::std::option::Option::None,
				}
			}
		}
	})
}
