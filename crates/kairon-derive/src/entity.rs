use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Error, Fields, GenericArgument, Ident, LitStr, PathArguments,
    Type, ext::IdentExt, punctuated::Punctuated, token::Comma,
};

/// Field name that marks a shape as soft-deletable.
const DELETED_FIELD: &str = "deleted";

/// Storage name that excludes a field, same as `#[entity(skip)]`.
const NOT_PERSISTED: &str = "-";

// derive_entity
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    expand(&input).unwrap_or_else(|err| err.to_compile_error())
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let ident_name = ident.unraw().to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let container = ContainerAttrs::parse(&input.attrs)?;
    let collection = container.collection.unwrap_or_else(|| ident_name.clone());

    let mut field_models = Vec::new();
    let mut deleted_field = None;

    for field in named_fields(input)? {
        let attrs = FieldAttrs::parse(&field.attrs)?;
        let Some(field_ident) = field.ident.as_ref() else {
            return Err(Error::new_spanned(field, "Entity fields must be named"));
        };
        let name = field_ident.unraw().to_string();

        if attrs.skip {
            // soft delete needs the flag in storage
            if name == DELETED_FIELD {
                return Err(Error::new_spanned(
                    field,
                    "the soft-delete flag `deleted` must be persisted; drop `skip` or rename the field",
                ));
            }
            continue;
        }

        let store_name = attrs.name.unwrap_or_else(|| name.clone());
        let kind = attrs.kind.unwrap_or_else(|| classify(&field.ty)).variant();

        if name == DELETED_FIELD {
            deleted_field = Some(store_name.clone());
        }

        field_models.push(quote! {
            ::kairon::model::field::EntityFieldModel {
                name: #name,
                store_name: #store_name,
                kind: ::kairon::model::field::EntityFieldKind::#kind,
            }
        });
    }

    let deleted_field = match deleted_field {
        Some(store_name) => quote!(::core::option::Option::Some(#store_name)),
        None => quote!(::core::option::Option::None),
    };

    Ok(quote! {
        impl #impl_generics ::kairon::traits::EntityShape for #ident #ty_generics #where_clause {
            const MODEL: &'static ::kairon::model::entity::EntityModel =
                &::kairon::model::entity::EntityModel {
                    path: ::core::concat!(::core::module_path!(), "::", #ident_name),
                    collection: #collection,
                    fields: &[#(#field_models),*],
                    deleted_field: #deleted_field,
                };
        }
    })
}

fn named_fields(input: &DeriveInput) -> syn::Result<&Punctuated<syn::Field, Comma>> {
    if let Data::Struct(data) = &input.data {
        if let Fields::Named(named) = &data.fields {
            Ok(&named.named)
        } else {
            Err(Error::new_spanned(
                &data.fields,
                "Entity can only be derived for structs with named fields",
            ))
        }
    } else {
        Err(Error::new_spanned(
            &input.ident,
            "Entity can only be derived for structs with named fields",
        ))
    }
}

///
/// ContainerAttrs
///

#[derive(Default)]
struct ContainerAttrs {
    collection: Option<String>,
}

impl ContainerAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("entity")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("collection") {
                    let lit: LitStr = meta.value()?.parse()?;
                    out.collection = Some(lit.value());
                    Ok(())
                } else {
                    Err(meta.error("unsupported entity attribute; expected `collection`"))
                }
            })?;
        }

        Ok(out)
    }
}

///
/// FieldAttrs
///

#[derive(Default)]
struct FieldAttrs {
    skip: bool,
    name: Option<String>,
    kind: Option<FieldKind>,
}

impl FieldAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("entity")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    out.skip = true;
                    Ok(())
                } else if meta.path.is_ident("name") {
                    let lit: LitStr = meta.value()?.parse()?;
                    if lit.value() == NOT_PERSISTED {
                        out.skip = true;
                    } else {
                        out.name = Some(lit.value());
                    }
                    Ok(())
                } else if meta.path.is_ident("kind") {
                    let lit: LitStr = meta.value()?.parse()?;
                    out.kind = Some(FieldKind::from_lit(&lit)?);
                    Ok(())
                } else {
                    Err(meta.error(
                        "unsupported entity field attribute; expected `skip`, `name`, or `kind`",
                    ))
                }
            })?;
        }

        Ok(out)
    }
}

///
/// FieldKind
///

#[derive(Clone, Copy)]
enum FieldKind {
    Text,
    Bool,
    Numeric,
    Collection,
    Other,
}

impl FieldKind {
    fn from_lit(lit: &LitStr) -> syn::Result<Self> {
        match lit.value().as_str() {
            "text" => Ok(Self::Text),
            "bool" => Ok(Self::Bool),
            "numeric" => Ok(Self::Numeric),
            "collection" => Ok(Self::Collection),
            "other" => Ok(Self::Other),
            _ => Err(Error::new_spanned(
                lit,
                "unknown field kind; expected text, bool, numeric, collection, or other",
            )),
        }
    }

    fn variant(self) -> Ident {
        let name = match self {
            Self::Text => "Text",
            Self::Bool => "Bool",
            Self::Numeric => "Numeric",
            Self::Collection => "Collection",
            Self::Other => "Other",
        };

        Ident::new(name, Span::call_site())
    }
}

fn classify(ty: &Type) -> FieldKind {
    match ty {
        Type::Reference(reference) => classify(&reference.elem),
        Type::Array(_) | Type::Slice(_) => FieldKind::Collection,
        Type::Path(path) => {
            let Some(segment) = path.path.segments.last() else {
                return FieldKind::Other;
            };

            match segment.ident.to_string().as_str() {
                "Option" | "Box" => first_type_arg(&segment.arguments).map_or(FieldKind::Other, classify),
                "String" | "str" => FieldKind::Text,
                "bool" => FieldKind::Bool,
                "Vec" | "VecDeque" | "BTreeSet" | "HashSet" => FieldKind::Collection,
                "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
                | "u128" | "usize" | "f32" | "f64" => FieldKind::Numeric,
                _ => FieldKind::Other,
            }
        }
        _ => FieldKind::Other,
    }
}

fn first_type_arg(args: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = args else {
        return None;
    };

    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand_err(input: &DeriveInput) -> String {
        match expand(input) {
            Ok(tokens) => panic!("expected an error, got {tokens}"),
            Err(err) => err.to_string(),
        }
    }

    #[test]
    fn skipped_deleted_flag_is_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Product {
                name: String,
                #[entity(skip)]
                deleted: bool,
            }
        };

        assert!(expand_err(&input).contains("must be persisted"));
    }

    #[test]
    fn unstored_deleted_flag_is_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Product {
                name: String,
                #[entity(name = "-")]
                deleted: bool,
            }
        };

        assert!(expand_err(&input).contains("must be persisted"));
    }

    #[test]
    fn renamed_deleted_flag_uses_store_name() {
        let input: DeriveInput = parse_quote! {
            struct Product {
                name: String,
                #[entity(name = "is_deleted")]
                deleted: bool,
            }
        };

        let tokens = expand(&input).unwrap().to_string();
        assert!(tokens.contains("Option :: Some (\"is_deleted\")"));
    }

    #[test]
    fn other_skipped_fields_are_left_out() {
        let input: DeriveInput = parse_quote! {
            struct Product {
                #[entity(skip)]
                id: Option<String>,
                name: String,
            }
        };

        let tokens = expand(&input).unwrap().to_string();
        assert!(!tokens.contains("\"id\""));
        assert!(tokens.contains("Option :: None"));
    }
}
