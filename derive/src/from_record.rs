use std::collections::{BTreeMap, HashMap};

use proc_macro::TokenStream;
use proc_macro2::Literal;
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DeriveInput, Error, ExprClosure, Field, Fields, GenericArgument, Ident,
    LitInt, Pat, PathArguments, Result, Token, Type,
    parse::{Parse, ParseStream},
    spanned::Spanned,
};

pub(crate) fn expand_from_record(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new(
            input.span(),
            "`FromRecord` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new(
            input.span(),
            "`FromRecord` may only be derived on structs with named fields.",
        ))?
    };

    let fields = fields
        .named
        .iter()
        .map(FieldMetadata::parse)
        .map(Result::transpose)
        .flatten() // Skip fields without an attribute.
        .collect::<Result<Vec<_>>>()?;

    type Case = (Ident, Option<(Type, ExprClosure)>);
    let mut element_methods: HashMap<Primitive, BTreeMap<u16, Case>> = HashMap::new();
    let mut named_methods: HashMap<Named, Case> = HashMap::new();

    for field in fields {
        let assignment = (field.name, field.handler);

        let existing = match field.identifier {
            Identifier::Element(id) => element_methods
                .entry(field.primitive)
                .or_default()
                .insert(id, assignment),
            Identifier::Named(named) => named_methods.insert(named, assignment),
        };

        if existing.is_some() {
            Err(Error::new_spanned(
                field.attr,
                "Element identifiers must be unique.",
            ))?;
        }
    }

    let element_methods = element_methods.into_iter().map(|(primitive, elements)| {
        let cases = elements.into_iter().map(|(id, (name, handler))| {
            let id = Literal::u16_unsuffixed(id);
            let assignment = apply(&name, handler);
            quote! { #id => { #assignment } }
        });

        let method = format_ident!("add_{}", primitive.name());
        let value_type = primitive.value_type();

        quote! {
            fn #method(&mut self, id: u16, value: #value_type) {
                match id {
                    #(#cases)*
                    _ => {}
                };
            }
        }
    });

    let named_methods = named_methods.into_iter().map(|(named, (name, handler))| {
        let assignment = apply(&name, handler);
        let (method, value_type) = named.method();

        quote! {
            fn #method(&mut self, value: #value_type) {
                #assignment;
            }
        }
    });

    let name = &input.ident;

    let expanded = quote! {
        impl ::avlwire::avec::FromRecord for #name {
            #(#element_methods)*
            #(#named_methods)*
        }
    };

    Ok(expanded.into())
}

/// Assign a received `value` to a struct field, through its handler if any.
fn apply(name: &Ident, handler: Option<(Type, ExprClosure)>) -> proc_macro2::TokenStream {
    if let Some((field_type, handler)) = handler {
        let body = handler.body;
        let acc = handler.inputs.iter().nth(0).unwrap();
        let val = handler.inputs.iter().nth(1).unwrap();

        quote! {
            (|#acc: &mut #field_type, #val| {#body})(&mut self.#name, value)
        }
    } else {
        quote! {
            self.#name = Some(value)
        }
    }
}

/// Value type of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Primitive {
    U8,
    U16,
    U32,
    U64,
    Bytes,
}

impl Primitive {
    fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Bytes => "bytes",
        }
    }

    fn value_type(self) -> proc_macro2::TokenStream {
        match self {
            Self::U8 => quote! { u8 },
            Self::U16 => quote! { u16 },
            Self::U32 => quote! { u32 },
            Self::U64 => quote! { u64 },
            Self::Bytes => quote! { &[u8] },
        }
    }

    fn from_type(ty: &Type) -> Option<Self> {
        match ty {
            Type::Path(path) => match path.path.get_ident()?.to_string().as_str() {
                "u8" => Some(Self::U8),
                "u16" => Some(Self::U16),
                "u32" => Some(Self::U32),
                "u64" => Some(Self::U64),
                _ => None,
            },
            Type::Reference(reference) if reference.mutability.is_none() => {
                let Type::Slice(slice) = &*reference.elem else {
                    return None;
                };

                (Self::from_type(&slice.elem)? == Self::U8).then_some(Self::Bytes)
            }
            _ => None,
        }
    }
}

/// Fixed record field received by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Named {
    Timestamp,
    Priority,
    Position,
    Event,
    Generation,
    Anomaly,
}

impl Named {
    fn from_ident(ident: &Ident) -> Option<Self> {
        Some(match ident.to_string().as_str() {
            "timestamp" => Self::Timestamp,
            "priority" => Self::Priority,
            "position" => Self::Position,
            "event" => Self::Event,
            "generation" => Self::Generation,
            "anomaly" => Self::Anomaly,
            _ => None?,
        })
    }

    fn method(self) -> (Ident, proc_macro2::TokenStream) {
        let (method, value_type) = match self {
            Self::Timestamp => ("add_timestamp", quote! { u64 }),
            Self::Priority => ("add_priority", quote! { u8 }),
            Self::Position => ("add_position", quote! { ::avlwire::sans::record::Position }),
            Self::Event => ("add_event", quote! { u16 }),
            Self::Generation => ("add_generation_type", quote! { u8 }),
            Self::Anomaly => ("add_anomaly", quote! { ::avlwire::avec::Anomaly }),
        };

        (format_ident!("{}", method), value_type)
    }
}

#[derive(Debug)]
struct FieldMetadata {
    name: Ident,
    attr: Attribute,
    primitive: Primitive,
    identifier: Identifier,
    handler: Option<(Type, ExprClosure)>,
}

#[derive(Debug)]
enum Identifier {
    Element(u16),
    Named(Named),
}

impl FieldMetadata {
    fn parse(field: &Field) -> Result<Option<Self>> {
        let name = field.ident.clone().unwrap();

        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("element")) else {
            return Ok(None);
        };

        let ElementAttribute {
            identifier,
            handler,
        } = attr.meta.require_list()?.parse_args()?;

        // Named fields have a fixed value type, checked by the compiler.
        let primitive = if let Identifier::Named(_) = identifier {
            Primitive::U64
        } else if let Some(handler) = &handler {
            let Some(parameter) = handler.inputs.iter().nth(1) else {
                Err(Error::new_spanned(
                    handler,
                    "Handler closure must have two parameters.",
                ))?
            };

            let Pat::Type(pat_type) = parameter else {
                Err(Error::new_spanned(
                    parameter,
                    "Handler closure's second parameter must be annotated with the element's value type.",
                ))?
            };

            Primitive::from_type(&pat_type.ty).ok_or(Error::new_spanned(
                &pat_type.ty,
                "Element value type must be `u8`, `u16`, `u32`, `u64` or `&[u8]`.",
            ))?
        } else {
            let inner_type = option_inner(&field.ty)?;

            match Primitive::from_type(inner_type) {
                Some(Primitive::Bytes) | None => Err(Error::new_spanned(
                    inner_type,
                    "Field without a handler must have type `Option<T>`, where `T` is `u8`, `u16`, `u32` or `u64`.",
                ))?,
                Some(primitive) => primitive,
            }
        };

        if let Some(handler) = &handler {
            if handler.inputs.len() != 2 {
                Err(Error::new_spanned(
                    handler,
                    "Handler closure must have two parameters.",
                ))?;
            }
        }

        let handler = handler.map(|h| (field.ty.clone(), h));

        Ok(Some(Self {
            name,
            attr: attr.clone(),
            primitive,
            identifier,
            handler,
        }))
    }
}

/// Retrieve `T` from a field of type `Option<T>`.
fn option_inner(ty: &Type) -> Result<&Type> {
    let Type::Path(path) = ty else {
        Err(Error::new_spanned(ty, "Field must have a type annotation."))?
    };

    let Some(segment) = path.path.segments.last() else {
        Err(Error::new_spanned(
            &path.path.segments,
            "Field must have a type annotation.",
        ))?
    };

    if segment.ident != "Option" {
        Err(Error::new_spanned(
            &segment.ident,
            "Field without a handler must have type `Option<T>`.",
        ))?
    }

    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        Err(Error::new_spanned(
            &segment.arguments,
            "Field of type `Option<T>` must have a generic parameter.",
        ))?
    };

    let Some(GenericArgument::Type(inner_type)) = arguments.args.first() else {
        Err(Error::new_spanned(
            &arguments.args,
            "Generic argument of a field of type `Option<T>` must be a type.",
        ))?
    };

    Ok(inner_type)
}

#[derive(Debug)]
struct ElementAttribute {
    identifier: Identifier,
    handler: Option<ExprClosure>,
}

impl Parse for ElementAttribute {
    fn parse(input: ParseStream) -> Result<Self> {
        let identifier = if let Ok(ident) = input.parse::<Ident>() {
            let Some(named) = Named::from_ident(&ident) else {
                Err(Error::new_spanned(
                    ident,
                    "Element identifier must be an integer literal, or one of `timestamp`, `priority`, `position`, `event`, `generation` and `anomaly`.",
                ))?
            };

            Identifier::Named(named)
        } else {
            Identifier::Element(input.parse::<LitInt>()?.base10_parse::<u16>()?)
        };

        let handler = if !input.is_empty() {
            input.parse::<Token![,]>()?;
            Some(input.parse::<ExprClosure>()?)
        } else {
            None
        };

        Ok(Self {
            identifier,
            handler,
        })
    }
}
