use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Field, Fields, Ident, Result, Type};

pub(crate) fn expand_from_records(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new_spanned(
            input,
            "`FromRecords` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new_spanned(
            input,
            "`FromRecords` may only be derived on structs with named fields.",
        ))?
    };

    let mut records: Option<(Ident, bool)> = None;
    let mut device: Option<Ident> = None;

    for field in &fields.named {
        let name = field.ident.clone().unwrap();

        for attr in &field.attrs {
            if attr.path().is_ident("record") {
                attr.meta.require_path_only()?;

                let is_vec = is_vec(field)?;
                if records.replace((name.clone(), is_vec)).is_some() {
                    Err(Error::new_spanned(
                        attr,
                        "Only one field may receive records.",
                    ))?;
                }
            } else if attr.path().is_ident("device") {
                attr.meta.require_path_only()?;

                if device.replace(name.clone()).is_some() {
                    Err(Error::new_spanned(
                        attr,
                        "Only one field may receive the device header.",
                    ))?;
                }
            }
        }
    }

    let add_record = match records {
        Some((name, true)) => quote! {
            self.#name.push(Default::default());
            self.#name.last_mut().map(|r| r as _)
        },
        Some((name, false)) => quote! {
            Some(self.#name.insert(Default::default()))
        },
        None => quote! { None },
    };

    let add_device = device.map(|name| {
        quote! {
            fn add_device(&mut self, device: ::avlwire::sans::frame::DeviceHeader) {
                self.#name = Some(device);
            }
        }
    });

    let name = &input.ident;

    let expanded = quote! {
        impl ::avlwire::avec::FromRecords for #name {
            #add_device

            fn add_record(&mut self, _index: usize) -> Option<&mut dyn ::avlwire::avec::FromRecord> {
                #add_record
            }
        }
    };

    Ok(expanded.into())
}

/// Whether a record field collects every record (`Vec<T>`) or only the last
/// (`Option<T>`).
fn is_vec(field: &Field) -> Result<bool> {
    let Type::Path(path) = &field.ty else {
        Err(Error::new_spanned(
            &field.ty,
            "Field must have a type annotation.",
        ))?
    };

    let Some(segment) = path.path.segments.last() else {
        Err(Error::new_spanned(
            &path.path.segments,
            "Field must have an `Option<T>` or `Vec<T>` type.",
        ))?
    };

    if segment.ident == "Option" {
        Ok(false)
    } else if segment.ident == "Vec" {
        Ok(true)
    } else {
        Err(Error::new_spanned(
            &segment.ident,
            "Field must have an `Option<T>` or `Vec<T>` type.",
        ))
    }
}
