//! Derive macros for the record receiver traits of `avlwire`.
//!
//! See `avlwire::avec::FromRecords` and `avlwire::avec::FromRecord` for the
//! accepted attributes.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod from_record;
mod from_records;

#[proc_macro_derive(FromRecord, attributes(element))]
pub fn derive_from_record(input: TokenStream) -> TokenStream {
    expand(parse_macro_input!(input as DeriveInput), from_record::expand_from_record)
}

#[proc_macro_derive(FromRecords, attributes(record, device))]
pub fn derive_from_records(input: TokenStream) -> TokenStream {
    expand(parse_macro_input!(input as DeriveInput), from_records::expand_from_records)
}

/// Run an expansion, reporting its error as a compile error.
fn expand(input: DeriveInput, f: fn(&DeriveInput) -> syn::Result<TokenStream>) -> TokenStream {
    f(&input).unwrap_or_else(|err| err.to_compile_error().into())
}
