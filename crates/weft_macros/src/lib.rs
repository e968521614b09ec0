//! Procedural macros for weft parser generation
//!
//! This crate provides the [`grammar!`] macro, which parses grammar text at
//! compile time and expands to the parser type `weft_codegen` generates for it.

use proc_macro::TokenStream;
use syn::parse::{Parse, ParseStream};
use syn::{Ident, LitStr, Token, Visibility, parse_macro_input};
use weft_codegen::{CodegenConfig, CompileError, compile_tokens};

/// Generate a parser type from grammar text
///
/// The input is an optional visibility, the type name, and the grammar as a
/// string literal. The start rule defaults to the first rule and can be set
/// with a trailing `start = rule`.
///
/// # Example
///
/// ```rust,ignore
/// weft_macros::grammar!(pub WordParser, "word = letter+; letter = 'a' | 'b' | 'c';");
///
/// let value = WordParser::parse("abc").unwrap();
/// assert!(WordParser::parse("abcd").is_err());
/// ```
///
/// ```rust,ignore
/// weft_macros::grammar!(
///     PairParser,
///     "letter = 'a' | 'b'; pair = first:letter second:letter;",
///     start = pair
/// );
/// ```
///
/// Grammar text that fails to parse is reported at the string literal, with
/// the furthest failure and its line and column.
#[proc_macro]
pub fn grammar(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as GrammarInput);
    match input.expand() {
        Ok(tokens) => tokens.into(),
        Err(error) => error.to_compile_error().into(),
    }
}

struct GrammarInput {
    visibility: Visibility,
    name: Ident,
    text: LitStr,
    start: Option<Ident>,
}

impl Parse for GrammarInput {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let visibility = input.parse()?;
        let name = input.parse()?;
        input.parse::<Token![,]>()?;
        let text = input.parse()?;

        let mut start = None;
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            if !input.is_empty() {
                let key: Ident = input.parse()?;
                if key != "start" {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("unknown option `{key}`\n help: the only option is `start = rule`"),
                    ));
                }
                input.parse::<Token![=]>()?;
                start = Some(input.parse()?);
                if input.peek(Token![,]) {
                    input.parse::<Token![,]>()?;
                }
            }
        }

        Ok(Self {
            visibility,
            name,
            text,
            start,
        })
    }
}

impl GrammarInput {
    fn expand(&self) -> syn::Result<proc_macro2::TokenStream> {
        let visibility = &self.visibility;
        let config = CodegenConfig {
            visibility: quote::quote!(#visibility).to_string(),
            start_rule: self.start.as_ref().map(ToString::to_string),
            ..CodegenConfig::named(self.name.to_string())
        };

        let text = self.text.value();
        compile_tokens(&text, config).map_err(|error| match error {
            CompileError::Parse(error) => syn::Error::new(
                self.text.span(),
                format!("invalid grammar\n{}", error.format_with_context(&text)),
            ),
            CompileError::Codegen(error) => syn::Error::new(self.name.span(), error.to_string()),
        })
    }
}
