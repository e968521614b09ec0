//! Syntax-directed translation of a grammar into a parser type.
//!
//! Each rule becomes a `parse_<rule>` method. Compound sub-expressions nested
//! inside a rule get fragment methods named `parse_<rule>_fragment<N>`, with
//! `N` counting up per rule in the order fragments are met. Direct calls
//! (rule references and literals) are emitted inline.
//!
//! The emitted control flow mirrors the interpreter in `weft::rule`:
//! sequences and each alternative of a choice run inside a scoped attempt,
//! the last alternative's failure is the one that propagates, and repetition
//! stops after an iteration that consumed nothing.

use ahash::RandomState;
use compact_str::CompactString;
use hashbrown::HashMap;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use syn::{Path, Visibility};
use tracing::debug;
use weft::grammar::{Expr, Grammar, Modifier, Rule};

use crate::config::CodegenConfig;
use crate::error::CodegenError;

type FragmentCounts = HashMap<CompactString, usize, RandomState>;

/// Compiles a [`Grammar`] into the source of a parser type
///
/// # Example
///
/// ```rust
/// use weft::parse_grammar;
/// use weft_codegen::{CodeGenerator, CodegenConfig};
///
/// let grammar = parse_grammar("word = letter+ '.'; letter = 'a' | 'b';").unwrap();
/// let source = CodeGenerator::new(&grammar, CodegenConfig::named("WordParser"))
///     .generate_source()
///     .unwrap();
///
/// assert!(source.contains("struct WordParser"));
/// assert!(source.contains("fn parse_word"));
/// assert!(source.contains("fn parse_word_fragment1"));
/// assert!(!source.contains("parse_letter_fragment"));
/// ```
#[derive(Debug)]
pub struct CodeGenerator<'g> {
    grammar: &'g Grammar,
    config: CodegenConfig,
}

impl<'g> CodeGenerator<'g> {
    #[must_use]
    pub const fn new(grammar: &'g Grammar, config: CodegenConfig) -> Self {
        Self { grammar, config }
    }

    #[must_use]
    pub const fn config(&self) -> &CodegenConfig {
        &self.config
    }

    /// Generate the parser type and its [`GeneratedParser`] impl
    ///
    /// References to rules the grammar does not define are emitted as calls
    /// all the same; they fail when the output is compiled.
    ///
    /// [`GeneratedParser`]: weft::runtime::GeneratedParser
    ///
    /// # Errors
    ///
    /// Returns a [`CodegenError`] if the grammar is empty, the start rule is
    /// unknown, or a configured or derived name is not valid Rust.
    pub fn generate(&self) -> Result<TokenStream, CodegenError> {
        let parser = identifier(&self.config.parser_name)?;
        let runtime = syn::parse_str::<Path>(&self.config.runtime_path)
            .map_err(|_| CodegenError::InvalidRuntimePath(self.config.runtime_path.clone()))?;
        let visibility = syn::parse_str::<Visibility>(&self.config.visibility)
            .map_err(|_| CodegenError::InvalidVisibility(self.config.visibility.clone()))?;
        let start = method_name(&self.start_rule()?.name)?;

        let mut counts = FragmentCounts::default();
        let mut methods = Vec::new();
        let mut fragments = 0;
        for rule in &self.grammar.rules {
            let mut emitter = RuleEmitter {
                runtime: &runtime,
                rule: &rule.name,
                counts: &mut counts,
                fragments: Vec::new(),
            };
            let name = method_name(&rule.name)?;
            let body = emitter.body(&rule.body)?;
            let doc = format!(" `{rule}`");

            methods.push(quote! {
                #[doc = #doc]
                #visibility fn #name(&mut self) -> #runtime::ParseOutcome<#runtime::Value> {
                    use #runtime::runtime::GeneratedParser as _;
                    let this = self;
                    #body
                }
            });
            fragments += emitter.fragments.len();
            methods.append(&mut emitter.fragments);
        }

        let rule_names = self.grammar.rules.iter().map(|rule| rule.name.as_str());

        debug!(
            parser = %self.config.parser_name,
            rules = self.grammar.rules.len(),
            fragments,
            "generated parser"
        );

        Ok(quote! {
            /// Parser generated from a weft grammar
            #[derive(Debug, Clone)]
            #visibility struct #parser<'src> {
                cursor: #runtime::TextCursor<'src>,
            }

            #[allow(non_snake_case, unused_variables, dead_code)]
            impl<'src> #parser<'src> {
                /// Rule names in grammar order
                pub const RULE_NAMES: &'static [&'static str] = &[#(#rule_names),*];

                /// Parser over `source` with an empty skip set
                #[must_use]
                pub fn new(source: &'src str) -> Self {
                    Self::from_cursor(#runtime::TextCursor::new(source))
                }

                #[must_use]
                pub fn from_cursor(cursor: #runtime::TextCursor<'src>) -> Self {
                    Self { cursor }
                }

                #[must_use]
                pub fn into_cursor(self) -> #runtime::TextCursor<'src> {
                    self.cursor
                }

                /// Run the start rule over `source` and require all input to be consumed
                pub fn parse(
                    source: &'src str,
                ) -> ::core::result::Result<#runtime::Value, #runtime::ParseError> {
                    use #runtime::runtime::GeneratedParser as _;
                    Self::new(source).run()
                }

                #(#methods)*
            }

            impl<'src> #runtime::runtime::GeneratedParser<'src> for #parser<'src> {
                fn cursor(&self) -> &#runtime::TextCursor<'src> {
                    &self.cursor
                }

                fn cursor_mut(&mut self) -> &mut #runtime::TextCursor<'src> {
                    &mut self.cursor
                }

                fn parse_start(&mut self) -> #runtime::ParseOutcome<#runtime::Value> {
                    Self::#start(self)
                }
            }
        })
    }

    /// [`generate`](Self::generate), rendered as text
    ///
    /// # Errors
    ///
    /// See [`generate`](Self::generate).
    pub fn generate_source(&self) -> Result<String, CodegenError> {
        self.generate().map(|tokens| tokens.to_string())
    }

    fn start_rule(&self) -> Result<&'g Rule, CodegenError> {
        match &self.config.start_rule {
            Some(name) => self
                .grammar
                .rule(name)
                .ok_or_else(|| CodegenError::UnknownStartRule(name.clone())),
            None => self.grammar.rules.first().ok_or(CodegenError::EmptyGrammar),
        }
    }
}

/// Emits one rule's method body and the fragments it needs
struct RuleEmitter<'a> {
    runtime: &'a Path,
    rule: &'a str,
    counts: &'a mut FragmentCounts,
    fragments: Vec<TokenStream>,
}

impl RuleEmitter<'_> {
    /// An expression that evaluates `expr` against `this`
    fn call(&mut self, expr: &Expr) -> Result<TokenStream, CodegenError> {
        match expr {
            Expr::Identifier(name) => {
                let method = method_name(name)?;
                Ok(quote! { this.#method() })
            }
            Expr::Literal(value) => {
                let value = value.as_str();
                Ok(quote! { this.expect(#value) })
            }
            Expr::Labelled { inner, .. } => self.call(inner),
            Expr::Sequence(_) | Expr::Choice(_) | Expr::Modified { .. } => self.fragment(expr),
        }
    }

    fn fragment(&mut self, expr: &Expr) -> Result<TokenStream, CodegenError> {
        let count = self.counts.entry(CompactString::from(self.rule)).or_insert(0);
        *count += 1;
        let name = method_name(&format!("{}_fragment{}", self.rule, *count))?;

        let runtime = self.runtime;
        let body = self.body(expr)?;
        self.fragments.push(quote! {
            fn #name(&mut self) -> #runtime::ParseOutcome<#runtime::Value> {
                use #runtime::runtime::GeneratedParser as _;
                let this = self;
                #body
            }
        });
        Ok(quote! { this.#name() })
    }

    /// Statements of a method that evaluates `expr`
    fn body(&mut self, expr: &Expr) -> Result<TokenStream, CodegenError> {
        let runtime = self.runtime;
        match expr {
            Expr::Sequence(members) => match members.as_slice() {
                [only] => self.call(only),
                members => self.sequence(members),
            },
            Expr::Choice(alternatives) => self.choice(alternatives),
            Expr::Modified {
                inner,
                modifier: Modifier::Optional,
            } => {
                let inner = self.call(inner)?;
                Ok(quote! {
                    Ok(this.attempt(|this| #inner).unwrap_or(#runtime::Value::Absent))
                })
            }
            Expr::Modified { inner, modifier } => {
                let inner = self.call(inner)?;
                let at_least_one = (*modifier == Modifier::OneOrMore).then(|| {
                    quote! { Err(failure) if matches.is_empty() => return Err(failure), }
                });
                Ok(quote! {
                    let mut matches = ::std::vec::Vec::new();
                    loop {
                        let before = this.offset();
                        match this.attempt(|this| #inner) {
                            Ok(value) => {
                                matches.push(value);
                                if this.offset() == before {
                                    break;
                                }
                            }
                            #at_least_one
                            Err(_) => break,
                        }
                    }
                    Ok(#runtime::Value::List(matches))
                })
            }
            Expr::Labelled { inner, .. } => self.body(inner),
            Expr::Identifier(_) | Expr::Literal(_) => self.call(expr),
        }
    }

    fn sequence(&mut self, members: &[Expr]) -> Result<TokenStream, CodegenError> {
        let runtime = self.runtime;
        let mut bindings = Vec::with_capacity(members.len());
        let mut entries = Vec::with_capacity(members.len());
        for (i, member) in members.iter().enumerate() {
            let binding = format_ident!("m{}", i);
            let call = self.call(member)?;
            let label = match member {
                Expr::Labelled { label, .. } => {
                    let label = label.as_str();
                    quote! { Some(#label) }
                }
                _ => quote! { None },
            };
            bindings.push(quote! { let #binding = #call?; });
            entries.push(quote! { (#label, #binding) });
        }

        Ok(quote! {
            this.attempt(|this| {
                #(#bindings)*
                Ok(#runtime::Value::Tuple(#runtime::ResultTuple::from_entries([#(#entries),*])))
            })
        })
    }

    fn choice(&mut self, alternatives: &[Expr]) -> Result<TokenStream, CodegenError> {
        let Some((last, rest)) = alternatives.split_last() else {
            return Ok(quote! { this.fail("no alternatives to choose from") });
        };

        let mut cascade = Vec::with_capacity(rest.len());
        for alternative in rest {
            let call = self.call(alternative)?;
            cascade.push(quote! {
                if let Ok(value) = this.attempt(|this| #call) {
                    return Ok(value);
                }
            });
        }
        let last = self.call(last)?;

        Ok(quote! {
            #(#cascade)*
            this.attempt(|this| #last)
        })
    }
}

fn identifier(name: &str) -> Result<Ident, CodegenError> {
    syn::parse_str::<Ident>(name).map_err(|_| CodegenError::InvalidIdentifier(name.to_string()))
}

fn method_name(rule: &str) -> Result<Ident, CodegenError> {
    identifier(&format!("parse_{rule}"))
}
