// Copyright 2019 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Compiles grammar declarations into a frozen `Grammar`.
//!
//! Declarations name literals, tokens and rules by their source text. They
//! are only resolved against the token table and the set of declared rules
//! when `build` runs, so rules may refer to rules declared after them.

use {
  super::{
    base::{
      Alternative, Element, ElementKind, Grammar, GrammarError, GrammarErrors,
      Multiplicity, Rule, RuleId, RuleOrigin,
    },
    token_table::{TokenTable, TokenType},
  },
  crate::utils::Name,
  std::collections::{btree_map, BTreeMap, BTreeSet},
};

/// A member of a negated set.
#[derive(Clone, Debug)]
pub enum SetItem {
  Literal(String),
  Token(String),
}

#[derive(Clone, Debug)]
enum ElemDeclKind {
  Literal(String),
  Token(String),
  Rule(String),
  NotSet(Vec<SetItem>),
  Wildcard,
  Block(Vec<AltDecl>),
}

/// An unresolved element, as written in the grammar source.
#[derive(Clone, Debug)]
pub struct ElemDecl {
  label: Option<Name>,
  kind: ElemDeclKind,
  suffix: String,
}

impl ElemDecl {
  fn new(kind: ElemDeclKind) -> Self {
    ElemDecl {
      label: None,
      kind,
      suffix: String::new(),
    }
  }

  /// Attaches a label, as in `name=NAME`.
  pub fn label(mut self, label: &str) -> Self {
    self.label = Some(Name::new(label));
    self
  }

  /// Sets the EBNF suffix of this element: `""`, `"?"`, `"*"` or `"+"`.
  pub fn suffix(mut self, suffix: &str) -> Self {
    self.suffix = suffix.to_string();
    self
  }
}

/// A quoted literal, such as `'('`.
pub fn literal(text: &str) -> ElemDecl {
  ElemDecl::new(ElemDeclKind::Literal(text.to_string()))
}

/// A reference to a token rule, such as `NAME`.
pub fn token(name: &str) -> ElemDecl {
  ElemDecl::new(ElemDeclKind::Token(name.to_string()))
}

/// A reference to a parser rule.
pub fn rule(name: &str) -> ElemDecl {
  ElemDecl::new(ElemDeclKind::Rule(name.to_string()))
}

/// A negated set, such as `~('a' | NAME)`.
pub fn not_set(items: impl IntoIterator<Item = SetItem>) -> ElemDecl {
  ElemDecl::new(ElemDeclKind::NotSet(items.into_iter().collect()))
}

/// The wildcard `.`.
pub fn wildcard() -> ElemDecl {
  ElemDecl::new(ElemDeclKind::Wildcard)
}

/// An inline parenthesized block of alternatives.
pub fn block(build_fn: impl FnOnce(&mut RuleBuilder)) -> ElemDecl {
  let mut builder = RuleBuilder::new();
  build_fn(&mut builder);
  ElemDecl::new(ElemDeclKind::Block(builder.alts))
}

#[derive(Clone, Debug)]
struct AltDecl {
  label: Option<Name>,
  elems: Vec<ElemDecl>,
}

pub struct AlternativeBuilder {
  elems: Vec<ElemDecl>,
}

impl AlternativeBuilder {
  pub fn add(&mut self, elem: ElemDecl) -> &mut Self {
    self.elems.push(elem);
    self
  }

  pub fn add_literal(&mut self, text: &str) -> &mut Self {
    self.add(literal(text))
  }

  pub fn add_token(&mut self, name: &str) -> &mut Self {
    self.add(token(name))
  }

  pub fn add_rule_ref(&mut self, name: &str) -> &mut Self {
    self.add(rule(name))
  }
}

// ----------------

pub struct RuleBuilder {
  alts: Vec<AltDecl>,
}

impl RuleBuilder {
  fn new() -> Self {
    RuleBuilder { alts: Vec::new() }
  }

  fn push_alt(
    &mut self,
    label: Option<Name>,
    build_fn: impl FnOnce(&mut AlternativeBuilder),
  ) -> &mut Self {
    let mut builder = AlternativeBuilder { elems: Vec::new() };
    build_fn(&mut builder);
    self.alts.push(AltDecl {
      label,
      elems: builder.elems,
    });
    self
  }

  pub fn add_alt(
    &mut self,
    build_fn: impl FnOnce(&mut AlternativeBuilder),
  ) -> &mut Self {
    self.push_alt(None, build_fn)
  }

  pub fn add_labeled_alt(
    &mut self,
    label: &str,
    build_fn: impl FnOnce(&mut AlternativeBuilder),
  ) -> &mut Self {
    self.push_alt(Some(Name::new(label)), build_fn)
  }

  /// Adds an alternative consisting of the given elements.
  pub fn add_alt_with_elems(
    &mut self,
    elems: impl IntoIterator<Item = ElemDecl>,
  ) -> &mut Self {
    self.alts.push(AltDecl {
      label: None,
      elems: elems.into_iter().collect(),
    });
    self
  }
}

// ----------------

struct RuleDecl {
  name: Name,
  origin: RuleOrigin,
  alts: Vec<AltDecl>,
}

pub struct GrammarBuilder {
  rules: Vec<RuleDecl>,
}

impl GrammarBuilder {
  fn push_rule(
    &mut self,
    name: &str,
    origin: RuleOrigin,
    build_fn: impl FnOnce(&mut RuleBuilder),
  ) -> &mut Self {
    let mut rule_builder = RuleBuilder::new();
    build_fn(&mut rule_builder);
    self.rules.push(RuleDecl {
      name: Name::new(name),
      origin,
      alts: rule_builder.alts,
    });
    self
  }

  pub fn add_rule(
    &mut self,
    name: &str,
    build_fn: impl FnOnce(&mut RuleBuilder),
  ) -> &mut Self {
    self.push_rule(name, RuleOrigin::Parser, build_fn)
  }

  /// Adds a lexer rule. Lexer rules are resolved leniently: unknown literals
  /// get the invalid token id and unknown token references (fragments)
  /// become wildcards.
  pub fn add_lexer_rule(
    &mut self,
    name: &str,
    build_fn: impl FnOnce(&mut RuleBuilder),
  ) -> &mut Self {
    self.push_rule(name, RuleOrigin::Lexer, build_fn)
  }
}

/// Builds a grammar using a builder function.
///
/// Example:
///
/// ```rust
/// # use codeassist::grammar::{self, builder::literal, TokenTable, TokenType};
/// let mut tokens = TokenTable::new();
/// tokens
///   .add_rule("NAME", TokenType(1))
///   .add_literal("(", TokenType(2))
///   .add_literal(")", TokenType(3));
/// let g = grammar::build(tokens, |gb| {
///   gb.add_rule("call", |rb| {
///     rb.add_alt(|ab| {
///       ab.add_token("NAME")
///         .add_literal("(")
///         .add(literal(")").suffix("?"));
///     });
///   });
/// })
/// .unwrap();
/// assert!(g.rule("call").is_some());
/// ```
///
/// All problems found are reported together; no partial grammar is ever
/// returned.
pub fn build(
  tokens: TokenTable,
  build_fn: impl FnOnce(&mut GrammarBuilder),
) -> Result<Grammar, GrammarErrors> {
  let mut builder = GrammarBuilder { rules: Vec::new() };
  build_fn(&mut builder);

  let mut compiler = Compiler::new(&tokens);
  compiler.declare(&builder.rules);
  for (index, decl) in builder.rules.iter().enumerate() {
    compiler.compile_rule(RuleId(index), decl);
  }

  let Compiler {
    errors, compiled, ..
  } = compiler;
  GrammarErrors::into_result(errors)?;

  let grammar = Grammar::new(compiled.into_iter().map(|(_, r)| r).collect(), tokens);
  log::trace!("Compiled grammar:\n{}", grammar.to_pretty());
  Ok(grammar)
}

/// The mutable state of one compilation pass.
struct Compiler<'t> {
  tokens: &'t TokenTable,
  rule_ids: BTreeMap<Name, RuleId>,
  compiled: BTreeMap<RuleId, Rule>,
  next_id: usize,
  next_block: usize,
  errors: Vec<GrammarError>,
}

/// The resolution context of an element: the rule being compiled, and
/// whether lexer rules' lenient resolution applies.
#[derive(Clone)]
struct Context {
  rule: Name,
  lexer: bool,
}

impl<'t> Compiler<'t> {
  fn new(tokens: &'t TokenTable) -> Self {
    Compiler {
      tokens,
      rule_ids: BTreeMap::new(),
      compiled: BTreeMap::new(),
      next_id: 0,
      next_block: 0,
      errors: Vec::new(),
    }
  }

  fn declare(&mut self, decls: &[RuleDecl]) {
    self.next_id = decls.len();
    for (index, decl) in decls.iter().enumerate() {
      if decl.name.str().contains('#') {
        self.errors.push(GrammarError::ReservedRuleName(decl.name.clone()));
      }
      match self.rule_ids.entry(decl.name.clone()) {
        btree_map::Entry::Vacant(vac) => {
          vac.insert(RuleId(index));
        }
        btree_map::Entry::Occupied(_) => {
          self.errors.push(GrammarError::DuplicateRule(decl.name.clone()));
        }
      }
    }
  }

  fn compile_rule(&mut self, id: RuleId, decl: &RuleDecl) {
    if self.rule_ids.get(&decl.name) != Some(&id) {
      // Duplicate declaration, already reported.
      return;
    }

    if decl.alts.is_empty() {
      self.errors.push(GrammarError::EmptyRule(decl.name.clone()));
      return;
    }

    let ctx = Context {
      rule: decl.name.clone(),
      lexer: decl.origin == RuleOrigin::Lexer,
    };
    let alternatives = self.compile_alts(&ctx, &decl.alts);
    self.compiled.insert(
      id,
      Rule::new(id, decl.name.clone(), decl.origin, alternatives),
    );
  }

  fn compile_alts(&mut self, ctx: &Context, alts: &[AltDecl]) -> Vec<Alternative> {
    alts
      .iter()
      .map(|alt| {
        let elements = alt
          .elems
          .iter()
          .filter_map(|elem| self.compile_elem(ctx, elem))
          .collect();
        Alternative::new(alt.label.clone(), elements)
      })
      .collect()
  }

  fn compile_elem(&mut self, ctx: &Context, decl: &ElemDecl) -> Option<Element> {
    let multiplicity = match Multiplicity::from_suffix(&decl.suffix) {
      Some(m) => m,
      None => {
        self.errors.push(GrammarError::BadSuffix {
          rule: ctx.rule.clone(),
          suffix: decl.suffix.clone(),
        });
        return None;
      }
    };

    let kind = match &decl.kind {
      ElemDeclKind::Literal(text) => self.resolve_literal(ctx, text)?,
      ElemDeclKind::Token(name) => self.resolve_token(ctx, name)?,
      ElemDeclKind::Rule(name) => match self.rule_ids.get(name.as_str()) {
        Some(id) => ElementKind::RuleRef {
          rule: *id,
          name: Name::new(name),
        },
        None => {
          self.errors.push(GrammarError::UnknownRule {
            rule: ctx.rule.clone(),
            target: Name::new(name),
          });
          return None;
        }
      },
      // Character sets of lexer rules have no bearing on completion.
      ElemDeclKind::NotSet(_) if ctx.lexer => ElementKind::Wildcard,
      ElemDeclKind::NotSet(items) => {
        let mut excluded = BTreeSet::new();
        for item in items {
          if let Some(tt) = self.resolve_set_item(ctx, item) {
            excluded.insert(tt);
          }
        }
        ElementKind::NotSet(excluded)
      }
      ElemDeclKind::Wildcard => ElementKind::Wildcard,
      ElemDeclKind::Block(alts) => {
        let (id, name) = self.lift_block(ctx, alts);
        ElementKind::RuleRef { rule: id, name }
      }
    };

    Some(Element::new(decl.label.clone(), kind, multiplicity))
  }

  fn resolve_literal(&mut self, ctx: &Context, text: &str) -> Option<ElementKind> {
    let token_type = match self.tokens.literal_type(text) {
      Some(tt) => tt,
      None if ctx.lexer => TokenType::INVALID,
      None => {
        self.errors.push(GrammarError::UnknownLiteral {
          rule: ctx.rule.clone(),
          literal: Name::new(text),
        });
        return None;
      }
    };

    Some(ElementKind::Literal {
      text: Name::new(text),
      token_type,
    })
  }

  fn resolve_token(&mut self, ctx: &Context, name: &str) -> Option<ElementKind> {
    match self.tokens.rule_type(name) {
      // The end of input contributes nothing to completion.
      Some(tt) if tt.is_eof() => None,
      Some(token_type) => Some(ElementKind::TokenRule {
        name: Name::new(name),
        token_type,
      }),
      // Lexer fragment.
      None if ctx.lexer => Some(ElementKind::Wildcard),
      None => {
        self.errors.push(GrammarError::UnknownToken {
          rule: ctx.rule.clone(),
          token: Name::new(name),
        });
        None
      }
    }
  }

  fn resolve_set_item(&mut self, ctx: &Context, item: &SetItem) -> Option<TokenType> {
    let resolved = match item {
      SetItem::Literal(text) => self.tokens.literal_type(text),
      SetItem::Token(name) => self.tokens.rule_type(name),
    };

    if resolved.is_none() {
      self.errors.push(match item {
        SetItem::Literal(text) => GrammarError::UnknownLiteral {
          rule: ctx.rule.clone(),
          literal: Name::new(text),
        },
        SetItem::Token(name) => GrammarError::UnknownToken {
          rule: ctx.rule.clone(),
          token: Name::new(name),
        },
      });
    }

    resolved
  }

  /// Moves the alternatives of an inline block into a new rule, and returns
  /// the id and generated name of that rule.
  fn lift_block(&mut self, ctx: &Context, alts: &[AltDecl]) -> (RuleId, Name) {
    let id = RuleId(self.next_id);
    self.next_id += 1;
    let name = Name::new(&format!("{}#block{}", ctx.rule, self.next_block));
    self.next_block += 1;
    if alts.is_empty() {
      self.errors.push(GrammarError::EmptyBlock(ctx.rule.clone()));
    }

    let alternatives = self.compile_alts(ctx, alts);
    self.compiled.insert(
      id,
      Rule::new(id, name.clone(), RuleOrigin::Block, alternatives),
    );
    (id, name)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::grammar::examples;

  fn tokens() -> TokenTable {
    let mut tokens = TokenTable::new();
    tokens
      .add_rule("NAME", TokenType(1))
      .add_literal("(", TokenType(2))
      .add_literal(")", TokenType(3))
      .add_literal(",", TokenType(4));
    tokens
  }

  #[test]
  fn test_multiplicity_from_suffix() {
    let g = build(tokens(), |gb| {
      gb.add_rule("r", |rb| {
        rb.add_alt(|ab| {
          ab.add(token("NAME"))
            .add(token("NAME").suffix("?"))
            .add(token("NAME").suffix("*"))
            .add(token("NAME").suffix("+"));
        });
      });
    })
    .unwrap();

    let mults: Vec<_> = g.rule("r").unwrap().alternative(0).elements()
      .iter()
      .map(Element::multiplicity)
      .collect();
    assert_eq!(
      mults,
      vec![
        Multiplicity::ExactlyOne,
        Multiplicity::ZeroOrOne,
        Multiplicity::ZeroOrMore,
        Multiplicity::OneOrMore
      ]
    );
  }

  #[test]
  fn test_block_is_lifted_into_rule() {
    let g = examples::make_call_grammar().unwrap();
    let args = g.rule("args").unwrap();
    let block_elem = &args.alternative(0).elements()[1];
    let block_id = block_elem.kind().as_rule_ref().unwrap();
    let block = g.rule_at(block_id);

    assert_eq!(block.origin(), RuleOrigin::Block);
    assert!(g.is_block_rule(block.name().str()));
    assert!(!g.is_block_rule("args"));
    assert_eq!(block_elem.multiplicity(), Multiplicity::ZeroOrMore);
    assert_eq!(block.alternatives().len(), 1);
  }

  #[test]
  fn test_block_names_are_unique() {
    let g = build(tokens(), |gb| {
      gb.add_rule("r", |rb| {
        rb.add_alt(|ab| {
          ab.add(block(|bb| {
            bb.add_alt(|ab| {
              ab.add(block(|bb| {
                bb.add_alt(|ab| {
                  ab.add_literal("(");
                });
              }));
            });
          }))
          .add(block(|bb| {
            bb.add_alt(|ab| {
              ab.add_literal(")");
            });
          }));
        });
      });
    })
    .unwrap();

    let names: BTreeSet<_> = g
      .rules()
      .filter(|r| r.origin() == RuleOrigin::Block)
      .map(|r| r.name().clone())
      .collect();
    assert_eq!(names.len(), 3);
  }

  #[test]
  fn test_eof_reference_is_dropped() {
    let g = build(tokens(), |gb| {
      gb.add_rule("r", |rb| {
        rb.add_alt(|ab| {
          ab.add_token("NAME").add_token("EOF");
        });
      });
    })
    .unwrap();
    assert_eq!(g.rule("r").unwrap().alternative(0).elements().len(), 1);
  }

  #[test]
  fn test_lexer_fragment_becomes_wildcard() {
    let g = build(tokens(), |gb| {
      gb.add_lexer_rule("NAME", |rb| {
        rb.add_alt(|ab| {
          ab.add(token("LETTER").suffix("+")).add_literal("_");
        });
      });
    })
    .unwrap();

    let elems = g.rule("NAME").unwrap().alternative(0).elements();
    assert_eq!(elems[0].kind(), &ElementKind::Wildcard);
    assert_eq!(elems[0].multiplicity(), Multiplicity::OneOrMore);
    assert_eq!(
      elems[1].kind(),
      &ElementKind::Literal {
        text: Name::new("_"),
        token_type: TokenType::INVALID
      }
    );
  }

  #[test]
  fn test_errors_are_collected() {
    let err = build(tokens(), |gb| {
      gb.add_rule("r", |rb| {
        rb.add_alt(|ab| {
          ab.add_rule_ref("missing")
            .add_literal("[")
            .add_token("NUMBER")
            .add(token("NAME").suffix("!"));
        });
      })
      .add_rule("r", |rb| {
        rb.add_alt(|_| {});
      })
      .add_rule("empty", |_| {});
    })
    .unwrap_err();

    let errors = err.errors();
    assert!(errors.contains(&GrammarError::DuplicateRule(Name::new("r"))));
    assert!(errors.contains(&GrammarError::EmptyRule(Name::new("empty"))));
    assert!(errors.contains(&GrammarError::UnknownRule {
      rule: Name::new("r"),
      target: Name::new("missing"),
    }));
    assert!(errors.contains(&GrammarError::UnknownLiteral {
      rule: Name::new("r"),
      literal: Name::new("["),
    }));
    assert!(errors.contains(&GrammarError::UnknownToken {
      rule: Name::new("r"),
      token: Name::new("NUMBER"),
    }));
    assert!(errors.contains(&GrammarError::BadSuffix {
      rule: Name::new("r"),
      suffix: "!".to_string(),
    }));
  }

  #[test]
  fn test_debug_lists_rule_names() {
    let g = examples::make_call_grammar().unwrap();
    let shown = format!("{:?}", g);
    assert!(shown.starts_with("Grammar"));
    assert!(shown.contains("call"));
    assert!(shown.contains("args#block0"));
    assert!(!shown.contains("alternatives"));
  }

  #[test]
  fn test_block_names_cannot_be_declared() {
    let err = build(tokens(), |gb| {
      gb.add_rule("r", |rb| {
        rb.add_alt(|ab| {
          ab.add(block(|bb| {
            bb.add_alt(|ab| {
              ab.add_literal("(");
            });
          }));
        });
      })
      .add_rule("r#block0", |rb| {
        rb.add_alt(|ab| {
          ab.add_literal(")");
        });
      });
    })
    .unwrap_err();

    assert_eq!(
      err.errors(),
      &[GrammarError::ReservedRuleName(Name::new("r#block0"))]
    );
  }

  #[test]
  fn test_empty_block_is_rejected() {
    let err = build(tokens(), |gb| {
      gb.add_rule("r", |rb| {
        rb.add_alt(|ab| {
          ab.add_token("NAME").add(block(|_| {}));
        });
      });
    })
    .unwrap_err();

    assert_eq!(err.errors(), &[GrammarError::EmptyBlock(Name::new("r"))]);
  }

  #[test]
  fn test_not_set_resolves_ids() {
    let g = build(tokens(), |gb| {
      gb.add_rule("r", |rb| {
        rb.add_alt(|ab| {
          ab.add(not_set(vec![
            SetItem::Literal("(".to_string()),
            SetItem::Token("NAME".to_string()),
          ]));
        });
      });
    })
    .unwrap();

    let elem = &g.rule("r").unwrap().alternative(0).elements()[0];
    assert!(!elem.kind().matches(TokenType(1)));
    assert!(!elem.kind().matches(TokenType(2)));
    assert!(elem.kind().matches(TokenType(3)));
    assert!(elem.kind().matches(TokenType(999)));
    assert!(!elem.kind().matches(TokenType::EOF));
  }

  #[test]
  fn test_pretty_print() {
    let g = examples::make_call_grammar().unwrap();
    let text = g.to_pretty();
    assert!(text.contains("call: NAME '(' args? ')' ;"), "{}", text);
  }
}
