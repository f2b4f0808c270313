// Copyright 2018 Google LLC
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

use {
  super::token_table::{TokenTable, TokenType},
  crate::utils::{Name, ToDoc},
  std::collections::{BTreeMap, BTreeSet},
};

/// The index of a rule inside a compiled `Grammar`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct RuleId(pub(crate) usize);

/// Where a rule came from.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RuleOrigin {
  /// A parser rule declared in the grammar.
  Parser,
  /// A lexer rule declared in the grammar.
  Lexer,
  /// An anonymous rule lifted out of an inline parenthesized block.
  Block,
}

/// How many times an element may repeat.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Multiplicity {
  ExactlyOne,
  ZeroOrOne,
  ZeroOrMore,
  OneOrMore,
}

impl Multiplicity {
  /// Derives the multiplicity from an EBNF suffix. Returns `None` for
  /// anything that is not a suffix.
  pub fn from_suffix(suffix: &str) -> Option<Self> {
    match suffix {
      "" => Some(Multiplicity::ExactlyOne),
      "?" => Some(Multiplicity::ZeroOrOne),
      "*" => Some(Multiplicity::ZeroOrMore),
      "+" => Some(Multiplicity::OneOrMore),
      _ => None,
    }
  }

  pub fn suffix(self) -> &'static str {
    match self {
      Multiplicity::ExactlyOne => "",
      Multiplicity::ZeroOrOne => "?",
      Multiplicity::ZeroOrMore => "*",
      Multiplicity::OneOrMore => "+",
    }
  }

  /// True if the element may be skipped without matching anything.
  pub fn is_optional(self) -> bool {
    matches!(self, Multiplicity::ZeroOrOne | Multiplicity::ZeroOrMore)
  }

  /// True if the element may match more than once.
  pub fn is_repeatable(self) -> bool {
    matches!(self, Multiplicity::ZeroOrMore | Multiplicity::OneOrMore)
  }
}

/// The variant of a single grammar element.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ElementKind {
  /// A fixed token, such as `'('`.
  Literal { text: Name, token_type: TokenType },
  /// A token produced by a lexer rule, such as `NAME`.
  TokenRule { name: Name, token_type: TokenType },
  /// A reference to another rule of the grammar.
  RuleRef { rule: RuleId, name: Name },
  /// Any token whose id is not in the set.
  NotSet(BTreeSet<TokenType>),
  /// Any single token.
  Wildcard,
}

impl ElementKind {
  /// True for the variants that consume exactly one token.
  pub fn is_terminal(&self) -> bool {
    !matches!(self, ElementKind::RuleRef { .. })
  }

  /// Tests a terminal element against a token id. Rule references never
  /// match a single token.
  pub fn matches(&self, token_type: TokenType) -> bool {
    match self {
      ElementKind::Literal { token_type: tt, .. }
      | ElementKind::TokenRule { token_type: tt, .. } => *tt == token_type,
      ElementKind::NotSet(excluded) => {
        !token_type.is_eof() && !excluded.contains(&token_type)
      }
      ElementKind::Wildcard => !token_type.is_eof(),
      ElementKind::RuleRef { .. } => false,
    }
  }

  pub fn as_rule_ref(&self) -> Option<RuleId> {
    match self {
      ElementKind::RuleRef { rule, .. } => Some(*rule),
      _ => None,
    }
  }

  pub fn as_literal(&self) -> Option<&Name> {
    match self {
      ElementKind::Literal { text, .. } => Some(text),
      _ => None,
    }
  }
}

impl ToDoc for ElementKind {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    match self {
      ElementKind::Literal { text, .. } => da.text(format!("'{}'", text)),
      ElementKind::TokenRule { name, .. } => name.to_doc(da),
      ElementKind::RuleRef { name, .. } => name.to_doc(da),
      ElementKind::NotSet(excluded) => da.text(format!(
        "~({})",
        excluded
          .iter()
          .map(|tt| tt.to_string())
          .collect::<Vec<_>>()
          .join("|")
      )),
      ElementKind::Wildcard => da.text("."),
    }
  }
}

/// An element within an alternative. Includes an optional label and the
/// multiplicity parsed from its EBNF suffix. Neither changes after
/// construction.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Element {
  label: Option<Name>,
  kind: ElementKind,
  multiplicity: Multiplicity,
}

impl Element {
  pub fn new(
    label: Option<Name>,
    kind: ElementKind,
    multiplicity: Multiplicity,
  ) -> Self {
    Element {
      label,
      kind,
      multiplicity,
    }
  }

  pub fn label(&self) -> Option<&Name> {
    self.label.as_ref()
  }

  pub fn kind(&self) -> &ElementKind {
    &self.kind
  }

  pub fn multiplicity(&self) -> Multiplicity {
    self.multiplicity
  }
}

impl ToDoc for Element {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    let prefix = if let Some(label) = &self.label {
      label.to_doc(da).append(da.text("="))
    } else {
      da.nil()
    };

    prefix
      .append(self.kind.to_doc(da))
      .append(da.text(self.multiplicity.suffix()))
  }
}

/// One production choice within a rule.
#[derive(Clone, Debug)]
pub struct Alternative {
  label: Option<Name>,
  elements: Vec<Element>,
}

impl Alternative {
  pub fn new(label: Option<Name>, elements: Vec<Element>) -> Self {
    Alternative { label, elements }
  }

  pub fn label(&self) -> Option<&Name> {
    self.label.as_ref()
  }

  pub fn elements(&self) -> &[Element] {
    &self.elements
  }

  pub fn element_at(&self, index: usize) -> Option<&Element> {
    self.elements.get(index)
  }
}

impl ToDoc for Alternative {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    let body = if self.elements.is_empty() {
      da.text("ε")
    } else {
      da.intersperse(self.elements.iter().map(|e| e.to_doc(da)), da.softline())
    };

    match &self.label {
      Some(label) => body.append(da.text(" # ")).append(label.to_doc(da)),
      None => body,
    }
  }
}

/// A rule within a grammar: a name and an ordered list of alternatives.
#[derive(Clone, Debug)]
pub struct Rule {
  id: RuleId,
  name: Name,
  origin: RuleOrigin,
  alternatives: Vec<Alternative>,
}

impl Rule {
  pub(crate) fn new(
    id: RuleId,
    name: Name,
    origin: RuleOrigin,
    alternatives: Vec<Alternative>,
  ) -> Self {
    Rule {
      id,
      name,
      origin,
      alternatives,
    }
  }

  pub fn id(&self) -> RuleId {
    self.id
  }

  pub fn name(&self) -> &Name {
    &self.name
  }

  pub fn origin(&self) -> RuleOrigin {
    self.origin
  }

  pub fn alternatives(&self) -> &[Alternative] {
    &self.alternatives
  }

  pub fn alternative(&self, index: usize) -> &Alternative {
    &self.alternatives[index]
  }
}

impl ToDoc for Rule {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    self
      .name
      .to_doc(da)
      .append(da.text(":"))
      .append(da.softline())
      .append(
        da.intersperse(
          self.alternatives.iter().map(|alt| alt.to_doc(da)),
          da.text(" |").append(da.softline()),
        )
        .nest(2),
      )
      .append(da.text(" ;"))
      .group()
  }
}

/// Failure to look up a rule by name.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("no rule named `{0}` in the grammar")]
pub struct RuleNotFound(pub String);

/// A compiled grammar.
///
/// Holds every named rule, every rule lifted out of an inline block, and
/// the token table the grammar was compiled against. A grammar is only
/// produced by `grammar::build`, and is read-only afterwards, so a single
/// instance can serve any number of completion requests at once.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Grammar {
  #[derivative(Debug = "ignore")]
  rules: Vec<Rule>,
  rule_ids: BTreeMap<Name, RuleId>,
  #[derivative(Debug = "ignore")]
  tokens: TokenTable,
}

impl Grammar {
  pub(crate) fn new(rules: Vec<Rule>, tokens: TokenTable) -> Self {
    let rule_ids = rules.iter().map(|r| (r.name.clone(), r.id)).collect();
    Grammar {
      rules,
      rule_ids,
      tokens,
    }
  }

  /// Returns the rule with the given name, if there is one.
  pub fn rule(&self, name: &str) -> Option<&Rule> {
    self.rule_ids.get(name).map(|id| self.rule_at(*id))
  }

  /// Returns the rule with the given name. Callers are expected to only ask
  /// for names they know are declared.
  pub fn get_rule(&self, name: &str) -> Result<&Rule, RuleNotFound> {
    self.rule(name).ok_or_else(|| RuleNotFound(name.to_string()))
  }

  /// Returns the rule with the given id. Ids are only handed out by this
  /// grammar, so this can not fail for ids taken from its elements.
  pub fn rule_at(&self, id: RuleId) -> &Rule {
    &self.rules[id.0]
  }

  pub fn rules(&self) -> impl Iterator<Item = &Rule> {
    self.rules.iter()
  }

  /// True if the name was generated for an inline block.
  pub fn is_block_rule(&self, name: &str) -> bool {
    self
      .rule(name)
      .map_or(false, |r| r.origin == RuleOrigin::Block)
  }

  pub fn token_table(&self) -> &TokenTable {
    &self.tokens
  }

  /// Returns the symbolic name of a token id.
  pub fn token_name(&self, token_type: TokenType) -> Option<&Name> {
    self.tokens.rule_name(token_type)
  }

  /// Returns the id of a symbolic token name.
  pub fn token_type(&self, name: &str) -> Option<TokenType> {
    self.tokens.rule_type(name)
  }

  pub fn to_pretty(&self) -> String {
    let arena = pretty::Arena::new();
    format!("{}", self.to_doc(&arena).into_doc().pretty(80))
  }
}

impl ToDoc for Grammar {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    da.intersperse(self.rules.iter().map(|rule| rule.to_doc(da)), da.hardline())
  }
}

/// A single structural problem found while compiling a grammar.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum GrammarError {
  #[error("malformed token table line {line}: `{text}`")]
  MalformedTokenLine { line: usize, text: String },
  #[error("rule `{0}` is declared more than once")]
  DuplicateRule(Name),
  #[error("rule `{0}` has no alternatives")]
  EmptyRule(Name),
  #[error("rule `{0}` contains an inline block with no alternatives")]
  EmptyBlock(Name),
  #[error("rule name `{0}` contains `#`, which is reserved for inline blocks")]
  ReservedRuleName(Name),
  #[error("rule `{rule}` refers to undeclared rule `{target}`")]
  UnknownRule { rule: Name, target: Name },
  #[error("rule `{rule}` uses literal '{literal}' missing from the token table")]
  UnknownLiteral { rule: Name, literal: Name },
  #[error("rule `{rule}` uses token `{token}` missing from the token table")]
  UnknownToken { rule: Name, token: Name },
  #[error("rule `{rule}` has an element with invalid suffix `{suffix}`")]
  BadSuffix { rule: Name, suffix: String },
}

/// Every problem found during one compilation pass.
#[derive(thiserror::Error, Clone, Debug)]
#[error("invalid grammar: {}", join_errors(.errors))]
pub struct GrammarErrors {
  errors: Vec<GrammarError>,
}

fn join_errors(errors: &[GrammarError]) -> String {
  errors
    .iter()
    .map(|e| e.to_string())
    .collect::<Vec<_>>()
    .join("; ")
}

impl GrammarErrors {
  pub(crate) fn into_result(errors: Vec<GrammarError>) -> Result<(), Self> {
    if errors.is_empty() {
      Ok(())
    } else {
      Err(GrammarErrors { errors })
    }
  }

  pub fn errors(&self) -> &[GrammarError] {
    &self.errors
  }
}

impl From<GrammarError> for GrammarErrors {
  fn from(e: GrammarError) -> Self {
    GrammarErrors { errors: vec![e] }
  }
}
