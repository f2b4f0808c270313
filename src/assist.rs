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

//! Turns the parse of the input before the caret into completions.
//!
//! For each chart configuration expecting a terminal at the caret, the
//! configuration is assumed complete, and the elements on the resulting
//! paths are offered to a `SuggestionSource`. The raw suggestions are then
//! turned into edits of the input: the replaced range is widened over text
//! the suggested element would replace anyway, mandatory literals that must
//! follow are appended, and the caret is placed where input is next
//! expected.

mod config;
mod element;
mod input;

pub use {
  config::AssistConfig,
  element::{ParentedElement, SuggestionSource},
  input::{InputCompletion, InputStatus, InputSuggestion},
};

use {
  crate::{
    grammar::{Grammar, RuleNotFound},
    lexer::{LexError, Token, Tokenizer},
    parsers::{match_distance, Chart, ExpectedPath},
  },
  std::{
    cell::Cell,
    collections::{btree_map, BTreeMap, BTreeSet},
  },
};

#[derive(thiserror::Error, Debug)]
pub enum AssistError {
  #[error(transparent)]
  RuleNotFound(#[from] RuleNotFound),
  #[error("caret {caret} is past the end of the input ({len} bytes)")]
  CaretOutOfRange { caret: usize, len: usize },
  #[error("caret {0} is not on a character boundary")]
  CaretNotOnCharBoundary(usize),
  #[error("input has more than {limit} tokens before the caret")]
  TooManyTokens { limit: usize },
  #[error("failed to lex input")]
  Lex(#[from] LexError),
}

/// A raw suggestion bound to the element that produced it, with the range
/// of the input it replaces.
#[derive(Clone, Debug)]
pub struct ElementCompletion<'g> {
  element: ParentedElement<'g>,
  replace_begin: usize,
  replace_end: usize,
  content: String,
  caret: Option<usize>,
  description: Option<String>,
}

impl<'g> ElementCompletion<'g> {
  pub fn element(&self) -> &ParentedElement<'g> {
    &self.element
  }

  pub fn replace_begin(&self) -> usize {
    self.replace_begin
  }

  pub fn replace_end(&self) -> usize {
    self.replace_end
  }

  pub fn content(&self) -> &str {
    &self.content
  }

  pub fn caret(&self) -> Option<usize> {
    self.caret
  }

  pub fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }

  /// The caret inside `content`, if it was placed before its end.
  fn placeholder_caret(&self) -> Option<usize> {
    self
      .caret
      .filter(|caret| *caret < self.content.len())
  }
}

/// The suggestions of one element, and where it expects input.
struct ElementSuggestion<'g> {
  element: ParentedElement<'g>,
  position: usize,
  match_with: String,
  suggestions: Vec<InputSuggestion>,
}

/// Counts down the helper lexing passes left in one request.
struct Budget(Cell<usize>);

impl Budget {
  fn new(amount: usize) -> Self {
    Budget(Cell::new(amount))
  }

  fn take(&self) -> bool {
    match self.0.get() {
      0 => {
        log::debug!("Relex budget exhausted, skipping refinement.");
        false
      }
      left => {
        self.0.set(left - 1);
        true
      }
    }
  }
}

/// The number of elements of `path`, from the leaf up, that are offered to
/// the suggestion source. An ancestor is offered only if the element below
/// it is the first one parsed in its alternative.
fn chain_len(path: &ExpectedPath) -> usize {
  1 + path
    .iter()
    .take(path.len().saturating_sub(1))
    .take_while(|level| level.parsed_count() == 1)
    .count()
}

/// Returns how many bytes of `content` the `mandatories` span, allowing
/// whitespace anywhere, or 0 if they are not all there.
fn skip_mandatories(content: &str, mandatories: &[String]) -> usize {
  let expected: Vec<char> = mandatories
    .concat()
    .chars()
    .filter(|c| !c.is_whitespace())
    .collect();
  if expected.is_empty() {
    return 0;
  }

  let mut matched = 0;
  for (i, c) in content.char_indices() {
    if c.is_whitespace() {
      continue;
    }
    if c != expected[matched] {
      return 0;
    }
    matched += 1;
    if matched == expected.len() {
      return i + c.len_utf8();
    }
  }

  0
}

/// The completion engine for one grammar.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct CodeAssist<S> {
  grammar: Grammar,
  tokenizer: Tokenizer,
  #[derivative(Debug = "ignore")]
  source: S,
  config: AssistConfig,
}

impl<S: SuggestionSource> CodeAssist<S> {
  pub fn new(grammar: Grammar, tokenizer: Tokenizer, source: S) -> Self {
    CodeAssist {
      grammar,
      tokenizer,
      source,
      config: AssistConfig::default(),
    }
  }

  pub fn with_config(mut self, config: AssistConfig) -> Self {
    self.config = config;
    self
  }

  pub fn grammar(&self) -> &Grammar {
    &self.grammar
  }

  pub fn tokenizer(&self) -> &Tokenizer {
    &self.tokenizer
  }

  pub fn config(&self) -> &AssistConfig {
    &self.config
  }

  /// Computes the completions of `input` as text of rule `rule_name`.
  ///
  /// Completions come in the order their elements were found, and no two of
  /// them produce the same text. None of them leaves the input unchanged.
  pub fn suggest(
    &self,
    input: &InputStatus,
    rule_name: &str,
  ) -> Result<Vec<InputCompletion>, AssistError> {
    let budget = Budget::new(self.config.relex_budget());
    let completions = self.collect_completions(input, rule_name, &budget)?;
    let content = input.content();

    // Completions producing the same text are merged. Mandatory literals
    // are only appended if every merged completion agrees on them.
    let mut grouped: Vec<(String, Vec<ElementCompletion<'_>>)> = Vec::new();
    let mut group_index = BTreeMap::new();
    for completion in completions {
      let key = format!(
        "{}{}{}",
        &content[..completion.replace_begin],
        completion.content,
        &content[completion.replace_end..]
      );
      match group_index.entry(key) {
        btree_map::Entry::Vacant(vac) => {
          grouped.push((vac.key().clone(), vec![completion]));
          vac.insert(grouped.len() - 1);
        }
        btree_map::Entry::Occupied(occ) => {
          grouped[*occ.get()].1.push(completion);
        }
      }
    }

    let mut results = Vec::new();
    for (key, group) in grouped {
      let first = &group[0];

      // Nothing is appended to a completion that replaces text past the
      // caret.
      let new_content = if first.replace_end <= input.caret() {
        self.agreed_content(content, &group, &budget)
      } else {
        None
      }
      .unwrap_or_else(|| key.clone());
      let replaced_end = new_content.len() + first.replace_end - content.len();

      let caret = match first.placeholder_caret() {
        Some(caret) => first.replace_begin + caret,
        None if new_content == key => {
          let mandatories = first.element.mandatories_after();
          replaced_end
            + skip_mandatories(&new_content[replaced_end..], &mandatories)
        }
        None => replaced_end,
      };

      results.push(InputCompletion::new(
        first.replace_begin,
        first.replace_end,
        &new_content[first.replace_begin..replaced_end],
        caret,
        first.description.clone(),
      ));
    }

    let mut seen = BTreeSet::new();
    seen.insert(content.to_string());
    results.retain(|completion| {
      seen.insert(completion.complete(input).content().to_string())
    });

    log::debug!(
      "{} completions for {:?} at {}.",
      results.len(),
      rule_name,
      input.caret()
    );
    Ok(results)
  }

  /// The text after applying each completion of `group` together with its
  /// mandatory literals, if all of them produce the same text.
  fn agreed_content(
    &self,
    content: &str,
    group: &[ElementCompletion],
    budget: &Budget,
  ) -> Option<String> {
    let mut candidates = group
      .iter()
      .map(|each| self.append_mandatories(content, each, budget));
    let agreed = candidates.next()??;
    for candidate in candidates {
      if candidate? != agreed {
        return None;
      }
    }

    Some(agreed)
  }

  fn append_mandatories(
    &self,
    content: &str,
    completion: &ElementCompletion,
    budget: &Budget,
  ) -> Option<String> {
    let mut text = format!(
      "{}{}",
      &content[..completion.replace_begin],
      completion.content
    );

    for mandatory in completion.element.mandatories_after() {
      let prev_len = text.len();
      text.push_str(&mandatory);
      let is_literal =
        self.grammar.token_table().literal_type(&mandatory).is_some();
      if is_literal && self.needs_space(&text, &mandatory, budget)? {
        text.insert(prev_len, ' ');
      }
    }

    text.push_str(&content[completion.replace_end..]);
    Some(text)
  }

  /// True if `text`, which ends with `mandatory`, does not lex with
  /// `mandatory` as its own last token.
  fn needs_space(
    &self,
    text: &str,
    mandatory: &str,
    budget: &Budget,
  ) -> Option<bool> {
    if !budget.take() {
      return None;
    }

    match self.tokenizer.tokenize(text) {
      Ok(tokens) => Some(tokens.last().map_or(true, |last| {
        last.start() != text.len() - mandatory.len() || last.end() != text.len()
      })),
      Err(e) => {
        log::debug!("Failed to lex {:?}: {}", text, e);
        None
      }
    }
  }

  /// Computes the raw suggestions for `input`, before they are merged into
  /// edits.
  ///
  /// Unlike `suggest`, this keeps suggestions that would leave the input
  /// unchanged, and keeps one entry per producing element.
  pub fn element_completions(
    &self,
    input: &InputStatus,
    rule_name: &str,
  ) -> Result<Vec<ElementCompletion<'_>>, AssistError> {
    let budget = Budget::new(self.config.relex_budget());
    self.collect_completions(input, rule_name, &budget)
  }

  fn collect_completions(
    &self,
    input: &InputStatus,
    rule_name: &str,
    budget: &Budget,
  ) -> Result<Vec<ElementCompletion<'_>>, AssistError> {
    let rule = self.grammar.get_rule(rule_name)?;
    check_caret(input)?;
    let tokens = self.lex_prefix(input.content_before_caret())?;
    let chart = Chart::parse(&self.grammar, rule.id(), &tokens);

    // The last token may be complete, or the prefix of a longer one. Both
    // readings are covered by also looking at the position before it.
    let mut suggestions = Vec::new();
    let last = chart.positions() - 1;
    self.fill_suggestions(&chart, last, input, &mut suggestions);
    if last >= 1 {
      self.fill_suggestions(&chart, last - 1, input, &mut suggestions);
    }

    let content = input.content();
    let mut completions = Vec::new();
    for suggestion in suggestions {
      let replace_begin = input.caret() - suggestion.match_with.len();
      let replace_end = self
        .matched_end(content, replace_begin, &suggestion.element, budget)
        .map_or(input.caret(), |end| end.max(input.caret()));
      let before = &content[..replace_begin];

      for raw in suggestion.suggestions {
        if suggestion.position != 0
          && !self.can_append(&tokens, suggestion.position, before, raw.content(), budget)
        {
          log::trace!("Dropping {:?}, it needs a separator.", raw.content());
          continue;
        }

        completions.push(ElementCompletion {
          element: suggestion.element.clone(),
          replace_begin,
          replace_end,
          content: raw.content().to_string(),
          caret: raw.caret(),
          description: raw.description().map(str::to_string),
        });
      }
    }

    Ok(completions)
  }

  fn lex_prefix(&self, text: &str) -> Result<Vec<Token>, AssistError> {
    let limit = self.config.max_tokens();
    let mut tokens = Vec::new();
    for token in self.tokenizer.tokens(text)? {
      if tokens.len() == limit {
        return Err(AssistError::TooManyTokens { limit });
      }
      tokens.push(token?);
    }

    Ok(tokens)
  }

  fn fill_suggestions<'s>(
    &'s self,
    chart: &Chart,
    position: usize,
    input: &InputStatus,
    suggestions: &mut Vec<ElementSuggestion<'s>>,
  ) {
    let typed = match position {
      0 => input.content_before_caret(),
      _ => {
        let stop = chart.tokens()[position - 1].end();
        input.content().get(stop..input.caret()).unwrap_or("")
      }
    };
    let match_with = typed.trim_start();

    for id in chart.configs_expecting_terminal(position) {
      for path in chart.assume_completed(id, self.config.max_paths()) {
        let chain = chain_len(&path);
        for depth in 0..chain {
          let element = ParentedElement::new(&self.grammar, path.clone(), depth);
          match self.source.suggest(&element, match_with) {
            Ok(raw) if !raw.is_empty() => {
              suggestions.push(ElementSuggestion {
                element,
                position,
                match_with: match_with.to_string(),
                suggestions: raw,
              });
              break;
            }
            Ok(_) => {}
            Err(e) => {
              log::warn!("Suggestion source failed for {:?}: {:#}", element, e)
            }
          }
        }
      }
    }
  }

  /// The end of the text after `replace_begin` that `element` would
  /// replace, if it matches any.
  fn matched_end(
    &self,
    content: &str,
    replace_begin: usize,
    element: &ParentedElement,
    budget: &Budget,
  ) -> Option<usize> {
    if !budget.take() {
      return None;
    }

    let tokens = self
      .tokenizer
      .tokens(&content[replace_begin..])
      .and_then(|tokens| {
        tokens
          .take(self.config.max_match_tokens())
          .collect::<Result<Vec<_>, _>>()
      });
    let tokens = match tokens {
      Ok(tokens) => tokens,
      Err(e) => {
        log::debug!("Failed to lex after {}: {}", replace_begin, e);
        return None;
      }
    };

    if tokens.first().map_or(true, |token| token.start() != 0) {
      return None;
    }

    match match_distance(&self.grammar, element.element(), &tokens) {
      0 => None,
      distance => Some(replace_begin + tokens[distance - 1].end()),
    }
  }

  /// True if `suggested` can directly follow `before` without changing the
  /// last token the parse saw before `position`.
  fn can_append(
    &self,
    tokens: &[Token],
    position: usize,
    before: &str,
    suggested: &str,
    budget: &Budget,
  ) -> bool {
    if !budget.take() {
      return true;
    }

    let last = &tokens[position - 1];
    let text = format!("{}{}", before, suggested);
    match self.tokenizer.tokenize(&text) {
      Ok(relexed) => {
        relexed.len() > position && {
          let token = &relexed[position - 1];
          token.start() == last.start() && token.end() == last.end()
        }
      }
      Err(e) => {
        log::debug!("Failed to lex {:?}: {}", text, e);
        true
      }
    }
  }
}

fn check_caret(input: &InputStatus) -> Result<(), AssistError> {
  let len = input.content().len();
  let caret = input.caret();
  if caret > len {
    Err(AssistError::CaretOutOfRange { caret, len })
  } else if !input.content().is_char_boundary(caret) {
    Err(AssistError::CaretNotOnCharBoundary(caret))
  } else {
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use {
    super::*,
    crate::{
      grammar::{build, examples, ElementKind, TokenTable, TokenType},
      lexer::SimpleLexerSpec,
    },
  };

  /// Suggests the text of literal elements, and a fixed set of names for
  /// `NAME` tokens.
  struct Fixed(Vec<&'static str>);

  impl SuggestionSource for Fixed {
    fn suggest(
      &self,
      element: &ParentedElement<'_>,
      match_with: &str,
    ) -> anyhow::Result<Vec<InputSuggestion>> {
      Ok(match element.element().kind() {
        ElementKind::Literal { text, .. } if text.str().starts_with(match_with) => {
          vec![InputSuggestion::new(text.str())]
        }
        ElementKind::TokenRule { name, .. } if name.str() == "NAME" => self
          .0
          .iter()
          .map(|n| InputSuggestion::new(*n).with_description("name"))
          .collect(),
        _ => Vec::new(),
      })
    }
  }

  fn engine(grammar: Grammar, names: Vec<&'static str>) -> CodeAssist<Fixed> {
    let mut spec = SimpleLexerSpec::new(grammar.token_table().clone());
    if grammar.token_type("NAME").is_some() {
      spec = spec.identifier("NAME").unwrap();
    }
    CodeAssist::new(grammar, Tokenizer::new(spec), Fixed(names))
  }

  fn texts(completions: &[InputCompletion]) -> Vec<(&str, usize)> {
    completions
      .iter()
      .map(|c| (c.replace_content(), c.caret()))
      .collect()
  }

  #[test]
  fn test_chain_len() {
    let g = examples::make_query_grammar().unwrap();
    let assist = engine(g, vec![]);
    let tokens = assist.tokenizer().tokenize("key:").unwrap();
    let chart = Chart::parse_rule(assist.grammar(), "query", &tokens).unwrap();
    let id = chart.configs_expecting_terminal(2)[0];
    let paths = chart.assume_completed(id, 4);
    let path = &paths[0];

    // `NAME` is the first element of `value`, but `criteria` has already
    // parsed `'key' ':'`.
    assert_eq!(path.len(), 3);
    assert_eq!(chain_len(path), 2);
  }

  #[test]
  fn test_skip_mandatories() {
    let m = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    assert_eq!(skip_mandatories("(x", &m(&["("])), 1);
    assert_eq!(skip_mandatories(" ( ) x", &m(&["(", ")"])), 4);
    assert_eq!(skip_mandatories(" x(", &m(&["("])), 0);
    assert_eq!(skip_mandatories("(", &m(&["(", ")"])), 0);
    assert_eq!(skip_mandatories("(", &m(&[])), 0);
  }

  #[test]
  fn test_call_completion_appends_paren() {
    let assist = engine(examples::make_call_grammar().unwrap(), vec!["foo", "bar"]);
    let completions = assist.suggest(&InputStatus::at_end("fo"), "call").unwrap();

    // `fo` may be a complete name, followed by `(`.
    assert_eq!(
      texts(&completions),
      vec![("(", 3), ("foo(", 4), ("bar(", 4)]
    );
    assert_eq!(completions[0].description(), None);
    assert_eq!(
      (completions[1].replace_begin(), completions[1].replace_end()),
      (0, 2)
    );
    assert_eq!(completions[1].description(), Some("name"));
  }

  #[test]
  fn test_caret_skips_existing_mandatories() {
    let assist = engine(examples::make_call_grammar().unwrap(), vec!["foo"]);
    let input = InputStatus::new("fo (x)", 1);
    let completions = assist.suggest(&input, "call").unwrap();

    let foo = completions
      .iter()
      .find(|c| c.replace_content() == "foo")
      .unwrap();
    assert_eq!((foo.replace_begin(), foo.replace_end()), (0, 2));
    let done = foo.complete(&input);
    assert_eq!(done.content(), "foo (x)");
    assert_eq!(done.caret(), 5);
  }

  #[test]
  fn test_replace_range_extends_over_token() {
    let assist = engine(examples::make_call_grammar().unwrap(), vec!["foo"]);
    let input = InputStatus::new("fxyz(", 1);
    let completions = assist.suggest(&input, "call").unwrap();

    let foo = completions
      .iter()
      .find(|c| c.replace_begin() == 0)
      .unwrap();
    assert_eq!(foo.replace_end(), 4);
    assert_eq!(foo.replace_content(), "foo");
    assert_eq!(foo.complete(&input).content(), "foo(");
    assert_eq!(foo.caret(), 4);
  }

  #[test]
  fn test_keyword_prefix_both_readings() {
    let assist = engine(examples::make_keyword_grammar().unwrap(), vec![]);
    let input = InputStatus::at_end("for");

    let raw: Vec<_> = assist
      .element_completions(&input, "alt")
      .unwrap()
      .iter()
      .map(|c| c.content().to_string())
      .collect();
    assert!(raw.contains(&"for".to_string()));
    assert!(raw.contains(&"forme".to_string()));

    // Completing to `for` would not change anything.
    let completions = assist.suggest(&input, "alt").unwrap();
    assert_eq!(texts(&completions), vec![("forme", 5)]);
  }

  #[test]
  fn test_equal_completions_are_merged() {
    let assist = engine(examples::make_pair_grammar().unwrap(), vec!["bar"]);
    let input = InputStatus::at_end("foo");
    let completions = assist.suggest(&input, "pair").unwrap();
    assert_eq!(texts(&completions), vec![(",", 4), ("bar,", 4)]);

    // Retyping the `,` changes nothing.
    let input = InputStatus::at_end("foo,");
    let completions = assist.suggest(&input, "pair").unwrap();
    assert_eq!(texts(&completions), vec![("bar", 7)]);
  }

  #[test]
  fn test_suggestion_needing_separator_is_dropped() {
    let assist = engine(examples::make_query_grammar().unwrap(), vec![]);
    let completions = assist.suggest(&InputStatus::at_end("key:a"), "query").unwrap();
    assert!(completions.is_empty());

    let completions = assist.suggest(&InputStatus::at_end("key:a "), "query").unwrap();
    assert_eq!(texts(&completions), vec![("key:", 10)]);
  }

  #[test]
  fn test_block_matches_named_rule() {
    for rule in &["blocked", "named"] {
      let assist = engine(examples::make_block_grammar().unwrap(), vec![]);
      let completions = assist.suggest(&InputStatus::at_end("x "), rule).unwrap();
      assert_eq!(texts(&completions), vec![("a b", 5)], "{}", rule);
    }
  }

  #[test]
  fn test_disagreeing_mandatories_are_left_out() {
    let mut tokens = TokenTable::new();
    tokens
      .add_rule("NAME", TokenType(1))
      .add_literal(";", TokenType(2))
      .add_literal(":", TokenType(3));
    let g = build(tokens, |gb| {
      gb.add_rule("stmt", |rb| {
        rb.add_alt(|ab| {
          ab.add_token("NAME").add_literal(";");
        })
        .add_alt(|ab| {
          ab.add_token("NAME").add_literal(":");
        });
      });
    })
    .unwrap();

    let assist = engine(g, vec!["foo"]);
    let completions = assist.suggest(&InputStatus::at_end("fo"), "stmt").unwrap();
    assert_eq!(texts(&completions), vec![(";", 3), (":", 3), ("foo", 3)]);
  }

  #[test]
  fn test_placeholder_caret_is_kept() {
    fn quoted(
      element: &ParentedElement<'_>,
      _: &str,
    ) -> anyhow::Result<Vec<InputSuggestion>> {
      Ok(match element.element().kind() {
        ElementKind::TokenRule { name, .. } if name.str() == "QUOTED" => {
          vec![InputSuggestion::new("\"\"").with_caret(1)]
        }
        _ => Vec::new(),
      })
    }

    let g = examples::make_query_grammar().unwrap();
    let spec = SimpleLexerSpec::new(g.token_table().clone())
      .identifier("NAME")
      .and_then(|s| s.quoted_string("QUOTED"))
      .unwrap();
    let assist = CodeAssist::new(g, Tokenizer::new(spec), quoted);
    let completions = assist.suggest(&InputStatus::at_end("key:"), "query").unwrap();

    assert_eq!(texts(&completions), vec![("\"\"", 5)]);
  }

  #[test]
  fn test_source_errors_are_isolated() {
    fn failing(
      element: &ParentedElement<'_>,
      _: &str,
    ) -> anyhow::Result<Vec<InputSuggestion>> {
      match element.element().kind() {
        ElementKind::TokenRule { .. } => Err(anyhow::anyhow!("lookup failed")),
        _ => Ok(vec![InputSuggestion::new("key")]),
      }
    }

    let g = examples::make_query_grammar().unwrap();
    let spec = SimpleLexerSpec::new(g.token_table().clone())
      .identifier("NAME")
      .unwrap();
    let assist = CodeAssist::new(g, Tokenizer::new(spec), failing);

    // The `NAME` leaf fails, and its parent `value` is offered instead.
    let completions = assist.element_completions(&InputStatus::at_end("key:"), "query").unwrap();
    assert_eq!(completions.len(), 2);
    assert!(completions
      .iter()
      .all(|c| c.element().rule().name().str() == "criteria"));
  }

  #[test]
  fn test_request_errors() {
    let assist = engine(examples::make_call_grammar().unwrap(), vec![]);
    assert!(matches!(
      assist.suggest(&InputStatus::at_end("x"), "nope"),
      Err(AssistError::RuleNotFound(_))
    ));
    assert!(matches!(
      assist.suggest(&InputStatus::new("x", 3), "call"),
      Err(AssistError::CaretOutOfRange { caret: 3, len: 1 })
    ));
    assert!(matches!(
      assist.suggest(&InputStatus::new("é", 1), "call"),
      Err(AssistError::CaretNotOnCharBoundary(1))
    ));

    let limited = engine(examples::make_call_grammar().unwrap(), vec![])
      .with_config(AssistConfig::default().with_max_tokens(2));
    assert!(matches!(
      limited.suggest(&InputStatus::at_end("a(b"), "call"),
      Err(AssistError::TooManyTokens { limit: 2 })
    ));
    assert!(limited.suggest(&InputStatus::at_end("a("), "call").is_ok());
  }

  #[test]
  fn test_exhausted_budget_skips_refinements() {
    let assist = engine(examples::make_call_grammar().unwrap(), vec!["foo"])
      .with_config(AssistConfig::default().with_relex_budget(0));
    let completions = assist.suggest(&InputStatus::at_end("fo"), "call").unwrap();
    assert_eq!(texts(&completions), vec![("(", 3), ("foo", 3)]);
  }
}
