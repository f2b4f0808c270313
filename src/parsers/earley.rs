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

//! An earley chart parser over a compiled grammar.
//!
//! The chart is built for a prefix of the input, and is never expected to
//! accept it. Completion only needs to know which terminals each position
//! still expects, and which rules would be finished if the input stopped
//! there.

mod state;

pub use state::{Child, ConfigId, Link};

use {
  crate::{
    grammar::{Element, ElementKind, Grammar, RuleId, RuleNotFound},
    lexer::Token,
  },
  state::{Config, ConfigKey},
  std::collections::{btree_map, BTreeMap, VecDeque},
};

/// One step of the path from an element expecting a terminal to the root
/// of the parse.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Level {
  config: ConfigId,
  rule: RuleId,
  alt: usize,
  elem_index: usize,
  parsed_count: usize,
  origin: usize,
}

impl Level {
  pub fn config(&self) -> ConfigId {
    self.config
  }

  pub fn rule(&self) -> RuleId {
    self.rule
  }

  pub fn alt(&self) -> usize {
    self.alt
  }

  /// The index of the element this level's child matched.
  pub fn elem_index(&self) -> usize {
    self.elem_index
  }

  /// How many elements of the alternative are parsed, including the one at
  /// `elem_index`.
  pub fn parsed_count(&self) -> usize {
    self.parsed_count
  }

  /// The chart position this level's alternative started at.
  pub fn origin(&self) -> usize {
    self.origin
  }
}

/// Levels from the configuration expecting a terminal (first) up to a
/// configuration of the start rule (last). Paths produced by one call to
/// `assume_completed` share their leaf-side prefix.
pub type ExpectedPath = im::Vector<Level>;

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Chart<'g, 't> {
  grammar: &'g Grammar,
  rule: RuleId,
  #[derivative(Debug = "ignore")]
  tokens: &'t [Token],
  states: Vec<BTreeMap<ConfigKey, ConfigId>>,
  /// Per position, the configurations whose next element refers to each
  /// rule.
  #[derivative(Debug = "ignore")]
  waiting: Vec<BTreeMap<RuleId, Vec<ConfigId>>>,
  #[derivative(Debug = "ignore")]
  configs: Vec<Config>,
  /// Configurations inserted at the position being closed and not yet
  /// stepped.
  #[derivative(Debug = "ignore")]
  agenda: VecDeque<ConfigId>,
  /// Completions at the position being closed that consumed no input.
  #[derivative(Debug = "ignore")]
  nulled: BTreeMap<RuleId, Vec<ConfigId>>,
}

impl<'g, 't> Chart<'g, 't> {
  /// Parses `tokens` as a prefix of `rule`.
  ///
  /// The chart has one position per token plus one. Positions after the
  /// point where the tokens stopped matching are empty.
  pub fn parse(grammar: &'g Grammar, rule: RuleId, tokens: &'t [Token]) -> Self {
    let mut chart = Chart {
      grammar,
      rule,
      tokens,
      states: vec![BTreeMap::new()],
      waiting: vec![BTreeMap::new()],
      configs: Vec::new(),
      agenda: VecDeque::new(),
      nulled: BTreeMap::new(),
    };

    for alt in 0..grammar.rule_at(rule).alternatives().len() {
      chart.insert(0, ConfigKey::start(rule, alt, 0), None);
    }
    chart.close(0);

    for i in 0..tokens.len() {
      chart.states.push(BTreeMap::new());
      chart.waiting.push(BTreeMap::new());
      chart.scan(i);
      chart.close(i + 1);
      log::trace!(
        "Chart position {}: {} configurations.",
        i + 1,
        chart.states[i + 1].len()
      );
    }

    chart
  }

  pub fn parse_rule(
    grammar: &'g Grammar,
    rule_name: &str,
    tokens: &'t [Token],
  ) -> Result<Self, RuleNotFound> {
    let rule = grammar.get_rule(rule_name)?;
    Ok(Chart::parse(grammar, rule.id(), tokens))
  }

  fn insert(
    &mut self,
    position: usize,
    key: ConfigKey,
    links: impl IntoIterator<Item = Link>,
  ) {
    let grammar = self.grammar;
    let (id, is_new) = match self.states[position].entry(key) {
      btree_map::Entry::Vacant(vac) => {
        let id = ConfigId(self.configs.len());
        vac.insert(id);
        self.configs.push(Config::new(key, position));
        (id, true)
      }
      btree_map::Entry::Occupied(occ) => (*occ.get(), false),
    };

    // A nullable repetition loops back onto the same configuration, and
    // adds nothing to it.
    let existing = &mut self.configs[id.0].links;
    let added: Vec<Link> = links
      .into_iter()
      .filter(|link| link.prev != id && existing.insert(*link))
      .collect();

    if is_new {
      let awaited = key
        .next_elem(grammar)
        .and_then(|elem| elem.kind().as_rule_ref());
      if let Some(target) = awaited {
        self.waiting[position].entry(target).or_default().push(id);
      }
      self.agenda.push_back(id);
    } else if !added.is_empty() && key.can_skip(grammar) {
      // Derivations found after the configuration was stepped reach its
      // skipped form too.
      self.insert(position, key.skipped(), added);
    }
  }

  /// Steps every configuration inserted at `position` exactly once.
  fn close(&mut self, position: usize) {
    self.nulled.clear();
    while let Some(id) = self.agenda.pop_front() {
      self.step(position, id);
    }
  }

  /// Applies prediction, skipping and completion to one configuration.
  fn step(&mut self, position: usize, id: ConfigId) {
    let grammar = self.grammar;
    let key = self.configs[id.0].key;

    if key.is_complete(grammar) {
      if key.origin == position {
        self.nulled.entry(key.rule).or_default().push(id);
      }
      let waiters = self.waiters(key.origin, key.rule).to_vec();
      for waiter in waiters {
        self.advance(position, waiter, id);
      }
      return;
    }

    let predicted = key
      .next_elem(grammar)
      .and_then(|elem| elem.kind().as_rule_ref());
    if let Some(target) = predicted {
      for alt in 0..grammar.rule_at(target).alternatives().len() {
        self.insert(position, ConfigKey::start(target, alt, position), None);
      }

      // Completions of `target` stepped before this configuration arrived.
      let nulled = self.nulled.get(&target).cloned().unwrap_or_default();
      for done in nulled {
        self.advance(position, id, done);
      }
    }

    if key.can_skip(grammar) {
      let links: Vec<_> = self.configs[id.0].links.iter().copied().collect();
      self.insert(position, key.skipped(), links);
    }
  }

  /// Moves `waiter` past the rule completed by `done`.
  fn advance(&mut self, position: usize, waiter: ConfigId, done: ConfigId) {
    let waiter_key = self.configs[waiter.0].key;
    self.insert(
      position,
      waiter_key.advanced(),
      Some(Link {
        prev: waiter,
        elem_index: waiter_key.index,
        child: Child::Rule(done),
      }),
    );
  }

  fn scan(&mut self, position: usize) {
    let grammar = self.grammar;
    let token_type = self.tokens[position].token_type();
    let scanned: Vec<_> = self.states[position]
      .iter()
      .filter(|(key, _)| {
        key.next_elem(grammar).map_or(false, |elem| {
          elem.kind().is_terminal() && elem.kind().matches(token_type)
        })
      })
      .map(|(key, id)| (*key, *id))
      .collect();

    for (key, id) in scanned {
      self.insert(
        position + 1,
        key.advanced(),
        Some(Link {
          prev: id,
          elem_index: key.index,
          child: Child::Token(position),
        }),
      );
    }
  }

  /// The configurations at `position` whose next element refers to `rule`.
  fn waiters(&self, position: usize, rule: RuleId) -> &[ConfigId] {
    self.waiting[position]
      .get(&rule)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  fn is_root(&self, key: &ConfigKey) -> bool {
    key.rule == self.rule && key.origin == 0
  }

  pub fn grammar(&self) -> &'g Grammar {
    self.grammar
  }

  pub fn tokens(&self) -> &'t [Token] {
    self.tokens
  }

  /// The number of chart positions, one more than the number of tokens.
  pub fn positions(&self) -> usize {
    self.states.len()
  }

  /// The chart position a configuration belongs to.
  pub fn position(&self, id: ConfigId) -> usize {
    self.configs[id.0].position
  }

  pub fn links(&self, id: ConfigId) -> impl Iterator<Item = &Link> {
    self.configs[id.0].links.iter()
  }

  /// Configurations at `position` whose next element is a terminal.
  pub fn configs_expecting_terminal(&self, position: usize) -> Vec<ConfigId> {
    let grammar = self.grammar;
    self
      .states
      .get(position)
      .into_iter()
      .flat_map(|state| state.iter())
      .filter(|(key, _)| {
        key
          .next_elem(grammar)
          .map_or(false, |elem| elem.kind().is_terminal())
      })
      .map(|(_, id)| *id)
      .collect()
  }

  /// The element a configuration is about to match, if any.
  pub fn expected_element(&self, id: ConfigId) -> Option<&'g Element> {
    self.configs[id.0].key.next_elem(self.grammar)
  }

  /// The last position at which the start rule is complete.
  pub fn end_of_match(&self) -> Option<usize> {
    let grammar = self.grammar;
    (0..self.states.len()).rev().find(|pos| {
      self.states[*pos]
        .keys()
        .any(|key| self.is_root(key) && key.is_complete(grammar))
    })
  }

  /// True if all tokens form a complete match of the start rule.
  pub fn accepts(&self) -> bool {
    self.end_of_match() == Some(self.tokens.len())
  }

  /// The number of elements parsed by a configuration, following the first
  /// derivation where there are several.
  pub fn parsed_count(&self, id: ConfigId) -> usize {
    let mut count = 0;
    let mut curr = id;
    while let Some(link) = self.configs[curr.0].links.iter().next() {
      count += 1;
      curr = link.prev;
    }

    count
  }

  /// Closes `id` as if the input ended at its position with the expected
  /// element matched, and returns every path from it up to a configuration
  /// of the start rule. No more than `max_paths` paths are returned.
  pub fn assume_completed(
    &self,
    id: ConfigId,
    max_paths: usize,
  ) -> Vec<ExpectedPath> {
    let key = self.configs[id.0].key;
    let mut paths = Vec::new();
    if key.next_elem(self.grammar).is_none() {
      return paths;
    }

    let mut path = ExpectedPath::new();
    path.push_back(self.level(id, &key));
    self.climb(path, key, &mut paths, max_paths);
    log::trace!("Assumed {:?} completed: {} paths.", id, paths.len());
    paths
  }

  fn level(&self, id: ConfigId, key: &ConfigKey) -> Level {
    Level {
      config: id,
      rule: key.rule,
      alt: key.alt,
      elem_index: key.index,
      parsed_count: self.parsed_count(id) + 1,
      origin: key.origin,
    }
  }

  fn climb(
    &self,
    path: ExpectedPath,
    top: ConfigKey,
    paths: &mut Vec<ExpectedPath>,
    max_paths: usize,
  ) {
    if paths.len() >= max_paths {
      return;
    }
    if self.is_root(&top) {
      paths.push(path);
      return;
    }

    let mut waiters: Vec<_> = self
      .waiters(top.origin, top.rule)
      .iter()
      .map(|id| (self.configs[id.0].key, *id))
      .collect();
    waiters.sort();

    for (waiter_key, waiter) in waiters {
      if paths.len() >= max_paths {
        return;
      }
      if path.iter().any(|level| level.config == waiter) {
        continue;
      }

      let mut next = path.clone();
      next.push_back(self.level(waiter, &waiter_key));
      self.climb(next, waiter_key, paths, max_paths);
    }
  }
}

/// The number of tokens at the start of `tokens` that `element` matches,
/// repeating it as its multiplicity allows.
pub fn match_distance(grammar: &Grammar, element: &Element, tokens: &[Token]) -> usize {
  let mut pos = 0;
  loop {
    let step = match element.kind() {
      ElementKind::RuleRef { rule, .. } => {
        Chart::parse(grammar, *rule, &tokens[pos..])
          .end_of_match()
          .unwrap_or(0)
      }
      kind => tokens
        .get(pos)
        .map_or(0, |token| kind.matches(token.token_type()) as usize),
    };

    pos += step;
    if step == 0 || !element.multiplicity().is_repeatable() {
      return pos;
    }
  }
}

#[cfg(test)]
mod test {
  use {
    super::*,
    crate::{
      grammar::{build, examples, TokenTable, TokenType},
      lexer::{Channel, SimpleLexerSpec, Tokenizer},
    },
    std::time::{Duration, Instant},
  };

  fn lex(grammar: &Grammar, text: &str) -> Vec<Token> {
    let spec = SimpleLexerSpec::new(grammar.token_table().clone())
      .identifier("NAME")
      .unwrap();
    Tokenizer::new(spec).tokenize(text).unwrap()
  }

  fn expected_names(chart: &Chart, position: usize) -> Vec<String> {
    chart
      .configs_expecting_terminal(position)
      .into_iter()
      .map(|id| match chart.expected_element(id).unwrap().kind() {
        ElementKind::Literal { text, .. } => format!("'{}'", text),
        ElementKind::TokenRule { name, .. } => name.to_string(),
        other => format!("{:?}", other),
      })
      .collect()
  }

  #[test]
  fn test_accepts_full_call() {
    let g = examples::make_call_grammar().unwrap();
    let tokens = lex(&g, "foo(a, b)");
    let chart = Chart::parse_rule(&g, "call", &tokens).unwrap();
    assert_eq!(chart.positions(), 7);
    assert!(chart.accepts());
  }

  #[test]
  fn test_prefix_expectations() {
    let g = examples::make_call_grammar().unwrap();
    let tokens = lex(&g, "foo(");
    let chart = Chart::parse_rule(&g, "call", &tokens).unwrap();
    assert!(!chart.accepts());
    assert_eq!(chart.end_of_match(), None);

    assert_eq!(expected_names(&chart, 0), vec!["NAME"]);
    assert_eq!(expected_names(&chart, 1), vec!["'('"]);
    let mut last = expected_names(&chart, 2);
    last.sort();
    assert_eq!(last, vec!["')'", "NAME"]);
  }

  #[test]
  fn test_dead_prefix_leaves_empty_positions() {
    let g = examples::make_call_grammar().unwrap();
    let tokens = lex(&g, "foo ) bar");
    let chart = Chart::parse_rule(&g, "call", &tokens).unwrap();
    assert_eq!(chart.positions(), 4);
    assert_eq!(chart.configs_expecting_terminal(1).len(), 1);
    assert!(chart.configs_expecting_terminal(2).is_empty());
    assert!(chart.configs_expecting_terminal(3).is_empty());
    assert!(chart.configs_expecting_terminal(9).is_empty());
  }

  #[test]
  fn test_unknown_rule() {
    let g = examples::make_call_grammar().unwrap();
    assert_eq!(
      Chart::parse_rule(&g, "nope", &[]).unwrap_err(),
      RuleNotFound("nope".to_string())
    );
  }

  #[test]
  fn test_left_recursion_and_empty_alternatives() {
    let g = examples::make_expr_grammar().unwrap();
    for text in &["a", "a!", "a + b", "a! + b + c!"] {
      let tokens = lex(&g, text);
      let chart = Chart::parse_rule(&g, "expr", &tokens).unwrap();
      assert!(chart.accepts(), "{}", text);
    }

    let tokens = lex(&g, "a + + b");
    let chart = Chart::parse_rule(&g, "expr", &tokens).unwrap();
    assert!(!chart.accepts());
    assert_eq!(chart.end_of_match(), Some(1));
  }

  #[test]
  fn test_right_recursion_scales() {
    let g = examples::make_list_grammar().unwrap();
    let text = vec!["a"; 400].join(" ");
    let tokens = lex(&g, &text);
    assert_eq!(tokens.len(), 400);

    let start = Instant::now();
    let chart = Chart::parse_rule(&g, "list", &tokens).unwrap();
    assert!(chart.accepts());

    let expecting = chart.configs_expecting_terminal(400);
    assert_eq!(expecting.len(), 2);
    for id in expecting {
      let paths = chart.assume_completed(id, 16);
      assert_eq!(paths.len(), 1);
      assert_eq!(paths[0].len(), 401);
    }
    assert!(start.elapsed() < Duration::from_secs(5));
  }

  #[test]
  fn test_empty_completion_reaches_later_waiters() {
    let mut tokens = TokenTable::new();
    tokens
      .add_literal("x", TokenType(1))
      .add_rule("NAME", TokenType(2));
    // s: opt opt NAME ; opt: 'x' | ;
    let g = build(tokens, |gb| {
      gb.add_rule("s", |rb| {
        rb.add_alt(|ab| {
          ab.add_rule_ref("opt").add_rule_ref("opt").add_token("NAME");
        });
      })
      .add_rule("opt", |rb| {
        rb.add_alt(|ab| {
          ab.add_literal("x");
        })
        .add_alt(|_| {});
      });
    })
    .unwrap();

    let chart = Chart::parse_rule(&g, "s", &[]).unwrap();
    let mut names = expected_names(&chart, 0);
    names.sort();
    names.dedup();
    assert_eq!(names, vec!["'x'", "NAME"]);

    for text in &["b", "x b", "x x b"] {
      let tokens = lex(&g, text);
      let chart = Chart::parse_rule(&g, "s", &tokens).unwrap();
      assert!(chart.accepts(), "{}", text);
    }
  }

  #[test]
  fn test_negated_set_accepts_unknown_ids() {
    let g = examples::make_negated_grammar().unwrap();
    let tok = |tt: i32, start: usize| {
      Token::new(TokenType(tt), "x", start, Channel::DEFAULT)
    };

    let accepted = vec![tok(99, 0), tok(4, 1), tok(0, 2), tok(3, 3)];
    let chart = Chart::parse_rule(&g, "stmt", &accepted).unwrap();
    assert!(chart.accepts());

    for excluded in &[1, 2] {
      let rejected = vec![tok(4, 0), tok(*excluded, 1), tok(3, 2)];
      let chart = Chart::parse_rule(&g, "stmt", &rejected).unwrap();
      assert!(!chart.accepts());
    }
  }

  #[test]
  fn test_assume_completed_walks_to_root() {
    let g = examples::make_call_grammar().unwrap();
    let tokens = lex(&g, "foo(");
    let chart = Chart::parse_rule(&g, "call", &tokens).unwrap();

    let args_rule = g.rule("args").unwrap().id();
    let in_args = chart
      .configs_expecting_terminal(2)
      .into_iter()
      .find(|id| chart.configs[id.0].key.rule == args_rule)
      .unwrap();

    let paths = chart.assume_completed(in_args, 16);
    assert_eq!(paths.len(), 1);
    let path = &paths[0];
    assert_eq!(path.len(), 2);
    assert_eq!(path[0].rule(), args_rule);
    assert_eq!(path[0].elem_index(), 0);
    assert_eq!(path[0].parsed_count(), 1);
    assert_eq!(path[1].rule(), g.rule("call").unwrap().id());
    assert_eq!(path[1].elem_index(), 2);
    assert_eq!(path[1].parsed_count(), 3);
    assert_eq!(path[1].origin(), 0);
  }

  #[test]
  fn test_assume_completed_is_capped() {
    let g = examples::make_expr_grammar().unwrap();
    let tokens = lex(&g, "a +");
    let chart = Chart::parse_rule(&g, "expr", &tokens).unwrap();

    let expecting = chart.configs_expecting_terminal(2);
    assert_eq!(expecting.len(), 1);
    assert_eq!(chart.assume_completed(expecting[0], 16).len(), 1);
    assert!(chart.assume_completed(expecting[0], 0).is_empty());
  }

  #[test]
  fn test_match_distance() {
    let g = examples::make_call_grammar().unwrap();
    let tokens = lex(&g, "a, b, c) x");
    let call = g.rule("call").unwrap().alternative(0);
    let args = g.rule("args").unwrap().alternative(0);

    assert_eq!(match_distance(&g, &call.elements()[0], &tokens), 1);
    assert_eq!(match_distance(&g, &call.elements()[1], &tokens), 0);
    assert_eq!(match_distance(&g, &call.elements()[2], &tokens), 5);
    assert_eq!(match_distance(&g, &args.elements()[1], &tokens[1..]), 4);
    assert_eq!(match_distance(&g, &call.elements()[2], &[]), 0);
  }
}
