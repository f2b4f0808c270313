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

use {
  super::input::InputSuggestion,
  crate::{
    grammar::{Alternative, Element, Grammar, Multiplicity, Rule},
    parsers::{ExpectedPath, Level},
  },
};

/// An element on a path from the element expecting input to the root of the
/// parse, with access to the elements enclosing it.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct ParentedElement<'g> {
  #[derivative(Debug = "ignore")]
  grammar: &'g Grammar,
  path: ExpectedPath,
  depth: usize,
}

impl<'g> ParentedElement<'g> {
  pub(crate) fn new(grammar: &'g Grammar, path: ExpectedPath, depth: usize) -> Self {
    debug_assert!(depth < path.len());
    ParentedElement {
      grammar,
      path,
      depth,
    }
  }

  pub fn grammar(&self) -> &'g Grammar {
    self.grammar
  }

  fn level(&self) -> &Level {
    &self.path[self.depth]
  }

  /// The rule whose alternative contains this element.
  pub fn rule(&self) -> &'g Rule {
    self.grammar.rule_at(self.level().rule())
  }

  pub fn alternative(&self) -> &'g Alternative {
    self.rule().alternative(self.level().alt())
  }

  pub fn element(&self) -> &'g Element {
    &self.alternative().elements()[self.level().elem_index()]
  }

  pub fn index_in_alternative(&self) -> usize {
    self.level().elem_index()
  }

  /// How many elements of the enclosing alternative are parsed, this one
  /// included.
  pub fn parsed_count(&self) -> usize {
    self.level().parsed_count()
  }

  /// How far above the element expecting input this element is. Zero for
  /// that element itself.
  pub fn depth(&self) -> usize {
    self.depth
  }

  /// The element whose rule contains this element. `None` at the root.
  pub fn parent(&self) -> Option<ParentedElement<'g>> {
    if self.depth + 1 < self.path.len() {
      Some(ParentedElement::new(
        self.grammar,
        self.path.clone(),
        self.depth + 1,
      ))
    } else {
      None
    }
  }

  /// The mandatory literals following this element, ignoring the input.
  ///
  /// The element must match exactly once (or at most once). If it ends its
  /// alternative, the element enclosing it is considered in turn.
  pub fn mandatories_after(&self) -> Vec<String> {
    mandatories_after(self.grammar, &self.path, self.depth, self.index_in_alternative())
  }
}

fn mandatories_after(
  grammar: &Grammar,
  path: &ExpectedPath,
  depth: usize,
  index: usize,
) -> Vec<String> {
  let level = &path[depth];
  let elements = grammar
    .rule_at(level.rule())
    .alternative(level.alt())
    .elements();

  match elements[index].multiplicity() {
    Multiplicity::ExactlyOne | Multiplicity::ZeroOrOne => {}
    _ => return Vec::new(),
  }

  if index + 1 == elements.len() {
    return match path.get(depth + 1) {
      Some(parent) => {
        mandatories_after(grammar, path, depth + 1, parent.elem_index())
      }
      None => Vec::new(),
    };
  }

  let next = &elements[index + 1];
  match next.multiplicity() {
    Multiplicity::ExactlyOne | Multiplicity::OneOrMore => {
      let scan = grammar.scan_mandatories(next);
      let stop = scan.is_stop();
      let mut literals = scan.into_mandatories();
      if !stop {
        literals.extend(mandatories_after(grammar, path, depth, index + 1));
      }
      literals
    }
    _ => Vec::new(),
  }
}

/// Supplies the raw suggestions for an element expecting input.
///
/// `match_with` is the text typed at the element's position so far. An
/// empty result passes the request to the enclosing element. Errors are
/// logged, and treated the same as an empty result.
pub trait SuggestionSource: Send + Sync {
  fn suggest(
    &self,
    element: &ParentedElement<'_>,
    match_with: &str,
  ) -> anyhow::Result<Vec<InputSuggestion>>;
}

impl<F> SuggestionSource for F
where
  F: Fn(&ParentedElement<'_>, &str) -> anyhow::Result<Vec<InputSuggestion>>
    + Send
    + Sync,
{
  fn suggest(
    &self,
    element: &ParentedElement<'_>,
    match_with: &str,
  ) -> anyhow::Result<Vec<InputSuggestion>> {
    self(element, match_with)
  }
}
