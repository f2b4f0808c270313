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

//! Provides base data structures to represent and work with Earley states.
//!
//! A chart position holds a set of configurations. Each configuration is a
//! position inside one alternative of a rule, plus the links recording how
//! it was reached. Configurations live in one arena per chart and refer to
//! each other by index.

use {
  crate::grammar::{Alternative, Element, Grammar, RuleId},
  std::collections::BTreeSet,
};

/// The index of a configuration in its chart.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ConfigId(pub(crate) usize);

/// Identifies a configuration within one chart position.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub(crate) struct ConfigKey {
  pub rule: RuleId,
  pub alt: usize,
  /// The element being matched, or the alternative's length once complete.
  pub index: usize,
  /// True once the element at `index` has matched at least once.
  pub matched: bool,
  /// The chart position this alternative started at.
  pub origin: usize,
}

impl ConfigKey {
  pub fn start(rule: RuleId, alt: usize, origin: usize) -> Self {
    ConfigKey {
      rule,
      alt,
      index: 0,
      matched: false,
      origin,
    }
  }

  pub fn alternative<'g>(&self, grammar: &'g Grammar) -> &'g Alternative {
    grammar.rule_at(self.rule).alternative(self.alt)
  }

  pub fn is_complete(&self, grammar: &Grammar) -> bool {
    self.index == self.alternative(grammar).elements().len()
  }

  /// The element at `index`, if it may still consume input.
  pub fn next_elem<'g>(&self, grammar: &'g Grammar) -> Option<&'g Element> {
    self
      .alternative(grammar)
      .element_at(self.index)
      .filter(|elem| !self.matched || elem.multiplicity().is_repeatable())
  }

  /// True if the configuration may move past the element at `index`
  /// without consuming more input.
  pub fn can_skip(&self, grammar: &Grammar) -> bool {
    self
      .alternative(grammar)
      .element_at(self.index)
      .map_or(false, |elem| {
        self.matched || elem.multiplicity().is_optional()
      })
  }

  pub fn skipped(&self) -> Self {
    ConfigKey {
      index: self.index + 1,
      matched: false,
      ..*self
    }
  }

  pub fn advanced(&self) -> Self {
    ConfigKey {
      matched: true,
      ..*self
    }
  }
}

/// What matched an element.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Child {
  /// The token at the given index of the parsed token list.
  Token(usize),
  /// A completed configuration of the referenced rule.
  Rule(ConfigId),
}

/// One way of reaching a configuration: the configuration before the match,
/// and what matched the element at `elem_index`.
///
/// A configuration with several links is ambiguous; all derivations share
/// the configuration instead of copying it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Link {
  pub(crate) prev: ConfigId,
  pub(crate) elem_index: usize,
  pub(crate) child: Child,
}

impl Link {
  pub fn prev(&self) -> ConfigId {
    self.prev
  }

  pub fn elem_index(&self) -> usize {
    self.elem_index
  }

  pub fn child(&self) -> Child {
    self.child
  }
}

#[derive(Clone, Debug)]
pub(crate) struct Config {
  pub key: ConfigKey,
  pub position: usize,
  pub links: BTreeSet<Link>,
}

impl Config {
  pub fn new(key: ConfigKey, position: usize) -> Self {
    Config {
      key,
      position,
      links: BTreeSet::new(),
    }
  }
}
