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

//! Forward scan for literals that must follow an element.

use {
  super::base::{Element, ElementKind, Grammar, Multiplicity, RuleId, RuleOrigin},
  std::collections::BTreeSet,
};

/// The literals an element is known to start with, and whether the scan hit
/// a point past which the input can not be predicted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MandatoryScan {
  mandatories: Vec<String>,
  stop: bool,
}

impl MandatoryScan {
  pub fn mandatories(&self) -> &[String] {
    &self.mandatories
  }

  pub fn into_mandatories(self) -> Vec<String> {
    self.mandatories
  }

  /// True if something other than the collected literals may follow them.
  pub fn is_stop(&self) -> bool {
    self.stop
  }
}

struct Scanner<'g> {
  grammar: &'g Grammar,
  visited: BTreeSet<RuleId>,
  mandatories: Vec<String>,
}

impl<'g> Scanner<'g> {
  /// Returns true if the scan must stop after this element.
  fn scan_element(&mut self, element: &Element) -> bool {
    match element.multiplicity() {
      Multiplicity::ExactlyOne => self.scan_kind(element.kind()),
      Multiplicity::OneOrMore => {
        self.scan_kind(element.kind());
        true
      }
      Multiplicity::ZeroOrOne | Multiplicity::ZeroOrMore => true,
    }
  }

  fn scan_kind(&mut self, kind: &ElementKind) -> bool {
    match kind {
      ElementKind::Literal { text, .. } => {
        self.mandatories.push(text.str().to_string());
        false
      }
      ElementKind::TokenRule { name, .. } => {
        match self.grammar.rule(name.str()) {
          Some(rule) if rule.origin() == RuleOrigin::Lexer => {
            self.scan_rule(rule.id())
          }
          _ => true,
        }
      }
      ElementKind::RuleRef { rule, .. } => self.scan_rule(*rule),
      ElementKind::NotSet(_) | ElementKind::Wildcard => true,
    }
  }

  fn scan_rule(&mut self, id: RuleId) -> bool {
    if !self.visited.insert(id) {
      return true;
    }

    let rule = self.grammar.rule_at(id);
    match rule.alternatives() {
      [alt] => alt.elements().iter().any(|elem| self.scan_element(elem)),
      _ => true,
    }
  }
}

impl Grammar {
  /// Collects the literals that matching `element` must produce, as long as
  /// they are fixed.
  ///
  /// Rules with a single alternative are scanned through, as are token rules
  /// spelled by a lexer rule of the grammar. Anything with a choice stops
  /// the scan.
  pub fn scan_mandatories(&self, element: &Element) -> MandatoryScan {
    let mut scanner = Scanner {
      grammar: self,
      visited: BTreeSet::new(),
      mandatories: Vec::new(),
    };
    let stop = scanner.scan_element(element);
    MandatoryScan {
      mandatories: scanner.mandatories,
      stop,
    }
  }
}
