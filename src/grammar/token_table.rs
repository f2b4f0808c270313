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

//! The mapping between token ids and their literal text or symbolic names.

use {
  super::GrammarError,
  crate::utils::Name,
  std::collections::BTreeMap,
};

/// The integer id of a token, as assigned by the lexer.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TokenType(pub i32);

impl TokenType {
  /// The reserved id of the end-of-input sentinel.
  pub const EOF: TokenType = TokenType(-1);

  /// The id given to text no token rule accepts.
  pub const INVALID: TokenType = TokenType(0);

  pub fn is_eof(self) -> bool {
    self == TokenType::EOF
  }
}

impl std::fmt::Display for TokenType {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A bidirectional mapping between token ids and literal strings or named
/// token rules.
///
/// `EOF` is always present as a named rule with id `TokenType::EOF`.
#[derive(Clone, Debug)]
pub struct TokenTable {
  by_literal: BTreeMap<Name, TokenType>,
  by_rule: BTreeMap<Name, TokenType>,
  rules_by_type: BTreeMap<TokenType, Name>,
  literals_by_type: BTreeMap<TokenType, Name>,
}

impl Default for TokenTable {
  fn default() -> Self {
    TokenTable::new()
  }
}

impl TokenTable {
  pub fn new() -> Self {
    let mut table = TokenTable {
      by_literal: BTreeMap::new(),
      by_rule: BTreeMap::new(),
      rules_by_type: BTreeMap::new(),
      literals_by_type: BTreeMap::new(),
    };
    table.add_rule("EOF", TokenType::EOF);
    table
  }

  /// Parses the contents of an ANTLR `.tokens` file.
  ///
  /// ```text
  /// NAME=1
  /// '('=2
  /// '=='=3
  /// ```
  pub fn parse(text: &str) -> Result<Self, GrammarError> {
    let mut table = TokenTable::new();
    for (line_no, line) in text.lines().enumerate() {
      let line = line.trim();
      if line.is_empty() {
        continue;
      }

      let malformed = || GrammarError::MalformedTokenLine {
        line: line_no + 1,
        text: line.to_string(),
      };

      let split = line.rfind('=').ok_or_else(malformed)?;
      let (key, value) = (&line[..split], &line[split + 1..]);
      let token_type = value
        .trim()
        .parse::<i32>()
        .map(TokenType)
        .map_err(|_| malformed())?;

      if key.len() >= 2 && key.starts_with('\'') && key.ends_with('\'') {
        table.add_literal(&key[1..key.len() - 1], token_type);
      } else if !key.is_empty() && !key.starts_with('\'') {
        table.add_rule(key, token_type);
      } else {
        return Err(malformed());
      }
    }

    Ok(table)
  }

  pub fn add_literal(
    &mut self,
    literal: &str,
    token_type: TokenType,
  ) -> &mut Self {
    let literal = Name::new(literal);
    self.literals_by_type.insert(token_type, literal.clone());
    self.by_literal.insert(literal, token_type);
    self
  }

  pub fn add_rule(&mut self, name: &str, token_type: TokenType) -> &mut Self {
    let name = Name::new(name);
    self.rules_by_type.insert(token_type, name.clone());
    self.by_rule.insert(name, token_type);
    self
  }

  pub fn literal_type(&self, literal: &str) -> Option<TokenType> {
    self.by_literal.get(literal).copied()
  }

  pub fn rule_type(&self, name: &str) -> Option<TokenType> {
    self.by_rule.get(name).copied()
  }

  /// Returns the symbolic name of a token rule with the given id.
  pub fn rule_name(&self, token_type: TokenType) -> Option<&Name> {
    self.rules_by_type.get(&token_type)
  }

  pub fn literal(&self, token_type: TokenType) -> Option<&Name> {
    self.literals_by_type.get(&token_type)
  }

  /// Iterates over all literals, together with their ids.
  pub fn literals(&self) -> impl Iterator<Item = (&Name, TokenType)> {
    self.by_literal.iter().map(|(lit, tt)| (lit, *tt))
  }
}
