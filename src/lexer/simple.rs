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

//! A table-driven lexer for simple languages.

use {
  super::{Channel, LexError, Lexer, LexerFactory, Token},
  crate::grammar::{TokenTable, TokenType},
};

fn is_word_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_'
}

/// Describes a lexer by the token table's literals plus a few common token
/// classes.
///
/// Literals are matched longest first. A literal ending in a word character
/// only matches if the input does not continue with a word character, so
/// `for` is not found at the start of `format`. Text no class accepts is
/// emitted with `TokenType::INVALID`, so lexing never fails.
#[derive(Clone, Debug)]
pub struct SimpleLexerSpec {
  tokens: TokenTable,
  literals: Vec<(String, TokenType)>,
  whitespace: TokenType,
  identifier: Option<TokenType>,
  number: Option<TokenType>,
  quoted: Option<TokenType>,
}

impl SimpleLexerSpec {
  pub fn new(tokens: TokenTable) -> Self {
    let mut literals: Vec<_> = tokens
      .literals()
      .map(|(lit, tt)| (lit.str().to_string(), tt))
      .filter(|(lit, _)| !lit.is_empty())
      .collect();
    literals.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then(a.cmp(b)));

    let whitespace = tokens.rule_type("WS").unwrap_or(TokenType::INVALID);
    SimpleLexerSpec {
      tokens,
      literals,
      whitespace,
      identifier: None,
      number: None,
      quoted: None,
    }
  }

  fn lookup(&self, name: &str) -> Result<Option<TokenType>, LexError> {
    self
      .tokens
      .rule_type(name)
      .map(Some)
      .ok_or_else(|| LexError::UnknownToken(name.to_string()))
  }

  /// Emits identifiers (`[\p{Alphabetic}_][\p{Alphanumeric}_]*`) as the
  /// named token.
  pub fn identifier(mut self, name: &str) -> Result<Self, LexError> {
    self.identifier = self.lookup(name)?;
    Ok(self)
  }

  /// Emits decimal numbers with an optional fraction as the named token.
  pub fn number(mut self, name: &str) -> Result<Self, LexError> {
    self.number = self.lookup(name)?;
    Ok(self)
  }

  /// Emits double-quoted strings, with backslash escapes, as the named
  /// token. An unterminated string runs to the end of the input.
  pub fn quoted_string(mut self, name: &str) -> Result<Self, LexError> {
    self.quoted = self.lookup(name)?;
    Ok(self)
  }

  fn match_literal(&self, rest: &str) -> Option<(usize, TokenType)> {
    self
      .literals
      .iter()
      .filter(|(lit, _)| rest.starts_with(lit.as_str()))
      .find(|(lit, _)| {
        let ends_in_word = lit.chars().last().map_or(false, is_word_char);
        let next_is_word = rest[lit.len()..]
          .chars()
          .next()
          .map_or(false, is_word_char);
        !(ends_in_word && next_is_word)
      })
      .map(|(lit, tt)| (lit.len(), *tt))
  }
}

impl LexerFactory for SimpleLexerSpec {
  fn create<'a>(&'a self, text: &'a str) -> Result<Box<dyn Lexer + 'a>, LexError> {
    Ok(Box::new(SimpleLexer {
      spec: self,
      text,
      pos: 0,
    }))
  }
}

struct SimpleLexer<'a> {
  spec: &'a SimpleLexerSpec,
  text: &'a str,
  pos: usize,
}

fn prefix_len(rest: &str, mut pred: impl FnMut(char) -> bool) -> usize {
  rest
    .char_indices()
    .find(|(_, c)| !pred(*c))
    .map_or(rest.len(), |(i, _)| i)
}

fn quoted_len(rest: &str) -> usize {
  let mut escaped = false;
  for (i, c) in rest.char_indices().skip(1) {
    match c {
      _ if escaped => escaped = false,
      '\\' => escaped = true,
      '"' => return i + 1,
      _ => {}
    }
  }

  rest.len()
}

fn number_len(rest: &str) -> usize {
  let int_len = prefix_len(rest, |c| c.is_ascii_digit());
  let frac = &rest[int_len..];
  if frac.starts_with('.') && frac[1..].starts_with(|c: char| c.is_ascii_digit())
  {
    int_len + 1 + prefix_len(&frac[1..], |c| c.is_ascii_digit())
  } else {
    int_len
  }
}

impl<'a> SimpleLexer<'a> {
  fn classify(&self, rest: &str, first: char) -> (usize, TokenType, Channel) {
    let spec = self.spec;

    if first.is_whitespace() {
      let len = prefix_len(rest, char::is_whitespace);
      return (len, spec.whitespace, Channel::HIDDEN);
    }

    if let (Some(tt), '"') = (spec.quoted, first) {
      return (quoted_len(rest), tt, Channel::DEFAULT);
    }

    if let Some((len, tt)) = spec.match_literal(rest) {
      return (len, tt, Channel::DEFAULT);
    }

    if let Some(tt) = spec.identifier {
      if first.is_alphabetic() || first == '_' {
        return (prefix_len(rest, is_word_char), tt, Channel::DEFAULT);
      }
    }

    if let Some(tt) = spec.number {
      if first.is_ascii_digit() {
        return (number_len(rest), tt, Channel::DEFAULT);
      }
    }

    let len = if is_word_char(first) {
      prefix_len(rest, is_word_char)
    } else {
      first.len_utf8()
    };
    (len, TokenType::INVALID, Channel::DEFAULT)
  }
}

impl<'a> Lexer for SimpleLexer<'a> {
  fn next_token(&mut self) -> Result<Token, LexError> {
    let rest = &self.text[self.pos..];
    let first = match rest.chars().next() {
      Some(c) => c,
      None => return Ok(Token::eof(self.text.len())),
    };

    let (len, token_type, channel) = self.classify(rest, first);
    let token = Token::new(token_type, &rest[..len], self.pos, channel);
    self.pos += len;
    Ok(token)
  }
}

#[cfg(test)]
mod test {
  use {super::*, crate::lexer::Tokenizer};

  fn tokenizer() -> Tokenizer {
    let mut tokens = TokenTable::new();
    tokens
      .add_literal("for", TokenType(1))
      .add_literal("forme", TokenType(2))
      .add_literal("(", TokenType(3))
      .add_literal("==", TokenType(4))
      .add_literal("=", TokenType(5))
      .add_rule("NAME", TokenType(6))
      .add_rule("NUMBER", TokenType(7))
      .add_rule("QUOTED", TokenType(8))
      .add_rule("WS", TokenType(9));

    let spec = SimpleLexerSpec::new(tokens)
      .identifier("NAME")
      .and_then(|s| s.number("NUMBER"))
      .and_then(|s| s.quoted_string("QUOTED"))
      .unwrap();
    Tokenizer::new(spec)
  }

  fn lex(text: &str) -> Vec<(i32, String)> {
    tokenizer()
      .tokenize(text)
      .unwrap()
      .into_iter()
      .map(|t| (t.token_type().0, t.text().to_string()))
      .collect()
  }

  #[test]
  fn test_keywords_respect_word_boundaries() {
    assert_eq!(lex("for"), vec![(1, "for".to_string())]);
    assert_eq!(lex("forme"), vec![(2, "forme".to_string())]);
    assert_eq!(lex("format"), vec![(6, "format".to_string())]);
    assert_eq!(
      lex("for("),
      vec![(1, "for".to_string()), (3, "(".to_string())]
    );
  }

  #[test]
  fn test_longest_literal_wins() {
    assert_eq!(
      lex("a==b=c"),
      vec![
        (6, "a".to_string()),
        (4, "==".to_string()),
        (6, "b".to_string()),
        (5, "=".to_string()),
        (6, "c".to_string()),
      ]
    );
  }

  #[test]
  fn test_numbers_and_strings() {
    assert_eq!(
      lex("3.25 \"a \\\" b\" \"open"),
      vec![
        (7, "3.25".to_string()),
        (8, "\"a \\\" b\"".to_string()),
        (8, "\"open".to_string()),
      ]
    );
    assert_eq!(
      lex("1."),
      vec![(7, "1".to_string()), (0, ".".to_string())]
    );
  }

  #[test]
  fn test_offsets_skip_whitespace() {
    let tokens = tokenizer().tokenize("  foo\t bar").unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!((tokens[0].start(), tokens[0].end()), (2, 5));
    assert_eq!((tokens[1].start(), tokens[1].end()), (7, 10));
  }

  #[test]
  fn test_unknown_text_is_invalid() {
    assert_eq!(
      lex("#é"),
      vec![(0, "#".to_string()), (6, "é".to_string())]
    );

    let bare = Tokenizer::new(SimpleLexerSpec::new(TokenTable::new()));
    let tokens = bare.tokenize("ab cd").unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].token_type(), TokenType::INVALID);
    assert_eq!(tokens[0].text(), "ab");
  }

  #[test]
  fn test_unknown_token_class_is_rejected() {
    assert!(matches!(
      SimpleLexerSpec::new(TokenTable::new()).identifier("NAME"),
      Err(LexError::UnknownToken(_))
    ));
  }
}
