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

//! The boundary to the lexer that turns input text into tokens.
//!
//! Any lexer can be plugged in by implementing `LexerFactory`. The
//! `Tokenizer` drives it to the end of the input and keeps only the tokens
//! the grammar sees.

mod simple;

pub use simple::SimpleLexerSpec;

use {
  crate::grammar::TokenType,
  std::sync::Arc,
};

/// The channel a token was emitted on. Only tokens on the default channel
/// take part in parsing.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Channel(pub u32);

impl Channel {
  pub const DEFAULT: Channel = Channel(0);
  pub const HIDDEN: Channel = Channel(1);
}

/// A token produced by a lexer. Offsets are byte offsets into the lexed
/// text; `end` is exclusive.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
  token_type: TokenType,
  text: String,
  start: usize,
  end: usize,
  channel: Channel,
}

impl Token {
  pub fn new(
    token_type: TokenType,
    text: impl Into<String>,
    start: usize,
    channel: Channel,
  ) -> Self {
    let text = text.into();
    Token {
      token_type,
      end: start + text.len(),
      text,
      start,
      channel,
    }
  }

  /// The end-of-input sentinel for text of the given length.
  pub fn eof(len: usize) -> Self {
    Token::new(TokenType::EOF, "", len, Channel::DEFAULT)
  }

  pub fn token_type(&self) -> TokenType {
    self.token_type
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn start(&self) -> usize {
    self.start
  }

  pub fn end(&self) -> usize {
    self.end
  }

  pub fn channel(&self) -> Channel {
    self.channel
  }

  pub fn is_eof(&self) -> bool {
    self.token_type.is_eof()
  }
}

#[derive(thiserror::Error, Debug)]
pub enum LexError {
  #[error("lexer spec names token `{0}`, which is not in the token table")]
  UnknownToken(String),
  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

/// A lexer over a single piece of text.
pub trait Lexer {
  /// Returns the next token. Once the text is exhausted, returns the `EOF`
  /// token on every call.
  fn next_token(&mut self) -> Result<Token, LexError>;
}

/// Creates lexers. Shared by every completion request.
pub trait LexerFactory: Send + Sync {
  fn create<'a>(&'a self, text: &'a str) -> Result<Box<dyn Lexer + 'a>, LexError>;
}

/// Turns text into the ordered list of tokens seen by the parser.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Tokenizer {
  #[derivative(Debug = "ignore")]
  factory: Arc<dyn LexerFactory>,
}

impl Tokenizer {
  pub fn new(factory: impl LexerFactory + 'static) -> Self {
    Tokenizer {
      factory: Arc::new(factory),
    }
  }

  pub fn from_arc(factory: Arc<dyn LexerFactory>) -> Self {
    Tokenizer { factory }
  }

  /// Lazily lexes `text`. The iterator ends before the `EOF` token, and
  /// after the first error.
  pub fn tokens<'a>(&'a self, text: &'a str) -> Result<Tokens<'a>, LexError> {
    Ok(Tokens {
      lexer: self.factory.create(text)?,
      done: false,
    })
  }

  pub fn tokenize(&self, text: &str) -> Result<Vec<Token>, LexError> {
    self.tokens(text)?.collect()
  }
}

pub struct Tokens<'a> {
  lexer: Box<dyn Lexer + 'a>,
  done: bool,
}

impl<'a> Iterator for Tokens<'a> {
  type Item = Result<Token, LexError>;

  fn next(&mut self) -> Option<Self::Item> {
    while !self.done {
      match self.lexer.next_token() {
        Ok(token) if token.is_eof() => self.done = true,
        Ok(token) if token.channel() != Channel::DEFAULT => {}
        Ok(token) => return Some(Ok(token)),
        Err(e) => {
          self.done = true;
          return Some(Err(e));
        }
      }
    }

    None
  }
}
