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

//! Grammar-driven code completion.
//!
//! A `Grammar` is compiled once from rule declarations. For each request,
//! the text before the caret is lexed and parsed with an earley chart, and
//! every element that could accept the next token is offered to a
//! `SuggestionSource`. `CodeAssist` turns what the source returns into
//! edits of the input.

#[macro_use]
extern crate derivative;

pub mod assist;
pub mod grammar;
pub mod lexer;
pub mod parsers;
pub mod utils;

pub use {
  assist::{
    AssistConfig, AssistError, CodeAssist, ElementCompletion, InputCompletion,
    InputStatus, InputSuggestion, ParentedElement, SuggestionSource,
  },
  grammar::{build, Grammar, GrammarErrors, TokenTable, TokenType},
  lexer::{SimpleLexerSpec, Tokenizer},
};
