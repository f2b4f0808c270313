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

//! The text and edits exchanged with callers.

/// Input text with a caret. The caret is a byte offset.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct InputStatus {
  content: String,
  caret: usize,
}

impl InputStatus {
  pub fn new(content: impl Into<String>, caret: usize) -> Self {
    InputStatus {
      content: content.into(),
      caret,
    }
  }

  /// Input with the caret after its last character.
  pub fn at_end(content: impl Into<String>) -> Self {
    let content = content.into();
    let caret = content.len();
    InputStatus { content, caret }
  }

  pub fn content(&self) -> &str {
    &self.content
  }

  pub fn caret(&self) -> usize {
    self.caret
  }

  /// The text before the caret, or all of it if the caret is not a valid
  /// offset.
  pub fn content_before_caret(&self) -> &str {
    self.content.get(..self.caret).unwrap_or(&self.content)
  }
}

/// A raw suggestion returned by a suggestion source.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InputSuggestion {
  content: String,
  caret: Option<usize>,
  description: Option<String>,
}

impl InputSuggestion {
  pub fn new(content: impl Into<String>) -> Self {
    InputSuggestion {
      content: content.into(),
      caret: None,
      description: None,
    }
  }

  /// Places the caret inside the suggested text, marking a placeholder the
  /// user is expected to fill in.
  pub fn with_caret(mut self, caret: usize) -> Self {
    self.caret = Some(caret);
    self
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn content(&self) -> &str {
    &self.content
  }

  /// The caret offset within the content, if one was set explicitly.
  pub fn caret(&self) -> Option<usize> {
    self.caret
  }

  pub fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }
}

/// An edit ready to be applied to the input it was computed for.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InputCompletion {
  replace_begin: usize,
  replace_end: usize,
  replace_content: String,
  caret: usize,
  description: Option<String>,
}

impl InputCompletion {
  pub fn new(
    replace_begin: usize,
    replace_end: usize,
    replace_content: impl Into<String>,
    caret: usize,
    description: Option<String>,
  ) -> Self {
    InputCompletion {
      replace_begin,
      replace_end,
      replace_content: replace_content.into(),
      caret,
      description,
    }
  }

  pub fn replace_begin(&self) -> usize {
    self.replace_begin
  }

  pub fn replace_end(&self) -> usize {
    self.replace_end
  }

  pub fn replace_content(&self) -> &str {
    &self.replace_content
  }

  /// The caret offset in the completed text.
  pub fn caret(&self) -> usize {
    self.caret
  }

  pub fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }

  /// Applies the edit to `input`.
  pub fn complete(&self, input: &InputStatus) -> InputStatus {
    let content = input.content();
    let before = content.get(..self.replace_begin).unwrap_or(content);
    let after = content.get(self.replace_end..).unwrap_or("");
    InputStatus {
      content: format!("{}{}{}", before, self.replace_content, after),
      caret: self.caret,
    }
  }
}
