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

/// Limits applied to every completion request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssistConfig {
  max_tokens: usize,
  relex_budget: usize,
  max_match_tokens: usize,
  max_paths: usize,
}

impl Default for AssistConfig {
  fn default() -> Self {
    AssistConfig {
      max_tokens: 4096,
      relex_budget: 256,
      max_match_tokens: 64,
      max_paths: 256,
    }
  }
}

impl AssistConfig {
  /// The most tokens allowed before the caret. Longer inputs are rejected.
  pub fn max_tokens(&self) -> usize {
    self.max_tokens
  }

  /// How many extra lexing passes one request may spend on refining its
  /// completions. Once spent, the refinements are skipped.
  pub fn relex_budget(&self) -> usize {
    self.relex_budget
  }

  /// How many tokens after the replaced text are considered when extending
  /// the replaced range.
  pub fn max_match_tokens(&self) -> usize {
    self.max_match_tokens
  }

  /// The most root paths taken from one configuration expecting a terminal.
  pub fn max_paths(&self) -> usize {
    self.max_paths
  }

  pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
    self.max_tokens = max_tokens;
    self
  }

  pub fn with_relex_budget(mut self, relex_budget: usize) -> Self {
    self.relex_budget = relex_budget;
    self
  }

  pub fn with_max_match_tokens(mut self, max_match_tokens: usize) -> Self {
    self.max_match_tokens = max_match_tokens;
    self
  }

  pub fn with_max_paths(mut self, max_paths: usize) -> Self {
    self.max_paths = max_paths;
    self
  }
}
