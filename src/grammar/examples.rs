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

//! Small grammars used by tests and documentation.

use super::{
  build,
  builder::{block, literal, not_set, rule, token, SetItem},
  Grammar, GrammarErrors, TokenTable, TokenType,
};

pub fn call_tokens() -> TokenTable {
  let mut tokens = TokenTable::new();
  tokens
    .add_rule("NAME", TokenType(1))
    .add_literal("(", TokenType(2))
    .add_literal(")", TokenType(3))
    .add_literal(",", TokenType(4))
    .add_rule("WS", TokenType(5));
  tokens
}

/// ```text
/// call: NAME '(' args? ')' ;
/// args: NAME (',' NAME)* ;
/// ```
pub fn make_call_grammar() -> Result<Grammar, GrammarErrors> {
  build(call_tokens(), |gb| {
    gb.add_rule("call", |rb| {
      rb.add_alt(|ab| {
        ab.add_token("NAME")
          .add_literal("(")
          .add(rule("args").suffix("?"))
          .add_literal(")");
      });
    })
    .add_rule("args", |rb| {
      rb.add_alt(|ab| {
        ab.add_token("NAME").add(
          block(|bb| {
            bb.add_alt(|ab| {
              ab.add_literal(",").add_token("NAME");
            });
          })
          .suffix("*"),
        );
      });
    });
  })
}

/// ```text
/// alt: 'for' | 'forme' ;
/// ```
pub fn make_keyword_grammar() -> Result<Grammar, GrammarErrors> {
  let mut tokens = TokenTable::new();
  tokens
    .add_literal("for", TokenType(1))
    .add_literal("forme", TokenType(2))
    .add_rule("NAME", TokenType(3));

  build(tokens, |gb| {
    gb.add_rule("alt", |rb| {
      rb.add_alt(|ab| {
        ab.add_literal("for");
      })
      .add_alt(|ab| {
        ab.add_literal("forme");
      });
    });
  })
}

/// ```text
/// query: criteria+ ;
/// criteria: 'key' ':' value ;
/// value: NAME | QUOTED ;
/// ```
pub fn make_query_grammar() -> Result<Grammar, GrammarErrors> {
  let mut tokens = TokenTable::new();
  tokens
    .add_literal("key", TokenType(1))
    .add_literal(":", TokenType(2))
    .add_rule("NAME", TokenType(3))
    .add_rule("QUOTED", TokenType(4));

  build(tokens, |gb| {
    gb.add_rule("query", |rb| {
      rb.add_alt(|ab| {
        ab.add(rule("criteria").suffix("+"));
      });
    })
    .add_rule("criteria", |rb| {
      rb.add_alt(|ab| {
        ab.add(literal("key").label("k"))
          .add_literal(":")
          .add(rule("value").label("v"));
      });
    })
    .add_rule("value", |rb| {
      rb.add_labeled_alt("plain", |ab| {
        ab.add_token("NAME");
      })
      .add_labeled_alt("quoted", |ab| {
        ab.add_token("QUOTED");
      });
    });
  })
}

/// Two alternatives that share their first two elements.
///
/// ```text
/// pair: NAME ',' NAME | NAME ',' NUMBER ;
/// ```
pub fn make_pair_grammar() -> Result<Grammar, GrammarErrors> {
  let mut tokens = TokenTable::new();
  tokens
    .add_rule("NAME", TokenType(1))
    .add_rule("NUMBER", TokenType(2))
    .add_literal(",", TokenType(3));

  build(tokens, |gb| {
    gb.add_rule("pair", |rb| {
      rb.add_alt(|ab| {
        ab.add_token("NAME").add_literal(",").add_token("NAME");
      })
      .add_alt(|ab| {
        ab.add_token("NAME").add_literal(",").add_token("NUMBER");
      });
    });
  })
}

/// The same language spelled with an inline block and with a named rule.
///
/// ```text
/// blocked: 'x' ('a' 'b') ;
/// named: 'x' ab ;
/// ab: 'a' 'b' ;
/// ```
pub fn make_block_grammar() -> Result<Grammar, GrammarErrors> {
  let mut tokens = TokenTable::new();
  tokens
    .add_literal("x", TokenType(1))
    .add_literal("a", TokenType(2))
    .add_literal("b", TokenType(3));

  build(tokens, |gb| {
    gb.add_rule("blocked", |rb| {
      rb.add_alt(|ab| {
        ab.add_literal("x").add(block(|bb| {
          bb.add_alt(|ab| {
            ab.add_literal("a").add_literal("b");
          });
        }));
      });
    })
    .add_rule("named", |rb| {
      rb.add_alt(|ab| {
        ab.add_literal("x").add_rule_ref("ab");
      });
    })
    .add_rule("ab", |rb| {
      rb.add_alt(|ab| {
        ab.add_literal("a").add_literal("b");
      });
    });
  })
}

/// ```text
/// stmt: ~('a' | 'b')+ ';' ;
/// ```
pub fn make_negated_grammar() -> Result<Grammar, GrammarErrors> {
  let mut tokens = TokenTable::new();
  tokens
    .add_literal("a", TokenType(1))
    .add_literal("b", TokenType(2))
    .add_literal(";", TokenType(3))
    .add_rule("NAME", TokenType(4));

  build(tokens, |gb| {
    gb.add_rule("stmt", |rb| {
      rb.add_alt_with_elems(vec![
        not_set(vec![
          SetItem::Literal("a".to_string()),
          SetItem::Literal("b".to_string()),
        ])
        .suffix("+"),
        literal(";"),
      ]);
    });
  })
}

/// A left-recursive expression grammar with an empty alternative.
///
/// ```text
/// expr: expr '+' term | term ;
/// term: NAME suffix ;
/// suffix: '!' | ;
/// ```
pub fn make_expr_grammar() -> Result<Grammar, GrammarErrors> {
  let mut tokens = TokenTable::new();
  tokens
    .add_rule("NAME", TokenType(1))
    .add_literal("+", TokenType(2))
    .add_literal("!", TokenType(3));

  build(tokens, |gb| {
    gb.add_rule("expr", |rb| {
      rb.add_alt(|ab| {
        ab.add_rule_ref("expr").add_literal("+").add_rule_ref("term");
      })
      .add_alt(|ab| {
        ab.add_rule_ref("term");
      });
    })
    .add_rule("term", |rb| {
      rb.add_alt(|ab| {
        ab.add(token("NAME")).add_rule_ref("suffix");
      });
    })
    .add_rule("suffix", |rb| {
      rb.add_alt(|ab| {
        ab.add_literal("!");
      })
      .add_alt(|_| {});
    });
  })
}

/// A right-recursive list, over the tokens of the call grammar.
///
/// ```text
/// list: NAME list | NAME ;
/// ```
pub fn make_list_grammar() -> Result<Grammar, GrammarErrors> {
  build(call_tokens(), |gb| {
    gb.add_rule("list", |rb| {
      rb.add_alt(|ab| {
        ab.add_token("NAME").add_rule_ref("list");
      })
      .add_alt(|ab| {
        ab.add_token("NAME");
      });
    });
  })
}
