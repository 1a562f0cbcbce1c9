// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The code form: a small s-expression surface —
//! `defpipeline`, `stage`, `step`, `parallel`, `sh`, `when-branch`,
//! `when-param`, `post`, `always`, `on-success`, `on-failure`,
//! `artifacts`, `notify` — evaluated by a hand-written recursive-descent
//! parser over `chengis-dsl::lexer`'s tokens. Per the source model's own
//! design note, this is a tiny parser that emits the same `Pipeline` value
//! the data form produces; it makes no attempt to reimplement the source
//! language's macro semantics, so there is no `source`/`parameter` form —
//! only the data form carries those.

use chengis_core::{
    Condition, NotifierConfig, Pipeline, PipelineBuilder, PostHooks, ShellPayload, Stage, Step,
    StepPayload,
};

use crate::error::LoadError;
use crate::lexer::{tokenize, Token};

/// Parse a code-form program into a `Pipeline`. The pipeline's name is
/// whatever `defpipeline` declares — the code form is self-naming, unlike
/// the data form's override use case.
pub fn load_code_form(content: &str) -> Result<Pipeline, LoadError> {
    let tokens = tokenize(content)?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let builder = parser.parse_defpipeline()?;
    parser.expect_end()?;
    builder.build().map_err(LoadError::from)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }

    fn here(&self) -> String {
        format!("token {}", self.pos)
    }

    fn expect_end(&self) -> Result<(), LoadError> {
        if self.pos < self.tokens.len() {
            return Err(LoadError::syntax(self.here(), "unexpected trailing input"));
        }
        Ok(())
    }

    fn expect_lparen(&mut self) -> Result<(), LoadError> {
        match self.advance() {
            Some(Token::LParen) => Ok(()),
            _ => Err(LoadError::syntax(self.here(), "expected '('")),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), LoadError> {
        match self.advance() {
            Some(Token::RParen) => Ok(()),
            _ => Err(LoadError::syntax(self.here(), "expected ')'")),
        }
    }

    fn at_rparen(&self) -> bool {
        matches!(self.peek(), Some(Token::RParen))
    }

    fn expect_symbol(&mut self) -> Result<String, LoadError> {
        match self.advance() {
            Some(Token::Symbol(s)) => Ok(s.clone()),
            _ => Err(LoadError::syntax(self.here(), "expected a symbol")),
        }
    }

    fn expect_string(&mut self) -> Result<String, LoadError> {
        match self.advance() {
            Some(Token::Str(s)) => Ok(s.clone()),
            _ => Err(LoadError::syntax(self.here(), "expected a string literal")),
        }
    }

    /// Parse `(defpipeline "name" <form>*)`.
    fn parse_defpipeline(&mut self) -> Result<PipelineBuilder, LoadError> {
        self.expect_lparen()?;
        let head = self.expect_symbol()?;
        if head != "defpipeline" {
            return Err(LoadError::syntax(self.here(), "expected 'defpipeline'"));
        }
        let name = self.expect_string()?;
        let mut builder = PipelineBuilder::new(name);

        while !self.at_rparen() {
            self.expect_lparen()?;
            let form = self.expect_symbol()?;
            builder = match form.as_str() {
                "stage" => builder.stage(self.parse_stage_body()?),
                "post" => builder.post(self.parse_post_body()?),
                "artifacts" => builder.artifacts(self.parse_artifacts_body()?),
                "notify" => builder.notifier(self.parse_notify_body()?),
                other => {
                    return Err(LoadError::syntax(
                        self.here(),
                        format!("unknown top-level form '{other}'"),
                    ))
                }
            };
            self.expect_rparen()?;
        }
        self.expect_rparen()?;
        Ok(builder)
    }

    /// Parse the body of `(stage "name" <condition>? <step-or-parallel>*)`.
    fn parse_stage_body(&mut self) -> Result<Stage, LoadError> {
        let name = self.expect_string()?;
        let mut stage = Stage {
            name,
            ..Default::default()
        };

        while !self.at_rparen() {
            self.expect_lparen()?;
            let form = self.expect_symbol()?;
            match form.as_str() {
                "parallel" => {
                    stage.parallel = true;
                    while !self.at_rparen() {
                        self.expect_lparen()?;
                        let inner = self.expect_symbol()?;
                        if inner != "step" {
                            return Err(LoadError::syntax(
                                self.here(),
                                "'parallel' may only contain 'step' forms",
                            ));
                        }
                        stage.steps.push(self.parse_step_body()?);
                        self.expect_rparen()?;
                    }
                }
                "step" => stage.steps.push(self.parse_step_body()?),
                "when-branch" => stage.condition = Some(self.parse_when_branch_body()?),
                "when-param" => stage.condition = Some(self.parse_when_param_body()?),
                other => {
                    return Err(LoadError::syntax(
                        self.here(),
                        format!("unknown stage form '{other}'"),
                    ))
                }
            }
            self.expect_rparen()?;
        }
        Ok(stage)
    }

    /// Parse the body of `(step "name" <condition>? (sh "command"))`.
    fn parse_step_body(&mut self) -> Result<Step, LoadError> {
        let name = self.expect_string()?;
        let mut condition = None;
        let mut payload = None;

        while !self.at_rparen() {
            self.expect_lparen()?;
            let form = self.expect_symbol()?;
            match form.as_str() {
                "sh" => {
                    payload = Some(StepPayload::Shell(ShellPayload {
                        command: self.expect_string()?,
                        ..Default::default()
                    }));
                }
                "when-branch" => condition = Some(self.parse_when_branch_body()?),
                "when-param" => condition = Some(self.parse_when_param_body()?),
                other => {
                    return Err(LoadError::syntax(
                        self.here(),
                        format!("unknown step form '{other}'"),
                    ))
                }
            }
            self.expect_rparen()?;
        }

        let payload = payload.ok_or_else(|| {
            LoadError::syntax(self.here(), format!("step '{name}' has no 'sh' form"))
        })?;

        Ok(Step {
            name,
            step_type: "shell".to_string(),
            payload,
            condition,
        })
    }

    fn parse_when_branch_body(&mut self) -> Result<Condition, LoadError> {
        Ok(Condition::Branch {
            value: self.expect_string()?,
        })
    }

    fn parse_when_param_body(&mut self) -> Result<Condition, LoadError> {
        let key = self.expect_string()?;
        let value = self.expect_string()?;
        Ok(Condition::Param { key, value })
    }

    /// Parse `(post (always <step>*)? (on-success <step>*)? (on-failure <step>*)?)`.
    fn parse_post_body(&mut self) -> Result<PostHooks, LoadError> {
        let mut post = PostHooks::default();
        while !self.at_rparen() {
            self.expect_lparen()?;
            let form = self.expect_symbol()?;
            let steps = match form.as_str() {
                "always" => &mut post.always,
                "on-success" => &mut post.on_success,
                "on-failure" => &mut post.on_failure,
                other => {
                    return Err(LoadError::syntax(
                        self.here(),
                        format!("unknown post form '{other}'"),
                    ))
                }
            };
            while !self.at_rparen() {
                self.expect_lparen()?;
                let inner = self.expect_symbol()?;
                if inner != "step" {
                    return Err(LoadError::syntax(self.here(), "expected 'step' form"));
                }
                steps.push(self.parse_step_body()?);
                self.expect_rparen()?;
            }
            self.expect_rparen()?;
        }
        Ok(post)
    }

    fn parse_artifacts_body(&mut self) -> Result<Vec<String>, LoadError> {
        let mut patterns = Vec::new();
        while !self.at_rparen() {
            patterns.push(self.expect_string()?);
        }
        Ok(patterns)
    }

    fn parse_notify_body(&mut self) -> Result<NotifierConfig, LoadError> {
        let tag = self.expect_string()?;
        Ok(NotifierConfig {
            tag,
            config: serde_json::Value::Null,
        })
    }
}

#[cfg(test)]
#[path = "code_form_tests.rs"]
mod tests;
