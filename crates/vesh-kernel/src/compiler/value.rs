//! Compilation of value-producing nodes.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use vesh_glob::wildcard_to_segment;

use super::{CompileResult, Compiler};
use crate::ast::{Array, Compound, Indexing, Lambda, MapPair, Primary, PrimaryKind, Span};
use crate::closure::LambdaDef;
use crate::op::{PairOp, ValuesOp, ValuesOpBody, VariableOp};
use crate::scope::{Namespace, parse_variable};
use crate::value::{GlobPattern, Value};

impl Compiler {
    pub(super) fn compound(&mut self, compound: &Compound) -> CompileResult<ValuesOp> {
        let Some(first) = compound.indexings.first() else {
            return Ok(ValuesOp::literal(vec![Value::String(String::new())], compound.span));
        };
        let tilde = matches!(first.head.kind, PrimaryKind::Tilde);
        if tilde && compound.indexings.len() == 1 {
            return Ok(ValuesOp::new(ValuesOpBody::Home, compound.span));
        }
        let rest = if tilde { &compound.indexings[1..] } else { &compound.indexings[..] };
        let subops = rest
            .iter()
            .map(|indexing| self.indexing(indexing))
            .collect::<CompileResult<Vec<_>>>()?;
        Ok(ValuesOp::new(ValuesOpBody::Compound { tilde, subops }, compound.span))
    }

    fn compounds(&mut self, compounds: &[Compound]) -> CompileResult<Vec<ValuesOp>> {
        compounds.iter().map(|c| self.compound(c)).collect()
    }

    fn indexing(&mut self, indexing: &Indexing) -> CompileResult<ValuesOp> {
        let head = self.primary(&indexing.head)?;
        if indexing.indices.is_empty() {
            return Ok(head);
        }
        let indices = indexing
            .indices
            .iter()
            .map(|array| self.array(array))
            .collect::<CompileResult<Vec<_>>>()?;
        Ok(ValuesOp::new(
            ValuesOpBody::Indexing {
                head: Box::new(head),
                indices,
            },
            indexing.span,
        ))
    }

    fn array(&mut self, array: &Array) -> CompileResult<ValuesOp> {
        let ops = self.compounds(&array.compounds)?;
        Ok(ValuesOp::new(ValuesOpBody::Seq(ops), array.span))
    }

    fn primary(&mut self, primary: &Primary) -> CompileResult<ValuesOp> {
        let span = primary.span;
        let body = match &primary.kind {
            PrimaryKind::Bareword(s) | PrimaryKind::SingleQuoted(s) | PrimaryKind::DoubleQuoted(s) => {
                ValuesOpBody::Literal(vec![Value::String(s.clone())])
            }
            // Only special at the start of a compound.
            PrimaryKind::Tilde => ValuesOpBody::Literal(vec![Value::from("~")]),
            PrimaryKind::Variable(text) => ValuesOpBody::Variable(self.variable(text, span)?),
            PrimaryKind::Wildcard(text) => {
                let segment = wildcard_to_segment(text).map_err(|e| self.error(span, e.to_string()))?;
                ValuesOpBody::Literal(vec![Value::Glob(GlobPattern::from_segment(segment))])
            }
            PrimaryKind::ExceptionCapture(chunk) => {
                debug!(stmts = chunk.stmts.len(), "compiling exception capture");
                ValuesOpBody::ExceptionCapture(Arc::new(self.chunk(chunk)?))
            }
            PrimaryKind::OutputCapture(chunk) => {
                debug!(stmts = chunk.stmts.len(), "compiling output capture");
                ValuesOpBody::OutputCapture(Arc::new(self.chunk(chunk)?))
            }
            PrimaryKind::List(compounds) => ValuesOpBody::List(self.compounds(compounds)?),
            PrimaryKind::Lambda(lambda) => ValuesOpBody::Lambda(Arc::new(self.lambda(lambda, span)?)),
            PrimaryKind::Map(pairs) => ValuesOpBody::MapPairs(self.pairs(pairs)?),
            PrimaryKind::Braced { elements, is_range: true } => {
                let [from, to] = elements.as_slice() else {
                    return Err(self.error(span, "bad range"));
                };
                ValuesOpBody::Range {
                    from: Box::new(self.compound(from)?),
                    to: Box::new(self.compound(to)?),
                }
            }
            PrimaryKind::Braced { elements, .. } => ValuesOpBody::Seq(self.compounds(elements)?),
        };
        Ok(ValuesOp::new(body, span))
    }

    fn variable(&mut self, text: &str, span: Span) -> CompileResult<VariableOp> {
        let var = parse_variable(text);
        let qualified = text.trim_start_matches('@');
        let not_found = || format!("variable ${qualified} not found");
        let Some(ns) = Namespace::from_prefix(var.ns) else {
            return Err(self.error(span, not_found()));
        };
        if !self.register_variable_get(ns, var.name) {
            return Err(self.error(span, not_found()));
        }
        Ok(VariableOp {
            explode: var.explode,
            ns,
            name: var.name.to_string(),
        })
    }

    pub(super) fn pairs(&mut self, pairs: &[MapPair]) -> CompileResult<Vec<PairOp>> {
        let mut ops = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let key = self.compound(&pair.key)?;
            let value = match &pair.value {
                Some(value) => self.compound(value)?,
                None => ValuesOp::literal(vec![Value::Bool(true)], Span::at(pair.span.end)),
            };
            ops.push(PairOp {
                key,
                value,
                span: pair.span,
            });
        }
        Ok(ops)
    }

    /// The text of a compound that is a single unindexed string literal.
    fn literal_text<'a>(&self, compound: &'a Compound) -> Option<&'a str> {
        let [indexing] = compound.indexings.as_slice() else {
            return None;
        };
        if !indexing.indices.is_empty() {
            return None;
        }
        match &indexing.head.kind {
            PrimaryKind::Bareword(s) | PrimaryKind::SingleQuoted(s) | PrimaryKind::DoubleQuoted(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn signature_name<'a>(&self, compound: &'a Compound, what: &str) -> CompileResult<&'a str> {
        let text = self
            .literal_text(compound)
            .ok_or_else(|| self.error(compound.span, format!("{what} name must be literal string")))?;
        let bare = text.strip_prefix('@').unwrap_or(text);
        if bare.contains(':') {
            return Err(self.error(compound.span, format!("{what} name must be unqualified")));
        }
        if bare.is_empty() {
            return Err(self.error(compound.span, format!("{what} name must not be empty")));
        }
        Ok(text)
    }

    fn lambda(&mut self, lambda: &Lambda, span: Span) -> CompileResult<LambdaDef> {
        let mut arg_names = Vec::new();
        let mut rest_arg = None;
        for (i, arg) in lambda.args.iter().enumerate() {
            let text = self.signature_name(arg, "argument")?;
            match text.strip_prefix('@') {
                Some(rest) if i + 1 == lambda.args.len() => rest_arg = Some(rest.to_string()),
                Some(_) => return Err(self.error(arg.span, "only the last argument may have @")),
                None => arg_names.push(text.to_string()),
            }
        }

        let mut opt_names = Vec::new();
        let mut opt_defaults = Vec::new();
        for pair in &lambda.opts {
            let name = self.signature_name(&pair.key, "option")?;
            let default = pair
                .value
                .as_ref()
                .ok_or_else(|| self.error(pair.span, "option must have default value"))?;
            opt_names.push(name.to_string());
            // Defaults run in the defining scope.
            opt_defaults.push(self.compound(default)?);
        }

        let mut scope: HashSet<String> = arg_names.iter().chain(&opt_names).cloned().collect();
        scope.extend(rest_arg.clone());
        scope.insert("opts".to_string());

        self.scopes.push(scope);
        let outer_capture = std::mem::take(&mut self.capture);
        let body = self.chunk(&lambda.body);
        let captured = std::mem::replace(&mut self.capture, outer_capture);
        self.scopes.pop();
        let body = body?;

        let mut captures: Vec<String> = captured.into_iter().collect();
        captures.sort();
        // What the body reads from outside, this level must supply in turn.
        for name in &captures {
            self.register_variable_get(Namespace::Any, name);
        }

        debug!(
            args = arg_names.len(),
            rest = rest_arg.is_some(),
            opts = opt_names.len(),
            captures = ?captures,
            begin = span.begin,
            "compiled lambda"
        );
        Ok(LambdaDef {
            arg_names,
            rest_arg,
            opt_names,
            opt_defaults,
            captures,
            body,
            source: self.source.clone(),
        })
    }
}
