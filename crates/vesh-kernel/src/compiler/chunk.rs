//! Compilation of chunks, forms and assignments.

use super::{CompileResult, Compiler};
use crate::ast::{Assignment, Chunk, Form, Stmt};
use crate::op::{AssignOp, FormOp, Op, OpBody};

impl Compiler {
    pub(super) fn chunk(&mut self, chunk: &Chunk) -> CompileResult<Op> {
        let ops = chunk
            .stmts
            .iter()
            .map(|stmt| self.stmt(stmt))
            .collect::<CompileResult<Vec<_>>>()?;
        Ok(Op::new(OpBody::Chunk(ops), chunk.span))
    }

    fn stmt(&mut self, stmt: &Stmt) -> CompileResult<Op> {
        match stmt {
            Stmt::Form(form) => self.form(form),
            Stmt::Assignment(assignment) => self.assignment(assignment),
        }
    }

    fn form(&mut self, form: &Form) -> CompileResult<Op> {
        let head = self.compound(&form.head)?;
        let args = form
            .args
            .iter()
            .map(|arg| self.compound(arg))
            .collect::<CompileResult<Vec<_>>>()?;
        let opts = self.pairs(&form.opts)?;
        Ok(Op::new(OpBody::Form(FormOp { head, args, opts }), form.span))
    }

    /// The target is declared before the value is compiled.
    fn assignment(&mut self, assignment: &Assignment) -> CompileResult<Op> {
        let name = assignment.name.as_str();
        if name.is_empty() {
            return Err(self.error(assignment.span, "variable name must not be empty"));
        }
        if name.contains(':') || name.starts_with('@') {
            return Err(self.error(assignment.span, format!("cannot assign to ${name}")));
        }
        let ns = self.register_variable_set(name);
        let value = self.compound(&assignment.value)?;
        Ok(Op::new(
            OpBody::Assign(AssignOp {
                ns,
                name: name.to_string(),
                value,
            }),
            assignment.span,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ast::Source;
    use crate::ast::build::*;
    use crate::scope::Namespace;

    fn compiler(globals: &[&str]) -> Compiler {
        Compiler::new(
            Arc::new(Source::new("test", "")),
            globals.iter().map(|s| s.to_string()),
            Vec::new(),
        )
    }

    fn assign_ns(op: &Op) -> Namespace {
        match &op.body {
            OpBody::Assign(assign) => assign.ns,
            other => panic!("not an assignment: {other:?}"),
        }
    }

    #[test]
    fn assignment_inside_lambda_targets_captured_cell() {
        let mut c = compiler(&["x"]);
        let body = chunk(vec![assign("x", word("2")), assign("y", word("3"))]);
        let op = c
            .compile_compound(&lambda(vec![], vec![], body).into())
            .unwrap();
        let crate::op::ValuesOpBody::Compound { subops, .. } = op.body else { panic!() };
        let crate::op::ValuesOpBody::Lambda(def) = &subops[0].body else { panic!() };
        let OpBody::Chunk(stmts) = &def.body.body else { panic!() };
        assert_eq!(assign_ns(&stmts[0]), Namespace::Up);
        assert_eq!(assign_ns(&stmts[1]), Namespace::Local);
        assert_eq!(def.captures, vec!["x"]);
    }

    #[test]
    fn qualified_assignment_is_rejected() {
        let err = compiler(&[])
            .compile_chunk(&chunk(vec![assign("E:HOME", word("x"))]))
            .unwrap_err();
        assert_eq!(err.message, "cannot assign to $E:HOME");
    }
}
