//! Probe-site discovery in one compilation unit
//!
//! Every inlined call inside a linked function becomes a probe site. The walk
//! visits functions in table order and each function's tag tree depth-first,
//! pre-order, in DIE order, descending into nested lexical blocks and into
//! the bodies of inlined calls.

use super::diagnostics::Diagnostics;
use crate::debug_info::{CompileUnit, Function, TagKind};
use crate::domain::{EncodeError, FunctionId, TagId};

/// An inlined call whose origin has been resolved
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProbeSite<'cu> {
    pub function: FunctionId,
    pub tag: TagId,
    pub ip: u64,
    pub origin: &'cu Function,
}

pub(crate) struct CuWalker<'cu, 'd> {
    unit: &'cu CompileUnit,
    diag: &'d Diagnostics<'d>,
}

impl<'cu, 'd> CuWalker<'cu, 'd> {
    pub(crate) fn new(unit: &'cu CompileUnit, diag: &'d Diagnostics<'d>) -> Self {
        Self { unit, diag }
    }

    /// Hand every probe site to `visit`, in discovery order
    ///
    /// Functions at address 0 are skipped without any diagnostics. The first
    /// unresolvable origin, or the first error from `visit`, ends the walk.
    pub(crate) fn walk<F>(&self, mut visit: F) -> Result<(), EncodeError>
    where
        F: FnMut(ProbeSite<'cu>) -> Result<(), EncodeError>,
    {
        for (function, func) in self.unit.functions() {
            if func.addr == 0 {
                continue;
            }
            self.diag.function(func);

            let mut stack: Vec<TagId> = func.lexblock.iter().rev().copied().collect();
            while let Some(tag_id) = stack.pop() {
                let tag = self.unit.tag(tag_id);
                match &tag.kind {
                    TagKind::FormalParameter { name } => self.diag.parameter(name.as_deref()),
                    TagKind::InlinedSubroutine(exp) => {
                        let origin = self.unit.resolve(exp.origin).ok_or_else(|| {
                            EncodeError::Resolution {
                                function: func.name.clone(),
                                ip: exp.ip,
                                origin: exp.origin,
                            }
                        })?;
                        let origin = self.unit.function(origin);
                        self.diag.inlined(&origin.name, exp.ip);
                        visit(ProbeSite { function, tag: tag_id, ip: exp.ip, origin })?;
                    }
                    _ => {}
                }
                stack.extend(tag.children.iter().rev().copied());
            }

            self.diag.lexblock(self.unit, func);
        }
        Ok(())
    }
}
