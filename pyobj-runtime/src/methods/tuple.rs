//! `tuple` methods

use super::CallArgs;
use crate::error::{RtResult, RuntimeError};
use crate::heap::ObjRef;
use crate::interp::Interpreter;

pub(super) const METHODS: &[&str] = &["index", "count"];

impl Interpreter {
    pub(super) fn tuple_method(
        &mut self,
        receiver: ObjRef,
        name: &str,
        args: CallArgs<'_>,
    ) -> RtResult<ObjRef> {
        args.simple(1, 1)?;
        let value = args.required(0)?;
        if name == "count" {
            let count = self.count_of(receiver, value)?;
            return Ok(self.new_int(count as i64));
        }
        match self.position_of(receiver, value)? {
            Some(pos) => Ok(self.new_int(pos as i64)),
            None => Err(RuntimeError::value_error("tuple.index(x): x not in tuple")),
        }
    }
}
