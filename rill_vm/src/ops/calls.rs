//! The CALL and RET protocols.

use crate::frame::{Frame, MAX_CALL_DEPTH};
use crate::vm::Vm;
use rill_core::{Payload, RillError, RillResult, Value};
use std::rc::Rc;

impl Vm {
    /// `CALL`: stack `[args-list, callee]`. Native functions run inline;
    /// user functions push a new frame and dispatch continues inside it.
    pub(crate) fn exec_call(&mut self) -> RillResult<()> {
        let callee = self.pop_operand("CALL")?;
        let args_value = self.pop_operand("CALL")?;
        let Some(args) = args_value.list_items().map(|items| items.clone()) else {
            return Err(RillError::type_error(format!(
                "CALL expects an argument list, got {}",
                args_value.type_of()
            )));
        };

        match callee.payload() {
            Payload::Native(native) => {
                let receiver = Value::nil();
                let result = (native.func)(self.host.as_mut(), &receiver, &args)?;
                self.push(result);
                Ok(())
            }
            Payload::Function(func) => {
                if args.len() != func.arity {
                    return Err(RillError::arity_error(format!(
                        "function '{}' expects {} arguments, got {}",
                        func.name,
                        func.arity,
                        args.len()
                    )));
                }
                if self.frames.len() >= MAX_CALL_DEPTH {
                    return Err(RillError::stack_error(
                        "maximum call depth exceeded",
                    ));
                }
                if func.code.names.len() < func.arity {
                    return Err(RillError::stack_error(format!(
                        "function '{}' has fewer names than parameters",
                        func.name
                    )));
                }

                let return_to_pc = self.frame()?.pc;
                let mut frame = Frame::new(func.name.clone(), Rc::clone(&func.code), return_to_pc);
                for (param, value) in func.code.names[..func.arity].iter().zip(args) {
                    frame.locals.insert(param.clone(), value);
                }
                self.frames.push(frame);
                Ok(())
            }
            _ => Err(RillError::type_error(format!(
                "{} is not callable",
                callee.type_of()
            ))),
        }
    }

    /// `RET`: pop the return value (nil when the stack is empty), pop the
    /// frame (releasing its locals), and hand the value to the caller.
    pub(crate) fn exec_ret(&mut self) -> RillResult<()> {
        if self.frames.len() < 2 {
            return Err(RillError::stack_error("'return' outside of a function"));
        }
        let value = self.stack.pop().unwrap_or_else(Value::nil);
        self.frames.pop();
        self.push(value);
        Ok(())
    }
}
