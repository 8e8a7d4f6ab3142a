//! List and dict construction.

use crate::vm::Vm;
use rill_core::{Instruction, RillError, RillResult, Value};

impl Vm {
    /// `MAKE_LIST n`: pop `n` elements and push a List that preserves
    /// their source order.
    pub(crate) fn exec_make_list(&mut self, inst: &Instruction) -> RillResult<()> {
        let count = self.operand(inst)? as usize;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.pop_operand("MAKE_LIST")?);
        }
        items.reverse();
        self.push(Value::list(items));
        Ok(())
    }

    /// `MAKE_DICT n`: pop `n` key/value pairs (key pushed before value)
    /// and push a Dict. Later keys win over earlier duplicates.
    pub(crate) fn exec_make_dict(&mut self, inst: &Instruction) -> RillResult<()> {
        let count = self.operand(inst)? as usize;
        let mut pairs = Vec::with_capacity(count);
        for _ in 0..count {
            let value = self.pop_operand("MAKE_DICT")?;
            let key = self.pop_operand("MAKE_DICT")?;
            pairs.push((key, value));
        }
        pairs.reverse();

        let dict = Value::dict();
        for (key, value) in pairs {
            let Some(key) = key.as_str().map(str::to_string) else {
                return Err(RillError::type_error(format!(
                    "dict keys must be String, got {}",
                    key.type_of()
                )));
            };
            dict.set_attr(key, value);
        }
        self.push(dict);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::vm::Vm;
    use rill_core::BufferHost;

    fn eval(source: &str) -> String {
        let mut vm = Vm::with_host(Box::new(BufferHost::new()));
        let code = rill_compiler::compile_source(source, "<test>").unwrap();
        vm.load(code).unwrap();
        vm.take_last_popped().unwrap().to_string()
    }

    #[test]
    fn test_make_list_preserves_order() {
        assert_eq!(eval("[1, 2, 3];"), "[1, 2, 3]");
        assert_eq!(eval("[];"), "[]");
    }

    #[test]
    fn test_nested_lists() {
        assert_eq!(eval("[[1, 2], [3]];"), "[[1, 2], [3]]");
    }

    #[test]
    fn test_make_dict_preserves_entry_order() {
        assert_eq!(eval("{ b = 2, a = 1 };"), "{b: 2, a: 1}");
    }

    #[test]
    fn test_make_dict_later_key_wins() {
        assert_eq!(eval("{ a = 1, a = 2 };"), "{a: 2}");
    }
}
