//! Intrinsic callables registered in the builtins map at VM construction.

use rill_core::{Host, RillError, RillResult, Type, Value};
use rustc_hash::FxHashMap;

/// Install the standard built-ins.
pub(crate) fn install(map: &mut FxHashMap<String, Value>) {
    map.insert("print".to_string(), Value::native("print", builtin_print));
    map.insert("input".to_string(), Value::native("input", builtin_input));
    map.insert(
        "isinstance".to_string(),
        Value::native("isinstance", builtin_isinstance),
    );
    map.insert("len".to_string(), Value::native("len", builtin_len));
    map.insert("type".to_string(), Value::native("type", builtin_type));
}

/// `print(args...)`: concatenate each argument's rendering, write to the
/// host's output with a trailing newline, return nil.
fn builtin_print(host: &mut dyn Host, _receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let mut text = String::new();
    for arg in args {
        text.push_str(&arg.to_string());
    }
    text.push('\n');
    host.write_out(&text);
    Ok(Value::nil())
}

/// `input(prompt?)`: write the prompt without a newline, read one line,
/// return it as a String.
fn builtin_input(host: &mut dyn Host, _receiver: &Value, args: &[Value]) -> RillResult<Value> {
    if let Some(prompt) = args.first() {
        host.write_out(&prompt.to_string());
    }
    Ok(Value::str(host.read_line()))
}

/// `isinstance(value, witness)`: the witness is a String naming a type;
/// returns whether the value has that type.
fn builtin_isinstance(_host: &mut dyn Host, _receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let [value, witness] = args else {
        return Err(RillError::arity_error(format!(
            "isinstance() takes 2 arguments, got {}",
            args.len()
        )));
    };
    let Some(name) = witness.as_str() else {
        return Err(RillError::type_error(format!(
            "isinstance() expects a type name String, got {}",
            witness.type_of()
        )));
    };
    Ok(Value::bool(value.type_of().name() == name))
}

/// `len(value)`: characters of a String, elements of a List, entries of
/// a Dict.
fn builtin_len(_host: &mut dyn Host, _receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let [value] = args else {
        return Err(RillError::arity_error(format!(
            "len() takes 1 argument, got {}",
            args.len()
        )));
    };
    let length = match value.type_of() {
        Type::Str => value.as_str().map(|s| s.chars().count()),
        Type::List => value.list_items().map(|items| items.len()),
        Type::Dict => Some(value.attrs().len()),
        _ => None,
    };
    match length {
        Some(n) => Ok(Value::int(n as i64)),
        None => Err(RillError::type_error(format!(
            "object of type {} has no length",
            value.type_of()
        ))),
    }
}

/// `type(value)`: the value's type name as a String.
fn builtin_type(_host: &mut dyn Host, _receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let [value] = args else {
        return Err(RillError::arity_error(format!(
            "type() takes 1 argument, got {}",
            args.len()
        )));
    };
    Ok(Value::str(value.type_of().name()))
}

#[cfg(test)]
mod tests {
    use crate::vm::Vm;
    use rill_core::{BufferHost, RillResult};

    fn run_with_host(source: &str, host: BufferHost) -> (Vm, RillResult<()>) {
        let mut vm = Vm::with_host(Box::new(host));
        let code = rill_compiler::compile_source(source, "<test>").unwrap();
        let result = vm.load(code);
        (vm, result)
    }

    #[test]
    fn test_print_concatenates_and_appends_newline() {
        let host = BufferHost::new();
        let output = host.output_handle();
        let (_, result) = run_with_host("print(1 + 2, \" and \", [1]);", host);
        result.unwrap();
        assert_eq!(output.borrow().as_str(), "3\" and \"[1]\n");
    }

    #[test]
    fn test_input_echoes_prompt_without_newline() {
        let host = BufferHost::with_input(vec!["reply".to_string()]);
        let output = host.output_handle();
        let (_, result) = run_with_host("input(\"name\");", host);
        result.unwrap();
        assert_eq!(output.borrow().as_str(), "\"name\"");
    }

    #[test]
    fn test_isinstance() {
        let (mut vm, result) = run_with_host(
            "isinstance(1, \"Int\");",
            BufferHost::new(),
        );
        result.unwrap();
        assert_eq!(vm.take_last_popped().unwrap().to_string(), "True");

        let (mut vm, result) = run_with_host(
            "isinstance(1, \"String\");",
            BufferHost::new(),
        );
        result.unwrap();
        assert_eq!(vm.take_last_popped().unwrap().to_string(), "False");
    }

    #[test]
    fn test_isinstance_arity() {
        let (_, result) = run_with_host("isinstance(1);", BufferHost::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_len() {
        let (mut vm, result) = run_with_host("len([1, 2, 3]);", BufferHost::new());
        result.unwrap();
        assert_eq!(vm.take_last_popped().unwrap().to_string(), "3");

        let (mut vm, result) = run_with_host("len(\"hello\");", BufferHost::new());
        result.unwrap();
        assert_eq!(vm.take_last_popped().unwrap().to_string(), "5");

        let (mut vm, result) = run_with_host("len({ a = 1, b = 2 });", BufferHost::new());
        result.unwrap();
        assert_eq!(vm.take_last_popped().unwrap().to_string(), "2");

        let (_, result) = run_with_host("len(1);", BufferHost::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_type() {
        let (mut vm, result) = run_with_host("type(1 / 2);", BufferHost::new());
        result.unwrap();
        assert_eq!(vm.take_last_popped().unwrap().to_string(), "\"Rational\"");
    }

    #[test]
    fn test_input_reads_scripted_line() {
        let host = BufferHost::with_input(vec!["forty two".to_string()]);
        let (mut vm, result) = run_with_host("input(\"? \");", host);
        result.unwrap();
        assert_eq!(vm.take_last_popped().unwrap().to_string(), "\"forty two\"");
    }
}
