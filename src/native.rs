//! The fixed host-provided native function table (§6.3): `print`,
//! `println`, and the two helpers used by sample plotting programs.
//! `table()` is the single source of truth; both the interpreter (which
//! defines them straight into the global scope) and the bytecode
//! compiler (which also needs a constant-pool slot per native) build
//! from it.
use std::io::{self, Write};
use std::rc::Rc;

use log::trace;

use crate::diagnostics::EngineError;
use crate::position::Position;
use crate::symtab::SymbolTable;
use crate::value::{NativeFn, Value};

pub fn table() -> Vec<(&'static str, NativeFn)> {
    vec![
        ("print", Rc::new(|args: &[Value]| {
            trace!("native 'print' invoked with {} argument(s)", args.len());
            write_args(args);
            flush();
            Ok(Value::Void)
        })),
        ("println", Rc::new(|args: &[Value]| {
            trace!("native 'println' invoked with {} argument(s)", args.len());
            write_args(args);
            println!();
            flush();
            Ok(Value::Void)
        })),
        ("space", Rc::new(|_: &[Value]| {
            trace!("native 'space' invoked");
            print!(" ");
            flush();
            Ok(Value::Void)
        })),
        ("plot_x", Rc::new(|args: &[Value]| {
            trace!("native 'plot_x' invoked");
            let value = args.first().ok_or_else(|| EngineError::Runtime {
                message: "plot_x expects one argument".to_owned(),
                position: Position::new(0, 0),
            })?;
            let flag = value.as_bool(Position::new(0, 0))?;
            print!("{}", if flag { "x" } else { " " });
            flush();
            Ok(Value::Void)
        })),
    ]
}

pub fn register(symbols: &mut SymbolTable) -> Result<(), EngineError> {
    for (name, f) in table() {
        symbols.define(name, Value::NativeFunction(f), false, Position::new(0, 0))?;
    }
    Ok(())
}

fn write_args(args: &[Value]) {
    for arg in args {
        print!("{}", arg.display_for_print());
    }
}

fn flush() {
    let _ = io::stdout().flush();
}
