//! Runtime traps raised by the IR interpreter.

use thiserror::Error;

#[derive(Debug, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum InterpError {
    #[error("division by zero")]
    DivideByZero,

    #[error("integer overflow in division")]
    DivisionOverflow,

    #[error("out-of-bounds memory access at address {address}")]
    MemoryOutOfBounds { address: u32 },

    #[error("call depth limit exceeded")]
    CallDepthExceeded,

    /// The interpreter has no host bindings; `import func` declarations can
    /// only be executed by the WebAssembly or native artifacts.
    #[error("call to imported function `{name}` (not bound in the interpreter)")]
    UnboundImport { name: String },

    #[error("call to undefined function `{name}`")]
    UndefinedFunction { name: String },

    #[error("failed to write program output: {0}")]
    Io(#[from] std::io::Error),
}
