//! AMX native name mangling.
//!
//! Encodes a native's [`amx_sig::Signature`] into an export name drawn from
//! `[A-Za-z0-9_@]`, decodes such names back, and checks a discovered export
//! against the signature a caller expects before any call is attempted.
//!
//! ```text
//! SetTimer(string, int, bool) -> int   ⇄   SetTimer@3sib@i
//! ```
//!
//! | code | meaning |
//! |------|---------|
//! | `i u b f c h s _` | int, uint, bool, Float, char, handle, string, any |
//! | `A<len><type>` | const (input) array |
//! | `a<len><type>` | output array; `a1<type>` is a reference |
//! | `L…L<n>` | `sizeof(arg n)` at depth = number of `L`s |
//! | `T<n>` | `tagof(arg n)` |
//! | `t<len><name>` | explicit tag, repeated per tag in ascending order |
//! | `x<tags>` | variadic tail |
//! | `@<type>` | return type |
//! | `O` | optcall, optionally followed by the prototype |
//!
//! Every operation is pure and synchronous; all types are `Send + Sync`.

mod decoder;
mod encoder;
mod error;
pub mod report;
mod table;
mod validate;

pub use decoder::decode;
pub use encoder::{encode, encode_prototype};
pub use error::{Mismatch, ParseError, ParseErrorKind};
pub use table::{NativeEntry, NativeTable, TableError};
pub use validate::{compare, validate};
