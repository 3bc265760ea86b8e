//! REST bridge invocation engine.
//!
//! This crate provides [`InvocationEngine`], which turns an [`bridge::Exchange`]
//! into one REST call and writes the outcome back into the exchange. Two
//! invocation modes are supported:
//!
//! - **Direct HTTP**: method, path, query, headers and body are taken from
//!   the message as-is.
//! - **Proxy**: the message names an operation and carries typed arguments;
//!   the operation is resolved against the configured resource interfaces.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The engine sequences calls between business logic
//! in the [`bridge`] crate (cache, resolution, classification) and the
//! transport behind the [`bridge::ClientConfiguration`] port. It contains no
//! network code of its own.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | `engine` | `InvocationEngine`, response typing, exchange completion |
//! | `direct` | Direct HTTP mode, method parsing |
//! | `proxy` | Proxy mode, path template expansion |

mod direct;
mod engine;
mod proxy;

pub use direct::{parse_method, requested_response_type};
pub use engine::InvocationEngine;
pub use proxy::expand_template;
