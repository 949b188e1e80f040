//! Label taxonomy: RPC shapes, outcome codes, message parts and method
//! descriptors.

mod code;
mod method;
mod part;
mod shape;

pub use code::{ALL_CODES, OutcomeCode, code_from_error, code_label};
pub use method::{MethodInfo, RpcLabels, ServiceInfo, UNKNOWN_NAME, split_method_name};
pub use part::{Direction, MessagePart};
pub use shape::{RpcShape, StreamDesc};

pub use tonic::Code;
