//! Core value types: request envelope, responses, change records, paths.

pub mod change;
pub mod path;
pub mod request;
pub mod response;

pub use change::{ChangeRecord, ChangeType, parse_status, parse_status_in};
pub use path::{RepoPath, to_windows_path};
pub use request::{
    ClientError, Credentials, RawRequest, Request, RequestLimits, Target, TargetShape,
};
pub use response::Response;
