//! Raw, parameter-block level plumbing on both sides of the boundary.

pub(crate) mod ecalls;
pub(crate) mod ocalls;

pub(crate) use self::ocalls::OCALL_TABLE;
