pub mod comments;
pub mod meta;
pub mod policy;
pub mod requests;
pub mod streams;
