mod bytes;

pub use bytes::ByteSize;
