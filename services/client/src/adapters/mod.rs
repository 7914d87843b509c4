pub mod http;
pub mod object_url;
pub mod storage;

pub use http::HttpBackendAdapter;
pub use object_url::InMemoryObjectUrls;
pub use storage::BucketStorageAdapter;
